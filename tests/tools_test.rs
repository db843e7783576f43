mod helpers;

use helpers::registry;

#[tokio::test]
async fn memory_tools_roundtrip_through_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let tools = registry(dir.path()).await;

    let saved = tools
        .dispatch(
            "save_memory",
            r#"{"memories": ["the user's sister is named Clara"]}"#,
        )
        .await;
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved["status"], "success");
    assert_eq!(saved["ids"].as_array().unwrap().len(), 1);

    let found = tools
        .dispatch("search_memories", r#"{"query": "sister named Clara"}"#)
        .await;
    let found: serde_json::Value = serde_json::from_str(&found).unwrap();
    assert_eq!(found[0]["content"], "the user's sister is named Clara");

    let updated = tools
        .dispatch(
            "update_memory",
            r#"{"old_memory_text": "the user's sister is named Clara", "new_memory_text": "the user's sister is named Claire"}"#,
        )
        .await;
    assert!(updated.starts_with("Successfully updated memory:"));

    let deleted = tools
        .dispatch(
            "delete_memory",
            r#"{"targets": ["the user's sister is named Claire"]}"#,
        )
        .await;
    assert!(deleted.contains("Successfully deleted"));

    let empty = tools
        .dispatch("search_memories", r#"{"query": "sister"}"#)
        .await;
    assert_eq!(empty, "No memories found, memory list is empty");
}

#[tokio::test]
async fn task_tools_roundtrip_through_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let tools = registry(dir.path()).await;

    let saved = tools
        .dispatch(
            "save_tasks",
            r#"{"tasks": [{
                "title": "Finish report",
                "due_date": "2024-04-30",
                "description": "Quarterly numbers",
                "category": "work"
            }]}"#,
        )
        .await;
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved["titles"][0], "Finish report");

    let found = tools
        .dispatch("search_tasks", r#"{"query": "report", "limit": 5}"#)
        .await;
    let found: serde_json::Value = serde_json::from_str(&found).unwrap();
    assert_eq!(found[0]["title"], "Finish report");
    assert_eq!(found[0]["completed"], false);

    let updated = tools
        .dispatch(
            "update_task",
            r#"{"old_task_text": "Finish report", "task": {
                "title": "Finish report",
                "due_date": "2024-04-30",
                "completed": true
            }}"#,
        )
        .await;
    assert!(updated.contains("Completed: true"));

    let missing = tools
        .dispatch("delete_task", r#"{"targets": ["Unknown chore"]}"#)
        .await;
    assert!(missing.contains("Could not find exact task: Unknown chore"));
}

#[tokio::test]
async fn validation_and_argument_errors_come_back_as_messages() {
    let dir = tempfile::tempdir().unwrap();
    let tools = registry(dir.path()).await;

    let bad_args = tools.dispatch("search_memories", "{not json").await;
    assert!(bad_args.starts_with("Error: invalid arguments for search_memories"));

    let bad_query = tools
        .dispatch("search_memories", r#"{"query": "  "}"#)
        .await;
    assert!(bad_query.starts_with("Error:"));

    let bad_limit = tools
        .dispatch("search_tasks", r#"{"query": "x", "limit": 0}"#)
        .await;
    assert!(bad_limit.starts_with("Error:"));

    let unknown = tools.dispatch("launch_rocket", "{}").await;
    assert_eq!(unknown, "Error: unknown tool: launch_rocket");
}

#[tokio::test]
async fn update_miss_is_a_message_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let tools = registry(dir.path()).await;

    let miss = tools
        .dispatch(
            "update_memory",
            r#"{"old_memory_text": "never stored", "new_memory_text": "whatever"}"#,
        )
        .await;
    assert_eq!(miss, "Could not find exact memory to update: never stored");
}

#[tokio::test]
async fn parse_date_formats_and_rejects() {
    let dir = tempfile::tempdir().unwrap();
    let tools = registry(dir.path()).await;

    let parsed = tools
        .dispatch("parse_date", r#"{"date_input": "2024-04-30"}"#)
        .await;
    let parsed: serde_json::Value = serde_json::from_str(&parsed).unwrap();
    assert_eq!(parsed["date"], "April 30, 2024");
    assert_eq!(parsed["timezone"], "America/Montreal");

    let now = tools.dispatch("parse_date", "{}").await;
    let now: serde_json::Value = serde_json::from_str(&now).unwrap();
    assert!(now["formatted"].as_str().unwrap().contains("America/Montreal"));

    let bad = tools
        .dispatch("parse_date", r#"{"date_input": "whenever"}"#)
        .await;
    let bad: serde_json::Value = serde_json::from_str(&bad).unwrap();
    assert!(bad["error"].as_str().unwrap().contains("whenever"));
    assert!(bad["valid_formats"].is_array());
}

#[tokio::test]
async fn web_research_without_key_reports_unconfigured() {
    let dir = tempfile::tempdir().unwrap();
    let tools = registry(dir.path()).await;

    let result = tools
        .dispatch("web_research", r#"{"instruction": "rust release schedule"}"#)
        .await;
    assert!(result.contains("not configured"));
}
