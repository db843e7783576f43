//! System prompt and per-turn context assembly.

/// Base personality and operating instructions for the assistant.
pub const SYSTEM_PROMPT: &str = "\
You are Valet, a personal AI assistant with long-term memory. Speak \
professionally with a subtle dry wit, be direct, and give your own opinion \
when asked rather than deferring every decision to the user.

Memory rules:
1. Before answering anything about the user's identity, preferences, or past \
conversations, search your memories with search_memories.
2. Save new lasting facts about the user with save_memory as soon as you \
learn them; update outdated ones with update_memory instead of saving \
duplicates.
3. Cross-reference new information against existing memories and acknowledge \
the timeline when a memory is out of date.

Task rules:
1. Before discussing schedules or commitments, search stored tasks with \
search_tasks; never answer from the conversation alone.
2. Whenever the user mentions a task, assignment, or deadline, store it with \
save_tasks.
3. Validate every date with parse_date before storing or repeating it, be \
explicit about timezones, and point out dates that are already in the past.

Use web_research for current events and anything you cannot know from memory.";

/// Render the retrieved context block placed after the system prompt.
pub fn context_block(time: &str, memories: &[String], tasks: &[String]) -> String {
    let mut out = format!("Current time context: {time}\n\n<recall_memories>\n");
    if memories.is_empty() {
        out.push_str("(none)\n");
    } else {
        for memory in memories {
            out.push_str(memory);
            out.push('\n');
        }
    }
    out.push_str("</recall_memories>\n\n<task_context>\n");
    if tasks.is_empty() {
        out.push_str("(none)\n");
    } else {
        for task in tasks {
            out.push_str(task);
            out.push('\n');
        }
    }
    out.push_str("</task_context>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_block_marks_empty_sections() {
        let block = context_block("Monday", &[], &[]);
        assert!(block.contains("Current time context: Monday"));
        assert!(block.contains("<recall_memories>\n(none)\n</recall_memories>"));
        assert!(block.contains("<task_context>\n(none)\n</task_context>"));
    }

    #[test]
    fn context_block_lists_entries() {
        let block = context_block(
            "Monday",
            &["- likes espresso".into()],
            &["- Title: Finish report".into()],
        );
        assert!(block.contains("- likes espresso"));
        assert!(block.contains("- Title: Finish report"));
    }
}
