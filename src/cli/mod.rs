//! Terminal entry points: the chat REPL and maintenance subcommands.

pub mod render;

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::agent::Orchestrator;
use crate::clock::Clock;
use crate::config::ValetConfig;
use crate::embedding::{create_embedder, Embedder};
use crate::llm::{openai::OpenAiChat, ChatModel};
use crate::memory::memories::MemoryRepository;
use crate::memory::tasks::TaskRepository;
use crate::store::EmbeddingStore;
use crate::tools::{web_research::TavilyResearcher, ToolRegistry};

/// Words that end the chat loop cleanly.
const EXIT_KEYWORDS: [&str; 4] = ["exit", "quit", "bye", "goodbye"];

/// Open both stores and wire up the repositories and tool registry.
async fn build_registry(config: &ValetConfig, api_key: &str) -> Result<(Arc<ToolRegistry>, Clock)> {
    let clock = Clock::new(&config.assistant.timezone)
        .context("invalid reference timezone in config")?;

    let embedder: Arc<dyn Embedder> =
        Arc::new(create_embedder(&config.embedding, api_key.to_string()));

    let (memory_store, outcome) =
        EmbeddingStore::open_or_create(config.memories_dir(), Arc::clone(&embedder))
            .await
            .context("failed to open memory store")?;
    info!(?outcome, "memory store opened");

    let (task_store, outcome) =
        EmbeddingStore::open_or_create(config.tasks_dir(), Arc::clone(&embedder))
            .await
            .context("failed to open task store")?;
    info!(?outcome, "task store opened");

    let candidate_k = config.retrieval.candidate_k;
    let memories = MemoryRepository::new(memory_store, clock, candidate_k);
    let tasks = TaskRepository::new(task_store, clock, candidate_k);
    let researcher = config.research_api_key().map(TavilyResearcher::new);

    let registry = ToolRegistry::new(
        memories,
        tasks,
        clock,
        researcher,
        config.retrieval.default_limit,
    );
    Ok((Arc::new(registry), clock))
}

/// Run the interactive chat loop until an exit keyword, EOF, or Ctrl-C.
pub async fn run_chat(config: ValetConfig, prod: bool) -> Result<()> {
    let api_key = config.require_api_key()?;
    let (registry, clock) = build_registry(&config, &api_key).await?;

    let model = Arc::new(OpenAiChat::new(
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        api_key,
    ));
    info!(model = model.model_name(), "chat model ready");
    let mut orchestrator = Orchestrator::new(model, registry, clock, &config);

    let name = config.assistant.name.clone();
    println!("{}", "=".repeat(50));
    println!("{name} is online. Type 'exit' to leave.");
    println!("{}", "=".repeat(50));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\n\nGoodbye! Have a great day!");
                break;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            // stdin closed
            println!("\nGoodbye!");
            break;
        };
        let input = line.trim();

        if input.is_empty() {
            println!("Please say something!");
            continue;
        }
        if EXIT_KEYWORDS.contains(&input.to_lowercase().as_str()) {
            println!("\n{name}: Goodbye!");
            break;
        }

        match orchestrator.respond(input).await {
            Ok(reply) => {
                if prod {
                    println!("\n{}", render::panel(&name, &reply));
                } else {
                    println!("\n{name}: {reply}");
                }
            }
            Err(e) => {
                // Turn errors are reported inline; the conversation continues.
                eprintln!("\nSomething went wrong: {e:#}");
                eprintln!("Please try again!");
            }
        }
    }

    Ok(())
}

/// Query one of the stores directly from the terminal, skipping the model.
pub async fn run_search(
    config: &ValetConfig,
    query: &str,
    tasks: bool,
    limit: usize,
) -> Result<()> {
    let api_key = config.require_api_key()?;
    let (registry, _clock) = build_registry(config, &api_key).await?;

    if tasks {
        let hits = registry.recall_tasks(query, limit).await?;
        if hits.is_empty() {
            println!("No results found.");
            return Ok(());
        }
        println!("Found {} task(s)\n", hits.len());
        for (i, hit) in hits.iter().enumerate() {
            println!("  {}. [{}] created {}", i + 1, hit.record.meta.id, hit.record.meta.created_at);
            for line in hit.content.lines() {
                println!("     {line}");
            }
            println!();
        }
    } else {
        let hits = registry.recall_memories(query, limit).await?;
        if hits.is_empty() {
            println!("No results found.");
            return Ok(());
        }
        println!("Found {} memor{}\n", hits.len(), if hits.len() == 1 { "y" } else { "ies" });
        for (i, hit) in hits.iter().enumerate() {
            println!("  {}. [{}] created {}", i + 1, hit.meta.id, hit.meta.created_at);
            println!("     {}", hit.content);
            println!();
        }
    }
    Ok(())
}

/// Display entry counts and on-disk sizes for both stores.
pub async fn run_stats(config: &ValetConfig) -> Result<()> {
    let api_key = config.require_api_key()?;
    let clock = Clock::new(&config.assistant.timezone)?;
    let embedder: Arc<dyn Embedder> =
        Arc::new(create_embedder(&config.embedding, api_key));

    println!("Store Statistics");
    println!("{}", "=".repeat(40));
    for (label, dir) in [("Memories", config.memories_dir()), ("Tasks", config.tasks_dir())] {
        let (store, _) = EmbeddingStore::open_or_create(&dir, Arc::clone(&embedder)).await?;
        let size = std::fs::metadata(store.db_path())
            .map(|m| m.len())
            .unwrap_or(0);
        println!("  {:<10} {:>6} entries   {:>10} bytes   {}", label, store.len()?, size, dir.display());
    }
    println!();
    println!("Reference timezone: {}", clock.timezone_name());
    Ok(())
}

/// Delete both store directories after confirmation.
pub fn run_reset(config: &ValetConfig, yes: bool) -> Result<()> {
    let memories = config.memories_dir();
    let tasks = config.tasks_dir();

    if !yes {
        println!("WARNING: This will permanently delete ALL stored memories and tasks.");
        println!("  {}", memories.display());
        println!("  {}", tasks.display());
        print!("\nType YES to confirm: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if input.trim() != "YES" {
            bail!("reset cancelled");
        }
    }

    for dir in [memories, tasks] {
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("failed to remove {}", dir.display()))?;
        }
    }
    println!("All memories and tasks deleted.");
    Ok(())
}
