//! Valet — a personal AI assistant with persistent semantic memory.
//!
//! Valet keeps two durable stores on disk: free-form **memories** (facts,
//! preferences, things the user said) and structured **tasks** (deadlines,
//! recurring chores). Both are similarity-searchable, and both are exposed to
//! the language model as callable tools so it can save, search, update, and
//! delete entries mid-conversation.
//!
//! # Architecture
//!
//! - **Storage**: one SQLite database per store, with
//!   [sqlite-vec](https://github.com/asg017/sqlite-vec) for vector KNN search
//! - **Embeddings**: OpenAI-compatible `/embeddings` endpoint over HTTP
//! - **Model**: OpenAI-compatible chat completions with function-calling tools
//! - **Interface**: a line-oriented chat REPL plus maintenance subcommands
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`clock`] — Current time and date parsing in the reference timezone
//! - [`embedding`] — Text-to-vector embedding via a remote encoder
//! - [`store`] — The persistent similarity index (documents + vectors)
//! - [`memory`] — Memory and task repositories: save, search, delete, update
//! - [`llm`] — Chat model trait and the OpenAI-compatible client
//! - [`tools`] — Tool definitions and dispatch for the model's tool calls
//! - [`agent`] — The per-turn conversation orchestrator
//! - [`cli`] — REPL and terminal subcommands

pub mod agent;
pub mod cli;
pub mod clock;
pub mod config;
pub mod embedding;
pub mod llm;
pub mod memory;
pub mod store;
pub mod tools;
