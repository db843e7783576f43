#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use valet::clock::Clock;
use valet::embedding::{EmbedError, Embedder};
use valet::llm::{ChatModel, ChatRequest, ChatResponse, LlmError, ToolCall};
use valet::memory::memories::MemoryRepository;
use valet::memory::tasks::TaskRepository;
use valet::memory::types::TaskData;
use valet::store::EmbeddingStore;
use valet::tools::ToolRegistry;

pub const DIMS: usize = 16;

/// Deterministic test embedder: token hashing into a small vector.
/// Identical text maps to identical vectors; shared tokens pull texts closer.
pub struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut v = vec![0.0f32; DIMS];
        for token in text.to_lowercase().split_whitespace() {
            let mut h: u64 = 0xcbf29ce484222325;
            for b in token.bytes() {
                h ^= b as u64;
                h = h.wrapping_mul(0x100000001b3);
            }
            v[(h % DIMS as u64) as usize] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

pub fn embedder() -> Arc<dyn Embedder> {
    Arc::new(HashEmbedder)
}

pub fn test_clock() -> Clock {
    Clock::new("America/Montreal").unwrap()
}

/// Open a memory repository over a fresh store in `dir`.
pub async fn memory_repo(dir: &Path) -> MemoryRepository {
    let (store, _) = EmbeddingStore::open_or_create(dir, embedder()).await.unwrap();
    MemoryRepository::new(store, test_clock(), 5)
}

/// Open a task repository over a fresh store in `dir`.
pub async fn task_repo(dir: &Path) -> TaskRepository {
    let (store, _) = EmbeddingStore::open_or_create(dir, embedder()).await.unwrap();
    TaskRepository::new(store, test_clock(), 5)
}

/// Wire a full tool registry over two fresh stores under `dir`.
pub async fn registry(dir: &Path) -> Arc<ToolRegistry> {
    let memories = memory_repo(&dir.join("memories")).await;
    let tasks = task_repo(&dir.join("tasks")).await;
    Arc::new(ToolRegistry::new(memories, tasks, test_clock(), None, 5))
}

/// A task with only a title; tweak fields per test.
pub fn task(title: &str) -> TaskData {
    TaskData {
        title: title.into(),
        description: String::new(),
        category: String::new(),
        subject: String::new(),
        completed: false,
        do_date: String::new(),
        due_date: String::new(),
        recurring: false,
        recurrence_pattern: None,
    }
}

/// Chat model that replays a fixed script of responses and records every
/// request it receives.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<ChatResponse>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::Transport("script exhausted".into()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub fn final_response(text: &str) -> ChatResponse {
    ChatResponse {
        content: text.into(),
        tool_calls: Vec::new(),
        finish_reason: Some("stop".into()),
    }
}

pub fn tool_response(calls: Vec<ToolCall>) -> ChatResponse {
    ChatResponse {
        content: String::new(),
        tool_calls: calls,
        finish_reason: Some("tool_calls".into()),
    }
}

pub fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        arguments: arguments.into(),
    }
}
