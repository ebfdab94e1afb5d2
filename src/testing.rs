//! Scripted service doubles shared by the unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::{
    ports::{EmbeddingService, GenerationOptions, LlmService},
    DomainError, Embedding,
};

/// Replies with canned responses in order and records every prompt.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, DomainError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DomainError::generation("no scripted response left"))
    }
}

pub struct SlowLlm {
    response: String,
    delay: Duration,
}

impl SlowLlm {
    pub fn new(response: impl Into<String>, delay: Duration) -> Self {
        Self {
            response: response.into(),
            delay,
        }
    }
}

#[async_trait]
impl LlmService for SlowLlm {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, DomainError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.response.clone())
    }
}

pub struct FailingEmbedding {
    dimension: usize,
}

impl FailingEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingService for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Embedding, DomainError> {
        Err(DomainError::embedding("embedding backend unavailable"))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

pub struct SlowEmbedding {
    dimension: usize,
    delay: Duration,
}

impl SlowEmbedding {
    pub fn new(dimension: usize, delay: Duration) -> Self {
        Self { dimension, delay }
    }
}

#[async_trait]
impl EmbeddingService for SlowEmbedding {
    async fn embed(&self, _text: &str) -> Result<Embedding, DomainError> {
        tokio::time::sleep(self.delay).await;
        Ok(Embedding::new(vec![1.0; self.dimension]))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
