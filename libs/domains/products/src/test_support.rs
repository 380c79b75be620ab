//! Hand-written fakes for the AI traits.

use std::sync::Mutex;

use async_trait::async_trait;
use domain_ai::{AiResult, EmbeddingFetcher, EmbeddingModel, ImageDescriber, ImageEmbedder, QueryRewriter};

pub struct FakeRewriter {
    reply: String,
}

impl FakeRewriter {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl QueryRewriter for FakeRewriter {
    async fn rewrite(&self, _query: &str) -> AiResult<String> {
        Ok(self.reply.clone())
    }
}

/// Returns a constant vector of `dimensions` and records every input
pub struct FakeEmbedder {
    dimensions: usize,
    inputs: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingFetcher for FakeEmbedder {
    async fn embed(&self, text: &str, _model: EmbeddingModel) -> AiResult<Vec<f32>> {
        self.inputs.lock().unwrap().push(text.to_string());
        Ok(vec![0.1; self.dimensions])
    }
}

pub struct FakeDescriber {
    reply: String,
}

impl FakeDescriber {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl ImageDescriber for FakeDescriber {
    async fn describe(&self, _image: &[u8], _mime: &str, _language: &str) -> AiResult<String> {
        Ok(self.reply.clone())
    }
}

pub struct FakeImageEmbedder {
    reply: Vec<f32>,
}

impl FakeImageEmbedder {
    pub fn replying(reply: Vec<f32>) -> Self {
        Self { reply }
    }
}

#[async_trait]
impl ImageEmbedder for FakeImageEmbedder {
    async fn embed_image(&self, _image: &[u8], _mime: &str) -> AiResult<Vec<f32>> {
        Ok(self.reply.clone())
    }
}
