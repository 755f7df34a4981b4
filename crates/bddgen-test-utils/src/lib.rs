//! Deterministic collaborator fakes for bddgen tests
//!
//! Every fake is cheap, offline, and reproducible. The embedder speaks
//! a tiny keyword language tuned so that the pipeline's similarity
//! gates behave predictably: a chunk clears a query's gate exactly when
//! it mentions that query's keyword.

use async_trait::async_trait;
use bddgen_core::collaborators::{DocumentExtractor, Embedder, TextGenerator};
use bddgen_core::error::{Error, Result};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::fs;

/// Keyword embedder over a fixed 5-dimensional space.
///
/// Dimensions 0..3 flag the four query concepts (landing page,
/// navigation, login requirement, API use); dimension 4 is a constant
/// 0.5 bias so no vector is ever zero. With these weights a text
/// sharing a query's keyword scores 1.0 against that query, a text
/// with a different single keyword scores 0.2, and a keyword-free text
/// scores about 0.45, so the pipeline's 0.6 gate separates them
/// cleanly.
#[derive(Debug, Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of embed calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        let flag = |hit: bool| if hit { 1.0 } else { 0.0 };
        Ok(vec![
            flag(lower.contains("is the first page")),
            flag(lower.contains("navigates-to")),
            flag(lower.contains("requires") && lower.contains("login")),
            flag(lower.contains("api")),
            0.5,
        ])
    }
}

/// Generator that replays a fixed script and records every prompt.
#[derive(Debug)]
pub struct ScriptedGenerator {
    output: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Always answer with `output`.
    #[must_use]
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());
        Ok(self.output.clone())
    }
}

/// Generator that always fails, for error-path tests.
#[derive(Debug, Default)]
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::Collaborator("scripted failure".to_string()))
    }
}

/// Extractor that reads design documents as plain UTF-8 text.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path).await?)
    }
}

/// A two-page design document exercising every extraction pattern.
#[must_use]
pub fn sample_design_text() -> String {
    [
        "1. Overview",
        "The application is a small task tracker. Base URL: http://localhost:3000",
        "2. Login Page",
        "The Login Page is the first page of the application.",
        "Route: Login at /",
        r#"Users sign in with username "admin" and password "secret"."#,
        r#"The page navigates-to dashboard with button data-testid="login-btn" after login."#,
        "The form submits to the API: POST /api/login endpoint.",
        "3. Dashboard Page",
        "The Dashboard Page shows open tasks. Requires: Login.",
        "Route: Dashboard at /dashboard",
        "Task data comes from the API: GET /api/tasks endpoint.",
    ]
    .join("\n")
}
