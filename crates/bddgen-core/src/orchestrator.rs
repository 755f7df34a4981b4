//! Scenario generation pipeline
//!
//! Ties the graph builders, the change-detection cache, the conversation
//! memory, and the generator together: resolve the design graph, order
//! the component files, then per component decide regenerate-vs-reuse,
//! assemble the prompt, and write one `.feature` file per scenario.

use bddgen_graph::{merge, resolve_test_order, KnowledgeGraph, NodeType, Relation};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::collaborators::{DocumentExtractor, Embedder, SourceParser, TextGenerator};
use crate::document::DesignGraphBuilder;
use crate::error::{Error, Result};
use crate::scenario::{clean_generated_text, split_into_scenarios};
use crate::similarity::{cosine_similarity, is_valid_vector};
use crate::source::{extract_component_code, extract_docstring, CodeGraphBuilder, NO_DOCSTRING};
use crate::store::{
    remove_stale_features, should_regenerate, CacheStore, ChangeSignals, FileRecord, MemoryStore,
    Turn,
};

/// Cached-code similarity a prior file must exceed to be offered as
/// retrieval context.
pub const RETRIEVAL_THRESHOLD: f32 = 0.8;

/// Guidance appended to every prompt unless the caller overrides it.
pub const DEFAULT_ADDITIONAL_INFO: &str =
    "Use previous history and context for generating tests and getting test info";

/// Everything a run needs to know, resolved by the caller up front.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Directory of component source files
    pub components_dir: PathBuf,
    /// Design document; optional when a cached design graph exists
    pub design_doc: Option<PathBuf>,
    /// Output directory for `.feature` files
    pub features_dir: PathBuf,
    /// Change-detection cache file
    pub cache_file: PathBuf,
    /// Conversation memory file
    pub memory_file: PathBuf,
    /// Free-form guidance merged into every prompt
    pub additional_info: String,
    /// Offer the closest previously generated scenarios as context
    pub use_similar_context: bool,
}

impl GeneratorConfig {
    /// Config with conventional file locations under the current
    /// directory.
    #[must_use]
    pub fn new(components_dir: impl Into<PathBuf>) -> Self {
        Self {
            components_dir: components_dir.into(),
            design_doc: None,
            features_dir: PathBuf::from("features"),
            cache_file: PathBuf::from("bdd-cache.json"),
            memory_file: PathBuf::from("bdd-memory.json"),
            additional_info: DEFAULT_ADDITIONAL_INFO.to_string(),
            use_similar_context: false,
        }
    }

    /// Check the input paths before any model call is made.
    pub fn validate(&self) -> Result<()> {
        if !self.components_dir.is_dir() {
            return Err(Error::InvalidPath {
                path: self.components_dir.clone(),
            });
        }
        if let Some(doc) = &self.design_doc {
            if !doc.is_file() {
                return Err(Error::InvalidPath { path: doc.clone() });
            }
        }
        Ok(())
    }
}

/// Closest prior component offered to the generator as an example.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarContext {
    pub file_path: String,
    pub code: String,
    pub tests: Option<String>,
    pub similarity: f32,
}

/// What one run did, per component.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Components regenerated this run, in processing order
    pub generated: Vec<String>,
    /// Components served from the cache, in processing order
    pub reused: Vec<String>,
    /// Scenario files written
    pub features_written: usize,
}

/// The generation pipeline over pluggable collaborators.
pub struct ScenarioPipeline<'a> {
    config: GeneratorConfig,
    generator: &'a dyn TextGenerator,
    embedder: &'a dyn Embedder,
    extractor: &'a dyn DocumentExtractor,
    parser: &'a dyn SourceParser,
}

impl<'a> ScenarioPipeline<'a> {
    #[must_use]
    pub fn new(
        config: GeneratorConfig,
        generator: &'a dyn TextGenerator,
        embedder: &'a dyn Embedder,
        extractor: &'a dyn DocumentExtractor,
        parser: &'a dyn SourceParser,
    ) -> Self {
        Self {
            config,
            generator,
            embedder,
            extractor,
            parser,
        }
    }

    /// Run the full pipeline over every component file.
    pub async fn run(&self) -> Result<RunSummary> {
        self.config.validate()?;
        let mut cache = CacheStore::load(&self.config.cache_file);
        let mut memory = MemoryStore::load(&self.config.memory_file);

        let design_graph = self.resolve_design_graph(&mut cache).await?;
        let files = self.component_files()?;
        let ordered = resolve_test_order(&files, &design_graph);
        tracing::info!(order = ?ordered, "resolved test order");

        fs::create_dir_all(&self.config.features_dir)?;

        let mut summary = RunSummary::default();
        for file in &ordered {
            self.process_component(file, &design_graph, &mut cache, &mut memory, &mut summary)
                .await?;
        }
        cache.save()?;
        Ok(summary)
    }

    /// Build the design graph from the configured document, or fall
    /// back to the cached one.
    async fn resolve_design_graph(&self, cache: &mut CacheStore) -> Result<KnowledgeGraph> {
        if let Some(doc) = &self.config.design_doc {
            let text = self.extractor.extract_text(doc).await?;
            let builder = DesignGraphBuilder::new(self.embedder);
            return builder
                .build(&doc.display().to_string(), &text, cache)
                .await;
        }
        match cache.doc.any_design_graph() {
            Some(graph) => {
                tracing::info!("no design document given, using cached design graph");
                Ok(graph.clone())
            }
            None => Err(Error::MissingDesignGraph),
        }
    }

    /// Component source files, sorted for a stable processing baseline.
    fn component_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.config.components_dir)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.ends_with(".js") || name.ends_with(".jsx") {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn process_component(
        &self,
        file: &str,
        design_graph: &KnowledgeGraph,
        cache: &mut CacheStore,
        memory: &mut MemoryStore,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let path = self.config.components_dir.join(file);
        let file_key = path.display().to_string();
        let mtime = mtime_millis(&path)?;
        let code = fs::read_to_string(&path)?;
        let component_name = bddgen_graph::file_stem(file).to_string();

        let current_code = extract_component_code(&code, &component_name)?;
        let docstring = extract_docstring(&code, &component_name)?;
        let current_embedding = if current_code.trim().is_empty() {
            None
        } else {
            Some(self.embedder.embed(&current_code).await?)
        };

        let record = cache.doc.files.get(&file_key);
        log_drift(&component_name, current_embedding.as_deref(), record);

        let signals = ChangeSignals {
            file_changed: mtime > record.map_or(0, |r| r.mtime),
            code_changed: record.map_or(true, |r| r.code != current_code),
        };

        let text = if should_regenerate(record, &component_name, signals) {
            tracing::info!(component = %component_name, file_changed = signals.file_changed, code_changed = signals.code_changed, "regenerating scenarios");
            remove_stale_features(&self.config.features_dir, &component_name)?;

            let similar = if self.config.use_similar_context {
                retrieve_similar_context(self.embedder, &current_code, cache, &file_key).await?
            } else {
                None
            };

            let code_builder = CodeGraphBuilder::new(self.parser);
            let code_graph = code_builder.build(&file_key, &code, &component_name, cache)?;
            let merged = merge(design_graph, &code_graph, &component_name);
            let context = component_context(&merged, &component_name);
            let base_url = merged.base_url.as_deref().unwrap_or("Not specified");

            let prompt = build_prompt(&PromptInputs {
                code: &current_code,
                context: &context,
                component_name: &component_name,
                similar: similar.as_ref(),
                base_url,
                docstring: &docstring,
                additional_info: &self.config.additional_info,
                memory: memory.turns(&component_name),
            });

            let raw = self.generator.generate(&prompt).await.map_err(|e| {
                Error::GenerationFailed {
                    component: component_name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let cleaned = clean_generated_text(&raw);
            if cleaned.is_empty() {
                return Err(Error::EmptyGeneration {
                    component: component_name.clone(),
                });
            }

            memory.append(&component_name, [Turn::human(prompt), Turn::ai(cleaned.clone())]);
            memory.save()?;

            cache.doc.files.insert(
                file_key.clone(),
                FileRecord {
                    component_name: component_name.clone(),
                    embedding: current_embedding,
                    code: current_code,
                    mtime,
                },
            );
            cache.doc.tests.insert(file_key.clone(), cleaned.clone());
            cache.save()?;

            summary.generated.push(component_name.clone());
            cleaned
        } else {
            tracing::info!(component = %component_name, "reusing cached scenarios");
            let cached = cache.doc.tests.get(&file_key).cloned().ok_or_else(|| {
                Error::MissingCachedText {
                    component: component_name.clone(),
                }
            })?;
            if cached.trim().is_empty() {
                return Err(Error::EmptyGeneration {
                    component: component_name.clone(),
                });
            }
            summary.reused.push(component_name.clone());
            cached
        };

        for unit in split_into_scenarios(&text, &component_name) {
            let out_path = self.config.features_dir.join(&unit.file_name);
            fs::write(&out_path, &unit.content)?;
            tracing::info!(file = %out_path.display(), "scenario written");
            summary.features_written += 1;
        }
        Ok(())
    }
}

fn mtime_millis(path: &Path) -> Result<u64> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64))
}

/// Log how far the component code has drifted from the cached copy.
fn log_drift(component_name: &str, current: Option<&[f32]>, record: Option<&FileRecord>) {
    let cached = record.and_then(|r| r.embedding.as_deref());
    match (current, cached) {
        (Some(current), Some(cached))
            if is_valid_vector(current) && is_valid_vector(cached) =>
        {
            let similarity = cosine_similarity(current, cached);
            tracing::debug!(component = component_name, similarity, "code drift vs cached embedding");
        }
        _ => {
            tracing::debug!(component = component_name, "code drift not computed, embedding missing or zero");
        }
    }
}

/// Scan prior file records for the closest code embedding and offer it
/// as context when it clears [`RETRIEVAL_THRESHOLD`].
pub async fn retrieve_similar_context(
    embedder: &dyn Embedder,
    current_code: &str,
    cache: &CacheStore,
    file_key: &str,
) -> Result<Option<SimilarContext>> {
    let current = embedder.embed(current_code).await?;
    let mut best: Option<SimilarContext> = None;

    for (cached_path, record) in &cache.doc.files {
        let Some(embedding) = &record.embedding else {
            continue;
        };
        let similarity = cosine_similarity(&current, embedding);
        if best.as_ref().map_or(true, |b| similarity > b.similarity) {
            best = Some(SimilarContext {
                file_path: cached_path.clone(),
                code: record.code.clone(),
                tests: cache.doc.tests.get(cached_path).cloned(),
                similarity,
            });
        }
    }

    match best {
        Some(found) if found.similarity > RETRIEVAL_THRESHOLD => {
            tracing::info!(from = %found.file_path, similarity = found.similarity, "retrieved similar context");
            Ok(Some(found))
        }
        _ => {
            tracing::info!(file = file_key, "no sufficiently similar context found");
            Ok(None)
        }
    }
}

/// Render the component's slice of the merged graph as prompt context.
#[must_use]
pub fn component_context(graph: &KnowledgeGraph, component_name: &str) -> String {
    let mut lines = Vec::new();

    if let Some(node) = graph.node(component_name) {
        if node.node_type() == NodeType::Component {
            lines.push(format!("Component: {component_name}"));
            if node.is_landing_page {
                lines.push("Is Landing Page: true".to_string());
            }
            if let Some(route) = &node.route {
                lines.push(format!("Route: {route}"));
            }
            if node.requires_login {
                lines.push("Requires Login: true".to_string());
            }
            if let Some(credentials) = &node.credentials {
                lines.push(format!(
                    "Credentials: {{\"username\":\"{}\",\"password\":\"{}\"}}",
                    credentials.username, credentials.password
                ));
            }
        }
    }

    for edge in graph.outgoing(component_name) {
        match edge.relation {
            Relation::NavigatesTo => lines.push(format!(
                "Navigates to: {} with navigationId: {}",
                edge.to,
                edge.navigation_id.as_deref().unwrap_or("N/A")
            )),
            Relation::Uses => lines.push(format!("Uses API: {}", edge.to)),
            Relation::Contains => {
                let detail = graph.node(&edge.to).map_or_else(String::new, |el| {
                    let tag = el.tag.as_deref().unwrap_or("element");
                    if el.has_action {
                        format!(" ({tag}, actionable)")
                    } else {
                        format!(" ({tag})")
                    }
                });
                lines.push(format!("Contains Element: {}{detail}", edge.to));
            }
            Relation::Requires | Relation::AtRoute => {}
        }
    }

    lines.push(format!(
        "Base URL: {}",
        graph.base_url.as_deref().unwrap_or("Not specified")
    ));
    lines.join("\n")
}

/// Inputs for one prompt render.
pub struct PromptInputs<'a> {
    pub code: &'a str,
    pub context: &'a str,
    pub component_name: &'a str,
    pub similar: Option<&'a SimilarContext>,
    pub base_url: &'a str,
    pub docstring: &'a str,
    pub additional_info: &'a str,
    pub memory: &'a [Turn],
}

fn truncate_code(code: &str, limit: usize) -> String {
    if code.len() <= limit {
        return code.to_string();
    }
    let mut end = limit;
    while !code.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &code[..end])
}

/// Assemble the generation prompt.
///
/// The full component code rides along only when the docstring is
/// missing or too thin to stand alone, or the code is short anyway;
/// either way the embedded code is capped at 1000 characters.
#[must_use]
pub fn build_prompt(inputs: &PromptInputs<'_>) -> String {
    let context_section = match inputs.similar {
        Some(similar) => format!(
            "**Similar Previous BDD Scenarios:**\nCode:\n```javascript\n{}\n```\nScenarios:\n```gherkin\n{}\n```\nSimilarity: {}",
            similar.code,
            similar.tests.as_deref().unwrap_or(""),
            similar.similarity
        ),
        None => "No similar previous code or scenarios found.".to_string(),
    };

    let memory_section = if inputs.memory.is_empty() {
        "No prior conversation history available for this component.".to_string()
    } else {
        let turns: Vec<String> = inputs
            .memory
            .iter()
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect();
        format!(
            "**Conversation History (Memory Buffer):**\n{}",
            turns.join("\n")
        )
    };

    let use_full_code = inputs.docstring == NO_DOCSTRING
        || inputs.docstring.len() < 20
        || inputs.code.len() < 1000;
    let code_section = if use_full_code {
        format!(
            "**React Component Code:**\n```javascript\n{}\n```",
            truncate_code(inputs.code, 1000)
        )
    } else {
        "**Note:** Full code omitted due to length or sufficient docstring; use context and docstring above.".to_string()
    };

    let base_url = inputs.base_url;
    format!(
        r#"Generate multiple BDD test cases in Gherkin format (using Feature, Scenario, Given, When, Then) for the provided React component. The tests must:
- Describe the behavior of the component in a human-readable way, focusing on user interactions and expected outcomes.
- Include at least two positive scenarios (successful cases) and two negative scenarios (failure cases) under a single Feature.
- Use the complete URL in Given steps by combining the base URL and route from the context (e.g., if Base URL is "{base_url}" and Route is "/dashboard", use "I am on the dashboard page at {base_url}/dashboard").
- If the application involves preconditions or specific interactions (e.g., login, data submission):
  - Use the provided "additional_info" to incorporate relevant details into the test steps (e.g., credentials for login, account info for transfers, or minor design changes).
  - For components requiring login (check context for 'Requires Login: true'), include login steps before proceeding:
    - Start with "Given I am on the login page at {base_url}/".
    - Use "additional_info" to specify preconditions or inputs (e.g., "And I enter the provided credentials").
    - Include appropriate actions (e.g., "And I click the 'Login' button").
    - Then proceed to "And I am on the {component_name} page at {base_url}/<route>".
  - For other interactions (e.g., form submission, navigation), adapt "additional_info" as needed.
- If the component is the landing page (identified as 'Is Landing Page: true'), include positive scenarios with valid inputs from "additional_info" and negative scenarios with invalid or missing inputs.
- If the component is not the landing page, include positive scenarios (e.g., successful navigation, submission) and negative scenarios (e.g., invalid input, missing data) testing core functionality with realistic examples based on context, docstring, and "additional_info".
- Use provided context for structural details (e.g., routes, APIs, elements) derived from the cached design knowledge graph.
- Incorporate any minor design changes or updates from "additional_info" without altering the base knowledge graph context.
- Do not use specific attributes like data-testid or id for UI elements; keep descriptions generic.
- Do not include implementation details or automation code.
- Do not include markdown fences; output raw Gherkin text only.
- Ensure proper indentation (2 spaces) and consistent Gherkin syntax.
- Use the conversation history below to maintain consistency with previously generated tests.

{memory_section}

{context_section}

**Combined Knowledge Graph Context for Component:**
{context}

**Component Docstring:**
{docstring}

**Base URL:**
{base_url}

**Additional Info (Including Minor Design Changes):**
{additional_info}

{code_section}"#,
        component_name = inputs.component_name,
        context = inputs.context,
        docstring = inputs.docstring,
        additional_info = inputs.additional_info,
    )
}
