//! End-to-end pipeline tests over deterministic fakes.

use bddgen_core::{
    DesignGraphBuilder, Error, GeneratorConfig, MarkupScanner, MemoryStore, ScenarioPipeline,
};
use bddgen_core::store::CacheStore;
use bddgen_graph::{NodeType, Relation};
use bddgen_test_utils::{
    sample_design_text, FailingGenerator, KeywordEmbedder, PlainTextExtractor, ScriptedGenerator,
};
use std::fs;
use std::path::Path;

const LOGIN_SOURCE: &str = r#"
/**
 * Login form with username and password fields.
 */
function Login() {
  const submit = () => {
    navigate('/dashboard');
  };
  return (
    <form id="login-form">
      <input id="username" />
      <input id="password" />
      <button onClick={submit}>Sign in</button>
    </form>
  );
}
"#;

const DASHBOARD_SOURCE: &str = r#"
// Shows open tasks for the signed-in user.
function Dashboard() {
  return (
    <div>
      <button onClick={refresh}>Refresh</button>
    </div>
  );
}
"#;

const SCRIPTED_GHERKIN: &str = "```gherkin\nFeature: Authentication\n  Scenario: Valid credentials\n    Given I am on the page\n    Then I succeed\n  Scenario: Wrong password\n    Given I am on the page\n    Then I see an error\n```";

fn write_components(dir: &Path) {
    fs::write(dir.join("Login.js"), LOGIN_SOURCE).unwrap();
    fs::write(dir.join("Dashboard.js"), DASHBOARD_SOURCE).unwrap();
    fs::write(dir.join("notes.txt"), "not a component").unwrap();
}

fn test_config(root: &Path) -> GeneratorConfig {
    let mut config = GeneratorConfig::new(root.join("components"));
    config.design_doc = Some(root.join("design.txt"));
    config.features_dir = root.join("features");
    config.cache_file = root.join("cache.json");
    config.memory_file = root.join("memory.json");
    config
}

fn setup(root: &Path) -> GeneratorConfig {
    fs::create_dir_all(root.join("components")).unwrap();
    write_components(&root.join("components"));
    fs::write(root.join("design.txt"), sample_design_text()).unwrap();
    test_config(root)
}

#[tokio::test]
async fn design_graph_captures_the_documented_structure() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = CacheStore::load(dir.path().join("cache.json"));
    let embedder = KeywordEmbedder::new();
    let builder = DesignGraphBuilder::new(&embedder);

    let graph = builder
        .build("design.txt", &sample_design_text(), &mut cache)
        .await
        .unwrap();

    let login = graph.node("Login").unwrap();
    assert_eq!(login.node_type(), NodeType::Component);
    assert!(login.is_landing_page);
    assert_eq!(login.route.as_deref(), Some("/"));
    let credentials = login.credentials.as_ref().unwrap();
    assert_eq!(credentials.username, "admin");
    assert_eq!(credentials.password, "secret");

    let dashboard = graph.node("Dashboard").unwrap();
    assert_eq!(dashboard.node_type(), NodeType::Component);
    assert!(dashboard.requires_login);
    assert_eq!(dashboard.route.as_deref(), Some("/dashboard"));

    assert_eq!(graph.base_url.as_deref(), Some("http://localhost:3000"));
    assert_eq!(graph.landing_page(), Some("Login"));

    assert!(graph.edges.iter().any(|e| e.from == "Login"
        && e.to == "Dashboard"
        && e.relation == Relation::NavigatesTo
        && e.navigation_id.as_deref() == Some("login-btn")));
    assert!(graph
        .edges
        .iter()
        .any(|e| e.from == "Dashboard" && e.to == "Login" && e.relation == Relation::Requires));
    assert!(graph
        .edges
        .iter()
        .any(|e| e.from == "Dashboard" && e.to == "GET /api/tasks" && e.relation == Relation::Uses));
    assert_eq!(
        graph.node("GET /api/tasks").unwrap().method.as_deref(),
        Some("GET")
    );
}

#[tokio::test]
async fn identical_design_text_hits_the_cache_without_embedding() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = CacheStore::load(dir.path().join("cache.json"));
    let embedder = KeywordEmbedder::new();
    let builder = DesignGraphBuilder::new(&embedder);
    let text = sample_design_text();

    let first = builder.build("design.txt", &text, &mut cache).await.unwrap();
    let calls_after_first = embedder.calls();
    assert!(calls_after_first > 0);

    let second = builder.build("design.txt", &text, &mut cache).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(embedder.calls(), calls_after_first);
}

#[tokio::test]
async fn first_run_generates_in_navigation_order_and_writes_features() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let generator = ScriptedGenerator::new(SCRIPTED_GHERKIN);
    let embedder = KeywordEmbedder::new();
    let extractor = PlainTextExtractor;
    let parser = MarkupScanner;
    let pipeline = ScenarioPipeline::new(config.clone(), &generator, &embedder, &extractor, &parser);

    let summary = pipeline.run().await.unwrap();

    // Landing page first, then its navigation target.
    assert_eq!(summary.generated, vec!["Login".to_string(), "Dashboard".to_string()]);
    assert!(summary.reused.is_empty());
    assert_eq!(summary.features_written, 4);

    for name in [
        "login-valid-credentials.feature",
        "login-wrong-password.feature",
        "dashboard-valid-credentials.feature",
        "dashboard-wrong-password.feature",
    ] {
        let content = fs::read_to_string(config.features_dir.join(name)).unwrap();
        assert!(content.starts_with("Feature: Authentication"));
        assert!(!content.contains("```"));
    }

    // Prompts carry the merged-graph context.
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Component: Login"));
    assert!(prompts[0].contains("Is Landing Page: true"));
    assert!(prompts[0].contains("**Base URL:**\nhttp://localhost:3000"));
    assert!(prompts[1].contains("Component: Dashboard"));
    assert!(prompts[1].contains("Requires Login: true"));

    // Memory recorded one Human/AI pair per component.
    let memory = MemoryStore::load(&config.memory_file);
    assert_eq!(memory.turns("Login").len(), 2);
    assert_eq!(memory.turns("Login")[1].role, "AI");
    assert_eq!(memory.turns("Dashboard").len(), 2);
}

#[tokio::test]
async fn unchanged_inputs_reuse_cached_scenarios() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let generator = ScriptedGenerator::new(SCRIPTED_GHERKIN);
    let embedder = KeywordEmbedder::new();
    let extractor = PlainTextExtractor;
    let parser = MarkupScanner;
    let pipeline = ScenarioPipeline::new(config.clone(), &generator, &embedder, &extractor, &parser);

    pipeline.run().await.unwrap();
    let summary = pipeline.run().await.unwrap();

    assert!(summary.generated.is_empty());
    assert_eq!(summary.reused, vec!["Login".to_string(), "Dashboard".to_string()]);
    assert_eq!(summary.features_written, 4);
    // No new generator calls on the second run.
    assert_eq!(generator.prompts().len(), 2);
    // Feature files are rewritten from the cached text.
    assert!(config
        .features_dir
        .join("login-valid-credentials.feature")
        .exists());
}

#[tokio::test]
async fn touched_component_with_changed_code_regenerates_alone() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let generator = ScriptedGenerator::new(SCRIPTED_GHERKIN);
    let embedder = KeywordEmbedder::new();
    let extractor = PlainTextExtractor;
    let parser = MarkupScanner;
    let pipeline = ScenarioPipeline::new(config.clone(), &generator, &embedder, &extractor, &parser);

    pipeline.run().await.unwrap();

    // Let the filesystem timestamp move before rewriting.
    std::thread::sleep(std::time::Duration::from_millis(50));
    let changed = DASHBOARD_SOURCE.replace("Refresh", "Reload");
    fs::write(config.components_dir.join("Dashboard.js"), changed).unwrap();

    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.generated, vec!["Dashboard".to_string()]);
    assert_eq!(summary.reused, vec!["Login".to_string()]);
}

#[tokio::test]
async fn cached_design_graph_serves_runs_without_a_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = setup(dir.path());
    let generator = ScriptedGenerator::new(SCRIPTED_GHERKIN);
    let embedder = KeywordEmbedder::new();
    let extractor = PlainTextExtractor;
    let parser = MarkupScanner;

    let pipeline = ScenarioPipeline::new(config.clone(), &generator, &embedder, &extractor, &parser);
    pipeline.run().await.unwrap();

    // Same cache file, but no design document this time.
    config.design_doc = None;
    let pipeline = ScenarioPipeline::new(config, &generator, &embedder, &extractor, &parser);
    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.reused.len(), 2);
}

#[tokio::test]
async fn missing_design_everywhere_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = setup(dir.path());
    config.design_doc = None;
    let generator = ScriptedGenerator::new(SCRIPTED_GHERKIN);
    let embedder = KeywordEmbedder::new();
    let extractor = PlainTextExtractor;
    let parser = MarkupScanner;

    let pipeline = ScenarioPipeline::new(config, &generator, &embedder, &extractor, &parser);
    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::MissingDesignGraph));
    assert!(err.is_config());
}

#[tokio::test]
async fn missing_components_dir_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::new(dir.path().join("nope"));
    let generator = ScriptedGenerator::new(SCRIPTED_GHERKIN);
    let embedder = KeywordEmbedder::new();
    let extractor = PlainTextExtractor;
    let parser = MarkupScanner;

    let pipeline = ScenarioPipeline::new(config, &generator, &embedder, &extractor, &parser);
    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
}

#[tokio::test]
async fn generator_failure_names_the_component() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let generator = FailingGenerator;
    let embedder = KeywordEmbedder::new();
    let extractor = PlainTextExtractor;
    let parser = MarkupScanner;

    let pipeline = ScenarioPipeline::new(config, &generator, &embedder, &extractor, &parser);
    let err = pipeline.run().await.unwrap_err();
    match err {
        Error::GenerationFailed { component, .. } => assert_eq!(component, "Login"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn fence_only_output_is_rejected_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let generator = ScriptedGenerator::new("```gherkin\n```");
    let embedder = KeywordEmbedder::new();
    let extractor = PlainTextExtractor;
    let parser = MarkupScanner;

    let pipeline = ScenarioPipeline::new(config, &generator, &embedder, &extractor, &parser);
    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::EmptyGeneration { .. }));
}
