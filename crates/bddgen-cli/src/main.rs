use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use bddgen_core::{GeneratorConfig, MarkupScanner, ScenarioPipeline, DEFAULT_ADDITIONAL_INFO};

mod embedder;
mod extract;
mod gemini;

use embedder::HashedEmbedder;
use extract::FileTextExtractor;
use gemini::GeminiGenerator;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Command::new("bddgen")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Knowledge-graph-driven BDD scenario generator")
        .arg(
            Arg::new("components")
                .long("components")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory of UI component source files"),
        )
        .arg(
            Arg::new("design")
                .long("design")
                .value_parser(value_parser!(PathBuf))
                .help("Design document (PDF or plain text); omit to reuse the cached design graph"),
        )
        .arg(
            Arg::new("features-dir")
                .long("features-dir")
                .default_value("tests/features")
                .value_parser(value_parser!(PathBuf))
                .help("Output directory for .feature files"),
        )
        .arg(
            Arg::new("cache-file")
                .long("cache-file")
                .default_value("cache.json")
                .value_parser(value_parser!(PathBuf))
                .help("Change-detection cache file"),
        )
        .arg(
            Arg::new("memory-file")
                .long("memory-file")
                .default_value("memory-history.json")
                .value_parser(value_parser!(PathBuf))
                .help("Conversation memory file"),
        )
        .arg(
            Arg::new("additional-info")
                .long("additional-info")
                .default_value(DEFAULT_ADDITIONAL_INFO)
                .help("Extra guidance merged into every generation prompt"),
        )
        .arg(
            Arg::new("similar-context")
                .long("similar-context")
                .action(ArgAction::SetTrue)
                .help("Offer the closest previously generated scenarios as prompt context"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .default_value(gemini::DEFAULT_MODEL)
                .help("Generation model name"),
        );

    let matches = cli.get_matches();

    let mut config = GeneratorConfig::new(
        matches
            .get_one::<PathBuf>("components")
            .expect("required argument")
            .clone(),
    );
    config.design_doc = matches.get_one::<PathBuf>("design").cloned();
    config.features_dir = matches
        .get_one::<PathBuf>("features-dir")
        .expect("defaulted argument")
        .clone();
    config.cache_file = matches
        .get_one::<PathBuf>("cache-file")
        .expect("defaulted argument")
        .clone();
    config.memory_file = matches
        .get_one::<PathBuf>("memory-file")
        .expect("defaulted argument")
        .clone();
    config.additional_info = matches
        .get_one::<String>("additional-info")
        .expect("defaulted argument")
        .clone();
    config.use_similar_context = matches.get_flag("similar-context");
    let model = matches
        .get_one::<String>("model")
        .expect("defaulted argument")
        .clone();

    let generator = match GeminiGenerator::from_env(model) {
        Ok(generator) => generator,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };
    let embedder = HashedEmbedder::new();
    let extractor = FileTextExtractor;
    let parser = MarkupScanner;

    let features_dir = config.features_dir.clone();
    let pipeline = ScenarioPipeline::new(config, &generator, &embedder, &extractor, &parser);
    match pipeline.run().await {
        Ok(summary) => {
            println!("Generated: {}", summary.generated.join(", "));
            println!("Reused from cache: {}", summary.reused.join(", "));
            println!(
                "{} scenario file(s) written to {}",
                summary.features_written,
                features_dir.display()
            );
        }
        Err(e) => {
            eprintln!("Error in scenario generation: {e}");
            std::process::exit(if e.is_config() { 2 } else { 1 });
        }
    }
}
