use clap::{Arg, Command};
use log::LevelFilter;
use phish_triage::analyzer::AnalysisEngine;
use phish_triage::config::Config;
use phish_triage::education::educational_content;
use phish_triage::submission::RawSubmission;
use std::process;

#[tokio::main]
async fn main() {
    let matches = Command::new("phish-triage")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Phishing risk scoring engine with heuristic and AI-assisted analysis")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/phish-triage.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("analyze")
                .long("analyze")
                .value_name("FILE")
                .help("Analyze a submission JSON file ({raw_input, platform_hint?, enrichment?}) and print the verdict")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("education")
                .long("education")
                .value_name("ATTACK_TYPE")
                .help("Print educational content for an attack-type label")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("status")
                .long("status")
                .help("Print service status including AI classifier availability")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    if let Some(attack_type) = matches.get_one::<String>("education") {
        let content = educational_content(attack_type);
        match serde_json::to_string_pretty(&content) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing education content: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        println!("Configuration loaded from: {config_path}");
        println!(
            "Resolver: timeout {}s, max {} redirects",
            config.resolver.timeout_seconds, config.resolver.max_redirects
        );
        println!(
            "Classifier: {}",
            if config.classifier.enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
        if config.classifier.enabled && config.classifier.endpoint.is_none() {
            eprintln!("Error: classifier enabled but no endpoint configured");
            process::exit(1);
        }
        println!("Configuration is valid.");
        return;
    }

    let engine = match AnalysisEngine::new(&config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error initializing analysis engine: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("status") {
        match serde_json::to_string_pretty(&engine.status()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing status: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(submission_file) = matches.get_one::<String>("analyze") {
        if let Err(e) = analyze_file(&engine, submission_file).await {
            eprintln!("Error analyzing submission: {e}");
            process::exit(1);
        }
        return;
    }

    eprintln!("No command given. Try --analyze, --education, --status or --help.");
    process::exit(2);
}

async fn analyze_file(engine: &AnalysisEngine, path: &str) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)?;
    let submission: RawSubmission = serde_json::from_str(&content)?;

    let verdict = engine.analyze(&submission).await;
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}
