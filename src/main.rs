use clap::{Arg, Command};
use log::LevelFilter;
use std::process;
use webrisk::analyzer::AnalyzerService;
use webrisk::models::{RiskLevel, RiskResult};
use webrisk::{api, RiskConfig};

#[tokio::main]
async fn main() {
    let matches = Command::new("webrisk")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Domain risk intelligence: deterministic, explainable triage scoring")
        .arg(
            Arg::new("domain")
                .value_name("DOMAIN")
                .help("Domain to analyze (e.g. example.com or https://example.com/login)"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config/settings.yaml"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Emit the result as JSON instead of the report view")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Write the default configuration file and exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("api-server")
                .long("api-server")
                .help("Start the REST API server instead of analyzing a domain")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("listen")
                .long("listen")
                .value_name("ADDR")
                .help("API server bind address")
                .default_value("0.0.0.0:8080"),
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

    if let Some(path) = matches.get_one::<String>("generate-config") {
        generate_default_config(path);
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
        println!("🔍 Testing configuration: {config_path}");
        println!(
            "  {} suspicious keywords, {} risky TLDs",
            config.suspicious_keywords.len(),
            config.risky_tlds.len()
        );
        println!(
            "  thresholds: medium {} / high {} / critical {}",
            config.risk_thresholds.medium, config.risk_thresholds.high, config.risk_thresholds.critical
        );
        println!("✅ Configuration is valid");
        return;
    }

    let analyzer = AnalyzerService::new(config);

    if matches.get_flag("api-server") {
        let listen = matches.get_one::<String>("listen").unwrap();
        if let Err(e) = api::serve(analyzer, listen).await {
            log::error!("API server error: {e}");
            process::exit(1);
        }
        return;
    }

    let Some(domain) = matches.get_one::<String>("domain") else {
        eprintln!("No domain given. Usage: webrisk <DOMAIN> [--json]");
        eprintln!("Run 'webrisk --help' for all options.");
        process::exit(2);
    };

    let result = match analyzer.analyze(domain).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Invalid domain: {e}");
            process::exit(2);
        }
    };

    if matches.get_flag("json") {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize result: {e}");
                process::exit(1);
            }
        }
    } else {
        render_report(&result);
    }

    // High-risk verdicts exit nonzero so shell pipelines can triage on it.
    match result.classification {
        RiskLevel::Low | RiskLevel::Medium => {}
        RiskLevel::High | RiskLevel::Critical => process::exit(1),
    }
}

fn load_config(path: &str) -> anyhow::Result<RiskConfig> {
    if std::path::Path::new(path).exists() {
        RiskConfig::from_file(path)
    } else {
        log::warn!("configuration file '{path}' not found, using built-in defaults");
        Ok(RiskConfig::default())
    }
}

fn generate_default_config(path: &str) {
    match RiskConfig::default().to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Edit the weights, thresholds and lists to suit your environment.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn render_report(result: &RiskResult) {
    let intel = &result.intelligence;

    println!();
    println!("🔍 Domain Risk Assessment: {}", result.domain);
    println!("══════════════════════════════════════════════════");
    println!("  Risk Score: {}/100", result.score);
    println!("  Risk Level: {}", result.classification);

    println!();
    println!("📡 Signals:");
    match intel.age_days {
        Some(age) => println!("  Domain age: {age} days"),
        None => println!("  Domain age: unknown"),
    }
    println!("  MX records: {}", check_mark(intel.has_mx));
    println!("  SPF record: {}", check_mark(intel.has_spf));
    println!("  TLS valid:  {}", check_mark(intel.ssl_valid));
    if intel.is_self_signed {
        println!("  TLS certificate is self-signed");
    }
    if intel.is_punycode {
        println!("  Punycode labels present");
    }
    if !intel.triggered_keywords.is_empty() {
        println!("  Keywords:   {}", intel.triggered_keywords.join(", "));
    }

    if result.triggered_rules.is_empty() {
        println!();
        println!("✅ No risk rules triggered");
    } else {
        println!();
        println!("⚠️  Triggered Rules:");
        for rule in &result.triggered_rules {
            println!("  • [+{:>2}] {} - {}", rule.weight, rule.rule, rule.justification);
        }
    }

    if !result.patterns.is_empty() {
        println!();
        println!("🧩 Patterns:");
        for pattern in &result.patterns {
            println!("  • {pattern}");
        }
    }

    if !intel.errors.is_empty() {
        println!();
        println!("📭 Collection errors (scored as risk):");
        for error in &intel.errors {
            println!("  • {error}");
        }
    }
    println!();
}

fn check_mark(present: bool) -> &'static str {
    if present {
        "✓"
    } else {
        "✗"
    }
}
