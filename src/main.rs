use clap::{Arg, ArgAction, Command};
use log::LevelFilter;
use std::process;
use trusteye::config::{generate_default_config, load_config, Config};
use trusteye::dataset::DatasetLoader;
use trusteye::feedback::{FeedbackStore, FeedbackSubmission, UserJudgment};
use trusteye::url_resolver::UrlResolver;
use trusteye::{FlatUrlVariant, FlatVariant, PhishingAnalyzer, RiskAssessment, TextMode};

#[tokio::main]
async fn main() {
    let matches = Command::new("trusteye")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Heuristic phishing risk scoring for text, URLs and e-mail")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("trusteye.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("text")
                .long("text")
                .value_name("TEXT")
                .help("Analyze a message body")
                .conflicts_with_all(["url", "email"]),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_name("MODE")
                .help("Text analysis mode")
                .value_parser(["full", "flat"])
                .default_value("full"),
        )
        .arg(
            Arg::new("flat-variant")
                .long("flat-variant")
                .value_name("POINTS")
                .help("Points per pattern in flat text mode")
                .value_parser(["20", "25"])
                .default_value("20"),
        )
        .arg(
            Arg::new("url")
                .long("url")
                .value_name("URL")
                .help("Analyze a URL")
                .conflicts_with("email"),
        )
        .arg(
            Arg::new("url-mode")
                .long("url-mode")
                .value_name("MODE")
                .help("URL analysis mode")
                .value_parser(["full", "extended", "minimal"])
                .default_value("full"),
        )
        .arg(
            Arg::new("follow-redirects")
                .long("follow-redirects")
                .help("Also resolve the URL's real redirect chain over the network")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .value_name("TEXT")
                .help("Analyze an e-mail address or message"),
        )
        .arg(
            Arg::new("feedback")
                .long("feedback")
                .value_name("JUDGMENT")
                .help("Record feedback on this analysis (correct, incorrect, false_positive, false_negative)"),
        )
        .arg(
            Arg::new("actual")
                .long("actual")
                .value_name("BOOL")
                .help("Ground truth for the feedback record")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new("comments")
                .long("comments")
                .value_name("TEXT")
                .help("Free-form feedback comments"),
        )
        .arg(
            Arg::new("feedback-stats")
                .long("feedback-stats")
                .help("Show feedback accuracy statistics")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dataset-stats")
                .long("dataset-stats")
                .help("Show labeled dataset statistics")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("status")
                .long("status")
                .help("Show engine status")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("trusteye.yaml");
    let loaded = load_config(config_path);

    let configured_level = loaded.as_ref().ok().map(|c| c.logging.level_filter());
    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        configured_level.flatten().unwrap_or(LevelFilter::Info)
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        match generate_default_config(generate_path) {
            Ok(()) => println!("✅ Default configuration written to: {generate_path}"),
            Err(e) => {
                eprintln!("❌ Failed to generate configuration: {e:#}");
                process::exit(1);
            }
        }
        return;
    }

    let config = match loaded {
        Ok(config) => {
            log::info!("Loaded configuration from: {}", config_path);
            if configured_level == Some(None) {
                log::warn!(
                    "Unknown logging level {:?}, using info",
                    config.logging.level
                );
            }
            config
        }
        Err(e) => {
            log::warn!("Failed to load config ({:#}), using defaults", e);
            Config::default()
        }
    };

    if matches.get_flag("dataset-stats") {
        show_dataset_stats(&config);
        return;
    }

    if matches.get_flag("feedback-stats") {
        show_feedback_stats(&config);
        return;
    }

    let corpus = DatasetLoader::new(&config.data_dir).load();
    let analyzer = PhishingAnalyzer::from_config(&config, &corpus);

    if matches.get_flag("status") {
        print_json(&analyzer.status());
        return;
    }

    let assessment = if let Some(text) = matches.get_one::<String>("text") {
        let mode = match matches.get_one::<String>("mode").map(String::as_str) {
            Some("flat") => {
                let variant = matches
                    .get_one::<String>("flat-variant")
                    .and_then(|p| p.parse().ok())
                    .and_then(FlatVariant::from_points)
                    .unwrap_or(FlatVariant::Flat20);
                TextMode::Flat(variant)
            }
            _ => TextMode::Full,
        };
        analyzer.analyze_text(text, mode)
    } else if let Some(url) = matches.get_one::<String>("url") {
        match matches.get_one::<String>("url-mode").map(String::as_str) {
            Some("extended") => analyzer.analyze_url_flat(url, FlatUrlVariant::Extended),
            Some("minimal") => analyzer.analyze_url_flat(url, FlatUrlVariant::Minimal),
            _ => analyzer.analyze_url(url),
        }
    } else if let Some(email) = matches.get_one::<String>("email") {
        analyzer.analyze_email(email)
    } else {
        eprintln!("Nothing to do: pass --text, --url, --email or one of the stats flags (see --help)");
        process::exit(2);
    };

    if matches.get_flag("follow-redirects") && matches.contains_id("url") {
        let resolved = match UrlResolver::new(&config.resolver) {
            Ok(resolver) => resolver.resolve_chain(&assessment.input).await,
            Err(e) => Err(e),
        };
        match resolved {
            Ok(chain) => print_json(&serde_json::json!({
                "assessment": assessment,
                "resolved_redirects": chain,
            })),
            Err(e) => {
                log::warn!("Redirect resolution failed: {e:#}");
                print_json(&serde_json::json!({
                    "assessment": assessment,
                    "resolved_redirects": null,
                }));
            }
        }
    } else {
        print_json(&assessment);
    }

    if let Some(judgment) = matches.get_one::<String>("feedback") {
        if let Err(e) = record_feedback(&config, &assessment, judgment, &matches) {
            eprintln!("❌ Failed to record feedback: {e:#}");
            process::exit(1);
        }
    }
}

fn record_feedback(
    config: &Config,
    assessment: &RiskAssessment,
    judgment: &str,
    matches: &clap::ArgMatches,
) -> anyhow::Result<()> {
    let user_feedback: UserJudgment = judgment.parse()?;
    let submission = FeedbackSubmission {
        analysis_type: format!("{:?}", assessment.kind).to_lowercase(),
        input_data: assessment.input.clone(),
        predicted_result: serde_json::json!({
            "is_phishing": assessment.is_phishing,
            "confidence": assessment.confidence,
            "scale": assessment.scale,
            "risk_level": assessment.risk_level,
            "mode": assessment.mode,
        }),
        user_feedback,
        actual_result: matches.get_one::<bool>("actual").copied(),
        comments: matches.get_one::<String>("comments").cloned(),
    };

    let id = FeedbackStore::json_file(&config.feedback_path).record(submission)?;
    println!("✅ Feedback stored as {id}");
    Ok(())
}

fn show_dataset_stats(config: &Config) {
    let stats = DatasetLoader::new(&config.data_dir).load().stats();

    println!("📚 TrustEye Dataset Statistics");
    println!("═══════════════════════════════════════");
    println!("  Total Samples: {}", stats.total_samples);
    for (name, split) in [
        ("E-mails", &stats.emails),
        ("SMS", &stats.sms),
        ("URLs", &stats.urls),
    ] {
        println!(
            "  ├─ {}: {} ({} phishing, {} legitimate)",
            name, split.total, split.phishing, split.legitimate
        );
    }
}

fn show_feedback_stats(config: &Config) {
    let stats = match FeedbackStore::json_file(&config.feedback_path).stats() {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("❌ Failed to read feedback: {e:#}");
            process::exit(1);
        }
    };

    println!("📊 TrustEye Feedback Statistics");
    println!("═══════════════════════════════════════");
    println!("  Total Feedback: {}", stats.total_feedback);
    println!("  Correct Predictions: {}", stats.correct_predictions);
    println!("  Accuracy: {:.1}%", stats.accuracy * 100.0);

    if !stats.recent_feedback.is_empty() {
        println!();
        println!("🕒 Recent Feedback:");
        for record in &stats.recent_feedback {
            println!(
                "  • {} [{}] {:?}: {}",
                record.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                record.submission.analysis_type,
                record.submission.user_feedback,
                truncate_string(&record.submission.input_data, 60)
            );
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("❌ Failed to serialize output: {e}");
            process::exit(1);
        }
    }
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
