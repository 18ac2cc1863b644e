use clap::Parser;
use lexicon::config::cli::{Cli, Command};
use lexicon::domain::model::{Origin, Resolved};
use lexicon::domain::ports::{ConfigProvider, LexiconStore};
use lexicon::utils::error::ErrorSeverity;
use lexicon::utils::{logger, validation::Validate};
use lexicon::{
    BatchImporter, CacheBackend, DictionaryApiClient, Lexicon, LexiconConfig, LexiconError, Result,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting lexicon CLI");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, &config).await {
        tracing::error!(
            "❌ lexicon failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

fn load_config(cli: &Cli) -> Result<LexiconConfig> {
    let mut config = LexiconConfig::load(&cli.config)?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

async fn run(cli: &Cli, config: &LexiconConfig) -> Result<()> {
    let store = CacheBackend::from_config(config)?;
    tracing::debug!("Cache backend: {:?}", store.kind());
    let provider = DictionaryApiClient::from_config(config)?;
    let lexicon = Lexicon::new(store, provider);

    match &cli.command {
        Command::Define { words } => define(&lexicon, words).await,
        Command::Batch { file } => {
            let input = tokio::fs::read_to_string(file).await?;
            let importer = BatchImporter::new(&lexicon, config.throttle_window());
            let report = importer.import_text(&input).await;

            println!("Successful definitions: {}", report.succeeded);
            println!("Failed definitions: {}", report.failed.len());
            for failed in &report.failed {
                println!("  • {}", failed);
            }
            Ok(())
        }
        Command::List => {
            let mut records = lexicon.store().all().await?;
            records.sort_by(|a, b| a.name.cmp(&b.name));
            for record in &records {
                println!("{}\t{}", record.name, record.created_at.format("%Y-%m-%d"));
            }
            tracing::info!("{} cached words", records.len());
            Ok(())
        }
        Command::Remove { words } => {
            for word in words {
                if lexicon.remove(word).await? {
                    println!("Removed {}", word);
                } else {
                    println!("{} is not cached", word);
                }
            }
            Ok(())
        }
        Command::Random => {
            match lexicon.random().await? {
                Some(resolved) => print_full(&resolved),
                None => println!("The cache is empty"),
            }
            Ok(())
        }
        Command::Stats => {
            for stat in lexicon.store().stats().await? {
                println!("{}\t{}", stat.label, stat.count);
            }
            Ok(())
        }
        Command::Exists { words } => {
            for word in words {
                let cached = lexicon.exists(word).await?;
                println!("{}\t{}", word, if cached { "cached" } else { "not cached" });
            }
            Ok(())
        }
    }
}

/// Resolves each word in turn. A failed word is reported and the rest still run; the most severe
/// failure decides the exit code.
async fn define(lexicon: &Lexicon<CacheBackend, DictionaryApiClient>, words: &[String]) -> Result<()> {
    let mut worst: Option<LexiconError> = None;

    for word in words {
        match lexicon.resolve(word).await {
            Ok(resolved) if resolved.origin == Origin::Fetched => print_full(&resolved),
            Ok(resolved) => print_summary(&resolved),
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                if worst.as_ref().map_or(true, |w| e.severity() > w.severity()) {
                    worst = Some(e);
                }
            }
        }
    }

    match worst {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn print_full(resolved: &Resolved) {
    for entry in &resolved.document.entries {
        let pronunciation = entry
            .headword
            .pronunciations
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        match &entry.grammatical_function {
            Some(function) => println!("{} [{}] ({})", entry.headword.text, pronunciation, function),
            None => println!("{} [{}]", entry.headword.text, pronunciation),
        }

        for definition in &entry.definitions {
            if let Some(divider) = &definition.verb_divider {
                println!("  {}", divider);
            }
            for sense in &definition.senses {
                let number = sense.number.as_deref().unwrap_or("•");
                println!("  {} {}", number, sense.text);
                for note in &sense.usage_notes {
                    println!("      ({})", note);
                }
                for illustration in &sense.illustrations {
                    println!("      // {}", illustration);
                }
            }
        }

        for cognate in &entry.cognates {
            println!("  {} {}", cognate.label, cognate.targets.join(", "));
        }
        println!();

        if !entry.quotes.is_empty() {
            println!("Quotes");
            for quote in &entry.quotes {
                println!("  {:?}", quote.text);
                println!("  {}, {}, {}\n", quote.source, quote.author, quote.publication_date);
            }
        }
    }
}

fn print_summary(resolved: &Resolved) {
    for entry in &resolved.document.entries {
        match &entry.grammatical_function {
            Some(function) => println!("{} ({})", entry.headword.text, function),
            None => println!("{}", entry.headword.text),
        }
        for short in &entry.short_definitions {
            println!("  • {}", short);
        }
    }
    println!(
        "Added on {}\n",
        resolved.record.created_at.format("%Y-%m-%d")
    );
}
