use crate::config::{CacheBackendKind, LexiconConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lexicon")]
#[command(about = "Look up word definitions and keep them in a local lexicon")]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "lexicon.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the cache backend from config
    #[arg(long, value_enum)]
    pub backend: Option<CacheBackendKind>,

    /// Override the file cache directory from config
    #[arg(long)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Define one or more words, fetching the ones not cached yet
    Define {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Import words from a file of `word` or `word,YYYY-MM-DD HH:MM:SS` lines
    Batch { file: PathBuf },
    /// List every cached word
    List,
    /// Remove words from the cache so the next lookup fetches them again
    Remove {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Show a random cached word
    Random,
    /// Show how many words were added per month
    Stats,
    /// Report whether words are cached, without fetching them
    Exists {
        #[arg(required = true)]
        words: Vec<String>,
    },
}

impl Cli {
    pub fn apply_overrides(&self, config: &mut LexiconConfig) {
        if let Some(backend) = self.backend {
            config.cache.backend = backend;
            tracing::info!("🔧 Cache backend overridden to: {:?}", backend);
        }
        if let Some(data_dir) = &self.data_dir {
            config.cache.path = data_dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_with_overrides() {
        let cli = Cli::parse_from([
            "lexicon",
            "--backend",
            "api",
            "--data-dir",
            "/var/lib/lexicon",
            "batch",
            "words.txt",
        ]);

        let mut config = LexiconConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.cache.backend, CacheBackendKind::Api);
        assert_eq!(config.cache.path, "/var/lib/lexicon");
        assert!(matches!(cli.command, Command::Batch { ref file } if file == &PathBuf::from("words.txt")));
    }

    #[test]
    fn test_define_requires_a_word() {
        assert!(Cli::try_parse_from(["lexicon", "define"]).is_err());

        let cli = Cli::parse_from(["lexicon", "define", "anchor", "ankh"]);
        assert!(matches!(cli.command, Command::Define { ref words } if words.len() == 2));
        assert_eq!(cli.config, PathBuf::from("lexicon.toml"));
    }

    #[test]
    fn test_cache_maintenance_commands() {
        let cli = Cli::parse_from(["lexicon", "remove", "anchor"]);
        assert!(matches!(cli.command, Command::Remove { ref words } if words == &["anchor"]));
        assert!(Cli::try_parse_from(["lexicon", "remove"]).is_err());

        assert!(matches!(Cli::parse_from(["lexicon", "random"]).command, Command::Random));
        assert!(matches!(Cli::parse_from(["lexicon", "stats"]).command, Command::Stats));
        assert!(matches!(
            Cli::parse_from(["lexicon", "exists", "a", "b"]).command,
            Command::Exists { ref words } if words.len() == 2
        ));
    }
}
