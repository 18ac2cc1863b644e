use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Missing credential: {name}")]
    MissingCredential { name: String },

    #[error("No exact match for {word:?} ({} suggestions)", .suggestions.len())]
    NoExactMatch {
        word: String,
        suggestions: Vec<String>,
    },

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote service unavailable: {message}")]
    RemoteUnavailable { message: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Cached record for {name:?} is corrupt: {message}")]
    CacheCorrupt { name: String, message: String },

    #[error("Unable to save {name:?}: {message}")]
    CacheWriteFailure { name: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value:?} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid input {input:?}: {reason}")]
    InvalidInput { input: String, reason: String },

    #[error("{operation} is not supported by the {backend} store")]
    Unsupported { operation: String, backend: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    Storage,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LexiconError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LexiconError::MissingCredential { .. }
            | LexiconError::ConfigError { .. }
            | LexiconError::InvalidConfigValueError { .. }
            | LexiconError::MissingConfigError { .. } => ErrorCategory::Configuration,
            LexiconError::Http(_) | LexiconError::RemoteUnavailable { .. } => {
                ErrorCategory::Network
            }
            LexiconError::NoExactMatch { .. }
            | LexiconError::MalformedResponse { .. }
            | LexiconError::SerializationError(_) => ErrorCategory::Data,
            LexiconError::CacheCorrupt { .. }
            | LexiconError::CacheWriteFailure { .. }
            | LexiconError::IoError(_)
            | LexiconError::Unsupported { .. } => ErrorCategory::Storage,
            LexiconError::InvalidInput { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LexiconError::NoExactMatch { .. } | LexiconError::InvalidInput { .. } => {
                ErrorSeverity::Low
            }
            LexiconError::Http(_)
            | LexiconError::RemoteUnavailable { .. }
            | LexiconError::MalformedResponse { .. } => ErrorSeverity::Medium,
            LexiconError::CacheCorrupt { .. } | LexiconError::IoError(_) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    /// Errors a batch import records and moves past.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Data | ErrorCategory::Input
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LexiconError::MissingCredential { .. } => {
                "Set DICTIONARY_API_KEY or provider.api_key in the configuration file"
            }
            LexiconError::NoExactMatch { .. } => "Check the spelling or pick one of the suggestions",
            LexiconError::Http(_) | LexiconError::RemoteUnavailable { .. } => {
                "Check the network connection and try again later"
            }
            LexiconError::MalformedResponse { .. } => {
                "The provider returned an unexpected document; verify the endpoint"
            }
            LexiconError::CacheCorrupt { .. } => {
                "Inspect the cache file and remove or repair the corrupt record"
            }
            LexiconError::CacheWriteFailure { .. } | LexiconError::IoError(_) => {
                "Check that the cache location exists and is writable"
            }
            LexiconError::InvalidInput { .. } => {
                "Words must be non-empty; batch lines are `word` or `word,YYYY-MM-DD HH:MM:SS`"
            }
            LexiconError::Unsupported { .. } => "Switch to the file cache backend",
            _ => "Review the configuration file and command-line options",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LexiconError::NoExactMatch { word, suggestions } if suggestions.is_empty() => {
                format!("No definitions found for {:?}", word)
            }
            LexiconError::NoExactMatch { word, suggestions } => {
                let mut message = format!(
                    "{:?} isn't in the dictionary. Spelling suggestions:",
                    word
                );
                for suggestion in suggestions {
                    message.push_str(&format!("\n  • {}", suggestion));
                }
                message
            }
            LexiconError::MissingCredential { name } => {
                format!("The dictionary API key ({}) is not configured", name)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LexiconError>;
