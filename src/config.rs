// Runtime configuration: where the Ollama server lives, where the journal
// goes and which model to use when `--model` is not given.

use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const GENERATE_PATH: &str = "/api/generate";
pub const DEFAULT_MODEL: &str = "mistral";
pub const DEFAULT_LOG_FILE: &str = "ollama_chat_log.jsonl";

/// Resolved settings for one run of the chat client.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub log_file: PathBuf,
    pub default_model: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ChatConfig {
    /// Build the config from `OLLAMA_HOST`, `OLLAMA_CHAT_LOG` and
    /// `OLLAMA_MODEL`, falling back to the defaults above.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            base_url: non_empty("OLLAMA_HOST").unwrap_or(defaults.base_url),
            log_file: non_empty("OLLAMA_CHAT_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            default_model: non_empty("OLLAMA_MODEL").unwrap_or(defaults.default_model),
        }
    }

    /// Full URL of the generation endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), GENERATE_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_local_server() {
        let config = ChatConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.generate_url(), "http://localhost:11434/api/generate");
        assert_eq!(config.log_file, PathBuf::from("ollama_chat_log.jsonl"));
        assert_eq!(config.default_model, "mistral");
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = ChatConfig::from_lookup(lookup_from(&[
            ("OLLAMA_HOST", "http://10.0.0.5:11434/"),
            ("OLLAMA_CHAT_LOG", "/tmp/chat.jsonl"),
            ("OLLAMA_MODEL", "llama3"),
        ]));
        assert_eq!(config.generate_url(), "http://10.0.0.5:11434/api/generate");
        assert_eq!(config.log_file, PathBuf::from("/tmp/chat.jsonl"));
        assert_eq!(config.default_model, "llama3");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let config = ChatConfig::from_lookup(lookup_from(&[("OLLAMA_HOST", "  ")]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
