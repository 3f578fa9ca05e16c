// Library root
// -----------
// The binary (`main.rs`) parses flags and hands off to `ui::run_chat`.
//
// Module responsibilities:
// - `config`: endpoint, journal path and default model (env overridable).
// - `api`: the blocking HTTP exchange with Ollama's generate endpoint.
// - `journal`: the JSONL record written after every completed turn.
// - `spinner`: the "Thinking..." indicator shown while a request runs.
// - `ui`: the prompt loop tying the above together.
pub mod api;
pub mod config;
pub mod error;
pub mod journal;
pub mod spinner;
pub mod ui;

pub use api::{Generate, GenerateResponse, OllamaClient};
pub use config::ChatConfig;
pub use error::ChatError;
pub use journal::{Journal, LogEntry};
pub use ui::{ChatLoop, LineSource, LoopExit};

/// A fresh random session id (UUID v4).
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_session_ids_differ() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }
}
