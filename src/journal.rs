// Append-only JSONL journal: one line per completed turn, written to a flat
// file that is reopened in append mode on every call.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::api::GenerateResponse;
use crate::error::ChatError;

const UNKNOWN: &str = "unknown";
const MICROS_PER_SEC: f64 = 1_000_000.0;

/// First 8 hex characters of the SHA-256 of `prompt`.
pub fn prompt_hash(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(8);
    hex
}

/// Round to two decimals the way the journal's numbers always have been:
/// the exact binary value is rounded, and exact ties go to the even digit
/// (`0.015` is stored just below the tie and gives `0.01`; `0.125` is a real
/// tie and gives `0.12`).
fn round2(value: f64) -> f64 {
    // Only odd multiples of 1/8 sit exactly on a `.xx5` boundary.
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths.abs() < 1e15 && (eighths as i64) % 2 != 0 {
        let doubled_hundredths = eighths as i64 * 25;
        let below = (doubled_hundredths - 1).div_euclid(2);
        let even = if below % 2 == 0 { below } else { below + 1 };
        return even as f64 / 100.0;
    }
    // Fixed-precision formatting rounds the exact binary value.
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Renders seconds the way the journal always has: `1.5s`, `2.0s`, `0.0s`.
fn format_seconds(secs: f64) -> String {
    if secs.fract() == 0.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{}s", secs)
    }
}

/// Timing numbers derived from the server's counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnMetrics {
    pub tokens_generated: u64,
    pub generation_secs: f64,
    pub total_secs: f64,
    /// `None` when generation time rounds to zero.
    pub tokens_per_second: Option<f64>,
}

impl TurnMetrics {
    pub fn from_response(resp: &GenerateResponse) -> Self {
        let generation_secs = round2(resp.eval_duration as f64 / MICROS_PER_SEC);
        let total_secs = round2(resp.total_duration as f64 / MICROS_PER_SEC);
        let tokens_per_second = if generation_secs == 0.0 {
            None
        } else {
            Some(round2(resp.eval_count as f64 / generation_secs))
        };
        Self {
            tokens_generated: resp.eval_count,
            generation_secs,
            total_secs,
            tokens_per_second,
        }
    }
}

/// Who and where the prompt came from.
#[derive(Debug, Clone, PartialEq)]
pub struct HostInfo {
    pub username: String,
    pub cwd: String,
    pub shell: String,
    pub os: String,
}

impl HostInfo {
    pub fn capture() -> Self {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let cwd = match std::env::current_dir() {
            Ok(dir) => dir.display().to_string(),
            Err(e) => {
                warn!("could not read current directory: {}", e);
                UNKNOWN.to_string()
            }
        };
        Self {
            username: env("USER")
                .or_else(|| env("USERNAME"))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            cwd,
            shell: env("SHELL").unwrap_or_else(|| UNKNOWN.to_string()),
            os: platform(),
        }
    }
}

fn format_platform(system: &str, release: &str, machine: &str) -> String {
    [system, release, machine]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("-")
}

/// `<system>-<release>-<machine>`, e.g. `Linux-6.8.0-45-generic-x86_64`.
#[cfg(unix)]
fn platform() -> String {
    match nix::sys::utsname::uname() {
        Ok(uts) => format_platform(
            &uts.sysname().to_string_lossy(),
            &uts.release().to_string_lossy(),
            &uts.machine().to_string_lossy(),
        ),
        Err(e) => {
            warn!("uname failed: {}", e);
            format_platform(std::env::consts::OS, "", std::env::consts::ARCH)
        }
    }
}

#[cfg(not(unix))]
fn platform() -> String {
    format_platform(std::env::consts::OS, "", std::env::consts::ARCH)
}

/// ISO-8601 UTC with microseconds, leaving them out when they are all zero.
fn format_timestamp(at: DateTime<Utc>) -> String {
    let precision = if at.timestamp_subsec_micros() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    at.to_rfc3339_opts(precision, false)
}

/// One journal line. Field order is the on-disk order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub timestamp: String,
    pub session_id: String,
    pub username: String,
    pub cwd: String,
    pub shell: String,
    pub os: String,
    pub model: String,
    pub prompt: String,
    pub prompt_hash: String,
    pub response: String,
    pub tokens_generated: u64,
    pub generation_time: String,
    pub total_request_time: String,
    pub tokens_per_second: Option<f64>,
}

impl LogEntry {
    pub fn new(
        session_id: &str,
        model: &str,
        prompt: &str,
        reply: &GenerateResponse,
        host: HostInfo,
        at: DateTime<Utc>,
    ) -> Self {
        let metrics = TurnMetrics::from_response(reply);
        Self {
            timestamp: format_timestamp(at),
            session_id: session_id.to_string(),
            username: host.username,
            cwd: host.cwd,
            shell: host.shell,
            os: host.os,
            model: model.to_string(),
            prompt: prompt.to_string(),
            prompt_hash: prompt_hash(prompt),
            response: reply.text().to_string(),
            tokens_generated: metrics.tokens_generated,
            generation_time: format_seconds(metrics.generation_secs),
            total_request_time: format_seconds(metrics.total_secs),
            tokens_per_second: metrics.tokens_per_second,
        }
    }
}

/// The journal file. Holds only a path; each append opens, writes one line
/// and closes.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &LogEntry) -> Result<(), ChatError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        debug!(path = %self.path.display(), hash = %entry.prompt_hash, "journal entry written");
        Ok(())
    }
}
