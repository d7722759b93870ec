use std::env;
use std::time::Duration;

use tutor_core::classify::{ClassifierConfig, QualityScale};

use crate::stockfish::EngineOptions;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub stockfish_path: String,
    pub engine_threads: u32,
    pub engine_hash_mb: u32,
    pub engine_read_timeout: Duration,
    pub quality_scale: QualityScale,
    pub hanging_piece_check: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed("PORT").unwrap_or(5000),
            stockfish_path: env::var("STOCKFISH_PATH").unwrap_or_else(|_| "stockfish".to_string()),
            engine_threads: parsed("ENGINE_THREADS").unwrap_or(1),
            engine_hash_mb: parsed("ENGINE_HASH_MB").unwrap_or(64),
            engine_read_timeout: Duration::from_secs(
                parsed("ENGINE_READ_TIMEOUT_SECS").unwrap_or(30),
            ),
            quality_scale: match env::var("QUALITY_SCALE") {
                Ok(v) => v.parse().unwrap_or_else(|e| {
                    tracing::warn!("{e}, using the standard scale");
                    QualityScale::Standard
                }),
                Err(_) => QualityScale::Standard,
            },
            hanging_piece_check: env::var("HANGING_PIECE_CHECK")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            threads: self.engine_threads,
            hash_mb: self.engine_hash_mb,
            read_timeout: self.engine_read_timeout,
        }
    }

    pub fn classifier(&self) -> ClassifierConfig {
        ClassifierConfig {
            scale: self.quality_scale,
            hanging_piece_check: self.hanging_piece_check,
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("true"));
        assert!(is_truthy(" ON "));
        assert!(is_truthy("1"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
    }
}
