// src/config.rs
// Process-wide defaults, read once from the environment.
//
//   RLEX_BACKEND   table | direct        (default: table)
//   RLEX_CHUNK     bytes per read for ReaderSource (default: 4096)
//   RLEX_VERBOSE   1/true to print per-token output in the demo

use std::sync::OnceLock;

use crate::lexer::Backend;

#[derive(Debug, Clone)]
pub struct LexConfig {
    pub backend: Backend,
    pub chunk_size: usize,
    pub verbose: bool,
}

impl Default for LexConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Table,
            chunk_size: 4096,
            verbose: false,
        }
    }
}

pub fn env_flag_true(var: &str, default: bool) -> bool {
    std::env::var(var)
        .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
        .unwrap_or(default)
}

pub fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(default)
}

pub fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}

impl LexConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let backend = match std::env::var("RLEX_BACKEND") {
            Ok(v) => v.parse().unwrap_or_else(|e| {
                log::warn!("RLEX_BACKEND: {e}; using {}", defaults.backend);
                defaults.backend
            }),
            Err(_) => defaults.backend,
        };
        Self {
            backend,
            chunk_size: env_usize("RLEX_CHUNK", defaults.chunk_size).max(1),
            verbose: env_flag_true("RLEX_VERBOSE", defaults.verbose),
        }
    }
}

/// The environment-derived configuration, computed on first use.
pub fn config() -> &'static LexConfig {
    static CONFIG: OnceLock<LexConfig> = OnceLock::new();
    CONFIG.get_or_init(LexConfig::from_env)
}
