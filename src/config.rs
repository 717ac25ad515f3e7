//! Runtime configuration
//!
//! The data directory is resolved from, in order: the `--data-dir` flag, the
//! `RECIPECTL_DATA_DIR` environment variable, the platform data directory,
//! and finally `./.recipectl`.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "RECIPECTL_DATA_DIR";

const APP_DIR_NAME: &str = "recipectl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
}

impl Config {
    pub fn resolve(data_dir_flag: Option<PathBuf>) -> Self {
        let from_env = env::var_os(DATA_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::from_sources(data_dir_flag, from_env, dirs::data_dir())
    }

    fn from_sources(flag: Option<PathBuf>, env: Option<PathBuf>, platform: Option<PathBuf>) -> Self {
        let data_dir = flag
            .or(env)
            .or_else(|| platform.map(|dir| dir.join(APP_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR_NAME)));
        Self { data_dir }
    }
}
