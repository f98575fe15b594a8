use std::{
    env, fs,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            database_path: data_root().join("showbill.sqlite"),
        }
    }
}

impl AppConfig {
    /// Config file first (if present), then env overrides `SHOWBILL_ADDR`
    /// and `SHOWBILL_DB`.
    pub fn load() -> Self {
        let path = config_path();
        let mut config = read_config(&path).unwrap_or_else(|err| {
            eprintln!("failed to read config {path:?}: {err}");
            AppConfig::default()
        });
        if let Ok(addr) = env::var("SHOWBILL_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(db) = env::var("SHOWBILL_DB") {
            config.database_path = PathBuf::from(db);
        }
        config
    }
}

/// Platform data directory for the app, created on first use; falls back to
/// the working directory when no platform dir is available.
fn data_root() -> &'static Path {
    static ROOT: Lazy<PathBuf> = Lazy::new(|| {
        let base = dirs::data_dir()
            .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let root = base.join("showbill");
        if let Err(err) = fs::create_dir_all(&root) {
            eprintln!("failed to create data root {root:?}: {err}");
        }
        root
    });
    &ROOT
}

fn config_path() -> PathBuf {
    data_root().join("config.json")
}

fn read_config(path: &Path) -> Result<AppConfig, String> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| err.to_string())?;
    serde_json::from_str(&contents).map_err(|err| err.to_string())
}
