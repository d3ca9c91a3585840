use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;

use crate::error::{Error, Result};
use crate::execution::Language;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5001";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut cfg = Self::load_from(&default_config_path());

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                cfg.inner.insert(k, v);
            }
        }
        cfg.apply_aliases();
        cfg
    }

    /// Defaults overlaid with the rc file at `path`, without consulting the environment.
    pub fn load_from(path: &Path) -> Self {
        let mut map = default_map();

        if path.exists() {
            if let Ok(file) = fs::File::open(path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(|l| l.ok()) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        let mut cfg = Self { inner: map, config_path: path.to_path_buf() };
        cfg.apply_aliases();
        cfg
    }

    // The web build reads VITE_BACKEND_URL; honor it when BACKEND_URL was left at its default.
    fn apply_aliases(&mut self) {
        if let Some(alias) = self.inner.get("VITE_BACKEND_URL").cloned() {
            if self.inner.get("BACKEND_URL").map(String::as_str) == Some(DEFAULT_BACKEND_URL) {
                self.inner.insert("BACKEND_URL".into(), alias);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn backend_url(&self) -> String {
        self.get("BACKEND_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    /// Outbound request timeout. Unset or `0` means no timeout is applied.
    pub fn request_timeout(&self) -> Result<Option<Duration>> {
        match self.get("REQUEST_TIMEOUT") {
            None => Ok(None),
            Some(v) if v.trim().is_empty() => Ok(None),
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map(|secs| (secs > 0).then(|| Duration::from_secs(secs)))
                .map_err(|_| Error::Config { key: "REQUEST_TIMEOUT".into(), value: v }),
        }
    }

    pub fn default_language(&self) -> Result<Language> {
        let v = self.get("DEFAULT_LANGUAGE").unwrap_or_else(|| "python".into());
        v.parse::<Language>()
            .map_err(|_| Error::Config { key: "DEFAULT_LANGUAGE".into(), value: v })
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "BACKEND_URL",
        "VITE_BACKEND_URL",
        "DEFAULT_LANGUAGE",
        "REQUEST_TIMEOUT",
        "RENDER_HTML",
        "PRETTIFY_OUTPUT",
    ];

    KEYS.contains(&k) || k.starts_with("CODEPLAY_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("codeplay").join(".codeplayrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("BACKEND_URL".into(), DEFAULT_BACKEND_URL.into());
    m.insert("DEFAULT_LANGUAGE".into(), "python".into());

    // Bools as strings
    m.insert("RENDER_HTML".into(), "false".into());
    m.insert("PRETTIFY_OUTPUT".into(), "true".into());

    m
}
