//! Application configuration structures.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and probing behavior settings
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Source repository and delivery host settings
    #[serde(default)]
    pub repo: RepoConfig,

    /// Per-level filtering and grade-display settings
    #[serde(default = "defaults::levels")]
    pub levels: BTreeMap<String, LevelConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        if !path.as_ref().exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scanner.user_agent.trim().is_empty() {
            return Err(AppError::validation("scanner.user_agent is empty"));
        }
        if self.scanner.timeout_secs == 0 {
            return Err(AppError::validation("scanner.timeout_secs must be > 0"));
        }
        if self.scanner.probe_timeout_secs == 0 {
            return Err(AppError::validation(
                "scanner.probe_timeout_secs must be > 0",
            ));
        }
        if self.scanner.max_concurrent == 0 {
            return Err(AppError::validation("scanner.max_concurrent must be > 0"));
        }
        if self.repo.owner.trim().is_empty() || self.repo.repo.trim().is_empty() {
            return Err(AppError::validation("repo.owner and repo.repo are required"));
        }
        if self.levels.is_empty() {
            return Err(AppError::validation("No levels defined"));
        }
        Ok(())
    }

    /// Whether a level is enabled. Levels absent from the map are enabled.
    pub fn level_enabled(&self, key: LevelKey) -> bool {
        self.levels.get(key.as_str()).is_none_or(|l| l.enabled)
    }

    /// Whether grades are shown for a level. Defaults to true when the level
    /// is unknown or unconfigured.
    pub fn show_grades(&self, key: Option<LevelKey>) -> bool {
        key.and_then(|k| self.levels.get(k.as_str()))
            .is_none_or(|l| l.show_grades)
    }

    /// Compile each level's ignore patterns into a glob set.
    pub fn build_ignore_sets(&self) -> Result<HashMap<LevelKey, GlobSet>> {
        let mut sets = HashMap::new();
        for (key, level) in &self.levels {
            let Some(level_key) = LevelKey::from_key(key) else {
                log::warn!("Unknown level key '{}' in configuration", key);
                continue;
            };
            if level.ignore_patterns.is_empty() {
                continue;
            }
            let mut builder = GlobSetBuilder::new();
            for pattern in &level.ignore_patterns {
                let glob = Glob::new(pattern).map_err(|e| {
                    AppError::config(format!("invalid ignore pattern '{pattern}': {e}"))
                })?;
                builder.add(glob);
            }
            let set = builder
                .build()
                .map_err(|e| AppError::config(e.to_string()))?;
            sets.insert(level_key, set);
        }
        Ok(sets)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scanner: ScannerConfig::default(),
            repo: RepoConfig::default(),
            levels: defaults::levels(),
        }
    }
}

/// HTTP client and probing behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout for the tree fetch in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Timeout for a single CDN probe in seconds
    #[serde(default = "defaults::probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Maximum concurrent probes
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// GitHub API token for higher rate limits
    #[serde(default)]
    pub github_token: Option<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            probe_timeout_secs: defaults::probe_timeout(),
            max_concurrent: defaults::max_concurrent(),
            github_token: None,
        }
    }
}

/// Source repository coordinates and delivery hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Repository owner
    #[serde(default = "defaults::owner")]
    pub owner: String,

    /// Repository name
    #[serde(default = "defaults::repo")]
    pub repo: String,

    /// Branch to scan
    #[serde(default = "defaults::branch")]
    pub branch: String,

    /// GitHub API host
    #[serde(default = "defaults::api_host")]
    pub api_host: String,

    /// Direct-origin (raw file) host
    #[serde(default = "defaults::origin_host")]
    pub origin_host: String,

    /// CDN mirror host
    #[serde(default = "defaults::cdn_host")]
    pub cdn_host: String,

    /// Proxy host used when the mirror is unreachable
    #[serde(default = "defaults::proxy_host")]
    pub proxy_host: String,
}

impl RepoConfig {
    /// Trees API endpoint for the configured repository and branch.
    pub fn trees_api_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/git/trees/{}",
            self.api_host, self.owner, self.repo, self.branch
        )
    }
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            owner: defaults::owner(),
            repo: defaults::repo(),
            branch: defaults::branch(),
            api_host: defaults::api_host(),
            origin_host: defaults::origin_host(),
            cdn_host: defaults::cdn_host(),
            proxy_host: defaults::proxy_host(),
        }
    }
}

/// Filtering and grade-display settings for one education level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Whether paths under this level are processed at all
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Glob patterns excluding individual paths within the level
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Whether grade labels are extracted (false maps everything to "course")
    #[serde(default = "defaults::enabled")]
    pub show_grades: bool,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ignore_patterns: Vec::new(),
            show_grades: true,
        }
    }
}

/// Canonical configuration key for an education level directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelKey {
    Xiaoxue,
    Chuzhong,
    Gaozhong,
    Daxue,
    Xiaoxue45,
    Chuzhong45,
}

impl LevelKey {
    pub const ALL: [LevelKey; 6] = [
        LevelKey::Xiaoxue,
        LevelKey::Chuzhong,
        LevelKey::Gaozhong,
        LevelKey::Daxue,
        LevelKey::Xiaoxue45,
        LevelKey::Chuzhong45,
    ];

    /// Map a top-level directory label to its configuration key.
    pub fn from_level_label(label: &str) -> Option<Self> {
        match label {
            "小学" => Some(LevelKey::Xiaoxue),
            "初中" => Some(LevelKey::Chuzhong),
            "高中" => Some(LevelKey::Gaozhong),
            "大学" => Some(LevelKey::Daxue),
            "小学45学制" => Some(LevelKey::Xiaoxue45),
            "初中45学制" => Some(LevelKey::Chuzhong45),
            _ => None,
        }
    }

    /// Map a repository path to its level key via the first segment.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::from_level_label(path.split('/').next()?)
    }

    /// Parse a configuration map key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "xiaoxue" => Some(LevelKey::Xiaoxue),
            "chuzhong" => Some(LevelKey::Chuzhong),
            "gaozhong" => Some(LevelKey::Gaozhong),
            "daxue" => Some(LevelKey::Daxue),
            "xiaoxue45" => Some(LevelKey::Xiaoxue45),
            "chuzhong45" => Some(LevelKey::Chuzhong45),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelKey::Xiaoxue => "xiaoxue",
            LevelKey::Chuzhong => "chuzhong",
            LevelKey::Gaozhong => "gaozhong",
            LevelKey::Daxue => "daxue",
            LevelKey::Xiaoxue45 => "xiaoxue45",
            LevelKey::Chuzhong45 => "chuzhong45",
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;

    use super::{LevelConfig, LevelKey};

    // Scanner defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn probe_timeout() -> u64 {
        10
    }
    pub fn max_concurrent() -> usize {
        15
    }

    // Repository defaults
    pub fn owner() -> String {
        "TapXWorld".into()
    }
    pub fn repo() -> String {
        "ChinaTextbook".into()
    }
    pub fn branch() -> String {
        "master".into()
    }
    pub fn api_host() -> String {
        "https://api.github.com".into()
    }
    pub fn origin_host() -> String {
        "https://raw.githubusercontent.com".into()
    }
    pub fn cdn_host() -> String {
        "https://cdn.jsdelivr.net".into()
    }
    pub fn proxy_host() -> String {
        "https://ghfast.top".into()
    }

    // Level defaults
    pub fn enabled() -> bool {
        true
    }

    /// All six levels enabled; university hides grades.
    pub fn levels() -> BTreeMap<String, LevelConfig> {
        LevelKey::ALL
            .iter()
            .map(|key| {
                (
                    key.as_str().to_string(),
                    LevelConfig {
                        enabled: true,
                        ignore_patterns: Vec::new(),
                        show_grades: *key != LevelKey::Daxue,
                    },
                )
            })
            .collect()
    }
}
