//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::graph::{EvidenceThresholds, ReferencePolicy};
use crate::domain::rate_distortion::{KneeStrategy, LinearRedundancy, RateDistortionAnalyzer};
use crate::retrieval::HeuristicRetriever;
use crate::session::ConfidenceModel;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "INTENTGRAPH_CONFIG_DIR";

/// Intentgraph configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub graph: GraphConfig,
    pub retrieval: RetrievalConfig,
    pub session: SessionConfig,
    pub rate_distortion: RateDistortionConfig,
    pub governance: GovernanceConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub reference_policy: ReferencePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub base_evidence: usize,
    pub domain_bonus: usize,
    pub words_per_bonus: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub base_confidence: f32,
    pub per_evidence: f32,
    pub max_confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateDistortionConfig {
    pub slope: f64,
    pub floor: f64,
    pub knee_strategy: KneeStrategy,
    pub default_batch_sizes: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    pub virology_min: usize,
    pub genomics_min: usize,
    pub treatment_min: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Snapshot file used when `--graph` is not given
    pub default_path: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        let heuristic = HeuristicRetriever::default();
        Self {
            base_evidence: heuristic.base_evidence,
            domain_bonus: heuristic.domain_bonus,
            words_per_bonus: heuristic.words_per_bonus,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let model = ConfidenceModel::default();
        Self {
            base_confidence: model.base_confidence,
            per_evidence: model.per_evidence,
            max_confidence: model.max_confidence,
        }
    }
}

impl Default for RateDistortionConfig {
    fn default() -> Self {
        let model = LinearRedundancy::default();
        Self {
            slope: model.slope,
            floor: model.floor,
            knee_strategy: KneeStrategy::default(),
            default_batch_sizes: vec![5, 10, 15, 20, 25],
        }
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        let thresholds = EvidenceThresholds::default();
        Self {
            virology_min: thresholds.virology_min,
            genomics_min: thresholds.genomics_min,
            treatment_min: thresholds.treatment_min,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_path: "intentgraph.json".to_string(),
        }
    }
}

const KEYS: &[&str] = &[
    "graph.reference_policy",
    "retrieval.base_evidence",
    "retrieval.domain_bonus",
    "retrieval.words_per_bonus",
    "session.base_confidence",
    "session.per_evidence",
    "session.max_confidence",
    "rate_distortion.slope",
    "rate_distortion.floor",
    "rate_distortion.knee_strategy",
    "rate_distortion.default_batch_sizes",
    "governance.virology_min",
    "governance.genomics_min",
    "governance.treatment_min",
    "export.default_path",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("intentgraph")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let s = &self.session;
        for (name, value) in [
            ("session.base_confidence", s.base_confidence),
            ("session.per_evidence", s.per_evidence),
            ("session.max_confidence", s.max_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be between 0.0 and 1.0, got {}", name, value));
            }
        }
        if s.base_confidence > s.max_confidence {
            return Err(anyhow!("session.base_confidence must not exceed session.max_confidence"));
        }

        let rd = &self.rate_distortion;
        if !(rd.slope.is_finite() && rd.slope >= 0.0) {
            return Err(anyhow!("rate_distortion.slope must be non-negative"));
        }
        if !(0.0..=1.0).contains(&rd.floor) {
            return Err(anyhow!("rate_distortion.floor must be between 0.0 and 1.0"));
        }
        if rd.default_batch_sizes.is_empty() {
            return Err(anyhow!("rate_distortion.default_batch_sizes must not be empty"));
        }

        if self.retrieval.words_per_bonus == 0 {
            return Err(anyhow!("retrieval.words_per_bonus must be at least 1"));
        }
        if self.export.default_path.trim().is_empty() {
            return Err(anyhow!("export.default_path must not be empty"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        let value = match key {
            "graph.reference_policy" => self.graph.reference_policy.to_string(),

            "retrieval.base_evidence" => self.retrieval.base_evidence.to_string(),
            "retrieval.domain_bonus" => self.retrieval.domain_bonus.to_string(),
            "retrieval.words_per_bonus" => self.retrieval.words_per_bonus.to_string(),

            "session.base_confidence" => self.session.base_confidence.to_string(),
            "session.per_evidence" => self.session.per_evidence.to_string(),
            "session.max_confidence" => self.session.max_confidence.to_string(),

            "rate_distortion.slope" => self.rate_distortion.slope.to_string(),
            "rate_distortion.floor" => self.rate_distortion.floor.to_string(),
            "rate_distortion.knee_strategy" => self.rate_distortion.knee_strategy.to_string(),
            "rate_distortion.default_batch_sizes" => self
                .rate_distortion
                .default_batch_sizes
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", "),

            "governance.virology_min" => self.governance.virology_min.to_string(),
            "governance.genomics_min" => self.governance.genomics_min.to_string(),
            "governance.treatment_min" => self.governance.treatment_min.to_string(),

            "export.default_path" => self.export.default_path.clone(),

            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a configuration value by key
    ///
    /// The whole config is re-validated; on failure nothing changes.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut next = self.clone();
        match key {
            "graph.reference_policy" => {
                next.graph.reference_policy = ReferencePolicy::parse(value).ok_or_else(|| {
                    anyhow!(
                        "Invalid reference policy: {}. Valid options: strict, permissive",
                        value
                    )
                })?;
            }

            "retrieval.base_evidence" => next.retrieval.base_evidence = parse(key, value)?,
            "retrieval.domain_bonus" => next.retrieval.domain_bonus = parse(key, value)?,
            "retrieval.words_per_bonus" => next.retrieval.words_per_bonus = parse(key, value)?,

            "session.base_confidence" => next.session.base_confidence = parse(key, value)?,
            "session.per_evidence" => next.session.per_evidence = parse(key, value)?,
            "session.max_confidence" => next.session.max_confidence = parse(key, value)?,

            "rate_distortion.slope" => next.rate_distortion.slope = parse(key, value)?,
            "rate_distortion.floor" => next.rate_distortion.floor = parse(key, value)?,
            "rate_distortion.knee_strategy" => {
                next.rate_distortion.knee_strategy =
                    KneeStrategy::parse(value).ok_or_else(|| {
                        anyhow!(
                            "Invalid knee strategy: {}. Valid options: min_combined, max_curvature",
                            value
                        )
                    })?;
            }
            "rate_distortion.default_batch_sizes" => {
                next.rate_distortion.default_batch_sizes = parse_batch_sizes(value)?;
            }

            "governance.virology_min" => next.governance.virology_min = parse(key, value)?,
            "governance.genomics_min" => next.governance.genomics_min = parse(key, value)?,
            "governance.treatment_min" => next.governance.treatment_min = parse(key, value)?,

            "export.default_path" => next.export.default_path = value.to_string(),

            _ => return Err(unknown_key(key)),
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }

    /// Heuristic retriever built from the retrieval section
    pub fn retriever(&self) -> HeuristicRetriever {
        HeuristicRetriever {
            base_evidence: self.retrieval.base_evidence,
            domain_bonus: self.retrieval.domain_bonus,
            words_per_bonus: self.retrieval.words_per_bonus,
        }
    }

    /// Step confidence model built from the session section
    pub fn confidence_model(&self) -> ConfidenceModel {
        ConfidenceModel {
            base_confidence: self.session.base_confidence,
            per_evidence: self.session.per_evidence,
            max_confidence: self.session.max_confidence,
        }
    }

    /// Analyzer using the linear redundancy model and configured knee rule
    pub fn analyzer(&self) -> RateDistortionAnalyzer {
        RateDistortionAnalyzer::new(Box::new(LinearRedundancy {
            slope: self.rate_distortion.slope,
            floor: self.rate_distortion.floor,
        }))
        .with_strategy(self.rate_distortion.knee_strategy)
    }

    /// Merge thresholds from the governance section
    pub fn thresholds(&self) -> EvidenceThresholds {
        EvidenceThresholds {
            virology_min: self.governance.virology_min,
            genomics_min: self.governance.genomics_min,
            treatment_min: self.governance.treatment_min,
        }
    }
}

/// Parse a comma-separated batch size list such as `5, 10, 15`
pub fn parse_batch_sizes(value: &str) -> anyhow::Result<Vec<u32>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("Invalid batch size: {}", s))
        })
        .collect()
}

fn parse<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("Invalid {} value: {}", key, value))
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "Unknown configuration key: {}. Use `intentgraph config list` to see available keys.",
        key
    )
}
