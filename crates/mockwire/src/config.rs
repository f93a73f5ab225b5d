//! Engine configuration
//!
//! Loaded from an optional TOML file layered with `MOCKWIRE__*` environment
//! variables, e.g.
//!
//! ```toml
//! strategies = ["constructor", "field", "method", "setter"]
//! markers = ["inject", "autowired"]
//! constructor_selection = "strict"
//!
//! [primitives]
//! mode = "placeholder"
//! seed = 42
//! ```

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::fallback::PrimitivePolicy;
use crate::marker::{markers, MarkerSet};
use crate::strategy::{ConstructorSelection, InjectionStrategy};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "MOCKWIRE";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Injection strategy names accepted in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Constructor,
    Field,
    Method,
    Setter,
}

impl StrategyKind {
    fn uses_markers(&self) -> bool {
        matches!(self, StrategyKind::Field | StrategyKind::Method)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveMode {
    #[default]
    Zero,
    Placeholder,
}

/// Primitive fallback settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimitivesConfig {
    pub mode: PrimitiveMode,
    /// Only used in placeholder mode
    pub seed: u64,
}

impl PrimitivesConfig {
    pub fn policy(&self) -> PrimitivePolicy {
        match self.mode {
            PrimitiveMode::Zero => PrimitivePolicy::Zero,
            PrimitiveMode::Placeholder => PrimitivePolicy::Placeholder { seed: self.seed },
        }
    }
}

/// Resolution engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub strategies: Vec<StrategyKind>,
    pub markers: Vec<String>,
    pub constructor_selection: ConstructorSelection,
    pub primitives: PrimitivesConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategies: vec![
                StrategyKind::Constructor,
                StrategyKind::Field,
                StrategyKind::Method,
            ],
            markers: vec!["inject".to_string(), "autowired".to_string()],
            constructor_selection: ConstructorSelection::default(),
            primitives: PrimitivesConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Layer `path` (if it exists) and `MOCKWIRE__*` variables over the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading engine configuration from {}", path.display());

        let config = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("strategies")
                    .with_list_parse_key("markers")
                    .try_parsing(true),
            )
            .build()?;
        let engine: EngineConfig = config.try_deserialize()?;
        engine.validate()?;
        Ok(engine)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let engine: EngineConfig = toml::from_str(content)?;
        engine.validate()?;
        Ok(engine)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategies.is_empty() {
            return Err(ConfigError::Validation(
                "at least one injection strategy is required".to_string(),
            ));
        }
        for (position, kind) in self.strategies.iter().enumerate() {
            if self.strategies[..position].contains(kind) {
                return Err(ConfigError::Validation(format!(
                    "strategy {:?} is listed more than once",
                    kind
                )));
            }
        }
        if self.markers.is_empty() && self.strategies.iter().any(StrategyKind::uses_markers) {
            return Err(ConfigError::Validation(
                "field and method strategies need at least one marker".to_string(),
            ));
        }
        Ok(())
    }

    pub fn marker_set(&self) -> MarkerSet {
        markers(self.markers.iter().cloned())
    }

    /// Strategy list in configured order
    pub fn to_strategies(&self) -> Vec<InjectionStrategy> {
        let markers = self.marker_set();
        self.strategies
            .iter()
            .map(|kind| match kind {
                StrategyKind::Constructor => InjectionStrategy::Constructor,
                StrategyKind::Field => InjectionStrategy::MarkedField(markers.clone()),
                StrategyKind::Method => InjectionStrategy::MarkedMethod(markers.clone()),
                StrategyKind::Setter => InjectionStrategy::Setters,
            })
            .collect()
    }
}
