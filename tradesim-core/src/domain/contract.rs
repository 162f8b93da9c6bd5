//! Contract specifications: symbol → point value, tick size, tick value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("no contract spec registered for symbol {0:?}")]
    MissingSpec(String),

    #[error("failed to parse contract spec table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Static per-symbol contract economics for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContractSpec {
    /// Dollar value of one full point of price movement per contract.
    pub point_value: f64,
    /// Minimum price increment.
    pub tick_size: f64,
    /// Dollar value of one tick per contract.
    pub tick_value: f64,
}

/// Symbol → [`ContractSpec`] lookup. Pure data, loaded once per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractSpecRegistry {
    specs: HashMap<String, ContractSpec>,
}

impl ContractSpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the CME equity-index futures the research
    /// pipeline trades most often.
    pub fn cme_index_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert("NQ", ContractSpec { point_value: 20.0, tick_size: 0.25, tick_value: 5.0 });
        registry.insert("MNQ", ContractSpec { point_value: 2.0, tick_size: 0.25, tick_value: 0.5 });
        registry.insert("ES", ContractSpec { point_value: 50.0, tick_size: 0.25, tick_value: 12.5 });
        registry.insert("MES", ContractSpec { point_value: 5.0, tick_size: 0.25, tick_value: 1.25 });
        registry
    }

    /// Parse a registry from a TOML table of the form:
    ///
    /// ```toml
    /// [NQ]
    /// point_value = 20.0
    /// tick_size = 0.25
    /// tick_value = 5.0
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, ContractError> {
        let specs: HashMap<String, ContractSpec> = toml::from_str(text)?;
        Ok(Self { specs })
    }

    pub fn insert(&mut self, symbol: impl Into<String>, spec: ContractSpec) {
        self.specs.insert(symbol.into(), spec);
    }

    /// Fail-fast lookup: a traded symbol without a spec is a configuration
    /// error, not something the simulator can default around.
    pub fn get(&self, symbol: &str) -> Result<&ContractSpec, ContractError> {
        self.specs
            .get(symbol)
            .ok_or_else(|| ContractError::MissingSpec(symbol.to_string()))
    }
}
