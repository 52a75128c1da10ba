//! Configuration loading from TOML files

mod abilities;
mod constants;

pub use abilities::{
    default_abilities, load_ability_catalog, parse_ability_catalog, AbilityCatalog,
    AbilityCategory, AbilityDef, TargetKind,
};
pub use constants::{
    ArmorConstants, ComebackConstants, CoordinationConstants, CritConstants, EffectDefault,
    EffectDefaults, GameConstants, MonsterConstants, PlayerConstants, RacialConstants,
    UltraFailConstants, WarlockConstants,
};

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load a TOML string and deserialize it
pub fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    let config: T = toml::from_str(content)?;
    Ok(config)
}

/// Load game constants from a TOML file, validating ranges
pub fn load_constants(path: &Path) -> Result<GameConstants, ConfigError> {
    let constants: GameConstants = load_toml(path)?;
    constants.validate()?;
    Ok(constants)
}

/// Load game constants from a TOML string, validating ranges
pub fn parse_constants(content: &str) -> Result<GameConstants, ConfigError> {
    let constants: GameConstants = parse_toml(content)?;
    constants.validate()?;
    Ok(constants)
}
