//! Ability catalog loading
//!
//! The catalog is data only: names, handler keys and numeric parameters.
//! What a handler key does lives in [`crate::abilities`].

use super::ConfigError;
use crate::types::Race;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Broad ability category, which also fixes resolution order within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityCategory {
    Racial,
    Defense,
    Special,
    Heal,
    Attack,
}

impl AbilityCategory {
    /// Lower resolves earlier
    pub fn resolution_priority(&self) -> u8 {
        match self {
            AbilityCategory::Racial => 0,
            AbilityCategory::Defense => 1,
            AbilityCategory::Special => 2,
            AbilityCategory::Heal => 3,
            AbilityCategory::Attack => 4,
        }
    }
}

/// What an ability may be aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Another player (or self)
    Single,
    /// Always the actor
    #[serde(rename = "self")]
    SelfOnly,
    /// Always the monster
    Monster,
    /// Everyone; no explicit target
    Area,
    /// A player or the monster
    #[default]
    Any,
}

/// A single ability definition from the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityDef {
    /// Ability type id (e.g. "fireball")
    pub id: String,
    /// Display name
    pub name: String,
    /// Handler key interpreting this ability (e.g. "attack", "heal")
    pub handler: String,
    pub category: AbilityCategory,
    #[serde(default)]
    pub target: TargetKind,
    /// Rounds before the ability can be used again
    #[serde(default)]
    pub cooldown: u32,
    /// Classes that unlock this ability; empty means every class
    #[serde(default)]
    pub classes: Vec<String>,
    /// Race owning this racial ability
    #[serde(default)]
    pub race: Option<Race>,
    /// Status effect key applied by the handler, if any
    #[serde(default)]
    pub effect: Option<String>,
    /// Racial uses per game
    #[serde(default = "default_uses")]
    pub uses: u32,
    /// Flat numeric parameters (damage, amount, armor, turns, ...)
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

fn default_uses() -> u32 {
    1
}

impl AbilityDef {
    pub fn param(&self, key: &str) -> Option<f64> {
        self.params.get(key).copied()
    }

    pub fn param_or(&self, key: &str, default: f64) -> f64 {
        self.param(key).unwrap_or(default)
    }

    /// Whether a player of this class can use the ability
    pub fn available_to_class(&self, class: &str) -> bool {
        self.race.is_none() && (self.classes.is_empty() || self.classes.iter().any(|c| c == class))
    }

    pub fn is_racial(&self) -> bool {
        self.category == AbilityCategory::Racial
    }

    /// Attack-type abilities are eligible for the ultra-fail redirect
    pub fn is_attack(&self) -> bool {
        self.category == AbilityCategory::Attack
    }

    pub fn basic_attack() -> Self {
        let mut params = BTreeMap::new();
        params.insert("damage".to_string(), 20.0);
        AbilityDef {
            id: "basic_attack".to_string(),
            name: "Basic Attack".to_string(),
            handler: "attack".to_string(),
            category: AbilityCategory::Attack,
            target: TargetKind::Any,
            cooldown: 0,
            classes: Vec::new(),
            race: None,
            effect: None,
            uses: 1,
            params,
        }
    }
}

/// All ability definitions keyed by ability type
#[derive(Debug, Clone, Default)]
pub struct AbilityCatalog {
    abilities: BTreeMap<String, AbilityDef>,
}

impl AbilityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: AbilityDef) {
        self.abilities.insert(def.id.clone(), def);
    }

    pub fn get(&self, id: &str) -> Option<&AbilityDef> {
        self.abilities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.abilities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilityDef> {
        self.abilities.values()
    }

    /// Class abilities unlocked by a class tag
    pub fn class_abilities_for(&self, class: &str) -> Vec<&AbilityDef> {
        self.abilities
            .values()
            .filter(|def| !def.is_racial() && def.available_to_class(class))
            .collect()
    }

    /// The racial ability for a race, if it has an active one
    pub fn racial_for(&self, race: Race) -> Option<&AbilityDef> {
        self.abilities
            .values()
            .find(|def| def.is_racial() && def.race == Some(race))
    }
}

/// Container for ability definitions in TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilitiesConfig {
    pub abilities: Vec<AbilityDef>,
}

fn build_catalog(config: AbilitiesConfig) -> Result<AbilityCatalog, ConfigError> {
    let mut catalog = AbilityCatalog::new();
    for def in config.abilities {
        if def.is_racial() && def.race.is_none() {
            return Err(ConfigError::ValidationError(format!(
                "racial ability '{}' has no race",
                def.id
            )));
        }
        if catalog.contains(&def.id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate ability id '{}'",
                def.id
            )));
        }
        catalog.register(def);
    }
    Ok(catalog)
}

/// Load an ability catalog from a TOML file
pub fn load_ability_catalog(path: &Path) -> Result<AbilityCatalog, ConfigError> {
    let config: AbilitiesConfig = super::load_toml(path)?;
    build_catalog(config)
}

/// Load an ability catalog from a TOML string
pub fn parse_ability_catalog(content: &str) -> Result<AbilityCatalog, ConfigError> {
    let config: AbilitiesConfig = super::parse_toml(content)?;
    build_catalog(config)
}

/// Get the built-in ability catalog
pub fn default_abilities() -> AbilityCatalog {
    let toml = include_str!("../../config/abilities.toml");
    parse_ability_catalog(toml).unwrap_or_else(|_| {
        let mut catalog = AbilityCatalog::new();
        catalog.register(AbilityDef::basic_attack());
        catalog
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_abilities() {
        let toml = r#"
[[abilities]]
id = "venom_bite"
name = "Venom Bite"
handler = "attack"
category = "attack"
target = "any"
effect = "poison"
classes = ["Assassin"]

[abilities.params]
damage = 12
effect_damage = 4
effect_turns = 3

[[abilities]]
id = "stone_resolve"
name = "Stone Resolve"
handler = "stone_resolve"
category = "racial"
target = "self"
race = "Dwarf"
"#;

        let catalog = parse_ability_catalog(toml).unwrap();
        assert_eq!(catalog.len(), 2);

        let bite = catalog.get("venom_bite").unwrap();
        assert_eq!(bite.effect.as_deref(), Some("poison"));
        assert!((bite.param_or("effect_turns", 0.0) - 3.0).abs() < f64::EPSILON);
        assert!(bite.available_to_class("Assassin"));
        assert!(!bite.available_to_class("Priest"));

        let resolve = catalog.racial_for(Race::Dwarf).unwrap();
        assert_eq!(resolve.target, TargetKind::SelfOnly);
        assert_eq!(resolve.uses, 1);
    }

    #[test]
    fn test_racial_without_race_is_rejected() {
        let toml = r#"
[[abilities]]
id = "mystery"
name = "Mystery"
handler = "adaptability"
category = "racial"
"#;
        assert!(matches!(
            parse_ability_catalog(toml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_default_abilities_loads_all() {
        let catalog = default_abilities();

        let expected = [
            "slash",
            "shield_wall",
            "fireball",
            "inferno",
            "poison_strike",
            "shadow_veil",
            "heal",
            "holy_light",
            "spirit_guard",
            "fates_eye",
            "sanctuary",
            "curse",
            "stun_dart",
            "stone_resolve",
            "blood_rage",
            "adaptability",
        ];

        assert_eq!(catalog.len(), expected.len());
        for id in expected {
            assert!(catalog.contains(id), "Missing ability: {}", id);
        }
        assert!(catalog.racial_for(Race::Elf).is_none());
        assert!(catalog.racial_for(Race::Orc).is_some());
    }

    #[test]
    fn test_class_abilities_for() {
        let catalog = default_abilities();
        let warrior: Vec<&str> = catalog
            .class_abilities_for("Warrior")
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert!(warrior.contains(&"slash"));
        assert!(warrior.contains(&"shield_wall"));
        assert!(!warrior.contains(&"fireball"));
        assert!(!warrior.contains(&"blood_rage"));
    }
}
