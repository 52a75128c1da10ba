//! Game constants configuration

use super::ConfigError;
use crate::types::StatusEffectKind;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Tunable game constants. Every section falls back to its defaults, so a
/// TOML file only needs the values it overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConstants {
    #[serde(default)]
    pub armor: ArmorConstants,
    #[serde(default)]
    pub crit: CritConstants,
    #[serde(default)]
    pub ultra_fail: UltraFailConstants,
    #[serde(default)]
    pub coordination: CoordinationConstants,
    #[serde(default)]
    pub warlock: WarlockConstants,
    #[serde(default)]
    pub comeback: ComebackConstants,
    #[serde(default)]
    pub monster: MonsterConstants,
    #[serde(default)]
    pub player: PlayerConstants,
    #[serde(default)]
    pub racial: RacialConstants,
    #[serde(default)]
    pub effects: EffectDefaults,
}

impl GameConstants {
    /// Reject values that would break the damage and probability math
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.armor.max_reduction) {
            return Err(ConfigError::ValidationError(format!(
                "armor.max_reduction must be in [0, 1), got {}",
                self.armor.max_reduction
            )));
        }
        for (name, chance) in [
            ("crit.chance", self.crit.chance),
            ("ultra_fail.chance", self.ultra_fail.chance),
            ("warlock.base_conversion_chance", self.warlock.base_conversion_chance),
            ("warlock.max_conversion_chance", self.warlock.max_conversion_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be a probability, got {}",
                    name, chance
                )));
            }
        }
        if self.player.base_hp == 0 {
            return Err(ConfigError::ValidationError(
                "player.base_hp must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorConstants {
    /// Damage reduction per point of armor (0.1 = 10%)
    pub reduction_per_point: f64,
    /// Reduction cap (0.9 = 90%). Negative armor has no matching floor.
    pub max_reduction: f64,
}

impl Default for ArmorConstants {
    fn default() -> Self {
        ArmorConstants {
            reduction_per_point: 0.1,
            max_reduction: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CritConstants {
    pub chance: f64,
    /// Damage/heal multiplier on a critical hit (1.5 = 150%)
    pub multiplier: f64,
}

impl Default for CritConstants {
    fn default() -> Self {
        CritConstants {
            chance: 0.05,
            multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UltraFailConstants {
    /// Chance an attack aimed at the monster hits a random player instead
    pub chance: f64,
}

impl Default for UltraFailConstants {
    fn default() -> Self {
        UltraFailConstants { chance: 0.01 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConstants {
    /// Bonus granted per actor beyond the first on the same target
    pub bonus_per_extra_actor: f64,
    pub max_bonus: f64,
}

impl Default for CoordinationConstants {
    fn default() -> Self {
        CoordinationConstants {
            bonus_per_extra_actor: 0.1,
            max_bonus: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarlockConstants {
    pub base_conversion_chance: f64,
    /// Added per living warlock beyond the first
    pub per_warlock_bonus: f64,
    pub max_conversion_chance: f64,
    /// Multiplier applied to conversion chance from area abilities
    pub aoe_dampening: f64,
}

impl Default for WarlockConstants {
    fn default() -> Self {
        WarlockConstants {
            base_conversion_chance: 0.2,
            per_warlock_bonus: 0.05,
            max_conversion_chance: 0.5,
            aoe_dampening: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComebackConstants {
    /// A side holding at most this share of living players is boosted
    pub ratio_threshold: f64,
    /// Comeback never activates below this many living players
    pub min_alive: usize,
    pub damage_bonus: f64,
    pub healing_bonus: f64,
    pub armor_bonus: i32,
}

impl Default for ComebackConstants {
    fn default() -> Self {
        ComebackConstants {
            ratio_threshold: 0.25,
            min_alive: 3,
            damage_bonus: 0.25,
            healing_bonus: 0.25,
            armor_bonus: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterConstants {
    pub base_hp: u32,
    pub hp_per_level: u32,
    pub base_damage: u32,
    /// Damage grows by this fraction of base damage per round of age
    pub damage_per_age: f64,
}

impl Default for MonsterConstants {
    fn default() -> Self {
        MonsterConstants {
            base_hp: 100,
            hp_per_level: 50,
            base_damage: 10,
            damage_per_age: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConstants {
    pub base_hp: u32,
    pub base_armor: i32,
    /// Max hp gained (and healed) by every living player on level up
    pub level_up_hp: u32,
    /// Turns a warlock stays revealed after being detected
    pub detection_turns: u32,
    /// Damage modifier per class tag; missing classes use 1.0. Entries in a
    /// config file are merged over the built-in table.
    #[serde(deserialize_with = "merge_class_modifiers")]
    pub class_damage_modifiers: BTreeMap<String, f64>,
}

fn default_class_modifiers() -> BTreeMap<String, f64> {
    [
        ("Warrior", 1.0),
        ("Pyromancer", 1.2),
        ("Assassin", 1.3),
        ("Priest", 0.7),
        ("Oracle", 0.8),
        ("Alchemist", 1.0),
    ]
    .into_iter()
    .map(|(class, modifier)| (class.to_string(), modifier))
    .collect()
}

fn merge_class_modifiers<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<String, f64>::deserialize(deserializer)?;
    let mut merged = default_class_modifiers();
    merged.extend(overrides);
    Ok(merged)
}

impl PlayerConstants {
    pub fn damage_modifier_for(&self, class: &str) -> f64 {
        self.class_damage_modifiers.get(class).copied().unwrap_or(1.0)
    }
}

impl Default for PlayerConstants {
    fn default() -> Self {
        PlayerConstants {
            base_hp: 100,
            base_armor: 0,
            level_up_hp: 10,
            detection_turns: 1,
            class_damage_modifiers: default_class_modifiers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RacialConstants {
    /// Dwarf stone armor pool at spawn
    pub stone_armor_initial: i32,
    /// Skeleton hp after an Undying save
    pub undying_hp: u32,
    /// Elf moonbeam activates at or below this fraction of max hp
    pub moonbeam_threshold: f64,
    /// Orc blood rage hp cost as a fraction of max hp
    pub blood_rage_cost: f64,
    pub blood_rage_multiplier: f64,
}

impl Default for RacialConstants {
    fn default() -> Self {
        RacialConstants {
            stone_armor_initial: 10,
            undying_hp: 1,
            moonbeam_threshold: 0.5,
            blood_rage_cost: 0.1,
            blood_rage_multiplier: 2.0,
        }
    }
}

/// Parameter defaults for a timed effect, used when an ability omits them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectDefault {
    pub damage: u32,
    pub armor: i32,
    pub damage_increase: f64,
    pub turns: u32,
    pub stackable: bool,
}

impl Default for EffectDefault {
    fn default() -> Self {
        EffectDefault {
            damage: 0,
            armor: 0,
            damage_increase: 0.0,
            turns: 1,
            stackable: false,
        }
    }
}

/// Per-effect defaults. Fields missing from a config file keep that
/// effect's built-in value, not the generic `EffectDefault` one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "EffectDefaultsFile")]
pub struct EffectDefaults {
    pub poison: EffectDefault,
    pub shielded: EffectDefault,
    pub vulnerable: EffectDefault,
    pub invisible: EffectDefault,
    pub stunned: EffectDefault,
}

impl EffectDefaults {
    pub fn for_kind(&self, kind: StatusEffectKind) -> &EffectDefault {
        match kind {
            StatusEffectKind::Poison => &self.poison,
            StatusEffectKind::Shielded => &self.shielded,
            StatusEffectKind::Vulnerable => &self.vulnerable,
            StatusEffectKind::Invisible => &self.invisible,
            StatusEffectKind::Stunned => &self.stunned,
        }
    }
}

impl Default for EffectDefaults {
    fn default() -> Self {
        EffectDefaults {
            poison: EffectDefault {
                damage: 5,
                turns: 2,
                ..Default::default()
            },
            shielded: EffectDefault {
                armor: 2,
                turns: 1,
                ..Default::default()
            },
            vulnerable: EffectDefault {
                damage_increase: 0.25,
                turns: 2,
                ..Default::default()
            },
            invisible: EffectDefault::default(),
            stunned: EffectDefault::default(),
        }
    }
}

/// An `[effects.<kind>]` table as written in a config file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EffectOverride {
    damage: Option<u32>,
    armor: Option<i32>,
    damage_increase: Option<f64>,
    turns: Option<u32>,
    stackable: Option<bool>,
}

impl EffectOverride {
    fn merge_into(self, mut base: EffectDefault) -> EffectDefault {
        if let Some(damage) = self.damage {
            base.damage = damage;
        }
        if let Some(armor) = self.armor {
            base.armor = armor;
        }
        if let Some(damage_increase) = self.damage_increase {
            base.damage_increase = damage_increase;
        }
        if let Some(turns) = self.turns {
            base.turns = turns;
        }
        if let Some(stackable) = self.stackable {
            base.stackable = stackable;
        }
        base
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EffectDefaultsFile {
    poison: EffectOverride,
    shielded: EffectOverride,
    vulnerable: EffectOverride,
    invisible: EffectOverride,
    stunned: EffectOverride,
}

impl From<EffectDefaultsFile> for EffectDefaults {
    fn from(file: EffectDefaultsFile) -> Self {
        let defaults = EffectDefaults::default();
        EffectDefaults {
            poison: file.poison.merge_into(defaults.poison),
            shielded: file.shielded.merge_into(defaults.shielded),
            vulnerable: file.vulnerable.merge_into(defaults.vulnerable),
            invisible: file.invisible.merge_into(defaults.invisible),
            stunned: file.stunned.merge_into(defaults.stunned),
        }
    }
}
