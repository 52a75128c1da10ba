//! Monster - the shared enemy every player fights

use crate::config::MonsterConstants;
use crate::damage::apply_damage_modifier;
use serde::{Deserialize, Serialize};

/// The room's monster. Owned by the room, mutated only by combat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub hp: u32,
    pub max_hp: u32,
    pub base_damage: u32,
    /// Rounds survived since spawn; scales damage
    pub age: u32,
    /// Times the monster has been defeated
    pub level: u32,
}

impl Monster {
    /// Spawn a level-0 monster
    pub fn new(constants: &MonsterConstants) -> Self {
        Monster {
            hp: constants.base_hp,
            max_hp: constants.base_hp,
            base_damage: constants.base_damage,
            age: 0,
            level: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// `floor(base_damage * (1 + age * damage_per_age))`
    pub fn next_attack_damage(&self, constants: &MonsterConstants) -> u32 {
        let multiplier = 1.0 + self.age as f64 * constants.damage_per_age;
        apply_damage_modifier(self.base_damage, multiplier)
    }

    /// Returns the hp actually lost
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.hp);
        self.hp -= lost;
        lost
    }

    /// Age one round
    pub fn age_one_round(&mut self) {
        self.age += 1;
    }

    /// Respawn stronger after a defeat
    pub fn respawn(&mut self, constants: &MonsterConstants) {
        self.level += 1;
        self.max_hp = constants.base_hp + self.level * constants.hp_per_level;
        self.hp = self.max_hp;
        self.age = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_scales_with_age() {
        let constants = MonsterConstants::default();
        let mut monster = Monster::new(&constants);
        assert_eq!(monster.next_attack_damage(&constants), 10);

        monster.age_one_round();
        assert_eq!(monster.next_attack_damage(&constants), 15);

        monster.age_one_round();
        assert_eq!(monster.next_attack_damage(&constants), 20);
    }

    #[test]
    fn test_respawn_levels_up() {
        let constants = MonsterConstants::default();
        let mut monster = Monster::new(&constants);
        monster.age = 4;
        assert_eq!(monster.take_damage(500), 100);
        assert!(!monster.is_alive());

        monster.respawn(&constants);
        assert_eq!(monster.level, 1);
        assert_eq!(monster.max_hp, 150);
        assert_eq!(monster.hp, 150);
        assert_eq!(monster.age, 0);
    }
}
