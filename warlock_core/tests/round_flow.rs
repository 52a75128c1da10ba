//! Full-round tests driven through the room API

use rand::rngs::mock::StepRng;
use warlock_core::config::{parse_constants, ArmorConstants};
use warlock_core::prelude::*;
use warlock_core::reduce_by_armor;

/// No crits, no ultra fails, and a monster that never attacks
fn quiet_constants() -> GameConstants {
    let mut constants = GameConstants::default();
    constants.crit.chance = 0.0;
    constants.ultra_fail.chance = 0.0;
    constants.monster.base_damage = 0;
    constants
}

/// Rolls 0.0 every time: conversions always succeed
fn lucky() -> StepRng {
    StepRng::new(0, 0)
}

/// Rolls just under 1.0 every time: conversions always fail
fn unlucky() -> StepRng {
    StepRng::new(u64::MAX, 0)
}

fn room_with(players: &[(&str, Race, &str)], warlock: &str) -> GameRoom {
    let mut room = GameRoom::new("TEST", quiet_constants(), default_abilities());
    for (id, race, class) in players {
        let name = id.to_uppercase();
        room.join(*id, name, *race, *class).unwrap();
    }
    room.assign_warlock(warlock).unwrap();
    room
}

#[test]
fn test_armor_scenario() {
    assert_eq!(reduce_by_armor(50, 5, &ArmorConstants::default()), 25);
}

#[test]
fn test_poison_strike_then_tick() {
    let mut room = room_with(
        &[
            ("a", Race::Human, "Assassin"),
            ("t", Race::Human, "Warrior"),
            ("w", Race::Human, "Warrior"),
        ],
        "w",
    );
    room.submit_action(PlayerAction::new("a", "poison_strike").targeting("t")).unwrap();

    let outcome = room.process_round(&mut unlucky()).unwrap();

    let target = room.player("t").unwrap();
    // 26 from the strike, 6 from the first tick
    assert_eq!(target.hp(), 68);
    assert_eq!(target.effects.get(StatusEffectKind::Poison).unwrap().turns, 2);
    assert_eq!(outcome.log.count_of(EventKind::StatusTick), 1);
    assert!(outcome.winner.is_none());
}

#[test]
fn test_three_attackers_coordinate_on_monster() {
    let mut room = room_with(
        &[
            ("a", Race::Human, "Warrior"),
            ("b", Race::Human, "Warrior"),
            ("c", Race::Human, "Warrior"),
            ("w", Race::Human, "Oracle"),
        ],
        "w",
    );
    for id in ["a", "b", "c"] {
        room.submit_action(PlayerAction::new(id, "slash").at_monster()).unwrap();
    }

    room.process_round(&mut unlucky()).unwrap();

    let stats = room.get_coordination_stats();
    assert_eq!(stats.targets[MONSTER_TARGET], 3);
    assert_eq!(stats.max_coordination, 3);
}

#[test]
fn test_defeated_monster_levels_up_same_round() {
    let mut room = room_with(
        &[
            ("a", Race::Human, "Warrior"),
            ("b", Race::Human, "Warrior"),
            ("c", Race::Human, "Warrior"),
            ("w", Race::Human, "Oracle"),
        ],
        "w",
    );
    for id in ["a", "b", "c"] {
        room.submit_action(PlayerAction::new(id, "slash").at_monster()).unwrap();
    }
    let outcome = room.process_round(&mut unlucky()).unwrap();

    // 33 + 36 + 39 against 100 hp
    let dealt: Vec<u64> = outcome
        .log
        .of_kind(EventKind::MonsterDamaged)
        .filter_map(|e| e.details.as_ref()?.get("final")?.as_u64())
        .collect();
    assert_eq!(dealt, vec![33, 36, 39]);
    assert!(outcome.log.contains(EventKind::MonsterDefeated));
    assert!(outcome.log.contains(EventKind::LevelUp));
    assert_eq!(room.monster().level, 1);
    assert_eq!(room.monster().hp, 150);
    assert_eq!(room.player("a").unwrap().max_hp(), 110);
}

#[test]
fn test_undying_saves_skeleton_once() {
    let mut room = GameRoom::new("BONE", quiet_constants(), default_abilities());
    let constants = quiet_constants();
    let catalog = default_abilities();
    let mut bones = Player::from_config("s", "Bones", Race::Skeleton, "Priest", &constants, &catalog);
    bones.stats.hp = 10;
    room.add_player(bones).unwrap();
    room.join("a", "Ann", Race::Human, "Warrior").unwrap();
    room.join("w", "Wex", Race::Human, "Warrior").unwrap();
    room.assign_warlock("w").unwrap();

    room.submit_action(PlayerAction::new("a", "slash").targeting("s")).unwrap();
    let first = room.process_round(&mut unlucky()).unwrap();
    let skeleton = room.player("s").unwrap();
    assert!(first.deaths.is_empty());
    assert!(first.log.contains(EventKind::Resurrected));
    assert!(skeleton.is_alive);
    assert_eq!(skeleton.hp(), 1);

    room.submit_action(PlayerAction::new("a", "slash").targeting("s")).unwrap();
    let second = room.process_round(&mut unlucky()).unwrap();
    assert_eq!(second.deaths, vec!["s".to_string()]);
    assert!(!room.player("s").unwrap().is_alive);
}

#[test]
fn test_warlock_converts_victim() {
    let mut room = room_with(
        &[
            ("a", Race::Human, "Warrior"),
            ("b", Race::Human, "Warrior"),
            ("w", Race::Human, "Warrior"),
        ],
        "w",
    );
    room.submit_action(PlayerAction::new("w", "slash").targeting("a")).unwrap();

    let outcome = room.process_round(&mut lucky()).unwrap();

    assert_eq!(outcome.conversions, vec!["a".to_string()]);
    assert!(room.player("a").unwrap().is_warlock);
    assert_eq!(room.warlock_count(), 2);
    // conversion is private to the victim and the warlock
    let event = outcome.log.of_kind(EventKind::Conversion).next().unwrap();
    assert!(!event.public);
    assert!(event.visible_to("a"));
    assert!(event.visible_to("w"));
    assert!(!event.visible_to("b"));
    assert!(outcome.winner.is_none());
}

#[test]
fn test_killing_last_warlock_wins_for_good() {
    let mut room = GameRoom::new("WIN", quiet_constants(), default_abilities());
    let constants = quiet_constants();
    let catalog = default_abilities();
    let mut warlock = Player::from_config("w", "Wex", Race::Human, "Warrior", &constants, &catalog).warlock();
    warlock.stats.hp = 20;
    room.add_player(warlock).unwrap();
    room.join("a", "Ann", Race::Human, "Warrior").unwrap();
    room.join("b", "Bob", Race::Human, "Warrior").unwrap();

    room.submit_action(PlayerAction::new("a", "slash").targeting("w")).unwrap();
    let outcome = room.process_round(&mut unlucky()).unwrap();

    assert_eq!(outcome.deaths, vec!["w".to_string()]);
    assert_eq!(outcome.winner, Some(Side::Good));
    assert!(outcome.log.contains(EventKind::GameOver));
    assert_eq!(room.winner(), Some(Side::Good));
    assert_eq!(
        room.submit_action(PlayerAction::new("a", "slash").at_monster()),
        Err(RoomError::GameOver)
    );
}

#[test]
fn test_stun_skips_next_round() {
    let mut room = room_with(
        &[
            ("x", Race::Human, "Alchemist"),
            ("t", Race::Human, "Warrior"),
            ("w", Race::Human, "Warrior"),
        ],
        "w",
    );
    room.submit_action(PlayerAction::new("x", "stun_dart").targeting("t")).unwrap();
    room.process_round(&mut unlucky()).unwrap();

    assert!(room.is_player_stunned("t"));
    assert_eq!(
        room.submit_action(PlayerAction::new("t", "slash").at_monster()),
        Err(RoomError::PlayerStunned("t".to_string()))
    );
    assert!(!room.waiting_on().contains(&"t".to_string()));

    room.process_round(&mut unlucky()).unwrap();
    assert!(!room.is_player_stunned("t"));
    assert!(room.submit_action(PlayerAction::new("t", "slash").at_monster()).is_ok());
}

#[test]
fn test_shadow_veil_dodges_same_round_attack() {
    let mut room = room_with(
        &[
            ("a", Race::Human, "Warrior"),
            ("s", Race::Human, "Assassin"),
            ("w", Race::Human, "Warrior"),
        ],
        "w",
    );
    room.submit_action(PlayerAction::new("a", "slash").targeting("s")).unwrap();
    room.submit_action(PlayerAction::new("s", "shadow_veil")).unwrap();

    let outcome = room.process_round(&mut unlucky()).unwrap();

    assert_eq!(room.player("s").unwrap().hp(), 100);
    assert!(outcome.log.contains(EventKind::AttackMissed));
}

#[test]
fn test_stone_resolve_blocks_one_hit() {
    let mut room = room_with(
        &[
            ("a", Race::Human, "Warrior"),
            ("d", Race::Dwarf, "Warrior"),
            ("w", Race::Human, "Warrior"),
        ],
        "w",
    );
    room.submit_racial_action(PlayerAction::new("d", "stone_resolve")).unwrap();
    room.submit_action(PlayerAction::new("a", "slash").targeting("d")).unwrap();

    let outcome = room.process_round(&mut unlucky()).unwrap();

    let dwarf = room.player("d").unwrap();
    assert_eq!(dwarf.hp(), 100);
    assert_eq!(dwarf.abilities.racial_uses, 0);
    assert!(!dwarf.effects.racial_effects.immune_next_damage);
    assert!(outcome.log.contains(EventKind::DamageBlocked));
}

#[test]
fn test_round_log_serializes() {
    let mut room = room_with(
        &[("a", Race::Human, "Warrior"), ("w", Race::Human, "Warrior"), ("b", Race::Elf, "Oracle")],
        "w",
    );
    room.submit_action(PlayerAction::new("a", "slash").at_monster()).unwrap();
    let outcome = room.process_round(&mut unlucky()).unwrap();

    let text = serde_json::to_string(&outcome.log).unwrap();
    assert!(text.contains("\"kind\":\"turn_started\""));
    assert!(text.contains("\"kind\":\"monster_damaged\""));
}

#[test]
fn test_partial_constants_file() {
    let constants = parse_constants("[armor]\nmax_reduction = 0.5\n").unwrap();
    assert!((constants.armor.max_reduction - 0.5).abs() < f64::EPSILON);
    assert!((constants.armor.reduction_per_point - 0.1).abs() < f64::EPSILON);
    assert_eq!(constants.monster.base_hp, 100);
}

#[test]
fn test_rejected_self_attack_keeps_blood_rage() {
    let mut constants = quiet_constants();
    constants.crit.chance = 1.0;
    let mut room = GameRoom::new("RAGE", constants, default_abilities());
    room.join("o", "Grum", Race::Orc, "Warrior").unwrap();
    room.join("a", "Ann", Race::Human, "Warrior").unwrap();
    room.join("w", "Wex", Race::Human, "Warrior").unwrap();
    room.assign_warlock("w").unwrap();

    room.submit_racial_action(PlayerAction::new("o", "blood_rage")).unwrap();
    room.submit_action(PlayerAction::new("o", "slash").targeting("o")).unwrap();
    let outcome = room.process_round(&mut unlucky()).unwrap();

    let orc = room.player("o").unwrap();
    assert_eq!(outcome.log.count_of(EventKind::ActionFailed), 1);
    assert!(!outcome.log.contains(EventKind::CriticalHit));
    assert!(orc.effects.racial_effects.blood_rage);
    assert_eq!(orc.hp(), 90);
    assert!(orc.abilities.is_ready("slash"));
}
