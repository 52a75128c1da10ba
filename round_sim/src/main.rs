//! Round Sim - A scripted driver demonstrating warlock_core
//!
//! This binary shows:
//! - Seating a room with mixed races and classes
//! - Registering the room in a RoomRegistry
//! - Simple scripted choices for every living player
//! - Resolving rounds until one side wins
//!
//! Usage: `round_sim [constants.toml]`. Set `RUST_LOG=debug` for engine traces.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use warlock_core::config::{AbilityCatalog, AbilityCategory, AbilityDef, TargetKind};
use warlock_core::prelude::*;

const MAX_ROUNDS: u32 = 30;
const SEED: u64 = 42;

/// The table: id, name, race, class
const SEATS: &[(&str, &str, Race, &str)] = &[
    ("p1", "Aldric", Race::Human, "Warrior"),
    ("p2", "Brynn", Race::Dwarf, "Priest"),
    ("p3", "Caelum", Race::Elf, "Oracle"),
    ("p4", "Dregg", Race::Orc, "Pyromancer"),
    ("p5", "Esk", Race::Skeleton, "Assassin"),
    ("p6", "Fenna", Race::Human, "Alchemist"),
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let constants = match std::env::args().nth(1) {
        Some(path) => match load_constants(Path::new(&path)) {
            Ok(constants) => {
                info!(path = %path, "loaded constants");
                constants
            }
            Err(err) => {
                warn!(path = %path, error = %err, "falling back to default constants");
                GameConstants::default()
            }
        },
        None => GameConstants::default(),
    };

    let catalog = default_abilities();
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);

    let mut room = GameRoom::new("DEMO", constants, catalog.clone());
    for (id, name, race, class) in SEATS {
        if let Err(err) = room.join(*id, *name, *race, *class) {
            warn!(player = %id, error = %err, "could not seat player");
        }
    }
    let first_warlock = SEATS[rng.gen_range(0..SEATS.len())].0;
    if let Err(err) = room.assign_warlock(first_warlock) {
        warn!(error = %err, "could not assign warlock");
        return;
    }

    let registry = RoomRegistry::new();
    let shared = match registry.insert(room) {
        Ok(shared) => shared,
        Err(err) => {
            warn!(error = %err, "could not register room");
            return;
        }
    };

    println!("=== Warlock Round Sim ===");
    println!("Room DEMO, {} players, seed {}", SEATS.len(), SEED);
    println!();

    let Ok(mut room) = shared.lock() else {
        warn!("room lock poisoned");
        return;
    };

    while room.round() < MAX_ROUNDS {
        submit_choices(&mut room, &catalog, &mut rng);

        let outcome = match room.process_round(&mut rng) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "round not resolved");
                break;
            }
        };

        println!("--- Round {} ---", outcome.round);
        for event in outcome.log.public_events() {
            println!("  {}", event.message);
        }
        print_standings(&room);

        if let Some(winner) = outcome.winner {
            println!();
            println!("{} wins after {} rounds.", winner, outcome.round);
            return;
        }
    }

    println!();
    println!("No winner after {} rounds.", MAX_ROUNDS);
}

/// Every living, unstunned player picks a class ability and maybe a racial
fn submit_choices(room: &mut GameRoom, catalog: &AbilityCatalog, rng: &mut ChaCha8Rng) {
    let alive: Vec<PlayerId> = room.roster().alive_ids();

    for id in room.waiting_on() {
        let Some(player) = room.player(&id) else {
            continue;
        };

        let ready: Vec<&AbilityDef> = player
            .abilities
            .unlocked
            .iter()
            .filter(|ability| player.abilities.is_ready(ability))
            .filter_map(|ability| catalog.get(ability))
            .collect();
        let Some(def) = ready.choose(rng).copied() else {
            continue;
        };

        let others: Vec<&PlayerId> = alive.iter().filter(|other| **other != id).collect();
        let action = match (def.target, def.category) {
            (TargetKind::SelfOnly | TargetKind::Area | TargetKind::Monster, _) => PlayerAction::new(id.clone(), &def.id),
            // warlocks go after players, everyone else after the monster
            (TargetKind::Any, _) if player.is_warlock => match others.choose(rng) {
                Some(target) => PlayerAction::new(id.clone(), &def.id).targeting((*target).clone()),
                None => PlayerAction::new(id.clone(), &def.id).at_monster(),
            },
            (TargetKind::Any, _) => PlayerAction::new(id.clone(), &def.id).at_monster(),
            (TargetKind::Single, AbilityCategory::Heal | AbilityCategory::Defense) => {
                PlayerAction::new(id.clone(), &def.id)
            }
            (TargetKind::Single, _) => match others.choose(rng) {
                Some(target) => PlayerAction::new(id.clone(), &def.id).targeting((*target).clone()),
                None => continue,
            },
        };

        let racial = player
            .abilities
            .racial_ability
            .clone()
            .filter(|racial| player.abilities.can_use_racial(racial) && rng.gen_bool(0.3));

        if let Err(err) = room.submit_action(action) {
            warn!(player = %id, error = %err, "action rejected");
        }
        if let Some(racial) = racial {
            if let Err(err) = room.submit_racial_action(PlayerAction::new(id.clone(), racial)) {
                warn!(player = %id, error = %err, "racial action rejected");
            }
        }
    }
}

fn print_standings(room: &GameRoom) {
    let monster = room.monster();
    println!("  Monster: {}/{} hp (level {})", monster.hp, monster.max_hp, monster.level);
    for player in room.roster().iter() {
        let status = if player.is_alive {
            format!("{}/{}", player.hp(), player.max_hp())
        } else {
            "dead".to_string()
        };
        println!("  {:<8} {:<9} {:<11} {}", player.name, player.stats.race.to_string(), player.stats.class, status);
    }
}
