use std::time::Duration;

use emberfall_core::{
    config::DirectorConfig, seeded_rng, CellCoord, Command, CreatureId, CreatureKind, Event,
    FrameContext, ItemKind, Rect, SimRng,
};
use emberfall_system_director::{Director, DirectorState, Regime};

const PLAYER: CellCoord = CellCoord::new(10, 10);

fn tick(director: &mut Director, rng: &mut SimRng, seconds: f32) -> Vec<Command> {
    let mut out = Vec::new();
    let mut ctx = FrameContext::new(
        Duration::from_secs_f32(seconds),
        Duration::ZERO,
        Rect::new(0, 0, 20, 20),
        rng,
    );
    director.update(&mut ctx, PLAYER, 0, &mut out);
    out
}

fn spawned(director: &mut Director, ids: impl IntoIterator<Item = u32>) {
    let events: Vec<Event> = ids
        .into_iter()
        .map(|id| Event::CreatureSpawned {
            creature: CreatureId::new(id),
            kind: CreatureKind::Ghoul,
            cell: PLAYER,
        })
        .collect();
    director.handle(&events);
}

fn fixed_drops(every: u32) -> DirectorConfig {
    DirectorConfig {
        item_drop_min: every,
        item_drop_max: every,
        ..DirectorConfig::default()
    }
}

#[test]
fn level_opens_calm() {
    let mut rng = seeded_rng(8);
    let mut director = Director::new(DirectorConfig::default(), &mut rng);
    for _ in 0..200 {
        assert!(tick(&mut director, &mut rng, 0.1).is_empty());
    }
    assert_eq!(director.regime(), Regime::Calm);
    assert_eq!(director.state(), DirectorState::CalmEligible);
}

#[test]
fn boss_sighting_removes_calm() {
    let mut rng = seeded_rng(8);
    let mut director = Director::new(DirectorConfig::default(), &mut rng);
    director.boss_seen();
    assert_eq!(director.state(), DirectorState::NoRespite);

    let first = tick(&mut director, &mut rng, 0.1);
    assert_eq!(director.regime(), Regime::Medium);
    assert!(first.is_empty(), "the wave is still near zero");

    let spawns: usize = (0..300)
        .map(|_| tick(&mut director, &mut rng, 0.1).len())
        .sum();
    assert!(spawns > 0);
}

#[test]
fn cleared_level_never_spawns() {
    let mut rng = seeded_rng(8);
    let mut director = Director::new(DirectorConfig::default(), &mut rng);
    director.boss_seen();
    director.boss_dead();
    assert_eq!(director.state(), DirectorState::Cleared);

    director.boss_seen();
    assert_eq!(director.state(), DirectorState::Cleared);
    for _ in 0..1800 {
        assert!(tick(&mut director, &mut rng, 0.1).is_empty());
        assert_eq!(director.regime(), Regime::Calm);
    }
}

#[test]
fn health_drops_follow_tracked_kills() {
    let mut rng = seeded_rng(21);
    let mut director = Director::new(fixed_drops(2), &mut rng);
    spawned(&mut director, [1, 2, 3]);
    assert_eq!(director.tracked_count(), 3);

    let mut out = Vec::new();
    let corpse = CellCoord::new(4, 6);
    assert!(!director.kill_creature(CreatureId::new(99), corpse, 0.0, &mut rng, &mut out));
    assert_eq!(director.kills_until_drop(), 2);

    assert!(director.kill_creature(CreatureId::new(1), corpse, 0.0, &mut rng, &mut out));
    assert!(out.is_empty());
    assert!(director.kill_creature(CreatureId::new(2), corpse, 0.0, &mut rng, &mut out));
    assert_eq!(
        out,
        vec![Command::DropItem {
            kind: ItemKind::HealthPotion,
            cell: corpse,
        }]
    );
    assert_eq!(director.kills_until_drop(), 2);
    assert!(!director.kill_creature(CreatureId::new(2), corpse, 0.0, &mut rng, &mut out));
}

#[test]
fn healthy_players_go_without() {
    let mut rng = seeded_rng(21);
    let mut director = Director::new(fixed_drops(1), &mut rng);
    spawned(&mut director, 1..=10);

    let mut out = Vec::new();
    for id in 1..=10 {
        assert!(director.kill_creature(CreatureId::new(id), PLAYER, 1.0, &mut rng, &mut out));
    }
    assert!(out.is_empty());
    assert_eq!(director.tracked_count(), 0);
}
