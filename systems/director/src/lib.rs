#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn controller that paces creature arrivals along a tension wave.
//!
//! The director never touches the dungeon directly. It reads the frame
//! context, the player position and the live creature count, and emits
//! [`Command`]s that the world executes. Outcomes come back as [`Event`]s.

use std::{collections::HashSet, f32::consts::FRAC_PI_2, f32::consts::TAU};

use emberfall_core::{
    config::DirectorConfig, CellCoord, Command, CreatureId, CreatureKind, Event, FrameContext,
    ItemKind, SimRng,
};
use rand::{seq::SliceRandom, Rng};

/// Length of the window spawn pacing is measured over, in seconds.
const PACING_WINDOW: f32 = 60.0;
/// Longest pause between two pacing checks once the window target is met.
const RECHECK_INTERVAL: f32 = 1.0;

const PACED_KINDS: [CreatureKind; 4] = [
    CreatureKind::Rat,
    CreatureKind::Rat,
    CreatureKind::Ghoul,
    CreatureKind::Zombie,
];
const HORDE_KINDS: [CreatureKind; 3] = [
    CreatureKind::Zombie,
    CreatureKind::Zombie,
    CreatureKind::Ghoul,
];

/// Progress of the level as far as spawning is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectorState {
    /// Normal pacing; the wave dips into calm periods.
    CalmEligible,
    /// The boss has been seen; thresholds are lowered so calm never comes.
    NoRespite,
    /// The boss is dead; nothing spawns any more.
    Cleared,
}

/// Spawning behaviour selected from the current wave position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    /// No spawning.
    Calm,
    /// Single spawns at the medium rate.
    Medium,
    /// Single spawns at the high rate.
    High,
    /// Rapid burst up to the creature cap.
    Horde,
}

/// Feedback controller for creature spawning.
#[derive(Clone, Debug)]
pub struct Director {
    config: DirectorConfig,
    state: DirectorState,
    regime: Regime,
    theta: f32,
    since_horde: f32,
    horde_wait: f32,
    spawn_wait: f32,
    window_elapsed: f32,
    window_spawns: u32,
    pending: usize,
    tracked: HashSet<CreatureId>,
    kills_until_drop: u32,
}

impl Director {
    /// Creates a director at the bottom of the wave, so levels open calm.
    #[must_use]
    pub fn new(config: DirectorConfig, rng: &mut SimRng) -> Self {
        let kills_until_drop = roll_drop_counter(&config, rng);
        Self {
            config,
            state: DirectorState::CalmEligible,
            regime: Regime::Calm,
            theta: -FRAC_PI_2,
            since_horde: 0.0,
            horde_wait: 0.0,
            spawn_wait: 0.0,
            window_elapsed: 0.0,
            window_spawns: 0,
            pending: 0,
            tracked: HashSet::new(),
            kills_until_drop,
        }
    }

    /// Current level state.
    #[must_use]
    pub const fn state(&self) -> DirectorState {
        self.state
    }

    /// Regime chosen on the last update.
    #[must_use]
    pub const fn regime(&self) -> Regime {
        self.regime
    }

    /// Tension wave position in `0..=1`.
    #[must_use]
    pub fn wave_position(&self) -> f32 {
        0.5 * (1.0 + self.theta.sin())
    }

    /// Number of live creatures the director spawned.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Kills left before the next health drop is considered.
    #[must_use]
    pub const fn kills_until_drop(&self) -> u32 {
        self.kills_until_drop
    }

    /// Advances the wave and emits the spawns due this frame.
    ///
    /// `creature_count` is the number of live creatures in the dungeon;
    /// spawns requested but not yet confirmed count against the cap too.
    pub fn update(
        &mut self,
        ctx: &mut FrameContext<'_>,
        player: CellCoord,
        creature_count: usize,
        out: &mut Vec<Command>,
    ) {
        let dt = ctx.dt_secs();
        if self.config.wave_length > 0.0 {
            self.theta = (self.theta + TAU * dt / self.config.wave_length) % TAU;
        }
        self.since_horde += dt;
        self.window_elapsed += dt;
        if self.window_elapsed >= PACING_WINDOW {
            self.window_elapsed -= PACING_WINDOW;
            self.window_spawns = 0;
        }

        let headroom = self
            .config
            .creature_cap
            .saturating_sub(creature_count + self.pending);
        let regime = self.select_regime(headroom);
        if regime != self.regime {
            log::debug!(
                "director regime {:?} -> {:?} at wave {:.2}",
                self.regime,
                regime,
                self.wave_position()
            );
            if self.regime == Regime::Horde {
                self.since_horde = 0.0;
            }
            self.regime = regime;
        }

        match self.regime {
            Regime::Calm => {}
            Regime::Horde => self.horde(dt, headroom, player, &mut *ctx.rng, out),
            Regime::Medium | Regime::High => {
                self.pace(dt, headroom, player, &mut *ctx.rng, out);
            }
        }
    }

    /// Consumes world events, tracking the creatures the director spawned.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::CreatureSpawned { creature, kind, .. } if !kind.is_boss() => {
                    self.pending = self.pending.saturating_sub(1);
                    let _ = self.tracked.insert(*creature);
                }
                Event::SpawnFailed { kind } => {
                    self.pending = self.pending.saturating_sub(1);
                    log::debug!("director spawn of {} failed", kind.name());
                }
                _ => {}
            }
        }
    }

    /// Notifies the director that a creature died at `cell`.
    ///
    /// `player_health` is the player's health fraction in `0..=1`; the
    /// healthier the player, the likelier a due health drop is withheld.
    /// Returns `false` for creatures the director did not spawn.
    pub fn kill_creature(
        &mut self,
        creature: CreatureId,
        cell: CellCoord,
        player_health: f32,
        rng: &mut SimRng,
        out: &mut Vec<Command>,
    ) -> bool {
        if !self.tracked.remove(&creature) {
            return false;
        }
        self.kills_until_drop = self.kills_until_drop.saturating_sub(1);
        if self.kills_until_drop > 0 {
            return true;
        }

        self.kills_until_drop = roll_drop_counter(&self.config, rng);
        let withheld = rng.gen::<f32>() < player_health.clamp(0.0, 1.0);
        if withheld {
            log::debug!("health drop withheld at player health {player_health:.2}");
        } else {
            out.push(Command::DropItem {
                kind: ItemKind::HealthPotion,
                cell,
            });
        }
        true
    }

    /// The boss came into view: calm periods end for the rest of the level.
    pub fn boss_seen(&mut self) {
        if self.state == DirectorState::CalmEligible {
            log::info!("boss sighted; no more respite");
            self.state = DirectorState::NoRespite;
        }
    }

    /// The boss died: spawning stops for good.
    pub fn boss_dead(&mut self) {
        if self.state != DirectorState::Cleared {
            log::info!("boss defeated; level cleared");
            self.state = DirectorState::Cleared;
            self.regime = Regime::Calm;
        }
    }

    fn thresholds(&self) -> (f32, f32) {
        match self.state {
            DirectorState::NoRespite => (
                self.config.no_respite_low_threshold,
                self.config.no_respite_medium_threshold,
            ),
            _ => (self.config.low_threshold, self.config.medium_threshold),
        }
    }

    fn select_regime(&self, headroom: usize) -> Regime {
        if self.state == DirectorState::Cleared {
            return Regime::Calm;
        }
        let wave = self.wave_position();
        if self.regime == Regime::Horde && headroom > 0 && wave >= self.config.horde_threshold {
            return Regime::Horde;
        }
        if self.regime != Regime::Horde
            && wave >= self.config.horde_threshold
            && self.since_horde >= self.config.horde_delay
            && headroom > 0
        {
            return Regime::Horde;
        }

        let (low, medium) = self.thresholds();
        if wave < low {
            Regime::Calm
        } else if wave < medium {
            Regime::Medium
        } else {
            Regime::High
        }
    }

    fn horde(
        &mut self,
        dt: f32,
        mut headroom: usize,
        player: CellCoord,
        rng: &mut SimRng,
        out: &mut Vec<Command>,
    ) {
        self.horde_wait -= dt;
        while self.horde_wait <= 0.0 && headroom > 0 {
            let kind = HORDE_KINDS.choose(rng).copied().unwrap_or(CreatureKind::Zombie);
            self.spawn(kind, player, out);
            headroom -= 1;
            self.horde_wait += self.config.horde_spawn_interval.max(f32::EPSILON);
        }
        self.horde_wait = self.horde_wait.max(0.0);
    }

    /// Spreads the remaining window deficit evenly over the remaining window time.
    fn pace(
        &mut self,
        dt: f32,
        headroom: usize,
        player: CellCoord,
        rng: &mut SimRng,
        out: &mut Vec<Command>,
    ) {
        self.spawn_wait -= dt;
        if self.spawn_wait > 0.0 {
            return;
        }

        let rate = match self.regime {
            Regime::High => self.config.high_rate,
            _ => self.config.medium_rate,
        };
        let target = (rate * self.wave_position()).round().max(0.0) as u32;
        let deficit = target.saturating_sub(self.window_spawns);
        let remaining = (PACING_WINDOW - self.window_elapsed).max(0.0);
        if deficit == 0 || headroom == 0 {
            self.spawn_wait = remaining.min(RECHECK_INTERVAL);
            return;
        }

        let kind = PACED_KINDS.choose(rng).copied().unwrap_or(CreatureKind::Rat);
        self.spawn(kind, player, out);
        self.window_spawns += 1;
        self.spawn_wait = remaining / deficit as f32;
    }

    fn spawn(&mut self, kind: CreatureKind, near: CellCoord, out: &mut Vec<Command>) {
        self.pending += 1;
        out.push(Command::SpawnCreature { kind, near });
    }
}

fn roll_drop_counter(config: &DirectorConfig, rng: &mut SimRng) -> u32 {
    let low = config.item_drop_min.max(1);
    let high = config.item_drop_max.max(low);
    rng.gen_range(low..=high)
}
