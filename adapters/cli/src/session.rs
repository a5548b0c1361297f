//! One level's worth of simulation state and the per-frame tick.

use std::time::Duration;

use emberfall_core::{
    config::WorldConfig, seeded_rng, CellCoord, Color, Command, Event, FireZoneId, FrameContext,
    ItemKind, Position, Rect, SimRng, TerrainKind,
};
use emberfall_system_director::Director;
use emberfall_system_lighting::{LightBuffer, LightingEngine};
use emberfall_system_overlays::{CanopyPainter, FireManager};
use emberfall_system_ripples::RippleManager;
use emberfall_world::{Dungeon, Grid, LevelBlueprint};
use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

/// Cells visible around the player in every direction.
const VIEW_RADIUS: i32 = 12;
/// Seconds between two creature moves.
const CREATURE_STEP: Duration = Duration::from_millis(500);
/// Chance that a creature steps towards the player rather than wandering.
const CHASE_CHANCE: f64 = 0.6;
/// Health the player loses to each creature that reaches them.
const CONTACT_DAMAGE: f32 = 0.1;
/// Health restored by a potion.
const POTION_HEAL: f32 = 0.25;
/// Impulse of a creature entering water.
const WADE_RIPPLE: f32 = 0.8;

const STEPS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Read-only view of the simulation after a tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameSnapshot {
    /// Frames simulated so far.
    pub frame: u64,
    /// Simulated seconds so far.
    pub elapsed: f32,
    /// Director regime name.
    pub regime: String,
    /// Director tension wave position.
    pub wave: f32,
    /// Player health fraction.
    pub player_health: f32,
    /// Live creatures.
    pub creatures: usize,
    /// Items lying on the ground.
    pub items: usize,
    /// Corpses left so far.
    pub corpses: usize,
    /// Water zones with a running wave simulation.
    pub active_water_zones: usize,
    /// Fire zones still burning or cooling.
    pub fire_zones: usize,
    /// Sub-cells of the light buffer brighter than black.
    pub lit_sub_cells: usize,
    /// Water sub-cells redrawn with refraction.
    pub water_sub_cells: usize,
    /// Cells in the player's field of view.
    pub visible_cells: usize,
}

/// Counters accumulated over a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Creatures the world confirmed as spawned.
    pub spawned: u32,
    /// Spawn commands the world could not place.
    pub failed_spawns: u32,
    /// Creatures killed on contact with the player.
    pub kills: u32,
    /// Items the director dropped.
    pub items_dropped: u32,
    /// Potions the player picked up.
    pub potions_used: u32,
}

/// Owns the dungeon and every system and runs them in a fixed order.
#[derive(Debug)]
pub struct Session {
    dungeon: Dungeon,
    lighting: LightingEngine,
    light_buffer: LightBuffer,
    ripples: RippleManager,
    canopy: CanopyPainter,
    fire: FireManager,
    director: Director,
    rng: SimRng,
    player: Position,
    player_health: f32,
    ground: Grid<Color>,
    elapsed: Duration,
    frame: u64,
    creature_clock: Duration,
    boss_sighted: bool,
    commands: Vec<Command>,
    events: Vec<Event>,
    totals: Totals,
}

impl Session {
    /// Builds the level and paints its canopies.
    #[must_use]
    pub fn new(blueprint: &LevelBlueprint, config: WorldConfig, seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let mut dungeon = blueprint.build(config.world.clone());
        let canopy = CanopyPainter::new(config.canopy.clone());
        let _ = canopy.recompute_all(&mut dungeon);

        let bounds = dungeon.bounds();
        let player = Position::cell_center(blueprint.player_start().unwrap_or_else(|| {
            CellCoord::new(bounds.x() + bounds.width() / 2, bounds.y() + bounds.height() / 2)
        }));
        let sub_bounds = dungeon.sub_cell_bounds();
        let director = Director::new(config.director.clone(), &mut rng);

        let mut session = Self {
            lighting: LightingEngine::new(config.lighting.clone()),
            light_buffer: LightBuffer::new(Rect::default()),
            ripples: RippleManager::new(config.ripples.clone()),
            canopy,
            fire: FireManager::new(config.fire.clone()),
            director,
            rng,
            player,
            player_health: 1.0,
            ground: Grid::new(sub_bounds.width(), sub_bounds.height(), Color::BLACK),
            elapsed: Duration::ZERO,
            frame: 0,
            creature_clock: Duration::ZERO,
            boss_sighted: false,
            commands: Vec::new(),
            events: Vec::new(),
            totals: Totals::default(),
            dungeon,
        };
        let viewport = session.viewport();
        session.dungeon.compute_fov(session.player, viewport);
        session.dungeon.remember_fov();
        session
    }

    /// The simulated dungeon.
    #[must_use]
    pub const fn dungeon(&self) -> &Dungeon {
        &self.dungeon
    }

    /// The spawn director.
    #[must_use]
    pub const fn director(&self) -> &Director {
        &self.director
    }

    /// The water simulation.
    #[must_use]
    pub const fn ripples(&self) -> &RippleManager {
        &self.ripples
    }

    /// The fire simulation.
    #[must_use]
    pub const fn fire(&self) -> &FireManager {
        &self.fire
    }

    /// Light accumulated on the last tick.
    #[must_use]
    pub const fn light_buffer(&self) -> &LightBuffer {
        &self.light_buffer
    }

    /// Sub-cell ground image with water refraction from the last tick.
    #[must_use]
    pub const fn ground(&self) -> &Grid<Color> {
        &self.ground
    }

    /// Player location.
    #[must_use]
    pub const fn player(&self) -> Position {
        self.player
    }

    /// Counters accumulated so far.
    #[must_use]
    pub const fn totals(&self) -> Totals {
        self.totals
    }

    /// Cells around the player that are simulated at full detail.
    #[must_use]
    pub fn viewport(&self) -> Rect {
        let cell = self.player.cell();
        Rect::around(cell.x(), cell.y(), VIEW_RADIUS)
            .intersection(&self.dungeon.bounds())
            .unwrap_or_default()
    }

    /// Sets fire to a cell rectangle for `lifetime`.
    pub fn ignite(&mut self, cells: Rect, lifetime: Duration) -> FireZoneId {
        self.fire.start_fire_zone(cells, lifetime)
    }

    /// Puts out a fire before it burns down.
    pub fn extinguish(&mut self, id: FireZoneId) -> bool {
        self.fire.remove_fire_zone(id)
    }

    /// Drops something into the water at `at`.
    pub fn splash(&mut self, at: Position, height: f32) -> bool {
        self.ripples
            .start_ripple(&self.dungeon, &mut self.rng, at, height)
    }

    /// Changes a cell's terrain and refreshes whatever depends on it.
    ///
    /// Planting or felling a tree repaints the canopies around it; changing
    /// whether a cell ripples rebuilds the water zones.
    pub fn set_terrain(&mut self, cell: CellCoord, terrain: TerrainKind) -> bool {
        let Some(previous) = self.dungeon.terrain(cell) else {
            return false;
        };
        if !self.dungeon.set_terrain(cell, terrain) {
            return false;
        }
        if previous.tree_species().is_some() || terrain.tree_species().is_some() {
            let _ = self.canopy.recompute_tree(&mut self.dungeon, cell);
        }
        if previous.ripples() != terrain.ripples() {
            self.ripples.invalidate();
        }
        true
    }

    /// Runs one frame: director, ripples, fire, light accumulation, world
    /// passes and commands, field of view and memory, then the read-only
    /// snapshot.
    pub fn tick(&mut self, dt: Duration) -> FrameSnapshot {
        let viewport = self.viewport();
        {
            let mut ctx = FrameContext::new(dt, self.elapsed, viewport, &mut self.rng);
            self.director.update(
                &mut ctx,
                self.player.cell(),
                self.dungeon.creature_count(),
                &mut self.commands,
            );
            self.ripples.update(&mut ctx, &self.dungeon);
            self.fire.update(&mut ctx);
            self.lighting
                .update(&ctx, &self.dungeon, &mut self.light_buffer);
        }

        self.creature_clock = self.creature_clock.saturating_add(dt);
        while self.creature_clock >= CREATURE_STEP {
            self.creature_clock -= CREATURE_STEP;
            self.step_creatures();
        }
        self.pick_up_items();
        self.apply_commands();
        self.watch_boss();

        self.dungeon.compute_fov(self.player, viewport);
        self.dungeon.remember_fov();
        self.elapsed = self.elapsed.saturating_add(dt);
        self.frame += 1;
        self.snapshot(viewport)
    }

    /// Moves every creature one cell, killing those that reach the player.
    fn step_creatures(&mut self) {
        let player = self.player.cell();
        let Self {
            dungeon,
            ripples,
            director,
            rng,
            commands,
            player_health,
            totals,
            ..
        } = self;

        dungeon.update_creatures(|dungeon, id| {
            let Some(creature) = dungeon.creature(id).copied() else {
                return;
            };
            let from = creature.cell();
            let pattern = creature.kind().walk_pattern();
            let options: Vec<CellCoord> = STEPS
                .iter()
                .map(|(dx, dy)| from.offset(*dx, *dy))
                .filter(|cell| {
                    dungeon
                        .terrain(*cell)
                        .and_then(|terrain| pattern.walk_cost(terrain))
                        .is_some()
                })
                .collect();
            let next = if rng.gen_bool(CHASE_CHANCE) {
                options
                    .iter()
                    .min_by_key(|cell| cell.distance_squared(player))
                    .copied()
            } else {
                options.choose(&mut *rng).copied()
            };
            let Some(next) = next else {
                return;
            };

            if next == player {
                let _ = dungeon.remove_creature(id, true);
                *player_health = (*player_health - CONTACT_DAMAGE).max(0.0);
                totals.kills += 1;
                let _ = director.kill_creature(id, next, *player_health, &mut *rng, &mut *commands);
                return;
            }

            let _ = dungeon.move_creature(id, Position::cell_center(next));
            let wading = dungeon.terrain(next).is_some_and(|terrain| terrain.ripples());
            if wading {
                let _ = ripples.start_ripple(
                    dungeon,
                    &mut *rng,
                    Position::cell_center(next),
                    WADE_RIPPLE,
                );
            }
        });
    }

    fn pick_up_items(&mut self) {
        let player = self.player.cell();
        let Self {
            dungeon,
            player_health,
            totals,
            ..
        } = self;
        dungeon.update_items(|dungeon, id| {
            let potion = dungeon
                .item(id)
                .is_some_and(|item| item.cell() == player && item.kind() == ItemKind::HealthPotion);
            if potion && dungeon.remove_item(id).is_some() {
                *player_health = (*player_health + POTION_HEAL).min(1.0);
                totals.potions_used += 1;
            }
        });
    }

    fn apply_commands(&mut self) {
        for command in self.commands.drain(..) {
            emberfall_world::apply(&mut self.dungeon, command, &mut self.rng, &mut self.events);
        }
        for event in &self.events {
            match event {
                Event::CreatureSpawned { .. } => self.totals.spawned += 1,
                Event::SpawnFailed { .. } => self.totals.failed_spawns += 1,
                Event::ItemDropped { .. } => self.totals.items_dropped += 1,
            }
        }
        self.director.handle(&self.events);
        self.events.clear();
    }

    /// Tells the director when the boss first comes into view and when it dies.
    fn watch_boss(&mut self) {
        let mut bosses = self
            .dungeon
            .creatures()
            .filter(|creature| creature.kind().is_boss())
            .peekable();
        let alive = bosses.peek().is_some();
        let seen = bosses.any(|creature| self.dungeon.is_in_fov(creature.cell()));

        if seen && !self.boss_sighted {
            self.boss_sighted = true;
            self.director.boss_seen();
        }
        if self.boss_sighted && !alive {
            self.director.boss_dead();
        }
    }

    fn snapshot(&mut self, viewport: Rect) -> FrameSnapshot {
        let water_sub_cells = self.ripples.render_ground(
            &self.dungeon,
            self.elapsed.as_secs_f32(),
            viewport,
            &mut self.ground,
        );
        let lit_sub_cells = self
            .light_buffer
            .tone_mapped()
            .iter()
            .filter(|color| !color.is_black())
            .count();
        let visible_cells = viewport
            .iter()
            .filter(|(x, y)| self.dungeon.is_in_fov(CellCoord::new(*x, *y)))
            .count();

        FrameSnapshot {
            frame: self.frame,
            elapsed: self.elapsed.as_secs_f32(),
            regime: format!("{:?}", self.director.regime()),
            wave: self.director.wave_position(),
            player_health: self.player_health,
            creatures: self.dungeon.creature_count(),
            items: self.dungeon.items().count(),
            corpses: self.dungeon.corpses().len(),
            active_water_zones: self.ripples.active_zone_count(),
            fire_zones: self.fire.zone_count(),
            lit_sub_cells,
            water_sub_cells,
            visible_cells,
        }
    }
}
