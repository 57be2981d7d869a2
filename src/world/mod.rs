//! The composed simulation state for one level.
//!
//! A `World` owns its sub-components by name instead of inheriting
//! behavior: the tile grid, the delta clock, the actor storage with its
//! occupancy index, an item table, a door table, and an ordered chain of
//! description providers. Everything mutates the grid through forwarding
//! methods.

pub mod components;
pub mod resources;
pub mod systems;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;
use specs::prelude::{
    Builder, Dispatcher, DispatcherBuilder, World as SpecsWorld, WorldExt,
};

pub use specs::prelude::Entity;

use crate::clock::DeltaClock;
use crate::error::Result;
use crate::fov::FovEngine;
use crate::r#gen::chokepoint;
use crate::map::{Grid, Tile};
use crate::rng;

use self::components::{Brain, Expired, Name, Position, Viewshed};
use self::resources::SightContext;
use self::systems::ViewshedSystem;

/// An actor's behavior, invoked once per due turn.
pub trait Act: Send + Sync {
    /// Performs the actor's action. The return value is the delta until
    /// its next turn; None reschedules at the default delta of 1.
    fn act(&mut self, world: &mut World, me: Entity) -> Option<u64>;
}

/// Something lying on the floor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub glyph: u16,
}

type Describer = Box<dyn Fn(&World, Point) -> Option<String> + Send + Sync>;

pub struct World {
    pub grid: Grid,
    pub rng: RandomNumberGenerator,
    pub turn: u64,
    clock: DeltaClock<Entity>,
    actors: SpecsWorld,
    dispatcher: Dispatcher<'static, 'static>,
    occupancy: Vec<Option<Entity>>,
    registered: HashSet<Entity>,
    items: HashMap<Point, Item>,
    doors: HashMap<Point, bool>,
    descriptions: HashMap<Point, String>,
    describers: Vec<Describer>,
    fov: Arc<FovEngine>,
}

impl World {
    pub fn new(grid: Grid, seed: u64) -> Self {
        let mut actors = SpecsWorld::new();
        actors.register::<Position>();
        actors.register::<Name>();
        actors.register::<Brain>();
        actors.register::<Expired>();
        actors.register::<Viewshed>();

        let fov = Arc::new(FovEngine::new());
        actors.insert(fov.clone());
        actors.insert(SightContext::from_grid(&grid));

        let dispatcher = DispatcherBuilder::new()
            .with(ViewshedSystem::default(), "viewshed", &[])
            .build();

        let occupancy = vec![None; (grid.width * grid.height) as usize];
        Self {
            grid,
            rng: RandomNumberGenerator::seeded(seed),
            turn: 0,
            clock: DeltaClock::new(),
            actors,
            dispatcher,
            occupancy,
            registered: HashSet::new(),
            items: HashMap::new(),
            doors: HashMap::new(),
            descriptions: HashMap::new(),
            describers: Vec::new(),
            fov,
        }
    }

    pub fn fov(&self) -> &FovEngine {
        &self.fov
    }

    pub fn actor_count(&self) -> usize {
        self.registered.len()
    }

    /// Advances the world by one due batch.
    ///
    /// Pops the next batch from the clock, runs every actor's action,
    /// removes actors expired during the batch, reschedules the
    /// survivors, then refreshes viewsheds.
    pub fn tick(&mut self) {
        if self.clock.is_empty() {
            return;
        }

        // Batch order is fixed by entity id so a seed replays identically.
        let mut due: Vec<Entity> = self.clock.advance().into_iter().collect();
        due.sort_by_key(|entity| entity.id());

        let mut deltas = Vec::with_capacity(due.len());
        for entity in due {
            let brain = self.actors.write_component::<Brain>().remove(entity);
            let delta = match brain {
                Some(mut brain) => {
                    let delta = brain.0.act(self, entity).unwrap_or(1);
                    let _ = self.actors.write_component::<Brain>().insert(entity, brain);
                    delta
                }
                None => 1,
            };
            deltas.push((entity, delta));
        }

        // Expiry is swept after all actions so an action may expire a peer
        // that acted (or would act) in the same batch.
        let expired: Vec<Entity> = {
            let flags = self.actors.read_component::<Expired>();
            self.registered
                .iter()
                .copied()
                .filter(|entity| flags.contains(*entity))
                .collect()
        };
        for entity in expired {
            self.remove_actor(entity);
        }

        for (entity, delta) in deltas {
            if self.registered.contains(&entity) {
                self.clock.schedule(entity, delta);
            }
        }

        self.refresh_sight();
        self.turn = self.turn.wrapping_add(1);
    }

    fn refresh_sight(&mut self) {
        self.actors.insert(SightContext::from_grid(&self.grid));
        self.dispatcher.dispatch(&self.actors);
        self.actors.maintain();
    }

    /// Registers an actor, placing it at `pos` or at a random open cell.
    pub fn add_actor(
        &mut self,
        name: impl Into<String>,
        brain: Box<dyn Act>,
        pos: Option<Point>,
        delta: u64,
    ) -> Result<Entity> {
        let pos = match pos {
            Some(pos) => pos,
            None => self.get_open_pos()?,
        };
        let idx = self.occ_idx(pos).expect("actor position is on the grid");
        assert!(self.occupancy[idx].is_none(), "cell is already occupied");

        let name = name.into();
        log::debug!("adding actor {name} at ({}, {})", pos.x, pos.y);
        let entity = self
            .actors
            .create_entity()
            .with(Position { point: pos })
            .with(Name(name))
            .with(Brain(brain))
            .build();
        self.occupancy[idx] = Some(entity);
        self.registered.insert(entity);
        self.clock.schedule(entity, delta);
        Ok(entity)
    }

    pub fn remove_actor(&mut self, entity: Entity) {
        assert!(self.registered.remove(&entity), "actor is not registered");
        self.clock.unschedule(entity);
        if let Some(pos) = self.position_of(entity) {
            if let Some(idx) = self.occ_idx(pos) {
                self.occupancy[idx] = None;
            }
        }
        let _ = self.actors.delete_entity(entity);
    }

    /// Moves an actor to `pos`. The destination must be unoccupied.
    pub fn set_actor_pos(&mut self, entity: Entity, pos: Point) {
        assert!(self.registered.contains(&entity), "actor is not registered");
        let new_idx = self.occ_idx(pos).expect("destination is on the grid");
        assert!(self.occupancy[new_idx].is_none(), "destination is occupied");

        let old = self
            .position_of(entity)
            .expect("registered actor has a position");
        if let Some(old_idx) = self.occ_idx(old) {
            self.occupancy[old_idx] = None;
        }
        self.occupancy[new_idx] = Some(entity);

        {
            let mut positions = self.actors.write_component::<Position>();
            if let Some(position) = positions.get_mut(entity) {
                position.point = pos;
            }
        }
        let mut viewsheds = self.actors.write_component::<Viewshed>();
        if let Some(viewshed) = viewsheds.get_mut(entity) {
            viewshed.dirty = true;
        }
    }

    /// Translates an actor by `delta`.
    pub fn move_actor(&mut self, entity: Entity, delta: Point) {
        let pos = self
            .position_of(entity)
            .expect("registered actor has a position");
        self.set_actor_pos(entity, pos + delta);
    }

    pub fn actor_at(&self, pos: Point) -> Option<Entity> {
        self.occ_idx(pos).and_then(|idx| self.occupancy[idx])
    }

    /// True if the cell is passable and unoccupied.
    pub fn open_at(&self, pos: Point) -> bool {
        self.grid.passable_at(pos) && self.actor_at(pos).is_none()
    }

    pub fn get_open_pos(&mut self) -> Result<Point> {
        let grid = &self.grid;
        let occupancy = &self.occupancy;
        let width = grid.width;
        grid.get_random_pos(
            &mut self.rng,
            |pos| {
                grid.passable_at(pos)
                    && occupancy[(pos.y * width + pos.x) as usize].is_none()
            },
            100,
        )
    }

    /// Flags an actor for removal at the end of the current tick.
    pub fn expire(&mut self, entity: Entity) {
        let mut flags = self.actors.write_component::<Expired>();
        let _ = flags.insert(entity, Expired);
    }

    pub fn is_registered(&self, entity: Entity) -> bool {
        self.registered.contains(&entity)
    }

    pub fn position_of(&self, entity: Entity) -> Option<Point> {
        let positions = self.actors.read_component::<Position>();
        positions.get(entity).map(|position| position.point)
    }

    pub fn name_of(&self, entity: Entity) -> Option<String> {
        let names = self.actors.read_component::<Name>();
        names.get(entity).map(|name| name.0.clone())
    }

    /// Gives an actor a viewshed, recomputed whenever it moves.
    pub fn set_viewshed(&mut self, entity: Entity, radius: i32) {
        let mut viewsheds = self.actors.write_component::<Viewshed>();
        let _ = viewsheds.insert(
            entity,
            Viewshed {
                radius,
                dirty: true,
                visible: Vec::new(),
            },
        );
    }

    pub fn visible_from(&self, entity: Entity) -> Vec<Point> {
        let viewsheds = self.actors.read_component::<Viewshed>();
        viewsheds
            .get(entity)
            .map(|viewshed| viewshed.visible.clone())
            .unwrap_or_default()
    }

    /// Places an item at `pos` or at a random empty cell.
    pub fn place_item(&mut self, item: Item, pos: Option<Point>) -> Result<Point> {
        let pos = match pos {
            Some(pos) => pos,
            None => self.get_empty_pos()?,
        };
        assert!(!self.items.contains_key(&pos), "cell already holds an item");
        self.items.insert(pos, item);
        Ok(pos)
    }

    pub fn remove_item(&mut self, pos: Point) -> Option<Item> {
        self.items.remove(&pos)
    }

    pub fn item_at(&self, pos: Point) -> Option<&Item> {
        self.items.get(&pos)
    }

    /// True if the cell is passable and holds no item.
    pub fn empty_at(&self, pos: Point) -> bool {
        self.grid.passable_at(pos) && !self.items.contains_key(&pos)
    }

    pub fn get_empty_pos(&mut self) -> Result<Point> {
        let grid = &self.grid;
        let items = &self.items;
        grid.get_random_pos(
            &mut self.rng,
            |pos| grid.passable_at(pos) && !items.contains_key(&pos),
            100,
        )
    }

    pub fn add_door(&mut self, pos: Point, open: bool) {
        self.doors.insert(pos, open);
        self.set_door_tile(pos, open);
    }

    pub fn door_open_at(&self, pos: Point) -> bool {
        self.doors.get(&pos) == Some(&true)
    }

    pub fn door_closed_at(&self, pos: Point) -> bool {
        self.doors.get(&pos) == Some(&false)
    }

    pub fn open_door(&mut self, pos: Point) {
        assert!(self.door_closed_at(pos), "no closed door here");
        self.doors.insert(pos, true);
        self.set_door_tile(pos, true);
    }

    pub fn close_door(&mut self, pos: Point) {
        assert!(self.door_open_at(pos), "no open door here");
        self.doors.insert(pos, false);
        self.set_door_tile(pos, false);
    }

    /// Detects chokepoints on the grid and turns them into doors.
    pub fn scatter_doors(&mut self, open_chance: f32, door_chance: f32) {
        let sites = chokepoint::door_sites(&self.grid);
        log::debug!("{} chokepoint sites detected", sites.len());
        for site in sites {
            if rng::chance(&mut self.rng, door_chance) {
                let open = rng::chance(&mut self.rng, open_chance);
                self.add_door(site, open);
            }
        }
    }

    fn set_door_tile(&mut self, pos: Point, open: bool) {
        let tile = if open {
            Tile::door_open()
        } else {
            Tile::door_closed()
        };
        self.grid.set_tile(pos, tile);
    }

    pub fn set_description(&mut self, pos: Point, text: impl Into<String>) {
        self.descriptions.insert(pos, text.into());
    }

    /// Appends a description provider; providers are consulted in order
    /// before the actor table, the item table, and the static text.
    pub fn add_descriptor(&mut self, provider: Describer) {
        self.describers.push(provider);
    }

    pub fn describe(&self, pos: Point) -> String {
        for provider in &self.describers {
            if let Some(text) = provider(self, pos) {
                return text;
            }
        }
        if let Some(entity) = self.actor_at(pos) {
            if let Some(name) = self.name_of(entity) {
                return name;
            }
        }
        if let Some(item) = self.item_at(pos) {
            return item.name.clone();
        }
        self.descriptions.get(&pos).cloned().unwrap_or_default()
    }

    fn occ_idx(&self, pos: Point) -> Option<usize> {
        if self.grid.in_bounds(pos) {
            Some((pos.y * self.grid.width + pos.x) as usize)
        } else {
            None
        }
    }
}
