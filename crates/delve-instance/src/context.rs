use delve_blocks::Block;
use delve_dungeon::{DungeonCatalog, DungeonError};
use delve_geom::Vec3;
use delve_world::{ChunkStore, SpatialQuery, StoreError};

use crate::event::{Event, EventEnvelope, EventQueue};
use crate::instance::{ChestId, DungeonInstance, InteractableId};
use crate::inventory::Inventory;
use crate::manager::{ChestOutcome, InstanceManager, InteractOutcome};

/// Horizontal distance from the exit marker that ends a visit.
pub const EXIT_TRIGGER_RADIUS: f32 = 2.0;
const MAX_EVENTS_PER_TICK: usize = 1024;

/// Everything one player session needs: the hub world, the instance manager, the player's
/// inventory and position, and the event queue that drives them.
pub struct GameContext {
    pub manager: InstanceManager,
    pub hub: ChunkStore,
    pub hub_spawn: Vec3,
    pub inventory: Inventory,
    pub player: Vec3,
    pub queue: EventQueue,
    pub tick: u64,
}

impl GameContext {
    pub fn new(catalog: DungeonCatalog, hub: ChunkStore, hub_spawn: Vec3) -> Self {
        Self {
            manager: InstanceManager::new(catalog),
            hub,
            hub_spawn,
            inventory: Inventory::new(),
            player: hub_spawn,
            queue: EventQueue::new(),
            tick: 0,
        }
    }

    pub fn current_instance(&self) -> Option<&DungeonInstance> {
        self.manager.current_instance()
    }

    /// Enters the portal's dungeon and puts the player on its spawn point.
    pub fn activate_portal(&mut self, portal_id: &str) -> Result<&DungeonInstance, DungeonError> {
        let spawn = self.manager.activate_portal(portal_id)?.spawn_point;
        self.player = spawn;
        self.manager
            .current_instance()
            .ok_or_else(|| DungeonError::config("instance vanished after activation"))
    }

    /// Leaves the current dungeon and returns the player to the hub.
    pub fn exit_instance(&mut self, completed: bool) -> bool {
        let left = self.manager.exit_instance(completed);
        if left {
            self.player = self.hub_spawn;
        }
        left
    }

    pub fn use_key_for_locked_chest(&mut self, chest: ChestId, key_item: &str) -> ChestOutcome {
        self.manager
            .use_key_for_locked_chest(chest, key_item, &mut self.inventory)
    }

    pub fn interact(&mut self, id: InteractableId) -> InteractOutcome {
        self.manager.interact(id, &mut self.inventory)
    }

    fn store(&self) -> &ChunkStore {
        self.manager
            .current_instance()
            .map(|i| &i.store)
            .unwrap_or(&self.hub)
    }

    fn store_mut(&mut self) -> &mut ChunkStore {
        match self.manager.current_instance_mut() {
            Some(i) => &mut i.store,
            None => &mut self.hub,
        }
    }

    /// Drains this tick's events, then advances the clock.
    pub fn step(&mut self) {
        let mut processed = 0usize;
        while let Some(env) = self.queue.pop_ready() {
            self.handle_event(env);
            processed += 1;
            if processed >= MAX_EVENTS_PER_TICK {
                log::warn!("event budget hit at tick {}", self.tick);
                break;
            }
        }
        self.tick = self.tick.wrapping_add(1);
        self.queue.advance_tick();
        let stale = self.queue.count_stale_events();
        if stale > 0 {
            log::warn!(target: "events", "{} event(s) left in past ticks", stale);
        }
    }

    fn handle_event(&mut self, env: EventEnvelope) {
        Self::log_event(self.tick, &env.kind);
        match env.kind {
            Event::Tick => {}
            Event::PortalActivated { portal_id } => {
                if let Err(e) = self.activate_portal(&portal_id) {
                    log::error!("portal {portal_id}: {e}");
                }
            }
            Event::ExitRequested { completed } => {
                self.exit_instance(completed);
            }
            Event::PlayerMoved { position } => {
                self.player = position;
                let at_exit = self
                    .current_instance()
                    .is_some_and(|i| i.exit_point.distance_xz(position) <= EXIT_TRIGGER_RADIUS);
                if at_exit {
                    self.queue.emit_now(Event::ExitRequested { completed: true });
                }
            }
            Event::Interact { id } => {
                let outcome = self.interact(id);
                log::debug!(target: "events", "[tick {}] interact {} -> {:?}", self.tick, id.0, outcome);
            }
            Event::UseKey { chest, key_item } => {
                let outcome = self.use_key_for_locked_chest(chest, &key_item);
                log::debug!(target: "events", "[tick {}] use key on {} -> {:?}", self.tick, chest.0, outcome);
            }
        }
    }

    fn log_event(tick: u64, ev: &Event) {
        match ev {
            Event::Tick => {
                log::trace!(target: "events", "[tick {}] Tick", tick);
            }
            Event::PlayerMoved { position } => {
                log::trace!(target: "events", "[tick {}] PlayerMoved ({:.1},{:.1},{:.1})",
                    tick, position.x, position.y, position.z);
            }
            Event::PortalActivated { portal_id } => {
                log::info!(target: "events", "[tick {}] PortalActivated {}", tick, portal_id);
            }
            Event::ExitRequested { completed } => {
                log::info!(target: "events", "[tick {}] ExitRequested completed={}", tick, completed);
            }
            Event::Interact { id } => {
                log::info!(target: "events", "[tick {}] Interact {}", tick, id.0);
            }
            Event::UseKey { chest, key_item } => {
                log::info!(target: "events", "[tick {}] UseKey chest={} key={}", tick, chest.0, key_item);
            }
        }
    }
}

/// Reads and writes go to the live dungeon while one is active, otherwise to the hub.
impl SpatialQuery for GameContext {
    fn get_block(&self, wx: i32, wy: i32, wz: i32) -> Block {
        self.store().get_block(wx, wy, wz)
    }

    fn set_block(&mut self, wx: i32, wy: i32, wz: i32, block: Block) -> Result<(), StoreError> {
        self.store_mut().set_block(wx, wy, wz, block)
    }

    fn top_solid_y(&self, wx: i32, wz: i32) -> i32 {
        self.store().top_solid_y(wx, wz)
    }
}
