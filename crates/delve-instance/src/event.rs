use std::collections::{BTreeMap, VecDeque};

use delve_geom::Vec3;

use crate::instance::{ChestId, InteractableId};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Tick,

    // Portal lifecycle
    PortalActivated { portal_id: String },
    ExitRequested { completed: bool },

    // Player intents
    PlayerMoved { position: Vec3 },
    Interact { id: InteractableId },
    UseKey { chest: ChestId, key_item: String },
}

impl Event {
    pub fn label(&self) -> &'static str {
        match self {
            Event::Tick => "Tick",
            Event::PortalActivated { .. } => "PortalActivated",
            Event::ExitRequested { .. } => "ExitRequested",
            Event::PlayerMoved { .. } => "PlayerMoved",
            Event::Interact { .. } => "Interact",
            Event::UseKey { .. } => "UseKey",
        }
    }
}

#[derive(Clone, Debug)]
pub struct EventEnvelope {
    pub id: u64,
    pub tick: u64,
    pub kind: Event,
}

/// Events bucketed by the tick they fire on, FIFO within a tick.
pub struct EventQueue {
    by_tick: BTreeMap<u64, VecDeque<EventEnvelope>>,
    pub now: u64,
    next_id: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self {
            by_tick: BTreeMap::new(),
            now: 0,
            next_id: 1,
        }
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    pub fn emit_now(&mut self, kind: Event) -> u64 {
        self.emit_at(self.now, kind)
    }

    pub fn emit_at(&mut self, tick: u64, kind: Event) -> u64 {
        let id = self.alloc_id();
        // Never schedule into a tick that has already been drained.
        let tick = tick.max(self.now);
        let env = EventEnvelope { id, tick, kind };
        self.by_tick.entry(tick).or_default().push_back(env);
        id
    }

    pub fn emit_after(&mut self, delta: u64, kind: Event) -> u64 {
        self.emit_at(self.now.saturating_add(delta), kind)
    }

    pub fn pop_ready(&mut self) -> Option<EventEnvelope> {
        self.by_tick.get_mut(&self.now).and_then(|q| q.pop_front())
    }

    pub fn advance_tick(&mut self) {
        if self.by_tick.get(&self.now).is_some_and(|q| q.is_empty()) {
            self.by_tick.remove(&self.now);
        }
        self.now = self.now.wrapping_add(1);
    }

    pub fn len(&self) -> usize {
        self.by_tick.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events left behind in ticks that have already passed.
    pub fn count_stale_events(&self) -> usize {
        self.by_tick.range(..self.now).map(|(_, q)| q.len()).sum()
    }
}
