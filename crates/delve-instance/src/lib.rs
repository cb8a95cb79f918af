//! Live dungeon instances: portal activation, teardown, interactables, and the game context.
#![forbid(unsafe_code)]

pub mod context;
pub mod event;
pub mod instance;
pub mod inventory;
pub mod manager;

pub use context::GameContext;
pub use event::{Event, EventEnvelope, EventQueue};
pub use instance::{
    ChestId, DungeonInstance, Enemy, EnemyId, InstanceId, Interactable, InteractableId, LockedChest,
    Payload,
};
pub use inventory::Inventory;
pub use manager::{ChestOutcome, InstanceManager, InstancePhase, InteractOutcome, PortalRecord};
