use std::collections::BTreeMap;

use delve_dungeon::{
    DungeonCatalog, DungeonError, PickupKind, PortalDef, carve, fresh_instance_store, generate_layout,
    plan_spawns,
};

use crate::instance::{
    ChestId, DungeonInstance, Enemy, EnemyId, InstanceId, Interactable, InteractableId, LockedChest,
    Payload,
};
use crate::inventory::Inventory;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstancePhase {
    Inactive,
    Generating,
    Carving,
    Populating,
    Active,
    Exiting,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PortalRecord {
    pub visits: u32,
    pub completed: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChestOutcome {
    Unlocked,
    AlreadyUnlocked,
    WrongKey { required: String },
    NoKeyHeld,
    UnknownChest,
    NoInstance,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractOutcome {
    Granted { item: String, amount: u32 },
    AlreadyConsumed,
    ChestLocked { chest_id: ChestId },
    UnknownInteractable,
    NoInstance,
}

/// Owns the (at most one) live dungeon and drives it through its lifecycle.
pub struct InstanceManager {
    catalog: DungeonCatalog,
    portals: BTreeMap<String, PortalDef>,
    records: BTreeMap<String, PortalRecord>,
    phase: InstancePhase,
    current: Option<DungeonInstance>,
    next_instance: u64,
}

impl InstanceManager {
    pub fn new(catalog: DungeonCatalog) -> Self {
        let portals = catalog
            .portals()
            .iter()
            .map(|p| (p.id.clone(), p.clone()))
            .collect();
        Self {
            catalog,
            portals,
            records: BTreeMap::new(),
            phase: InstancePhase::Inactive,
            current: None,
            next_instance: 1,
        }
    }

    pub fn catalog(&self) -> &DungeonCatalog {
        &self.catalog
    }

    pub fn phase(&self) -> InstancePhase {
        self.phase
    }

    pub fn current_instance(&self) -> Option<&DungeonInstance> {
        self.current.as_ref()
    }

    pub fn current_instance_mut(&mut self) -> Option<&mut DungeonInstance> {
        self.current.as_mut()
    }

    /// Adds or replaces a portal beyond those in the catalog.
    pub fn register_portal(&mut self, portal: PortalDef) -> Result<(), DungeonError> {
        self.catalog.theme(portal.theme)?;
        self.portals.insert(portal.id.clone(), portal);
        Ok(())
    }

    pub fn portal_record(&self, portal_id: &str) -> PortalRecord {
        self.records.get(portal_id).copied().unwrap_or_default()
    }

    fn set_phase(&mut self, phase: InstancePhase) {
        log::debug!("instance phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Builds and publishes the portal's dungeon, leaving any current one first. On failure
    /// nothing is published and the manager is back to `Inactive`.
    pub fn activate_portal(&mut self, portal_id: &str) -> Result<&DungeonInstance, DungeonError> {
        let portal = self
            .portals
            .get(portal_id)
            .cloned()
            .ok_or_else(|| DungeonError::config(format!("unknown portal `{portal_id}`")))?;
        if self.current.is_some() {
            self.exit_instance(false);
        }
        match self.build(&portal) {
            Ok(instance) => {
                self.records.entry(portal.id.clone()).or_default().visits += 1;
                log::info!(
                    "entered {} ({} seed {}): {} enemies, {} interactables",
                    portal.id,
                    portal.theme,
                    portal.seed,
                    instance.enemies.len(),
                    instance.interactables.len()
                );
                self.set_phase(InstancePhase::Active);
                Ok(&*self.current.insert(instance))
            }
            Err(e) => {
                log::warn!("activating {} failed: {e}", portal.id);
                self.set_phase(InstancePhase::Inactive);
                Err(e)
            }
        }
    }

    fn build(&mut self, portal: &PortalDef) -> Result<DungeonInstance, DungeonError> {
        let (theme, seed) = (portal.theme, portal.seed);

        self.set_phase(InstancePhase::Generating);
        let layout = generate_layout(&self.catalog, theme, seed)?;

        self.set_phase(InstancePhase::Carving);
        let mut store = fresh_instance_store(&self.catalog, theme, seed)?;
        let outcome = carve(&layout, &mut store, &self.catalog, theme)?;

        self.set_phase(InstancePhase::Populating);
        let plans = plan_spawns(&self.catalog, &outcome, &store)?;
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        let enemies = plans
            .into_iter()
            .enumerate()
            .map(|(i, p)| Enemy {
                id: EnemyId(i as u32 + 1),
                instance: id,
                type_id: p.type_id,
                is_boss: p.is_boss,
                room: p.room,
                stage: p.stage,
                position: p.position,
                max_hp: p.max_hp,
                hp: p.max_hp,
            })
            .collect();

        let def = self.catalog.theme(theme)?;
        let mut interactables = Vec::new();
        let mut locked_chests = BTreeMap::new();
        let mut next_id = 1u32;
        for site in &outcome.pickup_sites {
            let item = match site.kind {
                PickupKind::Coin => def.coin_item.clone(),
                PickupKind::Key => def.key_item.clone(),
            };
            interactables.push(Interactable {
                id: InteractableId(next_id),
                position: site.pos.floor_center(),
                payload: Payload::Pickup { item, amount: 1 },
                consumed: false,
            });
            next_id += 1;
        }
        for (i, site) in outcome.chest_sites.iter().enumerate() {
            let chest_id = ChestId(i as u32 + 1);
            locked_chests.insert(
                chest_id,
                LockedChest {
                    required_key_id: def.key_item.clone(),
                    unlocked: false,
                    variant: site.variant,
                    loot_item: def.loot_item.clone(),
                    loot_amount: def.loot_amount,
                },
            );
            interactables.push(Interactable {
                id: InteractableId(next_id),
                position: site.pos.floor_center(),
                payload: Payload::LockedChest { chest_id },
                consumed: false,
            });
            next_id += 1;
        }

        Ok(DungeonInstance {
            id,
            portal_id: portal.id.clone(),
            theme,
            seed,
            spawn_point: outcome.spawn_point.floor_center(),
            exit_point: outcome.exit_point.floor_center(),
            surface_y: outcome.surface_y,
            layout,
            enemies,
            interactables,
            locked_chests,
            store,
        })
    }

    /// Leaves the current dungeon. `completed` marks the portal's visit as finished, which
    /// only reaching the exit does. Returns whether an instance was active.
    pub fn exit_instance(&mut self, completed: bool) -> bool {
        let Some(instance) = self.current.take() else {
            return false;
        };
        self.set_phase(InstancePhase::Exiting);
        if completed {
            self.records.entry(instance.portal_id.clone()).or_default().completed += 1;
        }
        log::info!(
            "left {} (instance {}, completed: {completed})",
            instance.portal_id,
            instance.id.0
        );
        drop(instance);
        self.set_phase(InstancePhase::Inactive);
        true
    }

    /// Spends one matching key to unlock a chest.
    pub fn use_key_for_locked_chest(
        &mut self,
        chest_id: ChestId,
        key_id: &str,
        inventory: &mut Inventory,
    ) -> ChestOutcome {
        let Some(instance) = self.current.as_mut() else {
            return ChestOutcome::NoInstance;
        };
        let Some(chest) = instance.locked_chests.get_mut(&chest_id) else {
            return ChestOutcome::UnknownChest;
        };
        if chest.unlocked {
            return ChestOutcome::AlreadyUnlocked;
        }
        if chest.required_key_id != key_id {
            return ChestOutcome::WrongKey {
                required: chest.required_key_id.clone(),
            };
        }
        if !inventory.take(key_id, 1) {
            return ChestOutcome::NoKeyHeld;
        }
        chest.unlocked = true;
        log::info!("chest {} unlocked with {key_id}", chest_id.0);
        ChestOutcome::Unlocked
    }

    /// Uses an interactable once: pickups grant their item, unlocked chests their loot.
    pub fn interact(&mut self, id: InteractableId, inventory: &mut Inventory) -> InteractOutcome {
        let Some(instance) = self.current.as_mut() else {
            return InteractOutcome::NoInstance;
        };
        let chests = &instance.locked_chests;
        let Some(it) = instance.interactables.iter_mut().find(|i| i.id == id) else {
            return InteractOutcome::UnknownInteractable;
        };
        if it.consumed {
            return InteractOutcome::AlreadyConsumed;
        }
        let (item, amount) = match &it.payload {
            Payload::Pickup { item, amount } => (item.clone(), *amount),
            Payload::LockedChest { chest_id } => match chests.get(chest_id) {
                Some(c) if c.unlocked => (c.loot_item.clone(), c.loot_amount),
                _ => return InteractOutcome::ChestLocked { chest_id: *chest_id },
            },
        };
        it.consumed = true;
        inventory.add(&item, amount);
        log::debug!("interactable {} granted {amount} {item}", id.0);
        InteractOutcome::Granted { item, amount }
    }
}
