use std::collections::BTreeMap;

/// Item counts by item id. Sizes and grid packing live elsewhere.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    items: BTreeMap<String, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    pub fn add(&mut self, item: &str, amount: u32) {
        if amount == 0 {
            return;
        }
        let n = self.items.entry(item.to_string()).or_insert(0);
        *n = n.saturating_add(amount);
    }

    /// Removes `amount` of `item` only if that many are held.
    pub fn take(&mut self, item: &str, amount: u32) -> bool {
        if amount == 0 {
            return true;
        }
        match self.items.get_mut(item) {
            Some(n) if *n >= amount => {
                *n -= amount;
                if *n == 0 {
                    self.items.remove(item);
                }
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
