//! Per-slot cooldowns, charges and cast prevention
//!
//! Every slot that holds an ability tracks:
//! - a cooldown timer, scaled by cooldown reduction (CDR),
//! - regular charges, refilled one at a time as the cooldown completes,
//! - extra charges, which are spent first and never refill,
//! - a cast prevention lockout, independent of the cooldown.
//!
//! CDR is the sum of a global value and a per-category value, clamped to
//! `max_cdr`. A custom function can replace the sum.

use std::collections::HashMap;

/// Cooldown-relevant facts about an ability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CooldownSpec {
    pub cooldown: f32,
    pub category: u32,
    pub charges: u32,
}

/// Read-only view of one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CooldownInfo {
    pub current_cooldown: f32,
    /// Full cooldown after CDR.
    pub max_cooldown: f32,
    pub max_cooldown_without_cdr: f32,
    pub available_charges: u32,
    pub max_charges: u32,
    pub extra_charges: u32,
    pub cast_prevention_duration: f32,
    pub remaining_cast_prevention: f32,
}

#[derive(Debug, Clone)]
struct SlotCooldown {
    spec: CooldownSpec,
    cooldown: f32,
    current_charges: u32,
    max_charges: u32,
    extra_charges: u32,
    remaining_cast_prevention: f32,
    cast_prevention_duration: f32,
}

impl SlotCooldown {
    fn new(spec: CooldownSpec) -> Self {
        Self {
            spec,
            cooldown: 0.0,
            current_charges: spec.charges,
            max_charges: spec.charges,
            extra_charges: 0,
            remaining_cast_prevention: 0.0,
            cast_prevention_duration: 0.0,
        }
    }

    fn on_cooldown(&self) -> bool {
        self.cooldown > 0.0
    }

    fn refill_one(&mut self) -> bool {
        if self.current_charges < self.max_charges {
            self.current_charges += 1;
            true
        } else {
            false
        }
    }
}

pub type CdrFunction = Box<dyn Fn(f32, f32) -> f32 + Send + Sync>;

pub struct CooldownHandler {
    slots: Vec<Option<SlotCooldown>>,
    global_cdr: f32,
    max_cdr: f32,
    category_cdr: HashMap<u32, f32>,
    cdr_function: Option<CdrFunction>,
}

impl CooldownHandler {
    pub const DEFAULT_MAX_CDR: f32 = 0.9;

    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![None; slot_count],
            global_cdr: 0.0,
            max_cdr: Self::DEFAULT_MAX_CDR,
            category_cdr: HashMap::new(),
            cdr_function: None,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Install or clear a slot. Any running cooldown on the slot is discarded.
    pub fn set_slot(&mut self, slot: usize, spec: Option<CooldownSpec>) -> bool {
        match self.slots.get_mut(slot) {
            Some(entry) => {
                *entry = spec.map(SlotCooldown::new);
                true
            }
            None => false,
        }
    }

    pub fn global_cdr(&self) -> f32 {
        self.global_cdr
    }

    pub fn set_global_cdr(&mut self, cdr: f32) {
        self.global_cdr = cdr.clamp(0.0, self.max_cdr);
    }

    pub fn max_cdr(&self) -> f32 {
        self.max_cdr
    }

    /// Change the CDR cap, pulling stored values under it.
    pub fn set_max_cdr(&mut self, max_cdr: f32) {
        self.max_cdr = max_cdr.clamp(0.0, 1.0);
        if self.cdr_function.is_some() {
            return;
        }
        self.global_cdr = self.global_cdr.min(self.max_cdr);
        for cdr in self.category_cdr.values_mut() {
            *cdr = cdr.min(self.max_cdr);
        }
    }

    pub fn category_cdr(&self, category: u32) -> f32 {
        self.category_cdr.get(&category).copied().unwrap_or(0.0)
    }

    pub fn set_category_cdr(&mut self, category: u32, cdr: f32) {
        self.category_cdr
            .insert(category, cdr.clamp(0.0, self.max_cdr));
    }

    pub fn add_category_cdr(&mut self, category: u32, cdr: f32) {
        let total = self.category_cdr(category) + cdr;
        self.set_category_cdr(category, total);
    }

    /// Replace `global + category` with a custom combination.
    pub fn set_cdr_function(&mut self, function: Option<CdrFunction>) {
        self.cdr_function = function;
    }

    /// Tick every cooldown and cast prevention.
    pub fn update(&mut self, delta_time: f32) {
        for slot in 0..self.slots.len() {
            self.decrease_cooldown(slot, delta_time);
            if let Some(entry) = self.slots[slot].as_mut() {
                entry.remaining_cast_prevention -= delta_time;
                if entry.remaining_cast_prevention <= 0.0 {
                    entry.remaining_cast_prevention = 0.0;
                    entry.cast_prevention_duration = 0.0;
                }
            }
        }
    }

    /// Start the slot's cooldown at its full (CDR-adjusted) length.
    ///
    /// Does nothing and returns `false` if the slot is already cooling down,
    /// unless `force` restarts it. A zero-length cooldown refills a charge at once.
    pub fn put_on_cooldown(&mut self, slot: usize, force: bool) -> bool {
        let max = match self.slots.get(slot) {
            Some(Some(entry)) if force || !entry.on_cooldown() => self.max_cooldown(entry),
            _ => return false,
        };
        let Some(entry) = self.slot_mut(slot) else {
            return false;
        };
        if max <= 0.0 {
            entry.cooldown = 0.0;
            entry.refill_one();
        } else {
            entry.cooldown = max;
        }
        true
    }

    /// Lock the slot out of casting for `duration` seconds.
    pub fn put_on_cast_prevention(&mut self, slot: usize, duration: f32) -> bool {
        if duration <= 0.001 {
            return false;
        }
        match self.slot_mut(slot) {
            Some(entry) => {
                entry.remaining_cast_prevention = duration;
                entry.cast_prevention_duration = duration;
                true
            }
            None => false,
        }
    }

    /// Extend a running cooldown, capped at its full length.
    pub fn increase_cooldown(&mut self, slot: usize, amount: f32) -> bool {
        if !self.is_on_cooldown(slot) {
            return false;
        }
        let value = self.slots[slot].as_ref().map_or(0.0, |e| e.cooldown) + amount;
        self.clamp_cooldown(slot, value)
    }

    /// Shorten a cooldown. Finishing it refills a charge, and the cooldown
    /// restarts while charges remain below max.
    pub fn decrease_cooldown(&mut self, slot: usize, amount: f32) -> bool {
        let Some(Some(entry)) = self.slots.get(slot) else {
            return false;
        };
        let was_on_cooldown = entry.on_cooldown();
        let value = entry.cooldown - amount;
        self.clamp_cooldown(slot, value);

        if was_on_cooldown && !self.is_on_cooldown(slot) {
            let restart = self
                .slot_mut(slot)
                .is_some_and(|entry| {
                    entry.refill_one() && entry.current_charges < entry.max_charges
                });
            if restart {
                let full = self.slots[slot].as_ref().map_or(0.0, |e| self.max_cooldown(e));
                self.clamp_cooldown(slot, full);
            }
        }
        true
    }

    /// Clear the cooldown without touching charges.
    pub fn reset_cooldown(&mut self, slot: usize) -> bool {
        self.clamp_cooldown(slot, 0.0)
    }

    pub fn is_on_cooldown(&self, slot: usize) -> bool {
        self.slot(slot).is_some_and(SlotCooldown::on_cooldown)
    }

    pub fn is_on_cast_prevention(&self, slot: usize) -> bool {
        self.slot(slot)
            .is_some_and(|entry| entry.remaining_cast_prevention > 0.0)
    }

    /// Regular or extra charges left.
    pub fn has_charges(&self, slot: usize) -> bool {
        self.slot(slot)
            .is_some_and(|entry| entry.current_charges + entry.extra_charges > 0)
    }

    /// Spend `amount` charges, extra charges first. Returns what is left, or
    /// `None` if the slot doesn't have enough.
    pub fn consume_charges(&mut self, slot: usize, amount: u32) -> Option<u32> {
        let entry = self.slot_mut(slot)?;
        if amount == 0 || entry.current_charges + entry.extra_charges < amount {
            return None;
        }
        let from_extra = amount.min(entry.extra_charges);
        entry.extra_charges -= from_extra;
        entry.current_charges -= amount - from_extra;
        Some(entry.current_charges + entry.extra_charges)
    }

    pub fn add_available_charges(&mut self, slot: usize, amount: u32) -> bool {
        match self.slot_mut(slot) {
            Some(entry) => {
                entry.current_charges = (entry.current_charges + amount).min(entry.max_charges);
                true
            }
            None => false,
        }
    }

    pub fn remove_available_charges(&mut self, slot: usize, amount: u32) -> Option<u32> {
        let entry = self.slot_mut(slot)?;
        entry.current_charges = entry.current_charges.saturating_sub(amount);
        Some(entry.current_charges)
    }

    /// Resize the charge pool. Shrinking drops charges; `fill_if_full` tops up
    /// a slot that was at its old maximum.
    pub fn set_max_charges(&mut self, slot: usize, max_charges: u32, fill_if_full: bool) -> bool {
        let Some(entry) = self.slot_mut(slot) else {
            return false;
        };
        let previous = entry.max_charges;
        let was_full = entry.current_charges == previous;
        if max_charges < previous {
            entry.current_charges = entry.current_charges.saturating_sub(previous - max_charges);
        }
        entry.max_charges = max_charges;
        if fill_if_full && was_full {
            entry.current_charges = max_charges;
        }
        true
    }

    pub fn add_extra_charges(&mut self, slot: usize, amount: u32) -> bool {
        match self.slot_mut(slot) {
            Some(entry) => {
                entry.extra_charges += amount;
                true
            }
            None => false,
        }
    }

    pub fn remove_all_extra_charges(&mut self, slot: usize) -> bool {
        match self.slot_mut(slot) {
            Some(entry) => {
                entry.extra_charges = 0;
                true
            }
            None => false,
        }
    }

    pub fn info(&self, slot: usize) -> Option<CooldownInfo> {
        let entry = self.slot(slot)?;
        Some(CooldownInfo {
            current_cooldown: entry.cooldown,
            max_cooldown: self.max_cooldown(entry),
            max_cooldown_without_cdr: entry.spec.cooldown,
            available_charges: entry.current_charges,
            max_charges: entry.max_charges,
            extra_charges: entry.extra_charges,
            cast_prevention_duration: entry.cast_prevention_duration,
            remaining_cast_prevention: entry.remaining_cast_prevention,
        })
    }

    fn slot(&self, slot: usize) -> Option<&SlotCooldown> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, slot: usize) -> Option<&mut SlotCooldown> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn effective_cdr(&self, category: u32) -> f32 {
        let category_cdr = self.category_cdr(category);
        let cdr = match &self.cdr_function {
            Some(function) => function(self.global_cdr, category_cdr),
            None => self.global_cdr + category_cdr,
        };
        cdr.clamp(0.0, self.max_cdr)
    }

    fn max_cooldown(&self, entry: &SlotCooldown) -> f32 {
        entry.spec.cooldown * (1.0 - self.effective_cdr(entry.spec.category))
    }

    fn clamp_cooldown(&mut self, slot: usize, value: f32) -> bool {
        let Some(max) = self.slot(slot).map(|entry| self.max_cooldown(entry)) else {
            return false;
        };
        if let Some(entry) = self.slot_mut(slot) {
            entry.cooldown = value.clamp(0.0, max.max(0.0));
        }
        true
    }
}

impl std::fmt::Debug for CooldownHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownHandler")
            .field("slots", &self.slots)
            .field("global_cdr", &self.global_cdr)
            .field("max_cdr", &self.max_cdr)
            .field("category_cdr", &self.category_cdr)
            .field("custom_cdr", &self.cdr_function.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(cooldown: f32, charges: u32) -> CooldownHandler {
        let mut handler = CooldownHandler::new(2);
        handler.set_slot(
            0,
            Some(CooldownSpec {
                cooldown,
                category: 1,
                charges,
            }),
        );
        handler
    }

    #[test]
    fn test_put_on_cooldown_only_when_idle() {
        let mut cds = handler(5.0, 1);
        assert!(cds.put_on_cooldown(0, false));
        cds.update(1.0);
        assert!(!cds.put_on_cooldown(0, false));
        assert_eq!(cds.info(0).unwrap().current_cooldown, 4.0);

        assert!(cds.put_on_cooldown(0, true));
        assert_eq!(cds.info(0).unwrap().current_cooldown, 5.0);
    }

    #[test]
    fn test_empty_slot_has_no_cooldown() {
        let mut cds = handler(5.0, 1);
        assert!(!cds.put_on_cooldown(1, false));
        assert!(!cds.is_on_cooldown(1));
        assert!(!cds.is_on_cooldown(99));
        assert!(cds.info(1).is_none());
    }

    #[test]
    fn test_charge_refills_when_cooldown_ends() {
        let mut cds = handler(2.0, 1);
        assert_eq!(cds.consume_charges(0, 1), Some(0));
        cds.put_on_cooldown(0, false);
        assert!(!cds.has_charges(0));

        cds.update(2.0);
        assert!(!cds.is_on_cooldown(0));
        assert!(cds.has_charges(0));
    }

    #[test]
    fn test_multi_charge_cooldown_restarts_until_full() {
        let mut cds = handler(1.0, 3);
        cds.consume_charges(0, 1);
        cds.consume_charges(0, 1);
        cds.put_on_cooldown(0, false);

        cds.update(1.0);
        let info = cds.info(0).unwrap();
        assert_eq!(info.available_charges, 2);
        assert_eq!(info.current_cooldown, 1.0, "restarts for the missing charge");

        cds.update(1.0);
        let info = cds.info(0).unwrap();
        assert_eq!(info.available_charges, 3);
        assert!(!cds.is_on_cooldown(0));
    }

    #[test]
    fn test_zero_cooldown_refills_immediately() {
        let mut cds = handler(0.0, 1);
        cds.consume_charges(0, 1);
        assert!(cds.put_on_cooldown(0, false));
        assert!(cds.has_charges(0));
        assert!(!cds.is_on_cooldown(0));
    }

    #[test]
    fn test_cdr_is_clamped() {
        let mut cds = handler(10.0, 1);
        cds.set_global_cdr(0.5);
        cds.set_category_cdr(1, 0.3);
        assert!((cds.info(0).unwrap().max_cooldown - 2.0).abs() < 1e-5);

        cds.set_category_cdr(1, 0.8);
        assert!((cds.info(0).unwrap().max_cooldown - 1.0).abs() < 1e-5, "capped at 0.9");

        cds.set_max_cdr(0.25);
        assert_eq!(cds.global_cdr(), 0.25);
        assert_eq!(cds.category_cdr(1), 0.25);
    }

    #[test]
    fn test_custom_cdr_function() {
        let mut cds = handler(10.0, 1);
        cds.set_global_cdr(0.2);
        cds.set_category_cdr(1, 0.2);
        cds.set_cdr_function(Some(Box::new(|global, category| global * category)));
        assert!((cds.info(0).unwrap().max_cooldown - 9.6).abs() < 1e-4);
    }

    #[test]
    fn test_extra_charges_spent_first() {
        let mut cds = handler(5.0, 2);
        cds.add_extra_charges(0, 1);
        assert_eq!(cds.consume_charges(0, 2), Some(1));
        let info = cds.info(0).unwrap();
        assert_eq!(info.extra_charges, 0);
        assert_eq!(info.available_charges, 1);
        assert_eq!(cds.consume_charges(0, 5), None);
    }

    #[test]
    fn test_increase_cooldown_requires_running_cooldown() {
        let mut cds = handler(5.0, 1);
        assert!(!cds.increase_cooldown(0, 1.0));
        cds.put_on_cooldown(0, false);
        cds.update(3.0);
        assert!(cds.increase_cooldown(0, 10.0));
        assert_eq!(cds.info(0).unwrap().current_cooldown, 5.0);
    }

    #[test]
    fn test_cast_prevention_expires() {
        let mut cds = handler(5.0, 1);
        assert!(!cds.put_on_cast_prevention(0, 0.0));
        assert!(cds.put_on_cast_prevention(0, 1.0));
        assert!(cds.is_on_cast_prevention(0));
        cds.update(1.0);
        assert!(!cds.is_on_cast_prevention(0));
        assert_eq!(cds.info(0).unwrap().cast_prevention_duration, 0.0);
    }

    #[test]
    fn test_set_max_charges() {
        let mut cds = handler(5.0, 2);
        assert!(cds.set_max_charges(0, 4, true));
        assert_eq!(cds.info(0).unwrap().available_charges, 4);

        cds.consume_charges(0, 1);
        cds.set_max_charges(0, 2, true);
        assert_eq!(cds.info(0).unwrap().available_charges, 1);
    }
}
