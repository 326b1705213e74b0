//! Player slots and wallets.
//!
//! Slot n (1-based) is owner id n on the grid. Empty slots hold
//! `Principal::anonymous()` as a sentinel so ids stay stable.
//! Balances are keyed by principal and outlive slots and resets.

use candid::Principal;
use std::collections::HashMap;

use crate::types::{LifeError, FAUCET_AMOUNT, MAX_PLAYERS, SLOT_GRACE_PERIOD_NS};

#[derive(Clone, Debug, Default)]
pub struct PlayerRegistry {
    pub(crate) slots: Vec<Principal>,
    pub(crate) balances: HashMap<Principal, u64>,
    /// Alive cell count per slot (parallel to `slots`)
    pub(crate) cell_counts: Vec<u32>,
    /// When each slot's alive count first hit 0 (None while it has cells)
    pub(crate) zero_cells_since: Vec<Option<u64>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[Principal] {
        &self.slots
    }

    pub fn slot_of(&self, principal: &Principal) -> Option<u8> {
        if *principal == Principal::anonymous() {
            return None;
        }
        self.slots
            .iter()
            .position(|p| p == principal)
            .map(|pos| (pos + 1) as u8)
    }

    /// Occupant of an owner id, if the slot is taken.
    pub fn principal_at(&self, owner: u8) -> Option<Principal> {
        let idx = (owner as usize).checked_sub(1)?;
        self.slots
            .get(idx)
            .copied()
            .filter(|p| *p != Principal::anonymous())
    }

    pub fn is_occupied(&self, owner: u8) -> bool {
        self.principal_at(owner).is_some()
    }

    fn ensure_len(&mut self, len: usize) {
        while self.slots.len() < len {
            self.slots.push(Principal::anonymous());
        }
        self.cell_counts.resize(self.slots.len(), 0);
        self.zero_cells_since.resize(self.slots.len(), None);
    }

    /// Slot the caller holds or would be given, without claiming it.
    pub fn peek_slot(&self, caller: &Principal) -> Result<u8, LifeError> {
        if *caller == Principal::anonymous() {
            return Err(LifeError::NotAuthenticated);
        }
        if let Some(slot) = self.slot_of(caller) {
            return Ok(slot);
        }
        if let Some(pos) = self.slots.iter().position(|p| *p == Principal::anonymous()) {
            return Ok((pos + 1) as u8);
        }
        if self.slots.len() >= MAX_PLAYERS {
            return Err(LifeError::GameFull);
        }
        Ok((self.slots.len() + 1) as u8)
    }

    /// Find or create a slot. Returns (player_number, is_new_player).
    /// Vacated slots are reused before a new one is appended.
    pub fn get_or_create_slot(&mut self, caller: Principal) -> Result<(u8, bool), LifeError> {
        if caller == Principal::anonymous() {
            return Err(LifeError::NotAuthenticated);
        }
        if let Some(slot) = self.slot_of(&caller) {
            return Ok((slot, false));
        }

        if let Some(pos) = self.slots.iter().position(|p| *p == Principal::anonymous()) {
            self.slots[pos] = caller;
            self.cell_counts[pos] = 0;
            self.zero_cells_since[pos] = None;
            return Ok(((pos + 1) as u8, true));
        }

        if self.slots.len() >= MAX_PLAYERS {
            return Err(LifeError::GameFull);
        }

        self.slots.push(caller);
        self.ensure_len(self.slots.len());
        Ok((self.slots.len() as u8, true))
    }

    /// Claim a specific slot, inheriting whatever territory that id owns.
    pub fn join_slot(&mut self, caller: Principal, slot: u8, now_ns: u64) -> Result<u8, LifeError> {
        if slot < 1 || slot as usize > MAX_PLAYERS {
            return Err(LifeError::InvalidSlot(slot));
        }
        if caller == Principal::anonymous() {
            return Err(LifeError::NotAuthenticated);
        }
        if let Some(existing) = self.slot_of(&caller) {
            return Ok(existing);
        }

        let idx = (slot - 1) as usize;
        self.ensure_len(idx + 1);

        if self.slots[idx] != Principal::anonymous() {
            return Err(LifeError::SlotOccupied(slot));
        }

        self.slots[idx] = caller;
        // Territory may be inherited, but alive cells are tracked separately
        // and the clock starts until the newcomer places something.
        if self.cell_counts[idx] == 0 {
            self.zero_cells_since[idx] = Some(now_ns);
        }
        Ok(slot)
    }

    pub fn balance(&self, principal: &Principal) -> Option<u64> {
        self.balances.get(principal).copied()
    }

    pub fn credit(&mut self, principal: Principal, amount: u64) -> u64 {
        let balance = self.balances.entry(principal).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }

    pub fn debit(&mut self, principal: &Principal, amount: u64) -> u64 {
        match self.balances.get_mut(principal) {
            Some(balance) => {
                *balance = balance.saturating_sub(amount);
                *balance
            }
            None => 0,
        }
    }

    pub fn faucet(&mut self, caller: Principal) -> u64 {
        self.credit(caller, FAUCET_AMOUNT)
    }

    pub fn total_balances(&self) -> u64 {
        self.balances
            .values()
            .fold(0u64, |acc, &b| acc.saturating_add(b))
    }

    /// Balances parallel to `slots` (0 for empty slots).
    pub fn slot_balances(&self) -> Vec<u64> {
        self.slots
            .iter()
            .map(|p| self.balances.get(p).copied().unwrap_or(0))
            .collect()
    }

    pub fn cell_count(&self, owner: u8) -> u32 {
        (owner as usize)
            .checked_sub(1)
            .and_then(|i| self.cell_counts.get(i))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn add_cells(&mut self, owner: u8, placed: u32) {
        if let Some(idx) = (owner as usize).checked_sub(1) {
            if let Some(count) = self.cell_counts.get_mut(idx) {
                *count = count.saturating_add(placed);
                if placed > 0 {
                    self.zero_cells_since[idx] = None;
                }
            }
        }
    }

    /// Apply per-owner birth/death deltas from one generation.
    /// Index 0 (unclaimed) is ignored.
    pub(crate) fn apply_count_deltas(&mut self, deltas: &[i32; MAX_PLAYERS + 1]) {
        for (owner, &delta) in deltas.iter().enumerate().skip(1) {
            if delta == 0 {
                continue;
            }
            if let Some(count) = self.cell_counts.get_mut(owner - 1) {
                *count = (*count as i64 + delta as i64).max(0) as u32;
            }
        }
    }

    /// Replace counts with ones recomputed from the grid.
    pub(crate) fn set_cell_counts(&mut self, alive_by_owner: &[u32; MAX_PLAYERS + 1]) {
        for (idx, count) in self.cell_counts.iter_mut().enumerate() {
            *count = alive_by_owner[idx + 1];
        }
    }

    /// Start, clear or expire grace periods. Returns the slots that were freed.
    pub fn release_idle_slots(&mut self, now_ns: u64) -> Vec<u8> {
        let mut released = Vec::new();
        for idx in 0..self.slots.len() {
            if self.slots[idx] == Principal::anonymous() {
                self.zero_cells_since[idx] = None;
                continue;
            }
            if self.cell_counts[idx] > 0 {
                self.zero_cells_since[idx] = None;
                continue;
            }
            match self.zero_cells_since[idx] {
                None => self.zero_cells_since[idx] = Some(now_ns),
                Some(since) if now_ns.saturating_sub(since) >= SLOT_GRACE_PERIOD_NS => {
                    self.slots[idx] = Principal::anonymous();
                    self.zero_cells_since[idx] = None;
                    released.push((idx + 1) as u8);
                }
                Some(_) => {}
            }
        }
        released
    }

    /// Drop all slots. Wallets are tied to principals and survive.
    pub fn clear_slots(&mut self) {
        self.slots.clear();
        self.cell_counts.clear();
        self.zero_cells_since.clear();
    }

    /// Rebuild from persisted parts. Per-slot vectors are padded to match.
    pub(crate) fn restore(
        slots: Vec<Principal>,
        balances: Vec<(Principal, u64)>,
        zero_cells_since: Vec<Option<u64>>,
    ) -> Self {
        let mut registry = Self {
            slots,
            balances: balances.into_iter().collect(),
            cell_counts: Vec::new(),
            zero_cells_since,
        };
        registry.slots.truncate(MAX_PLAYERS);
        registry.zero_cells_since.truncate(registry.slots.len());
        let len = registry.slots.len();
        registry.ensure_len(len);
        registry
    }
}
