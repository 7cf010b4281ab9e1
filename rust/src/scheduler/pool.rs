//! Bed bookkeeping for the gendered and fallback room pools.

use crate::inventory::RoomInventory;
use crate::models::{Gender, RoomPolicy};
use crate::validator::FlexSplit;

/// Which pool a bed was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolKind {
    Gendered(Gender),
    Fallback,
}

/// Free beds per room, grouped into one pool per gender plus the shared fallback pool.
///
/// Pools list room indices in inventory order, so "first room with a free bed" is the
/// lowest-index one.
#[derive(Clone, Debug)]
pub struct RoomPools {
    gendered: [Vec<usize>; 2],
    fallback: Vec<usize>,
    capacity: Vec<u32>,
    occupied: Vec<u32>,
}

impl RoomPools {
    /// Lay out pools for `inventory` with flex rooms committed as in `split`.
    pub fn new(inventory: &RoomInventory, split: &FlexSplit) -> Self {
        let mut gendered: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
        let mut fallback = Vec::new();

        for (index, room) in inventory.rooms().iter().enumerate() {
            match room.policy() {
                RoomPolicy::FixedGender(gender) => gendered[gender.slot()].push(index),
                RoomPolicy::Flex => {
                    // A split always covers every flex room of its inventory
                    if let Some(gender) = split.gender_of(index) {
                        gendered[gender.slot()].push(index);
                    }
                }
                RoomPolicy::Fallback => fallback.push(index),
            }
        }

        Self {
            gendered,
            fallback,
            capacity: inventory.rooms().iter().map(|r| r.capacity()).collect(),
            occupied: vec![0; inventory.len()],
        }
    }

    /// Take a bed for `gender`: gendered pool first, fallback only once it is full.
    pub fn acquire(&mut self, gender: Gender) -> Option<(usize, PoolKind)> {
        if let Some(room) = self.first_free(&self.gendered[gender.slot()]) {
            self.occupied[room] += 1;
            return Some((room, PoolKind::Gendered(gender)));
        }
        if let Some(room) = self.first_free(&self.fallback) {
            self.occupied[room] += 1;
            return Some((room, PoolKind::Fallback));
        }
        None
    }

    /// Give back a bed in `room`.
    pub fn release(&mut self, room: usize) {
        if let Some(count) = self.occupied.get_mut(room) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn free_beds(&self, room: usize) -> u32 {
        match (self.capacity.get(room), self.occupied.get(room)) {
            (Some(capacity), Some(occupied)) => capacity - occupied,
            _ => 0,
        }
    }

    /// Rooms of one gender's pool, in inventory order.
    pub fn gendered_rooms(&self, gender: Gender) -> &[usize] {
        &self.gendered[gender.slot()]
    }

    pub fn fallback_rooms(&self) -> &[usize] {
        &self.fallback
    }

    fn first_free(&self, rooms: &[usize]) -> Option<usize> {
        rooms
            .iter()
            .copied()
            .find(|&room| self.occupied[room] < self.capacity[room])
    }
}
