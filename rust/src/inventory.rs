//! Room inventory: the rooms available for an event.
//!
//! Rooms are identified by their position in insertion order. Once built, an inventory
//! never changes; the validator and the scheduler only read from it.

use thiserror::Error;

use crate::models::{Gender, RoomPolicy, RoomSlot};

/// Errors raised while describing rooms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Invalid room capacity {0}: rooms need at least one bed")]
    InvalidCapacity(i64),
}

/// Validate a bed count coming from outside.
pub(crate) fn checked_capacity(capacity: i64) -> Result<u32, InventoryError> {
    u32::try_from(capacity)
        .ok()
        .filter(|&beds| beds > 0)
        .ok_or(InventoryError::InvalidCapacity(capacity))
}

/// Immutable, ordered collection of rooms.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoomInventory {
    rooms: Vec<RoomSlot>,
    /// Counselors sleep outside these rooms, so only participants count against them
    extra_space_for_counselors: bool,
}

/// Incremental builder for [`RoomInventory`].
///
/// Every `add_*` call validates its capacity right away, so chains read
/// `RoomInventory::builder().add_room(1, Gender::Male)?.add_flex_room(4)?.build()`.
#[derive(Clone, Debug, Default)]
pub struct RoomInventoryBuilder {
    rooms: Vec<RoomSlot>,
    extra_space_for_counselors: bool,
}

impl RoomInventoryBuilder {
    /// Pre-allocate room for `room_count` rooms. Not a hard limit.
    pub fn with_capacity(room_count: usize) -> Self {
        Self {
            rooms: Vec::with_capacity(room_count),
            extra_space_for_counselors: false,
        }
    }

    /// Add a room reserved for `gender`.
    pub fn add_room(self, capacity: u32, gender: Gender) -> Result<Self, InventoryError> {
        self.add_policy(capacity, RoomPolicy::FixedGender(gender))
    }

    /// Add a room whose gender the scheduler decides.
    pub fn add_flex_room(self, capacity: u32) -> Result<Self, InventoryError> {
        self.add_policy(capacity, RoomPolicy::Flex)
    }

    /// Add a gender-agnostic overflow room.
    pub fn add_fallback_room(self, capacity: u32) -> Result<Self, InventoryError> {
        self.add_policy(capacity, RoomPolicy::Fallback)
    }

    /// Add an already validated room.
    pub fn add_slot(mut self, slot: RoomSlot) -> Self {
        self.rooms.push(slot);
        self
    }

    /// Mark that counselors are housed elsewhere.
    pub fn with_extra_space_for_counselors(mut self) -> Self {
        self.extra_space_for_counselors = true;
        self
    }

    fn add_policy(self, capacity: u32, policy: RoomPolicy) -> Result<Self, InventoryError> {
        Ok(self.add_slot(RoomSlot::new(capacity, policy)?))
    }

    pub fn build(self) -> RoomInventory {
        RoomInventory {
            rooms: self.rooms,
            extra_space_for_counselors: self.extra_space_for_counselors,
        }
    }
}

impl RoomInventory {
    pub fn builder() -> RoomInventoryBuilder {
        RoomInventoryBuilder::default()
    }

    /// Build an inventory from a list of rooms, keeping their order.
    pub fn from_slots(slots: Vec<RoomSlot>) -> Self {
        Self {
            rooms: slots,
            extra_space_for_counselors: false,
        }
    }

    pub fn has_extra_space_for_counselors(&self) -> bool {
        self.extra_space_for_counselors
    }

    pub fn rooms(&self) -> &[RoomSlot] {
        &self.rooms
    }

    pub fn room(&self, index: usize) -> Option<&RoomSlot> {
        self.rooms.get(index)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Total beds over all rooms, saturating at `u32::MAX`.
    pub fn total_beds(&self) -> u32 {
        self.rooms
            .iter()
            .map(RoomSlot::capacity)
            .fold(0, u32::saturating_add)
    }

    /// Total beds over rooms with exactly this policy, saturating at `u32::MAX`.
    pub fn beds_for(&self, policy: RoomPolicy) -> u32 {
        self.rooms
            .iter()
            .filter(|r| r.policy() == policy)
            .map(RoomSlot::capacity)
            .fold(0, u32::saturating_add)
    }

    /// Beds in rooms reserved for `gender`.
    pub fn fixed_capacity(&self, gender: Gender) -> u32 {
        self.beds_for(RoomPolicy::FixedGender(gender))
    }

    /// Capacities of the individual flex rooms, in inventory order.
    ///
    /// Not summed: each flex room goes to one gender as a whole.
    pub fn flex_rooms(&self) -> Vec<u32> {
        self.flex_slots().map(|(_, beds)| beds).collect()
    }

    /// Beds in fallback rooms.
    pub fn fallback_capacity(&self) -> u32 {
        self.beds_for(RoomPolicy::Fallback)
    }

    /// `(room index, capacity)` of every flex room.
    pub(crate) fn flex_slots(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.indices_where(|policy| matches!(policy, RoomPolicy::Flex))
    }

    /// Room indices whose policy matches, in inventory order, with capacities.
    pub(crate) fn indices_where<'a, F>(
        &'a self,
        mut predicate: F,
    ) -> impl Iterator<Item = (usize, u32)> + 'a
    where
        F: FnMut(RoomPolicy) -> bool + 'a,
    {
        self.rooms
            .iter()
            .enumerate()
            .filter(move |(_, room)| predicate(room.policy()))
            .map(|(index, room)| (index, room.capacity()))
    }
}
