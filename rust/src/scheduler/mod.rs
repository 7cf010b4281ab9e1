//! Assignment solver: turns participants and rooms into a concrete room plan.
//!
//! Flex rooms are committed first, using the covering split found by the lazy validator.
//! Then a single sweep over all stays hands out beds, gendered pools first and the shared
//! fallback pool last.

mod assignment;
mod pool;
mod solver;

pub use assignment::{Assignment, Placement};
pub use pool::{PoolKind, RoomPools};
pub use solver::{solve, RoomScheduler, SchedulerError};
