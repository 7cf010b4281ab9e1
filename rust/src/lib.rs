//! Accommodation scheduling for event participants.
//!
//! Decides whether participants, each staying for one or more stretches of nights, fit into
//! the rooms of an event (gendered, flex and fallback rooms), and builds a room plan when
//! they do. Everything here is pure and synchronous; runs for different events share
//! nothing.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

pub mod config;
pub mod inventory;
pub mod logging;
pub mod models;
pub mod profile;
pub mod scheduler;
pub mod validator;

pub use config::SchedulerConfig;
pub use inventory::{InventoryError, RoomInventory, RoomInventoryBuilder};
pub use models::{
    AttendanceError, Gender, Participant, ParticipationTime, RoomPolicy, RoomSlot, LAST_NIGHT,
};
pub use profile::OccupancyProfile;
pub use scheduler::{solve, Assignment, Placement, RoomScheduler, SchedulerError};
pub use validator::{is_schedulable, validate, FlexSplit, Reliability, Validation};

fn to_value_error(e: impl std::fmt::Display) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(e.to_string())
}

/// Check whether the participants might fit into the rooms.
///
/// # Arguments
/// * `rooms` - Rooms of the event, in order (room index = position)
/// * `participants` - Participants with their participation times
/// * `config` - Optional scheduler configuration
///
/// # Returns
/// * `False` if no flex split within the search covers peak demand
///
/// # Raises
/// * ValueError if a participant has no or overlapping participation times
#[pyfunction]
#[pyo3(name = "is_schedulable", signature = (rooms, participants, config=None))]
fn py_is_schedulable(
    rooms: Vec<RoomSlot>,
    participants: Vec<Participant>,
    config: Option<SchedulerConfig>,
) -> PyResult<bool> {
    let inventory = RoomInventory::from_slots(rooms);
    is_schedulable(&inventory, &participants, &config.unwrap_or_default()).map_err(to_value_error)
}

/// How much the lazy check trusts its answer for these inputs (100, 50 or 10).
///
/// # Raises
/// * ValueError if a participant has no or overlapping participation times
#[pyfunction]
#[pyo3(name = "assess_reliability", signature = (rooms, participants, config=None))]
fn py_assess_reliability(
    rooms: Vec<RoomSlot>,
    participants: Vec<Participant>,
    config: Option<SchedulerConfig>,
) -> PyResult<i32> {
    let inventory = RoomInventory::from_slots(rooms);
    let validation = validate(&inventory, &participants, &config.unwrap_or_default())
        .map_err(to_value_error)?;
    Ok(validation.reliability.score())
}

/// Build a room plan.
///
/// # Returns
/// * List of `(person, night, room_index)` tuples, one per person and night
///
/// # Raises
/// * ValueError if no valid room plan exists or the participants are malformed
#[pyfunction]
#[pyo3(name = "solve", signature = (rooms, participants, config=None))]
fn py_solve(
    rooms: Vec<RoomSlot>,
    participants: Vec<Participant>,
    config: Option<SchedulerConfig>,
) -> PyResult<Vec<(String, u32, usize)>> {
    let inventory = RoomInventory::from_slots(rooms);
    let assignment =
        solve(&inventory, &participants, &config.unwrap_or_default()).map_err(to_value_error)?;
    Ok(assignment.triples())
}

/// The adebar rooms Python module.
#[pymodule]
fn rooms(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Data types
    m.add_class::<Gender>()?;
    m.add_class::<ParticipationTime>()?;
    m.add_class::<Participant>()?;
    m.add_class::<RoomSlot>()?;

    // Config types
    m.add_class::<SchedulerConfig>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(py_is_schedulable, m)?)?;
    m.add_function(wrap_pyfunction!(py_assess_reliability, m)?)?;
    m.add_function(wrap_pyfunction!(py_solve, m)?)?;

    Ok(())
}
