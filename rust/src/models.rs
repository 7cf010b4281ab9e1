//! Core data types for accommodation scheduling.

use chrono::{Days, NaiveDate};
use pyo3::prelude::*;
use thiserror::Error;

use crate::inventory::{checked_capacity, InventoryError};

/// Problems with the attendance data handed in by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttendanceError {
    #[error(
        "Invalid participation time {first} - {last}: nights run from 1 to {max} and may not run backwards",
        max = LAST_NIGHT
    )]
    InvalidNights { first: i64, last: i64 },
    #[error("Participant {0} has no participation times")]
    EmptyAttendance(String),
    #[error("Participant {person} has overlapping participation times {first} and {second}")]
    OverlappingIntervals {
        person: String,
        first: ParticipationTime,
        second: ParticipationTime,
    },
}

/// Gender class used to segregate room occupancy.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    #[pyo3(name = "MALE")]
    Male,
    #[pyo3(name = "FEMALE")]
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// The opposite gender class.
    pub fn other(self) -> Gender {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }

    /// Stable array slot for per-gender tables.
    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            Gender::Male => 0,
            Gender::Female => 1,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// Latest night a participation time may cover, so that the night after it still exists.
pub const LAST_NIGHT: u32 = u32::MAX - 1;

/// The nights a person stays at an event, as an inclusive range `[first_night, last_night]`.
///
/// Only nights matter for accommodation: how many people are around during the day is
/// irrelevant, how many sleep there is not. Night 1 is the event's first night.
/// Ordered by first night, then by last night.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipationTime {
    #[pyo3(get)]
    first_night: u32,
    #[pyo3(get)]
    last_night: u32,
}

impl ParticipationTime {
    /// Create a participation time. Nights run from 1 to [`LAST_NIGHT`] and
    /// `first_night <= last_night`.
    pub fn new(first_night: u32, last_night: u32) -> Result<Self, AttendanceError> {
        if first_night == 0 || first_night > last_night || last_night > LAST_NIGHT {
            return Err(AttendanceError::InvalidNights {
                first: i64::from(first_night),
                last: i64::from(last_night),
            });
        }
        Ok(Self {
            first_night,
            last_night,
        })
    }

    /// Build a participation time from calendar dates.
    ///
    /// `first_stay` and `last_stay` are the dates of the first and last overnight stay,
    /// `first_event_night` the date of the event's first night (night 1).
    pub fn from_stays(
        first_stay: NaiveDate,
        last_stay: NaiveDate,
        first_event_night: NaiveDate,
    ) -> Result<Self, AttendanceError> {
        let first = (first_stay - first_event_night).num_days() + 1;
        let last = first + (last_stay - first_stay).num_days();
        let invalid = AttendanceError::InvalidNights { first, last };

        let first_night = u32::try_from(first).map_err(|_| invalid.clone())?;
        let last_night = u32::try_from(last).map_err(|_| invalid)?;
        Self::new(first_night, last_night)
    }

    pub fn first_night(&self) -> u32 {
        self.first_night
    }

    pub fn last_night(&self) -> u32 {
        self.last_night
    }

    /// Number of nights covered.
    pub fn nights(&self) -> u32 {
        self.last_night - self.first_night + 1
    }

    /// Number of days covered (arrival and departure day included).
    pub fn days(&self) -> u32 {
        self.last_night - self.first_night + 2
    }

    #[inline]
    pub fn contains(&self, night: u32) -> bool {
        self.first_night <= night && night <= self.last_night
    }

    /// Whether at least one night is shared.
    pub fn overlaps_with(&self, other: &ParticipationTime) -> bool {
        self.first_night <= other.last_night && other.first_night <= self.last_night
    }

    /// Arrival and departure date, given the date of the event's first night.
    pub fn date_span(&self, first_event_night: NaiveDate) -> (NaiveDate, NaiveDate) {
        let arrival = first_event_night
            .checked_add_days(Days::new(u64::from(self.first_night - 1)))
            .unwrap_or(first_event_night);
        let departure = first_event_night
            .checked_add_days(Days::new(u64::from(self.last_night)))
            .unwrap_or(arrival);
        (arrival, departure)
    }

    /// Whether the person is present on `day` (arrival and departure day count).
    pub fn participates_on(&self, day: NaiveDate, first_event_night: NaiveDate) -> bool {
        let (arrival, departure) = self.date_span(first_event_night);
        arrival <= day && day <= departure
    }
}

impl std::fmt::Display for ParticipationTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.first_night, self.last_night)
    }
}

#[pymethods]
impl ParticipationTime {
    #[new]
    fn py_new(first_night: u32, last_night: u32) -> PyResult<Self> {
        Self::new(first_night, last_night)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    #[staticmethod]
    #[pyo3(name = "from_stays")]
    fn py_from_stays(
        first_stay: NaiveDate,
        last_stay: NaiveDate,
        first_event_night: NaiveDate,
    ) -> PyResult<Self> {
        Self::from_stays(first_stay, last_stay, first_event_night)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    #[getter(nights)]
    fn py_nights(&self) -> u32 {
        self.nights()
    }

    fn __repr__(&self) -> String {
        format!(
            "ParticipationTime(first_night={}, last_night={})",
            self.first_night, self.last_night
        )
    }
}

/// A person taking part in an event, with the nights they need a bed.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    /// Opaque reference to the person (e.g. a person ID)
    #[pyo3(get, set)]
    pub person: String,
    #[pyo3(get, set)]
    pub gender: Gender,
    #[pyo3(get, set)]
    pub times: Vec<ParticipationTime>,
}

impl Participant {
    pub fn new(
        person: impl Into<String>,
        gender: Gender,
        times: Vec<ParticipationTime>,
    ) -> Self {
        Self {
            person: person.into(),
            gender,
            times,
        }
    }

    /// Check that there is at least one participation time and that none of them overlap.
    pub fn validate(&self) -> Result<(), AttendanceError> {
        if self.times.is_empty() {
            return Err(AttendanceError::EmptyAttendance(self.person.clone()));
        }

        let mut sorted = self.times.clone();
        sorted.sort();
        for pair in sorted.windows(2) {
            if pair[0].overlaps_with(&pair[1]) {
                return Err(AttendanceError::OverlappingIntervals {
                    person: self.person.clone(),
                    first: pair[0],
                    second: pair[1],
                });
            }
        }

        Ok(())
    }

    /// Whether the participant needs a bed in `night`.
    pub fn is_present(&self, night: u32) -> bool {
        self.times.iter().any(|t| t.contains(night))
    }
}

#[pymethods]
impl Participant {
    #[new]
    fn py_new(person: String, gender: Gender, times: Vec<ParticipationTime>) -> Self {
        Self::new(person, gender, times)
    }

    fn __repr__(&self) -> String {
        format!(
            "Participant(person={:?}, gender={}, times={})",
            self.person,
            self.gender,
            self.times.len()
        )
    }
}

/// Who may sleep in a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoomPolicy {
    /// Only this gender, always.
    FixedGender(Gender),
    /// One gender, chosen by the scheduler for the whole event.
    Flex,
    /// Anyone, mixed; used only once gendered beds run out.
    Fallback,
}

impl std::fmt::Display for RoomPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomPolicy::FixedGender(gender) => write!(f, "{}", gender),
            RoomPolicy::Flex => write!(f, "flex"),
            RoomPolicy::Fallback => write!(f, "fallback"),
        }
    }
}

/// One physical room.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomSlot {
    #[pyo3(get)]
    capacity: u32,
    policy: RoomPolicy,
}

impl RoomSlot {
    /// Create a room with `capacity` beds. Rooms without beds are rejected.
    pub fn new(capacity: u32, policy: RoomPolicy) -> Result<Self, InventoryError> {
        let capacity = checked_capacity(i64::from(capacity))?;
        Ok(Self { capacity, policy })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn policy(&self) -> RoomPolicy {
        self.policy
    }

    /// Whether `gender` may ever sleep here.
    pub fn admits(&self, gender: Gender) -> bool {
        match self.policy {
            RoomPolicy::FixedGender(fixed) => fixed == gender,
            RoomPolicy::Flex | RoomPolicy::Fallback => true,
        }
    }
}

#[pymethods]
impl RoomSlot {
    /// A room reserved for one gender.
    #[staticmethod]
    fn fixed(capacity: i64, gender: Gender) -> PyResult<Self> {
        Self::from_py(capacity, RoomPolicy::FixedGender(gender))
    }

    /// A room whose gender is decided by the scheduler.
    #[staticmethod]
    fn flex(capacity: i64) -> PyResult<Self> {
        Self::from_py(capacity, RoomPolicy::Flex)
    }

    /// Last-resort room for anyone.
    #[staticmethod]
    fn fallback(capacity: i64) -> PyResult<Self> {
        Self::from_py(capacity, RoomPolicy::Fallback)
    }

    /// "fixed", "flex" or "fallback"
    #[getter]
    fn kind(&self) -> &'static str {
        match self.policy {
            RoomPolicy::FixedGender(_) => "fixed",
            RoomPolicy::Flex => "flex",
            RoomPolicy::Fallback => "fallback",
        }
    }

    /// The fixed gender, if any.
    #[getter]
    fn gender(&self) -> Option<Gender> {
        match self.policy {
            RoomPolicy::FixedGender(gender) => Some(gender),
            RoomPolicy::Flex | RoomPolicy::Fallback => None,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "RoomSlot(capacity={}, policy={})",
            self.capacity, self.policy
        )
    }
}

impl RoomSlot {
    fn from_py(capacity: i64, policy: RoomPolicy) -> PyResult<Self> {
        let capacity = checked_capacity(capacity)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
        Ok(Self { capacity, policy })
    }
}
