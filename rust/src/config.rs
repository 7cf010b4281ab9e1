//! Configuration types for the accommodation scheduler.

use pyo3::prelude::*;

/// Tuning knobs for the feasibility search and the solver.
#[pyclass]
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Largest number of flex rooms handed to one gender (or kept from it) during the
    /// split search. Inventories with up to `2 * cutoff + 1` flex rooms are searched fully.
    #[pyo3(get, set)]
    pub flex_search_cutoff: usize,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            flex_search_cutoff: 4,
            verbosity: 0,
        }
    }
}

#[pymethods]
impl SchedulerConfig {
    #[new]
    #[pyo3(signature = (flex_search_cutoff=None, verbosity=None))]
    pub fn new(flex_search_cutoff: Option<usize>, verbosity: Option<u8>) -> Self {
        let defaults = Self::default();
        Self {
            flex_search_cutoff: flex_search_cutoff.unwrap_or(defaults.flex_search_cutoff),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SchedulerConfig(flex_search_cutoff={}, verbosity={})",
            self.flex_search_cutoff, self.verbosity
        )
    }
}

impl SchedulerConfig {
    /// Whether a split search over `flex_rooms` rooms visits every subset.
    pub fn searches_exhaustively(&self, flex_rooms: usize) -> bool {
        flex_rooms <= 2 * self.flex_search_cutoff + 1
    }
}
