//! Occupancy profiles: how many people of each gender need a bed in every night.

use crate::models::{AttendanceError, Gender, Participant};

/// Per-gender step function over nights.
///
/// Each curve is a sorted list of `(night, demand)` breakpoints: demand holds from that
/// night until the next breakpoint. Nights before the first breakpoint have demand 0, and
/// the final breakpoint always drops back to 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OccupancyProfile {
    curves: [Vec<(u32, u32)>; 2],
}

impl OccupancyProfile {
    /// Sweep over the participation times of all participants.
    ///
    /// Every interval `[s, e]` adds a `+1` event at `s` and a `-1` event at `e + 1` for its
    /// participant's gender; running sums over the sorted events give the curves.
    pub fn build(participants: &[Participant]) -> Result<Self, AttendanceError> {
        let mut events: [Vec<(u32, i64)>; 2] = [Vec::new(), Vec::new()];

        for participant in participants {
            participant.validate()?;
            let gender_events = &mut events[participant.gender.slot()];
            for time in &participant.times {
                gender_events.push((time.first_night(), 1));
                // Last nights stop at LAST_NIGHT, so the night after always exists
                gender_events.push((time.last_night() + 1, -1));
            }
        }

        let [male, female] = events;
        Ok(Self {
            curves: [Self::sweep(male), Self::sweep(female)],
        })
    }

    fn sweep(mut events: Vec<(u32, i64)>) -> Vec<(u32, u32)> {
        events.sort_unstable_by_key(|&(night, _)| night);

        let mut curve: Vec<(u32, u32)> = Vec::new();
        let mut running: i64 = 0;
        let mut idx = 0;
        while idx < events.len() {
            let night = events[idx].0;
            // Apply every event of this night before emitting a breakpoint
            while idx < events.len() && events[idx].0 == night {
                running += events[idx].1;
                idx += 1;
            }
            // Non-negative: every -1 follows its own +1
            let demand = running.max(0) as u32;
            if curve.last().map(|&(_, d)| d) != Some(demand) {
                curve.push((night, demand));
            }
        }

        curve
    }

    /// Number of `gender` participants present in `night`.
    pub fn demand(&self, gender: Gender, night: u32) -> u32 {
        let curve = &self.curves[gender.slot()];
        let idx = curve.partition_point(|&(start, _)| start <= night);
        if idx == 0 {
            0
        } else {
            curve[idx - 1].1
        }
    }

    /// Maximum simultaneous demand over all nights.
    pub fn peak_demand(&self, gender: Gender) -> u32 {
        self.curves[gender.slot()]
            .iter()
            .map(|&(_, demand)| demand)
            .max()
            .unwrap_or(0)
    }

    /// First night at which the peak is reached, if there is any demand at all.
    pub fn peak_night(&self, gender: Gender) -> Option<u32> {
        let peak = self.peak_demand(gender);
        if peak == 0 {
            return None;
        }
        self.curves[gender.slot()]
            .iter()
            .find(|&&(_, demand)| demand == peak)
            .map(|&(night, _)| night)
    }

    /// Demand over both genders.
    pub fn total_demand(&self, night: u32) -> u32 {
        Gender::ALL.iter().map(|&g| self.demand(g, night)).sum()
    }

    /// Last night anybody is present, 0 for an empty profile.
    pub fn horizon(&self) -> u32 {
        self.curves
            .iter()
            .filter_map(|curve| curve.last())
            .map(|&(end, _)| end - 1)
            .max()
            .unwrap_or(0)
    }

    /// Dense demand for nights `1..=horizon()`; index 0 is night 1.
    pub fn demand_curve(&self, gender: Gender) -> Vec<u32> {
        (1..=self.horizon())
            .map(|night| self.demand(gender, night))
            .collect()
    }

    /// Raw breakpoints of one gender's curve.
    pub fn breakpoints(&self, gender: Gender) -> &[(u32, u32)] {
        &self.curves[gender.slot()]
    }
}
