//! Lazy feasibility check ("slacker" validator).
//!
//! Answers quickly whether a room plan could exist, looking only at peak demand per
//! gender. Flex rooms are indivisible, so the check searches for a split of flex rooms
//! between the genders; the search is bounded by [`SchedulerConfig::flex_search_cutoff`].
//!
//! The answer never claims too much: `true` always comes with a concrete covering split
//! (a [`FlexSplit`]) that the solver can realise. `false` may be wrong when the search was
//! cut short or fallback beds are involved, which [`Reliability`] reports.

use itertools::Itertools;

use crate::config::SchedulerConfig;
use crate::inventory::RoomInventory;
use crate::models::{AttendanceError, Gender, Participant};
use crate::profile::OccupancyProfile;
use crate::{log_changes, log_checks, log_debug};

/// How much the validator trusts its latest answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Reliability {
    Low,
    Normal,
    High,
}

impl Reliability {
    /// Numeric score as reported to callers (100 high, 50 normal, 10 low).
    pub fn score(self) -> i32 {
        match self {
            Reliability::High => 100,
            Reliability::Normal => 50,
            Reliability::Low => 10,
        }
    }
}

/// A commitment of every flex room to one gender, with the capacities it yields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlexSplit {
    /// (room index, committed gender), in inventory order
    assignments: Vec<(usize, Gender)>,
    /// Fixed plus committed flex beds, per gender slot
    capacity: [u32; 2],
    /// Peak demand the gendered beds cannot cover, per gender slot
    residual: [u32; 2],
}

impl FlexSplit {
    /// Build the split that gives the flex rooms at `male_pick` (positions into `flex`) to
    /// men and every other flex room to women.
    fn from_pick(
        flex: &[(usize, u32)],
        male_pick: &[usize],
        fixed: [u32; 2],
        peaks: [u32; 2],
    ) -> Self {
        let mut capacity = fixed;
        let mut assignments = Vec::with_capacity(flex.len());
        let mut picks = male_pick.iter().peekable();

        for (pos, &(room, beds)) in flex.iter().enumerate() {
            let gender = if picks.peek() == Some(&&pos) {
                picks.next();
                Gender::Male
            } else {
                Gender::Female
            };
            capacity[gender.slot()] = capacity[gender.slot()].saturating_add(beds);
            assignments.push((room, gender));
        }

        let residual = [
            peaks[0].saturating_sub(capacity[0]),
            peaks[1].saturating_sub(capacity[1]),
        ];

        Self {
            assignments,
            capacity,
            residual,
        }
    }

    pub fn assignments(&self) -> &[(usize, Gender)] {
        &self.assignments
    }

    /// Gender a flex room was committed to; `None` for rooms that are not flex.
    pub fn gender_of(&self, room: usize) -> Option<Gender> {
        self.assignments
            .iter()
            .find(|&&(index, _)| index == room)
            .map(|&(_, gender)| gender)
    }

    /// Flex rooms committed to `gender`.
    pub fn rooms_for(&self, gender: Gender) -> impl Iterator<Item = usize> + '_ {
        self.assignments
            .iter()
            .filter(move |&&(_, g)| g == gender)
            .map(|&(index, _)| index)
    }

    /// Gendered beds (fixed and committed flex) available to `gender`.
    pub fn capacity(&self, gender: Gender) -> u32 {
        self.capacity[gender.slot()]
    }

    /// Peak demand of `gender` that has to go to fallback rooms.
    pub fn residual(&self, gender: Gender) -> u32 {
        self.residual[gender.slot()]
    }

    /// Fallback beds needed, assuming both residual peaks coincide.
    pub fn fallback_need(&self) -> u32 {
        self.residual[0].saturating_add(self.residual[1])
    }
}

/// Outcome of a feasibility check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validation {
    pub schedulable: bool,
    pub reliability: Reliability,
    /// The covering split found, present exactly when `schedulable`
    pub split: Option<FlexSplit>,
    /// Whether every flex split was considered
    pub exhaustive: bool,
    pub splits_checked: usize,
    peaks: [u32; 2],
}

impl Validation {
    pub fn peak(&self, gender: Gender) -> u32 {
        self.peaks[gender.slot()]
    }
}

/// Check an already built profile against the inventory.
pub fn validate_profile(
    inventory: &RoomInventory,
    profile: &OccupancyProfile,
    config: &SchedulerConfig,
) -> Validation {
    let verbosity = config.verbosity;
    let peaks = [
        profile.peak_demand(Gender::Male),
        profile.peak_demand(Gender::Female),
    ];
    let fixed = [
        inventory.fixed_capacity(Gender::Male),
        inventory.fixed_capacity(Gender::Female),
    ];
    let fallback = inventory.fallback_capacity();
    let flex: Vec<(usize, u32)> = inventory.flex_slots().collect();

    let k = flex.len();
    let cutoff = config.flex_search_cutoff;
    let exhaustive = config.searches_exhaustively(k);

    log_debug!(
        verbosity,
        "Peaks: male={} female={}; fixed beds: male={} female={}; flex rooms={:?}; fallback beds={}; counselors elsewhere={}",
        peaks[0],
        peaks[1],
        fixed[0],
        fixed[1],
        inventory.flex_rooms(),
        fallback,
        inventory.has_extra_space_for_counselors()
    );

    let mut best: Option<FlexSplit> = None;
    let mut splits_checked = 0;

    'search: for size in 0..=k {
        // Hand out (or keep back) at most `cutoff` flex rooms
        if size > cutoff && k - size > cutoff {
            continue;
        }

        for male_pick in (0..k).combinations(size) {
            splits_checked += 1;
            let split = FlexSplit::from_pick(&flex, &male_pick, fixed, peaks);

            log_checks!(
                verbosity,
                "  Split {:?}: male beds={} female beds={} fallback need={}",
                split.assignments(),
                split.capacity(Gender::Male),
                split.capacity(Gender::Female),
                split.fallback_need()
            );

            if split.fallback_need() > fallback {
                continue;
            }

            let improves = best
                .as_ref()
                .map_or(true, |b| split.fallback_need() < b.fallback_need());
            if improves {
                let needs_no_fallback = split.fallback_need() == 0;
                best = Some(split);
                if needs_no_fallback {
                    break 'search;
                }
            }
        }
    }

    let reliability = match (&best, exhaustive, fallback > 0) {
        (Some(_), _, _) => Reliability::High,
        (None, true, false) => Reliability::High,
        (None, true, true) => Reliability::Normal,
        (None, false, _) => Reliability::Low,
    };

    match &best {
        Some(split) => log_changes!(
            verbosity,
            "Schedulable with flex split {:?} (fallback need {} of {})",
            split.assignments(),
            split.fallback_need(),
            fallback
        ),
        None => log_changes!(
            verbosity,
            "Not schedulable after {} splits (exhaustive={})",
            splits_checked,
            exhaustive
        ),
    }

    Validation {
        schedulable: best.is_some(),
        reliability,
        split: best,
        exhaustive,
        splits_checked,
        peaks,
    }
}

/// Run the lazy check for `participants`.
pub fn validate(
    inventory: &RoomInventory,
    participants: &[Participant],
    config: &SchedulerConfig,
) -> Result<Validation, AttendanceError> {
    let profile = OccupancyProfile::build(participants)?;
    Ok(validate_profile(inventory, &profile, config))
}

/// Whether `participants` might fit into `inventory`.
///
/// Never `true` for an unschedulable event; may be `false` for a schedulable one.
pub fn is_schedulable(
    inventory: &RoomInventory,
    participants: &[Participant],
    config: &SchedulerConfig,
) -> Result<bool, AttendanceError> {
    Ok(validate(inventory, participants, config)?.schedulable)
}
