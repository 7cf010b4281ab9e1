//! Greedy room assignment over the nights of an event.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use thiserror::Error;

use crate::config::SchedulerConfig;
use crate::inventory::RoomInventory;
use crate::models::{AttendanceError, Gender, Participant, ParticipationTime};
use crate::profile::OccupancyProfile;
use crate::validator::validate_profile;
use crate::{log_changes, log_checks, log_debug};

use super::assignment::{Assignment, Placement};
use super::pool::{PoolKind, RoomPools};

/// Errors that can occur while building a room plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error(transparent)]
    Attendance(#[from] AttendanceError),
    /// Expected outcome for overbooked events, not an internal fault.
    #[error("No valid room plan exists: {0}")]
    Infeasible(String),
    #[error("Room plan violates constraints: {0}")]
    Violation(String),
}

impl SchedulerError {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, SchedulerError::Infeasible(_))
    }
}

/// One participation time of one participant, waiting for a room.
#[derive(Clone, Copy, Debug)]
struct Stay {
    participant: usize,
    time: ParticipationTime,
}

/// Assigns participants to rooms for every night they stay.
///
/// Flex rooms are committed using the validator's covering split; then all stays are
/// swept by first night and each gets the lowest-index free bed of its gender's pool,
/// or of the fallback pool once that is full. A stay keeps its room until it ends.
pub struct RoomScheduler<'a> {
    inventory: &'a RoomInventory,
    participants: &'a [Participant],
    config: SchedulerConfig,
}

impl<'a> RoomScheduler<'a> {
    pub fn new(
        inventory: &'a RoomInventory,
        participants: &'a [Participant],
        config: SchedulerConfig,
    ) -> Self {
        Self {
            inventory,
            participants,
            config,
        }
    }

    /// Build the room plan.
    pub fn schedule(&self) -> Result<Assignment, SchedulerError> {
        let verbosity = self.config.verbosity;

        let profile = OccupancyProfile::build(self.participants)?;
        for gender in Gender::ALL {
            log_debug!(
                verbosity,
                "Demand {}: {:?}",
                gender,
                profile.breakpoints(gender)
            );
        }

        let validation = validate_profile(self.inventory, &profile, &self.config);
        let peaks = (
            validation.peak(Gender::Male),
            validation.peak(Gender::Female),
        );
        let Some(split) = validation.split else {
            return Err(SchedulerError::Infeasible(format!(
                "no split of flex rooms covers peak demand (male {}, female {}) with {} fallback beds",
                peaks.0,
                peaks.1,
                self.inventory.fallback_capacity()
            )));
        };

        let mut pools = RoomPools::new(self.inventory, &split);
        for gender in Gender::ALL {
            log_debug!(
                verbosity,
                "Pool {}: rooms {:?}",
                gender,
                pools.gendered_rooms(gender)
            );
        }
        log_debug!(verbosity, "Pool fallback: rooms {:?}", pools.fallback_rooms());

        let stays = self.collect_stays();
        let mut active: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();
        let mut placements: Vec<Placement> = Vec::with_capacity(stays.len());

        for stay in stays {
            let arrival = stay.time.first_night();

            // Beds of stays that ended before this night are free again
            while let Some(&Reverse((last_night, room))) = active.peek() {
                if last_night >= arrival {
                    break;
                }
                active.pop();
                pools.release(room);
                log_checks!(
                    verbosity,
                    "  Night {}: bed in room {} free again",
                    last_night + 1,
                    room
                );
            }

            let participant = &self.participants[stay.participant];
            let Some((room, pool)) = pools.acquire(participant.gender) else {
                return Err(SchedulerError::Infeasible(format!(
                    "no free bed for {} in night {}",
                    participant.person, arrival
                )));
            };

            match pool {
                PoolKind::Gendered(_) => log_changes!(
                    verbosity,
                    "  Placed {} in room {} for nights {}",
                    participant.person,
                    room,
                    stay.time
                ),
                PoolKind::Fallback => log_changes!(
                    verbosity,
                    "  Placed {} in fallback room {} for nights {}",
                    participant.person,
                    room,
                    stay.time
                ),
            }

            active.push(Reverse((stay.time.last_night(), room)));
            placements.push(Placement {
                participant: stay.participant,
                person: participant.person.clone(),
                gender: participant.gender,
                time: stay.time,
                room,
            });
        }

        Ok(Assignment::new(placements, split.assignments().to_vec()))
    }

    /// Every participation time, ordered by first night; ties keep input order.
    fn collect_stays(&self) -> Vec<Stay> {
        let mut stays: Vec<Stay> = self
            .participants
            .iter()
            .enumerate()
            .flat_map(|(participant, p)| {
                p.times.iter().map(move |&time| Stay { participant, time })
            })
            .collect();
        // Stable sort keeps insertion order among equal first nights
        stays.sort_by_key(|stay| stay.time.first_night());
        stays
    }
}

/// Build a room plan for `participants` in `inventory`.
pub fn solve(
    inventory: &RoomInventory,
    participants: &[Participant],
    config: &SchedulerConfig,
) -> Result<Assignment, SchedulerError> {
    RoomScheduler::new(inventory, participants, config.clone()).schedule()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{is_schedulable, validate};
    use itertools::Itertools;

    fn p(name: &str, gender: Gender, times: &[(u32, u32)]) -> Participant {
        Participant::new(
            name,
            gender,
            times
                .iter()
                .map(|&(f, l)| ParticipationTime::new(f, l).unwrap())
                .collect(),
        )
    }

    fn crew() -> Vec<Participant> {
        vec![
            p("hans", Gender::Male, &[(1, 3)]),
            p("martha", Gender::Female, &[(2, 5)]),
            p("dieter", Gender::Male, &[(6, 8)]),
            p("nadine", Gender::Female, &[(4, 11)]),
            p("fritz", Gender::Male, &[(4, 5), (9, 11)]),
        ]
    }

    fn run(
        inventory: &RoomInventory,
        participants: &[Participant],
    ) -> Result<Assignment, SchedulerError> {
        solve(inventory, participants, &SchedulerConfig::default())
    }

    #[test]
    fn test_multi_interval_participant() {
        let rooms = RoomInventory::builder()
            .add_room(2, Gender::Female)
            .unwrap()
            .add_room(1, Gender::Male)
            .unwrap()
            .build();
        let plan = run(&rooms, &crew()).unwrap();
        assert!(plan.verify(&rooms).is_ok());

        // fritz comes back after a gap and gets a bed again
        assert_eq!(plan.room_of("fritz", 4), Some(1));
        assert_eq!(plan.room_of("fritz", 7), None);
        assert_eq!(plan.room_of("fritz", 10), Some(1));
        assert_eq!(plan.occupants(0, 4), vec!["martha", "nadine"]);
        // Every night of every stay shows up once
        assert_eq!(plan.triples().len(), 3 + 4 + 3 + 8 + 2 + 3);
    }

    #[test]
    fn test_one_room_per_stay() {
        let rooms = RoomInventory::builder()
            .add_room(1, Gender::Female)
            .unwrap()
            .add_room(1, Gender::Female)
            .unwrap()
            .build();
        let participants = vec![
            p("anna", Gender::Female, &[(1, 4)]),
            p("berta", Gender::Female, &[(2, 2)]),
            p("clara", Gender::Female, &[(3, 6)]),
        ];
        let plan = run(&rooms, &participants).unwrap();

        // anna keeps room 0, berta takes room 1, clara gets it once berta left
        for night in 1..=4 {
            assert_eq!(plan.room_of("anna", night), Some(0));
        }
        assert_eq!(plan.room_of("berta", 2), Some(1));
        for night in 3..=6 {
            assert_eq!(plan.room_of("clara", night), Some(1));
        }
    }

    #[test]
    fn test_ties_follow_input_order() {
        let rooms = RoomInventory::builder()
            .add_room(1, Gender::Male)
            .unwrap()
            .add_room(1, Gender::Male)
            .unwrap()
            .build();
        let participants = vec![
            p("second", Gender::Male, &[(2, 3)]),
            p("first", Gender::Male, &[(1, 3)]),
            p("also_second", Gender::Male, &[(2, 2)]),
        ];
        // Peak is 3 > 2 beds
        assert!(run(&rooms, &participants).unwrap_err().is_infeasible());

        let plan = run(&rooms, &participants[..2]).unwrap();
        assert_eq!(plan.placements()[0].person, "first");
        assert_eq!(plan.room_of("first", 1), Some(0));
        assert_eq!(plan.room_of("second", 2), Some(1));
    }

    #[test]
    fn test_flex_rooms_stay_single_gender() {
        let rooms = RoomInventory::builder()
            .add_flex_room(2)
            .unwrap()
            .add_flex_room(1)
            .unwrap()
            .build();
        let participants = vec![
            p("hans", Gender::Male, &[(1, 2)]),
            p("martha", Gender::Female, &[(1, 3)]),
            p("nadine", Gender::Female, &[(2, 3)]),
        ];
        let plan = run(&rooms, &participants).unwrap();
        assert!(plan.verify(&rooms).is_ok());
        assert_eq!(
            plan.flex_genders(),
            &[(0, Gender::Female), (1, Gender::Male)]
        );
        assert_eq!(plan.room_of("hans", 1), Some(1));
    }

    #[test]
    fn test_fallback_hosts_both_genders() {
        let rooms = RoomInventory::builder()
            .add_room(1, Gender::Male)
            .unwrap()
            .add_room(1, Gender::Female)
            .unwrap()
            .add_fallback_room(2)
            .unwrap()
            .build();
        let participants = vec![
            p("hans", Gender::Male, &[(1, 3)]),
            p("paul", Gender::Male, &[(2, 3)]),
            p("martha", Gender::Female, &[(1, 3)]),
            p("jana", Gender::Female, &[(2, 2)]),
        ];
        let plan = run(&rooms, &participants).unwrap();
        assert!(plan.verify(&rooms).is_ok());
        let mut guests = plan.occupants(2, 2);
        guests.sort_unstable();
        assert_eq!(guests, vec!["jana", "paul"]);
    }

    #[test]
    fn test_infeasible_is_reported() {
        let rooms = RoomInventory::builder()
            .add_room(1, Gender::Female)
            .unwrap()
            .add_room(1, Gender::Male)
            .unwrap()
            .build();
        let err = run(&rooms, &crew()).unwrap_err();
        assert!(err.is_infeasible());
        assert!(err.to_string().starts_with("No valid room plan exists"));
    }

    #[test]
    fn test_invalid_attendance_is_not_infeasible() {
        let rooms = RoomInventory::builder()
            .add_room(1, Gender::Female)
            .unwrap()
            .build();
        let err = run(&rooms, &[p("ghost", Gender::Female, &[])]).unwrap_err();
        assert_eq!(
            err,
            SchedulerError::Attendance(AttendanceError::EmptyAttendance("ghost".to_string()))
        );
        assert!(!err.is_infeasible());
    }

    #[test]
    fn test_solve_success_implies_schedulable() {
        let config = SchedulerConfig::default();
        let inventories = vec![
            RoomInventory::builder()
                .add_room(1, Gender::Male)
                .unwrap()
                .add_room(2, Gender::Female)
                .unwrap()
                .build(),
            RoomInventory::builder()
                .add_flex_room(2)
                .unwrap()
                .add_flex_room(1)
                .unwrap()
                .add_fallback_room(1)
                .unwrap()
                .build(),
            RoomInventory::builder()
                .add_fallback_room(3)
                .unwrap()
                .build(),
            RoomInventory::builder()
                .add_room(1, Gender::Female)
                .unwrap()
                .add_room(1, Gender::Male)
                .unwrap()
                .build(),
        ];
        let participants = crew();

        for rooms in &inventories {
            let schedulable = is_schedulable(rooms, &participants, &config).unwrap();
            match solve(rooms, &participants, &config) {
                Ok(plan) => {
                    assert!(schedulable);
                    assert!(plan.verify(rooms).is_ok());
                }
                Err(err) => assert!(err.is_infeasible()),
            }
        }
    }

    /// Men and women staying inside nights 1..=5, some leaving and coming back.
    fn people() -> Vec<Participant> {
        let mut patterns: Vec<Vec<(u32, u32)>> = Vec::new();
        for first in 1..=5 {
            for last in first..=5 {
                patterns.push(vec![(first, last)]);
            }
        }
        patterns.push(vec![(1, 1), (3, 5)]);
        patterns.push(vec![(1, 2), (4, 4)]);
        patterns.push(vec![(2, 2), (4, 5)]);

        let mut people = Vec::new();
        for (i, times) in patterns.iter().enumerate() {
            for gender in Gender::ALL {
                people.push(p(&format!("p{}{}", i, gender), gender, times));
            }
        }
        people
    }

    fn mixed_inventories() -> Vec<RoomInventory> {
        vec![
            RoomInventory::default(),
            RoomInventory::builder()
                .add_room(1, Gender::Male)
                .unwrap()
                .add_room(1, Gender::Female)
                .unwrap()
                .build(),
            RoomInventory::builder()
                .add_flex_room(2)
                .unwrap()
                .add_flex_room(1)
                .unwrap()
                .build(),
            RoomInventory::builder()
                .add_room(1, Gender::Male)
                .unwrap()
                .add_flex_room(2)
                .unwrap()
                .add_fallback_room(1)
                .unwrap()
                .build(),
            RoomInventory::builder().add_fallback_room(2).unwrap().build(),
            RoomInventory::builder()
                .add_room(1, Gender::Female)
                .unwrap()
                .add_flex_room(1)
                .unwrap()
                .add_flex_room(1)
                .unwrap()
                .add_fallback_room(1)
                .unwrap()
                .build(),
        ]
    }

    fn check_group(rooms: &RoomInventory, group: &[Participant], config: &SchedulerConfig) {
        let validation = validate(rooms, group, config).unwrap();
        assert_eq!(validation, validate(rooms, group, config).unwrap());

        let result = solve(rooms, group, config);
        assert_eq!(result, solve(rooms, group, config));

        // A plan exists exactly when the lazy check says so
        match result {
            Ok(plan) => {
                assert!(validation.schedulable, "{:?}", group);
                assert!(plan.verify(rooms).is_ok(), "{:?}", group);
                let nights: u32 = group
                    .iter()
                    .flat_map(|p| p.times.iter().map(ParticipationTime::nights))
                    .sum();
                assert_eq!(plan.triples().len(), nights as usize);
            }
            Err(err) => {
                assert!(err.is_infeasible(), "{:?}", group);
                assert!(!validation.schedulable, "{:?}", group);
            }
        }
    }

    #[test]
    fn test_generated_groups_stay_sound() {
        let config = SchedulerConfig::default();
        let people = people();
        let inventories = mixed_inventories();

        for size in 1..=3 {
            for group in people.iter().cloned().combinations_with_replacement(size) {
                for rooms in &inventories {
                    check_group(rooms, &group, &config);
                }
            }
        }

        for group in people[..16].iter().cloned().combinations(4) {
            for rooms in &inventories {
                check_group(rooms, &group, &config);
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let rooms = RoomInventory::builder()
            .add_room(1, Gender::Male)
            .unwrap()
            .add_flex_room(2)
            .unwrap()
            .add_fallback_room(1)
            .unwrap()
            .build();
        let participants = crew();
        let first = run(&rooms, &participants).unwrap();
        let second = run(&rooms, &participants).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_nobody_attends() {
        let rooms = RoomInventory::builder()
            .add_room(1, Gender::Male)
            .unwrap()
            .build();
        let plan = run(&rooms, &[]).unwrap();
        assert!(plan.placements().is_empty());
        assert!(plan.triples().is_empty());
    }
}
