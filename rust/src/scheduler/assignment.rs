//! Room plans produced by the scheduler.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::inventory::RoomInventory;
use crate::models::{Gender, ParticipationTime, RoomPolicy};

use super::solver::SchedulerError;

/// One participant staying in one room for one whole participation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Position of the participant in the input list
    pub participant: usize,
    pub person: String,
    pub gender: Gender,
    pub time: ParticipationTime,
    /// Index of the room in the inventory
    pub room: usize,
}

/// A complete room plan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    placements: Vec<Placement>,
    flex_genders: Vec<(usize, Gender)>,
}

impl Assignment {
    pub fn new(placements: Vec<Placement>, flex_genders: Vec<(usize, Gender)>) -> Self {
        Self {
            placements,
            flex_genders,
        }
    }

    /// Placements in the order they were made (by first night, then input order).
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Gender each flex room was committed to, in inventory order.
    pub fn flex_genders(&self) -> &[(usize, Gender)] {
        &self.flex_genders
    }

    /// `(person, night, room index)` for every night of every placement.
    pub fn triples(&self) -> Vec<(String, u32, usize)> {
        self.placements
            .iter()
            .flat_map(|placement| {
                (placement.time.first_night()..=placement.time.last_night())
                    .map(move |night| (placement.person.clone(), night, placement.room))
            })
            .collect()
    }

    /// Room the participant at input position `participant` sleeps in during `night`.
    pub fn room_of_participant(&self, participant: usize, night: u32) -> Option<usize> {
        self.placements
            .iter()
            .find(|p| p.participant == participant && p.time.contains(night))
            .map(|p| p.room)
    }

    /// Room `person` sleeps in during `night`.
    ///
    /// Person references are not required to be unique. When several participants share
    /// one, the earliest placement wins; use [`Assignment::room_of_participant`] to tell
    /// them apart.
    pub fn room_of(&self, person: &str, night: u32) -> Option<usize> {
        self.placements
            .iter()
            .find(|p| p.person == person && p.time.contains(night))
            .map(|p| p.room)
    }

    /// People sleeping in `room` during `night`.
    pub fn occupants(&self, room: usize, night: u32) -> Vec<&str> {
        self.placements
            .iter()
            .filter(|p| p.room == room && p.time.contains(night))
            .map(|p| p.person.as_str())
            .collect()
    }

    pub fn occupancy(&self, room: usize, night: u32) -> u32 {
        self.placements
            .iter()
            .filter(|p| p.room == room && p.time.contains(night))
            .count() as u32
    }

    /// Occupants per (room, night), sorted by room then night. Empty rooms are left out.
    pub fn room_table(&self) -> BTreeMap<(usize, u32), Vec<&str>> {
        let mut table: BTreeMap<(usize, u32), Vec<&str>> = BTreeMap::new();
        for placement in &self.placements {
            for night in placement.time.first_night()..=placement.time.last_night() {
                table
                    .entry((placement.room, night))
                    .or_default()
                    .push(placement.person.as_str());
            }
        }
        table
    }

    /// Replay the plan against `inventory` and check every room rule.
    ///
    /// Checks: rooms exist, nobody has two beds in one night, fixed rooms only host their
    /// gender, flex rooms only host the gender they were committed to, and no room holds
    /// more people than beds in any night.
    pub fn verify(&self, inventory: &RoomInventory) -> Result<(), SchedulerError> {
        let flex: FxHashMap<usize, Gender> = self.flex_genders.iter().copied().collect();
        let mut beds_used: FxHashMap<(usize, u32), u32> = FxHashMap::default();
        let mut bed_of: FxHashMap<(usize, u32), usize> = FxHashMap::default();

        for placement in &self.placements {
            let room = inventory.room(placement.room).ok_or_else(|| {
                SchedulerError::Violation(format!(
                    "{} placed in unknown room {}",
                    placement.person, placement.room
                ))
            })?;

            let admitted = match room.policy() {
                RoomPolicy::FixedGender(gender) => gender == placement.gender,
                RoomPolicy::Flex => flex.get(&placement.room) == Some(&placement.gender),
                RoomPolicy::Fallback => true,
            };
            if !admitted {
                return Err(SchedulerError::Violation(format!(
                    "{} ({}) may not sleep in {} room {}",
                    placement.person,
                    placement.gender,
                    room.policy(),
                    placement.room
                )));
            }

            for night in placement.time.first_night()..=placement.time.last_night() {
                if let Some(other) = bed_of.insert((placement.participant, night), placement.room)
                {
                    return Err(SchedulerError::Violation(format!(
                        "{} has rooms {} and {} in night {}",
                        placement.person, other, placement.room, night
                    )));
                }

                let used = beds_used.entry((placement.room, night)).or_insert(0);
                *used += 1;
                if *used > room.capacity() {
                    return Err(SchedulerError::Violation(format!(
                        "room {} holds more than {} people in night {}",
                        placement.room,
                        room.capacity(),
                        night
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(first: u32, last: u32) -> ParticipationTime {
        ParticipationTime::new(first, last).unwrap()
    }

    fn place(
        participant: usize,
        person: &str,
        gender: Gender,
        time: ParticipationTime,
        room: usize,
    ) -> Placement {
        Placement {
            participant,
            person: person.to_string(),
            gender,
            time,
            room,
        }
    }

    fn rooms() -> RoomInventory {
        RoomInventory::builder()
            .add_room(1, Gender::Male)
            .unwrap()
            .add_flex_room(2)
            .unwrap()
            .add_fallback_room(2)
            .unwrap()
            .build()
    }

    fn plan() -> Assignment {
        Assignment::new(
            vec![
                place(0, "hans", Gender::Male, t(1, 3), 0),
                place(1, "martha", Gender::Female, t(2, 5), 1),
                place(2, "nadine", Gender::Female, t(4, 5), 1),
                place(3, "fritz", Gender::Male, t(4, 5), 0),
                place(4, "jana", Gender::Female, t(3, 4), 2),
                place(5, "paul", Gender::Male, t(3, 3), 2),
            ],
            vec![(1, Gender::Female)],
        )
    }

    #[test]
    fn test_triples() {
        let plan = Assignment::new(
            vec![place(0, "hans", Gender::Male, t(1, 3), 0)],
            vec![],
        );
        assert_eq!(
            plan.triples(),
            vec![
                ("hans".to_string(), 1, 0),
                ("hans".to_string(), 2, 0),
                ("hans".to_string(), 3, 0)
            ]
        );
    }

    #[test]
    fn test_lookups() {
        let plan = plan();
        assert_eq!(plan.room_of("martha", 4), Some(1));
        assert_eq!(plan.room_of("martha", 6), None);
        assert_eq!(plan.occupants(1, 4), vec!["martha", "nadine"]);
        assert_eq!(plan.occupancy(2, 3), 2);
        assert_eq!(plan.occupancy(2, 5), 0);
    }

    #[test]
    fn test_shared_person_reference() {
        let plan = Assignment::new(
            vec![
                place(0, "kim", Gender::Male, t(1, 3), 0),
                place(1, "kim", Gender::Female, t(1, 3), 1),
            ],
            vec![(1, Gender::Female)],
        );
        assert!(plan.verify(&rooms()).is_ok());
        assert_eq!(plan.room_of_participant(0, 2), Some(0));
        assert_eq!(plan.room_of_participant(1, 2), Some(1));
        assert_eq!(plan.room_of_participant(1, 4), None);
        assert_eq!(plan.room_of("kim", 2), Some(0));
    }

    #[test]
    fn test_room_table() {
        let plan = plan();
        let table = plan.room_table();
        assert_eq!(table.get(&(2, 3)), Some(&vec!["jana", "paul"]));
        assert_eq!(table.get(&(0, 4)), Some(&vec!["fritz"]));
        assert!(!table.contains_key(&(1, 1)));
        let first_key = table.keys().next().copied();
        assert_eq!(first_key, Some((0, 1)));
    }

    #[test]
    fn test_verify_accepts_mixed_fallback() {
        assert!(plan().verify(&rooms()).is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_gender() {
        let plan = Assignment::new(
            vec![place(0, "martha", Gender::Female, t(1, 2), 0)],
            vec![(1, Gender::Female)],
        );
        assert!(matches!(
            plan.verify(&rooms()),
            Err(SchedulerError::Violation(_))
        ));

        let flex_mixup = Assignment::new(
            vec![place(0, "hans", Gender::Male, t(1, 2), 1)],
            vec![(1, Gender::Female)],
        );
        assert!(flex_mixup.verify(&rooms()).is_err());
    }

    #[test]
    fn test_verify_rejects_overbooking() {
        let plan = Assignment::new(
            vec![
                place(0, "hans", Gender::Male, t(1, 3), 0),
                place(1, "paul", Gender::Male, t(3, 4), 0),
            ],
            vec![(1, Gender::Female)],
        );
        let err = plan.verify(&rooms()).unwrap_err();
        assert!(err.to_string().contains("night 3"));
    }

    #[test]
    fn test_verify_rejects_two_rooms_in_one_night() {
        let plan = Assignment::new(
            vec![
                place(0, "hans", Gender::Male, t(1, 3), 0),
                place(0, "hans", Gender::Male, t(3, 4), 2),
            ],
            vec![(1, Gender::Female)],
        );
        assert!(plan.verify(&rooms()).is_err());
    }

    #[test]
    fn test_verify_rejects_unknown_room() {
        let plan = Assignment::new(
            vec![place(0, "hans", Gender::Male, t(1, 1), 9)],
            vec![],
        );
        assert!(plan.verify(&rooms()).is_err());
    }
}
