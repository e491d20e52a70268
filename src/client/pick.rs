//! Random pick suggestion for undecided voters.

use rand::Rng;

use crate::dto::participant::ParticipantDto;

/// Suggest a uniformly random candidate from the room's roster, or `None`
/// for an empty roster. Purely a UI hint; the caller still casts the vote.
pub fn suggest_pick<'a, R: Rng + ?Sized>(
    participants: &'a [ParticipantDto],
    rng: &mut R,
) -> Option<&'a ParticipantDto> {
    if participants.is_empty() {
        return None;
    }
    let index = rng.random_range(0..participants.len());
    participants.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn roster(names: &[&str]) -> Vec<ParticipantDto> {
        names
            .iter()
            .map(|name| ParticipantDto {
                id: Uuid::new_v4(),
                name: (*name).into(),
                joined_at: OffsetDateTime::now_utc(),
            })
            .collect()
    }

    #[test]
    fn empty_roster_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(suggest_pick(&[], &mut rng).is_none());
    }

    #[test]
    fn picks_come_from_the_roster() {
        let participants = roster(&["Alice", "Bob", "Carol"]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let pick = suggest_pick(&participants, &mut rng).unwrap();
            assert!(participants.iter().any(|p| p.id == pick.id));
        }
    }

    #[test]
    fn every_candidate_is_reachable() {
        let participants = roster(&["Alice", "Bob", "Carol"]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(suggest_pick(&participants, &mut rng).unwrap().id);
        }
        assert_eq!(seen.len(), participants.len());
    }
}
