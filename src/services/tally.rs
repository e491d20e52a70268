//! Pure tally math: deterministic ordering, shared ranks, winners, and the
//! derived completion flag.
//!
//! Completion is always re-derived from the counts here, never read back
//! from a cached status, so out-of-band vote deletion cannot leave a stale
//! "completed" flag behind.

use uuid::Uuid;

use crate::dao::models::TallyRowEntity;

/// One candidate's line after sorting and ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyEntry {
    /// Candidate participant id.
    pub participant_id: Uuid,
    /// Candidate display name.
    pub name: String,
    /// Number of votes received.
    pub vote_count: u64,
    /// Display rank; ties share a rank (1, 1, 3, ...).
    pub rank: u32,
}

/// Complete tally summary for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallySummary {
    /// Entries sorted by vote count descending, then name ascending.
    pub entries: Vec<TallyEntry>,
    /// Every entry at the maximum count, empty when nobody has voted.
    pub winners: Vec<TallyEntry>,
    /// Distinct participants that have voted.
    pub voted_count: u64,
    /// Participants currently in the room.
    pub total_participants: u64,
    /// voted == total and the room is not empty.
    pub is_complete: bool,
}

/// Build the summary from raw tally rows and the voter/participant counts.
///
/// Sorting is byte-wise on names (locale-independent), so two calls with the
/// same rows produce identical output.
pub fn summarize(
    mut rows: Vec<TallyRowEntity>,
    voted_count: u64,
    total_participants: u64,
) -> TallySummary {
    rows.sort_unstable_by(|a, b| {
        b.vote_count
            .cmp(&a.vote_count)
            .then_with(|| a.name.as_bytes().cmp(b.name.as_bytes()))
    });

    let entries: Vec<TallyEntry> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| TallyEntry {
            participant_id: row.participant_id,
            name: row.name.clone(),
            vote_count: row.vote_count.max(0) as u64,
            rank: rank_at(&rows, index),
        })
        .collect();

    let max_votes = entries.first().map(|entry| entry.vote_count).unwrap_or(0);
    let winners: Vec<TallyEntry> = if max_votes > 0 {
        entries
            .iter()
            .filter(|entry| entry.vote_count == max_votes)
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    let is_complete = voted_count == total_participants && total_participants > 0;

    TallySummary {
        entries,
        winners,
        voted_count,
        total_participants,
        is_complete,
    }
}

/// Rank of the entry at `index`: one plus the number of earlier entries with
/// a strictly greater count.
fn rank_at(sorted: &[TallyRowEntity], index: usize) -> u32 {
    let count = sorted[index].vote_count;
    let greater = sorted[..index]
        .iter()
        .filter(|row| row.vote_count > count)
        .count();
    greater as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, vote_count: i64) -> TallyRowEntity {
        TallyRowEntity {
            participant_id: Uuid::new_v4(),
            name: name.into(),
            vote_count,
        }
    }

    #[test]
    fn sorts_by_count_then_name() {
        let summary = summarize(
            vec![row("Carol", 1), row("Alice", 2), row("Bob", 2)],
            5,
            5,
        );
        let names: Vec<&str> = summary.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn ties_share_a_rank_and_skip_the_next() {
        let summary = summarize(
            vec![row("Alice", 3), row("Bob", 3), row("Carol", 1)],
            7,
            7,
        );
        let ranks: Vec<u32> = summary.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [1, 1, 3]);
    }

    #[test]
    fn winners_cover_every_entry_at_the_maximum() {
        let summary = summarize(
            vec![row("Alice", 1), row("Bob", 1), row("Carol", 1)],
            3,
            3,
        );
        assert_eq!(summary.winners.len(), 3);
        assert!(summary.is_complete);
    }

    #[test]
    fn no_votes_means_no_winners() {
        let summary = summarize(vec![row("Alice", 0), row("Bob", 0)], 0, 2);
        assert!(summary.winners.is_empty());
        assert!(!summary.is_complete);
        // Everyone is still listed, tied at rank 1.
        assert_eq!(summary.entries.len(), 2);
        assert_eq!(summary.entries[0].rank, 1);
    }

    #[test]
    fn empty_room_is_never_complete() {
        let summary = summarize(Vec::new(), 0, 0);
        assert!(!summary.is_complete);
        assert!(summary.winners.is_empty());
    }

    #[test]
    fn summaries_are_deterministic() {
        let rows = vec![row("Bob", 2), row("Alice", 2), row("Carol", 0)];
        let first = summarize(rows.clone(), 4, 4);
        let second = summarize(rows, 4, 4);
        assert_eq!(first, second);
    }
}
