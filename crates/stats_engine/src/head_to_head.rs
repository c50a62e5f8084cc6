use crate::team_stats::winner_of;
use canon_db::{HeadToHeadRow, Match, MatchStatus};
use std::collections::BTreeMap;

/// All-time (event_id = None) + per-event agregát pro každý pár, který spolu hrál.
///
/// Pořadí týmů v zápase nehraje roli: klíč je vždy (menší id, větší id).
pub fn compute_head_to_head(matches: &[Match]) -> Vec<HeadToHeadRow> {
    let mut acc: BTreeMap<(Option<i64>, i64, i64), HeadToHeadRow> = BTreeMap::new();

    for m in matches.iter().filter(|m| m.status == MatchStatus::Finished) {
        let (a, b) = if m.team1_id < m.team2_id { (m.team1_id, m.team2_id) } else { (m.team2_id, m.team1_id) };
        let winner = winner_of(m);

        for scope in [None, Some(m.event_id)] {
            let row = acc.entry((scope, a, b)).or_insert_with(|| HeadToHeadRow {
                team_a_id: a,
                team_b_id: b,
                event_id: scope,
                total: 0,
                team_a_wins: 0,
                team_b_wins: 0,
                last_match_date: None,
            });
            row.total += 1;
            match winner {
                Some(w) if w == a => row.team_a_wins += 1,
                Some(w) if w == b => row.team_b_wins += 1,
                _ => {}
            }
            if m.date > row.last_match_date {
                row.last_match_date = m.date;
            }
        }
    }

    acc.into_values().collect()
}

/// Najde agregát páru a otočí ho tak, aby `team_a` byl první argument
pub fn lookup(rows: &[HeadToHeadRow], a: i64, b: i64, event_id: Option<i64>) -> Option<HeadToHeadRow> {
    rows.iter()
        .find(|h| h.event_id == event_id && ((h.team_a_id, h.team_b_id) == (a, b) || (h.team_a_id, h.team_b_id) == (b, a)))
        .map(|h| if h.team_a_id == a { h.clone() } else { h.flipped() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn game(id: i64, event_id: i64, t1: i64, t2: i64, winner: i64, day: u32) -> Match {
        Match {
            id,
            external_id: id,
            event_id,
            team1_id: t1,
            team2_id: t2,
            date: Utc.with_ymd_and_hms(2025, 3, day, 18, 0, 0).single(),
            format: "bo3".into(),
            status: MatchStatus::Finished,
            score1: None,
            score2: None,
            winner_id: Some(winner),
        }
    }

    #[test]
    fn pairs_ignore_slot_order_and_split_by_event() {
        let matches = vec![game(1, 7, 5, 3, 5, 1), game(2, 7, 3, 5, 5, 2), game(3, 8, 3, 5, 3, 9)];
        let rows = compute_head_to_head(&matches);
        assert_eq!(rows.len(), 3);

        let all = lookup(&rows, 3, 5, None).unwrap();
        assert_eq!((all.total, all.team_a_wins, all.team_b_wins), (3, 1, 2));
        assert_eq!(all.last_match_date, Utc.with_ymd_and_hms(2025, 3, 9, 18, 0, 0).single());

        let ev7 = lookup(&rows, 5, 3, Some(7)).unwrap();
        assert_eq!((ev7.total, ev7.team_a_wins, ev7.team_b_wins), (2, 2, 0));
    }

    #[test]
    fn aggregate_is_symmetric() {
        let matches = vec![game(1, 1, 1, 2, 1, 1), game(2, 1, 2, 1, 1, 2), game(3, 1, 1, 2, 2, 3)];
        let rows = compute_head_to_head(&matches);
        let ab = lookup(&rows, 1, 2, None).unwrap();
        let ba = lookup(&rows, 2, 1, None).unwrap();
        assert_eq!(ab.team_a_wins, ba.team_b_wins);
        assert_eq!(ab.team_b_wins, ba.team_a_wins);
        assert!(rows.iter().all(|h| h.team_a_id < h.team_b_id));
    }
}
