use canon_db::{Match, MatchStatus, TeamStatsRow};
use std::collections::BTreeMap;

/// Vítěz podle winner_id, jinak podle skóre (remíza = nikdo)
pub fn winner_of(m: &Match) -> Option<i64> {
    if let Some(w) = m.winner_id {
        return Some(w);
    }
    match (m.score1, m.score2) {
        (Some(a), Some(b)) if a > b => Some(m.team1_id),
        (Some(a), Some(b)) if b > a => Some(m.team2_id),
        _ => None,
    }
}

/// bo1 hlásí skóre v kolech, delší formáty v mapách
pub fn is_single_map(format: &str) -> bool {
    format.eq_ignore_ascii_case("bo1")
}

/// Plný přepočet agregátů týmů z dohraných zápasů.
///
/// `event_id = None` znamená all-time. Nezávisí na žádném předchozím stavu,
/// takže dva běhy nad stejnými zápasy dají identické řádky (seřazené podle týmu).
pub fn compute_team_stats(matches: &[Match], event_id: Option<i64>) -> Vec<TeamStatsRow> {
    let mut acc: BTreeMap<i64, TeamStatsRow> = BTreeMap::new();

    for m in matches {
        if m.status != MatchStatus::Finished {
            continue;
        }
        if event_id.is_some_and(|scope| scope != m.event_id) {
            continue;
        }

        let winner = winner_of(m);
        let sides = [
            (m.team1_id, m.score1.unwrap_or(0), m.score2.unwrap_or(0)),
            (m.team2_id, m.score2.unwrap_or(0), m.score1.unwrap_or(0)),
        ];

        for (team_id, own, opp) in sides {
            let row = acc.entry(team_id).or_insert_with(|| TeamStatsRow { team_id, event_id, ..Default::default() });
            row.played += 1;
            match winner {
                Some(w) if w == team_id => row.wins += 1,
                Some(_) => row.losses += 1,
                None => {}
            }

            if is_single_map(&m.format) {
                row.rounds_won += own;
                row.rounds_lost += opp;
                match winner {
                    Some(w) if w == team_id => row.maps_won += 1,
                    Some(_) => row.maps_lost += 1,
                    None => {}
                }
            } else {
                row.maps_won += own;
                row.maps_lost += opp;
            }
        }
    }

    acc.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(id: i64, event_id: i64, t1: i64, t2: i64, format: &str, s1: i64, s2: i64) -> Match {
        Match {
            id,
            external_id: 1000 + id,
            event_id,
            team1_id: t1,
            team2_id: t2,
            date: None,
            format: format.into(),
            status: MatchStatus::Finished,
            score1: Some(s1),
            score2: Some(s2),
            winner_id: None,
        }
    }

    #[test]
    fn maps_and_rounds_follow_format() {
        let matches = vec![
            finished(1, 1, 10, 20, "bo3", 2, 1),
            finished(2, 1, 20, 10, "bo1", 16, 12),
        ];
        let stats = compute_team_stats(&matches, None);
        let t10 = &stats[0];
        assert_eq!((t10.team_id, t10.played, t10.wins, t10.losses), (10, 2, 1, 1));
        assert_eq!((t10.maps_won, t10.maps_lost), (2, 2));
        assert_eq!((t10.rounds_won, t10.rounds_lost), (12, 16));
    }

    #[test]
    fn scope_and_status_filter() {
        let mut live = finished(3, 1, 10, 20, "bo3", 1, 0);
        live.status = MatchStatus::Live;
        let matches = vec![finished(1, 1, 10, 20, "bo3", 2, 0), finished(2, 2, 10, 30, "bo3", 0, 2), live];

        let scoped = compute_team_stats(&matches, Some(1));
        assert_eq!(scoped.len(), 2);
        assert!(scoped.iter().all(|r| r.event_id == Some(1) && r.played == 1));

        let all = compute_team_stats(&matches, None);
        assert_eq!(all.iter().find(|r| r.team_id == 10).map(|r| r.played), Some(2));
    }

    #[test]
    fn recomputation_is_identical() {
        let matches = vec![finished(1, 1, 10, 20, "bo3", 2, 1), finished(2, 1, 30, 10, "bo5", 3, 2)];
        assert_eq!(compute_team_stats(&matches, None), compute_team_stats(&matches, None));
    }
}
