//! Swiss stage: 16 týmů, 5 kol, postup na 3 výhry, vyřazení na 3 prohry.
//!
//! Zdroj nedává explicitní kola ani buckety, takže se skládají z ploché
//! historie zápasů (`stage_from_history`) a pak zpět čtou ze stagingu
//! (`reconstruct`).

use crate::team_stats::winner_of;
use canon_db::{Match, MatchStatus, SwissEntry, SwissRoundRow};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

pub const ROUNDS: i64 = 5;
pub const WINS_TO_QUALIFY: u32 = 3;
pub const LOSSES_TO_ELIMINATE: u32 = 3;

/// Kolo → bucket labely
pub const TOPOLOGY: [&[&str]; ROUNDS as usize] = [
    &["0:0"],
    &["1:0", "0:1"],
    &["2:0", "1:1", "0:2"],
    &["3:0", "2:1", "1:2", "0:3"],
    &["3:1", "2:2", "1:3"],
];

/// Kolik zápasů musí být dohráno, aby kolo bylo kompletní
const MATCHES_PER_ROUND: [usize; ROUNDS as usize] = [8, 8, 8, 6, 3];

pub fn bucket_label(wins: u32, losses: u32) -> String {
    format!("{wins}:{losses}")
}

pub fn record_label(wins: u32, losses: u32) -> String {
    format!("{wins}-{losses}")
}

/// "2-1" → (2, 1)
pub fn parse_record(s: &str) -> Option<(u32, u32)> {
    let (w, l) = s.trim().split_once('-')?;
    Some((w.trim().parse().ok()?, l.trim().parse().ok()?))
}

fn is_settled(wins: u32, losses: u32) -> bool {
    wins >= WINS_TO_QUALIFY || losses >= LOSSES_TO_ELIMINATE
}

// ── Staging z ploché historie ────────────────────────────────────────────────

/// Poskládá Swiss řádky z historie zápasů jednoho eventu.
///
/// Zápasy jdou podle data, pak externího ID. Zápas patří do kola `w+l+1`
/// a bucketu `"w:l"` podle záznamu týmu 1 před zápasem. Nedohrané zápasy se
/// stagují, ale záznamy neposouvají. Týmy s 3 výhrami / 3 prohrami se dál
/// nestagují, zrušené zápasy vůbec.
pub fn stage_from_history(event_id: i64, matches: &[Match]) -> Vec<SwissRoundRow> {
    let mut ordered: Vec<&Match> = matches
        .iter()
        .filter(|m| m.event_id == event_id && m.status != MatchStatus::Cancelled)
        .collect();
    ordered.sort_by(|a, b| {
        (a.date.is_none(), a.date, a.external_id).cmp(&(b.date.is_none(), b.date, b.external_id))
    });

    let mut records: HashMap<i64, (u32, u32)> = HashMap::new();
    let mut rows = Vec::new();

    for m in ordered {
        let (w1, l1) = records.get(&m.team1_id).copied().unwrap_or_default();
        let (w2, l2) = records.get(&m.team2_id).copied().unwrap_or_default();
        if is_settled(w1, l1) || is_settled(w2, l2) {
            debug!("match {} after a team is settled, not a swiss pairing", m.external_id);
            continue;
        }

        let round = i64::from(w1 + l1) + 1;
        if round > ROUNDS {
            continue;
        }
        if w1 + l1 != w2 + l2 {
            debug!("match {} pairs teams from different rounds ({}-{} vs {}-{})", m.external_id, w1, l1, w2, l2);
        }

        rows.push(SwissRoundRow {
            event_id,
            round_number: round,
            bucket: bucket_label(w1, l1),
            team1_id: m.team1_id,
            team2_id: m.team2_id,
            match_id: Some(m.id),
            team1_record: record_label(w1, l1),
            team2_record: record_label(w2, l2),
        });

        if m.status != MatchStatus::Finished {
            continue;
        }
        match winner_of(m) {
            Some(w) if w == m.team1_id => {
                records.insert(m.team1_id, (w1 + 1, l1));
                records.insert(m.team2_id, (w2, l2 + 1));
            }
            Some(w) if w == m.team2_id => {
                records.insert(m.team1_id, (w1, l1 + 1));
                records.insert(m.team2_id, (w2 + 1, l2));
            }
            _ => debug!("finished match {} has no winner", m.external_id),
        }
    }

    rows
}

// ── Rekonstrukce ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwissMatch {
    pub match_id: Option<i64>,
    pub team1_id: i64,
    pub team2_id: i64,
    pub team1_record: Option<(u32, u32)>,
    pub team2_record: Option<(u32, u32)>,
    pub status: Option<MatchStatus>,
    pub winner_id: Option<i64>,
    pub score1: Option<i64>,
    pub score2: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwissBucket {
    pub label: &'static str,
    pub matches: Vec<SwissMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwissRound {
    pub round: i64,
    pub buckets: Vec<SwissBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeamRecord {
    pub team_id: i64,
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwissStage {
    pub event_id: i64,
    pub current_round: i64,
    pub rounds: Vec<SwissRound>,
    /// 3-0 před 3-1 před 3-2, shoda podle pořadí objevení
    pub qualified: Vec<TeamRecord>,
    /// Nejvíc výher první, shoda podle pořadí objevení
    pub eliminated: Vec<TeamRecord>,
}

impl SwissStage {
    pub fn bucket(&self, round: i64, label: &str) -> Option<&SwissBucket> {
        self.rounds
            .iter()
            .find(|r| r.round == round)
            .and_then(|r| r.buckets.iter().find(|b| b.label == label))
    }
}

/// Stav Swiss stage ze staging řádků (spojených se stavem zápasů)
pub fn reconstruct(event_id: i64, entries: &[SwissEntry]) -> SwissStage {
    let mut rounds: Vec<SwissRound> = TOPOLOGY
        .iter()
        .enumerate()
        .map(|(i, labels)| SwissRound {
            round: i as i64 + 1,
            buckets: labels.iter().map(|&label| SwissBucket { label, matches: Vec::new() }).collect(),
        })
        .collect();

    for e in entries.iter().filter(|e| e.row.event_id == event_id) {
        let slot = usize::try_from(e.row.round_number - 1)
            .ok()
            .and_then(|i| rounds.get_mut(i))
            .and_then(|r| r.buckets.iter_mut().find(|b| b.label == e.row.bucket));
        let Some(bucket) = slot else {
            debug!("swiss row round {} bucket {} outside topology", e.row.round_number, e.row.bucket);
            continue;
        };
        bucket.matches.push(SwissMatch {
            match_id: e.row.match_id,
            team1_id: e.row.team1_id,
            team2_id: e.row.team2_id,
            team1_record: parse_record(&e.row.team1_record),
            team2_record: parse_record(&e.row.team2_record),
            status: e.status,
            winner_id: e.winner_id,
            score1: e.score1,
            score2: e.score2,
        });
    }

    let current_round = current_round(&rounds);
    let (qualified, eliminated) = classify(entries.iter().filter(|e| e.row.event_id == event_id));

    SwissStage { event_id, current_round, rounds, qualified, eliminated }
}

/// Nejvyšší kolo s dohraným/živým zápasem; kompletně dohrané kolo posouvá o 1 (max 5)
fn current_round(rounds: &[SwissRound]) -> i64 {
    let active = rounds.iter().rev().find(|r| {
        r.buckets
            .iter()
            .flat_map(|b| &b.matches)
            .any(|m| matches!(m.status, Some(MatchStatus::Finished | MatchStatus::Live)))
    });

    let Some(round) = active else {
        return 1;
    };

    let played: Vec<&SwissMatch> = round.buckets.iter().flat_map(|b| &b.matches).collect();
    let finished = played.iter().filter(|m| m.status == Some(MatchStatus::Finished)).count();
    let open = played
        .iter()
        .any(|m| !matches!(m.status, Some(MatchStatus::Finished | MatchStatus::Cancelled)));
    let expected = MATCHES_PER_ROUND[(round.round - 1) as usize];

    if !open && finished >= expected {
        (round.round + 1).min(ROUNDS)
    } else {
        round.round
    }
}

fn classify<'a>(entries: impl Iterator<Item = &'a SwissEntry>) -> (Vec<TeamRecord>, Vec<TeamRecord>) {
    let mut order: Vec<i64> = Vec::new();
    let mut tally: HashMap<i64, (u32, u32)> = HashMap::new();

    for e in entries {
        for team in [e.row.team1_id, e.row.team2_id] {
            if !tally.contains_key(&team) {
                tally.insert(team, (0, 0));
                order.push(team);
            }
        }
        if e.status != Some(MatchStatus::Finished) {
            continue;
        }
        let Some(winner) = e.winner_id.or_else(|| match (e.score1, e.score2) {
            (Some(a), Some(b)) if a > b => Some(e.row.team1_id),
            (Some(a), Some(b)) if b > a => Some(e.row.team2_id),
            _ => None,
        }) else {
            continue;
        };
        let loser = if winner == e.row.team1_id { e.row.team2_id } else { e.row.team1_id };
        if let Some(t) = tally.get_mut(&winner) {
            t.0 += 1;
        }
        if let Some(t) = tally.get_mut(&loser) {
            t.1 += 1;
        }
    }

    let records: Vec<TeamRecord> = order
        .iter()
        .map(|&team_id| {
            let (wins, losses) = tally.get(&team_id).copied().unwrap_or_default();
            TeamRecord { team_id, wins, losses }
        })
        .collect();

    let mut qualified: Vec<TeamRecord> = records.iter().copied().filter(|r| r.wins >= WINS_TO_QUALIFY).collect();
    let mut eliminated: Vec<TeamRecord> = records
        .iter()
        .copied()
        .filter(|r| r.wins < WINS_TO_QUALIFY && r.losses >= LOSSES_TO_ELIMINATE)
        .collect();

    // sort_by_key je stabilní → shoda zůstává v pořadí objevení
    qualified.sort_by_key(|r| r.losses);
    eliminated.sort_by_key(|r| std::cmp::Reverse(r.wins));
    (qualified, eliminated)
}
