//! Stats Engine: odvozené statistiky z dohraných zápasů.
//! Čisté funkce nad řádky z canon_db; zápis dělá volající job.

pub mod head_to_head;
pub mod swiss;
pub mod team_stats;

pub use head_to_head::{compute_head_to_head, lookup};
pub use swiss::{reconstruct, stage_from_history, SwissBucket, SwissMatch, SwissRound, SwissStage, TeamRecord};
pub use team_stats::{compute_team_stats, winner_of};
