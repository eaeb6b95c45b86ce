//! Single-elimination brackets: seeding, the match result protocol and round
//! advancement. Everything here is pure and synchronous; persistence and
//! locking live in the tournament manager.

pub mod advancement;
pub mod builder;
pub mod consensus;
pub mod models;

pub use advancement::{Advancement, advance};
pub use builder::{BracketBuilder, MIN_PARTICIPANTS, bracket_size};
pub use consensus::{AdminDecision, SubmissionOutcome, admin_set_result, reset_match, submit_result};
pub use models::{Bracket, CompletedBy, Match, MatchId, MatchStatus, PendingResult, Round, Seat};
