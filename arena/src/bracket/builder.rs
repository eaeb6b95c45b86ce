//! Randomized seeding of a single-elimination bracket.

use super::models::{Bracket, Match, match_id};
use crate::tournament::{
    errors::{TournamentError, TournamentResult},
    models::Participant,
};
use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom, seq::index};

/// Minimum participants a bracket can be built from
pub const MIN_PARTICIPANTS: usize = 2;

/// Smallest power of two >= `count`
pub fn bracket_size(count: usize) -> u32 {
    count.max(1).next_power_of_two() as u32
}

/// Builds round 0 of a bracket from a participant list
pub struct BracketBuilder<R: Rng> {
    rng: R,
}

impl BracketBuilder<rand::rngs::ThreadRng> {
    /// Create a builder seeded from the thread-local generator
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for BracketBuilder<rand::rngs::ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> BracketBuilder<R> {
    /// Create a builder over an explicit generator (deterministic in tests)
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Build a bracket
    ///
    /// Shuffles the participants, picks `size - n` of them uniformly without
    /// replacement to sit out round 0, and pairs the rest in shuffled order.
    ///
    /// # Errors
    ///
    /// * `Validation` - fewer than two participants
    pub fn build(
        &mut self,
        participants: &[Participant],
        now: DateTime<Utc>,
    ) -> TournamentResult<Bracket> {
        if participants.len() < MIN_PARTICIPANTS {
            return Err(TournamentError::Validation(format!(
                "need at least {MIN_PARTICIPANTS} participants, have {}",
                participants.len()
            )));
        }

        let mut shuffled = participants.to_vec();
        shuffled.shuffle(&mut self.rng);

        let size = bracket_size(shuffled.len());
        let byes = size as usize - shuffled.len();

        let mut bye_slots = vec![false; shuffled.len()];
        for idx in index::sample(&mut self.rng, shuffled.len(), byes) {
            bye_slots[idx] = true;
        }

        let (bye_participants, playing): (Vec<_>, Vec<_>) = shuffled
            .into_iter()
            .zip(bye_slots)
            .partition(|(_, is_bye)| *is_bye);
        let bye_participants: Vec<Participant> =
            bye_participants.into_iter().map(|(p, _)| p).collect();
        let playing: Vec<Participant> = playing.into_iter().map(|(p, _)| p).collect();

        let first_round = pair_up(0, &playing, now)?;

        Ok(Bracket {
            size,
            total_rounds: size.trailing_zeros(),
            current_round: 1,
            rounds: vec![first_round],
            bye_participants,
            is_complete: false,
            winner: None,
        })
    }
}

/// Pair participants `(0,1), (2,3), ...` into fresh pending matches
pub(crate) fn pair_up(
    round_index: usize,
    participants: &[Participant],
    now: DateTime<Utc>,
) -> TournamentResult<Vec<Match>> {
    if participants.len() % 2 != 0 {
        return Err(TournamentError::IntegrityFault(format!(
            "cannot pair {} participants for round {}",
            participants.len(),
            round_index + 1
        )));
    }

    Ok(participants
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            Match::new(
                match_id(round_index, i),
                pair[0].clone(),
                pair[1].clone(),
                now,
            )
        })
        .collect())
}
