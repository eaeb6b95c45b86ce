//! Round advancement.
//!
//! Once every match of the latest round is completed, its winners (plus the
//! round 0 byes) are paired into the next round, or the last one standing is
//! returned as champion.

use super::{builder::pair_up, models::Bracket};
use crate::tournament::{
    errors::{TournamentError, TournamentResult},
    models::Participant,
};
use chrono::{DateTime, Utc};

/// Result of trying to advance a bracket after a match was finalized
#[derive(Debug, Clone, PartialEq)]
pub enum Advancement {
    /// Some matches in the round are still pending
    RoundPending,
    /// The round is not the latest one, later rounds already exist
    NoChange,
    /// A new round was appended (1-based round number)
    NextRound { round: u32, matches: usize },
    /// Exactly one participant remains
    Champion(Participant),
}

/// Try to advance `bracket` after a match in `round_index` (0-based) finalized
///
/// Only the latest materialized round advances. Re-finalizing a match in an
/// earlier round (after an admin reset) never rebuilds or duplicates later
/// rounds.
///
/// # Errors
///
/// * `IntegrityFault` - the number of advancing participants does not match
///   the bracket size for this round
pub fn advance(
    bracket: &mut Bracket,
    round_index: usize,
    now: DateTime<Utc>,
) -> TournamentResult<Advancement> {
    if round_index + 1 != bracket.current_round as usize {
        return Ok(Advancement::NoChange);
    }

    let round = bracket.rounds.get(round_index).ok_or_else(|| {
        TournamentError::IntegrityFault(format!(
            "round {} is not materialized",
            round_index + 1
        ))
    })?;

    if round.iter().any(|m| !m.is_completed()) {
        return Ok(Advancement::RoundPending);
    }

    let mut advancing: Vec<Participant> = round
        .iter()
        .map(|m| {
            m.winner.clone().ok_or_else(|| {
                TournamentError::IntegrityFault(format!("completed match {} has no winner", m.id))
            })
        })
        .collect::<TournamentResult<_>>()?;

    if round_index == 0 {
        advancing.extend(bracket.bye_participants.iter().cloned());
    }

    let expected = (bracket.size >> (round_index + 1)) as usize;
    if advancing.len() != expected {
        return Err(TournamentError::IntegrityFault(format!(
            "{} participants advance from round {}, expected {expected}",
            advancing.len(),
            round_index + 1
        )));
    }

    if expected == 1 {
        if round_index == 0 {
            bracket.bye_participants.clear();
        }
        return Ok(Advancement::Champion(advancing.remove(0)));
    }

    let next = pair_up(round_index + 1, &advancing, now)?;
    let matches = next.len();

    if round_index == 0 {
        bracket.bye_participants.clear();
    }
    bracket.rounds.push(next);
    bracket.current_round += 1;

    Ok(Advancement::NextRound {
        round: bracket.current_round,
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{
        builder::BracketBuilder,
        consensus::{AdminDecision, admin_set_result, reset_match},
    };
    use rand::{SeedableRng, rngs::StdRng};

    fn participants(n: usize) -> Vec<Participant> {
        (0..n)
            .map(|i| {
                let id = format!("p{i}");
                Participant::new(&id, &format!("0x{i:04x}"), &id, Utc::now())
            })
            .collect()
    }

    fn build(n: usize) -> Bracket {
        BracketBuilder::with_rng(StdRng::seed_from_u64(n as u64))
            .build(&participants(n), Utc::now())
            .unwrap()
    }

    /// Let player1 win every pending match of the latest round
    fn play_round(bracket: &mut Bracket) -> Advancement {
        let round_index = bracket.current_round as usize - 1;
        let mut last = Advancement::RoundPending;
        for i in 0..bracket.rounds[round_index].len() {
            let m = &mut bracket.rounds[round_index][i];
            let winner = m.player1.id.clone();
            admin_set_result(m, &AdminDecision::Winner(winner), Utc::now()).unwrap();
            last = advance(bracket, round_index, Utc::now()).unwrap();
        }
        last
    }

    #[test]
    fn test_pending_round_does_not_advance() {
        let mut bracket = build(4);
        let m = &mut bracket.rounds[0][0];
        let winner = m.player1.id.clone();
        admin_set_result(m, &AdminDecision::Winner(winner), Utc::now()).unwrap();

        assert_eq!(
            advance(&mut bracket, 0, Utc::now()).unwrap(),
            Advancement::RoundPending
        );
        assert_eq!(bracket.rounds.len(), 1);
    }

    #[test]
    fn test_four_players_reach_champion() {
        let mut bracket = build(4);
        assert_eq!(
            play_round(&mut bracket),
            Advancement::NextRound {
                round: 2,
                matches: 1
            }
        );
        assert_eq!(bracket.rounds[1][0].id, "r2m1");

        match play_round(&mut bracket) {
            Advancement::Champion(p) => assert_eq!(p.id, bracket.rounds[1][0].player1.id),
            other => panic!("expected champion, got {other:?}"),
        }
    }

    #[test]
    fn test_byes_join_second_round() {
        let mut bracket = build(5);
        let byes: Vec<String> = bracket
            .bye_participants
            .iter()
            .map(|p| p.id.clone())
            .collect();
        assert_eq!(byes.len(), 3);

        assert_eq!(
            play_round(&mut bracket),
            Advancement::NextRound {
                round: 2,
                matches: 2
            }
        );
        assert!(bracket.bye_participants.is_empty());

        let second: Vec<&str> = bracket.rounds[1]
            .iter()
            .flat_map(|m| [m.player1.id.as_str(), m.player2.id.as_str()])
            .collect();
        for bye in &byes {
            assert!(second.contains(&bye.as_str()));
        }
    }

    #[test]
    fn test_two_players_single_match_final() {
        let mut bracket = build(2);
        assert_eq!(bracket.total_rounds, 1);
        assert!(matches!(
            play_round(&mut bracket),
            Advancement::Champion(_)
        ));
    }

    #[test]
    fn test_refinalizing_earlier_round_is_no_change() {
        let mut bracket = build(4);
        play_round(&mut bracket);
        assert_eq!(bracket.rounds.len(), 2);

        let m = &mut bracket.rounds[0][0];
        reset_match(m).unwrap();
        let winner = m.player2.id.clone();
        admin_set_result(m, &AdminDecision::Winner(winner), Utc::now()).unwrap();

        assert_eq!(
            advance(&mut bracket, 0, Utc::now()).unwrap(),
            Advancement::NoChange
        );
        assert_eq!(bracket.rounds.len(), 2);
        assert_eq!(bracket.current_round, 2);
    }

    #[test]
    fn test_wrong_count_is_integrity_fault() {
        let mut bracket = build(4);
        // Corrupt the bracket with a stray bye
        bracket
            .bye_participants
            .push(Participant::new("ghost", "0x0", "ghost", Utc::now()));

        for i in 0..2 {
            let m = &mut bracket.rounds[0][i];
            let winner = m.player1.id.clone();
            admin_set_result(m, &AdminDecision::Winner(winner), Utc::now()).unwrap();
        }
        let err = advance(&mut bracket, 0, Utc::now()).unwrap_err();
        assert!(matches!(err, TournamentError::IntegrityFault(_)));
        assert_eq!(bracket.rounds.len(), 1);
    }

    #[test]
    fn test_lone_survivor_of_early_round_is_not_champion() {
        let mut bracket = build(5);
        // Lost byes leave a single advancing player in an 8-slot bracket
        bracket.bye_participants.clear();

        let m = &mut bracket.rounds[0][0];
        let winner = m.player1.id.clone();
        admin_set_result(m, &AdminDecision::Winner(winner), Utc::now()).unwrap();

        let err = advance(&mut bracket, 0, Utc::now()).unwrap_err();
        assert!(matches!(err, TournamentError::IntegrityFault(_)));
        assert_eq!(bracket.rounds.len(), 1);
        assert_eq!(bracket.current_round, 1);
    }
}
