/// Property-based tests for bracket construction and advancement
///
/// These tests verify the elimination arithmetic across participant counts
/// and random seedings.
use arena::{
    bracket::{
        Advancement, AdminDecision, BracketBuilder, admin_set_result, advance, bracket_size,
        models::Bracket,
    },
    tournament::Participant,
};
use chrono::Utc;
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use std::collections::HashSet;

fn participants(n: usize) -> Vec<Participant> {
    (0..n)
        .map(|i| {
            let id = format!("p{i}");
            Participant::new(&id, &format!("0x{i:04x}"), &id, Utc::now())
        })
        .collect()
}

fn build(n: usize, seed: u64) -> Bracket {
    BracketBuilder::with_rng(StdRng::seed_from_u64(seed))
        .build(&participants(n), Utc::now())
        .unwrap()
}

/// Decide every match of the latest round (player1 or player2 by `picks`)
/// until a champion emerges
fn play_out(bracket: &mut Bracket, picks: &[bool]) -> Participant {
    let mut pick = picks.iter().cycle();
    loop {
        let round_index = bracket.current_round as usize - 1;
        let mut last = Advancement::RoundPending;
        for i in 0..bracket.rounds[round_index].len() {
            let m = &mut bracket.rounds[round_index][i];
            let winner = if *pick.next().unwrap_or(&true) {
                m.player1.id.clone()
            } else {
                m.player2.id.clone()
            };
            admin_set_result(m, &AdminDecision::Winner(winner), Utc::now()).unwrap();
            last = advance(bracket, round_index, Utc::now()).unwrap();
        }
        if let Advancement::Champion(champion) = last {
            return champion;
        }
    }
}

proptest! {
    #[test]
    fn test_size_and_byes(n in 2usize..=64, seed in any::<u64>()) {
        let bracket = build(n, seed);
        let size = bracket_size(n) as usize;

        prop_assert!(size.is_power_of_two());
        prop_assert!(size >= n && size < 2 * n);
        prop_assert_eq!(bracket.size as usize, size);
        prop_assert_eq!(bracket.bye_participants.len(), size - n);
        prop_assert_eq!(bracket.rounds[0].len(), (n - (size - n)) / 2);
        prop_assert_eq!(bracket.total_rounds, size.trailing_zeros());
        prop_assert_eq!(bracket.current_round, 1);
    }

    #[test]
    fn test_every_participant_placed_once(n in 2usize..=64, seed in any::<u64>()) {
        let bracket = build(n, seed);
        let mut seen = HashSet::new();

        for m in &bracket.rounds[0] {
            prop_assert!(seen.insert(m.player1.id.clone()));
            prop_assert!(seen.insert(m.player2.id.clone()));
        }
        for bye in &bracket.bye_participants {
            prop_assert!(seen.insert(bye.id.clone()), "bye {} also plays round 0", bye.id);
        }
        prop_assert_eq!(seen.len(), n);
    }

    #[test]
    fn test_full_bracket_has_one_match_per_elimination(
        n in 2usize..=40,
        seed in any::<u64>(),
        picks in prop::collection::vec(any::<bool>(), 1..16),
    ) {
        let mut bracket = build(n, seed);
        let byes: HashSet<String> = bracket.bye_participants.iter().map(|p| p.id.clone()).collect();

        let champion = play_out(&mut bracket, &picks);

        // Byes never produce a match, so n - 1 eliminations take n - 1 matches
        prop_assert_eq!(bracket.total_matches(), n - 1);
        prop_assert!(bracket.total_matches() <= bracket.size as usize - 1);
        prop_assert_eq!(bracket.completed_matches(), bracket.total_matches());
        prop_assert_eq!(bracket.rounds.len() as u32, bracket.total_rounds);
        prop_assert!(bracket.bye_participants.is_empty());
        prop_assert!(participants(n).iter().any(|p| p.id == champion.id));

        // Byes first play in round index 1
        if bracket.rounds.len() > 1 {
            for bye in &byes {
                prop_assert!(bracket.rounds[1].iter().any(|m| m.involves(bye)));
            }
        }

        // Each round halves the field and nobody plays twice in a round
        for (r, round) in bracket.rounds.iter().enumerate() {
            let mut in_round = HashSet::new();
            for m in round {
                prop_assert!(in_round.insert(m.player1.id.clone()));
                prop_assert!(in_round.insert(m.player2.id.clone()));
            }
            if r > 0 {
                prop_assert_eq!(round.len(), bracket.size as usize >> (r + 1));
            }
        }
    }
}
