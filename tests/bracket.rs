//! Integration tests for single-elimination brackets: byes, round names, advancement.

use foosball_scorer::logic::bracket::{bracket_size, bye_slots, round_name};
use foosball_scorer::{
    advance_bracket, generate_bracket, BracketRound, CoreError, Player, TeamId,
    TournamentMatchStatus, TournamentTeam,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn teams(n: usize) -> Vec<TournamentTeam> {
    (0..n)
        .map(|i| TournamentTeam::new(format!("T{i}"), vec![Player::new(format!("u{i}"), format!("P{i}"))]))
        .collect()
}

fn bracket(n: usize, seed: u64) -> Vec<BracketRound> {
    generate_bracket(&teams(n), &mut StdRng::seed_from_u64(seed)).unwrap()
}

/// Complete every playable match of a round, team1 always winning.
fn play_round(rounds: &mut [BracketRound], index: usize) {
    let ready: Vec<(uuid::Uuid, TeamId)> = rounds[index]
        .matches
        .iter()
        .filter(|m| m.is_ready())
        .map(|m| (m.id, m.team1.as_ref().unwrap().id))
        .collect();
    for (match_id, winner) in ready {
        advance_bracket(rounds, match_id, winner, Some([6, 2])).unwrap();
    }
}

#[test]
fn five_teams_three_byes_three_rounds() {
    let rounds = bracket(5, 11);
    assert_eq!(bracket_size(5), 8);
    assert_eq!(rounds.len(), 3);

    let first = &rounds[0];
    assert_eq!(first.matches.len(), 4);
    let byes: Vec<_> = first
        .matches
        .iter()
        .filter(|m| m.status == TournamentMatchStatus::Bye)
        .collect();
    assert_eq!(byes.len(), 3);
    for m in &byes {
        assert!(m.team2.is_none());
        assert_eq!(m.winner_id, m.team1.as_ref().map(|t| t.id));
    }

    assert_eq!(rounds[1].round_name, "Demi-finales");
    assert_eq!(rounds[1].matches.len(), 2);
    assert_eq!(rounds[2].round_name, "Finale");
    assert_eq!(rounds[2].matches.len(), 1);

    // Three bye winners already seated in the semi-finals, one slot waits for the real match.
    let seated = rounds[1]
        .matches
        .iter()
        .flat_map(|m| [&m.team1, &m.team2])
        .filter(|slot| slot.is_some())
        .count();
    assert_eq!(seated, 3);
}

#[test]
fn bye_count_and_team_placement_for_all_sizes() {
    for n in 2..=16 {
        let rounds = bracket(n, n as u64);
        let size = bracket_size(n);
        let first = &rounds[0];
        assert_eq!(first.matches.len(), size / 2);
        let byes = first
            .matches
            .iter()
            .filter(|m| m.status == TournamentMatchStatus::Bye)
            .count();
        assert_eq!(byes, size - n, "{} teams", n);

        let mut placed = HashSet::new();
        for m in &first.matches {
            for id in m.team_ids().into_iter().flatten() {
                assert!(placed.insert(id), "{} teams: team placed twice", n);
            }
        }
        assert_eq!(placed.len(), n);
        assert_eq!(rounds.last().unwrap().matches.len(), 1);
        assert_eq!(rounds.last().unwrap().round_name, "Finale");
    }
}

#[test]
fn byes_spread_over_both_halves() {
    assert_eq!(bye_slots(4, 2), vec![1, 3]);
    assert_eq!(bye_slots(4, 3), vec![0, 2, 3]);
    assert_eq!(bye_slots(8, 1), vec![4]);
    assert!(bye_slots(8, 0).is_empty());
    let slots = bye_slots(8, 4);
    assert_eq!(slots, vec![1, 3, 5, 7]);
}

#[test]
fn round_names_count_from_the_final() {
    assert_eq!(round_name(5, 5), "Finale");
    assert_eq!(round_name(4, 5), "Demi-finales");
    assert_eq!(round_name(3, 5), "Quarts de finale");
    assert_eq!(round_name(2, 5), "Huitièmes de finale");
    assert_eq!(round_name(1, 5), "Tour 1");
    assert_eq!(round_name(1, 1), "Finale");
}

#[test]
fn two_teams_play_only_the_final() {
    let rounds = bracket(2, 5);
    assert_eq!(rounds.len(), 1);
    assert_eq!(rounds[0].round_name, "Finale");
    assert!(rounds[0].matches[0].is_ready());
}

#[test]
fn one_team_is_not_enough() {
    let err = generate_bracket(&teams(1), &mut StdRng::seed_from_u64(0)).unwrap_err();
    assert_eq!(err, CoreError::NotEnoughTeams { required: 2, found: 1 });
}

#[test]
fn completing_a_round_fills_the_next() {
    let mut rounds = bracket(8, 21);
    for r in 0..rounds.len() - 1 {
        let matches_in_round = rounds[r].matches.len();
        play_round(&mut rounds, r);
        let filled = rounds[r + 1]
            .matches
            .iter()
            .filter(|m| m.team1.is_some() && m.team2.is_some())
            .count();
        assert_eq!(filled, (matches_in_round + 1) / 2);
        assert!(rounds[r].matches.iter().all(|m| m.is_resolved()));
    }
}

#[test]
fn winner_lands_in_slot_by_index_parity() {
    let mut rounds = bracket(8, 4);
    let second = &rounds[0].matches[1];
    let (second_id, second_winner) = (second.id, second.team2.as_ref().unwrap().id);
    advance_bracket(&mut rounds, second_id, second_winner, None).unwrap();
    let target = &rounds[1].matches[0];
    assert!(target.team1.is_none());
    assert_eq!(target.team2.as_ref().map(|t| t.id), Some(second_winner));

    let third = &rounds[0].matches[2];
    let (third_id, third_winner) = (third.id, third.team1.as_ref().unwrap().id);
    advance_bracket(&mut rounds, third_id, third_winner, None).unwrap();
    assert_eq!(rounds[1].matches[1].team1.as_ref().map(|t| t.id), Some(third_winner));
}

#[test]
fn final_completion_names_champion() {
    let mut rounds = bracket(5, 8);
    play_round(&mut rounds, 0);
    play_round(&mut rounds, 1);
    let final_match = &rounds[2].matches[0];
    assert!(final_match.is_ready());
    let (final_id, champion) = (final_match.id, final_match.team2.as_ref().unwrap().id);
    let progress = advance_bracket(&mut rounds, final_id, champion, Some([4, 6])).unwrap();
    assert_eq!(progress.champion, Some(champion));
    assert!(!progress.replayed);
    assert_eq!(rounds[2].matches[0].score, Some([4, 6]));
}

#[test]
fn replayed_completion_is_a_noop() {
    let mut rounds = bracket(4, 2);
    let m = &rounds[0].matches[0];
    let (match_id, winner, loser) = (m.id, m.team1.as_ref().unwrap().id, m.team2.as_ref().unwrap().id);

    advance_bracket(&mut rounds, match_id, winner, Some([6, 1])).unwrap();
    let snapshot = rounds.clone();
    let again = advance_bracket(&mut rounds, match_id, winner, Some([6, 1])).unwrap();
    assert!(again.replayed);
    assert_eq!(rounds, snapshot);

    assert!(matches!(
        advance_bracket(&mut rounds, match_id, loser, None),
        Err(CoreError::InvalidState(_))
    ));
}

#[test]
fn advancement_rejects_unknown_or_undecided() {
    let mut rounds = bracket(4, 3);
    let m = &rounds[0].matches[0];
    let match_id = m.id;
    let outsider = TournamentTeam::new("Nobody", Vec::new()).id;
    assert_eq!(
        advance_bracket(&mut rounds, match_id, outsider, None).unwrap_err(),
        CoreError::TeamNotFound(outsider)
    );
    let final_id = rounds[1].matches[0].id;
    assert!(matches!(
        advance_bracket(&mut rounds, final_id, outsider, None),
        Err(CoreError::InvalidState(_))
    ));
    let unknown = uuid::Uuid::new_v4();
    assert_eq!(
        advance_bracket(&mut rounds, unknown, outsider, None).unwrap_err(),
        CoreError::MatchNotFound(unknown)
    );
}
