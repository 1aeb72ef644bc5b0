//! Single elimination: bracket generation with spread-out byes, and winner advancement.

use crate::models::{
    BracketRound, CoreError, TeamId, TournamentMatch, TournamentMatchId, TournamentMatchStatus,
    TournamentTeam, MIN_TEAMS,
};
use rand::seq::SliceRandom;
use rand::Rng;

/// Smallest power of two that holds `team_count` teams.
pub fn bracket_size(team_count: usize) -> usize {
    team_count.max(2).next_power_of_two()
}

/// First-round match indices that get a bye, spread evenly across the bracket.
///
/// Slot `i` sits at the middle of the `i`-th of `byes` equal segments, so consecutive
/// byes are at least `first_round_matches / byes` apart.
pub fn bye_slots(first_round_matches: usize, byes: usize) -> Vec<usize> {
    if byes == 0 {
        return Vec::new();
    }
    (0..byes)
        .map(|i| ((2 * i + 1) * first_round_matches) / (2 * byes))
        .collect()
}

/// Display name from the number of rounds left before the final.
pub fn round_name(round_number: u32, total_rounds: u32) -> String {
    match total_rounds.saturating_sub(round_number) {
        0 => "Finale".to_string(),
        1 => "Demi-finales".to_string(),
        2 => "Quarts de finale".to_string(),
        3 => "Huitièmes de finale".to_string(),
        _ => format!("Tour {}", round_number),
    }
}

/// Outcome of [`advance_bracket`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BracketProgress {
    /// The completion had already been applied; nothing changed.
    pub replayed: bool,
    /// Set when the completed match was the final.
    pub champion: Option<TeamId>,
}

/// Build every round. Round 1 holds all teams (byes resolved immediately); later rounds
/// start as TBD except for slots filled by bye winners.
pub fn generate_bracket<R: Rng + ?Sized>(
    teams: &[TournamentTeam],
    rng: &mut R,
) -> Result<Vec<BracketRound>, CoreError> {
    if teams.len() < MIN_TEAMS {
        return Err(CoreError::NotEnoughTeams {
            required: MIN_TEAMS,
            found: teams.len(),
        });
    }
    let size = bracket_size(teams.len());
    let byes = size - teams.len();
    let first_round_matches = size / 2;
    let total_rounds = size.trailing_zeros();
    let byes_at = bye_slots(first_round_matches, byes);

    let mut seeded = teams.to_vec();
    seeded.shuffle(rng);
    let mut pool = seeded.into_iter();

    let mut first = Vec::with_capacity(first_round_matches);
    for slot in 0..first_round_matches {
        let is_bye = byes_at.contains(&slot);
        let mut m = match pool.next() {
            Some(team) if is_bye => TournamentMatch::bye(team),
            team1 => TournamentMatch::new(team1, pool.next()),
        };
        m.round = Some(1);
        m.match_number = Some(slot as u32 + 1);
        first.push(m);
    }

    let mut rounds = vec![BracketRound {
        round_number: 1,
        round_name: round_name(1, total_rounds),
        matches: first,
    }];
    for round_number in 2..=total_rounds {
        let count = size >> round_number;
        let matches = (0..count)
            .map(|i| {
                let mut m = TournamentMatch::new(None, None);
                m.round = Some(round_number);
                m.match_number = Some(i as u32 + 1);
                m
            })
            .collect();
        rounds.push(BracketRound {
            round_number,
            round_name: round_name(round_number, total_rounds),
            matches,
        });
    }

    if rounds.len() > 1 {
        let bye_winners: Vec<(usize, TournamentTeam)> = rounds[0]
            .matches
            .iter()
            .enumerate()
            .filter(|(_, m)| m.status == TournamentMatchStatus::Bye)
            .filter_map(|(i, m)| m.team1.clone().map(|t| (i, t)))
            .collect();
        for (index, team) in bye_winners {
            place_winner(&mut rounds, 1, index, team)?;
        }
    }
    log::debug!(
        "Generated bracket: {} teams, size {}, {} byes, {} rounds",
        teams.len(),
        size,
        byes,
        total_rounds
    );
    Ok(rounds)
}

fn locate(rounds: &[BracketRound], match_id: TournamentMatchId) -> Option<(usize, usize)> {
    rounds.iter().enumerate().find_map(|(ri, round)| {
        round
            .matches
            .iter()
            .position(|m| m.id == match_id)
            .map(|mi| (ri, mi))
    })
}

/// Put the winner of match `from_index` into round `next_round` (0-based):
/// match `from_index / 2`, first slot for even indices, second for odd.
fn place_winner(
    rounds: &mut [BracketRound],
    next_round: usize,
    from_index: usize,
    team: TournamentTeam,
) -> Result<(), CoreError> {
    let target = rounds
        .get_mut(next_round)
        .and_then(|r| r.matches.get_mut(from_index / 2))
        .ok_or(CoreError::InvalidState("bracket has no slot for the winner"))?;
    let slot = if from_index % 2 == 0 {
        &mut target.team1
    } else {
        &mut target.team2
    };
    match slot {
        Some(existing) if existing.id != team.id => {
            Err(CoreError::InvalidState("next-round slot already holds another team"))
        }
        _ => {
            *slot = Some(team);
            Ok(())
        }
    }
}

/// Record `winner_id` for the match and move them into the next round.
///
/// Re-delivering a completion that was already applied is a no-op (`replayed`);
/// a different winner for an already decided match is rejected.
pub fn advance_bracket(
    rounds: &mut [BracketRound],
    match_id: TournamentMatchId,
    winner_id: TeamId,
    score: Option<[i32; 2]>,
) -> Result<BracketProgress, CoreError> {
    let (ri, mi) = locate(rounds, match_id).ok_or(CoreError::MatchNotFound(match_id))?;
    let is_final = ri + 1 == rounds.len();
    let m = &mut rounds[ri].matches[mi];

    if m.is_resolved() {
        if m.winner_id == Some(winner_id) {
            return Ok(BracketProgress {
                replayed: true,
                champion: is_final.then_some(winner_id),
            });
        }
        return Err(CoreError::InvalidState("match already decided with another winner"));
    }
    if m.team1.is_none() || m.team2.is_none() {
        return Err(CoreError::InvalidState("match opponents are not decided yet"));
    }
    let winner = [&m.team1, &m.team2]
        .into_iter()
        .flatten()
        .find(|t| t.id == winner_id)
        .cloned()
        .ok_or(CoreError::TeamNotFound(winner_id))?;

    m.status = TournamentMatchStatus::Completed;
    m.winner_id = Some(winner_id);
    if score.is_some() {
        m.score = score;
    }

    if is_final {
        log::info!("Bracket final {} won by {}", match_id, winner.name);
        return Ok(BracketProgress {
            replayed: false,
            champion: Some(winner_id),
        });
    }
    place_winner(rounds, ri + 1, mi, winner)?;
    Ok(BracketProgress::default())
}
