//! Round robin: circle-method fixtures and the standings table.

use crate::models::{CoreError, TeamId, TournamentMatch, TournamentStanding, TournamentTeam};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Reverse;

/// Points for a win. A loss is worth nothing.
pub const POINTS_PER_WIN: u32 = 3;

/// Pairings per round, circle method.
///
/// 1. Shuffle teams for seeding; pad with a bye slot when the count is odd.
/// 2. Each round pairs slot `i` with slot `n - 1 - i`.
/// 3. Slot 0 stays fixed; the others rotate one step between rounds.
///
/// Pairings against the bye slot are dropped, so odd counts give one idle team per round.
pub fn circle_rounds<R: Rng + ?Sized>(
    teams: &[TournamentTeam],
    rng: &mut R,
) -> Vec<Vec<(TournamentTeam, TournamentTeam)>> {
    let mut slots: Vec<Option<&TournamentTeam>> = teams.iter().map(Some).collect();
    slots.shuffle(rng);
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    if n < 2 {
        return Vec::new();
    }

    let mut rounds = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let round = (0..n / 2)
            .filter_map(|i| match (slots[i], slots[n - 1 - i]) {
                (Some(a), Some(b)) => Some((a.clone(), b.clone())),
                _ => None,
            })
            .collect();
        rounds.push(round);
        slots[1..].rotate_right(1);
    }
    rounds
}

/// Every pairing exactly once, as one flat list. Round order is shuffled and not kept.
pub fn generate_fixtures<R: Rng + ?Sized>(teams: &[TournamentTeam], rng: &mut R) -> Vec<TournamentMatch> {
    let mut rounds = circle_rounds(teams, rng);
    rounds.shuffle(rng);
    rounds
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(i, (a, b))| {
            let mut m = TournamentMatch::new(Some(a), Some(b));
            m.match_number = Some(i as u32 + 1);
            m
        })
        .collect()
}

/// Empty table, one row per team in registration order.
pub fn initial_standings(teams: &[TournamentTeam]) -> Vec<TournamentStanding> {
    teams.iter().map(|t| TournamentStanding::new(t.id)).collect()
}

/// Apply one finished match to the table. `score` is `[team1, team2]`.
pub fn record_result(
    standings: &mut [TournamentStanding],
    team1: TeamId,
    team2: TeamId,
    score: [i32; 2],
    winner_id: TeamId,
) -> Result<(), CoreError> {
    if winner_id != team1 && winner_id != team2 {
        return Err(CoreError::TeamNotFound(winner_id));
    }
    for (team_id, goals_for, goals_against) in [(team1, score[0], score[1]), (team2, score[1], score[0])] {
        let row = standings
            .iter_mut()
            .find(|s| s.team_id == team_id)
            .ok_or(CoreError::TeamNotFound(team_id))?;
        row.played += 1;
        row.goals_for += goals_for;
        row.goals_against += goals_against;
        if team_id == winner_id {
            row.wins += 1;
            row.points += POINTS_PER_WIN;
        } else {
            row.losses += 1;
        }
    }
    Ok(())
}

/// Order by points, goal difference, goals for (all descending); remaining ties keep
/// the order in which teams were registered.
pub fn sort_standings(standings: &mut [TournamentStanding], teams: &[TournamentTeam]) {
    let registration = |id: TeamId| teams.iter().position(|t| t.id == id).unwrap_or(usize::MAX);
    standings.sort_by_key(|s| {
        (
            Reverse(s.points),
            Reverse(s.goal_difference()),
            Reverse(s.goals_for),
            registration(s.team_id),
        )
    });
}
