//! Facts derived from a finished game's goal log (perfect game, comeback, per-player tallies).

use crate::logic::scoring::penalized_opponent;
use crate::models::{Game, GameId, Goal, Position, Side, Team, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-player tallies for one game.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerTally {
    /// Goal events credited to the player, midfield rolls excluded.
    pub goals: u32,
    /// Points actually added to the player's side.
    pub points: i32,
    pub gamelles: u32,
    pub midfield_rolls: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub game_id: GameId,
    pub final_score: [i32; 2],
    pub winner: Option<Side>,
    /// Winner conceded nothing.
    pub perfect_game: bool,
    /// Winner was behind at some point.
    pub remontada: bool,
    /// Largest deficit the winner recovered from.
    pub max_deficit: i32,
    pub tallies: BTreeMap<UserId, PlayerTally>,
}

/// Score after each goal, replaying the stored effects from 0-0.
pub fn score_timeline(goals: &[Goal]) -> Vec<[i32; 2]> {
    let mut score = [0i32; 2];
    goals
        .iter()
        .map(|goal| {
            score[goal.side.index()] += goal.points;
            if penalized_opponent(goal) {
                score[goal.side.opponent().index()] -= 1;
            }
            score
        })
        .collect()
}

impl MatchSummary {
    pub fn from_game(game: &Game) -> Self {
        Self::from_parts(game.id, &game.teams, &game.goals, game.winner)
    }

    /// Same as [`MatchSummary::from_game`], from the pieces handed to stat aggregation.
    pub fn from_parts(game_id: GameId, teams: &[Team; 2], goals: &[Goal], winner: Option<Side>) -> Self {
        let final_score = [teams[0].score, teams[1].score];
        let mut tallies: BTreeMap<UserId, PlayerTally> = teams
            .iter()
            .flat_map(|t| t.players.iter())
            .map(|p| (p.user_id.clone(), PlayerTally::default()))
            .collect();
        for goal in goals {
            let tally = tallies.entry(goal.scored_by.clone()).or_default();
            if goal.position == Position::Midfield {
                tally.midfield_rolls += 1;
                continue;
            }
            tally.goals += 1;
            tally.points += goal.points;
            if goal.goal_type.is_gamelle() {
                tally.gamelles += 1;
            }
        }

        let max_deficit = match winner {
            Some(w) => score_timeline(goals)
                .iter()
                .map(|s| s[w.opponent().index()] - s[w.index()])
                .max()
                .unwrap_or(0)
                .max(0),
            None => 0,
        };
        let perfect_game = match winner {
            Some(w) => !goals.is_empty() && final_score[w.opponent().index()] <= 0,
            None => false,
        };

        Self {
            game_id,
            final_score,
            winner,
            perfect_game,
            remontada: max_deficit > 0,
            max_deficit,
            tallies,
        }
    }
}
