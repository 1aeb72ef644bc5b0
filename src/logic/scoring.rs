//! Live scoring: effect of a goal on a game, single-level undo, forfeit and manual end.
//!
//! Every function here is pure: it takes the current game and returns the next one.

use crate::models::{CoreError, Game, GameStatus, Goal, GoalType, Lineup, Position, Side, UserId};
use chrono::{DateTime, Utc};

/// What a goal does to the score and multiplier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GoalEffect {
    pub scorer_points: i32,
    pub opponent_delta: i32,
    pub next_multiplier: u32,
}

/// Scoring rule table, for current multiplier `multiplier`.
///
/// | input                 | scorer | opponent | next multiplier |
/// |-----------------------|--------|----------|-----------------|
/// | midfield (any type)   | 0      | 0        | M + 1           |
/// | normal                | M      | 0        | 1               |
/// | gamelle               | 0      | -1       | M               |
/// | gamelle rentrante     | 1      | -1       | M               |
pub fn goal_effect(multiplier: u32, position: Position, goal_type: GoalType) -> GoalEffect {
    let m = multiplier.max(1);
    if position == Position::Midfield {
        return GoalEffect {
            scorer_points: 0,
            opponent_delta: 0,
            next_multiplier: m + 1,
        };
    }
    match goal_type {
        GoalType::Normal => GoalEffect {
            scorer_points: m as i32,
            opponent_delta: 0,
            next_multiplier: 1,
        },
        GoalType::Gamelle => GoalEffect {
            scorer_points: 0,
            opponent_delta: -1,
            next_multiplier: m,
        },
        GoalType::GamelleRentrante => GoalEffect {
            scorer_points: 1,
            opponent_delta: -1,
            next_multiplier: m,
        },
    }
}

/// True when the recorded goal took a point off the opponent.
pub fn penalized_opponent(goal: &Goal) -> bool {
    goal.position != Position::Midfield && goal.goal_type.is_gamelle()
}

/// A goal as submitted by the scorekeeper.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GoalInput {
    pub side: Side,
    pub scorer_id: UserId,
    pub position: Position,
    pub goal_type: GoalType,
}

/// Result of [`apply_goal`].
#[derive(Clone, Debug)]
pub struct ScoredGoal {
    pub game: Game,
    pub goal: Goal,
    /// The goal brought the scoring side to the target and completed the game.
    pub won: bool,
}

fn ensure_in_progress(game: &Game) -> Result<(), CoreError> {
    if game.status != GameStatus::InProgress {
        return Err(CoreError::InvalidState("game is not in progress"));
    }
    Ok(())
}

/// Mark the game completed at `now` with the given winner (None = draw).
fn complete(game: &mut Game, winner: Option<Side>, now: DateTime<Utc>) {
    game.status = GameStatus::Completed;
    game.winner = winner;
    game.ended_at = Some(now);
    game.duration_secs = Some((now - game.started_at).num_seconds().max(0));
}

/// Record a goal. The opponent score is not floored: a gamelle against a side at 0 leaves it at -1.
pub fn apply_goal(game: &Game, input: &GoalInput, now: DateTime<Utc>) -> Result<ScoredGoal, CoreError> {
    ensure_in_progress(game)?;
    let side = input.side;
    let scorer = game
        .team(side)
        .find_player(&input.scorer_id)
        .ok_or_else(|| CoreError::ScorerNotOnSide(input.scorer_id.clone()))?;

    let previous_multiplier = game.multiplier.max(1);
    let effect = goal_effect(previous_multiplier, input.position, input.goal_type);

    let goal = Goal {
        id: format!("{}-{}", now.timestamp_millis(), game.goals.len()),
        timestamp: now,
        goal_type: input.goal_type,
        position: input.position,
        scored_by: scorer.user_id.clone(),
        scorer_name: scorer.username.clone(),
        side,
        points: effect.scorer_points,
        previous_multiplier,
    };

    let mut next = game.clone();
    next.set_score(side, game.score_of(side) + effect.scorer_points);
    if effect.opponent_delta != 0 {
        let opponent = side.opponent();
        next.set_score(opponent, game.score_of(opponent) + effect.opponent_delta);
    }
    next.multiplier = effect.next_multiplier;
    next.goals.push(goal.clone());

    let won = next.score_of(side) >= next.target();
    if won {
        complete(&mut next, Some(side), now);
    }
    Ok(ScoredGoal {
        game: next,
        goal,
        won,
    })
}

/// Reverse the most recent goal. No-op on an empty goal log.
///
/// Replays the stored effect rather than the rule table. The scorer's points come off as
/// recorded; the point given back to a gamelle's victim is floored at 0.
pub fn undo_last_goal(game: &Game) -> Result<Game, CoreError> {
    ensure_in_progress(game)?;
    let mut next = game.clone();
    let Some(goal) = next.goals.pop() else {
        return Ok(next);
    };
    let side = goal.side;
    next.set_score(side, next.score_of(side) - goal.points);
    if penalized_opponent(&goal) {
        let opponent = side.opponent();
        next.set_score(opponent, (next.score_of(opponent) + 1).max(0));
    }
    next.multiplier = goal.previous_multiplier.max(1);
    Ok(next)
}

/// Concede the game: the other side is put straight on the target score. No goal is logged.
pub fn forfeit(game: &Game, forfeiting: Side, now: DateTime<Utc>) -> Result<Game, CoreError> {
    ensure_in_progress(game)?;
    let winner = forfeiting.opponent();
    let mut next = game.clone();
    next.set_score(winner, next.target());
    complete(&mut next, Some(winner), now);
    Ok(next)
}

/// End the game on the current score. Equal scores end in a draw.
pub fn end_game(game: &Game, now: DateTime<Utc>) -> Result<Game, CoreError> {
    ensure_in_progress(game)?;
    let (one, two) = (game.score_of(Side::One), game.score_of(Side::Two));
    let winner = match one.cmp(&two) {
        std::cmp::Ordering::Greater => Some(Side::One),
        std::cmp::Ordering::Less => Some(Side::Two),
        std::cmp::Ordering::Equal => None,
    };
    let mut next = game.clone();
    complete(&mut next, winner, now);
    Ok(next)
}

/// Cancel the game. It is kept but never counted.
pub fn abandon(game: &Game, now: DateTime<Utc>) -> Result<Game, CoreError> {
    ensure_in_progress(game)?;
    let mut next = game.clone();
    next.status = GameStatus::Abandoned;
    next.ended_at = Some(now);
    next.duration_secs = Some((now - game.started_at).num_seconds().max(0));
    Ok(next)
}
