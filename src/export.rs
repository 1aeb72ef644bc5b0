//! CSV exports: round-robin standings and a game's goal log.

use crate::models::{Game, Tournament};
use std::io::Write;

/// Standings table (round robin), best team first. Empty body for bracket tournaments.
pub fn write_standings_csv<W: Write>(tournament: &Tournament, out: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "rank", "team", "played", "wins", "losses", "goals_for", "goals_against", "goal_diff", "points",
    ])?;
    for (rank, row) in tournament.standings.iter().flatten().enumerate() {
        let team = tournament
            .team(row.team_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| row.team_id.to_string());
        wtr.write_record([
            (rank + 1).to_string(),
            team,
            row.played.to_string(),
            row.wins.to_string(),
            row.losses.to_string(),
            row.goals_for.to_string(),
            row.goals_against.to_string(),
            row.goal_difference().to_string(),
            row.points.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// One line per goal, with the running score after it.
pub fn write_goals_csv<W: Write>(game: &Game, out: W) -> Result<(), csv::Error> {
    let timeline = crate::logic::summary::score_timeline(&game.goals);
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "timestamp", "team", "scorer", "position", "type", "points", "multiplier_before", "score_1", "score_2",
    ])?;
    for (goal, score) in game.goals.iter().zip(timeline) {
        wtr.write_record([
            goal.timestamp.to_rfc3339(),
            goal.side.index().to_string(),
            goal.scorer_name.clone(),
            goal.position.as_str().to_string(),
            goal.goal_type.as_str().to_string(),
            goal.points.to_string(),
            goal.previous_multiplier.to_string(),
            score[0].to_string(),
            score[1].to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Standings as a CSV string.
pub fn standings_csv(tournament: &Tournament) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_standings_csv(tournament, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Goal log as a CSV string.
pub fn goals_csv(game: &Game) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_goals_csv(game, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
