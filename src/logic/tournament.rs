//! Tournament state machine: Waiting -> TeamSetup -> InProgress -> Completed / Cancelled.

use crate::logic::{bracket, round_robin};
use crate::models::{
    CoreError, GameId, Lineup, Player, Side, TeamId, Tournament, TournamentFormat, TournamentMatch,
    TournamentMatchId, TournamentMatchStatus, TournamentMode, TournamentStatus, TournamentTeam,
    UserId, MIN_TEAMS, ROUND_ROBIN_MAX_TEAMS,
};
use chrono::{DateTime, Utc};
use rand::Rng;

/// Outcome of [`complete_tournament_match`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MatchCompletion {
    /// The result had already been recorded; nothing changed.
    pub replayed: bool,
    pub tournament_completed: bool,
    pub champion_id: Option<TeamId>,
}

fn ensure_status(t: &Tournament, status: TournamentStatus, what: &'static str) -> Result<(), CoreError> {
    if t.status != status {
        return Err(CoreError::InvalidState(what));
    }
    Ok(())
}

fn ensure_not_expired(t: &Tournament, now: DateTime<Utc>) -> Result<(), CoreError> {
    if t.is_expired(now) {
        return Err(CoreError::TournamentExpired);
    }
    Ok(())
}

/// Mutable access to a match wherever it lives (bracket rounds or the flat list).
/// Callers in bracket mode must call `sync_matches_from_bracket` afterwards.
fn match_mut(t: &mut Tournament, match_id: TournamentMatchId) -> Result<&mut TournamentMatch, CoreError> {
    let found = match t.bracket.as_mut() {
        Some(rounds) => rounds
            .iter_mut()
            .flat_map(|r| r.matches.iter_mut())
            .find(|m| m.id == match_id),
        None => t.matches.iter_mut().find(|m| m.id == match_id),
    };
    found.ok_or(CoreError::MatchNotFound(match_id))
}

/// Add a player while the tournament is open (Waiting, not expired).
pub fn join_tournament(t: &mut Tournament, player: Player, now: DateTime<Utc>) -> Result<(), CoreError> {
    ensure_status(t, TournamentStatus::Waiting, "players can only join a waiting tournament")?;
    ensure_not_expired(t, now)?;
    if t.has_player(&player.user_id) {
        return Err(CoreError::DuplicatePlayer(player.user_id));
    }
    log::debug!("{} joined tournament {}", player.username, t.id);
    t.players.push(player);
    Ok(())
}

/// Remove a player before the tournament starts. Their team (if any) loses them.
pub fn leave_tournament(t: &mut Tournament, user_id: &str) -> Result<(), CoreError> {
    if !matches!(t.status, TournamentStatus::Waiting | TournamentStatus::TeamSetup) {
        return Err(CoreError::InvalidState("players cannot leave a started tournament"));
    }
    if user_id == t.host_id {
        return Err(CoreError::InvalidState("the host cannot leave; cancel instead"));
    }
    if !t.has_player(user_id) {
        return Err(CoreError::PlayerNotFound(user_id.to_string()));
    }
    t.players.retain(|p| p.user_id != user_id);
    match t.format {
        TournamentFormat::OneVOne => t.teams.retain(|team| !team.contains(user_id)),
        TournamentFormat::TwoVTwo => {
            for team in &mut t.teams {
                team.players.retain(|p| p.user_id != user_id);
            }
        }
    }
    Ok(())
}

/// Close registration and move to team formation. 1v1 gets one team per player right away.
pub fn start_team_setup(t: &mut Tournament, now: DateTime<Utc>) -> Result<(), CoreError> {
    ensure_status(t, TournamentStatus::Waiting, "team setup starts from a waiting tournament")?;
    ensure_not_expired(t, now)?;
    let required = MIN_TEAMS * t.players_per_team();
    if t.players.len() < required {
        return Err(CoreError::NotEnoughPlayers {
            required,
            found: t.players.len(),
        });
    }
    if t.format == TournamentFormat::OneVOne {
        t.teams = t
            .players
            .iter()
            .map(|p| TournamentTeam::new(p.username.clone(), vec![p.clone()]))
            .collect();
    }
    t.status = TournamentStatus::TeamSetup;
    log::info!("Tournament {} in team setup ({} players)", t.id, t.players.len());
    Ok(())
}

/// Group unassigned players into a named 2v2 team.
pub fn create_team(t: &mut Tournament, name: &str, user_ids: &[UserId]) -> Result<TeamId, CoreError> {
    ensure_status(t, TournamentStatus::TeamSetup, "teams are formed during team setup")?;
    if t.format != TournamentFormat::TwoVTwo {
        return Err(CoreError::InvalidState("1v1 teams are formed automatically"));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::EmptyName);
    }
    let expected = t.players_per_team();
    if user_ids.len() != expected {
        return Err(CoreError::WrongTeamSize {
            expected,
            found: user_ids.len(),
        });
    }

    let mut members: Vec<Player> = Vec::with_capacity(expected);
    for id in user_ids {
        if members.iter().any(|p| &p.user_id == id) || t.team_of(id).is_some() {
            return Err(CoreError::DuplicatePlayer(id.clone()));
        }
        let player = t
            .players
            .iter()
            .find(|p| &p.user_id == id)
            .ok_or_else(|| CoreError::PlayerNotFound(id.clone()))?;
        members.push(player.clone());
    }

    let team = TournamentTeam::new(name, members);
    let id = team.id;
    t.teams.push(team);
    Ok(id)
}

/// Break a 2v2 team up again during setup.
pub fn dissolve_team(t: &mut Tournament, team_id: TeamId) -> Result<(), CoreError> {
    ensure_status(t, TournamentStatus::TeamSetup, "teams are formed during team setup")?;
    if t.format != TournamentFormat::TwoVTwo {
        return Err(CoreError::InvalidState("1v1 teams are formed automatically"));
    }
    let before = t.teams.len();
    t.teams.retain(|team| team.id != team_id);
    if t.teams.len() == before {
        return Err(CoreError::TeamNotFound(team_id));
    }
    Ok(())
}

/// Generate fixtures (round robin) or the bracket, and open play.
///
/// Only complete teams take part; incomplete ones are dropped.
pub fn start_tournament<R: Rng + ?Sized>(
    t: &mut Tournament,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    ensure_status(t, TournamentStatus::TeamSetup, "tournament can only start from team setup")?;
    ensure_not_expired(t, now)?;
    let teams: Vec<TournamentTeam> = t.complete_teams().into_iter().cloned().collect();
    if teams.len() < MIN_TEAMS {
        return Err(CoreError::NotEnoughTeams {
            required: MIN_TEAMS,
            found: teams.len(),
        });
    }
    if t.mode == TournamentMode::RoundRobin && teams.len() > ROUND_ROBIN_MAX_TEAMS {
        return Err(CoreError::TooManyTeams {
            max: ROUND_ROBIN_MAX_TEAMS,
            found: teams.len(),
        });
    }

    match t.mode {
        TournamentMode::RoundRobin => {
            t.matches = round_robin::generate_fixtures(&teams, rng);
            t.standings = Some(round_robin::initial_standings(&teams));
            t.bracket = None;
        }
        TournamentMode::Bracket => {
            t.bracket = Some(bracket::generate_bracket(&teams, rng)?);
            t.standings = None;
            t.sync_matches_from_bracket();
        }
    }
    t.teams = teams;
    t.status = TournamentStatus::InProgress;
    log::info!(
        "Tournament {} started: {:?}, {} teams, {} matches",
        t.id,
        t.mode,
        t.teams.len(),
        t.matches.len()
    );
    Ok(())
}

/// Put a ready match in play. Only one match runs at a time. Returns its two teams.
pub fn start_tournament_match(
    t: &mut Tournament,
    match_id: TournamentMatchId,
) -> Result<(TournamentTeam, TournamentTeam), CoreError> {
    ensure_status(t, TournamentStatus::InProgress, "tournament is not in progress")?;
    if t.live_match().is_some() {
        return Err(CoreError::InvalidState("another match is already in progress"));
    }
    let m = match_mut(t, match_id)?;
    if !m.is_ready() {
        return Err(CoreError::InvalidState("match is not ready to be played"));
    }
    let teams = match (&m.team1, &m.team2) {
        (Some(a), Some(b)) => (a.clone(), b.clone()),
        _ => return Err(CoreError::InvalidState("match is not ready to be played")),
    };
    m.status = TournamentMatchStatus::InProgress;
    t.sync_matches_from_bracket();
    Ok(teams)
}

/// Remember which game is being played for a match.
pub fn link_game(t: &mut Tournament, match_id: TournamentMatchId, game_id: GameId) -> Result<(), CoreError> {
    let m = match_mut(t, match_id)?;
    m.game_id = Some(game_id);
    t.sync_matches_from_bracket();
    Ok(())
}

/// Put a live match back to pending (its game was abandoned).
pub fn reset_tournament_match(t: &mut Tournament, match_id: TournamentMatchId) -> Result<(), CoreError> {
    ensure_status(t, TournamentStatus::InProgress, "tournament is not in progress")?;
    let m = match_mut(t, match_id)?;
    if m.status != TournamentMatchStatus::InProgress {
        return Err(CoreError::InvalidState("match is not in progress"));
    }
    m.status = TournamentMatchStatus::Pending;
    m.game_id = None;
    t.sync_matches_from_bracket();
    Ok(())
}

/// Record a finished game for a match and update standings or the bracket.
///
/// `score` and `winner` are in match order (`team1` first). A second delivery of the
/// same result is a no-op.
pub fn complete_tournament_match(
    t: &mut Tournament,
    match_id: TournamentMatchId,
    score: [i32; 2],
    winner: Option<Side>,
) -> Result<MatchCompletion, CoreError> {
    let m = t
        .find_match(match_id)
        .ok_or(CoreError::MatchNotFound(match_id))?;
    let team_ids = m.team_ids();
    let winner_id = winner.and_then(|side| team_ids[side.index()]);

    if m.status == TournamentMatchStatus::Completed {
        if winner_id.is_some() && m.winner_id == winner_id {
            return Ok(MatchCompletion {
                replayed: true,
                tournament_completed: t.status == TournamentStatus::Completed,
                champion_id: t.champion_id,
            });
        }
        return Err(CoreError::InvalidState("match already decided with another result"));
    }
    ensure_status(t, TournamentStatus::InProgress, "tournament is not in progress")?;
    if m.status != TournamentMatchStatus::InProgress {
        return Err(CoreError::InvalidState("match was not started"));
    }
    let winner_id = winner_id.ok_or(CoreError::DrawNotAllowed)?;
    let (team1, team2) = match team_ids {
        [Some(a), Some(b)] => (a, b),
        _ => return Err(CoreError::InvalidState("match opponents are not decided yet")),
    };

    let mut completion = MatchCompletion::default();
    match t.mode {
        TournamentMode::RoundRobin => {
            let m = match_mut(t, match_id)?;
            m.status = TournamentMatchStatus::Completed;
            m.winner_id = Some(winner_id);
            m.score = Some(score);
            let standings = t
                .standings
                .as_mut()
                .ok_or(CoreError::InvalidState("round robin has no standings"))?;
            round_robin::record_result(standings, team1, team2, score, winner_id)?;
            round_robin::sort_standings(standings, &t.teams);
            if t.matches.iter().all(TournamentMatch::is_resolved) {
                completion.champion_id = standings.first().map(|s| s.team_id);
                completion.tournament_completed = true;
            }
        }
        TournamentMode::Bracket => {
            let rounds = t
                .bracket
                .as_mut()
                .ok_or(CoreError::InvalidState("bracket tournament has no bracket"))?;
            let progress = bracket::advance_bracket(rounds, match_id, winner_id, Some(score))?;
            t.sync_matches_from_bracket();
            if let Some(champion) = progress.champion {
                completion.champion_id = Some(champion);
                completion.tournament_completed = true;
            }
        }
    }

    if completion.tournament_completed {
        t.status = TournamentStatus::Completed;
        t.champion_id = completion.champion_id;
        log::info!("Tournament {} completed", t.id);
    }
    Ok(completion)
}

/// Cancel a tournament that has not finished. Returns the game of the live match, if any.
pub fn cancel_tournament(t: &mut Tournament) -> Result<Option<GameId>, CoreError> {
    if t.status.is_terminal() {
        return Err(CoreError::InvalidState("tournament is already over"));
    }
    let live_game = t.live_match().and_then(|m| m.game_id);
    t.status = TournamentStatus::Cancelled;
    log::info!("Tournament {} cancelled", t.id);
    Ok(live_game)
}

/// Cancel a tournament that never started and is past its expiry. Returns true if it did.
pub fn expire_if_stale(t: &mut Tournament, now: DateTime<Utc>) -> bool {
    let open = matches!(t.status, TournamentStatus::Waiting | TournamentStatus::TeamSetup);
    if open && t.is_expired(now) {
        t.status = TournamentStatus::Cancelled;
        return true;
    }
    false
}
