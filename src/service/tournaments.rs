//! Tournament lifecycle with persistence. Starting a tournament match opens its game.

use crate::logic::tournament::{self as flow, MatchCompletion};
use crate::models::{
    CoreError, Game, GameType, Player, TeamId, Tournament, TournamentFormat, TournamentId,
    TournamentLink, TournamentMatchId, TournamentMatchStatus, TournamentMode, TournamentStatus,
    UserId,
};
use crate::service::matches::{MatchLifecycle, NewGame};
use crate::store::Repository;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Request to open a tournament.
#[derive(Clone, Debug)]
pub struct NewTournament {
    pub name: String,
    pub host: Player,
    pub format: TournamentFormat,
    pub mode: TournamentMode,
    pub target: GameType,
    pub venue_id: Option<String>,
}

pub struct TournamentLifecycle {
    tournaments: Arc<dyn Repository<Tournament>>,
    matches: Arc<MatchLifecycle>,
    ttl: Duration,
    rng: Mutex<StdRng>,
}

impl TournamentLifecycle {
    pub fn new(tournaments: Arc<dyn Repository<Tournament>>, matches: Arc<MatchLifecycle>, ttl: Duration) -> Self {
        Self {
            tournaments,
            matches,
            ttl,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Use a fixed random source for seeding fixtures and brackets.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Load, apply `f`, save. Nothing is written when `f` fails.
    fn update<T>(
        &self,
        id: TournamentId,
        f: impl FnOnce(&mut Tournament) -> Result<T, CoreError>,
    ) -> Result<(Tournament, T), CoreError> {
        let mut t = self.tournaments.load(id)?;
        let out = f(&mut t)?;
        let t = self.tournaments.save(t)?;
        Ok((t, out))
    }

    pub fn create(&self, new: NewTournament, now: DateTime<Utc>) -> Result<Tournament, CoreError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(CoreError::EmptyName);
        }
        let mut t = Tournament::new(name, new.host, new.format, new.mode, new.target, now, self.ttl);
        t.venue_id = new.venue_id;
        let t = self.tournaments.save(t)?;
        log::info!("Tournament {} created ({:?}, {:?})", t.id, t.format, t.mode);
        Ok(t)
    }

    pub fn get(&self, id: TournamentId) -> Result<Tournament, CoreError> {
        self.tournaments.load(id)
    }

    pub fn subscribe(&self, id: TournamentId) -> Result<watch::Receiver<Tournament>, CoreError> {
        self.tournaments.subscribe(id)
    }

    pub fn join(&self, id: TournamentId, player: Player, now: DateTime<Utc>) -> Result<Tournament, CoreError> {
        self.update(id, |t| flow::join_tournament(t, player, now)).map(|(t, _)| t)
    }

    pub fn leave(&self, id: TournamentId, user_id: &str) -> Result<Tournament, CoreError> {
        self.update(id, |t| flow::leave_tournament(t, user_id)).map(|(t, _)| t)
    }

    pub fn start_team_setup(&self, id: TournamentId, now: DateTime<Utc>) -> Result<Tournament, CoreError> {
        self.update(id, |t| flow::start_team_setup(t, now)).map(|(t, _)| t)
    }

    pub fn create_team(
        &self,
        id: TournamentId,
        name: &str,
        user_ids: &[UserId],
    ) -> Result<(Tournament, TeamId), CoreError> {
        self.update(id, |t| flow::create_team(t, name, user_ids))
    }

    pub fn dissolve_team(&self, id: TournamentId, team_id: TeamId) -> Result<Tournament, CoreError> {
        self.update(id, |t| flow::dissolve_team(t, team_id)).map(|(t, _)| t)
    }

    pub fn start(&self, id: TournamentId, now: DateTime<Utc>) -> Result<Tournament, CoreError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.update(id, |t| flow::start_tournament(t, &mut *rng, now))
            .map(|(t, _)| t)
    }

    /// Put a match in play and open the game for it (team1 plays side one).
    pub fn start_match(
        &self,
        id: TournamentId,
        match_id: TournamentMatchId,
        now: DateTime<Utc>,
    ) -> Result<(Tournament, Game), CoreError> {
        let mut t = self.tournaments.load(id)?;
        let (team1, team2) = flow::start_tournament_match(&mut t, match_id)?;
        let game = self.matches.create_game(
            NewGame {
                host_id: t.host_id.clone(),
                game_type: t.target,
                venue_id: t.venue_id.clone(),
                sides: [team1.players, team2.players],
                tournament: Some(TournamentLink {
                    tournament_id: id,
                    match_id,
                }),
            },
            now,
        )?;
        flow::link_game(&mut t, match_id, game.id)?;
        match self.tournaments.save(t) {
            Ok(t) => {
                log::info!("Tournament {}: match {} started as game {}", id, match_id, game.id);
                Ok((t, game))
            }
            Err(e) => {
                if let Err(abandon_err) = self.matches.abandon(game.id, now) {
                    log::warn!("Could not abandon orphan game {}: {}", game.id, abandon_err);
                }
                Err(e)
            }
        }
    }

    /// Feed a completed game back into its tournament. Returns None for friendly games.
    pub fn on_game_completed(&self, game: &Game) -> Result<Option<MatchCompletion>, CoreError> {
        let Some(link) = game.tournament else {
            return Ok(None);
        };
        let (_, completion) = self.update(link.tournament_id, |t| {
            flow::complete_tournament_match(t, link.match_id, game.score, game.winner)
        })?;
        if completion.replayed {
            log::debug!("Tournament match {} result already recorded", link.match_id);
        }
        Ok(Some(completion))
    }

    /// An abandoned game frees its tournament match to be started again. Nothing happens
    /// when the match has already moved on from that game.
    pub fn on_game_abandoned(&self, game: &Game) -> Result<(), CoreError> {
        let Some(link) = game.tournament else {
            return Ok(());
        };
        let t = self.tournaments.load(link.tournament_id)?;
        let still_live = t.find_match(link.match_id).is_some_and(|m| {
            m.status == TournamentMatchStatus::InProgress && m.game_id == Some(game.id)
        });
        if !still_live || t.status != TournamentStatus::InProgress {
            return Ok(());
        }
        self.update(link.tournament_id, |t| flow::reset_tournament_match(t, link.match_id))
            .map(|_| ())
    }

    /// Cancel the tournament and abandon the game being played, if any.
    pub fn cancel(&self, id: TournamentId, now: DateTime<Utc>) -> Result<Tournament, CoreError> {
        let (t, live_game) = self.update(id, flow::cancel_tournament)?;
        if let Some(game_id) = live_game {
            if let Err(e) = self.matches.abandon(game_id, now) {
                log::warn!("Could not abandon game {} of cancelled tournament: {}", game_id, e);
            }
        }
        Ok(t)
    }

    /// Cancel every open tournament past its expiry. Returns how many were cancelled.
    pub fn expire_stale(&self, now: DateTime<Utc>) -> usize {
        let mut expired = 0;
        for mut t in self.tournaments.list() {
            if flow::expire_if_stale(&mut t, now) {
                match self.tournaments.save(t) {
                    Ok(_) => expired += 1,
                    Err(e) => log::warn!("Could not expire tournament: {}", e),
                }
            }
        }
        expired
    }
}
