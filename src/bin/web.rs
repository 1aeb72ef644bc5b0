//! Single binary JSON API over the clubhouse: live games, tournaments, player stats.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, TOURNAMENT_TTL_HOURS (default 24), RUST_LOG.

use actix_web::{
    delete, get, post,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::Utc;
use foosball_scorer::{
    export, Clubhouse, CoreError, ErrorKind, GameId, GameType, GoalInput, GoalType, NewGame,
    NewTournament, Player, Position, Side, TeamId, TournamentFormat, TournamentId,
    TournamentMatchId, TournamentMode, UserId,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

type AppState = Data<Clubhouse>;

/// How often open tournaments are checked for expiry.
const EXPIRY_SWEEP: Duration = Duration::from_secs(30 * 60);

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateGameBody {
    host_id: UserId,
    #[serde(default)]
    game_type: GameType,
    #[serde(default)]
    venue_id: Option<String>,
    teams: [Vec<Player>; 2],
}

#[derive(Deserialize)]
struct GoalBody {
    team_index: Side,
    scorer_id: UserId,
    #[serde(default)]
    position: Position,
    #[serde(rename = "type", default)]
    goal_type: GoalType,
    /// Version the scorekeeper last saw; rejected with 409 if stale.
    #[serde(default)]
    expected_version: Option<u64>,
}

#[derive(Deserialize, Default)]
struct VersionBody {
    #[serde(default)]
    expected_version: Option<u64>,
}

#[derive(Deserialize)]
struct ForfeitBody {
    team_index: Side,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    host: Player,
    #[serde(default)]
    format: TournamentFormat,
    #[serde(default)]
    mode: TournamentMode,
    #[serde(default)]
    target_score: GameType,
    #[serde(default)]
    venue_id: Option<String>,
}

#[derive(Deserialize)]
struct CreateTeamBody {
    name: String,
    user_ids: Vec<UserId>,
}

#[derive(Deserialize)]
struct GamePath {
    id: GameId,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct TournamentPlayerPath {
    id: TournamentId,
    user_id: UserId,
}

#[derive(Deserialize)]
struct TournamentTeamPath {
    id: TournamentId,
    team_id: TeamId,
}

#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: TournamentMatchId,
}

#[derive(Deserialize)]
struct PlayerPath {
    user_id: UserId,
}

#[derive(Deserialize)]
struct HeadToHeadPath {
    user_id: UserId,
    other_id: UserId,
}

fn error_response(e: CoreError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e.kind() {
        ErrorKind::NotFound => HttpResponse::NotFound().json(body),
        ErrorKind::InvalidState | ErrorKind::ConcurrencyHazard => HttpResponse::Conflict().json(body),
        ErrorKind::Validation => HttpResponse::BadRequest().json(body),
    }
}

fn respond<T: Serialize>(result: Result<T, CoreError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(e),
    }
}

fn csv_response(result: Result<String, csv::Error>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().content_type("text/csv; charset=utf-8").body(body),
        Err(e) => {
            log::error!("CSV export failed: {}", e);
            HttpResponse::InternalServerError().body("export error")
        }
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "foosball-scorer",
    })
}

/// Open a friendly game.
#[post("/api/games")]
async fn api_create_game(state: AppState, body: Json<CreateGameBody>) -> HttpResponse {
    let body = body.into_inner();
    respond(state.games.create_game(
        NewGame {
            host_id: body.host_id,
            game_type: body.game_type,
            venue_id: body.venue_id,
            sides: body.teams,
            tournament: None,
        },
        Utc::now(),
    ))
}

#[get("/api/games/{id}")]
async fn api_get_game(state: AppState, path: Path<GamePath>) -> HttpResponse {
    respond(state.games.get(path.id))
}

#[get("/api/games/{id}/summary")]
async fn api_game_summary(state: AppState, path: Path<GamePath>) -> HttpResponse {
    respond(state.games.summary(path.id))
}

/// Re-deliver a finished game to its tournament.
#[post("/api/games/{id}/sync")]
async fn api_sync_game(state: AppState, path: Path<GamePath>) -> HttpResponse {
    respond(state.sync_game(path.id))
}

/// Goal log as CSV.
#[get("/api/games/{id}/goals.csv")]
async fn api_game_goals_csv(state: AppState, path: Path<GamePath>) -> HttpResponse {
    match state.games.get(path.id) {
        Ok(game) => csv_response(export::goals_csv(&game)),
        Err(e) => error_response(e),
    }
}

#[post("/api/games/{id}/goals")]
async fn api_record_goal(state: AppState, path: Path<GamePath>, body: Json<GoalBody>) -> HttpResponse {
    let body = body.into_inner();
    let input = GoalInput {
        side: body.team_index,
        scorer_id: body.scorer_id,
        position: body.position,
        goal_type: body.goal_type,
    };
    respond(
        state
            .record_goal(path.id, &input, body.expected_version, Utc::now())
            .map(|r| r.game),
    )
}

#[delete("/api/games/{id}/goals/last")]
async fn api_undo_goal(state: AppState, path: Path<GamePath>, body: Option<Json<VersionBody>>) -> HttpResponse {
    let expected = body.map(|b| b.into_inner()).unwrap_or_default().expected_version;
    respond(state.undo_last_goal(path.id, expected))
}

/// End on the current score (winner by comparison, draw if equal).
#[post("/api/games/{id}/end")]
async fn api_end_game(state: AppState, path: Path<GamePath>) -> HttpResponse {
    respond(state.end_game(path.id, Utc::now()).map(|u| u.game))
}

#[post("/api/games/{id}/forfeit")]
async fn api_forfeit_game(state: AppState, path: Path<GamePath>, body: Json<ForfeitBody>) -> HttpResponse {
    respond(state.forfeit(path.id, body.team_index, Utc::now()).map(|u| u.game))
}

#[post("/api/games/{id}/abandon")]
async fn api_abandon_game(state: AppState, path: Path<GamePath>) -> HttpResponse {
    respond(state.abandon(path.id, Utc::now()))
}

#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    respond(state.tournaments.create(
        NewTournament {
            name: body.name,
            host: body.host,
            format: body.format,
            mode: body.mode,
            target: body.target_score,
            venue_id: body.venue_id,
        },
        Utc::now(),
    ))
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.tournaments.get(path.id))
}

/// Join a waiting tournament.
#[post("/api/tournaments/{id}/players")]
async fn api_join_tournament(state: AppState, path: Path<TournamentPath>, body: Json<Player>) -> HttpResponse {
    respond(state.tournaments.join(path.id, body.into_inner(), Utc::now()))
}

#[delete("/api/tournaments/{id}/players/{user_id}")]
async fn api_leave_tournament(state: AppState, path: Path<TournamentPlayerPath>) -> HttpResponse {
    respond(state.tournaments.leave(path.id, &path.user_id))
}

/// Waiting -> TeamSetup.
#[post("/api/tournaments/{id}/team-setup")]
async fn api_start_team_setup(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.tournaments.start_team_setup(path.id, Utc::now()))
}

#[post("/api/tournaments/{id}/teams")]
async fn api_create_team(state: AppState, path: Path<TournamentPath>, body: Json<CreateTeamBody>) -> HttpResponse {
    respond(
        state
            .tournaments
            .create_team(path.id, &body.name, &body.user_ids)
            .map(|(t, _)| t),
    )
}

#[delete("/api/tournaments/{id}/teams/{team_id}")]
async fn api_dissolve_team(state: AppState, path: Path<TournamentTeamPath>) -> HttpResponse {
    respond(state.tournaments.dissolve_team(path.id, path.team_id))
}

/// TeamSetup -> InProgress (fixtures or bracket generated).
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.tournaments.start(path.id, Utc::now()))
}

/// Start one tournament match; returns the game opened for it.
#[post("/api/tournaments/{id}/matches/{match_id}/start")]
async fn api_start_tournament_match(state: AppState, path: Path<TournamentMatchPath>) -> HttpResponse {
    respond(
        state
            .tournaments
            .start_match(path.id, path.match_id, Utc::now())
            .map(|(_, game)| game),
    )
}

#[post("/api/tournaments/{id}/cancel")]
async fn api_cancel_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.tournaments.cancel(path.id, Utc::now()))
}

#[get("/api/tournaments/{id}/standings.csv")]
async fn api_standings_csv(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.tournaments.get(path.id) {
        Ok(t) => csv_response(export::standings_csv(&t)),
        Err(e) => error_response(e),
    }
}

#[get("/api/players/{user_id}/stats")]
async fn api_player_stats(state: AppState, path: Path<PlayerPath>) -> HttpResponse {
    match state.stats().player(&path.user_id) {
        Some(stats) => HttpResponse::Ok().json(stats),
        None => error_response(CoreError::PlayerNotFound(path.user_id.clone())),
    }
}

#[get("/api/players/{user_id}/head-to-head/{other_id}")]
async fn api_head_to_head(state: AppState, path: Path<HeadToHeadPath>) -> HttpResponse {
    let (wins, losses) = state.stats().head_to_head(&path.user_id, &path.other_id);
    HttpResponse::Ok().json(serde_json::json!({ "wins": wins, "losses": losses }))
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_tournament_ttl_hours() -> i64 {
    24
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let ttl_hours: i64 = std::env::var("TOURNAMENT_TTL_HOURS")
        .ok()
        .and_then(|h| h.parse().ok())
        .filter(|h| *h > 0)
        .unwrap_or_else(default_tournament_ttl_hours);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{} (tournament TTL {}h)", bind.0, bind.1, ttl_hours);

    let state = Data::new(Clubhouse::in_memory(chrono::Duration::hours(ttl_hours)));

    // Background task: cancel open tournaments that outlived their expiry
    let state_sweep = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(EXPIRY_SWEEP);
        loop {
            interval.tick().await;
            let expired = state_sweep.tournaments.expire_stale(Utc::now());
            if expired > 0 {
                log::info!("Cancelled {} expired tournament(s)", expired);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_game)
            .service(api_game_goals_csv)
            .service(api_game_summary)
            .service(api_sync_game)
            .service(api_get_game)
            .service(api_record_goal)
            .service(api_undo_goal)
            .service(api_end_game)
            .service(api_forfeit_game)
            .service(api_abandon_game)
            .service(api_create_tournament)
            .service(api_standings_csv)
            .service(api_get_tournament)
            .service(api_join_tournament)
            .service(api_leave_tournament)
            .service(api_start_team_setup)
            .service(api_create_team)
            .service(api_dissolve_team)
            .service(api_start_tournament)
            .service(api_start_tournament_match)
            .service(api_cancel_tournament)
            .service(api_player_stats)
            .service(api_head_to_head)
    })
    .bind(bind)?
    .run()
    .await
}
