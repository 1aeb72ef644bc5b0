//! Integration tests for the tournament lifecycle, from registration to champion.

use chrono::{DateTime, Duration, TimeZone, Utc};
use foosball_scorer::logic::tournament::expire_if_stale;
use foosball_scorer::{
    cancel_tournament, complete_tournament_match, create_team, dissolve_team, join_tournament,
    leave_tournament, start_team_setup, start_tournament, start_tournament_match, Clubhouse,
    CoreError, GameStatus, GameType, GoalInput, GoalType, NewTournament, Player, Position, Side,
    Tournament, TournamentFormat, TournamentMatchStatus, TournamentMode, TournamentStatus,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 20, 19, 0, 0).unwrap()
}

fn player(i: usize) -> Player {
    Player::new(format!("u{i}"), format!("Player {i}"))
}

fn tournament(format: TournamentFormat, mode: TournamentMode, players: usize) -> Tournament {
    let mut t = Tournament::new("Friday cup", player(0), format, mode, GameType::Six, now(), Duration::hours(24));
    for i in 1..players {
        join_tournament(&mut t, player(i), now()).unwrap();
    }
    t
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(2026)
}

#[test]
fn join_rules() {
    let mut t = tournament(TournamentFormat::OneVOne, TournamentMode::RoundRobin, 2);
    assert_eq!(t.status, TournamentStatus::Waiting);
    assert_eq!(t.players.len(), 2);
    assert_eq!(
        join_tournament(&mut t, player(1), now()).unwrap_err(),
        CoreError::DuplicatePlayer("u1".to_string())
    );
    assert_eq!(
        join_tournament(&mut t, player(9), now() + Duration::hours(25)).unwrap_err(),
        CoreError::TournamentExpired
    );
    start_team_setup(&mut t, now()).unwrap();
    assert!(matches!(
        join_tournament(&mut t, player(5), now()),
        Err(CoreError::InvalidState(_))
    ));
}

#[test]
fn leave_rules() {
    let mut t = tournament(TournamentFormat::TwoVTwo, TournamentMode::Bracket, 4);
    assert!(matches!(leave_tournament(&mut t, "u0"), Err(CoreError::InvalidState(_))));
    assert_eq!(
        leave_tournament(&mut t, "nobody").unwrap_err(),
        CoreError::PlayerNotFound("nobody".to_string())
    );
    leave_tournament(&mut t, "u3").unwrap();
    assert_eq!(t.players.len(), 3);
}

#[test]
fn one_v_one_team_setup_is_automatic() {
    let mut t = tournament(TournamentFormat::OneVOne, TournamentMode::RoundRobin, 3);
    start_team_setup(&mut t, now()).unwrap();
    assert_eq!(t.status, TournamentStatus::TeamSetup);
    assert_eq!(t.teams.len(), 3);
    assert!(t.teams.iter().all(|team| team.players.len() == 1));
    assert!(t.unassigned_players().is_empty());
    assert!(matches!(
        create_team(&mut t, "Extra", &["u0".to_string()]),
        Err(CoreError::InvalidState(_))
    ));
}

#[test]
fn team_setup_needs_enough_players() {
    let mut t = tournament(TournamentFormat::TwoVTwo, TournamentMode::RoundRobin, 3);
    assert_eq!(
        start_team_setup(&mut t, now()).unwrap_err(),
        CoreError::NotEnoughPlayers { required: 4, found: 3 }
    );
}

#[test]
fn two_v_two_team_formation_rules() {
    let mut t = tournament(TournamentFormat::TwoVTwo, TournamentMode::RoundRobin, 5);
    start_team_setup(&mut t, now()).unwrap();
    assert!(t.teams.is_empty());

    let ids = |xs: &[usize]| xs.iter().map(|i| format!("u{i}")).collect::<Vec<_>>();
    assert_eq!(
        create_team(&mut t, "Solo", &ids(&[0])).unwrap_err(),
        CoreError::WrongTeamSize { expected: 2, found: 1 }
    );
    assert_eq!(create_team(&mut t, "  ", &ids(&[0, 1])).unwrap_err(), CoreError::EmptyName);
    assert_eq!(
        create_team(&mut t, "Twins", &ids(&[0, 0])).unwrap_err(),
        CoreError::DuplicatePlayer("u0".to_string())
    );
    assert_eq!(
        create_team(&mut t, "Ghosts", &ids(&[0, 7])).unwrap_err(),
        CoreError::PlayerNotFound("u7".to_string())
    );

    let first = create_team(&mut t, "Les Pissettes", &ids(&[0, 1])).unwrap();
    assert_eq!(
        create_team(&mut t, "Again", &ids(&[1, 2])).unwrap_err(),
        CoreError::DuplicatePlayer("u1".to_string())
    );
    assert_eq!(
        start_tournament(&mut t, &mut rng(), now()).unwrap_err(),
        CoreError::NotEnoughTeams { required: 2, found: 1 }
    );

    dissolve_team(&mut t, first).unwrap();
    assert_eq!(t.unassigned_players().len(), 5);
    create_team(&mut t, "Les Pissettes", &ids(&[0, 1])).unwrap();
    create_team(&mut t, "Demi-volée", &ids(&[2, 3])).unwrap();
    start_tournament(&mut t, &mut rng(), now()).unwrap();
    assert_eq!(t.status, TournamentStatus::InProgress);
    assert_eq!(t.matches.len(), 1);
    assert!(t.standings.is_some());
    assert!(t.bracket.is_none());
}

#[test]
fn round_robin_caps_at_eight_teams() {
    let mut t = tournament(TournamentFormat::OneVOne, TournamentMode::RoundRobin, 9);
    start_team_setup(&mut t, now()).unwrap();
    assert_eq!(
        start_tournament(&mut t, &mut rng(), now()).unwrap_err(),
        CoreError::TooManyTeams { max: 8, found: 9 }
    );

    let mut b = tournament(TournamentFormat::OneVOne, TournamentMode::Bracket, 9);
    start_team_setup(&mut b, now()).unwrap();
    start_tournament(&mut b, &mut rng(), now()).unwrap();
    let rounds = b.bracket.as_ref().unwrap();
    assert_eq!(rounds.len(), 4);
    assert_eq!(rounds[0].matches.len(), 8);
    assert!(b.standings.is_none());
    assert_eq!(b.matches.len(), 8 + 4 + 2 + 1);
}

#[test]
fn cannot_start_twice() {
    let mut t = tournament(TournamentFormat::OneVOne, TournamentMode::RoundRobin, 4);
    start_team_setup(&mut t, now()).unwrap();
    start_tournament(&mut t, &mut rng(), now()).unwrap();
    assert!(matches!(
        start_tournament(&mut t, &mut rng(), now()),
        Err(CoreError::InvalidState(_))
    ));
}

#[test]
fn round_robin_runs_to_completion() {
    let mut t = tournament(TournamentFormat::OneVOne, TournamentMode::RoundRobin, 4);
    start_team_setup(&mut t, now()).unwrap();
    start_tournament(&mut t, &mut rng(), now()).unwrap();
    assert_eq!(t.matches.len(), 6);

    let ids: Vec<_> = t.matches.iter().map(|m| m.id).collect();
    for (i, id) in ids.iter().enumerate() {
        start_tournament_match(&mut t, *id).unwrap();
        if let Some(next) = ids.get(i + 1) {
            assert!(matches!(
                start_tournament_match(&mut t, *next),
                Err(CoreError::InvalidState(_))
            ));
        }
        let done = complete_tournament_match(&mut t, *id, [6, 3], Some(Side::One)).unwrap();
        assert_eq!(done.tournament_completed, i == ids.len() - 1);
    }

    assert_eq!(t.status, TournamentStatus::Completed);
    let standings = t.standings.as_ref().unwrap();
    assert_eq!(standings.iter().map(|s| s.played).sum::<u32>(), 12);
    assert_eq!(standings.iter().map(|s| s.points).sum::<u32>(), 18);
    assert!(standings.windows(2).all(|w| w[0].points >= w[1].points));
    assert_eq!(t.champion_id, Some(standings[0].team_id));
}

#[test]
fn completion_requires_started_match_and_a_winner() {
    let mut t = tournament(TournamentFormat::OneVOne, TournamentMode::RoundRobin, 2);
    start_team_setup(&mut t, now()).unwrap();
    start_tournament(&mut t, &mut rng(), now()).unwrap();
    let id = t.matches[0].id;
    assert!(matches!(
        complete_tournament_match(&mut t, id, [6, 0], Some(Side::One)),
        Err(CoreError::InvalidState(_))
    ));
    start_tournament_match(&mut t, id).unwrap();
    assert_eq!(
        complete_tournament_match(&mut t, id, [3, 3], None).unwrap_err(),
        CoreError::DrawNotAllowed
    );
    let done = complete_tournament_match(&mut t, id, [2, 6], Some(Side::Two)).unwrap();
    assert!(done.tournament_completed);
    assert_eq!(t.champion_id, t.matches[0].team2.as_ref().map(|team| team.id));

    let replay = complete_tournament_match(&mut t, id, [2, 6], Some(Side::Two)).unwrap();
    assert!(replay.replayed);
    assert_eq!(t.standings.as_ref().unwrap().iter().map(|s| s.played).sum::<u32>(), 2);
    assert!(matches!(
        complete_tournament_match(&mut t, id, [6, 2], Some(Side::One)),
        Err(CoreError::InvalidState(_))
    ));
}

#[test]
fn bracket_runs_to_champion() {
    let mut t = tournament(TournamentFormat::OneVOne, TournamentMode::Bracket, 5);
    start_team_setup(&mut t, now()).unwrap();
    start_tournament(&mut t, &mut rng(), now()).unwrap();
    assert_eq!(
        t.matches
            .iter()
            .filter(|m| m.status == TournamentMatchStatus::Bye)
            .count(),
        3
    );

    let mut played = 0;
    while t.status == TournamentStatus::InProgress {
        let next = t.matches.iter().find(|m| m.is_ready()).map(|m| m.id).unwrap();
        start_tournament_match(&mut t, next).unwrap();
        complete_tournament_match(&mut t, next, [6, 4], Some(Side::One)).unwrap();
        played += 1;
    }
    // 5 teams: 4 real matches eliminate 4 teams.
    assert_eq!(played, 4);
    assert_eq!(t.status, TournamentStatus::Completed);
    let final_match = &t.bracket.as_ref().unwrap()[2].matches[0];
    assert_eq!(t.champion_id, final_match.winner_id);
    assert_eq!(t.find_match(final_match.id).unwrap().status, TournamentMatchStatus::Completed);
}

#[test]
fn cancel_and_expiry() {
    let mut t = tournament(TournamentFormat::OneVOne, TournamentMode::RoundRobin, 2);
    assert!(!expire_if_stale(&mut t, now() + Duration::hours(1)));
    assert!(expire_if_stale(&mut t, now() + Duration::hours(24)));
    assert_eq!(t.status, TournamentStatus::Cancelled);
    assert!(matches!(cancel_tournament(&mut t), Err(CoreError::InvalidState(_))));

    let mut live = tournament(TournamentFormat::OneVOne, TournamentMode::RoundRobin, 2);
    start_team_setup(&mut live, now()).unwrap();
    start_tournament(&mut live, &mut rng(), now()).unwrap();
    assert!(!expire_if_stale(&mut live, now() + Duration::days(3)));
    assert_eq!(cancel_tournament(&mut live).unwrap(), None);
    let first_match_id = live.matches[0].id;
    assert!(matches!(
        start_tournament_match(&mut live, first_match_id),
        Err(CoreError::InvalidState(_))
    ));
}

fn goal(side: Side, scorer: &str) -> GoalInput {
    GoalInput {
        side,
        scorer_id: scorer.to_string(),
        position: Position::Attack,
        goal_type: GoalType::Normal,
    }
}

#[test]
fn clubhouse_feeds_game_results_into_tournament() {
    let club = Clubhouse::in_memory(Duration::hours(24));
    let tournaments = &club.tournaments;
    let t = tournaments
        .create(
            NewTournament {
                name: "League night".to_string(),
                host: player(0),
                format: TournamentFormat::OneVOne,
                mode: TournamentMode::Bracket,
                target: GameType::Six,
                venue_id: Some("le-baby".to_string()),
            },
            now(),
        )
        .unwrap();
    for i in 1..4 {
        tournaments.join(t.id, player(i), now()).unwrap();
    }
    tournaments.start_team_setup(t.id, now()).unwrap();
    let t = tournaments.start(t.id, now()).unwrap();

    while club.tournaments.get(t.id).unwrap().status == TournamentStatus::InProgress {
        let current = club.tournaments.get(t.id).unwrap();
        let next = current.matches.iter().find(|m| m.is_ready()).unwrap();
        let (t_after, game) = club.tournaments.start_match(t.id, next.id, now()).unwrap();
        assert_eq!(t_after.find_match(next.id).unwrap().game_id, Some(game.id));
        assert_eq!(game.venue_id.as_deref(), Some("le-baby"));

        let scorer = game.teams[1].players[0].user_id.clone();
        for _ in 0..6 {
            club.record_goal(game.id, &goal(Side::Two, &scorer), None, now()).unwrap();
        }
        let stored = club.tournaments.get(t.id).unwrap();
        let m = stored.find_match(next.id).unwrap();
        assert_eq!(m.status, TournamentMatchStatus::Completed);
        assert_eq!(m.score, Some([0, 6]));
        assert_eq!(m.winner_id, m.team2.as_ref().map(|team| team.id));
    }

    let done = club.tournaments.get(t.id).unwrap();
    assert_eq!(done.status, TournamentStatus::Completed);
    assert!(done.champion_id.is_some());
    assert_eq!(club.stats().games_recorded(), 3);
    assert_eq!(club.stats().venue("le-baby").unwrap().games, 3);
}

#[test]
fn abandoned_tournament_game_frees_the_match() {
    let club = Clubhouse::in_memory(Duration::hours(24));
    let t = club
        .tournaments
        .create(
            NewTournament {
                name: "Quick".to_string(),
                host: player(0),
                format: TournamentFormat::OneVOne,
                mode: TournamentMode::RoundRobin,
                target: GameType::Eleven,
                venue_id: None,
            },
            now(),
        )
        .unwrap();
    club.tournaments.join(t.id, player(1), now()).unwrap();
    club.tournaments.start_team_setup(t.id, now()).unwrap();
    let t = club.tournaments.start(t.id, now()).unwrap();
    let match_id = t.matches[0].id;

    let (_, game) = club.tournaments.start_match(t.id, match_id, now()).unwrap();
    club.abandon(game.id, now()).unwrap();
    let t = club.tournaments.get(t.id).unwrap();
    assert_eq!(t.matches[0].status, TournamentMatchStatus::Pending);
    assert_eq!(t.matches[0].game_id, None);

    let (_, replay) = club.tournaments.start_match(t.id, match_id, now()).unwrap();
    let cancelled = club.tournaments.cancel(t.id, now()).unwrap();
    assert_eq!(cancelled.status, TournamentStatus::Cancelled);
    assert_eq!(club.games.get(replay.id).unwrap().status, GameStatus::Abandoned);
    assert_eq!(club.stats().games_recorded(), 0);
}

fn two_player_league(club: &Clubhouse) -> Tournament {
    let t = club
        .tournaments
        .create(
            NewTournament {
                name: "Duel".to_string(),
                host: player(0),
                format: TournamentFormat::OneVOne,
                mode: TournamentMode::RoundRobin,
                target: GameType::Six,
                venue_id: None,
            },
            now(),
        )
        .unwrap();
    club.tournaments.join(t.id, player(1), now()).unwrap();
    club.tournaments.start_team_setup(t.id, now()).unwrap();
    club.tournaments.start(t.id, now()).unwrap()
}

#[test]
fn sync_redelivers_a_missed_result() {
    let club = Clubhouse::in_memory(Duration::hours(24));
    let t = two_player_league(&club);
    let match_id = t.matches[0].id;
    let (_, game) = club.tournaments.start_match(t.id, match_id, now()).unwrap();

    // Finished behind the clubhouse's back: the tournament never heard of it.
    club.games.forfeit(game.id, Side::Two, now()).unwrap();
    let stuck = club.tournaments.get(t.id).unwrap();
    assert_eq!(stuck.matches[0].status, TournamentMatchStatus::InProgress);

    club.sync_game(game.id).unwrap();
    let synced = club.tournaments.get(t.id).unwrap();
    assert_eq!(synced.matches[0].status, TournamentMatchStatus::Completed);
    assert_eq!(synced.status, TournamentStatus::Completed);
    assert_eq!(synced.champion_id, synced.matches[0].team1.as_ref().map(|team| team.id));

    club.sync_game(game.id).unwrap();
    let again = club.tournaments.get(t.id).unwrap();
    assert_eq!(again.standings, synced.standings);
}

#[test]
fn sync_frees_the_match_of_a_missed_abandon() {
    let club = Clubhouse::in_memory(Duration::hours(24));
    let t = two_player_league(&club);
    let match_id = t.matches[0].id;
    let (_, game) = club.tournaments.start_match(t.id, match_id, now()).unwrap();

    club.games.abandon(game.id, now()).unwrap();
    assert_eq!(
        club.tournaments.get(t.id).unwrap().matches[0].status,
        TournamentMatchStatus::InProgress
    );
    club.sync_game(game.id).unwrap();
    club.sync_game(game.id).unwrap();
    let t = club.tournaments.get(t.id).unwrap();
    assert_eq!(t.matches[0].status, TournamentMatchStatus::Pending);
    assert!(club.tournaments.start_match(t.id, match_id, now()).is_ok());
}

#[test]
fn sync_rejects_a_live_game() {
    let club = Clubhouse::in_memory(Duration::hours(24));
    let t = two_player_league(&club);
    let (_, game) = club.tournaments.start_match(t.id, t.matches[0].id, now()).unwrap();
    assert!(matches!(club.sync_game(game.id), Err(CoreError::InvalidState(_))));
}

#[test]
fn service_expires_open_tournaments() {
    let club = Clubhouse::in_memory(Duration::hours(2));
    let t = club
        .tournaments
        .create(
            NewTournament {
                name: "Stale".to_string(),
                host: player(0),
                format: TournamentFormat::TwoVTwo,
                mode: TournamentMode::RoundRobin,
                target: GameType::Six,
                venue_id: None,
            },
            now(),
        )
        .unwrap();
    assert_eq!(club.tournaments.expire_stale(now() + Duration::hours(1)), 0);
    assert_eq!(club.tournaments.expire_stale(now() + Duration::hours(3)), 1);
    assert_eq!(club.tournaments.get(t.id).unwrap().status, TournamentStatus::Cancelled);
}

#[test]
fn seeded_lifecycle_draws_the_same_fixtures() {
    use foosball_scorer::{Game, MatchLifecycle, MemoryStats, MemoryStore};
    use std::sync::Arc;

    let run = || {
        let stats = Arc::new(MemoryStats::new());
        let games = Arc::new(MatchLifecycle::new(
            Arc::new(MemoryStore::<Game>::new()),
            stats.clone(),
            stats,
        ));
        let lifecycle = foosball_scorer::TournamentLifecycle::new(
            Arc::new(MemoryStore::<Tournament>::new()),
            games,
            Duration::hours(24),
        )
        .with_rng(StdRng::seed_from_u64(7));
        let t = lifecycle
            .create(
                NewTournament {
                    name: "Seeded".to_string(),
                    host: player(0),
                    format: TournamentFormat::OneVOne,
                    mode: TournamentMode::RoundRobin,
                    target: GameType::Six,
                    venue_id: None,
                },
                now(),
            )
            .unwrap();
        for i in 1..6 {
            lifecycle.join(t.id, player(i), now()).unwrap();
        }
        lifecycle.start_team_setup(t.id, now()).unwrap();
        let t = lifecycle.start(t.id, now()).unwrap();
        t.matches
            .iter()
            .map(|m| {
                let names = |team: &Option<foosball_scorer::TournamentTeam>| {
                    team.as_ref().map(|team| team.name.clone())
                };
                (names(&m.team1), names(&m.team2))
            })
            .collect::<Vec<_>>()
    };
    let first = run();
    assert_eq!(first.len(), 15);
    assert_eq!(first, run());
}
