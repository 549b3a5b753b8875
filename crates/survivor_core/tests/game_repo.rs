use survivor_core::db::open_db_in_memory;
use survivor_core::{
    Match, MatchCompletion, MatchListQuery, MatchRepository, MatchStatus, Pick, PickListQuery,
    PickRepository, RepoError, SqliteGameRepository, User, UserRepository,
};

const START: i64 = 4_102_444_800_000;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn create_and_find_user_by_email() {
    let conn = setup();
    let repo = SqliteGameRepository::try_new(&conn).unwrap();

    let user = User::new("Kunal@Example.com", 1);
    repo.create_user(&user).unwrap();

    let loaded = repo
        .find_user_by_email(" KUNAL@example.com ")
        .unwrap()
        .unwrap();
    assert_eq!(loaded, user);
    assert_eq!(repo.get_user(user.id).unwrap().unwrap().name, "kunal");
}

#[test]
fn duplicate_email_is_a_conflict() {
    let conn = setup();
    let repo = SqliteGameRepository::try_new(&conn).unwrap();

    repo.create_user(&User::new("a@b.c", 1)).unwrap();
    let err = repo.create_user(&User::new("a@b.c", 2)).unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn invalid_user_is_rejected_before_insert() {
    let conn = setup();
    let repo = SqliteGameRepository::try_new(&conn).unwrap();

    let err = repo.create_user(&User::new("not-an-email", 1)).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo.list_users().unwrap().is_empty());
}

#[test]
fn list_matches_filters_and_orders_by_start_time() {
    let conn = setup();
    let repo = SqliteGameRepository::try_new(&conn).unwrap();

    repo.create_match(&Match::new("B", "NRG", "Cloud9", "Lower", START + 10))
        .unwrap();
    repo.create_match(&Match::new("A", "G2", "Sentinels", "Upper", START))
        .unwrap();

    let all = repo.list_matches(&MatchListQuery::default()).unwrap();
    let ids: Vec<_> = all.iter().map(|game| game.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);

    let lower = repo
        .list_matches(&MatchListQuery {
            stage: Some("Lower".to_string()),
            ..MatchListQuery::default()
        })
        .unwrap();
    assert_eq!(lower.len(), 1);
    assert_eq!(lower[0].id, "B");
}

#[test]
fn create_matches_is_all_or_nothing() {
    let conn = setup();
    let repo = SqliteGameRepository::try_new(&conn).unwrap();

    repo.create_match(&Match::new("dup", "A", "B", "S", START))
        .unwrap();
    let err = repo
        .create_matches(&[
            Match::new("fresh", "C", "D", "S", START),
            Match::new("dup", "E", "F", "S", START),
        ])
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
    assert!(repo.get_match("fresh").unwrap().is_none());
}

#[test]
fn second_pick_for_same_pair_is_a_conflict() {
    let conn = setup();
    let repo = SqliteGameRepository::try_new(&conn).unwrap();
    let user = User::new("a@b.c", 1);
    repo.create_user(&user).unwrap();
    repo.create_match(&Match::new("M", "G2", "Sentinels", "S", START))
        .unwrap();

    repo.create_pick(&Pick::new(user.id, "M", "G2", 5)).unwrap();
    let err = repo
        .create_pick(&Pick::new(user.id, "M", "Sentinels", 6))
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    let stored = repo.get_pick(user.id, "M").unwrap().unwrap();
    assert_eq!(stored.picked_team, "G2");
    assert_eq!(stored.is_correct, None);
}

#[test]
fn assignable_matches_exclude_assigned_picked_and_full() {
    let conn = setup();
    let repo = SqliteGameRepository::try_new(&conn).unwrap();
    let first = User::new("first@x.io", 1);
    let second = User::new("second@x.io", 2);
    repo.create_user(&first).unwrap();
    repo.create_user(&second).unwrap();
    for id in ["M1", "M2", "M3"] {
        repo.create_match(&Match::new(id, "A", "B", "S", START))
            .unwrap();
    }

    repo.assign_match(first.id, "M1", 10).unwrap();
    assert_eq!(
        repo.get_user(first.id).unwrap().unwrap().current_match_id,
        Some("M1".to_string())
    );
    assert_eq!(repo.count_assignments(first.id).unwrap(), 1);

    let pool: Vec<_> = repo
        .list_assignable_matches(first.id, 100)
        .unwrap()
        .into_iter()
        .map(|game| game.id)
        .collect();
    assert_eq!(pool, vec!["M2", "M3"]);

    let pool: Vec<_> = repo
        .list_assignable_matches(second.id, 1)
        .unwrap()
        .into_iter()
        .map(|game| game.id)
        .collect();
    assert_eq!(pool, vec!["M2", "M3"]);
}

#[test]
fn record_completion_is_never_replayed() {
    let conn = setup();
    let repo = SqliteGameRepository::try_new(&conn).unwrap();
    let user = User::new("a@b.c", 1);
    repo.create_user(&user).unwrap();
    let game = Match::new("M", "G2", "Sentinels", "S", START);
    repo.create_match(&game).unwrap();
    repo.create_pick(&Pick::new(user.id, "M", "G2", 5)).unwrap();

    let mut completed = game.clone();
    completed.status = MatchStatus::Completed;
    completed.winner = Some("G2".to_string());
    let mut scored = repo
        .list_picks(&PickListQuery::default())
        .unwrap()
        .remove(0);
    scored.is_correct = Some(true);
    let mut winner = user.clone();
    winner.wins = 1;
    winner.rank = 1;

    let completion = MatchCompletion {
        completed,
        scored_picks: vec![scored],
        users: vec![winner],
    };
    repo.record_completion(&completion).unwrap();

    let stored = repo.get_match("M").unwrap().unwrap();
    assert_eq!(stored.status, MatchStatus::Completed);
    assert_eq!(stored.winner.as_deref(), Some("G2"));
    assert_eq!(
        repo.get_pick(user.id, "M").unwrap().unwrap().is_correct,
        Some(true)
    );
    assert_eq!(repo.get_user(user.id).unwrap().unwrap().wins, 1);

    let err = repo.record_completion(&completion).unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
    assert_eq!(repo.get_user(user.id).unwrap().unwrap().wins, 1);
}
