use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;

use wc_history::loader::{LoadOptions, load_text};
use wc_history::store::{self, TeamQuery};
use wc_history::{MatchCorpus, MatchStage};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn seeded() -> Connection {
    let corpus = load_text(&read_fixture("worldcup.txt"), LoadOptions::default())
        .expect("fixture should load");
    let mut conn = Connection::open_in_memory().expect("in-memory db");
    store::init_schema(&conn).expect("schema");
    store::insert_records(&mut conn, corpus.records()).expect("insert");
    conn
}

#[test]
fn insert_is_idempotent() {
    let corpus = load_text(&read_fixture("worldcup.txt"), LoadOptions::default())
        .expect("fixture should load");
    let mut conn = Connection::open_in_memory().expect("in-memory db");
    store::init_schema(&conn).expect("schema");

    let first = store::insert_records(&mut conn, corpus.records()).expect("insert");
    assert_eq!(first.inserted, 28);
    assert_eq!(first.ignored, 0);

    let second = store::insert_records(&mut conn, corpus.records()).expect("insert");
    assert_eq!(second.inserted, 0);
    assert_eq!(second.ignored, 28);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))
        .expect("count");
    assert_eq!(count, 28);
}

#[test]
fn query_team_returns_newest_first() {
    let conn = seeded();
    let TeamQuery::Matches(rows) = store::query_team(&conn, "Russia").expect("query") else {
        panic!("Russia should be stored");
    };
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].opponent, "Spain");
    assert_eq!(rows[0].stage, MatchStage::Knock);
    assert_eq!(rows[0].time, "2018-07-01T17:00:00");
    assert!(rows.windows(2).all(|w| w[0].epoch_seconds >= w[1].epoch_seconds));
    assert_eq!(rows.last().map(|r| r.group.as_deref()), Some(Some("A")));
}

#[test]
fn query_team_miss_suggests_names() {
    let conn = seeded();
    match store::query_team(&conn, "Rusia").expect("query") {
        TeamQuery::DidYouMean(names) => assert_eq!(names, vec!["Russia".to_string()]),
        TeamQuery::Matches(_) => panic!("misspelled name should not match"),
    }
    match store::query_team(&conn, "Zz").expect("query") {
        TeamQuery::DidYouMean(names) => assert!(names.is_empty()),
        TeamQuery::Matches(_) => panic!("unknown name should not match"),
    }
}

#[test]
fn stored_rows_reload_into_same_corpus() {
    let conn = seeded();
    let loaded = load_text(&read_fixture("worldcup.txt"), LoadOptions::default())
        .expect("fixture should load");
    let reloaded = MatchCorpus::from_records(store::load_records(&conn, None).expect("load"));
    assert_eq!(reloaded.len(), loaded.len());
    assert_eq!(reloaded.duplicates_skipped(), 14);
    assert_eq!(reloaded.years(), loaded.years());
    for (a, b) in reloaded.records().iter().zip(loaded.records()) {
        assert_eq!(a.identity(), b.identity());
        assert_eq!((a.score, a.opponent_score), (b.score, b.opponent_score));
        assert_eq!(a.competition, b.competition);
    }
}

#[test]
fn season_standings_rank_by_points() {
    let conn = seeded();
    assert_eq!(store::stored_years(&conn).expect("years"), vec![2018, 2014, 2010]);
    let table = store::season_standings(&conn, 2018).expect("standings");
    let head = table.iter().take(3).map(|r| r.team.as_str()).collect::<Vec<_>>();
    assert_eq!(head, vec!["Uruguay", "Russia", "Saudi Arabia"]);
    assert_eq!(table[0].points, 9);
}

#[test]
fn team_record_rows_are_not_stored() {
    let corpus = load_text(&read_fixture("results.csv"), LoadOptions::default())
        .expect("fixture should load");
    let mut conn = Connection::open_in_memory().expect("in-memory db");
    store::init_schema(&conn).expect("schema");
    let summary = store::insert_records(&mut conn, corpus.records()).expect("insert");
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.unstaged, 10);
}

#[test]
fn open_db_creates_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("matches.sqlite");
    let conn = store::open_db(&path).expect("open");
    assert!(path.exists());
    assert!(store::stored_years(&conn).expect("years").is_empty());
}

#[test]
fn like_wildcards_in_query_are_literal() {
    let conn = seeded();
    for query in ["_", "%", "R_ssia"] {
        match store::query_team(&conn, query).expect("query") {
            TeamQuery::DidYouMean(names) => assert!(names.is_empty(), "{query} suggested {names:?}"),
            TeamQuery::Matches(_) => panic!("{query} should not match"),
        }
    }
}
