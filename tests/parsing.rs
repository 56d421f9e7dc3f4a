use std::fs;
use std::path::PathBuf;

use wc_history::loader::{LoadOptions, load_text};
use wc_history::parser::{Layout, parse_line};
use wc_history::{Competition, Field, FilterField, HistoryError, MatchStage, Outcome};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_tournament_history_line() {
    let m = parse_line(
        1,
        "2018-07-15 18:00|France|Croatia|4|2|Final|Luzhniki Stadium|Moscow",
        Layout::TournamentHistory,
        '|',
    )
    .expect("line should parse");
    assert_eq!(m.team, "France");
    assert_eq!(m.opponent, "Croatia");
    assert_eq!((m.score, m.opponent_score), (4, 2));
    assert_eq!(m.competition.stage(), Some(MatchStage::Final));
    assert_eq!(m.competition.group_label(), None);
    assert_eq!(m.stadium, "Luzhniki Stadium");
    assert_eq!(m.venue, "Moscow");
    assert_eq!(m.field, Field::Neutral);
    assert_eq!(m.outcome(), Outcome::Win);
    assert_eq!(m.date.format("%Y-%m-%d %H:%M").to_string(), "2018-07-15 18:00");
}

#[test]
fn group_letter_becomes_group_stage() {
    let m = parse_line(
        1,
        "2018-06-14 18:00, Russia , Saudi Arabia ,5,0,A,Luzhniki Stadium,Moscow",
        Layout::TournamentHistory,
        ',',
    )
    .expect("line should parse");
    assert_eq!(m.team, "Russia");
    assert_eq!(m.competition, Competition::group("A"));
    assert!(m.competition.is_group_stage());
}

#[test]
fn parses_team_record_line() {
    let home = parse_line(
        2,
        "2018-06-14,Russia,Saudi Arabia,5,0,FIFA World Cup,Moscow,Russia,FALSE",
        Layout::TeamRecord,
        ',',
    )
    .expect("line should parse");
    assert_eq!(home.field, Field::Home);
    assert_eq!(home.competition, Competition::Named("FIFA World Cup".to_string()));
    assert_eq!(home.city(), Some("Moscow"));
    assert_eq!(home.country(), Some("Russia"));
    assert_eq!(home.reverse().field, Field::Away);

    let neutral = parse_line(
        3,
        "2018-06-15,Egypt,Uruguay,0,1,FIFA World Cup,Ekaterinburg,Russia,TRUE",
        Layout::TeamRecord,
        ',',
    )
    .expect("line should parse");
    assert_eq!(neutral.field, Field::Neutral);
    assert_eq!(neutral.reverse().field, Field::Neutral);
    assert_eq!(neutral.reverse().outcome(), Outcome::Win);
}

#[test]
fn malformed_lines_are_rejected() {
    let cases = [
        ("2018-06-14 18:00|Russia|Saudi Arabia|5|0|A|Luzhniki Stadium", Layout::TournamentHistory),
        ("2018-06-14|Russia|Saudi Arabia|5|0|A|Luzhniki Stadium|Moscow", Layout::TournamentHistory),
        ("2018-06-14 18:00|Russia|Saudi Arabia|five|0|A|Luzhniki|Moscow", Layout::TournamentHistory),
        ("2018-06-14 18:00|Russia|Saudi Arabia|5|-1|A|Luzhniki|Moscow", Layout::TournamentHistory),
        ("2018-06-14 18:00|Russia|Saudi Arabia|5|0|Playoff|Luzhniki|Moscow", Layout::TournamentHistory),
        ("2018-06-14 18:00|Russia|Saudi Arabia|5|0|Friendly|Moscow|Russia|FALSE", Layout::TeamRecord),
    ];
    for (line, layout) in cases {
        let err = parse_line(7, line, layout, '|').expect_err("line should be rejected");
        match err {
            HistoryError::MalformedRecord { line_no, line: raw, .. } => {
                assert_eq!(line_no, 7);
                assert_eq!(raw, line);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}

#[test]
fn loads_fixture_in_year_then_time_order() {
    let corpus = load_text(&read_fixture("worldcup.txt"), LoadOptions::default())
        .expect("fixture should load");
    assert_eq!(corpus.len(), 28);
    assert_eq!(corpus.duplicates_skipped(), 1);
    assert_eq!(corpus.years(), vec![2010, 2014, 2018]);

    for pair in corpus.records().windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.year() != b.year() {
            assert!(a.year() > b.year(), "{a} should come after {b}");
        } else {
            assert!(a.date <= b.date, "{a} should come after {b}");
        }
    }

    let first = &corpus.records()[0];
    assert_eq!((first.team.as_str(), first.opponent.as_str()), ("Russia", "Saudi Arabia"));
    let second = &corpus.records()[1];
    assert_eq!((second.team.as_str(), second.opponent.as_str()), ("Saudi Arabia", "Russia"));
    let last = corpus.records().last().expect("non-empty");
    assert_eq!(last.year(), 2010);

    // Listed after the 18:00 kickoff, but played earlier the same day.
    let same_day = corpus
        .records()
        .iter()
        .filter(|m| m.date_text.starts_with("2018-06-25"))
        .map(|m| m.team.as_str())
        .collect::<Vec<_>>();
    assert_eq!(same_day, vec!["Saudi Arabia", "Egypt", "Uruguay", "Russia"]);
}

#[test]
fn loading_twice_is_idempotent() {
    let raw = read_fixture("worldcup.txt");
    let once = load_text(&raw, LoadOptions::default()).expect("fixture should load");
    let doubled = format!("{raw}\n{raw}");
    let twice = load_text(&doubled, LoadOptions::default()).expect("fixture should load");
    assert_eq!(once.len(), twice.len());
    assert_eq!(once.records(), twice.records());
}

#[test]
fn reverse_orientation_line_is_a_duplicate() {
    let raw = "2018-06-14 18:00|Russia|Saudi Arabia|5|0|A|Luzhniki Stadium|Moscow\n\
               2018-06-14 18:00|Saudi Arabia|Russia|0|5|A|Luzhniki Stadium|Moscow";
    let corpus = load_text(raw, LoadOptions::default()).expect("lines should load");
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.duplicates_skipped(), 1);
}

#[test]
fn malformed_line_aborts_load() {
    let raw = "2018-06-14 18:00|Russia|Saudi Arabia|5|0|A|Luzhniki Stadium|Moscow\n\
               2018-06-15 17:00|Egypt|Uruguay|0|x|A|Ekaterinburg Arena|Ekaterinburg";
    let err = load_text(raw, LoadOptions::default()).expect_err("load should fail");
    assert!(matches!(err, HistoryError::MalformedRecord { line_no: 2, .. }));
}

#[test]
fn team_record_source_skips_header_and_blank_lines() {
    let corpus = load_text(&read_fixture("results.csv"), LoadOptions::default())
        .expect("fixture should load");
    assert_eq!(corpus.len(), 10);
    assert_eq!(corpus.years(), vec![1872, 1873, 2018]);

    let in_russia = corpus
        .filter(&[(FilterField::Country, "Russia")], None)
        .expect("country should exist");
    assert_eq!(in_russia.len(), 6);

    let russia_home = corpus
        .filter(&[(FilterField::Team, "Russia"), (FilterField::Country, "Russia")], Some(2018))
        .expect("team should exist");
    assert_eq!(russia_home.len(), 2);
    assert!(russia_home.iter().all(|m| m.field == Field::Home));

    let friendlies = corpus
        .filter(&[(FilterField::Competition, "Friendly")], Some(1873))
        .expect("competition should exist");
    assert_eq!(friendlies.len(), 2);
}

#[test]
fn explicit_layout_mismatch_is_malformed() {
    let options = LoadOptions {
        layout: Some(Layout::TeamRecord),
        delimiter: None,
    };
    let err = load_text(&read_fixture("worldcup.txt"), options).expect_err("layout mismatch");
    assert!(matches!(err, HistoryError::MalformedRecord { line_no: 1, .. }));
}

#[test]
fn unknown_filter_value_suggests_close_names() {
    let corpus = load_text(&read_fixture("worldcup.txt"), LoadOptions::default())
        .expect("fixture should load");
    let err = corpus
        .filter(&[(FilterField::Team, "uruguay")], None)
        .expect_err("exact lookup should miss");
    match err {
        HistoryError::UnknownFilterValue { field, suggestions, .. } => {
            assert_eq!(field, "team");
            assert_eq!(suggestions, vec!["Uruguay".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(corpus.require_substring(FilterField::Team, "Urug").is_ok());
    assert!(corpus.require_substring(FilterField::Team, "Italy").is_err());
}
