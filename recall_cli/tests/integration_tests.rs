//! Integration tests for the recall binary.
//!
//! These tests verify end-to-end behavior including:
//! - Adding cards and decks
//! - Review scheduling persisted across invocations
//! - Quiz, challenge and hint output
//! - Error reporting for a corrupted store

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NOW: &str = "2024-06-01T09:00:00Z";

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary, isolated from any user config
fn cli(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("recall"));
    cmd.env("XDG_CONFIG_HOME", temp_dir.path().join("config"))
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"));
    cmd
}

/// Add a card and return its id as printed by the CLI
fn add_card(temp_dir: &TempDir, term: &str, definition: &str, extra: &[&str]) -> String {
    let output = cli(temp_dir)
        .args(["--now", NOW, "add", "--term", term, "--definition", definition])
        .args(extra)
        .output()
        .expect("Failed to run add");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout is not UTF-8");
    stdout
        .trim()
        .rsplit(' ')
        .next()
        .expect("No card id in output")
        .to_string()
}

fn wal_lines(data_dir: &Path) -> usize {
    fs::read_to_string(data_dir.join("reviews.wal"))
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Spaced-repetition flashcard trainer"));
}

#[test]
fn test_add_creates_store_and_card_is_due() {
    let temp_dir = setup_test_dir();
    let id = add_card(&temp_dir, "perro", "dog", &[]);

    assert!(temp_dir.path().join("data/cards.json").exists());

    cli(&temp_dir)
        .args(["--now", NOW, "due"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 card(s) due"))
        .stdout(predicate::str::contains(&id))
        .stdout(predicate::str::contains("perro"));
}

#[test]
fn test_review_reschedules_and_logs() {
    let temp_dir = setup_test_dir();
    let id = add_card(&temp_dir, "gato", "cat", &[]);

    cli(&temp_dir)
        .args(["--now", NOW, "review", &id, "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next review in 1 day(s)"))
        .stdout(predicate::str::contains("Ease factor: 2.60"));

    let wal = fs::read_to_string(temp_dir.path().join("data/reviews.wal")).unwrap();
    assert_eq!(wal.lines().count(), 1);
    let record: serde_json::Value = serde_json::from_str(wal.trim()).unwrap();
    assert_eq!(record["flashcard_id"], id.as_str());
    assert_eq!(record["quality"], 5);
    assert_eq!(record["source"], "review");
    assert_eq!(record["interval_days"], 1);

    // Not due right after the review
    cli(&temp_dir)
        .args(["--now", NOW, "due"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing due"));

    // Due again a couple of days later
    cli(&temp_dir)
        .args(["--now", "2024-06-03T09:00:00Z", "due"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gato"));
}

#[test]
fn test_review_with_hints_is_penalized() {
    let temp_dir = setup_test_dir();
    let id = add_card(&temp_dir, "casa", "house", &[]);

    cli(&temp_dir)
        .args(["--now", NOW, "review", &id, "correct", "--hints", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 (Difficult)"));
}

#[test]
fn test_review_unknown_card_is_skipped() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args([
            "--now",
            NOW,
            "review",
            "6f1c1d2e-8f51-4bb4-9a58-2f0c5a3a9b10",
            "3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));

    assert_eq!(wal_lines(&temp_dir.path().join("data")), 0);
}

#[test]
fn test_review_rejects_invalid_quality() {
    let temp_dir = setup_test_dir();
    let id = add_card(&temp_dir, "sol", "sun", &[]);

    cli(&temp_dir)
        .args(["--now", NOW, "review", &id, "4"])
        .assert()
        .failure();
}

#[test]
fn test_deck_scoped_listing_and_stats() {
    let temp_dir = setup_test_dir();
    add_card(&temp_dir, "rojo", "red", &["--deck", "Colors"]);
    add_card(&temp_dir, "azul", "blue", &["--deck", "Colors"]);
    add_card(&temp_dir, "uno", "one", &["--deck", "Numbers"]);

    cli(&temp_dir)
        .args(["--now", NOW, "practice", "--deck", "Colors"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 card(s) to practice"))
        .stdout(predicate::str::contains("rojo"))
        .stdout(predicate::str::contains("uno").not());

    cli(&temp_dir)
        .args(["--now", NOW, "stats", "--sort", "name-desc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All cards: 0% (3 total"))
        .stdout(predicate::str::is_match("(?s)Numbers.*Colors").unwrap());
}

#[test]
fn test_hint_progression() {
    let temp_dir = setup_test_dir();
    let id = add_card(
        &temp_dir,
        "perro",
        "dog",
        &["--context", "El perro ladra."],
    );

    cli(&temp_dir)
        .args(["hint", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("FirstLetter: P"));

    cli(&temp_dir)
        .args(["hint", &id, "--used", "first_letter"])
        .assert()
        .success()
        .stdout(predicate::str::contains("WordLength: 5"));

    cli(&temp_dir)
        .args([
            "hint",
            &id,
            "--used",
            "first_letter",
            "--used",
            "word-length",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("El ___ ladra."));

    cli(&temp_dir)
        .args([
            "hint",
            &id,
            "--used",
            "first_letter",
            "--used",
            "word_length",
            "--used",
            "context_sentence",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No more hints"));
}

#[test]
fn test_quiz_show_answers() {
    let temp_dir = setup_test_dir();
    for (term, def) in [("uno", "one"), ("dos", "two"), ("tres", "three"), ("cuatro", "four")] {
        add_card(&temp_dir, term, def, &[]);
    }

    cli(&temp_dir)
        .args(["--now", NOW, "quiz", "--count", "4", "--show-answers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("What does"))
        .stdout(predicate::str::contains("Fill in the blank"))
        .stdout(predicate::str::contains("→"));

    // Showing answers does not record reviews
    assert_eq!(wal_lines(&temp_dir.path().join("data")), 0);
}

#[test]
fn test_quiz_reads_answers_and_records_reviews() {
    let temp_dir = setup_test_dir();
    add_card(&temp_dir, "uno", "one", &[]);
    add_card(&temp_dir, "dos", "two", &[]);

    cli(&temp_dir)
        .args(["--now", NOW, "quiz", "--count", "2"])
        .write_stdin("wrong\nwrong\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 0/2"));

    assert_eq!(wal_lines(&temp_dir.path().join("data")), 2);
}

#[test]
fn test_quiz_stops_at_end_of_input() {
    let temp_dir = setup_test_dir();
    add_card(&temp_dir, "uno", "one", &[]);
    add_card(&temp_dir, "dos", "two", &[]);

    cli(&temp_dir)
        .args(["--now", NOW, "quiz", "--count", "2"])
        .write_stdin("wrong\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 0/1"));
}

#[test]
fn test_quiz_empty_store() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["--now", NOW, "quiz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not enough cards"));
}

#[test]
fn test_challenge_respects_limit() {
    let temp_dir = setup_test_dir();
    for term in ["a", "b", "c", "d", "e"] {
        add_card(&temp_dir, term, "letter", &[]);
    }

    cli(&temp_dir)
        .args(["--now", NOW, "challenge", "--limit", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Challenge: 3 card(s)"));

    cli(&temp_dir)
        .args(["--now", NOW, "challenge", "--limit", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Challenge: 5 card(s)"));
}

#[test]
fn test_config_file_sets_session_defaults() {
    let temp_dir = setup_test_dir();
    for term in ["a", "b", "c", "d"] {
        add_card(&temp_dir, term, "letter", &[]);
    }

    let config_path = temp_dir.path().join("custom.toml");
    fs::write(&config_path, "[session]\nchallenge_limit = 2\n").unwrap();

    cli(&temp_dir)
        .arg("--config")
        .arg(&config_path)
        .args(["--now", NOW, "challenge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Challenge: 2 card(s)"));
}

#[test]
fn test_corrupted_store_is_reported() {
    let temp_dir = setup_test_dir();
    let id = add_card(&temp_dir, "gato", "cat", &[]);

    let store_path = temp_dir.path().join("data/cards.json");
    let contents = fs::read_to_string(&store_path).unwrap();
    let truncated = contents[..contents.len() / 2].to_string();
    fs::write(&store_path, &truncated).unwrap();

    cli(&temp_dir)
        .args(["--now", NOW, "review", &id, "5"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("not found").not());

    cli(&temp_dir)
        .args(["--now", NOW, "due"])
        .assert()
        .failure();

    cli(&temp_dir)
        .args(["--now", NOW, "stats"])
        .assert()
        .failure();

    cli(&temp_dir)
        .args(["--now", NOW, "add", "--term", "x", "--definition", "y"])
        .assert()
        .failure();

    // The unreadable file is left in place and nothing was logged
    assert_eq!(fs::read_to_string(&store_path).unwrap(), truncated);
    assert_eq!(wal_lines(&temp_dir.path().join("data")), 0);
}

#[test]
fn test_add_to_reserved_deck_writes_nothing() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args([
            "--now",
            NOW,
            "add",
            "--term",
            "gato",
            "--definition",
            "cat",
            "--deck",
            "__all__",
        ])
        .assert()
        .failure();

    cli(&temp_dir)
        .args(["--now", NOW, "due"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing due"));
}

#[test]
fn test_configured_thresholds_apply_to_listings() {
    let temp_dir = setup_test_dir();
    let id = add_card(&temp_dir, "gato", "cat", &[]);

    let config_path = temp_dir.path().join("lenient.toml");
    fs::write(
        &config_path,
        "[mastery]\nmin_repetitions = 1\nmin_ease_factor = 1.3\nmin_interval_days = 1\n",
    )
    .unwrap();

    cli(&temp_dir)
        .arg("--config")
        .arg(&config_path)
        .args(["--now", NOW, "review", &id, "5"])
        .assert()
        .success();

    cli(&temp_dir)
        .arg("--config")
        .arg(&config_path)
        .args(["--now", NOW, "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 mastered"));

    cli(&temp_dir)
        .arg("--config")
        .arg(&config_path)
        .args(["--now", NOW, "practice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mastered"))
        .stdout(predicate::str::contains("Learning").not());
}

#[test]
fn test_history_lists_logged_reviews() {
    let temp_dir = setup_test_dir();
    let gato = add_card(&temp_dir, "gato", "cat", &[]);
    let perro = add_card(&temp_dir, "perro", "dog", &[]);

    cli(&temp_dir)
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No reviews logged yet"));

    cli(&temp_dir)
        .args(["--now", NOW, "review", &gato, "5"])
        .assert()
        .success();
    cli(&temp_dir)
        .args(["--now", NOW, "review", &perro, "1", "--source", "challenge"])
        .assert()
        .success();

    cli(&temp_dir)
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 review(s)"))
        .stdout(predicate::str::contains("gato"))
        .stdout(predicate::str::contains("Challenge"));

    cli(&temp_dir)
        .args(["history", "--card", &perro])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 review(s)"))
        .stdout(predicate::str::contains("1 (Difficult)"))
        .stdout(predicate::str::contains("gato").not());
}
