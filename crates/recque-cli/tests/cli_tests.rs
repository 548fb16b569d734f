//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn recque(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("recque").unwrap();
    // Keep the run hermetic: no stray recque.toml or home config.
    cmd.current_dir(dir.path()).env("HOME", dir.path());
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    recque(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("learn"))
        .stdout(predicate::str::contains("sessions"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();
    recque(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created recque.toml"));
    assert!(dir.path().join("recque.toml").exists());

    // Idempotent: a second run leaves the file alone.
    recque(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn sessions_with_no_data_is_friendly() {
    let dir = TempDir::new().unwrap();
    recque(&dir)
        .arg("sessions")
        .arg("--data-dir")
        .arg(dir.path().join("empty"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions found"));
}

#[test]
fn learn_requires_topic_or_resume() {
    let dir = TempDir::new().unwrap();
    recque(&dir)
        .arg("learn")
        .arg("--provider")
        .arg("mock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("provide a topic"));
}

#[test]
fn unknown_provider_is_an_error() {
    let dir = TempDir::new().unwrap();
    recque(&dir)
        .arg("learn")
        .arg("basic math")
        .arg("--provider")
        .arg("nonexistent")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
}

#[test]
fn mock_session_runs_to_completion() {
    let dir = TempDir::new().unwrap();
    // The mock provider puts the correct answer at option 2 and returns
    // three skills, so three correct answers finish the topic.
    recque(&dir)
        .arg("learn")
        .arg("basic math")
        .arg("--provider")
        .arg("mock")
        .arg("--data-dir")
        .arg(dir.path().join("sessions"))
        .write_stdin("2\n2\n2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Skill complete"))
        .stdout(predicate::str::contains("Topic complete"))
        .stdout(predicate::str::contains("Overall: 3/3 correct"));
}

#[test]
fn wrong_answer_descends_into_a_simpler_question() {
    let dir = TempDir::new().unwrap();
    recque(&dir)
        .arg("learn")
        .arg("basic math")
        .arg("--provider")
        .arg("mock")
        .arg("--data-dir")
        .arg(dir.path().join("sessions"))
        .write_stdin("1\n2\n2\n2\n2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("simpler question"))
        .stdout(predicate::str::contains("Back to the earlier question"))
        .stdout(predicate::str::contains("(incorrect)"))
        .stdout(predicate::str::contains("Topic complete"));
}

#[test]
fn quitting_saves_a_resumable_session() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("sessions");

    recque(&dir)
        .arg("learn")
        .arg("basic math")
        .arg("--provider")
        .arg("mock")
        .arg("--data-dir")
        .arg(&data_dir)
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resume with: recque learn --resume"));

    recque(&dir)
        .arg("sessions")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("basic math"))
        .stdout(predicate::str::contains("0/3"));
}

#[test]
fn no_save_leaves_nothing_behind() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("sessions");

    recque(&dir)
        .arg("learn")
        .arg("basic math")
        .arg("--provider")
        .arg("mock")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--no-save")
        .write_stdin("2\n2\n2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Topic complete"));

    assert!(!data_dir.exists());
}
