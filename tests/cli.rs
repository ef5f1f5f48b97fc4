// Drives the non-interactive subcommands of the compiled binary.
// Every run gets its own HOME and XDG dirs so nothing touches the real user data.

use assert_cmd::Command;
use tempfile::TempDir;

fn tsq(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tsq").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn save_list_show_remove() {
    let home = TempDir::new().unwrap();

    let out = stdout_of(tsq(&home).args([
        "save",
        "pomodoro",
        "--timer",
        "Focus:down:25m",
        "--timer",
        "Break:down:5m",
        "--executions",
        "4",
    ]));
    assert_eq!(out, "saved 'pomodoro' (4x [Focus, Break] ~2h)\n");

    stdout_of(tsq(&home).args(["save", "open", "-t", "Note:up:0"]));

    let out = stdout_of(tsq(&home).arg("list"));
    assert_eq!(
        out,
        "open      1x [Note] ~0s\npomodoro  4x [Focus, Break] ~2h\n"
    );

    let out = stdout_of(tsq(&home).args(["show", "pomodoro"]));
    let shown: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(shown["executions"], 4);
    assert_eq!(shown["timers"][0]["label"], "Focus");
    assert_eq!(shown["timers"][0]["type"], "Count-Down");
    assert_eq!(shown["timers"][0]["time"], 1500);

    let out = stdout_of(tsq(&home).args(["remove", "open"]));
    assert_eq!(out, "removed 'open'\n");

    let out = stdout_of(tsq(&home).arg("list"));
    assert_eq!(out, "pomodoro  4x [Focus, Break] ~2h\n");
}

#[test]
fn sequences_live_under_the_storage_key() {
    let home = TempDir::new().unwrap();
    stdout_of(tsq(&home).args(["save", "one", "-t", "A:down:2"]));

    let raw = std::fs::read_to_string(
        home.path()
            .join("data")
            .join("tsq")
            .join("sequenceStorage.json"),
    )
    .unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["one"]["timers"][0]["label"], "A");
}

#[test]
fn unknown_sequence_is_an_error() {
    let home = TempDir::new().unwrap();
    tsq(&home).args(["show", "nope"]).assert().failure();
    tsq(&home).args(["remove", "nope"]).assert().failure();
}

#[test]
fn invalid_timers_are_rejected() {
    let home = TempDir::new().unwrap();
    tsq(&home)
        .args(["save", "bad", "-t", "A:sideways:5"])
        .assert()
        .failure();
    tsq(&home)
        .args(["save", "bad", "-t", "A:down:5", "-e", "0"])
        .assert()
        .failure();
    tsq(&home)
        .args(["save", "bad", "-t", "A:down:5", "-e", "100"])
        .assert()
        .failure();

    let out = stdout_of(tsq(&home).arg("list"));
    assert_eq!(out, "no stored sequences\n");
}

#[test]
fn empty_history() {
    let home = TempDir::new().unwrap();
    let out = stdout_of(tsq(&home).arg("history"));
    assert_eq!(out, "no history recorded yet\n");
}

#[test]
fn history_csv_export() {
    let home = TempDir::new().unwrap();
    let csv_path = home.path().join("history.csv");

    let out = stdout_of(tsq(&home).args(["history", "--csv"]).arg(&csv_path));
    assert!(out.starts_with("wrote 0 entries"));

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("sequence,title,progress,dead_time"));
}

#[test]
fn play_rejects_an_oversized_execution_count() {
    let home = TempDir::new().unwrap();
    stdout_of(tsq(&home).args(["save", "drill", "-t", "A:down:5"]));

    tsq(&home)
        .args(["play", "drill", "-e", "18446744073709551615"])
        .assert()
        .failure();
}

#[test]
fn history_clear() {
    let home = TempDir::new().unwrap();
    let out = stdout_of(tsq(&home).args(["history", "--clear"]));
    assert_eq!(out, "history cleared\n");

    let out = stdout_of(tsq(&home).arg("history"));
    assert_eq!(out, "no history recorded yet\n");
}
