use std::process::{Command, Stdio};

fn skirmish(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_skirmish"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("failed to launch skirmish binary")
}

#[test]
fn run_plays_the_demo_until_the_turn_limit() {
    let output = skirmish(&["run", "--max-turns", "3"]);
    assert!(output.status.success(), "run should exit cleanly: {output:?}");

    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout.starts_with("Welcome to Skirmish."));
    assert!(stdout.contains("A: Node(0, 0) hp 100/100"), "stdout: {stdout}");
    assert!(stdout.contains("B: Node(9, 9) hp 100/100"), "stdout: {stdout}");
}

#[test]
fn quit_prompt_stops_when_stdin_closes() {
    let output = skirmish(&["run", "--until", "quit"]);
    assert!(output.status.success(), "run should exit cleanly: {output:?}");

    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout.contains("Quit?"), "stdout: {stdout}");
}

#[test]
fn interactive_turns_end_when_stdin_closes() {
    let output = skirmish(&["run", "--interactive", "--max-turns", "2"]);
    assert!(output.status.success(), "run should exit cleanly: {output:?}");

    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert_eq!(stdout.matches("Command (Move, Action, End Turn): ").count(), 2);
}

#[test]
fn scenario_prints_the_built_in_demo() {
    let output = skirmish(&["scenario"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout.contains("[grid]"));
    assert!(stdout.contains("name = \"A\""));
}

#[test]
fn invalid_scenario_path_fails() {
    let output = skirmish(&["run", "--scenario", "does/not/exist.toml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    assert!(stderr.contains("failed to read scenario"), "stderr: {stderr}");
}
