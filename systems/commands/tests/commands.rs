use std::io::Cursor;

use skirmish_core::{Event, Node, TurnCommand};
use skirmish_system_commands::{
    command_prompt, run_until, Console, DefeatCheck, Either, QuitPrompt, ScriptedCommands,
    TerminalCommands, Termination, TurnLimit, INVALID_SELECTION, QUIT_QUESTION, SELECTION_PROMPT,
};
use skirmish_world::{AlwaysHit, Battle, FixedDamage, Grid, Unit};

fn console(input: &str) -> Console<Cursor<String>, Vec<u8>> {
    Console::new(Cursor::new(input.to_owned()), Vec::new())
}

fn turns_taken(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::TurnEnded { .. }))
        .count()
}

#[test]
fn terminal_source_drives_a_move_and_reprompts_on_bad_input() {
    let mut battle = Battle::new(Grid::new(2, 1).expect("valid grid"));
    let id = battle.join(Unit::new("A"), 0, 0).expect("in bounds");
    let console = console("Move\nfoo\n0\nEnd Turn\n");
    let mut terminal = TerminalCommands::new(console.clone());

    assert_eq!(battle.next_turn(&mut terminal), Ok(id));
    assert_eq!(
        battle.unit(id).and_then(Unit::location),
        Some(Node::new(1, 0)),
        "the only legal move should have been taken",
    );

    let written = String::from_utf8(console.take_output()).expect("utf8");
    let before = command_prompt(&TurnCommand::ALL);
    let after = command_prompt(&[TurnCommand::Action, TurnCommand::EndTurn]);
    let expected = format!(
        "{before}Move to:\n0: Node(1, 0)\n{SELECTION_PROMPT}{INVALID_SELECTION}\n{SELECTION_PROMPT}{after}"
    );
    assert_eq!(written, expected);
}

#[test]
fn scripted_move_without_a_selection_still_finishes_the_turn() {
    let mut battle = Battle::new(Grid::new(3, 3).expect("valid grid"));
    let id = battle.join(Unit::new("A"), 1, 1).expect("in bounds");

    assert_eq!(battle.next_turn(&mut ScriptedCommands::new(["Move"])), Ok(id));
    assert_eq!(
        battle.unit(id).and_then(Unit::location),
        Some(Node::new(0, 0)),
        "the first listed move should have been taken",
    );
    assert_eq!(turns_taken(&battle.drain_events()), 1);
}

#[test]
fn defeat_check_stops_after_the_first_turn_with_a_beaten_team() {
    let mut battle = Battle::new(Grid::new(5, 5).expect("valid grid"));
    let red = battle.add_team("Red");
    let blue = battle.add_team("Blue");
    let _survivor = battle
        .join_team(
            Unit::new("A").with_controller(ScriptedCommands::default()),
            red,
            0,
            0,
        )
        .expect("joined");
    let fallen = battle
        .join_team(
            Unit::new("B").with_controller(ScriptedCommands::default()),
            blue,
            4,
            4,
        )
        .expect("joined");
    let _ = battle
        .melee(fallen, fallen, &AlwaysHit, &FixedDamage(1_000))
        .expect("known units");
    let _ = battle.drain_events();

    let mut termination = Either(DefeatCheck, TurnLimit::new(10));
    run_until(&mut battle, &mut termination).expect("controllers present");

    assert_eq!(turns_taken(&battle.drain_events()), 1);
}

#[test]
fn turn_limit_caps_a_battle_nobody_can_lose() {
    let mut battle = Battle::new(Grid::new(10, 10).expect("valid grid"));
    let _a = battle
        .join(Unit::new("A").with_controller(ScriptedCommands::new(["Move", "0"])), 0, 0)
        .expect("joined");
    let _b = battle
        .join(Unit::new("B").with_controller(ScriptedCommands::default()), 9, 9)
        .expect("joined");
    let _ = battle.drain_events();

    let mut termination = Either(DefeatCheck, TurnLimit::new(4));
    run_until(&mut battle, &mut termination).expect("controllers present");

    assert_eq!(turns_taken(&battle.drain_events()), 4);
}

#[test]
fn quit_prompt_stops_on_y() {
    let mut battle = Battle::new(Grid::new(3, 3).expect("valid grid"));
    let _unit = battle
        .join(Unit::new("A").with_controller(ScriptedCommands::default()), 1, 1)
        .expect("joined");
    let _ = battle.drain_events();

    let console = console("n\nmaybe\ny\n");
    let mut quit = QuitPrompt::new(console.clone());
    run_until(&mut battle, &mut quit).expect("controller present");

    assert_eq!(turns_taken(&battle.drain_events()), 3);
    assert_eq!(
        String::from_utf8(console.take_output()).expect("utf8"),
        QUIT_QUESTION.repeat(3)
    );
}

#[test]
fn quit_prompt_stops_when_input_closes() {
    let mut battle = Battle::new(Grid::new(1, 1).expect("valid grid"));
    let mut quit = QuitPrompt::new(console(""));
    assert!(quit.should_stop(&mut battle));
}

#[test]
fn units_and_quit_prompt_share_one_console() {
    let console = console("Move\n0\nEnd Turn\nn\nEnd Turn\ny\n");
    let mut battle = Battle::new(Grid::new(3, 3).expect("valid grid"));
    let id = battle
        .join(
            Unit::new("A").with_controller(TerminalCommands::new(console.clone())),
            1,
            1,
        )
        .expect("joined");
    let mut quit = QuitPrompt::new(console.clone());

    run_until(&mut battle, &mut quit).expect("controller present");

    assert_eq!(turns_taken(&battle.drain_events()), 2);
    assert_ne!(battle.unit(id).and_then(Unit::location), Some(Node::new(1, 1)));
    assert_eq!(console.read_line(), None, "every scripted line was consumed");
}
