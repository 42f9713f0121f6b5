#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command sources and termination predicates that drive a battle loop.
//!
//! [`ScriptedCommands`] replays canned tokens, [`TerminalCommands`] talks to
//! a human through a shared [`Console`]. The [`Termination`] implementations
//! decide when [`Battle::run`] stops.

use std::{
    cell::RefCell,
    collections::VecDeque,
    fmt,
    io::{self, BufRead, Stdout, Write},
    rc::Rc,
};

use skirmish_core::{BattleError, CommandSource, TurnCommand};
use skirmish_world::Battle;

/// Prompt printed while a menu awaits a selection.
pub const SELECTION_PROMPT: &str = "Enter a number: ";

/// Message printed after an invalid menu selection.
pub const INVALID_SELECTION: &str = "Invalid input. Please select again.";

/// Question asked by [`QuitPrompt`] after every turn.
pub const QUIT_QUESTION: &str = "Quit?";

/// Prompt printed while a turn awaits its next command, listing `commands`
/// by label.
#[must_use]
pub fn command_prompt(commands: &[TurnCommand]) -> String {
    let labels: Vec<&str> = commands.iter().map(|command| command.label()).collect();
    format!("Command ({}): ", labels.join(", "))
}

/// Tracks whether a presented menu is still waiting for a valid selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Commands,
    Selecting,
    Answered,
}

impl Mode {
    /// A new token request after an answer means the menu accepted it.
    fn settle(&mut self) {
        if *self == Self::Answered {
            *self = Self::Commands;
        }
    }

    fn answer(&mut self) {
        if *self == Self::Selecting {
            *self = Self::Answered;
        }
    }

    fn reject(&mut self) {
        if *self == Self::Answered {
            *self = Self::Selecting;
        }
    }
}

/// Replays a fixed queue of tokens, then repeats a fallback token forever.
///
/// Once the script runs out inside an open menu the first option is chosen
/// instead, so a turn can always finish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptedCommands {
    tokens: VecDeque<String>,
    fallback: String,
    mode: Mode,
}

impl ScriptedCommands {
    /// Creates a script that ends every turn once `tokens` run out.
    #[must_use]
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            fallback: TurnCommand::EndTurn.label().to_owned(),
            mode: Mode::Commands,
        }
    }

    /// Replaces the token produced after the script is exhausted.
    #[must_use]
    pub fn with_fallback<S>(mut self, fallback: S) -> Self
    where
        S: Into<String>,
    {
        self.fallback = fallback.into();
        self
    }

    /// Appends a token to the end of the script.
    pub fn push<S>(&mut self, token: S)
    where
        S: Into<String>,
    {
        self.tokens.push_back(token.into());
    }

    /// Number of scripted tokens not yet replayed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.tokens.len()
    }
}

impl Default for ScriptedCommands {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl CommandSource for ScriptedCommands {
    fn next_token(&mut self) -> String {
        self.mode.settle();
        let token = match self.tokens.pop_front() {
            Some(token) => token,
            None if self.mode == Mode::Selecting => "0".to_owned(),
            None => self.fallback.clone(),
        };
        self.mode.answer();
        token
    }

    fn offer(&mut self, _commands: &[TurnCommand]) {
        self.mode = Mode::Commands;
    }

    fn present(&mut self, _menu: &str) {
        self.mode = Mode::Selecting;
    }

    fn reject(&mut self) {
        self.mode.reject();
    }
}

/// Line-oriented reader/writer pair shared by every prompt of a session.
///
/// Clones share the same streams, so several units and the quit prompt can
/// talk to one terminal without each locking standard input.
pub struct Console<R, W> {
    io: Rc<RefCell<ConsoleIo<R, W>>>,
}

struct ConsoleIo<R, W> {
    input: R,
    output: W,
}

impl<R, W> Console<R, W>
where
    R: BufRead,
    W: Write,
{
    /// Creates a console over the provided reader and writer.
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Rc::new(RefCell::new(ConsoleIo { input, output })),
        }
    }

    /// Writes `text` and flushes. Failures are logged and otherwise ignored.
    pub fn write_text(&self, text: &str) {
        let mut io = self.io.borrow_mut();
        if let Err(error) = io
            .output
            .write_all(text.as_bytes())
            .and_then(|()| io.output.flush())
        {
            tracing::warn!(%error, "failed to write to terminal");
        }
    }

    /// Reads one line without its line terminator.
    ///
    /// Returns `None` at end of input or when reading fails.
    pub fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        match self.io.borrow_mut().input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_owned()),
            Err(error) => {
                tracing::warn!(%error, "failed to read from terminal");
                None
            }
        }
    }

    /// Takes everything written so far, leaving an empty writer behind.
    pub fn take_output(&self) -> W
    where
        W: Default,
    {
        std::mem::take(&mut self.io.borrow_mut().output)
    }
}

impl Console<io::StdinLock<'static>, Stdout> {
    /// Creates a console bound to the process standard streams.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R, W> Clone for Console<R, W> {
    fn clone(&self) -> Self {
        Self {
            io: Rc::clone(&self.io),
        }
    }
}

impl<R, W> fmt::Debug for Console<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("handles", &Rc::strong_count(&self.io))
            .finish_non_exhaustive()
    }
}

/// Interactive command source reading one token per line from a [`Console`].
///
/// Menus handed to [`CommandSource::present`] are echoed to the console.
/// End of input ends the turn; if a menu is open its first option is
/// chosen so the turn can still finish.
pub struct TerminalCommands<R, W> {
    console: Console<R, W>,
    mode: Mode,
    offered: Vec<TurnCommand>,
}

impl<R, W> TerminalCommands<R, W>
where
    R: BufRead,
    W: Write,
{
    /// Creates a source reading from `console`.
    pub fn new(console: Console<R, W>) -> Self {
        Self {
            console,
            mode: Mode::Commands,
            offered: TurnCommand::ALL.to_vec(),
        }
    }
}

impl<R, W> fmt::Debug for TerminalCommands<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalCommands")
            .field("console", &self.console)
            .field("mode", &self.mode)
            .field("offered", &self.offered)
            .finish()
    }
}

impl<R, W> CommandSource for TerminalCommands<R, W>
where
    R: BufRead,
    W: Write,
{
    fn next_token(&mut self) -> String {
        self.mode.settle();

        let selecting = self.mode == Mode::Selecting;
        if selecting {
            self.console.write_text(SELECTION_PROMPT);
        } else {
            self.console.write_text(&command_prompt(&self.offered));
        }

        let token = match self.console.read_line() {
            Some(token) => token,
            None if selecting => {
                tracing::debug!("input closed during selection; taking first option");
                "0".to_owned()
            }
            None => {
                tracing::debug!("input closed; ending turn");
                TurnCommand::EndTurn.label().to_owned()
            }
        };

        self.mode.answer();
        token
    }

    fn offer(&mut self, commands: &[TurnCommand]) {
        self.offered = commands.to_vec();
        self.mode = Mode::Commands;
    }

    fn present(&mut self, menu: &str) {
        self.console.write_text(menu);
        self.mode = Mode::Selecting;
    }

    fn reject(&mut self) {
        self.console.write_text(INVALID_SELECTION);
        self.console.write_text("\n");
        self.mode.reject();
    }
}

/// Decides when a battle loop should stop.
///
/// Evaluated once after every completed turn.
pub trait Termination {
    /// Returns `true` once the loop should stop.
    fn should_stop(&mut self, battle: &mut Battle) -> bool;
}

/// Stops the loop once any team has been wiped out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefeatCheck;

impl Termination for DefeatCheck {
    fn should_stop(&mut self, battle: &mut Battle) -> bool {
        let defeated = battle.defeat_check();
        if defeated {
            tracing::info!("a team has been defeated");
        }
        defeated
    }
}

/// Asks a human whether to stop after every turn. Only `y` stops.
///
/// End of input stops the loop.
#[derive(Clone, Debug)]
pub struct QuitPrompt<R, W> {
    console: Console<R, W>,
}

impl<R, W> QuitPrompt<R, W>
where
    R: BufRead,
    W: Write,
{
    /// Creates a prompt asking through `console`.
    pub fn new(console: Console<R, W>) -> Self {
        Self { console }
    }
}

impl<R, W> Termination for QuitPrompt<R, W>
where
    R: BufRead,
    W: Write,
{
    fn should_stop(&mut self, _battle: &mut Battle) -> bool {
        self.console.write_text(QUIT_QUESTION);
        self.console
            .read_line()
            .map_or(true, |answer| answer.trim() == "y")
    }
}

/// Stops the loop after a fixed number of turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnLimit {
    remaining: u32,
}

impl TurnLimit {
    /// Allows `turns` turns before stopping.
    #[must_use]
    pub const fn new(turns: u32) -> Self {
        Self { remaining: turns }
    }

    /// Turns left before the limit stops the loop.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Termination for TurnLimit {
    fn should_stop(&mut self, _battle: &mut Battle) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            tracing::info!("turn limit reached");
            return true;
        }
        false
    }
}

/// Stops as soon as either predicate asks to.
///
/// Both predicates are evaluated every turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Either<A, B>(pub A, pub B);

impl<A, B> Termination for Either<A, B>
where
    A: Termination,
    B: Termination,
{
    fn should_stop(&mut self, battle: &mut Battle) -> bool {
        let first = self.0.should_stop(battle);
        let second = self.1.should_stop(battle);
        first || second
    }
}

/// Runs `battle` until `termination` asks it to stop.
pub fn run_until<T>(battle: &mut Battle, termination: &mut T) -> Result<(), BattleError>
where
    T: Termination + ?Sized,
{
    battle.run(|battle| termination.should_stop(battle))
}
