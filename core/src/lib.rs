#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Skirmish engine.
//!
//! This crate defines the vocabulary that connects adapters, the
//! authoritative battle state, and command sources. Command sources produce
//! textual [`TurnCommand`] tokens, the world interprets them while a unit is
//! active, and records [`Event`] values that adapters drain for logging and
//! presentation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Initiative a unit must accumulate before it becomes the active unit.
pub const INITIATIVE_THRESHOLD: u32 = 100;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Skirmish.";

/// Single addressable cell of the battle grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node {
    x: u32,
    y: u32,
}

impl Node {
    /// Creates a node located at the provided column and row.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the node.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the node.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Chessboard distance between two nodes.
    #[must_use]
    pub fn chebyshev_distance(self, other: Node) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}, {})", self.x, self.y)
    }
}

/// Identifier of a unit within the battle it joined.
///
/// Units are numbered in join order, so the identifier doubles as the
/// unit's position in the battle roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Roster index addressed by the identifier.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a team registered with a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(u32);

impl TeamId {
    /// Creates a new team identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Team list index addressed by the identifier.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Process-unique identifier of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BattleId(u32);

impl BattleId {
    /// Creates a new battle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Top-level decisions a unit may take during its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnCommand {
    /// Relocate within movement range.
    Move,
    /// Perform an action. Currently advisory only.
    Action,
    /// Yield control back to the scheduler.
    EndTurn,
}

impl TurnCommand {
    /// Every command in presentation order.
    pub const ALL: [Self; 3] = [Self::Move, Self::Action, Self::EndTurn];

    /// Label presented to players and expected back from command sources.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Move => "Move",
            Self::Action => "Action",
            Self::EndTurn => "End Turn",
        }
    }

    /// Interprets a command token, matching labels exactly.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "Move" => Some(Self::Move),
            "Action" => Some(Self::Action),
            "End Turn" => Some(Self::EndTurn),
            _ => None,
        }
    }
}

impl fmt::Display for TurnCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Supplies the decisions taken by a unit while it is active.
///
/// Implementations may block while awaiting a decision. Tokens are either a
/// [`TurnCommand`] label or, while a menu is open, a selection index as text.
pub trait CommandSource: fmt::Debug {
    /// Produces the next command token.
    fn next_token(&mut self) -> String;

    /// Announces the commands worth offering before a command token is
    /// requested. A presented menu stays open until this is called again.
    fn offer(&mut self, _commands: &[TurnCommand]) {}

    /// Shows a rendered menu before selections are requested.
    fn present(&mut self, _menu: &str) {}

    /// Notifies the source that its last token was not a valid selection.
    fn reject(&mut self) {}
}

impl<T: CommandSource + ?Sized> CommandSource for Box<T> {
    fn next_token(&mut self) -> String {
        (**self).next_token()
    }

    fn offer(&mut self, commands: &[TurnCommand]) {
        (**self).offer(commands);
    }

    fn present(&mut self, menu: &str) {
        (**self).present(menu);
    }

    fn reject(&mut self) {
        (**self).reject();
    }
}

/// Events recorded by the battle while it processes ticks and turns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A unit entered the battle.
    UnitJoined {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Initial location of the unit.
        node: Node,
    },
    /// A unit crossed the initiative threshold and took the active slot.
    UnitActivated {
        /// Unit that became active.
        unit: UnitId,
        /// Initiative held by the unit at activation.
        ct: u32,
    },
    /// The active unit began its turn.
    TurnStarted {
        /// Unit taking the turn.
        unit: UnitId,
    },
    /// A unit changed location.
    UnitMoved {
        /// Unit that moved.
        unit: UnitId,
        /// Location before the move.
        from: Node,
        /// Location after the move.
        to: Node,
    },
    /// A command token was received but has no effect.
    CommandIgnored {
        /// Unit whose command source produced the token.
        unit: UnitId,
        /// Token that was ignored.
        token: String,
    },
    /// The active unit finished its turn and had its initiative reset.
    TurnEnded {
        /// Unit that ended its turn.
        unit: UnitId,
    },
    /// A unit's hit points changed as the result of an attack.
    UnitDamaged {
        /// Unit that was hit.
        unit: UnitId,
        /// Damage dealt by the attack.
        amount: u32,
        /// Hit points remaining after the attack.
        remaining: i32,
    },
    /// A unit's hit points reached zero.
    UnitDied {
        /// Unit that died.
        unit: UnitId,
    },
}

/// Failures raised by grid construction and coordinate queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// Dimensions or coordinates fall outside the valid grid range.
    #[error("coordinate ({x}, {y}) is outside a {width}x{height} grid")]
    OutOfBounds {
        /// Requested column, or width during construction.
        x: u32,
        /// Requested row, or height during construction.
        y: u32,
        /// Grid width at the time of the request.
        width: u32,
        /// Grid height at the time of the request.
        height: u32,
    },
}

/// Precondition violations detected when constructing a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum UnitError {
    /// A unit without speed never reaches the initiative threshold.
    #[error("unit speed must be positive")]
    ZeroSpeed,
    /// Maximum hit points must be positive.
    #[error("unit max hp must be positive (received {0})")]
    InvalidMaxHp(i32),
}

/// Failures surfaced by battle operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BattleError {
    /// A grid query failed.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// A unit could not be constructed.
    #[error(transparent)]
    Unit(#[from] UnitError),
    /// No unit with the provided identifier exists.
    #[error("unknown unit {0:?}")]
    UnknownUnit(UnitId),
    /// No team with the provided identifier exists.
    #[error("unknown team {0:?}")]
    UnknownTeam(TeamId),
    /// The scheduler cannot advance without units.
    #[error("battle has no units to schedule")]
    NoUnits,
    /// The active unit carries no command source of its own.
    #[error("unit {0:?} has no controller")]
    MissingController(UnitId),
}

/// Reasons a menu selection token was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The token is not a non-negative integer.
    #[error("{0:?} is not a number")]
    NotANumber(String),
    /// The index does not address an option.
    #[error("selection {index} is outside 0..{len}")]
    OutOfRange {
        /// Parsed index.
        index: usize,
        /// Number of options offered.
        len: usize,
    },
}
