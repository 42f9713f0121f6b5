//! Combat participants and their per-turn state machine.

use skirmish_core::{
    BattleError, BattleId, CommandSource, Event, Node, TurnCommand, UnitError, UnitId,
};
use skirmish_menu::Menu;

use crate::{
    combat::{resolve_melee, DamageRule, HitRule},
    Battle, Grid,
};

/// Numeric characteristics fixed when a unit is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitStats {
    /// Initiative gained per tick.
    pub speed: u32,
    /// Chessboard radius reachable by a single move.
    pub move_speed: u32,
    /// Hit points of a healthy unit.
    pub max_hp: i32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            speed: 5,
            move_speed: 2,
            max_hp: 100,
        }
    }
}

/// Progress of a unit through its turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TurnPhase {
    /// The unit has not taken a turn yet.
    #[default]
    NotStarted,
    /// The turn began; neither a move nor an action was taken.
    Ready,
    /// The unit moved and may still act.
    AwaitingAction,
    /// The unit acted and may still move.
    AwaitingMove,
    /// The unit moved and acted; only ending the turn remains.
    Spent,
    /// The unit ended its turn.
    Finished,
}

impl TurnPhase {
    /// Reports whether a move was taken this turn.
    #[must_use]
    pub const fn has_moved(self) -> bool {
        matches!(self, Self::AwaitingAction | Self::Spent)
    }

    /// Reports whether an action was taken this turn.
    #[must_use]
    pub const fn has_acted(self) -> bool {
        matches!(self, Self::AwaitingMove | Self::Spent)
    }

    /// Reports whether the turn is over.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }

    const fn after_move(self) -> Self {
        match self {
            Self::NotStarted | Self::Ready | Self::AwaitingAction => Self::AwaitingAction,
            Self::AwaitingMove | Self::Spent => Self::Spent,
            Self::Finished => Self::Finished,
        }
    }

    const fn after_action(self) -> Self {
        match self {
            Self::NotStarted | Self::Ready | Self::AwaitingMove => Self::AwaitingMove,
            Self::AwaitingAction | Self::Spent => Self::Spent,
            Self::Finished => Self::Finished,
        }
    }
}

/// Non-owning link from a unit to the battle it joined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Membership {
    /// Battle the unit belongs to.
    pub battle: BattleId,
    /// Identifier of the unit inside that battle.
    pub unit: UnitId,
}

/// Mutable combat entity with position, health and initiative.
#[derive(Debug)]
pub struct Unit {
    name: String,
    speed: u32,
    ct: u32,
    move_speed: u32,
    max_hp: i32,
    current_hp: i32,
    alive: bool,
    location: Option<Node>,
    phase: TurnPhase,
    membership: Option<Membership>,
    controller: Option<Box<dyn CommandSource>>,
}

impl Unit {
    /// Creates a healthy unit with default statistics.
    #[must_use]
    pub fn new<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        let stats = UnitStats::default();
        Self {
            name: name.into(),
            speed: stats.speed,
            ct: 0,
            move_speed: stats.move_speed,
            max_hp: stats.max_hp,
            current_hp: stats.max_hp,
            alive: true,
            location: None,
            phase: TurnPhase::NotStarted,
            membership: None,
            controller: None,
        }
    }

    /// Creates a healthy unit with the provided statistics.
    ///
    /// Speed must be positive and `max_hp` must be above zero.
    pub fn with_stats<S>(name: S, stats: UnitStats) -> Result<Self, UnitError>
    where
        S: Into<String>,
    {
        if stats.speed == 0 {
            return Err(UnitError::ZeroSpeed);
        }
        if stats.max_hp <= 0 {
            return Err(UnitError::InvalidMaxHp(stats.max_hp));
        }

        let mut unit = Self::new(name);
        unit.speed = stats.speed;
        unit.move_speed = stats.move_speed;
        unit.max_hp = stats.max_hp;
        unit.current_hp = stats.max_hp;
        Ok(unit)
    }

    /// Starts the unit with accumulated initiative.
    #[must_use]
    pub fn with_initiative(mut self, ct: u32) -> Self {
        self.ct = ct;
        self
    }

    /// Attaches the command source used when the battle runs unattended.
    #[must_use]
    pub fn with_controller<C>(mut self, controller: C) -> Self
    where
        C: CommandSource + 'static,
    {
        self.controller = Some(Box::new(controller));
        self
    }

    /// Label of the unit.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initiative gained per tick.
    #[must_use]
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Current initiative counter.
    #[must_use]
    pub const fn ct(&self) -> u32 {
        self.ct
    }

    /// Chessboard radius reachable by a single move.
    #[must_use]
    pub const fn move_speed(&self) -> u32 {
        self.move_speed
    }

    /// Hit points of a healthy unit.
    #[must_use]
    pub const fn max_hp(&self) -> i32 {
        self.max_hp
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn current_hp(&self) -> i32 {
        self.current_hp
    }

    /// Whether the unit is still fighting.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Current location, unset until the unit joins a battle.
    #[must_use]
    pub const fn location(&self) -> Option<Node> {
        self.location
    }

    /// Progress through the current or most recent turn.
    #[must_use]
    pub const fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Battle membership, set once when the unit joins.
    #[must_use]
    pub const fn membership(&self) -> Option<Membership> {
        self.membership
    }

    /// Identifier assigned by the battle the unit joined.
    #[must_use]
    pub fn id(&self) -> Option<UnitId> {
        self.membership.map(|membership| membership.unit)
    }

    /// Whether the unit carries its own command source.
    #[must_use]
    pub fn has_controller(&self) -> bool {
        self.controller.is_some()
    }

    /// Joins `battle` at `(x, y)`, handing ownership of the unit to it.
    pub fn join_battle(self, battle: &mut Battle, x: u32, y: u32) -> Result<UnitId, BattleError> {
        battle.join(self, x, y)
    }

    /// Nodes the unit may move to, limited only by its movement range.
    #[must_use]
    pub fn legal_moves<'g>(&self, grid: &'g Grid) -> Vec<&'g Node> {
        match self.location {
            Some(location) => grid.neighbors(&location, self.move_speed),
            None => Vec::new(),
        }
    }

    /// Commands worth offering in the current phase.
    ///
    /// The list is advisory; [`Unit::action_parse`] does not enforce it.
    #[must_use]
    pub fn possible_actions(&self) -> Vec<TurnCommand> {
        let mut options = Vec::with_capacity(3);
        if !self.phase.has_moved() {
            options.push(TurnCommand::Move);
        }
        if !self.phase.has_acted() {
            options.push(TurnCommand::Action);
        }
        options.push(TurnCommand::EndTurn);
        options
    }

    /// Places the unit on `node` and records the move.
    ///
    /// The destination is not checked against [`Unit::legal_moves`].
    pub fn move_to(&mut self, node: Node) {
        self.location = Some(node);
        self.phase = self.phase.after_move();
    }

    /// Records that the unit took its action this turn.
    pub fn record_action(&mut self) {
        self.phase = self.phase.after_action();
    }

    /// Runs one activation, pulling commands from `source` until the unit
    /// ends its turn, then resets its initiative.
    pub fn turn<S>(&mut self, grid: &Grid, source: &mut S, out_events: &mut Vec<Event>)
    where
        S: CommandSource + ?Sized,
    {
        self.phase = TurnPhase::Ready;
        if let Some(unit) = self.id() {
            out_events.push(Event::TurnStarted { unit });
        }
        tracing::info!(unit = %self.name, ct = self.ct, "turn started");

        while !self.phase.is_finished() {
            source.offer(&self.possible_actions());
            let token = source.next_token();
            self.action_parse(&token, grid, source, out_events);
        }

        self.ct = 0;
        if let Some(unit) = self.id() {
            out_events.push(Event::TurnEnded { unit });
        }
        tracing::info!(unit = %self.name, "turn ended");
    }

    /// Dispatches a single command token.
    ///
    /// `Move` opens the movement menu and `End Turn` finishes the turn. Every
    /// other token, `Action` included, is ignored.
    pub fn action_parse<S>(
        &mut self,
        token: &str,
        grid: &Grid,
        source: &mut S,
        out_events: &mut Vec<Event>,
    ) where
        S: CommandSource + ?Sized,
    {
        match TurnCommand::parse(token) {
            Some(TurnCommand::Move) => self.execute_move_command(grid, source, out_events),
            Some(TurnCommand::EndTurn) => self.phase = TurnPhase::Finished,
            Some(TurnCommand::Action) | None => {
                tracing::debug!(unit = %self.name, token, "ignored command");
                if let Some(unit) = self.id() {
                    out_events.push(Event::CommandIgnored {
                        unit,
                        token: token.to_owned(),
                    });
                }
            }
        }
    }

    fn execute_move_command<S>(&mut self, grid: &Grid, source: &mut S, out_events: &mut Vec<Event>)
    where
        S: CommandSource + ?Sized,
    {
        let menu = Menu::new(self.legal_moves(grid), "Move to");
        if menu.is_empty() {
            tracing::warn!(unit = %self.name, "no legal moves; move skipped");
            return;
        }

        let destination = *menu.prompt(source);
        let from = self.location;
        self.move_to(destination);

        if let (Some(unit), Some(from)) = (self.id(), from) {
            out_events.push(Event::UnitMoved {
                unit,
                from,
                to: destination,
            });
        }
        tracing::debug!(unit = %self.name, to = %destination, "moved");
    }

    /// Adjusts hit points by `amount`, clamping to the valid range.
    ///
    /// Reaching zero or below kills the unit.
    pub fn update_hp(&mut self, amount: i32) {
        let new_hp = self.current_hp.saturating_add(amount);
        if new_hp <= 0 {
            self.die();
        } else if new_hp >= self.max_hp {
            self.current_hp = self.max_hp;
        } else {
            self.current_hp = new_hp;
        }
    }

    /// Kills the unit. It stays in every roster it belongs to.
    pub fn die(&mut self) {
        self.current_hp = 0;
        self.alive = false;
    }

    /// Attacks `target`, applying `damage` when `hit` says the blow lands.
    pub fn melee_atk<H, D>(&self, target: &mut Unit, hit: &H, damage: &D)
    where
        H: HitRule + ?Sized,
        D: DamageRule + ?Sized,
    {
        if let Some(amount) = resolve_melee(target, hit, damage) {
            tracing::debug!(attacker = %self.name, target = %target.name, amount, "melee hit");
        }
    }

    pub(crate) fn join(&mut self, membership: Membership, location: Node) {
        self.membership = Some(membership);
        self.location = Some(location);
    }

    pub(crate) fn advance_initiative(&mut self) -> u32 {
        self.ct = self.ct.saturating_add(self.speed);
        self.ct
    }

    pub(crate) fn take_controller(&mut self) -> Option<Box<dyn CommandSource>> {
        self.controller.take()
    }

    pub(crate) fn restore_controller(&mut self, controller: Box<dyn CommandSource>) {
        self.controller = Some(controller);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::combat::{AlwaysHit, FixedDamage};

    #[derive(Debug)]
    struct Tokens(VecDeque<&'static str>);

    impl CommandSource for Tokens {
        fn next_token(&mut self) -> String {
            self.0.pop_front().unwrap_or("End Turn").to_owned()
        }
    }

    #[test]
    fn defaults_match_a_fresh_recruit() {
        let unit = Unit::new("A");
        assert_eq!(unit.speed(), 5);
        assert_eq!(unit.move_speed(), 2);
        assert_eq!(unit.current_hp(), 100);
        assert_eq!(unit.max_hp(), 100);
        assert!(unit.is_alive());
        assert_eq!(unit.location(), None);
        assert_eq!(unit.phase(), TurnPhase::NotStarted);
    }

    #[test]
    fn construction_rejects_broken_stats() {
        let stalled = UnitStats {
            speed: 0,
            ..UnitStats::default()
        };
        assert_eq!(
            Unit::with_stats("A", stalled).err(),
            Some(UnitError::ZeroSpeed)
        );

        let hollow = UnitStats {
            max_hp: 0,
            ..UnitStats::default()
        };
        assert_eq!(
            Unit::with_stats("A", hollow).err(),
            Some(UnitError::InvalidMaxHp(0))
        );
    }

    #[test]
    fn update_hp_clamps_and_kills() {
        let mut unit = Unit::new("A");
        unit.update_hp(-20);
        assert_eq!(unit.current_hp(), 80);
        unit.update_hp(30);
        assert_eq!(unit.current_hp(), 100);
        unit.update_hp(-110);
        assert_eq!(unit.current_hp(), 0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn die_zeroes_hp() {
        let mut unit = Unit::new("A");
        unit.die();
        assert_eq!(unit.current_hp(), 0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn melee_respects_hit_rule() {
        let attacker = Unit::new("A");
        let mut target = Unit::new("B");

        attacker.melee_atk(&mut target, &|_: &Unit| false, &FixedDamage::MELEE);
        assert_eq!(target.current_hp(), 100);

        attacker.melee_atk(&mut target, &AlwaysHit, &FixedDamage::MELEE);
        assert_eq!(target.current_hp(), 90);
    }

    #[test]
    fn possible_actions_shrink_as_the_turn_progresses() {
        let mut unit = Unit::new("A");
        assert_eq!(
            unit.possible_actions(),
            vec![TurnCommand::Move, TurnCommand::Action, TurnCommand::EndTurn]
        );

        unit.move_to(Node::new(1, 1));
        assert_eq!(
            unit.possible_actions(),
            vec![TurnCommand::Action, TurnCommand::EndTurn]
        );

        unit.record_action();
        assert_eq!(unit.phase(), TurnPhase::Spent);
        assert_eq!(unit.possible_actions(), vec![TurnCommand::EndTurn]);
    }

    #[test]
    fn phase_transitions_are_order_independent() {
        assert_eq!(
            TurnPhase::Ready.after_action().after_move(),
            TurnPhase::Ready.after_move().after_action()
        );
        assert_eq!(TurnPhase::Finished.after_move(), TurnPhase::Finished);
    }

    #[test]
    fn turn_resets_initiative_and_ignores_unknown_tokens() {
        let grid = Grid::new(5, 5).expect("valid grid");
        let mut unit = Unit::new("A").with_initiative(250);
        unit.move_to(Node::new(2, 2));
        let mut source = Tokens(VecDeque::from(["Action", "Dance", "End Turn"]));
        let mut events = Vec::new();

        unit.turn(&grid, &mut source, &mut events);

        assert_eq!(unit.ct(), 0);
        assert!(unit.phase().is_finished());
        assert!(!unit.phase().has_acted(), "Action is advisory only");
        assert!(source.0.is_empty());
        assert!(events.is_empty(), "unjoined units record no events");
    }

    #[test]
    fn move_command_selects_from_legal_moves() {
        let grid = Grid::new(3, 3).expect("valid grid");
        let mut unit = Unit::with_stats(
            "A",
            UnitStats {
                move_speed: 1,
                ..UnitStats::default()
            },
        )
        .expect("valid stats");
        unit.move_to(Node::new(0, 0));
        let expected = *unit.legal_moves(&grid)[1];
        let mut source = Tokens(VecDeque::from(["Move", "x", "1", "End Turn"]));
        let mut events = Vec::new();

        unit.turn(&grid, &mut source, &mut events);

        assert_eq!(unit.location(), Some(expected));
        assert!(unit.phase().is_finished());
    }

    #[derive(Debug, Default)]
    struct OfferLog {
        tokens: VecDeque<&'static str>,
        offers: Vec<Vec<TurnCommand>>,
    }

    impl CommandSource for OfferLog {
        fn next_token(&mut self) -> String {
            self.tokens.pop_front().unwrap_or("End Turn").to_owned()
        }

        fn offer(&mut self, commands: &[TurnCommand]) {
            self.offers.push(commands.to_vec());
        }
    }

    #[test]
    fn turn_offers_shrink_after_a_move() {
        let grid = Grid::new(3, 3).expect("valid grid");
        let mut unit = Unit::new("A");
        unit.move_to(Node::new(1, 1));
        let mut source = OfferLog {
            tokens: VecDeque::from(["Move", "0", "End Turn"]),
            ..OfferLog::default()
        };

        unit.turn(&grid, &mut source, &mut Vec::new());

        assert_eq!(
            source.offers,
            vec![
                TurnCommand::ALL.to_vec(),
                vec![TurnCommand::Action, TurnCommand::EndTurn],
            ],
            "a command is offered before every top-level token",
        );
    }

    #[test]
    fn move_is_skipped_when_nothing_is_reachable() {
        let grid = Grid::new(1, 1).expect("valid grid");
        let mut unit = Unit::new("A");
        unit.move_to(Node::new(0, 0));
        let mut source = Tokens(VecDeque::from(["Move", "End Turn"]));
        let mut events = Vec::new();

        unit.turn(&grid, &mut source, &mut events);

        assert_eq!(unit.location(), Some(Node::new(0, 0)));
        assert!(source.0.is_empty(), "End Turn consumed after skipped move");
    }
}
