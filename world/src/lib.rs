#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battle state management for Skirmish.
//!
//! A [`Battle`] owns the [`Grid`], every joined [`Unit`] and the [`Team`]
//! rosters. Its initiative scheduler ticks units until one crosses
//! [`INITIATIVE_THRESHOLD`], hands that unit a turn driven by a
//! [`CommandSource`], and records [`Event`] values that adapters drain.

mod combat;
mod grid;
mod team;
mod unit;

use std::sync::atomic::{AtomicU32, Ordering};

use skirmish_core::{
    BattleError, BattleId, CommandSource, Event, TeamId, UnitId, INITIATIVE_THRESHOLD,
};

pub use combat::{AlwaysHit, DamageRule, FixedDamage, HitRule};
pub use grid::Grid;
pub use team::Team;
pub use unit::{Membership, TurnPhase, Unit, UnitStats};

static NEXT_BATTLE_ID: AtomicU32 = AtomicU32::new(0);

/// Turn-based engagement between units placed on a shared grid.
#[derive(Debug)]
pub struct Battle {
    id: BattleId,
    grid: Grid,
    units: Vec<Unit>,
    teams: Vec<Team>,
    active_unit: Option<UnitId>,
    events: Vec<Event>,
}

impl Battle {
    /// Creates an empty battle fought on `grid`.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            id: BattleId::new(NEXT_BATTLE_ID.fetch_add(1, Ordering::Relaxed)),
            grid,
            units: Vec::new(),
            teams: Vec::new(),
            active_unit: None,
            events: Vec::new(),
        }
    }

    /// Process-unique identifier of the battle.
    #[must_use]
    pub const fn id(&self) -> BattleId {
        self.id
    }

    /// Registers a new team and returns its identifier.
    pub fn add_team<S>(&mut self, name: S) -> TeamId
    where
        S: Into<String>,
    {
        let id = TeamId::new(u32::try_from(self.teams.len()).unwrap_or(u32::MAX));
        self.teams.push(Team::new(name));
        id
    }

    /// Places `unit` on the node at `(x, y)` and takes ownership of it.
    pub fn join(&mut self, unit: Unit, x: u32, y: u32) -> Result<UnitId, BattleError> {
        self.enlist(unit, None, x, y)
    }

    /// Places `unit` on the node at `(x, y)` as a member of `team`.
    pub fn join_team(
        &mut self,
        unit: Unit,
        team: TeamId,
        x: u32,
        y: u32,
    ) -> Result<UnitId, BattleError> {
        if team.index() >= self.teams.len() {
            return Err(BattleError::UnknownTeam(team));
        }
        self.enlist(unit, Some(team), x, y)
    }

    fn enlist(
        &mut self,
        mut unit: Unit,
        team: Option<TeamId>,
        x: u32,
        y: u32,
    ) -> Result<UnitId, BattleError> {
        let node = *self.grid.get_node(x, y)?;
        let id = UnitId::new(u32::try_from(self.units.len()).unwrap_or(u32::MAX));
        unit.join(
            Membership {
                battle: self.id,
                unit: id,
            },
            node,
        );
        tracing::debug!(unit = %unit.name(), %node, "unit joined battle");
        self.units.push(unit);

        if let Some(team) = team.and_then(|team| self.teams.get_mut(team.index())) {
            team.add(id);
        }
        self.events.push(Event::UnitJoined { unit: id, node });
        Ok(id)
    }

    /// Advances time by one tick.
    ///
    /// Every unit gains its speed in initiative, in join order. A unit ending
    /// the tick at or above the threshold takes the active slot; when several
    /// cross in the same tick the last one wins and the others keep their
    /// initiative.
    pub fn tick(&mut self) {
        let mut crossed = None;
        for (index, unit) in self.units.iter_mut().enumerate() {
            let ct = unit.advance_initiative();
            if ct >= INITIATIVE_THRESHOLD {
                crossed = Some((UnitId::new(u32::try_from(index).unwrap_or(u32::MAX)), ct));
            }
        }

        if let Some((unit, ct)) = crossed {
            self.active_unit = Some(unit);
            self.events.push(Event::UnitActivated { unit, ct });
            tracing::debug!(unit = unit.get(), ct, "unit activated");
        }
    }

    /// Ticks until a unit is active and returns it.
    ///
    /// Terminates because every unit has positive speed.
    pub fn advance(&mut self) -> Result<UnitId, BattleError> {
        if self.units.is_empty() {
            return Err(BattleError::NoUnits);
        }
        loop {
            if let Some(active) = self.active_unit {
                return Ok(active);
            }
            self.tick();
        }
    }

    /// Runs the next unit's turn with commands drawn from `source`.
    ///
    /// Returns the unit that took the turn. The active slot is empty again
    /// afterwards.
    pub fn next_turn<S>(&mut self, source: &mut S) -> Result<UnitId, BattleError>
    where
        S: CommandSource + ?Sized,
    {
        let active = self.advance()?;
        let unit = self
            .units
            .get_mut(active.index())
            .ok_or(BattleError::UnknownUnit(active))?;
        unit.turn(&self.grid, source, &mut self.events);
        self.active_unit = None;
        Ok(active)
    }

    /// Runs turns until `termination` returns `true`.
    ///
    /// Each turn is driven by the active unit's own controller. The
    /// predicate is evaluated once after every completed turn.
    pub fn run<F>(&mut self, mut termination: F) -> Result<(), BattleError>
    where
        F: FnMut(&mut Battle) -> bool,
    {
        loop {
            let active = self.advance()?;
            let mut controller = self
                .units
                .get_mut(active.index())
                .and_then(Unit::take_controller)
                .ok_or(BattleError::MissingController(active))?;

            let outcome = self.next_turn(&mut controller);
            if let Some(unit) = self.units.get_mut(active.index()) {
                unit.restore_controller(controller);
            }
            let _ = outcome?;

            if termination(self) {
                tracing::info!("battle loop finished");
                return Ok(());
            }
        }
    }

    /// Reports whether any registered team has been wiped out.
    pub fn defeat_check(&mut self) -> bool {
        let roster = &self.units;
        self.teams.iter_mut().any(|team| team.is_defeated(roster))
    }

    /// Resolves a melee attack from `attacker` against `target`.
    ///
    /// Returns the damage dealt, or `None` when the attack missed.
    pub fn melee<H, D>(
        &mut self,
        attacker: UnitId,
        target: UnitId,
        hit: &H,
        damage: &D,
    ) -> Result<Option<u32>, BattleError>
    where
        H: HitRule + ?Sized,
        D: DamageRule + ?Sized,
    {
        if attacker.index() >= self.units.len() {
            return Err(BattleError::UnknownUnit(attacker));
        }
        let defender = self
            .units
            .get_mut(target.index())
            .ok_or(BattleError::UnknownUnit(target))?;

        let was_alive = defender.is_alive();
        let dealt = combat::resolve_melee(defender, hit, damage);
        if let Some(amount) = dealt {
            self.events.push(Event::UnitDamaged {
                unit: target,
                amount,
                remaining: defender.current_hp(),
            });
            if was_alive && !defender.is_alive() {
                tracing::info!(unit = %defender.name(), "unit died");
                self.events.push(Event::UnitDied { unit: target });
            }
        }
        Ok(dealt)
    }

    /// Grid the battle is fought on.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Every joined unit in join order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Looks up a unit by identifier.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.index())
    }

    /// Mutable access to a unit, for scripted adjustments between turns.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id.index())
    }

    /// Registered teams in creation order.
    #[must_use]
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Unit currently holding the active slot.
    #[must_use]
    pub const fn active_unit(&self) -> Option<UnitId> {
        self.active_unit
    }

    /// Removes and returns the events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

/// Query functions that provide read-only access to the battle state.
pub mod query {
    use skirmish_core::{Node, UnitId};

    use super::{Battle, Grid};

    /// Provides read-only access to the battle grid.
    #[must_use]
    pub fn grid(battle: &Battle) -> &Grid {
        &battle.grid
    }

    /// Captures a read-only view of the units taking part in the battle.
    #[must_use]
    pub fn unit_view(battle: &Battle) -> UnitView {
        let snapshots = battle
            .units
            .iter()
            .enumerate()
            .map(|(index, unit)| UnitSnapshot {
                id: unit
                    .id()
                    .unwrap_or(UnitId::new(u32::try_from(index).unwrap_or(u32::MAX))),
                name: unit.name().to_owned(),
                location: unit.location(),
                ct: unit.ct(),
                current_hp: unit.current_hp(),
                max_hp: unit.max_hp(),
                alive: unit.is_alive(),
                active: battle.active_unit == unit.id(),
            })
            .collect();
        UnitView { snapshots }
    }

    /// Names of teams that have no living members.
    #[must_use]
    pub fn defeated_teams(battle: &Battle) -> Vec<&str> {
        battle
            .teams
            .iter()
            .filter(|team| {
                team.all_units().iter().all(|id| {
                    battle
                        .units
                        .get(id.index())
                        .map_or(true, |unit| !unit.is_alive())
                })
            })
            .map(|team| team.name())
            .collect()
    }

    /// Read-only snapshot describing every unit in join order.
    #[derive(Clone, Debug, Default)]
    pub struct UnitView {
        snapshots: Vec<UnitSnapshot>,
    }

    impl UnitView {
        /// Iterator over the captured unit snapshots in join order.
        pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<UnitSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single unit's state used for queries.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct UnitSnapshot {
        /// Identifier assigned by the battle.
        pub id: UnitId,
        /// Label of the unit.
        pub name: String,
        /// Node currently occupied by the unit.
        pub location: Option<Node>,
        /// Accumulated initiative.
        pub ct: u32,
        /// Remaining hit points.
        pub current_hp: i32,
        /// Hit points of a healthy unit.
        pub max_hp: i32,
        /// Whether the unit is still fighting.
        pub alive: bool,
        /// Whether the unit holds the active slot.
        pub active: bool,
    }
}
