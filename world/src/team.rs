//! Unit groupings that share a defeat condition.

use skirmish_core::UnitId;

use crate::Unit;

/// Group of units fighting on the same side.
///
/// The team only records identifiers; live and dead views are recomputed
/// from the battle roster by [`Team::live_update`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Team {
    name: String,
    all_units: Vec<UnitId>,
    live_units: Vec<UnitId>,
    dead_units: Vec<UnitId>,
}

impl Team {
    /// Creates an empty team.
    #[must_use]
    pub fn new<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Display name of the team.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a unit to the team. Repeated additions are ignored.
    pub fn add(&mut self, unit: UnitId) {
        if !self.all_units.contains(&unit) {
            self.all_units.push(unit);
        }
    }

    /// Every member in insertion order.
    #[must_use]
    pub fn all_units(&self) -> &[UnitId] {
        &self.all_units
    }

    /// Members found alive by the last [`Team::live_update`].
    #[must_use]
    pub fn live_units(&self) -> &[UnitId] {
        &self.live_units
    }

    /// Members found dead by the last [`Team::live_update`].
    #[must_use]
    pub fn dead_units(&self) -> &[UnitId] {
        &self.dead_units
    }

    /// Reclassifies every member as live or dead using `roster`.
    ///
    /// `roster` is indexed by [`UnitId`]. Members missing from it are left
    /// out of both views.
    pub fn live_update(&mut self, roster: &[Unit]) {
        self.live_units.clear();
        self.dead_units.clear();

        for &id in &self.all_units {
            match roster.get(id.index()) {
                Some(unit) if unit.is_alive() => self.live_units.push(id),
                Some(_) => self.dead_units.push(id),
                None => tracing::warn!(team = %self.name, unit = id.get(), "member missing from roster"),
            }
        }
    }

    /// Reports whether no member is left alive.
    ///
    /// An empty team is defeated.
    pub fn is_defeated(&mut self, roster: &[Unit]) -> bool {
        self.live_update(roster);
        self.live_units.is_empty()
    }
}
