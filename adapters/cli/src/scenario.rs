//! TOML scenario files describing the grid, teams and starting units.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use skirmish_core::{CommandSource, TeamId};
use skirmish_world::{Battle, Grid, Unit, UnitStats};

/// Complete starting state of a battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Battlefield dimensions.
    pub(crate) grid: GridConfig,
    /// Teams units may join by name.
    #[serde(default)]
    pub(crate) teams: Vec<TeamConfig>,
    /// Units in join order.
    pub(crate) units: Vec<UnitConfig>,
}

/// Battlefield dimensions in nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GridConfig {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Named team.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TeamConfig {
    pub(crate) name: String,
}

/// Starting state of a single unit. Omitted statistics use unit defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct UnitConfig {
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) team: Option<String>,
    pub(crate) x: u32,
    pub(crate) y: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) speed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) move_speed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) max_hp: Option<i32>,
    /// Tokens replayed by the scripted controller before it ends every turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) commands: Vec<String>,
}

impl UnitConfig {
    fn new(name: &str, x: u32, y: u32, speed: u32) -> Self {
        Self {
            name: name.to_owned(),
            team: None,
            x,
            y,
            speed: Some(speed),
            move_speed: None,
            max_hp: None,
            commands: Vec::new(),
        }
    }

    /// Statistics with scenario overrides applied to the defaults.
    pub(crate) fn stats(&self) -> UnitStats {
        let defaults = UnitStats::default();
        UnitStats {
            speed: self.speed.unwrap_or(defaults.speed),
            move_speed: self.move_speed.unwrap_or(defaults.move_speed),
            max_hp: self.max_hp.unwrap_or(defaults.max_hp),
        }
    }
}

impl Default for Scenario {
    /// Two lone units in opposite corners of a 10x10 field.
    fn default() -> Self {
        Self {
            grid: GridConfig {
                width: 10,
                height: 10,
            },
            teams: Vec::new(),
            units: vec![UnitConfig::new("A", 0, 0, 3), UnitConfig::new("B", 9, 9, 8)],
        }
    }
}

impl Scenario {
    /// Parses a scenario from TOML text.
    pub(crate) fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse scenario toml")
    }

    /// Reads and parses the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Loads `path` when provided, otherwise the built-in scenario.
    pub(crate) fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                tracing::debug!("using built-in scenario");
                Ok(Self::default())
            }
        }
    }

    /// Serialises the scenario back to TOML.
    pub(crate) fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialise scenario")
    }

    /// Creates the battle, attaching the controller built for every unit.
    pub(crate) fn build<F, C>(&self, mut controller: F) -> Result<Battle>
    where
        F: FnMut(&UnitConfig) -> C,
        C: CommandSource + 'static,
    {
        let grid = Grid::new(self.grid.width, self.grid.height).with_context(|| {
            format!(
                "invalid grid dimensions {}x{}",
                self.grid.width, self.grid.height
            )
        })?;
        let mut battle = Battle::new(grid);

        let mut teams: HashMap<&str, TeamId> = HashMap::new();
        for team in &self.teams {
            if teams.contains_key(team.name.as_str()) {
                bail!("team {:?} is declared twice", team.name);
            }
            let id = battle.add_team(team.name.as_str());
            let _ = teams.insert(team.name.as_str(), id);
        }

        for config in &self.units {
            let unit = Unit::with_stats(config.name.as_str(), config.stats())
                .with_context(|| format!("invalid statistics for unit {:?}", config.name))?
                .with_controller(controller(config));

            let placed = match config.team.as_deref() {
                Some(name) => {
                    let Some(&team) = teams.get(name) else {
                        bail!("unit {:?} joins unknown team {name:?}", config.name);
                    };
                    battle.join_team(unit, team, config.x, config.y)
                }
                None => battle.join(unit, config.x, config.y),
            };
            let _ = placed.with_context(|| format!("failed to place unit {:?}", config.name))?;
        }

        tracing::info!(
            units = battle.units().len(),
            teams = battle.teams().len(),
            "battle assembled"
        );
        Ok(battle)
    }
}

#[cfg(test)]
mod tests {
    use skirmish_core::Node;
    use skirmish_system_commands::ScriptedCommands;

    use super::*;

    fn scripted(config: &UnitConfig) -> ScriptedCommands {
        ScriptedCommands::new(config.commands.iter().cloned())
    }

    #[test]
    fn default_scenario_matches_the_demo_battle() {
        let battle = Scenario::default().build(scripted).expect("valid scenario");

        assert_eq!(battle.grid().width(), 10);
        assert_eq!(battle.grid().height(), 10);
        let units = battle.units();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].name(), "A");
        assert_eq!(units[0].speed(), 3);
        assert_eq!(units[0].location(), Some(Node::new(0, 0)));
        assert_eq!(units[1].name(), "B");
        assert_eq!(units[1].speed(), 8);
        assert_eq!(units[1].location(), Some(Node::new(9, 9)));
        assert!(units.iter().all(Unit::has_controller));
    }

    #[test]
    fn parses_teams_and_partial_statistics() {
        let scenario = Scenario::from_toml_str(
            r#"
            [grid]
            width = 6
            height = 4

            [[teams]]
            name = "Red"

            [[units]]
            name = "Scout"
            team = "Red"
            x = 5
            y = 3
            speed = 12
            commands = ["Move", "0"]
            "#,
        )
        .expect("valid toml");

        assert_eq!(scenario.units[0].stats().speed, 12);
        assert_eq!(scenario.units[0].stats().move_speed, 2);
        assert_eq!(scenario.units[0].stats().max_hp, 100);

        let battle = scenario.build(scripted).expect("valid scenario");
        assert_eq!(battle.teams()[0].all_units().len(), 1);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = Scenario::from_toml_str(
            r#"
            units = []

            [grid]
            width = 2
            height = 2
            depth = 2
            "#,
        );
        assert!(error.is_err());
    }

    #[test]
    fn build_reports_bad_placements_and_teams() {
        let mut scenario = Scenario::default();
        scenario.units[1].x = 10;
        let message = format!("{:#}", scenario.build(scripted).expect_err("out of bounds"));
        assert!(message.contains("\"B\""), "error should name the unit: {message}");

        let mut scenario = Scenario::default();
        scenario.units[0].team = Some("Ghosts".to_owned());
        assert!(scenario.build(scripted).is_err());

        let mut scenario = Scenario::default();
        scenario.units[0].speed = Some(0);
        assert!(scenario.build(scripted).is_err());
    }

    #[test]
    fn default_scenario_survives_toml() {
        let scenario = Scenario::default();
        let text = scenario.to_toml().expect("serialisable");
        assert_eq!(Scenario::from_toml_str(&text).expect("parsable"), scenario);
    }
}
