/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

#![warn(missing_docs)]

//! Robot localization in the grid world with a discrete Bayes filter.
//!
//! The robot does not know where it is. It carries four wall sensors (west, north, east, south)
//! that are each right most of the time, and its motion drifts. The belief over cells is kept up
//! to date by alternating a sensing update (filtering) and a motion update (prediction).
//!
//! See:
//! -  Chapter 14: Probabilistic Reasoning over Time, page 485 (filtering and prediction).

use std::str::FromStr;

use grid_world::{Cell, Direction, GridMap, GridWorld, GridWorldError, MotionModel, Position};
use serde::{Deserialize, Serialize};

/// Localization error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocalizationError {
    /// A sensor probability is not in [0, 1].
    #[error("sensor probability must be in [0, 1], got {0}")]
    InvalidSensorModel(f64),

    /// The world has nowhere to be.
    #[error("world has no open cells")]
    NoOpenCells,

    /// No cell could have produced the evidence.
    #[error("evidence {0} has zero probability in every cell")]
    ZeroEvidenceMass(Evidence),

    /// Evidence text is not a list of four 0/1 readings.
    #[error("cannot parse evidence: {0:?}")]
    InvalidEvidence(String),

    /// Underlying grid world error.
    #[error(transparent)]
    GridWorld(#[from] GridWorldError),
}

/// Wall sensor accuracy. Each of the four sensors reads independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SensorModelParameters")]
pub struct SensorModel {
    wall_detected: f64,
    open_detected: f64,
}

#[derive(Deserialize)]
struct SensorModelParameters {
    wall_detected: f64,
    open_detected: f64,
}

impl TryFrom<SensorModelParameters> for SensorModel {
    type Error = LocalizationError;

    fn try_from(parameters: SensorModelParameters) -> Result<Self, Self::Error> {
        Self::new(parameters.wall_detected, parameters.open_detected)
    }
}

impl Default for SensorModel {
    fn default() -> Self {
        Self {
            wall_detected: 0.75,
            open_detected: 0.8,
        }
    }
}

impl SensorModel {
    /// `wall_detected` is P(sense wall | wall), `open_detected` is P(sense open | open).
    pub fn new(wall_detected: f64, open_detected: f64) -> Result<Self, LocalizationError> {
        for p in [wall_detected, open_detected] {
            if !(0.0..=1.0).contains(&p) {
                return Err(LocalizationError::InvalidSensorModel(p));
            }
        }
        Ok(Self {
            wall_detected,
            open_detected,
        })
    }

    /// P(reading | truth) for a single sensor.
    pub fn reading_probability(&self, is_wall: bool, sensed_wall: bool) -> f64 {
        match (is_wall, sensed_wall) {
            (true, true) => self.wall_detected,
            (true, false) => 1.0 - self.wall_detected,
            (false, false) => self.open_detected,
            (false, true) => 1.0 - self.open_detected,
        }
    }
}

/// One reading of all four wall sensors, in West, North, East, South order. `true` means the
/// sensor reported a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Evidence([bool; 4]);

impl Evidence {
    /// Create evidence from readings in West, North, East, South order.
    pub fn new(walls: [bool; 4]) -> Self {
        Self(walls)
    }

    /// Whether the sensor facing `direction` reported a wall.
    pub fn wall_sensed(&self, direction: Direction) -> bool {
        self.0[direction.index()]
    }
}

// "[1, 1, 0, 1]"
impl std::fmt::Display for Evidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let readings = self
            .0
            .iter()
            .map(|&wall| if wall { "1" } else { "0" })
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "[{}]", readings)
    }
}

impl FromStr for Evidence {
    type Err = LocalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LocalizationError::InvalidEvidence(s.to_string());
        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(invalid)?;
        let readings = inner
            .split(',')
            .map(|reading| match reading.trim() {
                "0" => Ok(false),
                "1" => Ok(true),
                _ => Err(invalid()),
            })
            .collect::<Result<Vec<bool>, _>>()?;
        let walls: [bool; 4] = readings.try_into().map_err(|_| invalid())?;
        Ok(Self(walls))
    }
}

/// P(evidence | robot at position).
pub fn likelihood(
    world: &GridWorld,
    sensor: &SensorModel,
    evidence: &Evidence,
    position: Position,
) -> f64 {
    Direction::ALL
        .iter()
        .map(|&direction| {
            sensor.reading_probability(
                world.is_blocked(position, direction),
                evidence.wall_sensed(direction),
            )
        })
        .product()
}

/// Probability distribution over cells. Obstacles have no entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    probabilities: GridMap<Option<f64>>,
}

impl Belief {
    /// Every open cell equally likely.
    pub fn uniform(world: &GridWorld) -> Result<Self, LocalizationError> {
        let open_cells = world.open_positions().len();
        if open_cells == 0 {
            return Err(LocalizationError::NoOpenCells);
        }
        let p = 1.0 / open_cells as f64;
        Ok(Self {
            probabilities: world.cells().map(|_, cell| match cell {
                Cell::Open => Some(p),
                Cell::Obstacle => None,
            }),
        })
    }

    /// Probability of being at `position`; zero for obstacles and positions outside the grid.
    pub fn probability(&self, position: Position) -> f64 {
        self.probabilities
            .get(position)
            .copied()
            .flatten()
            .unwrap_or(0.0)
    }

    /// Sum over all cells. One after every update.
    pub fn total(&self) -> f64 {
        self.probabilities.values().iter().flatten().sum()
    }

    /// Open cells and their probabilities, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Position, f64)> + '_ {
        self.probabilities
            .iter()
            .filter_map(|(position, p)| p.map(|p| (position, p)))
    }

    /// The most probable cell. Ties go to the first cell in row-major order.
    pub fn most_likely(&self) -> Option<(Position, f64)> {
        self.iter().fold(None, |best, (position, p)| match best {
            Some((_, best_p)) if best_p >= p => best,
            _ => Some((position, p)),
        })
    }
}

// each cell is the percentage with two decimals, left aligned in 8 columns.
impl std::fmt::Display for Belief {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rows = self
            .probabilities
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Some(p) => format!("{:<8}", format!("{:.2}", p * 100.0)),
                        None => format!("{:<8}", "####"),
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>();
        write!(f, "{}", rows.join("\n"))
    }
}

/// One step of the localization agenda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgendaItem {
    /// Read the sensors and filter.
    Sense(Evidence),

    /// Try to move and predict.
    Act(Direction),
}

impl std::fmt::Display for AgendaItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgendaItem::Sense(evidence) => write!(f, "Filtering after Evidence {}", evidence),
            AgendaItem::Act(direction) => write!(f, "Prediction after Action {}", direction),
        }
    }
}

/// The classroom agenda: sense nothing around, move west, sense walls everywhere except east,
/// move north, sense the same again.
pub fn classroom_agenda() -> Vec<AgendaItem> {
    let open_east = Evidence::new([true, true, false, true]);
    vec![
        AgendaItem::Sense(Evidence::new([false; 4])),
        AgendaItem::Act(Direction::West),
        AgendaItem::Sense(open_east),
        AgendaItem::Act(Direction::North),
        AgendaItem::Sense(open_east),
    ]
}

/// Bayes filter over a grid world.
#[derive(Debug, Clone)]
pub struct Localizer {
    world: GridWorld,
    sensor: SensorModel,
    motion: MotionModel,
    belief: Belief,
}

impl Localizer {
    /// Start from a uniform belief.
    pub fn new(
        world: GridWorld,
        sensor: SensorModel,
        motion: MotionModel,
    ) -> Result<Self, LocalizationError> {
        let belief = Belief::uniform(&world)?;
        Ok(Self {
            world,
            sensor,
            motion,
            belief,
        })
    }

    /// The classroom world with the default sensor and motion models.
    pub fn classroom() -> Result<Self, LocalizationError> {
        Self::new(
            GridWorld::classroom(),
            SensorModel::default(),
            MotionModel::default(),
        )
    }

    /// Current belief.
    pub fn belief(&self) -> &Belief {
        &self.belief
    }

    /// Sensing update: weight each cell by the likelihood of the evidence and normalize. If no
    /// cell could have produced the evidence the belief is left untouched.
    pub fn filter(&mut self, evidence: &Evidence) -> Result<(), LocalizationError> {
        let mut weighted = self.belief.probabilities.clone();
        for (position, p) in self.belief.iter() {
            let evidence_likelihood = likelihood(&self.world, &self.sensor, evidence, position);
            weighted[position] = Some(p * evidence_likelihood);
        }
        let total: f64 = weighted.values().iter().flatten().sum();
        if total <= 0.0 {
            log::warn!("evidence {} is impossible under the current belief", evidence);
            return Err(LocalizationError::ZeroEvidenceMass(*evidence));
        }
        for p in weighted.values_mut().iter_mut().flatten() {
            *p /= total;
        }
        log::debug!("filtered {} with normalizer {}", evidence, total);
        self.belief.probabilities = weighted;
        Ok(())
    }

    /// Motion update: push each cell's probability through the motion model.
    pub fn predict(&mut self, direction: Direction) {
        let mut predicted = self.belief.probabilities.map(|_, p| p.map(|_| 0.0));
        for (position, p) in self.belief.iter() {
            for (next, transition) in self.motion.outcomes(&self.world, position, direction) {
                if let Some(Some(q)) = predicted.get_mut(next) {
                    *q += transition * p;
                }
            }
        }
        log::debug!("predicted after moving {}", direction);
        self.belief.probabilities = predicted;
    }

    /// Apply one agenda item.
    pub fn apply(&mut self, item: &AgendaItem) -> Result<(), LocalizationError> {
        match item {
            AgendaItem::Sense(evidence) => self.filter(evidence),
            AgendaItem::Act(direction) => {
                self.predict(*direction);
                Ok(())
            }
        }
    }

    /// Apply every item in order, calling `on_step` with each item and the belief after it.
    pub fn run_agenda<F>(
        &mut self,
        agenda: &[AgendaItem],
        mut on_step: F,
    ) -> Result<(), LocalizationError>
    where
        F: FnMut(&AgendaItem, &Belief),
    {
        for item in agenda {
            self.apply(item)?;
            on_step(item, &self.belief);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_uniform_belief() {
        let belief = Belief::uniform(&GridWorld::classroom()).expect("open cells");
        assert_abs_diff_eq!(belief.probability(Position::new(0, 0)), 1.0 / 24.0);
        assert_abs_diff_eq!(belief.probability(Position::new(1, 1)), 0.0);
        assert_abs_diff_eq!(belief.total(), 1.0, epsilon = 1e-12);
        assert_eq!(
            belief.to_string().lines().next(),
            Some("4.17    4.17    4.17    4.17    4.17    ")
        );
        assert_eq!(
            belief.to_string().lines().nth(1),
            Some("4.17    ####    ####    4.17    4.17    ")
        );
    }

    #[test]
    fn test_world_without_open_cells() {
        let world = GridWorld::new(1, 1, &[Position::new(0, 0)]).expect("valid world");
        assert_eq!(
            Belief::uniform(&world).err(),
            Some(LocalizationError::NoOpenCells)
        );
    }

    #[test]
    fn test_likelihood_of_each_reading() {
        let world = GridWorld::classroom();
        let sensor = SensorModel::default();
        // top left corner: walls to the west and north.
        let nothing = Evidence::new([false; 4]);
        assert_abs_diff_eq!(
            likelihood(&world, &sensor, &nothing, Position::new(0, 0)),
            0.25 * 0.25 * 0.8 * 0.8,
            epsilon = 1e-12
        );
        let open_east = Evidence::new([true, true, false, true]);
        assert_abs_diff_eq!(
            likelihood(&world, &sensor, &open_east, Position::new(0, 0)),
            0.75 * 0.75 * 0.8 * 0.2,
            epsilon = 1e-12
        );
        // the goal cell matches that reading perfectly.
        assert_abs_diff_eq!(
            likelihood(&world, &sensor, &open_east, Position::new(2, 2)),
            0.75 * 0.75 * 0.8 * 0.75,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sensor_model_validation() {
        assert!(SensorModel::new(0.75, 0.8).is_ok());
        assert_eq!(
            SensorModel::new(1.5, 0.8),
            Err(LocalizationError::InvalidSensorModel(1.5))
        );
    }

    #[test]
    fn test_sensor_model_deserialize_is_validated() {
        let sensor: SensorModel =
            serde_json::from_str(r#"{"wall_detected": 0.75, "open_detected": 0.8}"#)
                .expect("valid sensor");
        assert_eq!(sensor, SensorModel::default());

        let invalid = serde_json::from_str::<SensorModel>(
            r#"{"wall_detected": -0.25, "open_detected": 0.8}"#,
        );
        assert!(invalid.is_err());
    }

    #[test]
    fn test_evidence_round_trip_through_text() {
        let evidence: Evidence = "[1, 1, 0, 1]".parse().expect("valid evidence");
        assert_eq!(evidence, Evidence::new([true, true, false, true]));
        assert_eq!(evidence.to_string(), "[1, 1, 0, 1]");
        assert!("[1, 1, 0]".parse::<Evidence>().is_err());
        assert!("1, 1, 0, 1".parse::<Evidence>().is_err());
        assert!("[1, 2, 0, 1]".parse::<Evidence>().is_err());
    }

    #[test]
    fn test_first_filter() {
        let mut localizer = Localizer::classroom().expect("valid models");
        localizer
            .filter(&Evidence::new([false; 4]))
            .expect("possible evidence");
        let belief = localizer.belief();
        assert_abs_diff_eq!(belief.total(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            belief.probability(Position::new(2, 2)),
            0.005073669683808905,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            belief.probability(Position::new(3, 2)),
            0.16625400819905023,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            belief.probability(Position::new(0, 0)),
            0.0162357429881885,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_prediction_conserves_mass() {
        let mut localizer = Localizer::classroom().expect("valid models");
        localizer
            .filter(&Evidence::new([false; 4]))
            .expect("possible evidence");
        localizer.predict(Direction::West);
        let belief = localizer.belief();
        assert_abs_diff_eq!(belief.total(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            belief.probability(Position::new(2, 2)),
            0.12145147542314405,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            belief.probability(Position::new(0, 0)),
            0.02760076307992045,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_classroom_agenda_localizes_goal_cell() {
        let mut localizer = Localizer::classroom().expect("valid models");
        let mut titles = Vec::new();
        localizer
            .run_agenda(&classroom_agenda(), |item, belief| {
                titles.push(item.to_string());
                assert_abs_diff_eq!(belief.total(), 1.0, epsilon = 1e-9);
            })
            .expect("agenda runs");

        assert_eq!(
            titles,
            vec![
                "Filtering after Evidence [0, 0, 0, 0]",
                "Prediction after Action W",
                "Filtering after Evidence [1, 1, 0, 1]",
                "Prediction after Action N",
                "Filtering after Evidence [1, 1, 0, 1]",
            ]
        );

        let (position, p) = localizer.belief().most_likely().expect("open cells");
        assert_eq!(position, Position::new(2, 2));
        assert_abs_diff_eq!(p, 0.8392257358962885, epsilon = 1e-9);
        assert_abs_diff_eq!(
            localizer.belief().probability(Position::new(2, 4)),
            0.07303977254225036,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_impossible_evidence_keeps_belief() {
        let perfect = SensorModel::new(1.0, 1.0).expect("valid");
        let mut localizer =
            Localizer::new(GridWorld::classroom(), perfect, MotionModel::default())
                .expect("valid models");
        let before = localizer.belief().clone();

        // no classroom cell is walled in on all four sides.
        let boxed_in = Evidence::new([true; 4]);
        assert_eq!(
            localizer.filter(&boxed_in),
            Err(LocalizationError::ZeroEvidenceMass(boxed_in))
        );
        assert_eq!(localizer.belief(), &before);
    }

    fn any_item() -> impl Strategy<Value = AgendaItem> {
        prop_oneof![
            any::<[bool; 4]>().prop_map(|walls| AgendaItem::Sense(Evidence::new(walls))),
            (0..4usize).prop_map(|i| AgendaItem::Act(Direction::from_index(i))),
        ]
    }

    proptest! {
        #[test]
        fn test_belief_stays_a_distribution(agenda in prop::collection::vec(any_item(), 1..12)) {
            let mut localizer = Localizer::classroom().expect("valid models");
            localizer.run_agenda(&agenda, |_, _| {}).expect("noisy sensors never rule out every cell");
            let belief = localizer.belief();
            prop_assert!((belief.total() - 1.0).abs() < 1e-9);
            prop_assert!(belief.iter().all(|(_, p)| p >= 0.0));
            prop_assert_eq!(belief.probability(Position::new(1, 1)), 0.0);
        }
    }
}
