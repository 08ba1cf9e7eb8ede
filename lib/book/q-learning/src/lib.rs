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

//! Tabular Q-learning on the drifting grid world.
//!
//! The agent does not know the motion model or the rewards. Each trial starts in a random open
//! cell, picks actions epsilon-greedily, and updates Q(s, a) with a learning rate of
//! 1 / N(s, a) until it reaches the terminal cell or runs out of steps.
//!
//! See:
//! -   Chapter 23 Reinforcement Learning, section 23.4 Active Reinforcement Learning.

#![warn(missing_docs)]

mod display;
mod environment;
mod q_table;

use grid_world::{Direction, GridMap, GridWorldError, Position};
use rand::seq::SliceRandom;
use rand::{Rng as _, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use display::{render_action_grid, Policy, PolicyCell};
pub use environment::DriftEnvironment;
pub use q_table::QTable;

/// Visit counts.
pub type Int = i32;
/// Q-values and probabilities.
pub type Float = f64;
/// Seeded generator used for starts, exploration and drift.
pub type Rng = rand_pcg::Pcg64;

/// Errors that can occur while setting up or running the learner.
#[derive(Error, Debug)]
pub enum QLearningError {
    /// Epsilon must lie in [0, 1].
    #[error("exploration rate {0} is not in [0, 1]")]
    InvalidEpsilon(Float),

    /// The discount must lie in [0, 1].
    #[error("discount {0} is not in [0, 1]")]
    InvalidDiscount(Float),

    /// Every open cell is the terminal.
    #[error("no open cell to start a trial from")]
    NoStartState,

    /// The world rejected a position.
    #[error(transparent)]
    GridWorld(#[from] GridWorldError),

    /// The motion model produced weights that cannot be sampled.
    #[error("cannot sample a move: {0}")]
    Weighted(#[from] rand::distributions::WeightedError),

    /// The tables could not be written as JSON.
    #[error("cannot serialize tables: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Knobs for a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QLearningConfig {
    /// Number of trials to run.
    pub trials: usize,

    /// A trial that has not reached the terminal after this many moves is abandoned.
    pub max_steps: usize,

    /// Discount applied to the value of the next state.
    pub discount: Float,

    /// Probability of picking a uniformly random action instead of a greedy one.
    pub epsilon: Float,

    /// Value of reaching the terminal cell.
    pub terminal_reward: Float,

    /// Seed for the random number generator.
    pub seed: u64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            trials: 10_000,
            max_steps: 100,
            discount: 0.9,
            epsilon: 0.05,
            terminal_reward: 100.0,
            seed: 42,
        }
    }
}

impl QLearningConfig {
    /// Reject rates outside [0, 1].
    pub fn validate(&self) -> Result<(), QLearningError> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(QLearningError::InvalidEpsilon(self.epsilon));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(QLearningError::InvalidDiscount(self.discount));
        }
        Ok(())
    }
}

/// What happened during one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Where the trial started.
    pub start: Position,

    /// Moves taken.
    pub steps: usize,

    /// Whether the trial ended in the terminal cell.
    pub reached_terminal: bool,

    /// Sum of step rewards, plus the terminal reward if reached.
    pub total_reward: Float,
}

/// Totals over a training run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Trials run.
    pub trials: usize,

    /// Trials that reached the terminal cell.
    pub reached_terminal: usize,

    /// Moves taken over all trials.
    pub total_steps: usize,
}

#[derive(Serialize)]
struct SerializedTables<'a> {
    q: &'a GridMap<[Float; 4]>,
    n: &'a GridMap<[Int; 4]>,
}

/// Q-learning agent together with the environment it learns in.
#[derive(Debug, Clone)]
pub struct QLearner {
    config: QLearningConfig,
    environment: DriftEnvironment,
    table: QTable,
    rng: Rng,
}

impl QLearner {
    /// Create a learner with empty tables and a generator seeded from the config.
    pub fn new(
        config: QLearningConfig,
        environment: DriftEnvironment,
    ) -> Result<Self, QLearningError> {
        config.validate()?;
        let world = environment.world();
        let table = QTable::new(world.width(), world.height());
        log::debug!(
            "learning to reach {} in a {}x{} world over {} trials",
            environment.terminal(),
            world.width(),
            world.height(),
            config.trials
        );
        Ok(Self {
            config,
            environment,
            table,
            rng: Rng::seed_from_u64(config.seed),
        })
    }

    /// Learner for the classroom world.
    pub fn classroom(config: QLearningConfig) -> Result<Self, QLearningError> {
        Self::new(config, DriftEnvironment::classroom()?)
    }

    /// Settings this learner was created with.
    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    /// The environment being learned.
    pub fn environment(&self) -> &DriftEnvironment {
        &self.environment
    }

    /// Current Q and N tables.
    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Epsilon-greedy: with probability epsilon any direction, otherwise one of the greedy
    /// directions picked uniformly so that ties do not favour West.
    pub fn choose_action(&mut self, state: Position) -> Direction {
        let explore = self.rng.gen::<Float>() <= self.config.epsilon;
        let candidates = if explore {
            Direction::ALL.to_vec()
        } else {
            self.table.greedy_actions(state)
        };
        candidates
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_else(|| self.table.best_action(state))
    }

    /// Run one trial from a random start and update the tables along the way.
    pub fn run_trial(&mut self) -> Result<TrialSummary, QLearningError> {
        let start = self.environment.random_start(&mut self.rng)?;
        let mut state = start;
        let mut steps = 0;
        let mut total_reward = 0.0;

        while !self.environment.is_terminal(state) && steps < self.config.max_steps {
            let action = self.choose_action(state);
            let next = self
                .environment
                .sample_next(state, action, &mut self.rng)?;
            let reward = self.environment.reward(action);
            let next_value = if self.environment.is_terminal(next) {
                self.config.terminal_reward
            } else {
                self.table.max_value(next)
            };
            self.table
                .update(state, action, reward, next_value, self.config.discount);

            total_reward += reward;
            state = next;
            steps += 1;
        }

        let reached_terminal = self.environment.is_terminal(state);
        if reached_terminal {
            total_reward += self.config.terminal_reward;
        }
        Ok(TrialSummary {
            start,
            steps,
            reached_terminal,
            total_reward,
        })
    }

    /// Run every configured trial.
    pub fn train(&mut self) -> Result<TrainingSummary, QLearningError> {
        let mut summary = TrainingSummary::default();
        for trial in 1..=self.config.trials {
            let result = self.run_trial()?;
            log::debug!(
                "Trial {}: start {}, {} steps, reached terminal: {}",
                trial,
                result.start,
                result.steps,
                result.reached_terminal
            );
            summary.trials += 1;
            summary.total_steps += result.steps;
            if result.reached_terminal {
                summary.reached_terminal += 1;
            }
            if trial % 1000 == 0 {
                log::info!(
                    "{} trials done, {} reached the terminal",
                    trial,
                    summary.reached_terminal
                );
            }
        }
        Ok(summary)
    }

    /// Greedy policy from the current estimates. Ties go to the first direction in West, North,
    /// East, South order.
    pub fn policy(&self) -> Policy {
        let world = self.environment.world();
        let cells = world.cells().map(|position, _| {
            if world.is_obstacle(position) {
                PolicyCell::Obstacle
            } else if self.environment.is_terminal(position) {
                PolicyCell::Terminal
            } else {
                PolicyCell::Move(self.table.best_action(position))
            }
        });
        Policy {
            cells,
            terminal_label: self.terminal_label(),
        }
    }

    /// Q table laid out as a compass rose per cell, one decimal place.
    pub fn render_q_table(&self) -> String {
        render_action_grid(
            &self.environment,
            &self.terminal_label(),
            self.table.values(),
            |value| format!("{:.1}", value),
        )
    }

    /// N table laid out as a compass rose per cell.
    pub fn render_n_table(&self) -> String {
        render_action_grid(
            &self.environment,
            &self.terminal_label(),
            self.table.visit_counts(),
            |count| count.to_string(),
        )
    }

    /// Both tables as pretty JSON.
    pub fn serialize_tables(&self) -> Result<String, QLearningError> {
        let tables = SerializedTables {
            q: self.table.values(),
            n: self.table.visit_counts(),
        };
        Ok(serde_json::to_string_pretty(&tables)?)
    }

    fn terminal_label(&self) -> String {
        format!("{:+}", self.config.terminal_reward)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use grid_world::{GridWorld, MotionModel, CLASSROOM_GOAL};
    use proptest::prelude::*;

    use super::*;

    fn trained_classroom() -> (QLearner, TrainingSummary) {
        let mut learner = QLearner::classroom(QLearningConfig::default()).expect("valid learner");
        let summary = learner.train().expect("training runs");
        (learner, summary)
    }

    #[test]
    fn test_config_validation() {
        assert!(QLearningConfig::default().validate().is_ok());
        let config = QLearningConfig {
            epsilon: 1.5,
            ..QLearningConfig::default()
        };
        assert!(matches!(
            QLearner::classroom(config),
            Err(QLearningError::InvalidEpsilon(_))
        ));
        let config = QLearningConfig {
            discount: -0.1,
            ..QLearningConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(QLearningError::InvalidDiscount(_))
        ));
    }

    #[test]
    fn test_learned_policy_near_goal() {
        let (learner, _) = trained_classroom();
        let policy = learner.policy();
        assert_eq!(policy.action(Position::new(3, 2)), Some(Direction::West));
        assert_eq!(policy.action(Position::new(3, 1)), Some(Direction::South));
        assert_eq!(policy.action(Position::new(3, 3)), Some(Direction::North));
        assert_eq!(policy.action(Position::new(4, 2)), Some(Direction::West));
        assert_eq!(policy.cells[CLASSROOM_GOAL], PolicyCell::Terminal);
        assert_eq!(policy.cells[Position::new(1, 1)], PolicyCell::Obstacle);
    }

    #[test]
    fn test_value_next_to_goal() {
        let (learner, _) = trained_classroom();
        let value = learner.table().value(Position::new(3, 2), Direction::West);
        assert!((70.0..85.0).contains(&value), "Q((3, 2), W) = {}", value);
    }

    #[test]
    fn test_training_summary_and_visits() {
        let (learner, summary) = trained_classroom();
        assert_eq!(summary.trials, 10_000);
        assert!(summary.reached_terminal > 9_000);
        assert!(summary.total_steps <= summary.trials * learner.config().max_steps);

        let world = learner.environment().world();
        for position in world.cells().iter().map(|(position, _)| position) {
            for action in Direction::ALL {
                let visits = learner.table().visits(position, action);
                if world.is_obstacle(position) || position == CLASSROOM_GOAL {
                    assert_eq!(visits, 0, "{} {}", position, action);
                } else {
                    assert!(visits > 0, "{} {}", position, action);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_tables() {
        let config = QLearningConfig {
            trials: 200,
            ..QLearningConfig::default()
        };
        let mut first = QLearner::classroom(config).expect("valid learner");
        let mut second = QLearner::classroom(config).expect("valid learner");
        first.train().expect("training runs");
        second.train().expect("training runs");
        assert_eq!(first.table(), second.table());
    }

    #[test]
    fn test_trial_from_cell_next_to_terminal() {
        // a 2x1 corridor: the only start is next to the terminal, and moving east always lands
        // there or bounces off the walls.
        let world = GridWorld::new(2, 1, &[]).expect("valid world");
        let environment =
            DriftEnvironment::new(world, Position::new(1, 0), MotionModel::default())
                .expect("valid environment");
        let config = QLearningConfig {
            trials: 1,
            max_steps: 1_000,
            ..QLearningConfig::default()
        };
        let mut learner = QLearner::new(config, environment).expect("valid learner");
        let trial = learner.run_trial().expect("trial runs");
        assert_eq!(trial.start, Position::new(0, 0));
        assert!(trial.reached_terminal);
        assert!(trial.steps >= 1);
        assert!(trial.total_reward <= 100.0 - 1.0);
    }

    #[test]
    fn test_max_steps_zero_leaves_tables_empty() {
        let config = QLearningConfig {
            trials: 5,
            max_steps: 0,
            ..QLearningConfig::default()
        };
        let mut learner = QLearner::classroom(config).expect("valid learner");
        let summary = learner.train().expect("training runs");
        assert_eq!(summary.total_steps, 0);
        assert_eq!(summary.reached_terminal, 0);
        assert_eq!(learner.table(), &QTable::new(5, 6));
    }

    #[test]
    fn test_serialize_tables() {
        let config = QLearningConfig {
            trials: 10,
            ..QLearningConfig::default()
        };
        let mut learner = QLearner::classroom(config).expect("valid learner");
        learner.train().expect("training runs");
        let json = learner.serialize_tables().expect("serializes");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert!(parsed.get("q").is_some());
        assert!(parsed.get("n").is_some());
    }

    #[test]
    fn test_rendered_tables_mark_terminal() {
        let learner = QLearner::classroom(QLearningConfig::default()).expect("valid learner");
        assert!(learner.render_q_table().contains("+100"));
        assert!(learner.render_n_table().contains("####"));
        assert!(learner.policy().to_string().contains("+100"));
    }

    proptest! {
        #[test]
        fn test_exploration_only_picks_valid_directions(seed in any::<u64>()) {
            let config = QLearningConfig { epsilon: 1.0, seed, ..QLearningConfig::default() };
            let mut learner = QLearner::classroom(config).expect("valid learner");
            for _ in 0..20 {
                let action = learner.choose_action(Position::new(0, 0));
                prop_assert!(Direction::ALL.contains(&action));
            }
        }

        #[test]
        fn test_greedy_choice_follows_table(seed in any::<u64>()) {
            let config = QLearningConfig { epsilon: 0.0, seed, ..QLearningConfig::default() };
            let mut learner = QLearner::classroom(config).expect("valid learner");
            let state = Position::new(3, 2);
            learner.table.update(state, Direction::West, -2.0, 100.0, 0.9);
            assert_abs_diff_eq!(
                learner.table().value(state, Direction::West),
                88.0,
                epsilon = 1e-12
            );
            prop_assert_eq!(learner.choose_action(state), Direction::West);
        }
    }
}
