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

use grid_world::{Direction, GridWorld, MotionModel, Position, CLASSROOM_GOAL};
use rand::seq::SliceRandom;

use crate::{Float, QLearningError, Rng};

/// The grid world as the learner experiences it: moves drift, every action is charged its step
/// cost, and one cell ends the trial.
#[derive(Debug, Clone)]
pub struct DriftEnvironment {
    world: GridWorld,
    terminal: Position,
    motion: MotionModel,
    starts: Vec<Position>,
}

impl DriftEnvironment {
    /// Create an environment. The terminal must be open and at least one other open cell must
    /// exist to start trials from.
    pub fn new(
        world: GridWorld,
        terminal: Position,
        motion: MotionModel,
    ) -> Result<Self, QLearningError> {
        world.ensure_open(terminal)?;
        let starts: Vec<Position> = world
            .open_positions()
            .into_iter()
            .filter(|&position| position != terminal)
            .collect();
        if starts.is_empty() {
            return Err(QLearningError::NoStartState);
        }
        Ok(Self {
            world,
            terminal,
            motion,
            starts,
        })
    }

    /// The classroom world with the goal cell as terminal and the default drift.
    pub fn classroom() -> Result<Self, QLearningError> {
        Self::new(
            GridWorld::classroom(),
            CLASSROOM_GOAL,
            MotionModel::default(),
        )
    }

    /// The underlying world.
    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    /// The cell that ends a trial.
    pub fn terminal(&self) -> Position {
        self.terminal
    }

    /// Whether the position ends a trial.
    pub fn is_terminal(&self, position: Position) -> bool {
        position == self.terminal
    }

    /// Reward for attempting a move. The intended direction is charged, wherever the agent ends
    /// up.
    pub fn reward(&self, direction: Direction) -> Float {
        -Float::from(direction.step_cost())
    }

    /// Sample where an attempted move ends, drift included.
    pub fn sample_next(
        &self,
        position: Position,
        direction: Direction,
        rng: &mut Rng,
    ) -> Result<Position, QLearningError> {
        let outcomes = self.motion.outcomes(&self.world, position, direction);
        let (next, _) = outcomes.choose_weighted(rng, |(_, probability)| *probability)?;
        Ok(*next)
    }

    /// A uniformly random open cell other than the terminal.
    pub fn random_start(&self, rng: &mut Rng) -> Result<Position, QLearningError> {
        self.starts
            .choose(rng)
            .copied()
            .ok_or(QLearningError::NoStartState)
    }
}
