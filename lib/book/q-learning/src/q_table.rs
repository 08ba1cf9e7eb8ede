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

use grid_world::{Direction, GridMap, Position};
use serde::{Deserialize, Serialize};

use crate::{Float, Int};

/// Q(s, a) estimates and N(s, a) visit counts for every cell and direction. Columns follow
/// [`Direction::ALL`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    values: GridMap<[Float; 4]>,
    visits: GridMap<[Int; 4]>,
}

impl QTable {
    /// All estimates and counts start at zero.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            values: GridMap::filled(width, height, [0.0; 4]),
            visits: GridMap::filled(width, height, [0; 4]),
        }
    }

    /// Q(s, a).
    pub fn value(&self, state: Position, action: Direction) -> Float {
        self.values[state][action.index()]
    }

    /// N(s, a).
    pub fn visits(&self, state: Position, action: Direction) -> Int {
        self.visits[state][action.index()]
    }

    /// All Q-values, one row of four per cell.
    pub fn values(&self) -> &GridMap<[Float; 4]> {
        &self.values
    }

    /// All visit counts, one row of four per cell.
    pub fn visit_counts(&self) -> &GridMap<[Int; 4]> {
        &self.visits
    }

    /// max_a Q(s, a).
    pub fn max_value(&self, state: Position) -> Float {
        self.values[state]
            .iter()
            .copied()
            .fold(Float::NEG_INFINITY, Float::max)
    }

    /// Every action whose estimate equals the maximum.
    pub fn greedy_actions(&self, state: Position) -> Vec<Direction> {
        let max = self.max_value(state);
        Direction::ALL
            .into_iter()
            .filter(|action| self.value(state, *action) == max)
            .collect()
    }

    /// The first greedy action in West, North, East, South order.
    pub fn best_action(&self, state: Position) -> Direction {
        let max = self.max_value(state);
        Direction::ALL
            .into_iter()
            .find(|action| self.value(state, *action) == max)
            .unwrap_or(Direction::West)
    }

    /// Temporal difference update with learning rate 1 / N(s, a):
    ///
    /// Q(s, a) <- Q(s, a) + (1 / N(s, a)) * (r + discount * next_value - Q(s, a))
    ///
    /// `next_value` is the terminal reward when the next state ends the trial and max_a' Q(s', a')
    /// otherwise. Returns the new estimate.
    pub fn update(
        &mut self,
        state: Position,
        action: Direction,
        reward: Float,
        next_value: Float,
        discount: Float,
    ) -> Float {
        let visits = &mut self.visits[state][action.index()];
        *visits += 1;
        let learning_rate = 1.0 / Float::from(*visits);

        let value = &mut self.values[state][action.index()];
        *value += learning_rate * (reward + discount * next_value - *value);
        *value
    }
}
