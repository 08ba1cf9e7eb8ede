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

use serde::{Deserialize, Serialize};

use crate::{Direction, GridWorld, GridWorldError, Position};

const TOLERANCE: f64 = 1e-9;

/// Stochastic motion: the agent moves in the intended direction with probability `forward`, and
/// drifts a quarter turn to the left or to the right with probability `drift` each. A move into
/// a wall leaves the agent where it was.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MotionModelParameters")]
pub struct MotionModel {
    forward: f64,
    drift: f64,
}

// deserialized form, checked by MotionModel::new.
#[derive(Deserialize)]
struct MotionModelParameters {
    forward: f64,
    drift: f64,
}

impl TryFrom<MotionModelParameters> for MotionModel {
    type Error = GridWorldError;

    fn try_from(parameters: MotionModelParameters) -> Result<Self, Self::Error> {
        Self::new(parameters.forward, parameters.drift)
    }
}

impl Default for MotionModel {
    fn default() -> Self {
        Self {
            forward: 0.7,
            drift: 0.15,
        }
    }
}

impl MotionModel {
    /// Create a motion model. `forward + 2 * drift` must be 1.
    pub fn new(forward: f64, drift: f64) -> Result<Self, GridWorldError> {
        let total = forward + 2.0 * drift;
        if forward < 0.0 || drift < 0.0 || (total - 1.0).abs() > TOLERANCE {
            return Err(GridWorldError::InvalidMotionModel { forward, drift });
        }
        Ok(Self { forward, drift })
    }

    /// The three possible results of trying to move: intended direction, drift left (counter
    /// clockwise) and drift right (clockwise). Two outcomes may land on the same cell.
    pub fn outcomes(
        &self,
        world: &GridWorld,
        position: Position,
        direction: Direction,
    ) -> [(Position, f64); 3] {
        [
            (world.resulting_position(position, direction), self.forward),
            (
                world.resulting_position(position, direction.counter_clockwise()),
                self.drift,
            ),
            (
                world.resulting_position(position, direction.clockwise()),
                self.drift,
            ),
        ]
    }
}
