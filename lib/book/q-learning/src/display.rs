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

use crate::environment::DriftEnvironment;

const VALUE_WIDTH: usize = 5;
const SEPARATOR: &str = "     ";
const CELL_SEPARATOR: &str = " ";
const POLICY_WIDTH: usize = 4;
const POLICY_SEPARATOR: &str = "    ";
const OBSTACLE: &str = "####";

fn centered(text: &str, width: usize) -> String {
    format!("{:^width$}", text, width = width)
}

/// Print one number per (cell, action) as a compass rose: north on the first line, west and
/// east on the second, south on the third. Every text line is followed by a blank line.
pub fn render_action_grid<T>(
    environment: &DriftEnvironment,
    terminal_label: &str,
    values: &GridMap<[T; 4]>,
    format_value: impl Fn(&T) -> String,
) -> String {
    let world = environment.world();
    let blank = format!("{}{}{}{}", SEPARATOR, SEPARATOR, SEPARATOR, CELL_SEPARATOR);
    let value_text = |position: Position, direction: Direction| {
        centered(
            &format_value(&values[position][direction.index()]),
            VALUE_WIDTH,
        )
    };

    let mut s = String::new();
    for y in 0..world.height() {
        let row: Vec<Position> = (0..world.width())
            .map(|x| Position::new(x as i32, y as i32))
            .collect();
        let special = |position: Position| {
            world.is_obstacle(position) || environment.is_terminal(position)
        };

        for position in &row {
            if special(*position) {
                s.push_str(&blank);
            } else {
                s.push_str(SEPARATOR);
                s.push_str(&value_text(*position, Direction::North));
                s.push_str(SEPARATOR);
                s.push_str(CELL_SEPARATOR);
            }
        }
        s.push_str("\n\n");

        for position in &row {
            let label = if world.is_obstacle(*position) {
                Some(OBSTACLE)
            } else if environment.is_terminal(*position) {
                Some(terminal_label)
            } else {
                None
            };
            match label {
                Some(label) => {
                    s.push_str(SEPARATOR);
                    s.push_str(&centered(label, VALUE_WIDTH));
                    s.push_str(SEPARATOR);
                }
                None => {
                    s.push_str(&value_text(*position, Direction::West));
                    s.push_str(SEPARATOR);
                    s.push_str(&value_text(*position, Direction::East));
                }
            }
            s.push_str(CELL_SEPARATOR);
        }
        s.push_str("\n\n");

        for position in &row {
            if special(*position) {
                s.push_str(&blank);
            } else {
                s.push_str(SEPARATOR);
                s.push_str(&value_text(*position, Direction::South));
                s.push_str(SEPARATOR);
                s.push_str(CELL_SEPARATOR);
            }
        }
        s.push_str("\n\n");
    }
    s
}

/// What the learned policy says about one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyCell {
    /// Not a state.
    Obstacle,

    /// Trials end here.
    Terminal,

    /// Greedy action.
    Move(Direction),
}

/// Greedy policy over the whole grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// One entry per cell.
    pub cells: GridMap<PolicyCell>,

    /// Printed in the terminal cell, e.g. "+100".
    pub terminal_label: String,
}

impl Policy {
    /// The action at `position`, if it is a non-terminal open cell.
    pub fn action(&self, position: Position) -> Option<Direction> {
        match self.cells.get(position) {
            Some(PolicyCell::Move(direction)) => Some(*direction),
            _ => None,
        }
    }
}

// arrows, "####" and the terminal label, each centred in four columns and followed by four
// spaces. Rows are separated by a blank line.
impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.rows() {
            for cell in row {
                let text = match cell {
                    PolicyCell::Obstacle => OBSTACLE,
                    PolicyCell::Terminal => self.terminal_label.as_str(),
                    PolicyCell::Move(direction) => direction.arrow(),
                };
                write!(f, "{}{}", centered(text, POLICY_WIDTH), POLICY_SEPARATOR)?;
            }
            write!(f, "\n\n")?;
        }
        Ok(())
    }
}
