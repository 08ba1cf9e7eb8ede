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

//! Grid world shared by the search, localization and reinforcement learning exercises.
//!
//! The classroom world is 5 columns wide and 6 rows tall:
//!
//! ```text
//!   x 0 1 2 3 4
//! y
//! 0   . . . . .
//! 1   . # # . .
//! 2   . # G . .
//! 3   S # # . .
//! 4   . # . . .
//! 5   . . . . .
//! ```
//!
//! Moving costs differ per direction, as if a wind were blowing from the south: west and east
//! cost 2, north costs 3 and south costs 1.

use serde::{Deserialize, Serialize};

mod grid_map;
mod motion;

pub use grid_map::GridMap;
pub use motion::MotionModel;

/// Grid world error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridWorldError {
    /// Width or height is zero.
    #[error("grid must have at least one row and one column")]
    EmptyGrid,

    /// Position lies outside the grid.
    #[error("position is outside the grid: {0}")]
    OutOfBounds(Position),

    /// Position is an obstacle but an open cell was required.
    #[error("position is an obstacle: {0}")]
    Obstacle(Position),

    /// Motion probabilities do not form a distribution.
    #[error("invalid motion model: forward {forward}, drift {drift}")]
    InvalidMotionModel {
        /// Probability of moving in the intended direction.
        forward: f64,

        /// Probability of drifting to either side.
        drift: f64,
    },
}

/// Width of the classroom world.
pub const CLASSROOM_WIDTH: usize = 5;

/// Height of the classroom world.
pub const CLASSROOM_HEIGHT: usize = 6;

/// Obstacles of the classroom world.
pub const CLASSROOM_OBSTACLES: [Position; 6] = [
    Position::new(1, 1),
    Position::new(2, 1),
    Position::new(1, 2),
    Position::new(1, 3),
    Position::new(2, 3),
    Position::new(1, 4),
];

/// Where the search exercises start.
pub const CLASSROOM_START: Position = Position::new(0, 3);

/// The search goal, which is also the terminal state for Q-learning.
pub const CLASSROOM_GOAL: Position = Position::new(2, 2);

/// A cell coordinate. `x` grows to the east (columns), `y` grows to the south (rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,

    /// Row.
    pub y: i32,
}

impl Position {
    /// Create a new position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent position in a direction. It may be outside any grid.
    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Compass direction of a move. The declaration order West, North, East, South is the canonical
/// order used everywhere: successor generation, sensor readings and Q-table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards smaller x.
    West,

    /// Towards smaller y.
    North,

    /// Towards larger x.
    East,

    /// Towards larger y.
    South,
}

impl Direction {
    /// All directions in canonical order.
    pub const ALL: [Direction; 4] = [
        Direction::West,
        Direction::North,
        Direction::East,
        Direction::South,
    ];

    /// Position of this direction in [`Direction::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Direction::West => 0,
            Direction::North => 1,
            Direction::East => 2,
            Direction::South => 3,
        }
    }

    /// Inverse of [`Direction::index`], wrapping around.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// Change in (x, y) when moving one cell in this direction.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::West => (-1, 0),
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
        }
    }

    /// The direction a quarter turn to the left, e.g. drifting left while heading north ends up
    /// heading west.
    pub fn counter_clockwise(&self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// The direction a quarter turn to the right.
    pub fn clockwise(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Cost of moving one cell in this direction.
    pub fn step_cost(&self) -> u32 {
        match self {
            Direction::West | Direction::East => 2,
            Direction::North => 3,
            Direction::South => 1,
        }
    }

    /// Four character arrow used when printing a policy.
    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::West => "<<<<",
            Direction::North => "^^^^",
            Direction::East => ">>>>",
            Direction::South => "VVVV",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::West => write!(f, "W"),
            Direction::North => write!(f, "N"),
            Direction::East => write!(f, "E"),
            Direction::South => write!(f, "S"),
        }
    }
}

/// Grid world cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// The agent may stand here.
    Open,

    /// Wall. Moving into it leaves the agent where it was.
    Obstacle,
}

/// A rectangular world of open cells and obstacles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridWorld {
    cells: GridMap<Cell>,
}

impl Default for GridWorld {
    fn default() -> Self {
        Self::classroom()
    }
}

impl GridWorld {
    /// Create a world with the given obstacles. Every other cell is open.
    pub fn new(
        width: usize,
        height: usize,
        obstacles: &[Position],
    ) -> Result<Self, GridWorldError> {
        if width == 0 || height == 0 {
            return Err(GridWorldError::EmptyGrid);
        }
        let cells = GridMap::from_fn(width, height, |position| {
            if obstacles.contains(&position) {
                Cell::Obstacle
            } else {
                Cell::Open
            }
        });
        if let Some(outside) = obstacles.iter().find(|&&p| !cells.contains(p)) {
            return Err(GridWorldError::OutOfBounds(*outside));
        }
        Ok(Self { cells })
    }

    /// The fixed 5x6 world used by all of the exercises.
    pub fn classroom() -> Self {
        let cells = GridMap::from_fn(CLASSROOM_WIDTH, CLASSROOM_HEIGHT, |position| {
            if CLASSROOM_OBSTACLES.contains(&position) {
                Cell::Obstacle
            } else {
                Cell::Open
            }
        });
        Self { cells }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.cells.width()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.cells.height()
    }

    /// Whether the position lies inside the grid.
    pub fn contains(&self, position: Position) -> bool {
        self.cells.contains(position)
    }

    /// Get a cell, or None if the position is outside the grid.
    pub fn get(&self, position: Position) -> Option<Cell> {
        self.cells.get(position).copied()
    }

    /// Whether the position is inside the grid and not an obstacle.
    pub fn is_open(&self, position: Position) -> bool {
        self.get(position) == Some(Cell::Open)
    }

    /// Whether the position is an obstacle.
    pub fn is_obstacle(&self, position: Position) -> bool {
        self.get(position) == Some(Cell::Obstacle)
    }

    /// Check that the position is an open cell.
    pub fn ensure_open(&self, position: Position) -> Result<(), GridWorldError> {
        match self.get(position) {
            Some(Cell::Open) => Ok(()),
            Some(Cell::Obstacle) => Err(GridWorldError::Obstacle(position)),
            None => Err(GridWorldError::OutOfBounds(position)),
        }
    }

    /// All open cells in row-major order.
    pub fn open_positions(&self) -> Vec<Position> {
        self.cells
            .iter()
            .filter(|(_, cell)| **cell == Cell::Open)
            .map(|(position, _)| position)
            .collect()
    }

    /// The cell reached by moving one step, or None if the move would leave the grid or enter an
    /// obstacle.
    pub fn successor(&self, position: Position, direction: Direction) -> Option<Position> {
        let next = position.step(direction);
        if self.is_open(next) {
            Some(next)
        } else {
            None
        }
    }

    /// Whether a wall (obstacle or grid edge) blocks the move.
    pub fn is_blocked(&self, position: Position, direction: Direction) -> bool {
        self.successor(position, direction).is_none()
    }

    /// Where the agent ends up after trying to move. Blocked moves bounce back to the start.
    pub fn resulting_position(&self, position: Position, direction: Direction) -> Position {
        self.successor(position, direction).unwrap_or(position)
    }

    /// The underlying cell table.
    pub fn cells(&self) -> &GridMap<Cell> {
        &self.cells
    }
}

// print one row per line, obstacles as "##" and open cells as blanks.
impl std::fmt::Display for GridWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::with_capacity((self.width() * 3 + 1) * self.height());
        for (row, cells) in self.cells.rows().enumerate() {
            let line = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Open => "  ",
                    Cell::Obstacle => "##",
                })
                .collect::<Vec<_>>()
                .join(" ");
            s.push_str(&line);
            if row < self.height() - 1 {
                s.push('\n');
            }
        }
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_classroom_has_24_open_cells() {
        let world = GridWorld::classroom();
        assert_eq!(world.width(), 5);
        assert_eq!(world.height(), 6);
        assert_eq!(world.open_positions().len(), 24);
        for obstacle in CLASSROOM_OBSTACLES {
            assert!(world.is_obstacle(obstacle), "{}", obstacle);
        }
        assert!(world.is_open(CLASSROOM_START));
        assert!(world.is_open(CLASSROOM_GOAL));
    }

    #[test]
    fn test_open_positions_are_row_major() {
        let world = GridWorld::classroom();
        let open = world.open_positions();
        assert_eq!(open[0], Position::new(0, 0));
        assert_eq!(open[4], Position::new(4, 0));
        assert_eq!(open[5], Position::new(0, 1));
        assert_eq!(open[6], Position::new(3, 1));
        assert_eq!(open[23], Position::new(4, 5));
    }

    #[test]
    fn test_new_rejects_out_of_bounds_obstacle() {
        assert_eq!(
            GridWorld::new(3, 3, &[Position::new(3, 0)]),
            Err(GridWorldError::OutOfBounds(Position::new(3, 0)))
        );
        assert_eq!(GridWorld::new(0, 3, &[]), Err(GridWorldError::EmptyGrid));
    }

    #[test]
    fn test_new_matches_classroom() {
        let world = GridWorld::new(5, 6, &CLASSROOM_OBSTACLES).expect("valid world");
        assert_eq!(world, GridWorld::classroom());
    }

    #[test]
    fn test_goal_is_walled_on_three_sides() {
        let world = GridWorld::classroom();
        assert!(world.is_blocked(CLASSROOM_GOAL, Direction::West));
        assert!(world.is_blocked(CLASSROOM_GOAL, Direction::North));
        assert!(!world.is_blocked(CLASSROOM_GOAL, Direction::East));
        assert!(world.is_blocked(CLASSROOM_GOAL, Direction::South));
    }

    #[test]
    fn test_corner_bounces() {
        let world = GridWorld::classroom();
        let corner = Position::new(0, 0);
        assert_eq!(world.resulting_position(corner, Direction::West), corner);
        assert_eq!(world.resulting_position(corner, Direction::North), corner);
        assert_eq!(
            world.resulting_position(corner, Direction::East),
            Position::new(1, 0)
        );
        assert_eq!(
            world.resulting_position(corner, Direction::South),
            Position::new(0, 1)
        );
    }

    #[test]
    fn test_ensure_open() {
        let world = GridWorld::classroom();
        assert_eq!(world.ensure_open(CLASSROOM_START), Ok(()));
        assert_eq!(
            world.ensure_open(Position::new(1, 1)),
            Err(GridWorldError::Obstacle(Position::new(1, 1)))
        );
        assert_eq!(
            world.ensure_open(Position::new(-1, 0)),
            Err(GridWorldError::OutOfBounds(Position::new(-1, 0)))
        );
    }

    #[test]
    fn test_direction_turns() {
        assert_eq!(Direction::West.counter_clockwise(), Direction::South);
        assert_eq!(Direction::West.clockwise(), Direction::North);
        assert_eq!(Direction::North.counter_clockwise(), Direction::West);
        assert_eq!(Direction::South.clockwise(), Direction::West);
        for direction in Direction::ALL {
            assert_eq!(Direction::from_index(direction.index()), direction);
            assert_eq!(direction.clockwise().counter_clockwise(), direction);
        }
    }

    #[test]
    fn test_display_classroom() {
        let expected = [
            "              ",
            "   ## ##      ",
            "   ##         ",
            "   ## ##      ",
            "   ##         ",
            "              ",
        ]
        .join("\n");
        assert_eq!(format!("{}", GridWorld::classroom()), expected);
    }

    fn any_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::West),
            Just(Direction::North),
            Just(Direction::East),
            Just(Direction::South),
        ]
    }

    proptest! {
        #[test]
        fn test_moves_never_leave_open_cells(
            x in 0..5i32,
            y in 0..6i32,
            direction in any_direction(),
        ) {
            let world = GridWorld::classroom();
            let start = Position::new(x, y);
            prop_assume!(world.is_open(start));
            let end = world.resulting_position(start, direction);
            prop_assert!(world.is_open(end));
            let distance = (end.x - start.x).abs() + (end.y - start.y).abs();
            prop_assert!(distance <= 1);
        }
    }
}
