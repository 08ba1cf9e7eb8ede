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

//! Route finding on the grid world.
//!
//! See:
//! -  Chapter 3: Solving Problems by Searching, iterative deepening (page 81) and A* (page 85).

use grid_world::{Cell, Direction, GridMap, GridWorld, GridWorldError, Position};
use serde::{Deserialize, Serialize};

pub mod a_star;
pub mod iterative_deepening;

pub(crate) type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub(crate) type HashSet<K> = rustc_hash::FxHashSet<K>;

/// Search error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    /// The start is not an open cell.
    #[error("invalid start: {0}")]
    InvalidStart(#[source] GridWorldError),

    /// The goal is not an open cell.
    #[error("invalid goal: {0}")]
    InvalidGoal(#[source] GridWorldError),

    /// Iterative deepening would never raise the depth limit.
    #[error("depth increment must be positive")]
    ZeroDepthIncrement,
}

/// Get from `start` to `goal` in `world`.
#[derive(Debug, Clone, Copy)]
pub struct RouteProblem<'a> {
    world: &'a GridWorld,
    start: Position,
    goal: Position,
}

impl<'a> RouteProblem<'a> {
    /// Create a problem. Both ends must be open cells.
    pub fn new(world: &'a GridWorld, start: Position, goal: Position) -> Result<Self, SearchError> {
        world.ensure_open(start).map_err(SearchError::InvalidStart)?;
        world.ensure_open(goal).map_err(SearchError::InvalidGoal)?;
        Ok(Self { world, start, goal })
    }

    /// The world being searched.
    pub fn world(&self) -> &'a GridWorld {
        self.world
    }

    /// Initial state.
    pub fn start(&self) -> Position {
        self.start
    }

    /// Goal state.
    pub fn goal(&self) -> Position {
        self.goal
    }
}

/// A route from start to goal, both inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// Visited cells, start first.
    pub path: Vec<Position>,

    /// Sum of the step costs of every move along the path.
    pub cost: u32,
}

impl Solution {
    // walk parent links back from the goal. The start has no parent.
    pub(crate) fn from_parents(
        parents: &HashMap<Position, (Position, Direction)>,
        goal: Position,
    ) -> Self {
        let mut path = vec![goal];
        let mut cost = 0;
        let mut current = goal;
        while let Some((parent, direction)) = parents.get(&current) {
            cost += direction.step_cost();
            path.push(*parent);
            current = *parent;
        }
        path.reverse();
        Self { path, cost }
    }

    /// Number of moves.
    pub fn len(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// True when start and goal coincide.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let steps = self
            .path
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        write!(f, "{} (cost {})", steps, self.cost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
enum LabelCell {
    Obstacle,
    Unlabelled,
    Label(u32),
}

/// The order in which a search touched each cell, printed as a grid of two digit numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierLabels {
    cells: GridMap<LabelCell>,
}

impl FrontierLabels {
    /// No labels yet. Obstacles are copied from the world.
    pub fn new(world: &GridWorld) -> Self {
        Self {
            cells: world.cells().map(|_, cell| match cell {
                Cell::Open => LabelCell::Unlabelled,
                Cell::Obstacle => LabelCell::Obstacle,
            }),
        }
    }

    /// Label an open cell. Labels on obstacles or outside the grid are ignored.
    pub fn set(&mut self, position: Position, label: u32) {
        if let Some(cell) = self.cells.get_mut(position) {
            if *cell != LabelCell::Obstacle {
                *cell = LabelCell::Label(label);
            }
        }
    }

    /// The label of a cell, if any.
    pub fn get(&self, position: Position) -> Option<u32> {
        match self.cells.get(position) {
            Some(LabelCell::Label(label)) => Some(*label),
            _ => None,
        }
    }

    /// Number of labelled cells.
    pub fn count(&self) -> usize {
        self.cells
            .values()
            .iter()
            .filter(|cell| matches!(cell, LabelCell::Label(_)))
            .count()
    }

    /// Two character text for one cell: "##" for obstacles, the zero padded label, or blanks.
    pub fn cell_text(&self, position: Position) -> String {
        match self.cells.get(position) {
            Some(LabelCell::Obstacle) => "##".to_string(),
            Some(LabelCell::Label(label)) => format!("{:02}", label),
            Some(LabelCell::Unlabelled) | None => "  ".to_string(),
        }
    }

    /// Render every row, joining cells with `separator` and appending `terminator` after the
    /// last cell of each row.
    pub fn render(&self, separator: &str, terminator: &str) -> Vec<String> {
        (0..self.cells.height())
            .map(|y| {
                let row = (0..self.cells.width())
                    .map(|x| self.cell_text(Position::new(x as i32, y as i32)))
                    .collect::<Vec<_>>()
                    .join(separator);
                format!("{}{}", row, terminator)
            })
            .collect()
    }
}

impl std::fmt::Display for FrontierLabels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(" ", " ").join("\n"))
    }
}
