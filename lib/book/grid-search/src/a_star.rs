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

//! A* search.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use grid_world::{Direction, Position};
use serde::{Deserialize, Serialize};

use crate::{FrontierLabels, HashMap, HashSet, RouteProblem, Solution};

/// Width of the dashed rule printed around the frontier labels.
const RULE_WIDTH: usize = 18;

/// Estimates the cost of the cheapest path from a cell to the goal.
pub trait Heuristic {
    /// Estimated remaining cost. Must never overestimate for A* to return an optimal path.
    fn estimate(&self, from: Position, goal: Position) -> u32;
}

/// Manhattan distance where each axis is weighted by the step cost of moving toward the goal
/// along that axis. With west/east costing 2, north 3 and south 1 this is
/// `2 * |dx| + (dy if the goal is south else 3 * |dy|)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionalManhattan;

impl Heuristic for DirectionalManhattan {
    fn estimate(&self, from: Position, goal: Position) -> u32 {
        let dx = goal.x - from.x;
        let dy = goal.y - from.y;
        let horizontal = if dx < 0 {
            Direction::West
        } else {
            Direction::East
        };
        let vertical = if dy < 0 {
            Direction::North
        } else {
            Direction::South
        };
        dx.unsigned_abs() * horizontal.step_cost() + dy.unsigned_abs() * vertical.step_cost()
    }
}

/// Always zero, which turns A* into uniform-cost search.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHeuristic;

impl Heuristic for NoHeuristic {
    fn estimate(&self, _from: Position, _goal: Position) -> u32 {
        0
    }
}

// field order matters: the derived Ord compares f first, then insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FrontierEntry {
    f: u32,
    insertion: u64,
    g: u32,
    position: Position,
}

/// Everything A* did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AStarResult {
    /// Order in which each cell first entered the frontier. The start is 0.
    pub labels: FrontierLabels,

    /// Cells in the order they were expanded.
    pub expanded: Vec<Position>,

    /// Cheapest route, or None if the goal is unreachable.
    pub solution: Option<Solution>,

    start: Position,

    #[serde(skip)]
    parents: HashMap<Position, (Position, Direction)>,
}

impl AStarResult {
    /// The cheapest known route from the start to any cell that entered the frontier.
    pub fn route_to(&self, position: Position) -> Option<Solution> {
        if position != self.start && !self.parents.contains_key(&position) {
            return None;
        }
        Some(Solution::from_parents(&self.parents, position))
    }
}

impl std::fmt::Display for AStarResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "-".repeat(RULE_WIDTH);
        writeln!(f, "A* Search")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "{}", self.labels)?;
        write!(f, "{}", rule)
    }
}

/// Run A*. The frontier is ordered by `f = g + h`; among equal `f` the cell that entered the
/// frontier first wins. Successors are generated West, North, East, South. A cheaper path to a
/// cell already on the frontier replaces the old entry, and expanded cells are never reopened.
pub fn a_star_search<H: Heuristic>(problem: &RouteProblem, heuristic: &H) -> AStarResult {
    let world = problem.world();
    let goal = problem.goal();

    let mut labels = FrontierLabels::new(world);
    let mut best_cost: HashMap<Position, u32> = HashMap::default();
    let mut parents: HashMap<Position, (Position, Direction)> = HashMap::default();
    let mut explored: HashSet<Position> = HashSet::default();
    let mut expanded = Vec::new();
    let mut frontier = BinaryHeap::new();

    let mut insertion = 0;
    let mut next_label = 1;
    labels.set(problem.start(), 0);
    best_cost.insert(problem.start(), 0);
    frontier.push(Reverse(FrontierEntry {
        f: heuristic.estimate(problem.start(), goal),
        insertion,
        g: 0,
        position: problem.start(),
    }));

    while let Some(Reverse(entry)) = frontier.pop() {
        // stale entry, a cheaper one was pushed later.
        if explored.contains(&entry.position) || entry.g > best_cost[&entry.position] {
            continue;
        }
        explored.insert(entry.position);
        expanded.push(entry.position);
        log::debug!(
            "expanding {} with g = {}, f = {}",
            entry.position,
            entry.g,
            entry.f
        );

        if entry.position == goal {
            let mut result = AStarResult {
                labels,
                expanded,
                solution: None,
                start: problem.start(),
                parents,
            };
            result.solution = result.route_to(goal);
            if let Some(solution) = &result.solution {
                log::info!(
                    "reached goal after {} expansions: {}",
                    result.expanded.len(),
                    solution
                );
            }
            return result;
        }

        for direction in Direction::ALL {
            let Some(next) = world.successor(entry.position, direction) else {
                continue;
            };
            if explored.contains(&next) {
                continue;
            }
            let g = entry.g + direction.step_cost();
            if best_cost.get(&next).map_or(false, |&known| known <= g) {
                continue;
            }

            if let Some(known) = best_cost.insert(next, g) {
                log::debug!("cheaper path to {}: {} instead of {}", next, g, known);
            }
            parents.insert(next, (entry.position, direction));
            if labels.get(next).is_none() {
                labels.set(next, next_label);
                next_label += 1;
            }
            insertion += 1;
            frontier.push(Reverse(FrontierEntry {
                f: g + heuristic.estimate(next, goal),
                insertion,
                g,
                position: next,
            }));
        }
    }

    log::warn!("frontier exhausted, {} is unreachable", goal);
    AStarResult {
        labels,
        expanded,
        solution: None,
        start: problem.start(),
        parents,
    }
}
