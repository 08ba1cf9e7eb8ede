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

//! Iterative deepening depth-first search.
//!
//! Each pass is a depth-limited search driven by a LIFO stack. A cell goes onto the stack at most
//! once per pass, the first time it is generated, and is stamped with the pass-local scan step
//! (the start is step 0). Successors are pushed West, North, East, South, so South is explored
//! first.

use std::collections::hash_map::Entry;

use grid_world::{Direction, Position};
use serde::{Deserialize, Serialize};

use crate::{FrontierLabels, HashMap, RouteProblem, SearchError, Solution};

/// Width of the dashed rule printed above and below each pass.
const BORDER_WIDTH: usize = 18;

/// Depth limits to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterativeDeepeningConfig {
    /// Depth limit of the first pass.
    pub initial_depth_limit: u32,

    /// How much the limit grows after each pass.
    pub depth_increment: u32,

    /// The last limit tried, inclusive.
    pub max_depth_limit: u32,
}

impl Default for IterativeDeepeningConfig {
    fn default() -> Self {
        Self {
            initial_depth_limit: 1,
            depth_increment: 1,
            max_depth_limit: 9,
        }
    }
}

/// How a depth-limited pass ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassOutcome {
    /// The goal was visited.
    Found(Solution),

    /// Some cell sat at the depth limit, so a deeper pass might still succeed.
    Cutoff,

    /// Everything reachable was visited without meeting the limit. Deeper passes cannot help.
    Failure,
}

/// The result of one depth-limited pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLimitedPass {
    /// Depth limit used.
    pub depth_limit: u32,

    /// Scan step of every visited cell.
    pub labels: FrontierLabels,

    /// How the pass ended.
    pub outcome: PassOutcome,
}

impl std::fmt::Display for DepthLimitedPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let border = "-".repeat(BORDER_WIDTH);
        writeln!(f, "{}", border)?;
        for row in self.labels.render("  ", "  ") {
            writeln!(f, "{}", row)?;
        }
        write!(f, "{}", border)
    }
}

/// Every pass that ran, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterativeDeepeningResult {
    /// Passes with increasing depth limits.
    pub passes: Vec<DepthLimitedPass>,
}

impl IterativeDeepeningResult {
    /// The solution found by the last pass, if any.
    pub fn solution(&self) -> Option<&Solution> {
        match self.passes.last().map(|pass| &pass.outcome) {
            Some(PassOutcome::Found(solution)) => Some(solution),
            _ => None,
        }
    }
}

/// Run one depth-limited pass.
pub fn depth_limited_search(problem: &RouteProblem, depth_limit: u32) -> DepthLimitedPass {
    let world = problem.world();
    let mut labels = FrontierLabels::new(world);
    let mut scan_steps: HashMap<Position, u32> = HashMap::default();
    let mut parents: HashMap<Position, (Position, Direction)> = HashMap::default();
    let mut stack: Vec<(Position, u32)> = vec![(problem.start(), 0)];
    scan_steps.insert(problem.start(), 0);
    let mut next_step = 1;
    let mut cutoff = false;

    while let Some((position, depth)) = stack.pop() {
        labels.set(position, scan_steps[&position]);
        log::debug!(
            "depth limit {}: visiting {} at depth {}",
            depth_limit,
            position,
            depth
        );

        if position == problem.goal() {
            return DepthLimitedPass {
                depth_limit,
                labels,
                outcome: PassOutcome::Found(Solution::from_parents(&parents, position)),
            };
        }

        if depth >= depth_limit {
            cutoff = true;
            continue;
        }

        for direction in Direction::ALL {
            let Some(next) = world.successor(position, direction) else {
                continue;
            };
            if let Entry::Vacant(entry) = scan_steps.entry(next) {
                entry.insert(next_step);
                next_step += 1;
                parents.insert(next, (position, direction));
                stack.push((next, depth + 1));
            }
        }
    }

    DepthLimitedPass {
        depth_limit,
        labels,
        outcome: if cutoff {
            PassOutcome::Cutoff
        } else {
            PassOutcome::Failure
        },
    }
}

/// Run depth-limited passes with growing limits until the goal is found, the search space is
/// exhausted, or the maximum limit has been tried.
pub fn iterative_deepening_search(
    problem: &RouteProblem,
    config: &IterativeDeepeningConfig,
) -> Result<IterativeDeepeningResult, SearchError> {
    if config.depth_increment == 0 {
        return Err(SearchError::ZeroDepthIncrement);
    }

    let mut passes = Vec::new();
    let mut depth_limit = config.initial_depth_limit;
    while depth_limit <= config.max_depth_limit {
        let pass = depth_limited_search(problem, depth_limit);
        let finished = !matches!(pass.outcome, PassOutcome::Cutoff);
        log::info!(
            "depth limit {}: {} cells visited, {:?}",
            depth_limit,
            pass.labels.count(),
            pass.outcome
        );
        passes.push(pass);
        if finished {
            break;
        }
        depth_limit += config.depth_increment;
    }

    Ok(IterativeDeepeningResult { passes })
}
