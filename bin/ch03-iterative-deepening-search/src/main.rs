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

use grid_search::iterative_deepening::{iterative_deepening_search, IterativeDeepeningConfig};
use grid_search::{RouteProblem, SearchError};
use grid_world::{GridWorld, CLASSROOM_GOAL, CLASSROOM_START};

// Chapter 3 Solving Problems by Searching, section 3.4.4 Depth-limited and iterative deepening
// search.
//
// Route the robot through the classroom from (0, 3) to (2, 2) with iterative deepening search,
// raising the depth limit by one from 1 to 9. Print the order in which cells were visited in every
// depth-limited pass.
fn main() -> Result<(), SearchError> {
    env_logger::init();

    let world = GridWorld::classroom();
    let problem = RouteProblem::new(&world, CLASSROOM_START, CLASSROOM_GOAL)?;
    let result = iterative_deepening_search(&problem, &IterativeDeepeningConfig::default())?;

    for pass in &result.passes {
        println!("{}", pass);
    }
    match result.solution() {
        Some(solution) => log::info!("route found: {}", solution),
        None => log::warn!("no route within the depth limits"),
    }
    Ok(())
}
