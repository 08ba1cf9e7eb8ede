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

use grid_search::a_star::{a_star_search, DirectionalManhattan};
use grid_search::{RouteProblem, SearchError};
use grid_world::{GridWorld, CLASSROOM_GOAL, CLASSROOM_START};

// Chapter 3 Solving Problems by Searching, section 3.5.2 A* search.
//
// Same classroom route, now with A*. Moving west or east costs 2, north 3 and south 1, and the
// heuristic is the Manhattan distance weighted by those costs. Print the order in which cells
// entered the frontier.
fn main() -> Result<(), SearchError> {
    env_logger::init();

    let world = GridWorld::classroom();
    let problem = RouteProblem::new(&world, CLASSROOM_START, CLASSROOM_GOAL)?;
    let result = a_star_search(&problem, &DirectionalManhattan);

    println!("{}", result);
    if let Some(solution) = &result.solution {
        log::info!("route found: {}", solution);
    }
    Ok(())
}
