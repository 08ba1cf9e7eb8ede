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

use grid_localization::{classroom_agenda, LocalizationError, Localizer};

// Chapter 14 Probabilistic Reasoning over Time, section 14.2 Inference in Temporal Models.
//
// The robot is somewhere in the classroom and does not know where. Its wall sensors detect a wall
// with probability 0.75 and an open square with probability 0.8; its moves go the intended way
// with probability 0.7 and drift left or right with probability 0.15 each. Starting from a
// uniform belief, alternate filtering and prediction and print the belief after each step.
fn main() -> Result<(), LocalizationError> {
    env_logger::init();

    let mut localizer = Localizer::classroom()?;
    println!("Initial Location Probabilities");
    println!("{}", localizer.belief());
    println!();

    localizer.run_agenda(&classroom_agenda(), |item, belief| {
        println!("{}", item);
        println!("{}", belief);
        println!();
    })?;

    if let Some((position, probability)) = localizer.belief().most_likely() {
        log::info!(
            "most likely location {} with probability {:.4}",
            position,
            probability
        );
    }
    Ok(())
}
