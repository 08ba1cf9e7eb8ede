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

use q_learning::{QLearner, QLearningConfig, QLearningError};

// Chapter 23 Reinforcement Learning, section 23.4.3 Temporal-difference Q-learning.
//
// The robot must learn to reach (2, 2) without knowing its motion model. Every move is charged its
// step cost and reaching the goal is worth +100. Run 10,000 trials of epsilon-greedy Q-learning
// and print the learned Q(s, a), the visit counts N(s, a) and the greedy policy.
fn main() -> Result<(), QLearningError> {
    env_logger::init();

    let mut learner = QLearner::classroom(QLearningConfig::default())?;
    let summary = learner.train()?;
    log::info!(
        "{} of {} trials reached the terminal, {} moves in total",
        summary.reached_terminal,
        summary.trials,
        summary.total_steps
    );
    log::debug!("{}", learner.serialize_tables()?);

    println!("Table of Q(s, a)");
    print!("{}", learner.render_q_table());
    println!();
    println!("Table of N(s, a)");
    print!("{}", learner.render_n_table());
    println!();
    print!("{}", learner.policy());
    Ok(())
}
