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

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::Position;

/// Dense table with one value per grid cell, stored row-major.
///
/// This is what the exercises keep per cell: frontier labels, a probability distribution, or
/// Q-values and visit counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridMap<T> {
    width: usize,
    height: usize,
    values: Vec<T>,
}

impl<T: Clone> GridMap<T> {
    /// Create a table with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            values: vec![value; width * height],
        }
    }
}

impl<T> GridMap<T> {
    /// Create a table by calling `f` for every position in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(Position) -> T) -> Self {
        let values = (0..height)
            .flat_map(|y| (0..width).map(move |x| Position::new(x as i32, y as i32)))
            .map(&mut f)
            .collect();
        Self {
            width,
            height,
            values,
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the position lies inside the table.
    pub fn contains(&self, position: Position) -> bool {
        self.index_of(position).is_some()
    }

    fn index_of(&self, position: Position) -> Option<usize> {
        if position.x < 0 || position.y < 0 {
            return None;
        }
        let (x, y) = (position.x as usize, position.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    fn position_of(&self, index: usize) -> Position {
        Position::new((index % self.width) as i32, (index / self.width) as i32)
    }

    /// Get a value, or None if the position is outside the table.
    pub fn get(&self, position: Position) -> Option<&T> {
        self.index_of(position).map(|index| &self.values[index])
    }

    /// Get a mutable value, or None if the position is outside the table.
    pub fn get_mut(&mut self, position: Position) -> Option<&mut T> {
        match self.index_of(position) {
            Some(index) => Some(&mut self.values[index]),
            None => None,
        }
    }

    /// Iterate over (position, value) pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(index, value)| (self.position_of(index), value))
    }

    /// Iterate over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.values.chunks(self.width)
    }

    /// All values in row-major order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable access to all values in row-major order.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Build a new table of the same shape from this one.
    pub fn map<U>(&self, mut f: impl FnMut(Position, &T) -> U) -> GridMap<U> {
        GridMap {
            width: self.width,
            height: self.height,
            values: self.iter().map(|(position, value)| f(position, value)).collect(),
        }
    }
}

impl<T> Index<Position> for GridMap<T> {
    type Output = T;

    fn index(&self, position: Position) -> &Self::Output {
        match self.index_of(position) {
            Some(index) => &self.values[index],
            None => panic!(
                "position {} outside {}x{} grid",
                position, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<Position> for GridMap<T> {
    fn index_mut(&mut self, position: Position) -> &mut Self::Output {
        match self.index_of(position) {
            Some(index) => &mut self.values[index],
            None => panic!(
                "position {} outside {}x{} grid",
                position, self.width, self.height
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_is_row_major() {
        let map = GridMap::from_fn(3, 2, |p| p.y * 10 + p.x);
        assert_eq!(map.values(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(map[Position::new(2, 1)], 12);
        assert_eq!(map.rows().count(), 2);
    }

    #[test]
    fn test_get_outside_is_none() {
        let map = GridMap::filled(3, 2, 0u8);
        assert_eq!(map.get(Position::new(3, 0)), None);
        assert_eq!(map.get(Position::new(0, 2)), None);
        assert_eq!(map.get(Position::new(-1, 0)), None);
        assert_eq!(map.get(Position::new(2, 1)), Some(&0));
    }

    #[test]
    fn test_iter_positions_match_values() {
        let map = GridMap::from_fn(4, 3, |p| p);
        for (position, value) in map.iter() {
            assert_eq!(position, *value);
        }
    }

    #[test]
    fn test_map_keeps_shape() {
        let mut map = GridMap::filled(2, 2, 1);
        map[Position::new(1, 1)] = 5;
        let doubled = map.map(|_, v| v * 2);
        assert_eq!(doubled.values(), &[2, 2, 2, 10]);
        assert_eq!(doubled.width(), 2);
    }

    #[test]
    #[should_panic]
    fn test_index_outside_panics() {
        let map = GridMap::filled(2, 2, 0);
        let _ = map[Position::new(2, 2)];
    }
}
