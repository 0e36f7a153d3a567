//! Static maze data for the reference arena.
//!
//! Walls, spawn cells and the all-pairs maze distance table. A layout is
//! built once from fixture rows and shared between snapshots behind an
//! `Arc`, so cloning an arena never copies it.

use std::collections::{BTreeSet, VecDeque};

use crate::board::{Cell, ALL_ACTIONS};

/// Distance reported between cells with no path.
pub const UNREACHABLE: u32 = u32::MAX;

/// Maximum number of agents a layout can place (spawn digits `1`-`9`).
pub const MAX_AGENTS: usize = 9;

/// Errors that can occur while building a layout from rows.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("layout has no rows")]
    Empty,

    #[error("row {row} has width {width}, expected {expected}")]
    Ragged {
        row: usize,
        width: usize,
        expected: usize,
    },

    #[error("unknown layout character '{ch}' at ({x}, {y})")]
    UnknownChar { ch: char, x: usize, y: usize },

    #[error("duplicate spawn for agent {0}")]
    DuplicateSpawn(usize),

    #[error("agent {0} has no spawn")]
    MissingSpawn(usize),

    #[error("layout needs at least two agents, found {0}")]
    TooFewAgents(usize),
}

/// Items found while reading the rows.
#[derive(Debug)]
pub(crate) struct Contents {
    pub food: BTreeSet<Cell>,
    pub capsules: BTreeSet<Cell>,
}

/// Walls, spawns and maze distances of one map.
#[derive(Debug)]
pub struct Layout {
    width: i32,
    height: i32,
    walls: Vec<bool>,
    spawns: Vec<Cell>,
    distances: Vec<u32>,
}

impl Layout {
    /// Reads fixture rows: `%` wall, `.` food, `o` capsule, `1`-`9` agent
    /// spawns (agent index = digit - 1), space for open floor.
    pub(crate) fn from_rows(rows: &[&str]) -> Result<(Layout, Contents), ArenaError> {
        let first = rows.first().ok_or(ArenaError::Empty)?;
        let width = first.chars().count();
        let height = rows.len();

        let mut walls = Vec::with_capacity(width * height);
        let mut food = BTreeSet::new();
        let mut capsules = BTreeSet::new();
        let mut spawns: [Option<Cell>; MAX_AGENTS] = [None; MAX_AGENTS];

        for (y, row) in rows.iter().enumerate() {
            let row_width = row.chars().count();
            if row_width != width {
                return Err(ArenaError::Ragged {
                    row: y,
                    width: row_width,
                    expected: width,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let cell = Cell::new(x as i32, y as i32);
                match ch {
                    '%' => walls.push(true),
                    ' ' => walls.push(false),
                    '.' => {
                        walls.push(false);
                        food.insert(cell);
                    }
                    'o' => {
                        walls.push(false);
                        capsules.insert(cell);
                    }
                    '1'..='9' => {
                        walls.push(false);
                        let agent = ch as usize - '1' as usize;
                        if spawns[agent].replace(cell).is_some() {
                            return Err(ArenaError::DuplicateSpawn(agent));
                        }
                    }
                    _ => return Err(ArenaError::UnknownChar { ch, x, y }),
                }
            }
        }

        let count = spawns.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        if count < 2 {
            return Err(ArenaError::TooFewAgents(count));
        }
        let spawns = spawns[..count]
            .iter()
            .enumerate()
            .map(|(i, s)| s.ok_or(ArenaError::MissingSpawn(i)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut layout = Layout {
            width: width as i32,
            height: height as i32,
            walls,
            spawns,
            distances: Vec::new(),
        };
        layout.distances = layout.build_distances();
        Ok((layout, Contents { food, capsules }))
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn spawns(&self) -> &[Cell] {
        &self.spawns
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width || cell.y >= self.height {
            None
        } else {
            Some((cell.y * self.width + cell.x) as usize)
        }
    }

    fn cell_at(&self, index: usize) -> Cell {
        let w = self.width as usize;
        Cell::new((index % w) as i32, (index / w) as i32)
    }

    /// True for in-bounds cells without a wall.
    #[inline]
    pub fn is_open(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| !self.walls[i])
    }

    /// Maze distance, or `UNREACHABLE` for walls, off-map cells and
    /// disconnected pairs.
    #[inline]
    pub fn distance(&self, from: Cell, to: Cell) -> u32 {
        let n = self.walls.len();
        match (self.index(from), self.index(to)) {
            (Some(a), Some(b)) => self.distances[a * n + b],
            _ => UNREACHABLE,
        }
    }

    /// BFS from every open cell.
    fn build_distances(&self) -> Vec<u32> {
        let n = self.walls.len();
        let mut dist = vec![UNREACHABLE; n * n];
        let mut queue = VecDeque::with_capacity(n);

        for src in 0..n {
            if self.walls[src] {
                continue;
            }
            dist[src * n + src] = 0;
            queue.clear();
            queue.push_back((src, 0u32));

            while let Some((cur, d)) = queue.pop_front() {
                let cell = self.cell_at(cur);
                for action in ALL_ACTIONS {
                    let next = cell.step(action);
                    if let Some(ni) = self.index(next) {
                        if !self.walls[ni] && dist[src * n + ni] == UNREACHABLE {
                            dist[src * n + ni] = d + 1;
                            queue.push_back((ni, d + 1));
                        }
                    }
                }
            }
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_rows() {
        let err = Layout::from_rows(&["%%%%", "%1 2%", "%%%%"]).unwrap_err();
        assert!(matches!(err, ArenaError::Ragged { row: 1, .. }));
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = Layout::from_rows(&["%%%%", "%1x2", "%%%%"]).unwrap_err();
        assert!(matches!(err, ArenaError::UnknownChar { ch: 'x', x: 2, y: 1 }));
    }

    #[test]
    fn rejects_gaps_in_spawn_digits() {
        let err = Layout::from_rows(&["%%%%%", "%1 3%", "%%%%%"]).unwrap_err();
        assert!(matches!(err, ArenaError::MissingSpawn(1)));
    }

    #[test]
    fn rejects_single_agent() {
        let err = Layout::from_rows(&["%%%", "%1%", "%%%"]).unwrap_err();
        assert!(matches!(err, ArenaError::TooFewAgents(1)));
        assert!(matches!(Layout::from_rows(&[]), Err(ArenaError::Empty)));
    }

    #[test]
    fn distances_route_around_walls() {
        let (layout, _) = Layout::from_rows(&[
            "%%%%%%%",
            "%1 % 2%",
            "%  %  %",
            "%     %",
            "%%%%%%%",
        ])
        .unwrap();
        let a = Cell::new(1, 1);
        let b = Cell::new(5, 1);
        assert_eq!(layout.distance(a, b), 8);
        assert_eq!(layout.distance(b, a), 8);
        assert_eq!(layout.distance(a, a), 0);
        assert_eq!(layout.distance(a, Cell::new(3, 1)), UNREACHABLE);
        assert_eq!(layout.distance(a, Cell::new(40, 1)), UNREACHABLE);
    }

    #[test]
    fn collects_items_and_spawns() {
        let (layout, contents) =
            Layout::from_rows(&["%%%%%%", "%1.o2%", "%%%%%%"]).unwrap();
        assert_eq!(layout.spawns(), &[Cell::new(1, 1), Cell::new(4, 1)]);
        assert!(contents.food.contains(&Cell::new(2, 1)));
        assert!(contents.capsules.contains(&Cell::new(3, 1)));
    }
}
