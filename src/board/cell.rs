//! Grid coordinates and moves.
//!
//! `Cell` is an integer grid coordinate, `Position` is what a host reports
//! for an agent and may sit between two cells while a move is in progress.
//! `Action` is the closed set of moves an agent can issue.

/// The number of distinct actions.
pub const ACTION_COUNT: usize = 5;

/// A move an agent can issue on its turn.
///
/// The `#[repr(u8)]` attribute enables use as an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Action {
    North = 0,
    South = 1,
    East = 2,
    West = 3,
    Stop = 4,
}

/// All actions in discriminant order.
pub const ALL_ACTIONS: [Action; ACTION_COUNT] = [
    Action::North,
    Action::South,
    Action::East,
    Action::West,
    Action::Stop,
];

impl Action {
    /// Returns the opposite heading. `Stop` reverses to itself.
    pub const fn reverse(self) -> Action {
        match self {
            Action::North => Action::South,
            Action::South => Action::North,
            Action::East => Action::West,
            Action::West => Action::East,
            Action::Stop => Action::Stop,
        }
    }

    /// Returns the `(dx, dy)` step of this action. Rows grow southwards.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Action::North => (0, -1),
            Action::South => (0, 1),
            Action::East => (1, 0),
            Action::West => (-1, 0),
            Action::Stop => (0, 0),
        }
    }

    /// Returns the lowercase name used in logs and match records.
    pub const fn name(self) -> &'static str {
        match self {
            Action::North => "north",
            Action::South => "south",
            Action::East => "east",
            Action::West => "west",
            Action::Stop => "stop",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    /// Returns the neighbouring cell reached by `action`.
    pub const fn step(self, action: Action) -> Cell {
        let (dx, dy) = action.delta();
        Cell {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Manhattan distance, ignoring walls.
    pub const fn manhattan(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// An agent position as reported by a host.
///
/// Hosts that animate moves in sub-steps report fractional coordinates
/// while an agent is between two cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Position { x, y }
    }

    /// Returns the cell this position sits on exactly, if it is grid-aligned.
    pub fn aligned_cell(self) -> Option<Cell> {
        if self.x.fract() == 0.0 && self.y.fract() == 0.0 {
            Some(Cell::new(self.x as i32, self.y as i32))
        } else {
            None
        }
    }

    /// Returns the closest cell.
    pub fn nearest_cell(self) -> Cell {
        Cell::new(self.x.round() as i32, self.y.round() as i32)
    }
}

impl From<Cell> for Position {
    fn from(cell: Cell) -> Self {
        Position::new(cell.x as f32, cell.y as f32)
    }
}
