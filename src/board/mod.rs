//! Board vocabulary and the host query interface.
//!
//! Contains the grid coordinate and move types plus the `GameView` trait
//! through which the engine reads a host's game snapshots.

pub mod cell;
pub mod view;

pub use cell::{Action, Cell, Position, ACTION_COUNT, ALL_ACTIONS};
pub use view::{AgentId, AgentState, GameView};
