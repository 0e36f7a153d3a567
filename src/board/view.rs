//! The read-only query interface a host game exposes to the engine.
//!
//! The engine never owns or mutates a game: it asks the host for legal
//! moves, simulated successors and maze distances, and reads agent flags
//! through [`AgentState`]. Everything is phrased from the point of view of
//! one agent (`AgentId`), so "target" food is what that agent's team eats
//! and "own" food is what it defends.

use super::cell::{Action, Cell, Position};

/// Index of an agent within a game.
pub type AgentId = usize;

/// The observable state of one agent in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentState {
    /// `None` when the agent cannot currently be observed.
    pub position: Option<Position>,
    /// True while the agent is inside enemy territory.
    pub is_pacman: bool,
    /// Remaining turns during which the agent can be eaten by invaders.
    pub scared_timer: u32,
    /// Food the agent holds and has not yet brought home.
    pub num_carrying: u32,
    /// Heading of the agent's last move.
    pub direction: Action,
}

impl AgentState {
    /// Returns the closest cell when the agent is visible.
    pub fn nearest_cell(&self) -> Option<Cell> {
        self.position.map(Position::nearest_cell)
    }

    /// True for a visible opponent that guards its own side and is not scared.
    pub fn is_active_defender(&self) -> bool {
        self.position.is_some() && !self.is_pacman && self.scared_timer == 0
    }
}

/// A game snapshot as seen by the engine.
///
/// Implementations must treat `self` as immutable: `successor` returns a
/// fresh snapshot and leaves the receiver untouched.
pub trait GameView: Sized {
    /// Moves `agent` may issue in this snapshot.
    fn legal_actions(&self, agent: AgentId) -> Vec<Action>;

    /// The snapshot after `agent` issues `action` (one simulated ply).
    fn successor(&self, agent: AgentId, action: Action) -> Self;

    fn agent_state(&self, agent: AgentId) -> AgentState;

    /// Official score from `agent`'s team perspective.
    fn score(&self, agent: AgentId) -> i32;

    fn opponents(&self, agent: AgentId) -> Vec<AgentId>;

    /// Food `agent`'s team is trying to eat.
    fn target_food(&self, agent: AgentId) -> Vec<Cell>;

    /// Food `agent`'s team is defending.
    fn own_food(&self, agent: AgentId) -> Vec<Cell>;

    fn target_capsules(&self, agent: AgentId) -> Vec<Cell>;

    fn own_capsules(&self, agent: AgentId) -> Vec<Cell>;

    /// Shortest-path step count between two cells. Symmetric.
    fn maze_distance(&self, from: Cell, to: Cell) -> u32;
}
