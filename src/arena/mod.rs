//! Reference capture-the-flag host.
//!
//! A small, deterministic implementation of [`GameView`] used by the test
//! suite, the benchmarks and the self-play driver. Maps come from fixture
//! rows (see [`Layout`]); the left half belongs to the red team (even agent
//! indices), the right half to blue (odd indices).
//!
//! Rules: an agent on the enemy half eats the food and capsules it steps
//! on, a capsule scares every opponent for `SCARED_TIME` of their own
//! moves, carried food scores when its holder steps back onto home ground,
//! and an invader sharing a cell with an unscared defender is sent back to
//! its spawn, dropping what it carried.

pub mod layout;

use std::collections::BTreeSet;
use std::sync::Arc;

pub use layout::{ArenaError, Layout, UNREACHABLE};

use crate::board::{Action, AgentId, AgentState, Cell, GameView, Position};

/// Moves a capsule keeps the opposing team scared for.
pub const SCARED_TIME: u32 = 40;

/// The game ends once either team has this much food or less left to eat.
pub const MIN_FOOD: usize = 2;

/// Which half of the board a team defends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub const fn of(agent: AgentId) -> Team {
        if agent % 2 == 0 {
            Team::Red
        } else {
            Team::Blue
        }
    }
}

/// Mutable per-agent state.
#[derive(Debug, Clone)]
struct Body {
    cell: Cell,
    /// Heading of a half-finished move (only with half steps enabled).
    partial: Option<Action>,
    direction: Action,
    scared_timer: u32,
    carried: Vec<Cell>,
    visible: bool,
}

/// A full game snapshot. Cloning is cheap: the layout is shared.
#[derive(Debug, Clone)]
pub struct Arena {
    layout: Arc<Layout>,
    bodies: Vec<Body>,
    food: BTreeSet<Cell>,
    capsules: BTreeSet<Cell>,
    red_score: i32,
    turn: u32,
    half_steps: bool,
}

impl Arena {
    /// Builds an arena from fixture rows with every agent on its spawn.
    pub fn from_rows(rows: &[&str]) -> Result<Arena, ArenaError> {
        let (layout, contents) = Layout::from_rows(rows)?;
        let bodies = layout
            .spawns()
            .iter()
            .map(|&cell| Body {
                cell,
                partial: None,
                direction: Action::Stop,
                scared_timer: 0,
                carried: Vec::new(),
                visible: true,
            })
            .collect();

        Ok(Arena {
            layout: Arc::new(layout),
            bodies,
            food: contents.food,
            capsules: contents.capsules,
            red_score: 0,
            turn: 0,
            half_steps: false,
        })
    }

    /// Makes every move take two plies, leaving the mover between cells
    /// after the first.
    pub fn with_half_steps(mut self) -> Arena {
        self.half_steps = true;
        self
    }

    /// Moves `agent` to `cell` without any game effects. Test setup only.
    pub fn place(mut self, agent: AgentId, cell: Cell) -> Arena {
        let body = &mut self.bodies[agent];
        body.cell = cell;
        body.partial = None;
        self
    }

    pub fn with_scared(mut self, agent: AgentId, timer: u32) -> Arena {
        self.bodies[agent].scared_timer = timer;
        self
    }

    /// The snapshot as `viewer`'s team sees it: opponents further than
    /// `range` (Manhattan) from every teammate are hidden. `None` sees all.
    pub fn observe(&self, viewer: AgentId, range: Option<u32>) -> Arena {
        let mut view = self.clone();
        let team = Team::of(viewer);
        let watchers: Vec<Cell> = self
            .bodies
            .iter()
            .enumerate()
            .filter(|&(i, _)| Team::of(i) == team)
            .map(|(_, b)| b.cell)
            .collect();

        for (i, body) in view.bodies.iter_mut().enumerate() {
            body.visible = Team::of(i) == team
                || range.map_or(true, |r| watchers.iter().any(|w| w.manhattan(body.cell) <= r));
        }
        view
    }

    pub fn agent_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn spawn(&self, agent: AgentId) -> Cell {
        self.layout.spawns()[agent]
    }

    /// Score from red's perspective.
    pub fn red_score(&self) -> i32 {
        self.red_score
    }

    /// Number of moves applied so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Food on `team`'s half still on the board.
    pub fn food_left(&self, team: Team) -> usize {
        self.food.iter().filter(|&&c| self.side_of(c) == team).count()
    }

    /// True once either team has at most `MIN_FOOD` food left to eat.
    pub fn is_over(&self) -> bool {
        self.food_left(Team::Red) <= MIN_FOOD || self.food_left(Team::Blue) <= MIN_FOOD
    }

    /// Which team's half `cell` lies on.
    pub fn side_of(&self, cell: Cell) -> Team {
        if cell.x < self.layout.width() / 2 {
            Team::Red
        } else {
            Team::Blue
        }
    }

    fn is_invading(&self, agent: AgentId) -> bool {
        self.side_of(self.bodies[agent].cell) != Team::of(agent)
    }

    /// Applies one ply for `agent`. Moves into walls leave the agent where
    /// it is; callers are expected to pick from `legal_actions`.
    pub fn apply(&mut self, agent: AgentId, action: Action) {
        self.turn += 1;
        let body = &mut self.bodies[agent];
        body.scared_timer = body.scared_timer.saturating_sub(1);

        let heading = match body.partial.take() {
            Some(prev) => prev,
            None if self.half_steps && action != Action::Stop => {
                if self.layout.is_open(body.cell.step(action)) {
                    body.partial = Some(action);
                    body.direction = action;
                }
                return;
            }
            None => action,
        };

        let target = body.cell.step(heading);
        if !self.layout.is_open(target) {
            return;
        }
        body.cell = target;
        body.direction = heading;
        self.arrive(agent);
    }

    /// Resolves eating, scoring and collisions after `agent` enters a cell.
    fn arrive(&mut self, agent: AgentId) {
        let team = Team::of(agent);
        let cell = self.bodies[agent].cell;

        if self.is_invading(agent) {
            if self.food.remove(&cell) {
                self.bodies[agent].carried.push(cell);
            }
            if self.capsules.remove(&cell) {
                for (i, body) in self.bodies.iter_mut().enumerate() {
                    if Team::of(i) != team {
                        body.scared_timer = SCARED_TIME;
                    }
                }
            }
        } else if !self.bodies[agent].carried.is_empty() {
            let banked = self.bodies[agent].carried.len() as i32;
            self.bodies[agent].carried.clear();
            self.red_score += match team {
                Team::Red => banked,
                Team::Blue => -banked,
            };
        }

        let rivals: Vec<AgentId> = (0..self.bodies.len())
            .filter(|&i| Team::of(i) != team)
            .filter(|&i| self.bodies[i].visible && self.bodies[i].cell == cell)
            .collect();
        for rival in rivals {
            let (invader, defender) = if self.is_invading(agent) {
                (agent, rival)
            } else {
                (rival, agent)
            };
            if self.bodies[defender].scared_timer > 0 {
                self.respawn(defender);
            } else {
                self.respawn(invader);
            }
        }
    }

    fn respawn(&mut self, agent: AgentId) {
        let spawn = self.spawn(agent);
        let body = &mut self.bodies[agent];
        self.food.extend(body.carried.drain(..));
        body.cell = spawn;
        body.partial = None;
        body.direction = Action::Stop;
        body.scared_timer = 0;
    }

    fn food_on(&self, team: Team) -> Vec<Cell> {
        self.food
            .iter()
            .copied()
            .filter(|&c| self.side_of(c) == team)
            .collect()
    }

    fn capsules_on(&self, team: Team) -> Vec<Cell> {
        self.capsules
            .iter()
            .copied()
            .filter(|&c| self.side_of(c) == team)
            .collect()
    }
}

fn enemy_of(team: Team) -> Team {
    match team {
        Team::Red => Team::Blue,
        Team::Blue => Team::Red,
    }
}

impl GameView for Arena {
    fn legal_actions(&self, agent: AgentId) -> Vec<Action> {
        let body = &self.bodies[agent];
        if let Some(prev) = body.partial {
            return vec![prev];
        }
        let mut actions: Vec<Action> = [Action::North, Action::South, Action::East, Action::West]
            .into_iter()
            .filter(|&a| self.layout.is_open(body.cell.step(a)))
            .collect();
        actions.push(Action::Stop);
        actions
    }

    fn successor(&self, agent: AgentId, action: Action) -> Arena {
        let mut next = self.clone();
        next.apply(agent, action);
        next
    }

    fn agent_state(&self, agent: AgentId) -> AgentState {
        let body = &self.bodies[agent];
        let position = body.visible.then(|| {
            let (dx, dy) = body.partial.map_or((0, 0), Action::delta);
            Position::new(
                body.cell.x as f32 + dx as f32 * 0.5,
                body.cell.y as f32 + dy as f32 * 0.5,
            )
        });
        AgentState {
            position,
            is_pacman: self.is_invading(agent),
            scared_timer: body.scared_timer,
            num_carrying: body.carried.len() as u32,
            direction: body.direction,
        }
    }

    fn score(&self, agent: AgentId) -> i32 {
        match Team::of(agent) {
            Team::Red => self.red_score,
            Team::Blue => -self.red_score,
        }
    }

    fn opponents(&self, agent: AgentId) -> Vec<AgentId> {
        let team = Team::of(agent);
        (0..self.bodies.len()).filter(|&i| Team::of(i) != team).collect()
    }

    fn target_food(&self, agent: AgentId) -> Vec<Cell> {
        self.food_on(enemy_of(Team::of(agent)))
    }

    fn own_food(&self, agent: AgentId) -> Vec<Cell> {
        self.food_on(Team::of(agent))
    }

    fn target_capsules(&self, agent: AgentId) -> Vec<Cell> {
        self.capsules_on(enemy_of(Team::of(agent)))
    }

    fn own_capsules(&self, agent: AgentId) -> Vec<Cell> {
        self.capsules_on(Team::of(agent))
    }

    fn maze_distance(&self, from: Cell, to: Cell) -> u32 {
        self.layout.distance(from, to)
    }
}
