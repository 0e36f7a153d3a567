//! Flagwarden: a reflex agent for two-team capture-the-flag Pacman.
//!
//! Each controlled unit runs a small tactical state machine and scores its
//! legal moves with a linear function over hand-crafted features. The host
//! game is reached only through the [`board::GameView`] trait; [`arena`]
//! provides a reference host for tests and self-play.

pub mod arena;
pub mod board;
pub mod config;
pub mod engine;
pub mod eval;
pub mod selfplay;
pub mod tactics;
