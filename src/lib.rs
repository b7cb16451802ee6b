//! Tower-floor platformer core: grid mapping, level loading, directional
//! blocks, and the player movement state machine, plus a reference
//! physics collaborator and a terminal front end.

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
pub mod ui;
