//! UI rendering components split from the main renderer

pub mod challenge;
pub mod common;
pub mod dialogue;
pub mod hud;
