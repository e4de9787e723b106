//! UI module for the navigation TUI

pub mod render;
pub mod theme;
