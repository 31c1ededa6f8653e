//! Terminal presentation for gridmenu.
//!
//! Widgets that draw a menu surface as a grid, the log panel and the
//! surrounding chrome. All rendering uses [`ratatui`]; the state being drawn
//! lives in [`gridmenu_core`].

pub mod grid;
pub mod layout;
pub mod log_panel;
pub mod shell;
