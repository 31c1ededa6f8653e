//! Configuration types and loaders for gridmenu.
//!
//! This crate owns the on-disk configuration schema so the menu engine and
//! the terminal host share a single source of truth.

pub mod menu;

pub use menu::{DispatchConfig, MenuConfig, SchedulerConfig};
