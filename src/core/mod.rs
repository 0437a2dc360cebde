//! Core build orchestration logic
//!
//! # Submodules
//!
//! - [`paths`] - Per-component, per-target directory layout
//! - [`guard`] - Idempotent file replacements and diff patches
//! - [`component`] - Component capability interface and hook context
//! - [`lifecycle`] - Configure/build/install/clean sequencing
//! - [`recipe`] - Components declared in the project config
//! - [`project`] - Project config (cforge.toml) loading
//! - [`doctor`] - System dependency checks

pub mod component;
pub mod doctor;
pub mod guard;
pub mod lifecycle;
pub mod paths;
pub mod project;
pub mod recipe;
