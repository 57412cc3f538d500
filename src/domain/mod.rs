//! Core domain types and logic.

pub mod blender;
pub mod config_validation;
pub mod error;
pub mod history;
pub mod normalizer;
pub mod series;
pub mod simulation;
pub mod statistics;
pub mod timeline;
