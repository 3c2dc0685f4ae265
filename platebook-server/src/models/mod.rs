//! Data models for platebook-server

pub mod import_stage;

pub use import_stage::{ImportRun, ImportStage, StageTransition};
