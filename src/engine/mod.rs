//! Plan-driving engine
//!
//! The in-repo stand-in for the external provisioning executor: it walks a
//! computed plan stage by stage, fanning out within a stage and feeding
//! probe outcomes back into the health gate between stages.

pub mod executor;

pub use executor::{walk, NoProgress, StageProgress, WalkOptions, WalkOutcome, WalkSummary};
