#![forbid(unsafe_code)]

//! Core domain model and persistence for the FourFitness tracker.
//!
//! This crate provides:
//! - Domain types (goals, workouts, BMI records)
//! - BMI computation and categorisation
//! - Key-value stores (in-memory and file-backed)
//! - Remote REST access with local fallback
//! - Dashboard summaries

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod bmi;
pub mod store;
pub mod remote;
pub mod repository;
pub mod dashboard;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use bmi::{calculate_bmi, BmiCategory, BmiService};
pub use store::{current_user_id, FileStore, KeyValueStore, MemoryStore};
pub use remote::{HttpRemote, Method, OfflineRemote, RemoteApi};
pub use repository::{GoalRepository, Record, Repository, WorkoutFilter, WorkoutRepository};
pub use dashboard::DashboardSummary;
