#![forbid(unsafe_code)]

//! Core domain model and business logic for the kcal calorie tracker.
//!
//! This crate provides:
//! - Domain types (biometrics, profiles, meals)
//! - BMR / TDEE calculation
//! - Profile editor with daily-goal reconciliation
//! - Meal form and daily progress aggregation
//! - Auth and storage collaborators with a local file-backed implementation
//! - Live snapshot feeds, CSV export, configuration and logging

pub mod types;
pub mod error;
pub mod bmr;
pub mod input;
pub mod config;
pub mod logging;
pub mod persist;
pub mod live;
pub mod notice;
pub mod auth;
pub mod storage;
pub mod editor;
pub mod meal_form;
pub mod progress;
pub mod export;

// Re-export commonly used types
pub use error::{AuthError, Error, Result};
pub use types::*;
pub use bmr::{calc_bmr, calc_tdee, estimate};
pub use config::Config;
pub use auth::{AuthProvider, LocalAuth, Session};
pub use storage::{LocalStore, MealStore, ProfileStore};
pub use live::{LiveCache, Subscription};
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use editor::ProfileEditor;
pub use meal_form::MealForm;
pub use progress::{meal_total, progress_pct, DailySummary};
pub use export::export_meals_csv;
