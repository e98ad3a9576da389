//! # Diary Core Library
//!
//! Calendar and diary backend built around recurring schedules.
//!
//! A recurring schedule is stored as one base row plus one repeat rule and is
//! expanded into occurrences at read time. Edits and deletes take a scope
//! (only this occurrence, this and later ones, or the whole series) and split
//! the series where needed instead of writing per-occurrence rows.
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`recurrence`]: Calendar stepping and occurrence expansion
//! - [`scoping`]: Scoped mutation planning (series splitting)
//! - [`window`]: Day/month/year window queries
//! - [`service`]: The public operations over a repository
//! - [`repository`]: Data access layer with Repository pattern
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use diary_core::{
//!     db,
//!     models::{Frequency, NewScheduleData, Period, RepeatSpec, ScheduleConfig},
//!     repository::{CalendarRepository, SqliteRepository},
//!     service::ScheduleService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("diary.db").await?;
//!     let service = ScheduleService::new(SqliteRepository::new(pool), ScheduleConfig::default());
//!
//!     let calendar = service.repository().add_calendar("Work".to_string()).await?;
//!     let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
//!     service
//!         .create_schedule(NewScheduleData {
//!             calendar_id: calendar.id,
//!             title: "Standup".to_string(),
//!             start_at: start,
//!             end_at: start + chrono::Duration::minutes(15),
//!             repeat: Some(RepeatSpec {
//!                 frequency: Frequency::Weekly,
//!                 end_date: NaiveDate::from_ymd_opt(2024, 3, 29).unwrap(),
//!             }),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     let march = service.get_occurrences(calendar.id, Period::Month { year: 2024, month: 3 }).await?;
//!     println!("{} occurrences in March", march.len());
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod scoping;
pub mod service;
pub mod window;
