//! Core library for Circl, a personal relationship manager.
//!
//! Holds the data model, the CSV import pipeline, relationship heuristics and
//! AI-backed recommendations, the Arlo chat session, email notifications, and
//! the owner-checked, rate-limited data access layer over SQLite.

pub mod chat;
pub mod config;
pub mod error;
pub mod import;
pub mod insights;
pub mod llm;
pub mod model;
pub mod notify;
pub mod rate_limit;
pub mod retry;
pub mod secure;
pub mod storage;

pub use error::{CirclError, Result};
