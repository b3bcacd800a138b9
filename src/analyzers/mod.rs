//! Attendance aggregation and the run pipeline.
//!
//! This module discovers dated attendance sheets, counts qualifying
//! participations per member, checks them against the roster, and drives the
//! report and run-log writers.

pub mod aggregate;
pub mod analyzer;
pub mod consistency;
pub mod types;
