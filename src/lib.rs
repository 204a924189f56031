//! Workforce scheduling DSL: validation, CP model compilation, and solving.
//!
//! A JSON spec declares employees, days, shifts, sites, coverage demand, and
//! structural constraints; [`validate`] checks it statically and [`solve`]
//! compiles it into a constraint model and searches for a minimum-penalty
//! schedule.

pub mod demo_data;
pub mod error;
pub mod scope;
pub mod shift_time;
pub mod spec;
pub mod validate;

mod compile;
mod solve;

pub use error::{Result, SolveError};
pub use solve::{solve, DayAssignments, Metrics, ScheduleResult, SolveOutcome};
pub use spec::Spec;
pub use validate::{validate, Validation};
