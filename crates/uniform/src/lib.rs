//! UniForm admission core.
//!
//! Students hold one academic profile, institutions publish admission units
//! with requirement rows, and applications move through a small review
//! workflow. The [`admissions`] module carries the domain model, the pure
//! eligibility evaluator, the application register, and the HTTP router;
//! [`config`], [`error`], and [`telemetry`] supply the service scaffolding.

pub mod admissions;
pub mod config;
pub mod error;
pub mod telemetry;
