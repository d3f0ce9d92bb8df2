//! Topic-driven personality quiz engine.
//!
//! The [`workflows::quiz`] module owns the session state machine, scoring and tie-break
//! resolution, and the contract with the generative service that supplies topics,
//! questions and interpretations.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
