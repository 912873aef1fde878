//! Enrollment Assist: a guided retirement plan enrollment dialogue.

pub mod cli;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod routes;
pub mod session;
