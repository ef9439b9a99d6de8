//! Library half of `lifelined`: configuration and the startup sequence, so
//! the end-to-end tests drive exactly what the daemon runs.

pub mod bootstrap;
pub mod config;
