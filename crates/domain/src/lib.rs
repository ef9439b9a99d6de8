//! # lifeline-domain
//!
//! Pure domain model for the lifeline service lifecycle core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **service lifecycle** (`ReadyState`) and its transition table
//! - Define the **initialization report** handed back to the bootstrap driver
//! - Define the value objects the concrete services push through their
//!   channels: auth session, language, ad configuration, HTTP messages,
//!   feature flags
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod ads;
pub mod auth;
pub mod flags;
pub mod http;
pub mod language;
pub mod lifecycle;
pub mod report;
