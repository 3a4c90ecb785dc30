//! devreg - signed-request harness for the device registration API
//!
//! The library exposes the client core used by test suites: credential
//! resolution, request building, SigV4 signing, and HTTP execution. The
//! `devreg` binary wraps the same core in a small CLI.

pub mod client;
pub mod config;
pub mod error;

pub use client::{DeviceRegistrationClient, LogoutOutcome, Outcome, RegistrationOutcome};
pub use config::{Config, Endpoint, Settings, Stage};
pub use error::{ApiError, ConfigError, Error, Result};
