//! Asynchronous client for the Databricks REST API.
//!
//! The crate is a set of thin per-service modules over one authenticated
//! transport ([`client::ApiClient`]). Most operations are single-call
//! forwarders; the exceptions are the pollers ([`genie`] conversations,
//! [`jobs::await_until_state`] and [`sql::execute_and_wait`]), which drive a
//! submitted operation to a terminal state with a bounded, suspending wait.

pub mod client;
pub mod clusters;
pub mod config;
pub mod dbfs;
mod dotenv;
pub mod error;
pub mod genie;
pub mod jobs;
pub mod libraries;
pub mod notebooks;
pub mod repos;
pub mod sql;
pub mod sql_safety;
pub mod unity_catalog;

pub use client::ApiClient;
pub use config::{ConfigError, Settings};
pub use error::ApiError;
