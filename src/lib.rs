//! Core library for the `reqtrace` CLI.
//!
//! The [`pipeline`] module runs a single API definition: it sends the request,
//! extracts variables into a shared [`vars::VariableStore`], evaluates
//! assertions, and optionally hands a debug trace to a [`sinks::TraceSink`].
//! The remaining modules supply the request model, rule kinds, HTTP
//! execution, configuration and CLI parsing.
pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod model;
pub mod pipeline;
pub mod rules;
pub mod sinks;
pub mod vars;
