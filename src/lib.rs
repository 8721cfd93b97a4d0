//! Compiles Lottie animations into composition instantiator classes.
//!
//! The work is done by the member crates: `lottie-data` parses the
//! document, `lottie-core` translates it into a composition graph and
//! `lottie-codegen` writes the graph out as source code. This crate holds
//! the configuration shared by the `lottiegen` binary and the pipeline that
//! chains the three steps.

pub mod config;
pub mod pipeline;

pub use config::{CompilerConfig, Target};
pub use pipeline::{compile, CompileOutput};
