//! loom - command line front end for noteloom.
//!
//! The binary is a thin clap layer over [`commands`]; the library half
//! exists so the commands can be driven from integration tests.

pub mod artifacts;
pub mod commands;
pub mod telemetry;
