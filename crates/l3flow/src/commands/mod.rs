//! Command handlers that need a controller connection.

pub mod clear;
pub mod run;
