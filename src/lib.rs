//! Ten-round religion-founding simulation scored by a language model.

pub mod config;
pub mod error;
pub mod game;
pub mod telemetry;
