//! Citation-graph map engine: the paper arena and its analytics, plus an
//! interactive force-directed layout session rendered by the `paper-map`
//! viewer.

pub mod config;
pub mod error;
pub mod map;
pub mod paper;
