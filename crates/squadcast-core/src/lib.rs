// Library root for the squad model, scoring formulas, configuration and
// persistence. Nothing here does network I/O.

pub mod config;
pub mod db;
pub mod model;
pub mod scoring;
pub mod squad;
