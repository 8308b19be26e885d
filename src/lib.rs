pub mod config;
pub mod error;
pub mod features;
pub mod generator;
pub mod layout;
pub mod model;
pub mod pattern;
pub mod problem;
pub mod report;
pub mod solver;
pub mod types;
