//! Public library modules for the CLI crate
pub mod setting;
pub mod status;
