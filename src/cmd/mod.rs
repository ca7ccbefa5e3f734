//! Command implementations for the Pylon CLI.

pub mod consume;
pub mod produce;
