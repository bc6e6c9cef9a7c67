//! CLI commands.

pub mod examples;
pub mod hint;
pub mod info;
pub mod model;
