//! Command implementations.

pub mod palettes;
pub mod report;
