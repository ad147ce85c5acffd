//! Metadata composition collaborators.

pub mod readme;

pub use readme::{Readme, ReadmeConfig};
