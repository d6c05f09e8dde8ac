//! Domain models for the phenotype extractor.

mod finding;
mod note;

pub use finding::*;
pub use note::*;
