//! Domain models.

mod study;

pub use study::*;
