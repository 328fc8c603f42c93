//! Frontend: DSL text to unresolved [`ModelFile`](crate::model::ModelFile)s.
//!
//! Three layers, leaves first:
//! 1. [`events`] turns text into structural parse events
//! 2. [`sections`] parse one document each into a typed entity
//! 3. [`loader`] drives both over a whole file
//!
//! Everything here fails fast with a [`CompilerError`](crate::CompilerError).
//! Names of other model elements are kept as references and bound later by
//! the resolver.

pub mod events;
pub mod loader;
pub mod sections;

pub use loader::ModelFileLoader;
