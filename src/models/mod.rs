//! Built-in model implementations.
//!
//! Models here generate their equation and parameter declarations from
//! configuration data, then behave as ordinary [`FunctionalModel`]s.
//!
//! [`FunctionalModel`]: crate::model::FunctionalModel

mod multicosine;

pub use multicosine::Multicosine;
