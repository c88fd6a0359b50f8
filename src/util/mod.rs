//! Utilities
//!
//! Small types used throughout the crate.

mod scope;
mod span;
mod variable;

pub use scope::ScopeStack;
pub use span::Span;
pub use variable::Variable;
