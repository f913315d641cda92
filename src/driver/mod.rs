pub mod resolver;
pub mod traits;
pub mod web;

#[cfg(test)]
pub(crate) mod fake;

pub use resolver::{resolve, MatchedLocator, Resolution, ResolverTimeouts};
pub use traits::{LocatorCandidate, LocatorKind, PageDriver};
