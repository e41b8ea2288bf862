//! Style resolution support for the layout core.
//!
//! - [`ComputedStyle`]: the resolved per-element style layout reads.
//! - [`StyleSharingCache`]: memoizes computed styles across structurally
//!   identical elements.
//! - [`StyleResolver`]: walks an element tree, matches rules through the
//!   selector index and the ancestor bloom filter, and drives the cache.
//!
//! Parsing declarations and cascading values is the caller's job; the resolver
//! hands the matched rules to a caller-supplied cascade function.

mod computed;
mod resolver;
mod sharing;

pub use computed::{
    BoxSizing, Clear, ComputedStyle, Display, Float, FontMetrics, Overflow, Position, SelfAlign,
    Visibility,
};
pub use resolver::{ResolveStats, StyleResolver, StyleTree};
pub use sharing::{DEFAULT_CAPACITY, StyleKey, StyleSharingCache, hash_classes, hash_declarations};
