//! Operator algebra over [`crate::observable::Observable`].
//!
//! One operator per file. Every operator is lazy: it builds a new
//! pipeline stage and runs nothing until subscribed, and every
//! subscription instantiates fresh operator state. Operators that accept
//! user functions take `Result`-returning ones; an `Err` becomes the
//! chain's terminal error.

pub mod combine_latest;
pub mod concat;
pub mod debounce;
pub mod distinct_until_changed;
pub mod element_at;
pub mod filter;
pub mod flat_map;
pub mod map;
pub mod merge;
pub mod observe_on;
pub mod reduce;
pub mod sample;
pub mod scan;
pub mod skip;
pub mod skip_until;
pub mod start_with;
pub mod switch_on_next;
pub mod take;
pub mod take_last;
pub mod take_until;
pub mod take_while;
pub mod zip;
