//! Finite-state automata for strictly local languages.
//!
//! An [`Fsm`] is nothing more than a list of [`Transition`]s. States are never stored
//! separately, they only exist as the source or target of some transition. Two kinds of
//! automata are supported:
//! - automata over [`Context`]s, which are built from a set of n-grams via
//!   [`Fsm::from_ngrams`] and can be pruned with [`Fsm::trim`],
//! - automata over `usize` states, which are built as a template for a single path
//!   via [`Fsm::sp_template`].
#![warn(missing_docs)]

/// Type alias for sets, uses [`ahash::AHashSet`] when the `ahash` feature is enabled.
#[cfg(feature = "ahash")]
pub type Set<S> = ahash::AHashSet<S>;
/// Type alias for sets, uses [`std::collections::HashSet`] as the `ahash` feature is disabled.
#[cfg(not(feature = "ahash"))]
pub type Set<S> = std::collections::HashSet<S>;

/// Type alias for maps, uses [`ahash::AHashMap`] when the `ahash` feature is enabled.
#[cfg(feature = "ahash")]
pub type Map<K, V> = ahash::AHashMap<K, V>;
/// Type alias for maps, uses [`std::collections::HashMap`] as the `ahash` feature is disabled.
#[cfg(not(feature = "ahash"))]
pub type Map<K, V> = std::collections::HashMap<K, V>;

mod markers;
pub use markers::Markers;

mod transition;
pub use transition::{Context, NGram, StateIndex, Transition};

mod error;
pub use error::{FsmError, RunError};

mod fsm;
pub use fsm::Fsm;

mod reachable;
pub use reachable::accessible_transitions;

/// Re-exports the types that are needed in almost every use of this crate.
pub mod prelude {
    pub use super::{Context, Fsm, FsmError, Markers, NGram, RunError, Transition};
}
