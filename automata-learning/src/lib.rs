//! A library for learning strictly local grammars from data.
//!
//! A strictly local grammar of window `k` lists the substrings of length `k` (n-grams) that may
//! occur in a word that is padded with `k-1` boundary markers on either side. Such a grammar is
//! either *positive*, listing the allowed n-grams, or *negative*, listing the forbidden ones.
//! [`SlGrammar`] induces grammars from a corpus, compiles them into an [`sl_automata::Fsm`],
//! removes useless n-grams and generates new words.
#![warn(missing_docs)]

mod error;
pub use error::SlError;

/// Configuration of the sampling procedure.
pub mod config;
pub use config::GenerationConfig;

/// The basic grammar notions: annotation, n-gram extraction and complementation.
pub mod grammar;
pub use grammar::{BaseGrammar, Polarity};

mod sl;
pub use sl::SlGrammar;

pub use sl_automata::{Fsm, Markers, NGram};
