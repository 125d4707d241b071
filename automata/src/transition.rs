use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;

/// A state of an automaton that is built from n-grams: the last `k-1` symbols that were read.
pub type Context = Vec<char>;

/// A sequence of exactly `k` symbols.
pub type NGram = Vec<char>;

/// Anything that can be used as a state of an [`crate::Fsm`].
pub trait StateIndex: Clone + Eq + Hash + Debug {
    /// Renders the state for display purposes.
    fn show(&self) -> String;
}

impl StateIndex for usize {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl StateIndex for Context {
    fn show(&self) -> String {
        self.iter().join("")
    }
}

/// A transition of an [`crate::Fsm`], which leads from `source` to `target` when reading `symbol`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transition<Q> {
    /// The state in which the transition starts.
    pub source: Q,
    /// The symbol that is read.
    pub symbol: char,
    /// The state that is reached.
    pub target: Q,
}

impl<Q> Transition<Q> {
    /// Creates a new transition.
    pub fn new(source: Q, symbol: char, target: Q) -> Self {
        Self {
            source,
            symbol,
            target,
        }
    }

    /// Swaps source and target.
    pub fn reversed(self) -> Self {
        Self {
            source: self.target,
            symbol: self.symbol,
            target: self.source,
        }
    }
}

impl<Q> From<(Q, char, Q)> for Transition<Q> {
    fn from((source, symbol, target): (Q, char, Q)) -> Self {
        Self::new(source, symbol, target)
    }
}

impl Transition<Context> {
    /// Turns the n-gram `c_1 ... c_k` into the transition that leads from `c_1 ... c_{k-1}` to
    /// `c_2 ... c_k` on the symbol `c_k`. Returns `None` for the empty n-gram.
    pub fn from_ngram(ngram: &[char]) -> Option<Self> {
        let (&symbol, context) = ngram.split_last()?;
        Some(Self::new(context.to_vec(), symbol, ngram[1..].to_vec()))
    }

    /// The inverse of [`Transition::from_ngram`], for `(ab, c, bc)` this gives `abc`.
    pub fn to_ngram(&self) -> NGram {
        self.source
            .iter()
            .copied()
            .chain(std::iter::once(self.symbol))
            .collect()
    }
}

impl<Q: StateIndex> std::fmt::Display for Transition<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -{}-> {}",
            self.source.show(),
            self.symbol,
            self.target.show()
        )
    }
}
