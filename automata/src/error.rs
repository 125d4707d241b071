use thiserror::Error;

/// Errors that can occur when constructing an [`crate::Fsm`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FsmError {
    /// An automaton cannot be built from nothing.
    #[error("the grammar is empty, no automaton can be generated")]
    EmptyGrammar,

    /// All n-grams of a grammar need to have the same length.
    #[error("n-grams of length {expected} and {found} cannot be mixed")]
    MixedWidth { expected: usize, found: usize },

    /// The path of a template has to consist of exactly `k-1` symbols.
    #[error("a template path needs {expected} symbols, got {found}")]
    PathLength { expected: usize, found: usize },
}

/// Describes why a run of an [`crate::Fsm`] on some word did not succeed. Note that this is the
/// regular way in which a word is rejected, not a failure of the automaton.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum RunError<Q> {
    /// No transition leaves `state` on `symbol`, which was found at `position` in the word.
    #[error("no rule matched symbol {symbol:?} at position {position} in state {state:?}")]
    NoRuleMatched {
        state: Q,
        symbol: char,
        position: usize,
    },
}
