use sl_automata::FsmError;
use thiserror::Error;

/// Errors that can occur when learning or using a strictly local grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SlError {
    /// There is no data to learn from, or no n-gram to build an automaton from.
    #[error("the grammar is empty")]
    EmptyGrammar,

    /// Complementing a grammar is only possible with respect to a known alphabet.
    #[error("the alphabet is not provided")]
    MissingAlphabet,

    /// The window of a strictly local grammar has to be at least 1.
    #[error("invalid window size {k}, must be at least 1")]
    InvalidWindow { k: usize },

    /// The boundary markers must not be part of the alphabet.
    #[error("symbol {symbol:?} is reserved as a boundary marker")]
    ReservedSymbol { symbol: char },

    /// A word or an n-gram contains a symbol that is not part of the alphabet.
    #[error("symbol {symbol:?} is not part of the alphabet")]
    UnknownSymbol { symbol: char },

    /// An n-gram has the wrong length or cannot occur in an annotated word.
    #[error("{ngram:?} is not a well-formed n-gram of width {k}")]
    InvalidNGram { ngram: String, k: usize },

    /// A random walk did not reach the right marker in time. The automaton either has no path to
    /// the end from the states that were visited, or its words are very long.
    #[error("generation did not terminate within {max_length} symbols")]
    NonTerminatingGeneration { max_length: usize },

    /// A random walk got stuck in a context that has no outgoing transition.
    #[error("generation got stuck in context {context:?}")]
    DeadEnd { context: String },

    /// Not enough distinct words could be generated.
    #[error("only found {found} of {wanted} distinct words after {attempts} attempts")]
    SampleExhausted {
        wanted: usize,
        found: usize,
        attempts: usize,
    },

    #[error(transparent)]
    Fsm(#[from] FsmError),
}
