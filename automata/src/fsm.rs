use std::collections::BTreeSet;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    accessible_transitions, Context, FsmError, Markers, NGram, RunError, Set, StateIndex,
    Transition,
};

/// A finite-state machine, given by nothing but its transitions. Every state is accepting.
///
/// Next to the transitions, the machine keeps one flag per transition which records whether the
/// transition was taken by [`Fsm::run_and_mark_from`]. The flags are only relevant for
/// [`Fsm::compact`], every other operation ignores them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fsm<Q = Context> {
    transitions: Vec<Transition<Q>>,
    marks: Vec<bool>,
}

impl<Q> Default for Fsm<Q> {
    fn default() -> Self {
        Self {
            transitions: vec![],
            marks: vec![],
        }
    }
}

impl<Q: StateIndex> FromIterator<Transition<Q>> for Fsm<Q> {
    fn from_iter<T: IntoIterator<Item = Transition<Q>>>(iter: T) -> Self {
        let transitions = iter.into_iter().collect_vec();
        let marks = vec![false; transitions.len()];
        Self { transitions, marks }
    }
}

impl<Q: StateIndex> Fsm<Q> {
    /// Creates an automaton without any transitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transition, which is initially unmarked.
    pub fn add_transition(&mut self, source: Q, symbol: char, target: Q) {
        self.transitions.push(Transition::new(source, symbol, target));
        self.marks.push(false);
    }

    /// The transitions in the order in which they were inserted.
    pub fn transitions(&self) -> &[Transition<Q>] {
        &self.transitions
    }

    /// Consumes `self` and returns the transitions.
    pub fn into_transitions(self) -> Vec<Transition<Q>> {
        self.transitions
    }

    /// The number of transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns true if there are no transitions at all.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Returns true if the transition at position `index` has been taken by a marking run.
    pub fn is_marked(&self, index: usize) -> bool {
        self.marks.get(index).copied().unwrap_or(false)
    }

    /// Collects all states that occur as source or target of some transition. This is computed
    /// from scratch on every call.
    pub fn states(&self) -> Set<Q> {
        self.transitions
            .iter()
            .flat_map(|t| [t.source.clone(), t.target.clone()])
            .collect()
    }

    /// The symbols that label at least one transition.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.transitions.iter().map(|t| t.symbol).collect()
    }

    /// Returns true if no two transitions leave the same state on the same symbol.
    pub fn is_deterministic(&self) -> bool {
        let mut seen = Set::default();
        self.transitions
            .iter()
            .all(|t| seen.insert((&t.source, t.symbol)))
    }

    /// Returns the automaton in which every transition points in the opposite direction.
    pub fn reversed(&self) -> Self {
        self.transitions
            .iter()
            .cloned()
            .map(Transition::reversed)
            .collect()
    }

    fn find(&self, state: &Q, symbol: char) -> Option<usize> {
        self.transitions
            .iter()
            .position(|t| &t.source == state && t.symbol == symbol)
    }

    /// Runs `word` starting in `origin` and returns the reached state. For every symbol the first
    /// matching transition (in order of insertion) is taken, so this only gives a meaningful
    /// answer for deterministic automata. As every state is accepting, the run succeeds iff it
    /// can consume the whole word.
    pub fn run_from<W>(&self, origin: Q, word: W) -> Result<Q, RunError<Q>>
    where
        W: IntoIterator<Item = char>,
    {
        let mut state = origin;
        for (position, symbol) in word.into_iter().enumerate() {
            let Some(i) = self.find(&state, symbol) else {
                return Err(RunError::NoRuleMatched {
                    state,
                    symbol,
                    position,
                });
            };
            state = self.transitions[i].target.clone();
        }
        Ok(state)
    }

    /// Works as [`Fsm::run_from`], but marks every transition that is taken. Marks are never
    /// removed by this method, so they accumulate over several calls. A failing run keeps the
    /// marks it has set up to the point where no rule matched.
    pub fn run_and_mark_from<W>(&mut self, origin: Q, word: W) -> Result<Q, RunError<Q>>
    where
        W: IntoIterator<Item = char>,
    {
        let mut state = origin;
        for (position, symbol) in word.into_iter().enumerate() {
            let Some(i) = self.find(&state, symbol) else {
                return Err(RunError::NoRuleMatched {
                    state,
                    symbol,
                    position,
                });
            };
            self.marks[i] = true;
            state = self.transitions[i].target.clone();
        }
        Ok(state)
    }

    /// Removes every transition that has not been marked and resets the marks of the remaining
    /// ones. Whether the marking runs covered enough words is up to the caller.
    pub fn compact(&mut self) {
        let before = self.transitions.len();
        let marks = std::mem::take(&mut self.marks);
        self.transitions = std::mem::take(&mut self.transitions)
            .into_iter()
            .zip(marks)
            .filter_map(|(t, used)| used.then_some(t))
            .collect();
        self.marks = vec![false; self.transitions.len()];
        debug!(
            "compacted automaton from {before} to {} transitions",
            self.transitions.len()
        );
    }

    fn retain_positions(&mut self, positions: &[usize]) {
        let keep: Set<usize> = positions.iter().copied().collect();
        let mut i = 0;
        self.transitions.retain(|_| {
            i += 1;
            keep.contains(&(i - 1))
        });
        let mut i = 0;
        self.marks.retain(|_| {
            i += 1;
            keep.contains(&(i - 1))
        });
    }
}

impl Fsm<usize> {
    /// Builds the template automaton for a single path. For `path = a_1 ... a_{k-1}` this is a
    /// chain `0 -a_1-> 1 -a_2-> ... -a_{k-1}-> k-1`, where every chain state additionally loops on
    /// every symbol of `alphabet` apart from the one it uses to advance, and the last state loops
    /// on every symbol of `alphabet`. The result is deterministic and total over `alphabet`, its
    /// initial state is `0`.
    pub fn sp_template(path: &[char], alphabet: &[char], k: usize) -> Result<Self, FsmError> {
        let expected = k.saturating_sub(1);
        if path.len() != expected || path.is_empty() {
            return Err(FsmError::PathLength {
                expected,
                found: path.len(),
            });
        }

        let mut fsm = Self::new();
        for (i, &symbol) in path.iter().enumerate() {
            fsm.add_transition(i, symbol, i + 1);
        }

        // non-final loops
        for (i, &symbol) in path.iter().enumerate() {
            for &other in alphabet.iter().filter(|&&s| s != symbol) {
                fsm.add_transition(i, other, i);
            }
        }

        // final loops
        let last = path.len();
        for &symbol in alphabet {
            fsm.add_transition(last, symbol, last);
        }

        trace!("built template for {path:?} with {} transitions", fsm.len());
        Ok(fsm)
    }

    /// Runs `word` from state `0`, see [`Fsm::run_from`].
    pub fn recognize(&self, word: &str) -> bool {
        self.run_from(0, word.chars()).is_ok()
    }

    /// Runs `word` from state `0` and marks the transitions taken, see [`Fsm::run_and_mark_from`].
    pub fn recognize_and_mark(&mut self, word: &str) -> bool {
        self.run_and_mark_from(0, word.chars()).is_ok()
    }
}

impl Fsm<Context> {
    /// Builds the automaton for a set of n-grams, where every n-gram `c_1 ... c_k` gives a
    /// transition from `c_1 ... c_{k-1}` to `c_2 ... c_k` on `c_k`.
    pub fn from_ngrams<'a, I>(grammar: I) -> Result<Self, FsmError>
    where
        I: IntoIterator<Item = &'a NGram>,
    {
        let mut fsm = Self::new();
        fsm.sl_states(grammar)?;
        Ok(fsm)
    }

    /// Replaces the transitions of `self` by those corresponding to the given n-grams. On error,
    /// `self` is left untouched.
    pub fn sl_states<'a, I>(&mut self, grammar: I) -> Result<(), FsmError>
    where
        I: IntoIterator<Item = &'a NGram>,
    {
        let mut width = None;
        let mut transitions = vec![];
        for ngram in grammar {
            match width {
                None => width = Some(ngram.len()),
                Some(expected) if expected != ngram.len() => {
                    return Err(FsmError::MixedWidth {
                        expected,
                        found: ngram.len(),
                    })
                }
                _ => {}
            }
            transitions.push(Transition::from_ngram(ngram).ok_or(FsmError::EmptyGrammar)?);
        }
        if transitions.is_empty() {
            return Err(FsmError::EmptyGrammar);
        }

        debug!(
            "built automaton with {} transitions over contexts of width {}",
            transitions.len(),
            width.unwrap_or(1) - 1
        );
        self.marks = vec![false; transitions.len()];
        self.transitions = transitions;
        Ok(())
    }

    /// Maps every transition `(ctx, sym, _)` back to the n-gram `ctx + sym`.
    pub fn ngrams(&self) -> BTreeSet<NGram> {
        self.transitions.iter().map(Transition::to_ngram).collect()
    }

    /// The length of the contexts, i.e. `k-1`. Returns `None` for an empty automaton.
    pub fn context_width(&self) -> Option<usize> {
        self.transitions.first().map(|t| t.source.len())
    }

    fn split_annotated<'w>(&self, word: &'w [char]) -> Option<(Context, &'w [char])> {
        let width = self.context_width()?;
        (word.len() >= width).then(|| (word[..width].to_vec(), &word[width..]))
    }

    /// Recognizes an annotated word, i.e. one that is padded with markers on both ends. The run
    /// starts in the context given by the first `k-1` symbols and consumes the rest. An automaton
    /// without transitions only accepts the empty word.
    pub fn recognize(&self, word: &str) -> bool {
        let symbols = word.chars().collect_vec();
        if self.is_empty() {
            return symbols.is_empty();
        }
        match self.split_annotated(&symbols) {
            Some((origin, rest)) => self.run_from(origin, rest.iter().copied()).is_ok(),
            None => false,
        }
    }

    /// Works as [`Fsm::recognize`], but marks the transitions that are taken.
    pub fn recognize_and_mark(&mut self, word: &str) -> bool {
        let symbols = word.chars().collect_vec();
        if self.is_empty() {
            return symbols.is_empty();
        }
        match self.split_annotated(&symbols) {
            Some((origin, rest)) => self
                .run_and_mark_from(origin, rest.iter().copied())
                .is_ok(),
            None => false,
        }
    }

    /// Removes useless transitions. This happens in two passes:
    /// 1. collect the transitions that are reachable from a context consisting only of the left
    ///    marker,
    /// 2. among those, collect the transitions from which a context consisting only of the right
    ///    marker can be reached, by running the same search on the reversed transitions.
    ///
    /// The remaining transitions keep their relative order. Trimming an empty automaton does
    /// nothing.
    pub fn trim(&mut self, markers: &Markers) {
        if self.is_empty() {
            return;
        }
        let before = self.len();

        let can_start =
            accessible_transitions(&self.transitions, |q| q.iter().all(|&s| s == markers.left));
        self.retain_positions(&can_start);
        trace!("{} of {before} transitions are accessible", self.len());

        let mirrored = self.reversed();
        let can_finish = accessible_transitions(&mirrored.transitions, |q| {
            q.iter().all(|&s| s == markers.right)
        });
        self.retain_positions(&can_finish);

        debug!("trimmed automaton from {before} to {} transitions", self.len());
    }
}

impl<Q: StateIndex> std::fmt::Display for Fsm<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.transitions.iter().join("\n"))
    }
}
