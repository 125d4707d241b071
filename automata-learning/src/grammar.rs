use std::collections::BTreeSet;

use itertools::Itertools;
use sl_automata::{Markers, NGram};

use crate::SlError;

/// Whether a grammar lists the allowed n-grams or the forbidden ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Polarity {
    /// The grammar lists the n-grams that may occur.
    #[default]
    Positive,
    /// The grammar lists the n-grams that must not occur.
    Negative,
}

impl Polarity {
    /// Returns the other polarity.
    pub fn opposite(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }

    /// Returns true for [`Polarity::Positive`].
    pub fn is_positive(self) -> bool {
        matches!(self, Polarity::Positive)
    }
}

/// What every grammar has: an alphabet, a window size `k` and the data it is learned from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseGrammar {
    /// The symbols of the language, without boundary markers.
    pub alphabet: BTreeSet<char>,
    /// The size of the window.
    pub k: usize,
    /// The raw words.
    pub data: Vec<String>,
}

impl BaseGrammar {
    /// Creates a new base grammar without data. Fails if `k` is zero or if one of the markers
    /// appears in the alphabet.
    pub fn new<I>(alphabet: I, k: usize, markers: &Markers) -> Result<Self, SlError>
    where
        I: IntoIterator<Item = char>,
    {
        if k == 0 {
            return Err(SlError::InvalidWindow { k });
        }
        let alphabet: BTreeSet<char> = alphabet.into_iter().collect();
        check_alphabet(&alphabet, markers)?;
        Ok(Self {
            alphabet,
            k,
            data: vec![],
        })
    }

    /// Complements `grammar` with respect to the alphabet and window of `self`.
    pub fn complement(
        &self,
        grammar: &BTreeSet<NGram>,
        markers: &Markers,
    ) -> Result<BTreeSet<NGram>, SlError> {
        complement(grammar, &self.alphabet, self.k, markers)
    }
}

pub(crate) fn check_alphabet(
    alphabet: &BTreeSet<char>,
    markers: &Markers,
) -> Result<(), SlError> {
    match alphabet.iter().find(|&&s| markers.contains(s)) {
        Some(&symbol) => Err(SlError::ReservedSymbol { symbol }),
        None => Ok(()),
    }
}

fn check_symbol(symbol: char, alphabet: &BTreeSet<char>) -> Result<(), SlError> {
    if alphabet.is_empty() || alphabet.contains(&symbol) {
        Ok(())
    } else {
        Err(SlError::UnknownSymbol { symbol })
    }
}

/// Checks that a raw word contains no marker and, unless `alphabet` is empty, only symbols of
/// `alphabet`.
pub fn check_word(word: &str, alphabet: &BTreeSet<char>, markers: &Markers) -> Result<(), SlError> {
    for symbol in word.trim().chars() {
        if markers.contains(symbol) {
            return Err(SlError::ReservedSymbol { symbol });
        }
        check_symbol(symbol, alphabet)?;
    }
    Ok(())
}

/// Checks that `ngram` has length `k`, is [`well_formed`] and, unless `alphabet` is empty, only
/// uses symbols of `alphabet` apart from the markers. For a non-empty alphabet this is exactly
/// membership in [`all_ngrams`].
pub fn check_ngram(
    ngram: &[char],
    alphabet: &BTreeSet<char>,
    k: usize,
    markers: &Markers,
) -> Result<(), SlError> {
    if ngram.len() != k || !well_formed(ngram, markers) {
        return Err(SlError::InvalidNGram {
            ngram: ngram.iter().collect(),
            k,
        });
    }
    ngram
        .iter()
        .filter(|&&s| !markers.contains(s))
        .try_for_each(|&s| check_symbol(s, alphabet))
}

/// Collects the symbols that occur in the given words.
pub fn alphabetize<S: AsRef<str>>(data: &[S]) -> BTreeSet<char> {
    data.iter()
        .flat_map(|w| w.as_ref().trim().chars())
        .collect()
}

/// Pads `word` with `k-1` left markers in front and `k-1` right markers at the end. Surrounding
/// whitespace is removed first.
pub fn annotate(word: &str, k: usize, markers: &Markers) -> Vec<char> {
    let pad = k.saturating_sub(1);
    std::iter::repeat(markers.left)
        .take(pad)
        .chain(word.trim().chars())
        .chain(std::iter::repeat(markers.right).take(pad))
        .collect()
}

/// All n-grams of length `k` that occur in `item`.
pub fn ngramize_item(item: &[char], k: usize) -> BTreeSet<NGram> {
    if k == 0 {
        return BTreeSet::new();
    }
    item.windows(k).map(<[char]>::to_vec).collect()
}

/// Annotates every word and collects all of their n-grams.
pub fn ngramize_data<S: AsRef<str>>(data: &[S], k: usize, markers: &Markers) -> BTreeSet<NGram> {
    data.iter()
        .flat_map(|w| ngramize_item(&annotate(w.as_ref(), k, markers), k))
        .collect()
}

/// Checks whether an n-gram can occur in an annotated word: left markers may only form a prefix,
/// right markers may only form a suffix and the n-gram must not consist of markers of one kind
/// only.
pub fn well_formed(ngram: &[char], markers: &Markers) -> bool {
    let lefts = ngram.iter().take_while(|&&s| s == markers.left).count();
    let rights = ngram
        .iter()
        .rev()
        .take_while(|&&s| s == markers.right)
        .count();
    if lefts == ngram.len() || rights == ngram.len() || lefts + rights > ngram.len() {
        return false;
    }
    ngram[lefts..ngram.len() - rights]
        .iter()
        .all(|&s| !markers.contains(s))
}

/// Every well-formed n-gram of length `k` over `alphabet` extended with both markers.
pub fn all_ngrams(alphabet: &BTreeSet<char>, k: usize, markers: &Markers) -> BTreeSet<NGram> {
    if k == 0 {
        return BTreeSet::new();
    }
    let symbols = alphabet
        .iter()
        .copied()
        .chain([markers.left, markers.right])
        .unique()
        .collect_vec();
    (0..k)
        .map(|_| symbols.iter().copied())
        .multi_cartesian_product()
        .filter(|ngram| well_formed(ngram, markers))
        .collect()
}

/// Returns the n-grams of the full universe [`all_ngrams`] that are not in `grammar`. Switching
/// the polarity of a grammar is exactly this operation, so applying it twice gives back the
/// original grammar. An n-gram of `grammar` outside of the universe would get lost on the way
/// and is reported as an error instead.
pub fn complement(
    grammar: &BTreeSet<NGram>,
    alphabet: &BTreeSet<char>,
    k: usize,
    markers: &Markers,
) -> Result<BTreeSet<NGram>, SlError> {
    if alphabet.is_empty() {
        return Err(SlError::MissingAlphabet);
    }
    for ngram in grammar {
        check_ngram(ngram, alphabet, k, markers)?;
    }
    Ok(all_ngrams(alphabet, k, markers)
        .into_iter()
        .filter(|ngram| !grammar.contains(ngram))
        .collect())
}
