use std::{borrow::Cow, collections::BTreeSet};

use sl_automata::{Context, Fsm, Map, Markers, NGram};
use tracing::{debug, trace};

use crate::{
    grammar::{self, check_alphabet, check_ngram, check_word, BaseGrammar, Polarity},
    GenerationConfig, SlError,
};

/// A strictly local grammar, which is either positive or negative.
///
/// The grammar is induced from data with [`SlGrammar::learn`] or supplied directly with
/// [`SlGrammar::with_grammar`]. Independently of the polarity, the automaton built by
/// [`SlGrammar::fsmize`] always corresponds to the positive reading of the grammar, i.e. its
/// transitions are the allowed n-grams. The automaton is never updated automatically: whenever
/// the n-grams are replaced, the automaton is discarded and has to be built again.
#[derive(Debug, Clone)]
pub struct SlGrammar {
    base: BaseGrammar,
    grammar: BTreeSet<NGram>,
    polarity: Polarity,
    markers: Markers,
    config: GenerationConfig,
    fsm: Option<Fsm>,
    rng: fastrand::Rng,
}

impl SlGrammar {
    /// Creates a positive grammar of window `k` without data and n-grams. The alphabet may be
    /// empty, in which case the grammar cannot change its polarity.
    pub fn new<I: IntoIterator<Item = char>>(alphabet: I, k: usize) -> Result<Self, SlError> {
        let markers = Markers::default();
        let config = GenerationConfig::default();
        Ok(Self {
            base: BaseGrammar::new(alphabet, k, &markers)?,
            grammar: BTreeSet::new(),
            polarity: Polarity::Positive,
            markers,
            rng: config.rng(),
            config,
            fsm: None,
        })
    }

    /// Uses the given markers instead of `>` and `<`.
    pub fn with_markers(mut self, markers: Markers) -> Result<Self, SlError> {
        check_alphabet(&self.base.alphabet, &markers)?;
        self.markers = markers;
        Ok(self)
    }

    /// Replaces the generation settings, which also resets the random source.
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.rng = config.rng();
        self.config = config;
        self
    }

    /// Sets the words the grammar is learned from.
    pub fn with_data<S: Into<String>, I: IntoIterator<Item = S>>(mut self, data: I) -> Self {
        self.base.data = data.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the n-grams directly, they are read according to the current polarity. Every n-gram
    /// must have length `k`, be well-formed with respect to the markers and, if the alphabet is
    /// known, only use symbols of the alphabet.
    pub fn with_grammar<G>(mut self, grammar: G) -> Result<Self, SlError>
    where
        G: IntoIterator<Item = NGram>,
    {
        let grammar: BTreeSet<NGram> = grammar.into_iter().collect();
        for ngram in &grammar {
            check_ngram(ngram, &self.base.alphabet, self.base.k, &self.markers)?;
        }
        self.grammar = grammar;
        self.fsm = None;
        Ok(self)
    }

    /// Declares the polarity in which the n-grams are read. Unlike
    /// [`SlGrammar::change_polarity`], the n-grams are left untouched.
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self.fsm = None;
        self
    }

    /// The alphabet, without boundary markers.
    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.base.alphabet
    }

    /// The window size.
    pub fn k(&self) -> usize {
        self.base.k
    }

    /// The words the grammar is learned from.
    pub fn data(&self) -> &[String] {
        &self.base.data
    }

    /// The n-grams in the current polarity.
    pub fn grammar(&self) -> &BTreeSet<NGram> {
        &self.grammar
    }

    /// The current polarity.
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// The boundary markers.
    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// The automaton, if it has been built.
    pub fn fsm(&self) -> Option<&Fsm> {
        self.fsm.as_ref()
    }

    /// Replaces the alphabet with the symbols occurring in the data.
    pub fn extract_alphabet(&mut self) -> Result<(), SlError> {
        let alphabet = grammar::alphabetize(&self.base.data);
        check_alphabet(&alphabet, &self.markers)?;
        self.base.alphabet = alphabet;
        Ok(())
    }

    /// Learns the grammar from the data: every word is annotated with markers and all of its
    /// n-grams are collected. These are the allowed n-grams, so a negative grammar stores their
    /// complement. Any previously built automaton is discarded.
    ///
    /// Words must not contain a marker and, if the alphabet is known, only use its symbols.
    pub fn learn(&mut self) -> Result<(), SlError> {
        for word in &self.base.data {
            check_word(word, &self.base.alphabet, &self.markers)?;
        }
        let attested = grammar::ngramize_data(&self.base.data, self.base.k, &self.markers);
        if attested.is_empty() {
            return Err(SlError::EmptyGrammar);
        }
        debug!(
            "learned {} n-grams of width {} from {} words",
            attested.len(),
            self.base.k,
            self.base.data.len()
        );
        self.grammar = match self.polarity {
            Polarity::Positive => attested,
            Polarity::Negative => self.base.complement(&attested, &self.markers)?,
        };
        self.fsm = None;
        Ok(())
    }

    /// Replaces the data and learns from it, see [`SlGrammar::learn`].
    pub fn learn_from<S: Into<String>, I: IntoIterator<Item = S>>(
        &mut self,
        data: I,
    ) -> Result<(), SlError> {
        self.base.data = data.into_iter().map(Into::into).collect();
        self.learn()
    }

    /// The allowed n-grams, which is the grammar itself if it is positive and its complement
    /// otherwise.
    pub fn positive_grammar(&self) -> Result<Cow<'_, BTreeSet<NGram>>, SlError> {
        match self.polarity {
            Polarity::Positive => Ok(Cow::Borrowed(&self.grammar)),
            Polarity::Negative => Ok(Cow::Owned(
                self.base.complement(&self.grammar, &self.markers)?,
            )),
        }
    }

    fn store_positive(&mut self, positive: BTreeSet<NGram>) -> Result<(), SlError> {
        self.grammar = match self.polarity {
            Polarity::Positive => positive,
            Polarity::Negative => self.base.complement(&positive, &self.markers)?,
        };
        Ok(())
    }

    /// Builds the automaton of the allowed n-grams. The stored n-grams and the polarity remain
    /// unchanged.
    pub fn fsmize(&mut self) -> Result<&Fsm, SlError> {
        let fsm = self.build_fsm()?;
        Ok(&*self.fsm.insert(fsm))
    }

    fn build_fsm(&self) -> Result<Fsm, SlError> {
        let positive = self.positive_grammar()?;
        if positive.is_empty() {
            return Err(SlError::EmptyGrammar);
        }
        Ok(Fsm::from_ngrams(positive.iter())?)
    }

    fn ensure_fsm(&mut self) -> Result<&mut Fsm, SlError> {
        let fsm = match self.fsm.take() {
            Some(fsm) => fsm,
            None => self.build_fsm()?,
        };
        Ok(self.fsm.insert(fsm))
    }

    /// Removes the n-grams that do not lie on a path from the start to the end of a word. Builds
    /// the automaton first if there is none yet.
    pub fn clean(&mut self) -> Result<(), SlError> {
        let markers = self.markers;
        let fsm = self.ensure_fsm()?;
        fsm.trim(&markers);
        let positive = fsm.ngrams();
        debug!("{} n-grams are useful", positive.len());
        self.store_positive(positive)
    }

    /// Switches between a positive and a negative grammar by replacing the n-grams with their
    /// complement. The described language stays the same, so the automaton is kept.
    pub fn change_polarity(&mut self) -> Result<(), SlError> {
        self.grammar = self.base.complement(&self.grammar, &self.markers)?;
        self.polarity = self.polarity.opposite();
        trace!("switched to {:?} polarity", self.polarity);
        Ok(())
    }

    /// Annotates `word` and checks whether the automaton accepts it. Builds the automaton first
    /// if there is none yet.
    pub fn scan(&mut self, word: &str) -> Result<bool, SlError> {
        let annotated: String = grammar::annotate(word, self.base.k, &self.markers)
            .into_iter()
            .collect();
        Ok(self.ensure_fsm()?.recognize(&annotated))
    }

    /// Generates `n` words of the language by random walks through the automaton. If
    /// `repetitions` is false, walks are repeated until `n` distinct words have been found.
    pub fn generate_sample(
        &mut self,
        n: usize,
        repetitions: bool,
    ) -> Result<Vec<String>, SlError> {
        let walker = self.walker()?;

        let mut sample = Vec::with_capacity(n);
        let mut attempts = 0;
        if repetitions {
            while sample.len() < n {
                attempts += 1;
                sample.push(walker.walk(&mut self.rng)?);
            }
        } else {
            let mut seen = BTreeSet::new();
            while sample.len() < n {
                if attempts >= self.config.max_attempts {
                    return Err(SlError::SampleExhausted {
                        wanted: n,
                        found: sample.len(),
                        attempts,
                    });
                }
                attempts += 1;
                let word = walker.walk(&mut self.rng)?;
                if seen.insert(word.clone()) {
                    sample.push(word);
                }
            }
        }
        debug!("generated {} words in {attempts} attempts", sample.len());
        Ok(sample)
    }

    /// Generates a single word by a random walk through the automaton.
    pub fn generate_item(&mut self) -> Result<String, SlError> {
        self.walker()?.walk(&mut self.rng)
    }

    fn walker(&mut self) -> Result<Walker, SlError> {
        let (k, markers, max_length) = (self.base.k, self.markers, self.config.max_length);
        Ok(Walker::new(self.ensure_fsm()?, k, markers, max_length))
    }
}

/// Random walks through the automaton of a positive grammar. Starting with the context made of
/// left markers, the next symbol is chosen uniformly among the transitions leaving the current
/// context, until the right marker is read.
struct Walker {
    successors: Map<Context, Vec<char>>,
    width: usize,
    markers: Markers,
    max_length: usize,
}

impl Walker {
    fn new(fsm: &Fsm, k: usize, markers: Markers, max_length: usize) -> Self {
        let mut successors: Map<Context, Vec<char>> = Map::default();
        for t in fsm.transitions() {
            successors.entry(t.source.clone()).or_default().push(t.symbol);
        }
        Self {
            successors,
            width: k - 1,
            markers,
            max_length,
        }
    }

    fn walk(&self, rng: &mut fastrand::Rng) -> Result<String, SlError> {
        let mut word = self.markers.initial_context(self.width);
        loop {
            if word.len() - self.width > self.max_length {
                return Err(SlError::NonTerminatingGeneration {
                    max_length: self.max_length,
                });
            }
            let context = &word[word.len() - self.width..];
            let candidates = match self.successors.get(context) {
                Some(candidates) if !candidates.is_empty() => candidates,
                _ => {
                    return Err(SlError::DeadEnd {
                        context: context.iter().collect(),
                    })
                }
            };
            let symbol = candidates[rng.usize(..candidates.len())];
            word.push(symbol);
            if symbol == self.markers.right {
                break;
            }
        }
        let item: String = word[self.width..word.len() - 1].iter().collect();
        trace!("generated {:?}", item);
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use sl_automata::{Markers, NGram};
    use tracing_test::traced_test;

    use super::SlGrammar;
    use crate::{GenerationConfig, Polarity, SlError};

    fn ngrams(items: &[&str]) -> BTreeSet<NGram> {
        items.iter().map(|g| g.chars().collect()).collect()
    }

    fn ab_grammar() -> SlGrammar {
        let mut sl = SlGrammar::new("ab".chars(), 2)
            .unwrap()
            .with_config(GenerationConfig::default().with_seed(42));
        sl.learn_from(["ab", "ba"]).unwrap();
        sl
    }

    #[test]
    #[traced_test]
    fn learn_and_recognize() {
        let mut sl = ab_grammar();
        assert_eq!(sl.grammar(), &ngrams(&[">a", "ab", "b<", ">b", "ba", "a<"]));
        assert!(sl.fsm().is_none());

        let fsm = sl.fsmize().unwrap();
        assert!(fsm.recognize(">ab<"));
        assert!(!fsm.recognize(">aa<"));
        assert_eq!(fsm.ngrams(), ngrams(&[">a", "ab", "b<", ">b", "ba", "a<"]));

        for word in sl.data().to_vec() {
            assert!(sl.scan(&word).unwrap(), "{word} should be accepted");
        }
        assert!(sl.scan("abab").unwrap());
        assert!(!sl.scan("abb").unwrap());
        assert!(logs_contain("learned 6 n-grams of width 2 from 2 words"));
    }

    #[test]
    fn learning_resets_the_automaton() {
        let mut sl = ab_grammar();
        sl.fsmize().unwrap();
        sl.learn_from(["aa"]).unwrap();
        assert!(sl.fsm().is_none());
        assert!(sl.scan("aaa").unwrap());
        assert!(!sl.scan("ab").unwrap());
    }

    #[test]
    fn empty_data() {
        let mut sl = SlGrammar::new("ab".chars(), 2).unwrap();
        assert_eq!(sl.learn(), Err(SlError::EmptyGrammar));
        assert_eq!(sl.fsmize().err(), Some(SlError::EmptyGrammar));
        assert_eq!(sl.generate_item(), Err(SlError::EmptyGrammar));
        assert_eq!(
            SlGrammar::new("a>".chars(), 2).err(),
            Some(SlError::ReservedSymbol { symbol: '>' })
        );
        assert_eq!(
            SlGrammar::new("a".chars(), 0).err(),
            Some(SlError::InvalidWindow { k: 0 })
        );
    }

    #[test]
    fn learning_rejects_foreign_symbols() {
        let mut negative = SlGrammar::new("ab".chars(), 2)
            .unwrap()
            .with_polarity(Polarity::Negative);
        assert_eq!(
            negative.learn_from(["ab", "abc"]),
            Err(SlError::UnknownSymbol { symbol: 'c' })
        );
        assert!(negative.grammar().is_empty());

        // once learned, every word of the data is accepted again after two flips
        negative.learn_from(["ab", "ba"]).unwrap();
        for _ in 0..2 {
            negative.change_polarity().unwrap();
            for word in negative.data().to_vec() {
                assert!(negative.scan(&word).unwrap(), "{word} should be accepted");
            }
        }
        let mut fresh = negative.clone();
        assert_eq!(
            fresh.fsmize().unwrap().ngrams(),
            negative.fsm().unwrap().ngrams()
        );

        let mut sl = SlGrammar::new("ab".chars(), 2).unwrap();
        assert_eq!(
            sl.learn_from(["a<b"]),
            Err(SlError::ReservedSymbol { symbol: '<' })
        );
        let mut open = SlGrammar::new([], 2).unwrap();
        assert_eq!(
            open.learn_from(["x>"]),
            Err(SlError::ReservedSymbol { symbol: '>' })
        );
        open.learn_from(["xyz"]).unwrap();
    }

    #[test]
    fn supplied_grammar_is_validated() {
        let sl = || SlGrammar::new("ab".chars(), 2).unwrap();
        assert_eq!(
            sl().with_grammar(ngrams(&[">a", ">ab"])).err(),
            Some(SlError::InvalidNGram {
                ngram: ">ab".to_string(),
                k: 2
            })
        );
        assert_eq!(
            sl().with_grammar(ngrams(&["a>"])).err(),
            Some(SlError::InvalidNGram {
                ngram: "a>".to_string(),
                k: 2
            })
        );
        assert_eq!(
            sl().with_grammar(ngrams(&[">a", "ac"])).err(),
            Some(SlError::UnknownSymbol { symbol: 'c' })
        );

        let mut valid = sl()
            .with_polarity(Polarity::Negative)
            .with_grammar(ngrams(&["aa", "bb"]))
            .unwrap();
        valid.change_polarity().unwrap();
        valid.change_polarity().unwrap();
        assert_eq!(valid.grammar(), &ngrams(&["aa", "bb"]));
    }

    #[test]
    fn double_flip_is_identity() {
        let mut sl = ab_grammar();
        let original = sl.grammar().clone();

        sl.change_polarity().unwrap();
        assert_eq!(sl.polarity(), Polarity::Negative);
        assert_eq!(sl.grammar(), &ngrams(&["aa", "bb", "><"]));

        sl.change_polarity().unwrap();
        assert_eq!(sl.polarity(), Polarity::Positive);
        assert_eq!(sl.grammar(), &original);
    }

    #[test]
    fn flipping_requires_an_alphabet() {
        let mut sl = SlGrammar::new([], 2).unwrap();
        sl.learn_from(["ab"]).unwrap();
        assert_eq!(sl.change_polarity(), Err(SlError::MissingAlphabet));
        assert_eq!(sl.polarity(), Polarity::Positive);

        sl.extract_alphabet().unwrap();
        assert_eq!(sl.alphabet(), &BTreeSet::from(['a', 'b']));
        sl.change_polarity().unwrap();
        assert_eq!(sl.polarity(), Polarity::Negative);

        let mut negative = SlGrammar::new([], 2)
            .unwrap()
            .with_polarity(Polarity::Negative);
        assert_eq!(negative.learn_from(["ab"]), Err(SlError::MissingAlphabet));
    }

    #[test]
    fn negative_grammar_compiles_to_positive_automaton() {
        let mut sl = SlGrammar::new("ab".chars(), 2)
            .unwrap()
            .with_polarity(Polarity::Negative);
        sl.learn_from(["ab", "ba"]).unwrap();
        assert_eq!(sl.grammar(), &ngrams(&["aa", "bb", "><"]));

        let fsm = sl.fsmize().unwrap();
        assert_eq!(fsm.ngrams(), ngrams(&[">a", "ab", "b<", ">b", "ba", "a<"]));
        // compiling must not change what is stored
        assert_eq!(sl.grammar(), &ngrams(&["aa", "bb", "><"]));
        assert_eq!(sl.polarity(), Polarity::Negative);
        assert!(sl.scan("abab").unwrap());
        assert!(!sl.scan("").unwrap());
    }

    #[test]
    fn flip_keeps_the_automaton() {
        let mut sl = ab_grammar();
        sl.fsmize().unwrap();
        let before = sl.fsm().cloned();
        sl.change_polarity().unwrap();
        assert_eq!(sl.fsm().cloned(), before);
        assert!(sl.scan("ba").unwrap());
    }

    #[test]
    #[traced_test]
    fn clean_removes_useless_ngrams() {
        let mut sl = SlGrammar::new("abc".chars(), 2)
            .unwrap()
            .with_grammar(ngrams(&[">a", "ab", "b<", "ac", "cc", "ca", "bb"]))
            .unwrap();
        sl.clean().unwrap();
        assert_eq!(
            sl.grammar(),
            &ngrams(&[">a", "ab", "b<", "ac", "cc", "ca", "bb"])
        );

        let mut sl = SlGrammar::new("abc".chars(), 2)
            .unwrap()
            .with_config(GenerationConfig::default().with_seed(11))
            .with_grammar(ngrams(&[">a", "ab", "b<", "ac", "cc", "ba"]))
            .unwrap();
        sl.clean().unwrap();
        assert_eq!(sl.grammar(), &ngrams(&[">a", "ab", "b<", "ba"]));
        assert!(logs_contain("4 n-grams are useful"));

        // every remaining n-gram is used by some word
        let fsm = sl.fsm().unwrap().clone();
        let mut marked = fsm.clone();
        for word in sl.generate_sample(50, true).unwrap() {
            let annotated = format!(">{word}<");
            assert!(marked.recognize_and_mark(&annotated));
        }
        marked.compact();
        assert_eq!(marked.ngrams(), fsm.ngrams());
    }

    #[test]
    fn clean_negative_grammar() {
        let mut sl = SlGrammar::new("ab".chars(), 2)
            .unwrap()
            .with_polarity(Polarity::Negative)
            .with_grammar(ngrams(&["><", "a<", "b<"]))
            .unwrap();
        sl.fsmize().unwrap();
        // no word can ever end
        sl.clean().unwrap();
        assert_eq!(sl.polarity(), Polarity::Negative);
        assert!(sl.positive_grammar().unwrap().is_empty());
        assert_eq!(sl.grammar().len(), 9);
        assert!(sl.fsm().unwrap().is_empty());
    }

    #[test]
    fn generated_words_are_accepted() {
        let mut sl = SlGrammar::new("abc".chars(), 3)
            .unwrap()
            .with_config(GenerationConfig::default().with_seed(7));
        sl.learn_from(["abc", "acb", "cab", "aac"]).unwrap();
        sl.clean().unwrap();

        let sample = sl.generate_sample(30, true).unwrap();
        assert_eq!(sample.len(), 30);
        for word in &sample {
            assert!(sl.scan(word).unwrap(), "{word} should be accepted");
        }

        let distinct = sl.generate_sample(4, false).unwrap();
        assert_eq!(distinct.len(), 4);
        assert_eq!(distinct.iter().collect::<BTreeSet<_>>().len(), 4);
    }

    #[test]
    fn negative_grammar_generates_its_language() {
        let mut sl = SlGrammar::new("ab".chars(), 2)
            .unwrap()
            .with_config(GenerationConfig::default().with_seed(3))
            .with_polarity(Polarity::Negative)
            .with_grammar(ngrams(&["aa", "bb", "><"]))
            .unwrap();
        for word in sl.generate_sample(20, true).unwrap() {
            assert!(!word.is_empty());
            assert!(!word.contains("aa") && !word.contains("bb"), "{word}");
        }
        assert_eq!(sl.grammar(), &ngrams(&["aa", "bb", "><"]));
    }

    #[test]
    fn same_seed_same_sample() {
        let mut first = ab_grammar();
        let mut second = ab_grammar();
        assert_eq!(
            first.generate_sample(10, true).unwrap(),
            second.generate_sample(10, true).unwrap()
        );
    }

    #[test]
    fn generation_is_bounded() {
        // the right marker can never be reached
        let mut looping = SlGrammar::new("a".chars(), 2)
            .unwrap()
            .with_config(GenerationConfig::default().with_max_length(25))
            .with_grammar(ngrams(&[">a", "aa"]))
            .unwrap();
        assert_eq!(
            looping.generate_item(),
            Err(SlError::NonTerminatingGeneration { max_length: 25 })
        );

        let mut stuck = SlGrammar::new("ab".chars(), 2)
            .unwrap()
            .with_grammar(ngrams(&[">a", "ab"]))
            .unwrap();
        assert_eq!(
            stuck.generate_item(),
            Err(SlError::DeadEnd {
                context: "b".to_string()
            })
        );

        let mut single = SlGrammar::new("a".chars(), 2)
            .unwrap()
            .with_config(GenerationConfig::default().with_max_attempts(20))
            .with_grammar(ngrams(&[">a", "a<"]))
            .unwrap();
        assert_eq!(single.generate_sample(3, true).unwrap(), vec!["a"; 3]);
        assert_eq!(
            single.generate_sample(2, false),
            Err(SlError::SampleExhausted {
                wanted: 2,
                found: 1,
                attempts: 20
            })
        );
    }

    #[test]
    fn custom_markers() {
        let mut sl = SlGrammar::new("ab".chars(), 3)
            .unwrap()
            .with_markers(Markers::new('#', '$'))
            .unwrap();
        sl.learn_from(["ab"]).unwrap();
        assert_eq!(sl.grammar(), &ngrams(&["##a", "#ab", "ab$", "b$$"]));
        assert!(sl.scan("ab").unwrap());
        assert!(!sl.scan("ba").unwrap());

        let clash = SlGrammar::new("a#".chars(), 2)
            .unwrap()
            .with_markers(Markers::new('#', '$'));
        assert_eq!(clash.err(), Some(SlError::ReservedSymbol { symbol: '#' }));
    }
}
