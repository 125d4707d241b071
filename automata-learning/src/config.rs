/// Bounds and randomness for [`crate::SlGrammar::generate_sample`].
///
/// A random walk through an automaton whose reachable part never leads to the right marker
/// would run forever, so every walk is cut off after `max_length` symbols. Similarly, asking for
/// more distinct words than the language contains is stopped after `max_attempts` walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    /// The maximal number of symbols a single generated word may have.
    pub max_length: usize,
    /// The maximal number of walks performed for one sample.
    pub max_attempts: usize,
    /// Seed of the random source, `None` draws a fresh seed.
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: 1_000,
            max_attempts: 10_000,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Sets the maximal length of a generated word.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Sets the maximal number of walks for one sample.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Makes generation reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub(crate) fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}
