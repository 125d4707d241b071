/// The pair of reserved boundary symbols that open and close every annotated word.
/// Neither of them may occur in the alphabet of a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Markers {
    /// Marks the left edge of a word, `>` by default.
    pub left: char,
    /// Marks the right edge of a word, `<` by default.
    pub right: char,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            left: '>',
            right: '<',
        }
    }
}

impl Markers {
    /// Creates a new pair of markers.
    pub fn new(left: char, right: char) -> Self {
        Self { left, right }
    }

    /// Returns true if `symbol` is one of the two markers.
    pub fn contains(&self, symbol: char) -> bool {
        symbol == self.left || symbol == self.right
    }

    /// The context of length `width` which consists only of left markers, i.e. the
    /// state in which every annotated word starts.
    pub fn initial_context(&self, width: usize) -> Vec<char> {
        vec![self.left; width]
    }
}
