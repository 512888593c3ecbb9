//! Session configuration.

/// Default upper bound on the length of a sequence rebuilt from wire indices.
pub const DEFAULT_MAX_SEQUENCE_LEN: usize = 1024;

/// How multi-segment keys are joined.
///
/// The first segment is always bare, so a value encoded at the top level has
/// plain field names or indices as keys in either style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStyle {
    /// `child[desc]`, `children[0][desc]`, `params[abc]`
    #[default]
    Bracket,
    /// `child.desc`, `children.0.desc`, `params.abc`
    Dot,
}

/// Options shared by [`Encoder`](crate::Encoder) and [`Decoder`](crate::Decoder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Separator scheme for nested keys.
    pub key_style: KeyStyle,
    /// Decoding fails when a wire index would grow a sequence past this length.
    pub max_sequence_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_style: KeyStyle::default(),
            max_sequence_len: DEFAULT_MAX_SEQUENCE_LEN,
        }
    }
}

impl Config {
    pub fn with_key_style(mut self, key_style: KeyStyle) -> Self {
        self.key_style = key_style;
        self
    }

    pub fn with_max_sequence_len(mut self, max_sequence_len: usize) -> Self {
        self.max_sequence_len = max_sequence_len;
        self
    }
}
