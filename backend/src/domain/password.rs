//! Plaintext password wrapper.

use std::fmt;

use zeroize::Zeroizing;

/// Password as typed by the user.
///
/// The buffer is wiped on drop and `Debug` output is redacted so the
/// plaintext never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainPassword(Zeroizing<String>);

impl PlainPassword {
    /// Wrap caller-provided text without trimming it.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Borrow the plaintext for hashing or verification.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the password is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(**redacted**)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let password = PlainPassword::new("Secret123!");
        let rendered = format!("{password:?}");
        assert!(!rendered.contains("Secret123!"));
    }

    #[test]
    fn whitespace_is_preserved() {
        assert_eq!(PlainPassword::new(" pw ").expose(), " pw ");
    }
}
