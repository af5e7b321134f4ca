//! Line-ending normalization.
//!
//! Rule literals are written with `\n`. A checkout with CRLF endings is
//! normalized to LF before any rule runs and converted back on write, so the
//! output uses one ending throughout.

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// CRLF if the text contains any `\r\n`, LF otherwise.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    /// Convert every `\r\n` to `\n`. Lone `\r` is left alone.
    pub fn normalize(text: String) -> String {
        if text.contains("\r\n") {
            text.replace("\r\n", "\n")
        } else {
            text
        }
    }

    /// Render LF-only text with this ending.
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            LineEnding::Lf => Cow::Borrowed(text),
            LineEnding::CrLf => Cow::Owned(text.replace('\n', "\r\n")),
        }
    }
}
