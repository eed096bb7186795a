//! Bounded scans over a token stream
//!
//! The scanner never raises; absence is an explicit empty or `None` result.
//! Delimiters are only ever punctuation atoms, so braces inside strings and
//! comments (rich tokens) can never unbalance a scan.

use super::tokenizer::{Token, TokenKind};

/// Wraps a token sequence and offers bounded forward/backward scans and
/// bracket-depth-aware span extraction.
pub struct TokenScanner<'a> {
    tokens: &'a [Token],
}

impl<'a> TokenScanner<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        TokenScanner { tokens }
    }

    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    /// Every bounded span around a token matching `start`.
    ///
    /// Each span runs from the nearest statement/block boundary before the
    /// match to the point where brace depth returns to zero after it. An
    /// empty result means no match was found.
    pub fn bounded_spans<F>(&self, start: F) -> Vec<&'a [Token]>
    where
        F: Fn(&Token) -> bool,
    {
        let mut spans = Vec::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if start(token) {
                let lower = self.boundary_before(i);
                let upper = self.balanced_end_after(i);
                spans.push(&self.tokens[lower..upper]);
            }
        }
        spans
    }

    /// Bounded spans around every function keyword.
    pub fn function_spans(&self) -> Vec<&'a [Token]> {
        self.bounded_spans(|t| t.is_kind(TokenKind::Function))
    }

    /// Index just past the last statement terminator, block delimiter or
    /// unit-open marker before `idx`; 0 if none exists.
    fn boundary_before(&self, idx: usize) -> usize {
        for j in (0..idx).rev() {
            let token = &self.tokens[j];
            if token.is_atom(';') || token.is_atom('}') || token.is_kind(TokenKind::OpenTag) {
                return j + 1;
            }
        }
        0
    }

    /// Exclusive end index where brace depth returns to zero after `idx`.
    ///
    /// The depth counter only starts at the first brace seen; an unmatched
    /// opening brace therefore reads as depth 1, never as "no depth", which
    /// would otherwise terminate the span prematurely. If depth never
    /// returns to zero the span extends to the end of the stream.
    fn balanced_end_after(&self, idx: usize) -> usize {
        let mut depth: Option<i64> = None;
        for (j, token) in self.tokens.iter().enumerate().skip(idx + 1) {
            if token.is_atom('{') {
                depth = Some(depth.unwrap_or(0) + 1);
            } else if token.is_atom('}') {
                depth = Some(depth.unwrap_or(0) - 1);
            }
            if depth == Some(0) {
                return j + 1;
            }
        }
        self.tokens.len()
    }
}

/// Index of the atom closing the delimiter pair opened at `open_idx`.
///
/// Returns `None` when the pair never closes.
pub fn matching_delimiter(
    tokens: &[Token],
    open_idx: usize,
    open: char,
    close: char,
) -> Option<usize> {
    let mut depth = 0i64;
    for (j, token) in tokens.iter().enumerate().skip(open_idx) {
        if token.is_atom(open) {
            depth += 1;
        } else if token.is_atom(close) {
            depth -= 1;
            if depth == 0 {
                return Some(j);
            }
        }
    }
    None
}
