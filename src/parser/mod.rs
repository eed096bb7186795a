//! Parser module for the weaver
//!
//! This module contains:
//! - `tokenizer`: lexes a source unit into punctuation atoms and `(kind, text)` tokens
//! - `scanner`: bounded, bracket-depth-aware scans over the token stream
//! - `structure`: recovers type/function/attribute definitions from the tokens
//! - `annotations`: extracts contract clauses from doc-comments

pub mod annotations;
pub mod scanner;
pub mod structure;
pub mod tokenizer;

pub use scanner::TokenScanner;
pub use structure::{parse_functions, parse_type, DOC_COMMENT_WINDOW};
pub use tokenizer::{tokenize, Token, TokenKind};
