//! Lexical tokenizer for PHP-like source units
//!
//! Produces the token shape the scanner and the structural parser consume:
//! each element is either a literal punctuation atom or a `(kind, text)`
//! pair for richer tokens (keywords, identifiers, comments, strings).
//! Concatenating the text of every token reproduces the input byte for
//! byte, which is what lets the parser lift body spans verbatim.
//!
//! Tokenizing never fails; bytes that fit no richer rule pass through as
//! atoms, and an unterminated comment or string swallows the rest of the
//! input as one token.

use std::fmt;

/// Kind tag of a rich token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<?php` or `<?`
    OpenTag,
    /// `/** ... */`
    DocComment,
    /// `/* ... */`, `// ...` or `# ...`
    Comment,
    /// Single- or double-quoted string, quotes included.
    StringLiteral,
    /// `$name`, leading `$` included.
    Variable,
    Number,
    Whitespace,
    /// Identifier that is not a recognized keyword.
    Ident,
    Class,
    Interface,
    Function,
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Extends,
    Implements,
}

impl TokenKind {
    /// Map a lowercased word onto a keyword kind, if it is one.
    fn keyword(word: &str) -> Option<TokenKind> {
        Some(match word {
            "class" => TokenKind::Class,
            "interface" => TokenKind::Interface,
            "function" => TokenKind::Function,
            "public" => TokenKind::Public,
            "protected" => TokenKind::Protected,
            "private" => TokenKind::Private,
            "static" => TokenKind::Static,
            "final" => TokenKind::Final,
            "abstract" => TokenKind::Abstract,
            "extends" => TokenKind::Extends,
            "implements" => TokenKind::Implements,
            _ => return None,
        })
    }
}

/// One lexical token: a bare punctuation atom or a `(kind, text)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Atom(char),
    Rich(TokenKind, String),
}

impl Token {
    /// The kind of a rich token, `None` for atoms.
    pub fn kind(&self) -> Option<TokenKind> {
        match self {
            Token::Atom(_) => None,
            Token::Rich(kind, _) => Some(*kind),
        }
    }

    /// True for the given punctuation atom.
    pub fn is_atom(&self, c: char) -> bool {
        matches!(self, Token::Atom(a) if *a == c)
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.kind() == Some(kind)
    }

    /// True for whitespace and comments, which carry no structure.
    pub fn is_filler(&self) -> bool {
        matches!(
            self.kind(),
            Some(TokenKind::Whitespace) | Some(TokenKind::Comment)
        )
    }

    /// Append this token's source text to `out`.
    pub fn write_text(&self, out: &mut String) {
        match self {
            Token::Atom(c) => out.push(*c),
            Token::Rich(_, text) => out.push_str(text),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Atom(c) => write!(f, "{}", c),
            Token::Rich(_, text) => f.write_str(text),
        }
    }
}

/// Reassemble the literal source text of a token slice.
pub fn span_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        token.write_text(&mut out);
    }
    out
}

/// Tokenize a whole source unit.
pub fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Open tag
        if c == '<' && chars.get(i + 1) == Some(&'?') {
            let mut end = i + 2;
            while end < chars.len() && chars[end].is_ascii_alphabetic() {
                end += 1;
            }
            tokens.push(Token::Rich(
                TokenKind::OpenTag,
                chars[i..end].iter().collect(),
            ));
            i = end;
            continue;
        }

        // Block comments, doc-comments first
        if c == '/' && chars.get(i + 1) == Some(&'*') {
            let is_doc = chars.get(i + 2) == Some(&'*') && chars.get(i + 3) != Some(&'/');
            let mut end = i + 2;
            while end < chars.len() {
                if chars[end] == '*' && chars.get(end + 1) == Some(&'/') {
                    end += 2;
                    break;
                }
                end += 1;
            }
            let kind = if is_doc {
                TokenKind::DocComment
            } else {
                TokenKind::Comment
            };
            tokens.push(Token::Rich(kind, chars[i..end.min(chars.len())].iter().collect()));
            i = end.min(chars.len());
            continue;
        }

        // Line comments
        if (c == '/' && chars.get(i + 1) == Some(&'/')) || c == '#' {
            let mut end = i;
            while end < chars.len() && chars[end] != '\n' {
                end += 1;
            }
            tokens.push(Token::Rich(TokenKind::Comment, chars[i..end].iter().collect()));
            i = end;
            continue;
        }

        // String literals; escapes keep the delimiter search honest
        if c == '\'' || c == '"' {
            let quote = c;
            let mut end = i + 1;
            while end < chars.len() {
                if chars[end] == '\\' {
                    end += 2;
                    continue;
                }
                if chars[end] == quote {
                    end += 1;
                    break;
                }
                end += 1;
            }
            tokens.push(Token::Rich(
                TokenKind::StringLiteral,
                chars[i..end.min(chars.len())].iter().collect(),
            ));
            i = end.min(chars.len());
            continue;
        }

        // Variables
        if c == '$' && chars.get(i + 1).map_or(false, |n| is_ident_start(*n)) {
            let mut end = i + 1;
            while end < chars.len() && is_ident_char(chars[end]) {
                end += 1;
            }
            tokens.push(Token::Rich(TokenKind::Variable, chars[i..end].iter().collect()));
            i = end;
            continue;
        }

        // Numbers
        if c.is_ascii_digit() {
            let mut end = i;
            while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '.') {
                end += 1;
            }
            tokens.push(Token::Rich(TokenKind::Number, chars[i..end].iter().collect()));
            i = end;
            continue;
        }

        // Identifiers and keywords
        if is_ident_start(c) {
            let mut end = i;
            while end < chars.len() && is_ident_char(chars[end]) {
                end += 1;
            }
            let word: String = chars[i..end].iter().collect();
            let kind = TokenKind::keyword(&word.to_ascii_lowercase()).unwrap_or(TokenKind::Ident);
            tokens.push(Token::Rich(kind, word));
            i = end;
            continue;
        }

        // Whitespace runs
        if c.is_whitespace() {
            let mut end = i;
            while end < chars.len() && chars[end].is_whitespace() {
                end += 1;
            }
            tokens.push(Token::Rich(
                TokenKind::Whitespace,
                chars[i..end].iter().collect(),
            ));
            i = end;
            continue;
        }

        tokens.push(Token::Atom(c));
        i += 1;
    }

    tokens
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenation_reproduces_source() {
        let source = "<?php\nclass Foo extends Bar {\n    private $x = 'a {brace}';\n    // note\n    public function f($y) { return $y + 1; }\n}\n";
        let tokens = tokenize(source);
        assert_eq!(span_text(&tokens), source);
    }

    #[test]
    fn keywords_get_dedicated_kinds() {
        let tokens = tokenize("public static function f() {}");
        let kinds: Vec<_> = tokens.iter().filter_map(Token::kind).collect();
        assert!(kinds.contains(&TokenKind::Public));
        assert!(kinds.contains(&TokenKind::Static));
        assert!(kinds.contains(&TokenKind::Function));
    }

    #[test]
    fn doc_comment_distinguished_from_block_comment() {
        let tokens = tokenize("/** doc */ /* plain */");
        assert!(tokens[0].is_kind(TokenKind::DocComment));
        assert!(tokens[2].is_kind(TokenKind::Comment));
    }

    #[test]
    fn braces_inside_strings_are_not_atoms() {
        let tokens = tokenize(r#"$s = "a { b } c";"#);
        let brace_atoms = tokens.iter().filter(|t| t.is_atom('{') || t.is_atom('}')).count();
        assert_eq!(brace_atoms, 0);
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let tokens = tokenize(r#"'it\'s' ;"#);
        assert!(tokens[0].is_kind(TokenKind::StringLiteral));
        assert!(tokens.last().unwrap().is_atom(';'));
    }

    #[test]
    fn unknown_bytes_pass_through_as_atoms() {
        let tokens = tokenize("a ?? b");
        assert!(tokens.iter().any(|t| t.is_atom('?')));
    }
}
