//! Structural parser
//!
//! Recovers `TypeDefinition` and `FunctionDefinition` entities from a token
//! stream. Extraction is span-based: the scanner derives one bounded span
//! per function keyword, and every span is parsed independently so that one
//! malformed candidate never poisons its neighbours.

use crate::constants::{KEYWORD_INVARIANT, KEYWORD_OLD, KEYWORD_POST, KEYWORD_PRE};
use crate::entities::{
    AttributeDefinition, FunctionDefinition, ParameterDefinition, TypeDefinition, Visibility,
};
use crate::error::WeaveError;
use crate::parser::annotations;
use crate::parser::scanner::{matching_delimiter, TokenScanner};
use crate::parser::tokenizer::{span_text, Token, TokenKind};

/// How many tokens after a doc-comment a function keyword may appear for
/// the comment to count as attached.
///
/// This is an approximate association, not a guaranteed one: unusual
/// formatting can push the keyword out of the window (the comment is then
/// dropped) or pull an unrelated comment in. Kept as an explicit constant
/// rather than silently "fixed" into a structural rule.
pub const DOC_COMMENT_WINDOW: usize = 8;

/// Locate every function-like construct and parse each independently.
///
/// A candidate that fails to decode is skipped and the remaining
/// candidates proceed; finding no candidate at all in the whole unit is an
/// error, not an empty success.
pub fn parse_functions(tokens: &[Token]) -> Result<Vec<FunctionDefinition>, WeaveError> {
    let scanner = TokenScanner::new(tokens);
    let spans = scanner.function_spans();
    if spans.is_empty() {
        return Err(WeaveError::StructuralNotFound("function candidates"));
    }

    let mut definitions: Vec<FunctionDefinition> = Vec::new();
    for span in spans {
        match parse_candidate(span) {
            Ok(definition) => {
                // Definitions are keyed unique by name.
                if definitions.iter().all(|d| d.name != definition.name) {
                    definitions.push(definition);
                }
            }
            Err(err) => {
                log::debug!("skipping function candidate: {}", err);
                continue;
            }
        }
    }

    Ok(definitions)
}

/// Parse the enclosing type: header, parent link, attributes, invariant
/// clauses and the contained functions.
pub fn parse_type(tokens: &[Token]) -> Result<TypeDefinition, WeaveError> {
    let class_idx = tokens
        .iter()
        .position(|t| t.is_kind(TokenKind::Class) || t.is_kind(TokenKind::Interface))
        .ok_or(WeaveError::StructuralNotFound("type declaration"))?;

    let mut definition = TypeDefinition {
        name: name_after(tokens, class_idx)
            .ok_or(WeaveError::StructuralNotFound("type name"))?,
        parent: parent_name(tokens, class_idx),
        ..TypeDefinition::default()
    };

    let doc = attached_doc_comment(tokens, class_idx);
    let invariants = annotations::parse_clauses(&doc, KEYWORD_INVARIANT);
    if !invariants.is_empty() {
        definition.invariants.push(invariants);
    }

    definition.attributes = parse_attributes(tokens, class_idx)?;
    definition.functions = parse_functions(tokens)?;
    mark_invariant_attributes(&mut definition);

    Ok(definition)
}

/// Parse one bounded candidate span into a function definition.
fn parse_candidate(span: &[Token]) -> Result<FunctionDefinition, WeaveError> {
    let func_idx = span
        .iter()
        .position(|t| t.is_kind(TokenKind::Function))
        .ok_or(WeaveError::StructuralNotFound("function keyword"))?;

    let mut definition = FunctionDefinition {
        doc_comment: doc_comment_before(span, func_idx),
        is_final: has_modifier(span, func_idx, TokenKind::Final),
        is_static: has_modifier(span, func_idx, TokenKind::Static),
        is_abstract: has_modifier(span, func_idx, TokenKind::Abstract),
        visibility: visibility_before(span, func_idx),
        name: name_after(span, func_idx)
            .ok_or(WeaveError::StructuralNotFound("function name"))?,
        ..FunctionDefinition::default()
    };

    definition.parameters = parse_parameters(span, func_idx)?;
    definition.body = parse_body(span, func_idx)?;
    if definition.body.is_none() {
        definition.is_abstract = true;
    }

    definition.preconditions = annotations::parse_clauses(&definition.doc_comment, KEYWORD_PRE);
    definition.postconditions = annotations::parse_clauses(&definition.doc_comment, KEYWORD_POST);
    definition.uses_old = annotations::uses_keyword(&definition.doc_comment, KEYWORD_OLD);

    Ok(definition)
}

/// The doc-comment attached to the construct at `target_idx`, if one
/// appears before it with the construct keyword inside the lookahead
/// window. Returns an empty string when none is associated.
fn doc_comment_before(span: &[Token], target_idx: usize) -> String {
    for (i, token) in span.iter().enumerate().take(target_idx) {
        if token.is_kind(TokenKind::DocComment) {
            let window_end = (i + 1 + DOC_COMMENT_WINDOW).min(span.len());
            if span[i + 1..window_end]
                .iter()
                .any(|t| t.is_kind(TokenKind::Function))
            {
                return token.to_string();
            }
            // The first pre-construct doc-comment decides; an unattached
            // one means the construct has none.
            break;
        }
    }
    String::new()
}

/// Same association heuristic, for the type header.
fn attached_doc_comment(tokens: &[Token], class_idx: usize) -> String {
    for (i, token) in tokens.iter().enumerate().take(class_idx) {
        if token.is_kind(TokenKind::DocComment) {
            let window_end = (i + 1 + DOC_COMMENT_WINDOW).min(tokens.len());
            if tokens[i + 1..window_end]
                .iter()
                .any(|t| t.is_kind(TokenKind::Class) || t.is_kind(TokenKind::Interface))
            {
                return token.to_string();
            }
        }
    }
    String::new()
}

/// Start of the modifier run immediately preceding `func_idx`: just past
/// the last statement or block atom before it. Keeps a surrounding type
/// header's own `abstract`/`final` out of the first function's modifiers.
fn modifier_run_start(span: &[Token], func_idx: usize) -> usize {
    for j in (0..func_idx).rev() {
        let token = &span[j];
        if token.is_atom(';') || token.is_atom('{') || token.is_atom('}') {
            return j + 1;
        }
    }
    0
}

fn has_modifier(span: &[Token], func_idx: usize, kind: TokenKind) -> bool {
    let start = modifier_run_start(span, func_idx);
    span[start..func_idx].iter().any(|t| t.is_kind(kind))
}

/// Visibility from the tokens immediately preceding the keyword; missing
/// visibility defaults to public, matching the host language rule.
fn visibility_before(span: &[Token], func_idx: usize) -> Visibility {
    let mut visibility = Visibility::Public;
    let start = modifier_run_start(span, func_idx);
    for token in &span[start..func_idx] {
        match token.kind() {
            Some(TokenKind::Public) => visibility = Visibility::Public,
            Some(TokenKind::Protected) => visibility = Visibility::Protected,
            Some(TokenKind::Private) => visibility = Visibility::Private,
            _ => {}
        }
    }
    visibility
}

/// First identifier after `idx`, skipping filler.
fn name_after(span: &[Token], idx: usize) -> Option<String> {
    span[idx + 1..]
        .iter()
        .find(|t| !t.is_filler())
        .and_then(|t| match t {
            Token::Rich(TokenKind::Ident, text) => Some(text.clone()),
            _ => None,
        })
}

/// Parent type name after an `extends` clause, possibly namespaced.
fn parent_name(tokens: &[Token], class_idx: usize) -> Option<String> {
    let extends_idx = (class_idx..tokens.len()).find(|&i| {
        tokens[i].is_kind(TokenKind::Extends)
    })?;
    let mut name = String::new();
    for token in &tokens[extends_idx + 1..] {
        if token.is_filler() && name.is_empty() {
            continue;
        }
        match token {
            Token::Rich(TokenKind::Ident, text) => name.push_str(text),
            Token::Atom('\\') => name.push('\\'),
            _ => break,
        }
    }
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Parameter list between the first opening parenthesis after the function
/// keyword and its matching close, split on top-level commas. Each
/// parameter run splits on whitespace into an optional type and a
/// mandatory name.
fn parse_parameters(
    span: &[Token],
    func_idx: usize,
) -> Result<Vec<ParameterDefinition>, WeaveError> {
    let open = (func_idx..span.len())
        .find(|&i| span[i].is_atom('('))
        .ok_or(WeaveError::StructuralNotFound("parameter list"))?;
    let close = matching_delimiter(span, open, '(', ')')
        .ok_or(WeaveError::StructuralNotFound("parameter list terminator"))?;

    let mut runs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0i64;
    for token in &span[open + 1..close] {
        if token.is_atom('(') || token.is_atom('[') {
            depth += 1;
        } else if token.is_atom(')') || token.is_atom(']') {
            depth -= 1;
        }
        if depth == 0 && token.is_atom(',') {
            runs.push(std::mem::take(&mut current));
            continue;
        }
        token.write_text(&mut current);
    }
    if !current.trim().is_empty() || !runs.is_empty() {
        runs.push(current);
    }

    let mut parameters = Vec::new();
    for run in runs {
        let pieces: Vec<&str> = run.split_whitespace().collect();
        match pieces.as_slice() {
            [] => continue,
            [name] => parameters.push(ParameterDefinition {
                type_hint: None,
                name: (*name).to_string(),
            }),
            [type_hint, name, ..] => parameters.push(ParameterDefinition {
                type_hint: Some((*type_hint).to_string()),
                name: (*name).to_string(),
            }),
        }
    }

    Ok(parameters)
}

/// Literal body text between the function's braces, via a balanced-depth
/// scan. `Ok(None)` means the function has no body (is abstract); an
/// unterminated body is a decoding error for this candidate.
fn parse_body(span: &[Token], func_idx: usize) -> Result<Option<String>, WeaveError> {
    let mut open = None;
    for (i, token) in span.iter().enumerate().skip(func_idx) {
        // A terminator before any brace means an abstract declaration.
        if token.is_atom(';') {
            return Ok(None);
        }
        if token.is_atom('{') {
            open = Some(i);
            break;
        }
    }
    let open = match open {
        Some(i) => i,
        None => return Ok(None),
    };
    let close = matching_delimiter(span, open, '{', '}')
        .ok_or(WeaveError::StructuralNotFound("function body terminator"))?;
    Ok(Some(span_text(&span[open + 1..close])))
}

/// Attribute definitions at class-body depth, with their visibility and
/// static flags. Function bodies are stepped over wholesale.
fn parse_attributes(
    tokens: &[Token],
    class_idx: usize,
) -> Result<Vec<AttributeDefinition>, WeaveError> {
    let open = (class_idx..tokens.len())
        .find(|&i| tokens[i].is_atom('{'))
        .ok_or(WeaveError::StructuralNotFound("type body"))?;

    let mut attributes = Vec::new();
    let mut visibility = Visibility::Public;
    let mut is_static = false;
    let mut depth = 1i64;
    let mut j = open + 1;

    while j < tokens.len() {
        let token = &tokens[j];
        if token.is_atom('{') {
            depth += 1;
            j += 1;
            continue;
        }
        if token.is_atom('}') {
            depth -= 1;
            if depth == 0 {
                break;
            }
            j += 1;
            continue;
        }
        if depth != 1 {
            j += 1;
            continue;
        }

        match token.kind() {
            Some(TokenKind::Public) => visibility = Visibility::Public,
            Some(TokenKind::Protected) => visibility = Visibility::Protected,
            Some(TokenKind::Private) => visibility = Visibility::Private,
            Some(TokenKind::Static) => is_static = true,
            Some(TokenKind::Function) => {
                j = skip_function(tokens, j);
                visibility = Visibility::Public;
                is_static = false;
                continue;
            }
            Some(TokenKind::Variable) => {
                j = collect_declaration(tokens, j, visibility, is_static, &mut attributes);
                visibility = Visibility::Public;
                is_static = false;
                continue;
            }
            _ => {
                if token.is_atom(';') {
                    visibility = Visibility::Public;
                    is_static = false;
                }
            }
        }
        j += 1;
    }

    Ok(attributes)
}

/// Step over one function member, body and all. Returns the index just
/// past it; an unterminated body consumes the rest of the stream.
fn skip_function(tokens: &[Token], func_idx: usize) -> usize {
    for (i, token) in tokens.iter().enumerate().skip(func_idx) {
        if token.is_atom(';') {
            return i + 1;
        }
        if token.is_atom('{') {
            return match matching_delimiter(tokens, i, '{', '}') {
                Some(close) => close + 1,
                None => tokens.len(),
            };
        }
    }
    tokens.len()
}

/// Consume one property declaration starting at a variable token,
/// collecting comma-separated names up to the statement terminator.
fn collect_declaration(
    tokens: &[Token],
    var_idx: usize,
    visibility: Visibility,
    is_static: bool,
    attributes: &mut Vec<AttributeDefinition>,
) -> usize {
    let push = |attributes: &mut Vec<AttributeDefinition>, name: String| {
        attributes.push(AttributeDefinition {
            name,
            visibility,
            is_static,
            in_invariant: false,
        });
    };
    push(attributes, tokens[var_idx].to_string());

    let mut depth = 0i64;
    let mut expect_name = false;
    let mut j = var_idx + 1;
    while j < tokens.len() {
        let token = &tokens[j];
        if token.is_atom('(') || token.is_atom('[') {
            depth += 1;
        } else if token.is_atom(')') || token.is_atom(']') {
            depth -= 1;
        } else if depth == 0 && token.is_atom(',') {
            expect_name = true;
        } else if depth == 0 && token.is_atom(';') {
            return j + 1;
        } else if depth == 0 && expect_name && token.is_kind(TokenKind::Variable) {
            push(attributes, token.to_string());
            expect_name = false;
        }
        j += 1;
    }
    j
}

/// Flag every attribute referenced by an invariant clause. Textual
/// matching on `$this->name` / `$name` with a word boundary; private
/// attributes keep the flag but are never instrumented.
fn mark_invariant_attributes(definition: &mut TypeDefinition) {
    let expressions: Vec<String> = definition
        .invariant_expressions()
        .map(str::to_string)
        .collect();
    for attribute in &mut definition.attributes {
        let bare = attribute.bare_name();
        let pattern = format!(
            r"(\$this->{bare}\b)|(\${bare}\b)",
            bare = regex::escape(bare)
        );
        let re = regex::Regex::new(&pattern).expect("escaped name forms a valid pattern");
        attribute.in_invariant = expressions.iter().any(|e| re.is_match(e));
    }
}
