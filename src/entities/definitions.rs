//! Structural definitions recovered from a source unit
//!
//! The parser builds these once per unit; the pipeline borrows them
//! read-only while it rewrites the raw text.

use serde::Serialize;

use super::assertions::AssertionList;

/// Member visibility in the host language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// The host-language keyword for this visibility.
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

impl Default for Visibility {
    // Missing visibility in the source defaults to public, matching the
    // host language's own default rule.
    fn default() -> Self {
        Visibility::Public
    }
}

/// One parameter of a function definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterDefinition {
    /// Optional type hint, as written in the source.
    pub type_hint: Option<String>,
    /// Parameter name, including the leading `$`.
    pub name: String,
}

/// A class-like attribute (property).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDefinition {
    /// Attribute name, including the leading `$`.
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    /// True if any invariant clause references this attribute. Private
    /// attributes are never instrumented regardless of this flag.
    pub in_invariant: bool,
}

impl AttributeDefinition {
    /// Name without the leading `$`, as used in the metadata table.
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches('$')
    }

    /// True if external access to this attribute is mediated by the
    /// generated accessors.
    pub fn is_intercepted(&self) -> bool {
        self.in_invariant && self.visibility != Visibility::Private
    }
}

/// A function definition with its contract clauses.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    /// Ordered parameter list.
    pub parameters: Vec<ParameterDefinition>,
    /// Literal body text between the function's braces; `None` for
    /// abstract functions.
    pub body: Option<String>,
    /// Attached doc-comment, empty when none was associated.
    pub doc_comment: String,
    pub preconditions: AssertionList,
    pub postconditions: AssertionList,
    /// True if the doc-comment references the old-state keyword.
    pub uses_old: bool,
}

impl FunctionDefinition {
    /// `__get` and `__set` get accessor logic spliced into their wrapper,
    /// guarded so the synthesized code runs regardless of the original
    /// outcome.
    pub fn is_interception_hook(&self) -> bool {
        self.name == "__get" || self.name == "__set"
    }

    /// Whether the wrapper for this function carries invariant checks.
    ///
    /// Checks are skipped only for private, non-static methods.
    pub fn needs_invariant_checks(&self) -> bool {
        !(self.visibility == Visibility::Private && !self.is_static)
    }

    /// The parameter list as it appears between the parentheses, e.g.
    /// `array $items, $offset`.
    pub fn parameter_source(&self) -> String {
        self.parameters
            .iter()
            .map(|p| match &p.type_hint {
                Some(hint) => format!("{} {}", hint, p.name),
                None => p.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A class-like structure: attributes, functions, parent link and the
/// aggregated invariant clauses.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeDefinition {
    pub name: String,
    /// Parent type name if an inheritance relation is declared. A name
    /// reference only, never a resolved link.
    pub parent: Option<String>,
    /// Ordered attribute definitions.
    pub attributes: Vec<AttributeDefinition>,
    /// Ordered function definitions, unique by name.
    pub functions: Vec<FunctionDefinition>,
    /// Invariant clause lists, own clauses first, ancestors' conceptually
    /// appended by the loader when it merges hierarchies.
    pub invariants: Vec<AssertionList>,
}

impl TypeDefinition {
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Look up a function definition by name.
    pub fn function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Capability check for the generated property-interception hooks.
    ///
    /// True if at least one non-private attribute is referenced by an
    /// invariant clause, i.e. the metadata table would be non-empty.
    pub fn supports_dynamic_access(&self) -> bool {
        self.attributes.iter().any(AttributeDefinition::is_intercepted)
    }

    /// All invariant assertion expressions, flattened in reporting order.
    pub fn invariant_expressions(&self) -> impl Iterator<Item = &str> {
        self.invariants.iter().flat_map(AssertionList::iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_defaults_to_public() {
        assert_eq!(Visibility::default(), Visibility::Public);
        assert_eq!(FunctionDefinition::default().visibility, Visibility::Public);
    }

    #[test]
    fn invariant_checks_skipped_for_private_non_static_only() {
        let mut f = FunctionDefinition {
            visibility: Visibility::Private,
            ..FunctionDefinition::default()
        };
        assert!(!f.needs_invariant_checks());
        f.is_static = true;
        assert!(f.needs_invariant_checks());
        f.visibility = Visibility::Protected;
        f.is_static = false;
        assert!(f.needs_invariant_checks());
    }

    #[test]
    fn private_attributes_are_never_intercepted() {
        let attr = AttributeDefinition {
            name: "$secret".to_string(),
            visibility: Visibility::Private,
            is_static: false,
            in_invariant: true,
        };
        assert!(!attr.is_intercepted());
    }

    #[test]
    fn parameter_source_renders_optional_type_hints() {
        let f = FunctionDefinition {
            parameters: vec![
                ParameterDefinition {
                    type_hint: Some("array".to_string()),
                    name: "$items".to_string(),
                },
                ParameterDefinition {
                    type_hint: None,
                    name: "$offset".to_string(),
                },
            ],
            ..FunctionDefinition::default()
        };
        assert_eq!(f.parameter_source(), "array $items, $offset");
    }
}
