//! Placeholder markers exchanged between pipeline passes
//!
//! Earlier passes leave markers in the unit text; later passes resolve them.
//! Markers are typed values with a single canonical rendering, so passes
//! never spell marker text by hand and the weaver can verify completeness
//! (zero markers left) against the same definition the passes used.

use std::fmt;

use regex::Regex;

/// Opening delimiter shared by every rendered marker.
const MARKER_OPEN: &str = "/* DBC_";

/// Closing delimiter shared by every rendered marker.
const MARKER_CLOSE: &str = " */";

/// A named insertion point in partially woven text.
///
/// The qualified variants carry the name of the function they belong to, so
/// one pass run can address each function's slot individually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Anchor right after the type's opening brace; all structure-body
    /// injections hang off it.
    FunctionHook,
    /// Slot for a function's precondition check.
    Precondition(String),
    /// Slot for a function's old-state snapshot statement.
    OldSetup(String),
    /// Slot for a function's postcondition check.
    Postcondition(String),
    /// Slot for an invariant-check call.
    Invariant,
    /// Slot inside an interception hook (`__get`/`__set`) where the
    /// synthesized accessor logic is spliced in.
    MethodInject(String),
}

impl Marker {
    fn kind(&self) -> &'static str {
        match self {
            Marker::FunctionHook => "FUNCTION_HOOK",
            Marker::Precondition(_) => "PRECONDITION",
            Marker::OldSetup(_) => "OLD_SETUP",
            Marker::Postcondition(_) => "POSTCONDITION",
            Marker::Invariant => "INVARIANT",
            Marker::MethodInject(_) => "METHOD_INJECT",
        }
    }

    fn qualifier(&self) -> Option<&str> {
        match self {
            Marker::Precondition(name)
            | Marker::OldSetup(name)
            | Marker::Postcondition(name)
            | Marker::MethodInject(name) => Some(name),
            Marker::FunctionHook | Marker::Invariant => None,
        }
    }

    /// The literal text this marker occupies in the unit.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier() {
            Some(name) => write!(
                f,
                "{}{}_PLACEHOLDER {}{}",
                MARKER_OPEN,
                self.kind(),
                name,
                MARKER_CLOSE
            ),
            None => write!(f, "{}{}_PLACEHOLDER{}", MARKER_OPEN, self.kind(), MARKER_CLOSE),
        }
    }
}

/// Returns the first unresolved marker occurrence in `text`, if any.
///
/// Used by the weaver for the pipeline-completeness invariant: a successful
/// weave may not leave a single marker behind.
pub fn first_unresolved(text: &str) -> Option<String> {
    // Matches every rendering `render()` can produce.
    let re = Regex::new(r"/\* DBC_[A-Z_]+_PLACEHOLDER(?: [^*]*)?\*/")
        .expect("marker pattern is statically valid");
    re.find(text).map(|m| m.as_str().to_string())
}
