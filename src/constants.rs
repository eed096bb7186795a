//! Identifiers and keywords shared between the parser and the generated code
//!
//! Everything the woven output references by name lives here, so that the
//! passes, the synthesizer and the tests agree on a single spelling.

/// Annotation keyword opening a precondition clause in a doc-comment.
pub const KEYWORD_PRE: &str = "@requires";

/// Annotation keyword opening a postcondition clause in a doc-comment.
pub const KEYWORD_POST: &str = "@ensures";

/// Annotation keyword opening an invariant clause in a type's doc-comment.
pub const KEYWORD_INVARIANT: &str = "@invariant";

/// Variable holding the pre-call state snapshot, available to postconditions.
pub const KEYWORD_OLD: &str = "$dbcOld";

/// Variable holding the original body's return value, available to postconditions.
pub const KEYWORD_RESULT: &str = "$dbcResult";

/// Variable holding the result of opening the contract context.
///
/// `true` only in the outermost instrumented call; invariant checks are
/// guarded on it to stop recursive re-evaluation.
pub const CONTRACT_CONTEXT: &str = "$dbcContractEntry";

/// Variable the failing assertion text is assigned to before raising.
pub const FAILURE_VARIABLE: &str = "$dbcFailureMessage";

/// Variable the original body is rebound to as a zero-argument closure.
pub const CLOSURE_VARIABLE: &str = "$dbcFunctionClosure";

/// Name of the generated per-instance attribute metadata table.
pub const ATTRIBUTE_STORAGE: &str = "dbcAttributes";

/// Name of the generated invariant-check method.
pub const CLASS_INVARIANT_NAME: &str = "dbcClassInvariant";

/// Suffix appended to the renamed original implementation of a function.
pub const ORIGINAL_FUNCTION_SUFFIX: &str = "DbcOriginal";

/// Class constant substituted for `__DIR__` in relocated output.
pub const DIR_SUBSTITUTE: &str = "DBC_DIR_SUBSTITUTE";

/// Class constant substituted for `__FILE__` in relocated output.
pub const FILE_SUBSTITUTE: &str = "DBC_FILE_SUBSTITUTE";

/// Delimiter around the provenance hint embedded after the open tag.
pub const ORIGINAL_PATH_HINT: &str = "DBC_ORIGINAL_PATH_HINT";

/// Namespace of the runtime support classes the generated code calls into.
pub const RUNTIME_NAMESPACE: &str = "\\Dbc";
