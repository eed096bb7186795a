//! Code synthesizer
//!
//! Pure functions that render the fragments the pipeline passes splice into
//! the unit text: wrapper skeletons, contract-check blocks, the
//! invariant-check method, property-interception accessors and the
//! provenance/relocation constants. Nothing here touches the unit text
//! itself; passes decide where fragments land.

use crate::constants::{
    ATTRIBUTE_STORAGE, CLASS_INVARIANT_NAME, CLOSURE_VARIABLE, CONTRACT_CONTEXT, DIR_SUBSTITUTE,
    FAILURE_VARIABLE, FILE_SUBSTITUTE, KEYWORD_RESULT, ORIGINAL_PATH_HINT, RUNTIME_NAMESPACE,
};
use crate::entities::{AssertionList, AttributeDefinition, FunctionDefinition, TypeDefinition};
use crate::placeholders::Marker;

/// Provenance comment embedded right after the unit-open marker, carrying
/// the original path and its modification time.
pub fn provenance_comment(identity: &str, mtime: u64) -> String {
    format!(
        "/* {hint} {identity}#{mtime} {hint} */",
        hint = ORIGINAL_PATH_HINT,
        identity = identity,
        mtime = mtime
    )
}

/// Class constants substituting `__DIR__` and `__FILE__` so relocated
/// output keeps resolving paths against the original location.
pub fn relocation_constants(identity: &str) -> String {
    let dir = match identity.rfind('/') {
        Some(pos) if pos > 0 => &identity[..pos],
        _ => ".",
    };
    format!(
        "\n    /**\n     * @const string\n     */\n    const {} = '{}';\n\n    /**\n     * @const string\n     */\n    const {} = '{}';\n",
        DIR_SUBSTITUTE,
        quote(dir),
        FILE_SUBSTITUTE,
        quote(identity)
    )
}

/// The signature of the synthesized public/protected entry point. The
/// original call signature is preserved.
pub fn entry_header(function: &FunctionDefinition) -> String {
    let mut header = String::new();
    if function.is_final {
        header.push_str("final ");
    }
    header.push_str(function.visibility.as_str());
    header.push(' ');
    if function.is_static {
        header.push_str("static ");
    }
    header.push_str("function ");
    header.push_str(&function.name);
    header.push('(');
    header.push_str(&function.parameter_source());
    header.push(')');
    header
}

/// The zero-argument closure header rebinding the original body.
/// Parameters are captured by reference so mutations stay visible.
fn closure_header(function: &FunctionDefinition) -> String {
    if function.parameters.is_empty() {
        return "function ()".to_string();
    }
    let captures = function
        .parameters
        .iter()
        .map(|p| format!("&{}", p.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("function () use ({})", captures)
}

/// Render the skeleton wrapper replacing a function's original entry
/// point. The original implementation has already been renamed; the
/// wrapper opens a contract context, leaves the check placeholders for the
/// later passes, runs the body as a closure and returns its result.
pub fn wrapper(function: &FunctionDefinition) -> String {
    let body = function.body.as_deref().unwrap_or_default();
    let mut code = String::new();

    code.push_str("\n    ");
    code.push_str(&entry_header(function));
    code.push_str("\n    {\n        ");
    code.push_str(&format!(
        "{} = {}\\ContractContext::open();\n",
        CONTRACT_CONTEXT, RUNTIME_NAMESPACE
    ));

    if function.needs_invariant_checks() {
        code.push_str("        ");
        code.push_str(&Marker::Invariant.render());
        code.push('\n');
    }

    code.push_str("        ");
    code.push_str(&Marker::Precondition(function.name.clone()).render());
    code.push_str("\n        ");
    code.push_str(&Marker::OldSetup(function.name.clone()).render());
    code.push('\n');

    // Interception hooks absorb the original outcome so the synthesized
    // accessor logic runs regardless of it.
    if function.is_interception_hook() {
        code.push_str("        try {\n");
    }

    code.push_str("        ");
    code.push_str(&format!(
        "{} = {} {{{}}};\n",
        CLOSURE_VARIABLE,
        closure_header(function),
        body
    ));
    code.push_str("        ");
    code.push_str(&format!("{} = {}();\n", KEYWORD_RESULT, CLOSURE_VARIABLE));

    if function.is_interception_hook() {
        code.push_str("        } catch (\\Exception $dbcAbsorbed) {}\n        ");
        code.push_str(&Marker::MethodInject(function.name.clone()).render());
        code.push('\n');
    }

    code.push_str("        ");
    code.push_str(&Marker::Postcondition(function.name.clone()).render());
    code.push('\n');

    if function.needs_invariant_checks() {
        code.push_str("        ");
        code.push_str(&Marker::Invariant.render());
        code.push('\n');
    }

    code.push_str("        ");
    code.push_str(&close_context());
    code.push_str("\n        ");
    code.push_str(&format!("return {};\n    }}\n", KEYWORD_RESULT));

    code
}

/// The precondition check substituted for a function's precondition
/// placeholder; empty when the function declares no preconditions.
pub fn precondition_block(function: &FunctionDefinition, type_name: &str) -> String {
    check_block(
        &function.preconditions,
        "precondition",
        "BrokenPreconditionException",
        &format!("{}::{}", type_name, function.name),
    )
}

/// The postcondition check; the assertion text may reference the result
/// and old-state variables bound earlier in the wrapper.
pub fn postcondition_block(function: &FunctionDefinition, type_name: &str) -> String {
    check_block(
        &function.postconditions,
        "postcondition",
        "BrokenPostconditionException",
        &format!("{}::{}", type_name, function.name),
    )
}

/// The old-state snapshot statement, cloning the current instance into
/// the dedicated slot before the original body runs.
pub fn old_snapshot() -> String {
    format!("{} = clone $this;", crate::constants::KEYWORD_OLD)
}

/// One conjunction check: evaluate all assertions together, report the
/// combined expression text on failure, closing the contract context
/// before propagating.
fn check_block(assertions: &AssertionList, tag: &str, exception: &str, identity: &str) -> String {
    let conjunction = match assertions.conjunction() {
        Some(c) => c,
        None => return String::new(),
    };
    format!(
        "if (!({cond})) {{\n            {failure} = '{text}';\n            {close}\n            throw new {ns}\\{exception}('broken {tag} ' . {failure} . ' in {identity}');\n        }}",
        cond = conjunction,
        failure = FAILURE_VARIABLE,
        text = conjunction.replace('\'', "\""),
        close = close_context(),
        ns = RUNTIME_NAMESPACE,
        exception = exception,
        tag = tag,
        identity = identity
    )
}

/// The guarded invariant-check call substituted for every invariant
/// placeholder.
///
/// Two guards: the contract-entry flag keeps nested instrumented calls
/// (including ones made from inside contract checks) from re-running the
/// invariant, and `isset($this)` keeps static wrappers from dereferencing
/// an instance they do not have.
pub fn invariant_call() -> String {
    format!(
        "if ({} === true && isset($this)) {{ $this->{}(__METHOD__); }}",
        CONTRACT_CONTEXT, CLASS_INVARIANT_NAME
    )
}

/// The invariant-check method aggregating every invariant clause list.
/// Emitted even when no clauses exist, so wrapper call sites always
/// resolve.
pub fn invariant_method(definition: &TypeDefinition) -> String {
    let mut code = format!(
        "\n    protected function {}($dbcCallingMethod)\n    {{\n",
        CLASS_INVARIANT_NAME
    );
    for list in &definition.invariants {
        if let Some(conjunction) = list.conjunction() {
            code.push_str(&format!(
                "        if (!({cond})) {{\n            {failure} = '{text}';\n            {ns}\\ContractContext::close();\n            throw new {ns}\\BrokenInvariantException('broken invariant ' . {failure} . ' in ' . $dbcCallingMethod);\n        }}\n",
                cond = conjunction,
                failure = FAILURE_VARIABLE,
                text = conjunction.replace('\'', "\""),
                ns = RUNTIME_NAMESPACE
            ));
        }
    }
    code.push_str("    }\n");
    code
}

/// The metadata table mediating external access to instrumented
/// attributes: name, original visibility and static-ness. Private
/// attributes never enter the table.
pub fn attribute_storage(attributes: &[AttributeDefinition]) -> String {
    let mut code = format!(
        "\n    /**\n     * @var array\n     */\n    private ${} = array(\n",
        ATTRIBUTE_STORAGE
    );
    for attribute in attributes.iter().filter(|a| a.is_intercepted()) {
        code.push_str(&format!(
            "        '{}' => array('visibility' => '{}', 'static' => {}),\n",
            attribute.bare_name(),
            attribute.visibility.as_str(),
            attribute.is_static
        ));
    }
    code.push_str("    );\n");
    code
}

/// The write-interception accessor. `injected` renders only the body, for
/// splicing into a user-defined `__set` wrapper; otherwise a complete
/// method is produced.
pub fn setter(definition: &TypeDefinition, injected: bool) -> String {
    let mut code = String::new();
    if !injected {
        code.push_str(
            "\n    /**\n     * Forwards writing property access if within visibility boundaries.\n     */\n    public function __set($name, $value)\n    {\n",
        );
    }

    code.push_str(&format!(
        "        {} = {}\\ContractContext::open();\n",
        CONTRACT_CONTEXT, RUNTIME_NAMESPACE
    ));
    code.push_str(&format!(
        "        if (!isset($this->{}[$name])) {{\n",
        ATTRIBUTE_STORAGE
    ));
    if definition.has_parent() {
        code.push_str(&format!(
            "            {}\n            return parent::__set($name, $value);\n",
            close_context()
        ));
    } else {
        code.push_str(&unknown_property_block());
    }
    code.push_str("        }\n");

    code.push_str("        ");
    code.push_str(&Marker::Invariant.render());
    code.push('\n');

    code.push_str(&format!(
        "        $dbcAttribute = $this->{}[$name];\n",
        ATTRIBUTE_STORAGE
    ));
    code.push_str("        switch ($dbcAttribute['visibility']) {\n");
    code.push_str(&format!(
        "            case 'protected':\n                if (is_subclass_of(get_called_class(), __CLASS__)) {{\n                    $this->$name = $value;\n                }} else {{\n                    {close}\n                    throw new \\InvalidArgumentException(\"Cannot write protected property $name from outside \" . __CLASS__);\n                }}\n                break;\n",
        close = close_context()
    ));
    code.push_str("            case 'public':\n                $this->$name = $value;\n                break;\n");
    code.push_str(&format!(
        "            default:\n                {close}\n                throw new \\InvalidArgumentException(\"Cannot write property $name of \" . __CLASS__);\n        }}\n",
        close = close_context()
    ));

    // The invariant is re-checked after every write.
    code.push_str("        ");
    code.push_str(&Marker::Invariant.render());
    code.push('\n');
    code.push_str(&format!("        {}\n", close_context()));

    if !injected {
        code.push_str("    }\n");
    }
    code
}

/// The read-interception accessor; reads do not change state, so no
/// contract context or invariant re-check is involved.
pub fn getter(definition: &TypeDefinition, injected: bool) -> String {
    let mut code = String::new();
    if !injected {
        code.push_str(
            "\n    /**\n     * Forwards reading property access if within visibility boundaries.\n     */\n    public function __get($name)\n    {\n",
        );
    }

    code.push_str(&format!(
        "        if (!isset($this->{}[$name])) {{\n",
        ATTRIBUTE_STORAGE
    ));
    if definition.has_parent() {
        code.push_str("            return parent::__get($name);\n");
    } else {
        code.push_str(&format!(
            "            if (property_exists($this, $name)) {{\n                throw new \\InvalidArgumentException(\"Cannot read property $name of \" . __CLASS__);\n            }} else {{\n                throw new {ns}\\MissingPropertyException(\"Property $name does not exist in \" . __CLASS__);\n            }}\n",
            ns = RUNTIME_NAMESPACE
        ));
    }
    code.push_str("        }\n");

    code.push_str(&format!(
        "        $dbcAttribute = $this->{}[$name];\n",
        ATTRIBUTE_STORAGE
    ));
    code.push_str("        switch ($dbcAttribute['visibility']) {\n");
    code.push_str(
        "            case 'protected':\n                if (is_subclass_of(get_called_class(), __CLASS__)) {\n                    return $this->$name;\n                }\n                throw new \\InvalidArgumentException(\"Cannot read protected property $name from outside \" . __CLASS__);\n",
    );
    code.push_str("            case 'public':\n                return $this->$name;\n");
    code.push_str(
        "            default:\n                throw new \\InvalidArgumentException(\"Cannot read property $name of \" . __CLASS__);\n        }\n",
    );

    if !injected {
        code.push_str("    }\n");
    }
    code
}

fn unknown_property_block() -> String {
    format!(
        "            if (property_exists($this, $name)) {{\n                {close}\n                throw new \\InvalidArgumentException(\"Cannot write property $name of \" . __CLASS__);\n            }} else {{\n                {close}\n                throw new {ns}\\MissingPropertyException(\"Property $name does not exist in \" . __CLASS__);\n            }}\n",
        close = close_context(),
        ns = RUNTIME_NAMESPACE
    )
}

fn close_context() -> String {
    format!(
        "if ({}) {{ {}\\ContractContext::close(); }}",
        CONTRACT_CONTEXT, RUNTIME_NAMESPACE
    )
}

/// Escape a string for embedding into single-quoted host source.
fn quote(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ParameterDefinition, Visibility};

    fn sample_function() -> FunctionDefinition {
        let mut f = FunctionDefinition {
            name: "push".to_string(),
            visibility: Visibility::Public,
            parameters: vec![ParameterDefinition {
                type_hint: None,
                name: "$element".to_string(),
            }],
            body: Some(" $this->size++; ".to_string()),
            ..FunctionDefinition::default()
        };
        f.preconditions.push("$this->size < $this->capacity".to_string());
        f
    }

    #[test]
    fn wrapper_orders_checks_around_the_closure_call() {
        let code = wrapper(&sample_function());
        let pre = code.find("DBC_PRECONDITION_PLACEHOLDER").unwrap();
        let old = code.find("DBC_OLD_SETUP_PLACEHOLDER").unwrap();
        let call = code.find("$dbcResult = $dbcFunctionClosure();").unwrap();
        let post = code.find("DBC_POSTCONDITION_PLACEHOLDER").unwrap();
        let ret = code.find("return $dbcResult;").unwrap();
        assert!(pre < old && old < call && call < post && post < ret);
    }

    #[test]
    fn wrapper_preserves_signature_and_visibility() {
        let code = wrapper(&sample_function());
        assert!(code.contains("public function push($element)"));
    }

    #[test]
    fn interception_hooks_absorb_the_original_outcome() {
        let hook = FunctionDefinition {
            name: "__get".to_string(),
            parameters: vec![ParameterDefinition {
                type_hint: None,
                name: "$name".to_string(),
            }],
            body: Some("return null;".to_string()),
            ..FunctionDefinition::default()
        };
        let code = wrapper(&hook);
        assert!(code.contains("try {"));
        assert!(code.contains("catch (\\Exception $dbcAbsorbed) {}"));
        assert!(code.contains("DBC_METHOD_INJECT_PLACEHOLDER __get"));

        // Ordinary functions get neither the guard nor the inject slot.
        let plain = wrapper(&sample_function());
        assert!(!plain.contains("try {"));
        assert!(!plain.contains("DBC_METHOD_INJECT_PLACEHOLDER"));
    }

    #[test]
    fn check_block_reports_the_conjunction_text() {
        let f = sample_function();
        let code = precondition_block(&f, "BoundedStack");
        assert!(code.contains("if (!(($this->size < $this->capacity)))"));
        assert!(code.contains("$dbcFailureMessage = '($this->size < $this->capacity)';"));
        assert!(code.contains("BrokenPreconditionException"));
        assert!(code.contains("BoundedStack::push"));
    }

    #[test]
    fn empty_assertion_list_renders_no_check() {
        let mut f = sample_function();
        f.preconditions = AssertionList::new();
        assert!(precondition_block(&f, "BoundedStack").is_empty());
    }

    #[test]
    fn invariant_method_aggregates_clause_lists() {
        let mut definition = TypeDefinition {
            name: "BoundedStack".to_string(),
            ..TypeDefinition::default()
        };
        let mut list = AssertionList::new();
        list.push("$this->size >= 0".to_string());
        list.push("$this->size <= $this->capacity".to_string());
        definition.invariants.push(list);

        let code = invariant_method(&definition);
        assert!(code.contains("protected function dbcClassInvariant"));
        assert!(code.contains("($this->size >= 0) && ($this->size <= $this->capacity)"));
        assert!(code.contains("BrokenInvariantException"));
    }

    #[test]
    fn storage_lists_only_intercepted_attributes() {
        let attributes = vec![
            AttributeDefinition {
                name: "$size".to_string(),
                visibility: Visibility::Protected,
                is_static: false,
                in_invariant: true,
            },
            AttributeDefinition {
                name: "$items".to_string(),
                visibility: Visibility::Private,
                is_static: false,
                in_invariant: true,
            },
            AttributeDefinition {
                name: "$label".to_string(),
                visibility: Visibility::Public,
                is_static: false,
                in_invariant: false,
            },
        ];
        let code = attribute_storage(&attributes);
        assert!(code.contains("'size' => array('visibility' => 'protected', 'static' => false)"));
        assert!(!code.contains("'items'"));
        assert!(!code.contains("'label'"));
    }

    #[test]
    fn accessors_delegate_to_parent_when_one_exists() {
        let with_parent = TypeDefinition {
            name: "Child".to_string(),
            parent: Some("Base".to_string()),
            ..TypeDefinition::default()
        };
        assert!(setter(&with_parent, false).contains("parent::__set($name, $value)"));
        assert!(getter(&with_parent, false).contains("parent::__get($name)"));

        let root = TypeDefinition {
            name: "Root".to_string(),
            ..TypeDefinition::default()
        };
        assert!(setter(&root, false).contains("MissingPropertyException"));
        assert!(getter(&root, false).contains("MissingPropertyException"));
    }

    #[test]
    fn setter_rechecks_the_invariant_after_writing() {
        let definition = TypeDefinition::default();
        let code = setter(&definition, false);
        let write = code.find("$this->$name = $value;").unwrap();
        let last_marker = code.rfind("DBC_INVARIANT_PLACEHOLDER").unwrap();
        assert!(last_marker > write);
        assert!(code.contains("is_subclass_of(get_called_class(), __CLASS__)"));
    }
}
