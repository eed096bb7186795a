//! Weaver facade
//!
//! One call takes a unit's raw text, its identity and modification
//! metadata, and returns the fully instrumented text or a fatal generation
//! error. Tokenizing, structural parsing, the filter pipeline and the
//! placeholder-completeness check run in sequence; there is no partial or
//! resumable weave state.
//!
//! A `Weaver` shares no mutable state across calls, so independent units
//! may be woven in parallel by independent instances.

use crate::entities::TypeDefinition;
use crate::error::WeaveError;
use crate::filters::{Pipeline, WeaveContext};
use crate::parser::structure;
use crate::parser::tokenizer;
use crate::placeholders;

/// Batch transformer for one unit at a time.
pub struct Weaver {
    pipeline: Pipeline,
}

impl Weaver {
    /// A weaver running the standard pass set.
    pub fn new() -> Self {
        Weaver {
            pipeline: Pipeline::standard(),
        }
    }

    /// A weaver over a custom pipeline.
    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Weaver { pipeline }
    }

    /// Parse the unit without rewriting it.
    pub fn parse(&self, source: &str) -> Result<TypeDefinition, WeaveError> {
        let tokens = tokenizer::tokenize(source);
        structure::parse_type(&tokens)
    }

    /// Weave one unit: returns the instrumented text, or aborts without
    /// emitting anything partially woven.
    pub fn weave(&self, source: &str, identity: &str, mtime: u64) -> Result<String, WeaveError> {
        let definition = self.parse(source)?;
        log::info!(
            "weaving `{}`: {} functions, {} attributes",
            identity,
            definition.functions.len(),
            definition.attributes.len()
        );

        let ctx = WeaveContext {
            definition: &definition,
            identity,
            mtime,
        };
        let woven = self.pipeline.run(source.to_string(), &ctx)?;

        // Pipeline-completeness invariant: a successful weave leaves no
        // marker behind.
        if let Some(marker) = placeholders::first_unresolved(&woven) {
            return Err(WeaveError::generation(
                identity,
                format!("unresolved placeholder {} after final pass", marker),
            ));
        }

        Ok(woven)
    }
}

impl Default for Weaver {
    fn default() -> Self {
        Weaver::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: &str = r#"<?php

/**
 * Counts upwards, never past its bound.
 *
 * @invariant $this->count >= 0
 * @invariant $this->count <= $this->bound
 */
class BoundedCounter
{
    protected $count = 0;

    protected $bound = 10;

    private $history = array();

    /**
     * @requires $step > 0
     * @ensures $dbcResult >= 0
     * @ensures $this->count == $dbcOld->count + $step
     */
    public function advance($step)
    {
        $this->history[] = $step;
        $this->count = $this->count + $step;
        return $this->count;
    }

    /**
     * @requires $this->count > 0
     */
    protected function rewind()
    {
        $this->count = $this->count - 1;
        return $this->count;
    }

    private function note($entry)
    {
        $this->history[] = $entry;
    }

    public static function capacity()
    {
        return 10;
    }
}
"#;

    fn woven_unit() -> String {
        Weaver::new().weave(UNIT, "/app/BoundedCounter.php", 99).unwrap()
    }

    #[test]
    fn weave_is_idempotent_for_identical_inputs() {
        let first = Weaver::new().weave(UNIT, "/app/BoundedCounter.php", 99).unwrap();
        let second = Weaver::new().weave(UNIT, "/app/BoundedCounter.php", 99).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn no_placeholder_survives_a_successful_weave() {
        assert_eq!(placeholders::first_unresolved(&woven_unit()), None);
    }

    #[test]
    fn entry_points_keep_their_visibility_and_originals_go_private() {
        let woven = woven_unit();
        assert!(woven.contains("public function advance($step)"));
        assert!(woven.contains("private function advanceDbcOriginal($step)"));
        assert!(woven.contains("protected function rewind()"));
        assert!(woven.contains("private function rewindDbcOriginal()"));
        assert!(woven.contains("public static function capacity()"));
        assert!(woven.contains("private static function capacityDbcOriginal()"));
        assert!(woven.contains("private function noteDbcOriginal($entry)"));
    }

    #[test]
    fn precondition_check_runs_before_the_original_body() {
        let woven = woven_unit();
        // Locate the advance wrapper and its parts.
        let wrapper_start = woven.find("public function advance($step)").unwrap();
        let wrapper = &woven[wrapper_start..];
        let check = wrapper.find("if (!(($step > 0)))").unwrap();
        let closure_call = wrapper.find("$dbcResult = $dbcFunctionClosure();").unwrap();
        let body_stmt = wrapper.find("$this->history[] = $step;").unwrap();
        assert!(check < closure_call);
        assert!(check < body_stmt);
        assert!(wrapper.contains("BrokenPreconditionException"));
        assert!(wrapper.contains("BoundedCounter::advance"));
    }

    #[test]
    fn old_snapshot_is_taken_before_the_call_and_postcondition_sees_it() {
        let woven = woven_unit();
        let wrapper_start = woven.find("public function advance($step)").unwrap();
        let wrapper = &woven[wrapper_start..];
        let snapshot = wrapper.find("$dbcOld = clone $this;").unwrap();
        let closure_call = wrapper.find("$dbcResult = $dbcFunctionClosure();").unwrap();
        let postcondition = wrapper
            .find("($dbcResult >= 0) && ($this->count == $dbcOld->count + $step)")
            .unwrap();
        assert!(snapshot < closure_call);
        assert!(closure_call < postcondition);
    }

    #[test]
    fn functions_without_old_reference_take_no_snapshot() {
        let woven = woven_unit();
        let wrapper_start = woven.find("protected function rewind()").unwrap();
        let wrapper_end = woven[wrapper_start..].find("return $dbcResult;").unwrap();
        let wrapper = &woven[wrapper_start..wrapper_start + wrapper_end];
        assert!(!wrapper.contains("clone $this"));
    }

    #[test]
    fn private_non_static_wrapper_skips_invariant_checks() {
        let woven = woven_unit();
        let wrapper_start = woven.find("private function note($entry)").unwrap();
        let wrapper_end = woven[wrapper_start..].find("return $dbcResult;").unwrap();
        let wrapper = &woven[wrapper_start..wrapper_start + wrapper_end];
        assert!(!wrapper.contains("dbcClassInvariant"));

        // Public wrappers check on entry and exit.
        let advance_start = woven.find("public function advance($step)").unwrap();
        let advance_end = woven[advance_start..].find("return $dbcResult;").unwrap();
        let advance = &woven[advance_start..advance_start + advance_end];
        assert_eq!(advance.matches("$this->dbcClassInvariant(__METHOD__)").count(), 2);
    }

    #[test]
    fn invariant_checks_only_fire_in_the_outermost_call() {
        let woven = woven_unit();
        // Every call site is guarded on the contract-entry flag, so an
        // invariant clause invoking an instrumented method cannot recurse.
        let calls = woven.matches("$this->dbcClassInvariant(__METHOD__)").count();
        let guarded = woven
            .matches("if ($dbcContractEntry === true && isset($this)) { $this->dbcClassInvariant(__METHOD__); }")
            .count();
        assert!(calls > 0);
        assert_eq!(calls, guarded);
    }

    #[test]
    fn accessor_metadata_reflects_original_visibility() {
        let woven = woven_unit();
        assert!(woven.contains("'count' => array('visibility' => 'protected', 'static' => false)"));
        assert!(woven.contains("'bound' => array('visibility' => 'protected', 'static' => false)"));
        assert!(!woven.contains("'history'"));
        assert!(woven.contains("private $count = 0;"));
        assert!(woven.contains("private $bound = 10;"));
    }

    #[test]
    fn weaving_a_unit_without_functions_is_structural_not_found() {
        let result = Weaver::new().weave("<?php class Empty {}", "Empty.php", 0);
        assert!(matches!(result, Err(WeaveError::StructuralNotFound(_))));
    }

    #[test]
    fn weaving_without_a_type_is_fatal() {
        let result = Weaver::new().weave("<?php function f() { return 1; }", "f.php", 0);
        assert!(matches!(result, Err(WeaveError::StructuralNotFound(_))));
    }

    #[test]
    fn user_defined_interception_hook_gets_logic_spliced_in() {
        let unit = r#"<?php
/**
 * @invariant $this->level >= 0
 */
class Meter
{
    protected $level = 0;

    public function __get($name)
    {
        return null;
    }

    public function bump()
    {
        $this->level = $this->level + 1;
        return $this->level;
    }
}
"#;
        let woven = Weaver::new().weave(unit, "Meter.php", 1).unwrap();
        // The user hook keeps its wrapper; the synthesized read logic runs
        // after the absorbed original call.
        let wrapper_start = woven.find("public function __get($name)").unwrap();
        let wrapper = &woven[wrapper_start..];
        let absorbed = wrapper.find("catch (\\Exception $dbcAbsorbed) {}").unwrap();
        let spliced = wrapper.find("$dbcAttribute = $this->dbcAttributes[$name];").unwrap();
        assert!(absorbed < spliced);
        // Only __set was synthesized from scratch.
        assert_eq!(woven.matches("public function __set($name, $value)").count(), 1);
        assert_eq!(placeholders::first_unresolved(&woven), None);
    }
}
