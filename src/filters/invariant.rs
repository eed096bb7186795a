//! Invariant pass
//!
//! Final pass. Synthesizes the invariant-check method, resolves every
//! invariant placeholder into a guarded call to it, and — when the type
//! supports dynamic access — demotes the instrumented attributes to
//! private and generates the metadata table plus the `__get`/`__set`
//! interception accessors that enforce the original visibility rules.
//! Removes the function hook once the last injection is done.

use regex::Regex;

use crate::error::WeaveError;
use crate::filters::{Pass, WeaveContext};
use crate::placeholders::Marker;
use crate::synthesis;

pub struct InvariantPass;

impl Pass for InvariantPass {
    fn name(&self) -> &'static str {
        "invariant"
    }

    fn order(&self) -> u32 {
        3
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["skeleton"]
    }

    fn run(&self, text: String, ctx: &WeaveContext<'_>) -> Result<String, WeaveError> {
        let definition = ctx.definition;
        let hook = Marker::FunctionHook.render();
        let mut text = text;

        if definition.supports_dynamic_access() {
            // Direct field access on instrumented attributes must go
            // through the accessors; the declarations become private.
            for attribute in definition.attributes.iter().filter(|a| a.is_intercepted()) {
                let declaration = Regex::new(&format!(
                    r"(?:public|protected)(\s+(?:static\s+)?)({}\b)",
                    regex::escape(&attribute.name)
                ))
                .map_err(|e| WeaveError::generation(ctx.identity, e.to_string()))?;
                text = declaration.replacen(&text, 1, "private${1}${2}").into_owned();
            }

            text = text.replacen(
                &hook,
                &format!("{}{}", hook, synthesis::attribute_storage(&definition.attributes)),
                1,
            );

            // A user-defined hook gets the accessor logic spliced into its
            // wrapper; otherwise a complete accessor method is generated.
            if definition.function("__set").is_some() {
                text = text.replace(
                    &Marker::MethodInject("__set".to_string()).render(),
                    &synthesis::setter(definition, true),
                );
            } else {
                text = text.replacen(
                    &hook,
                    &format!("{}{}", hook, synthesis::setter(definition, false)),
                    1,
                );
            }
            if definition.function("__get").is_some() {
                text = text.replace(
                    &Marker::MethodInject("__get".to_string()).render(),
                    &synthesis::getter(definition, true),
                );
            } else {
                text = text.replacen(
                    &hook,
                    &format!("{}{}", hook, synthesis::getter(definition, false)),
                    1,
                );
            }
        } else {
            // No metadata table, no interception; any inject slots left by
            // user-defined hooks are consumed.
            text = text.replace(&Marker::MethodInject("__set".to_string()).render(), "");
            text = text.replace(&Marker::MethodInject("__get".to_string()).render(), "");
        }

        // The check method exists even without clauses so every call site
        // resolves.
        text = text.replacen(
            &hook,
            &format!("{}{}", hook, synthesis::invariant_method(definition)),
            1,
        );

        // Resolve every invariant slot, including the ones inside the
        // just-inserted accessors.
        text = text.replace(&Marker::Invariant.render(), &synthesis::invariant_call());

        // The hook has served its purpose.
        text = text.replacen(&hook, "", 1);

        Ok(text)
    }
}
