//! Postcondition pass
//!
//! Resolves each function's postcondition placeholder. Assertion text may
//! reference the just-computed result and the old-state snapshot, both
//! bound earlier in the wrapper; failures are postcondition-tagged and
//! carry the expression text and the function identity.

use crate::error::WeaveError;
use crate::filters::{Pass, WeaveContext};
use crate::placeholders::Marker;
use crate::synthesis;

pub struct PostconditionPass;

impl Pass for PostconditionPass {
    fn name(&self) -> &'static str {
        "postcondition"
    }

    fn order(&self) -> u32 {
        2
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["precondition", "old-state"]
    }

    fn run(&self, text: String, ctx: &WeaveContext<'_>) -> Result<String, WeaveError> {
        let mut text = text;
        for function in &ctx.definition.functions {
            if function.is_abstract {
                continue;
            }
            let marker = Marker::Postcondition(function.name.clone()).render();
            let check = synthesis::postcondition_block(function, &ctx.definition.name);
            text = text.replace(&marker, &check);
        }
        Ok(text)
    }
}
