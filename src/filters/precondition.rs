//! Precondition pass
//!
//! Resolves each function's precondition placeholder into a conjunction of
//! its precondition assertions. A failing conjunction raises a
//! precondition-tagged assertion failure carrying the expression text and
//! the function identity. Functions without preconditions get their
//! placeholder removed; an empty list is no constraint.

use crate::error::WeaveError;
use crate::filters::{Pass, WeaveContext};
use crate::placeholders::Marker;
use crate::synthesis;

pub struct PreconditionPass;

impl Pass for PreconditionPass {
    fn name(&self) -> &'static str {
        "precondition"
    }

    fn order(&self) -> u32 {
        1
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["skeleton"]
    }

    fn run(&self, text: String, ctx: &WeaveContext<'_>) -> Result<String, WeaveError> {
        let mut text = text;
        for function in &ctx.definition.functions {
            if function.is_abstract {
                continue;
            }
            let marker = Marker::Precondition(function.name.clone()).render();
            let check = synthesis::precondition_block(function, &ctx.definition.name);
            text = text.replace(&marker, &check);
        }
        Ok(text)
    }
}
