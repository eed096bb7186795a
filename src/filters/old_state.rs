//! Old-state capture pass
//!
//! For functions whose doc-comment references the old-state keyword, a
//! snapshot statement cloning the current instance is inserted before the
//! original call, making the pre-call state available to postcondition
//! text. Static functions have no instance to snapshot; their placeholder
//! is removed.

use crate::error::WeaveError;
use crate::filters::{Pass, WeaveContext};
use crate::placeholders::Marker;
use crate::synthesis;

pub struct OldStatePass;

impl Pass for OldStatePass {
    fn name(&self) -> &'static str {
        "old-state"
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
            let marker = Marker::OldSetup(function.name.clone()).render();
            let snapshot = if function.uses_old && !function.is_static {
                synthesis::old_snapshot()
            } else {
                String::new()
            };
            text = text.replace(&marker, &snapshot);
        }
        Ok(text)
    }
}
