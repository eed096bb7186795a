//! Skeleton pass
//!
//! First pass of every weave. Embeds the provenance hint, plants the
//! function hook right after the type's opening delimiter, injects the
//! relocation constants, and rewrites each known function into its wrapped
//! form: the original implementation is renamed (suffixed, forced private)
//! and a new entry point with the same signature is synthesized, carrying
//! the placeholders every later pass resolves.

use regex::Regex;

use crate::constants::{DIR_SUBSTITUTE, FILE_SUBSTITUTE, ORIGINAL_FUNCTION_SUFFIX};
use crate::error::WeaveError;
use crate::filters::{Pass, WeaveContext};
use crate::parser::tokenizer::{tokenize, TokenKind};
use crate::placeholders::Marker;
use crate::synthesis;

pub struct SkeletonPass;

impl Pass for SkeletonPass {
    fn name(&self) -> &'static str {
        "skeleton"
    }

    fn order(&self) -> u32 {
        0
    }

    fn run(&self, text: String, ctx: &WeaveContext<'_>) -> Result<String, WeaveError> {
        let mut text = text;

        // Provenance: original path and modification time, right after the
        // open tag.
        text = text.replacen(
            "<?php",
            &format!("<?php {}", synthesis::provenance_comment(ctx.identity, ctx.mtime)),
            1,
        );

        // Everything injected into the structure body hangs off the hook.
        let anchor = type_opening_anchor(&text)
            .ok_or_else(|| WeaveError::generation(ctx.identity, "no type-opening delimiter found"))?;
        let hook = Marker::FunctionHook.render();
        text = text.replacen(&anchor, &format!("{}{}", anchor, hook), 1);

        // Relocation constants substitute for __DIR__/__FILE__ once the
        // unit is served from somewhere else.
        text = text.replacen(
            &hook,
            &format!("{}{}", hook, synthesis::relocation_constants(ctx.identity)),
            1,
        );

        // Wrap every known function. Abstract functions keep their bare
        // declaration; there is nothing to proxy.
        for function in &ctx.definition.functions {
            if function.is_abstract {
                continue;
            }

            let signature = Regex::new(&format!(
                r"(?:(?:public|protected|private|static|final)\s+)*function\s+{}\s*\(",
                regex::escape(&function.name)
            ))
            .map_err(|e| WeaveError::generation(ctx.identity, e.to_string()))?;
            if !signature.is_match(&text) {
                return Err(WeaveError::generation(
                    ctx.identity,
                    format!("signature of `{}` not found for renaming", function.name),
                ));
            }
            let renamed = if function.is_static {
                format!("private static function {}{}(", function.name, ORIGINAL_FUNCTION_SUFFIX)
            } else {
                format!("private function {}{}(", function.name, ORIGINAL_FUNCTION_SUFFIX)
            };
            text = signature.replacen(&text, 1, renamed.as_str()).into_owned();

            text = text.replacen(&hook, &format!("{}{}", hook, synthesis::wrapper(function)), 1);
        }

        // Last, so wrapper bodies lifted from the original text are
        // covered too.
        text = text.replace("__DIR__", &format!("self::{}", DIR_SUBSTITUTE));
        text = text.replace("__FILE__", &format!("self::{}", FILE_SUBSTITUTE));

        Ok(text)
    }
}

/// The literal source text of the type header, from the `class` keyword
/// through its opening brace. Serves as the anchor the function hook is
/// planted behind.
fn type_opening_anchor(text: &str) -> Option<String> {
    let tokens = tokenize(text);
    let class_idx = tokens
        .iter()
        .position(|t| t.is_kind(TokenKind::Class) || t.is_kind(TokenKind::Interface))?;

    let mut anchor = String::new();
    let mut closed = false;
    for token in &tokens[class_idx..] {
        token.write_text(&mut anchor);
        if token.is_atom('{') {
            closed = true;
            break;
        }
    }
    if closed {
        Some(anchor)
    } else {
        None
    }
}
