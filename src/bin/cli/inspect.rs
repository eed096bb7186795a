//! Inspect command: show what the parser recovered from a unit

use std::fs;
use std::path::Path;

use dbc_weave::Weaver;

use crate::cli::output::OutputFormat;

/// Parse a unit and print its recovered structure without weaving it.
/// Returns the process exit code.
pub fn handle_inspect(path: &Path, format: OutputFormat) -> i32 {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: could not read {}: {}", path.display(), e);
            return 1;
        }
    };

    let definition = match Weaver::new().parse(&source) {
        Ok(definition) => definition,
        Err(e) => {
            eprintln!("Error: {}: {}", path.display(), e);
            return 1;
        }
    };

    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&definition) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: serialization failed: {}", e);
                return 1;
            }
        },
        OutputFormat::Human => {
            println!("type {}", definition.name);
            if let Some(parent) = &definition.parent {
                println!("  extends {}", parent);
            }
            let clauses = definition.invariant_expressions().count();
            if clauses > 0 {
                println!("  {} invariant clause(s)", clauses);
            }
            for attribute in &definition.attributes {
                println!(
                    "  attribute {} {}{}{}",
                    attribute.visibility.as_str(),
                    attribute.name,
                    if attribute.is_static { " (static)" } else { "" },
                    if attribute.in_invariant { " [invariant]" } else { "" },
                );
            }
            for function in &definition.functions {
                println!(
                    "  function {} {}({}){}{}",
                    function.visibility.as_str(),
                    function.name,
                    function.parameter_source(),
                    if function.is_static { " (static)" } else { "" },
                    if function.is_abstract { " (abstract)" } else { "" },
                );
                for pre in function.preconditions.iter() {
                    println!("    requires {}", pre);
                }
                for post in function.postconditions.iter() {
                    println!("    ensures  {}", post);
                }
            }
        }
    }

    0
}
