//! # dbc-weave
//!
//! A Design-by-Contract weaver for PHP-like source units.
//!
//! This crate provides:
//! - A structural parser that recovers class/function/attribute definitions
//!   and their contract annotations (`@requires`, `@ensures`, `@invariant`)
//!   from a raw token stream
//! - An ordered, dependency-aware filter pipeline that rewrites the unit so
//!   every public/protected entry point checks the invariant, its
//!   preconditions, runs the original body, then checks postconditions
//!   (with access to a pre-call "old" snapshot) and the invariant again
//! - A cache collaborator for the woven output, and a CLI (`dbc-weave`)
//!
//! ## Usage
//!
//! ```no_run
//! use dbc_weave::Weaver;
//!
//! let source = std::fs::read_to_string("src/BoundedStack.php").unwrap();
//! let woven = Weaver::new()
//!     .weave(&source, "src/BoundedStack.php", 1_700_000_000)
//!     .unwrap();
//! ```
//!
//! The woven text preserves every original call signature; contract
//! failures in the running program surface as `\Dbc\Broken*Exception`
//! throws carrying the failing expression and the method identity.

pub mod cache;
pub mod constants;
pub mod entities;
pub mod error;
pub mod filters;
pub mod parser;
pub mod placeholders;
pub mod synthesis;
pub mod weaver;

pub use cache::WeaveCache;
pub use entities::{
    AssertionList, AttributeDefinition, FunctionDefinition, ParameterDefinition, TypeDefinition,
    Visibility,
};
pub use error::WeaveError;
pub use filters::{Pass, Pipeline, WeaveContext};
pub use weaver::Weaver;
