//! Definition entities recovered by the structural parser
//!
//! This module contains:
//! - `definitions`: type, attribute, function and parameter definitions
//! - `assertions`: ordered collections of contract assertion expressions

pub mod assertions;
pub mod definitions;

pub use assertions::AssertionList;
pub use definitions::{
    AttributeDefinition, FunctionDefinition, ParameterDefinition, TypeDefinition, Visibility,
};
