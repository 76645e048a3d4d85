//! Parser for module source code.
//!
//! Transforms a stream of tokens into an Abstract Syntax Tree (AST).
//!
//! ## Precedence (lowest to highest)
//!
//! | Operators | Method |
//! |-----------|--------|
//! | `=` | `parse_assignment` |
//! | `\|\|` | `parse_logical_or` |
//! | `&&` | `parse_logical_and` |
//! | `==` `!=` `===` `!==` | `parse_equality` |
//! | `+` `-` | `parse_additive` |
//! | `*` `/` | `parse_multiplicative` |
//! | `!` `-` `typeof` | `parse_unary` |
//! | `.` `[]` `()` | `parse_call` |
//! | literals, identifiers, `( )` | `parse_primary` |
//!
//! ## Usage
//!
//! ```rust
//! use bramble_script::parser::Parser;
//!
//! let mut parser = Parser::new("exports.answer = 1 + 2;");
//! let program = parser.parse_program().expect("Should parse");
//! assert_eq!(program.body.len(), 1);
//! ```

#[allow(clippy::module_inception)]
mod parser;

pub use parser::Parser;
