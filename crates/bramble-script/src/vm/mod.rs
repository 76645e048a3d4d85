//! Execution of parsed programs.
//!
//! The interpreter walks the AST directly. Each module body runs in its own
//! [`Interpreter`] with a fresh scope; nested `require` calls are handed to
//! the [`Host`] so the embedding loader can resolve, cache and run the
//! dependency before control returns here.

mod interpreter;

pub use interpreter::{Host, Interpreter};
