//! Lexical analysis (tokenization) for module source code.
//!
//! The lexer transforms source text into a stream of tokens that the
//! parser consumes. Line terminators are not tokens; instead each token
//! records whether one preceded it, which is all the parser needs for
//! automatic semicolon insertion.
//!
//! ## Usage
//!
//! ```rust
//! use bramble_script::lexer::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::new("exports.x = 42;");
//!
//! loop {
//!     let token = scanner.next_token();
//!     if matches!(token.kind, TokenKind::Eof) {
//!         break;
//!     }
//!     println!("{:?}", token.kind);
//! }
//! ```

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind};
