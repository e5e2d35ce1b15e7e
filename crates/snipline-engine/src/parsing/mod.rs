//! Template tokenizing.
//!
//! The lexer turns snippet template text into typed tokens with absolute
//! buffer spans. Building the node tree from them happens in
//! [`crate::tree`].

mod cursor;
mod lexer;
mod token;

pub use lexer::{Lexer, tokenize};
pub use token::{Token, TokenKind};
