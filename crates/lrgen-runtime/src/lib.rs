//! Runtime implementation for the `lrgen` parsing tables.

pub mod definition;
pub mod lexer;
pub mod parser;
pub mod tree;

pub use crate::{
    definition::{ErrorKind, ParseAction, ParseTable, TableError},
    lexer::{Lexer, Position, Token},
    parser::{Callbacks, ParseError, ParseTree, Parser, Semantics},
    tree::Node,
};
