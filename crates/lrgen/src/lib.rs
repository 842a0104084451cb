//! LR(0), SLR(1), LALR(1) and canonical LR(1) parsing table construction.

pub mod automaton;
pub mod build;
pub mod first_sets;
pub mod grammar;
pub mod item;
pub mod item_set;
pub mod lalr;
pub mod precedence;
pub mod state_map;
pub mod syntax;
pub mod table;
pub mod types;
pub mod util;

pub use crate::{
    build::{build_table, BuildError, Config, Method},
    grammar::{Grammar, GrammarDef, GrammarDefError},
    precedence::{Assoc, Handle, PrecedenceLevels},
    table::{Action, ParsingTable},
};
pub use lrgen_runtime::ErrorKind;
