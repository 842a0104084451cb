//! Construction of the parsing tables.

use crate::{
    automaton::{Automaton, LR0Automaton, LR1Automaton, LR1KernelAutomaton, SetForm},
    first_sets::FollowSets,
    grammar::{AugmentError, Grammar, SymbolID, TerminalID},
    item::Item,
    lalr::LalrKernels,
    precedence::{self, PrecedenceError, PrecedenceLevels},
    state_map::{StateID, StateMap},
    table::{Action, ConflictsError, ParsingTable},
};
use lrgen_runtime::ErrorKind;
use std::{fmt, str::FromStr};

/// The construction method of the parsing table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// Simple LR(1): LR(0) states, reductions on FOLLOW sets.
    Slr,
    /// Knuth's canonical LR(1).
    Lr1,
    /// LALR(1) by lookahead propagation over the LR(0) kernels.
    Lalr,
    /// LR(0): reductions on every lookahead.
    Lr0,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Slr, Method::Lr1, Method::Lalr, Method::Lr0];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Slr => "slr",
            Self::Lr1 => "lr1",
            Self::Lalr => "lalr",
            Self::Lr0 => "lr0",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown construction method `{0}'")]
pub struct UnknownMethod(String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMethod(s.to_owned()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Precedence(#[from] PrecedenceError),

    #[error(transparent)]
    Augment(#[from] AugmentError),

    #[error(transparent)]
    Conflicts(#[from] ConflictsError),
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Precedence(err) => err.kind(),
            Self::Augment(err) => err.kind(),
            Self::Conflicts(err) => err.kind(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    method: Method,
    precedence: PrecedenceLevels,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            method: Method::Lalr,
            precedence: PrecedenceLevels::new(),
        }
    }

    /// Construct the table from the LR(0) states and the FOLLOW sets.
    pub fn use_slr(&mut self) -> &mut Self {
        self.method = Method::Slr;
        self
    }

    /// Construct the table with Knuth's canonical LR(1) method.
    pub fn use_canonical(&mut self) -> &mut Self {
        self.method = Method::Lr1;
        self
    }

    /// Construct the table with the LALR(1) method.
    ///
    /// This is the default.
    pub fn use_lalr(&mut self) -> &mut Self {
        self.method = Method::Lalr;
        self
    }

    /// Construct the LR(0) table. Every conflict is an error.
    pub fn use_lr0(&mut self) -> &mut Self {
        self.method = Method::Lr0;
        self
    }

    pub fn with_method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    pub fn precedence(&mut self, levels: PrecedenceLevels) -> &mut Self {
        self.precedence = levels;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Build the parsing table of `g`, resolving the conflicts by precedence.
    pub fn build(&self, g: &Grammar) -> Result<ParsingTable, BuildError> {
        let span = tracing::debug_span!("build", method = %self.method);
        let _entered = span.enter();

        self.precedence.validate(g)?;
        let mut table = build_table(g, self.method)?;

        if self.method == Method::Lr0 {
            // LR(0) cells never consult precedence.
            table.conflicts_without_precedence()?;
            return Ok(table);
        }

        if !self.precedence.is_empty() {
            let conflicts = precedence::resolve(&mut table, &self.precedence);
            if !conflicts.is_empty() {
                return Err(ConflictsError { conflicts }.into());
            }
        }

        table.conflicts()?;
        Ok(table)
    }
}

/// Build the parsing table of `g` with `method`, leaving the conflicts in place.
///
/// The grammar is augmented unless it already is.
pub fn build_table(g: &Grammar, method: Method) -> Result<ParsingTable, AugmentError> {
    let augmented;
    let g = if g.is_augmented() {
        g
    } else {
        augmented = g.augment()?;
        &augmented
    };

    let table = match method {
        Method::Slr => slr(g)?,
        Method::Lr1 => lr1(g)?,
        Method::Lalr => lalr(g)?,
        Method::Lr0 => lr0(g)?,
    };
    tracing::debug!(
        %method,
        states = table.len(),
        conflicts = table.conflict_cells().count(),
        "constructed the parsing table"
    );
    Ok(table)
}

/// Add the shifts and gotos of every state, returning the fresh table.
fn transitions<I, F>(automaton: &Automaton<'_, I, F>, states: &StateMap<I>) -> ParsingTable
where
    I: Item,
    F: SetForm,
{
    let g = automaton.grammar();
    let mut table = ParsingTable::new(g.clone(), states.len());
    for state in states.states() {
        for (symbol, next) in automaton.transitions(states.item_set(state)) {
            let next = states.find_item_set(&next);
            add_transition(&mut table, state, symbol, next);
        }
    }
    table
}

fn add_transition(table: &mut ParsingTable, state: StateID, symbol: SymbolID, next: Option<StateID>) {
    match symbol {
        SymbolID::T(t) => {
            if let Some(next) = next {
                table.add_action(state, t, Action::Shift(next));
            }
        }
        SymbolID::N(n) => table.set_goto(state, n, next),
    }
}

/// Add the reduction of the complete `item` on `lookahead`.
fn add_reduce<I: Item>(
    g: &Grammar,
    table: &mut ParsingTable,
    state: StateID,
    item: &I,
    lookahead: TerminalID,
) {
    if item.is_final(g) {
        if lookahead == TerminalID::EOI {
            table.add_action(state, lookahead, Action::Accept);
        }
    } else {
        table.add_action(state, lookahead, Action::Reduce(item.core().production));
    }
}

fn slr(g: &Grammar) -> Result<ParsingTable, AugmentError> {
    let automaton = LR0Automaton::new(g)?;
    let states = automaton.state_map();
    let follow = FollowSets::new(g, automaton.first_sets());

    let mut table = transitions(&automaton, &states);
    for state in states.states() {
        for item in states.items(state) {
            if !item.is_complete(g) {
                continue;
            }
            let left = g.production(item.production).left();
            for lookahead in follow.get(left).lookaheads() {
                add_reduce(g, &mut table, state, item, lookahead);
            }
            if item.is_final(g) {
                add_reduce(g, &mut table, state, item, TerminalID::EOI);
            }
        }
    }
    Ok(table)
}

fn lr1(g: &Grammar) -> Result<ParsingTable, AugmentError> {
    let automaton = LR1Automaton::new(g)?;
    let states = automaton.state_map();

    let mut table = transitions(&automaton, &states);
    for state in states.states() {
        for item in states.items(state) {
            if item.is_complete(g) {
                add_reduce(g, &mut table, state, item, item.lookahead);
            }
        }
    }
    Ok(table)
}

fn lr0(g: &Grammar) -> Result<ParsingTable, AugmentError> {
    let automaton = LR0Automaton::new(g)?;
    let states = automaton.state_map();
    let lookaheads: Vec<TerminalID> = g.terminals().map(|t| t.id()).collect();

    let mut table = transitions(&automaton, &states);
    for state in states.states() {
        for item in states.items(state) {
            if !item.is_complete(g) {
                continue;
            }
            for lookahead in &lookaheads {
                add_reduce(g, &mut table, state, item, *lookahead);
            }
        }
    }
    Ok(table)
}

fn lalr(g: &Grammar) -> Result<ParsingTable, AugmentError> {
    let kernels = LalrKernels::new(g)?;
    let closure = LR1KernelAutomaton::new(g)?;
    let states = kernels.states();

    let mut table = ParsingTable::new(g.clone(), states.len());
    for state in states.states() {
        for (symbol, next) in kernels.transitions(state) {
            add_transition(&mut table, state, *symbol, Some(*next));
        }
        let items = closure.closure(&kernels.lr1_kernel(state));
        for item in items.iter().filter(|item| item.is_complete(g)) {
            add_reduce(g, &mut table, state, item, item.lookahead);
        }
    }
    Ok(table)
}
