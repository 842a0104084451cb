//! The parsing table: ACTION and GOTO.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, TerminalID},
    precedence::Handle,
    state_map::StateID,
    util::{display_fn, join},
};
use lrgen_runtime::{ErrorKind, ParseAction, ParseTable, TableError};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

/// The action that the LR automaton performs on a lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Shift(StateID),
    Reduce(ProductionID),
    Accept,
}

impl Action {
    pub fn is_shift(&self) -> bool {
        matches!(self, Self::Shift(..))
    }

    pub fn is_reduce(&self) -> bool {
        matches!(self, Self::Reduce(..))
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Self::Shift(next) => write!(f, "shift({})", next),
            Self::Reduce(production) => write!(f, "reduce({})", g.production(*production).display(g)),
            Self::Accept => f.write_str("accept"),
        })
    }
}

/// The classification of a table conflict.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    AcceptReduce,
}

impl ConflictKind {
    fn of(actions: &[Action]) -> Self {
        if actions.iter().any(|a| matches!(a, Action::Accept)) {
            Self::AcceptReduce
        } else if actions.iter().any(Action::is_shift) {
            Self::ShiftReduce
        } else {
            Self::ReduceReduce
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ShiftReduce => "shift/reduce",
            Self::ReduceReduce => "reduce/reduce",
            Self::AcceptReduce => "accept/reduce",
        })
    }
}

/// What a grammar author can do about a conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remedy {
    /// Place these handles into precedence levels.
    Assign(Vec<Handle>),
    /// The handles are ranked, but their shared level is non-associative.
    NotAssociative(Vec<Handle>),
    /// Distinct handles of competing reductions sit on one level.
    SplitLevels(Vec<Handle>),
    /// Precedence cannot choose between these actions.
    Unresolvable,
}

impl Remedy {
    fn normalize(self) -> Self {
        let sorted = |mut handles: Vec<Handle>| {
            handles.sort();
            handles.dedup();
            handles
        };
        match self {
            Self::Assign(h) if h.is_empty() => Self::Unresolvable,
            Self::Assign(h) => Self::Assign(sorted(h)),
            Self::NotAssociative(h) => Self::NotAssociative(sorted(h)),
            Self::SplitLevels(h) => Self::SplitLevels(sorted(h)),
            Self::Unresolvable => Self::Unresolvable,
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Self::Assign(h) => write!(f, "assign precedence to: {}", render_handles(g, h)),
            Self::NotAssociative(h) => write!(
                f,
                "not resolvable: {} on a non-associative level",
                render_handles(g, h)
            ),
            Self::SplitLevels(h) => write!(
                f,
                "not resolvable: {} share a level; split the handles across levels",
                render_handles(g, h)
            ),
            Self::Unresolvable => f.write_str("not resolvable by precedence"),
        })
    }
}

fn render_handles(g: &Grammar, handles: &[Handle]) -> String {
    join(handles.iter().map(|h| h.display(g)), ", ")
}

/// An ACTION cell left with more than one action.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub state: StateID,
    pub terminal: TerminalID,
    pub kind: ConflictKind,
    /// The competing actions in the canonical order.
    pub actions: Vec<Action>,
    pub remedy: Remedy,
    message: String,
}

impl Conflict {
    pub fn new(
        g: &Grammar,
        state: StateID,
        terminal: TerminalID,
        mut actions: Vec<Action>,
        remedy: Remedy,
    ) -> Self {
        actions.sort();
        actions.dedup();
        let remedy = remedy.normalize();
        let kind = ConflictKind::of(&actions);

        let mut message = format!(
            "{} conflict in state {} on {}:\n",
            kind,
            state,
            g.terminal(terminal)
        );
        for action in &actions {
            message.push_str(&format!("  - {}\n", action.display(g)));
        }
        message.push_str(&format!("  {}", remedy.display(g)));
        if !matches!(remedy, Remedy::Unresolvable) {
            message.push_str("\n  hint: handles listed earlier receive higher precedence");
        }

        Self {
            state,
            terminal,
            kind,
            actions,
            remedy,
            message,
        }
    }

    /// The handles still missing from the precedence levels.
    pub fn handles(&self) -> &[Handle] {
        match &self.remedy {
            Remedy::Assign(handles) => handles,
            _ => &[],
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every conflict remaining in a parsing table.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{} unresolved conflict(s){}", .conflicts.len(), render_conflicts(.conflicts))]
pub struct ConflictsError {
    pub conflicts: Vec<Conflict>,
}

impl ConflictsError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::TableConflict
    }
}

fn render_conflicts(conflicts: &[Conflict]) -> String {
    conflicts.iter().map(|c| format!("\n{}", c)).collect()
}

/// The diagnostics of table queries.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("no action in state {state} on {name}")]
    NoAction {
        state: StateID,
        terminal: TerminalID,
        name: String,
    },

    #[error("conflicting actions in state {state} on {name}: {rendered}")]
    Conflict {
        state: StateID,
        terminal: TerminalID,
        name: String,
        actions: Vec<Action>,
        rendered: String,
    },

    #[error("no goto in state {state} on {name}")]
    NoGoto {
        state: StateID,
        symbol: NonterminalID,
        name: String,
    },
}

impl TableError for LookupError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NoAction { .. } => ErrorKind::NoAction,
            Self::Conflict { .. } => ErrorKind::TableConflict,
            Self::NoGoto { .. } => ErrorKind::NoGoto,
        }
    }
}

type ActionCell = BTreeSet<Action>;

/// The LR parsing table built for an augmented grammar.
#[derive(Debug, Clone)]
pub struct ParsingTable {
    grammar: Grammar,
    actions: Vec<BTreeMap<TerminalID, ActionCell>>,
    gotos: Vec<BTreeMap<NonterminalID, StateID>>,
}

impl ParsingTable {
    /// Create an empty table with `len` states.
    pub fn new(grammar: Grammar, len: usize) -> Self {
        Self {
            grammar,
            actions: vec![BTreeMap::new(); len],
            gotos: vec![BTreeMap::new(); len],
        }
    }

    /// Return the augmented grammar this table was built for.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn states(&self) -> impl Iterator<Item = StateID> {
        (0..self.actions.len() as u32).map(StateID::new)
    }

    /// Add `action` to `ACTION[state, terminal]`, returning whether the
    /// cell holds exactly one action afterwards.
    ///
    /// States outside the table are left untouched and yield `false`.
    pub fn add_action(&mut self, state: StateID, terminal: TerminalID, action: Action) -> bool {
        match self.actions.get_mut(state.index()) {
            Some(row) => {
                let cell = row.entry(terminal).or_default();
                cell.insert(action);
                cell.len() == 1
            }
            None => false,
        }
    }

    /// Set `GOTO[state, symbol]`; a missing target or a state outside the
    /// table leaves the entry undefined.
    pub fn set_goto(&mut self, state: StateID, symbol: NonterminalID, target: Option<StateID>) {
        if let (Some(row), Some(target)) = (self.gotos.get_mut(state.index()), target) {
            row.insert(symbol, target);
        }
    }

    /// Return the set of actions in `ACTION[state, terminal]`.
    pub fn actions(&self, state: StateID, terminal: TerminalID) -> Option<&BTreeSet<Action>> {
        self.actions.get(state.index())?.get(&terminal)
    }

    pub fn action(&self, state: StateID, terminal: TerminalID) -> Result<Action, LookupError> {
        let cell = self.actions(state, terminal).filter(|cell| !cell.is_empty());
        let cell = match cell {
            Some(cell) => cell,
            None => {
                return Err(LookupError::NoAction {
                    state,
                    terminal,
                    name: self.terminal_name(terminal),
                })
            }
        };
        let mut iter = cell.iter();
        match (iter.next(), iter.next()) {
            (Some(action), None) => Ok(*action),
            _ => Err(LookupError::Conflict {
                state,
                terminal,
                name: self.terminal_name(terminal),
                actions: cell.iter().copied().collect(),
                rendered: join(cell.iter().map(|a| a.display(&self.grammar)), ", "),
            }),
        }
    }

    pub fn goto(&self, state: StateID, symbol: NonterminalID) -> Result<StateID, LookupError> {
        self.gotos
            .get(state.index())
            .and_then(|gotos| gotos.get(&symbol))
            .copied()
            .ok_or_else(|| LookupError::NoGoto {
                state,
                symbol,
                name: self.grammar.nonterminal(symbol).to_string(),
            })
    }

    /// Iterate over the GOTO entries of `state`.
    pub fn gotos(&self, state: StateID) -> impl Iterator<Item = (NonterminalID, StateID)> + '_ {
        self.gotos
            .get(state.index())
            .into_iter()
            .flatten()
            .map(|(n, s)| (*n, *s))
    }

    /// Iterate over the non-empty ACTION cells of `state` in terminal order.
    pub fn action_cells(
        &self,
        state: StateID,
    ) -> impl Iterator<Item = (TerminalID, &BTreeSet<Action>)> + '_ {
        self.actions
            .get(state.index())
            .into_iter()
            .flatten()
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(t, cell)| (*t, cell))
    }

    /// Iterate over the cells holding more than one action.
    pub fn conflict_cells(
        &self,
    ) -> impl Iterator<Item = (StateID, TerminalID, &BTreeSet<Action>)> + '_ {
        self.states().flat_map(move |state| {
            self.action_cells(state)
                .filter(|(_, cell)| cell.len() > 1)
                .map(move |(t, cell)| (state, t, cell))
        })
    }

    /// Report every conflict in this table at once, naming the handles
    /// that precedence levels would need.
    pub fn conflicts(&self) -> Result<(), ConflictsError> {
        self.report(|terminal, cell| {
            if cell.contains(&Action::Accept) {
                return Remedy::Unresolvable;
            }
            Remedy::Assign(
                cell.iter()
                    .filter_map(|action| Handle::of_action(&self.grammar, terminal, action))
                    .collect(),
            )
        })
    }

    /// Report every conflict in this table at once, for tables whose
    /// construction never consults precedence.
    pub fn conflicts_without_precedence(&self) -> Result<(), ConflictsError> {
        self.report(|_, _| Remedy::Unresolvable)
    }

    fn report<F>(&self, remedy: F) -> Result<(), ConflictsError>
    where
        F: Fn(TerminalID, &ActionCell) -> Remedy,
    {
        let conflicts: Vec<_> = self
            .conflict_cells()
            .map(|(state, terminal, cell)| {
                Conflict::new(
                    &self.grammar,
                    state,
                    terminal,
                    cell.iter().copied().collect(),
                    remedy(terminal, cell),
                )
            })
            .collect();
        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(ConflictsError { conflicts })
        }
    }

    /// Replace the cell with the single chosen action.
    pub(crate) fn resolve(&mut self, state: StateID, terminal: TerminalID, action: Action) {
        if let Some(row) = self.actions.get_mut(state.index()) {
            let cell = row.entry(terminal).or_default();
            cell.clear();
            cell.insert(action);
        }
    }

    fn terminal_name(&self, terminal: TerminalID) -> String {
        self.grammar
            .terminals()
            .find(|t| t.id() == terminal)
            .map_or_else(|| format!("{:?}", terminal), |t| t.to_string())
    }
}

impl fmt::Display for ParsingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.grammar;
        for state in self.states() {
            writeln!(f, "#### State {}", state)?;
            let mut cells = self.action_cells(state).peekable();
            if cells.peek().is_some() {
                writeln!(f, "## actions")?;
            }
            for (terminal, cell) in cells {
                write!(f, "- {} => ", g.terminal(terminal))?;
                for (i, action) in cell.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", action.display(g))?;
                }
                writeln!(f)?;
            }
            let mut gotos = self.gotos(state).peekable();
            if gotos.peek().is_some() {
                writeln!(f, "## gotos")?;
            }
            for (symbol, next) in gotos {
                writeln!(f, "- {} => goto({})", g.nonterminal(symbol), next)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl ParseTable for ParsingTable {
    type State = StateID;
    type Terminal = TerminalID;
    type Nonterminal = NonterminalID;
    type Production = ProductionID;
    type Error = LookupError;

    fn initial_state(&self) -> StateID {
        StateID::INITIAL
    }

    fn end_of_input(&self) -> TerminalID {
        TerminalID::EOI
    }

    fn action(
        &self,
        current: StateID,
        lookahead: TerminalID,
    ) -> Result<ParseAction<StateID, NonterminalID, ProductionID>, LookupError> {
        Ok(match ParsingTable::action(self, current, lookahead)? {
            Action::Shift(next) => ParseAction::Shift(next),
            Action::Reduce(id) => {
                let production = self.grammar.production(id);
                ParseAction::Reduce {
                    production: id,
                    symbol: production.left(),
                    len: production.right().len(),
                }
            }
            Action::Accept => ParseAction::Accept,
        })
    }

    fn goto(&self, current: StateID, symbol: NonterminalID) -> Result<StateID, LookupError> {
        ParsingTable::goto(self, current, symbol)
    }
}
