//! Operator precedence and associativity, used to resolve table conflicts.

use crate::{
    grammar::{Grammar, ProductionID, TerminalID},
    table::{Action, Conflict, ParsingTable, Remedy},
    types::Map,
    util::{display_fn, join},
};
use lrgen_runtime::ErrorKind;
use std::{collections::BTreeSet, fmt};

/// The associativity of a precedence level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

impl fmt::Display for Assoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Nonassoc => "nonassoc",
        })
    }
}

/// The key that attaches a precedence to a table action.
///
/// Terminal handles order before production handles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Handle {
    Terminal(TerminalID),
    Production(ProductionID),
}

impl Handle {
    /// Derive the handle of `action` in a cell for the lookahead `terminal`.
    ///
    /// A shift is keyed by its lookahead. A reduction is keyed by the first
    /// terminal in the body, or by the production itself when the body has
    /// no terminal. `Accept` has no handle.
    pub fn of_action(g: &Grammar, terminal: TerminalID, action: &Action) -> Option<Self> {
        match action {
            Action::Shift(..) => Some(Self::Terminal(terminal)),
            Action::Reduce(id) => Some(
                g.production(*id)
                    .first_terminal()
                    .map_or(Self::Production(*id), Self::Terminal),
            ),
            Action::Accept => None,
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Self::Terminal(t) => write!(f, "{}", g.terminal(*t)),
            Self::Production(p) => write!(f, "[{}]", g.production(*p).display(g)),
        })
    }
}

impl From<TerminalID> for Handle {
    fn from(id: TerminalID) -> Self {
        Self::Terminal(id)
    }
}

impl From<ProductionID> for Handle {
    fn from(id: ProductionID) -> Self {
        Self::Production(id)
    }
}

/// A set of handles sharing the same precedence and associativity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecedenceLevel {
    assoc: Assoc,
    handles: BTreeSet<Handle>,
}

impl PrecedenceLevel {
    pub fn new<I>(assoc: Assoc, handles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Handle>,
    {
        Self {
            assoc,
            handles: handles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn assoc(&self) -> Assoc {
        self.assoc
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.handles.iter().copied()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.handles.contains(&handle)
    }
}

/// The ordered precedence levels; earlier levels bind tighter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecedenceLevels {
    levels: Vec<PrecedenceLevel>,
}

impl PrecedenceLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a level below the existing ones.
    pub fn push(&mut self, level: PrecedenceLevel) {
        self.levels.push(level);
    }

    pub fn level<I>(mut self, assoc: Assoc, handles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Handle>,
    {
        self.push(PrecedenceLevel::new(assoc, handles));
        self
    }

    pub fn left<I>(self, handles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Handle>,
    {
        self.level(Assoc::Left, handles)
    }

    pub fn right<I>(self, handles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Handle>,
    {
        self.level(Assoc::Right, handles)
    }

    pub fn nonassoc<I>(self, handles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Handle>,
    {
        self.level(Assoc::Nonassoc, handles)
    }

    pub fn levels(&self) -> &[PrecedenceLevel] {
        &self.levels
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Check that no handle appears on more than one level.
    pub fn validate(&self, g: &Grammar) -> Result<(), PrecedenceError> {
        let mut occurrences: Map<Handle, Vec<usize>> = Map::default();
        for (index, level) in self.levels.iter().enumerate() {
            for handle in level.handles() {
                occurrences.entry(handle).or_default().push(index);
            }
        }
        occurrences.sort_keys();

        let duplicates: Vec<_> = occurrences
            .into_iter()
            .filter(|(_, levels)| levels.len() > 1)
            .map(|(handle, levels)| DuplicateHandle {
                name: handle.display(g).to_string(),
                handle,
                levels,
            })
            .collect();
        if duplicates.is_empty() {
            return Ok(());
        }

        let rendered = join(
            duplicates.iter().map(|dup| {
                format!(
                    "{} appears on levels {}",
                    dup.name,
                    join(dup.levels.iter(), ", ")
                )
            }),
            "; ",
        );
        Err(PrecedenceError {
            duplicates,
            rendered,
        })
    }

    /// Return the level index and associativity assigned to `handle`.
    pub fn lookup(&self, handle: Handle) -> Option<(usize, Assoc)> {
        self.levels
            .iter()
            .enumerate()
            .find(|(_, level)| level.contains(handle))
            .map(|(index, level)| (index, level.assoc))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateHandle {
    pub handle: Handle,
    pub levels: Vec<usize>,
    name: String,
}

/// Handles assigned to more than one precedence level.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid precedence: {rendered}")]
pub struct PrecedenceError {
    pub duplicates: Vec<DuplicateHandle>,
    rendered: String,
}

impl PrecedenceError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidPrecedence
    }
}

#[derive(Debug, Copy, Clone)]
struct Ranked {
    action: Action,
    handle: Handle,
    level: usize,
    assoc: Assoc,
}

impl Ranked {
    fn dominates(&self, other: &Ranked) -> bool {
        if self.level != other.level {
            return self.level < other.level;
        }
        matches!(
            (self.action, other.action, self.assoc),
            (Action::Shift(..), Action::Reduce(..), Assoc::Right)
                | (Action::Reduce(..), Action::Shift(..), Assoc::Left)
        )
    }
}

/// Pick the single action in a conflicting cell that every other action
/// yields to, or say why there is none.
fn choose(
    g: &Grammar,
    levels: &PrecedenceLevels,
    terminal: TerminalID,
    actions: &[Action],
) -> Result<Action, Remedy> {
    let mut ranked = Vec::with_capacity(actions.len());
    let mut missing = BTreeSet::new();
    for action in actions {
        // Accept carries no handle.
        let handle = Handle::of_action(g, terminal, action).ok_or(Remedy::Unresolvable)?;
        match levels.lookup(handle) {
            Some((level, assoc)) => ranked.push(Ranked {
                action: *action,
                handle,
                level,
                assoc,
            }),
            None => {
                missing.insert(handle);
            }
        }
    }
    if !missing.is_empty() {
        return Err(Remedy::Assign(missing.into_iter().collect()));
    }

    let winner = ranked.iter().find(|x| {
        ranked
            .iter()
            .all(|y| x.action == y.action || x.dominates(y))
    });
    if let Some(winner) = winner {
        return Ok(winner.action);
    }

    // Only actions on one level can fail to dominate each other.
    let mut tied = BTreeSet::new();
    let mut nonassoc = BTreeSet::new();
    for (i, x) in ranked.iter().enumerate() {
        for y in &ranked[i + 1..] {
            if x.action == y.action || x.dominates(y) || y.dominates(x) {
                continue;
            }
            if x.assoc == Assoc::Nonassoc && (x.action.is_shift() || y.action.is_shift()) {
                nonassoc.extend([x.handle, y.handle]);
            } else {
                tied.extend([x.handle, y.handle]);
            }
        }
    }
    if !nonassoc.is_empty() {
        Err(Remedy::NotAssociative(nonassoc.into_iter().collect()))
    } else if tied.len() > 1 {
        Err(Remedy::SplitLevels(tied.into_iter().collect()))
    } else {
        Err(Remedy::Unresolvable)
    }
}

/// Resolve the conflicting cells of `table` by precedence, replacing each
/// resolvable cell with its winning action. Returns the conflicts left.
pub fn resolve(table: &mut ParsingTable, levels: &PrecedenceLevels) -> Vec<Conflict> {
    let span = tracing::debug_span!("resolve_conflicts");
    let _entered = span.enter();

    let cells: Vec<_> = table
        .conflict_cells()
        .map(|(state, terminal, cell)| (state, terminal, cell.iter().copied().collect::<Vec<_>>()))
        .collect();

    let mut unresolved = vec![];
    let mut resolved = 0usize;
    for (state, terminal, actions) in cells {
        match choose(table.grammar(), levels, terminal, &actions) {
            Ok(action) => {
                tracing::trace!(%state, ?terminal, ?action, "resolved by precedence");
                table.resolve(state, terminal, action);
                resolved += 1;
            }
            Err(remedy) => {
                unresolved.push(Conflict::new(
                    table.grammar(),
                    state,
                    terminal,
                    actions,
                    remedy,
                ));
            }
        }
    }

    tracing::debug!(resolved, unresolved = unresolved.len(), "resolved the conflicts");
    unresolved
}
