//! Grammar types.

use crate::{types::Map, util::display_fn};
use lrgen_runtime::ErrorKind;
use std::fmt;

/// The suffixes tried in order when a fresh start symbol is introduced.
pub const PRIME_SUFFIXES: [char; 4] = ['\u{2032}', '\u{2033}', '\u{2034}', '\u{2057}'];

// The reserved names that user-defined symbols must not use.
const EOI_NAME: &str = "$";

// IDs are allocated from zero and `u16::MAX` is kept for the end of input.
const MAX_SYMBOLS: usize = u16::MAX as usize - 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    ///
    /// It orders after every declared terminal.
    pub const EOI: Self = Self::new(u16::MAX);

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    // Dense index used by bit sets, with the end of input at zero.
    #[inline]
    pub(crate) fn to_index(self) -> usize {
        self.raw.wrapping_add(1).into()
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Self::new((index as u16).wrapping_sub(1))
    }
}

#[derive(Debug, Clone)]
pub struct Terminal {
    id: TerminalID,
    name: String,
}
impl Terminal {
    pub fn id(&self) -> TerminalID {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id == TerminalID::EOI || is_identifier(&self.name) {
            f.write_str(&self.name)
        } else {
            write!(f, "'{}'", self.name)
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}
impl NonterminalID {
    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub(crate) fn to_index(self) -> usize {
        self.raw.into()
    }
}

#[derive(Debug, Clone)]
pub struct Nonterminal {
    id: NonterminalID,
    name: String,
}
impl Nonterminal {
    pub fn id(&self) -> NonterminalID {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}
impl SymbolID {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::T(..))
    }

    pub fn as_terminal(&self) -> Option<TerminalID> {
        match self {
            Self::T(t) => Some(*t),
            Self::N(..) => None,
        }
    }

    pub fn as_nonterminal(&self) -> Option<NonterminalID> {
        match self {
            Self::N(n) => Some(*n),
            Self::T(..) => None,
        }
    }
}
impl From<TerminalID> for SymbolID {
    fn from(t: TerminalID) -> Self {
        Self::T(t)
    }
}
impl From<NonterminalID> for SymbolID {
    fn from(n: NonterminalID) -> Self {
        Self::N(n)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u16,
}
impl ProductionID {
    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug, Clone)]
pub struct Production {
    id: ProductionID,
    left: NonterminalID,
    right: Vec<SymbolID>,
}
impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> NonterminalID {
        self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    /// Return the first terminal symbol in the right-hand side, if any.
    pub fn first_terminal(&self) -> Option<TerminalID> {
        self.right.iter().find_map(SymbolID::as_terminal)
    }

    // `"LHS → R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} →", g.nonterminals[&self.left])?;
            if self.right.is_empty() {
                return f.write_str(" ε");
            }
            for symbol in &self.right {
                write!(f, " {}", g.symbol(*symbol))?;
            }
            Ok(())
        })
    }
}

/// The grammar definition used to derive the parsing tables.
#[derive(Debug, Clone)]
pub struct Grammar {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    heads: Map<NonterminalID, Vec<ProductionID>>,
    start_symbol: NonterminalID,
    accept: Option<ProductionID>,
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            productions: Map::default(),
            start: None,
        };
        f(&mut def)?;
        def.end()
    }

    /// Iterate over the terminal symbols in declaration order.
    ///
    /// The end of input, once added by [`Grammar::augment`], comes last.
    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> + '_ {
        self.terminals.values()
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Nonterminal> + '_ {
        self.nonterminals.values()
    }

    pub fn productions(&self) -> impl Iterator<Item = &Production> + '_ {
        self.productions.values()
    }

    pub fn terminal(&self, id: TerminalID) -> &Terminal {
        &self.terminals[&id]
    }

    pub fn nonterminal(&self, id: NonterminalID) -> &Nonterminal {
        &self.nonterminals[&id]
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    pub fn find_terminal(&self, name: &str) -> Option<TerminalID> {
        self.terminals
            .values()
            .find(|t| t.name == name)
            .map(Terminal::id)
    }

    pub fn find_nonterminal(&self, name: &str) -> Option<NonterminalID> {
        self.nonterminals
            .values()
            .find(|n| n.name == name)
            .map(Nonterminal::id)
    }

    /// Iterate over the productions whose left-hand side is `left`.
    pub fn productions_of(&self, left: NonterminalID) -> impl Iterator<Item = &Production> + '_ {
        self.heads
            .get(&left)
            .into_iter()
            .flatten()
            .map(move |id| &self.productions[id])
    }

    /// Enumerate all terminals followed by all nonterminals.
    pub fn symbols(&self) -> impl Iterator<Item = SymbolID> + '_ {
        let terminals = self.terminals.keys().copied().map(SymbolID::T);
        let nonterminals = self.nonterminals.keys().copied().map(SymbolID::N);
        terminals.chain(nonterminals)
    }

    pub fn start_symbol(&self) -> NonterminalID {
        self.start_symbol
    }

    /// Return the production `S′ → S` introduced by augmentation.
    pub fn accept_production(&self) -> Option<ProductionID> {
        self.accept
    }

    pub fn is_augmented(&self) -> bool {
        self.accept.is_some()
    }

    pub fn symbol(&self, symbol: SymbolID) -> impl fmt::Display + '_ {
        display_fn(move |f| match symbol {
            SymbolID::T(t) => fmt::Display::fmt(&self.terminals[&t], f),
            SymbolID::N(n) => fmt::Display::fmt(&self.nonterminals[&n], f),
        })
    }

    /// Introduce a nonterminal named `base` followed by the first suffix
    /// that does not collide with an existing symbol.
    pub fn fresh_nonterminal(&mut self, base: &str, suffixes: &[char]) -> Option<NonterminalID> {
        if self.nonterminals.len() >= MAX_SYMBOLS {
            return None;
        }
        let name = suffixes
            .iter()
            .map(|suffix| format!("{}{}", base, suffix))
            .find(|name| !self.is_declared(name))?;
        let id = NonterminalID::new(self.nonterminals.len() as u16);
        self.nonterminals.insert(id, Nonterminal { id, name });
        Some(id)
    }

    fn is_declared(&self, name: &str) -> bool {
        self.terminals.values().any(|t| t.name == name)
            || self.nonterminals.values().any(|n| n.name == name)
    }

    /// Create the augmented grammar with the fresh start symbol `S′` and
    /// the single production `S′ → S`.
    pub fn augment(&self) -> Result<Grammar, AugmentError> {
        let mut g = self.clone();

        let base = self.nonterminals[&self.start_symbol].name.clone();
        let start = g
            .fresh_nonterminal(&base, &PRIME_SUFFIXES)
            .ok_or(AugmentError::Exhausted { start: base })?;

        g.terminals
            .entry(TerminalID::EOI)
            .or_insert_with(|| Terminal {
                id: TerminalID::EOI,
                name: EOI_NAME.into(),
            });

        // `GrammarDef` keeps the number of productions below `MAX_SYMBOLS`.
        let id = ProductionID::new(g.productions.len() as u16);
        g.productions.insert(
            id,
            Production {
                id,
                left: start,
                right: vec![SymbolID::N(self.start_symbol)],
            },
        );
        g.heads.entry(start).or_default().push(id);
        g.start_symbol = start;
        g.accept = Some(id);

        tracing::debug!(start = %g.nonterminals[&start], "augmented the grammar");
        Ok(g)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in self.terminals.values() {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for nonterminal in self.nonterminals.values() {
            write!(f, "{}", nonterminal)?;
            if nonterminal.id == self.start_symbol {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## productions:")?;
        for production in self.productions.values() {
            writeln!(f, "{}", production.display(self))?;
        }

        Ok(())
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    start: Option<NonterminalID>,
}

impl GrammarDef {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str) -> Result<TerminalID, GrammarDefError> {
        self.verify_name(name)?;
        if self.terminals.len() >= MAX_SYMBOLS {
            return Err(GrammarDefError::Overflow { what: "terminals" });
        }
        let id = TerminalID::new(self.terminals.len() as u16);
        self.terminals.insert(
            id,
            Terminal {
                id,
                name: name.to_owned(),
            },
        );
        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarDefError> {
        self.verify_name(name)?;
        // One ID is left for the start symbol of the augmented grammar.
        if self.nonterminals.len() + 1 >= MAX_SYMBOLS {
            return Err(GrammarDefError::Overflow {
                what: "nonterminals",
            });
        }
        let id = NonterminalID::new(self.nonterminals.len() as u16);
        self.nonterminals.insert(
            id,
            Nonterminal {
                id,
                name: name.to_owned(),
            },
        );
        Ok(id)
    }

    /// Specify a production rule into this grammer.
    pub fn rule<I>(&mut self, left: NonterminalID, right: I) -> Result<ProductionID, GrammarDefError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let right: Vec<_> = right.into_iter().collect();
        for symbol in std::iter::once(SymbolID::N(left)).chain(right.iter().copied()) {
            let declared = match symbol {
                SymbolID::T(t) => self.terminals.contains_key(&t),
                SymbolID::N(n) => self.nonterminals.contains_key(&n),
            };
            if !declared {
                return Err(GrammarDefError::UndeclaredSymbol { symbol });
            }
        }

        if self
            .productions
            .values()
            .any(|p| p.left == left && p.right == right)
        {
            return Err(GrammarDefError::DuplicateProduction {
                production: self.render(left, &right),
            });
        }

        if self.productions.len() + 1 >= MAX_SYMBOLS {
            return Err(GrammarDefError::Overflow {
                what: "productions",
            });
        }
        let id = ProductionID::new(self.productions.len() as u16);
        self.productions.insert(id, Production { id, left, right });

        Ok(id)
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, symbol: NonterminalID) -> Result<(), GrammarDefError> {
        if !self.nonterminals.contains_key(&symbol) {
            return Err(GrammarDefError::UndeclaredSymbol {
                symbol: SymbolID::N(symbol),
            });
        }
        self.start.replace(symbol);
        Ok(())
    }

    fn verify_name(&self, name: &str) -> Result<(), GrammarDefError> {
        if name.is_empty() {
            return Err(GrammarDefError::EmptyName);
        }
        if name == EOI_NAME {
            return Err(GrammarDefError::ReservedName { name: name.into() });
        }
        if self.terminals.values().any(|t| t.name == name)
            || self.nonterminals.values().any(|n| n.name == name)
        {
            return Err(GrammarDefError::DuplicateSymbol { name: name.into() });
        }
        Ok(())
    }

    fn render(&self, left: NonterminalID, right: &[SymbolID]) -> String {
        let mut out = format!("{} →", self.nonterminals[&left]);
        if right.is_empty() {
            out.push_str(" ε");
        }
        for symbol in right {
            let name = match symbol {
                SymbolID::T(t) => self.terminals[t].to_string(),
                SymbolID::N(n) => self.nonterminals[n].to_string(),
            };
            out.push(' ');
            out.push_str(&name);
        }
        out
    }

    fn end(self) -> Result<Grammar, GrammarDefError> {
        // The first declared nonterminal is used when no start symbol is given.
        let start_symbol = match self.start {
            Some(start) => start,
            None => self
                .nonterminals
                .keys()
                .next()
                .copied()
                .ok_or(GrammarDefError::NoNonterminals)?,
        };

        let mut heads: Map<NonterminalID, Vec<ProductionID>> = Map::default();
        for production in self.productions.values() {
            heads.entry(production.left).or_default().push(production.id);
        }

        Ok(Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            productions: self.productions,
            heads,
            start_symbol,
            accept: None,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("the symbol name must not be empty")]
    EmptyName,

    #[error("the symbol name `{name}' is reserved")]
    ReservedName { name: String },

    #[error("the symbol `{name}' has already been declared")]
    DuplicateSymbol { name: String },

    #[error("the symbol {symbol:?} is not declared in this grammar")]
    UndeclaredSymbol { symbol: SymbolID },

    #[error("duplicate production rule: {production}")]
    DuplicateProduction { production: String },

    #[error("the grammar has no nonterminal symbols")]
    NoNonterminals,

    #[error("too many {what} in the grammar")]
    Overflow { what: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum AugmentError {
    #[error("no fresh start symbol is available for `{start}'")]
    Exhausted { start: String },

    #[error("the grammar is not augmented")]
    NotAugmented,
}
impl AugmentError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::GrammarAugmentation
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(ch) if ch == '_' || unicode_ident::is_xid_start(ch) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}
