//! Parse table definition.

use std::fmt;

/// The trait for abstracting the constructed LR parse table.
pub trait ParseTable {
    /// The number to identify the state of LR automaton.
    type State: Copy + fmt::Debug;

    /// The identifier of terminal symbols.
    type Terminal: Copy + Eq + fmt::Debug;

    /// The identifier of nonterminal symbols.
    type Nonterminal: Copy + fmt::Debug;

    /// The identifier of production rules.
    type Production: Copy + fmt::Debug;

    /// The diagnostic returned when the table has no single answer.
    type Error: TableError;

    /// Return the initial state number.
    fn initial_state(&self) -> Self::State;

    /// Return the terminal symbol reserved for the end of input.
    fn end_of_input(&self) -> Self::Terminal;

    /// Return the action corresponding to the specified state number and
    /// lookahead symbol.
    fn action(
        &self,
        current: Self::State,
        lookahead: Self::Terminal,
    ) -> Result<ParseAction<Self::State, Self::Nonterminal, Self::Production>, Self::Error>;

    /// Return the state to transition after reducing to `symbol`.
    fn goto(&self, current: Self::State, symbol: Self::Nonterminal)
        -> Result<Self::State, Self::Error>;
}

impl<T: ?Sized> ParseTable for &T
where
    T: ParseTable,
{
    type State = T::State;
    type Terminal = T::Terminal;
    type Nonterminal = T::Nonterminal;
    type Production = T::Production;
    type Error = T::Error;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn end_of_input(&self) -> Self::Terminal {
        (**self).end_of_input()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Self::Terminal,
    ) -> Result<ParseAction<Self::State, Self::Nonterminal, Self::Production>, Self::Error> {
        (**self).action(current, lookahead)
    }

    fn goto(
        &self,
        current: Self::State,
        symbol: Self::Nonterminal,
    ) -> Result<Self::State, Self::Error> {
        (**self).goto(current, symbol)
    }
}

impl<T: ?Sized> ParseTable for std::rc::Rc<T>
where
    T: ParseTable,
{
    type State = T::State;
    type Terminal = T::Terminal;
    type Nonterminal = T::Nonterminal;
    type Production = T::Production;
    type Error = T::Error;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn end_of_input(&self) -> Self::Terminal {
        (**self).end_of_input()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Self::Terminal,
    ) -> Result<ParseAction<Self::State, Self::Nonterminal, Self::Production>, Self::Error> {
        (**self).action(current, lookahead)
    }

    fn goto(
        &self,
        current: Self::State,
        symbol: Self::Nonterminal,
    ) -> Result<Self::State, Self::Error> {
        (**self).goto(current, symbol)
    }
}

impl<T: ?Sized> ParseTable for std::sync::Arc<T>
where
    T: ParseTable,
{
    type State = T::State;
    type Terminal = T::Terminal;
    type Nonterminal = T::Nonterminal;
    type Production = T::Production;
    type Error = T::Error;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn end_of_input(&self) -> Self::Terminal {
        (**self).end_of_input()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Self::Terminal,
    ) -> Result<ParseAction<Self::State, Self::Nonterminal, Self::Production>, Self::Error> {
        (**self).action(current, lookahead)
    }

    fn goto(
        &self,
        current: Self::State,
        symbol: Self::Nonterminal,
    ) -> Result<Self::State, Self::Error> {
        (**self).goto(current, symbol)
    }
}

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseAction<TState, TSymbol, TProduction> {
    /// Read the lookahead symbol and transition to the specified state.
    Shift(TState),

    /// Pop `len` states and reduce them to `symbol`.
    Reduce {
        production: TProduction,
        symbol: TSymbol,
        len: usize,
    },

    Accept,
}

/// The classification of every failure reported by table construction
/// and by the parser driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A precedence handle is placed on more than one level.
    InvalidPrecedence,
    /// Some shift/reduce or reduce/reduce conflicts remain unresolved.
    TableConflict,
    /// The ACTION cell looked up while parsing is empty.
    NoAction,
    /// The GOTO entry looked up after a reduction is undefined.
    NoGoto,
    /// The lexer failed to produce the next token.
    LexerFailure,
    /// No fresh start symbol could be introduced for the augmented grammar.
    GrammarAugmentation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidPrecedence => "invalid precedence",
            Self::TableConflict => "table conflict",
            Self::NoAction => "no action",
            Self::NoGoto => "no goto",
            Self::LexerFailure => "lexer failure",
            Self::GrammarAugmentation => "grammar augmentation",
        })
    }
}

/// The diagnostics reported by [`ParseTable`] lookups.
pub trait TableError: std::error::Error {
    fn kind(&self) -> ErrorKind;
}
