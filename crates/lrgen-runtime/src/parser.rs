//! The shift/reduce parser driven by a parse table.

use crate::{
    definition::{ErrorKind, ParseAction, ParseTable, TableError},
    lexer::{Lexer, Position, Token},
    tree::Node,
};

/// The syntax tree built from the symbols of `TDef`.
pub type ParseTree<TDef> = Node<
    <TDef as ParseTable>::Terminal,
    <TDef as ParseTable>::Nonterminal,
    <TDef as ParseTable>::Production,
>;

/// The result type returned by [`Parser`].
pub type ParseResult<T, TDef, L> =
    Result<T, ParseError<<TDef as ParseTable>::Error, <L as Lexer<<TDef as ParseTable>::Terminal>>::Error>>;

/// The semantic actions attached to the stack discipline of the parser.
///
/// Every shifted token and every reduction produces a value slot; a
/// reduction receives the slots of its right-hand side in left-to-right order.
pub trait Semantics<TDef: ParseTable + ?Sized> {
    type Value;

    fn shift(&mut self, token: Token<TDef::Terminal>) -> Self::Value;

    fn reduce(
        &mut self,
        production: TDef::Production,
        symbol: TDef::Nonterminal,
        args: Vec<Self::Value>,
    ) -> Self::Value;
}

/// Observers notified while parsing.
pub trait Callbacks<TDef: ParseTable + ?Sized> {
    /// Called once for each shifted token.
    fn on_token(&mut self, token: &Token<TDef::Terminal>) {
        let _ = token;
    }

    /// Called once for each reduction.
    fn on_production(&mut self, production: TDef::Production) {
        let _ = production;
    }
}

impl<TDef: ParseTable + ?Sized> Callbacks<TDef> for () {}

/// The parser driven based on the constructed parse table.
///
/// The parser itself holds no state between calls; each call owns its
/// state stack and value stack.
#[derive(Debug, Clone)]
pub struct Parser<TDef> {
    definition: TDef,
}

impl<TDef> Parser<TDef>
where
    TDef: ParseTable,
{
    /// Create an instance of `Parser` using the specified parse table.
    pub fn new(definition: TDef) -> Self {
        Self { definition }
    }

    pub fn definition(&self) -> &TDef {
        &self.definition
    }

    /// Check whether the input is accepted, without any callbacks.
    pub fn recognize<L>(&self, lexer: L) -> ParseResult<(), TDef, L>
    where
        L: Lexer<TDef::Terminal>,
    {
        self.parse(lexer, &mut ())
    }

    /// Parse the input, notifying `callbacks` about shifts and reductions.
    pub fn parse<L, C>(&self, lexer: L, callbacks: &mut C) -> ParseResult<(), TDef, L>
    where
        L: Lexer<TDef::Terminal>,
        C: Callbacks<TDef>,
    {
        self.run(lexer, &mut Recognizer { callbacks })
    }

    /// Parse the input and build its syntax tree.
    pub fn parse_tree<L>(&self, lexer: L) -> ParseResult<ParseTree<TDef>, TDef, L>
    where
        L: Lexer<TDef::Terminal>,
    {
        self.parse_tree_with(lexer, &mut ())
    }

    /// Parse the input and build its syntax tree, notifying `callbacks`.
    pub fn parse_tree_with<L, C>(
        &self,
        lexer: L,
        callbacks: &mut C,
    ) -> ParseResult<ParseTree<TDef>, TDef, L>
    where
        L: Lexer<TDef::Terminal>,
        C: Callbacks<TDef>,
    {
        self.run(lexer, &mut TreeBuilder { callbacks })
    }

    /// Parse the input and compute a value for each reduction.
    ///
    /// `leaf` converts a shifted token into its value slot, and `reduce`
    /// combines the value slots of the right-hand side of a production.
    pub fn evaluate<L, V, F, G>(&self, lexer: L, leaf: F, reduce: G) -> ParseResult<V, TDef, L>
    where
        L: Lexer<TDef::Terminal>,
        F: FnMut(Token<TDef::Terminal>) -> V,
        G: FnMut(TDef::Production, Vec<V>) -> V,
    {
        self.run(lexer, &mut Evaluator { leaf, reduce })
    }

    /// Drive the LR automaton until the input is accepted or rejected.
    pub fn run<L, S>(&self, mut lexer: L, semantics: &mut S) -> ParseResult<S::Value, TDef, L>
    where
        L: Lexer<TDef::Terminal>,
        S: Semantics<TDef>,
    {
        let mut state_stack = vec![self.definition.initial_state()];
        let mut node_stack: Vec<S::Value> = vec![];

        let mut token = self.next_token(&mut lexer)?;
        loop {
            let current = match state_stack.last() {
                Some(current) => *current,
                None => {
                    return Err(ParseError::StackExhausted {
                        position: token.position,
                    })
                }
            };

            let action = match self.definition.action(current, token.terminal) {
                Ok(action) => action,
                Err(source) => {
                    return Err(ParseError::Table {
                        source,
                        lexeme: token.lexeme,
                        position: token.position,
                    })
                }
            };

            match action {
                ParseAction::Shift(next) => {
                    state_stack.push(next);
                    node_stack.push(semantics.shift(token));
                    token = self.next_token(&mut lexer)?;
                }

                ParseAction::Reduce {
                    production,
                    symbol,
                    len,
                } => {
                    // The bottom state must survive every reduction.
                    if len >= state_stack.len() || len > node_stack.len() {
                        return Err(ParseError::StackExhausted {
                            position: token.position,
                        });
                    }
                    state_stack.truncate(state_stack.len() - len);
                    let args = node_stack.split_off(node_stack.len() - len);

                    let top = state_stack[state_stack.len() - 1];
                    let next = match self.definition.goto(top, symbol) {
                        Ok(next) => next,
                        Err(source) => {
                            return Err(ParseError::Table {
                                source,
                                lexeme: token.lexeme,
                                position: token.position,
                            })
                        }
                    };
                    state_stack.push(next);
                    node_stack.push(semantics.reduce(production, symbol, args));
                }

                ParseAction::Accept => {
                    return match (node_stack.pop(), node_stack.is_empty()) {
                        (Some(root), true) => Ok(root),
                        _ => Err(ParseError::StackExhausted {
                            position: token.position,
                        }),
                    };
                }
            }
        }
    }

    fn next_token<L>(&self, lexer: &mut L) -> ParseResult<Token<TDef::Terminal>, TDef, L>
    where
        L: Lexer<TDef::Terminal>,
    {
        match lexer.next_token() {
            Ok(Some(token)) => Ok(token),
            Ok(None) => Ok(Token::new(
                self.definition.end_of_input(),
                String::new(),
                lexer.position(),
            )),
            Err(source) => Err(ParseError::Lexer {
                source,
                position: lexer.position(),
            }),
        }
    }
}

struct Recognizer<'c, C> {
    callbacks: &'c mut C,
}

impl<TDef, C> Semantics<TDef> for Recognizer<'_, C>
where
    TDef: ParseTable,
    C: Callbacks<TDef>,
{
    type Value = ();

    fn shift(&mut self, token: Token<TDef::Terminal>) {
        self.callbacks.on_token(&token);
    }

    fn reduce(&mut self, production: TDef::Production, _: TDef::Nonterminal, _: Vec<()>) {
        self.callbacks.on_production(production);
    }
}

struct TreeBuilder<'c, C> {
    callbacks: &'c mut C,
}

impl<TDef, C> Semantics<TDef> for TreeBuilder<'_, C>
where
    TDef: ParseTable,
    C: Callbacks<TDef>,
{
    type Value = ParseTree<TDef>;

    fn shift(&mut self, token: Token<TDef::Terminal>) -> Self::Value {
        self.callbacks.on_token(&token);
        Node::Leaf(token)
    }

    fn reduce(
        &mut self,
        production: TDef::Production,
        symbol: TDef::Nonterminal,
        children: Vec<Self::Value>,
    ) -> Self::Value {
        self.callbacks.on_production(production);
        Node::Internal {
            symbol,
            production,
            children,
        }
    }
}

struct Evaluator<F, G> {
    leaf: F,
    reduce: G,
}

impl<TDef, V, F, G> Semantics<TDef> for Evaluator<F, G>
where
    TDef: ParseTable,
    F: FnMut(Token<TDef::Terminal>) -> V,
    G: FnMut(TDef::Production, Vec<V>) -> V,
{
    type Value = V;

    fn shift(&mut self, token: Token<TDef::Terminal>) -> V {
        (self.leaf)(token)
    }

    fn reduce(&mut self, production: TDef::Production, _: TDef::Nonterminal, args: Vec<V>) -> V {
        (self.reduce)(production, args)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError<E, L> {
    #[error("{position}: {source}")]
    Table {
        source: E,
        lexeme: String,
        position: Position,
    },

    #[error("{position}: from lexer: {source}")]
    Lexer { source: L, position: Position },

    #[error("{position}: the parser stack is exhausted")]
    StackExhausted { position: Position },
}

impl<E, L> ParseError<E, L>
where
    E: TableError,
{
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Table { source, .. } => source.kind(),
            Self::Lexer { .. } => ErrorKind::LexerFailure,
            // A reduction outran the stack, so the table is malformed.
            Self::StackExhausted { .. } => ErrorKind::NoGoto,
        }
    }

    pub fn position(&self) -> &Position {
        match self {
            Self::Table { position, .. }
            | Self::Lexer { position, .. }
            | Self::StackExhausted { position } => position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokens;

    // S -> a S | b
    //
    //  0: a => shift(1), b => shift(2), S => goto(3)
    //  1: a => shift(1), b => shift(2), S => goto(4)
    //  2: $ => reduce(S -> b)
    //  3: $ => accept
    //  4: $ => reduce(S -> a S)
    #[derive(Debug)]
    struct Table;

    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum T {
        A,
        B,
        Eoi,
    }

    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum P {
        Cons,
        Nil,
    }

    #[derive(Debug, thiserror::Error)]
    enum Error {
        #[error("no action at {0} on {1:?}")]
        NoAction(u8, T),
        #[error("no goto at {0}")]
        NoGoto(u8),
    }

    impl TableError for Error {
        fn kind(&self) -> ErrorKind {
            match self {
                Self::NoAction(..) => ErrorKind::NoAction,
                Self::NoGoto(..) => ErrorKind::NoGoto,
            }
        }
    }

    impl ParseTable for Table {
        type State = u8;
        type Terminal = T;
        type Nonterminal = char;
        type Production = P;
        type Error = Error;

        fn initial_state(&self) -> u8 {
            0
        }

        fn end_of_input(&self) -> T {
            T::Eoi
        }

        fn action(&self, current: u8, lookahead: T) -> Result<ParseAction<u8, char, P>, Error> {
            match (current, lookahead) {
                (0 | 1, T::A) => Ok(ParseAction::Shift(1)),
                (0 | 1, T::B) => Ok(ParseAction::Shift(2)),
                (2, T::Eoi) => Ok(ParseAction::Reduce {
                    production: P::Nil,
                    symbol: 'S',
                    len: 1,
                }),
                (3, T::Eoi) => Ok(ParseAction::Accept),
                (4, T::Eoi) => Ok(ParseAction::Reduce {
                    production: P::Cons,
                    symbol: 'S',
                    len: 2,
                }),
                (s, t) => Err(Error::NoAction(s, t)),
            }
        }

        fn goto(&self, current: u8, symbol: char) -> Result<u8, Error> {
            match (current, symbol) {
                (0, 'S') => Ok(3),
                (1, 'S') => Ok(4),
                (s, _) => Err(Error::NoGoto(s)),
            }
        }
    }

    fn input(s: &str) -> Vec<Token<T>> {
        s.chars()
            .enumerate()
            .map(|(i, c)| {
                let terminal = if c == 'a' { T::A } else { T::B };
                Token::new(terminal, c.to_string(), Position::new(i, 1, i as u32 + 1))
            })
            .collect()
    }

    #[derive(Default)]
    struct Recorder {
        tokens: Vec<String>,
        productions: Vec<P>,
    }

    impl Callbacks<Table> for Recorder {
        fn on_token(&mut self, token: &Token<T>) {
            self.tokens.push(token.lexeme.clone());
        }
        fn on_production(&mut self, production: P) {
            self.productions.push(production);
        }
    }

    #[test]
    fn callbacks_follow_reductions() {
        let parser = Parser::new(Table);
        let mut recorder = Recorder::default();
        parser.parse(tokens(input("aab")), &mut recorder).unwrap();
        assert_eq!(recorder.tokens, ["a", "a", "b"]);
        assert_eq!(recorder.productions, [P::Nil, P::Cons, P::Cons]);
    }

    #[test]
    fn tree_preserves_child_order() {
        let parser = Parser::new(&Table);
        let tree = parser.parse_tree(tokens(input("ab"))).unwrap();
        assert_eq!(tree.count_internal(), 2);
        let leaves: Vec<_> = tree.leaves().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(leaves, ["a", "b"]);
        assert_eq!(tree.productions(), [&P::Nil, &P::Cons]);
        assert!(tree.children()[0].is_leaf());
    }

    #[test]
    fn evaluate_counts_prefix() {
        let parser = Parser::new(Table);
        let depth = parser
            .evaluate(
                tokens(input("aaab")),
                |_| 0usize,
                |p, args| match p {
                    P::Nil => 0,
                    P::Cons => args[1] + 1,
                },
            )
            .unwrap();
        assert_eq!(depth, 3);
    }

    #[test]
    fn empty_input_is_rejected_before_callbacks() {
        let parser = Parser::new(Table);
        let mut recorder = Recorder::default();
        let err = parser.parse(tokens(vec![]), &mut recorder).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoAction);
        assert!(matches!(
            err,
            ParseError::Table {
                source: Error::NoAction(0, T::Eoi),
                ..
            }
        ));
        assert!(recorder.tokens.is_empty());
        assert!(recorder.productions.is_empty());
    }

    #[test]
    fn error_carries_position_of_current_token() {
        let parser = Parser::new(Table);
        let err = parser.recognize(tokens(input("ba"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoAction);
        assert_eq!(err.position().offset, 1);
    }
}
