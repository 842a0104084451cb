//! A small tokenizer feeding the fixture grammars to the parser.

use logos::Logos;
use lrgen::{grammar::TerminalID, Grammar};
use lrgen_runtime::{Lexer, Position, Token};

#[derive(Debug, Copy, Clone, Logos, PartialEq)]
#[logos(skip r"[ \t\n\f]+")]
pub enum Tok<'source> {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("+")]
    Plus,

    #[token("*")]
    Star,

    #[token("=")]
    Equal,

    #[regex(r"[0-9]+")]
    Num(&'source str),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident(&'source str),
}

impl Tok<'_> {
    /// The name of the terminal this token stands for.
    ///
    /// Words spelled like a terminal of the grammar (`c`, `d`) are keywords,
    /// every other word or number is an `id`.
    fn terminal_name<'a>(&'a self, g: &Grammar) -> &'a str {
        match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Plus => "+",
            Self::Star => "*",
            Self::Equal => "=",
            Self::Num(word) | Self::Ident(word) => match g.find_terminal(word) {
                Some(..) => *word,
                None => "id",
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("invalid token `{lexeme}'")]
    InvalidToken { lexeme: String },

    #[error("`{name}' is not a terminal of this grammar")]
    UnknownTerminal { name: String },
}

/// Tokenize `source` into the terminals of `grammar`.
pub struct Tokens<'g, 'source> {
    grammar: &'g Grammar,
    lexer: logos::Lexer<'source, Tok<'source>>,
    offset: usize,
    line: u32,
    column: u32,
}

impl<'g, 'source> Tokens<'g, 'source> {
    pub fn new(grammar: &'g Grammar, source: &'source str) -> Self {
        Self {
            grammar,
            lexer: Tok::lexer(source),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn locate(&self, to: usize) -> Position {
        let (mut line, mut column) = (self.line, self.column);
        for ch in self.lexer.source()[self.offset..to].chars() {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Position::new(to, line, column)
    }

    fn seek(&mut self, to: usize) -> Position {
        let position = self.locate(to);
        self.offset = position.offset;
        self.line = position.line;
        self.column = position.column;
        position
    }
}

impl Lexer<TerminalID> for Tokens<'_, '_> {
    type Error = LexError;

    fn next_token(&mut self) -> Result<Option<Token<TerminalID>>, Self::Error> {
        let tok = match self.lexer.next() {
            Some(Ok(tok)) => tok,
            Some(Err(())) => {
                let start = self.lexer.span().start;
                self.seek(start);
                return Err(LexError::InvalidToken {
                    lexeme: self.lexer.slice().to_owned(),
                });
            }
            None => return Ok(None),
        };

        let span = self.lexer.span();
        let lexeme = self.lexer.slice().to_owned();
        let name = tok.terminal_name(self.grammar);
        let terminal = self
            .grammar
            .find_terminal(name)
            .ok_or_else(|| LexError::UnknownTerminal { name: name.into() })?;

        let position = self.seek(span.start);
        Ok(Some(Token::new(terminal, lexeme, position)))
    }

    fn position(&self) -> Position {
        self.locate(self.lexer.span().end)
    }
}

/// Tokenize `source` and collect the names of its terminals.
pub fn terminal_names(g: &Grammar, source: &str) -> Result<Vec<String>, LexError> {
    let mut tokens = Tokens::new(g, source);
    let mut names = vec![];
    while let Some(token) = tokens.next_token()? {
        names.push(g.terminal(token.terminal).name().to_owned());
    }
    Ok(names)
}
