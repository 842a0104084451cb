//! Lexer contract consumed by the parser.

use std::{convert::Infallible, fmt, sync::Arc};

/// The location of a token in the source, used only for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub filename: Option<Arc<str>>,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            filename: None,
            offset,
            line,
            column,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<Arc<str>>) -> Self {
        self.filename.replace(filename.into());
        self
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(filename) = &self.filename {
            write!(f, "{}:", filename)?;
        }
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<T> {
    pub terminal: T,
    pub lexeme: String,
    pub position: Position,
}

impl<T> Token<T> {
    pub fn new(terminal: T, lexeme: impl Into<String>, position: Position) -> Self {
        Self {
            terminal,
            lexeme: lexeme.into(),
            position,
        }
    }
}

/// A trait for abstracting the lexer that feeds tokens to the parser.
pub trait Lexer<T> {
    type Error: std::error::Error;

    /// Return the next token, or `None` at the end of input.
    fn next_token(&mut self) -> Result<Option<Token<T>>, Self::Error>;

    /// Return the current position of this lexer.
    ///
    /// It is used as the location of the end of input and of lexer errors.
    fn position(&self) -> Position {
        Position::default()
    }
}

impl<T, L: ?Sized> Lexer<T> for &mut L
where
    L: Lexer<T>,
{
    type Error = L::Error;

    fn next_token(&mut self) -> Result<Option<Token<T>>, Self::Error> {
        (**self).next_token()
    }

    fn position(&self) -> Position {
        (**self).position()
    }
}

/// A [`Lexer`] over an iterator of already scanned tokens.
#[derive(Debug)]
pub struct TokenStream<I> {
    iter: I,
    last: Position,
}

impl<I> TokenStream<I> {
    pub fn new(iter: I) -> Self {
        Self {
            iter,
            last: Position::default(),
        }
    }
}

impl<T, E, I> Lexer<T> for TokenStream<I>
where
    I: Iterator<Item = Result<Token<T>, E>>,
    E: std::error::Error,
{
    type Error = E;

    fn next_token(&mut self) -> Result<Option<Token<T>>, Self::Error> {
        match self.iter.next().transpose()? {
            Some(token) => {
                self.last = token.position.clone();
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    fn position(&self) -> Position {
        self.last.clone()
    }
}

/// Create a [`Lexer`] from the sequence of tokens that never fails.
pub fn tokens<T, I>(tokens: I) -> TokenStream<impl Iterator<Item = Result<Token<T>, Infallible>>>
where
    I: IntoIterator<Item = Token<T>>,
{
    TokenStream::new(tokens.into_iter().map(Ok))
}
