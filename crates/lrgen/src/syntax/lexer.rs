//! Lexer of grammar files.

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Token<'input> {
    ColonEq,
    Comma,
    Semicolon,
    VertBar,
    Kw(Keyword),
    Ident(&'input str),
    /// A quoted terminal, without the quotes.
    Literal(&'input str),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Keyword {
    Terminal,
    Start,
    Rule,
    Empty,
    Left,
    Right,
    Nonassoc,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Terminal => "@terminal",
            Self::Start => "@start",
            Self::Rule => "@rule",
            Self::Empty => "@empty",
            Self::Left => "@left",
            Self::Right => "@right",
            Self::Nonassoc => "@nonassoc",
        }
    }
}

#[derive(Debug, Default)]
pub struct LexerState {
    comment_depth: usize,
}

// The text between the quotes of a matched literal.
fn unquote(text: &str) -> &str {
    let start = text.find('\'').map_or(0, |i| i + 1);
    let end = text.len().saturating_sub(1).max(start);
    &text[start..end]
}

lexgen::lexer! {
    pub Lexer(LexerState) -> Token<'input>;

    let whitespace = [' ' '\t' '\n' '\r'];
    let newline = '\r'* '\n' | '\r';
    let ident = $$XID_Start $$XID_Continue* | '_' $$XID_Continue*;

    rule Init {
        $whitespace+,
        "//" => |lexer| {
            lexer.switch(LexerRule::LineComment)
        },
        "/*" => |lexer| {
            lexer.state().comment_depth += 1;
            lexer.switch(LexerRule::BlockComment)
        },
        "'" => |lexer| {
            lexer.switch(LexerRule::Literal)
        },
        ":=" = Token::ColonEq,
        "," = Token::Comma,
        ";" = Token::Semicolon,
        "|" = Token::VertBar,
        "@terminal" = Token::Kw(Keyword::Terminal),
        "@start" = Token::Kw(Keyword::Start),
        "@rule" = Token::Kw(Keyword::Rule),
        "@empty" = Token::Kw(Keyword::Empty),
        "@left" = Token::Kw(Keyword::Left),
        "@right" = Token::Kw(Keyword::Right),
        "@nonassoc" = Token::Kw(Keyword::Nonassoc),
        $ident => |lexer| {
            let token = Token::Ident(lexer.match_());
            lexer.return_(token)
        },
    }

    rule Literal {
        "'" => |lexer| {
            let token = Token::Literal(unquote(lexer.match_()));
            lexer.switch_and_return(LexerRule::Init, token)
        },
        _ => |lexer| {
            lexer.continue_()
        },
    }

    rule LineComment {
        $newline => |lexer| {
            lexer.switch(LexerRule::Init)
        },
        _,
    }

    rule BlockComment {
        "/*" => |lexer| {
            lexer.state().comment_depth += 1;
            lexer.continue_()
        },
        "*/" => |lexer| {
            let depth = &mut lexer.state().comment_depth;
            if *depth == 1 {
                *depth = 0;
                lexer.switch(LexerRule::Init)
            } else {
                *depth -= 1;
                lexer.continue_()
            }
        },
        _,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Keyword::*;
    use Token::*;

    #[test]
    fn smoketest() {
        let input = "\
@terminal ID, NUM; // identifiers /* block-comment in line-comment */
@start E; /* block comment /* nested */ */
@rule E := E '+' T | T;
@rule F := '(' E ')' | ID | @empty;
@left '*';
@right '^' '**';
@nonassoc ｔｒｕｅ;
";
        let lexer = Lexer::new(input);
        let tokens = lexer
            .map(|res| res.map(|(_, t, _)| t))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert!(matches!(
            dbg!(&tokens[..]),
            [
                Kw(Terminal),
                Ident("ID"),
                Comma,
                Ident("NUM"),
                Semicolon,
                Kw(Start),
                Ident("E"),
                Semicolon,
                Kw(Rule),
                Ident("E"),
                ColonEq,
                Ident("E"),
                Literal("+"),
                Ident("T"),
                VertBar,
                Ident("T"),
                Semicolon,
                Kw(Rule),
                Ident("F"),
                ColonEq,
                Literal("("),
                Ident("E"),
                Literal(")"),
                VertBar,
                Ident("ID"),
                VertBar,
                Kw(Empty),
                Semicolon,
                Kw(Left),
                Literal("*"),
                Semicolon,
                Kw(Right),
                Literal("^"),
                Literal("**"),
                Semicolon,
                Kw(Nonassoc),
                Ident("ｔｒｕｅ"),
                Semicolon,
            ]
        ));
    }

    #[test]
    fn locations() {
        let input = "@rule\n  S := 'a';";
        let tokens = Lexer::new(input).collect::<Result<Vec<_>, _>>().unwrap();
        let (start, token, _) = tokens[1];
        assert_eq!(token, Ident("S"));
        assert_eq!((start.line, start.col), (1, 2));
    }

    #[test]
    fn invalid_character() {
        let input = "@rule S := #;";
        assert!(Lexer::new(input).any(|res| res.is_err()));
    }

    #[test]
    fn unquote_strips_the_quotes() {
        assert_eq!(unquote("'+'"), "+");
        assert_eq!(unquote("''"), "");
    }
}
