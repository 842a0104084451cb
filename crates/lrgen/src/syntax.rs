//! Grammar files.

pub mod ast;
pub mod lexer;

use self::lexer::{Keyword, Lexer, Token};
use crate::{
    build::{Config, Method},
    grammar::{Grammar, GrammarDefError, NonterminalID, ProductionID, SymbolID, TerminalID},
    precedence::{Assoc, PrecedenceLevel, PrecedenceLevels},
    table::{LookupError, ParsingTable},
    types::{Map, Set},
};
use anyhow::Context as _;
use lexgen_util::{LexerError, Loc};
use lrgen_runtime::{self as runtime, ParseError, Parser, Position, Semantics};
use std::{
    fmt, fs,
    path::Path,
    str::FromStr,
    sync::{Arc, OnceLock},
};

/// A grammar together with the precedence levels declared in its file.
#[derive(Debug, Clone)]
pub struct Definition {
    pub grammar: Grammar,
    pub precedence: PrecedenceLevels,
}

impl Definition {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}'", path.display()))?;
        let file = parse_source(&source, Some(path.display().to_string().into()))?;
        Self::from_ast(&file).with_context(|| format!("invalid grammar in `{}'", path.display()))
    }

    /// Lower the syntax tree of a grammar file.
    pub fn from_ast(file: &ast::File) -> anyhow::Result<Self> {
        let span = tracing::trace_span!("lower");
        let _entered = span.enter();

        let mut terminals: Set<String> = Set::default();
        let mut nonterminals: Set<String> = Set::default();
        let mut start = None;
        let mut rules = vec![];
        let mut precs = vec![];

        for stmt in &file.stmts {
            match stmt {
                ast::Stmt::Terminal(stmt) => {
                    for ident in &stmt.idents {
                        if !terminals.insert(ident.name.clone()) {
                            anyhow::bail!(
                                "{}: the terminal `{}' has already been declared",
                                ident.position,
                                ident.name
                            );
                        }
                    }
                }
                ast::Stmt::Start(stmt) => {
                    if let Some(prev) = start.replace(&stmt.name) {
                        anyhow::bail!(
                            "{}: the start symbol has already been specified at {}",
                            stmt.name.position,
                            prev.position
                        );
                    }
                }
                ast::Stmt::Rule(stmt) => {
                    nonterminals.insert(stmt.left.name.clone());
                    rules.push(stmt);
                }
                ast::Stmt::Prec(stmt) => precs.push(stmt),
            }
        }

        // Quoted terminals are declared by their first use.
        let literals = rules
            .iter()
            .flat_map(|rule| rule.productions.iter().flat_map(|p| &p.elems))
            .chain(precs.iter().flat_map(|prec| &prec.handles));
        for elem in literals {
            if let ast::Elem::Literal(ident) = elem {
                if ident.name.is_empty() {
                    anyhow::bail!("{}: empty literal", ident.position);
                }
                terminals.insert(ident.name.clone());
            }
        }

        for rule in &rules {
            if terminals.contains(&rule.left.name) {
                anyhow::bail!(
                    "{}: the terminal `{}' cannot have production rules",
                    rule.left.position,
                    rule.left.name
                );
            }
        }

        #[derive(Copy, Clone)]
        enum Sym {
            T(usize),
            N(usize),
        }
        let resolve = |elem: &ast::Elem| -> anyhow::Result<Sym> {
            let ident = elem.ident();
            if let Some(i) = terminals.get_index_of(&ident.name) {
                return Ok(Sym::T(i));
            }
            match elem {
                ast::Elem::Ident(_) => nonterminals
                    .get_index_of(&ident.name)
                    .map(Sym::N)
                    .with_context(|| {
                        format!("{}: undefined symbol `{}'", ident.position, ident.name)
                    }),
                ast::Elem::Literal(_) => {
                    anyhow::bail!("{}: undefined terminal `{}'", ident.position, ident.name)
                }
            }
        };

        let mut productions = vec![];
        for rule in &rules {
            let left = nonterminals
                .get_index_of(&rule.left.name)
                .with_context(|| format!("{}: undefined symbol", rule.left.position))?;
            for production in &rule.productions {
                let right = production
                    .elems
                    .iter()
                    .map(&resolve)
                    .collect::<anyhow::Result<Vec<_>>>()?;
                productions.push((left, right));
            }
        }

        let start = match start {
            Some(name) => Some(nonterminals.get_index_of(&name.name).with_context(|| {
                format!(
                    "{}: the start symbol `{}' has no production rules",
                    name.position, name.name
                )
            })?),
            None => None,
        };

        let grammar = Grammar::define(|def| {
            let mut terminal_ids = Vec::with_capacity(terminals.len());
            for name in &terminals {
                terminal_ids.push(def.terminal(name)?);
            }
            let mut nonterminal_ids: Vec<NonterminalID> = Vec::with_capacity(nonterminals.len());
            for name in &nonterminals {
                nonterminal_ids.push(def.nonterminal(name)?);
            }
            for (left, right) in &productions {
                let right = right.iter().map(|sym| match *sym {
                    Sym::T(i) => SymbolID::T(terminal_ids[i]),
                    Sym::N(i) => SymbolID::N(nonterminal_ids[i]),
                });
                def.rule(nonterminal_ids[*left], right)?;
            }
            if let Some(start) = start {
                def.start_symbol(nonterminal_ids[start])?;
            }
            Ok(())
        })?;

        let mut precedence = PrecedenceLevels::new();
        for prec in precs {
            let mut handles = vec![];
            for handle in &prec.handles {
                let ident = handle.ident();
                let id = grammar.find_terminal(&ident.name).with_context(|| {
                    format!(
                        "{}: the precedence handle `{}' is not a terminal",
                        ident.position, ident.name
                    )
                })?;
                handles.push(id);
            }
            precedence.push(PrecedenceLevel::new(prec.assoc, handles));
        }

        tracing::trace!(
            terminals = terminals.len(),
            nonterminals = nonterminals.len(),
            levels = precedence.levels().len(),
            "lowered the grammar file"
        );
        Ok(Self {
            grammar,
            precedence,
        })
    }

    /// Return the build configuration using `method` and the declared precedence.
    pub fn config(&self, method: Method) -> Config {
        let mut config = Config::new();
        config.with_method(method).precedence(self.precedence.clone());
        config
    }
}

impl FromStr for Definition {
    type Err = anyhow::Error;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::from_ast(&parse(source)?)
    }
}

/// Parse the source of a grammar file.
pub fn parse(source: &str) -> anyhow::Result<ast::File> {
    parse_source(source, None)
}

fn parse_source(source: &str, filename: Option<Arc<str>>) -> anyhow::Result<ast::File> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let meta = Meta::get()?;
    let parser = Parser::new(&meta.table);
    let tokens = Tokens {
        tokens: Lexer::new(source),
        terminals: &meta.terminals,
        filename,
        end: Position::new(0, 1, 1),
    };
    let mut actions = Actions {
        rules: &meta.rules,
        error: None,
    };

    let parsed = parser.run(tokens, &mut actions);
    if let Some(err) = actions.error {
        return Err(err);
    }
    match parsed {
        Ok(Value::File(file)) => Ok(file),
        Ok(..) => anyhow::bail!("unexpected parse result"),
        Err(ParseError::Table {
            source: LookupError::NoAction { .. },
            lexeme,
            position,
        }) => {
            if lexeme.is_empty() {
                anyhow::bail!("{}: syntax error: unexpected end of input", position)
            } else {
                anyhow::bail!("{}: syntax error: unexpected `{}'", position, lexeme)
            }
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Copy, Clone)]
enum Rule {
    File,
    StmtsEmpty,
    StmtsCons,
    Terminal,
    Start,
    Rule,
    RuleBar,
    Prec,
    IdentsOne,
    IdentsCons,
    ProductionsOne,
    ProductionsCons,
    ProductionEmpty,
    ProductionElems,
    ElemsOne,
    ElemsCons,
    ElemIdent,
    ElemLiteral,
    AssocLeft,
    AssocRight,
    AssocNonassoc,
}

#[derive(Debug, Copy, Clone)]
struct Terminals {
    terminal: TerminalID,
    start: TerminalID,
    rule: TerminalID,
    empty: TerminalID,
    left: TerminalID,
    right: TerminalID,
    nonassoc: TerminalID,
    colon_eq: TerminalID,
    comma: TerminalID,
    semicolon: TerminalID,
    vert_bar: TerminalID,
    ident: TerminalID,
    literal: TerminalID,
}

impl Terminals {
    fn classify<'input>(&self, token: Token<'input>) -> (TerminalID, &'input str) {
        match token {
            Token::ColonEq => (self.colon_eq, ":="),
            Token::Comma => (self.comma, ","),
            Token::Semicolon => (self.semicolon, ";"),
            Token::VertBar => (self.vert_bar, "|"),
            Token::Kw(kw) => {
                let id = match kw {
                    Keyword::Terminal => self.terminal,
                    Keyword::Start => self.start,
                    Keyword::Rule => self.rule,
                    Keyword::Empty => self.empty,
                    Keyword::Left => self.left,
                    Keyword::Right => self.right,
                    Keyword::Nonassoc => self.nonassoc,
                };
                (id, kw.as_str())
            }
            Token::Ident(ident) => (self.ident, ident),
            Token::Literal(literal) => (self.literal, literal),
        }
    }
}

/// The grammar of grammar files, parsed by its own LALR(1) table.
#[derive(Debug)]
struct Meta {
    table: ParsingTable,
    terminals: Terminals,
    rules: Map<ProductionID, Rule>,
}

impl Meta {
    fn get() -> anyhow::Result<&'static Self> {
        static META: OnceLock<Meta> = OnceLock::new();
        if let Some(meta) = META.get() {
            return Ok(meta);
        }
        let meta = Self::new().context("failed to construct the grammar of grammar files")?;
        Ok(META.get_or_init(|| meta))
    }

    fn new() -> anyhow::Result<Self> {
        use SymbolID::*;

        let mut terminals = None;
        let mut rules: Map<ProductionID, Rule> = Map::default();
        let grammar = Grammar::define(|def| {
            let t = Terminals {
                terminal: def.terminal(Keyword::Terminal.as_str())?,
                start: def.terminal(Keyword::Start.as_str())?,
                rule: def.terminal(Keyword::Rule.as_str())?,
                empty: def.terminal(Keyword::Empty.as_str())?,
                left: def.terminal(Keyword::Left.as_str())?,
                right: def.terminal(Keyword::Right.as_str())?,
                nonassoc: def.terminal(Keyword::Nonassoc.as_str())?,
                colon_eq: def.terminal(":=")?,
                comma: def.terminal(",")?,
                semicolon: def.terminal(";")?,
                vert_bar: def.terminal("|")?,
                ident: def.terminal("IDENT")?,
                literal: def.terminal("LITERAL")?,
            };
            terminals = Some(t);

            let file = def.nonterminal("File")?;
            let stmts = def.nonterminal("Stmts")?;
            let stmt = def.nonterminal("Stmt")?;
            let idents = def.nonterminal("Idents")?;
            let productions = def.nonterminal("Productions")?;
            let production = def.nonterminal("Production")?;
            let elems = def.nonterminal("Elems")?;
            let elem = def.nonterminal("Elem")?;
            let assoc = def.nonterminal("Assoc")?;

            let mut rule = |left: NonterminalID, right: &[SymbolID], kind: Rule| {
                let id = def.rule(left, right.iter().copied())?;
                rules.insert(id, kind);
                Ok::<_, GrammarDefError>(())
            };
            rule(file, &[N(stmts)], Rule::File)?;
            rule(stmts, &[], Rule::StmtsEmpty)?;
            rule(stmts, &[N(stmts), N(stmt), T(t.semicolon)], Rule::StmtsCons)?;
            rule(stmt, &[T(t.terminal), N(idents)], Rule::Terminal)?;
            rule(stmt, &[T(t.start), T(t.ident)], Rule::Start)?;
            rule(
                stmt,
                &[T(t.rule), T(t.ident), T(t.colon_eq), N(productions)],
                Rule::Rule,
            )?;
            rule(
                stmt,
                &[T(t.rule), T(t.ident), T(t.colon_eq), T(t.vert_bar), N(productions)],
                Rule::RuleBar,
            )?;
            rule(stmt, &[N(assoc), N(elems)], Rule::Prec)?;
            rule(idents, &[T(t.ident)], Rule::IdentsOne)?;
            rule(idents, &[N(idents), T(t.comma), T(t.ident)], Rule::IdentsCons)?;
            rule(productions, &[N(production)], Rule::ProductionsOne)?;
            rule(
                productions,
                &[N(productions), T(t.vert_bar), N(production)],
                Rule::ProductionsCons,
            )?;
            rule(production, &[T(t.empty)], Rule::ProductionEmpty)?;
            rule(production, &[N(elems)], Rule::ProductionElems)?;
            rule(elems, &[N(elem)], Rule::ElemsOne)?;
            rule(elems, &[N(elems), N(elem)], Rule::ElemsCons)?;
            rule(elem, &[T(t.ident)], Rule::ElemIdent)?;
            rule(elem, &[T(t.literal)], Rule::ElemLiteral)?;
            rule(assoc, &[T(t.left)], Rule::AssocLeft)?;
            rule(assoc, &[T(t.right)], Rule::AssocRight)?;
            rule(assoc, &[T(t.nonassoc)], Rule::AssocNonassoc)?;
            Ok(())
        })?;

        let terminals = terminals.context("the terminals are not declared")?;
        let table = Config::new().use_lalr().build(&grammar)?;
        Ok(Self {
            table,
            terminals,
            rules,
        })
    }
}

/// Feeds the tokens of the lexgen lexer to the parser.
struct Tokens<'m, I> {
    tokens: I,
    terminals: &'m Terminals,
    filename: Option<Arc<str>>,
    end: Position,
}

impl<I> Tokens<'_, I> {
    fn locate(&self, loc: Loc) -> Position {
        let position = Position::new(loc.byte_idx, loc.line + 1, loc.col + 1);
        match &self.filename {
            Some(filename) => position.with_filename(filename.clone()),
            None => position,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid token ({detail})")]
pub struct InvalidToken {
    detail: String,
}

impl<'input, I, E> runtime::Lexer<TerminalID> for Tokens<'_, I>
where
    I: Iterator<Item = Result<(Loc, Token<'input>, Loc), LexerError<E>>>,
    E: fmt::Debug,
{
    type Error = InvalidToken;

    fn next_token(&mut self) -> Result<Option<runtime::Token<TerminalID>>, InvalidToken> {
        match self.tokens.next() {
            None => Ok(None),
            Some(Ok((start, token, end))) => {
                tracing::trace!("offer token {:?}", token);
                self.end = self.locate(end);
                let (terminal, lexeme) = self.terminals.classify(token);
                Ok(Some(runtime::Token::new(
                    terminal,
                    lexeme,
                    self.locate(start),
                )))
            }
            Some(Err(err)) => {
                self.end = self.locate(err.location);
                Err(InvalidToken {
                    detail: format!("{:?}", err.kind),
                })
            }
        }
    }

    fn position(&self) -> Position {
        self.end.clone()
    }
}

enum Value {
    Token(runtime::Token<TerminalID>),
    File(ast::File),
    Stmts(Vec<ast::Stmt>),
    Stmt(ast::Stmt),
    Idents(Vec<ast::Ident>),
    Productions(Vec<ast::Production>),
    Production(ast::Production),
    Elems(Vec<ast::Elem>),
    Elem(ast::Elem),
    Assoc(Assoc),
    Invalid,
}

struct Actions<'m> {
    rules: &'m Map<ProductionID, Rule>,
    error: Option<anyhow::Error>,
}

impl Actions<'_> {
    fn reduce_args(&self, production: ProductionID, args: Vec<Value>) -> anyhow::Result<Value> {
        use self::ast::*;
        use Value as v;

        let rule = self
            .rules
            .get(&production)
            .copied()
            .context("unknown production")?;
        tracing::trace!("reducing: {:?}", rule);

        let mut args = args.into_iter();
        macro_rules! pop {
            ($Variant:ident) => {
                match args.next() {
                    Some(Value::$Variant(item)) => item,
                    _ => anyhow::bail!(concat!(
                        "unexpected stack item, expecting ",
                        stringify!($Variant)
                    )),
                }
            };
        }
        macro_rules! ident {
            () => {{
                let token = pop!(Token);
                Ident {
                    name: token.lexeme,
                    position: token.position,
                }
            }};
        }

        Ok(match rule {
            Rule::File => v::File(File { stmts: pop!(Stmts) }),

            Rule::StmtsEmpty => v::Stmts(vec![]),
            Rule::StmtsCons => {
                let mut stmts = pop!(Stmts);
                stmts.push(pop!(Stmt));
                v::Stmts(stmts)
            }

            Rule::Terminal => {
                pop!(Token);
                v::Stmt(Stmt::Terminal(TerminalStmt {
                    idents: pop!(Idents),
                }))
            }
            Rule::Start => {
                pop!(Token);
                v::Stmt(Stmt::Start(StartStmt { name: ident!() }))
            }
            Rule::Rule | Rule::RuleBar => {
                pop!(Token);
                let left = ident!();
                pop!(Token);
                if let Rule::RuleBar = rule {
                    pop!(Token);
                }
                v::Stmt(Stmt::Rule(RuleStmt {
                    left,
                    productions: pop!(Productions),
                }))
            }
            Rule::Prec => {
                let assoc = pop!(Assoc);
                v::Stmt(Stmt::Prec(PrecStmt {
                    assoc,
                    handles: pop!(Elems),
                }))
            }

            Rule::IdentsOne => v::Idents(vec![ident!()]),
            Rule::IdentsCons => {
                let mut idents = pop!(Idents);
                pop!(Token);
                idents.push(ident!());
                v::Idents(idents)
            }

            Rule::ProductionsOne => v::Productions(vec![pop!(Production)]),
            Rule::ProductionsCons => {
                let mut productions = pop!(Productions);
                pop!(Token);
                productions.push(pop!(Production));
                v::Productions(productions)
            }

            Rule::ProductionEmpty => {
                pop!(Token);
                v::Production(Production { elems: vec![] })
            }
            Rule::ProductionElems => v::Production(Production {
                elems: pop!(Elems),
            }),

            Rule::ElemsOne => v::Elems(vec![pop!(Elem)]),
            Rule::ElemsCons => {
                let mut elems = pop!(Elems);
                elems.push(pop!(Elem));
                v::Elems(elems)
            }

            Rule::ElemIdent => v::Elem(Elem::Ident(ident!())),
            Rule::ElemLiteral => v::Elem(Elem::Literal(ident!())),

            Rule::AssocLeft => {
                pop!(Token);
                v::Assoc(Assoc::Left)
            }
            Rule::AssocRight => {
                pop!(Token);
                v::Assoc(Assoc::Right)
            }
            Rule::AssocNonassoc => {
                pop!(Token);
                v::Assoc(Assoc::Nonassoc)
            }
        })
    }
}

impl<'t> Semantics<&'t ParsingTable> for Actions<'_> {
    type Value = Value;

    fn shift(&mut self, token: runtime::Token<TerminalID>) -> Value {
        Value::Token(token)
    }

    fn reduce(&mut self, production: ProductionID, _: NonterminalID, args: Vec<Value>) -> Value {
        if self.error.is_some() {
            return Value::Invalid;
        }
        match self.reduce_args(production, args) {
            Ok(value) => value,
            Err(err) => {
                self.error = Some(err);
                Value::Invalid
            }
        }
    }
}
