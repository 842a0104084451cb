use crate::precedence::Assoc;
use lrgen_runtime::Position;

#[derive(Debug)]
pub struct File {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Stmt {
    Terminal(TerminalStmt),
    Start(StartStmt),
    Rule(RuleStmt),
    Prec(PrecStmt),
}

#[derive(Debug)]
pub struct TerminalStmt {
    pub idents: Vec<Ident>,
}

#[derive(Debug)]
pub struct StartStmt {
    pub name: Ident,
}

#[derive(Debug)]
pub struct RuleStmt {
    pub left: Ident,
    pub productions: Vec<Production>,
}

#[derive(Debug)]
pub struct PrecStmt {
    pub assoc: Assoc,
    pub handles: Vec<Elem>,
}

#[derive(Debug)]
pub struct Production {
    pub elems: Vec<Elem>,
}

#[derive(Debug)]
pub enum Elem {
    Ident(Ident),
    Literal(Ident),
}

impl Elem {
    pub fn ident(&self) -> &Ident {
        match self {
            Self::Ident(ident) | Self::Literal(ident) => ident,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub position: Position,
}
