use lrgen::{
    build::{BuildError, Config, Method},
    grammar::{GrammarDef, GrammarDefError, ProductionID, TerminalID},
    state_map::StateID,
    table::{ConflictKind, LookupError},
    ErrorKind, Grammar, ParsingTable, PrecedenceLevels,
};
use lrgen_runtime::{Callbacks, ParseError, ParseTable, Parser, Token};
use lrgen_tests::{grammars, lexer::Tokens};
use std::collections::BTreeSet;

type GrammarFn = fn(&mut GrammarDef) -> Result<(), GrammarDefError>;

#[derive(Default)]
struct Recorder {
    tokens: Vec<String>,
    productions: Vec<ProductionID>,
}

impl<TDef> Callbacks<TDef> for Recorder
where
    TDef: ParseTable<Terminal = TerminalID, Production = ProductionID>,
{
    fn on_token(&mut self, token: &Token<TDef::Terminal>) {
        self.tokens.push(token.lexeme.clone());
    }

    fn on_production(&mut self, production: TDef::Production) {
        self.productions.push(production);
    }
}

impl Recorder {
    fn rendered(&self, table: &ParsingTable) -> Vec<String> {
        let g = table.grammar();
        self.productions
            .iter()
            .map(|id| g.production(*id).display(g).to_string())
            .collect()
    }
}

fn table(f: GrammarFn, config: &Config) -> ParsingTable {
    let g = Grammar::define(f).unwrap();
    config.build(&g).unwrap()
}

fn record(table: &ParsingTable, input: &str) -> Recorder {
    let mut recorder = Recorder::default();
    Parser::new(table)
        .parse(Tokens::new(table.grammar(), input), &mut recorder)
        .unwrap();
    recorder
}

fn conflicts(err: BuildError) -> Vec<lrgen::table::Conflict> {
    match err {
        BuildError::Conflicts(err) => err.conflicts,
        err => panic!("unexpected error: {}", err),
    }
}

#[test]
fn slr_arithmetic_reductions() {
    let table = table(grammars::arithmetic, Config::new().use_slr());
    let recorder = record(&table, "id + id * id");
    assert_eq!(recorder.tokens, ["id", "+", "id", "*", "id"]);
    assert_eq!(
        recorder.rendered(&table),
        [
            "F → id",
            "T → F",
            "E → T",
            "F → id",
            "T → F",
            "F → id",
            "T → T '*' F",
            "E → E '+' T",
        ]
    );
}

#[test]
fn ambiguous_grammar_with_precedence() {
    let g = Grammar::define(grammars::ambiguous).unwrap();
    let conflicts = conflicts(Config::new().use_slr().build(&g).unwrap_err());
    assert_eq!(conflicts.len(), 4);
    assert!(conflicts.iter().all(|c| c.kind == ConflictKind::ShiftReduce));

    let plus = g.find_terminal("+").unwrap();
    let star = g.find_terminal("*").unwrap();
    let table = Config::new()
        .use_slr()
        .precedence(PrecedenceLevels::new().left([star]).left([plus]))
        .build(&g)
        .unwrap();
    assert!(table.conflicts().is_ok());

    let recorder = record(&table, "id + id * id");
    assert_eq!(
        recorder.rendered(&table),
        [
            "E → id",
            "E → id",
            "E → id",
            "E → E '*' E",
            "E → E '+' E",
        ]
    );

    // Same level, left associative.
    let recorder = record(&table, "id + id + id");
    assert_eq!(
        recorder.rendered(&table),
        ["E → id", "E → id", "E → E '+' E", "E → id", "E → E '+' E"]
    );
}

#[test]
fn knuth_needs_lookahead_sets() {
    let g = Grammar::define(grammars::knuth).unwrap();
    let conflicts = conflicts(Config::new().use_slr().build(&g).unwrap_err());
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].terminal, g.find_terminal("=").unwrap());
    assert_eq!(conflicts[0].kind, ConflictKind::ShiftReduce);

    let table = Config::new().use_lalr().build(&g).unwrap();
    let recorder = record(&table, "* id = id");
    assert_eq!(
        recorder.rendered(&table),
        ["L → id", "R → L", "L → '*' R", "L → id", "R → L", "S → L '=' R"]
    );
}

#[test]
fn canonical_cc() {
    let table = table(grammars::cc, Config::new().use_canonical());
    assert_eq!(table.len(), 10);
    let recorder = record(&table, "c d c d");
    assert_eq!(
        recorder.rendered(&table),
        ["C → d", "C → c C", "C → d", "C → c C", "S → C C"]
    );
}

#[test]
fn handle_on_two_levels() {
    let g = Grammar::define(grammars::ambiguous).unwrap();
    let plus = g.find_terminal("+").unwrap();
    let star = g.find_terminal("*").unwrap();
    let err = Config::new()
        .precedence(
            PrecedenceLevels::new()
                .left([plus])
                .left([star])
                .right([plus]),
        )
        .build(&g)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPrecedence);
    match err {
        BuildError::Precedence(err) => {
            assert_eq!(err.duplicates.len(), 1);
            assert_eq!(err.duplicates[0].levels, [0, 2]);
        }
        err => panic!("unexpected error: {}", err),
    }
}

#[test]
fn empty_input_is_rejected_before_any_callback() {
    let table = table(grammars::arithmetic, &Config::new());
    let mut recorder = Recorder::default();
    let err = Parser::new(&table)
        .parse(Tokens::new(table.grammar(), "   "), &mut recorder)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoAction);
    match err {
        ParseError::Table {
            source: LookupError::NoAction {
                state, terminal, ..
            },
            ..
        } => {
            assert_eq!(state, StateID::INITIAL);
            assert_eq!(terminal, TerminalID::EOI);
        }
        err => panic!("unexpected error: {}", err),
    }
    assert!(recorder.tokens.is_empty());
    assert!(recorder.productions.is_empty());
}

#[test]
fn syntax_errors_carry_positions() {
    let table = table(grammars::arithmetic, &Config::new());
    let err = Parser::new(&table)
        .recognize(Tokens::new(table.grammar(), "id +\n  * id"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoAction);
    let position = err.position();
    assert_eq!((position.line, position.column), (2, 3));

    let err = Parser::new(&table)
        .recognize(Tokens::new(table.grammar(), "id + ?"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LexerFailure);
}

#[test]
fn callbacks_match_the_tree() {
    let table = table(grammars::arithmetic, &Config::new());
    let parser = Parser::new(&table);
    for input in ["id", "(id)", "id * (id + id) * id", "((id))"] {
        let mut recorder = Recorder::default();
        let tree = parser
            .parse_tree_with(Tokens::new(table.grammar(), input), &mut recorder)
            .unwrap();
        assert_eq!(tree.count_internal(), recorder.productions.len(), "{}", input);
        assert_eq!(
            tree.productions().into_iter().copied().collect::<Vec<_>>(),
            recorder.productions,
        );
        let leaves: Vec<_> = tree.leaves().map(|t| t.lexeme.clone()).collect();
        assert_eq!(leaves, recorder.tokens);
    }
}

#[test]
fn evaluate_arithmetic() {
    let table = table(grammars::arithmetic, &Config::new());
    let g = table.grammar();
    let find = |rendered: &str| {
        g.productions()
            .find(|p| p.display(g).to_string() == rendered)
            .map(|p| p.id())
            .unwrap()
    };
    let add = find("E → E '+' T");
    let mul = find("T → T '*' F");
    let paren = find("F → '(' E ')'");

    let value = Parser::new(&table)
        .evaluate(
            Tokens::new(g, "2 + 3 * (4 + 1)"),
            |token| token.lexeme.parse::<i64>().unwrap_or(0),
            |production, args| match production {
                p if p == add => args[0] + args[2],
                p if p == mul => args[0] * args[2],
                p if p == paren => args[1],
                _ => args[0],
            },
        )
        .unwrap();
    assert_eq!(value, 17);
}

#[test]
fn tables_are_deterministic() {
    let fixtures: [GrammarFn; 4] = [
        grammars::arithmetic,
        grammars::knuth,
        grammars::cc,
        grammars::g2,
    ];
    for f in fixtures {
        let g = Grammar::define(f).unwrap();
        for method in Method::ALL {
            let first = lrgen::build_table(&g, method).unwrap().to_string();
            let second = lrgen::build_table(&g, method).unwrap().to_string();
            assert_eq!(first, second, "{}", method);
        }
    }
}

#[test]
fn lalr_keeps_the_lr0_states() {
    let fixtures: [GrammarFn; 5] = [
        grammars::arithmetic,
        grammars::knuth,
        grammars::cc,
        grammars::g2,
        grammars::min_caml,
    ];
    for f in fixtures {
        let g = Grammar::define(f).unwrap();
        let lr0 = lrgen::build_table(&g, Method::Lr0).unwrap();
        let slr = lrgen::build_table(&g, Method::Slr).unwrap();
        let lalr = lrgen::build_table(&g, Method::Lalr).unwrap();
        let lr1 = lrgen::build_table(&g, Method::Lr1).unwrap();
        assert_eq!(lr0.len(), slr.len());
        assert_eq!(lr0.len(), lalr.len());
        assert!(lr1.len() >= lalr.len());

        // Lookaheads only ever remove conflicts.
        let cells = |t: &ParsingTable| t.conflict_cells().count();
        assert!(cells(&lalr) <= cells(&slr));
        assert!(cells(&slr) <= cells(&lr0));
        if cells(&slr) == 0 || cells(&lalr) == 0 {
            assert_eq!(cells(&lr1), 0);
        }

        // Canonical states may split a conflicting LALR state, but never
        // conflict on a terminal the merged table does not.
        let terminals = |t: &ParsingTable| {
            t.conflict_cells()
                .map(|(_, terminal, _)| terminal)
                .collect::<BTreeSet<_>>()
        };
        assert!(terminals(&lr1).is_subset(&terminals(&lalr)));
    }
}
