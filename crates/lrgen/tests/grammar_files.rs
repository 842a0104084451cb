use lrgen::{
    build::{BuildError, Method},
    syntax::Definition,
    table::ConflictKind,
    ErrorKind,
};
use std::{env, path::PathBuf};

fn load(name: &str) -> Definition {
    let path = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
        .join(format!("tests/grammars/{}.lll", name));
    Definition::from_file(&path).unwrap()
}

macro_rules! define_tests {
    ($($name:ident => [$($method:ident),*]),*$(,)?) => {$(
        #[test]
        fn $name() {
            let def = load(stringify!($name));
            for method in [$(Method::$method),*] {
                let table = def.config(method).build(&def.grammar).unwrap();
                assert!(table.conflicts().is_ok(), "{}", method);
            }
        }
    )*};
}

define_tests! {
    arithmetic => [Slr, Lr1, Lalr],
    arithmetic_prec => [Slr, Lr1, Lalr],
    knuth => [Lr1, Lalr],
    cc => [Lr0, Slr, Lr1, Lalr],
    json => [Slr, Lr1, Lalr],
    stmts => [Slr, Lr1, Lalr],
}

#[test]
fn knuth_is_not_slr() {
    let def = load("knuth");
    let err = def.config(Method::Slr).build(&def.grammar).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TableConflict);
    let conflicts = match err {
        BuildError::Conflicts(err) => err.conflicts,
        err => panic!("unexpected error: {}", err),
    };
    let eq = def.grammar.find_terminal("=").unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].terminal, eq);
    assert_eq!(conflicts[0].kind, ConflictKind::ShiftReduce);
}

#[test]
fn nonassoc_operators_do_not_chain() {
    let def = load("nonassoc");
    let lt = def.grammar.find_terminal("<").unwrap();
    for method in [Method::Slr, Method::Lalr, Method::Lr1] {
        let err = def.config(method).build(&def.grammar).unwrap_err();
        let conflicts = match err {
            BuildError::Conflicts(err) => err.conflicts,
            err => panic!("unexpected error: {}", err),
        };
        assert!(!conflicts.is_empty());
        for conflict in &conflicts {
            assert_eq!(conflict.terminal, lt);
            assert_eq!(conflict.kind, ConflictKind::ShiftReduce);
            let rendered = conflict.to_string();
            assert!(rendered.contains("not resolvable: '<' on a non-associative level"));
            assert!(!rendered.contains("assign precedence to"));
            assert!(rendered.contains("hint: handles listed earlier"));
        }
    }
}

#[test]
fn lalr_merges_canonical_states() {
    let def = load("cc");
    let lalr = def.config(Method::Lalr).build(&def.grammar).unwrap();
    let lr1 = def.config(Method::Lr1).build(&def.grammar).unwrap();
    let lr0 = def.config(Method::Lr0).build(&def.grammar).unwrap();
    assert_eq!(lalr.len(), 7);
    assert_eq!(lr0.len(), 7);
    assert_eq!(lr1.len(), 10);
}

#[test]
fn table_rendering_is_deterministic() {
    let def = load("json");
    for method in [Method::Slr, Method::Lr1, Method::Lalr] {
        let first = def.config(method).build(&def.grammar).unwrap().to_string();
        let second = def.config(method).build(&def.grammar).unwrap().to_string();
        assert_eq!(first, second);
        assert!(first.starts_with("#### State 0\n"));
    }
}
