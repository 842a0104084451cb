use lrgen::{
    build::{build_table, Method},
    grammar::{Grammar, GrammarDef, GrammarDefError},
    lalr::LalrKernels,
};
use lrgen_tests::grammars;

fn smoketest_grammar(f: impl FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>) {
    let grammar = Grammar::define(f).unwrap();
    eprintln!("grammar:\n{}", grammar);
    eprintln!();

    let augmented = grammar.augment().unwrap();
    let kernels = LalrKernels::new(&augmented).unwrap();
    eprintln!("LALR states:\n---\n{}", kernels.states().display(&augmented));

    for method in Method::ALL {
        let table = build_table(&grammar, method).unwrap();
        eprintln!("{} table:\n---\n{}", method, table);
        if let Err(err) = table.conflicts() {
            eprintln!("{}", err);
        }
    }
}

#[test]
fn smoketest_arithmetic() {
    smoketest_grammar(grammars::arithmetic);
}

#[test]
fn smoketest_ambiguous() {
    smoketest_grammar(grammars::ambiguous);
}

#[test]
fn smoketest_knuth() {
    smoketest_grammar(grammars::knuth);
}

#[test]
fn smoketest_cc() {
    smoketest_grammar(grammars::cc);
}

#[test]
fn smoketest_g2() {
    smoketest_grammar(grammars::g2);
}

#[test]
fn smoketest_min_caml() {
    smoketest_grammar(grammars::min_caml);
}
