//! Grammar definition for integration tests.

use lrgen::grammar::{GrammarDef, GrammarDefError, SymbolID::*};

type Result = std::result::Result<(), GrammarDefError>;

/// The expression grammar with the usual layering of `+` and `*`.
pub fn arithmetic(g: &mut GrammarDef) -> Result {
    let plus = g.terminal("+")?;
    let star = g.terminal("*")?;
    let lparen = g.terminal("(")?;
    let rparen = g.terminal(")")?;
    let id = g.terminal("id")?;

    let e = g.nonterminal("E")?;
    let t = g.nonterminal("T")?;
    let f = g.nonterminal("F")?;

    g.rule(e, [N(e), T(plus), N(t)])?; // E '+' T
    g.rule(e, [N(t)])?;
    g.rule(t, [N(t), T(star), N(f)])?; // T '*' F
    g.rule(t, [N(f)])?;
    g.rule(f, [T(lparen), N(e), T(rparen)])?; // '(' E ')'
    g.rule(f, [T(id)])?;
    Ok(())
}

/// The same language as [`arithmetic`], left to precedence for disambiguation.
pub fn ambiguous(g: &mut GrammarDef) -> Result {
    let plus = g.terminal("+")?;
    let star = g.terminal("*")?;
    let lparen = g.terminal("(")?;
    let rparen = g.terminal(")")?;
    let id = g.terminal("id")?;

    let e = g.nonterminal("E")?;

    g.rule(e, [N(e), T(plus), N(e)])?;
    g.rule(e, [N(e), T(star), N(e)])?;
    g.rule(e, [T(lparen), N(e), T(rparen)])?;
    g.rule(e, [T(id)])?;
    Ok(())
}

// S → L = R | R
// L → * R | id
// R → L
pub fn knuth(g: &mut GrammarDef) -> Result {
    let equal = g.terminal("=")?;
    let star = g.terminal("*")?;
    let id = g.terminal("id")?;

    let s = g.nonterminal("S")?;
    let l = g.nonterminal("L")?;
    let r = g.nonterminal("R")?;

    g.rule(s, [N(l), T(equal), N(r)])?;
    g.rule(s, [N(r)])?;
    g.rule(l, [T(star), N(r)])?;
    g.rule(l, [T(id)])?;
    g.rule(r, [N(l)])?;
    Ok(())
}

// S → C C
// C → c C | d
pub fn cc(g: &mut GrammarDef) -> Result {
    let c = g.terminal("c")?;
    let d = g.terminal("d")?;

    let s = g.nonterminal("S")?;
    let cc = g.nonterminal("C")?;

    g.rule(s, [N(cc), N(cc)])?;
    g.rule(cc, [T(c), N(cc)])?;
    g.rule(cc, [T(d)])?;
    Ok(())
}

pub fn g2(g: &mut GrammarDef) -> Result {
    let comma = g.terminal("COMMA")?;
    let colon = g.terminal("COLON")?;
    let ident = g.terminal("ID")?;

    let def = g.nonterminal("DEF")?;
    let param_spec = g.nonterminal("PARAM_SPEC")?;
    let return_spec = g.nonterminal("RETURN_SPEC")?;
    let type_ = g.nonterminal("TYPE")?;
    let name = g.nonterminal("NAME")?;
    let name_list = g.nonterminal("NAME_LIST")?;

    g.rule(def, [N(param_spec), N(return_spec), T(comma)])?;
    g.rule(param_spec, [N(type_)])?;
    g.rule(param_spec, [N(name_list), T(colon), N(type_)])?;
    g.rule(return_spec, [N(type_)])?;
    g.rule(return_spec, [N(name), T(colon), N(type_)])?;
    g.rule(type_, [T(ident)])?;
    g.rule(name, [T(ident)])?;
    g.rule(name_list, [N(name)])?;
    g.rule(name_list, [N(name), T(comma), N(name_list)])?;
    Ok(())
}

pub fn min_caml(g: &mut GrammarDef) -> Result {
    let l_paren = g.terminal("LPAREN")?;
    let r_paren = g.terminal("RPAREN")?;
    let t_true = g.terminal("TRUE")?;
    let t_false = g.terminal("FALSE")?;
    let integer = g.terminal("INTEGER")?;
    let float = g.terminal("FLOAT")?;
    let ident = g.terminal("IDENT")?;
    let t_not = g.terminal("NOT")?;
    let plus = g.terminal("PLUS")?;
    let plus_dot = g.terminal("PLUS_DOT")?;
    let minus = g.terminal("MINUS")?;
    let minus_dot = g.terminal("MINUS_DOT")?;
    let star_dot = g.terminal("STAR_DOT")?;
    let slash_dot = g.terminal("SLASH_DOT")?;
    let equal = g.terminal("EQUAL")?;
    let less_greater = g.terminal("LESS_GREATER")?;
    let less = g.terminal("LESS")?;
    let greater = g.terminal("GREATER")?;
    let less_equal = g.terminal("LESS_EQUAL")?;
    let greater_equal = g.terminal("GREATER_EQUAL")?;
    let less_minus = g.terminal("LESS_MINUS")?;
    let comma = g.terminal("COMMA")?;
    let semicolon = g.terminal("SEMICOLON")?;
    let t_if = g.terminal("IF")?;
    let t_then = g.terminal("THEN")?;
    let t_else = g.terminal("ELSE")?;
    let t_let = g.terminal("LET")?;
    let t_rec = g.terminal("REC")?;
    let t_in = g.terminal("IN")?;
    let array_make = g.terminal("ARRAY_MAKE")?;
    let dot = g.terminal("DOT")?;

    let exp = g.nonterminal("EXPR")?;
    let simple_exp = g.nonterminal("SIMPLE_EXP")?;
    let app_exp = g.nonterminal("APP_EXP")?;
    let neg_exp = g.nonterminal("NEG_EXP")?;
    let mult_exp = g.nonterminal("MULT_EXP")?;
    let add_exp = g.nonterminal("ADD_EXP")?;
    let rel_exp = g.nonterminal("REL_EXP")?;
    let tuple_exp = g.nonterminal("TUPLE_EXP")?;
    let put_exp = g.nonterminal("PUT_EXP")?;
    let if_exp = g.nonterminal("IF_EXP")?;
    let let_exp = g.nonterminal("LET_EXP")?;
    let formal_args = g.nonterminal("FORMAL_ARGS")?;
    let actual_args = g.nonterminal("ACTUAL_ARGS")?;
    let tuple_exp_rest = g.nonterminal("TUPLE_EXP_REST")?;
    let fundef = g.nonterminal("FUNDEF")?;
    let pat = g.nonterminal("PAT")?;

    g.rule(simple_exp, [T(l_paren), N(exp), T(r_paren)])?;
    g.rule(simple_exp, [T(l_paren), T(r_paren)])?;
    g.rule(simple_exp, [T(t_true)])?;
    g.rule(simple_exp, [T(t_false)])?;
    g.rule(simple_exp, [T(integer)])?;
    g.rule(simple_exp, [T(float)])?;
    g.rule(simple_exp, [T(ident)])?;
    g.rule(simple_exp, [N(simple_exp), T(dot), T(l_paren), N(exp), T(r_paren)])?;

    g.rule(app_exp, [N(simple_exp)])?;
    g.rule(app_exp, [N(simple_exp), N(actual_args)])?;
    g.rule(app_exp, [T(array_make), N(simple_exp), N(simple_exp)])?;
    g.rule(app_exp, [T(t_not), N(app_exp)])?;

    g.rule(neg_exp, [N(app_exp)])?;
    g.rule(neg_exp, [T(minus), N(neg_exp)])?;
    g.rule(neg_exp, [T(minus_dot), N(neg_exp)])?;

    g.rule(mult_exp, [N(neg_exp)])?;
    g.rule(mult_exp, [N(mult_exp), T(star_dot), N(neg_exp)])?;
    g.rule(mult_exp, [N(mult_exp), T(slash_dot), N(neg_exp)])?;

    g.rule(add_exp, [N(mult_exp)])?;
    for op in [plus, minus, plus_dot, minus_dot] {
        g.rule(add_exp, [N(add_exp), T(op), N(mult_exp)])?;
    }

    g.rule(rel_exp, [N(add_exp)])?;
    for op in [equal, less_greater, less, greater, less_equal, greater_equal] {
        g.rule(rel_exp, [N(rel_exp), T(op), N(add_exp)])?;
    }

    g.rule(tuple_exp, [N(rel_exp)])?;
    g.rule(tuple_exp, [N(rel_exp), T(comma), N(tuple_exp_rest)])?;
    g.rule(tuple_exp_rest, [N(rel_exp)])?;
    g.rule(tuple_exp_rest, [N(rel_exp), T(comma), N(tuple_exp_rest)])?;

    g.rule(put_exp, [N(tuple_exp)])?;
    g.rule(
        put_exp,
        [
            N(simple_exp),
            T(dot),
            T(l_paren),
            N(exp),
            T(r_paren),
            T(less_minus),
            N(exp),
        ],
    )?;

    g.rule(if_exp, [N(put_exp)])?;
    g.rule(
        if_exp,
        [T(t_if), N(exp), T(t_then), N(exp), T(t_else), N(exp)],
    )?;

    g.rule(
        let_exp,
        [T(t_let), T(ident), T(equal), N(exp), T(t_in), N(exp)],
    )?;
    g.rule(let_exp, [T(t_let), T(t_rec), N(fundef), T(t_in), N(exp)])?;
    g.rule(
        let_exp,
        [
            T(t_let),
            T(l_paren),
            N(pat),
            T(r_paren),
            T(equal),
            N(exp),
            T(t_in),
            N(exp),
        ],
    )?;

    g.rule(fundef, [T(ident), N(formal_args), T(equal), N(exp)])?;
    g.rule(formal_args, [T(ident), N(formal_args)])?;
    g.rule(formal_args, [T(ident)])?;
    g.rule(actual_args, [N(actual_args), N(simple_exp)])?;
    g.rule(actual_args, [N(simple_exp)])?;
    g.rule(pat, [N(pat), T(comma), T(ident)])?;
    g.rule(pat, [T(ident), T(comma), T(ident)])?;

    g.rule(exp, [N(if_exp)])?;
    g.rule(exp, [N(if_exp), T(semicolon), N(exp)])?;
    g.rule(exp, [N(let_exp)])?;

    g.start_symbol(exp)?;
    Ok(())
}
