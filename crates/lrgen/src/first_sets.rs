//! Calculation of FIRST and FOLLOW sets.

use crate::{
    grammar::{Grammar, NonterminalID, SymbolID, TerminalID},
    types::Map,
};

/// A set of terminal symbols backed by a bit set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.to_index())
    }

    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.to_index())
    }

    /// Add the elements of `other`, returning whether this set has grown.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterate over the terminals in the grammar's terminal order.
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        let eoi = TerminalID::EOI.to_index();
        self.inner
            .iter()
            .filter(move |index| *index != eoi)
            .map(TerminalID::from_index)
            .chain(self.contains(TerminalID::EOI).then_some(TerminalID::EOI))
    }
}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(TerminalID::to_index).collect(),
        }
    }
}

/// The result of `FIRST(α)`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct First {
    pub terminals: TerminalSet,
    /// Whether `α` derives the empty string.
    pub nullable: bool,
}

#[derive(Debug)]
pub struct FirstSets {
    nullables: bit_set::BitSet,
    first_sets: Map<NonterminalID, TerminalSet>,
}

impl FirstSets {
    pub fn new(g: &Grammar) -> Self {
        let nullables = nulls_set(g);
        let first_sets = first_sets(g, &nullables);
        Self {
            nullables,
            first_sets,
        }
    }

    pub fn is_nullable(&self, n: NonterminalID) -> bool {
        self.nullables.contains(index(n))
    }

    /// Return `FIRST(A)` of a nonterminal, excluding the empty string.
    pub fn of(&self, n: NonterminalID) -> &TerminalSet {
        &self.first_sets[&n]
    }

    /// Calculate `FIRST(α)` for the string of symbols `α`.
    pub fn first(&self, symbols: &[SymbolID]) -> First {
        let mut terminals = TerminalSet::default();
        for symbol in symbols {
            match symbol {
                SymbolID::T(t) => {
                    terminals.insert(*t);
                    return First {
                        terminals,
                        nullable: false,
                    };
                }
                SymbolID::N(n) => {
                    terminals.union_with(&self.first_sets[n]);
                    if !self.is_nullable(*n) {
                        return First {
                            terminals,
                            nullable: false,
                        };
                    }
                }
            }
        }
        First {
            terminals,
            nullable: true,
        }
    }

    /// Calculate `FIRST(β a)`.
    pub fn first_with(&self, symbols: &[SymbolID], lookahead: TerminalID) -> TerminalSet {
        let First {
            mut terminals,
            nullable,
        } = self.first(symbols);
        if nullable {
            terminals.insert(lookahead);
        }
        terminals
    }
}

fn index(n: NonterminalID) -> usize {
    n.to_index()
}

/// Calculate the set of nullable symbols in this grammar.
fn nulls_set(g: &Grammar) -> bit_set::BitSet {
    let mut nulls = bit_set::BitSet::new();
    let mut changed = true;
    while changed {
        changed = false;
        for production in g.productions() {
            if nulls.contains(index(production.left())) {
                continue;
            }
            let is_rhs_nullable = production
                .right()
                .iter()
                .all(|s| matches!(s, SymbolID::N(n) if nulls.contains(index(*n))));
            if is_rhs_nullable {
                changed = true;
                nulls.insert(index(production.left()));
            }
        }
    }
    nulls
}

fn first_sets(g: &Grammar, nulls: &bit_set::BitSet) -> Map<NonterminalID, TerminalSet> {
    let mut map: Map<NonterminalID, TerminalSet> = g
        .nonterminals()
        .map(|n| (n.id(), TerminalSet::default()))
        .collect();

    // For `X → Y1 Y2 ... Yn`, FIRST(X) includes FIRST(Yi) up to the first non-nullable `Yi`.
    let mut changed = true;
    while changed {
        changed = false;
        for production in g.productions() {
            let mut added = TerminalSet::default();
            for symbol in production.right() {
                match symbol {
                    SymbolID::T(t) => {
                        added.insert(*t);
                        break;
                    }
                    SymbolID::N(n) => {
                        added.union_with(&map[n]);
                        if !nulls.contains(index(*n)) {
                            break;
                        }
                    }
                }
            }
            changed |= map[&production.left()].union_with(&added);
        }
    }

    map
}

/// The result of `FOLLOW(A)`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Follow {
    pub terminals: TerminalSet,
    /// Whether `A` can appear at the end of input.
    pub end_of_input: bool,
}

impl Follow {
    /// Iterate over the lookaheads, with the end of input last.
    pub fn lookaheads(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.terminals
            .iter()
            .filter(|t| *t != TerminalID::EOI)
            .chain(self.end_of_input.then_some(TerminalID::EOI))
    }
}

#[derive(Debug)]
pub struct FollowSets {
    follow_sets: Map<NonterminalID, Follow>,
}

impl FollowSets {
    pub fn new(g: &Grammar, first: &FirstSets) -> Self {
        let mut follow_sets: Map<NonterminalID, Follow> = g
            .nonterminals()
            .map(|n| (n.id(), Follow::default()))
            .collect();
        follow_sets[&g.start_symbol()].end_of_input = true;

        let mut changed = true;
        while changed {
            changed = false;
            for production in g.productions() {
                let right = production.right();
                for (i, symbol) in right.iter().enumerate() {
                    let n = match symbol {
                        SymbolID::N(n) => *n,
                        SymbolID::T(..) => continue,
                    };
                    let First {
                        terminals,
                        nullable,
                    } = first.first(&right[i + 1..]);
                    let (inherited, end_of_input) = if nullable {
                        let left = &follow_sets[&production.left()];
                        (Some(left.terminals.clone()), left.end_of_input)
                    } else {
                        (None, false)
                    };

                    let follow = &mut follow_sets[&n];
                    changed |= follow.terminals.union_with(&terminals);
                    if let Some(inherited) = inherited {
                        changed |= follow.terminals.union_with(&inherited);
                    }
                    if end_of_input && !follow.end_of_input {
                        follow.end_of_input = true;
                        changed = true;
                    }
                }
            }
        }

        Self { follow_sets }
    }

    pub fn get(&self, n: NonterminalID) -> &Follow {
        &self.follow_sets[&n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use SymbolID::*;

    // E → T E'
    // E' → + T E' | ε
    // T → F T'
    // T' → * F T' | ε
    // F → ( E ) | id
    fn grammar() -> Grammar {
        Grammar::define(|def| {
            let plus = def.terminal("+")?;
            let star = def.terminal("*")?;
            let lparen = def.terminal("(")?;
            let rparen = def.terminal(")")?;
            let id = def.terminal("id")?;
            let e = def.nonterminal("E")?;
            let e1 = def.nonterminal("E1")?;
            let t = def.nonterminal("T")?;
            let t1 = def.nonterminal("T1")?;
            let f = def.nonterminal("F")?;
            def.rule(e, [N(t), N(e1)])?;
            def.rule(e1, [T(plus), N(t), N(e1)])?;
            def.rule(e1, [])?;
            def.rule(t, [N(f), N(t1)])?;
            def.rule(t1, [T(star), N(f), N(t1)])?;
            def.rule(t1, [])?;
            def.rule(f, [T(lparen), N(e), T(rparen)])?;
            def.rule(f, [T(id)])?;
            Ok(())
        })
        .unwrap()
    }

    fn names(g: &Grammar, set: &TerminalSet) -> Vec<String> {
        set.iter().map(|t| g.terminal(t).name().to_owned()).collect()
    }

    fn nt(g: &Grammar, name: &str) -> NonterminalID {
        g.find_nonterminal(name).unwrap()
    }

    #[test]
    fn nullables() {
        let g = grammar();
        let first = FirstSets::new(&g);
        assert!(!first.is_nullable(nt(&g, "E")));
        assert!(first.is_nullable(nt(&g, "E1")));
        assert!(first.is_nullable(nt(&g, "T1")));
        assert!(!first.is_nullable(nt(&g, "F")));
    }

    #[test]
    fn first_of_strings() {
        let g = grammar();
        let first = FirstSets::new(&g);
        assert_eq!(names(&g, first.of(nt(&g, "E"))), ["(", "id"]);
        assert_eq!(names(&g, first.of(nt(&g, "E1"))), ["+"]);

        let result = first.first(&[N(nt(&g, "T1")), N(nt(&g, "E1"))]);
        assert_eq!(names(&g, &result.terminals), ["+", "*"]);
        assert!(result.nullable);

        let rparen = g.find_terminal(")").unwrap();
        let set = first.first_with(&[N(nt(&g, "E1"))], rparen);
        assert_eq!(names(&g, &set), ["+", ")"]);

        let empty = first.first(&[]);
        assert!(empty.terminals.is_empty());
        assert!(empty.nullable);
    }

    #[test]
    fn follow_sets() {
        let g = grammar();
        let first = FirstSets::new(&g);
        let follow = FollowSets::new(&g, &first);

        let e = follow.get(nt(&g, "E"));
        assert_eq!(names(&g, &e.terminals), [")"]);
        assert!(e.end_of_input);

        let t = follow.get(nt(&g, "T"));
        assert_eq!(names(&g, &t.terminals), ["+", ")"]);
        assert!(t.end_of_input);

        let f = follow.get(nt(&g, "F"));
        assert_eq!(names(&g, &f.terminals), ["+", "*", ")"]);
        assert_eq!(f.lookaheads().last(), Some(TerminalID::EOI));
    }

    #[test]
    fn terminal_set_orders_end_of_input_last() {
        let g = grammar().augment().unwrap();
        let plus = g.find_terminal("+").unwrap();
        let set: TerminalSet = [TerminalID::EOI, plus].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), [plus, TerminalID::EOI]);
        assert_eq!(set.len(), 2);
    }
}
