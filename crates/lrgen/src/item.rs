//! LR(0) and LR(1) items.

use crate::{
    first_sets::FirstSets,
    grammar::{Grammar, ProductionID, SymbolID, TerminalID},
    util::display_fn,
};
use std::{cmp::Ordering, fmt, hash::Hash};

/// The capability shared by both item variants.
///
/// Every predicate takes the augmented grammar, which identifies `S′`
/// through its accept production.
pub trait Item: Copy + Ord + Hash + fmt::Debug {
    /// Return the initial item `S′ → • S` (with the lookahead `$`).
    fn initial(accept: ProductionID) -> Self;

    /// Return the LR(0) part of this item.
    fn core(&self) -> LR0Item;

    fn lookahead(&self) -> Option<TerminalID>;

    /// Return the item whose dot is moved over the next symbol.
    fn next(&self) -> Self;

    /// Add the non-kernel items introduced by this item during closure.
    fn expand(&self, g: &Grammar, first: &FirstSets, push: &mut dyn FnMut(Self));

    fn is_initial(&self, g: &Grammar) -> bool {
        let core = self.core();
        Some(core.production) == g.accept_production()
            && core.dot == 0
            && self.lookahead().map_or(true, |a| a == TerminalID::EOI)
    }

    fn is_final(&self, g: &Grammar) -> bool {
        let core = self.core();
        Some(core.production) == g.accept_production()
            && core.is_complete(g)
            && self.lookahead().map_or(true, |a| a == TerminalID::EOI)
    }

    fn is_kernel(&self, g: &Grammar) -> bool {
        self.is_initial(g) || self.core().dot > 0
    }

    fn is_complete(&self, g: &Grammar) -> bool {
        self.core().is_complete(g)
    }

    fn dot_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        self.core().dot_symbol(g)
    }

    /// Compare two items in the canonical order, which decides the numbering of states.
    fn canonical_cmp(&self, other: &Self, g: &Grammar) -> Ordering {
        let key = |item: &Self| {
            let core = item.core();
            let accept = Some(core.production) == g.accept_production();
            (
                !item.is_initial(g),
                !item.is_kernel(g),
                !accept,
                std::cmp::Reverse(core.dot),
                core.production,
            )
        };
        key(self)
            .cmp(&key(other))
            .then_with(|| self.lookahead().cmp(&other.lookahead()))
    }

    fn fmt_item(&self, g: &Grammar, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core();
        let production = g.production(core.production);
        write!(f, "{} →", g.nonterminal(production.left()))?;
        for (i, symbol) in production.right().iter().enumerate() {
            if i == usize::from(core.dot) {
                f.write_str(" •")?;
            }
            write!(f, " {}", g.symbol(*symbol))?;
        }
        if core.is_complete(g) {
            f.write_str(" •")?;
        }
        if let Some(lookahead) = self.lookahead() {
            write!(f, ", {}", g.terminal(lookahead))?;
        }
        Ok(())
    }
}

/// The LR(0) item `A → α • β`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR0Item {
    pub production: ProductionID,
    pub dot: u16,
}

impl LR0Item {
    pub fn new(production: ProductionID, dot: u16) -> Self {
        Self { production, dot }
    }

    pub fn to_lr1(self, lookahead: TerminalID) -> LR1Item {
        LR1Item {
            core: self,
            lookahead,
        }
    }

    /// Return `α`, the symbols before the dot.
    pub fn prefix<'g>(&self, g: &'g Grammar) -> &'g [SymbolID] {
        let right = g.production(self.production).right();
        &right[..usize::from(self.dot).min(right.len())]
    }

    /// Return `β`, the symbols after the dot.
    pub fn suffix<'g>(&self, g: &'g Grammar) -> &'g [SymbolID] {
        let right = g.production(self.production).right();
        &right[usize::from(self.dot).min(right.len())..]
    }

    pub fn is_complete(&self, g: &Grammar) -> bool {
        usize::from(self.dot) >= g.production(self.production).right().len()
    }

    pub fn dot_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.production(self.production)
            .right()
            .get(usize::from(self.dot))
            .copied()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| self.fmt_item(g, f))
    }
}

impl Item for LR0Item {
    fn initial(accept: ProductionID) -> Self {
        Self::new(accept, 0)
    }

    fn core(&self) -> LR0Item {
        *self
    }

    fn lookahead(&self) -> Option<TerminalID> {
        None
    }

    fn next(&self) -> Self {
        Self {
            dot: self.dot + 1,
            ..*self
        }
    }

    fn expand(&self, g: &Grammar, _: &FirstSets, push: &mut dyn FnMut(Self)) {
        if let Some(SymbolID::N(n)) = self.dot_symbol(g) {
            for production in g.productions_of(n) {
                push(Self::new(production.id(), 0));
            }
        }
    }
}

/// The LR(1) item `[A → α • β, a]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR1Item {
    pub core: LR0Item,
    pub lookahead: TerminalID,
}

impl LR1Item {
    pub fn to_lr0(self) -> LR0Item {
        self.core
    }

    pub fn prefix<'g>(&self, g: &'g Grammar) -> &'g [SymbolID] {
        self.core.prefix(g)
    }

    pub fn suffix<'g>(&self, g: &'g Grammar) -> &'g [SymbolID] {
        self.core.suffix(g)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| self.fmt_item(g, f))
    }
}

impl Item for LR1Item {
    fn initial(accept: ProductionID) -> Self {
        LR0Item::initial(accept).to_lr1(TerminalID::EOI)
    }

    fn core(&self) -> LR0Item {
        self.core
    }

    fn lookahead(&self) -> Option<TerminalID> {
        Some(self.lookahead)
    }

    fn next(&self) -> Self {
        Self {
            core: self.core.next(),
            ..*self
        }
    }

    fn expand(&self, g: &Grammar, first: &FirstSets, push: &mut dyn FnMut(Self)) {
        if let Some(SymbolID::N(n)) = self.core.dot_symbol(g) {
            // [A → α • B β, a] introduces [B → • γ, b] for every b in FIRST(β a).
            let beta = &self.core.suffix(g)[1..];
            let lookaheads = first.first_with(beta, self.lookahead);
            for production in g.productions_of(n) {
                for b in lookaheads.iter() {
                    push(LR0Item::new(production.id(), 0).to_lr1(b));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SymbolID::*;

    fn grammar() -> Grammar {
        Grammar::define(|def| {
            let plus = def.terminal("+")?;
            let id = def.terminal("id")?;
            let e = def.nonterminal("E")?;
            let t = def.nonterminal("T")?;
            def.rule(e, [N(e), T(plus), N(t)])?;
            def.rule(e, [N(t)])?;
            def.rule(t, [T(id)])?;
            Ok(())
        })
        .unwrap()
        .augment()
        .unwrap()
    }

    fn production(g: &Grammar, index: usize) -> ProductionID {
        g.productions().nth(index).unwrap().id()
    }

    #[test]
    fn predicates() {
        let g = grammar();
        let accept = g.accept_production().unwrap();

        let initial = LR0Item::initial(accept);
        assert!(initial.is_initial(&g));
        assert!(initial.is_kernel(&g));
        assert!(!initial.is_complete(&g));
        assert_eq!(initial.dot_symbol(&g), Some(N(g.find_nonterminal("E").unwrap())));

        let accepted = initial.next();
        assert!(accepted.is_final(&g));
        assert!(accepted.is_complete(&g));
        assert_eq!(accepted.dot_symbol(&g), None);

        let nonkernel = LR0Item::new(production(&g, 0), 0);
        assert!(!nonkernel.is_kernel(&g));
        assert!(nonkernel.next().is_kernel(&g));

        let lr1 = LR1Item::initial(accept);
        assert!(lr1.is_initial(&g));
        assert!(!initial.to_lr1(g.find_terminal("+").unwrap()).is_initial(&g));
        assert_eq!(lr1.to_lr0(), initial);
    }

    #[test]
    fn prefix_and_suffix() {
        let g = grammar();
        let item = LR0Item::new(production(&g, 0), 1).to_lr1(TerminalID::EOI);
        assert_eq!(item.prefix(&g).len(), 1);
        assert_eq!(item.suffix(&g).len(), 2);
        assert_eq!(item.display(&g).to_string(), "E → E • '+' T, $");
        assert_eq!(item.core.next().next().display(&g).to_string(), "E → E '+' T •");
    }

    #[test]
    fn canonical_order() {
        let g = grammar();
        let accept = g.accept_production().unwrap();
        let initial = LR0Item::initial(accept);
        let mut items = vec![
            LR0Item::new(production(&g, 2), 0),
            LR0Item::new(production(&g, 1), 0),
            LR0Item::new(production(&g, 0), 1),
            LR0Item::new(production(&g, 0), 2),
            initial.next(),
            LR0Item::new(production(&g, 0), 0),
            initial,
        ];
        items.sort_by(|a, b| a.canonical_cmp(b, &g));
        assert_eq!(
            items,
            [
                initial,
                initial.next(),
                LR0Item::new(production(&g, 0), 2),
                LR0Item::new(production(&g, 0), 1),
                LR0Item::new(production(&g, 0), 0),
                LR0Item::new(production(&g, 1), 0),
                LR0Item::new(production(&g, 2), 0),
            ]
        );

        let plus = g.find_terminal("+").unwrap();
        let a = initial.next().to_lr1(plus);
        let b = initial.next().to_lr1(TerminalID::EOI);
        assert_eq!(a.canonical_cmp(&b, &g), Ordering::Less);
    }

    #[test]
    fn lr1_expansion_uses_first_of_suffix() {
        let g = grammar();
        let first = FirstSets::new(&g);
        let item = LR1Item::initial(g.accept_production().unwrap());

        let mut expanded = vec![];
        item.expand(&g, &first, &mut |item| expanded.push(item));
        assert_eq!(
            expanded,
            [
                LR0Item::new(production(&g, 0), 0).to_lr1(TerminalID::EOI),
                LR0Item::new(production(&g, 1), 0).to_lr1(TerminalID::EOI),
            ]
        );

        let mut expanded = vec![];
        LR0Item::new(production(&g, 0), 0)
            .to_lr1(TerminalID::EOI)
            .expand(&g, &first, &mut |item| expanded.push(item));
        let plus = g.find_terminal("+").unwrap();
        assert!(expanded.iter().all(|item| item.lookahead == plus));
        assert_eq!(expanded.len(), 2);
    }
}
