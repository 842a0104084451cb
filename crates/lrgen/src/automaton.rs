//! Closure, GOTO and the canonical collection of item sets.

use crate::{
    first_sets::FirstSets,
    grammar::{AugmentError, Grammar, ProductionID, SymbolID},
    item::{Item, LR0Item, LR1Item},
    item_set::ItemSet,
    state_map::StateMap,
    types::{Map, Queue, Set},
};
use std::{borrow::Cow, marker::PhantomData};

/// The representation of the item sets stored in the collection.
pub trait SetForm: Sized {
    const NAME: &'static str;

    /// Turn the items moved over a symbol into a stored item set.
    fn finish<I: Item>(automaton: &Automaton<'_, I, Self>, moved: ItemSet<I>) -> ItemSet<I>;

    /// Return the full item set from a stored one.
    fn expand<'s, I: Item>(
        automaton: &Automaton<'_, I, Self>,
        stored: &'s ItemSet<I>,
    ) -> Cow<'s, ItemSet<I>>;
}

/// Item sets are stored with their closure.
#[derive(Debug)]
pub enum FullSets {}

impl SetForm for FullSets {
    const NAME: &'static str = "full";

    fn finish<I: Item>(automaton: &Automaton<'_, I, Self>, moved: ItemSet<I>) -> ItemSet<I> {
        automaton.closure(&moved)
    }

    fn expand<'s, I: Item>(
        _: &Automaton<'_, I, Self>,
        stored: &'s ItemSet<I>,
    ) -> Cow<'s, ItemSet<I>> {
        Cow::Borrowed(stored)
    }
}

/// Only the kernel items are stored; the closure is recomputed on demand.
#[derive(Debug)]
pub enum Kernels {}

impl SetForm for Kernels {
    const NAME: &'static str = "kernel";

    fn finish<I: Item>(_: &Automaton<'_, I, Self>, moved: ItemSet<I>) -> ItemSet<I> {
        moved
    }

    fn expand<'s, I: Item>(
        automaton: &Automaton<'_, I, Self>,
        stored: &'s ItemSet<I>,
    ) -> Cow<'s, ItemSet<I>> {
        Cow::Owned(automaton.closure(stored))
    }
}

/// The LR automaton over the items `I`, storing the item sets in the form `F`.
#[derive(Debug)]
pub struct Automaton<'g, I, F> {
    grammar: &'g Grammar,
    first_sets: FirstSets,
    accept: ProductionID,
    _marker: PhantomData<fn() -> (I, F)>,
}

pub type LR0Automaton<'g> = Automaton<'g, LR0Item, FullSets>;
pub type LR0KernelAutomaton<'g> = Automaton<'g, LR0Item, Kernels>;
pub type LR1Automaton<'g> = Automaton<'g, LR1Item, FullSets>;
pub type LR1KernelAutomaton<'g> = Automaton<'g, LR1Item, Kernels>;

impl<'g, I, F> Automaton<'g, I, F>
where
    I: Item,
    F: SetForm,
{
    /// Create the automaton for the augmented grammar `g`.
    pub fn new(g: &'g Grammar) -> Result<Self, AugmentError> {
        let accept = g.accept_production().ok_or(AugmentError::NotAugmented)?;
        Ok(Self {
            grammar: g,
            first_sets: FirstSets::new(g),
            accept,
            _marker: PhantomData,
        })
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    /// Return the initial item.
    pub fn initial_item(&self) -> I {
        I::initial(self.accept)
    }

    /// Return the stored form of the set that contains the initial item.
    pub fn initial_set(&self) -> ItemSet<I> {
        let initial: ItemSet<I> = Some(self.initial_item()).into_iter().collect();
        F::finish(self, initial)
    }

    /// Compute `CLOSURE(items)` with a work-list until no item is added.
    pub fn closure(&self, items: &ItemSet<I>) -> ItemSet<I> {
        let mut closure = items.clone();
        let mut pending: Queue<I> = items.iter().copied().collect();
        while let Some(item) = pending.pop() {
            item.expand(self.grammar, &self.first_sets, &mut |added| {
                if closure.insert(added) {
                    pending.push(added);
                }
            });
        }
        closure
    }

    /// Return the full item set of a stored set.
    pub fn expand<'s>(&self, stored: &'s ItemSet<I>) -> Cow<'s, ItemSet<I>> {
        F::expand(self, stored)
    }

    /// Compute `GOTO(items, symbol)` in the stored form.
    pub fn goto(&self, items: &ItemSet<I>, symbol: SymbolID) -> ItemSet<I> {
        let full = self.expand(items);
        let moved: ItemSet<I> = full
            .iter()
            .filter(|item| item.dot_symbol(self.grammar) == Some(symbol))
            .map(|item| item.next())
            .collect();
        if moved.is_empty() {
            return moved;
        }
        F::finish(self, moved)
    }

    /// Compute the non-empty GOTO sets of `items` for every symbol at once,
    /// in the order of the grammar symbols.
    pub fn transitions(&self, items: &ItemSet<I>) -> Vec<(SymbolID, ItemSet<I>)> {
        let full = self.expand(items);
        let mut moved: Map<SymbolID, ItemSet<I>> = Map::default();
        for item in full.iter() {
            if let Some(symbol) = item.dot_symbol(self.grammar) {
                moved.entry(symbol).or_default().insert(item.next());
            }
        }
        moved.sort_keys();
        moved
            .into_iter()
            .map(|(symbol, moved)| (symbol, F::finish(self, moved)))
            .collect()
    }

    /// Compute the canonical collection of item sets reachable from the initial set.
    pub fn canonical_collection(&self) -> Set<ItemSet<I>> {
        let span = tracing::debug_span!("canonical_collection", form = F::NAME);
        let _entered = span.enter();

        let mut collection = Set::default();
        let mut pending = vec![self.initial_set()];
        while let Some(items) = pending.pop() {
            if collection.contains(&items) {
                continue;
            }
            for (_, next) in self.transitions(&items) {
                if !collection.contains(&next) {
                    pending.push(next);
                }
            }
            collection.insert(items);
        }

        tracing::debug!(sets = collection.len(), "constructed the canonical collection");
        collection
    }

    /// Number the canonical collection.
    pub fn state_map(&self) -> StateMap<I> {
        StateMap::new(self.grammar, self.canonical_collection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SymbolID::*;

    // E → E + T | T
    // T → T * F | F
    // F → ( E ) | id
    fn arithmetic() -> Grammar {
        Grammar::define(|def| {
            let plus = def.terminal("+")?;
            let star = def.terminal("*")?;
            let lparen = def.terminal("(")?;
            let rparen = def.terminal(")")?;
            let id = def.terminal("id")?;
            let e = def.nonterminal("E")?;
            let t = def.nonterminal("T")?;
            let f = def.nonterminal("F")?;
            def.rule(e, [N(e), T(plus), N(t)])?;
            def.rule(e, [N(t)])?;
            def.rule(t, [N(t), T(star), N(f)])?;
            def.rule(t, [N(f)])?;
            def.rule(f, [T(lparen), N(e), T(rparen)])?;
            def.rule(f, [T(id)])?;
            Ok(())
        })
        .unwrap()
        .augment()
        .unwrap()
    }

    #[test]
    fn rejects_plain_grammar() {
        let g = Grammar::define(|def| {
            let a = def.terminal("a")?;
            let s = def.nonterminal("S")?;
            def.rule(s, [T(a)])?;
            Ok(())
        })
        .unwrap();
        assert!(matches!(
            LR0Automaton::new(&g),
            Err(AugmentError::NotAugmented)
        ));
    }

    #[test]
    fn closure_of_initial_item() {
        let g = arithmetic();
        let automaton = LR0Automaton::new(&g).unwrap();
        let initial = automaton.initial_set();
        // S′ → •E plus the six productions reachable from E.
        assert_eq!(initial.len(), 7);
        assert!(initial.contains(&automaton.initial_item()));
    }

    #[test]
    fn closure_is_idempotent() {
        let g = arithmetic();
        let lr0 = LR0Automaton::new(&g).unwrap();
        for items in lr0.canonical_collection() {
            assert_eq!(lr0.closure(&items), items);
        }
        let lr1 = LR1Automaton::new(&g).unwrap();
        for items in lr1.canonical_collection() {
            assert_eq!(lr1.closure(&lr1.closure(&items)), lr1.closure(&items));
        }
    }

    #[test]
    fn goto_is_closure_of_moved_items() {
        let g = arithmetic();
        let automaton = LR0Automaton::new(&g).unwrap();
        for items in automaton.canonical_collection() {
            for symbol in g.symbols() {
                let moved: ItemSet<LR0Item> = items
                    .iter()
                    .filter(|item| item.dot_symbol(&g) == Some(symbol))
                    .map(|item| item.next())
                    .collect();
                let expected = if moved.is_empty() {
                    moved
                } else {
                    automaton.closure(&moved)
                };
                assert_eq!(automaton.goto(&items, symbol), expected);
            }
        }
    }

    #[test]
    fn state_counts() {
        let g = arithmetic();
        assert_eq!(LR0Automaton::new(&g).unwrap().canonical_collection().len(), 12);
        assert_eq!(LR0KernelAutomaton::new(&g).unwrap().canonical_collection().len(), 12);
        let lr1 = LR1Automaton::new(&g).unwrap().canonical_collection().len();
        assert!(lr1 > 12);
        assert_eq!(LR1KernelAutomaton::new(&g).unwrap().canonical_collection().len(), lr1);
    }

    #[test]
    fn kernel_automaton_matches_full_automaton() {
        let g = arithmetic();
        let full = LR0Automaton::new(&g).unwrap();
        let kernels = LR0KernelAutomaton::new(&g).unwrap();

        let full_map = full.state_map();
        let kernel_map = kernels.state_map();
        assert_eq!(full_map.len(), kernel_map.len());

        for state in full_map.states() {
            let items = full_map.item_set(state);
            let kernel = items.kernel(&g);
            assert_eq!(kernel_map.find_item_set(&kernel), Some(state));

            let full_edges: Vec<_> = full
                .transitions(items)
                .into_iter()
                .map(|(symbol, next)| (symbol, full_map.find_item_set(&next)))
                .collect();
            let kernel_edges: Vec<_> = kernels
                .transitions(kernel_map.item_set(state))
                .into_iter()
                .map(|(symbol, next)| (symbol, kernel_map.find_item_set(&next)))
                .collect();
            assert_eq!(full_edges, kernel_edges);
        }
    }
}
