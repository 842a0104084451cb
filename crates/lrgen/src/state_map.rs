//! Numbering of the canonical collection.

use crate::{
    grammar::Grammar,
    item::Item,
    item_set::{compare_sorted, ItemSet},
    types::Map,
    util::display_fn,
};
use std::fmt;

/// The number to identify a state of the LR automaton.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID {
    raw: u32,
}
impl StateID {
    /// The state containing the initial item.
    pub const INITIAL: Self = Self::new(0);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self { raw }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.raw as usize
    }
}
impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

#[derive(Debug)]
struct State<I> {
    set: ItemSet<I>,
    sorted: Vec<I>,
}

/// The bijection between states and the item sets of a canonical collection.
#[derive(Debug)]
pub struct StateMap<I> {
    states: Vec<State<I>>,
    index: Map<ItemSet<I>, StateID>,
}

impl<I: Item> StateMap<I> {
    /// Sort the item sets in the canonical order and number them from zero.
    pub fn new<C>(g: &Grammar, collection: C) -> Self
    where
        C: IntoIterator<Item = ItemSet<I>>,
    {
        let mut states: Vec<State<I>> = collection
            .into_iter()
            .map(|set| {
                let sorted = set.sorted(g);
                State { set, sorted }
            })
            .collect();
        states.sort_by(|a, b| compare_sorted(&a.sorted, &b.sorted, g));

        let index = states
            .iter()
            .enumerate()
            .map(|(i, state)| (state.set.clone(), StateID::new(i as u32)))
            .collect();

        tracing::debug!(states = states.len(), "numbered the item sets");
        Self { states, index }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterate over all states in order.
    pub fn states(&self) -> impl Iterator<Item = StateID> {
        (0..self.states.len() as u32).map(StateID::new)
    }

    /// Return the `i`-th item in the sorted item set of `state`.
    pub fn item(&self, state: StateID, i: usize) -> Option<&I> {
        self.states.get(state.index())?.sorted.get(i)
    }

    /// Return the items of `state` in the canonical order.
    pub fn items(&self, state: StateID) -> &[I] {
        &self.states[state.index()].sorted
    }

    pub fn item_set(&self, state: StateID) -> &ItemSet<I> {
        &self.states[state.index()].set
    }

    /// Return the position of `item` in the sorted item set of `state`.
    pub fn find_item(&self, state: StateID, item: &I) -> Option<usize> {
        let state = self.states.get(state.index())?;
        if !state.set.contains(item) {
            return None;
        }
        state.sorted.iter().position(|i| i == item)
    }

    pub fn find_item_set(&self, set: &ItemSet<I>) -> Option<StateID> {
        self.index.get(set).copied()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, state) in self.states.iter().enumerate() {
                writeln!(f, "#### State {}", i)?;
                for item in &state.sorted {
                    f.write_str("- ")?;
                    item.fmt_item(g, f)?;
                    writeln!(f)?;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        automaton::{LR0Automaton, LR1Automaton},
        grammar::SymbolID::*,
        item::{LR0Item, LR1Item},
    };

    // S → C C
    // C → c C | d
    fn grammar() -> Grammar {
        Grammar::define(|def| {
            let c = def.terminal("c")?;
            let d = def.terminal("d")?;
            let s = def.nonterminal("S")?;
            let cc = def.nonterminal("C")?;
            def.rule(s, [N(cc), N(cc)])?;
            def.rule(cc, [T(c), N(cc)])?;
            def.rule(cc, [T(d)])?;
            Ok(())
        })
        .unwrap()
        .augment()
        .unwrap()
    }

    #[test]
    fn initial_item_is_first() {
        let g = grammar();
        let automaton = LR0Automaton::new(&g).unwrap();
        let map = automaton.state_map();
        assert_eq!(map.len(), 7);
        assert_eq!(map.item(StateID::INITIAL, 0), Some(&automaton.initial_item()));
        assert_eq!(
            map.find_item(StateID::INITIAL, &automaton.initial_item()),
            Some(0)
        );
        assert_eq!(
            map.find_item_set(&automaton.initial_set()),
            Some(StateID::INITIAL)
        );

        let lr1 = LR1Automaton::new(&g).unwrap();
        let map = lr1.state_map();
        assert_eq!(map.len(), 10);
        assert_eq!(map.item(StateID::INITIAL, 0), Some(&lr1.initial_item()));
    }

    #[test]
    fn lookups_miss_gracefully() {
        let g = grammar();
        let automaton = LR0Automaton::new(&g).unwrap();
        let map = automaton.state_map();
        let last = StateID::new(map.len() as u32);
        assert_eq!(map.item(last, 0), None);
        assert_eq!(map.find_item(last, &automaton.initial_item()), None);
        assert_eq!(map.find_item_set(&ItemSet::<LR0Item>::new()), None);
        let accepted = automaton.initial_item().next();
        assert_eq!(map.find_item(StateID::INITIAL, &accepted), None);
    }

    #[test]
    fn numbering_is_deterministic() {
        let g = grammar();
        let automaton = LR1Automaton::new(&g).unwrap();
        let forward = StateMap::<LR1Item>::new(&g, automaton.canonical_collection());
        let mut reversed: Vec<_> = automaton.canonical_collection().into_iter().collect();
        reversed.reverse();
        let backward = StateMap::new(&g, reversed);
        assert_eq!(
            forward.display(&g).to_string(),
            backward.display(&g).to_string()
        );
    }

    #[test]
    fn display_items() {
        let g = grammar();
        let map = LR1Automaton::new(&g).unwrap().state_map();
        let rendered = map.display(&g).to_string();
        assert!(rendered.starts_with("#### State 0\n- S\u{2032} → • S, $\n"));
        assert!(rendered.contains("- C → • c C, c\n"));
    }
}
