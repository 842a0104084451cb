//! LALR(1) lookaheads by spontaneous generation and propagation.

use crate::{
    automaton::{LR0KernelAutomaton, LR1KernelAutomaton},
    grammar::{AugmentError, Grammar, SymbolID, TerminalID},
    item::{Item, LR0Item, LR1Item},
    item_set::ItemSet,
    state_map::{StateID, StateMap},
    types::Queue,
};
use std::collections::{BTreeMap, BTreeSet};

/// A kernel item identified by its state and its position in the sorted kernel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopedItem {
    pub state: StateID,
    pub index: usize,
}

/// The LR(0) kernels of the grammar together with their LALR(1) lookaheads.
#[derive(Debug)]
pub struct LalrKernels {
    states: StateMap<LR0Item>,
    transitions: Vec<Vec<(SymbolID, StateID)>>,
    propagation_table: BTreeMap<ScopedItem, BTreeSet<ScopedItem>>,
    lookahead_table: BTreeMap<ScopedItem, BTreeSet<TerminalID>>,
}

impl LalrKernels {
    pub fn new(g: &Grammar) -> Result<Self, AugmentError> {
        let span = tracing::debug_span!("lalr_kernels");
        let _entered = span.enter();

        let lr0 = LR0KernelAutomaton::new(g)?;
        let lr1 = LR1KernelAutomaton::new(g)?;
        let states = lr0.state_map();

        let mut transitions = Vec::with_capacity(states.len());
        for state in states.states() {
            let mut edges = vec![];
            for (symbol, next) in lr0.transitions(states.item_set(state)) {
                if let Some(next) = states.find_item_set(&next) {
                    edges.push((symbol, next));
                }
            }
            transitions.push(edges);
        }

        let mut kernels = Self {
            states,
            transitions,
            propagation_table: BTreeMap::new(),
            lookahead_table: BTreeMap::new(),
        };
        kernels.discover(g, &lr1);
        kernels.propagate();
        Ok(kernels)
    }

    /// Determine the spontaneous lookaheads and the propagation relation,
    /// using `$` as the sentinel for an unknown lookahead.
    ///
    /// `$` never occurs in FIRST of a grammar string, so any `$` met in the
    /// closure has been carried from the sentinel.
    fn discover(&mut self, g: &Grammar, lr1: &LR1KernelAutomaton<'_>) {
        for state in self.states.states() {
            for (index, kernel) in self.states.items(state).iter().enumerate() {
                let source = ScopedItem { state, index };
                let probe: ItemSet<LR1Item> =
                    Some(kernel.to_lr1(TerminalID::EOI)).into_iter().collect();

                for item in lr1.closure(&probe).iter() {
                    let symbol = match item.dot_symbol(g) {
                        Some(symbol) => symbol,
                        None => continue,
                    };
                    let target = match self.target(state, symbol) {
                        Some(target) => target,
                        None => continue,
                    };
                    let index = match self.states.find_item(target, &item.core.next()) {
                        Some(index) => index,
                        None => continue,
                    };
                    let dest = ScopedItem {
                        state: target,
                        index,
                    };

                    if item.lookahead == TerminalID::EOI {
                        self.propagation_table.entry(source).or_default().insert(dest);
                    } else {
                        tracing::trace!(?dest, lookahead = ?item.lookahead, "spontaneous lookahead");
                        self.lookahead_table
                            .entry(dest)
                            .or_default()
                            .insert(item.lookahead);
                    }
                }
            }
        }

        // The end of input follows the initial item.
        self.lookahead_table
            .entry(ScopedItem {
                state: StateID::INITIAL,
                index: 0,
            })
            .or_default()
            .insert(TerminalID::EOI);
    }

    /// Propagate the lookaheads until no set grows.
    fn propagate(&mut self) {
        let mut pending: Queue<ScopedItem> = self.lookahead_table.keys().copied().collect();
        let mut rounds = 0usize;
        while let Some(source) = pending.pop() {
            rounds += 1;
            let lookaheads = match self.lookahead_table.get(&source) {
                Some(lookaheads) => lookaheads.clone(),
                None => continue,
            };
            let dests = match self.propagation_table.get(&source) {
                Some(dests) => dests,
                None => continue,
            };
            for dest in dests {
                let set = self.lookahead_table.entry(*dest).or_default();
                let before = set.len();
                set.extend(lookaheads.iter().copied());
                if set.len() != before {
                    pending.push(*dest);
                }
            }
        }
        tracing::debug!(rounds, "propagated the lookaheads");
    }

    /// Return the LR(0) kernels numbered in the canonical order.
    pub fn states(&self) -> &StateMap<LR0Item> {
        &self.states
    }

    /// Return the GOTO target of `state` over `symbol`.
    pub fn target(&self, state: StateID, symbol: SymbolID) -> Option<StateID> {
        self.transitions
            .get(state.index())?
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, next)| *next)
    }

    pub fn transitions(&self, state: StateID) -> &[(SymbolID, StateID)] {
        &self.transitions[state.index()]
    }

    pub fn propagation_table(&self) -> &BTreeMap<ScopedItem, BTreeSet<ScopedItem>> {
        &self.propagation_table
    }

    pub fn lookahead_table(&self) -> &BTreeMap<ScopedItem, BTreeSet<TerminalID>> {
        &self.lookahead_table
    }

    /// Pair every kernel item of `state` with its lookaheads.
    pub fn lr1_kernel(&self, state: StateID) -> ItemSet<LR1Item> {
        let mut kernel = ItemSet::new();
        for (index, item) in self.states.items(state).iter().enumerate() {
            let scoped = ScopedItem { state, index };
            if let Some(lookaheads) = self.lookahead_table.get(&scoped) {
                kernel.extend(lookaheads.iter().map(|a| item.to_lr1(*a)));
            }
        }
        kernel
    }
}
