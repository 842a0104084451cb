//! Item sets and their canonical ordering.

use crate::{grammar::Grammar, item::Item, util::display_fn};
use std::{cmp::Ordering, collections::BTreeSet, fmt};

/// A deduplicated set of items, compared by set equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemSet<I> {
    items: BTreeSet<I>,
}

impl<I> Default for ItemSet<I> {
    fn default() -> Self {
        Self {
            items: BTreeSet::new(),
        }
    }
}

impl<I: Item> ItemSet<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: I) -> bool {
        self.items.insert(item)
    }

    pub fn contains(&self, item: &I) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &I> + '_ {
        self.items.iter()
    }

    /// Return the subset of kernel items.
    pub fn kernel(&self, g: &Grammar) -> Self {
        self.items
            .iter()
            .filter(|item| item.is_kernel(g))
            .copied()
            .collect()
    }

    /// Return the items sorted in the canonical order.
    pub fn sorted(&self, g: &Grammar) -> Vec<I> {
        let mut items: Vec<I> = self.items.iter().copied().collect();
        items.sort_by(|a, b| a.canonical_cmp(b, g));
        items
    }

    /// Compare two sets in the canonical order.
    pub fn canonical_cmp(&self, other: &Self, g: &Grammar) -> Ordering {
        compare_sorted(&self.sorted(g), &other.sorted(g), g)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for item in self.sorted(g) {
                f.write_str("- ")?;
                item.fmt_item(g, f)?;
                writeln!(f)?;
            }
            Ok(())
        })
    }
}

/// Compare two canonically sorted item lists lexicographically; when one
/// is a prefix of the other, the longer list comes first.
pub(crate) fn compare_sorted<I: Item>(lhs: &[I], rhs: &[I], g: &Grammar) -> Ordering {
    for (a, b) in lhs.iter().zip(rhs) {
        match a.canonical_cmp(b, g) {
            Ordering::Equal => continue,
            ordering => return ordering,
        }
    }
    rhs.len().cmp(&lhs.len())
}

impl<I: Item> FromIterator<I> for ItemSet<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<I: Item> Extend<I> for ItemSet<I> {
    fn extend<T: IntoIterator<Item = I>>(&mut self, iter: T) {
        self.items.extend(iter)
    }
}

impl<'a, I> IntoIterator for &'a ItemSet<I> {
    type Item = &'a I;
    type IntoIter = std::collections::btree_set::Iter<'a, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grammar::{ProductionID, SymbolID::*},
        item::LR0Item,
    };

    fn grammar() -> Grammar {
        Grammar::define(|def| {
            let a = def.terminal("a")?;
            let s = def.nonterminal("S")?;
            def.rule(s, [T(a), N(s)])?;
            def.rule(s, [T(a)])?;
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
    fn set_equality_ignores_insertion_order() {
        let g = grammar();
        let x = LR0Item::new(production(&g, 0), 1);
        let y = LR0Item::new(production(&g, 1), 0);
        let lhs: ItemSet<_> = [x, y].into_iter().collect();
        let rhs: ItemSet<_> = [y, x, y].into_iter().collect();
        assert_eq!(lhs, rhs);
        assert_eq!(lhs.len(), 2);
        assert_eq!(lhs.canonical_cmp(&rhs, &g), Ordering::Equal);
    }

    #[test]
    fn longer_set_comes_first_on_common_prefix() {
        let g = grammar();
        let kernel = LR0Item::new(production(&g, 0), 1);
        let closure = LR0Item::new(production(&g, 0), 0);
        let short: ItemSet<_> = [kernel].into_iter().collect();
        let long: ItemSet<_> = [kernel, closure].into_iter().collect();
        assert_eq!(long.canonical_cmp(&short, &g), Ordering::Less);
        assert_eq!(short.canonical_cmp(&long, &g), Ordering::Greater);
        assert_eq!(long.kernel(&g), short);
    }
}
