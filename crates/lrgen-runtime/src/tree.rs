//! Syntax trees produced by the parser.

use crate::lexer::Token;

/// A node of the abstract syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<T, N, P> {
    /// A shifted token.
    Leaf(Token<T>),

    /// The result of a reduction, whose children are in left-to-right order.
    Internal {
        symbol: N,
        production: P,
        children: Vec<Node<T, N, P>>,
    },
}

impl<T, N, P> Node<T, N, P> {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(..))
    }

    pub fn token(&self) -> Option<&Token<T>> {
        match self {
            Self::Leaf(token) => Some(token),
            Self::Internal { .. } => None,
        }
    }

    pub fn children(&self) -> &[Node<T, N, P>] {
        match self {
            Self::Leaf(..) => &[],
            Self::Internal { children, .. } => children,
        }
    }

    /// Return the number of internal nodes in this subtree.
    pub fn count_internal(&self) -> usize {
        match self {
            Self::Leaf(..) => 0,
            Self::Internal { children, .. } => {
                1 + children.iter().map(Self::count_internal).sum::<usize>()
            }
        }
    }

    /// Iterate over the leaves of this subtree from left to right.
    pub fn leaves(&self) -> Leaves<'_, T, N, P> {
        Leaves { stack: vec![self] }
    }

    /// Visit the internal nodes in post-order, i.e. in the order the
    /// corresponding reductions were performed.
    pub fn productions(&self) -> Vec<&P> {
        let mut out = vec![];
        self.collect_productions(&mut out);
        out
    }

    fn collect_productions<'a>(&'a self, out: &mut Vec<&'a P>) {
        if let Self::Internal {
            production,
            children,
            ..
        } = self
        {
            for child in children {
                child.collect_productions(out);
            }
            out.push(production);
        }
    }
}

#[derive(Debug)]
pub struct Leaves<'a, T, N, P> {
    stack: Vec<&'a Node<T, N, P>>,
}

impl<'a, T, N, P> Iterator for Leaves<'a, T, N, P> {
    type Item = &'a Token<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf(token) => return Some(token),
                Node::Internal { children, .. } => self.stack.extend(children.iter().rev()),
            }
        }
        None
    }
}
