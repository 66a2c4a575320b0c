//! Depth-first traversal over a parsed [`Document`].

use crate::{Document, NodeId, NodeRef};

/// Pre-order walk starting from `nodes` (one id or a whole forest).
///
/// Parents come before their children and siblings keep document order.
/// Only nodes carrying a source span are yielded, but every node is
/// descended into, so the span-less `#document` root can be passed directly.
pub fn traverse<I>(document: &Document, nodes: I) -> Traverse<'_>
where
    I: IntoIterator<Item = NodeId>,
{
    let mut stack: Vec<NodeId> = nodes.into_iter().collect();
    stack.reverse();
    Traverse { document, stack }
}

/// Iterator returned by [`traverse`].
#[derive(Debug, Clone)]
pub struct Traverse<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.document.get(self.stack.pop()?);
            self.stack.extend(node.children().rev().map(|child| child.id()));
            if node.span().is_some() {
                return Some(node);
            }
        }
    }
}

/// Iterator over a node's parent chain, nearest first.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    next: Option<NodeRef<'a>>,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(start: Option<NodeRef<'a>>) -> Self {
        Self { next: start }
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}
