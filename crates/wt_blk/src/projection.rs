//! Flattened views of a decoded tree.

use std::collections::HashMap;

use indexmap::{map::Entry, IndexMap};

use crate::read::{Blk, Block};
use crate::value::Value;

/// Names mapped to their projected entries, in order of first appearance
pub type OrderedMap = IndexMap<String, Node>;

/// One entry of an [`OrderedMap`]
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A parameter value
    Value(Value),

    /// A child block
    Block(OrderedMap),

    /// Every entry sharing a name, once the name occurs more than once
    List(Vec<Node>),
}

fn insert(map: &mut OrderedMap, name: &str, node: Node) {
    match map.entry(name.to_owned()) {
        Entry::Vacant(entry) => {
            entry.insert(node);
        }
        Entry::Occupied(mut entry) => match entry.get_mut() {
            Node::List(list) => list.push(node),
            existing => {
                let prior = std::mem::replace(existing, Node::List(Vec::new()));
                *existing = Node::List(vec![prior, node]);
            }
        },
    }
}

impl Block<'_> {
    /// Project parameters, then children, into an ordered map
    ///
    /// Repeated names are collected into a [`Node::List`].
    pub fn to_ordered_map(&self) -> OrderedMap {
        // pre-order, so every block is listed before its descendants
        let mut order = Vec::new();
        let mut stack = vec![*self];
        while let Some(block) = stack.pop() {
            order.push(block);
            stack.extend(block.children());
        }

        let mut projected: HashMap<usize, OrderedMap> = HashMap::with_capacity(order.len());
        for block in order.into_iter().rev() {
            let mut map = OrderedMap::new();
            for param in block.params() {
                insert(&mut map, &param.name, Node::Value(param.value.clone()));
            }
            for child in block.children() {
                let child_map = projected.remove(&child.index()).unwrap_or_default();
                insert(&mut map, child.name(), Node::Block(child_map));
            }
            projected.insert(block.index(), map);
        }
        projected.remove(&self.index()).unwrap_or_default()
    }

    /// Render one `name:type=value` line per parameter, followed by the children indented by two spaces
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let mut stack = vec![(*self, 0)];
        while let Some((block, depth)) = stack.pop() {
            for param in block.params() {
                text.extend(std::iter::repeat("  ").take(depth));
                text.push_str(&format!(
                    "{}:{}={}\n",
                    param.name,
                    param.data_type(),
                    param.value
                ));
            }
            stack.extend(block.children().rev().map(|child| (child, depth + 1)));
        }
        text
    }
}

impl Blk {
    /// Project the root block, see [`Block::to_ordered_map`]
    pub fn to_ordered_map(&self) -> OrderedMap {
        self.root().to_ordered_map()
    }

    /// Render the root block, see [`Block::to_text`]
    pub fn to_text(&self) -> String {
        self.root().to_text()
    }
}
