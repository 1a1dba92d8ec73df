use serde::{ser::SerializeMap, Serialize};

use crate::projection::Node;
use crate::read::{Blk, Block};

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Node::Value(value) => value.serialize(serializer),
            Node::Block(map) => map.serialize(serializer),
            Node::List(list) => list.serialize(serializer),
        }
    }
}

impl Serialize for Block<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let projected = self.to_ordered_map();
        let mut map = serializer.serialize_map(Some(projected.len()))?;
        for (k, v) in projected.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for Blk {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.root().serialize(serializer)
    }
}
