//! Shared string tables.
//!
//! A name map is stored as a varint entry count, a varint byte size and then `size` bytes holding the
//! NUL-terminated names back to back. A count of zero means the file carries no names of its own and
//! borrows those of its container.

use std::io::{Cursor, Read};

use derive_more::derive::{Deref, IntoIterator};
use tracing::{instrument, trace};

use crate::error::{Error, Result};
use crate::varint::ReadVarIntExt;

/// Ordered table of identifier strings addressed by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, IntoIterator)]
pub struct NameMap {
    #[deref]
    #[into_iterator(ref)]
    names: Vec<String>,
    size: u64,
}

impl NameMap {
    /// Decode a name map from the start of `data`
    pub fn decode(data: &[u8]) -> Result<NameMap> {
        Self::read(&mut Cursor::new(data))
    }

    /// Decode a name map, leaving `reader` positioned after it
    #[instrument(skip(reader))]
    pub fn read<R: Read>(reader: &mut R) -> Result<NameMap> {
        let count = reader.read_varint()?;
        if count == 0 {
            trace!("empty name map");
            return Ok(NameMap::default());
        }

        let size = reader.read_varint()?;
        let mut raw = Vec::new();
        reader.take(size).read_to_end(&mut raw)?;
        if (raw.len() as u64) < size {
            return Err(Error::out_of_bounds("name map", 0, size as usize, raw.len()));
        }

        let mut names = Vec::with_capacity(count.min(size) as usize);
        let mut rest = raw.as_slice();
        for _ in 0..count {
            let end = rest
                .iter()
                .position(|&b| b == b'\0')
                .ok_or(Error::Unterminated("name map"))?;
            names.push(String::from_utf8_lossy(&rest[..end]).into_owned());
            rest = &rest[end + 1..];
        }

        trace!(count, size, "read name map");
        Ok(NameMap { names, size })
    }

    /// Byte size of the encoded names, zero for an empty map
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Look up a name by id in this map only
    pub fn get(&self, id: i64) -> Result<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
            .ok_or(Error::NameNotFound(id))
    }

    /// Look up a name by id, falling back to `parent` when this map is empty
    pub fn resolve<'a>(&'a self, id: i64, parent: Option<&'a NameMap>) -> Result<&'a str> {
        if !self.is_empty() {
            return self.get(id);
        }
        parent.ok_or(Error::NameNotFound(id))?.get(id)
    }
}

impl From<Vec<String>> for NameMap {
    fn from(names: Vec<String>) -> Self {
        let size = names.iter().map(|n| n.len() as u64 + 1).sum();
        NameMap { names, size }
    }
}

impl<'a> FromIterator<&'a str> for NameMap {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        iter.into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>()
            .into()
    }
}
