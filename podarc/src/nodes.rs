//! The in-memory node tree.
//!
//! Directories live in an append-only arena owned by the
//! [Index](crate::index::Index); tree edges refer to them by arena index,
//! which gives a safe non-owning back-reference from child to parent.
//! Each directory's mutable state (child list and subindex state) sits
//! behind its own reader-writer lock so concurrent readers can
//! materialize subindex placeholders without a global lock.

use parking_lot::RwLock;

use crate::errors::Error;
use crate::string_cache::{StringCache, StringId};
use crate::types::DataType;

/// Index into the directory arena.
pub(crate) type DirectoryId = u32;

pub(crate) const ROOT_DIR: DirectoryId = 0;

/// Whether a directory's children have been committed to a subindex
/// block. `Flushed` means the children exist only in the referenced
/// block; `Loaded` means they were read back from it. Both states make
/// the directory read-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum SubindexState {
    #[default]
    None,
    Flushed(u64),
    Loaded(u64),
}

impl SubindexState {
    pub fn offset(self) -> Option<u64> {
        match self {
            SubindexState::None => None,
            SubindexState::Flushed(offset) | SubindexState::Loaded(offset) => Some(offset),
        }
    }
}

/// A directory entry. Data entries come in two variants: `SmallData`
/// keeps per-entry overhead down for the common case of arrays with at
/// most 65535 elements and payloads under 4 GiB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Directory {
        name: StringId,
        dir: DirectoryId,
    },
    SmallData {
        name: StringId,
        data_type: DataType,
        length: u16,
        size: u32,
        offset: u64,
    },
    Data {
        name: StringId,
        data_type: DataType,
        length: u64,
        size: u64,
        offset: u64,
    },
    /// Placeholder for a directory whose children were serialized into a
    /// separate compressed block; materializes into a `Directory` on
    /// first access.
    SubIndex {
        name: StringId,
        offset: u64,
    },
}

impl Node {
    pub fn name_id(&self) -> StringId {
        match *self {
            Node::Directory { name, .. }
            | Node::SmallData { name, .. }
            | Node::Data { name, .. }
            | Node::SubIndex { name, .. } => name,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Node::SmallData { .. } | Node::Data { .. })
    }

    /// Build the right data variant for the given dimensions.
    pub fn data(name: StringId, data_type: DataType, length: u64, size: u64, offset: u64) -> Self {
        match (u16::try_from(length), u32::try_from(size)) {
            (Ok(length), Ok(size)) => Node::SmallData {
                name,
                data_type,
                length,
                size,
                offset,
            },
            _ => Node::Data {
                name,
                data_type,
                length,
                size,
                offset,
            },
        }
    }
}

/// Arena slot for one directory.
pub(crate) struct DirectoryCell {
    pub name: StringId,
    pub parent: Option<DirectoryId>,
    pub state: RwLock<DirState>,
}

impl DirectoryCell {
    pub fn new(name: StringId, parent: Option<DirectoryId>) -> Self {
        Self {
            name,
            parent,
            state: RwLock::new(DirState::default()),
        }
    }
}

/// Mutable directory state: sorted child list plus subindex status.
#[derive(Default)]
pub(crate) struct DirState {
    pub subindex: SubindexState,
    pub children: Vec<Node>,
}

impl DirState {
    fn position(&self, name: &str, cache: &StringCache) -> Result<usize, usize> {
        self.children
            .binary_search_by(|n| cache.get(n.name_id()).unwrap_or("").cmp(name))
    }

    pub fn get(&self, name: &str, cache: &StringCache) -> Option<&Node> {
        self.position(name, cache).ok().map(|i| &self.children[i])
    }

    /// Insert preserving name order; sibling names must stay unique.
    pub fn insert(&mut self, node: Node, cache: &StringCache) -> Result<(), Error> {
        let name = cache.get(node.name_id()).unwrap_or("");
        match self.position(name, cache) {
            Ok(_) => Err(Error::AlreadyExists(name.to_owned())),
            Err(pos) => {
                self.children.insert(pos, node);
                Ok(())
            }
        }
    }

    /// Insert or overwrite an existing entry under the same name,
    /// returning the node that was replaced.
    pub fn replace(&mut self, node: Node, cache: &StringCache) -> Option<Node> {
        let name = cache.get(node.name_id()).unwrap_or("");
        match self.position(name, cache) {
            Ok(pos) => Some(std::mem::replace(&mut self.children[pos], node)),
            Err(pos) => {
                self.children.insert(pos, node);
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str, cache: &StringCache) -> Option<Node> {
        self.position(name, cache)
            .ok()
            .map(|i| self.children.remove(i))
    }

    /// Sort a bulk-loaded child list once before any lookup.
    pub fn sort(&mut self, cache: &StringCache) {
        self.children
            .sort_by(|a, b| cache.get(a.name_id()).cmp(&cache.get(b.name_id())));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn data_node(cache: &mut StringCache, name: &str) -> Node {
        let id = cache.intern(name);
        Node::data(id, DataType::F32, 1, 4, 0)
    }

    #[test]
    fn children_stay_sorted_and_unique() {
        let mut cache = StringCache::new();
        let mut state = DirState::default();

        for name in ["zebra", "alpha", "mid"] {
            let node = data_node(&mut cache, name);
            state.insert(node, &cache).unwrap();
        }

        let names: Vec<&str> = state
            .children
            .iter()
            .map(|n| cache.get(n.name_id()).unwrap())
            .collect();
        assert_eq!(names, ["alpha", "mid", "zebra"]);

        let dup = data_node(&mut cache, "mid");
        assert!(matches!(
            state.insert(dup, &cache),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn replace_overwrites_in_place() {
        let mut cache = StringCache::new();
        let mut state = DirState::default();
        state
            .insert(data_node(&mut cache, "points"), &cache)
            .unwrap();

        let id = cache.id_of("points").unwrap();
        let replaced = state.replace(Node::data(id, DataType::F64, 2, 16, 64), &cache);
        assert!(replaced.is_some());
        assert_eq!(state.children.len(), 1);
    }

    #[test]
    fn remove_returns_the_node() {
        let mut cache = StringCache::new();
        let mut state = DirState::default();
        state.insert(data_node(&mut cache, "a"), &cache).unwrap();
        state.insert(data_node(&mut cache, "b"), &cache).unwrap();

        assert!(state.remove("a", &cache).is_some());
        assert!(state.remove("a", &cache).is_none());
        assert_eq!(state.children.len(), 1);
    }

    #[test]
    fn small_data_bounds() {
        assert!(matches!(
            Node::data(1, DataType::U8, 65535, 65535, 0),
            Node::SmallData { .. }
        ));
        assert!(matches!(
            Node::data(1, DataType::U8, 65536, 65536, 0),
            Node::Data { .. }
        ));
        assert!(matches!(
            Node::data(1, DataType::U8, 100, u32::MAX as u64 + 1, 0),
            Node::Data { .. }
        ));
    }
}
