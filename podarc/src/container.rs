//! The hierarchical read/write entry point.
//!
//! A [Container] owns one backing stream; a [Location] is a cheap,
//! copyable cursor bound to a directory inside it, exposing
//! filesystem-style operations. One writer session and arbitrarily many
//! concurrent reader sessions against the same stream is the supported
//! pattern; a [Container] itself may also be shared across threads.

use std::path::Path;
use std::sync::Arc;

use crate::errors::{Error, FormatError};
use crate::index::{Index, MissingBehavior};
use crate::nodes::{DirectoryId, Node, ROOT_DIR};
use crate::types::{DataType, Element};

/// A single-file hierarchical container of typed POD arrays.
#[derive(Clone)]
pub struct Container {
    index: Arc<Index>,
}

impl Container {
    /// Create a new container file, truncating anything already there.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self {
            index: Arc::new(Index::create(path.as_ref())?),
        })
    }

    /// Open an existing container read-only. Reads take the lock-free
    /// positional path where the platform supports it; see
    /// [crate::DISABLE_PREAD_ENV].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self {
            index: Arc::new(Index::open(path.as_ref(), false)?),
        })
    }

    /// Open an existing container for reading and writing.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self {
            index: Arc::new(Index::open(path.as_ref(), true)?),
        })
    }

    pub fn root(&self) -> Location<'_> {
        Location {
            index: &self.index,
            dir: ROOT_DIR,
        }
    }

    /// Write the index block and trailer if the tree has unflushed
    /// changes. Also runs when the container is dropped.
    pub fn flush(&self) -> Result<(), Error> {
        self.index.flush()
    }

    /// Format version of the underlying file.
    pub fn format_version(&self) -> u64 {
        self.index.version()
    }
}

/// Kind of a directory entry, also usable as a listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Data,
}

/// Metadata of one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    pub name: String,
    pub kind: EntryKind,
    pub data_type: Option<DataType>,
    /// Number of base elements (aggregates count flattened).
    pub array_length: Option<u64>,
    pub byte_size: Option<u64>,
    /// Physical byte offset of the payload. Entries with identical
    /// content share one offset through the dedup table.
    pub offset: Option<u64>,
}

fn describe(name: &str, node: &Node) -> EntryDescriptor {
    let (kind, info) = match *node {
        Node::Directory { .. } | Node::SubIndex { .. } => (EntryKind::Directory, None),
        Node::SmallData {
            data_type,
            length,
            size,
            offset,
            ..
        } => (
            EntryKind::Data,
            Some((data_type, length as u64, size as u64, offset)),
        ),
        Node::Data {
            data_type,
            length,
            size,
            offset,
            ..
        } => (EntryKind::Data, Some((data_type, length, size, offset))),
    };
    EntryDescriptor {
        name: name.to_owned(),
        kind,
        data_type: info.map(|i| i.0),
        array_length: info.map(|i| i.1),
        byte_size: info.map(|i| i.2),
        offset: info.map(|i| i.3),
    }
}

/// A "current directory" cursor into a [Container].
#[derive(Clone, Copy)]
pub struct Location<'a> {
    index: &'a Index,
    dir: DirectoryId,
}

impl<'a> Location<'a> {
    fn at(&self, dir: DirectoryId) -> Location<'a> {
        Location {
            index: self.index,
            dir,
        }
    }

    /// Absolute "/a/b" style name of this location.
    pub fn path(&self) -> String {
        self.index.path_of(self.dir)
    }

    /// Descend into a named subdirectory. A subindex placeholder at that
    /// name is materialized transparently.
    pub fn subdirectory(
        &self,
        name: &str,
        missing: MissingBehavior,
    ) -> Result<Option<Location<'a>>, Error> {
        Ok(self
            .index
            .subdirectory(self.dir, name, missing)?
            .map(|dir| self.at(dir)))
    }

    pub fn create_subdirectory(&self, name: &str) -> Result<Location<'a>, Error> {
        Ok(self.at(self.index.create_subdirectory(self.dir, name)?))
    }

    /// Describe a named child.
    pub fn entry(&self, name: &str) -> Result<EntryDescriptor, Error> {
        match self.index.lookup(self.dir, name)? {
            Some(node) => Ok(describe(name, &node)),
            None => Err(Error::NotFound(name.to_owned())),
        }
    }

    pub fn has_child(&self, name: &str) -> bool {
        matches!(self.index.lookup(self.dir, name), Ok(Some(_)))
    }

    /// Names of all live children, in name order.
    pub fn child_names(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .index
            .child_nodes(self.dir)?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// Names of live children of one kind, in name order.
    pub fn child_names_filtered(&self, kind: EntryKind) -> Result<Vec<String>, Error> {
        Ok(self
            .index
            .child_nodes(self.dir)?
            .into_iter()
            .filter(|(_, node)| match kind {
                EntryKind::Data => node.is_data(),
                EntryKind::Directory => !node.is_data(),
            })
            .map(|(name, _)| name)
            .collect())
    }

    /// Remove a named child (recursively, for directories). Data ranges
    /// stay allocated; see the crate documentation on deduplication.
    pub fn remove(&self, name: &str) -> Result<(), Error> {
        self.index.remove(self.dir, name)
    }

    /// Remove every child of this directory.
    pub fn remove_all(&self) -> Result<(), Error> {
        self.index.remove_all(self.dir)
    }

    /// Write an array entry. An existing data entry under the same name
    /// is replaced; identical payloads are stored once.
    pub fn write<T: Element>(&self, name: &str, items: &[T]) -> Result<(), Error> {
        let payload = T::encode(items, &mut self.index.cache().write());
        let length = items.len() as u64 * T::FLATTEN;
        self.index
            .write_entry(self.dir, name, T::DATA_TYPE, length, &payload)
    }

    /// Read an array entry written with the same element type.
    pub fn read<T: Element>(&self, name: &str) -> Result<Vec<T>, Error> {
        let (found, length, payload) = self.index.read_entry(self.dir, name)?;
        if found != T::DATA_TYPE {
            return Err(FormatError::UnexpectedDataType {
                name: name.to_owned(),
                expected: T::DATA_TYPE,
                found,
            }
            .into());
        }
        T::decode(&payload, length, &self.index.cache().read())
    }

    /// Write a single value as a one-element array.
    pub fn write_one<T: Element>(&self, name: &str, value: &T) -> Result<(), Error> {
        self.write(name, std::slice::from_ref(value))
    }

    /// Read back a value written with [Location::write_one].
    pub fn read_one<T: Element>(&self, name: &str) -> Result<T, Error> {
        let mut items = self.read::<T>(name)?;
        if items.len() != 1 {
            return Err(FormatError::Truncated("scalar").into());
        }
        Ok(items.remove(0))
    }

    /// Commit this directory's children to a compressed subindex block,
    /// shrinking the main index. The location stays readable but becomes
    /// permanently read-only; meant for finalized subtrees.
    pub fn commit(&self) -> Result<(), Error> {
        self.index.commit(self.dir)
    }
}

impl std::fmt::Debug for Location<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Location").field("path", &self.path()).finish()
    }
}
