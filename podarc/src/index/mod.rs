//! The index: ownership of the node tree, string cache, free-space
//! allocator and dedup table, plus on-disk (de)serialization of all of
//! it.
//!
//! The whole index is written as one gzip-compressed block appended at
//! the end of the stream, followed by a fixed trailer giving the block's
//! offset, the format version and a magic number, so a reader can seek
//! to the end and find the index without scanning the file.
//!
//! Lock order, for call paths that hold more than one: string cache,
//! then directory arena, then a directory's state lock. The writer
//! mutex (allocator, dedup table, dirty flag) is independent and only
//! ever taken by the single writer session.

mod legacy;

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, instrument, trace, warn};

use crate::alloc::FreeList;
use crate::digests::ContentDigest;
use crate::errors::{Error, FormatError};
use crate::nodes::{DirState, DirectoryCell, DirectoryId, Node, SubindexState, ROOT_DIR};
use crate::stream::StreamFile;
use crate::string_cache::{StringCache, ROOT_NAME_ID};
use crate::types::DataType;
use crate::wire::{put_u16, put_u32, put_u64, put_u8, ByteReader};

/// Current on-disk format version; versions 0..=4 are readable.
pub const FORMAT_VERSION: u64 = 4;

const MAGIC: u64 = u64::from_le_bytes(*b"podarc01");
const LEGACY_MAGIC: u64 = u64::from_le_bytes(*b"podarc00");

const VERSIONED_TRAILER: u64 = 24;
const LEGACY_TRAILER: u64 = 16;
const BARE_TRAILER: u64 = 8;

const TAG_DIRECTORY: u8 = 0;
const TAG_SMALL_DATA: u8 = 1;
const TAG_DATA: u8 = 2;
const TAG_SUBINDEX: u8 = 3;

/// How far the caller wants `subdirectory` to go when the name is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingBehavior {
    /// Fail with [Error::NotFound].
    Error,
    /// Return nothing.
    Null,
    /// Create the subdirectory.
    Create,
}

pub(crate) struct Index {
    stream: StreamFile,
    writable: bool,
    /// Format version of the file as read; new files use [FORMAT_VERSION].
    version: u64,
    cache: RwLock<StringCache>,
    dirs: RwLock<Vec<Arc<DirectoryCell>>>,
    writer: Mutex<WriterState>,
}

struct WriterState {
    alloc: FreeList,
    /// (content hash, encoded size) -> offset of the already-written copy.
    dedup: HashMap<(ContentDigest, u64), u64>,
    /// Byte range of the live index block plus trailer, reclaimed when
    /// the next index block supersedes it.
    index_region: Option<(u64, u64)>,
    dirty: bool,
}

impl Index {
    pub fn create(path: &Path) -> Result<Self, Error> {
        let stream = StreamFile::create(path)?;
        let mut cache = StringCache::new();
        debug_assert_eq!(cache.intern(""), ROOT_NAME_ID);
        Ok(Self {
            stream,
            writable: true,
            version: FORMAT_VERSION,
            cache: RwLock::new(cache),
            dirs: RwLock::new(vec![Arc::new(DirectoryCell::new(ROOT_NAME_ID, None))]),
            writer: Mutex::new(WriterState {
                alloc: FreeList::with_end(0),
                dedup: HashMap::new(),
                index_region: None,
                dirty: true,
            }),
        })
    }

    #[instrument(skip_all, fields(path = %path.display(), writable))]
    pub fn open(path: &Path, writable: bool) -> Result<Self, Error> {
        let stream = StreamFile::open(path, writable)?;
        let len = stream.len()?;
        let (index_offset, version, trailer_len) = read_trailer(&stream, len)?;
        debug!(version, index_offset, "opened container");

        let block_end = len - trailer_len;
        if index_offset >= block_end {
            return Err(FormatError::Truncated("index").into());
        }
        let mut block = vec![0u8; (block_end - index_offset) as usize];
        stream.read_exact_at(index_offset, &mut block)?;

        let mut r = ByteReader::new(&block, "index");
        let raw_len = r.u64()?;
        let payload = gunzip(&block[8..], raw_len as usize, "index")?;
        let mut r = ByteReader::new(&payload, "index");

        let cache = StringCache::decode(&mut r, version >= 1)?;
        let mut dirs = Vec::new();
        if version <= 2 {
            legacy::decode_flat(&mut r, &cache, &mut dirs)?;
        } else {
            decode_root(&mut r, &cache, &mut dirs)?;
        }
        let alloc = if version >= 2 {
            FreeList::decode(&mut r, len)?
        } else {
            FreeList::with_end(len)
        };
        if !r.is_empty() {
            return Err(FormatError::Truncated("index").into());
        }

        Ok(Self {
            stream,
            writable,
            version,
            cache: RwLock::new(cache),
            dirs: RwLock::new(dirs),
            writer: Mutex::new(WriterState {
                alloc,
                dedup: HashMap::new(),
                index_region: Some((index_offset, len - index_offset)),
                dirty: false,
            }),
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn cache(&self) -> &RwLock<StringCache> {
        &self.cache
    }

    fn cell(&self, dir: DirectoryId) -> Arc<DirectoryCell> {
        self.dirs.read()[dir as usize].clone()
    }

    /// Absolute "/a/b" style location name, for diagnostics and errors.
    pub fn path_of(&self, dir: DirectoryId) -> String {
        let cache = self.cache.read();
        let mut parts = Vec::new();
        let mut cur = Some(dir);
        while let Some(id) = cur {
            let cell = self.cell(id);
            if cell.parent.is_some() {
                parts.push(cache.get(cell.name).unwrap_or("?").to_owned());
            }
            cur = cell.parent;
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }

    /// Mutation is allowed only in writable sessions, and only at
    /// locations that are not (and are not under) a committed subtree.
    fn ensure_mutable(&self, dir: DirectoryId) -> Result<(), Error> {
        if !self.writable {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "container is open read-only",
            )));
        }
        let mut cur = Some(dir);
        while let Some(id) = cur {
            let cell = self.cell(id);
            if cell.state.read().subindex != SubindexState::None {
                return Err(Error::AlreadyCommitted(self.path_of(id)));
            }
            cur = cell.parent;
        }
        Ok(())
    }

    /// Load the children of a directory whose own subtree was committed,
    /// turning `Flushed` into `Loaded`. No-op otherwise.
    fn ensure_loaded(&self, dir: DirectoryId) -> Result<(), Error> {
        let cell = self.cell(dir);
        let offset = {
            let st = cell.state.read();
            match st.subindex {
                SubindexState::Flushed(offset) if st.children.is_empty() => offset,
                _ => return Ok(()),
            }
        };

        // Decompress off the hot path, without holding the lock.
        let payload = self.read_subindex_block(offset)?;
        let children = self.decode_subindex(&payload, dir)?;

        let mut st = cell.state.write();
        if matches!(st.subindex, SubindexState::Flushed(_)) && st.children.is_empty() {
            st.children = children;
            st.subindex = SubindexState::Loaded(offset);
        }
        Ok(())
    }

    fn read_subindex_block(&self, offset: u64) -> Result<Vec<u8>, Error> {
        let mut prefix = [0u8; 4];
        self.stream.read_exact_at(offset, &mut prefix)?;
        let compressed_len = u32::from_le_bytes(prefix) as u64;
        if compressed_len > self.stream.len()? {
            return Err(FormatError::Truncated("subindex").into());
        }
        let mut compressed = vec![0u8; compressed_len as usize];
        self.stream.read_exact_at(offset + 4, &mut compressed)?;
        gunzip(&compressed, compressed.len() * 4, "subindex")
    }

    /// Parse a decompressed subindex block, appending any directories it
    /// contains to the arena.
    fn decode_subindex(&self, payload: &[u8], parent: DirectoryId) -> Result<Vec<Node>, Error> {
        let cache = self.cache.read();
        let mut dirs = self.dirs.write();
        let mut r = ByteReader::new(payload, "subindex");
        let count = r.u32()?;
        let mut children = Vec::with_capacity(count.min(1 << 20) as usize);
        for _ in 0..count {
            children.push(decode_node(&mut r, Some(parent), &cache, &mut dirs)?);
        }
        drop(dirs);
        let mut st = DirState {
            subindex: SubindexState::None,
            children,
        };
        st.sort(&cache);
        Ok(st.children)
    }

    /// Swap a `SubIndex` placeholder child for a materialized directory.
    /// Raced materializations are detected under the lock; the losing
    /// build is discarded.
    fn materialize(&self, parent: DirectoryId, name: &str, offset: u64) -> Result<DirectoryId, Error> {
        let payload = self.read_subindex_block(offset)?;

        let name_id = self.cache.read().id_of(name)?;
        let new_dir = {
            let cache = self.cache.read();
            let mut dirs = self.dirs.write();
            let id = dirs.len() as DirectoryId;
            dirs.push(Arc::new(DirectoryCell::new(name_id, Some(parent))));
            drop(dirs);
            drop(cache);

            let children = self.decode_subindex(&payload, id)?;
            let cell = self.cell(id);
            let mut st = cell.state.write();
            st.children = children;
            st.subindex = SubindexState::Loaded(offset);
            id
        };

        let parent_cell = self.cell(parent);
        let cache = self.cache.read();
        let mut st = parent_cell.state.write();
        let existing = st.get(name, &cache).cloned();
        match existing {
            Some(Node::SubIndex { name, .. }) => {
                trace!(name = %cache.get(name).unwrap_or("?"), offset, "materialized subindex");
                st.replace(
                    Node::Directory {
                        name,
                        dir: new_dir,
                    },
                    &cache,
                );
                Ok(new_dir)
            }
            // Another thread materialized it first; ours stays unreferenced.
            Some(Node::Directory { dir, .. }) => Ok(dir),
            _ => Err(Error::NotFound(name.to_owned())),
        }
    }

    pub fn lookup(&self, dir: DirectoryId, name: &str) -> Result<Option<Node>, Error> {
        self.ensure_loaded(dir)?;
        let cell = self.cell(dir);
        let cache = self.cache.read();
        let st = cell.state.read();
        Ok(st.get(name, &cache).cloned())
    }

    pub fn subdirectory(
        &self,
        dir: DirectoryId,
        name: &str,
        missing: MissingBehavior,
    ) -> Result<Option<DirectoryId>, Error> {
        match self.lookup(dir, name)? {
            Some(Node::Directory { dir, .. }) => Ok(Some(dir)),
            Some(Node::SubIndex { offset, .. }) => Ok(Some(self.materialize(dir, name, offset)?)),
            Some(_) => Err(Error::NotFound(format!(
                "{} exists but is not a directory",
                name
            ))),
            None => match missing {
                MissingBehavior::Error => Err(Error::NotFound(name.to_owned())),
                MissingBehavior::Null => Ok(None),
                MissingBehavior::Create => Ok(Some(self.create_subdirectory(dir, name)?)),
            },
        }
    }

    pub fn create_subdirectory(&self, dir: DirectoryId, name: &str) -> Result<DirectoryId, Error> {
        self.ensure_mutable(dir)?;
        let name_id = self.cache.write().intern(name);

        let id = {
            let mut dirs = self.dirs.write();
            let id = dirs.len() as DirectoryId;
            dirs.push(Arc::new(DirectoryCell::new(name_id, Some(dir))));
            id
        };

        let cell = self.cell(dir);
        let cache = self.cache.read();
        cell.state
            .write()
            .insert(Node::Directory { name: name_id, dir: id }, &cache)?;
        drop(cache);

        self.writer.lock().dirty = true;
        Ok(id)
    }

    /// Write a data entry, deduplicating its payload. An existing data
    /// entry under the same name is superseded; a directory is not.
    pub fn write_entry(
        &self,
        dir: DirectoryId,
        name: &str,
        data_type: DataType,
        length: u64,
        payload: &[u8],
    ) -> Result<(), Error> {
        self.ensure_mutable(dir)?;
        let name_id = self.cache.write().intern(name);

        let offset = if payload.is_empty() {
            0
        } else {
            let mut ws = self.writer.lock();
            self.write_dedup(&mut ws, None, payload)?
        };
        let node = Node::data(name_id, data_type, length, payload.len() as u64, offset);

        let cell = self.cell(dir);
        {
            let cache = self.cache.read();
            let mut st = cell.state.write();
            if let Some(existing) = st.get(name, &cache) {
                if !existing.is_data() {
                    return Err(Error::AlreadyExists(name.to_owned()));
                }
            }
            // A superseded data range may be shared through the dedup
            // table, so it is not returned to the allocator.
            st.replace(node, &cache);
        }
        self.writer.lock().dirty = true;
        Ok(())
    }

    /// Consult the dedup table before writing; identical payloads written
    /// under different names collapse to one physical copy.
    fn write_dedup(
        &self,
        ws: &mut WriterState,
        prefix: Option<&[u8]>,
        payload: &[u8],
    ) -> Result<u64, Error> {
        let digest = match prefix {
            Some(prefix) => ContentDigest::of_prefixed(prefix, payload),
            None => ContentDigest::of(payload),
        };
        let encoded = prefix.map_or(0, <[u8]>::len) as u64 + payload.len() as u64;

        if let Some(&offset) = ws.dedup.get(&(digest.clone(), encoded)) {
            trace!(%digest, offset, "dedup hit");
            return Ok(offset);
        }

        let offset = ws.alloc.allocate(encoded);
        if let Some(prefix) = prefix {
            self.stream.write_all_at(offset, prefix)?;
            self.stream.write_all_at(offset + prefix.len() as u64, payload)?;
        } else {
            self.stream.write_all_at(offset, payload)?;
        }
        ws.dedup.insert((digest, encoded), offset);
        Ok(offset)
    }

    pub fn read_entry(&self, dir: DirectoryId, name: &str) -> Result<(DataType, u64, Vec<u8>), Error> {
        let (data_type, length, size, offset) = match self.lookup(dir, name)? {
            Some(Node::SmallData {
                data_type,
                length,
                size,
                offset,
                ..
            }) => (data_type, length as u64, size as u64, offset),
            Some(Node::Data {
                data_type,
                length,
                size,
                offset,
                ..
            }) => (data_type, length, size, offset),
            Some(_) => {
                return Err(Error::NotFound(format!(
                    "{} exists but is not a data entry",
                    name
                )))
            }
            None => return Err(Error::NotFound(name.to_owned())),
        };

        // The recorded size is untrusted; bound it by the stream before
        // allocating the read buffer.
        if size > self.stream.len()? {
            return Err(FormatError::Truncated("data").into());
        }
        let mut payload = vec![0u8; size as usize];
        if size > 0 {
            self.stream.read_exact_at(offset, &mut payload)?;
        }
        Ok((data_type, length, payload))
    }

    pub fn remove(&self, dir: DirectoryId, name: &str) -> Result<(), Error> {
        self.ensure_mutable(dir)?;
        let cell = self.cell(dir);
        let removed = {
            let cache = self.cache.read();
            cell.state.write().remove(name, &cache)
        };
        match removed {
            Some(node) => {
                debug!(name, data = node.is_data(), "removed entry");
                self.writer.lock().dirty = true;
                Ok(())
            }
            None => Err(Error::NotFound(name.to_owned())),
        }
    }

    pub fn remove_all(&self, dir: DirectoryId) -> Result<(), Error> {
        self.ensure_mutable(dir)?;
        let cell = self.cell(dir);
        cell.state.write().children.clear();
        self.writer.lock().dirty = true;
        Ok(())
    }

    pub fn child_nodes(&self, dir: DirectoryId) -> Result<Vec<(String, Node)>, Error> {
        self.ensure_loaded(dir)?;
        let cell = self.cell(dir);
        let cache = self.cache.read();
        let st = cell.state.read();
        Ok(st
            .children
            .iter()
            .map(|n| (cache.get(n.name_id()).unwrap_or("?").to_owned(), n.clone()))
            .collect())
    }

    /// Commit this directory's children to a separately compressed
    /// subindex block, leaving the location read-only.
    #[instrument(skip(self), fields(path = %self.path_of(dir)))]
    pub fn commit(&self, dir: DirectoryId) -> Result<(), Error> {
        self.ensure_mutable(dir)?;
        let cell = self.cell(dir);

        let mut payload = Vec::new();
        {
            let dirs = self.dirs.read();
            let st = cell.state.read();
            put_u32(&mut payload, st.children.len() as u32);
            for child in &st.children {
                encode_node(child, &mut payload, &dirs);
            }
            drop(st);
        }
        let compressed = gzip(&payload)?;
        let prefix = (compressed.len() as u32).to_le_bytes();

        let offset = {
            let mut ws = self.writer.lock();
            let offset = self.write_dedup(&mut ws, Some(&prefix), &compressed)?;
            ws.dirty = true;
            offset
        };

        let mut st = cell.state.write();
        st.children.clear();
        st.subindex = SubindexState::Flushed(offset);
        debug!(offset, "committed subtree");
        Ok(())
    }

    /// Serialize the index into a fresh block at the end of the stream
    /// and update the trailer. Only runs when the tree has unflushed
    /// changes.
    #[instrument(skip_all, fields(version = FORMAT_VERSION))]
    pub fn flush(&self) -> Result<(), Error> {
        if !self.writable {
            return Ok(());
        }
        let mut ws = self.writer.lock();
        if !ws.dirty {
            return Ok(());
        }
        ws.alloc.check()?;

        let mut payload = Vec::new();
        {
            let cache = self.cache.read();
            let dirs = self.dirs.read();
            cache.encode(&mut payload);
            encode_node(
                &Node::Directory {
                    name: ROOT_NAME_ID,
                    dir: ROOT_DIR,
                },
                &mut payload,
                &dirs,
            );
        }
        ws.alloc.encode(&mut payload);

        let compressed = gzip(&payload)?;
        let mut block = Vec::with_capacity(8 + compressed.len());
        put_u64(&mut block, payload.len() as u64);
        block.extend_from_slice(&compressed);

        // The new block always lands past the live trailer; the
        // superseded region keeps its bytes until the replacement block
        // and trailer are durably written, and is returned to the
        // allocator only afterwards (so it enters the free list
        // serialized by the next flush, not this one).
        let total = block.len() as u64 + VERSIONED_TRAILER;
        let offset = ws.alloc.append(total);
        self.stream.write_all_at(offset, &block)?;

        let mut trailer = Vec::with_capacity(VERSIONED_TRAILER as usize);
        put_u64(&mut trailer, offset);
        put_u64(&mut trailer, FORMAT_VERSION);
        put_u64(&mut trailer, MAGIC);
        self.stream.write_all_at(offset + block.len() as u64, &trailer)?;
        self.stream.sync()?;

        if let Some((old_offset, old_size)) = ws.index_region.take() {
            ws.alloc.deallocate(old_offset, old_size)?;
        }
        self.stream.truncate(ws.alloc.end())?;

        ws.index_region = Some((offset, total));
        ws.dirty = false;
        debug!(offset, size = block.len(), "wrote index block");
        Ok(())
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "flush on close failed");
        }
    }
}

fn read_trailer(stream: &StreamFile, len: u64) -> Result<(u64, u64, u64), Error> {
    if len < BARE_TRAILER {
        return Err(FormatError::Truncated("trailer").into());
    }
    let mut tail = [0u8; 8];
    stream.read_exact_at(len - 8, &mut tail)?;
    let magic = u64::from_le_bytes(tail);

    if magic == MAGIC {
        if len < VERSIONED_TRAILER {
            return Err(FormatError::Truncated("trailer").into());
        }
        let mut buf = [0u8; 16];
        stream.read_exact_at(len - VERSIONED_TRAILER, &mut buf)?;
        let offset = u64::from_le_bytes(buf[..8].try_into().unwrap());
        let version = u64::from_le_bytes(buf[8..].try_into().unwrap());
        if version > FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion(version).into());
        }
        Ok((offset, version, VERSIONED_TRAILER))
    } else if magic == LEGACY_MAGIC {
        if len < LEGACY_TRAILER {
            return Err(FormatError::Truncated("trailer").into());
        }
        let mut buf = [0u8; 8];
        stream.read_exact_at(len - LEGACY_TRAILER, &mut buf)?;
        Ok((u64::from_le_bytes(buf), 1, LEGACY_TRAILER))
    } else {
        // The unversioned pre-magic trailer is a bare offset. Anything
        // that does not even point into the file is not one of ours.
        let offset = magic;
        if offset >= len - BARE_TRAILER {
            return Err(FormatError::BadMagic(magic).into());
        }
        Ok((offset, 0, BARE_TRAILER))
    }
}

/// Recursive nested node encoding: entry tag, interned-name id, then the
/// variant's fields. A directory whose subtree has been committed writes
/// a subindex placeholder instead of its (absent) children.
fn encode_node(node: &Node, out: &mut Vec<u8>, dirs: &[Arc<DirectoryCell>]) {
    match *node {
        Node::Directory { name, dir } => {
            let cell = &dirs[dir as usize];
            let st = cell.state.read();
            if let Some(offset) = st.subindex.offset() {
                put_u8(out, TAG_SUBINDEX);
                put_u64(out, name);
                put_u64(out, offset);
                return;
            }
            put_u8(out, TAG_DIRECTORY);
            put_u64(out, name);
            put_u32(out, st.children.len() as u32);
            for child in &st.children {
                encode_node(child, out, dirs);
            }
        }
        Node::SmallData {
            name,
            data_type,
            length,
            size,
            offset,
        } => {
            put_u8(out, TAG_SMALL_DATA);
            put_u64(out, name);
            put_u8(out, data_type.tag());
            put_u16(out, length);
            put_u32(out, size);
            put_u64(out, offset);
        }
        Node::Data {
            name,
            data_type,
            length,
            size,
            offset,
        } => {
            put_u8(out, TAG_DATA);
            put_u64(out, name);
            put_u8(out, data_type.tag());
            put_u64(out, length);
            put_u64(out, size);
            put_u64(out, offset);
        }
        Node::SubIndex { name, offset } => {
            put_u8(out, TAG_SUBINDEX);
            put_u64(out, name);
            put_u64(out, offset);
        }
    }
}

fn decode_node(
    r: &mut ByteReader,
    parent: Option<DirectoryId>,
    cache: &StringCache,
    dirs: &mut Vec<Arc<DirectoryCell>>,
) -> Result<Node, Error> {
    let tag = r.u8()?;
    let name = r.u64()?;
    if !cache.contains_id(name) {
        return Err(FormatError::UnknownStringId(name).into());
    }

    Ok(match tag {
        TAG_DIRECTORY => {
            let dir = dirs.len() as DirectoryId;
            dirs.push(Arc::new(DirectoryCell::new(name, parent)));
            let count = r.u32()?;
            // Capacity is a hint; the count itself is untrusted input.
            let mut children = Vec::with_capacity(count.min(1 << 20) as usize);
            for _ in 0..count {
                children.push(decode_node(r, Some(dir), cache, dirs)?);
            }
            let mut st = dirs[dir as usize].state.write();
            st.children = children;
            st.sort(cache);
            drop(st);
            Node::Directory { name, dir }
        }
        TAG_SMALL_DATA => Node::SmallData {
            name,
            data_type: DataType::from_tag(r.u8()?)?,
            length: r.u16()?,
            size: r.u32()?,
            offset: r.u64()?,
        },
        TAG_DATA => Node::Data {
            name,
            data_type: DataType::from_tag(r.u8()?)?,
            length: r.u64()?,
            size: r.u64()?,
            offset: r.u64()?,
        },
        TAG_SUBINDEX => Node::SubIndex {
            name,
            offset: r.u64()?,
        },
        other => return Err(FormatError::UnknownTag(other).into()),
    })
}

/// Decode the root entry. A committed root deserializes as a subindex
/// placeholder and is materialized lazily on first access.
fn decode_root(
    r: &mut ByteReader,
    cache: &StringCache,
    dirs: &mut Vec<Arc<DirectoryCell>>,
) -> Result<(), Error> {
    match decode_node(r, None, cache, dirs)? {
        Node::Directory { .. } => Ok(()),
        Node::SubIndex { name, offset } => {
            let cell = DirectoryCell::new(name, None);
            cell.state.write().subindex = SubindexState::Flushed(offset);
            dirs.push(Arc::new(cell));
            Ok(())
        }
        _ => Err(FormatError::Truncated("index").into()),
    }
}

fn gzip(payload: &[u8]) -> Result<Vec<u8>, Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    Ok(encoder.finish()?)
}

fn gunzip(compressed: &[u8], size_hint: usize, label: &'static str) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(size_hint.min(1 << 30));
    GzDecoder::new(compressed)
        .read_to_end(&mut out)
        .map_err(|_| FormatError::Truncated(label))?;
    Ok(out)
}
