//! Reader for the flat index layout used by format versions 0 through 2.
//!
//! Early containers serialized one global node array, with tree edges
//! encoded as integer indices into that array, and a dedicated "hard
//! link" entry kind standing in for content deduplication: a link entry
//! borrows the byte range of the data entry it targets.

use std::sync::Arc;

use crate::errors::{Error, FormatError};
use crate::nodes::{DirectoryCell, DirectoryId, Node};
use crate::string_cache::StringCache;
use crate::types::DataType;
use crate::wire::ByteReader;

pub(crate) const FLAT_DIRECTORY: u8 = 0;
pub(crate) const FLAT_DATA: u8 = 1;
pub(crate) const FLAT_HARD_LINK: u8 = 2;

enum FlatNode {
    Directory {
        name: u64,
        parent: u64,
    },
    Data {
        name: u64,
        parent: u64,
        data_type: DataType,
        length: u64,
        size: u64,
        offset: u64,
    },
    HardLink {
        name: u64,
        parent: u64,
        target: u64,
    },
}

impl FlatNode {
    fn parent(&self) -> u64 {
        match *self {
            FlatNode::Directory { parent, .. }
            | FlatNode::Data { parent, .. }
            | FlatNode::HardLink { parent, .. } => parent,
        }
    }
}

/// Decode the flat node array into the directory arena. The array is
/// ordered parent-before-child; index 0 is the root, its own parent.
pub(crate) fn decode_flat(
    r: &mut ByteReader,
    cache: &StringCache,
    dirs: &mut Vec<Arc<DirectoryCell>>,
) -> Result<(), Error> {
    let count = r.u64()?;
    let mut flat = Vec::with_capacity(count.min(1 << 20) as usize);
    for _ in 0..count {
        let kind = r.u8()?;
        let name = r.u64()?;
        let parent = r.u64()?;
        if !cache.contains_id(name) {
            return Err(FormatError::UnknownStringId(name).into());
        }
        flat.push(match kind {
            FLAT_DIRECTORY => FlatNode::Directory { name, parent },
            FLAT_DATA => FlatNode::Data {
                name,
                parent,
                data_type: DataType::from_tag(r.u8()?)?,
                length: r.u64()?,
                size: r.u64()?,
                offset: r.u64()?,
            },
            FLAT_HARD_LINK => FlatNode::HardLink {
                name,
                parent,
                target: r.u64()?,
            },
            other => return Err(FormatError::UnknownTag(other).into()),
        });
    }

    if flat.is_empty() {
        return Err(FormatError::Truncated("index").into());
    }

    // First pass: build the directory arena. Directory ids double as the
    // mapping from flat array index to arena index.
    let mut dir_of_flat: Vec<Option<DirectoryId>> = vec![None; flat.len()];
    for (i, node) in flat.iter().enumerate() {
        let parent = node.parent();
        if i == 0 {
            if !matches!(node, FlatNode::Directory { .. }) || parent != 0 {
                return Err(FormatError::Truncated("index").into());
            }
        } else if parent >= i as u64 {
            // Parents always precede their children in the array.
            return Err(FormatError::Truncated("index").into());
        }

        if let FlatNode::Directory { name, .. } = *node {
            let id = dirs.len() as DirectoryId;
            let parent_dir = if i == 0 {
                None
            } else {
                Some(resolve_dir(&dir_of_flat, parent)?)
            };
            dirs.push(Arc::new(DirectoryCell::new(name, parent_dir)));
            dir_of_flat[i] = Some(id);
        }
    }

    // Second pass: attach children. Hard links materialize as plain data
    // entries sharing the target's byte range.
    for (i, node) in flat.iter().enumerate().skip(1) {
        let parent = resolve_dir(&dir_of_flat, node.parent())?;
        let child = match *node {
            FlatNode::Directory { name, .. } => Node::Directory {
                name,
                dir: dir_of_flat[i].expect("filled in first pass"),
            },
            FlatNode::Data {
                name,
                data_type,
                length,
                size,
                offset,
                ..
            } => Node::data(name, data_type, length, size, offset),
            FlatNode::HardLink { name, target, .. } => {
                match flat.get(target as usize) {
                    Some(&FlatNode::Data {
                        data_type,
                        length,
                        size,
                        offset,
                        ..
                    }) => Node::data(name, data_type, length, size, offset),
                    _ => return Err(FormatError::Truncated("index").into()),
                }
            }
        };
        dirs[parent as usize].state.write().children.push(child);
    }

    // Sibling lists are sorted once before any lookup.
    for cell in dirs.iter() {
        cell.state.write().sort(cache);
    }
    Ok(())
}

fn resolve_dir(dir_of_flat: &[Option<DirectoryId>], flat: u64) -> Result<DirectoryId, Error> {
    dir_of_flat
        .get(flat as usize)
        .copied()
        .flatten()
        .ok_or_else(|| FormatError::Truncated("index").into())
}
