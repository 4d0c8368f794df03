//! Bidirectional mapping between interned entry names and integer ids.
//!
//! Names are stored once per index; every other structure refers to them
//! by a 64-bit id. Ids are handed out monotonically starting at 1 (id 0
//! is reserved for the root name) and are never reused within a session,
//! even if every entry carrying the name is later removed. Two indices
//! therefore never alias a live id to different text.

use std::collections::HashMap;

use crate::errors::{Error, FormatError};
use crate::wire::{put_bytes, put_u64, ByteReader};

pub type StringId = u64;

/// Id of the root directory's (empty) name.
pub const ROOT_NAME_ID: StringId = 0;

#[derive(Debug, Default)]
pub struct StringCache {
    ids: HashMap<String, StringId>,
    names: Vec<Option<String>>,
}

impl StringCache {
    /// A fresh cache holding only the root name.
    pub fn new() -> Self {
        let mut cache = Self::default();
        cache.intern("");
        cache
    }

    /// Return the id for `name`, creating one if it is not interned yet.
    pub fn intern(&mut self, name: &str) -> StringId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len() as StringId;
        self.ids.insert(name.to_owned(), id);
        self.names.push(Some(name.to_owned()));
        id
    }

    /// Return the id for `name` without interning it.
    pub fn id_of(&self, name: &str) -> Result<StringId, Error> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("string {:?} is not interned", name)))
    }

    /// Resolve an id back to its text.
    pub fn name_of(&self, id: StringId) -> Result<&str, Error> {
        self.get(id)
            .ok_or_else(|| Error::NotFound(format!("string cache id {} is out of range", id)))
    }

    pub(crate) fn get(&self, id: StringId) -> Option<&str> {
        self.names
            .get(id as usize)
            .and_then(|slot| slot.as_deref())
    }

    pub(crate) fn contains_id(&self, id: StringId) -> bool {
        self.get(id).is_some()
    }

    /// Serialized as a count followed by (length-prefixed bytes, id) pairs.
    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        put_u64(out, self.ids.len() as u64);
        // Walk in id order so the output is deterministic.
        for (id, slot) in self.names.iter().enumerate() {
            if let Some(name) = slot {
                put_bytes(out, name.as_bytes());
                put_u64(out, id as u64);
            }
        }
    }

    /// Inverse of [StringCache::encode]. When `explicit_ids` is false
    /// (the oldest format), ids are assigned positionally starting at 1,
    /// with id 0 implied as the root name.
    pub(crate) fn decode(r: &mut ByteReader, explicit_ids: bool) -> Result<Self, Error> {
        let mut cache = Self::default();
        if !explicit_ids {
            cache.intern("");
        }

        let count = r.u64()?;
        for n in 0..count {
            let bytes = r.bytes()?;
            let name = std::str::from_utf8(bytes)
                .map_err(|_| FormatError::Truncated("string cache"))?
                .to_owned();
            let id = if explicit_ids { r.u64()? } else { n + 1 };

            let slot = id as usize;
            if slot >= cache.names.len() {
                cache.names.resize(slot + 1, None);
            }
            cache.ids.insert(name.clone(), id);
            cache.names[slot] = Some(name);
        }
        Ok(cache)
    }
}
