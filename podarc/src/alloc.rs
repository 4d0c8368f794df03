//! Free-space tracking for the backing stream.
//!
//! Free byte ranges are held in two maps at once, keyed by offset and by
//! size, so allocation can find the smallest sufficient range and
//! deallocation can coalesce with its neighbours, both in O(log n).
//! A free range that ends up touching the logical end-of-file is not
//! retained; the end-of-file pointer is retracted instead. That keeps a
//! freshly-appended, lightly-edited file compact without a compaction
//! pass.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::errors::Error;
use crate::wire::{put_u64, ByteReader};

#[derive(Debug, Default)]
pub struct FreeList {
    /// offset -> size
    by_offset: BTreeMap<u64, u64>,
    /// (size, offset), ordered so the smallest sufficient range is the
    /// successor of (requested, 0); an exact-size fit sorts first.
    by_size: BTreeSet<(u64, u64)>,
    /// Logical end of the stream; allocations past all free ranges extend it.
    end: u64,
}

impl FreeList {
    pub fn with_end(end: u64) -> Self {
        Self {
            end,
            ..Self::default()
        }
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Reserve `size` bytes and return their offset.
    pub fn allocate(&mut self, size: u64) -> u64 {
        debug_assert_ne!(size, 0);
        match self.by_size.range((size, 0)..).next().copied() {
            Some((range_size, offset)) => {
                self.by_size.remove(&(range_size, offset));
                self.by_offset.remove(&offset);
                if range_size > size {
                    // Split off the remainder and keep it free.
                    self.insert_free(offset + size, range_size - size);
                }
                offset
            }
            None => self.append(size),
        }
    }

    /// Reserve `size` bytes at the current end of the stream.
    pub fn append(&mut self, size: u64) -> u64 {
        let offset = self.end;
        self.end += size;
        offset
    }

    /// Return `[offset, offset + size)` to the free list, coalescing with
    /// adjacent free ranges and retracting the end-of-file pointer when
    /// the result touches it.
    pub fn deallocate(&mut self, mut offset: u64, mut size: u64) -> Result<(), Error> {
        if size == 0 || offset.checked_add(size).is_none_or(|end| end > self.end) {
            return Err(Error::InternalConsistency(format!(
                "deallocate of [{}, +{}) outside the stream (end {})",
                offset, size, self.end
            )));
        }

        // Merge with an immediately-following free range.
        if let Some(next_size) = self.by_offset.remove(&(offset + size)) {
            self.by_size.remove(&(next_size, offset + size));
            size += next_size;
        }

        // Probe for an immediately-preceding free range.
        if let Some((&prev_offset, &prev_size)) = self.by_offset.range(..offset).next_back() {
            if prev_offset + prev_size > offset {
                return Err(Error::InternalConsistency(format!(
                    "deallocate of [{}, +{}) overlaps free range [{}, +{})",
                    offset, size, prev_offset, prev_size
                )));
            }
            if prev_offset + prev_size == offset {
                self.by_offset.remove(&prev_offset);
                self.by_size.remove(&(prev_size, prev_offset));
                offset = prev_offset;
                size += prev_size;
            }
        }

        if offset + size == self.end {
            trace!(offset, size, "retracting end-of-file");
            self.end = offset;
        } else {
            self.insert_free(offset, size);
        }

        self.check()
    }

    pub(crate) fn insert_free(&mut self, offset: u64, size: u64) {
        self.by_offset.insert(offset, size);
        self.by_size.insert((size, offset));
    }

    pub fn free_ranges(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.by_offset.iter().map(|(&o, &s)| (o, s))
    }

    /// Both maps must always describe the same set of ranges.
    pub(crate) fn check(&self) -> Result<(), Error> {
        if self.by_offset.len() != self.by_size.len() {
            return Err(Error::InternalConsistency(format!(
                "free list maps disagree: {} offsets vs {} sizes",
                self.by_offset.len(),
                self.by_size.len()
            )));
        }
        Ok(())
    }

    /// Serialized as a count followed by (offset, size) pairs.
    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        put_u64(out, self.by_offset.len() as u64);
        for (offset, size) in self.free_ranges() {
            put_u64(out, offset);
            put_u64(out, size);
        }
    }

    pub(crate) fn decode(r: &mut ByteReader, end: u64) -> Result<Self, Error> {
        let mut list = Self::with_end(end);
        let count = r.u64()?;
        for _ in 0..count {
            let offset = r.u64()?;
            let size = r.u64()?;
            list.insert_free(offset, size);
        }
        list.check()?;
        Ok(list)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allocate_extends_when_empty() {
        let mut f = FreeList::default();
        assert_eq!(f.allocate(16), 0);
        assert_eq!(f.allocate(8), 16);
        assert_eq!(f.end(), 24);
    }

    #[test]
    fn exact_fit_is_preferred() {
        let mut f = FreeList::default();
        let a = f.allocate(32);
        let b = f.allocate(8);
        let _c = f.allocate(8); // keeps the tail away from b
        f.deallocate(a, 32).unwrap();
        f.deallocate(b, 8).unwrap();

        // An 8-byte request takes the 8-byte hole, not a slice of the
        // 32-byte one.
        assert_eq!(f.allocate(8), b);
    }

    #[test]
    fn remainder_is_split_off() {
        let mut f = FreeList::default();
        let a = f.allocate(32);
        let _guard = f.allocate(8);
        f.deallocate(a, 32).unwrap();

        assert_eq!(f.allocate(8), a);
        assert_eq!(f.free_ranges().collect::<Vec<_>>(), vec![(a + 8, 24)]);
    }

    #[test]
    fn adjacent_ranges_coalesce() {
        let mut f = FreeList::default();
        let a = f.allocate(8);
        let b = f.allocate(8);
        let c = f.allocate(8);
        let _guard = f.allocate(8);

        f.deallocate(a, 8).unwrap();
        f.deallocate(c, 8).unwrap();
        f.deallocate(b, 8).unwrap();
        assert_eq!(f.free_ranges().collect::<Vec<_>>(), vec![(0, 24)]);
    }

    #[test]
    fn freeing_the_tail_retracts_end() {
        let mut f = FreeList::default();
        let a = f.allocate(8);
        let b = f.allocate(8);
        f.deallocate(b, 8).unwrap();
        assert_eq!(f.end(), 8);
        f.deallocate(a, 8).unwrap();
        assert_eq!(f.end(), 0);
        assert_eq!(f.free_ranges().count(), 0);
    }

    #[test]
    fn freeing_everything_fully_compacts() {
        let mut f = FreeList::default();
        let mut live = Vec::new();
        for i in 1..=32u64 {
            live.push((f.allocate(i * 3), i * 3));
        }
        // Free in an interleaved order.
        live.sort_by_key(|&(o, _)| (o % 7, o));
        for (offset, size) in live {
            f.deallocate(offset, size).unwrap();
        }
        assert_eq!(f.end(), 0);
        assert_eq!(f.free_ranges().count(), 0);
    }

    #[test]
    fn live_ranges_never_overlap() {
        let mut f = FreeList::default();
        let mut live: Vec<(u64, u64)> = Vec::new();
        for round in 0..128u64 {
            if round % 3 == 2 && !live.is_empty() {
                let (offset, size) = live.remove((round as usize * 7) % live.len());
                f.deallocate(offset, size).unwrap();
            } else {
                let size = 1 + round % 41;
                let offset = f.allocate(size);
                for &(o, s) in &live {
                    assert!(offset + size <= o || o + s <= offset, "overlap at {offset}");
                }
                live.push((offset, size));
            }
        }
    }

    #[test]
    fn overlapping_deallocate_is_fatal() {
        let mut f = FreeList::default();
        let a = f.allocate(16);
        let _guard = f.allocate(16);
        f.deallocate(a, 16).unwrap();
        assert!(matches!(
            f.deallocate(a + 8, 8),
            Err(Error::InternalConsistency(_))
        ));
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut f = FreeList::default();
        let a = f.allocate(8);
        let _b = f.allocate(8);
        let c = f.allocate(8);
        let _d = f.allocate(8);
        f.deallocate(a, 8).unwrap();
        f.deallocate(c, 8).unwrap();

        let mut buf = Vec::new();
        f.encode(&mut buf);
        let loaded = FreeList::decode(&mut ByteReader::new(&buf, "free list"), f.end()).unwrap();
        assert_eq!(
            loaded.free_ranges().collect::<Vec<_>>(),
            f.free_ranges().collect::<Vec<_>>()
        );
    }
}
