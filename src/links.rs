//! Doubly linked traversal order threaded through the slots of a table.
//!
//! Links are stored parallel to the key and value arrays, one per slot, and
//! name their neighbours by slot index. The list covers exactly the live
//! slots of the owning table.

use alloc::vec::Vec;

use crate::error::Error;

/// Marks the absence of a neighbour.
pub(crate) const NIL: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Link {
    pub(crate) prev: u32,
    pub(crate) next: u32,
}

impl Link {
    const UNLINKED: Link = Link {
        prev: NIL,
        next: NIL,
    };
}

#[inline(always)]
fn index(raw: u32) -> Option<usize> {
    (raw != NIL).then_some(raw as usize)
}

#[derive(Clone, Debug)]
pub(crate) struct Order {
    links: Vec<Link>,
    first: u32,
    last: u32,
}

impl Order {
    /// Creates an empty order for a table of `n` slots plus the sentinel
    /// slot.
    pub(crate) fn with_slots(n: usize) -> Result<Self, Error> {
        let mut links = Vec::new();
        links
            .try_reserve_exact(n + 1)
            .map_err(|_| Error::OutOfMemory { capacity: n })?;
        links.resize(n + 1, Link::UNLINKED);
        Ok(Self {
            links,
            first: NIL,
            last: NIL,
        })
    }

    #[inline]
    pub(crate) fn first(&self) -> Option<usize> {
        index(self.first)
    }

    #[inline]
    pub(crate) fn last(&self) -> Option<usize> {
        index(self.last)
    }

    #[inline]
    pub(crate) fn next(&self, slot: usize) -> Option<usize> {
        index(self.links[slot].next)
    }

    #[inline]
    pub(crate) fn prev(&self, slot: usize) -> Option<usize> {
        index(self.links[slot].prev)
    }

    /// Links a slot that is not yet part of the list after the current tail.
    pub(crate) fn append(&mut self, slot: usize) {
        let raw = slot as u32;
        self.links[slot] = Link {
            prev: self.last,
            next: NIL,
        };
        match index(self.last) {
            Some(last) => self.links[last].next = raw,
            None => self.first = raw,
        }
        self.last = raw;
    }

    /// Links a slot that is not yet part of the list before the current head.
    pub(crate) fn prepend(&mut self, slot: usize) {
        let raw = slot as u32;
        self.links[slot] = Link {
            prev: NIL,
            next: self.first,
        };
        match index(self.first) {
            Some(first) => self.links[first].prev = raw,
            None => self.last = raw,
        }
        self.first = raw;
    }

    /// Splices a slot out of the list, joining its neighbours.
    pub(crate) fn unlink(&mut self, slot: usize) {
        let Link { prev, next } = self.links[slot];
        match index(prev) {
            Some(prev) => self.links[prev].next = next,
            None => self.first = next,
        }
        match index(next) {
            Some(next) => self.links[next].prev = prev,
            None => self.last = prev,
        }
        self.links[slot] = Link::UNLINKED;
    }

    /// Records that the entry in slot `from` now lives in the unlinked slot
    /// `to`.
    pub(crate) fn relink(&mut self, from: usize, to: usize) {
        let link = self.links[from];
        let raw = to as u32;
        match index(link.prev) {
            Some(prev) => self.links[prev].next = raw,
            None => self.first = raw,
        }
        match index(link.next) {
            Some(next) => self.links[next].prev = raw,
            None => self.last = raw,
        }
        self.links[to] = link;
        self.links[from] = Link::UNLINKED;
    }

    pub(crate) fn move_to_first(&mut self, slot: usize) {
        if self.first != slot as u32 {
            self.unlink(slot);
            self.prepend(slot);
        }
    }

    pub(crate) fn move_to_last(&mut self, slot: usize) {
        if self.last != slot as u32 {
            self.unlink(slot);
            self.append(slot);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.links.fill(Link::UNLINKED);
        self.first = NIL;
        self.last = NIL;
    }

    /// Collects the slots in list order, checking that the list consists of
    /// exactly `len` live slots.
    pub(crate) fn walk(
        &self,
        len: usize,
        is_live: impl Fn(usize) -> bool,
    ) -> Result<Vec<usize>, Error> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory { capacity: len })?;

        let mut cursor = self.first();
        while let Some(slot) = cursor {
            if slots.len() == len || !is_live(slot) {
                return Err(Error::ConcurrentModification);
            }
            slots.push(slot);
            cursor = self.next(slot);
        }

        if slots.len() != len {
            return Err(Error::ConcurrentModification);
        }
        Ok(slots)
    }

    #[cfg(feature = "stats")]
    pub(crate) fn bytes(&self) -> usize {
        self.links.len() * core::mem::size_of::<Link>()
    }
}
