//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::sync::Arc;

use generational_arena::Index;

use crate::error::Error;
use crate::lsdb::{LsaEntry, LsaEntryFlags};
use crate::neighbor::Neighbor;
use crate::packet::RouterId;
use crate::packet::lsa::{Lsa, LsaKey};

pub type NeighborIndex = Index;
pub type LsaEntryIndex = Index;

#[derive(Debug)]
pub struct Arena<T>(generational_arena::Arena<T>);

#[derive(Debug, Default)]
pub struct Neighbors {
    arena: Arena<Neighbor>,
    router_id_tree: BTreeMap<RouterId, NeighborIndex>,
}

#[derive(Debug, Default)]
pub struct Lsdb {
    arena: Arena<LsaEntry>,
    tree: BTreeMap<LsaKey, LsaEntryIndex>,
}

// ===== impl Arena =====

impl<T> Arena<T> {
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn get(&self, index: Index) -> Option<&T> {
        self.0.get(index)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Arena<T> {
        Arena(Default::default())
    }
}

impl<T> std::ops::Index<Index> for Arena<T> {
    type Output = T;

    fn index(&self, index: Index) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> std::ops::IndexMut<Index> for Arena<T> {
    fn index_mut(&mut self, index: Index) -> &mut Self::Output {
        &mut self.0[index]
    }
}

// ===== impl Neighbors =====

impl Neighbors {
    // Creates a neighbor in the Down state.
    pub(crate) fn insert(
        &mut self,
        router_id: RouterId,
    ) -> (NeighborIndex, &mut Neighbor) {
        let nbr = Neighbor::new(router_id);
        let nbr_idx = self.arena.0.insert(nbr);
        self.router_id_tree.insert(router_id, nbr_idx);

        (nbr_idx, &mut self.arena[nbr_idx])
    }

    // Returns a reference to the neighbor corresponding to the given Router ID.
    pub fn get_by_router_id(
        &self,
        router_id: RouterId,
    ) -> Result<(NeighborIndex, &Neighbor), Error> {
        self.router_id_tree
            .get(&router_id)
            .copied()
            .map(|nbr_idx| (nbr_idx, &self.arena[nbr_idx]))
            .ok_or(Error::NbrNotFound(router_id))
    }

    // Returns a mutable reference to the neighbor corresponding to the given
    // Router ID.
    pub(crate) fn get_mut_by_router_id(
        &mut self,
        router_id: RouterId,
    ) -> Result<(NeighborIndex, &mut Neighbor), Error> {
        let arena = &mut self.arena;
        self.router_id_tree
            .get(&router_id)
            .copied()
            .map(move |nbr_idx| (nbr_idx, &mut arena[nbr_idx]))
            .ok_or(Error::NbrNotFound(router_id))
    }

    pub fn contains(&self, router_id: RouterId) -> bool {
        self.router_id_tree.contains_key(&router_id)
    }

    // Returns an iterator visiting all neighbors.
    //
    // Neighbors are ordered by their Router IDs.
    pub fn iter(&self) -> impl Iterator<Item = &Neighbor> + '_ {
        self.router_id_tree.values().map(|nbr_idx| &self.arena[*nbr_idx])
    }

    // Returns an iterator over all neighbor Router IDs.
    pub fn router_ids(&self) -> impl Iterator<Item = RouterId> + '_ {
        self.router_id_tree.keys().copied()
    }

    // Returns the number of neighbors.
    pub fn count(&self) -> usize {
        self.router_id_tree.len()
    }
}

impl std::ops::Index<NeighborIndex> for Neighbors {
    type Output = Neighbor;

    fn index(&self, index: NeighborIndex) -> &Self::Output {
        &self.arena[index]
    }
}

impl std::ops::IndexMut<NeighborIndex> for Neighbors {
    fn index_mut(&mut self, index: NeighborIndex) -> &mut Self::Output {
        &mut self.arena[index]
    }
}

// ===== impl Lsdb =====

impl Lsdb {
    // Installs the LSA under its advertising router.
    //
    // An entry with the same key is replaced and returned.
    pub fn insert(
        &mut self,
        lsa: Arc<Lsa>,
        flags: LsaEntryFlags,
    ) -> (LsaEntryIndex, Option<LsaEntry>) {
        let key = lsa.hdr.key();
        let old = self.delete(&key);

        let lse = LsaEntry::new(lsa, flags);
        let lse_idx = self.arena.0.insert(lse);
        self.tree.insert(key, lse_idx);

        (lse_idx, old)
    }

    // Removes the LSA corresponding to the given key.
    pub fn delete(&mut self, key: &LsaKey) -> Option<LsaEntry> {
        let lse_idx = self.tree.remove(key)?;
        self.arena.0.remove(lse_idx)
    }

    // Returns the entry corresponding to the given key.
    pub fn get(&self, key: &LsaKey) -> Option<(LsaEntryIndex, &LsaEntry)> {
        self.tree
            .get(key)
            .copied()
            .map(|lse_idx| (lse_idx, &self.arena[lse_idx]))
    }

    pub(crate) fn get_mut(&mut self, key: &LsaKey) -> Option<&mut LsaEntry> {
        let lse_idx = self.tree.get(key).copied()?;
        Some(&mut self.arena[lse_idx])
    }

    // Returns the entry referenced by the given handle.
    //
    // Handles of deleted or replaced entries resolve to `None`.
    pub fn get_by_index(&self, lse_idx: LsaEntryIndex) -> Option<&LsaEntry> {
        self.arena.get(lse_idx)
    }

    // Returns the router-LSA originated by the given router.
    pub fn router_lsa(&self, adv_rtr: RouterId) -> Option<&LsaEntry> {
        self.get(&LsaKey::router(adv_rtr)).map(|(_, lse)| lse)
    }

    // Returns an iterator visiting all LSAs, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (LsaEntryIndex, &LsaEntry)> {
        self.tree
            .values()
            .map(|lse_idx| (*lse_idx, &self.arena[*lse_idx]))
    }

    // Returns an iterator visiting all LSAs originated by the given router.
    pub fn iter_by_originator(
        &self,
        adv_rtr: RouterId,
    ) -> impl Iterator<Item = (LsaEntryIndex, &LsaEntry)> {
        let (start, end) = LsaKey::originator_range(adv_rtr);
        self.tree
            .range(start..=end)
            .map(|(_, lse_idx)| (*lse_idx, &self.arena[*lse_idx]))
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}
