//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::sync::Arc;

use bitflags::bitflags;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::collections::Lsdb;
use crate::debug::Debug;
use crate::instance::Instance;
use crate::node::Node;
use crate::packet::lsa::{
    LinkStatus, Lsa, LsaBody, LsaHdr, LsaKey, LsaRouter, LsaRouterLink,
};
use crate::packet::{Options, RouterId};

// Architectural Constants.
pub const LSA_REFRESH_TIME: u16 = 1800;
pub const LSA_MAX_AGE: u16 = 3600;
pub const LSA_MAX_AGE_DIFF: u16 = 900;
pub const LSA_INIT_SEQ_NO: u32 = 0;
pub const LSA_MAX_SEQ_NO: u32 = 2147483646;

#[derive(Clone, Debug, new)]
pub struct LsaEntry {
    // LSA data.
    pub data: Arc<Lsa>,
    // LSA entry flags.
    pub flags: LsaEntryFlags,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct LsaEntryFlags: u8 {
        const RECEIVED = 0x01;
        const SELF_ORIGINATED = 0x02;
    }
}

// ===== impl Lsdb =====

impl Lsdb {
    // Compares the received LSA header against the database copy.
    //
    // Returns `None` when no instance of the LSA is present, otherwise
    // `Ordering::Greater` when the received instance is newer.
    pub fn compare(&self, hdr: &LsaHdr) -> Option<Ordering> {
        self.get(&hdr.key())
            .map(|(_, lse)| lsa_compare(hdr, &lse.data.hdr))
    }

    // Ages every LSA of the given originator by `amount` seconds, saturating at
    // MaxAge.
    //
    // Returns the keys of the LSAs that reached MaxAge by this call.
    pub fn increment_age(
        &mut self,
        adv_rtr: RouterId,
        amount: u16,
    ) -> Vec<LsaKey> {
        let keys = self
            .iter_by_originator(adv_rtr)
            .filter(|(_, lse)| !lse.data.hdr.is_maxage())
            .map(|(_, lse)| lse.data.hdr.key())
            .collect::<Vec<_>>();

        let mut maxage = vec![];
        for key in keys {
            let Some(lse) = self.get_mut(&key) else {
                continue;
            };
            let lsa = Arc::make_mut(&mut lse.data);
            lsa.hdr.age = lsa.hdr.age.saturating_add(amount).min(LSA_MAX_AGE);
            if lsa.hdr.is_maxage() {
                maxage.push(key);
            }
        }

        maxage
    }

    // Merges the given links into the originator's router-LSA.
    //
    // Links are matched by their Link ID. Metric changes are copied, a link
    // going down forces the stored link down and unknown links are appended.
    // A link coming up doesn't override a stored link that is down; that
    // transition is driven by the neighbor's Hellos.
    //
    // When anything changes, a new instance is installed. Returns whether the
    // router-LSA was modified.
    pub fn update(
        &mut self,
        adv_rtr: RouterId,
        new_links: &[LsaRouterLink],
    ) -> bool {
        let Some(lse) = self.router_lsa(adv_rtr) else {
            let lsa = Lsa::new(
                0,
                Options::T,
                adv_rtr,
                adv_rtr,
                LSA_INIT_SEQ_NO,
                LsaBody::Router(LsaRouter::new(new_links.to_vec())),
            );
            self.insert(Arc::new(lsa), LsaEntryFlags::SELF_ORIGINATED);
            return true;
        };

        let flags = lse.flags;
        let old_lsa = lse.data.clone();
        let mut links = old_lsa.router_links().unwrap_or_default().to_vec();
        let mut changed = false;
        for new_link in new_links {
            match links
                .iter_mut()
                .find(|link| link.link_id == new_link.link_id)
            {
                Some(link) => {
                    if new_link.status == LinkStatus::Down
                        && link.status != LinkStatus::Down
                    {
                        link.status = LinkStatus::Down;
                        changed = true;
                    }
                    if link.mt_metrics != new_link.mt_metrics {
                        link.mt_metrics = new_link.mt_metrics.clone();
                        changed = true;
                    }
                }
                None => {
                    links.push(new_link.clone());
                    changed = true;
                }
            }
        }

        if changed {
            let lsa = Lsa::new(
                0,
                old_lsa.hdr.options,
                old_lsa.hdr.lsa_id,
                adv_rtr,
                next_seq_no(old_lsa.hdr.seq_no),
                LsaBody::Router(LsaRouter::new(links)),
            );
            self.insert(Arc::new(lsa), flags);
        }

        changed
    }
}

// ===== global functions =====

// Compares which LSA is more recent according to the rules specified in Section
// 13.1 of RFC 2328 (checksums are not used).
//
// Returns:
// - Ordering::Greater when `a` is more recent
// - Ordering::Less when `b` is more recent
// - Ordering::Equal when the two LSAs are considered to be identical
pub fn lsa_compare(a: &LsaHdr, b: &LsaHdr) -> Ordering {
    let cmp = a.seq_no.cmp(&b.seq_no);
    if cmp != Ordering::Equal {
        return cmp;
    }

    if a.is_maxage() && !b.is_maxage() {
        return Ordering::Greater;
    } else if !a.is_maxage() && b.is_maxage() {
        return Ordering::Less;
    }

    if a.age.abs_diff(b.age) > LSA_MAX_AGE_DIFF {
        return b.age.cmp(&a.age);
    }

    Ordering::Equal
}

// Checks whether two instances of the same LSA carry the same routing
// information.
pub(crate) fn lsa_same_contents(a: &Lsa, b: &Lsa) -> bool {
    if a.hdr.options != b.hdr.options {
        return false;
    }

    if a.hdr.is_maxage() ^ b.hdr.is_maxage() {
        return false;
    }

    a.body == b.body
}

// Returns the sequence number of the next instance of an LSA.
pub(crate) fn next_seq_no(seq_no: u32) -> u32 {
    if seq_no >= LSA_MAX_SEQ_NO {
        LSA_INIT_SEQ_NO
    } else {
        seq_no + 1
    }
}

// Installs the provided LSA in the LSDB.
//
// Returns whether the installation affects the routing table, either because
// the LSA wasn't present before or because its contents changed.
pub(crate) fn install<N>(
    instance: &mut Instance<N>,
    lsa: Arc<Lsa>,
    flags: LsaEntryFlags,
) -> bool
where
    N: Node,
{
    Debug::LsaInstall(&lsa.hdr).log();

    let (_, old) = instance.state.lsdb.insert(lsa.clone(), flags);
    match old {
        Some(old) => !lsa_same_contents(&old.data, &lsa),
        None => true,
    }
}

// Originates a new instance of the local router-LSA.
pub(crate) fn originate_router_lsa<N>(
    instance: &mut Instance<N>,
    links: Vec<LsaRouterLink>,
    seq_no: u32,
) -> Arc<Lsa>
where
    N: Node,
{
    let router_id = instance.router_id;
    let lsa = Lsa::new(
        0,
        Options::T,
        router_id,
        router_id,
        seq_no,
        LsaBody::Router(LsaRouter::new(links)),
    );
    Debug::LsaOriginate(&lsa.hdr).log();

    let lsa = Arc::new(lsa);
    instance
        .state
        .lsdb
        .insert(lsa.clone(), LsaEntryFlags::SELF_ORIGINATED);
    lsa
}
