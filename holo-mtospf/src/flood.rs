//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::instance::Instance;
use crate::lsdb::{LSA_MAX_AGE, lsa_compare};
use crate::neighbor::{fsm, nsm};
use crate::node::Node;
use crate::output;
use crate::packet::RouterId;
use crate::packet::lsa::Lsa;
use crate::tasks::RxmtAck;

// ===== global functions =====

// Floods the LSA to all adjacent neighbors, except the one it was received
// from.
pub(crate) fn flood<N>(
    instance: &mut Instance<N>,
    src: Option<RouterId>,
    lsa: &Arc<Lsa>,
) where
    N: Node,
{
    let lsa_key = lsa.hdr.key();
    let delays = instance.node.one_way_delays();
    let mut loading_done = vec![];

    let adjacencies =
        instance.state.adjacencies.iter().copied().collect::<Vec<_>>();
    for router_id in adjacencies {
        let (nbr_idx, nbr) =
            match instance.state.neighbors.get_mut_by_router_id(router_id) {
                Ok(nbr) => nbr,
                Err(error) => {
                    error.log();
                    continue;
                }
            };

        // Skip neighbors in a lesser state than Exchange.
        if nbr.state < nsm::State::Exchange {
            continue;
        }

        // The LSA was received from this neighbor.
        if src == Some(router_id) {
            nbr.lists.ls_request.remove(&lsa_key);
            continue;
        }

        // Check the neighbor's request list.
        if nbr.is_synchronizing()
            && let Some(req_hdr) = nbr.lists.ls_request.get(&lsa_key)
        {
            let cmp = lsa_compare(&lsa.hdr, req_hdr);

            // The requested instance is more recent.
            if cmp == Ordering::Less {
                continue;
            }

            nbr.lists.ls_request.remove(&lsa_key);
            if nbr.state == nsm::State::Loading
                && nbr.lists.ls_request.is_empty()
            {
                loading_done.push(nbr_idx);
            }

            // The neighbor is about to receive the same instance.
            if cmp == Ordering::Equal {
                continue;
            }
        }

        // Add LSA to the neighbor's retransmission list.
        nbr.lists.ls_rxmt.insert(lsa_key, lsa.clone());

        // Account for the transmission delay.
        let delay = delays.get(&router_id).copied().unwrap_or_default();
        let age = lsa.hdr.age.saturating_add(transmit_delay(delay));
        let lsa = lsa.with_age(std::cmp::min(age, LSA_MAX_AGE));
        output::send_lsupd(instance, router_id, lsa.hdr.adv_rtr, vec![lsa]);
    }

    // Neighbors whose request list got emptied have finished loading.
    for nbr_idx in loading_done {
        let router_id = instance.state.neighbors[nbr_idx].router_id;
        instance.state.rxmt.message_in(
            &mut instance.node,
            &mut instance.state.msg_store,
            router_id,
            RxmtAck::LsUpdate,
        );
        fsm(instance, nbr_idx, nsm::Event::LoadingDone);
    }
}

// Returns the number of seconds an LSA ages while crossing a link, rounded up.
pub(crate) fn transmit_delay(delay: Duration) -> u16 {
    let secs = delay.as_secs() + u64::from(delay.subsec_nanos() > 0);
    secs.clamp(1, LSA_MAX_AGE.into()) as u16
}
