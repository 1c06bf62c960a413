//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::collections::btree_map;
use std::sync::Arc;

use crate::collections::NeighborIndex;
use crate::debug::{Debug, LsaFlushReason, SeqNoMismatchReason};
use crate::error::Error;
use crate::flood::{flood, transmit_delay};
use crate::instance::Instance;
use crate::lsdb::{self, LSA_MAX_SEQ_NO, LSA_REFRESH_TIME, LsaEntryFlags};
use crate::neighbor::{LastDbDesc, fsm, nsm};
use crate::node::Node;
use crate::output;
use crate::packet::lsa::{LinkStatus, LsaKey};
use crate::packet::{
    DbDesc, DbDescFlags, Hello, LsAck, LsRequest, LsUpdate, PacketType,
    RouterId,
};
use crate::tasks::{RxmtAck, TimerId};

// ===== Hello packet receipt =====

pub(crate) fn process_packet_hello<N>(
    instance: &mut Instance<N>,
    src: RouterId,
    hello: Hello,
) -> Result<bool, Error>
where
    N: Node,
{
    // Check for Hello parameters mismatch.
    if hello.hello_interval != instance.node.hello_interval() {
        Error::HelloIntervalMismatch(src, hello.hello_interval).log();
        return Ok(false);
    }
    if hello.dead_interval != instance.node.router_dead_interval() {
        Error::DeadIntervalMismatch(src, hello.dead_interval).log();
        return Ok(false);
    }

    // Create neighbor if it doesn't exist yet.
    let nbr_idx = instance.neighbor_get_or_create(src);

    let nbr = &mut instance.state.neighbors[nbr_idx];
    nbr.options = Some(hello.options);
    instance.state.neighbor_list.insert(src);

    // Hellos are flowing again on the link towards this neighbor.
    let recomputed = change_link_status(instance, src, LinkStatus::Up);

    fsm(instance, nbr_idx, nsm::Event::HelloRcvd);

    // Check whether the neighbor sees us.
    if hello.neighbors.contains(&instance.router_id) {
        instance.state.adjacencies.insert(src);
        fsm(instance, nbr_idx, nsm::Event::TwoWayRcvd);
    } else {
        fsm(instance, nbr_idx, nsm::Event::OneWayRcvd);
    }

    Ok(recomputed)
}

// ===== Database Description packet receipt =====

pub(crate) fn process_packet_dbdesc<N>(
    instance: &mut Instance<N>,
    src: RouterId,
    dbdesc: DbDesc,
) -> Result<bool, Error>
where
    N: Node,
{
    let router_id = instance.router_id;
    let (nbr_idx, nbr) = instance.state.neighbors.get_mut_by_router_id(src)?;

    // A DD from the slave carrying our sequence number answers the DD we're
    // retransmitting.
    if nbr.is_master()
        && nbr.state >= nsm::State::ExStart
        && !dbdesc.dd_flags.contains(DbDescFlags::MS)
    {
        instance.state.rxmt.message_in(
            &mut instance.node,
            &mut instance.state.msg_store,
            src,
            RxmtAck::DbDesc(dbdesc.dd_seq_no),
        );
    }

    // Further processing depends on the neighbor's state.
    match nbr.state {
        nsm::State::Down | nsm::State::Attempt | nsm::State::TwoWay => {
            Error::DbDescReject(src, nbr.state).log();
            return Ok(false);
        }
        nsm::State::Init | nsm::State::ExStart => {
            if nbr.state == nsm::State::Init {
                instance.state.adjacencies.insert(src);
                fsm(instance, nbr_idx, nsm::Event::TwoWayRcvd);
                if instance.state.neighbors[nbr_idx].state
                    != nsm::State::ExStart
                {
                    return Ok(false);
                }
                // Fall through to the ExStart case.
            }

            let nbr = &mut instance.state.neighbors[nbr_idx];
            if dbdesc
                .dd_flags
                .contains(DbDescFlags::I | DbDescFlags::M | DbDescFlags::MS)
                && dbdesc.lsa_hdrs.is_empty()
                && src > router_id
            {
                // Set the master/slave bit to slave, and set the neighbor data
                // structure's DD sequence number to that specified by the
                // master.
                Debug::NsmNegotiation(src, false).log();
                nbr.dd_flags.remove(DbDescFlags::MS);
                nbr.dd_seq_no = dbdesc.dd_seq_no;
                nbr.options = Some(dbdesc.options);
                nbr.last_rcvd_dbdesc = Some(LastDbDesc::from(&dbdesc));
                instance.state.rxmt.dbdesc_retire(&mut instance.node, src);

                fsm(instance, nbr_idx, nsm::Event::NegotiationDone);
                return Ok(false);
            } else if !dbdesc
                .dd_flags
                .intersects(DbDescFlags::I | DbDescFlags::MS)
                && dbdesc.dd_seq_no == nbr.dd_seq_no
                && src < router_id
            {
                // In this case the router is Master. The packet is also the
                // first one of the exchange, so its summary list is processed
                // below.
                Debug::NsmNegotiation(src, true).log();
                nbr.dd_seq_no = nbr.dd_seq_no.wrapping_add(1);
                nbr.options = Some(dbdesc.options);

                fsm(instance, nbr_idx, nsm::Event::NegotiationDone);
                process_dbdesc_summary(instance, nbr_idx, &dbdesc);
                return Ok(false);
            } else {
                // Ignore the packet.
                return Ok(false);
            }
        }
        nsm::State::Exchange => {
            // Check for exact duplicate packet.
            if nbr.dbdesc_is_dup(&dbdesc) {
                dbdesc_dup(instance, src, nbr_idx);
                return Ok(false);
            }

            // Sanity checks.
            let master = nbr.is_master();
            if dbdesc.dd_flags.contains(DbDescFlags::MS) == master
                || dbdesc.dd_flags.contains(DbDescFlags::I)
            {
                let reason = SeqNoMismatchReason::InconsistentFlags;
                let event = nsm::Event::SeqNoMismatch(reason);
                fsm(instance, nbr_idx, event);
                return Ok(false);
            }
            if Some(dbdesc.options) != nbr.options {
                let reason = SeqNoMismatchReason::InconsistentOptions;
                let event = nsm::Event::SeqNoMismatch(reason);
                fsm(instance, nbr_idx, event);
                return Ok(false);
            }

            // Check for duplicate packet.
            if dbdesc_is_dup_seq_no(master, dbdesc.dd_seq_no, nbr.dd_seq_no) {
                dbdesc_dup(instance, src, nbr_idx);
                return Ok(false);
            }

            // Check whether this is the next packet in sequence.
            let next = if master {
                dbdesc.dd_seq_no == nbr.dd_seq_no
            } else {
                dbdesc.dd_seq_no > nbr.dd_seq_no
            };
            if !next {
                let reason = SeqNoMismatchReason::InconsistentSeqNo;
                let event = nsm::Event::SeqNoMismatch(reason);
                fsm(instance, nbr_idx, event);
                return Ok(false);
            }
        }
        nsm::State::Loading | nsm::State::Full => {
            // Check for duplicate packet.
            if nbr.dbdesc_is_dup(&dbdesc)
                || dbdesc_is_dup_seq_no(
                    nbr.is_master(),
                    dbdesc.dd_seq_no,
                    nbr.dd_seq_no,
                )
            {
                dbdesc_dup(instance, src, nbr_idx);
                return Ok(false);
            }

            let reason = SeqNoMismatchReason::UnexpectedDbDesc;
            let event = nsm::Event::SeqNoMismatch(reason);
            fsm(instance, nbr_idx, event);
            return Ok(false);
        }
    }

    // If we got this far it means the packet was accepted.
    if !process_dbdesc_summary(instance, nbr_idx, &dbdesc) {
        return Ok(false);
    }

    // Further processing depends on whether the router is master or slave.
    let nbr = &mut instance.state.neighbors[nbr_idx];
    let more = dbdesc.dd_flags.contains(DbDescFlags::M);
    if nbr.is_master() {
        nbr.dd_seq_no = nbr.dd_seq_no.wrapping_add(1);
        if more {
            output::send_dbdesc(instance, nbr_idx);
        } else {
            fsm(instance, nbr_idx, nsm::Event::ExchangeDone);
        }
    } else {
        nbr.dd_seq_no = dbdesc.dd_seq_no;
        output::send_dbdesc(instance, nbr_idx);
        if !more {
            fsm(instance, nbr_idx, nsm::Event::ExchangeDone);
        }
    }

    Ok(false)
}

// Queues the LSAs listed in an accepted DD packet that need to be requested.
//
// Returns false if the packet was rejected.
fn process_dbdesc_summary<N>(
    instance: &mut Instance<N>,
    nbr_idx: NeighborIndex,
    dbdesc: &DbDesc,
) -> bool
where
    N: Node,
{
    // Check if the listed LSA types are valid.
    if dbdesc.lsa_hdrs.iter().any(|lsa_hdr| !lsa_hdr.lsa_type.is_valid()) {
        let reason = SeqNoMismatchReason::InvalidLsaType;
        fsm(instance, nbr_idx, nsm::Event::SeqNoMismatch(reason));
        return false;
    }

    // Put the LSA on the Link state request list if it's not present on the
    // LSDB, or if the local copy is less recent than the received one.
    let nbr = &mut instance.state.neighbors[nbr_idx];
    for lsa_hdr in &dbdesc.lsa_hdrs {
        match instance.state.lsdb.compare(lsa_hdr) {
            None | Some(Ordering::Greater) => {
                nbr.lists.ls_request.insert(lsa_hdr.key(), *lsa_hdr);
            }
            Some(Ordering::Equal | Ordering::Less) => (),
        }
    }

    // Save last received Database Description packet.
    nbr.last_rcvd_dbdesc = Some(LastDbDesc::from(dbdesc));
    true
}

fn dbdesc_is_dup_seq_no(master: bool, rcvd_seq_no: u32, seq_no: u32) -> bool {
    if master {
        rcvd_seq_no < seq_no
    } else {
        rcvd_seq_no == seq_no
    }
}

// The master discards duplicate DD packets, while the slave answers them by
// repeating the last DD packet it had sent.
fn dbdesc_dup<N>(
    instance: &mut Instance<N>,
    src: RouterId,
    nbr_idx: NeighborIndex,
) where
    N: Node,
{
    let nbr = &instance.state.neighbors[nbr_idx];
    if nbr.is_master() {
        return;
    }
    if let Some(msg_id) = nbr.last_sent_dbdesc {
        output::resend(instance, src, PacketType::DbDesc, msg_id);
    }
}

// ===== LS Request packet receipt =====

pub(crate) fn process_packet_lsreq<N>(
    instance: &mut Instance<N>,
    src: RouterId,
    ls_req: LsRequest,
) -> Result<bool, Error>
where
    N: Node,
{
    let (nbr_idx, nbr) = instance.state.neighbors.get_by_router_id(src)?;

    // Check the neighbor's state.
    if !matches!(
        nbr.state,
        nsm::State::Exchange | nsm::State::Loading | nsm::State::Full
    ) {
        Debug::PacketRxIgnore(src, &nbr.state).log();
        return Ok(false);
    }

    // Every requested LSA must be present in the LSDB.
    let mut lsas = vec![];
    for lsa_key in &ls_req.entries {
        match instance.state.lsdb.get(lsa_key) {
            Some((_, lse)) => lsas.push(lse.data.clone()),
            None => {
                fsm(instance, nbr_idx, nsm::Event::BadLsReq);
                return Ok(false);
            }
        }
    }
    if lsas.is_empty() {
        return Ok(false);
    }

    // Add the LSAs to the retransmission list and send them back.
    let delay = instance
        .node
        .one_way_delays()
        .get(&src)
        .copied()
        .unwrap_or_default();
    let nbr = &mut instance.state.neighbors[nbr_idx];
    let lsas = lsas
        .into_iter()
        .map(|lsa| {
            nbr.lists.ls_rxmt.insert(lsa.hdr.key(), lsa.clone());
            lsa.with_age(lsa.hdr.age.saturating_add(transmit_delay(delay)))
        })
        .collect();
    let origin = instance.router_id;
    output::send_lsupd(instance, src, origin, lsas);

    Ok(false)
}

// ===== LS Update packet receipt =====

pub(crate) fn process_packet_lsupd<N>(
    instance: &mut Instance<N>,
    src: RouterId,
    ls_upd: LsUpdate,
) -> Result<bool, Error>
where
    N: Node,
{
    let (nbr_idx, nbr) = instance.state.neighbors.get_by_router_id(src)?;

    // Check the neighbor's state.
    if nbr.state < nsm::State::Exchange {
        Debug::PacketRxIgnore(src, &nbr.state).log();
        return Ok(false);
    }

    let router_id = instance.router_id;
    let mut acks = vec![];
    let mut recomputed = false;
    for lsa in ls_upd.lsas {
        let lsa_key = lsa.hdr.key();

        // (1-3) Discard LSAs of unknown types.
        if !lsa.hdr.lsa_type.is_valid() {
            Error::UnknownLsaType(src, lsa.hdr.lsa_type).log();
            continue;
        }

        // (4) MaxAge LSA not present in the LSDB.
        let cmp = instance.state.lsdb.compare(&lsa.hdr);
        if lsa.hdr.is_maxage() && cmp.is_none() {
            acks.push(lsa.hdr);
            let nbr = &mut instance.state.neighbors[nbr_idx];
            nbr.lists.ls_request.remove(&lsa_key);
            if nbr.is_synchronizing() {
                let adv_rtr = lsa.hdr.adv_rtr;
                lsdb::install(instance, Arc::new(lsa), LsaEntryFlags::RECEIVED);
                instance.state.aging.start(&mut instance.node, adv_rtr);
            }
            continue;
        }

        match cmp {
            // (5) New or more recent LSA.
            None | Some(Ordering::Greater) => {
                acks.push(lsa.hdr);

                // A more recent instance of our own LSA is circulating.
                // Advance our sequence number past it.
                if lsa.hdr.adv_rtr == router_id {
                    let nbr = &mut instance.state.neighbors[nbr_idx];
                    nbr.lists.ls_request.remove(&lsa_key);
                    reoriginate_self_lsa(instance, lsa.hdr.seq_no);
                    continue;
                }

                let adv_rtr = lsa.hdr.adv_rtr;
                let lsa = Arc::new(lsa);
                flood(instance, Some(src), &lsa);
                let changed =
                    lsdb::install(instance, lsa, LsaEntryFlags::RECEIVED);
                instance.state.aging.start(&mut instance.node, adv_rtr);
                if changed {
                    instance.compute_routes();
                    recomputed = true;
                }
            }
            // (7) Same instance as the database copy.
            Some(Ordering::Equal) => {
                let nbr = &mut instance.state.neighbors[nbr_idx];
                if nbr.lists.ls_rxmt.remove(&lsa_key).is_some()
                    && nbr.lists.ls_rxmt.is_empty()
                {
                    // Implied acknowledgment.
                    instance.state.rxmt.message_in(
                        &mut instance.node,
                        &mut instance.state.msg_store,
                        src,
                        RxmtAck::LsAck,
                    );
                }
                acks.push(lsa.hdr);
            }
            // (8) Database copy is more recent.
            Some(Ordering::Less) => {
                let nbr = &instance.state.neighbors[nbr_idx];
                if nbr.lists.ls_request.contains_key(&lsa_key) {
                    fsm(instance, nbr_idx, nsm::Event::BadLsReq);
                    return Ok(recomputed);
                }

                let Some((_, lse)) = instance.state.lsdb.get(&lsa_key) else {
                    continue;
                };
                let db_lsa = lse.data.clone();
                if db_lsa.hdr.is_maxage() && db_lsa.hdr.seq_no == LSA_MAX_SEQ_NO
                {
                    continue;
                }

                // Send the database copy back to the neighbor.
                let nbr = &mut instance.state.neighbors[nbr_idx];
                nbr.lists.ls_rxmt.insert(lsa_key, db_lsa.clone());
                let delay = instance
                    .node
                    .one_way_delays()
                    .get(&src)
                    .copied()
                    .unwrap_or_default();
                let age = db_lsa.hdr.age.saturating_add(transmit_delay(delay));
                let origin = db_lsa.hdr.adv_rtr;
                output::send_lsupd(
                    instance,
                    src,
                    origin,
                    vec![db_lsa.with_age(age)],
                );
            }
        }
    }

    // Acknowledge all received LSAs at once.
    if !acks.is_empty() {
        output::send_lsack(instance, src, acks);
    }

    // Check if the database loading has completed.
    let nbr = &instance.state.neighbors[nbr_idx];
    if nbr.state == nsm::State::Loading && nbr.lists.ls_request.is_empty() {
        instance.state.rxmt.message_in(
            &mut instance.node,
            &mut instance.state.msg_store,
            src,
            RxmtAck::LsUpdate,
        );
        fsm(instance, nbr_idx, nsm::Event::LoadingDone);
    }

    Ok(recomputed)
}

// ===== LS Ack packet receipt =====

pub(crate) fn process_packet_lsack<N>(
    instance: &mut Instance<N>,
    src: RouterId,
    ls_ack: LsAck,
) -> Result<bool, Error>
where
    N: Node,
{
    let (_, nbr) = instance.state.neighbors.get_mut_by_router_id(src)?;

    // Check the neighbor's state.
    if nbr.state < nsm::State::Exchange {
        Debug::PacketRxIgnore(src, &nbr.state).log();
        return Ok(false);
    }

    // Remove the acknowledged instances from the retransmission list.
    let mut removed = false;
    for lsa_hdr in &ls_ack.lsa_hdrs {
        if let btree_map::Entry::Occupied(o) =
            nbr.lists.ls_rxmt.entry(lsa_hdr.key())
            && o.get().hdr.seq_no == lsa_hdr.seq_no
        {
            o.remove();
            removed = true;
        }
    }

    if removed && nbr.lists.ls_rxmt.is_empty() {
        instance.state.rxmt.message_in(
            &mut instance.node,
            &mut instance.state.msg_store,
            src,
            RxmtAck::LsAck,
        );
    }

    Ok(false)
}

// ===== Local link status change =====

// Updates the status of the local router-LSA link towards `link_id`.
//
// Returns whether a new instance of the router-LSA was originated.
pub(crate) fn change_link_status<N>(
    instance: &mut Instance<N>,
    link_id: RouterId,
    status: LinkStatus,
) -> bool
where
    N: Node,
{
    let router_id = instance.router_id;
    let Some(lse) = instance.state.lsdb.router_lsa(router_id) else {
        Error::SelfLsaMissing(router_id).log();
        return false;
    };
    let seq_no = lse.data.hdr.seq_no;
    let mut links = lse.data.router_links().unwrap_or_default().to_vec();
    let Some(link) = links.iter_mut().find(|link| link.link_id == link_id)
    else {
        return false;
    };
    if link.status == status {
        return false;
    }
    link.status = status;

    let lsa =
        lsdb::originate_router_lsa(instance, links, lsdb::next_seq_no(seq_no));

    // Resume aging the neighbor's LSAs.
    if status == LinkStatus::Up
        && instance.state.lsdb.router_lsa(link_id).is_some()
    {
        instance.state.aging.start(&mut instance.node, link_id);
    }

    instance.compute_routes();
    flood(instance, Some(link_id), &lsa);
    instance.node.interfaces_changed();
    true
}

// Originates our router-LSA again with a sequence number greater than the
// given one.
fn reoriginate_self_lsa<N>(instance: &mut Instance<N>, seq_no: u32)
where
    N: Node,
{
    let router_id = instance.router_id;
    let Some(lse) = instance.state.lsdb.router_lsa(router_id) else {
        Error::SelfLsaMissing(router_id).log();
        return;
    };
    let links = lse.data.router_links().unwrap_or_default().to_vec();
    let lsa =
        lsdb::originate_router_lsa(instance, links, lsdb::next_seq_no(seq_no));
    flood(instance, None, &lsa);
}

// ===== Retransmission timers =====

pub(crate) fn process_rxmt_timer<N>(
    instance: &mut Instance<N>,
    peer: RouterId,
) -> Result<bool, Error>
where
    N: Node,
{
    let Some(entry) = instance.state.rxmt.get(peer).cloned() else {
        return Ok(false);
    };

    // The outstanding DD takes precedence over the LS Request.
    if let Some((msg_id, _)) = entry.dd {
        if !output::resend(instance, peer, PacketType::DbDesc, msg_id) {
            instance.state.rxmt.dbdesc_retire(&mut instance.node, peer);
        }
    } else if let Some(msg_id) = entry.request {
        if !output::resend(instance, peer, PacketType::LsRequest, msg_id) {
            instance.state.rxmt.message_in(
                &mut instance.node,
                &mut instance.state.msg_store,
                peer,
                RxmtAck::LsUpdate,
            );
        }
    } else {
        return Ok(false);
    }

    if let Some(entry) = instance.state.rxmt.get(peer)
        && (entry.dd.is_some() || entry.request.is_some())
    {
        let timeout = entry.timeout;
        instance.node.timer_reschedule(TimerId::Rxmt(peer), timeout);
    }

    Ok(false)
}

pub(crate) fn process_rxmt_update_timer<N>(
    instance: &mut Instance<N>,
    peer: RouterId,
) -> Result<bool, Error>
where
    N: Node,
{
    let Some(entry) = instance.state.rxmt.get(peer).cloned() else {
        return Ok(false);
    };

    let mut evicted = false;
    for (origin, msg_id) in entry.updates {
        if !output::resend(instance, peer, PacketType::LsUpdate, msg_id) {
            instance.state.rxmt.update_retire(peer, origin);
            evicted = true;
        }
    }

    // Rebuild the evicted Updates from the retransmission list.
    if evicted {
        let (_, nbr) = instance.state.neighbors.get_by_router_id(peer)?;
        let delay = instance
            .node
            .one_way_delays()
            .get(&peer)
            .copied()
            .unwrap_or_default();
        let lsas = nbr
            .lists
            .ls_rxmt
            .values()
            .map(|lsa| {
                lsa.with_age(lsa.hdr.age.saturating_add(transmit_delay(delay)))
            })
            .collect::<Vec<_>>();
        if !lsas.is_empty() {
            let origin = instance.router_id;
            output::send_lsupd(instance, peer, origin, lsas);
        }
    }

    if let Some(entry) = instance.state.rxmt.get(peer)
        && !entry.updates.is_empty()
    {
        let timeout = entry.timeout;
        instance
            .node
            .timer_reschedule(TimerId::RxmtUpdate(peer), timeout);
    }

    Ok(false)
}

// ===== Inactivity timer =====

pub(crate) fn process_inactivity_timer<N>(
    instance: &mut Instance<N>,
    peer: RouterId,
) -> Result<bool, Error>
where
    N: Node,
{
    if !instance.state.inactivity.expired(peer) {
        return Ok(false);
    }

    let (nbr_idx, _) = instance.state.neighbors.get_by_router_id(peer)?;
    fsm(instance, nbr_idx, nsm::Event::InactivityTimer);

    Ok(true)
}

// ===== Aging timer =====

pub(crate) fn process_aging_timer<N>(
    instance: &mut Instance<N>,
    adv_rtr: RouterId,
) -> Result<bool, Error>
where
    N: Node,
{
    if !instance.state.aging.expired(adv_rtr) {
        return Ok(false);
    }

    // Refresh our own router-LSA periodically.
    let router_id = instance.router_id;
    if adv_rtr == router_id {
        let lse = instance
            .state
            .lsdb
            .router_lsa(router_id)
            .ok_or(Error::SelfLsaMissing(router_id))?;
        if lse.data.hdr.age >= LSA_REFRESH_TIME {
            Debug::LsaRefresh(&lse.data.hdr).log();
            let seq_no = lsdb::next_seq_no(lse.data.hdr.seq_no);
            let links = lse.data.router_links().unwrap_or_default().to_vec();
            let lsa = lsdb::originate_router_lsa(instance, links, seq_no);
            flood(instance, None, &lsa);
            instance.state.aging.start(&mut instance.node, router_id);
            return Ok(false);
        }
    }

    // Remove MaxAge LSAs that are no longer needed for flooding or database
    // exchange.
    let synchronizing = instance
        .state
        .neighbors
        .iter()
        .any(|nbr| nbr.is_synchronizing());
    if !synchronizing {
        let maxage_lsas = instance
            .state
            .lsdb
            .iter_by_originator(adv_rtr)
            .filter(|(_, lse)| lse.data.hdr.is_maxage())
            .map(|(_, lse)| lse.data.hdr.key())
            .collect::<Vec<LsaKey>>();
        for lsa_key in maxage_lsas {
            if instance
                .state
                .neighbors
                .iter()
                .any(|nbr| nbr.lists.ls_rxmt.contains_key(&lsa_key))
            {
                continue;
            }
            if let Some(lse) = instance.state.lsdb.delete(&lsa_key) {
                Debug::LsaFlush(&lse.data.hdr, LsaFlushReason::Expiry).log();
            }
        }
    }

    // Age the originator's LSAs.
    let amount = aging_amount(instance);
    let maxage = instance.state.lsdb.increment_age(adv_rtr, amount);
    let recomputed = !maxage.is_empty();
    if recomputed {
        for lsa_key in &maxage {
            if let Some((_, lse)) = instance.state.lsdb.get(lsa_key) {
                Debug::LsaMaxAge(&lse.data.hdr).log();
            }
        }
        instance.compute_routes();
    }

    // Keep aging while the originator has LSAs left.
    if instance
        .state
        .lsdb
        .iter_by_originator(adv_rtr)
        .next()
        .is_some()
    {
        instance.state.aging.start(&mut instance.node, adv_rtr);
    }

    Ok(recomputed)
}

// ===== helper functions =====

fn aging_amount<N>(instance: &Instance<N>) -> u16
where
    N: Node,
{
    let secs = instance.state.aging.interval().as_secs();
    secs.clamp(1, u16::MAX.into()) as u16
}

impl From<&DbDesc> for LastDbDesc {
    fn from(dbdesc: &DbDesc) -> LastDbDesc {
        LastDbDesc {
            options: dbdesc.options,
            dd_flags: dbdesc.dd_flags,
            dd_seq_no: dbdesc.dd_seq_no,
        }
    }
}
