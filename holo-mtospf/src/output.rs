//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use crate::collections::NeighborIndex;
use crate::debug::Debug;
use crate::error::Error;
use crate::instance::Instance;
use crate::node::Node;
use crate::packet::lsa::{Lsa, LsaHdr};
use crate::packet::{
    DbDesc, DbDescFlags, Hello, LsAck, LsRequest, LsUpdate, MsgId, Options,
    Packet, PacketHdr, PacketType, RouterId,
};
use crate::tasks::RxmtMessage;

// ===== Hello Packets =====

// Generates and stores a Hello packet advertising the current neighbor list.
pub(crate) fn hello<N>(instance: &mut Instance<N>) -> Packet
where
    N: Node,
{
    let pkt_hdr = packet_hdr(instance, PacketType::Hello);
    let mut packet = Packet::Hello(Hello {
        hdr: pkt_hdr,
        network_mask: 0,
        hello_interval: instance.node.hello_interval(),
        options: Options::T,
        dead_interval: instance.node.router_dead_interval(),
        neighbors: instance.state.neighbor_list.clone(),
    });

    let msg_id = instance
        .state
        .msg_store
        .insert(instance.router_id, packet.clone());
    packet.hdr_mut().msg_id = msg_id;
    packet
}

pub(crate) fn send_hello<N>(
    instance: &mut Instance<N>,
    dst: RouterId,
    packet: Packet,
) where
    N: Node,
{
    Debug::PacketTx(dst, &packet).log();
    instance.node.send_message(dst, packet);
}

// ===== Database Description Packets =====

pub(crate) fn send_dbdesc<N>(
    instance: &mut Instance<N>,
    nbr_idx: NeighborIndex,
) where
    N: Node,
{
    let pkt_hdr = packet_hdr(instance, PacketType::DbDesc);
    let nbr = &mut instance.state.neighbors[nbr_idx];

    // Outside the initial packet, all pending summaries fit in a single DD.
    let mut lsa_hdrs = vec![];
    if !nbr.dd_flags.contains(DbDescFlags::I) {
        lsa_hdrs = std::mem::take(&mut nbr.lists.db_summary)
            .into_values()
            .collect();
        nbr.dd_flags.remove(DbDescFlags::M);
    }

    let dst = nbr.router_id;
    let dd_seq_no = nbr.dd_seq_no;
    let master = nbr.is_master();
    let packet = Packet::DbDesc(DbDesc {
        hdr: pkt_hdr,
        options: Options::T,
        dd_flags: nbr.dd_flags,
        dd_seq_no,
        lsa_hdrs,
    });

    let origin = instance.router_id;
    let msg_id = send(instance, dst, origin, packet);
    instance.state.neighbors[nbr_idx].last_sent_dbdesc = Some(msg_id);

    // Only the master retransmits DD packets.
    if master {
        instance.state.rxmt.message_out(
            &mut instance.node,
            dst,
            RxmtMessage::DbDesc { msg_id, dd_seq_no },
        );
    }
}

// ===== LS Request Packets =====

pub(crate) fn send_lsreq<N>(
    instance: &mut Instance<N>,
    nbr_idx: NeighborIndex,
) where
    N: Node,
{
    let pkt_hdr = packet_hdr(instance, PacketType::LsRequest);
    let nbr = &instance.state.neighbors[nbr_idx];
    let dst = nbr.router_id;
    let packet = Packet::LsRequest(LsRequest {
        hdr: pkt_hdr,
        entries: nbr.lists.ls_request.keys().copied().collect(),
    });

    let origin = instance.router_id;
    let msg_id = send(instance, dst, origin, packet);
    instance.state.rxmt.message_out(
        &mut instance.node,
        dst,
        RxmtMessage::LsRequest(msg_id),
    );
}

// ===== LS Update Packets =====

// Sends an LS Update and registers it for retransmission under `origin`.
pub(crate) fn send_lsupd<N>(
    instance: &mut Instance<N>,
    dst: RouterId,
    origin: RouterId,
    lsas: Vec<Lsa>,
) where
    N: Node,
{
    let pkt_hdr = packet_hdr(instance, PacketType::LsUpdate);
    let packet = Packet::LsUpdate(LsUpdate { hdr: pkt_hdr, lsas });

    let msg_id = send(instance, dst, origin, packet);
    instance.state.rxmt.message_out(
        &mut instance.node,
        dst,
        RxmtMessage::LsUpdate { origin, msg_id },
    );
}

// ===== LS Ack Packets =====

pub(crate) fn send_lsack<N>(
    instance: &mut Instance<N>,
    dst: RouterId,
    lsa_hdrs: Vec<LsaHdr>,
) where
    N: Node,
{
    let pkt_hdr = packet_hdr(instance, PacketType::LsAck);
    let packet = Packet::LsAck(LsAck {
        hdr: pkt_hdr,
        lsa_hdrs,
    });

    let origin = instance.router_id;
    send(instance, dst, origin, packet);
}

// ===== Retransmissions =====

// Sends again a message kept in the message store.
//
// Returns false if the message was evicted in the meantime.
pub(crate) fn resend<N>(
    instance: &mut Instance<N>,
    dst: RouterId,
    pkt_type: PacketType,
    msg_id: MsgId,
) -> bool
where
    N: Node,
{
    let Some(msg) = instance.state.msg_store.get(pkt_type, msg_id) else {
        Error::MessageEvicted(pkt_type, msg_id).log();
        return false;
    };

    let packet = msg.packet.clone();
    Debug::PacketRxmt(dst, &packet).log();
    instance.node.send_message(dst, packet);
    true
}

// ===== helper functions =====

fn packet_hdr<N>(instance: &Instance<N>, pkt_type: PacketType) -> PacketHdr
where
    N: Node,
{
    PacketHdr::new(pkt_type, instance.router_id, instance.config.area_id)
}

// Stores a packet in the message store and hands it to the host.
fn send<N>(
    instance: &mut Instance<N>,
    dst: RouterId,
    origin: RouterId,
    mut packet: Packet,
) -> MsgId
where
    N: Node,
{
    let msg_id = instance.state.msg_store.insert(origin, packet.clone());
    packet.hdr_mut().msg_id = msg_id;

    Debug::PacketTx(dst, &packet).log();
    instance.node.send_message(dst, packet);
    msg_id
}
