//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod lsa;

use std::collections::BTreeSet;

use bitflags::bitflags;
use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::packet::lsa::{Lsa, LsaHdr, LsaKey};

// Router identifier.
pub type RouterId = u32;
// Multi-topology identifier.
pub type MtId = u16;
// Message identifier assigned by the sender's message store.
pub type MsgId = u32;

// Protocol version carried in every packet header.
pub const VERSION: u8 = 2;
// Length of the common packet header.
pub const PACKET_HDR_LENGTH: u16 = 24;

// OSPF packet type.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Hash, Ord, PartialEq)]
#[derive(PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum PacketType {
    Hello = 0x01,
    DbDesc = 0x02,
    LsRequest = 0x03,
    LsUpdate = 0x04,
    LsAck = 0x05,
}

// OSPF options.
//
// Only the bits that have meaning inside a single-area multi-topology domain
// are defined.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct Options: u8 {
        const T = 0x01;
        const E = 0x02;
    }
}

// Database Description flags.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct DbDescFlags: u8 {
        const MS = 0x01;
        const M = 0x02;
        const I = 0x04;
    }
}

//
// OSPF packet header.
//
// Encoding format (for reference only, packets are exchanged in memory):
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |   Version #   |     Type      |         Packet length         |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                          Router ID                            |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                           Area ID                             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                          Message ID                           |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct PacketHdr {
    pub version: u8,
    pub pkt_type: PacketType,
    pub length: u16,
    pub router_id: RouterId,
    pub area_id: u32,
    pub msg_id: MsgId,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Hello {
    pub hdr: PacketHdr,
    pub network_mask: u32,
    pub hello_interval: u16,
    pub options: Options,
    pub dead_interval: u32,
    pub neighbors: BTreeSet<RouterId>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct DbDesc {
    pub hdr: PacketHdr,
    pub options: Options,
    pub dd_flags: DbDescFlags,
    pub dd_seq_no: u32,
    pub lsa_hdrs: Vec<LsaHdr>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsRequest {
    pub hdr: PacketHdr,
    pub entries: Vec<LsaKey>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsUpdate {
    pub hdr: PacketHdr,
    pub lsas: Vec<Lsa>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsAck {
    pub hdr: PacketHdr,
    pub lsa_hdrs: Vec<LsaHdr>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum Packet {
    Hello(Hello),
    DbDesc(DbDesc),
    LsRequest(LsRequest),
    LsUpdate(LsUpdate),
    LsAck(LsAck),
}

// ===== impl PacketType =====

impl PacketType {
    // Length of the packet body that follows the common header.
    pub const fn body_length(&self) -> u16 {
        match self {
            PacketType::Hello => 100,
            PacketType::DbDesc => 200,
            PacketType::LsRequest => 100,
            PacketType::LsUpdate => 100,
            PacketType::LsAck => 20,
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketType::Hello => write!(f, "Hello"),
            PacketType::DbDesc => write!(f, "Database Description"),
            PacketType::LsRequest => write!(f, "LS Request"),
            PacketType::LsUpdate => write!(f, "LS Update"),
            PacketType::LsAck => write!(f, "LS Ack"),
        }
    }
}

// ===== impl PacketHdr =====

impl PacketHdr {
    pub fn new(
        pkt_type: PacketType,
        router_id: RouterId,
        area_id: u32,
    ) -> Self {
        PacketHdr {
            version: VERSION,
            pkt_type,
            length: PACKET_HDR_LENGTH + pkt_type.body_length(),
            router_id,
            area_id,
            msg_id: 0,
        }
    }
}

// ===== impl Packet =====

impl Packet {
    pub fn hdr(&self) -> &PacketHdr {
        match self {
            Packet::Hello(pkt) => &pkt.hdr,
            Packet::DbDesc(pkt) => &pkt.hdr,
            Packet::LsRequest(pkt) => &pkt.hdr,
            Packet::LsUpdate(pkt) => &pkt.hdr,
            Packet::LsAck(pkt) => &pkt.hdr,
        }
    }

    pub fn hdr_mut(&mut self) -> &mut PacketHdr {
        match self {
            Packet::Hello(pkt) => &mut pkt.hdr,
            Packet::DbDesc(pkt) => &mut pkt.hdr,
            Packet::LsRequest(pkt) => &mut pkt.hdr,
            Packet::LsUpdate(pkt) => &mut pkt.hdr,
            Packet::LsAck(pkt) => &mut pkt.hdr,
        }
    }

    pub fn pkt_type(&self) -> PacketType {
        self.hdr().pkt_type
    }

    pub fn msg_id(&self) -> MsgId {
        self.hdr().msg_id
    }
}
