//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, VecDeque};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::packet::{MsgId, Packet, PacketType, RouterId};

// Message IDs wrap back to 1 after this value.
pub const MSG_ID_MAX: MsgId = 2147483646;
// Per-type capacity used when the network size is unknown.
pub const MSG_STORE_DFLT_CAPACITY: usize = 300;
// Per-type capacity for each router in the network.
pub const MSG_STORE_CAPACITY_PER_NODE: usize = 4;

// Sent protocol message.
#[derive(Clone, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct Message {
    pub id: MsgId,
    // For LS Updates, the originator of the flooded LSA. The local router for
    // everything else.
    pub origin: RouterId,
    pub packet: Packet,
}

// Store of the messages sent by one router.
//
// Messages are kept until consumed or acknowledged so they can be
// retransmitted. Each message type has its own ID space and capacity; when a
// table is full its oldest message is evicted.
#[derive(Debug)]
pub struct MessageStore {
    capacity: usize,
    tables: BTreeMap<PacketType, MessageTable>,
}

#[derive(Debug)]
struct MessageTable {
    next_id: MsgId,
    messages: BTreeMap<MsgId, Message>,
    // Message IDs in insertion order.
    order: VecDeque<MsgId>,
}

// ===== impl MessageStore =====

impl MessageStore {
    pub fn new(node_count: Option<usize>) -> Self {
        let capacity = match node_count {
            Some(node_count) => {
                std::cmp::max(node_count * MSG_STORE_CAPACITY_PER_NODE, 1)
            }
            None => MSG_STORE_DFLT_CAPACITY,
        };
        MessageStore {
            capacity,
            tables: Default::default(),
        }
    }

    // Stores a message and assigns it a new ID, which is also written into the
    // packet header.
    pub fn insert(&mut self, origin: RouterId, mut packet: Packet) -> MsgId {
        let table = self
            .tables
            .entry(packet.pkt_type())
            .or_insert_with(MessageTable::new);

        let msg_id = table.next_id();
        packet.hdr_mut().msg_id = msg_id;

        // A wrapped ID may still be in use by a very old message.
        table.remove(msg_id);
        while table.messages.len() >= self.capacity {
            if !table.evict_oldest() {
                break;
            }
        }

        table.messages.insert(msg_id, Message::new(msg_id, origin, packet));
        table.order.push_back(msg_id);
        msg_id
    }

    pub fn get(&self, pkt_type: PacketType, msg_id: MsgId) -> Option<&Message> {
        self.tables
            .get(&pkt_type)
            .and_then(|table| table.messages.get(&msg_id))
    }

    pub fn remove(
        &mut self,
        pkt_type: PacketType,
        msg_id: MsgId,
    ) -> Option<Message> {
        self.tables
            .get_mut(&pkt_type)
            .and_then(|table| table.remove(msg_id))
    }

    // Returns the number of stored messages of the given type.
    pub fn len(&self, pkt_type: PacketType) -> usize {
        self.tables
            .get(&pkt_type)
            .map(|table| table.messages.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|table| table.messages.is_empty())
    }

    // Returns the per-type capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // Overrides the next ID of the given message type.
    #[cfg(feature = "testing")]
    pub fn set_next_id(&mut self, pkt_type: PacketType, msg_id: MsgId) {
        self.tables
            .entry(pkt_type)
            .or_insert_with(MessageTable::new)
            .next_id = msg_id;
    }
}

impl Default for MessageStore {
    fn default() -> MessageStore {
        MessageStore::new(None)
    }
}

// ===== impl MessageTable =====

impl MessageTable {
    fn new() -> Self {
        MessageTable {
            next_id: 1,
            messages: Default::default(),
            order: Default::default(),
        }
    }

    fn next_id(&mut self) -> MsgId {
        let msg_id = self.next_id;
        self.next_id = if msg_id >= MSG_ID_MAX { 1 } else { msg_id + 1 };
        msg_id
    }

    fn remove(&mut self, msg_id: MsgId) -> Option<Message> {
        let msg = self.messages.remove(&msg_id)?;
        self.order.retain(|id| *id != msg_id);
        Some(msg)
    }

    fn evict_oldest(&mut self) -> bool {
        match self.order.pop_front() {
            Some(msg_id) => {
                self.messages.remove(&msg_id);
                true
            }
            None => false,
        }
    }
}
