//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::message::MessageStore;
use crate::node::Node;
use crate::packet::{MsgId, PacketType, RouterId};

//
// Engine timers diagram:
//
//                          +--------------+
//       Rxmt(peer) (Nx) -> |              |
// RxmtUpdate(peer) (Nx) -> |              | -> (1x) send_message
// Inactivity(peer) (Nx) -> |   instance   |
//   Aging(origin)  (Nx) -> |              | -> (1x) timer_reschedule
//                          |              |         timer_cancel
//                          +--------------+
//
// The engine doesn't own any timer. Every timer lives in the host's scheduler
// and is identified by a `TimerId`; expirations are fed back through
// `Instance::timer_expired`.
//

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum TimerId {
    // Retransmission of the outstanding DD or LS Request.
    Rxmt(RouterId),
    // Retransmission of the outstanding LS Updates.
    RxmtUpdate(RouterId),
    // Neighbor dead interval.
    Inactivity(RouterId),
    // Aging of the LSAs originated by the given router.
    Aging(RouterId),
}

// Message registered for retransmission.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RxmtMessage {
    DbDesc { msg_id: MsgId, dd_seq_no: u32 },
    LsRequest(MsgId),
    LsUpdate { origin: RouterId, msg_id: MsgId },
}

// Received message that may retire outstanding retransmissions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RxmtAck {
    // DD carrying the given sequence number.
    DbDesc(u32),
    // LS Update answering our LS Request.
    LsUpdate,
    // LS Ack that emptied the retransmission list.
    LsAck,
}

// Outstanding retransmissions towards one peer.
#[derive(Clone, Debug, Default)]
pub struct RxmtEntry {
    pub dd: Option<(MsgId, u32)>,
    pub request: Option<MsgId>,
    pub updates: BTreeMap<RouterId, MsgId>,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct RetransmissionManager {
    peers: BTreeMap<RouterId, RxmtEntry>,
    interval: Duration,
    timeout_factor: u32,
}

#[derive(Debug)]
pub struct InactivityManager {
    active: BTreeSet<RouterId>,
}

#[derive(Debug)]
pub struct AgingManager {
    active: BTreeSet<RouterId>,
    interval: Duration,
}

// ===== impl RetransmissionManager =====

impl RetransmissionManager {
    pub(crate) fn new(interval: Duration, timeout_factor: u32) -> Self {
        RetransmissionManager {
            peers: Default::default(),
            interval,
            timeout_factor,
        }
    }

    // Updates the retransmission timeout of the given peer.
    //
    // Without a delay estimate the default retransmission interval is used.
    pub(crate) fn set_timeout(
        &mut self,
        peer: RouterId,
        delay: Option<Duration>,
    ) {
        let timeout = match delay {
            Some(delay) if !delay.is_zero() => delay * self.timeout_factor,
            _ => self.interval,
        };
        self.entry(peer).timeout = timeout;
    }

    pub fn get(&self, peer: RouterId) -> Option<&RxmtEntry> {
        self.peers.get(&peer)
    }

    pub fn timeout(&self, peer: RouterId) -> Duration {
        self.peers
            .get(&peer)
            .map(|entry| entry.timeout)
            .unwrap_or(self.interval)
    }

    // Registers a sent message for retransmission.
    pub(crate) fn message_out<N>(
        &mut self,
        node: &mut N,
        peer: RouterId,
        msg: RxmtMessage,
    ) where
        N: Node,
    {
        let entry = self.entry(peer);
        let timeout = entry.timeout;
        match msg {
            RxmtMessage::DbDesc { msg_id, dd_seq_no } => {
                entry.dd = Some((msg_id, dd_seq_no));
                node.timer_reschedule(TimerId::Rxmt(peer), timeout);
            }
            RxmtMessage::LsRequest(msg_id) => {
                entry.request = Some(msg_id);
                node.timer_reschedule(TimerId::Rxmt(peer), timeout);
            }
            RxmtMessage::LsUpdate { origin, msg_id } => {
                entry.updates.insert(origin, msg_id);
                node.timer_reschedule(TimerId::RxmtUpdate(peer), timeout);
            }
        }
    }

    // Retires outstanding retransmissions answered by a received message.
    pub(crate) fn message_in<N>(
        &mut self,
        node: &mut N,
        msg_store: &mut MessageStore,
        peer: RouterId,
        msg: RxmtAck,
    ) where
        N: Node,
    {
        let Some(entry) = self.peers.get_mut(&peer) else {
            return;
        };
        match msg {
            RxmtAck::DbDesc(dd_seq_no) => {
                if entry.dd.is_some_and(|(_, seq_no)| seq_no == dd_seq_no) {
                    entry.dd = None;
                }
            }
            RxmtAck::LsUpdate => {
                entry.request = None;
            }
            RxmtAck::LsAck => {
                for msg_id in std::mem::take(&mut entry.updates).into_values() {
                    msg_store.remove(PacketType::LsUpdate, msg_id);
                }
                node.timer_cancel(TimerId::RxmtUpdate(peer));
                return;
            }
        }
        if entry.dd.is_none() && entry.request.is_none() {
            node.timer_cancel(TimerId::Rxmt(peer));
        }
    }

    // Stops retransmitting the outstanding DD, regardless of its sequence
    // number.
    pub(crate) fn dbdesc_retire<N>(&mut self, node: &mut N, peer: RouterId)
    where
        N: Node,
    {
        let Some(entry) = self.peers.get_mut(&peer) else {
            return;
        };
        entry.dd = None;
        if entry.request.is_none() {
            node.timer_cancel(TimerId::Rxmt(peer));
        }
    }

    // Stops retransmitting the LS Update registered under `origin`.
    pub(crate) fn update_retire(&mut self, peer: RouterId, origin: RouterId) {
        if let Some(entry) = self.peers.get_mut(&peer) {
            entry.updates.remove(&origin);
        }
    }

    // Drops every outstanding retransmission towards the given peer.
    pub(crate) fn cancel<N>(&mut self, node: &mut N, peer: RouterId)
    where
        N: Node,
    {
        if let Some(entry) = self.peers.get_mut(&peer) {
            entry.dd = None;
            entry.request = None;
            entry.updates.clear();
        }
        node.timer_cancel(TimerId::Rxmt(peer));
        node.timer_cancel(TimerId::RxmtUpdate(peer));
    }

    fn entry(&mut self, peer: RouterId) -> &mut RxmtEntry {
        let interval = self.interval;
        self.peers.entry(peer).or_insert_with(|| RxmtEntry {
            timeout: interval,
            ..Default::default()
        })
    }
}

// ===== impl InactivityManager =====

impl InactivityManager {
    pub(crate) fn new() -> Self {
        InactivityManager {
            active: Default::default(),
        }
    }

    // Starts or refreshes the dead interval of the given peer.
    pub(crate) fn start<N>(&mut self, node: &mut N, peer: RouterId)
    where
        N: Node,
    {
        let timeout = Duration::from_secs(node.router_dead_interval().into());
        node.timer_reschedule(TimerId::Inactivity(peer), timeout);
        self.active.insert(peer);
    }

    pub(crate) fn cancel<N>(&mut self, node: &mut N, peer: RouterId)
    where
        N: Node,
    {
        self.active.remove(&peer);
        node.timer_cancel(TimerId::Inactivity(peer));
    }

    // Consumes an expiration, returning whether the timer was running.
    pub(crate) fn expired(&mut self, peer: RouterId) -> bool {
        self.active.remove(&peer)
    }

    pub fn is_active(&self, peer: RouterId) -> bool {
        self.active.contains(&peer)
    }
}

// ===== impl AgingManager =====

impl AgingManager {
    pub(crate) fn new(interval: Duration) -> Self {
        AgingManager {
            active: Default::default(),
            interval,
        }
    }

    // Starts aging the given originator's LSAs, unless already running.
    pub(crate) fn start<N>(&mut self, node: &mut N, adv_rtr: RouterId)
    where
        N: Node,
    {
        if self.active.insert(adv_rtr) {
            node.timer_reschedule(TimerId::Aging(adv_rtr), self.interval);
        }
    }

    // Consumes an expiration, returning whether the timer was running.
    pub(crate) fn expired(&mut self, adv_rtr: RouterId) -> bool {
        self.active.remove(&adv_rtr)
    }

    pub fn is_active(&self, adv_rtr: RouterId) -> bool {
        self.active.contains(&adv_rtr)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
