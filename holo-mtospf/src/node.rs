//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::time::Duration;

use crate::packet::lsa::LsaRouterLink;
use crate::packet::{Packet, RouterId};
use crate::tasks::TimerId;

// Services the routing engine needs from the node hosting it.
//
// The host owns the transport, the scheduler and the interface configuration
// of the router. All calls are made synchronously from within an engine entry
// point.
pub trait Node {
    // Local Router ID.
    fn node_id(&self) -> RouterId;

    // Transmits a packet to a directly connected peer.
    //
    // Returns false when the packet couldn't be handed to the transport.
    fn send_message(&mut self, dst: RouterId, packet: Packet) -> bool;

    // Current router links, including per-topology metrics.
    fn router_links(&self) -> Vec<LsaRouterLink>;

    // Directly connected peers.
    fn peer_ids(&self) -> Vec<RouterId>;

    // One-way delay estimates towards the directly connected peers.
    fn one_way_delays(&self) -> BTreeMap<RouterId, Duration>;

    // Number of topologies in addition to the default one (MT-ID 0).
    fn mt_count(&self) -> u16;

    // Hello interval, in seconds.
    fn hello_interval(&self) -> u16;

    // Router dead interval, in seconds.
    fn router_dead_interval(&self) -> u32;

    // Signals that the path table was recomputed.
    fn routes_changed(&mut self) {}

    // Signals that the status of a local link changed.
    fn interfaces_changed(&mut self) {}

    // Schedules the timer to fire after `delay`, replacing any pending fire
    // time.
    fn timer_reschedule(&mut self, timer: TimerId, delay: Duration);

    // Cancels the timer. An expiration that was already queued but not yet
    // delivered must be discarded by the host.
    fn timer_cancel(&mut self, timer: TimerId);
}
