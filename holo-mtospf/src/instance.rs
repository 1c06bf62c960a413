//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug_span;

use crate::collections::{Lsdb, NeighborIndex, Neighbors};
use crate::debug::Debug;
use crate::error::Error;
use crate::lsdb::LSA_INIT_SEQ_NO;
use crate::message::MessageStore;
use crate::neighbor::{Neighbor, nsm};
use crate::node::Node;
use crate::packet::{MtId, Packet, RouterId};
use crate::spf::{EqualPaths, PathTable};
use crate::tasks::{
    AgingManager, InactivityManager, RetransmissionManager, TimerId,
};
use crate::{events, flood, lsdb, neighbor, output, spf};

pub struct Instance<N: Node> {
    // Instance Router ID.
    pub(crate) router_id: RouterId,
    // Instance configuration data.
    pub(crate) config: InstanceCfg,
    // Host services.
    pub(crate) node: N,
    // Instance state data.
    pub(crate) state: InstanceState,
}

#[derive(Debug)]
pub struct InstanceState {
    // Link-state database.
    pub lsdb: Lsdb,
    // Messages sent by this router.
    pub msg_store: MessageStore,
    // Neighbors, discovered or listed by the host.
    pub neighbors: Neighbors,
    // Neighbors heard in Hellos.
    pub neighbor_list: BTreeSet<RouterId>,
    // Neighbors with two-way connectivity (flooding scope).
    pub adjacencies: BTreeSet<RouterId>,
    // Timer managers.
    pub rxmt: RetransmissionManager,
    pub inactivity: InactivityManager,
    pub aging: AgingManager,
    // Shortest paths computed by the last SPF run.
    pub paths: PathTable,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstanceCfg {
    // Number of routers in the network, used to size the message store.
    pub node_count: Option<usize>,
    // Retransmission interval (milliseconds) used when no delay estimate is
    // available.
    pub rxmt_interval: u64,
    // Retransmission timeout, as a multiple of the link's one-way delay.
    pub rxmt_timeout_factor: u32,
    // Aging interval (seconds).
    pub aging_interval: u16,
    pub area_id: u32,
}

// ===== impl Instance =====

impl<N> Instance<N>
where
    N: Node,
{
    // Creates a routing instance and originates its initial router-LSA.
    pub fn new(node: N, config: InstanceCfg) -> Instance<N> {
        let router_id = node.node_id();
        let span = debug_span!("router", id = %router_id);
        let _span_guard = span.enter();

        Debug::InstanceCreate.log();

        let state = InstanceState {
            lsdb: Default::default(),
            msg_store: MessageStore::new(config.node_count),
            neighbors: Default::default(),
            neighbor_list: Default::default(),
            adjacencies: Default::default(),
            rxmt: RetransmissionManager::new(
                Duration::from_millis(config.rxmt_interval),
                config.rxmt_timeout_factor,
            ),
            inactivity: InactivityManager::new(),
            aging: AgingManager::new(Duration::from_secs(
                config.aging_interval.into(),
            )),
            paths: Default::default(),
        };
        let mut instance = Instance {
            router_id,
            config,
            node,
            state,
        };

        // Discover the neighbors listed by the host.
        instance.update_peers();

        // Originate the initial router-LSA.
        let links = instance.node.router_links();
        lsdb::originate_router_lsa(&mut instance, links, LSA_INIT_SEQ_NO);
        instance.state.aging.start(&mut instance.node, router_id);
        instance.compute_routes();

        instance
    }

    // Sends a Hello to every directly connected peer.
    //
    // Returns false when there are no peers to send Hellos to.
    pub fn send_hellos(&mut self) -> bool {
        let span = debug_span!("router", id = %self.router_id);
        let _span_guard = span.enter();

        let peers = self.node.peer_ids();
        if peers.is_empty() {
            return false;
        }

        let packet = output::hello(self);
        for peer in peers {
            let nbr_idx = self.neighbor_get_or_create(peer);
            if self.state.neighbors[nbr_idx].state == nsm::State::Down {
                neighbor::fsm(self, nbr_idx, nsm::Event::Start);
            }
            output::send_hello(self, peer, packet.clone());
        }

        true
    }

    // Reconciles the local router-LSA with the links reported by the host.
    //
    // Returns whether the router-LSA changed.
    pub fn link_state_changed(&mut self) -> bool {
        let span = debug_span!("router", id = %self.router_id);
        let _span_guard = span.enter();

        self.update_rxmt_timeouts();

        let links = self.node.router_links();
        if !self.state.lsdb.update(self.router_id, &links) {
            return false;
        }
        let Some(lse) = self.state.lsdb.router_lsa(self.router_id) else {
            Error::SelfLsaMissing(self.router_id).log();
            return false;
        };
        let lsa = lse.data.clone();
        Debug::LsaOriginate(&lsa.hdr).log();

        self.compute_routes();
        flood::flood(self, None, &lsa);
        true
    }

    // Refreshes the set of directly connected peers.
    pub fn interface_changed(&mut self) {
        let span = debug_span!("router", id = %self.router_id);
        let _span_guard = span.enter();

        self.update_peers();
    }

    // Processes a packet received from the given peer.
    //
    // Returns whether the routes were recomputed.
    pub fn receive_message(
        &mut self,
        src: RouterId,
        packet: Packet,
    ) -> Result<bool, Error> {
        let span = debug_span!("router", id = %self.router_id);
        let _span_guard = span.enter();

        Debug::PacketRx(src, &packet).log();

        match packet {
            Packet::Hello(pkt) => events::process_packet_hello(self, src, pkt),
            Packet::DbDesc(pkt) => {
                events::process_packet_dbdesc(self, src, pkt)
            }
            Packet::LsRequest(pkt) => {
                events::process_packet_lsreq(self, src, pkt)
            }
            Packet::LsUpdate(pkt) => {
                events::process_packet_lsupd(self, src, pkt)
            }
            Packet::LsAck(pkt) => events::process_packet_lsack(self, src, pkt),
        }
    }

    // Processes the expiration of an engine timer.
    //
    // Returns whether the routes were recomputed.
    pub fn timer_expired(&mut self, timer: TimerId) -> Result<bool, Error> {
        let span = debug_span!("router", id = %self.router_id);
        let _span_guard = span.enter();

        match timer {
            TimerId::Rxmt(peer) => events::process_rxmt_timer(self, peer),
            TimerId::RxmtUpdate(peer) => {
                events::process_rxmt_update_timer(self, peer)
            }
            TimerId::Inactivity(peer) => {
                events::process_inactivity_timer(self, peer)
            }
            TimerId::Aging(adv_rtr) => {
                events::process_aging_timer(self, adv_rtr)
            }
        }
    }

    // Looks up the shortest paths towards `dest` in the given topology.
    pub fn lookup_path(
        &self,
        dest: RouterId,
        mt_id: MtId,
    ) -> Option<&EqualPaths> {
        self.state.paths.get(&dest)?.get(&mt_id)
    }

    // Recomputes the path table from the current LSDB contents.
    pub fn compute_routes(&mut self) {
        let mt_count = self.node.mt_count();
        self.state.paths =
            spf::compute(self.router_id, &self.state.lsdb, mt_count);
        Debug::SpfRun(self.state.paths.len()).log();
        self.node.routes_changed();
    }

    pub fn router_id(&self) -> RouterId {
        self.router_id
    }

    pub fn config(&self) -> &InstanceCfg {
        &self.config
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut N {
        &mut self.node
    }

    pub fn lsdb(&self) -> &Lsdb {
        &self.state.lsdb
    }

    pub fn msg_store(&self) -> &MessageStore {
        &self.state.msg_store
    }

    pub fn paths(&self) -> &PathTable {
        &self.state.paths
    }

    pub fn neighbors(&self) -> &Neighbors {
        &self.state.neighbors
    }

    pub fn neighbor(&self, router_id: RouterId) -> Option<&Neighbor> {
        self.state
            .neighbors
            .get_by_router_id(router_id)
            .ok()
            .map(|(_, nbr)| nbr)
    }

    pub fn neighbor_list(&self) -> &BTreeSet<RouterId> {
        &self.state.neighbor_list
    }

    pub fn adjacencies(&self) -> &BTreeSet<RouterId> {
        &self.state.adjacencies
    }

    pub fn rxmt(&self) -> &RetransmissionManager {
        &self.state.rxmt
    }

    pub fn inactivity(&self) -> &InactivityManager {
        &self.state.inactivity
    }

    pub fn aging(&self) -> &AgingManager {
        &self.state.aging
    }

    // Creates neighbors for the peers listed by the host.
    fn update_peers(&mut self) {
        for peer in self.node.peer_ids() {
            self.neighbor_get_or_create(peer);
        }
        self.update_rxmt_timeouts();
    }

    fn update_rxmt_timeouts(&mut self) {
        let delays = self.node.one_way_delays();
        for peer in self.node.peer_ids() {
            let delay = delays.get(&peer).copied();
            self.state.rxmt.set_timeout(peer, delay);
        }
    }

    // Returns the neighbor with the given Router ID, creating it if necessary.
    pub(crate) fn neighbor_get_or_create(
        &mut self,
        router_id: RouterId,
    ) -> NeighborIndex {
        match self.state.neighbors.get_by_router_id(router_id) {
            Ok((nbr_idx, _)) => nbr_idx,
            Err(_) => {
                let delays = self.node.one_way_delays();
                let delay = delays.get(&router_id).copied();
                self.state.rxmt.set_timeout(router_id, delay);
                let (nbr_idx, _) = self.state.neighbors.insert(router_id);
                nbr_idx
            }
        }
    }
}

impl<N> std::fmt::Debug for Instance<N>
where
    N: Node,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("router_id", &self.router_id)
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

// ===== impl InstanceCfg =====

impl Default for InstanceCfg {
    fn default() -> InstanceCfg {
        InstanceCfg {
            node_count: None,
            rxmt_interval: 2,
            rxmt_timeout_factor: 3,
            aging_interval: 1,
            area_id: 0,
        }
    }
}
