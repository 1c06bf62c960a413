//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Once;
use std::time::Duration;

use holo_mtospf::error::Error;
use holo_mtospf::instance::{Instance, InstanceCfg};
use holo_mtospf::node::Node;
use holo_mtospf::packet::lsa::{
    LinkStatus, LsaRouterLink, LsaRouterLinkType, MtMetric,
};
use holo_mtospf::packet::{MtId, Packet, RouterId};
use holo_mtospf::tasks::TimerId;
use tracing::info;

pub const HELLO_INTERVAL: u16 = 10;
pub const DEAD_INTERVAL: u32 = 40;

static INIT: Once = Once::new();

// Node implementation that records everything the engine asks for.
#[derive(Debug, Default)]
pub struct TestNode {
    pub router_id: RouterId,
    pub links: Vec<LsaRouterLink>,
    pub delays: BTreeMap<RouterId, Duration>,
    pub mt_count: u16,
    pub outbox: Vec<(RouterId, Packet)>,
    pub timers: BTreeMap<TimerId, Duration>,
    pub routes_changed: usize,
    pub interfaces_changed: usize,
}

// Set of routers exchanging packets instantly, in FIFO order.
pub struct TestNetwork {
    pub routers: BTreeMap<RouterId, Instance<TestNode>>,
    pub down_links: BTreeSet<(RouterId, RouterId)>,
    queue: VecDeque<(RouterId, RouterId, Packet)>,
}

// ===== impl TestNode =====

impl TestNode {
    pub fn new(router_id: RouterId, mt_count: u16) -> TestNode {
        TestNode {
            router_id,
            mt_count,
            ..Default::default()
        }
    }

    pub fn add_link(&mut self, peer: RouterId, metrics: &[(MtId, u32)]) {
        let mt_metrics = metrics
            .iter()
            .map(|(mt_id, metric)| MtMetric::new(*mt_id, *metric))
            .collect();
        self.links.push(LsaRouterLink::new(
            LinkStatus::Up,
            peer,
            peer,
            LsaRouterLinkType::PointToPoint,
            mt_metrics,
        ));
    }

    pub fn sent(&self, pkt_type: holo_mtospf::packet::PacketType) -> usize {
        self.outbox
            .iter()
            .filter(|(_, packet)| packet.pkt_type() == pkt_type)
            .count()
    }
}

impl Node for TestNode {
    fn node_id(&self) -> RouterId {
        self.router_id
    }

    fn send_message(&mut self, dst: RouterId, packet: Packet) -> bool {
        self.outbox.push((dst, packet));
        true
    }

    fn router_links(&self) -> Vec<LsaRouterLink> {
        self.links.clone()
    }

    fn peer_ids(&self) -> Vec<RouterId> {
        self.links.iter().map(|link| link.link_id).collect()
    }

    fn one_way_delays(&self) -> BTreeMap<RouterId, Duration> {
        self.delays.clone()
    }

    fn mt_count(&self) -> u16 {
        self.mt_count
    }

    fn hello_interval(&self) -> u16 {
        HELLO_INTERVAL
    }

    fn router_dead_interval(&self) -> u32 {
        DEAD_INTERVAL
    }

    fn routes_changed(&mut self) {
        self.routes_changed += 1;
    }

    fn interfaces_changed(&mut self) {
        self.interfaces_changed += 1;
    }

    fn timer_reschedule(&mut self, timer: TimerId, delay: Duration) {
        self.timers.insert(timer, delay);
    }

    fn timer_cancel(&mut self, timer: TimerId) {
        self.timers.remove(&timer);
    }
}

// ===== impl TestNetwork =====

impl TestNetwork {
    // Builds a network from a list of `(a, b, [(mt_id, metric)])` links.
    pub fn new(
        links: &[(RouterId, RouterId, &[(MtId, u32)])],
        mt_count: u16,
    ) -> TestNetwork {
        TestNetwork::with_config(links, mt_count, InstanceCfg::default())
    }

    pub fn with_config(
        links: &[(RouterId, RouterId, &[(MtId, u32)])],
        mt_count: u16,
        config: InstanceCfg,
    ) -> TestNetwork {
        setup();

        let mut nodes = BTreeMap::new();
        for (a, b, metrics) in links {
            nodes
                .entry(*a)
                .or_insert_with(|| TestNode::new(*a, mt_count))
                .add_link(*b, metrics);
            nodes
                .entry(*b)
                .or_insert_with(|| TestNode::new(*b, mt_count))
                .add_link(*a, metrics);
        }

        let routers = nodes
            .into_iter()
            .map(|(router_id, node)| {
                (router_id, Instance::new(node, config.clone()))
            })
            .collect();
        TestNetwork {
            routers,
            down_links: Default::default(),
            queue: Default::default(),
        }
    }

    pub fn router(&self, router_id: RouterId) -> &Instance<TestNode> {
        &self.routers[&router_id]
    }

    pub fn router_mut(
        &mut self,
        router_id: RouterId,
    ) -> &mut Instance<TestNode> {
        self.routers.get_mut(&router_id).unwrap()
    }

    // Sends one round of Hellos from every router and delivers everything.
    pub fn hello_round(&mut self) {
        for router in self.routers.values_mut() {
            router.send_hellos();
        }
        self.deliver_all();
    }

    pub fn hello_round_filtered<F>(&mut self, filter: F)
    where
        F: FnMut(RouterId, RouterId, &Packet) -> bool,
    {
        for router in self.routers.values_mut() {
            router.send_hellos();
        }
        self.deliver_filtered(filter);
    }

    // Runs Hello rounds until every adjacency had the chance to form.
    pub fn converge(&mut self) {
        for _ in 0..3 {
            self.hello_round();
        }
    }

    pub fn deliver_all(&mut self) -> usize {
        self.deliver_filtered(|_, _, _| true)
    }

    // Delivers queued packets until the network is quiet. Packets rejected by
    // `filter` are dropped.
    pub fn deliver_filtered<F>(&mut self, mut filter: F) -> usize
    where
        F: FnMut(RouterId, RouterId, &Packet) -> bool,
    {
        let mut delivered = 0;
        self.collect_outboxes();
        while let Some((src, dst, packet)) = self.queue.pop_front() {
            assert!(delivered < 100_000, "network didn't quiesce");
            if self.is_link_down(src, dst) || !filter(src, dst, &packet) {
                continue;
            }
            if let Some(router) = self.routers.get_mut(&dst) {
                let _ = router.receive_message(src, packet);
                delivered += 1;
            }
            self.collect_outboxes();
        }
        delivered
    }

    // Fires a pending timer and delivers the resulting packets.
    pub fn fire(
        &mut self,
        router_id: RouterId,
        timer: TimerId,
    ) -> Option<Result<bool, Error>> {
        let router = self.routers.get_mut(&router_id)?;
        router.node_mut().timers.remove(&timer)?;
        let result = router.timer_expired(timer);
        self.deliver_all();
        Some(result)
    }

    // Changes the status of a link on both ends, as the hosts would.
    pub fn set_link_status(
        &mut self,
        a: RouterId,
        b: RouterId,
        status: LinkStatus,
    ) {
        match status {
            LinkStatus::Up => {
                self.down_links.remove(&link_key(a, b));
            }
            LinkStatus::Down => {
                self.down_links.insert(link_key(a, b));
            }
        }
        for (local, remote) in [(a, b), (b, a)] {
            let router = self.router_mut(local);
            for link in &mut router.node_mut().links {
                if link.link_id == remote {
                    link.status = status;
                }
            }
            router.link_state_changed();
        }
        self.deliver_all();
    }

    // Changes the metric of a link on one end.
    pub fn set_link_cost(
        &mut self,
        local: RouterId,
        remote: RouterId,
        mt_id: MtId,
        metric: u32,
    ) -> bool {
        let router = self.router_mut(local);
        for link in &mut router.node_mut().links {
            if link.link_id == remote {
                for mt_metric in &mut link.mt_metrics {
                    if mt_metric.mt_id == mt_id {
                        mt_metric.metric = metric;
                    }
                }
            }
        }
        router.link_state_changed()
    }

    pub fn is_link_down(&self, a: RouterId, b: RouterId) -> bool {
        self.down_links.contains(&link_key(a, b))
    }

    fn collect_outboxes(&mut self) {
        for (router_id, router) in self.routers.iter_mut() {
            for (dst, packet) in router.node_mut().outbox.drain(..) {
                self.queue.push_back((*router_id, dst, packet));
            }
        }
    }
}

// ===== global functions =====

fn link_key(a: RouterId, b: RouterId) -> (RouterId, RouterId) {
    (std::cmp::min(a, b), std::cmp::max(a, b))
}

// Initializes tracing subscriber.
fn init_tracing() {
    tracing_subscriber::fmt::Subscriber::builder()
        .with_target(false)
        .with_ansi(false)
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("starting");
}

// Common initialization required by all tests.
pub fn setup() {
    INIT.call_once(|| {
        init_tracing();
    });
}
