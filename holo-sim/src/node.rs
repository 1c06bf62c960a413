//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::time::Duration;

use derive_new::new;
use holo_mtospf::node::Node;
use holo_mtospf::packet::lsa::{
    LinkStatus, LsaRouterLink, LsaRouterLinkType, MtMetric,
};
use holo_mtospf::packet::{MtId, Packet, RouterId};
use holo_mtospf::tasks::TimerId;

// Simulated router hosting one routing engine instance.
//
// Everything the engine asks for is queued and later applied by the
// simulator, once the engine call returns.
#[derive(Debug)]
pub struct SimNode {
    pub router_id: RouterId,
    pub links: BTreeMap<RouterId, SimLink>,
    pub mt_count: u16,
    pub hello_interval: u16,
    pub dead_interval: u32,
    pub outbox: Vec<(RouterId, Packet)>,
    pub timer_ops: Vec<TimerOp>,
    pub routes_changed: bool,
    pub interfaces_changed: bool,
}

// Local end of a simulated link.
#[derive(Clone, Debug, new)]
pub struct SimLink {
    pub status: LinkStatus,
    pub delay: Duration,
    // Metric of each topology, indexed by MT-ID.
    pub costs: Vec<u32>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimerOp {
    Reschedule(TimerId, Duration),
    Cancel(TimerId),
}

// ===== impl SimNode =====

impl SimNode {
    pub fn new(
        router_id: RouterId,
        mt_count: u16,
        hello_interval: u16,
        dead_interval: u32,
    ) -> SimNode {
        SimNode {
            router_id,
            links: Default::default(),
            mt_count,
            hello_interval,
            dead_interval,
            outbox: Default::default(),
            timer_ops: Default::default(),
            routes_changed: false,
            interfaces_changed: false,
        }
    }

    // Updates the metric of the given topology, returning whether it
    // changed.
    pub fn set_cost(
        &mut self,
        peer: RouterId,
        mt_id: MtId,
        metric: u32,
    ) -> bool {
        let Some(link) = self.links.get_mut(&peer) else {
            return false;
        };
        let mt_id = usize::from(mt_id);
        if link.costs.len() <= mt_id {
            link.costs.resize(mt_id + 1, metric);
            return true;
        }
        if link.costs[mt_id] == metric {
            return false;
        }
        link.costs[mt_id] = metric;
        true
    }
}

impl Node for SimNode {
    fn node_id(&self) -> RouterId {
        self.router_id
    }

    fn send_message(&mut self, dst: RouterId, packet: Packet) -> bool {
        if !self.links.contains_key(&dst) {
            return false;
        }
        self.outbox.push((dst, packet));
        true
    }

    fn router_links(&self) -> Vec<LsaRouterLink> {
        self.links
            .iter()
            .map(|(peer, link)| {
                let mt_metrics = link
                    .costs
                    .iter()
                    .enumerate()
                    .filter(|(mt_id, _)| *mt_id <= usize::from(self.mt_count))
                    .map(|(mt_id, metric)| {
                        MtMetric::new(mt_id as MtId, *metric)
                    })
                    .collect();
                LsaRouterLink::new(
                    link.status,
                    *peer,
                    *peer,
                    LsaRouterLinkType::PointToPoint,
                    mt_metrics,
                )
            })
            .collect()
    }

    fn peer_ids(&self) -> Vec<RouterId> {
        self.links.keys().copied().collect()
    }

    fn one_way_delays(&self) -> BTreeMap<RouterId, Duration> {
        self.links
            .iter()
            .map(|(peer, link)| (*peer, link.delay))
            .collect()
    }

    fn mt_count(&self) -> u16 {
        self.mt_count
    }

    fn hello_interval(&self) -> u16 {
        self.hello_interval
    }

    fn router_dead_interval(&self) -> u32 {
        self.dead_interval
    }

    fn routes_changed(&mut self) {
        self.routes_changed = true;
    }

    fn interfaces_changed(&mut self) {
        self.interfaces_changed = true;
    }

    fn timer_reschedule(&mut self, timer: TimerId, delay: Duration) {
        self.timer_ops.push(TimerOp::Reschedule(timer, delay));
    }

    fn timer_cancel(&mut self, timer: TimerId) {
        self.timer_ops.push(TimerOp::Cancel(timer));
    }
}
