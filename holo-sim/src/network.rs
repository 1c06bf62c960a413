//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::time::Duration;

use holo_mtospf::instance::{Instance, InstanceCfg};
use holo_mtospf::packet::lsa::LinkStatus;
use holo_mtospf::packet::{MtId, Packet, PacketType, RouterId};
use holo_mtospf::spf::PathTable;
use holo_mtospf::tasks::TimerId;
use itertools::Itertools;
use num_traits::FromPrimitive;
use serde::Serialize;
use tracing::{debug, debug_span, info};

use crate::config::{Action, Config};
use crate::error::Error;
use crate::node::{SimLink, SimNode, TimerOp};

// Discrete-event network simulator.
//
// Routers only interact through the simulator's event queue, which is
// ordered by simulated time and then by insertion order.
#[derive(Debug)]
pub struct Simulator {
    now: Duration,
    hello_interval: Duration,
    routers: BTreeMap<RouterId, Instance<SimNode>>,
    queue: BinaryHeap<Event>,
    next_seq: u64,
    // Generation of the pending expiration of every running timer.
    timers: BTreeMap<(RouterId, TimerId), u64>,
    next_generation: u64,
    drop_rules: Vec<DropRule>,
    stats: Stats,
}

#[derive(Debug)]
struct Event {
    at: Duration,
    seq: u64,
    kind: EventKind,
}

#[derive(Debug)]
enum EventKind {
    HelloTick(RouterId),
    Deliver {
        src: RouterId,
        dst: RouterId,
        packet: Packet,
    },
    Timer {
        router_id: RouterId,
        timer: TimerId,
        generation: u64,
    },
    Action(Action),
}

#[derive(Debug)]
struct DropRule {
    src: RouterId,
    dst: RouterId,
    pkt_type: Option<PacketType>,
    remaining: usize,
}

// Simulation counters.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Stats {
    pub packets_sent: BTreeMap<PacketType, u64>,
    pub packets_delivered: u64,
    pub packets_dropped: u64,
    pub timers_fired: u64,
    pub route_computations: u64,
    pub errors: u64,
}

// ===== impl Simulator =====

impl Simulator {
    // Builds the simulated network described by the configuration.
    pub fn new(config: &Config) -> Result<Simulator, Error> {
        let sim_cfg = &config.simulation;

        if let Some(router_id) =
            config.routers.iter().map(|router| router.id).duplicates().next()
        {
            return Err(Error::DuplicateRouter(router_id));
        }

        let mut nodes = config
            .routers
            .iter()
            .map(|router| {
                let node = SimNode::new(
                    router.id,
                    sim_cfg.mt_count,
                    sim_cfg.hello_interval,
                    sim_cfg.dead_interval,
                );
                (router.id, node)
            })
            .collect::<BTreeMap<_, _>>();

        for link in &config.links {
            if link.a == link.b {
                return Err(Error::InvalidLink(link.a, link.b));
            }
            for router_id in [link.a, link.b] {
                if !nodes.contains_key(&router_id) {
                    return Err(Error::UnknownRouter(router_id));
                }
            }
            for (local, remote) in [(link.a, link.b), (link.b, link.a)] {
                let sim_link = SimLink::new(
                    link.status,
                    Duration::from_millis(link.delay_ms),
                    link.costs.clone(),
                );
                let node = nodes
                    .get_mut(&local)
                    .ok_or(Error::UnknownRouter(local))?;
                if node.links.insert(remote, sim_link).is_some() {
                    return Err(Error::DuplicateLink(link.a, link.b));
                }
            }
        }

        // Size the message stores after the network unless told otherwise.
        let engine_cfg = InstanceCfg {
            node_count: config.engine.node_count.or(Some(nodes.len())),
            ..config.engine.clone()
        };

        let mut sim = Simulator {
            now: Duration::ZERO,
            hello_interval: Duration::from_secs(
                sim_cfg.hello_interval.max(1).into(),
            ),
            routers: Default::default(),
            queue: Default::default(),
            next_seq: 0,
            timers: Default::default(),
            next_generation: 0,
            drop_rules: Default::default(),
            stats: Default::default(),
        };

        for (router_id, node) in nodes {
            let instance = Instance::new(node, engine_cfg.clone());
            sim.routers.insert(router_id, instance);
            sim.process_node_output(router_id);
            sim.push(Duration::ZERO, EventKind::HelloTick(router_id));
        }

        for scheduled in &config.events {
            if let Action::DropPackets {
                pkt_type: Some(pkt_type),
                ..
            } = scheduled.action
                && PacketType::from_u8(pkt_type).is_none()
            {
                return Err(Error::InvalidPacketType(pkt_type));
            }
            sim.push(
                Duration::from_millis(scheduled.at_ms),
                EventKind::Action(scheduled.action.clone()),
            );
        }

        Ok(sim)
    }

    // Processes all events scheduled up to the given simulated time.
    pub fn run_until(&mut self, end: Duration) {
        while self.queue.peek().is_some_and(|event| event.at <= end) {
            self.step();
        }
        self.now = std::cmp::max(self.now, end);
    }

    // Processes the next scheduled event.
    //
    // Returns false when there are no events left.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.queue.pop() else {
            return false;
        };
        self.now = event.at;

        match event.kind {
            EventKind::HelloTick(router_id) => {
                self.process_hello_tick(router_id);
            }
            EventKind::Deliver { src, dst, packet } => {
                self.process_delivery(src, dst, packet);
            }
            EventKind::Timer {
                router_id,
                timer,
                generation,
            } => {
                self.process_timer(router_id, timer, generation);
            }
            EventKind::Action(action) => {
                if let Err(error) = self.apply_action(&action) {
                    error.log();
                    self.stats.errors += 1;
                }
            }
        }

        true
    }

    // Applies a topology change or fault injection.
    pub fn apply_action(&mut self, action: &Action) -> Result<(), Error> {
        info!(now = ?self.now, ?action, "applying action");

        match *action {
            Action::LinkDown { a, b } => {
                self.set_link_status(a, b, LinkStatus::Down)
            }
            Action::LinkUp { a, b } => {
                self.set_link_status(a, b, LinkStatus::Up)
            }
            Action::CostChange {
                a,
                b,
                mt_id,
                metric,
            } => self.set_link_cost(a, b, mt_id, metric),
            Action::DropPackets {
                src,
                dst,
                pkt_type,
                count,
            } => {
                let pkt_type = match pkt_type {
                    Some(pkt_type) => Some(
                        PacketType::from_u8(pkt_type)
                            .ok_or(Error::InvalidPacketType(pkt_type))?,
                    ),
                    None => None,
                };
                self.link(src, dst)?;
                if count > 0 {
                    self.drop_rules.push(DropRule {
                        src,
                        dst,
                        pkt_type,
                        remaining: count,
                    });
                }
                Ok(())
            }
        }
    }

    // Current simulated time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn router(&self, router_id: RouterId) -> Option<&Instance<SimNode>> {
        self.routers.get(&router_id)
    }

    pub fn routers(&self) -> impl Iterator<Item = &Instance<SimNode>> {
        self.routers.values()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    // Returns the path table of every router.
    pub fn path_tables(&self) -> BTreeMap<RouterId, &PathTable> {
        self.routers
            .iter()
            .map(|(router_id, router)| (*router_id, router.paths()))
            .collect()
    }

    fn process_hello_tick(&mut self, router_id: RouterId) {
        let Some(router) = self.routers.get_mut(&router_id) else {
            return;
        };
        if router.send_hellos() {
            self.process_node_output(router_id);
        }
        let at = self.now + self.hello_interval;
        self.push(at, EventKind::HelloTick(router_id));
    }

    fn process_delivery(
        &mut self,
        src: RouterId,
        dst: RouterId,
        packet: Packet,
    ) {
        // The link might have gone down while the packet was in flight.
        if !self.link_is_up(src, dst) {
            self.stats.packets_dropped += 1;
            return;
        }

        let Some(router) = self.routers.get_mut(&dst) else {
            return;
        };
        self.stats.packets_delivered += 1;
        if let Err(error) = router.receive_message(src, packet) {
            Error::Engine(dst, error).log();
            self.stats.errors += 1;
        }
        self.process_node_output(dst);
    }

    fn process_timer(
        &mut self,
        router_id: RouterId,
        timer: TimerId,
        generation: u64,
    ) {
        // Drop expirations of timers that were rescheduled or cancelled.
        match self.timers.get(&(router_id, timer)) {
            Some(current) if *current == generation => {
                self.timers.remove(&(router_id, timer));
            }
            _ => return,
        }

        let Some(router) = self.routers.get_mut(&router_id) else {
            return;
        };
        self.stats.timers_fired += 1;
        if let Err(error) = router.timer_expired(timer) {
            Error::Engine(router_id, error).log();
            self.stats.errors += 1;
        }
        self.process_node_output(router_id);
    }

    // Applies the sends and timer operations requested by a router's engine.
    fn process_node_output(&mut self, router_id: RouterId) {
        let Some(router) = self.routers.get_mut(&router_id) else {
            return;
        };
        let node = router.node_mut();
        let outbox = std::mem::take(&mut node.outbox);
        let timer_ops = std::mem::take(&mut node.timer_ops);
        if std::mem::take(&mut node.routes_changed) {
            self.stats.route_computations += 1;
        }
        node.interfaces_changed = false;

        for op in timer_ops {
            match op {
                TimerOp::Reschedule(timer, delay) => {
                    let generation = self.next_generation;
                    self.next_generation += 1;
                    self.timers.insert((router_id, timer), generation);
                    let at = self.now + delay;
                    self.push(
                        at,
                        EventKind::Timer {
                            router_id,
                            timer,
                            generation,
                        },
                    );
                }
                TimerOp::Cancel(timer) => {
                    self.timers.remove(&(router_id, timer));
                }
            }
        }

        for (dst, packet) in outbox {
            *self
                .stats
                .packets_sent
                .entry(packet.pkt_type())
                .or_default() += 1;

            let Ok(link) = self.link(router_id, dst) else {
                self.stats.packets_dropped += 1;
                continue;
            };
            let (delay, status) = (link.delay, link.status);
            if status == LinkStatus::Down
                || self.drop_matches(router_id, dst, &packet)
            {
                debug!(
                    src = %router_id,
                    %dst,
                    pkt_type = %packet.pkt_type(),
                    "dropping packet"
                );
                self.stats.packets_dropped += 1;
                continue;
            }
            let at = self.now + delay;
            self.push(
                at,
                EventKind::Deliver {
                    src: router_id,
                    dst,
                    packet,
                },
            );
        }
    }

    fn set_link_status(
        &mut self,
        a: RouterId,
        b: RouterId,
        status: LinkStatus,
    ) -> Result<(), Error> {
        self.link(a, b)?;
        for (local, remote) in [(a, b), (b, a)] {
            let Some(router) = self.routers.get_mut(&local) else {
                continue;
            };
            if let Some(link) = router.node_mut().links.get_mut(&remote) {
                link.status = status;
            }
            let span = debug_span!("link", %local, %remote);
            let _span_guard = span.enter();
            router.interface_changed();
            router.link_state_changed();
            self.process_node_output(local);
        }
        Ok(())
    }

    fn set_link_cost(
        &mut self,
        a: RouterId,
        b: RouterId,
        mt_id: MtId,
        metric: u32,
    ) -> Result<(), Error> {
        self.link(a, b)?;
        for (local, remote) in [(a, b), (b, a)] {
            let Some(router) = self.routers.get_mut(&local) else {
                continue;
            };
            if router.node_mut().set_cost(remote, mt_id, metric) {
                router.link_state_changed();
                self.process_node_output(local);
            }
        }
        Ok(())
    }

    fn link(
        &self,
        local: RouterId,
        remote: RouterId,
    ) -> Result<&SimLink, Error> {
        self.routers
            .get(&local)
            .and_then(|router| router.node().links.get(&remote))
            .ok_or(Error::UnknownLink(local, remote))
    }

    fn link_is_up(&self, local: RouterId, remote: RouterId) -> bool {
        self.link(local, remote)
            .is_ok_and(|link| link.status == LinkStatus::Up)
    }

    // Checks whether the packet is consumed by a drop rule.
    fn drop_matches(
        &mut self,
        src: RouterId,
        dst: RouterId,
        packet: &Packet,
    ) -> bool {
        let Some((idx, rule)) =
            self.drop_rules.iter_mut().find_position(|rule| {
                rule.src == src
                    && rule.dst == dst
                    && rule
                        .pkt_type
                        .is_none_or(|pkt_type| pkt_type == packet.pkt_type())
            })
        else {
            return false;
        };

        rule.remaining = rule.remaining.saturating_sub(1);
        if rule.remaining == 0 {
            self.drop_rules.remove(idx);
        }
        true
    }

    fn push(&mut self, at: Duration, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Event { at, seq, kind });
    }
}

// ===== impl Event =====

// Reversed so that `BinaryHeap` pops the earliest event first.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Event {}
