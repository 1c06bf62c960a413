//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use common::TestNetwork;
use holo_mtospf::neighbor::nsm;
use holo_mtospf::packet::lsa::{LinkStatus, LsaKey};
use holo_mtospf::packet::{
    DbDesc, DbDescFlags, Options, Packet, PacketHdr, PacketType,
};
use holo_mtospf::tasks::TimerId;
use maplit::btreeset;

//
// Helper functions.
//

fn two_routers() -> TestNetwork {
    TestNetwork::new(&[(1, 2, &[(0, 10)])], 0)
}

fn assert_full(network: &TestNetwork, a: u32, b: u32) {
    let nbr = network.router(a).neighbor(b).unwrap();
    assert_eq!(nbr.state, nsm::State::Full);
    let nbr = network.router(b).neighbor(a).unwrap();
    assert_eq!(nbr.state, nsm::State::Full);
}

//
// Tests.
//

#[test]
fn adjacency_two_routers() {
    let mut network = two_routers();
    network.converge();

    assert_full(&network, 1, 2);

    // The router with the highest Router ID is the master.
    assert!(network.router(2).neighbor(1).unwrap().is_master());
    assert!(!network.router(1).neighbor(2).unwrap().is_master());

    // Both databases are synchronized.
    for router_id in [1, 2] {
        let lsdb = network.router(router_id).lsdb();
        assert_eq!(lsdb.len(), 2);
        assert!(lsdb.router_lsa(1).is_some());
        assert!(lsdb.router_lsa(2).is_some());
    }

    assert_eq!(network.router(1).neighbor_list(), &btreeset![2]);
    assert_eq!(network.router(1).adjacencies(), &btreeset![2]);
}

#[test]
fn adjacency_lists_empty_when_full() {
    let mut network = two_routers();
    network.converge();

    for (a, b) in [(1, 2), (2, 1)] {
        let nbr = network.router(a).neighbor(b).unwrap();
        assert!(nbr.lists.db_summary.is_empty());
        assert!(nbr.lists.ls_request.is_empty());
        assert!(nbr.lists.ls_rxmt.is_empty());

        // No retransmissions are pending.
        let node = network.router(a).node();
        assert!(!node.timers.contains_key(&TimerId::Rxmt(b)));
        assert!(!node.timers.contains_key(&TimerId::RxmtUpdate(b)));
    }
}

#[test]
fn one_way_hello_keeps_init() {
    let mut network = two_routers();

    // A single round only lets each router hear the other.
    network.hello_round();

    for (a, b) in [(1, 2), (2, 1)] {
        let nbr = network.router(a).neighbor(b).unwrap();
        assert_eq!(nbr.state, nsm::State::Init);
        assert!(network.router(a).adjacencies().is_empty());
        assert!(network.router(a).inactivity().is_active(b));
    }
}

#[test]
fn hello_interval_mismatch_is_ignored() {
    let mut network = two_routers();
    let hello = Packet::Hello(holo_mtospf::packet::Hello {
        hdr: PacketHdr::new(PacketType::Hello, 2, 0),
        network_mask: 0,
        hello_interval: common::HELLO_INTERVAL + 1,
        options: Options::T,
        dead_interval: common::DEAD_INTERVAL,
        neighbors: btreeset![1],
    });

    let router = network.router_mut(1);
    assert!(matches!(router.receive_message(2, hello), Ok(false)));
    assert_eq!(router.neighbor(2).unwrap().state, nsm::State::Down);
    assert!(router.neighbor_list().is_empty());
}

#[test]
fn inactivity_timer_from_full() {
    let mut network = two_routers();
    network.converge();

    let result = network.fire(1, TimerId::Inactivity(2)).unwrap();
    assert!(result.unwrap());

    let router = network.router(1);
    let nbr = router.neighbor(2).unwrap();
    assert_eq!(nbr.state, nsm::State::Down);
    assert_eq!(nbr.dd_seq_no, 0);
    assert!(nbr.options.is_none());
    assert!(nbr.lists.db_summary.is_empty());
    assert!(nbr.lists.ls_request.is_empty());
    assert!(nbr.lists.ls_rxmt.is_empty());
    assert!(router.neighbor_list().is_empty());
    assert!(router.adjacencies().is_empty());
    assert!(!router.inactivity().is_active(2));

    // The link towards the dead neighbor went down in the local router-LSA.
    let lse = router.lsdb().router_lsa(1).unwrap();
    let links = lse.data.router_links().unwrap();
    assert_eq!(links[0].status, LinkStatus::Down);
    assert_eq!(lse.data.hdr.seq_no, 1);
    assert!(router.lookup_path(2, 0).is_none());
}

#[test]
fn inactivity_timer_stale_expiration() {
    let mut network = two_routers();
    network.converge();

    // The neighbor was already declared down.
    network.fire(1, TimerId::Inactivity(2)).unwrap().unwrap();
    let router = network.router_mut(1);
    assert!(matches!(
        router.timer_expired(TimerId::Inactivity(2)),
        Ok(false)
    ));
}

#[test]
fn adjacency_recovers_after_inactivity() {
    let mut network = two_routers();
    network.converge();
    network.fire(1, TimerId::Inactivity(2)).unwrap().unwrap();

    network.converge();
    assert_full(&network, 1, 2);

    // The link is back up in the local router-LSA.
    let router = network.router(1);
    let lse = router.lsdb().router_lsa(1).unwrap();
    assert_eq!(lse.data.router_links().unwrap()[0].status, LinkStatus::Up);
    assert_eq!(router.lookup_path(2, 0).unwrap().cost, 10);
}

#[test]
fn seq_no_mismatch_restarts_exchange() {
    let mut network = two_routers();
    network.converge();

    // A DD that is neither a duplicate nor expected while Full.
    let nbr = network.router(1).neighbor(2).unwrap();
    let dbdesc = Packet::DbDesc(DbDesc {
        hdr: PacketHdr::new(PacketType::DbDesc, 2, 0),
        options: Options::T,
        dd_flags: DbDescFlags::MS,
        dd_seq_no: nbr.dd_seq_no + 10,
        lsa_hdrs: vec![],
    });
    let router = network.router_mut(1);
    router.receive_message(2, dbdesc).unwrap();
    let nbr = router.neighbor(2).unwrap();
    assert_eq!(nbr.state, nsm::State::ExStart);
    assert!(nbr.is_master());
    assert!(router.adjacencies().is_empty());

    // The adjacency is formed again.
    network.deliver_all();
    network.hello_round();
    assert_full(&network, 1, 2);
    assert_eq!(network.router(1).adjacencies(), &btreeset![2]);
}

#[test]
fn bad_ls_request_restarts_exchange() {
    let mut network = two_routers();
    network.converge();

    let request = Packet::LsRequest(holo_mtospf::packet::LsRequest {
        hdr: PacketHdr::new(PacketType::LsRequest, 2, 0),
        entries: vec![LsaKey::router(99)],
    });
    let router = network.router_mut(1);
    router.receive_message(2, request).unwrap();
    assert_eq!(router.neighbor(2).unwrap().state, nsm::State::ExStart);

    network.deliver_all();
    network.hello_round();
    assert_full(&network, 1, 2);
}

#[test]
fn dbdesc_rejected_before_two_way() {
    let mut network = two_routers();
    let dbdesc = Packet::DbDesc(DbDesc {
        hdr: PacketHdr::new(PacketType::DbDesc, 2, 0),
        options: Options::T,
        dd_flags: DbDescFlags::I | DbDescFlags::M | DbDescFlags::MS,
        dd_seq_no: 1,
        lsa_hdrs: vec![],
    });

    let router = network.router_mut(1);
    router.receive_message(2, dbdesc).unwrap();
    assert_eq!(router.neighbor(2).unwrap().state, nsm::State::Down);
    assert_eq!(router.node().sent(PacketType::DbDesc), 0);
}

#[test]
fn lost_dbdesc_is_retransmitted_by_master() {
    let mut network = two_routers();
    network.hello_round();

    // Drop the initial DD from the future master.
    let mut dropped = false;
    network.hello_round_filtered(|src, _, packet| {
        if src == 2 && packet.pkt_type() == PacketType::DbDesc && !dropped {
            dropped = true;
            return false;
        }
        true
    });
    assert!(dropped);
    assert_eq!(
        network.router(1).neighbor(2).unwrap().state,
        nsm::State::ExStart
    );
    assert!(network.router(2).node().timers.contains_key(&TimerId::Rxmt(1)));

    network.fire(2, TimerId::Rxmt(1)).unwrap().unwrap();
    assert_full(&network, 1, 2);
    assert!(!network.router(2).node().timers.contains_key(&TimerId::Rxmt(1)));
}

#[test]
fn lost_slave_reply_answered_with_resend() {
    let mut network = two_routers();
    network.hello_round();

    // Drop the slave's first Exchange DD.
    let mut dropped = false;
    network.hello_round_filtered(|src, _, packet| {
        if let Packet::DbDesc(dbdesc) = packet
            && src == 1
            && !dbdesc.dd_flags.contains(DbDescFlags::I)
            && !dropped
        {
            dropped = true;
            return false;
        }
        true
    });
    assert!(dropped);
    assert_eq!(
        network.router(1).neighbor(2).unwrap().state,
        nsm::State::Exchange
    );

    // The master retransmits its initial DD and the slave answers it by
    // repeating its last DD.
    network.fire(2, TimerId::Rxmt(1)).unwrap().unwrap();
    assert_full(&network, 1, 2);
}

#[test]
fn event_count_tracks_transitions() {
    let mut network = two_routers();
    network.converge();

    // Down -> Attempt -> Init -> ExStart -> Exchange -> Loading -> Full.
    let nbr = network.router(1).neighbor(2).unwrap();
    assert_eq!(nbr.event_count, 6);
}

#[test]
fn instance_debug_output() {
    let mut network = two_routers();
    network.converge();

    let output = format!("{:?}", network.router(1));
    assert!(output.starts_with("Instance"));
    assert!(output.contains("router_id: 1"));
    assert!(output.contains("Full"));
}
