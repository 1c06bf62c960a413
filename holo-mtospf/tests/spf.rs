//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use holo_mtospf::collections::Lsdb;
use holo_mtospf::lsdb::{LSA_MAX_AGE, LsaEntryFlags};
use holo_mtospf::packet::lsa::{
    LinkStatus, Lsa, LsaBody, LsaRouter, LsaRouterLink, LsaRouterLinkType,
    MtMetric,
};
use holo_mtospf::packet::{MtId, Options, RouterId};
use holo_mtospf::spf::{self, EqualPaths};
use maplit::{btreemap, btreeset};

//
// Helper functions.
//

// Builds a database from a list of `(a, b, [(mt_id, metric)])` links,
// advertised by both ends.
fn database(links: &[(RouterId, RouterId, &[(MtId, u32)])]) -> Lsdb {
    let mut router_links = std::collections::BTreeMap::new();
    for (a, b, metrics) in links {
        router_links
            .entry(*a)
            .or_insert_with(Vec::new)
            .push(link(*b, metrics));
        router_links
            .entry(*b)
            .or_insert_with(Vec::new)
            .push(link(*a, metrics));
    }

    let mut lsdb = Lsdb::default();
    for (adv_rtr, links) in router_links {
        install(&mut lsdb, adv_rtr, 0, links);
    }
    lsdb
}

fn link(peer: RouterId, metrics: &[(MtId, u32)]) -> LsaRouterLink {
    LsaRouterLink::new(
        LinkStatus::Up,
        peer,
        peer,
        LsaRouterLinkType::PointToPoint,
        metrics
            .iter()
            .map(|(mt_id, metric)| MtMetric::new(*mt_id, *metric))
            .collect(),
    )
}

fn install(
    lsdb: &mut Lsdb,
    adv_rtr: RouterId,
    age: u16,
    links: Vec<LsaRouterLink>,
) {
    let lsa = Lsa::new(
        age,
        Options::T,
        adv_rtr,
        adv_rtr,
        1,
        LsaBody::Router(LsaRouter::new(links)),
    );
    lsdb.insert(Arc::new(lsa), LsaEntryFlags::RECEIVED);
}

fn path(cost: u32, next_hops: &[RouterId]) -> EqualPaths {
    EqualPaths {
        cost,
        next_hops: next_hops.iter().copied().collect(),
    }
}

//
// Tests.
//

#[test]
fn self_cost_zero() {
    let lsdb = database(&[(1, 2, &[(0, 10), (1, 10), (2, 10)])]);
    let paths = spf::compute(1, &lsdb, 2);

    for mt_id in 0..=2 {
        assert_eq!(paths[&1][&mt_id], path(0, &[1]));
    }
}

#[test]
fn empty_database() {
    let paths = spf::compute(1, &Lsdb::default(), 0);
    assert_eq!(paths, btreemap! { 1 => btreemap! { 0 => path(0, &[1]) } });
}

#[test]
fn line() {
    let lsdb = database(&[(1, 2, &[(0, 10)]), (2, 3, &[(0, 5)])]);

    let paths = spf::compute(1, &lsdb, 0);
    assert_eq!(paths[&2][&0], path(10, &[2]));
    assert_eq!(paths[&3][&0], path(15, &[2]));

    let paths = spf::compute(2, &lsdb, 0);
    assert_eq!(paths[&1][&0], path(10, &[1]));
    assert_eq!(paths[&3][&0], path(5, &[3]));
}

#[test]
fn unreachable_destination() {
    let lsdb = database(&[(1, 2, &[(0, 10)]), (3, 4, &[(0, 10)])]);
    let paths = spf::compute(1, &lsdb, 0);

    assert_eq!(paths.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn equal_cost_paths() {
    // Square: 1-2-4 and 1-3-4 with the same cost.
    let lsdb = database(&[
        (1, 2, &[(0, 10)]),
        (1, 3, &[(0, 10)]),
        (2, 4, &[(0, 5)]),
        (3, 4, &[(0, 5)]),
    ]);
    let paths = spf::compute(1, &lsdb, 0);

    assert_eq!(paths[&4][&0].cost, 15);
    assert_eq!(paths[&4][&0].next_hops, btreeset![2, 3]);
}

#[test]
fn better_path_replaces_next_hops() {
    // The direct link is worse than the detour.
    let lsdb = database(&[
        (1, 2, &[(0, 1)]),
        (2, 3, &[(0, 1)]),
        (1, 3, &[(0, 10)]),
    ]);
    let paths = spf::compute(1, &lsdb, 0);

    assert_eq!(paths[&3][&0], path(2, &[2]));
}

#[test]
fn multi_topology() {
    // MT 0 prefers 1-2-3, MT 1 prefers the direct link.
    let lsdb = database(&[
        (1, 2, &[(0, 1), (1, 10)]),
        (2, 3, &[(0, 1), (1, 10)]),
        (1, 3, &[(0, 10), (1, 1)]),
    ]);
    let paths = spf::compute(1, &lsdb, 1);

    assert_eq!(paths[&3][&0], path(2, &[2]));
    assert_eq!(paths[&3][&1], path(1, &[3]));
    assert_eq!(paths[&2][&1], path(10, &[2]));
}

#[test]
fn link_without_topology_metric() {
    // The 2-3 link only exists in MT 0.
    let lsdb = database(&[(1, 2, &[(0, 1), (1, 1)]), (2, 3, &[(0, 1)])]);
    let paths = spf::compute(1, &lsdb, 1);

    assert!(paths[&3].contains_key(&0));
    assert!(!paths[&3].contains_key(&1));
    assert!(paths[&2].contains_key(&1));
}

#[test]
fn down_link_is_skipped() {
    let mut lsdb = database(&[(2, 3, &[(0, 1)])]);
    let mut down = link(2, &[(0, 1)]);
    down.status = LinkStatus::Down;
    install(&mut lsdb, 1, 0, vec![down]);

    let paths = spf::compute(1, &lsdb, 0);
    assert_eq!(paths.len(), 1);
}

#[test]
fn maxage_lsa_is_not_expanded() {
    let mut lsdb = database(&[(1, 2, &[(0, 1)]), (2, 3, &[(0, 1)])]);
    install(
        &mut lsdb,
        2,
        LSA_MAX_AGE,
        vec![link(1, &[(0, 1)]), link(3, &[(0, 1)])],
    );
    let paths = spf::compute(1, &lsdb, 0);

    // Router 2 is still reachable through our own link, but nothing lies
    // behind it.
    assert_eq!(paths[&2][&0], path(1, &[2]));
    assert!(!paths.contains_key(&3));
}

#[test]
fn maxage_own_lsa() {
    let mut lsdb = database(&[(1, 2, &[(0, 1)])]);
    install(&mut lsdb, 1, LSA_MAX_AGE, vec![link(2, &[(0, 1)])]);
    let paths = spf::compute(1, &lsdb, 0);

    assert_eq!(paths.len(), 1);
    assert_eq!(paths[&1][&0], path(0, &[1]));
}
