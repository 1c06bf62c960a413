//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet, btree_map};

use serde::{Deserialize, Serialize};

use crate::collections::Lsdb;
use crate::packet::{MtId, RouterId};

// Shortest paths towards every reachable router, per topology.
pub type PathTable = BTreeMap<RouterId, BTreeMap<MtId, EqualPaths>>;

// Set of equal-cost paths towards a destination.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct EqualPaths {
    pub cost: u32,
    pub next_hops: BTreeSet<RouterId>,
}

// Tentative vertex.
#[derive(Debug)]
struct Candidate {
    cost: u32,
    next_hops: BTreeSet<RouterId>,
}

// ===== global functions =====

// Computes the shortest paths from `router_id` for all topologies.
pub fn compute(router_id: RouterId, lsdb: &Lsdb, mt_count: u16) -> PathTable {
    let mut paths = PathTable::new();
    for mt_id in 0..=mt_count {
        for (dest, path) in compute_topology(router_id, lsdb, mt_id) {
            paths.entry(dest).or_default().insert(mt_id, path);
        }
    }
    paths
}

// ===== helper functions =====

// Runs Dijkstra's algorithm over the router-LSAs for a single topology.
fn compute_topology(
    router_id: RouterId,
    lsdb: &Lsdb,
    mt_id: MtId,
) -> BTreeMap<RouterId, EqualPaths> {
    let mut spt = BTreeMap::new();
    let mut cand_list = BTreeMap::new();
    // Ordered by (cost, router id) to break ties towards the lowest id.
    let mut cand_queue = BTreeSet::new();

    // The root vertex is its own next hop.
    cand_list.insert(
        router_id,
        Candidate {
            cost: 0,
            next_hops: [router_id].into(),
        },
    );
    cand_queue.insert((0, router_id));

    while let Some((cost, vertex_id)) = cand_queue.pop_first() {
        let Some(vertex) = cand_list.remove(&vertex_id) else {
            continue;
        };
        let vertex = EqualPaths {
            cost,
            next_hops: vertex.next_hops,
        };

        // Expand the vertex only if its router-LSA is usable.
        let links = lsdb
            .router_lsa(vertex_id)
            .filter(|lse| !lse.data.hdr.is_maxage())
            .and_then(|lse| lse.data.router_links())
            .unwrap_or_default();

        for link in links.iter().filter(|link| link.is_up()) {
            let Some(metric) = link.metric(mt_id) else {
                continue;
            };
            let dest = link.link_id;

            // Skip vertices that are already in the shortest-path tree.
            if dest == router_id || spt.contains_key(&dest) {
                continue;
            }

            let dest_cost = cost.saturating_add(metric);
            let next_hops = if vertex_id == router_id {
                BTreeSet::from([dest])
            } else {
                vertex.next_hops.clone()
            };

            match cand_list.entry(dest) {
                btree_map::Entry::Vacant(v) => {
                    v.insert(Candidate {
                        cost: dest_cost,
                        next_hops,
                    });
                    cand_queue.insert((dest_cost, dest));
                }
                btree_map::Entry::Occupied(mut o) => {
                    let cand = o.get_mut();
                    if dest_cost < cand.cost {
                        cand_queue.remove(&(cand.cost, dest));
                        cand.cost = dest_cost;
                        cand.next_hops = next_hops;
                        cand_queue.insert((dest_cost, dest));
                    } else if dest_cost == cand.cost {
                        cand.next_hops.extend(next_hops);
                    }
                }
            }
        }

        spt.insert(vertex_id, vertex);
    }

    spt
}
