//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::sync::Arc;

use nsm::{Event, State};
use serde::{Deserialize, Serialize};

use crate::collections::NeighborIndex;
use crate::debug::Debug;
use crate::error::Error;
use crate::events;
use crate::instance::Instance;
use crate::node::Node;
use crate::output;
use crate::packet::lsa::{LinkStatus, Lsa, LsaHdr, LsaKey};
use crate::packet::{DbDesc, DbDescFlags, MsgId, Options, RouterId};

#[derive(Debug)]
pub struct Neighbor {
    pub router_id: RouterId,
    pub state: State,

    pub options: Option<Options>,
    // The MS bit is set while the local router acts as the master.
    pub dd_flags: DbDescFlags,
    pub dd_seq_no: u32,
    pub last_rcvd_dbdesc: Option<LastDbDesc>,
    pub last_sent_dbdesc: Option<MsgId>,

    pub event_count: u32,
    pub lists: NeighborLsaLists,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LastDbDesc {
    pub options: Options,
    pub dd_flags: DbDescFlags,
    pub dd_seq_no: u32,
}

#[derive(Debug, Default)]
pub struct NeighborLsaLists {
    // LSA headers enqueued for transmission in Database Description packets.
    pub db_summary: BTreeMap<LsaKey, LsaHdr>,
    // LSAs waiting to be acknowledged.
    pub ls_rxmt: BTreeMap<LsaKey, Arc<Lsa>>,
    // LSAs that need to be received from this neighbor.
    pub ls_request: BTreeMap<LsaKey, LsaHdr>,
}

// Neighbor state machine.
pub mod nsm {
    use serde::{Deserialize, Serialize};

    use crate::debug::SeqNoMismatchReason;

    #[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
    #[derive(Deserialize, Serialize)]
    pub enum State {
        #[default]
        Down,
        Attempt,
        Init,
        TwoWay,
        ExStart,
        Exchange,
        Loading,
        Full,
    }

    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    pub enum Event {
        Start,
        HelloRcvd,
        TwoWayRcvd,
        OneWayRcvd,
        NegotiationDone,
        ExchangeDone,
        BadLsReq,
        LoadingDone,
        SeqNoMismatch(SeqNoMismatchReason),
        InactivityTimer,
    }
}

// ===== impl Neighbor =====

impl Neighbor {
    pub(crate) fn new(router_id: RouterId) -> Neighbor {
        Debug::NeighborCreate(router_id).log();

        Neighbor {
            router_id,
            state: State::Down,
            options: None,
            dd_flags: DbDescFlags::empty(),
            dd_seq_no: 0,
            last_rcvd_dbdesc: None,
            last_sent_dbdesc: None,
            event_count: 0,
            lists: Default::default(),
        }
    }

    // Returns whether the local router is the master of the database exchange.
    pub fn is_master(&self) -> bool {
        self.dd_flags.contains(DbDescFlags::MS)
    }

    // Returns whether the neighbor is exchanging or loading its database.
    pub fn is_synchronizing(&self) -> bool {
        matches!(self.state, State::Exchange | State::Loading)
    }

    pub(crate) fn dbdesc_is_dup(&self, dbdesc: &DbDesc) -> bool {
        if let Some(last_rcvd_dbdesc) = &self.last_rcvd_dbdesc {
            if last_rcvd_dbdesc.options == dbdesc.options
                && last_rcvd_dbdesc.dd_flags == dbdesc.dd_flags
                && last_rcvd_dbdesc.dd_seq_no == dbdesc.dd_seq_no
            {
                return true;
            }
        }

        false
    }

    fn reset_lists(&mut self) {
        self.last_rcvd_dbdesc = None;
        self.last_sent_dbdesc = None;
        self.lists = Default::default();
    }

    // Prepares the initial DD packet of a new database exchange, claiming the
    // master role.
    fn exstart(&mut self) {
        self.dd_seq_no = self.dd_seq_no.wrapping_add(1);
        self.dd_flags = DbDescFlags::I | DbDescFlags::M | DbDescFlags::MS;
    }
}

// ===== global functions =====

// Runs the neighbor state machine.
pub(crate) fn fsm<N>(
    instance: &mut Instance<N>,
    nbr_idx: NeighborIndex,
    event: Event,
) where
    N: Node,
{
    let nbr = &instance.state.neighbors[nbr_idx];
    let router_id = nbr.router_id;
    let state = nbr.state;
    Debug::NsmEvent(router_id, &state, &event).log();

    let new_state = match (state, &event) {
        // NSM (state, event) -> (Action, new state)
        (State::Down, Event::Start) => {
            instance
                .state
                .inactivity
                .start(&mut instance.node, router_id);
            Some(State::Attempt)
        }
        // NSM (state, event) -> (Action, new state)
        (State::Attempt | State::Down, Event::HelloRcvd) => {
            instance
                .state
                .inactivity
                .start(&mut instance.node, router_id);
            Some(State::Init)
        }
        // NSM (state, event) -> (Action, new state)
        (
            State::Init
            | State::TwoWay
            | State::ExStart
            | State::Exchange
            | State::Loading
            | State::Full,
            Event::HelloRcvd,
        ) => {
            instance
                .state
                .inactivity
                .start(&mut instance.node, router_id);
            None
        }
        // NSM (state, event) -> (Action, new state)
        (State::Init, Event::TwoWayRcvd) => {
            instance.state.neighbors[nbr_idx].exstart();
            output::send_dbdesc(instance, nbr_idx);
            Some(State::ExStart)
        }
        // NSM (state, event) -> (Action, new state)
        (State::ExStart, Event::NegotiationDone) => {
            // List the contents of the entire LSDB in the summary list.
            let nbr = &mut instance.state.neighbors[nbr_idx];
            let mut maxage_lsas = vec![];
            for (_, lse) in instance.state.lsdb.iter() {
                let lsa_key = lse.data.hdr.key();
                if lse.data.hdr.is_maxage() {
                    nbr.lists.ls_rxmt.insert(lsa_key, lse.data.clone());
                    maxage_lsas.push((*lse.data).clone());
                } else {
                    nbr.lists.db_summary.insert(lsa_key, lse.data.hdr);
                }
            }
            nbr.dd_flags.remove(DbDescFlags::I);

            // Send the first DD packet of the exchange.
            output::send_dbdesc(instance, nbr_idx);

            // MaxAge LSAs are flooded directly.
            if !maxage_lsas.is_empty() {
                let origin = instance.router_id;
                output::send_lsupd(instance, router_id, origin, maxage_lsas);
            }
            Some(State::Exchange)
        }
        // NSM (state, event) -> (Action, new state)
        (State::Exchange, Event::ExchangeDone) => {
            let nbr = &instance.state.neighbors[nbr_idx];
            if nbr.lists.ls_request.is_empty() {
                Some(State::Full)
            } else {
                output::send_lsreq(instance, nbr_idx);
                Some(State::Loading)
            }
        }
        // NSM (state, event) -> (Action, new state)
        (State::Loading, Event::LoadingDone) => {
            // No action required.
            Some(State::Full)
        }
        // NSM (state, event) -> (Action, new state)
        (
            State::Exchange | State::Loading | State::Full,
            Event::SeqNoMismatch(_) | Event::BadLsReq,
        ) => {
            reset_adjacency(instance, nbr_idx);
            instance.state.neighbors[nbr_idx].exstart();
            output::send_dbdesc(instance, nbr_idx);
            Some(State::ExStart)
        }
        // NSM (state, event) -> (Action, new state)
        (_, Event::InactivityTimer) => {
            reset_adjacency(instance, nbr_idx);
            let nbr = &mut instance.state.neighbors[nbr_idx];
            nbr.dd_flags = DbDescFlags::empty();
            nbr.dd_seq_no = 0;
            nbr.options = None;
            instance.state.neighbor_list.remove(&router_id);
            instance
                .state
                .inactivity
                .cancel(&mut instance.node, router_id);
            Some(State::Down)
        }
        // NSM (state, event) -> (Action, new state)
        (
            State::TwoWay
            | State::ExStart
            | State::Exchange
            | State::Loading
            | State::Full,
            Event::OneWayRcvd,
        ) => {
            reset_adjacency(instance, nbr_idx);
            Some(State::Init)
        }
        // NSM (state, event) -> (Action, new state)
        (
            State::TwoWay
            | State::ExStart
            | State::Exchange
            | State::Loading
            | State::Full,
            Event::TwoWayRcvd,
        ) => {
            // No action required.
            None
        }
        // NSM (state, event) -> (Action, new state)
        (State::Init, Event::OneWayRcvd) => {
            // No action required.
            None
        }
        // Catch-all wildcard.
        _ => {
            Error::NsmUnexpectedEvent(router_id, state, event).log();
            return;
        }
    };

    // Check for FSM state change.
    if let Some(new_state) = new_state
        && new_state != state
    {
        let nbr = &mut instance.state.neighbors[nbr_idx];
        Debug::NsmTransition(router_id, &state, &new_state).log();
        nbr.state = new_state;
        nbr.event_count += 1;
    }

    // The link towards a dead neighbor goes down in the local router-LSA.
    if event == Event::InactivityTimer
        && !events::change_link_status(instance, router_id, LinkStatus::Down)
    {
        instance.compute_routes();
    }
}

// ===== helper functions =====

// Tears down the adjacency: clears the LSA lists, removes the neighbor from
// the flooding scope and stops all retransmissions.
fn reset_adjacency<N>(instance: &mut Instance<N>, nbr_idx: NeighborIndex)
where
    N: Node,
{
    let nbr = &mut instance.state.neighbors[nbr_idx];
    let router_id = nbr.router_id;
    nbr.reset_lists();
    instance.state.adjacencies.remove(&router_id);
    instance.state.rxmt.cancel(&mut instance.node, router_id);
}
