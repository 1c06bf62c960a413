//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::neighbor::nsm;
use crate::packet::lsa::LsaHdr;
use crate::packet::{Packet, RouterId};

// Routing engine debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    // Instances
    InstanceCreate,
    // Neighbors
    NeighborCreate(RouterId),
    NsmEvent(RouterId, &'a nsm::State, &'a nsm::Event),
    NsmTransition(RouterId, &'a nsm::State, &'a nsm::State),
    NsmNegotiation(RouterId, bool),
    // Network
    PacketRx(RouterId, &'a Packet),
    PacketTx(RouterId, &'a Packet),
    PacketRxmt(RouterId, &'a Packet),
    PacketRxIgnore(RouterId, &'a nsm::State),
    // LSDB maintenance
    LsaInstall(&'a LsaHdr),
    LsaOriginate(&'a LsaHdr),
    LsaRefresh(&'a LsaHdr),
    LsaMaxAge(&'a LsaHdr),
    LsaFlush(&'a LsaHdr, LsaFlushReason),
    // SPF
    SpfRun(usize),
}

// Reason why a SeqNoMismatch event was generated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum SeqNoMismatchReason {
    InconsistentFlags,
    InconsistentOptions,
    InconsistentSeqNo,
    UnexpectedDbDesc,
    InvalidLsaType,
}

// Reason why an LSA is being flushed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaFlushReason {
    Expiry,
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InstanceCreate => {
                // Parent span(s): router
                debug!("{}", self);
            }
            Debug::NeighborCreate(router_id) => {
                // Parent span(s): router
                debug_span!("neighbor", %router_id).in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::NsmEvent(router_id, state, event) => {
                // Parent span(s): router
                debug_span!("neighbor", %router_id).in_scope(|| {
                    debug_span!("fsm").in_scope(|| {
                        debug!(?state, ?event, "{}", self);
                    })
                })
            }
            Debug::NsmTransition(router_id, old_state, new_state) => {
                // Parent span(s): router
                debug_span!("neighbor", %router_id).in_scope(|| {
                    debug_span!("fsm").in_scope(|| {
                        debug!(?old_state, ?new_state, "{}", self);
                    })
                })
            }
            Debug::NsmNegotiation(router_id, master) => {
                // Parent span(s): router
                debug_span!("neighbor", %router_id).in_scope(|| {
                    debug!(%master, "{}", self);
                })
            }
            Debug::PacketRx(router_id, packet) => {
                // Parent span(s): router
                debug_span!("network").in_scope(|| {
                    debug_span!("input").in_scope(|| {
                        let data =
                            serde_json::to_string(&packet).unwrap_or_default();
                        debug!(source = %router_id, %data, "{}", self);
                    })
                })
            }
            Debug::PacketTx(router_id, packet)
            | Debug::PacketRxmt(router_id, packet) => {
                // Parent span(s): router
                debug_span!("network").in_scope(|| {
                    debug_span!("output").in_scope(|| {
                        let data =
                            serde_json::to_string(&packet).unwrap_or_default();
                        debug!(destination = %router_id, %data, "{}", self);
                    })
                })
            }
            Debug::PacketRxIgnore(router_id, state) => {
                // Parent span(s): router
                debug_span!("neighbor", %router_id).in_scope(|| {
                    debug!(?state, "{}", self);
                })
            }
            Debug::LsaInstall(lsa_hdr)
            | Debug::LsaOriginate(lsa_hdr)
            | Debug::LsaRefresh(lsa_hdr)
            | Debug::LsaMaxAge(lsa_hdr) => {
                // Parent span(s): router
                debug!(?lsa_hdr, "{}", self);
            }
            Debug::LsaFlush(lsa_hdr, reason) => {
                // Parent span(s): router
                debug!(?lsa_hdr, %reason, "{}", self);
            }
            Debug::SpfRun(destinations) => {
                // Parent span(s): router
                debug!(%destinations, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InstanceCreate => {
                write!(f, "instance created")
            }
            Debug::NeighborCreate(..) => {
                write!(f, "neighbor created")
            }
            Debug::NsmEvent(..) => {
                write!(f, "event")
            }
            Debug::NsmTransition(..) => {
                write!(f, "state transition")
            }
            Debug::NsmNegotiation(..) => {
                write!(f, "master/slave negotiation done")
            }
            Debug::PacketRx(..) => {
                write!(f, "packet")
            }
            Debug::PacketTx(..) => {
                write!(f, "packet")
            }
            Debug::PacketRxmt(..) => {
                write!(f, "packet retransmission")
            }
            Debug::PacketRxIgnore(..) => {
                write!(f, "ignoring packet")
            }
            Debug::LsaInstall(..) => {
                write!(f, "installing LSA")
            }
            Debug::LsaOriginate(..) => {
                write!(f, "originating LSA")
            }
            Debug::LsaRefresh(..) => {
                write!(f, "refreshing LSA")
            }
            Debug::LsaMaxAge(..) => {
                write!(f, "LSA reached MaxAge")
            }
            Debug::LsaFlush(..) => {
                write!(f, "flushing LSA")
            }
            Debug::SpfRun(..) => {
                write!(f, "route computation")
            }
        }
    }
}

// ===== impl LsaFlushReason =====

impl std::fmt::Display for LsaFlushReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LsaFlushReason::Expiry => {
                write!(f, "expiry")
            }
        }
    }
}
