//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{warn, warn_span};

use crate::neighbor::nsm;
use crate::packet::lsa::LsaType;
use crate::packet::{MsgId, PacketType, RouterId};

// Routing engine errors.
#[derive(Debug)]
pub enum Error {
    // Inter-task communication
    NbrNotFound(RouterId),
    SelfLsaMissing(RouterId),
    MessageEvicted(PacketType, MsgId),
    // Packet input
    HelloIntervalMismatch(RouterId, u16),
    DeadIntervalMismatch(RouterId, u32),
    DbDescReject(RouterId, nsm::State),
    UnknownLsaType(RouterId, LsaType),
    // Other
    NsmUnexpectedEvent(RouterId, nsm::State, nsm::Event),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::NbrNotFound(router_id) => {
                warn!(%router_id, "{}", self);
            }
            Error::SelfLsaMissing(router_id) => {
                warn!(%router_id, "{}", self);
            }
            Error::MessageEvicted(pkt_type, msg_id) => {
                warn!(%pkt_type, %msg_id, "{}", self);
            }
            Error::HelloIntervalMismatch(router_id, received) => {
                warn_span!("neighbor", %router_id).in_scope(|| {
                    warn!(%received, "{}", self);
                })
            }
            Error::DeadIntervalMismatch(router_id, received) => {
                warn_span!("neighbor", %router_id).in_scope(|| {
                    warn!(%received, "{}", self);
                })
            }
            Error::DbDescReject(router_id, state) => {
                warn_span!("neighbor", %router_id).in_scope(|| {
                    warn!(?state, "{}", self);
                })
            }
            Error::UnknownLsaType(router_id, lsa_type) => {
                warn_span!("neighbor", %router_id).in_scope(|| {
                    warn!(%lsa_type, "{}", self);
                })
            }
            Error::NsmUnexpectedEvent(router_id, state, event) => {
                warn_span!("neighbor", %router_id).in_scope(|| {
                    warn_span!("fsm").in_scope(|| {
                        warn!(?state, ?event, "{}", self);
                    })
                })
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NbrNotFound(..) => {
                write!(f, "neighbor not found")
            }
            Error::SelfLsaMissing(..) => {
                write!(f, "self-originated router-LSA not found")
            }
            Error::MessageEvicted(..) => {
                write!(f, "message evicted before retransmission")
            }
            Error::HelloIntervalMismatch(..) => {
                write!(f, "hello interval mismatch")
            }
            Error::DeadIntervalMismatch(..) => {
                write!(f, "dead interval mismatch")
            }
            Error::DbDescReject(..) => {
                write!(f, "database description packet rejected")
            }
            Error::UnknownLsaType(..) => {
                write!(f, "discarding LSA of unknown type")
            }
            Error::NsmUnexpectedEvent(..) => {
                write!(f, "unexpected event")
            }
        }
    }
}

impl std::error::Error for Error {}
