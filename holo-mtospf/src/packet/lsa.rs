//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use derive_new::new;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::lsdb::LSA_MAX_AGE;
use crate::packet::{MtId, Options, RouterId};

// OSPF LSA.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Lsa {
    // LSA header.
    pub hdr: LsaHdr,
    // LSA body.
    pub body: LsaBody,
}

//
// OSPF LSA header.
//
// Encoding format (for reference only):
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |            LS age             |    Options    |    LS type    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        Link State ID                          |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     Advertising Router                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     LS sequence number                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                   (unused)                    |     length    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaHdr {
    pub age: u16,
    pub options: Options,
    pub lsa_type: LsaType,
    pub lsa_id: u32,
    pub adv_rtr: RouterId,
    pub seq_no: u32,
    pub length: u16,
}

// OSPF LSA type.
//
// Kept as the raw type code so that unrecognized types can still be carried
// and reported.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(transparent)]
pub struct LsaType(pub u8);

// OSPF LSA type code.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Hash, Ord, PartialEq)]
#[derive(PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum LsaTypeCode {
    Router = 1,
    Network = 2,
    Summary = 3,
}

// OSPF LSA key. It serves both as a global LSA identifier and as a key to store
// LSAs in the LSDB.
//
// The advertising router comes first so that all LSAs originated by the same
// router are stored contiguously.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaKey {
    // LSA advertising router.
    pub adv_rtr: RouterId,
    // LSA type.
    pub lsa_type: LsaType,
    // LSA ID.
    pub lsa_id: u32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaBody {
    Router(LsaRouter),
    Network(LsaNetwork),
    Summary(LsaSummary),
    Unknown(LsaType),
}

#[derive(Clone, Debug, Default, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaRouter {
    pub links: Vec<LsaRouterLink>,
}

#[derive(Clone, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaRouterLink {
    pub status: LinkStatus,
    pub link_id: RouterId,
    pub link_data: u32,
    pub link_type: LsaRouterLinkType,
    pub mt_metrics: Vec<MtMetric>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    #[default]
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaRouterLinkType {
    PointToPoint = 0x01,
    TransitNetwork = 0x02,
    StubNetwork = 0x03,
    VirtualLink = 0x04,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct MtMetric {
    pub mt_id: MtId,
    pub metric: u32,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaNetwork {
    pub mask: u32,
    pub attached_rtrs: BTreeSet<RouterId>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaSummary {
    pub mask: u32,
    pub mt_metrics: Vec<MtMetric>,
}

// ===== impl Lsa =====

impl Lsa {
    pub const HDR_LENGTH: u16 = 20;

    pub fn new(
        age: u16,
        options: Options,
        lsa_id: u32,
        adv_rtr: RouterId,
        seq_no: u32,
        body: LsaBody,
    ) -> Self {
        let hdr = LsaHdr {
            age,
            options,
            lsa_type: body.lsa_type(),
            lsa_id,
            adv_rtr,
            seq_no,
            length: Lsa::HDR_LENGTH + body.length(),
        };
        Lsa { hdr, body }
    }

    // Returns a copy of this LSA advertising the given age.
    pub fn with_age(&self, age: u16) -> Self {
        let mut lsa = self.clone();
        lsa.hdr.age = std::cmp::min(age, LSA_MAX_AGE);
        lsa
    }

    // Returns the router links if this is a router-LSA.
    pub fn router_links(&self) -> Option<&[LsaRouterLink]> {
        match &self.body {
            LsaBody::Router(router) => Some(&router.links),
            _ => None,
        }
    }
}

// ===== impl LsaHdr =====

impl LsaHdr {
    pub fn key(&self) -> LsaKey {
        LsaKey::new(self.adv_rtr, self.lsa_type, self.lsa_id)
    }

    pub fn is_maxage(&self) -> bool {
        self.age == LSA_MAX_AGE
    }
}

// ===== impl LsaType =====

impl LsaType {
    pub fn type_code(&self) -> Option<LsaTypeCode> {
        LsaTypeCode::from_u8(self.0)
    }

    pub fn is_valid(&self) -> bool {
        self.type_code().is_some()
    }
}

impl From<LsaTypeCode> for LsaType {
    fn from(code: LsaTypeCode) -> LsaType {
        LsaType(code as u8)
    }
}

impl std::fmt::Display for LsaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.type_code() {
            Some(LsaTypeCode::Router) => write!(f, "router"),
            Some(LsaTypeCode::Network) => write!(f, "network"),
            Some(LsaTypeCode::Summary) => write!(f, "summary"),
            None => write!(f, "unknown ({})", self.0),
        }
    }
}

// ===== impl LsaKey =====

impl LsaKey {
    // Key of the router-LSA originated by the given router.
    pub fn router(adv_rtr: RouterId) -> Self {
        LsaKey::new(adv_rtr, LsaTypeCode::Router.into(), adv_rtr)
    }

    // First and last possible keys of the given originator.
    pub(crate) fn originator_range(adv_rtr: RouterId) -> (Self, Self) {
        (
            LsaKey::new(adv_rtr, LsaType(u8::MIN), u32::MIN),
            LsaKey::new(adv_rtr, LsaType(u8::MAX), u32::MAX),
        )
    }
}

// ===== impl LsaBody =====

impl LsaBody {
    pub fn lsa_type(&self) -> LsaType {
        match self {
            LsaBody::Router(_) => LsaTypeCode::Router.into(),
            LsaBody::Network(_) => LsaTypeCode::Network.into(),
            LsaBody::Summary(_) => LsaTypeCode::Summary.into(),
            LsaBody::Unknown(lsa_type) => *lsa_type,
        }
    }

    pub fn length(&self) -> u16 {
        match self {
            LsaBody::Router(router) => router.length(),
            LsaBody::Network(network) => {
                4 + 4 * network.attached_rtrs.len() as u16
            }
            LsaBody::Summary(summary) => {
                4 + 4 * summary.mt_metrics.len() as u16
            }
            LsaBody::Unknown(_) => 0,
        }
    }
}

// ===== impl LsaRouter =====

impl LsaRouter {
    pub const BASE_LENGTH: u16 = 4;

    fn length(&self) -> u16 {
        LsaRouter::BASE_LENGTH
            + self.links.iter().map(|link| link.length()).sum::<u16>()
    }
}

// ===== impl LsaRouterLink =====

impl LsaRouterLink {
    pub const BASE_LENGTH: u16 = 12;

    fn length(&self) -> u16 {
        LsaRouterLink::BASE_LENGTH + 4 * self.mt_metrics.len() as u16
    }

    // Returns the link metric for the given topology, if any.
    pub fn metric(&self, mt_id: MtId) -> Option<u32> {
        self.mt_metrics
            .iter()
            .find(|mt_metric| mt_metric.mt_id == mt_id)
            .map(|mt_metric| mt_metric.metric)
    }

    pub fn is_up(&self) -> bool {
        self.status == LinkStatus::Up
    }
}
