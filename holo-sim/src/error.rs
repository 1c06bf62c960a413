//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use holo_mtospf::packet::RouterId;
use tracing::{warn, warn_span};

// Simulation errors.
#[derive(Debug)]
pub enum Error {
    // Configuration
    ConfigRead(String, std::io::Error),
    ConfigParse(toml::de::Error),
    DuplicateRouter(RouterId),
    UnknownRouter(RouterId),
    InvalidLink(RouterId, RouterId),
    DuplicateLink(RouterId, RouterId),
    InvalidPacketType(u8),
    // Simulation
    UnknownLink(RouterId, RouterId),
    Engine(RouterId, holo_mtospf::error::Error),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::ConfigRead(path, error) => {
                warn!(%path, %error, "{}", self);
            }
            Error::ConfigParse(error) => {
                warn!(%error, "{}", self);
            }
            Error::DuplicateRouter(router_id)
            | Error::UnknownRouter(router_id) => {
                warn!(%router_id, "{}", self);
            }
            Error::InvalidLink(a, b)
            | Error::DuplicateLink(a, b)
            | Error::UnknownLink(a, b) => {
                warn!(%a, %b, "{}", self);
            }
            Error::InvalidPacketType(pkt_type) => {
                warn!(%pkt_type, "{}", self);
            }
            Error::Engine(router_id, error) => {
                warn_span!("router", id = %router_id).in_scope(|| {
                    error.log();
                })
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ConfigRead(..) => {
                write!(f, "failed to read configuration file")
            }
            Error::ConfigParse(..) => {
                write!(f, "failed to parse configuration file")
            }
            Error::DuplicateRouter(..) => {
                write!(f, "duplicate router")
            }
            Error::UnknownRouter(..) => {
                write!(f, "unknown router")
            }
            Error::InvalidLink(..) => {
                write!(f, "invalid link")
            }
            Error::DuplicateLink(..) => {
                write!(f, "duplicate link")
            }
            Error::InvalidPacketType(..) => {
                write!(f, "invalid packet type")
            }
            Error::UnknownLink(..) => {
                write!(f, "unknown link")
            }
            Error::Engine(_, error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ConfigRead(_, error) => Some(error),
            Error::ConfigParse(error) => Some(error),
            Error::Engine(_, error) => Some(error),
            _ => None,
        }
    }
}
