//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use std::path::Path;

use holo_mtospf::instance::InstanceCfg;
use holo_mtospf::packet::lsa::LinkStatus;
use holo_mtospf::packet::{MtId, RouterId};
use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub logging: Logging,
    pub simulation: Simulation,
    pub engine: InstanceCfg,
    pub routers: Vec<Router>,
    pub links: Vec<Link>,
    pub events: Vec<ScheduledAction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub stdout: LoggingStdout,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingStdout {
    pub enabled: bool,
    #[serde(flatten)]
    pub fmt: LoggingFmt,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingFmt {
    pub style: LoggingFmtStyle,
    pub colors: bool,
    pub show_source: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFmtStyle {
    Compact,
    Full,
    Json,
    Pretty,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Simulation {
    // Simulated time, in seconds.
    pub duration: u64,
    // Hello interval, in seconds.
    pub hello_interval: u16,
    // Router dead interval, in seconds.
    pub dead_interval: u32,
    // Number of topologies in addition to MT-ID 0.
    pub mt_count: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Router {
    pub id: RouterId,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub a: RouterId,
    pub b: RouterId,
    // One-way delay, in milliseconds.
    #[serde(default = "Link::default_delay")]
    pub delay_ms: u64,
    // Metric of each topology, indexed by MT-ID.
    pub costs: Vec<u32>,
    #[serde(default)]
    pub status: LinkStatus,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduledAction {
    // Simulated time, in milliseconds.
    pub at_ms: u64,
    pub action: Action,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum Action {
    LinkDown {
        a: RouterId,
        b: RouterId,
    },
    LinkUp {
        a: RouterId,
        b: RouterId,
    },
    CostChange {
        a: RouterId,
        b: RouterId,
        mt_id: MtId,
        metric: u32,
    },
    // Drops the next `count` packets sent from `src` to `dst`, optionally
    // only those of the given packet type code.
    DropPackets {
        src: RouterId,
        dst: RouterId,
        pkt_type: Option<u8>,
        count: usize,
    },
}

// ===== impl Config =====

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path).map_err(|error| {
            Error::ConfigRead(path.display().to_string(), error)
        })?;
        Config::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Config, Error> {
        toml::from_str(config_str).map_err(Error::ConfigParse)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            logging: Default::default(),
            simulation: Default::default(),
            engine: Default::default(),
            routers: vec![],
            links: vec![],
            events: vec![],
        }
    }
}

// ===== impl LoggingStdout =====

impl Default for LoggingStdout {
    fn default() -> LoggingStdout {
        LoggingStdout {
            enabled: true,
            fmt: Default::default(),
        }
    }
}

// ===== impl LoggingFmt =====

impl Default for LoggingFmt {
    fn default() -> LoggingFmt {
        LoggingFmt {
            style: LoggingFmtStyle::Compact,
            colors: false,
            show_source: false,
        }
    }
}

// ===== impl Simulation =====

impl Default for Simulation {
    fn default() -> Simulation {
        Simulation {
            duration: 120,
            hello_interval: 10,
            dead_interval: 40,
            mt_count: 0,
        }
    }
}

// ===== impl Link =====

impl Link {
    fn default_delay() -> u64 {
        1
    }
}
