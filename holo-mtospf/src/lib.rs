//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![cfg_attr(
    feature = "testing",
    allow(dead_code, unused_variables, unused_imports)
)]

pub mod collections;
pub mod debug;
pub mod error;
pub mod events;
pub mod flood;
pub mod instance;
pub mod lsdb;
pub mod message;
pub mod neighbor;
pub mod node;
pub mod output;
pub mod packet;
pub mod spf;
pub mod tasks;
