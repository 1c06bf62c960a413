//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod config;
pub mod error;
pub mod network;
pub mod node;
