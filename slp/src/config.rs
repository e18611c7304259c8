//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use serde::Deserialize;

use crate::consts::{DEFAULT_MCAST_GROUP, DEFAULT_MCAST_PORT, DEFAULT_SCOPE};

// Directory agent configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    // Local addresses to bind and join the multicast group on.
    pub ip_addrs: Vec<Ipv4Addr>,
    pub mcast_group: Ipv4Addr,
    pub mcast_port: u16,
    pub scope: String,
}

// User/service agent configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    // Local addresses to send requests through.
    pub ip_addrs: Vec<Ipv4Addr>,
    pub mcast_group: Ipv4Addr,
    pub mcast_port: u16,
    pub scope: String,
}

// ===== impl DaemonConfig =====

impl Default for DaemonConfig {
    fn default() -> DaemonConfig {
        DaemonConfig {
            ip_addrs: vec![],
            mcast_group: DEFAULT_MCAST_GROUP,
            mcast_port: DEFAULT_MCAST_PORT,
            scope: DEFAULT_SCOPE.to_owned(),
        }
    }
}

// ===== impl ClientConfig =====

impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig {
            ip_addrs: vec![],
            mcast_group: DEFAULT_MCAST_GROUP,
            mcast_port: DEFAULT_MCAST_PORT,
            scope: DEFAULT_SCOPE.to_owned(),
        }
    }
}
