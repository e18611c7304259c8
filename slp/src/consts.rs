//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

// SLP protocol version.
pub const SLP_VERSION: u8 = 2;

// Administratively scoped SLP multicast group (RFC 2608).
pub const DEFAULT_MCAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 253);

// IANA-assigned SLP port.
pub const DEFAULT_MCAST_PORT: u16 = 427;

// Default administrative scope.
pub const DEFAULT_SCOPE: &str = "DEFAULT";

// Language tag carried in the common header.
pub const DEFAULT_LANGUAGE_TAG: &str = "en";

// Lifetime value denoting a registration that never expires.
pub const LIFETIME_PERMANENT: u16 = 65535;

// Interval between lease sweeps in the directory agent.
pub const SWEEP_INTERVAL: Duration = Duration::from_millis(500);

// How long the client waits for a reply on a single interface.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(1);

// Aggregate budget for a fanned-out request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
