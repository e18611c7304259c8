//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, SocketAddr};

use tracing::{debug, debug_span};

use crate::packet::{FunctionId, Pdu};

// SLP debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    DaemonStart,
    DaemonStop,
    InterfaceStart(&'a Ipv4Addr),
    PduRx(&'a Ipv4Addr, &'a SocketAddr, &'a Pdu),
    PduTx(&'a Ipv4Addr, &'a SocketAddr, &'a Pdu),
    PduUnexpected(&'a Ipv4Addr, FunctionId),
    ScopeMismatch(&'a Ipv4Addr, &'a str),
    RegistrationExpire(&'a Ipv4Addr, &'a str),
    ClientPduTx(&'a Ipv4Addr, &'a Pdu),
    ClientPduRx(&'a Ipv4Addr, &'a SocketAddr, &'a Pdu),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::DaemonStart | Debug::DaemonStop => {
                debug!("{}", self);
            }
            Debug::InterfaceStart(address) => {
                debug!(%address, "{}", self);
            }
            Debug::PduRx(interface, source, pdu) => {
                debug_span!("network").in_scope(|| {
                    debug_span!("input", %interface, %source).in_scope(|| {
                        let data = serde_json::to_string(&pdu).unwrap();
                        debug!(%data, "{}", self);
                    });
                });
            }
            Debug::PduTx(interface, destination, pdu) => {
                debug_span!("network").in_scope(|| {
                    debug_span!("output", %interface, %destination).in_scope(
                        || {
                            let data = serde_json::to_string(&pdu).unwrap();
                            debug!(%data, "{}", self);
                        },
                    );
                });
            }
            Debug::PduUnexpected(interface, function_id) => {
                debug!(%interface, ?function_id, "{}", self);
            }
            Debug::ScopeMismatch(interface, scope_list) => {
                debug!(%interface, %scope_list, "{}", self);
            }
            Debug::RegistrationExpire(interface, url) => {
                debug!(%interface, %url, "{}", self);
            }
            Debug::ClientPduTx(interface, pdu) => {
                debug_span!("client").in_scope(|| {
                    let data = serde_json::to_string(&pdu).unwrap();
                    debug!(%interface, %data, "{}", self);
                });
            }
            Debug::ClientPduRx(interface, source, pdu) => {
                debug_span!("client").in_scope(|| {
                    let data = serde_json::to_string(&pdu).unwrap();
                    debug!(%interface, %source, %data, "{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::DaemonStart => {
                write!(f, "starting daemon")
            }
            Debug::DaemonStop => {
                write!(f, "stopping daemon")
            }
            Debug::InterfaceStart(..) => {
                write!(f, "starting interface")
            }
            Debug::PduRx(..) | Debug::PduTx(..) => {
                write!(f, "pdu")
            }
            Debug::PduUnexpected(..) => {
                write!(f, "unexpected function ID")
            }
            Debug::ScopeMismatch(..) => {
                write!(f, "scope mismatch")
            }
            Debug::RegistrationExpire(..) => {
                write!(f, "registration expired")
            }
            Debug::ClientPduTx(..) | Debug::ClientPduRx(..) => {
                write!(f, "pdu")
            }
        }
    }
}
