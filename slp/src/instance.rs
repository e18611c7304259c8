//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;

use slp_utils::socket::UdpSocket;
use slp_utils::task::{IntervalTask, Task};
use tokio::sync::mpsc;

use crate::config::DaemonConfig;
use crate::debug::Debug;
use crate::error::Error;
use crate::events;
use crate::network;
use crate::registry::Registry;
use crate::tasks;
use crate::tasks::messages::input::UdpRxPduMsg;

// A directory-agent instance.
//
// The daemon is a handle to a set of cooperating tasks: one receive loop
// per listener interface, the lease sweeper, and the main event loop that
// owns all mutable state. Dropping the handle (or calling [`Daemon::close`])
// aborts the whole set and closes every socket.
#[derive(Debug)]
pub struct Daemon {
    _main_task: Task<()>,
}

// Listener state for a single interface.
#[derive(Debug)]
struct Interface {
    socket: Arc<UdpSocket>,
    _udp_rx_task: Task<()>,
}

#[derive(Debug)]
struct DaemonState {
    scope: String,
    interfaces: BTreeMap<Ipv4Addr, Interface>,
    registry: Registry,
    _sweeper: IntervalTask,
}

// ===== impl Daemon =====

impl Daemon {
    // Start the directory agent: bring up one joined listener per
    // configured interface, the lease sweeper and the main event loop.
    pub async fn start(config: DaemonConfig) -> Result<Daemon, Error> {
        Debug::DaemonStart.log();

        let (udp_pdu_rxp, mut udp_pdu_rxc) = mpsc::channel(4);
        let (sweepp, mut sweepc) = mpsc::channel(4);

        let mut interfaces = BTreeMap::new();
        let mut registry = Registry::default();
        for ifaddr in &config.ip_addrs {
            let socket =
                network::listener(ifaddr, config.mcast_port, &config.mcast_group)
                    .map_err(|error| {
                        Error::InterfaceStartError(*ifaddr, error)
                    })?;
            let socket = Arc::new(socket);
            let udp_rx_task = tasks::udp_rx(&socket, *ifaddr, &udp_pdu_rxp);
            interfaces.insert(
                *ifaddr,
                Interface {
                    socket,
                    _udp_rx_task: udp_rx_task,
                },
            );
            registry.add_interface(*ifaddr);
            Debug::InterfaceStart(ifaddr).log();
        }

        let sweeper = tasks::sweep_interval(&sweepp);
        let mut state = DaemonState {
            scope: config.scope,
            interfaces,
            registry,
            _sweeper: sweeper,
        };

        // Main event loop. All registry mutation happens here, serialized
        // by the loop.
        let main_task = Task::spawn(async move {
            loop {
                tokio::select! {
                    Some(msg) = udp_pdu_rxc.recv() => {
                        state.process_pdu_msg(msg).await;
                    }
                    Some(_) = sweepc.recv() => {
                        state.process_sweep();
                    }
                    else => break,
                }
            }
        });

        Ok(Daemon {
            _main_task: main_task,
        })
    }

    // Shut the daemon down: the sweeper exits and all listener sockets
    // are closed.
    pub fn close(self) {
        Debug::DaemonStop.log();
    }
}

// ===== impl DaemonState =====

impl DaemonState {
    async fn process_pdu_msg(&mut self, msg: UdpRxPduMsg) {
        let UdpRxPduMsg { ifaddr, src, pdu } = msg;

        let (hdr, pdu) = match pdu {
            Ok((hdr, pdu)) => (hdr, pdu),
            Err(error) => {
                // Malformed datagrams are dropped without a reply.
                Error::PduDecodeError(src, error).log();
                return;
            }
        };
        Debug::PduRx(&ifaddr, &src, &pdu).log();

        let Some(iface) = self.interfaces.get(&ifaddr) else {
            return;
        };

        if let Some(reply) =
            events::process_pdu(&mut self.registry, &self.scope, ifaddr, pdu)
        {
            // Reply unicast through the listener socket the request
            // arrived on, reusing the request's XID.
            Debug::PduTx(&ifaddr, &src, &reply).log();
            if let Err(error) =
                network::send_pdu(&iface.socket, &reply, hdr.xid, src).await
            {
                error.log();
            }
        }
    }

    fn process_sweep(&mut self) {
        for (ifaddr, url) in self.registry.sweep(Instant::now()) {
            Debug::RegistrationExpire(&ifaddr, &url).log();
        }
    }
}
