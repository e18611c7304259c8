//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::sync::Arc;

use slp_utils::socket::UdpSocket;
use slp_utils::task::{IntervalTask, Task};
use tokio::sync::mpsc::Sender;
use tracing::{Instrument, debug_span};

use crate::consts::SWEEP_INTERVAL;
use crate::network;

//
// Daemon tasks diagram:
//
//                       +--------------+
//        udp_rx (Nx) -> |              |
//                       |    daemon    | -> (Nx) unicast replies
//  sweep_interval (1x)->|              |
//                       +--------------+
//
// Each listener interface runs its own receive task; replies are sent
// inline by the main event loop through the listener socket the request
// arrived on.
//

// Inter-task message types.
pub mod messages {
    // Input messages (child task -> main task).
    pub mod input {
        use std::net::{Ipv4Addr, SocketAddr};

        use serde::{Deserialize, Serialize};

        use crate::packet::{DecodeError, Pdu, PduHdr};

        #[derive(Debug, Deserialize, Serialize)]
        pub struct UdpRxPduMsg {
            pub ifaddr: Ipv4Addr,
            pub src: SocketAddr,
            pub pdu: Result<(PduHdr, Pdu), DecodeError>,
        }

        #[derive(Debug, Deserialize, Serialize)]
        pub struct SweepMsg {}
    }
}

// ===== daemon tasks =====

// UDP Rx task.
pub(crate) fn udp_rx(
    socket: &Arc<UdpSocket>,
    ifaddr: Ipv4Addr,
    udp_pdu_rxp: &Sender<messages::input::UdpRxPduMsg>,
) -> Task<()> {
    let span1 = debug_span!("network");
    let _span1_guard = span1.enter();
    let span2 = debug_span!("input");
    let _span2_guard = span2.enter();

    let socket = socket.clone();
    let udp_pdu_rxp = udp_pdu_rxp.clone();

    Task::spawn_supervised(move || {
        let socket = socket.clone();
        let udp_pdu_rxp = udp_pdu_rxp.clone();
        async move {
            let _ = network::read_loop(socket, ifaddr, udp_pdu_rxp).await;
        }
        .in_current_span()
    })
}

// Lease sweep interval.
pub(crate) fn sweep_interval(
    sweepp: &Sender<messages::input::SweepMsg>,
) -> IntervalTask {
    let sweepp = sweepp.clone();
    IntervalTask::new(SWEEP_INTERVAL, false, move || {
        let sweepp = sweepp.clone();
        async move {
            let msg = messages::input::SweepMsg {};
            let _ = sweepp.send(msg).await;
        }
    })
}
