//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use slp_utils::socket::{SocketExt, UdpSocket, UdpSocketExt};
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::SendError;

use crate::error::IoError;
use crate::packet::Pdu;
use crate::tasks::messages::input::UdpRxPduMsg;

// ===== global functions =====

// Create a UDP socket bound to the SLP port and joined to the multicast
// group on the given interface.
pub(crate) fn listener(
    ifaddr: &Ipv4Addr,
    port: u16,
    group: &Ipv4Addr,
) -> Result<UdpSocket, IoError> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let socket =
        UdpSocket::bind_reuseaddr(addr).map_err(IoError::UdpSocketError)?;
    socket
        .join_multicast_ifaddr_v4(group, ifaddr)
        .map_err(IoError::UdpMulticastJoinError)?;

    Ok(socket)
}

// Create a UDP socket bound to the given interface, with the outgoing
// multicast interface pinned to it. The unicast replies addressed to the
// socket's ephemeral port are received on this same socket.
pub(crate) fn sender(ifaddr: &Ipv4Addr) -> Result<UdpSocket, IoError> {
    let addr = SocketAddr::from((*ifaddr, 0));
    let socket =
        UdpSocket::bind_reuseaddr(addr).map_err(IoError::UdpSocketError)?;
    socket
        .set_multicast_ifaddr_v4(ifaddr)
        .map_err(IoError::UdpSocketError)?;

    Ok(socket)
}

pub(crate) async fn send_pdu(
    socket: &UdpSocket,
    pdu: &Pdu,
    xid: u16,
    dst: SocketAddr,
) -> Result<(), IoError> {
    // Encode PDU.
    let buf = pdu.encode(xid);

    // Send packet.
    socket
        .send_to(&buf, dst)
        .await
        .map_err(IoError::UdpSendError)?;

    Ok(())
}

pub(crate) async fn read_loop(
    socket: Arc<UdpSocket>,
    ifaddr: Ipv4Addr,
    udp_pdu_rxp: Sender<UdpRxPduMsg>,
) -> Result<(), SendError<UdpRxPduMsg>> {
    let mut buf = [0; 16384];

    loop {
        // Receive data from the network.
        let (num_bytes, src) = match socket.recv_from(&mut buf).await {
            Ok((num_bytes, src)) => (num_bytes, src),
            Err(error) => {
                IoError::UdpRecvError(error).log();
                continue;
            }
        };

        // Decode packet.
        let pdu = Pdu::decode(&buf[0..num_bytes]);
        let msg = UdpRxPduMsg { ifaddr, src, pdu };
        udp_pdu_rxp.send(msg).await?;
    }
}
