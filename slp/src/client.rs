//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, SocketAddr};

use slp_utils::task::Task;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout, timeout_at};

use crate::config::ClientConfig;
use crate::consts::{REPLY_TIMEOUT, REQUEST_TIMEOUT};
use crate::debug::Debug;
use crate::error::{Error, IoError};
use crate::network;
use crate::packet::{
    self, AttrRqst, FunctionId, Pdu, SrvDereg, SrvReg, SrvRqst, UrlEntry,
};

// A user/service agent handle.
#[derive(Clone, Debug)]
pub struct Client {
    config: ClientConfig,
}

// ===== impl Client =====

impl Client {
    pub fn new(config: ClientConfig) -> Client {
        Client { config }
    }

    // Register a service URL with the directory agents reachable through
    // the configured interfaces.
    pub async fn register(
        &self,
        service_type: &str,
        url: &str,
        attr_list: &str,
        lifetime: u16,
    ) -> Result<(), Error> {
        let pdu = Pdu::SrvReg(SrvReg::new(
            UrlEntry::new(lifetime, url.to_owned()),
            service_type.to_owned(),
            self.config.scope.clone(),
            attr_list.to_owned(),
        ));
        self.send_all(pdu, FunctionId::SrvAck).await?;

        Ok(())
    }

    // Deregister a service URL.
    pub async fn deregister(&self, url: &str) -> Result<(), Error> {
        let pdu = Pdu::SrvDereg(SrvDereg::new(
            self.config.scope.clone(),
            UrlEntry::new(0, url.to_owned()),
        ));
        self.send_all(pdu, FunctionId::SrvAck).await?;

        Ok(())
    }

    // Find the URLs registered under the given service type. Returns one
    // URL list per responding interface, alongside the list of interfaces
    // that responded. Fails only if no interface responded at all.
    pub async fn find_srvs(
        &self,
        service_type: &str,
    ) -> Result<(Vec<Vec<String>>, Vec<Ipv4Addr>), Error> {
        let pdu = Pdu::SrvRqst(SrvRqst::new(
            service_type.to_owned(),
            self.config.scope.clone(),
        ));

        let mut url_lists = vec![];
        let mut responders = vec![];
        for ifaddr in &self.config.ip_addrs {
            match self
                .send_one(*ifaddr, pdu.clone(), FunctionId::SrvRply)
                .await
            {
                Ok(Pdu::SrvRply(rply)) if rply.error_code == 0 => {
                    url_lists.push(
                        rply.url_entries
                            .into_iter()
                            .map(|entry| entry.url)
                            .collect(),
                    );
                    responders.push(*ifaddr);
                }
                Ok(_) => (),
                Err(error) => error.log(),
            }
        }

        if responders.is_empty() {
            return Err(Error::Internal);
        }

        Ok((url_lists, responders))
    }

    // Find the attribute list registered for the given URL, trying the
    // candidate interfaces in order (defaulting to the configured list).
    // Returns the first non-empty attribute list; `None` when every
    // responding interface answered with an empty one.
    pub async fn find_attrs(
        &self,
        url: &str,
        ip_addrs: Option<&[Ipv4Addr]>,
    ) -> Result<Option<String>, Error> {
        let pdu = Pdu::AttrRqst(AttrRqst::new(
            url.to_owned(),
            self.config.scope.clone(),
        ));

        let candidates = ip_addrs.unwrap_or(&self.config.ip_addrs);
        let mut responded = false;
        for ifaddr in candidates {
            match self
                .send_one(*ifaddr, pdu.clone(), FunctionId::AttrRply)
                .await
            {
                Ok(Pdu::AttrRply(rply)) if rply.error_code == 0 => {
                    responded = true;
                    if !rply.attr_list.is_empty() {
                        return Ok(Some(rply.attr_list));
                    }
                }
                Ok(_) => (),
                Err(error) => error.log(),
            }
        }

        if !responded {
            return Err(Error::Internal);
        }

        Ok(None)
    }

    // Transmit the PDU on every configured interface in parallel and
    // return the first reply carrying error code zero. The remaining
    // per-interface waits are cancelled (their task handles are dropped,
    // which also closes their sockets). If nothing succeeds, the last
    // observed non-zero error code is surfaced; if nothing usable arrived
    // at all within the request budget, the whole operation failed.
    async fn send_all(
        &self,
        pdu: Pdu,
        expected: FunctionId,
    ) -> Result<Pdu, Error> {
        let (resultp, mut resultc) =
            mpsc::channel(self.config.ip_addrs.len().max(1));

        let mut send_tasks = vec![];
        for ifaddr in self.config.ip_addrs.clone() {
            let client = self.clone();
            let pdu = pdu.clone();
            let resultp = resultp.clone();
            send_tasks.push(Task::spawn(async move {
                let result = client.send_one(ifaddr, pdu, expected).await;
                let _ = resultp.send(result).await;
            }));
        }
        drop(resultp);

        let mut last_error_code = None;
        let deadline = Instant::now() + REQUEST_TIMEOUT;
        loop {
            match timeout_at(deadline, resultc.recv()).await {
                // Request budget exhausted.
                Err(_) => break,
                // All per-interface sends finished.
                Ok(None) => break,
                Ok(Some(Ok(reply))) => {
                    let error_code = reply_error_code(&reply);
                    if error_code == 0 {
                        return Ok(reply);
                    }
                    last_error_code = Some(error_code);
                }
                Ok(Some(Err(error))) => error.log(),
            }
        }

        match last_error_code {
            Some(error_code) => Err(Error::Slp(error_code)),
            None => Err(Error::Internal),
        }
    }

    // Transmit the PDU on a single interface and wait for the reply.
    async fn send_one(
        &self,
        ifaddr: Ipv4Addr,
        pdu: Pdu,
        expected: FunctionId,
    ) -> Result<Pdu, Error> {
        // A fresh socket per transmission; it is closed on every exit
        // path when the handle drops.
        let socket = network::sender(&ifaddr)
            .map_err(|error| Error::InterfaceError(ifaddr, error))?;

        let xid = packet::generate_xid();
        let dst =
            SocketAddr::from((self.config.mcast_group, self.config.mcast_port));
        network::send_pdu(&socket, &pdu, xid, dst)
            .await
            .map_err(|error| Error::InterfaceError(ifaddr, error))?;
        Debug::ClientPduTx(&ifaddr, &pdu).log();

        // Wait for the first reply of the expected type. Replies are
        // correlated by function ID only, which is safe because every
        // transmission uses a fresh ephemeral-port socket; multiplexing
        // several outstanding requests on one socket would require
        // XID-based correlation instead.
        timeout(REPLY_TIMEOUT, async {
            let mut buf = [0; 16384];
            loop {
                let (num_bytes, src) = match socket.recv_from(&mut buf).await {
                    Ok((num_bytes, src)) => (num_bytes, src),
                    Err(error) => {
                        IoError::UdpRecvError(error).log();
                        continue;
                    }
                };

                match Pdu::decode(&buf[0..num_bytes]) {
                    Ok((_, pdu)) if pdu.function_id() == expected => {
                        Debug::ClientPduRx(&ifaddr, &src, &pdu).log();
                        break pdu;
                    }
                    // Stray datagrams (including our own multicast) are
                    // ignored.
                    Ok(_) => continue,
                    Err(error) => {
                        Error::PduDecodeError(src, error).log();
                        continue;
                    }
                }
            }
        })
        .await
        .map_err(|_| Error::Internal)
    }
}

// ===== helper functions =====

fn reply_error_code(pdu: &Pdu) -> u16 {
    match pdu {
        Pdu::SrvRply(rply) => rply.error_code,
        Pdu::SrvAck(ack) => ack.error_code,
        Pdu::AttrRply(rply) => rply.error_code,
        Pdu::SrvRqst(_) | Pdu::SrvReg(_) | Pdu::SrvDereg(_)
        | Pdu::AttrRqst(_) => 0,
    }
}
