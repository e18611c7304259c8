//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, SocketAddr};

use tracing::{error, warn};

use crate::packet::DecodeError;

// SLP errors.
#[derive(Debug)]
pub enum Error {
    IoError(IoError),
    PduDecodeError(SocketAddr, DecodeError),
    InterfaceError(Ipv4Addr, IoError),
    InterfaceStartError(Ipv4Addr, IoError),
    // Non-zero error code received from a peer.
    Slp(u16),
    // No usable reply within the request budget.
    Internal,
}

// SLP I/O errors.
#[derive(Debug)]
pub enum IoError {
    UdpSocketError(std::io::Error),
    UdpMulticastJoinError(std::io::Error),
    UdpRecvError(std::io::Error),
    UdpSendError(std::io::Error),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::IoError(error) => {
                error.log();
            }
            Error::PduDecodeError(source, error) => {
                warn!(%source, %error, "{}", self);
            }
            Error::InterfaceError(address, error)
            | Error::InterfaceStartError(address, error) => {
                error!(%address, error = %with_source(error), "{}", self);
            }
            Error::Slp(error_code) => {
                warn!(%error_code, "{}", self);
            }
            Error::Internal => {
                warn!("{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(error) => error.fmt(f),
            Error::PduDecodeError(..) => {
                write!(f, "failed to decode PDU")
            }
            Error::InterfaceError(..) => {
                write!(f, "interface failure")
            }
            Error::InterfaceStartError(..) => {
                write!(f, "failed to start interface")
            }
            Error::Slp(error_code) => {
                write!(f, "SLP error code: {}", error_code)
            }
            Error::Internal => {
                write!(f, "internal error")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(error) => Some(error),
            Error::PduDecodeError(_, error) => Some(error),
            Error::InterfaceError(_, error)
            | Error::InterfaceStartError(_, error) => Some(error),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

// ===== impl IoError =====

impl IoError {
    pub(crate) fn log(&self) {
        match self {
            IoError::UdpSocketError(error)
            | IoError::UdpMulticastJoinError(error)
            | IoError::UdpRecvError(error)
            | IoError::UdpSendError(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
        }
    }
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::UdpSocketError(..) => {
                write!(f, "failed to create UDP socket")
            }
            IoError::UdpMulticastJoinError(..) => {
                write!(f, "failed to join multicast group")
            }
            IoError::UdpRecvError(..) => {
                write!(f, "failed to receive UDP packet")
            }
            IoError::UdpSendError(..) => {
                write!(f, "failed to send UDP packet")
            }
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoError::UdpSocketError(error)
            | IoError::UdpMulticastJoinError(error)
            | IoError::UdpRecvError(error)
            | IoError::UdpSendError(error) => Some(error),
        }
    }
}

// ===== global functions =====

fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
