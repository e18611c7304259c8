//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use enum_as_inner::EnumAsInner;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use serde::{Deserialize, Serialize};
use slp_utils::bytes::{BytesExt, BytesMutExt, TLS_BUF};
use uuid::Uuid;

use crate::consts::{DEFAULT_LANGUAGE_TAG, SLP_VERSION};

//
// The SLPv2 common header format is:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |    Version    |  Function-ID  |            Length             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// | Length, contd.|O|F|R|       reserved          |Next Ext Offset|
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  Next Extension Offset, contd.|              XID              |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |      Language Tag Length      |         Language Tag          \
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// The next-extension offset is always written as zero (extensions are not
// supported).
//

// SLP function IDs (the restricted profile implemented here).
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum FunctionId {
    SrvRqst = 1,
    SrvRply = 2,
    SrvReg = 3,
    SrvDereg = 4,
    SrvAck = 5,
    AttrRqst = 6,
    AttrRply = 7,
}

bitflags! {
    // Header flags byte.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct PduFlags: u8 {
        const FRESH = 0x40;
    }
}

// SLP common header.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct PduHdr {
    pub function_id: FunctionId,
    pub flags: PduFlags,
    pub xid: u16,
    #[new(value = "DEFAULT_LANGUAGE_TAG.to_owned()")]
    pub language_tag: String,
}

//
// The URL entry format is:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |   Reserved    |          Lifetime             |   URL Length  |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |URL len, contd.|            URL (variable length)              \
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |# of URL auths |            Auth. blocks (if any)              \
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct UrlEntry {
    pub lifetime: u16,
    pub url: String,
}

// SLP message, one variant per function ID.
#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Pdu {
    SrvRqst(SrvRqst),
    SrvRply(SrvRply),
    SrvReg(SrvReg),
    SrvDereg(SrvDereg),
    SrvAck(SrvAck),
    AttrRqst(AttrRqst),
    AttrRply(AttrRply),
}

// Service request: previous responders, service type, scope list,
// predicate and SPI, all length-prefixed. Only the service type and the
// scope list are meaningful here; the other strings are always empty.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct SrvRqst {
    pub service_type: String,
    pub scope_list: String,
}

// Service reply: error code plus the matching URL entries.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct SrvRply {
    pub error_code: u16,
    pub url_entries: Vec<UrlEntry>,
}

// Service registration: URL entry followed by service type, scope list
// and attribute list. The attribute-authenticator count is always zero.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct SrvReg {
    pub url_entry: UrlEntry,
    pub service_type: String,
    pub scope_list: String,
    pub attr_list: String,
}

// Service deregistration: scope list, URL entry and an empty tag list.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct SrvDereg {
    pub scope_list: String,
    pub url_entry: UrlEntry,
}

// Service acknowledgement.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct SrvAck {
    pub error_code: u16,
}

// Attribute request: previous responders, URL, scope list, tag list and
// SPI, all length-prefixed. Only the URL and the scope list are
// meaningful here.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct AttrRqst {
    pub url: String,
    pub scope_list: String,
}

// Attribute reply: error code plus the attribute list. The
// attribute-authenticator count is always zero.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct AttrRply {
    pub error_code: u16,
    pub attr_list: String,
}

// SLP decode errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum DecodeError {
    IncompletePdu,
    InvalidVersion(u8),
    InvalidFunctionId(u8),
    InvalidLength(u32),
    InvalidString,
}

// Type aliases.
pub type DecodeResult<T> = Result<T, DecodeError>;

// ===== impl PduHdr =====

impl PduHdr {
    pub const BASE_LENGTH: usize = 14;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(SLP_VERSION);
        buf.put_u8(self.function_id as u8);
        // The length field is rewritten once the body has been encoded.
        buf.put_u24(0);
        buf.put_u8(self.flags.bits());
        // Reserved flag bits and next-extension offset.
        buf.put_u8(0);
        buf.put_u24(0);
        buf.put_u16(self.xid);
        buf.put_u16(self.language_tag.len() as u16);
        buf.put_slice(self.language_tag.as_bytes());
    }

    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let buf_size = buf.len();
        if buf_size < Self::BASE_LENGTH {
            return Err(DecodeError::IncompletePdu);
        }

        // Parse and validate the SLP version.
        let version = buf.get_u8();
        if version != SLP_VERSION {
            return Err(DecodeError::InvalidVersion(version));
        }

        // Parse and validate the function ID.
        let function_id = buf.get_u8();
        let function_id = FunctionId::from_u8(function_id)
            .ok_or(DecodeError::InvalidFunctionId(function_id))?;

        // Parse and validate the total length. Trailing bytes beyond the
        // declared length are tolerated and ignored.
        let length = buf.get_u24();
        if length as usize > buf_size {
            return Err(DecodeError::InvalidLength(length));
        }

        let flags = PduFlags::from_bits_truncate(buf.get_u8());

        // Ignore the reserved flag bits and the next-extension offset.
        let _ = buf.get_u8();
        let _ = buf.get_u24();

        let xid = buf.get_u16();
        let language_tag = get_string(buf)?;

        Ok(PduHdr {
            function_id,
            flags,
            xid,
            language_tag,
        })
    }
}

// ===== impl UrlEntry =====

impl UrlEntry {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        // Reserved.
        buf.put_u8(0);
        buf.put_u16(self.lifetime);
        put_string(buf, &self.url);
        // URL authenticator count; authenticators are never generated.
        buf.put_u8(0);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        // Reserved.
        let _ = get_u8(buf)?;
        let lifetime = get_u16(buf)?;
        let url = get_string(buf)?;

        // Authenticators are recognized but not decoded; skip their
        // advertised bytes.
        let auth_length = get_u8(buf)? as usize;
        if buf.remaining() < auth_length {
            return Err(DecodeError::IncompletePdu);
        }
        buf.advance(auth_length);

        Ok(UrlEntry { lifetime, url })
    }
}

// ===== impl Pdu =====

impl Pdu {
    // Return the function ID of this message.
    pub fn function_id(&self) -> FunctionId {
        match self {
            Pdu::SrvRqst(_) => FunctionId::SrvRqst,
            Pdu::SrvRply(_) => FunctionId::SrvRply,
            Pdu::SrvReg(_) => FunctionId::SrvReg,
            Pdu::SrvDereg(_) => FunctionId::SrvDereg,
            Pdu::SrvAck(_) => FunctionId::SrvAck,
            Pdu::AttrRqst(_) => FunctionId::AttrRqst,
            Pdu::AttrRply(_) => FunctionId::AttrRply,
        }
    }

    // Return the header flags of this message. Requests and fresh
    // registrations carry the FRESH bit; replies and acknowledgements
    // carry none.
    pub fn flags(&self) -> PduFlags {
        match self {
            Pdu::SrvRqst(_) | Pdu::SrvReg(_) | Pdu::AttrRqst(_) => {
                PduFlags::FRESH
            }
            Pdu::SrvRply(_)
            | Pdu::SrvDereg(_)
            | Pdu::SrvAck(_)
            | Pdu::AttrRply(_) => PduFlags::empty(),
        }
    }

    // Encode the message into a bytes buffer, with the common header
    // carrying the given transaction ID.
    pub fn encode(&self, xid: u16) -> BytesMut {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();

            // Encode common header.
            let hdr = PduHdr::new(self.function_id(), self.flags(), xid);
            hdr.encode(&mut buf);

            // Encode function-specific body.
            match self {
                Pdu::SrvRqst(pdu) => pdu.encode(&mut buf),
                Pdu::SrvRply(pdu) => pdu.encode(&mut buf),
                Pdu::SrvReg(pdu) => pdu.encode(&mut buf),
                Pdu::SrvDereg(pdu) => pdu.encode(&mut buf),
                Pdu::SrvAck(pdu) => pdu.encode(&mut buf),
                Pdu::AttrRqst(pdu) => pdu.encode(&mut buf),
                Pdu::AttrRply(pdu) => pdu.encode(&mut buf),
            }

            // Rewrite the length field now that the total size is known.
            let length = buf.len() as u32;
            buf[2..5].copy_from_slice(&length.to_be_bytes()[1..=3]);

            buf.clone()
        })
    }

    // Decode a message from a bytes buffer, returning the common header
    // alongside the body.
    pub fn decode(data: &[u8]) -> DecodeResult<(PduHdr, Pdu)> {
        let mut buf = Bytes::copy_from_slice(data);

        let hdr = PduHdr::decode(&mut buf)?;
        let pdu = match hdr.function_id {
            FunctionId::SrvRqst => Pdu::SrvRqst(SrvRqst::decode(&mut buf)?),
            FunctionId::SrvRply => Pdu::SrvRply(SrvRply::decode(&mut buf)?),
            FunctionId::SrvReg => Pdu::SrvReg(SrvReg::decode(&mut buf)?),
            FunctionId::SrvDereg => Pdu::SrvDereg(SrvDereg::decode(&mut buf)?),
            FunctionId::SrvAck => Pdu::SrvAck(SrvAck::decode(&mut buf)?),
            FunctionId::AttrRqst => Pdu::AttrRqst(AttrRqst::decode(&mut buf)?),
            FunctionId::AttrRply => Pdu::AttrRply(AttrRply::decode(&mut buf)?),
        };

        Ok((hdr, pdu))
    }
}

// ===== impl SrvRqst =====

impl SrvRqst {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        // Previous responders.
        put_string(buf, "");
        put_string(buf, &self.service_type);
        put_string(buf, &self.scope_list);
        // Predicate and SLP SPI.
        put_string(buf, "");
        put_string(buf, "");
    }

    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let _prev_responders = get_string(buf)?;
        let service_type = get_string(buf)?;
        let scope_list = get_string(buf)?;
        let _predicate = get_string(buf)?;
        let _spi = get_string(buf)?;

        Ok(SrvRqst {
            service_type,
            scope_list,
        })
    }
}

// ===== impl SrvRply =====

impl SrvRply {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.error_code);
        buf.put_u16(self.url_entries.len() as u16);
        for url_entry in &self.url_entries {
            url_entry.encode(buf);
        }
    }

    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let error_code = get_u16(buf)?;
        let url_entry_count = get_u16(buf)?;
        let mut url_entries = vec![];
        for _ in 0..url_entry_count {
            url_entries.push(UrlEntry::decode(buf)?);
        }

        Ok(SrvRply {
            error_code,
            url_entries,
        })
    }
}

// ===== impl SrvReg =====

impl SrvReg {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        self.url_entry.encode(buf);
        put_string(buf, &self.service_type);
        put_string(buf, &self.scope_list);
        put_string(buf, &self.attr_list);
        // Attribute authenticator count.
        buf.put_u8(0);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let url_entry = UrlEntry::decode(buf)?;
        let service_type = get_string(buf)?;
        let scope_list = get_string(buf)?;
        let attr_list = get_string(buf)?;

        Ok(SrvReg {
            url_entry,
            service_type,
            scope_list,
            attr_list,
        })
    }
}

// ===== impl SrvDereg =====

impl SrvDereg {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        put_string(buf, &self.scope_list);
        self.url_entry.encode(buf);
        // Tag list (empty).
        buf.put_u16(0);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let scope_list = get_string(buf)?;
        let url_entry = UrlEntry::decode(buf)?;

        Ok(SrvDereg {
            scope_list,
            url_entry,
        })
    }
}

// ===== impl SrvAck =====

impl SrvAck {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.error_code);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let error_code = get_u16(buf)?;

        Ok(SrvAck { error_code })
    }
}

// ===== impl AttrRqst =====

impl AttrRqst {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        // Previous responders.
        put_string(buf, "");
        put_string(buf, &self.url);
        put_string(buf, &self.scope_list);
        // Tag list and SLP SPI.
        put_string(buf, "");
        put_string(buf, "");
    }

    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let _prev_responders = get_string(buf)?;
        let url = get_string(buf)?;
        let scope_list = get_string(buf)?;
        let _tag_list = get_string(buf)?;
        let _spi = get_string(buf)?;

        Ok(AttrRqst { url, scope_list })
    }
}

// ===== impl AttrRply =====

impl AttrRply {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.error_code);
        put_string(buf, &self.attr_list);
        // Attribute authenticator count.
        buf.put_u8(0);
    }

    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let error_code = get_u16(buf)?;
        let attr_list = get_string(buf)?;

        Ok(AttrRply {
            error_code,
            attr_list,
        })
    }
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::IncompletePdu => {
                write!(f, "Incomplete PDU")
            }
            DecodeError::InvalidVersion(version) => {
                write!(f, "Invalid SLP version: {}", version)
            }
            DecodeError::InvalidFunctionId(function_id) => {
                write!(f, "Invalid SLP function ID: {}", function_id)
            }
            DecodeError::InvalidLength(length) => {
                write!(f, "Invalid length: {}", length)
            }
            DecodeError::InvalidString => {
                write!(f, "Invalid UTF-8 string")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

// ===== global functions =====

// Allocate a transaction ID from the clock-sequence bytes of a fresh
// time-based UUID.
pub fn generate_xid() -> u16 {
    let uuid = Uuid::now_v1(&[0u8; 6]);
    let bytes = uuid.as_bytes();
    u16::from_be_bytes([bytes[8], bytes[9]])
}

// ===== helper functions =====

fn get_u8(buf: &mut Bytes) -> DecodeResult<u8> {
    buf.try_get_u8().map_err(|_| DecodeError::IncompletePdu)
}

fn get_u16(buf: &mut Bytes) -> DecodeResult<u16> {
    buf.try_get_u16().map_err(|_| DecodeError::IncompletePdu)
}

fn get_string(buf: &mut Bytes) -> DecodeResult<String> {
    let length = get_u16(buf)? as usize;
    if buf.remaining() < length {
        return Err(DecodeError::IncompletePdu);
    }
    let bytes = buf.copy_to_bytes(length);
    String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidString)
}

fn put_string(buf: &mut BytesMut, value: &str) {
    buf.put_u16(value.len() as u16);
    buf.put_slice(value.as_bytes());
}
