//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use crate::debug::Debug;
use crate::packet::{
    AttrRply, AttrRqst, Pdu, SrvAck, SrvDereg, SrvReg, SrvRply, SrvRqst,
};
use crate::registry::Registry;

// ===== PDU dispatch =====

// Process a PDU received on `ifaddr`, mutating the registry and returning
// the reply to send back to the source, if any.
//
// PDUs whose scope list differs from the daemon's configured scope are
// silently dropped, as are function IDs a directory agent never handles.
pub(crate) fn process_pdu(
    registry: &mut Registry,
    scope: &str,
    ifaddr: Ipv4Addr,
    pdu: Pdu,
) -> Option<Pdu> {
    let function_id = pdu.function_id();
    match pdu {
        Pdu::SrvRqst(pdu) => process_srv_rqst(registry, scope, ifaddr, pdu),
        Pdu::SrvReg(pdu) => process_srv_reg(registry, scope, ifaddr, pdu),
        Pdu::SrvDereg(pdu) => process_srv_dereg(registry, scope, ifaddr, pdu),
        Pdu::AttrRqst(pdu) => process_attr_rqst(registry, scope, ifaddr, pdu),
        // Replies and acknowledgements are never addressed to the daemon.
        Pdu::SrvRply(_) | Pdu::SrvAck(_) | Pdu::AttrRply(_) => {
            Debug::PduUnexpected(&ifaddr, function_id).log();
            None
        }
    }
}

fn process_srv_rqst(
    registry: &mut Registry,
    scope: &str,
    ifaddr: Ipv4Addr,
    pdu: SrvRqst,
) -> Option<Pdu> {
    if pdu.scope_list != scope {
        Debug::ScopeMismatch(&ifaddr, &pdu.scope_list).log();
        return None;
    }

    let url_entries = registry.find_urls(&ifaddr, &pdu.service_type);
    Some(Pdu::SrvRply(SrvRply::new(0, url_entries)))
}

fn process_srv_reg(
    registry: &mut Registry,
    scope: &str,
    ifaddr: Ipv4Addr,
    pdu: SrvReg,
) -> Option<Pdu> {
    if pdu.scope_list != scope {
        Debug::ScopeMismatch(&ifaddr, &pdu.scope_list).log();
        return None;
    }

    registry.register(
        ifaddr,
        pdu.service_type,
        pdu.scope_list,
        pdu.attr_list,
        pdu.url_entry.lifetime,
        pdu.url_entry.url,
    );
    Some(Pdu::SrvAck(SrvAck::new(0)))
}

fn process_srv_dereg(
    registry: &mut Registry,
    scope: &str,
    ifaddr: Ipv4Addr,
    pdu: SrvDereg,
) -> Option<Pdu> {
    if pdu.scope_list != scope {
        Debug::ScopeMismatch(&ifaddr, &pdu.scope_list).log();
        return None;
    }

    // Deregistering an unknown URL is a no-op, but it is still
    // acknowledged.
    registry.deregister(&ifaddr, &pdu.url_entry.url);
    Some(Pdu::SrvAck(SrvAck::new(0)))
}

fn process_attr_rqst(
    registry: &mut Registry,
    scope: &str,
    ifaddr: Ipv4Addr,
    pdu: AttrRqst,
) -> Option<Pdu> {
    if pdu.scope_list != scope {
        Debug::ScopeMismatch(&ifaddr, &pdu.scope_list).log();
        return None;
    }

    let attr_list = registry
        .find_attrs(&ifaddr, &pdu.url)
        .unwrap_or_default()
        .to_owned();
    Some(Pdu::AttrRply(AttrRply::new(0, attr_list)))
}

// ===== tests =====

#[cfg(test)]
mod tests {
    use crate::packet::UrlEntry;

    use super::*;

    const IFADDR: Ipv4Addr = Ipv4Addr::LOCALHOST;
    const SCOPE: &str = "DEFAULT";

    fn srv_reg(service_type: &str, url: &str, scope: &str) -> Pdu {
        Pdu::SrvReg(SrvReg::new(
            UrlEntry::new(15, url.to_owned()),
            service_type.to_owned(),
            scope.to_owned(),
            "(attr='test')".to_owned(),
        ))
    }

    fn srv_rqst(service_type: &str, scope: &str) -> Pdu {
        Pdu::SrvRqst(SrvRqst::new(service_type.to_owned(), scope.to_owned()))
    }

    #[test]
    fn register_then_find() {
        let mut registry = Registry::default();
        registry.add_interface(IFADDR);

        let reply = process_pdu(
            &mut registry,
            SCOPE,
            IFADDR,
            srv_reg("service:test", "service:test://test.com", SCOPE),
        );
        assert_eq!(reply, Some(Pdu::SrvAck(SrvAck::new(0))));

        let reply = process_pdu(
            &mut registry,
            SCOPE,
            IFADDR,
            srv_rqst("service:test", SCOPE),
        );
        assert_eq!(
            reply,
            Some(Pdu::SrvRply(SrvRply::new(
                0,
                vec![UrlEntry::new(15, "service:test://test.com".to_owned())]
            )))
        );
    }

    #[test]
    fn find_unknown_service_type() {
        let mut registry = Registry::default();
        registry.add_interface(IFADDR);

        let reply = process_pdu(
            &mut registry,
            SCOPE,
            IFADDR,
            srv_rqst("service:test", SCOPE),
        );
        assert_eq!(reply, Some(Pdu::SrvRply(SrvRply::new(0, vec![]))));
    }

    #[test]
    fn scope_mismatch_drops() {
        let mut registry = Registry::default();
        registry.add_interface(IFADDR);

        let reply = process_pdu(
            &mut registry,
            SCOPE,
            IFADDR,
            srv_reg("service:test", "service:test://test.com", "anapa"),
        );
        assert_eq!(reply, None);

        // The registration was not accepted.
        let reply = process_pdu(
            &mut registry,
            SCOPE,
            IFADDR,
            srv_rqst("service:test", SCOPE),
        );
        assert_eq!(reply, Some(Pdu::SrvRply(SrvRply::new(0, vec![]))));
    }

    #[test]
    fn registry_is_partitioned_by_interface() {
        let other = Ipv4Addr::new(10, 0, 0, 1);
        let mut registry = Registry::default();
        registry.add_interface(IFADDR);
        registry.add_interface(other);

        process_pdu(
            &mut registry,
            SCOPE,
            IFADDR,
            srv_reg("service:test", "service:test://test.com", SCOPE),
        );

        let reply =
            process_pdu(&mut registry, SCOPE, other, srv_rqst("service:test", SCOPE));
        assert_eq!(reply, Some(Pdu::SrvRply(SrvRply::new(0, vec![]))));
    }

    #[test]
    fn attr_round_trip() {
        let mut registry = Registry::default();
        registry.add_interface(IFADDR);

        process_pdu(
            &mut registry,
            SCOPE,
            IFADDR,
            srv_reg("service:x", "service:x://h", SCOPE),
        );

        let reply = process_pdu(
            &mut registry,
            SCOPE,
            IFADDR,
            Pdu::AttrRqst(AttrRqst::new(
                "service:x://h".to_owned(),
                SCOPE.to_owned(),
            )),
        );
        assert_eq!(
            reply,
            Some(Pdu::AttrRply(AttrRply::new(0, "(attr='test')".to_owned())))
        );
    }

    #[test]
    fn attr_request_for_unknown_url() {
        let mut registry = Registry::default();
        registry.add_interface(IFADDR);

        let reply = process_pdu(
            &mut registry,
            SCOPE,
            IFADDR,
            Pdu::AttrRqst(AttrRqst::new(
                "service:x://h".to_owned(),
                SCOPE.to_owned(),
            )),
        );
        assert_eq!(reply, Some(Pdu::AttrRply(AttrRply::new(0, String::new()))));
    }

    #[test]
    fn deregister_unknown_url_still_acked() {
        let mut registry = Registry::default();
        registry.add_interface(IFADDR);

        let reply = process_pdu(
            &mut registry,
            SCOPE,
            IFADDR,
            Pdu::SrvDereg(SrvDereg::new(
                SCOPE.to_owned(),
                UrlEntry::new(0, "service:x://nowhere".to_owned()),
            )),
        );
        assert_eq!(reply, Some(Pdu::SrvAck(SrvAck::new(0))));
    }

    #[test]
    fn unexpected_function_id_dropped() {
        let mut registry = Registry::default();
        registry.add_interface(IFADDR);

        let reply = process_pdu(
            &mut registry,
            SCOPE,
            IFADDR,
            Pdu::SrvAck(SrvAck::new(0)),
        );
        assert_eq!(reply, None);
    }
}
