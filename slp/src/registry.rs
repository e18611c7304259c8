//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet, btree_map};
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use crate::consts::LIFETIME_PERMANENT;
use crate::packet::UrlEntry;

// A live service registration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Registration {
    pub service_type: String,
    pub scope_list: String,
    pub attr_list: String,
    // Lease in seconds; `LIFETIME_PERMANENT` means no expiry.
    pub lifetime: u16,
    // When the URL was last registered. Re-registration replaces the
    // whole record, so this always advances.
    pub registered_at: Instant,
}

// Registrations learned on a single interface.
//
// `records` is the owning map; `services` is a derived index kept
// consistent on every mutation. A service type with no remaining URLs
// is removed from the index entirely.
#[derive(Debug, Default)]
struct InterfaceRegistry {
    records: BTreeMap<String, Registration>,
    services: BTreeMap<String, BTreeSet<String>>,
}

// Registration state of the directory agent, partitioned by the local
// interface the registration arrived on.
#[derive(Debug, Default)]
pub struct Registry {
    interfaces: BTreeMap<Ipv4Addr, InterfaceRegistry>,
}

// ===== impl InterfaceRegistry =====

impl InterfaceRegistry {
    fn remove(&mut self, url: &str) -> bool {
        let Some(record) = self.records.remove(url) else {
            return false;
        };

        if let btree_map::Entry::Occupied(mut entry) =
            self.services.entry(record.service_type)
        {
            entry.get_mut().remove(url);
            if entry.get().is_empty() {
                entry.remove();
            }
        }

        true
    }
}

// ===== impl Registry =====

impl Registry {
    // Start tracking registrations for the given interface.
    pub fn add_interface(&mut self, ifaddr: Ipv4Addr) {
        self.interfaces.entry(ifaddr).or_default();
    }

    // Insert or replace the registration for `(ifaddr, url)`.
    pub fn register(
        &mut self,
        ifaddr: Ipv4Addr,
        service_type: String,
        scope_list: String,
        attr_list: String,
        lifetime: u16,
        url: String,
    ) {
        let iface = self.interfaces.entry(ifaddr).or_default();

        // If the URL moved to another service type, prune the old index
        // entry first.
        if let Some(old) = iface.records.get(&url)
            && old.service_type != service_type
        {
            let old_service_type = old.service_type.clone();
            if let btree_map::Entry::Occupied(mut entry) =
                iface.services.entry(old_service_type)
            {
                entry.get_mut().remove(&url);
                if entry.get().is_empty() {
                    entry.remove();
                }
            }
        }

        iface
            .services
            .entry(service_type.clone())
            .or_default()
            .insert(url.clone());
        iface.records.insert(
            url,
            Registration {
                service_type,
                scope_list,
                attr_list,
                lifetime,
                registered_at: Instant::now(),
            },
        );
    }

    // Remove the registration for `(ifaddr, url)`, returning whether it
    // existed.
    pub fn deregister(&mut self, ifaddr: &Ipv4Addr, url: &str) -> bool {
        let Some(iface) = self.interfaces.get_mut(ifaddr) else {
            return false;
        };

        iface.remove(url)
    }

    // Return the URLs registered under the given service type, ready to
    // be embedded in a service reply.
    pub fn find_urls(
        &self,
        ifaddr: &Ipv4Addr,
        service_type: &str,
    ) -> Vec<UrlEntry> {
        let Some(iface) = self.interfaces.get(ifaddr) else {
            return vec![];
        };

        iface
            .services
            .get(service_type)
            .into_iter()
            .flatten()
            .filter_map(|url| {
                let record = iface.records.get(url)?;
                Some(UrlEntry::new(record.lifetime, url.clone()))
            })
            .collect()
    }

    // Return the attribute list registered for the given URL.
    pub fn find_attrs(&self, ifaddr: &Ipv4Addr, url: &str) -> Option<&str> {
        let iface = self.interfaces.get(ifaddr)?;
        let record = iface.records.get(url)?;

        Some(record.attr_list.as_str())
    }

    // Drop the registrations whose lease expired before `now`, returning
    // what was removed. Permanent registrations are never dropped.
    pub fn sweep(&mut self, now: Instant) -> Vec<(Ipv4Addr, String)> {
        let mut removed = vec![];

        for (ifaddr, iface) in &mut self.interfaces {
            let expired = iface
                .records
                .iter()
                .filter(|(_, record)| {
                    record.lifetime != LIFETIME_PERMANENT
                        && now.saturating_duration_since(record.registered_at)
                            > Duration::from_secs(record.lifetime.into())
                })
                .map(|(url, _)| url.clone())
                .collect::<Vec<_>>();

            for url in expired {
                iface.remove(&url);
                removed.push((*ifaddr, url));
            }
        }

        removed
    }
}
