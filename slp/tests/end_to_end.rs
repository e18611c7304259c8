//
// Copyright (c) The Slp Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Daemon and client exercised together over loopback multicast. Each
//! test uses its own port so the tests can run in parallel.

use std::net::Ipv4Addr;
use std::time::Duration;

use slp::client::Client;
use slp::config::{ClientConfig, DaemonConfig};
use slp::consts::LIFETIME_PERMANENT;
use slp::error::Error;
use slp::instance::Daemon;

const LOOPBACK: Ipv4Addr = Ipv4Addr::LOCALHOST;

fn daemon_config(port: u16, scope: &str) -> DaemonConfig {
    DaemonConfig {
        ip_addrs: vec![LOOPBACK],
        mcast_port: port,
        scope: scope.to_owned(),
        ..Default::default()
    }
}

fn client_config(port: u16, scope: &str) -> ClientConfig {
    ClientConfig {
        ip_addrs: vec![LOOPBACK],
        mcast_port: port,
        scope: scope.to_owned(),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn register_then_find() {
    let daemon = Daemon::start(daemon_config(42701, "DEFAULT")).await.unwrap();
    let client = Client::new(client_config(42701, "DEFAULT"));

    client
        .register("service:x", "service:x://a.com", "", LIFETIME_PERMANENT)
        .await
        .unwrap();

    let (url_lists, responders) = client.find_srvs("service:x").await.unwrap();
    assert_eq!(responders, vec![LOOPBACK]);
    assert_eq!(url_lists, vec![vec!["service:x://a.com".to_owned()]]);

    daemon.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn scope_mismatch_is_dropped() {
    let daemon = Daemon::start(daemon_config(42702, "DEFAULT")).await.unwrap();

    // The daemon drops the mismatched registration without a reply, so
    // the client times out.
    let client = Client::new(client_config(42702, "OTHER"));
    let result = client
        .register("service:x", "service:x://a.com", "", LIFETIME_PERMANENT)
        .await;
    assert!(matches!(result, Err(Error::Internal)));

    // Nothing was registered.
    let client = Client::new(client_config(42702, "DEFAULT"));
    let (url_lists, responders) = client.find_srvs("service:x").await.unwrap();
    assert_eq!(responders, vec![LOOPBACK]);
    assert_eq!(url_lists, vec![Vec::<String>::new()]);

    daemon.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn lease_expires() {
    let daemon = Daemon::start(daemon_config(42703, "DEFAULT")).await.unwrap();
    let client = Client::new(client_config(42703, "DEFAULT"));

    client
        .register("service:x", "service:x://a.com", "", 1)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(2500)).await;

    let (url_lists, _) = client.find_srvs("service:x").await.unwrap();
    assert_eq!(url_lists, vec![Vec::<String>::new()]);

    daemon.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn permanent_lease_survives() {
    let daemon = Daemon::start(daemon_config(42704, "DEFAULT")).await.unwrap();
    let client = Client::new(client_config(42704, "DEFAULT"));

    client
        .register("service:x", "service:x://a.com", "", LIFETIME_PERMANENT)
        .await
        .unwrap();

    // Several sweep cycles later the registration is still there.
    tokio::time::sleep(Duration::from_millis(3000)).await;

    let (url_lists, _) = client.find_srvs("service:x").await.unwrap();
    assert_eq!(url_lists, vec![vec!["service:x://a.com".to_owned()]]);

    daemon.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn attr_round_trip() {
    let daemon = Daemon::start(daemon_config(42705, "DEFAULT")).await.unwrap();
    let client = Client::new(client_config(42705, "DEFAULT"));

    client
        .register(
            "service:x",
            "service:x://h",
            "(k1=v1),(k2=v2)",
            LIFETIME_PERMANENT,
        )
        .await
        .unwrap();

    let attrs = client.find_attrs("service:x://h", None).await.unwrap();
    assert_eq!(attrs, Some("(k1=v1),(k2=v2)".to_owned()));

    // Unknown URLs yield an empty attribute list from every interface.
    let attrs = client.find_attrs("service:x://nowhere", None).await.unwrap();
    assert_eq!(attrs, None);

    daemon.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn deregister_removes_url() {
    let daemon = Daemon::start(daemon_config(42706, "DEFAULT")).await.unwrap();
    let client = Client::new(client_config(42706, "DEFAULT"));

    client
        .register("service:x", "service:x://a.com", "", LIFETIME_PERMANENT)
        .await
        .unwrap();
    client.deregister("service:x://a.com").await.unwrap();

    let (url_lists, _) = client.find_srvs("service:x").await.unwrap();
    assert_eq!(url_lists, vec![Vec::<String>::new()]);

    // Deregistering again is still acknowledged.
    client.deregister("service:x://a.com").await.unwrap();

    daemon.close();
}
