//! Integration tests for the relay core

use controller_relay::config::*;
use controller_relay::message::SenderDescriptor;
use controller_relay::service::{PollOutcome, SendOutcome};
use controller_relay::RelayService;

use std::sync::Arc;
use std::time::Duration;

fn phone() -> SenderDescriptor {
    SenderDescriptor::mobile("10.0.0.1", Some("acct-42".to_string()))
}

fn device() -> SenderDescriptor {
    SenderDescriptor::controller("192.168.4.2", None)
}

/// Test configuration deserialization
#[test]
fn test_config_deserialization() {
    let json = r#"{
        "queue": {
            "ttl-secs": 300,
            "max-backlog-per-controller": 16
        },
        "rate-limit": {
            "enabled": true,
            "window-secs": 30,
            "max-requests": 25
        },
        "sweep": {
            "interval-secs": 60
        }
    }"#;

    let config: RelayConfig = serde_json::from_str(json).expect("Failed to parse config");

    assert_eq!(config.queue.ttl_secs, 300);
    assert_eq!(config.queue.max_backlog_per_controller, Some(16));
    assert!(config.rate_limit.enabled);
    assert_eq!(config.rate_limit.window_secs, 30);
    assert_eq!(config.rate_limit.max_requests, 25);
    assert_eq!(config.sweep.interval_secs, 60);
    assert!(config.validate().is_ok());
}

/// Test service creation
#[test]
fn test_service_creation() {
    let service = RelayService::with_config(RelayConfig::default());
    assert!(service.is_ok());
}

/// Test FIFO command delivery through the facade
#[test]
fn test_command_fifo_round_trip() {
    let service = RelayService::new().unwrap();

    for payload in [b"m1", b"m2", b"m3"] {
        assert_eq!(
            service.send_command("7", phone(), payload.to_vec()),
            SendOutcome::Accepted
        );
    }

    for expected in [b"m1", b"m2", b"m3"] {
        match service.poll_command("7", &device()) {
            PollOutcome::Delivered(entry) => assert_eq!(entry.payload, expected),
            other => panic!("expected delivery, got {other:?}"),
        }
    }
    assert_eq!(service.poll_command("7", &device()), PollOutcome::Empty);

    let stats = service.stats();
    assert_eq!(stats.queue.controllers_with_backlog, 0);
    assert_eq!(stats.queue.queued_commands, 0);
}

/// Test latest-wins status delivery through the facade
#[test]
fn test_status_latest_wins() {
    let service = RelayService::new().unwrap();

    service.report_status("9", device(), b"h1".to_vec());
    service.report_status("9", device(), b"h2".to_vec());

    match service.poll_status("9", &phone()) {
        PollOutcome::Delivered(entry) => assert_eq!(entry.payload, b"h2"),
        other => panic!("expected delivery, got {other:?}"),
    }
    assert_eq!(service.poll_status("9", &phone()), PollOutcome::Empty);
}

/// Test rate limiting across the request path
#[test]
fn test_rate_limit_budget() {
    let config = RelayConfig {
        rate_limit: RateLimitConfig {
            enabled: true,
            window_secs: 30,
            max_requests: 25,
        },
        ..Default::default()
    };
    let service = RelayService::with_config(config).unwrap();

    for _ in 0..25 {
        assert_eq!(
            service.send_command("7", phone(), b"cmd".to_vec()),
            SendOutcome::Accepted
        );
    }

    assert_eq!(
        service.send_command("7", phone(), b"cmd".to_vec()),
        SendOutcome::RateLimited {
            key: "acct:acct-42".to_string()
        }
    );

    // A different account behind a different address is unaffected.
    let other = SenderDescriptor::mobile("10.0.0.9", Some("acct-9".to_string()));
    assert_eq!(
        service.send_command("7", other, b"cmd".to_vec()),
        SendOutcome::Accepted
    );
}

/// Test disabled rate limiting
#[test]
fn test_disabled_rate_limiting() {
    let config = RelayConfig {
        rate_limit: RateLimitConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let service = RelayService::with_config(config).unwrap();

    for _ in 0..1000 {
        assert_eq!(
            service.send_command("7", phone(), b"cmd".to_vec()),
            SendOutcome::Accepted
        );
    }
}

/// Test the configurable backlog cap
#[test]
fn test_backlog_cap() {
    let mut config = RelayConfig::default();
    config.queue.max_backlog_per_controller = Some(2);
    let service = RelayService::with_config(config).unwrap();

    assert_eq!(service.send_command("7", phone(), b"m1".to_vec()), SendOutcome::Accepted);
    assert_eq!(service.send_command("7", phone(), b"m2".to_vec()), SendOutcome::Accepted);
    assert_eq!(
        service.send_command("7", phone(), b"m3".to_vec()),
        SendOutcome::BacklogFull { limit: 2 }
    );
}

/// Test the association store
#[test]
fn test_associations() {
    let service = RelayService::new().unwrap();
    let associations = service.associations();

    associations.associate("acct-42", "7");
    assert_eq!(associations.controller_for("acct-42").as_deref(), Some("7"));
    assert_eq!(service.stats().associations, 1);

    assert!(associations.dissociate("acct-42"));
    assert_eq!(associations.controller_for("acct-42"), None);
    assert_eq!(service.stats().associations, 0);
}

/// Test that the background sweeper reclaims entries nobody polls
#[tokio::test]
async fn test_sweeper_prunes_without_traffic() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut config = RelayConfig::default();
    config.queue.ttl_secs = 1;
    config.sweep.interval_secs = 1;
    let interval = config.sweep.interval();
    let service = Arc::new(RelayService::with_config(config).unwrap());

    service.send_command("7", phone(), b"cmd".to_vec());
    service.report_status("7", device(), b"hb".to_vec());
    assert_eq!(service.stats().queue.queued_commands, 1);

    let sweeper = controller_relay::sweeper::spawn_sweeper(Arc::clone(&service), interval);

    // TTL is 1s and the sweep period 1s; after ~2.5s everything has expired
    // and at least one sweep has run, with no dequeue traffic at all.
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let stats = service.stats();
    assert_eq!(stats.queue.controllers_with_backlog, 0);
    assert_eq!(stats.queue.queued_commands, 0);
    assert_eq!(stats.queue.controllers_with_pending_status, 0);

    sweeper.abort();
}
