//! End-to-end tests for the registry service against a temporary
//! document and quota tree.

use std::time::Duration;

use chrono::NaiveDate;
use tempfile::TempDir;

use registry_config::RegistryConfig;
use registry_core::{Credential, Protocol, UserStatus};
use registry_service::{ProtocolReport, RegistryError, RegistryService};
use registry_store::DocumentStore;

const GB: i64 = 1_073_741_824;

const DOCUMENT: &str = r#"{
  "log": {"loglevel": "warning"},
  "inbounds": [
    {
      "port": 443,
      "protocol": "vmess",
      "settings": {
        "clients": [
#vmess
### alice 2025-01-01
{"id": "11111111-1111-1111-1111-111111111111","alterId": 0,"email": "alice"},
#vmessgrpc
### alice 2025-01-01
{"id": "11111111-1111-1111-1111-111111111111","alterId": 0,"email": "alice"},
          {"id": "00000000-0000-0000-0000-000000000000","alterId": 0,"email": "placeholder"}
        ]
      }
    },
    {
      "port": 443,
      "protocol": "vless",
      "settings": {
        "clients": [
#vless
#& dave 2099-01-01
{"id": "44444444-4444-4444-4444-444444444444","email": "dave"},
#vlessgrpc
          {"id": "00000000-0000-0000-0000-000000000001","email": "placeholder"}
        ]
      }
    },
    {
      "port": 443,
      "protocol": "trojanws",
      "settings": {
        "clients": [
#trojanws
#! bob 2099-12-31
{"password": "bob-password","email": "bob"},
#trojangrpc
          {"password": "placeholder-pw","email": "placeholder"}
        ]
      }
    }
  ]
}
"#;

struct World {
    dir: TempDir,
    service: RegistryService,
}

impl World {
    fn new(document: Option<&str>) -> World {
        let dir = tempfile::tempdir().expect("tempdir");
        if let Some(text) = document {
            std::fs::write(dir.path().join("config.json"), text).expect("write document");
        }
        let config = RegistryConfig {
            document_path: dir.path().join("config.json").display().to_string(),
            quota_root: dir.path().join("etc").display().to_string(),
            usage_root: dir.path().join("etc/limit").display().to_string(),
            ip_limit_root: dir.path().join("etc/kyt/limit").display().to_string(),
            lock_timeout_ms: 200,
            ..RegistryConfig::default()
        };
        let service = RegistryService::new(config);
        World { dir, service }
    }

    fn write_quota(&self, protocol: &str, username: &str, limit: Option<i64>, used: Option<i64>) {
        if let Some(limit) = limit {
            let dir = self.dir.path().join("etc").join(protocol);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(username), limit.to_string()).unwrap();
        }
        if let Some(used) = used {
            let dir = self.dir.path().join("etc/limit").join(protocol);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(username), used.to_string()).unwrap();
        }
    }
}

#[tokio::test]
async fn get_user_returns_identity_and_expiry() {
    let world = World::new(Some(DOCUMENT));
    let view = world.service.get_user("vmess", "alice").await.unwrap();
    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["username"], "alice");
    assert_eq!(value["uuid"], "11111111-1111-1111-1111-111111111111");
    assert_eq!(value["expiry_date"], "2025-01-01");
    assert_eq!(value["variant"], "standard");
}

#[tokio::test]
async fn quota_figures_convert_to_gb() {
    let world = World::new(Some(DOCUMENT));
    world.write_quota("trojan", "bob", Some(5 * GB), Some(GB));

    let view = world.service.get_user("trojan", "bob").await.unwrap();
    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["quota_limit_gb"], 5.0);
    assert_eq!(value["quota_used_gb"], 1.0);
    assert_eq!(value["quota_remaining_gb"], 4.0);
    assert_eq!(value["is_unlimited"], false);
    assert_eq!(value["status"], "active");
    assert_eq!(value["password"], "bob-password");
}

#[tokio::test]
async fn missing_limit_file_means_unlimited() {
    let world = World::new(Some(DOCUMENT));
    world.write_quota("vless", "dave", None, Some(GB));

    let view = world.service.get_user("vless", "dave").await.unwrap();
    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["is_unlimited"], true);
    assert_eq!(value["quota_limit_gb"], "Unlimited");
    assert_eq!(value["quota_remaining_gb"], "Unlimited");
    assert_eq!(value["quota_used_gb"], 1.0);
    assert_eq!(value["status"], "active");
}

#[tokio::test]
async fn past_expiry_classifies_expired() {
    let world = World::new(Some(DOCUMENT));
    let view = world.service.get_user("vmess", "alice").await.unwrap();
    assert_eq!(view.status, UserStatus::Expired);
}

#[tokio::test]
async fn quota_exhaustion_wins_over_expiry() {
    let world = World::new(Some(DOCUMENT));
    world.write_quota("vmess", "alice", Some(5 * GB), Some(6 * GB));
    let view = world.service.get_user("vmess", "alice").await.unwrap();
    assert_eq!(view.status, UserStatus::QuotaExceeded);
}

#[tokio::test]
async fn corrupt_quota_files_degrade_to_defaults() {
    let world = World::new(Some(DOCUMENT));
    let limit_dir = world.dir.path().join("etc/vless");
    std::fs::create_dir_all(&limit_dir).unwrap();
    std::fs::write(limit_dir.join("dave"), "not-a-number").unwrap();

    let view = world.service.get_user("vless", "dave").await.unwrap();
    assert!(view.credential == Credential::Uuid("44444444-4444-4444-4444-444444444444".into()));
    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["is_unlimited"], true);
    assert_eq!(value["quota_used_gb"], 0.0);
}

#[tokio::test]
async fn externally_provisioned_names_query_like_any_other() {
    // Shell-script provisioning is not bound by our username charset;
    // whatever the document carries must answer both listing and get.
    let doc = r#"{
  "inbounds": [
    {
      "protocol": "vmess",
      "settings": {
        "clients": [
#vmess
### my-user 2099-01-01
{"id": "77777777-7777-7777-7777-777777777777","alterId": 0,"email": "my-user"}
        ]
      }
    }
  ]
}
"#;
    let world = World::new(Some(doc));

    let listing = world.service.get_all_users(None).await.unwrap();
    assert_eq!(listing.users.len(), 1);
    assert_eq!(listing.users[0].username, "my-user");

    let view = world.service.get_user("vmess", "my-user").await.unwrap();
    assert_eq!(view.username, "my-user");
    assert_eq!(view.status, UserStatus::Active);

    let err = world.service.get_user("vmess", "no-such-user").await.unwrap_err();
    assert!(matches!(err, RegistryError::UserNotFound { .. }));
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let world = World::new(Some(DOCUMENT));
    let err = world.service.get_user("vmess", "ghost").await.unwrap_err();
    assert!(matches!(err, RegistryError::UserNotFound { .. }));
}

#[tokio::test]
async fn record_without_client_entry_is_not_found() {
    // Marker line present but the JSON client was removed externally.
    let doc = DOCUMENT.replace(
        "{\"id\": \"44444444-4444-4444-4444-444444444444\",\"email\": \"dave\"},\n",
        "",
    );
    let world = World::new(Some(&doc));
    let err = world.service.get_user("vless", "dave").await.unwrap_err();
    assert!(matches!(err, RegistryError::UserNotFound { .. }));
}

#[tokio::test]
async fn unsupported_protocol_is_rejected() {
    let world = World::new(Some(DOCUMENT));
    let err = world.service.get_user("ssh", "alice").await.unwrap_err();
    assert!(matches!(err, RegistryError::InvalidProtocol(_)));
}

#[tokio::test]
async fn listing_deduplicates_grpc_entries_and_tallies_status() {
    let world = World::new(Some(DOCUMENT));
    let listing = world.service.get_all_users(None).await.unwrap();

    // alice appears once despite the grpc duplicate.
    assert_eq!(listing.users.len(), 3);
    assert_eq!(listing.statistics.total_users, 3);
    assert_eq!(listing.statistics.expired_users, 1);
    assert_eq!(listing.statistics.active_users, 2);
    assert_eq!(listing.statistics.quota_exceeded_users, 0);
}

#[tokio::test]
async fn listing_filters_by_protocol() {
    let world = World::new(Some(DOCUMENT));
    let listing = world
        .service
        .get_all_users(Some(Protocol::Trojan))
        .await
        .unwrap();
    assert_eq!(listing.users.len(), 1);
    assert_eq!(listing.users[0].username, "bob");
}

#[tokio::test]
async fn malformed_document_yields_empty_listing() {
    let world = World::new(Some("#vmess\n### alice 2025-01-01\n{ this is not json\n"));
    let listing = world.service.get_all_users(None).await.unwrap();
    assert!(listing.users.is_empty());
    assert_eq!(listing.statistics.total_users, 0);
}

#[tokio::test]
async fn missing_document_yields_empty_listing_and_not_found() {
    let world = World::new(None);
    let listing = world.service.get_all_users(None).await.unwrap();
    assert!(listing.users.is_empty());

    let err = world.service.get_user("vmess", "alice").await.unwrap_err();
    assert!(matches!(err, RegistryError::UserNotFound { .. }));
}

#[tokio::test]
async fn summary_reports_counts_per_protocol() {
    let world = World::new(Some(DOCUMENT));
    let summary = world.service.get_summary().await;
    assert_eq!(summary.protocols.len(), 3);

    match &summary.protocols[&Protocol::Vmess] {
        ProtocolReport::Stats(stats) => {
            assert_eq!(stats.total_users, 1);
            assert_eq!(stats.expired_users, 1);
        }
        ProtocolReport::Failed { error } => panic!("vmess summary failed: {error}"),
    }
    match &summary.protocols[&Protocol::Vless] {
        ProtocolReport::Stats(stats) => assert_eq!(stats.active_users, 1),
        ProtocolReport::Failed { error } => panic!("vless summary failed: {error}"),
    }
}

#[tokio::test]
async fn provision_then_get_user_round_trips() {
    let world = World::new(Some(DOCUMENT));
    let expiry = NaiveDate::from_ymd_opt(2099, 6, 1).unwrap();
    let receipt = world
        .service
        .provision_user(
            "vmess",
            "newguy",
            Credential::Uuid("22222222-2222-2222-2222-222222222222".into()),
            expiry,
            10,
            2,
        )
        .await
        .unwrap();
    assert_eq!(receipt.username, "newguy");

    let view = world.service.get_user("vmess", "newguy").await.unwrap();
    assert_eq!(view.status, UserStatus::Active);
    assert_eq!(view.expiry_date, Some(expiry));
    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["quota_limit_gb"], 10.0);
    assert_eq!(value["uuid"], "22222222-2222-2222-2222-222222222222");

    // Quota, IP-limit, and ledger files all landed.
    let limit = std::fs::read_to_string(world.dir.path().join("etc/vmess/newguy")).unwrap();
    assert_eq!(limit, (10 * GB).to_string());
    let ip = std::fs::read_to_string(world.dir.path().join("etc/kyt/limit/vmess/ip/newguy")).unwrap();
    assert_eq!(ip, "2");
    let ledger = std::fs::read_to_string(world.dir.path().join("etc/vmess/.vmess.db")).unwrap();
    assert!(ledger.contains("### newguy 2099-06-01 22222222-2222-2222-2222-222222222222"));

    // Listing picks the new user up exactly once.
    let listing = world.service.get_all_users(None).await.unwrap();
    assert_eq!(listing.users.len(), 4);
}

#[tokio::test]
async fn provision_rejects_duplicates() {
    let world = World::new(Some(DOCUMENT));
    let expiry = NaiveDate::from_ymd_opt(2099, 6, 1).unwrap();
    let err = world
        .service
        .provision_user(
            "vmess",
            "alice",
            Credential::Uuid("33333333-3333-3333-3333-333333333333".into()),
            expiry,
            10,
            2,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::UserExists { .. }));
}

#[tokio::test]
async fn provision_validates_inputs() {
    let world = World::new(Some(DOCUMENT));
    let expiry = NaiveDate::from_ymd_opt(2099, 6, 1).unwrap();

    let err = world
        .service
        .provision_user("vmess", "x", Credential::Uuid("u".into()), expiry, 1, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidUsername(_)));

    let err = world
        .service
        .provision_user("vmess", "okname", Credential::Password("longenough".into()), expiry, 1, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::CredentialMismatch(_)));

    let err = world
        .service
        .provision_user("trojan", "okname", Credential::Password("short".into()), expiry, 1, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidPassword));
}

#[tokio::test]
async fn provision_reports_partial_failure_after_document_append() {
    let world = World::new(Some(DOCUMENT));
    // Make the quota root a regular file so the limit write cannot succeed.
    std::fs::write(world.dir.path().join("etc"), "blocker").unwrap();

    let expiry = NaiveDate::from_ymd_opt(2099, 6, 1).unwrap();
    let err = world
        .service
        .provision_user(
            "vless",
            "halfway",
            Credential::Uuid("55555555-5555-5555-5555-555555555555".into()),
            expiry,
            10,
            2,
        )
        .await
        .unwrap_err();
    match err {
        RegistryError::PartialProvision {
            step,
            document_updated,
            ..
        } => {
            assert_eq!(step, registry_service::ProvisionStep::QuotaLimit);
            assert!(document_updated);
        }
        other => panic!("expected PartialProvision, got {other}"),
    }

    // The document did gain the record.
    let text = std::fs::read_to_string(world.dir.path().join("config.json")).unwrap();
    assert!(text.contains("#& halfway 2099-06-01"));
}

#[tokio::test]
async fn provision_times_out_when_lock_is_held() {
    let world = World::new(Some(DOCUMENT));
    let holder = DocumentStore::new(
        world.dir.path().join("config.json"),
        Duration::from_secs(5),
        Duration::from_secs(5),
    );
    let _held = holder.lock_exclusive().unwrap();

    let expiry = NaiveDate::from_ymd_opt(2099, 6, 1).unwrap();
    let err = world
        .service
        .provision_user(
            "vmess",
            "blocked",
            Credential::Uuid("66666666-6666-6666-6666-666666666666".into()),
            expiry,
            10,
            2,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::LockTimeout { .. }));
}

#[tokio::test]
async fn reads_remain_available_while_lock_is_held() {
    let world = World::new(Some(DOCUMENT));
    let holder = DocumentStore::new(
        world.dir.path().join("config.json"),
        Duration::from_secs(5),
        Duration::from_secs(5),
    );
    let _held = holder.lock_exclusive().unwrap();

    let listing = world.service.get_all_users(None).await.unwrap();
    assert_eq!(listing.users.len(), 3);
}
