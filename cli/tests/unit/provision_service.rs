//! Tests for the `provision` application service.
//!
//! Every test runs against [`FakeLinode`] on tokio's paused clock: poll
//! intervals and the config profile settle delay elapse instantly.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use linode_prep::application::services::poll::{PollError, PollPolicy};
use linode_prep::application::services::provision::{
    ProvisionError, ProvisionOptions, ProvisionStep, provision,
};
use linode_prep::domain::plan::BOOT_KERNEL;
use linode_prep::domain::{
    ConfigError, DiskId, DiskRole, DiskStatus, Filesystem, Helpers, LayoutError, NodeStatus,
    ProvisioningPlan,
};

use crate::mocks::{CONFIG_ID, Call, FakeLinode, NODE_ID, Op, RecordingReporter};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn plan() -> ProvisioningPlan {
    ProvisioningPlan {
        node_type: "g6-standard-1".to_string(),
        region: "us-east".to_string(),
        node_label: "vault".to_string(),
        node_group: None,
        config_profile_label: "crypt".to_string(),
    }
}

async fn run_ok(api: &FakeLinode, reporter: &RecordingReporter) {
    provision(api, &plan(), &ProvisionOptions::default(), reporter)
        .await
        .expect("provisioning should succeed");
}

async fn run_err(api: &FakeLinode, options: &ProvisionOptions) -> ProvisionError {
    provision(api, &plan(), options, &RecordingReporter::default())
        .await
        .expect_err("provisioning should fail")
}

fn disks(ids: &[u64]) -> Vec<DiskId> {
    ids.iter().copied().map(DiskId).collect()
}

// ── Happy path ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn creates_one_linode_three_disks_one_profile_and_one_rescue() {
    let api = FakeLinode::with_capacity(2048);
    let reporter = RecordingReporter::default();
    run_ok(&api, &reporter).await;

    assert_eq!(api.count(|c| matches!(c, Call::CreateNode { .. })), 1);
    assert_eq!(api.count(|c| matches!(c, Call::CreateDisk { .. })), 3);
    assert_eq!(api.count(|c| matches!(c, Call::CreateConfigProfile { .. })), 1);
    assert_eq!(api.count(|c| matches!(c, Call::Rescue(_))), 1);
    assert!(reporter.waits.borrow().is_empty(), "nothing was pending");
}

#[tokio::test(start_paused = true)]
async fn disks_are_sized_labelled_and_raw() {
    let api = FakeLinode::with_capacity(2048);
    run_ok(&api, &RecordingReporter::default()).await;

    let created: Vec<(u64, String, Filesystem)> = api
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::CreateDisk {
                size,
                label,
                filesystem,
            } => Some((size, label, filesystem)),
            _ => None,
        })
        .collect();
    assert_eq!(
        created,
        vec![
            (256, "Boot".to_string(), Filesystem::Raw),
            (256, "Swap".to_string(), Filesystem::Raw),
            (1536, "System".to_string(), Filesystem::Raw),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn config_profile_attaches_disks_in_order_with_helpers_off() {
    let api = FakeLinode::default();
    run_ok(&api, &RecordingReporter::default()).await;

    let profile = api
        .calls()
        .into_iter()
        .find(|c| matches!(c, Call::CreateConfigProfile { .. }))
        .expect("config profile created");
    assert_eq!(
        profile,
        Call::CreateConfigProfile {
            kernel: BOOT_KERNEL.to_string(),
            label: "crypt".to_string(),
            devices: vec![
                ("sda".to_string(), DiskId(101)),
                ("sdb".to_string(), DiskId(102)),
                ("sdc".to_string(), DiskId(103)),
            ],
            helpers: Helpers::all_disabled(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn rescue_receives_disks_in_order_after_node_settles() {
    let api = FakeLinode::default();
    run_ok(&api, &RecordingReporter::default()).await;

    let calls = api.calls();
    let profile_at = calls
        .iter()
        .position(|c| matches!(c, Call::CreateConfigProfile { .. }))
        .unwrap();
    let rescue_at = calls.iter().position(|c| matches!(c, Call::Rescue(_))).unwrap();
    assert!(
        calls[profile_at..rescue_at].contains(&Call::GetNode),
        "Linode must be re-checked between config profile and rescue"
    );
    assert_eq!(calls[rescue_at], Call::Rescue(disks(&[101, 102, 103])));
}

#[tokio::test(start_paused = true)]
async fn result_carries_addresses_and_ids() {
    let api = FakeLinode {
        ipv4: vec!["192.0.2.10".to_string(), "198.51.100.4".to_string()],
        ipv6: None,
        ..FakeLinode::default()
    };
    let result = provision(&api, &plan(), &ProvisionOptions::default(), &RecordingReporter::default())
        .await
        .expect("provisioning should succeed");

    assert_eq!(result.node_id, NODE_ID);
    assert_eq!(result.config_profile, CONFIG_ID);
    assert_eq!(result.disks, disks(&[101, 102, 103]));
    assert_eq!(result.ipv4, vec!["192.0.2.10", "198.51.100.4"]);
    assert_eq!(result.ipv6, None);
}

#[tokio::test(start_paused = true)]
async fn node_request_passes_plan_through() {
    let api = FakeLinode::default();
    let plan = ProvisioningPlan {
        node_group: Some("crypt-hosts".to_string()),
        ..plan()
    };
    provision(&api, &plan, &ProvisionOptions::default(), &RecordingReporter::default())
        .await
        .expect("provisioning should succeed");

    assert_eq!(api.calls()[0], Call::NodeType("g6-standard-1".to_string()));
    assert_eq!(
        api.calls()[1],
        Call::CreateNode {
            node_type: "g6-standard-1".to_string(),
            region: "us-east".to_string(),
            label: "vault".to_string(),
            group: Some("crypt-hosts".to_string()),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn progress_lines_follow_the_run() {
    let api = FakeLinode::default();
    let reporter = RecordingReporter::default();
    run_ok(&api, &reporter).await;

    assert_eq!(
        *reporter.steps.borrow(),
        vec![
            "Creating Linode -> vault",
            "Making disks",
            "Creating boot disk",
            "Creating swap disk",
            "Creating system disk",
            "Creating config profile",
            "Rebooting into rescue mode with the following disks: [101, 102, 103]",
        ]
    );
    assert_eq!(
        *reporter.successes.borrow(),
        vec!["Linode vault is booting into rescue mode"]
    );
}

// ── Polling ───────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn each_pending_status_emits_one_notice() {
    let api = FakeLinode::default()
        .script_node([NodeStatus::Provisioning, NodeStatus::Booting])
        .script_disk([DiskStatus::NotReady, DiskStatus::NotReady]);
    let reporter = RecordingReporter::default();
    run_ok(&api, &reporter).await;

    assert_eq!(
        *reporter.waits.borrow(),
        vec![
            "waiting on Linode status... (provisioning)",
            "waiting on Linode status... (booting)",
            "waiting on disk 'sda' status... (not ready)",
            "waiting on disk 'sda' status... (not ready)",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn settle_delay_is_the_only_pause_when_nothing_is_pending() {
    let api = FakeLinode::default();
    let started = tokio::time::Instant::now();
    run_ok(&api, &RecordingReporter::default()).await;
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn never_stable_linode_is_polled_without_a_hidden_timeout() {
    let api = FakeLinode {
        settled_node: NodeStatus::Provisioning,
        ..FakeLinode::default()
    };
    let reporter = RecordingReporter::default();
    let outcome = tokio::time::timeout(
        Duration::from_secs(6 * 3600),
        provision(&api, &plan(), &ProvisionOptions::default(), &reporter),
    )
    .await;

    assert!(outcome.is_err(), "an unbounded poll must not give up on its own");
    assert!(api.count(|c| *c == Call::GetNode) > 4000);
    assert_eq!(api.count(|c| matches!(c, Call::CreateDisk { .. })), 0);
}

#[tokio::test(start_paused = true)]
async fn poll_ceiling_fails_with_ledger() {
    let api = FakeLinode {
        settled_node: NodeStatus::Provisioning,
        ..FakeLinode::default()
    };
    let options = ProvisionOptions {
        node_poll: PollPolicy::default().with_max_attempts(Some(3)),
        ..ProvisionOptions::default()
    };
    let err = run_err(&api, &options).await;

    assert_eq!(err.step, ProvisionStep::WaitNode);
    assert_eq!(err.ledger.node, Some(NODE_ID));
    assert!(err.ledger.disks.is_empty());
    assert!(matches!(
        err.source.downcast_ref::<PollError>(),
        Some(PollError::TimedOut { attempts: 3, .. })
    ));
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn undersized_type_is_rejected_before_anything_is_created() {
    let api = FakeLinode::with_capacity(512);
    let err = run_err(&api, &ProvisionOptions::default()).await;

    assert_eq!(err.step, ProvisionStep::CheckNodeType);
    assert!(err.ledger.is_empty());
    assert_eq!(api.writes(), 0);
    assert!(matches!(
        err.source.downcast_ref::<ConfigError>(),
        Some(ConfigError::InsufficientCapacity { capacity: 512, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn undersized_linode_is_rejected_before_any_disk() {
    let api = FakeLinode {
        node_capacity: Some(512),
        ..FakeLinode::with_capacity(2048)
    };
    let err = run_err(&api, &ProvisionOptions::default()).await;

    assert_eq!(err.step, ProvisionStep::CreateNode);
    assert_eq!(err.ledger.node, Some(NODE_ID));
    assert!(err.ledger.disks.is_empty());
    assert_eq!(api.count(|c| matches!(c, Call::CreateDisk { .. })), 0);
    assert!(matches!(
        err.source.downcast_ref::<ConfigError>(),
        Some(ConfigError::InsufficientCapacity { capacity: 512, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn disk_failure_reports_what_was_left_behind() {
    let api = FakeLinode::default().failing(Op::CreateDisk, 2);
    let err = run_err(&api, &ProvisionOptions::default()).await;

    assert_eq!(err.step, ProvisionStep::CreateDisk(DiskRole::Swap));
    assert_eq!(err.ledger.node, Some(NODE_ID));
    assert_eq!(err.ledger.disks, vec![(DiskRole::Boot, DiskId(101))]);
    assert_eq!(err.ledger.config_profile, None);
    assert_eq!(api.count(|c| matches!(c, Call::Rescue(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn rescue_failure_lists_every_resource() {
    let api = FakeLinode::default().failing(Op::Rescue, 1);
    let err = run_err(&api, &ProvisionOptions::default()).await;

    assert_eq!(err.step, ProvisionStep::RescueBoot);
    assert_eq!(err.ledger.disk_ids(), disks(&[101, 102, 103]));
    assert_eq!(err.ledger.config_profile, Some(CONFIG_ID));
    assert_eq!(
        err.ledger.to_string(),
        "allocated: linode 7000, disk 101 (Boot), disk 102 (Swap), disk 103 (System), config 55"
    );
}

#[tokio::test(start_paused = true)]
async fn unexpected_disk_blocks_config_profile() {
    let api = FakeLinode {
        stray_disks: vec![DiskId(999)],
        ..FakeLinode::default()
    };
    let err = run_err(&api, &ProvisionOptions::default()).await;

    assert_eq!(err.step, ProvisionStep::CreateConfigProfile);
    assert!(matches!(
        err.source.downcast_ref::<LayoutError>(),
        Some(LayoutError::UnexpectedDisks { .. })
    ));
    assert_eq!(api.count(|c| matches!(c, Call::CreateConfigProfile { .. })), 0);
}

#[tokio::test(start_paused = true)]
async fn reordered_disk_listing_blocks_config_profile() {
    let api = FakeLinode {
        reverse_listing: true,
        ..FakeLinode::default()
    };
    let err = run_err(&api, &ProvisionOptions::default()).await;

    assert_eq!(err.step, ProvisionStep::CreateConfigProfile);
    assert_eq!(
        err.source.downcast_ref::<LayoutError>(),
        Some(&LayoutError::UnexpectedDisks {
            expected: disks(&[101, 102, 103]),
            found: disks(&[103, 102, 101]),
        })
    );
    assert_eq!(api.count(|c| matches!(c, Call::CreateConfigProfile { .. })), 0);
    assert_eq!(api.count(|c| matches!(c, Call::Rescue(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn disk_status_read_failure_is_not_retried() {
    let api = FakeLinode::default()
        .script_disk([DiskStatus::NotReady])
        .failing(Op::GetDisk, 2);
    let err = run_err(&api, &ProvisionOptions::default()).await;

    assert_eq!(err.step, ProvisionStep::WaitDisk(DiskRole::Boot));
    assert_eq!(api.count(|c| matches!(c, Call::GetDisk(_))), 2);
    assert!(matches!(
        err.source.downcast_ref::<PollError>(),
        Some(PollError::Fetch { .. })
    ));
}
