mod support;

use fy_core::FyError;
use fy_core::commands::{VaultCommand, VaultOperation, VaultReport};
use fy_core::config::VaultSettings;
use fy_core::lease::LeaseTarget;

use support::{FakeBroker, ReadFailure, Workspace};

fn settings() -> VaultSettings {
    VaultSettings {
        role: "deploy".to_string(),
        addr: "https://vault.example.com:8200".to_string(),
        token: "s.token".to_string(),
    }
}

#[test]
fn read_list_revoke_cycle() {
    let ws = Workspace::new("acme");
    let dir = ws.deployment_dir("us-east1/prod0/core/app/cluster/main/web");
    ws.write_providers(&dir, "beta", &[("beta-prod0-svc", "deploy")]);
    let broker = FakeBroker::new();

    let cmd = VaultCommand::new(ws.context(&dir), &broker);
    let VaultReport::Read(read) = cmd.execute(VaultOperation::Read, &settings()).unwrap() else {
        panic!("expected read report");
    };
    assert_eq!(read.len(), 2);
    assert_eq!(read[0].path, "gcp_acme-prod0-core/key/deploy");
    assert_eq!(read[1].path, "gcp_beta-prod0-svc/key/deploy");
    assert!(read.iter().all(|lease| lease.credentials_file.is_file()));

    let cmd = VaultCommand::new(ws.context(&dir), &broker);
    let VaultReport::List { leases: listed, .. } =
        cmd.execute(VaultOperation::List, &settings()).unwrap()
    else {
        panic!("expected list report");
    };
    assert_eq!(listed, read);

    let cmd = VaultCommand::new(ws.context(&dir), &broker);
    let VaultReport::Revoke { revoked: report, .. } =
        cmd.execute(VaultOperation::Revoke, &settings()).unwrap()
    else {
        panic!("expected revoke report");
    };
    assert_eq!(report.revoked.len(), 2);
    assert!(read.iter().all(|lease| !lease.lease_file.exists()));

    let cmd = VaultCommand::new(ws.context(&dir), &broker);
    let VaultReport::List { leases: listed, .. } =
        cmd.execute(VaultOperation::List, &settings()).unwrap()
    else {
        panic!("expected list report");
    };
    assert!(listed.is_empty());
}

#[test]
fn revoke_without_leases_reports_nothing_to_do() {
    let ws = Workspace::new("acme");
    let dir = ws.deployment_dir("us-east1/prod0/core/infra");
    let broker = FakeBroker::new();

    let cmd = VaultCommand::new(ws.context(&dir), &broker);
    let VaultReport::Revoke { revoked: report, .. } =
        cmd.execute(VaultOperation::Revoke, &settings()).unwrap()
    else {
        panic!("expected revoke report");
    };

    assert!(report.nothing_to_do());
    assert!(broker.calls().is_empty());
}

#[test]
fn failed_read_revokes_what_was_acquired() {
    let ws = Workspace::new("acme");
    let dir = ws.deployment_dir("us-east1/prod0/core/infra");
    ws.write_providers(&dir, "beta", &[("beta-prod0-svc", "deploy")]);
    let broker = FakeBroker::new();
    broker.fail_read("gcp_beta-prod0-svc/key/deploy", ReadFailure::Denied);

    let cmd = VaultCommand::new(ws.context(&dir), &broker);
    let err = cmd.execute(VaultOperation::Read, &settings()).unwrap_err();

    assert!(matches!(err, FyError::LeaseDenied { .. }), "got {err:?}");
    assert_eq!(broker.revokes(), ["gcp_acme-prod0-core/key/deploy/1"]);
}

#[test]
fn resolution_failure_never_reaches_the_broker() {
    let ws = Workspace::without_config();
    let dir = ws.deployment_dir("us-east1/prod0/core/infra");
    let broker = FakeBroker::new();

    let cmd = VaultCommand::new(ws.context(&dir), &broker);
    let err = cmd.execute(VaultOperation::Read, &settings()).unwrap_err();

    assert!(matches!(err, FyError::MissingConfig { .. }), "got {err:?}");
    assert!(broker.calls().is_empty());
}

#[test]
fn invalid_provider_file_aborts_before_any_read() {
    let ws = Workspace::new("acme");
    let dir = ws.deployment_dir("us-east1/prod0/core/infra");
    std::fs::write(dir.join("broken.providers.yml"), "providers: [not, a, map]\n").unwrap();
    let broker = FakeBroker::new();

    let cmd = VaultCommand::new(ws.context(&dir), &broker);
    let err = cmd.execute(VaultOperation::Read, &settings()).unwrap_err();

    assert!(matches!(err, FyError::InvalidProviders { .. }), "got {err:?}");
    assert!(broker.calls().is_empty());
}

#[test]
fn corrupt_lease_file_does_not_block_revoking_the_others() {
    let ws = Workspace::new("acme");
    let dir = ws.deployment_dir("us-east1/prod0/core/infra");
    ws.write_providers(&dir, "beta", &[("beta-prod0-svc", "deploy")]);
    let broker = FakeBroker::new();

    let cmd = VaultCommand::new(ws.context(&dir), &broker);
    cmd.execute(VaultOperation::Read, &settings()).unwrap();
    let store = ws.context(&dir).lease_store();
    let default_lease = store.lease_path(&LeaseTarget::new("acme-prod0-core", "deploy"));
    std::fs::write(&default_lease, "{trunc").unwrap();

    let cmd = VaultCommand::new(ws.context(&dir), &broker);
    let report = cmd.execute(VaultOperation::Revoke, &settings()).unwrap();
    let VaultReport::Revoke { loaded, revoked } = &report else {
        panic!("expected revoke report");
    };

    assert_eq!(broker.revokes(), ["gcp_beta-prod0-svc/key/deploy/2"]);
    assert_eq!(revoked.revoked.len(), 1);
    assert_eq!(loaded.failures.len(), 1);
    assert_eq!(loaded.failures[0].target.project_id, "acme-prod0-core");
    assert!(default_lease.is_file());

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, FyError::LoadIncomplete { failures: 1 }), "got {err:?}");
    assert_ne!(err.exit_code(), 0);
}
