mod support;

use fy_core::commands::{EnvCommand, EnvFormat, EnvOptions};
use fy_core::config::VaultSettings;
use fy_core::environment::{EnvironmentView, ToolEnvironment, resolve};

use support::Workspace;

fn vault_settings() -> VaultSettings {
    VaultSettings {
        role: "deploy".to_string(),
        addr: "https://vault.example.com:8200".to_string(),
        token: "s.abcdef123456".to_string(),
    }
}

#[test]
fn pretty_listing_pads_keys_and_masks_token() {
    let ws = Workspace::new("acme");
    let dir = ws.deployment_dir("us-east1/prod0/core/app/cluster/main");
    let cmd = EnvCommand::new(ws.context(&dir));

    let options = EnvOptions::new(EnvFormat::Pretty).with_vault(vault_settings());
    let output = cmd.execute(&options).unwrap();

    // google_application_credentials is the longest key.
    let width = "google_application_credentials".len() + 1;
    let lines: Vec<&str> = output.lines().collect();
    let mask = "*".repeat("s.abcdef123456".len());
    assert!(lines.contains(&format!("{:<width$}= acme", "org_id").as_str()));
    assert!(lines.contains(&format!("{:<width$}= {mask}", "vault_token").as_str()));
    assert!(lines.contains(&format!("{:<width$}= main", "k8s_cluster").as_str()));
    assert!(!output.contains("s.abcdef123456"));
    assert!(!output.contains("k8s_app"));
}

#[test]
fn raw_mode_shows_token() {
    let ws = Workspace::new("acme");
    let dir = ws.deployment_dir("us-east1/prod0/core/infra");
    let cmd = EnvCommand::new(ws.context(&dir));

    let options = EnvOptions::new(EnvFormat::Shell)
        .with_vault(vault_settings())
        .with_obfuscate(false);
    let output = cmd.execute(&options).unwrap();

    assert!(output.lines().any(|l| l == "VAULT_TOKEN=\"s.abcdef123456\""));
    assert!(output.lines().any(|l| l == "PROJECT_ID=\"acme-prod0-core\""));
    assert!(output.lines().any(|l| l == "DEPLOYMENT_TYPE=\"infra\""));
}

#[test]
fn skipping_vault_leaves_vault_fields_out() {
    let ws = Workspace::new("acme");
    let dir = ws.deployment_dir("us-east1/prod0/core/infra");
    let cmd = EnvCommand::new(ws.context(&dir));

    let output = cmd.execute(&EnvOptions::new(EnvFormat::Shell)).unwrap();

    assert!(!output.contains("VAULT_"));
    assert!(output.contains("ORG_ID=\"acme\""));
}

#[test]
fn json_is_a_flat_object_of_strings() {
    let ws = Workspace::new("acme");
    let dir = ws.deployment_dir("us-east1/test0/core/app/cluster/main/web");
    let cmd = EnvCommand::new(ws.context(&dir));

    let options = EnvOptions::new(EnvFormat::Json).with_vault(vault_settings());
    let output = cmd.execute(&options).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let object = value.as_object().unwrap();

    assert!(object.values().all(serde_json::Value::is_string));
    assert_eq!(object["environment_type"], "test");
    assert_eq!(object["k8s_app"], "web");
    assert_eq!(object["vault_token"], "*".repeat(14));
    assert_eq!(object["vault_role"], "deploy");
}

#[test]
fn internal_fields_never_render() {
    let ws = Workspace::new("acme");
    let dir = ws.deployment_dir("us-east1/prod0/core/app/cluster/main/web");
    let identity = resolve(&dir).unwrap();

    let view = EnvironmentView::new(identity, &ws.paths)
        .with_vault(vault_settings())
        .with_tool_env(ToolEnvironment::new(Vec::new(), &ws.paths));

    for obfuscate in [true, false] {
        let properties = view.properties(obfuscate);
        for internal in ["credentials_dir", "env", "kubectl_context", "vault_dir"] {
            assert!(properties.get(internal).is_none(), "{internal} rendered");
        }
        let json = properties.to_json();
        assert!(json.get("kubectl_context").is_none());
        assert!(!properties.to_shell().contains("KUBECTL_CONTEXT"));
    }
}

#[test]
fn shell_values_are_escaped() {
    let ws = Workspace::new("acme");
    let dir = ws.deployment_dir("us-east1/prod0/core/infra");
    let identity = resolve(&dir).unwrap();

    let mut settings = vault_settings();
    settings.token = "a\"b$c".to_string();
    let view = EnvironmentView::new(identity, &ws.paths).with_vault(settings);

    let shell = view.properties(false).to_shell();
    assert!(shell.lines().any(|l| l == r#"VAULT_TOKEN="a\"b\$c""#));
}
