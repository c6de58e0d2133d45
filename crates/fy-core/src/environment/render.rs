//! Renderings of the resolved environment: padded listing, shell assignments
//! and flat JSON.

use std::path::PathBuf;

use super::identity::DeploymentIdentity;
use super::tool_env::ToolEnvironment;
use crate::config::{FyPaths, VaultSettings};

/// Character used to mask sensitive values.
pub const MASK_CHAR: char = '*';

/// Fields whose values are masked when obfuscation is requested.
pub const SENSITIVE_FIELDS: &[&str] = &["vault_token"];

/// Fields that exist on the view for internal use and are never rendered.
pub const INTERNAL_FIELDS: &[&str] = &["vault_dir", "credentials_dir", "env", "kubectl_context"];

/// Everything `fy env` knows about the current invocation.
#[derive(Debug, Clone)]
pub struct EnvironmentView {
    identity: DeploymentIdentity,
    config_dir: PathBuf,
    vault_dir: PathBuf,
    credentials_dir: PathBuf,
    vault: Option<VaultSettings>,
    google_application_credentials: Option<PathBuf>,
    env: Option<ToolEnvironment>,
}

impl EnvironmentView {
    pub fn new(identity: DeploymentIdentity, paths: &FyPaths) -> Self {
        Self {
            identity,
            config_dir: paths.config_dir().to_path_buf(),
            vault_dir: paths.vault_dir(),
            credentials_dir: paths.credentials_dir(),
            vault: None,
            google_application_credentials: None,
            env: None,
        }
    }

    /// Attach vault settings; the default credential file follows from the
    /// project id and the vault role.
    pub fn with_vault(mut self, vault: VaultSettings) -> Self {
        let file = self
            .credentials_dir
            .join(format!("{}_{}.json", self.identity.project_id(), vault.role));
        self.google_application_credentials = Some(file);
        self.vault = Some(vault);
        self
    }

    pub fn with_tool_env(mut self, env: ToolEnvironment) -> Self {
        self.env = Some(env);
        self
    }

    pub fn identity(&self) -> &DeploymentIdentity {
        &self.identity
    }

    /// All fields in display order, including internal ones.
    fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        let identity = &self.identity;
        let display = |p: &PathBuf| p.display().to_string();
        vec![
            ("org_id", Some(identity.org_id().to_string())),
            ("region", Some(identity.region().to_string())),
            ("environment", Some(identity.environment().to_string())),
            ("deployment", Some(identity.deployment().to_string())),
            ("environment_type", Some(identity.environment_type().to_string())),
            ("deployment_type", Some(identity.kind().to_string())),
            (
                "deployment_path",
                Some(identity.deployment_path().display().to_string()),
            ),
            ("iac_root_dir", Some(identity.iac_root().display().to_string())),
            ("config_dir", Some(display(&self.config_dir))),
            ("vault_dir", Some(display(&self.vault_dir))),
            ("project_id", Some(identity.project_id())),
            ("vault_addr", self.vault.as_ref().map(|v| v.addr.clone())),
            ("vault_token", self.vault.as_ref().map(|v| v.token.clone())),
            ("vault_role", self.vault.as_ref().map(|v| v.role.clone())),
            ("k8s_cluster", identity.cluster_name().map(str::to_string)),
            ("k8s_app", identity.app_name().map(str::to_string)),
            (
                "env",
                self.env
                    .as_ref()
                    .map(|env| format!("{} variables", env.len())),
            ),
            ("credentials_dir", Some(display(&self.credentials_dir))),
            (
                "google_application_credentials",
                self.google_application_credentials.as_ref().map(display),
            ),
            ("kubectl_context", identity.cluster_context()),
        ]
    }

    /// Populated, renderable properties.
    pub fn properties(&self, obfuscate: bool) -> Properties {
        let mut properties = Properties::default();
        for (key, value) in self.fields() {
            if let Some(value) = value {
                properties.push(key, value);
            }
        }
        if obfuscate {
            properties.obfuscate(SENSITIVE_FIELDS);
        }
        properties
    }
}

/// Ordered key/value pairs ready for rendering.
///
/// Internal fields are dropped on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if INTERNAL_FIELDS.contains(&key.as_str()) {
            return;
        }
        self.entries.push((key, value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the value of each listed field with a same-length mask.
    pub fn obfuscate(&mut self, sensitive: &[&str]) {
        for (key, value) in &mut self.entries {
            if sensitive.contains(&key.as_str()) {
                *value = mask(value);
            }
        }
    }

    /// `key<pad>= value` lines, keys padded to the longest key plus one.
    pub fn to_pretty(&self) -> String {
        let padding = self.keys().map(str::len).max().unwrap_or(0) + 1;
        self.entries
            .iter()
            .map(|(key, value)| format!("{key:<padding$}= {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `KEY="value"` lines suitable for `eval` or `source`.
    pub fn to_shell(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", key.to_uppercase(), shell_escape(value)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

fn mask(value: &str) -> String {
    std::iter::repeat_n(MASK_CHAR, value.chars().count()).collect()
}

fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
