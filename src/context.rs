use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::{
    auth::{AuthGate, Identity},
    repository::Repository,
    storage::FsStorage,
};

/// Values from the TOML secret store (`KEY = "value"` pairs).
#[derive(Debug, Default)]
pub(crate) struct SecretStore {
    table: toml::Table,
}

impl SecretStore {
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Secret store({path:?}) does not exist. ignoring...");
                return Self::default();
            }
            Err(e) => {
                warn!("Secret store({path:?}) is unreadable: {e}. ignoring...");
                return Self::default();
            }
        };
        match content.parse::<toml::Table>() {
            Ok(table) => Self { table },
            Err(e) => {
                warn!("Secret store({path:?}) is not valid TOML: {e}. ignoring...");
                Self::default()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.table
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

/// Environment first (empty counts as unset), then the secret store, then
/// `default`.
pub(crate) fn resolve(
    key: &str,
    default: &str,
    env: &dyn Fn(&str) -> Option<String>,
    secrets: &SecretStore,
) -> String {
    if let Some(v) = env(key).filter(|v| !v.is_empty()) {
        debug!("{key} taken from environment");
        return v;
    }
    if let Some(v) = secrets.get(key) {
        debug!("{key} taken from secret store");
        return v;
    }
    default.to_string()
}

pub(crate) fn auth_gate(env: &dyn Fn(&str) -> Option<String>, secrets: &SecretStore) -> AuthGate {
    let gate = AuthGate {
        admin: Identity {
            id: resolve("ADMIN_ID", "admin", env, secrets),
            secret: resolve("ADMIN_PW", "", env, secrets),
        },
        work: Identity {
            id: resolve("WORK_ID", "work", env, secrets),
            secret: resolve("WORK_PW", "", env, secrets),
        },
    };
    for identity in [&gate.admin, &gate.work] {
        if identity.secret.is_empty() {
            warn!("no password configured for {:?}; it cannot log in", identity.id);
        }
    }
    gate
}

#[derive(Debug)]
pub(crate) struct Context {
    pub root: PathBuf,
    pub gate: AuthGate,
}

impl Context {
    /// Expects `.env` to be loaded already.
    pub fn init(root: PathBuf, secrets_path: &Path) -> Self {
        let secrets = SecretStore::load(secrets_path);
        let env = |key: &str| std::env::var(key).ok();
        Self {
            root,
            gate: auth_gate(&env, &secrets),
        }
    }

    pub fn repository(&self) -> Repository {
        Repository::new(Box::new(FsStorage::new(&self.root)))
    }
}
