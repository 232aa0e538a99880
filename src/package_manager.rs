use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::manifest::Manifest;
use crate::prompt::{PromptError, Prompted, Prompter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Cnpm,
}

impl PackageManager {
    pub const ALL: [PackageManager; 4] = [
        PackageManager::Npm,
        PackageManager::Yarn,
        PackageManager::Pnpm,
        PackageManager::Cnpm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Cnpm => "cnpm",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPackageManager(pub String);

impl FromStr for PackageManager {
    type Err = UnknownPackageManager;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        PackageManager::ALL
            .into_iter()
            .find(|pm| pm.as_str() == raw)
            .ok_or_else(|| UnknownPackageManager(raw.to_string()))
    }
}

/// Lockfiles in the order they are checked, each owned by one manager.
pub const LOCKFILES: &[(&str, PackageManager)] = &[
    ("package-lock.json", PackageManager::Npm),
    ("npm-shrinkwrap.json", PackageManager::Npm),
    ("yarn.lock", PackageManager::Yarn),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
];

/// The manager whose override field gets written, and the binary to run.
/// `executable` only differs from `manager` when an unknown name was forced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub manager: PackageManager,
    pub executable: String,
}

impl From<PackageManager> for Resolution {
    fn from(manager: PackageManager) -> Self {
        Self {
            manager,
            executable: manager.as_str().to_string(),
        }
    }
}

pub fn resolve(
    explicit: Option<&str>,
    manifest: &Manifest,
    dir: &Path,
    prompter: &mut dyn Prompter,
) -> Result<Prompted<Resolution>, PromptError> {
    if let Some(raw) = explicit {
        return Ok(Prompted::Answered(from_explicit(raw)));
    }

    if let Some(declared) = manifest.declared_package_manager() {
        return Ok(Prompted::Answered(from_declared(declared).into()));
    }

    let found = detect_lockfile_managers(dir);
    debug!(candidates = ?found, "checked lockfiles in {}", dir.display());
    if let [only] = found.as_slice() {
        return Ok(Prompted::Answered((*only).into()));
    }

    let choices: &[PackageManager] = if found.is_empty() {
        &PackageManager::ALL
    } else {
        &found
    };
    let picked = prompter.select_package_manager(choices)?;
    Ok(match picked {
        Prompted::Answered(pm) => Prompted::Answered(pm.into()),
        Prompted::Cancelled => Prompted::Cancelled,
    })
}

fn from_explicit(raw: &str) -> Resolution {
    match raw.parse::<PackageManager>() {
        Ok(manager) => manager.into(),
        Err(_) => {
            warn!("unknown package manager '{raw}', treating it as npm-compatible");
            Resolution {
                manager: PackageManager::Npm,
                executable: raw.to_string(),
            }
        }
    }
}

fn from_declared(declared: &str) -> PackageManager {
    let name = declared.split('@').next().unwrap_or_default();
    name.parse().unwrap_or_else(|_| {
        warn!("unknown packageManager '{declared}' in manifest, falling back to npm");
        PackageManager::Npm
    })
}

/// Managers whose lockfile exists in `dir`, deduplicated, in lockfile order.
pub fn detect_lockfile_managers(dir: &Path) -> Vec<PackageManager> {
    let mut found = Vec::new();
    for (file, manager) in LOCKFILES {
        if dir.join(file).exists() && !found.contains(manager) {
            found.push(*manager);
        }
    }
    found
}
