//! Package installation into the execution environment.

use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use tracing::{info, warn};

use crate::execution::{ExecutionClient, InstallOutcome};

/// Packages offered for one-step install when missing.
pub const COMMON_PACKAGES: &[&str] = &[
    "requests",
    "numpy",
    "pandas",
    "matplotlib",
    "scipy",
    "beautifulsoup4",
    "pillow",
    "openpyxl",
    "seaborn",
    "plotly",
];

/// Installs packages through the service and remembers what is installed.
///
/// The installed set only grows: there is no uninstall, and `refresh` merges.
pub struct PackageResolver<C: ExecutionClient> {
    client: Arc<C>,
    installed: Mutex<BTreeSet<String>>,
    in_flight: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl<C: ExecutionClient> PackageResolver<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            installed: Mutex::new(BTreeSet::new()),
            in_flight: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    /// Install `name`. One request per call; refused while another install runs.
    pub async fn install(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            self.record_error(Some("Package name cannot be empty".into()));
            return false;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(package = name, "install refused: another install is in progress");
            self.record_error(Some("Another package installation is in progress".into()));
            return false;
        }

        let outcome = {
            let _flight = InFlight(&self.in_flight);
            info!(package = name, "installing package");
            self.client.install_package(name).await
        };

        match outcome {
            InstallOutcome::Installed { message } => {
                info!(package = name, "{}", message);
                self.lock_installed().insert(name.to_string());
                self.record_error(None);
                true
            }
            InstallOutcome::Failed { error } => {
                warn!(package = name, "install failed: {}", error);
                self.record_error(Some(error));
                false
            }
        }
    }

    /// Merge the service's package listing into the installed set.
    pub async fn refresh(&self) -> crate::Result<usize> {
        let listed = self.client.list_packages().await?;
        let mut installed = self.lock_installed();
        let before = installed.len();
        installed.extend(listed);
        Ok(installed.len() - before)
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.lock_installed().contains(name.trim())
    }

    pub fn is_installing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Sorted snapshot of the installed set.
    pub fn installed(&self) -> Vec<String> {
        self.lock_installed().iter().cloned().collect()
    }

    /// Common packages not installed yet.
    pub fn suggestions(&self) -> Vec<&'static str> {
        let installed = self.lock_installed();
        COMMON_PACKAGES
            .iter()
            .copied()
            .filter(|p| !installed.contains(*p))
            .collect()
    }

    /// Error text of the most recent failed install, cleared on success.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record_error(&self, error: Option<String>) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = error;
    }

    fn lock_installed(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.installed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clears the install flag when the install ends, including when its future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
