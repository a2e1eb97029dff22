/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Service preferences for the hosting binary.
//!
//! Built-in defaults, overlaid from an optional TOML file, overlaid again by
//! command-line flags. A broken preferences file degrades to defaults with a
//! warning rather than refusing to start.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::Deserialize;

use crate::lookup::DEFAULT_LOOKUP_TIMEOUT;
use crate::protocol::{DEFAULT_CONFIG_PAGE, DEFAULT_SERVICE_DOMAIN, TargetResolver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePrefs {
    /// The redirector's own domain, for recognizing already-redirected URLs
    /// and building web fallbacks.
    pub service_domain: String,
    /// The service's configuration-page identifier; a self-referential
    /// non-target when it shows up as a parse result.
    pub config_page: String,
    pub lookup_timeout: Duration,
    /// Where the durable record store lives. Defaults to the platform data
    /// directory.
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct PrefsFile {
    service_domain: Option<String>,
    config_page: Option<String>,
    lookup_timeout_secs: Option<u64>,
    state_dir: Option<PathBuf>,
}

impl Default for ServicePrefs {
    fn default() -> Self {
        Self {
            service_domain: DEFAULT_SERVICE_DOMAIN.to_string(),
            config_page: DEFAULT_CONFIG_PAGE.to_string(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            state_dir: None,
        }
    }
}

impl ServicePrefs {
    pub fn load(path: Option<&Path>) -> Self {
        let mut prefs = Self::default();
        let Some(path) = path else {
            return prefs;
        };
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Unreadable preferences file {}: {e}", path.display());
                return prefs;
            },
        };
        match toml::from_str::<PrefsFile>(&raw) {
            Ok(file) => prefs.apply(file),
            Err(e) => warn!("Ignoring broken preferences file {}: {e}", path.display()),
        }
        prefs
    }

    fn apply(&mut self, file: PrefsFile) {
        if let Some(service_domain) = file.service_domain {
            self.service_domain = service_domain;
        }
        if let Some(config_page) = file.config_page {
            self.config_page = config_page;
        }
        if let Some(secs) = file.lookup_timeout_secs {
            self.lookup_timeout = Duration::from_secs(secs);
        }
        if file.state_dir.is_some() {
            self.state_dir = file.state_dir;
        }
    }

    pub fn resolver(&self) -> TargetResolver {
        TargetResolver::new(self.service_domain.clone(), self.config_page.clone())
    }

    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join("webap"))
            .unwrap_or_else(|| PathBuf::from(".webap"))
    }
}
