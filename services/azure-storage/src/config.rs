use std::collections::HashMap;
use std::env;

use saskit_core::Error;
use saskit_core::Result;

use crate::constants::*;
use crate::credential::Credential;
use crate::field::Param;
use crate::field::ParameterSet;
use crate::signer::SasSigner;

/// Environment variable carrying the storage account name.
pub const AZURE_STORAGE_ACCOUNT: &str = "AZURE_STORAGE_ACCOUNT";
/// Environment variable carrying the base64 encoded account key.
pub const AZURE_STORAGE_KEY: &str = "AZURE_STORAGE_KEY";
/// Environment variable overriding [`DEFAULT_VERSION`].
pub const SASKIT_DEFAULT_VERSION: &str = "SASKIT_DEFAULT_VERSION";
/// Environment variable enabling debug info on signed tokens.
pub const SASKIT_DEBUG_INFO: &str = "SASKIT_DEBUG_INFO";

/// Config carries everything needed to build and sign tokens.
#[derive(Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Config {
    /// `account_name` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_STORAGE_ACCOUNT`]
    pub account_name: Option<String>,
    /// `account_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_STORAGE_KEY`]
    pub account_key: Option<String>,
    /// Protocol version seeded into fresh parameter sets.
    ///
    /// - env value: [`SASKIT_DEFAULT_VERSION`]
    pub default_version: String,
    /// Whether signed tokens carry the canonical path and string-to-sign.
    ///
    /// - env value: [`SASKIT_DEBUG_INFO`]
    pub debug_info: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_name: None,
            account_key: None,
            default_version: DEFAULT_VERSION.to_string(),
            debug_info: false,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("account_name", &self.account_name)
            .field(
                "account_key",
                &saskit_core::utils::Redact::from(&self.account_key),
            )
            .field("default_version", &self.default_version)
            .field("debug_info", &self.debug_info)
            .finish()
    }
}

impl Config {
    /// Load config from env.
    ///
    /// Values already set on `self` win over the environment.
    pub fn from_env(mut self) -> Result<Self> {
        let envs = env::vars().collect::<HashMap<_, _>>();

        if self.account_name.is_none() {
            self.account_name = envs.get(AZURE_STORAGE_ACCOUNT).cloned();
        }
        if self.account_key.is_none() {
            self.account_key = envs.get(AZURE_STORAGE_KEY).cloned();
        }

        if let Some(v) = envs.get(SASKIT_DEFAULT_VERSION) {
            let known = ACCOUNT_SAS_VERSIONS.contains(&v.as_str())
                || SERVICE_SAS_ONLY_VERSIONS.contains(&v.as_str());
            if !known {
                return Err(Error::config_invalid(format!(
                    "{SASKIT_DEFAULT_VERSION}={v} is not a known storage version"
                )));
            }
            self.default_version = v.to_string();
        }

        if let Some(v) = envs.get(SASKIT_DEBUG_INFO) {
            self.debug_info = matches!(
                v.to_ascii_lowercase().as_str(),
                "true" | "1" | "on"
            );
        }

        Ok(self)
    }

    /// The shared key credential, if both name and key are configured.
    pub fn credential(&self) -> Option<Credential> {
        match (&self.account_name, &self.account_key) {
            (Some(name), Some(key)) => Some(Credential::with_shared_key(name, key)),
            _ => None,
        }
    }

    /// A signer honoring [`Config::debug_info`].
    pub fn signer(&self) -> SasSigner {
        SasSigner::new().with_debug_info(self.debug_info)
    }

    /// An empty parameter set with `sv` and the account name filled in.
    pub fn parameter_set(&self) -> ParameterSet {
        let mut params = ParameterSet::new().with(Param::Version, self.default_version.as_str());
        if let Some(name) = &self.account_name {
            params.set(Param::Account, name.as_str());
        }
        params
    }
}
