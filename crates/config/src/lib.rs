//! # postmortem-config
//!
//! Tunables of the resolution engine, loaded from defaults, an optional `postmortem.toml` and
//! `POSTMORTEM_` prefixed environment variables, in that order of precedence.

#![warn(missing_docs, unused_crate_dependencies)]

#[macro_use]
extern crate tracing;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use postmortem_common::{
    DEFAULT_NEIGHBOR_TOLERANCE, DEFAULT_SYNTHETIC_LOOKBACK, GENERIC_REVERT_MESSAGE,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
pub use error::ExtractConfigError;

// reexport so callers can merge their own providers
pub use figment;

/// File name looked up in the root directory.
pub const FILE_NAME: &str = "postmortem.toml";

/// Prefix of environment variables overriding config values.
pub const ENV_PREFIX: &str = "POSTMORTEM_";

/// Settings that shape how program counters are resolved and failures are reported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// How many instructions to walk back from compiler-generated code looking for an
    /// instruction that maps into the authored source.
    pub synthetic_lookback: usize,
    /// How far around an instruction without a source map entry to look for a neighbour that
    /// has one.
    pub neighbor_tolerance: usize,
    /// Whether to attach the enclosing function to resolved locations.
    pub function_context: bool,
    /// Reason reported for a failure that carries no decodable payload.
    pub generic_revert_message: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            synthetic_lookback: DEFAULT_SYNTHETIC_LOOKBACK,
            neighbor_tolerance: DEFAULT_NEIGHBOR_TOLERANCE,
            function_context: true,
            generic_revert_message: GENERIC_REVERT_MESSAGE.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Loads the config from the current working directory.
    ///
    /// Falls back to the defaults if extraction fails.
    pub fn load() -> Self {
        Self::load_with_root(".")
    }

    /// Loads the config using `root` as the directory containing [`FILE_NAME`].
    ///
    /// Falls back to the defaults if extraction fails.
    pub fn load_with_root(root: impl AsRef<Path>) -> Self {
        Self::try_load_with_root(root).unwrap_or_else(|err| {
            warn!(%err, "using default resolver config");
            Self::default()
        })
    }

    /// Loads the config using `root` as the directory containing [`FILE_NAME`].
    pub fn try_load_with_root(root: impl AsRef<Path>) -> Result<Self, ExtractConfigError> {
        Self::from_figment(&Self::figment_with_root(root))
    }

    /// Extracts a config from any figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, ExtractConfigError> {
        figment.extract().map_err(ExtractConfigError::new)
    }

    /// Returns the default figment: defaults, then `./postmortem.toml`, then the environment.
    pub fn figment() -> Figment {
        Self::figment_with_root(".")
    }

    /// Returns the default figment rooted at `root`.
    pub fn figment_with_root(root: impl AsRef<Path>) -> Figment {
        let file = root.as_ref().join(FILE_NAME);
        trace!(file = %file.display(), "building resolver config figment");
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }
}
