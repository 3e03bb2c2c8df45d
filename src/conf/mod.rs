//! Provides application configuration options.
//!
//! Configuration options can be parsed from config files in TOML format.

pub mod stage;
pub mod thumbnail;

use std::{collections::HashMap, env};

use config::{
    Config, ConfigError, Environment, File, FileFormat, Source, Value,
};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

#[doc(inline)]
pub use self::{stage::Stage, thumbnail::Thumbnail};

/// CLI argument that is responsible for holding application configuration
/// file path.
static APP_CONF_PATH_CMD_ARG_NAME: &str = "--conf";

/// Environment variable that is responsible for holding application
/// configuration file path.
static APP_CONF_PATH_ENV_VAR_NAME: &str = "MEDEA_STAGE_CONF";

/// Prefix of environment variables overriding configuration options.
static APP_CONF_ENV_PREFIX: &str = "MEDEA_STAGE";

/// Holds application config.
#[derive(Clone, Debug, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct Conf {
    /// Stage settings.
    pub stage: Stage,

    /// Thumbnails settings.
    pub thumbnail: Thumbnail,
}

impl Source for Conf {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<HashMap<String, Value>, ConfigError> {
        let serialized = toml::to_string(self)
            .map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        File::from_str(serialized.as_str(), FileFormat::Toml).collect()
    }
}

impl Conf {
    /// Creates new [`Conf`] and applies values from such sources
    /// and in that order:
    /// - default values;
    /// - configuration file, the name of which is given as a command line
    ///   parameter or environment variable;
    /// - environment variables.
    ///
    /// # Errors
    ///
    /// If some source cannot be read or holds malformed values.
    pub fn parse() -> Result<Self, ConfigError> {
        let mut cfg = Config::new();

        cfg.merge(Self::default())?;

        let file_name = get_conf_file_name(
            env::var(APP_CONF_PATH_ENV_VAR_NAME),
            env::args(),
        );
        if let Some(path) = file_name {
            cfg.merge(File::with_name(&path))?;
        }

        cfg.merge(
            Environment::with_prefix(APP_CONF_ENV_PREFIX).separator("."),
        )?;

        cfg.try_into()
    }
}

/// Returns the name of the configuration file, if defined.
fn get_conf_file_name<T>(
    env_var: Result<String, env::VarError>,
    cmd_args: T,
) -> Option<String>
where
    T: Iterator<Item = String>,
{
    if let Ok(path) = env_var {
        Some(path)
    } else {
        let mut args = cmd_args.skip_while(|x| x != APP_CONF_PATH_CMD_ARG_NAME);
        if args.next().is_some() {
            args.next()
        } else {
            None
        }
    }
}
