use crate::VfsError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

const CONFIG_FILE_NAME: &str = "ovfs.toml";

pub const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";

/// Authentication method for the object store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StoreAuth {
    /// Access key and secret from AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY.
    /// Absence of either variable is a session construction failure.
    #[default]
    Env,
    /// Explicit access key and secret key
    AccessKey {
        access_key_id: String,
        secret_access_key: String,
    },
    /// Anonymous access (public buckets)
    Anonymous,
}

/// Resolved static credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Credentials {
    /// Resolve credentials from the environment.
    pub fn from_env() -> Result<Self, VfsError> {
        let access_key_id = std::env::var(ACCESS_KEY_VAR)
            .map_err(|_| VfsError::Config(format!("{} is not set", ACCESS_KEY_VAR)))?;
        let secret_access_key = std::env::var(SECRET_KEY_VAR)
            .map_err(|_| VfsError::Config(format!("{} is not set", SECRET_KEY_VAR)))?;
        Ok(Self {
            access_key_id,
            secret_access_key,
        })
    }
}

/// Session configuration
///
/// All backend options are explicit here; nothing is read from process-wide
/// mutable state after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Backend region (e.g. "ap-southeast-2")
    #[serde(default = "default_region")]
    pub region: String,

    /// Endpoint override for S3-compatible services
    /// (e.g. "s3.ap-southeast-2.amazonaws.com" or "http://localhost:9000")
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Force path-style addressing (https://endpoint/bucket/key) instead of
    /// virtual-hosted-style
    #[serde(default)]
    pub path_style: bool,

    #[serde(default)]
    pub auth: StoreAuth,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            path_style: false,
            auth: StoreAuth::Env,
        }
    }
}

impl SessionConfig {
    /// Endpoint as a full URL, defaulting the scheme to https.
    pub fn endpoint_url(&self) -> Result<Option<String>, VfsError> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(None);
        };

        let raw = if endpoint.contains("://") {
            endpoint.clone()
        } else {
            format!("https://{}", endpoint)
        };

        Url::parse(&raw)
            .map_err(|e| VfsError::Config(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
        Ok(Some(raw))
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SessionConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

pub fn load_config(prefer_portable: bool) -> Result<LoadedConfig, VfsError> {
    let (path, portable) = resolve_config_path(prefer_portable)?;
    let exists = path.exists();

    let config = if exists {
        let data = fs::read_to_string(&path)?;
        toml::from_str(&data).map_err(|e| VfsError::Config(e.to_string()))?
    } else {
        SessionConfig::default()
    };

    Ok(LoadedConfig {
        config,
        path,
        exists,
        portable,
    })
}

/// Load a config file from an explicit path, bypassing directory resolution.
pub fn load_config_file(path: &Path) -> Result<SessionConfig, VfsError> {
    let data = fs::read_to_string(path)?;
    toml::from_str(&data).map_err(|e| VfsError::Config(e.to_string()))
}

pub fn save_config(path: &Path, config: &SessionConfig) -> Result<(), VfsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config).map_err(|e| VfsError::Config(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn resolve_config_path(prefer_portable: bool) -> Result<(PathBuf, bool), VfsError> {
    if let Some(portable_path) = portable_config_path() {
        if prefer_portable || portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "aecs4u", "ovfs")
        .ok_or_else(|| VfsError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
