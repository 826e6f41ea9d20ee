use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use ini::Ini;
use iotsign_core::{Context, Error, ProvideCredential, Result};
use log::debug;

/// ProfileCredentialProvider loads AWS credentials from configuration files.
///
/// This provider loads credentials from:
/// - `~/.aws/credentials` (or the path specified by `AWS_SHARED_CREDENTIALS_FILE`)
/// - `~/.aws/config` (or the path specified by `AWS_CONFIG_FILE`)
///
/// The profile to use is determined by:
/// 1. The profile specified via `with_profile()`
/// 2. The `AWS_PROFILE` environment variable
/// 3. Default to "default"
#[derive(Debug, Default)]
pub struct ProfileCredentialProvider {
    profile: Option<String>,
    config_file: Option<String>,
    credentials_file: Option<String>,
}

impl ProfileCredentialProvider {
    /// Create a new ProfileCredentialProvider with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the profile name to use.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the path to the config file.
    pub fn with_config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Set the path to the credentials file.
    pub fn with_credentials_file(mut self, path: impl Into<String>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    async fn load_ini(&self, ctx: &Context, path: &str) -> Result<Option<Ini>> {
        let Some(expanded_path) = ctx.expand_home_dir(path) else {
            debug!("failed to expand homedir for path: {path}");
            return Ok(None);
        };

        let content = match ctx.file_read_as_string(&expanded_path).await {
            Ok(content) => content,
            Err(err) => {
                debug!("failed to read profile file {expanded_path}: {err:?}");
                return Ok(None);
            }
        };

        let conf = Ini::load_from_str(&content).map_err(|e| {
            Error::config_invalid(format!("failed to parse profile file {expanded_path}"))
                .with_source(anyhow::Error::new(e))
        })?;
        Ok(Some(conf))
    }

    fn credential_from_section(conf: &Ini, section: &str) -> Option<Credential> {
        let props = conf.section(Some(section))?;

        let access_key_id = props.get("aws_access_key_id")?;
        let secret_access_key = props.get("aws_secret_access_key")?;

        let mut cred = Credential::new(access_key_id, secret_access_key);
        if let Some(token) = props.get("aws_session_token") {
            cred = cred.with_session_token(token);
        }
        Some(cred)
    }
}

#[async_trait]
impl ProvideCredential for ProfileCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let profile = self
            .profile
            .clone()
            .or_else(|| ctx.env_var(AWS_PROFILE))
            .unwrap_or_else(|| "default".to_string());

        let credentials_file = self
            .credentials_file
            .clone()
            .or_else(|| ctx.env_var(AWS_SHARED_CREDENTIALS_FILE))
            .unwrap_or_else(|| "~/.aws/credentials".to_string());
        if let Some(conf) = self.load_ini(ctx, &credentials_file).await? {
            if let Some(cred) = Self::credential_from_section(&conf, &profile) {
                debug!("loaded credential for profile {profile} from {credentials_file}");
                return Ok(Some(cred));
            }
        }

        let config_file = self
            .config_file
            .clone()
            .or_else(|| ctx.env_var(AWS_CONFIG_FILE))
            .unwrap_or_else(|| "~/.aws/config".to_string());
        if let Some(conf) = self.load_ini(ctx, &config_file).await? {
            let section = match profile.as_str() {
                "default" => "default".to_string(),
                x => format!("profile {x}"),
            };
            if let Some(cred) = Self::credential_from_section(&conf, &section) {
                debug!("loaded credential for profile {profile} from {config_file}");
                return Ok(Some(cred));
            }
        }

        Ok(None)
    }
}
