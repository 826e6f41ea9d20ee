// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::constants::*;
use ini::Ini;
use iotsign_core::{Context, Error, Result};
use log::debug;

/// Config for connecting to AWS IoT.
///
/// Every field can be set directly. `from_env` and `from_profile` only fill
/// fields that are still unset, so explicit values always win.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// `config_file` will be load from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_CONFIG_FILE`]
    /// - default to: `~/.aws/config`
    pub config_file: Option<String>,
    /// `shared_credentials_file` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SHARED_CREDENTIALS_FILE`]
    /// - default to: `~/.aws/credentials`
    pub shared_credentials_file: Option<String>,
    /// `profile` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_PROFILE`]
    /// - default to: `default`
    pub profile: Option<String>,

    /// `region` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_REGION`], then [`AWS_DEFAULT_REGION`]
    /// - profile config: `region`
    pub region: Option<String>,
    /// `endpoint` is the broker host name, without scheme or port.
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_IOT_ENDPOINT`]
    pub endpoint: Option<String>,

    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_ACCESS_KEY_ID`]
    ///
    /// The env values of `access_key_id`, `secret_access_key` and
    /// `session_token` are only used when neither key is set.
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SECRET_ACCESS_KEY`]
    pub secret_access_key: Option<String>,
    /// `session_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SESSION_TOKEN`]
    pub session_token: Option<String>,

    /// PEM bundle used instead of the bundled Amazon Root CA 1.
    pub root_ca_file: Option<String>,
    /// PEM certificate chain for mutual TLS.
    pub client_certificate_file: Option<String>,
    /// PEM private key for mutual TLS.
    pub client_key_file: Option<String>,
    /// Broker port, only valid together with a client certificate.
    pub port: Option<u16>,
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();

        let fill = |field: &mut Option<String>, key: &str| {
            if field.is_none() {
                if let Some(v) = envs.get(key).filter(|v| !v.is_empty()) {
                    *field = Some(v.to_string());
                }
            }
        };

        fill(&mut self.config_file, AWS_CONFIG_FILE);
        fill(&mut self.shared_credentials_file, AWS_SHARED_CREDENTIALS_FILE);
        fill(&mut self.profile, AWS_PROFILE);
        fill(&mut self.region, AWS_REGION);
        fill(&mut self.region, AWS_DEFAULT_REGION);
        fill(&mut self.endpoint, AWS_IOT_ENDPOINT);

        // Keys and token come from one source only.
        if self.access_key_id.is_none() && self.secret_access_key.is_none() {
            fill(&mut self.access_key_id, AWS_ACCESS_KEY_ID);
            fill(&mut self.secret_access_key, AWS_SECRET_ACCESS_KEY);
            fill(&mut self.session_token, AWS_SESSION_TOKEN);
        }

        self
    }

    /// Load region from the profile config file.
    ///
    /// Missing files and sections are ignored; credentials from the shared
    /// files are served by `ProfileCredentialProvider` instead.
    pub async fn from_profile(mut self, ctx: &Context) -> Self {
        if self.region.is_some() {
            return self;
        }

        match self.load_profile_region(ctx).await {
            Ok(Some(region)) => self.region = Some(region),
            Ok(None) => {}
            Err(err) => debug!("load region from profile failed: {err:?}"),
        }

        self
    }

    /// Profile name in effect.
    pub fn profile(&self) -> &str {
        self.profile.as_deref().unwrap_or("default")
    }

    /// Check the config for conflicting values.
    pub fn validate(&self) -> Result<()> {
        match (&self.client_certificate_file, &self.client_key_file) {
            (Some(_), None) => {
                return Err(Error::config_invalid(
                    "client_certificate_file is set without client_key_file",
                ))
            }
            (None, Some(_)) => {
                return Err(Error::config_invalid(
                    "client_key_file is set without client_certificate_file",
                ))
            }
            _ => {}
        }

        if self.port.is_some() && self.client_certificate_file.is_none() {
            return Err(Error::config_invalid(
                "port can only be specified when using client certificates",
            ));
        }

        Ok(())
    }

    async fn load_profile_region(&self, ctx: &Context) -> Result<Option<String>> {
        let path = self.config_file.as_deref().unwrap_or("~/.aws/config");
        let Some(path) = ctx.expand_home_dir(path) else {
            debug!("failed to expand homedir for path: {path}");
            return Ok(None);
        };

        let content = match ctx.file_read_as_string(&path).await {
            Ok(content) => content,
            Err(err) => {
                debug!("failed to read config file {path}: {err:?}");
                return Ok(None);
            }
        };

        let conf = Ini::load_from_str(&content).map_err(|e| {
            Error::config_invalid("failed to parse config file").with_source(anyhow::Error::new(e))
        })?;

        let section = match self.profile() {
            "default" => "default".to_string(),
            x => format!("profile {x}"),
        };

        Ok(conf
            .section(Some(section))
            .and_then(|props| props.get("region"))
            .map(|v| v.to_string()))
    }
}
