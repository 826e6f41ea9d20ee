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

use super::{init_test, test_time, HOST, REGION};
use anyhow::Result;
use async_trait::async_trait;
use iotsign_aws_iot::{
    Config, Connector, Credential, ResolveEndpoint, StaticCredentialProvider, TrustStore,
};
use iotsign_core::{Context, Error, ErrorKind, ProvideCredential, StaticEnv};
use iotsign_file_read_tokio::TokioFileRead;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

// Minimal DER SEQUENCE.
const FAKE_PEM_BODY: &str = "MAMCAQE=";

fn pem_file(label: &str) -> Result<NamedTempFile> {
    let mut f = NamedTempFile::new()?;
    writeln!(
        f,
        "-----BEGIN {label}-----\n{FAKE_PEM_BODY}\n-----END {label}-----"
    )?;
    Ok(f)
}

fn path_of(f: &NamedTempFile) -> String {
    f.path().to_string_lossy().to_string()
}

fn test_ctx(envs: &[(&str, &str)]) -> Context {
    Context::new().with_file_read(TokioFileRead).with_env(StaticEnv {
        home_dir: None,
        envs: envs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    })
}

#[derive(Debug)]
struct BrokenEndpoint;

#[async_trait]
impl ResolveEndpoint for BrokenEndpoint {
    async fn resolve_endpoint(&self, _: &Context) -> iotsign_core::Result<Option<String>> {
        Err(Error::unexpected("directory lookup failed"))
    }
}

#[derive(Debug)]
struct BrokenCredential;

#[async_trait]
impl ProvideCredential for BrokenCredential {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> iotsign_core::Result<Option<Credential>> {
        Err(Error::credential_invalid("sts refused"))
    }
}

#[tokio::test]
async fn test_presigned_from_env() -> Result<()> {
    init_test();

    let ctx = test_ctx(&[
        ("AWS_REGION", REGION),
        ("AWS_IOT_ENDPOINT", HOST),
        ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
        ("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY"),
        ("AWS_SESSION_TOKEN", "token"),
    ]);
    let config = Config::default().from_env(&ctx).from_profile(&ctx).await;

    let opts = Connector::new(ctx, config)
        .with_time(test_time())
        .connect_options()
        .await?;

    let expected = iotsign_aws_iot::presign_url(
        &Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY")
            .with_session_token("token"),
        REGION,
        HOST,
        test_time(),
    );
    assert_eq!(opts.broker_url, expected);
    assert_eq!(opts.trust_store, TrustStore::amazon_root_ca()?);
    assert!(opts.client_certificate.is_none());
    Ok(())
}

#[tokio::test]
async fn test_presigned_from_profile_files() -> Result<()> {
    init_test();

    let mut config_file = NamedTempFile::new()?;
    writeln!(config_file, "[profile device]\nregion = {REGION}")?;
    let mut credentials_file = NamedTempFile::new()?;
    writeln!(
        credentials_file,
        "[device]\naws_access_key_id = AKIDPROFILE\naws_secret_access_key = secret"
    )?;

    let ctx = test_ctx(&[("AWS_IOT_ENDPOINT", HOST)]);
    let config = Config {
        profile: Some("device".to_string()),
        config_file: Some(path_of(&config_file)),
        shared_credentials_file: Some(path_of(&credentials_file)),
        ..Default::default()
    }
    .from_env(&ctx)
    .from_profile(&ctx)
    .await;
    assert_eq!(config.region.as_deref(), Some(REGION));

    let url = Connector::new(ctx, config)
        .with_time(test_time())
        .presigned_url()
        .await?;
    assert!(url.contains("X-Amz-Credential=AKIDPROFILE%2F20240630%2Feu-west-1%2F"));
    Ok(())
}

#[tokio::test]
async fn test_mutual_tls() -> Result<()> {
    init_test();

    let cert = pem_file("CERTIFICATE")?;
    let key = pem_file("PRIVATE KEY")?;
    let root = pem_file("CERTIFICATE")?;

    let config = Config {
        endpoint: Some(HOST.to_string()),
        root_ca_file: Some(path_of(&root)),
        client_certificate_file: Some(path_of(&cert)),
        client_key_file: Some(path_of(&key)),
        ..Default::default()
    };

    // No credential and no region are needed for mutual tls.
    let opts = Connector::new(test_ctx(&[]), config.clone())
        .connect_options()
        .await?;
    assert_eq!(opts.broker_url, format!("mqtts://{HOST}:8883"));
    assert_eq!(opts.trust_store.len(), 1);
    let client = opts.client_certificate.expect("client certificate must be set");
    assert_eq!(client.private_key(), &[0x30, 0x03, 0x02, 0x01, 0x01]);

    let opts = Connector::new(
        test_ctx(&[]),
        Config {
            port: Some(443),
            ..config
        },
    )
    .connect_options()
    .await?;
    assert_eq!(opts.broker_url, format!("mqtts://{HOST}:443"));
    Ok(())
}

#[tokio::test]
async fn test_static_credential_overrides_default_chain() -> Result<()> {
    let ctx = test_ctx(&[
        ("AWS_ACCESS_KEY_ID", "AKIDENV"),
        ("AWS_SECRET_ACCESS_KEY", "secret"),
    ]);
    let config = Config {
        region: Some(REGION.to_string()),
        endpoint: Some(HOST.to_string()),
        ..Default::default()
    };

    let url = Connector::new(ctx, config)
        .with_credential_provider(StaticCredentialProvider::new("AKIDSTATIC", "secret"))
        .with_time(test_time())
        .presigned_url()
        .await?;
    assert!(url.contains("X-Amz-Credential=AKIDSTATIC%2F"));
    Ok(())
}

#[tokio::test]
async fn test_error_kinds() -> Result<()> {
    init_test();

    let base = Config {
        region: Some(REGION.to_string()),
        endpoint: Some(HOST.to_string()),
        access_key_id: Some("AKIDEXAMPLE".to_string()),
        secret_access_key: Some("secret".to_string()),
        ..Default::default()
    };
    let missing = "/this/path/does/not/exist".to_string();

    let cases: Vec<(Connector, ErrorKind)> = vec![
        (
            Connector::new(test_ctx(&[]), base.clone()).with_endpoint_resolver(BrokenEndpoint),
            ErrorKind::EndpointUnresolved,
        ),
        (
            Connector::new(
                test_ctx(&[]),
                Config {
                    endpoint: Some(format!("wss://{HOST}")),
                    ..base.clone()
                },
            ),
            ErrorKind::EndpointUnresolved,
        ),
        (
            Connector::new(test_ctx(&[]), base.clone())
                .with_credential_provider(BrokenCredential),
            ErrorKind::CredentialUnavailable,
        ),
        (
            Connector::new(test_ctx(&[]), base.clone())
                .with_credential_provider(StaticCredentialProvider::new("AKIDEXAMPLE", "")),
            ErrorKind::CredentialUnavailable,
        ),
        (
            Connector::new(
                test_ctx(&[]),
                Config {
                    root_ca_file: Some(missing.clone()),
                    ..base.clone()
                },
            ),
            ErrorKind::TrustConfiguration,
        ),
        (
            Connector::new(
                test_ctx(&[]),
                Config {
                    client_certificate_file: Some(missing.clone()),
                    client_key_file: Some(missing),
                    ..base.clone()
                },
            ),
            ErrorKind::TrustConfiguration,
        ),
        (
            Connector::new(
                test_ctx(&[]),
                Config {
                    port: Some(8883),
                    ..base
                },
            ),
            ErrorKind::ConfigInvalid,
        ),
    ];

    for (connector, kind) in cases {
        let err = connector
            .connect_options()
            .await
            .expect_err("connect options must fail");
        assert_eq!(err.kind(), kind, "{err}");
    }
    Ok(())
}

#[tokio::test]
async fn test_presigned_url_validates_config() -> Result<()> {
    let base = Config {
        region: Some(REGION.to_string()),
        endpoint: Some(HOST.to_string()),
        access_key_id: Some("AKIDEXAMPLE".to_string()),
        secret_access_key: Some("secret".to_string()),
        ..Default::default()
    };

    let invalid = [
        Config {
            port: Some(8883),
            ..base.clone()
        },
        Config {
            client_key_file: Some("/path/to/key.pem".to_string()),
            ..base.clone()
        },
    ];
    for cfg in invalid {
        let err = Connector::new(test_ctx(&[]), cfg)
            .presigned_url()
            .await
            .expect_err("presigned url must fail");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid, "{err}");
    }

    let url = Connector::new(test_ctx(&[]), base).presigned_url().await?;
    assert!(url.starts_with(&format!("wss://{HOST}/mqtt?")));
    Ok(())
}

#[tokio::test]
async fn test_explicit_keys_ignore_ambient_session_token() -> Result<()> {
    let ctx = test_ctx(&[
        ("AWS_SECRET_ACCESS_KEY", "env-secret"),
        ("AWS_SESSION_TOKEN", "ambient-sts-token"),
    ]);
    let config = Config {
        region: Some(REGION.to_string()),
        endpoint: Some(HOST.to_string()),
        access_key_id: Some("AKIDEXPLICIT".to_string()),
        secret_access_key: Some("explicit-secret".to_string()),
        ..Default::default()
    }
    .from_env(&ctx);

    let url = Connector::new(ctx, config)
        .with_time(test_time())
        .presigned_url()
        .await?;

    let expected = iotsign_aws_iot::presign_url(
        &Credential::new("AKIDEXPLICIT", "explicit-secret"),
        REGION,
        HOST,
        test_time(),
    );
    assert_eq!(url, expected);
    assert!(!url.contains("X-Amz-Security-Token"));
    Ok(())
}
