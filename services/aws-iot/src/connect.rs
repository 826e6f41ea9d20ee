use crate::constants::DEFAULT_MQTTS_PORT;
use crate::provide_credential::{
    ConfigCredentialProvider, EnvCredentialProvider, ProfileCredentialProvider,
};
use crate::resolve_endpoint::{check_host, EnvEndpoint, ResolveEndpointChain, StaticEndpoint};
use crate::{
    ClientCertificate, Config, Credential, PresignedUrlSigner, ResolveEndpoint, TrustStore,
};
use iotsign_core::time::DateTime;
use iotsign_core::{
    Context, Error, ProvideCredential, ProvideCredentialChain, Result, SigningCredential,
};
use log::debug;
use std::sync::Arc;

/// ConnectOptions is everything an mqtt client needs to reach the broker.
///
/// Client id, keep alive and session flags stay with the mqtt client.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// `wss://{host}/mqtt?...` for presigned WebSocket connections, or
    /// `mqtts://{host}:{port}` for mutual TLS.
    pub broker_url: String,
    /// Roots used to validate the broker certificate.
    pub trust_store: TrustStore,
    /// Client certificate, set only for mutual TLS.
    pub client_certificate: Option<ClientCertificate>,
}

/// Connector resolves credentials, endpoint and trust configuration, then
/// builds the broker url.
///
/// Nothing is cached: every call loads a fresh credential and signs with the
/// current time.
#[derive(Debug, Clone)]
pub struct Connector {
    ctx: Context,
    config: Arc<Config>,
    credential: Arc<dyn ProvideCredential<Credential = Credential>>,
    endpoint: Arc<dyn ResolveEndpoint>,

    time: Option<DateTime>,
}

impl Connector {
    /// Create a new connector.
    ///
    /// Credentials are taken from the config keys, then the environment, then
    /// the shared profile files. The endpoint is taken from the config, then
    /// `AWS_IOT_ENDPOINT`.
    pub fn new(ctx: Context, config: Config) -> Self {
        let config = Arc::new(config);

        let mut profile = ProfileCredentialProvider::new();
        if let Some(v) = &config.profile {
            profile = profile.with_profile(v);
        }
        if let Some(v) = &config.config_file {
            profile = profile.with_config_file(v);
        }
        if let Some(v) = &config.shared_credentials_file {
            profile = profile.with_credentials_file(v);
        }

        let credential = ProvideCredentialChain::new()
            .push(ConfigCredentialProvider::new(config.clone()))
            .push(EnvCredentialProvider::new())
            .push(profile);

        let mut endpoint = ResolveEndpointChain::new();
        if let Some(host) = &config.endpoint {
            endpoint = endpoint.push(StaticEndpoint::new(host));
        }
        let endpoint = endpoint.push(EnvEndpoint);

        Self {
            ctx,
            config,
            credential: Arc::new(credential),
            endpoint: Arc::new(endpoint),

            time: None,
        }
    }

    /// Replace the credential strategy.
    pub fn with_credential_provider(
        mut self,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        self.credential = Arc::new(provider);
        self
    }

    /// Replace the endpoint strategy, e.g. with a directory lookup.
    pub fn with_endpoint_resolver(mut self, resolver: impl ResolveEndpoint) -> Self {
        self.endpoint = Arc::new(resolver);
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// Presigned urls are only accepted within five minutes of their time.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Build the mqtt connection options.
    pub async fn connect_options(&self) -> Result<ConnectOptions> {
        self.config.validate()?;

        let host = self.resolve_endpoint().await?;

        let trust_store = match &self.config.root_ca_file {
            Some(path) => TrustStore::from_file(&self.ctx, path).await?,
            None => TrustStore::amazon_root_ca()?,
        };

        if let (Some(cert), Some(key)) = (
            &self.config.client_certificate_file,
            &self.config.client_key_file,
        ) {
            let client_certificate = ClientCertificate::from_files(&self.ctx, cert, key).await?;
            let port = self.config.port.unwrap_or(DEFAULT_MQTTS_PORT);
            debug!("using mutual tls to {host}:{port}");

            return Ok(ConnectOptions {
                broker_url: format!("mqtts://{host}:{port}"),
                trust_store,
                client_certificate: Some(client_certificate),
            });
        }

        let broker_url = self.sign(&host).await?;
        Ok(ConnectOptions {
            broker_url,
            trust_store,
            client_certificate: None,
        })
    }

    /// Build the presigned `wss://` url alone.
    pub async fn presigned_url(&self) -> Result<String> {
        self.config.validate()?;

        let host = self.resolve_endpoint().await?;
        self.sign(&host).await
    }

    async fn resolve_endpoint(&self) -> Result<String> {
        let host = self
            .endpoint
            .resolve_endpoint(&self.ctx)
            .await
            .map_err(|e| Error::endpoint_unresolved("failed to resolve endpoint").with_source(e))?
            .ok_or_else(|| Error::endpoint_unresolved("no endpoint configured or discovered"))?;

        check_host(&host)?;
        Ok(host)
    }

    async fn sign(&self, host: &str) -> Result<String> {
        let cred = self
            .credential
            .provide_credential(&self.ctx)
            .await
            .map_err(|e| Error::credential_unavailable("failed to load credential").with_source(e))?
            .ok_or_else(|| Error::credential_unavailable("no credential found"))?;
        if !cred.is_valid() {
            return Err(Error::credential_unavailable(
                "credential is incomplete or expired",
            ));
        }
        debug!("signing with credential: {cred:?}");

        let region = self
            .config
            .region
            .as_deref()
            .ok_or_else(|| Error::config_invalid("region is required to sign"))?;

        let mut signer = PresignedUrlSigner::new(region);
        if let Some(time) = self.time {
            signer = signer.with_time(time);
        }
        Ok(signer.sign(host, &cred))
    }
}
