use crate::constants::AWS_IOT_ENDPOINT;
use async_trait::async_trait;
use iotsign_core::{Context, Error, Result};
use std::fmt::{self, Debug};

/// ResolveEndpoint finds the account specific broker host name.
///
/// Returning `Ok(None)` means this source has no opinion. A directory lookup
/// such as `iot:DescribeEndpoint` for `iot:Data-ATS` plugs in by implementing
/// this trait.
#[async_trait]
pub trait ResolveEndpoint: Debug + Send + Sync + Unpin + 'static {
    /// Resolve the broker host, without scheme or port.
    async fn resolve_endpoint(&self, ctx: &Context) -> Result<Option<String>>;
}

/// StaticEndpoint always resolves to the given host.
#[derive(Debug, Clone)]
pub struct StaticEndpoint {
    host: String,
}

impl StaticEndpoint {
    /// Create a new StaticEndpoint.
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

#[async_trait]
impl ResolveEndpoint for StaticEndpoint {
    async fn resolve_endpoint(&self, _: &Context) -> Result<Option<String>> {
        Ok(Some(self.host.clone()))
    }
}

/// EnvEndpoint reads the host from `AWS_IOT_ENDPOINT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvEndpoint;

#[async_trait]
impl ResolveEndpoint for EnvEndpoint {
    async fn resolve_endpoint(&self, ctx: &Context) -> Result<Option<String>> {
        Ok(ctx.env_var(AWS_IOT_ENDPOINT).filter(|v| !v.is_empty()))
    }
}

/// A chain of endpoint resolvers that will be tried in order.
#[derive(Default)]
pub struct ResolveEndpointChain {
    resolvers: Vec<Box<dyn ResolveEndpoint>>,
}

impl ResolveEndpointChain {
    /// Create a new empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolver to the chain.
    pub fn push(mut self, resolver: impl ResolveEndpoint) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl Debug for ResolveEndpointChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveEndpointChain")
            .field("resolvers", &self.resolvers)
            .finish()
    }
}

#[async_trait]
impl ResolveEndpoint for ResolveEndpointChain {
    async fn resolve_endpoint(&self, ctx: &Context) -> Result<Option<String>> {
        for resolver in &self.resolvers {
            if let Some(host) = resolver.resolve_endpoint(ctx).await? {
                log::debug!("resolved endpoint {host} from {resolver:?}");
                return Ok(Some(host));
            }
        }
        Ok(None)
    }
}

/// Check that `host` is a bare DNS name: no scheme, port, path or whitespace.
pub(crate) fn check_host(host: &str) -> Result<()> {
    let bare = !host.is_empty()
        && host
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.');
    if bare {
        Ok(())
    } else {
        Err(Error::endpoint_unresolved(format!(
            "endpoint {host:?} is not a bare host name"
        )))
    }
}
