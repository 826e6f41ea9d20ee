//! AWS IoT presigned WebSocket urls.
//!
//! Builds `wss://{host}/mqtt?...` urls signed with AWS Signature Version 4 so
//! that an mqtt client can connect to the AWS IoT device gateway without
//! holding a client certificate. Mutual TLS connections are described by the
//! same [`Connector`].
//!
//! ```no_run
//! use iotsign_aws_iot::{Config, Connector};
//! use iotsign_core::{Context, OsEnv};
//!
//! # async fn run() -> iotsign_core::Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let config = Config::default().from_env(&ctx).from_profile(&ctx).await;
//!
//! let url = Connector::new(ctx, config).presigned_url().await?;
//! # let _ = url;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod constants;
pub use constants::AMAZON_ROOT_CA_1;
pub use constants::SERVICE_NAME;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod query;
pub use query::encode_query;
pub use query::encode_query_value;

mod sign_request;
pub use sign_request::canonical_request_string;
pub use sign_request::generate_signing_key;
pub use sign_request::presign_url;
pub use sign_request::PresignedUrlSigner;

mod provide_credential;
pub use provide_credential::*;

mod resolve_endpoint;
pub use resolve_endpoint::EnvEndpoint;
pub use resolve_endpoint::ResolveEndpoint;
pub use resolve_endpoint::ResolveEndpointChain;
pub use resolve_endpoint::StaticEndpoint;

mod trust;
pub use trust::ClientCertificate;
pub use trust::TrustStore;

mod connect;
pub use connect::ConnectOptions;
pub use connect::Connector;
