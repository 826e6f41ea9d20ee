use crate::constants::AMAZON_ROOT_CA_1;
use iotsign_core::{Context, Error, Result};
use std::fmt::{Debug, Formatter};

/// TrustStore holds the DER encoded root certificates used to validate the
/// broker's TLS certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct TrustStore {
    roots: Vec<Vec<u8>>,
}

impl TrustStore {
    /// Trust store containing only the bundled Amazon Root CA 1.
    pub fn amazon_root_ca() -> Result<Self> {
        Self::from_pem(AMAZON_ROOT_CA_1.as_bytes())
    }

    /// Parse every `CERTIFICATE` block of a PEM bundle.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let roots = pem_blocks(pem)?
            .into_iter()
            .filter(|(label, _)| label == "CERTIFICATE")
            .map(|(_, der)| der)
            .collect::<Vec<_>>();

        if roots.is_empty() {
            return Err(Error::trust_configuration(
                "no certificate found in root ca bundle",
            ));
        }
        Ok(Self { roots })
    }

    /// Load a PEM bundle through the context's file reader.
    pub async fn from_file(ctx: &Context, path: &str) -> Result<Self> {
        let content = ctx.file_read(path).await.map_err(|e| {
            Error::trust_configuration(format!("failed to read root ca file {path}"))
                .with_source(e)
        })?;
        Self::from_pem(&content)
    }

    /// DER encoded root certificates.
    pub fn roots(&self) -> &[Vec<u8>] {
        &self.roots
    }

    /// Number of root certificates.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Returns true if no root is present.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl Debug for TrustStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustStore")
            .field("roots", &self.roots.len())
            .finish()
    }
}

/// ClientCertificate is the certificate chain and private key used for
/// mqtt over mutual TLS.
#[derive(Clone)]
pub struct ClientCertificate {
    cert_chain: Vec<Vec<u8>>,
    private_key: Vec<u8>,
}

impl ClientCertificate {
    /// Parse a PEM certificate chain and a PEM private key.
    pub fn from_pem(cert: &[u8], key: &[u8]) -> Result<Self> {
        let cert_chain = pem_blocks(cert)?
            .into_iter()
            .filter(|(label, _)| label == "CERTIFICATE")
            .map(|(_, der)| der)
            .collect::<Vec<_>>();
        if cert_chain.is_empty() {
            return Err(Error::trust_configuration(
                "no certificate found in client certificate",
            ));
        }

        let private_key = pem_blocks(key)?
            .into_iter()
            .find(|(label, _)| label.ends_with("PRIVATE KEY"))
            .map(|(_, der)| der)
            .ok_or_else(|| Error::trust_configuration("no private key found in client key"))?;

        Ok(Self {
            cert_chain,
            private_key,
        })
    }

    /// Load the certificate chain and key through the context's file reader.
    pub async fn from_files(ctx: &Context, cert_path: &str, key_path: &str) -> Result<Self> {
        let cert = ctx.file_read(cert_path).await.map_err(|e| {
            Error::trust_configuration(format!("failed to read client certificate {cert_path}"))
                .with_source(e)
        })?;
        let key = ctx.file_read(key_path).await.map_err(|e| {
            Error::trust_configuration(format!("failed to read client key {key_path}"))
                .with_source(e)
        })?;
        Self::from_pem(&cert, &key)
    }

    /// DER encoded certificate chain, leaf first.
    pub fn cert_chain(&self) -> &[Vec<u8>] {
        &self.cert_chain
    }

    /// DER encoded private key.
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }
}

impl Debug for ClientCertificate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCertificate")
            .field("cert_chain", &self.cert_chain.len())
            .field("private_key", &"***")
            .finish()
    }
}

/// Parse PEM input into `(tag, der)` blocks.
///
/// Text outside of blocks is ignored. Every block body must be a DER SEQUENCE.
fn pem_blocks(input: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let blocks = pem::parse_many(input).map_err(|e| {
        Error::trust_configuration("failed to parse pem").with_source(anyhow::Error::new(e))
    })?;

    blocks
        .into_iter()
        .map(|block| {
            // DER structures always start with a SEQUENCE tag.
            if block.contents().first() != Some(&0x30) {
                return Err(Error::trust_configuration(format!(
                    "pem block {} is not DER encoded",
                    block.tag()
                )));
            }
            Ok((block.tag().to_string(), block.contents().to_vec()))
        })
        .collect()
}
