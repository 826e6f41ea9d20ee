use crate::constants::{
    ALGORITHM, AWS4_REQUEST, EMPTY_STRING_SHA256, MQTT_PATH, SERVICE_NAME, SIGNED_HEADERS,
    X_AMZ_ALGORITHM, X_AMZ_CREDENTIAL, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN, X_AMZ_SIGNATURE,
    X_AMZ_SIGNED_HEADERS,
};
use crate::query::{encode_query, encode_query_value};
use crate::Credential;
use iotsign_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use iotsign_core::time::{format_iso8601, now, DateTime};
use log::debug;

/// PresignedUrlSigner builds AWS SigV4 presigned `wss://` urls for the AWS IoT
/// device gateway.
///
/// Only the fixed-shape `GET /mqtt` request used by the WebSocket upgrade is
/// supported: no body, `host` as the sole signed header.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
/// - [MQTT over WebSocket](https://docs.aws.amazon.com/iot/latest/developerguide/protocols.html#mqtt-ws)
#[derive(Debug, Clone)]
pub struct PresignedUrlSigner {
    region: String,

    time: Option<DateTime>,
}

impl PresignedUrlSigner {
    /// Create a new signer for the given region.
    pub fn new(region: &str) -> Self {
        Self {
            region: region.into(),

            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// The broker rejects urls whose `X-Amz-Date` is more than five minutes
    /// away from its own clock. Only pin the time for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Region this signer scopes its signatures to.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Build the presigned url for `host` with `cred`.
    ///
    /// The clock is read exactly once per call.
    pub fn sign(&self, host: &str, cred: &Credential) -> String {
        let now = self.time.unwrap_or_else(now);
        presign_url(cred, &self.region, host, now)
    }
}

/// Build a presigned `wss://{host}/mqtt?...` url.
///
/// Output is a pure function of its inputs: identical credential, region, host
/// and instant always produce byte-identical urls.
pub fn presign_url(cred: &Credential, region: &str, host: &str, now: DateTime) -> String {
    let date_long = format_iso8601(now);
    // Derived from date_long instead of formatting `now` again.
    let date_short = &date_long[..8];

    // Scope: "20240101/<region>/iotdevicegateway/aws4_request"
    let scope = format!("{date_short}/{region}/{SERVICE_NAME}/{AWS4_REQUEST}");
    debug!("calculated scope: {scope}");

    let credential = format!("{}/{}", cred.access_key_id, scope);
    let query = encode_query(&[
        (X_AMZ_ALGORITHM, ALGORITHM),
        (X_AMZ_CREDENTIAL, credential.as_str()),
        (X_AMZ_DATE, date_long.as_str()),
        (X_AMZ_SIGNED_HEADERS, SIGNED_HEADERS),
    ]);

    let creq = canonical_request_string(&query, host);
    debug!("calculated canonical request: {creq}");
    let encoded_req = hex_sha256(creq.as_bytes());

    // StringToSign:
    //
    // AWS4-HMAC-SHA256
    // 20240101T000000Z
    // 20240101/<region>/iotdevicegateway/aws4_request
    // <hashed_canonical_request>
    let string_to_sign = [
        ALGORITHM,
        date_long.as_str(),
        scope.as_str(),
        encoded_req.as_str(),
    ]
    .join("\n");
    debug!("calculated string to sign: {string_to_sign}");

    let signing_key =
        generate_signing_key(&cred.secret_access_key, date_short, region, SERVICE_NAME);
    let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

    let mut url = format!("wss://{host}{MQTT_PATH}?{query}&{X_AMZ_SIGNATURE}={signature}");
    if let Some(token) = cred.session_token() {
        url.push('&');
        url.push_str(X_AMZ_SECURITY_TOKEN);
        url.push('=');
        url.push_str(&encode_query_value(token));
    }
    url
}

/// Build the canonical request of the WebSocket upgrade.
///
/// ```text
/// GET
/// /mqtt
/// <canonical query>
/// host:<host>
///
/// host
/// <sha256 of empty payload>
/// ```
///
/// The returned string is not hashed yet.
pub fn canonical_request_string(query: &str, host: &str) -> String {
    let host_header = format!("host:{host}");
    [
        "GET",
        MQTT_PATH,
        query,
        host_header.as_str(),
        "",
        SIGNED_HEADERS,
        EMPTY_STRING_SHA256,
    ]
    .join("\n")
}

/// Derive the SigV4 signing key for `date_short/region/service/aws4_request`.
pub fn generate_signing_key(
    secret: &str,
    date_short: &str,
    region: &str,
    service: &str,
) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), date_short.as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), AWS4_REQUEST.as_bytes())
}
