//! AWS Signature Version 4 header signing.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use sha2::{Digest, Sha256};

use super::AwsCredentials;
use crate::error::{GatewayError, Result};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// RFC 3986 unreserved characters stay literal; everything else is escaped.
pub(crate) const URI_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Inputs that scope a signature.
#[derive(Debug, Clone, Copy)]
pub struct SigningParams<'a> {
    pub credentials: &'a AwsCredentials,
    pub region: &'a str,
    pub service: &'a str,
    pub time: DateTime<Utc>,
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Percent-encode each `/`-separated segment of an object key.
pub(crate) fn encode_path_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, URI_UNRESERVED).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Sign `request` in place, adding `x-amz-*` and `authorization` headers.
///
/// `payload_hash` is the hex SHA-256 of the body the request will send.
pub fn sign_request(
    request: &mut reqwest::Request,
    payload_hash: &str,
    params: &SigningParams<'_>,
) -> Result<()> {
    let amz_date = params.time.format("%Y%m%dT%H%M%SZ").to_string();
    let date = params.time.format("%Y%m%d").to_string();

    let url = request.url();
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => {
            return Err(GatewayError::InvalidArgument(format!(
                "cannot sign request without host: {url}"
            )))
        }
    };

    // S3 signs the path exactly as sent; every other service double-encodes.
    let canonical_uri = if params.service == "s3" {
        url.path().to_string()
    } else {
        encode_path_segments(url.path())
    };
    let canonical_query = canonical_query_string(url);

    let mut canonical_headers = vec![
        ("host", host),
        ("x-amz-content-sha256", payload_hash.to_string()),
        ("x-amz-date", amz_date.clone()),
    ];
    if let Some(token) = &params.credentials.session_token {
        canonical_headers.push(("x-amz-security-token", token.clone()));
    }

    let signed_headers = canonical_headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");
    let header_block: String = canonical_headers
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", value.trim()))
        .collect();

    let canonical_request = format!(
        "{}\n{canonical_uri}\n{canonical_query}\n{header_block}\n{signed_headers}\n{payload_hash}",
        request.method().as_str()
    );

    let scope = format!("{date}/{}/{}/aws4_request", params.region, params.service);
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let k_signing = signing_key(
        &params.credentials.secret_access_key,
        &date,
        params.region,
        params.service,
    )?;
    let signature = hex::encode(hmac(&k_signing, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        params.credentials.access_key_id
    );

    let headers = request.headers_mut();
    for (name, value) in canonical_headers.iter().skip(1) {
        headers.insert(HeaderName::from_static(*name), header_value(value)?);
    }
    headers.insert(AUTHORIZATION, header_value(&authorization)?);
    Ok(())
}

fn canonical_query_string(url: &reqwest::Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            (
                utf8_percent_encode(&k, URI_UNRESERVED).to_string(),
                utf8_percent_encode(&v, URI_UNRESERVED).to_string(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Derive the per-day, per-scope signing key from the secret access key.
fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| GatewayError::InvalidState(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| GatewayError::InvalidArgument(format!("invalid header value: {e}")))
}
