//! S3-compatible blob binding.
//!
//! Talks to an S3 bucket (or an S3-compatible store such as Cloudflare R2
//! or MinIO via `endpoint_url`) using the REST API with AWS Signature V4
//! authentication. Uses only pure-Rust dependencies (`hmac`, `sha2`) for
//! signing.
//!
//! # Configuration
//!
//! ```toml
//! [blobs]
//! binding = "s3"
//! prefix = "docs/"
//!
//! [blobs.s3]
//! bucket = "acme-kb"
//! region = "auto"
//! endpoint_url = "https://<account>.r2.cloudflarestorage.com"
//! ```
//!
//! # Environment Variables
//!
//! - `AWS_ACCESS_KEY_ID` — required
//! - `AWS_SECRET_ACCESS_KEY` — required
//! - `AWS_SESSION_TOKEN` — optional (temporary credentials)

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::blobstore::{BlobEntry, BlobStore};
use crate::config::S3BlobConfig;

type HmacSha256 = Hmac<Sha256>;

/// Blob store backed by an S3-compatible bucket.
pub struct S3BlobStore {
    config: S3BlobConfig,
    client: reqwest::Client,
}

impl S3BlobStore {
    pub fn new(config: S3BlobConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn host(&self) -> String {
        if let Some(ref endpoint) = self.config.endpoint_url {
            // Custom endpoint (R2, MinIO, LocalStack)
            endpoint
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string()
        } else {
            format!(
                "{}.s3.{}.amazonaws.com",
                self.config.bucket, self.config.region
            )
        }
    }

    /// Build, sign, and send one S3 request.
    ///
    /// `canonical_uri` must already be URI-encoded; `query` must be sorted
    /// by key before the call (SigV4 requires a sorted canonical query).
    async fn signed_request(
        &self,
        method: reqwest::Method,
        canonical_uri: &str,
        query: &[(String, String)],
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<reqwest::Response> {
        let creds = AwsCredentials::from_env()?;
        let host = self.host();

        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let canonical_querystring: String = query
            .iter()
            .map(|(k, v)| format!("{}={}", uri_encode(k), uri_encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let payload_hash = hex_sha256(&body);

        let mut headers = vec![
            ("host".to_string(), host.clone()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(ct) = content_type {
            headers.push(("content-type".to_string(), ct.to_string()));
        }
        if let Some(ref token) = creds.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers: String = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v))
            .collect();

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method.as_str(),
            canonical_uri,
            canonical_querystring,
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = derive_signing_key(
            &creds.secret_access_key,
            &date_stamp,
            &self.config.region,
            "s3",
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            creds.access_key_id, credential_scope, signed_headers, signature
        );

        let url = if canonical_querystring.is_empty() {
            format!("https://{}{}", host, canonical_uri)
        } else {
            format!("https://{}{}?{}", host, canonical_uri, canonical_querystring)
        };

        let mut req = self
            .client
            .request(method.clone(), &url)
            .header("Authorization", &authorization)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date);

        if let Some(ct) = content_type {
            req = req.header("Content-Type", ct);
        }
        if let Some(ref token) = creds.session_token {
            req = req.header("x-amz-security-token", token);
        }
        if !body.is_empty() {
            req = req.body(body);
        }

        req.send()
            .await
            .with_context(|| format!("S3 request failed: {} {}", method, url))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn label(&self) -> String {
        format!("s3:{}", self.config.bucket)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        let mut entries = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            // Sorted by key for the canonical query string
            let mut query = vec![
                ("list-type".to_string(), "2".to_string()),
                ("max-keys".to_string(), "1000".to_string()),
            ];
            if let Some(ref token) = continuation_token {
                query.push(("continuation-token".to_string(), token.clone()));
            }
            if !prefix.is_empty() {
                query.push(("prefix".to_string(), prefix.to_string()));
            }
            query.sort_by(|a, b| a.0.cmp(&b.0));

            let resp = self
                .signed_request(reqwest::Method::GET, "/", &query, Vec::new(), None)
                .await?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                bail!(
                    "S3 ListObjectsV2 failed (HTTP {}): {}",
                    status,
                    body.chars().take(500).collect::<String>()
                );
            }

            let xml = resp.text().await?;
            let (batch, is_truncated, next_token) = parse_list_response(&xml);
            entries.extend(batch);

            if is_truncated {
                continuation_token = next_token;
            } else {
                break;
            }
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let canonical_uri = format!("/{}", encode_key(key));
        let resp = self
            .signed_request(reqwest::Method::GET, &canonical_uri, &[], Vec::new(), None)
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            bail!("S3 GetObject failed (HTTP {}) for key '{}'", resp.status(), key);
        }

        let bytes = resp.bytes().await?;
        Ok(Some(String::from_utf8_lossy(&bytes).to_string()))
    }

    async fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<()> {
        let canonical_uri = format!("/{}", encode_key(key));
        let resp = self
            .signed_request(
                reqwest::Method::PUT,
                &canonical_uri,
                &[],
                body.to_vec(),
                Some(content_type),
            )
            .await?;

        if !resp.status().is_success() {
            bail!("S3 PutObject failed (HTTP {}) for key '{}'", resp.status(), key);
        }
        Ok(())
    }
}

// ============ AWS Credentials ============

/// AWS credentials loaded from environment variables.
struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl AwsCredentials {
    fn from_env() -> Result<Self> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .context("AWS_ACCESS_KEY_ID environment variable not set")?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .context("AWS_SECRET_ACCESS_KEY environment variable not set")?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }
}

// ============ AWS SigV4 Helpers ============

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hex_hmac_sha256(key: &[u8], data: &[u8]) -> String {
    hex::encode(hmac_sha256(key, data))
}

/// Derive the AWS SigV4 signing key for a given date, region, and service.
fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// URI-encode a string per RFC 3986 (used in SigV4 canonical requests).
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

/// Encode an object key, preserving `/` separators.
fn encode_key(key: &str) -> String {
    key.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

// ============ XML Parsing (minimal, no extra deps) ============

/// Parse a `ListObjectsV2` XML response into blob entries plus pagination
/// state (is-truncated flag and continuation token).
fn parse_list_response(xml: &str) -> (Vec<BlobEntry>, bool, Option<String>) {
    let mut entries = Vec::new();
    let is_truncated = extract_xml_value(xml, "IsTruncated")
        .map(|v| v == "true")
        .unwrap_or(false);
    let next_token = extract_xml_value(xml, "NextContinuationToken");

    let mut remaining = xml;
    while let Some(start) = remaining.find("<Contents>") {
        let block_start = start + "<Contents>".len();
        let Some(end) = remaining[block_start..].find("</Contents>") else {
            break;
        };
        let block = &remaining[block_start..block_start + end];
        remaining = &remaining[block_start + end + "</Contents>".len()..];

        let key = extract_xml_value(block, "Key").unwrap_or_default();
        // Directory placeholders have trailing slashes
        if key.is_empty() || key.ends_with('/') {
            continue;
        }

        let size = extract_xml_value(block, "Size")
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(0);

        entries.push(BlobEntry { key, size });
    }

    (entries, is_truncated, next_token)
}

/// Extract the text content of an XML tag (simple, non-nested).
fn extract_xml_value(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)?;
    let value_start = start + open.len();
    let end = xml[value_start..].find(&close)?;
    Some(xml[value_start..value_start + end].to_string())
}
