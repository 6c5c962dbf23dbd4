//! OCI Authentication
//!
//! Reads API-key profiles from the OCI CLI configuration file and signs
//! outgoing requests with the draft-cavage HTTP signature scheme used by
//! every OCI REST endpoint.

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request};
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Profile used when neither the CLI nor the environment selects one
pub const DEFAULT_PROFILE: &str = "DEFAULT";

/// RFC 7231 date format expected in the signed `date` header
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A single profile from the OCI config file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OciProfile {
    pub user: String,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub tenancy: String,
    pub region: Option<String>,
}

impl OciProfile {
    /// Key id sent in the `Authorization` header
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy, self.user, self.fingerprint)
    }
}

/// Path of the OCI config file (`OCI_CONFIG_FILE` > `~/.oci/config`)
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("OCI_CONFIG_FILE") {
        return Some(expand_home(&path));
    }
    dirs::home_dir().map(|home| home.join(".oci").join("config"))
}

/// Profile name (`OCI_CLI_PROFILE` > `DEFAULT`)
pub fn default_profile_name() -> String {
    std::env::var("OCI_CLI_PROFILE").unwrap_or_else(|_| DEFAULT_PROFILE.to_string())
}

/// Load a profile from an OCI config file on disk
pub fn load_profile(path: &Path, profile: &str) -> Result<OciProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read OCI config file {}", path.display()))?;
    parse_profile(&content, profile)
}

/// Parse the INI-style OCI config file and resolve one profile.
///
/// Keys missing from the named profile fall back to the `DEFAULT` section.
pub fn parse_profile(content: &str, profile: &str) -> Result<OciProfile> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        let Some(section) = current.as_ref() else {
            continue;
        };
        if let Some((key, value)) = line.split_once('=') {
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    if !sections.contains_key(profile) {
        bail!("Profile '{}' not found in OCI config", profile);
    }

    let lookup = |key: &str| -> Option<String> {
        sections
            .get(profile)
            .and_then(|s| s.get(key))
            .or_else(|| sections.get(DEFAULT_PROFILE).and_then(|s| s.get(key)))
            .filter(|v| !v.is_empty())
            .cloned()
    };
    let required = |key: &str| -> Result<String> {
        lookup(key).with_context(|| format!("Missing '{}' in OCI config profile '{}'", key, profile))
    };

    Ok(OciProfile {
        user: required("user")?,
        fingerprint: required("fingerprint")?,
        key_file: expand_home(&required("key_file")?),
        tenancy: required("tenancy")?,
        region: lookup("region"),
    })
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Signs an outgoing request in place
pub trait RequestSigner: Send + Sync {
    fn sign(&self, request: &mut Request) -> Result<()>;
}

/// API-key signer (`rsa-sha256`)
pub struct ApiKeySigner {
    key_id: String,
    key_pair: RsaKeyPair,
    rng: SystemRandom,
}

impl std::fmt::Debug for ApiKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeySigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl ApiKeySigner {
    pub fn new(key_id: String, key_pair: RsaKeyPair) -> Self {
        Self {
            key_id,
            key_pair,
            rng: SystemRandom::new(),
        }
    }

    /// Build a signer from a config profile, reading its private key file
    pub fn from_profile(profile: &OciProfile) -> Result<Self> {
        let pem = std::fs::read_to_string(&profile.key_file).with_context(|| {
            format!("Failed to read API signing key {}", profile.key_file.display())
        })?;
        let key_pair = parse_private_key(&pem)?;
        Ok(Self::new(profile.key_id(), key_pair))
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    fn signature(&self, message: &[u8]) -> Result<String> {
        let mut signature = vec![0u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(&RSA_PKCS1_SHA256, &self.rng, message, &mut signature)
            .map_err(|e| anyhow!("Failed to sign request: {}", e))?;
        Ok(STANDARD.encode(signature))
    }
}

impl RequestSigner for ApiKeySigner {
    fn sign(&self, request: &mut Request) -> Result<()> {
        let headers = signed_headers(request, &Utc::now().format(HTTP_DATE_FORMAT).to_string())?;
        let signature = self.signature(signing_string(&headers).as_bytes())?;
        let names: Vec<&str> = headers.iter().map(|(name, _)| *name).collect();
        let authorization = format!(
            "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
            self.key_id,
            names.join(" "),
            signature
        );

        let target = request.headers_mut();
        for (name, value) in &headers {
            if *name == "(request-target)" {
                continue;
            }
            target.insert(HeaderName::from_static(*name), HeaderValue::from_str(value)?);
        }
        target.insert(AUTHORIZATION, HeaderValue::from_str(&authorization)?);
        Ok(())
    }
}

/// Headers covered by the signature, in signing order
fn signed_headers(request: &Request, date: &str) -> Result<Vec<(&'static str, String)>> {
    let mut headers = vec![
        ("date", date.to_string()),
        ("(request-target)", request_target(request.method(), request.url())),
        ("host", host_header(request.url())?),
    ];

    if matches!(*request.method(), Method::POST | Method::PUT | Method::PATCH) {
        let body = request.body().and_then(|b| b.as_bytes()).unwrap_or_default();
        let digest = ring::digest::digest(&ring::digest::SHA256, body);
        headers.push(("content-length", body.len().to_string()));
        headers.push(("content-type", "application/json".to_string()));
        headers.push(("x-content-sha256", STANDARD.encode(digest.as_ref())));
    }

    Ok(headers)
}

fn signing_string(headers: &[(&str, String)]) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn request_target(method: &Method, url: &Url) -> String {
    let mut target = format!("{} {}", method.as_str().to_lowercase(), url.path());
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn host_header(url: &Url) -> Result<String> {
    let host = url.host_str().context("Request URL has no host")?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Decode a PEM private key (PKCS#8 or PKCS#1).
///
/// Console-generated keys carry a trailing `OCI_API_KEY` marker after the
/// PEM block; anything outside the block is ignored.
pub fn parse_private_key(pem: &str) -> Result<RsaKeyPair> {
    if pem.contains("ENCRYPTED") {
        bail!("Encrypted API signing keys are not supported");
    }

    let mut in_block = false;
    let mut pkcs1 = false;
    let mut body = String::new();
    for line in pem.lines().map(str::trim) {
        if line.starts_with("-----BEGIN") {
            in_block = true;
            pkcs1 = line.contains("RSA PRIVATE KEY");
        } else if line.starts_with("-----END") {
            break;
        } else if in_block {
            body.push_str(line);
        }
    }
    if body.is_empty() {
        bail!("API signing key is not a PEM private key");
    }

    let der = STANDARD
        .decode(body)
        .context("Invalid base64 in API signing key")?;
    let key_pair = if pkcs1 {
        RsaKeyPair::from_der(&der)
    } else {
        RsaKeyPair::from_pkcs8(&der)
    };
    key_pair.map_err(|e| anyhow!("Rejected API signing key: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/test_api_key.pem");

    const CONFIG: &str = "\
[DEFAULT]
user=ocid1.user.oc1..aaaa
fingerprint=75:64:60:0e
key_file=/keys/oci.pem
tenancy=ocid1.tenancy.oc1..tttt
region=us-ashburn-1

# second profile only overrides the region
[PHX]
region = us-phoenix-1
";

    #[test]
    fn test_parse_default_profile() {
        let profile = parse_profile(CONFIG, "DEFAULT").unwrap();
        assert_eq!(profile.user, "ocid1.user.oc1..aaaa");
        assert_eq!(profile.key_file, PathBuf::from("/keys/oci.pem"));
        assert_eq!(profile.region.as_deref(), Some("us-ashburn-1"));
        assert_eq!(
            profile.key_id(),
            "ocid1.tenancy.oc1..tttt/ocid1.user.oc1..aaaa/75:64:60:0e"
        );
    }

    #[test]
    fn test_named_profile_inherits_default() {
        let profile = parse_profile(CONFIG, "PHX").unwrap();
        assert_eq!(profile.tenancy, "ocid1.tenancy.oc1..tttt");
        assert_eq!(profile.region.as_deref(), Some("us-phoenix-1"));
    }

    #[test]
    fn test_missing_profile_is_error() {
        let err = parse_profile(CONFIG, "NOPE").unwrap_err();
        assert!(err.to_string().contains("NOPE"));
    }

    #[test]
    fn test_missing_required_key_is_error() {
        let err = parse_profile("[DEFAULT]\nuser=u\n", "DEFAULT").unwrap_err();
        assert!(err.to_string().contains("fingerprint"));
    }

    #[test]
    fn test_parse_private_key_with_trailing_marker() {
        let pem = format!("{}OCI_API_KEY\n", TEST_KEY);
        assert!(parse_private_key(&pem).is_ok());
    }

    #[test]
    fn test_rejects_non_pem_key() {
        assert!(parse_private_key("not a key").is_err());
    }

    #[test]
    fn test_get_signing_string() {
        let url = Url::parse("https://database.us-ashburn-1.oraclecloud.com/20160918/dbHomes?compartmentId=c1&limit=10").unwrap();
        let request = Request::new(Method::GET, url);
        let headers = signed_headers(&request, "Thu, 05 Jan 2014 21:31:40 GMT").unwrap();
        assert_eq!(
            signing_string(&headers),
            "date: Thu, 05 Jan 2014 21:31:40 GMT\n\
             (request-target): get /20160918/dbHomes?compartmentId=c1&limit=10\n\
             host: database.us-ashburn-1.oraclecloud.com"
        );
    }

    #[test]
    fn test_post_signs_body_headers() {
        let url = Url::parse("http://127.0.0.1:8080/20180401/metrics").unwrap();
        let mut request = Request::new(Method::POST, url);
        *request.body_mut() = Some(reqwest::Body::from("{}"));
        let headers = signed_headers(&request, "date").unwrap();
        let names: Vec<&str> = headers.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["date", "(request-target)", "host", "content-length", "content-type", "x-content-sha256"]
        );
        assert_eq!(headers[2].1, "127.0.0.1:8080");
        assert_eq!(headers[3].1, "2");
    }

    #[test]
    fn test_sign_sets_authorization() {
        let signer = ApiKeySigner::new("t/u/f".to_string(), parse_private_key(TEST_KEY).unwrap());
        let url = Url::parse("https://identity.us-ashburn-1.oci.oraclecloud.com/20160918/compartments").unwrap();
        let mut request = Request::new(Method::GET, url);
        signer.sign(&mut request).unwrap();

        let auth = request.headers().get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(auth.starts_with("Signature version=\"1\",keyId=\"t/u/f\""));
        assert!(auth.contains("headers=\"date (request-target) host\""));
        assert!(request.headers().contains_key("date"));
    }
}
