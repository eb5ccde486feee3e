/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use sharepoint::rest::{ClientOptions, Creds, SharePointClient, SharePointConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub(crate) const SITE: &str = "site";
#[allow(dead_code)]
pub(crate) const DIGEST: &str = "0x8F1D2C3B4A5E6F7081";

#[allow(dead_code)]
pub(crate) fn mock_config(server: &MockServer, creds: Creds) -> SharePointConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    SharePointConfig::new(&server.uri(), SITE, creds).with_root("Docs")
}

#[allow(dead_code)]
pub(crate) fn ntlm_client(server: &MockServer) -> SharePointClient {
    SharePointClient::new(mock_config(server, Creds::ntlm("CORP\\jdoe", "secret"))).unwrap()
}

#[allow(dead_code)]
pub(crate) fn bearer_client(server: &MockServer, options: ClientOptions) -> SharePointClient {
    SharePointClient::with_options(mock_config(server, Creds::bearer("token")), options).unwrap()
}

/// Serves the form digest and expects it to be requested `calls` times
#[allow(dead_code)]
pub(crate) async fn mount_digest(server: &MockServer, calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/{SITE}/_api/contextinfo")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "FormDigestValue": DIGEST,
            "FormDigestTimeoutSeconds": 1800
        })))
        .expect(calls)
        .named("context info")
        .mount(server)
        .await;
}

/// Base64 NTLM challenge (type 2) message without target info
#[allow(dead_code)]
pub(crate) fn ntlm_challenge() -> String {
    let mut msg = Vec::new();
    msg.extend_from_slice(b"NTLMSSP\0");
    msg.extend_from_slice(&2u32.to_le_bytes());
    msg.extend_from_slice(&[0u8; 8]);
    msg.extend_from_slice(&0xE28A_8235u32.to_le_bytes());
    msg.extend_from_slice(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
    msg.extend_from_slice(&[0u8; 8]);
    msg.extend_from_slice(&[0, 0, 0, 0]);
    msg.extend_from_slice(&48u32.to_le_bytes());
    STANDARD.encode(msg)
}

/// Configuration of a real site, read from the environment (or a `.env` file)
#[allow(dead_code)]
pub(crate) fn live_config() -> anyhow::Result<SharePointConfig> {
    dotenvy::dotenv().ok();
    let config = SharePointConfig::from_value(&json!({
        "sharepoint_local": {
            "sharepoint_username": std::env::var("SHAREPOINT_USERNAME")?,
            "sharepoint_password": std::env::var("SHAREPOINT_PASSWORD")?,
            "sharepoint_host": std::env::var("SHAREPOINT_HOST")?,
            "sharepoint_site": std::env::var("SHAREPOINT_SITE")?,
            "ignore_ssl_check": std::env::var("SHAREPOINT_IGNORE_SSL").is_ok()
        }
    }))?;
    Ok(config)
}
