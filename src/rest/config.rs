/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::errors::SharePointError;
use crate::rest::properties::AuthType;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::str::FromStr;

/// Document library used when no root folder is configured
pub const DEFAULT_ROOT: &str = "Shared Documents";

/// Upper bound on the pages followed while listing items
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Credentials for the site, either NTLM login or an OAuth bearer token
#[derive(Clone, PartialEq, Eq)]
pub enum Creds {
    Ntlm { username: String, password: String },
    Bearer(String),
}

impl Creds {
    pub fn ntlm(username: &str, password: &str) -> Self {
        Self::Ntlm {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(access_token: &str) -> Self {
        Self::Bearer(access_token.into())
    }
}

impl std::fmt::Debug for Creds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Creds::Ntlm { username, .. } => f
                .debug_struct("Ntlm")
                .field("username", username)
                .field("password", &"xxx")
                .finish(),
            Creds::Bearer(_) => f.debug_tuple("Bearer").field(&"xxx").finish(),
        }
    }
}

/// Everything needed to reach a site. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePointConfig {
    /// Scheme and host, e.g. `https://sharepoint.corp.example`
    pub origin: String,
    /// Site path below the origin, e.g. `sites/finance`
    pub site: String,
    /// Document library (root folder) all file paths are relative to
    pub root: String,
    pub creds: Creds,
    pub ignore_ssl_check: bool,
    pub list_title: Option<String>,
}

impl SharePointConfig {
    pub fn new(origin: &str, site: &str, creds: Creds) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            site: site.trim_matches('/').to_string(),
            root: DEFAULT_ROOT.to_string(),
            creds,
            ignore_ssl_check: false,
            list_title: None,
        }
    }

    /// Sets the root folder, surrounding slashes are stripped
    pub fn with_root(mut self, root: &str) -> Self {
        self.root = root.trim_matches('/').to_string();
        self
    }

    pub fn with_ignore_ssl_check(mut self, ignore: bool) -> Self {
        self.ignore_ssl_check = ignore;
        self
    }

    pub fn with_list_title(mut self, list_title: &str) -> Self {
        self.list_title = Some(list_title.to_string());
        self
    }

    /// Builds the configuration from the JSON document handed over by the hosting framework.
    ///
    /// ```json
    /// {
    ///   "auth_type": "login",
    ///   "sharepoint_local": {
    ///     "sharepoint_username": "CORP\\jdoe",
    ///     "sharepoint_password": "...",
    ///     "sharepoint_host": "https://sharepoint.corp.example",
    ///     "sharepoint_site": "sites/finance",
    ///     "sharepoint_root": "Shared Documents",
    ///     "ignore_ssl_check": false
    ///   },
    ///   "sharepoint_list_title": "Tasks"
    /// }
    /// ```
    ///
    /// With `"auth_type": "oauth"` the `sharepoint_oauth` object is read instead and must hold
    /// `sharepoint_tenant`, `sharepoint_site` and `sharepoint_access_token`.
    pub fn from_value(config: &Value) -> Result<Self, SharePointError> {
        let raw: RawConfig = serde_json::from_value(config.clone())?;
        let auth_type = match raw.auth_type.as_deref() {
            None => AuthType::default(),
            Some(name) => AuthType::from_str(name).map_err(|_| {
                SharePointError::Configuration(format!("Unknown auth_type '{name}'"))
            })?,
        };
        let config = match auth_type {
            AuthType::Login => login_details::<LocalLogin>(raw.sharepoint_local)?.into_config()?,
            AuthType::OAuth => login_details::<OAuthLogin>(raw.sharepoint_oauth)?.into_config()?,
        };
        Ok(match raw.sharepoint_list_title.filter(|t| !t.is_empty()) {
            Some(title) => config.with_list_title(&title),
            None => config,
        })
    }
}

/// Options of the resource client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Maximum number of pages followed by a full list read, `None` for no limit
    pub max_pages: Option<usize>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_pages: Some(DEFAULT_MAX_PAGES),
        }
    }
}

// Top level layout of the host configuration
#[derive(Deserialize, Debug)]
struct RawConfig {
    auth_type: Option<String>,
    sharepoint_local: Option<Value>,
    sharepoint_oauth: Option<Value>,
    sharepoint_list_title: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct LocalLogin {
    sharepoint_username: Option<String>,
    sharepoint_password: Option<String>,
    sharepoint_host: Option<String>,
    sharepoint_site: Option<String>,
    sharepoint_root: Option<String>,
    #[serde(default)]
    ignore_ssl_check: bool,
}

#[derive(Deserialize, Debug, Default)]
struct OAuthLogin {
    sharepoint_tenant: Option<String>,
    sharepoint_site: Option<String>,
    sharepoint_access_token: Option<String>,
    sharepoint_root: Option<String>,
}

trait LoginDetails {
    fn into_config(self) -> Result<SharePointConfig, SharePointError>;
}

// Only an absent, null or key-less login object counts as empty
fn login_details<T: LoginDetails + DeserializeOwned>(
    details: Option<Value>,
) -> Result<T, SharePointError> {
    match details {
        None | Some(Value::Null) => Err(empty_login()),
        Some(Value::Object(map)) if map.is_empty() => Err(empty_login()),
        Some(details) => Ok(serde_json::from_value(details)?),
    }
}

fn empty_login() -> SharePointError {
    SharePointError::Configuration("Login details are empty".to_string())
}

// Missing and empty values are both reported with the field specific message
fn required(value: Option<String>, message: &str) -> Result<String, SharePointError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SharePointError::Configuration(message.to_string()))
}

impl LoginDetails for LocalLogin {
    fn into_config(self) -> Result<SharePointConfig, SharePointError> {
        let username = required(self.sharepoint_username, "The account's username is missing")?;
        let password = required(self.sharepoint_password, "The account's password is missing")?;
        let host = required(self.sharepoint_host, "The SharePoint host address is missing")?;
        let site = required(self.sharepoint_site, "The site name is missing")?;

        let config = SharePointConfig::new(&host, &site, Creds::ntlm(&username, &password))
            .with_ignore_ssl_check(self.ignore_ssl_check);
        Ok(match self.sharepoint_root {
            Some(root) => config.with_root(&root),
            None => config,
        })
    }
}

impl LoginDetails for OAuthLogin {
    fn into_config(self) -> Result<SharePointConfig, SharePointError> {
        let tenant = required(self.sharepoint_tenant, "The tenant name is missing")?;
        let site = required(self.sharepoint_site, "The site name is missing")?;
        let token = required(self.sharepoint_access_token, "The access token is missing")?;

        let origin = format!("https://{tenant}.sharepoint.com");
        let config = SharePointConfig::new(&origin, &site, Creds::bearer(&token));
        Ok(match self.sharepoint_root {
            Some(root) => config.with_root(&root),
            None => config,
        })
    }
}
