/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! # SharePoint
//!
//! This library was created for working with the SharePoint REST (`_api`) interface of
//! SharePoint On-Premises and SharePoint Online sites.
//!
//! For further details on the Rest API refer to the
//! [SharePoint REST API Docs](https://learn.microsoft.com/en-us/sharepoint/dev/sp-add-ins/get-to-know-the-sharepoint-rest-service)
//!
//! ## Features
//!
//! - Document library access
//!     - List the folders and files of a folder
//!     - Read, write, move and delete files
//!     - Create and delete folders
//! - List management
//!     - Create and delete lists
//!     - Read list fields and create custom fields
//!     - Read (paginated) and add list items
//! - Lower level [`rest::Session`] for handling the raw authenticated communication
//!
//! *On-Premises sites are accessed with NTLM credentials, SharePoint Online with an OAuth
//! bearer token. Getting the access token is left up to the consumer of this library.*
//!
//! ## Installation
//!
//! ```toml
//! [dependencies]
//! sharepoint = "0.3.0"
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sharepoint::rest::{SharePointClient, SharePointConfig};
//! use serde_json::json;
//!
//! async fn print_folders() -> anyhow::Result<()> {
//!     let config = SharePointConfig::from_value(&json!({
//!         "sharepoint_local": {
//!             "sharepoint_username": "CORP\\jdoe",
//!             "sharepoint_password": "secret",
//!             "sharepoint_host": "https://sharepoint.corp.example",
//!             "sharepoint_site": "sites/finance"
//!         }
//!     }))?;
//!     let client = SharePointClient::new(config)?;
//!
//!     for folder in client.get_folders("/Reports").await? {
//!         println!("{}", folder);
//!     }
//!     Ok(())
//! }
//! ```
//!
pub mod rest;
