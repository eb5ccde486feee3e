/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Holds information returned for a folder.
///
/// See [SP.Folder](https://learn.microsoft.com/en-us/previous-versions/office/developer/sharepoint-rest-reference/dn450841(v=office.15)#folder-resource)
/// for more details on the individual fields.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Folder {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "ServerRelativeUrl")]
    pub server_relative_url: String,

    #[serde(default, rename = "ItemCount")]
    pub item_count: u64,

    #[serde(default, rename = "Exists")]
    pub exists: bool,

    #[serde(rename = "UniqueId", skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,

    #[serde(rename = "TimeLastModified", skip_serializing_if = "Option::is_none")]
    pub time_last_modified: Option<DateTime<Utc>>,
}

impl PartialEq for Folder {
    fn eq(&self, other: &Self) -> bool {
        self.server_relative_url == other.server_relative_url
    }
}
impl Eq for Folder {}

impl PartialOrd for Folder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Folder {
    fn cmp(&self, other: &Self) -> Ordering {
        self.server_relative_url.cmp(&other.server_relative_url)
    }
}

impl std::fmt::Display for Folder {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "name: {}, url: {}", self.name, self.server_relative_url)
    }
}
