/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::parsers::from_string_or_number;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Holds information returned for a file.
///
/// See [SP.File](https://learn.microsoft.com/en-us/previous-versions/office/developer/sharepoint-rest-reference/dn450841(v=office.15)#file-resource)
/// for more details on the individual fields.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct File {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "ServerRelativeUrl")]
    pub server_relative_url: String,

    // Size in bytes
    #[serde(rename = "Length", deserialize_with = "from_string_or_number")]
    pub length: u64,

    #[serde(rename = "UniqueId", skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,

    #[serde(rename = "TimeCreated", skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,

    #[serde(rename = "TimeLastModified", skip_serializing_if = "Option::is_none")]
    pub time_last_modified: Option<DateTime<Utc>>,
}

impl std::fmt::Display for File {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "name: {}, size: {}", self.name, self.length)
    }
}
