/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use num_enum::TryFromPrimitive;
use serde::Deserialize;
use strum_macros::{EnumString, IntoStaticStr};

/// OData verbose JSON, used for almost every request
pub const APPLICATION_JSON: &str = "application/json;odata=verbose";

/// OData JSON without metadata, used for the context info request
pub const APPLICATION_JSON_NOMETADATA: &str = "application/json; odata=nometadata";

/// How the connector authenticates against the site
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuthType {
    /// Username/password (NTLM) against an On-Premises host
    #[default]
    Login,
    /// Bearer access token against a SharePoint Online tenant
    OAuth,
}

/// Field kinds as reported in the `TypeAsString` property of a list field
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum FieldType {
    #[default]
    Text,
    Note,
    Number,
    Currency,
    Integer,
    DateTime,
    Boolean,
    Choice,
    MultiChoice,
    Lookup,
    User,
    #[strum(to_string = "URL")]
    Url,
    Location,
    Computed,
    Attachments,
    Counter,
    Guid,
}

/// Column type a list field maps to when a list is read as a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ColumnType {
    String,
    Date,
    Object,
}

impl FieldType {
    /// Parses a `TypeAsString` value, unknown kinds fall back to [`FieldType::Text`]
    pub fn from_type_as_string(type_as_string: &str) -> Self {
        type_as_string.parse().unwrap_or_default()
    }

    /// The column type of this field, `None` for fields without a tabular value
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            FieldType::DateTime => Some(ColumnType::Date),
            FieldType::Url | FieldType::Location => Some(ColumnType::Object),
            FieldType::Computed | FieldType::Attachments => None,
            _ => Some(ColumnType::String),
        }
    }
}

/// Response codes that get a dedicated error mapping
#[derive(Debug, TryFromPrimitive)]
#[repr(u16)]
pub(crate) enum ResponseCode {
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
}
