/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::parsers::{from_empty_str_to_none, from_field_type};
use crate::rest::properties::{ColumnType, FieldType};
use serde::{Deserialize, Serialize};

/// Holds information returned for a list.
///
/// See [SP.List](https://learn.microsoft.com/en-us/previous-versions/office/developer/sharepoint-rest-reference/dn531433(v=office.15)#list-resource)
/// for more details on the individual fields.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SharePointList {
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(rename = "Title")]
    pub title: String,

    #[serde(
        default,
        rename = "Description",
        deserialize_with = "from_empty_str_to_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    #[serde(default, rename = "ItemCount")]
    pub item_count: u64,

    #[serde(default, rename = "Hidden")]
    pub is_hidden: bool,

    /// OData type of the items of this list, needed to add items by list id
    #[serde(rename = "ListItemEntityTypeFullName")]
    pub list_item_entity_type_full_name: String,
}

/// Holds information returned for a field (column) of a list
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ListField {
    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "StaticName")]
    pub static_name: String,

    #[serde(default, rename = "EntityPropertyName")]
    pub entity_property_name: Option<String>,

    #[serde(rename = "TypeAsString", deserialize_with = "from_field_type")]
    pub field_type: FieldType,

    #[serde(default, rename = "Hidden")]
    pub is_hidden: bool,

    #[serde(default, rename = "ReadOnlyField")]
    pub is_read_only: bool,
}

impl ListField {
    const TITLE_COLUMN: &'static str = "Title";

    /// Whether this field shows up as a column when the list is read as a table.
    ///
    /// Hidden and read only (system) fields are skipped, except the `Title` column.
    pub fn is_visible_column(&self) -> bool {
        self.static_name == Self::TITLE_COLUMN || (!self.is_hidden && !self.is_read_only)
    }

    pub fn column_type(&self) -> Option<ColumnType> {
        self.field_type.column_type()
    }
}
