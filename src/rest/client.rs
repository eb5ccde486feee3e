/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::api::{Payload, Session};
use crate::rest::config::{ClientOptions, SharePointConfig};
use crate::rest::errors::SharePointError;
use crate::rest::file::File;
use crate::rest::folder::Folder;
use crate::rest::list::{ListField, SharePointList};
use crate::rest::paths::{get_from_json_path, list_item_entity_type, split_parent, xml_escape};
use crate::rest::properties::{APPLICATION_JSON, FieldType, ResponseCode};
use crate::rest::urls::Endpoints;
use async_stream::try_stream;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use log::{debug, warn};
use reqwest::Response;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, IF_MATCH};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::sync::Arc;

const HTTP_METHOD_HEADER: HeaderName = HeaderName::from_static("x-http-method");

// Where the items and the next page link sit in a page (verbose, then nometadata)
const RESULTS_PATHS: [&[&str]; 2] = [&["d", "results"], &["value"]];
const NEXT_PAGE_PATHS: [&[&str]; 2] = [&["d", "__next"], &["odata.nextLink"]];
const ERROR_KEYS: [&str; 2] = ["error", "odata.error"];

/// Columns of a list item query, each optionally expanded to one of its sub fields.
///
/// `[("Author", Some("Title")), ("Status", None)]` selects `Author/Title,Status` and expands
/// `Author`.
pub type ColumnsToExpand<'a> = [(&'a str, Option<&'a str>)];

/// Client for the document libraries and lists of one site.
///
/// Cloning is cheap, clones share the same [`Session`] (and form digest).
#[derive(Debug, Clone)]
pub struct SharePointClient {
    session: Arc<Session>,
    endpoints: Arc<Endpoints>,
    options: ClientOptions,
    list_title: Option<String>,
}

impl SharePointClient {
    pub fn new(config: SharePointConfig) -> Result<Self, SharePointError> {
        Self::with_options(config, ClientOptions::default())
    }

    pub fn with_options(
        config: SharePointConfig,
        options: ClientOptions,
    ) -> Result<Self, SharePointError> {
        Ok(Self {
            session: Arc::new(Session::new(&config)?),
            endpoints: Arc::new(Endpoints::new(&config)),
            options,
            list_title: config.list_title,
        })
    }

    /// Lower level access to the authenticated session
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// List title given in the configuration, if any
    pub fn list_title(&self) -> Option<&str> {
        self.list_title.as_deref()
    }

    /// Returns the sub folders of the folder at `path`
    pub async fn get_folders(&self, path: &str) -> Result<Vec<Folder>, SharePointError> {
        let json = self.get_json(&self.endpoints.folders_url(path), None).await?;
        results_of(json)
    }

    /// Returns the files of the folder at `path`
    pub async fn get_files(&self, path: &str) -> Result<Vec<File>, SharePointError> {
        let json = self.get_json(&self.endpoints.files_url(path), None).await?;
        results_of(json)
    }

    /// Downloads the content of a file
    pub async fn get_file_content(&self, path: &str) -> Result<Bytes, SharePointError> {
        let resp = self
            .session
            .get(&self.endpoints.file_content_url(path), HeaderMap::new(), None)
            .await?;
        raw_response(resp).await
    }

    /// Uploads `data` to `path`, replacing any existing file
    pub async fn write_file_content(
        &self,
        path: &str,
        data: impl Into<Bytes>,
    ) -> Result<File, SharePointError> {
        let (parent, file_name) = split_parent(path);
        let data = data.into();
        debug!("Uploading {} bytes to {}", data.len(), path);
        let resp = self
            .session
            .post(
                &self.endpoints.file_add_url(&parent, file_name),
                HeaderMap::new(),
                Payload::Bytes(data),
            )
            .await?;
        object_of(json_response(resp).await?)
    }

    pub async fn create_folder(&self, path: &str) -> Result<Folder, SharePointError> {
        let resp = self
            .session
            .post(&self.endpoints.folder_add_url(path), HeaderMap::new(), Payload::Empty)
            .await?;
        object_of(json_response(resp).await?)
    }

    /// Deletes a folder and its content.
    ///
    /// The response is not validated, only transport errors are returned.
    pub async fn delete_folder(&self, path: &str) -> Result<(), SharePointError> {
        let resp = self
            .session
            .post(&self.endpoints.folder_url(path), delete_headers(), Payload::Empty)
            .await?;
        if !resp.status().is_success() {
            warn!("Deleting folder {} returned status {}", path, resp.status());
        }
        Ok(())
    }

    /// Moves a file, overwriting the destination
    pub async fn move_file(&self, from_path: &str, to_path: &str) -> Result<Value, SharePointError> {
        let resp = self
            .session
            .post(&self.endpoints.move_url(from_path, to_path), HeaderMap::new(), Payload::Empty)
            .await?;
        json_response(resp).await
    }

    pub async fn delete_file(&self, path: &str) -> Result<(), SharePointError> {
        let resp = self
            .session
            .post(&self.endpoints.file_url(path), delete_headers(), Payload::Empty)
            .await?;
        json_response(resp).await.map(|_| ())
    }

    /// Returns all lists of the site
    pub async fn get_lists(&self) -> Result<Vec<SharePointList>, SharePointError> {
        let json = self.get_json(&self.endpoints.lists_url(), None).await?;
        results_of(json)
    }

    /// Returns the fields (columns) of a list
    pub async fn get_list_fields(&self, list_title: &str) -> Result<Vec<ListField>, SharePointError> {
        let json = self
            .get_json(&self.endpoints.list_fields_url(list_title), None)
            .await?;
        results_of(json)
    }

    /// Returns the first page of items of a list, as sent by the server
    pub async fn get_list_items(
        &self,
        list_title: &str,
        columns_to_expand: &ColumnsToExpand<'_>,
    ) -> Result<Value, SharePointError> {
        let params = odata_query(columns_to_expand);
        self.get_json(&self.endpoints.list_items_url(list_title), Some(params.as_slice()))
            .await
    }

    /// Returns the first page of items of the list with the given id
    pub async fn get_list_items_by_id(
        &self,
        list_id: &str,
        columns_to_expand: &ColumnsToExpand<'_>,
    ) -> Result<Value, SharePointError> {
        let params = odata_query(columns_to_expand);
        self.get_json(&self.endpoints.list_items_by_id_url(list_id), Some(params.as_slice()))
            .await
    }

    /// Streams the items of a list, following the next page links of the server
    pub fn list_items(
        &self,
        list_title: &str,
        columns_to_expand: &ColumnsToExpand<'_>,
    ) -> impl Stream<Item = Result<Value, SharePointError>> {
        self.paginate(
            self.endpoints.list_items_url(list_title),
            odata_query(columns_to_expand),
        )
    }

    /// Streams the items of the list with the given id
    pub fn list_items_by_id(
        &self,
        list_id: &str,
        columns_to_expand: &ColumnsToExpand<'_>,
    ) -> impl Stream<Item = Result<Value, SharePointError>> {
        self.paginate(
            self.endpoints.list_items_by_id_url(list_id),
            odata_query(columns_to_expand),
        )
    }

    /// Returns every item of a list, all pages concatenated in server order.
    ///
    /// A failing page fails the whole call.
    pub async fn get_list_all_items(
        &self,
        list_title: &str,
        columns_to_expand: &ColumnsToExpand<'_>,
    ) -> Result<Vec<Value>, SharePointError> {
        self.list_items(list_title, columns_to_expand)
            .try_collect()
            .await
    }

    pub async fn get_list_all_items_by_id(
        &self,
        list_id: &str,
        columns_to_expand: &ColumnsToExpand<'_>,
    ) -> Result<Vec<Value>, SharePointError> {
        self.list_items_by_id(list_id, columns_to_expand)
            .try_collect()
            .await
    }

    /// Creates a generic (custom) list
    pub async fn create_list(&self, list_title: &str) -> Result<SharePointList, SharePointError> {
        let body = json!({
            "__metadata": {"type": "SP.List"},
            "AllowContentTypes": true,
            "BaseTemplate": 100,
            "ContentTypesEnabled": true,
            "Title": list_title
        });
        let resp = self
            .session
            .post(&self.endpoints.lists_url(), odata_headers(), Payload::Json(body))
            .await?;
        object_of(json_response(resp).await?)
    }

    pub async fn delete_list(&self, list_title: &str) -> Result<(), SharePointError> {
        let mut headers = delete_headers();
        headers.insert(IF_MATCH, HeaderValue::from_static("*"));
        let resp = self
            .session
            .post(&self.endpoints.list_by_title_url(list_title), headers, Payload::Empty)
            .await?;
        raw_response(resp).await.map(|_| ())
    }

    /// Adds a field to a list
    pub async fn create_custom_field(
        &self,
        list_title: &str,
        field_title: &str,
        field_type: FieldType,
    ) -> Result<Value, SharePointError> {
        let url = self.endpoints.list_add_field_url(list_title);
        self.create_field(&url, field_title, field_type).await
    }

    /// Adds a field to the list with the given id
    pub async fn create_custom_field_via_id(
        &self,
        list_id: &str,
        field_title: &str,
        field_type: FieldType,
    ) -> Result<Value, SharePointError> {
        let url = self.endpoints.list_add_field_by_id_url(list_id);
        self.create_field(&url, field_title, field_type).await
    }

    /// Adds an item to a list, its OData type is derived from the list title
    pub async fn add_list_item(
        &self,
        list_title: &str,
        item: Map<String, Value>,
    ) -> Result<Value, SharePointError> {
        self.add_item(
            &self.endpoints.list_items_url(list_title),
            &list_item_entity_type(list_title),
            item,
        )
        .await
    }

    /// Adds an item to a list retrieved by [`SharePointClient::create_list`] or
    /// [`SharePointClient::get_lists`]
    pub async fn add_list_item_by_id(
        &self,
        list: &SharePointList,
        item: Map<String, Value>,
    ) -> Result<Value, SharePointError> {
        self.add_item(
            &self.endpoints.list_items_by_id_url(&list.id),
            &list.list_item_entity_type_full_name,
            item,
        )
        .await
    }

    async fn create_field(
        &self,
        url: &str,
        field_title: &str,
        field_type: FieldType,
    ) -> Result<Value, SharePointError> {
        let field_type: &'static str = field_type.into();
        let schema = format!(
            "<Field DisplayName='{}' Format='Dropdown' MaxLength='255' Type='{}'></Field>",
            xml_escape(field_title),
            field_type
        );
        let body = json!({
            "parameters": {
                "__metadata": {"type": "SP.XmlSchemaFieldCreationInformation"},
                "SchemaXml": schema
            }
        });
        let resp = self
            .session
            .post(url, odata_headers(), Payload::Json(body))
            .await?;
        json_response(resp).await
    }

    async fn add_item(
        &self,
        url: &str,
        entity_type: &str,
        mut item: Map<String, Value>,
    ) -> Result<Value, SharePointError> {
        item.insert("__metadata".to_string(), json!({"type": entity_type}));
        let resp = self
            .session
            .post(url, odata_headers(), Payload::Json(Value::Object(item)))
            .await?;
        json_response(resp).await
    }

    async fn get_json(
        &self,
        url: &str,
        params: Option<&[(String, String)]>,
    ) -> Result<Value, SharePointError> {
        let params: Option<Vec<(&str, &str)>> = params.filter(|p| !p.is_empty()).map(|p| {
            p.iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect()
        });
        let resp = self
            .session
            .get(url, HeaderMap::new(), params.as_deref())
            .await?;
        json_response(resp).await
    }

    // Walks the pages linked by their next page url
    fn paginate(
        &self,
        url: String,
        params: Vec<(String, String)>,
    ) -> impl Stream<Item = Result<Value, SharePointError>> + use<'_> {
        let max_pages = self.options.max_pages;
        try_stream! {
            let mut page = self.get_json(&url, Some(params.as_slice())).await?;
            let mut fetched: usize = 1;
            loop {
                let (items, next_page) = split_page(page)?;
                for item in items {
                    yield item;
                }

                let Some(next_page) = next_page else {
                    break;
                };
                if let Some(max) = max_pages.filter(|max| fetched >= *max) {
                    Err::<(), _>(SharePointError::PageLimitExceeded(max))?;
                }
                debug!("Following next page {}", next_page);
                page = self.get_json(&next_page, None).await?;
                fetched += 1;
            }
        }
    }
}

/// Builds the OData `$select` / `$expand` query options for the given columns
pub fn odata_query(columns_to_expand: &ColumnsToExpand<'_>) -> Vec<(String, String)> {
    if columns_to_expand.is_empty() {
        return Vec::new();
    }
    let select: Vec<String> = columns_to_expand
        .iter()
        .map(|(column, sub_field)| match sub_field {
            Some(sub_field) => format!("{column}/{sub_field}"),
            None => column.to_string(),
        })
        .collect();
    let expand: Vec<&str> = columns_to_expand
        .iter()
        .filter(|(_, sub_field)| sub_field.is_some())
        .map(|(column, _)| *column)
        .collect();

    let mut params = vec![("$select".to_string(), select.join(","))];
    if !expand.is_empty() {
        params.push(("$expand".to_string(), expand.join(",")));
    }
    params
}

fn delete_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(HTTP_METHOD_HEADER, HeaderValue::from_static("DELETE"));
    headers
}

fn odata_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    headers
}

async fn json_response(resp: Response) -> Result<Value, SharePointError> {
    let status = resp.status().as_u16();
    let body = resp.bytes().await?;
    parse_json_body(status, &body)
}

async fn raw_response(resp: Response) -> Result<Bytes, SharePointError> {
    let status = resp.status().as_u16();
    let body = resp.bytes().await?;
    check_raw_body(status, &body)?;
    Ok(body)
}

// Errors shared by JSON and raw responses
fn check_status(status: u16, body: &[u8]) -> Result<(), SharePointError> {
    match ResponseCode::try_from(status) {
        Ok(ResponseCode::BadRequest) => Err(SharePointError::ApiResponse(
            status,
            String::from_utf8_lossy(body).into_owned(),
        )),
        Ok(ResponseCode::Unauthorized) => Err(SharePointError::Auth(
            "Unauthorized. Please check your account credentials.".to_string(),
        )),
        Ok(ResponseCode::Forbidden) => Err(SharePointError::Auth(
            "Forbidden. Please check your account credentials.".to_string(),
        )),
        Ok(ResponseCode::NotFound) => Err(SharePointError::NotFound(
            "Not found. Please check tenant, site type or site name.".to_string(),
        )),
        Err(_) => Ok(()),
    }
}

fn check_raw_body(status: u16, body: &[u8]) -> Result<(), SharePointError> {
    check_status(status, body)?;
    if status >= 400 {
        return Err(SharePointError::ApiResponse(
            status,
            String::from_utf8_lossy(body).into_owned(),
        ));
    }
    Ok(())
}

fn parse_json_body(status: u16, body: &[u8]) -> Result<Value, SharePointError> {
    check_status(status, body)?;
    if body.is_empty() {
        return Err(SharePointError::Auth(
            "Empty response from SharePoint. Please check user credentials.".to_string(),
        ));
    }
    let json: Value = serde_json::from_slice(body).map_err(|_| {
        SharePointError::Auth(format!(
            "Invalid response from SharePoint (status {status}). Please check user credentials."
        ))
    })?;

    if let Some(error) = ERROR_KEYS.iter().find_map(|key| json.get(*key)) {
        let message = get_from_json_path(&["message", "value"], error)
            .and_then(Value::as_str)
            .map_or_else(|| "Error".to_string(), |msg| format!("Error: {msg}"));
        return Err(SharePointError::ApiResponse(status, message));
    }
    if status >= 400 {
        return Err(SharePointError::ApiResponse(
            status,
            String::from_utf8_lossy(body).into_owned(),
        ));
    }
    Ok(json)
}

// Items and next page link of one page of list items
fn split_page(mut page: Value) -> Result<(Vec<Value>, Option<String>), SharePointError> {
    let next_page = NEXT_PAGE_PATHS
        .iter()
        .find_map(|path| get_from_json_path(path, &page))
        .and_then(Value::as_str)
        .map(str::to_string);

    let items = RESULTS_PATHS
        .iter()
        .find_map(|path| {
            let pointer = format!("/{}", path.join("/"));
            page.pointer_mut(&pointer).map(Value::take)
        })
        .and_then(|results| match results {
            Value::Array(items) => Some(items),
            _ => None,
        })
        .ok_or(SharePointError::ResponseMissing())?;
    Ok((items, next_page))
}

// Expected response for a collection in verbose mode
#[derive(Deserialize, Debug)]
struct CollectionResponse<T> {
    d: Option<Results<T>>,
}

#[derive(Deserialize, Debug)]
struct Results<T> {
    results: Vec<T>,
}

// Expected response for a single object in verbose mode
#[derive(Deserialize, Debug)]
struct ObjectResponse<T> {
    d: Option<T>,
}

fn results_of<T: DeserializeOwned>(json: Value) -> Result<Vec<T>, SharePointError> {
    serde_json::from_value::<CollectionResponse<T>>(json)?
        .d
        .map(|d| d.results)
        .ok_or(SharePointError::ResponseMissing())
}

fn object_of<T: DeserializeOwned>(json: Value) -> Result<T, SharePointError> {
    serde_json::from_value::<ObjectResponse<T>>(json)?
        .d
        .ok_or(SharePointError::ResponseMissing())
}
