/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::config::SharePointConfig;
use crate::rest::paths::{normalize_absolute, normalize_relative};

/// Builds the REST endpoint urls of one site.
///
/// File and folder paths are server-relative to the root folder (document library) of the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    origin: String,
    site: String,
    root: String,
}

impl Endpoints {
    pub fn new(config: &SharePointConfig) -> Self {
        Self {
            origin: config.origin.clone(),
            site: config.site.clone(),
            root: config.root.clone(),
        }
    }

    /// `<origin>/<site>/_api/Web`
    pub fn base_url(&self) -> String {
        format!("{}/{}/_api/Web", self.origin, self.site)
    }

    // Quoted server-relative url of a path below the root folder
    fn site_path(&self, path: &str) -> String {
        let path = normalize_absolute(path);
        if path == "/" {
            format!("'/{}/{}'", self.site, self.root)
        } else {
            format!("'/{}/{}{}'", self.site, self.root, path)
        }
    }

    pub fn folder_url(&self, path: &str) -> String {
        format!(
            "{}/GetFolderByServerRelativeUrl({})",
            self.base_url(),
            self.site_path(path)
        )
    }

    pub fn folders_url(&self, path: &str) -> String {
        format!("{}/Folders", self.folder_url(path))
    }

    pub fn files_url(&self, path: &str) -> String {
        format!("{}/Files", self.folder_url(path))
    }

    pub fn file_url(&self, path: &str) -> String {
        format!(
            "{}/GetFileByServerRelativeUrl({})",
            self.base_url(),
            self.site_path(path)
        )
    }

    pub fn file_content_url(&self, path: &str) -> String {
        format!("{}/$value", self.file_url(path))
    }

    /// Upload into `folder`, existing files are overwritten
    pub fn file_add_url(&self, folder: &str, file_name: &str) -> String {
        format!(
            "{}/Files/add(url='{}',overwrite=true)",
            self.folder_url(folder),
            file_name
        )
    }

    pub fn folder_add_url(&self, path: &str) -> String {
        let path = normalize_absolute(path);
        format!(
            "{}/Folders/add('{}/{}')",
            self.base_url(),
            self.root,
            normalize_relative(&path)
        )
    }

    /// Move with flags=1 (overwrite)
    pub fn move_url(&self, from_path: &str, to_path: &str) -> String {
        format!(
            "{}/moveto(newurl={},flags=1)",
            self.file_url(from_path),
            self.site_path(to_path)
        )
    }

    pub fn lists_url(&self) -> String {
        format!("{}/lists", self.base_url())
    }

    pub fn list_by_title_url(&self, list_title: &str) -> String {
        format!(
            "{}/GetByTitle('{}')",
            self.lists_url(),
            urlencoding::encode(list_title)
        )
    }

    pub fn list_by_id_url(&self, list_id: &str) -> String {
        format!("{}('{}')", self.lists_url(), list_id)
    }

    pub fn list_items_url(&self, list_title: &str) -> String {
        format!("{}/Items", self.list_by_title_url(list_title))
    }

    pub fn list_items_by_id_url(&self, list_id: &str) -> String {
        format!("{}/Items", self.list_by_id_url(list_id))
    }

    pub fn list_fields_url(&self, list_title: &str) -> String {
        format!("{}/fields", self.list_by_title_url(list_title))
    }

    pub fn list_add_field_url(&self, list_title: &str) -> String {
        format!(
            "{}/GetList(@a1)/Fields/CreateFieldAsXml?@a1='/{}/Lists/{}'",
            self.base_url(),
            self.site,
            list_title
        )
    }

    pub fn list_add_field_by_id_url(&self, list_id: &str) -> String {
        format!("{}/Fields/CreateFieldAsXml", self.list_by_id_url(list_id))
    }
}
