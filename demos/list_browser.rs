/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

extern crate sharepoint;

use anyhow::Result;
use dotenvy::dotenv;
use futures::{StreamExt, pin_mut};
use serde_json::Value;
use sharepoint::rest::{SharePointClient, SharePointConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

// Prints the folders and files directly below `path`
async fn browse_folder(client: &SharePointClient, path: &str) -> Result<()> {
    for folder in client.get_folders(path).await? {
        println!("[dir]  {} ({} items)", folder.server_relative_url, folder.item_count);
    }
    for file in client.get_files(path).await? {
        println!("[file] {} ({} bytes)", file.server_relative_url, file.length);
    }
    Ok(())
}

// Prints the visible columns of a list followed by its items, page after page
async fn browse_list(client: &SharePointClient, list_title: &str) -> Result<()> {
    let columns: Vec<String> = client
        .get_list_fields(list_title)
        .await?
        .into_iter()
        .filter(|field| field.is_visible_column())
        .map(|field| field.static_name)
        .collect();
    println!("Columns of {}: {}", list_title, columns.join(", "));

    let columns_to_expand: Vec<(&str, Option<&str>)> =
        columns.iter().map(|column| (column.as_str(), None)).collect();
    let items = client.list_items(list_title, &columns_to_expand);

    pin_mut!(items);
    let mut count = 0;
    while let Some(item) = items.next().await {
        let item = item?;
        let row: Vec<String> = columns
            .iter()
            .map(|column| match &item[column.as_str()] {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect();
        println!("{}", row.join(" | "));
        count += 1;
    }
    println!("{} items in {}", count, list_title);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    // The configuration file holds a `sharepoint_local` (NTLM login) or a `sharepoint_oauth`
    // (access token) section, see SharePointConfig::from_value
    let config = get_config(std::env::var("SHAREPOINT_CONFIG")?.into())?;
    let list_title = config.list_title.clone();
    let client = SharePointClient::new(config)?;

    let path = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());
    browse_folder(&client, &path).await?;

    if let Some(list_title) = list_title {
        browse_list(&client, &list_title).await?;
    } else {
        for list in client.get_lists().await?.iter().filter(|list| !list.is_hidden) {
            println!("[list] {} ({} items)", list.title, list.item_count);
        }
    }
    Ok(())
}

fn get_config(path: PathBuf) -> Result<SharePointConfig> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let value: Value = serde_json::from_reader(reader)?;
    Ok(SharePointConfig::from_value(&value)?)
}
