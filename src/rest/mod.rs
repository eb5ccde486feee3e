/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod file;
pub mod folder;
pub mod list;
mod ntlm;
mod parsers;
pub mod paths;
pub mod properties;
pub mod urls;

pub use api::*;
pub use client::*;
pub use config::*;
pub use errors::*;
pub use file::*;
pub use folder::*;
pub use list::*;
pub use paths::*;
pub use properties::*;
pub use urls::*;
