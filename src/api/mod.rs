//! VK API module
//!
//! Method calls, the batched `execute` wall walk, and the page, batch and
//! lookup sources the fetch engine runs on.

mod client;
mod execute;

pub use client::{Profile, VkApi, DEFAULT_API_VERSION, DEFAULT_BASE_URL};
pub use execute::{RawBatch, WallScript};

use crate::config::Config;
use crate::error::Result;
use crate::http::HttpClient;

/// Build a client from loaded configuration
pub fn connect(config: &Config) -> Result<VkApi> {
    let http = HttpClient::with_config(config.api.http_config())?;
    Ok(VkApi::new(http, config.access_token.clone()).with_version(config.api.version.clone()))
}

#[cfg(test)]
mod tests;
