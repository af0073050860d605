//! Arbitrary URLs fetched once into the cache
//!
//! Keys are the SHA-256 of the URL, so any URL maps to a safe directory:
//! `<cache_root>/URL/<sha256>/{source,content}`.

use crate::cache::{Bytes, DirectField, Entity, Field, FieldContext, FromRecord, Record, Serializer};
use crate::error::{UrError, UrResult};
use crate::services::Services;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// A remote document
pub struct RemoteUrl {
    url: String,
    record: Record,
    services: Arc<Services>,
}

impl Entity for RemoteUrl {
    fn record(&self) -> &Record {
        &self.record
    }
}

impl FromRecord<(Arc<Services>, String)> for RemoteUrl {
    const TYPE_NAME: &'static str = "URL";

    fn from_record(record: Record, (services, url): (Arc<Services>, String)) -> Self {
        Self {
            url,
            record,
            services,
        }
    }
}

/// Cache key for `url`
pub fn url_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

impl RemoteUrl {
    /// The URL itself, recorded next to the content for `ur cache list`
    pub const SOURCE: Field<RemoteUrl, String> = Field::new("source", RemoteUrl::source);

    /// Response body
    pub const CONTENT: DirectField<RemoteUrl, Vec<u8>> =
        DirectField::new("content", RemoteUrl::download, RemoteUrl::load_content);

    pub fn open(services: &Arc<Services>, url: &str, skip_cache: bool) -> UrResult<Self> {
        services.cache.get_or_create(
            &url_key(url),
            skip_cache,
            (Arc::clone(services), url.to_string()),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bytes(&self) -> UrResult<Vec<u8>> {
        self.get(&Self::SOURCE)?;
        self.fetch(&Self::CONTENT)
    }

    pub fn text(&self) -> UrResult<String> {
        String::from_utf8(self.bytes()?).map_err(|e| UrError::Decode {
            path: self.record.field_path(Self::CONTENT.name()),
            reason: e.to_string(),
        })
    }

    pub fn json(&self) -> UrResult<Value> {
        serde_json::from_slice(&self.bytes()?).map_err(|e| UrError::Decode {
            path: self.record.field_path(Self::CONTENT.name()),
            reason: e.to_string(),
        })
    }

    fn source(&self) -> UrResult<String> {
        Ok(self.url.clone())
    }

    fn download(ctx: &FieldContext<'_, RemoteUrl>) -> UrResult<()> {
        ctx.entity.services.http.download(&ctx.entity.url, ctx.path)
    }

    fn load_content(ctx: &FieldContext<'_, RemoteUrl>) -> UrResult<Vec<u8>> {
        Bytes::load(ctx.path)
    }
}
