use chrono::Datelike as _;
use serde::{Deserialize, Deserializer};

use crate::formats::{BookRecord, Field, normalize_genre};
use crate::lookup::{LookupMatch, MetadataLookup};

/// Raw "add book" input as submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default, deserialize_with = "stars_or_zero")]
    pub stars: u32,
}

/// Accepts a number or a numeric string; a blank string (a cleared form
/// field) counts as zero stars.
fn stars_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stars {
        Count(u32),
        Text(String),
    }

    match Stars::deserialize(deserializer)? {
        Stars::Count(count) => Ok(count),
        Stars::Text(text) if text.trim().is_empty() => Ok(0),
        Stars::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("stars must be a whole number: {text:?}"))),
    }
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Builds a record, consulting `lookup` once for page count and publish year.
///
/// Lookup failures are logged and recorded as unknown fields; this never fails.
pub async fn create_record(
    lookup: &dyn MetadataLookup,
    input: NewBook,
    date_read: i32,
) -> BookRecord {
    let title = input.title.trim();
    let author = input.author.trim();

    let metadata = match lookup.search(title, author).await {
        Ok(Some(found)) => {
            tracing::debug!(title, author, ?found, "metadata lookup matched");
            Some(found)
        }
        Ok(None) => {
            tracing::info!(title, author, "no metadata match; pages and publish year unknown");
            None
        }
        Err(err) => {
            tracing::warn!(title, author, ?err, "metadata lookup failed; pages and publish year unknown");
            None
        }
    };

    build_record(input, metadata, date_read)
}

pub fn build_record(input: NewBook, metadata: Option<LookupMatch>, date_read: i32) -> BookRecord {
    let metadata = metadata.unwrap_or_default();
    BookRecord {
        title: input.title.trim().to_owned(),
        author: input.author.trim().to_owned(),
        genre: normalize_genre(&input.genre),
        pages: Field::from(metadata.pages),
        stars: input.stars,
        published_date: Field::from(metadata.first_publish_year),
        date_read,
    }
}
