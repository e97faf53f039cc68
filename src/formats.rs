use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_GENRE: &str = "other";

const NON_FICTION_GENRES: &[&str] = &["nonfiction", "memoir"];

/// A value that may be missing because the metadata lookup did not provide it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field<T> {
    Known(T),
    #[default]
    Unknown,
}

impl<T> Field<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Field::Known(value) => Some(value),
            Field::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Field::Known(_))
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Field::Known(value),
            None => Field::Unknown,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Known(value) => value.fmt(f),
            Field::Unknown => f.write_str("unknown"),
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.known().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Field::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Fiction,
    #[serde(rename = "Non-Fiction")]
    NonFiction,
}

impl Category {
    pub fn of_genre(genre: &str) -> Self {
        let genre = genre.trim();
        if NON_FICTION_GENRES
            .iter()
            .any(|g| g.eq_ignore_ascii_case(genre))
        {
            Category::NonFiction
        } else {
            Category::Fiction
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Fiction => "Fiction",
            Category::NonFiction => "Non-Fiction",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(default)]
    pub pages: Field<u32>,
    pub stars: u32,
    #[serde(default)]
    pub published_date: Field<i32>,
    pub date_read: i32,
}

impl BookRecord {
    pub fn category(&self) -> Category {
        Category::of_genre(&self.genre)
    }
}

/// Empty or whitespace-only genres become [`DEFAULT_GENRE`].
pub fn normalize_genre(genre: &str) -> String {
    let genre = genre.trim();
    if genre.is_empty() {
        DEFAULT_GENRE.to_owned()
    } else {
        genre.to_owned()
    }
}
