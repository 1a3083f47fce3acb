//! The tag record exchanged with ffmpeg.
//!
//! A [`Metadata`] is an opaque mapping from tag name to tag value. A handful
//! of well-known keys get convenience accessors, but any key is allowed and
//! no value is validated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known tag names.
pub mod keys {
    pub const ARTIST: &str = "artist";
    pub const ALBUM: &str = "album";
    pub const TITLE: &str = "title";
    pub const TRACK: &str = "track";
    pub const DISK: &str = "disk";
    pub const LABEL: &str = "label";
    pub const DATE: &str = "date";
}

/// Tag name to tag value. Inserting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    tags: BTreeMap<String, String>,
}

macro_rules! well_known {
    ($($get:ident, $set:ident => $key:expr;)*) => {
        $(
            pub fn $get(&self) -> Option<&str> {
                self.get($key)
            }

            pub fn $set(&mut self, value: impl Into<String>) {
                self.insert($key, value);
            }
        )*
    };
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.tags.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut String> {
        self.tags.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.tags.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate tags in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    well_known! {
        artist, set_artist => keys::ARTIST;
        album, set_album => keys::ALBUM;
        title, set_title => keys::TITLE;
        track, set_track => keys::TRACK;
        disk, set_disk => keys::DISK;
        label, set_label => keys::LABEL;
        date, set_date => keys::DATE;
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut meta = Metadata::new();
        meta.extend(iter);
        meta
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Metadata {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Metadata {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.into_iter()
    }
}
