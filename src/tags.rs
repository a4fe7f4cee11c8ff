// taffy: Streaming, merging and random access for MAF/TAF multiple alignments.
//
// Copyright 2025 The taffy developers.
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//

//! Ordered key-value tags attached to file headers and alignment columns.
//!
//! MAF headers use `=` as the key-value delimiter (`##maf version=1`) and TAF
//! headers and column tags use `:` (`#taf version:1`, `@ q:5`).
//!
//! ## Usage
//!
//! ```rust
//! use taffy::tags::Tags;
//!
//! let tags = Tags::parse("version:1 scoring:N/A", ':');
//! assert_eq!(tags.find("scoring").unwrap().value, "N/A");
//! assert_eq!(tags.to_text('='), "version=1 scoring=N/A");
//!
//! // A token without a delimiter makes the whole list malformed
//! assert!(Tags::parse("version:1 scoring", ':').is_empty());
//! ```
//!

/// A single `key<delimiter>value` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: &str, value: &str) -> Self {
        Tag { key: key.to_string(), value: value.to_string() }
    }
}

/// Ordered list of [Tag]s. Lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    tags: Vec<Tag>,
}

impl Tags {
    pub fn new() -> Self {
        Tags::default()
    }

    /// Parses whitespace separated `key<delimiter>value` tokens.
    ///
    /// Returns an empty list if any token lacks the delimiter.
    pub fn parse(
        text: &str,
        delimiter: char,
    ) -> Self {
        Tags::from_tokens(text.split_whitespace(), delimiter)
    }

    pub fn from_tokens<'a, I: IntoIterator<Item = &'a str>>(
        tokens: I,
        delimiter: char,
    ) -> Self {
        let mut tags: Vec<Tag> = Vec::new();
        for token in tokens {
            match token.split_once(delimiter) {
                Some((key, value)) => tags.push(Tag::new(key, value)),
                None => {
                    log::warn!("Ignoring malformed tag list: token '{}' has no '{}'", token, delimiter);
                    return Tags::default();
                },
            }
        }
        Tags { tags }
    }

    pub fn find(
        &self,
        key: &str,
    ) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.key == key)
    }

    /// Returns a copy with the first tag matching `key` removed.
    pub fn remove(
        &self,
        key: &str,
    ) -> Self {
        let mut tags = self.tags.clone();
        if let Some(idx) = tags.iter().position(|tag| tag.key == key) {
            tags.remove(idx);
        }
        Tags { tags }
    }

    /// Replaces the value of the first tag matching `key` or appends a new tag.
    pub fn set(
        &mut self,
        key: &str,
        value: &str,
    ) {
        match self.tags.iter_mut().find(|tag| tag.key == key) {
            Some(tag) => tag.value = value.to_string(),
            None => self.tags.push(Tag::new(key, value)),
        }
    }

    pub fn push(
        &mut self,
        tag: Tag,
    ) {
        self.tags.push(tag);
    }

    /// Space separated `key<delimiter>value` tokens, no trailing space.
    pub fn to_text(
        &self,
        delimiter: char,
    ) -> String {
        self.tags.iter()
                 .map(|tag| format!("{}{}{}", tag.key, delimiter, tag.value))
                 .collect::<Vec<String>>()
                 .join(" ")
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Tag> for Tags {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Tags { tags: iter.into_iter().collect() }
    }
}
