//! Product records and the rows they are persisted as

use crate::storage::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};
use url::Url;

/// Timestamp layout used in the persisted log
pub const SCRAPED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One product scraped from a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    /// Last path segment of the product URL; the reconciliation key
    pub code: String,
    pub short_title: String,
    /// Derived from `code`, see [`full_title_from_code`]
    pub full_title: String,
    pub image_path: String,
    pub product_url: String,
    /// Raw price text as rendered by the site
    pub price: String,
    pub scraped_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Renders the record as one line of the append-only log
    ///
    /// Column order is `code,product_title,short_title,product_price,
    /// path_to_image,product_url,product_price,scraped_at`. The price column
    /// appears twice to stay readable by consumers of the historical layout.
    /// Fields are quoted only when they contain a comma, a quote or a line
    /// break.
    pub fn to_log_row(&self) -> StorageResult<String> {
        let scraped_at = self.scraped_at.format(SCRAPED_AT_FORMAT).to_string();
        let fields = [
            self.code.as_str(),
            self.full_title.as_str(),
            self.short_title.as_str(),
            self.price.as_str(),
            self.image_path.as_str(),
            self.product_url.as_str(),
            self.price.as_str(),
            scraped_at.as_str(),
        ];

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(fields)?;
        let bytes = writer
            .into_inner()
            .map_err(|e| StorageError::Io(e.into_error()))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Products extracted from one listing page, keyed by code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    pub page: u32,
    products: BTreeMap<String, ProductRecord>,
}

impl PageResult {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            products: BTreeMap::new(),
        }
    }

    /// Inserts a record, returning the one it replaced if the code was already present
    pub fn insert(&mut self, record: ProductRecord) -> Option<ProductRecord> {
        self.products.insert(record.code.clone(), record)
    }

    pub fn get(&self, code: &str) -> Option<&ProductRecord> {
        self.products.get(code)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.products.keys().map(String::as_str)
    }
}

impl IntoIterator for PageResult {
    type Item = ProductRecord;
    type IntoIter = btree_map::IntoValues<String, ProductRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.into_values()
    }
}

/// Returns the last non-empty path segment of a product URL
///
/// `https://shop.test/product/dental-mirror-x2/` yields `dental-mirror-x2`.
pub fn code_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

/// Un-slugifies a product code into a title
///
/// Hyphens become spaces; a letter is upper-cased when the character before it
/// is not a letter and lower-cased otherwise.
pub fn full_title_from_code(code: &str) -> String {
    let mut title = String::with_capacity(code.len());
    let mut previous_is_letter = false;

    for c in code.chars() {
        let c = if c == '-' { ' ' } else { c };
        if c.is_alphabetic() {
            if previous_is_letter {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            title.push(c);
            previous_is_letter = false;
        }
    }

    title
}
