//! One page of a paginated listing
//!
//! Decodes the Spring Data page envelope. Only `content`, `number`, `size`,
//! `totalElements` and `totalPages` are read; the rest (`pageable`, `sort`,
//! `first`, `last`, `empty`, `numberOfElements`) is derivable and ignored.
//! The envelope is checked for internal consistency while decoding, so a
//! `Page` that exists is always coherent.

use std::slice;

use serde::{Deserialize, Serialize};

/// A page of `T`. Page numbers are zero-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawPage<T>",
    bound(deserialize = "T: Deserialize<'de>", serialize = "T: Serialize")
)]
pub struct Page<T> {
    content: Vec<T>,
    #[serde(rename = "number")]
    page_number: u32,
    #[serde(rename = "size")]
    page_size: u32,
    #[serde(rename = "totalElements")]
    total_elements: u64,
    #[serde(rename = "totalPages")]
    total_pages: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage<T> {
    content: Vec<T>,
    #[serde(alias = "pageNumber")]
    number: u32,
    #[serde(alias = "pageSize")]
    size: u32,
    total_elements: u64,
    #[serde(default)]
    total_pages: Option<u32>,
}

/// Page count for `total_elements` split into pages of `page_size`. An
/// unpaged result (`page_size == 0`) is a single page.
fn page_count(total_elements: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        1
    } else {
        total_elements.div_ceil(u64::from(page_size))
    }
}

impl<T> TryFrom<RawPage<T>> for Page<T> {
    type Error = String;

    fn try_from(raw: RawPage<T>) -> Result<Self, Self::Error> {
        if raw.size > 0 && raw.content.len() as u64 > u64::from(raw.size) {
            return Err(format!(
                "page holds {} items but size is {}",
                raw.content.len(),
                raw.size
            ));
        }

        let expected = page_count(raw.total_elements, raw.size);
        let total_pages = match raw.total_pages {
            Some(total_pages) if raw.size > 0 && u64::from(total_pages) != expected => {
                return Err(format!(
                    "totalPages is {total_pages} but {} elements at size {} make {expected}",
                    raw.total_elements, raw.size
                ));
            }
            Some(total_pages) => total_pages,
            None => u32::try_from(expected)
                .map_err(|_| format!("page count {expected} out of range"))?,
        };

        Ok(Page {
            content: raw.content,
            page_number: raw.number,
            page_size: raw.size,
            total_elements: raw.total_elements,
            total_pages,
        })
    }
}

impl<T> Page<T> {
    /// Build a page, deriving `total_pages` from the element count.
    pub fn new(content: Vec<T>, page_number: u32, page_size: u32, total_elements: u64) -> Self {
        let total_pages = u32::try_from(page_count(total_elements, page_size)).unwrap_or(u32::MAX);
        Self {
            content,
            page_number,
            page_size,
            total_elements,
            total_pages,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_first(&self) -> bool {
        self.page_number == 0
    }

    pub fn is_last(&self) -> bool {
        u64::from(self.page_number) + 1 >= u64::from(self.total_pages)
    }

    pub fn has_next(&self) -> bool {
        !self.is_last()
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.content.iter()
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}
