//! Page arithmetic and the category listing envelope.
//!
//! Nothing here filters or sorts; callers hand in an already ordered,
//! already filtered sequence (or its total count plus one slice of it).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::CategoryModel;
use crate::errors::ServiceError;

/// Products per page of a category listing.
pub const PRODUCTS_PER_PAGE: u64 = 18;

/// A 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u64,
    size: u64,
}

impl PageRequest {
    /// Fails with a validation error when `number` or `size` is below 1.
    pub fn new(number: i64, size: u64) -> Result<Self, ServiceError> {
        if number < 1 {
            return Err(ServiceError::ValidationError(format!(
                "page must be a positive integer, got {number}"
            )));
        }
        if size < 1 {
            return Err(ServiceError::ValidationError(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            number: number as u64,
            size,
        })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Zero-based index of the first item on this page, or `None` when it
    /// does not fit a signed 64-bit SQL offset. Such a page is past the end
    /// of any result.
    pub fn offset(&self) -> Option<u64> {
        (self.number - 1)
            .checked_mul(self.size)
            .filter(|offset| i64::try_from(*offset).is_ok())
    }
}

/// One page of an ordered result together with its position metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub size: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            number: request.number,
            size: request.size,
            total,
        }
    }

    /// Number of pages; an empty result still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.size)
        }
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        let prev = self.number.checked_sub(1)?;
        (prev >= 1 && prev <= self.num_pages()).then_some(prev)
    }

    pub fn next_page_number(&self) -> Option<u64> {
        (self.number < self.num_pages()).then_some(self.number + 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total: self.total,
        }
    }

    /// Shapes the page into the category listing envelope.
    pub fn into_envelope(self, category: &CategoryModel) -> CategoryEnvelope<T> {
        let prev_page_number = self.previous_page_number();
        let next_page_number = self.next_page_number();
        CategoryEnvelope {
            category: CategoryPage {
                id: category.id,
                name: category.name.clone(),
                description: category.description.clone(),
                slug: category.slug.clone(),
                products: self.items,
                prev_page_number,
                next_page_number,
            },
        }
    }
}

/// `{"category": {...}}` wrapper returned by the product listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryEnvelope<P> {
    pub category: CategoryPage<P>,
}

/// Category fields plus one page of its products and sibling-page hints.
/// Missing neighbours serialise as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryPage<P> {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub slug: String,
    pub products: Vec<P>,
    pub prev_page_number: Option<u64>,
    pub next_page_number: Option<u64>,
}
