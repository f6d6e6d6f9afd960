pub mod catalog;
pub mod catalog_store;
pub mod pagination;

pub use catalog::{CatalogService, ProductDetail};
pub use catalog_store::{CascadeSummary, CatalogStore, NewCategory, NewProduct, NewVariant};
pub use pagination::{CategoryEnvelope, CategoryPage, Page, PageRequest, PRODUCTS_PER_PAGE};
