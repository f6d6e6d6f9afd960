use std::{collections::HashMap, sync::Arc};

use sea_orm::{
    sea_query::Query, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    entities::{
        category, product, product_image, product_variant, Category, CategoryModel, Product,
        ProductImage, ProductImageModel, ProductModel, ProductVariant, ProductVariantModel,
    },
    errors::ServiceError,
    services::pagination::{Page, PageRequest},
};

/// A product with its variants (by id) and images (by sort, then id).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    pub product: ProductModel,
    pub variants: Vec<ProductVariantModel>,
    pub images: Vec<ProductImageModel>,
}

/// Read side of the catalog.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All categories by ascending sort key.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(Category::find()
            .order_by_asc(category::Column::Sort)
            .order_by_asc(category::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// In-stock products of a category, newest first, one page at a time.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        category_slug: &str,
        page: PageRequest,
    ) -> Result<(CategoryModel, Page<ProductDetail>), ServiceError> {
        let category = Category::find()
            .filter(category::Column::Slug.eq(category_slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("category {category_slug}")))?;

        // A product is listed once however many of its sizes are in stock.
        let in_stock = Query::select()
            .column(product_variant::Column::ProductId)
            .from(ProductVariant)
            .and_where(product_variant::Column::Quantity.gt(0))
            .to_owned();

        let listing = Product::find()
            .filter(product::Column::CategoryId.eq(category.id))
            .filter(product::Column::Id.in_subquery(in_stock));

        let total = listing.clone().count(&*self.db).await?;
        let products = match page.offset() {
            Some(offset) if offset < total => {
                listing
                    .order_by_desc(product::Column::CreatedAt)
                    .order_by_desc(product::Column::Id)
                    .offset(offset)
                    .limit(page.size())
                    .all(&*self.db)
                    .await?
            }
            _ => Vec::new(),
        };

        debug!(
            category = %category.slug,
            total,
            returned = products.len(),
            page = page.number(),
            "Listed products"
        );

        let details = self.load_details(products).await?;
        Ok((category, Page::new(details, page, total)))
    }

    /// A product looked up by its slug within the named category. A product
    /// filed under a different category is not found.
    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        category_slug: &str,
        product_slug: &str,
    ) -> Result<ProductDetail, ServiceError> {
        let product = Product::find()
            .join(
                sea_orm::JoinType::InnerJoin,
                product::Relation::Category.def(),
            )
            .filter(category::Column::Slug.eq(category_slug))
            .filter(product::Column::Slug.eq(product_slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("product {category_slug}/{product_slug}"))
            })?;

        let mut details = self.load_details(vec![product]).await?;
        details
            .pop()
            .ok_or_else(|| ServiceError::InternalError("product vanished while loading".into()))
    }

    async fn load_details(
        &self,
        products: Vec<ProductModel>,
    ) -> Result<Vec<ProductDetail>, ServiceError> {
        if products.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = products.iter().map(|p| p.id).collect();

        let mut variants: HashMap<i32, Vec<ProductVariantModel>> = HashMap::new();
        for variant in ProductVariant::find()
            .filter(product_variant::Column::ProductId.is_in(ids.clone()))
            .order_by_asc(product_variant::Column::Id)
            .all(&*self.db)
            .await?
        {
            variants.entry(variant.product_id).or_default().push(variant);
        }

        let mut images: HashMap<i32, Vec<ProductImageModel>> = HashMap::new();
        for image in ProductImage::find()
            .filter(product_image::Column::ProductId.is_in(ids))
            .order_by_asc(product_image::Column::Sort)
            .order_by_asc(product_image::Column::Id)
            .all(&*self.db)
            .await?
        {
            images.entry(image.product_id).or_default().push(image);
        }

        Ok(products
            .into_iter()
            .map(|product| ProductDetail {
                variants: variants.remove(&product.id).unwrap_or_default(),
                images: images.remove(&product.id).unwrap_or_default(),
                product,
            })
            .collect())
    }
}
