use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::{Validate, ValidationError};

use crate::{
    db,
    entities::{
        category, product, product_image, product_variant, Category, CategoryModel, Product,
        ProductImage, ProductImageModel, ProductModel, ProductSize, ProductVariant,
        ProductVariantModel,
    },
    errors::ServiceError,
    media::{self, ImageUpload, MediaStore, PreparedImage},
};

/// Input for a new category. `id` is only set by the importer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCategory {
    pub id: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    pub description: String,
    #[validate(length(min = 1, max = 50), custom = "validate_slug")]
    pub slug: String,
    pub sort: i32,
}

/// Input for a new product. `id` is only set by the importer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    pub id: Option<i32>,
    pub category_id: i32,
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(min = 1, max = 50), custom = "validate_slug")]
    pub slug: String,
    pub description: String,
    pub detail: String,
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0, max = 100))]
    pub discount: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewVariant {
    pub product_id: i32,
    pub size: ProductSize,
    #[validate(range(min = 0))]
    pub quantity: i32,
}

/// Rows removed by a cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeSummary {
    pub categories: u64,
    pub products: u64,
    pub variants: u64,
    pub images: u64,
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug");
        err.message = Some("slug may only contain letters, digits, '-' and '_'".into());
        Err(err)
    }
}

pub async fn insert_category<C: ConnectionTrait>(
    conn: &C,
    input: NewCategory,
) -> Result<CategoryModel, ServiceError> {
    input.validate()?;
    let model = category::ActiveModel {
        id: input.id.map(Set).unwrap_or(NotSet),
        name: Set(input.name),
        description: Set(input.description),
        slug: Set(input.slug),
        sort: Set(input.sort),
    };
    Ok(model.insert(conn).await?)
}

pub async fn insert_product<C: ConnectionTrait>(
    conn: &C,
    input: NewProduct,
) -> Result<ProductModel, ServiceError> {
    input.validate()?;
    let model = product::ActiveModel {
        id: input.id.map(Set).unwrap_or(NotSet),
        category_id: Set(input.category_id),
        name: Set(input.name),
        slug: Set(input.slug),
        description: Set(input.description),
        detail: Set(input.detail),
        price: Set(input.price),
        discount: Set(input.discount),
        created_at: Set(Utc::now()),
    };
    Ok(model.insert(conn).await?)
}

pub async fn insert_variant<C: ConnectionTrait>(
    conn: &C,
    input: NewVariant,
) -> Result<ProductVariantModel, ServiceError> {
    input.validate()?;
    let model = product_variant::ActiveModel {
        id: NotSet,
        product_id: Set(input.product_id),
        size: Set(input.size),
        quantity: Set(input.quantity),
    };
    Ok(model.insert(conn).await?)
}

/// Inserts the row for an already derived and stored image. `keys` are the
/// large, medium and small slots, written together.
pub async fn insert_image_row<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
    keys: [String; 3],
    sort: i32,
) -> Result<ProductImageModel, ServiceError> {
    let [large, medium, small] = keys;
    let model = product_image::ActiveModel {
        id: NotSet,
        product_id: Set(product_id),
        image_large: Set(Some(large)),
        image_medium: Set(Some(medium)),
        image_small: Set(Some(small)),
        sort: Set(sort),
    };
    Ok(model.insert(conn).await?)
}

/// Removes every catalog row, children first.
pub async fn delete_all<C: ConnectionTrait>(conn: &C) -> Result<CascadeSummary, ServiceError> {
    let images = ProductImage::delete_many().exec(conn).await?.rows_affected;
    let variants = ProductVariant::delete_many().exec(conn).await?.rows_affected;
    let products = Product::delete_many().exec(conn).await?.rows_affected;
    let categories = Category::delete_many().exec(conn).await?.rows_affected;
    Ok(CascadeSummary {
        categories,
        products,
        variants,
        images,
    })
}

/// Deletes the given products and their children; returns the blob keys of
/// the removed images.
async fn delete_products<C: ConnectionTrait>(
    conn: &C,
    product_ids: Vec<i32>,
    summary: &mut CascadeSummary,
) -> Result<Vec<String>, ServiceError> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let keys = ProductImage::find()
        .filter(product_image::Column::ProductId.is_in(product_ids.clone()))
        .all(conn)
        .await?
        .iter()
        .flat_map(ProductImageModel::stored_keys)
        .collect();

    summary.images += ProductImage::delete_many()
        .filter(product_image::Column::ProductId.is_in(product_ids.clone()))
        .exec(conn)
        .await?
        .rows_affected;
    summary.variants += ProductVariant::delete_many()
        .filter(product_variant::Column::ProductId.is_in(product_ids.clone()))
        .exec(conn)
        .await?
        .rows_affected;
    summary.products += Product::delete_many()
        .filter(product::Column::Id.is_in(product_ids))
        .exec(conn)
        .await?
        .rows_affected;

    Ok(keys)
}

/// Write side of the catalog: validated inserts, the image write path and
/// destructive cascades.
#[derive(Clone)]
pub struct CatalogStore {
    db: Arc<DatabaseConnection>,
    media: Arc<dyn MediaStore>,
}

impl CatalogStore {
    pub fn new(db: Arc<DatabaseConnection>, media: Arc<dyn MediaStore>) -> Self {
        Self { db, media }
    }

    #[instrument(skip(self))]
    pub async fn create_category(&self, input: NewCategory) -> Result<CategoryModel, ServiceError> {
        let category = insert_category(&*self.db, input).await?;
        info!(category_id = category.id, slug = %category.slug, "Created category");
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn create_product(&self, input: NewProduct) -> Result<ProductModel, ServiceError> {
        let product = insert_product(&*self.db, input).await?;
        info!(product_id = product.id, slug = %product.slug, "Created product");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn create_variant(
        &self,
        input: NewVariant,
    ) -> Result<ProductVariantModel, ServiceError> {
        Ok(insert_variant(&*self.db, input).await?)
    }

    /// Derives renditions for `upload`, then stores and records the image.
    /// An undecodable upload fails before anything is written.
    #[instrument(skip(self, upload), fields(filename = %upload.filename))]
    pub async fn upload_product_image(
        &self,
        product_id: i32,
        upload: ImageUpload,
        sort: i32,
    ) -> Result<ProductImageModel, ServiceError> {
        let prepared = media::prepare_image(upload).await?;
        self.add_product_image(product_id, &prepared, sort).await
    }

    /// Persists a prepared image: blobs first, then the row. If the row
    /// cannot be inserted the blobs are removed again.
    #[instrument(skip(self, image))]
    pub async fn add_product_image(
        &self,
        product_id: i32,
        image: &PreparedImage,
        sort: i32,
    ) -> Result<ProductImageModel, ServiceError> {
        media::store_prepared(self.media.as_ref(), image).await?;

        match insert_image_row(&*self.db, product_id, image.keys(), sort).await {
            Ok(row) => {
                info!(image_id = row.id, product_id, "Stored product image");
                Ok(row)
            }
            Err(err) => {
                warn!(product_id, error = %err, "Image row rejected; removing stored blobs");
                media::remove_blobs(self.media.as_ref(), image.keys()).await;
                Err(err)
            }
        }
    }

    /// Replaces all three slots of an existing image with a new source.
    /// Previous blobs are removed only after the row update succeeds.
    #[instrument(skip(self, upload), fields(filename = %upload.filename))]
    pub async fn replace_image_source(
        &self,
        image_id: i32,
        upload: ImageUpload,
    ) -> Result<ProductImageModel, ServiceError> {
        let existing = ProductImage::find_by_id(image_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product image {image_id}")))?;

        let prepared = media::prepare_image(upload).await?;
        media::store_prepared(self.media.as_ref(), &prepared).await?;

        let old_keys = existing.stored_keys();
        let mut active: product_image::ActiveModel = existing.into();
        active.image_large = Set(Some(prepared.large.key.clone()));
        active.image_medium = Set(Some(prepared.medium.key.clone()));
        active.image_small = Set(Some(prepared.small.key.clone()));

        match active.update(&*self.db).await {
            Ok(row) => {
                media::remove_blobs(self.media.as_ref(), old_keys).await;
                info!(image_id, "Replaced product image source");
                Ok(row)
            }
            Err(err) => {
                media::remove_blobs(self.media.as_ref(), prepared.keys()).await;
                Err(err.into())
            }
        }
    }

    /// Destructive: removes the category, its products and their variants
    /// and images in one transaction, then deletes the image blobs.
    #[instrument(skip(self))]
    pub async fn delete_category_cascade(
        &self,
        category_id: i32,
    ) -> Result<CascadeSummary, ServiceError> {
        let (summary, keys) = db::transaction(&self.db, move |txn| {
            Box::pin(async move {
                let category = Category::find_by_id(category_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("category {category_id}")))?;

                let product_ids: Vec<i32> = Product::find()
                    .select_only()
                    .column(product::Column::Id)
                    .filter(product::Column::CategoryId.eq(category.id))
                    .into_tuple()
                    .all(txn)
                    .await?;

                let mut summary = CascadeSummary::default();
                let keys = delete_products(txn, product_ids, &mut summary).await?;
                summary.categories = Category::delete_by_id(category.id)
                    .exec(txn)
                    .await?
                    .rows_affected;

                Ok::<_, ServiceError>((summary, keys))
            })
        })
        .await?;

        media::remove_blobs(self.media.as_ref(), keys).await;
        warn!(category_id, ?summary, "Deleted category with all dependants");
        Ok(summary)
    }

    /// Destructive: removes the product with its variants and images.
    #[instrument(skip(self))]
    pub async fn delete_product_cascade(
        &self,
        product_id: i32,
    ) -> Result<CascadeSummary, ServiceError> {
        let (summary, keys) = db::transaction(&self.db, move |txn| {
            Box::pin(async move {
                Product::find_by_id(product_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("product {product_id}")))?;

                let mut summary = CascadeSummary::default();
                let keys = delete_products(txn, vec![product_id], &mut summary).await?;
                Ok::<_, ServiceError>((summary, keys))
            })
        })
        .await?;

        media::remove_blobs(self.media.as_ref(), keys).await;
        warn!(product_id, ?summary, "Deleted product with all dependants");
        Ok(summary)
    }

    /// Destructive: wipes every catalog table in one transaction. Blobs are
    /// left to the caller (see [`MediaStore::reset`]).
    #[instrument(skip(self))]
    pub async fn clear_catalog(&self) -> Result<CascadeSummary, ServiceError> {
        let summary = db::transaction(&self.db, |txn| Box::pin(delete_all(txn))).await?;
        warn!(?summary, "Cleared catalog");
        Ok(summary)
    }
}
