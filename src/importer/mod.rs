//! One-shot migration from the legacy shop database.
//!
//! The run wipes the catalog and the media store, recreates the fixed
//! categories and then copies every legacy product with its sizes and images,
//! deriving image renditions on the way. Each product is committed on its
//! own, so a failure stops the run with all earlier products in place.

pub mod seed;
pub mod source;

pub use seed::{SeedCategory, CATALOG_CATEGORIES};
pub use source::{
    LegacyConnection, LegacyImage, LegacyProduct, LegacySource, LegacyVariant, SourceError,
    SqlLegacySource,
};

use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use metrics::counter;
use rand::{seq::SliceRandom, Rng};
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::{
    db,
    entities::ProductSize,
    errors::ServiceError,
    media::{self, ImageUpload, MediaError, MediaStore, PreparedImage},
    services::catalog_store::{self, NewProduct, NewVariant},
};

/// Discounts handed out to imported products; the legacy data has none.
pub const IMPORT_DISCOUNTS: [i32; 3] = [0, 20, 30];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("legacy source error: {0}")]
    Source(#[from] SourceError),

    #[error("legacy media file {} could not be read: {source}", .path.display())]
    MissingMedia {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("legacy product {product_id} refers to unknown category {category_id}")]
    UnknownCategory { product_id: i32, category_id: i32 },

    #[error("image {} could not be processed: {source}", .path.display())]
    Media {
        path: PathBuf,
        #[source]
        source: MediaError,
    },

    #[error("catalog store error: {0}")]
    Store(#[from] ServiceError),

    #[error("media storage error: {0}")]
    Storage(#[from] io::Error),
}

impl From<DbErr> for ImportError {
    fn from(err: DbErr) -> Self {
        ImportError::Store(err.into())
    }
}

/// Progress after each imported product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProgress {
    pub imported: usize,
    pub total: usize,
    /// `imported * 100 / total`, rounded down
    pub percent: usize,
}

/// Row counts written by a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub categories: usize,
    pub products: usize,
    pub variants: usize,
    pub images: usize,
    /// Products offered by the legacy source
    pub total: usize,
}

/// Legacy slugs used underscores; catalog slugs use hyphens.
pub fn normalize_slug(slug: &str) -> String {
    slug.replace('_', "-")
}

pub struct Importer<S, R> {
    db: Arc<DatabaseConnection>,
    media: Arc<dyn MediaStore>,
    source: S,
    legacy_media_dir: PathBuf,
    rng: R,
}

impl<S, R> Importer<S, R>
where
    S: LegacySource,
    R: Rng + Send,
{
    pub fn new(
        db: Arc<DatabaseConnection>,
        media: Arc<dyn MediaStore>,
        source: S,
        legacy_media_dir: impl Into<PathBuf>,
        rng: R,
    ) -> Self {
        Self {
            db,
            media,
            source,
            legacy_media_dir: legacy_media_dir.into(),
            rng,
        }
    }

    /// Replaces the whole catalog with the legacy data.
    #[instrument(skip(self, progress), fields(legacy_media = %self.legacy_media_dir.display()))]
    pub async fn run(
        &mut self,
        mut progress: impl FnMut(ImportProgress) + Send,
    ) -> Result<ImportReport, ImportError> {
        let cleared =
            db::transaction(&self.db, |txn| Box::pin(catalog_store::delete_all(txn))).await?;
        self.media.reset().await?;
        warn!(?cleared, "Cleared catalog and media store before import");

        let mut report = ImportReport {
            categories: self.seed_categories().await?,
            ..Default::default()
        };
        let known_categories: HashSet<i32> = CATALOG_CATEGORIES.iter().map(|c| c.id).collect();

        let products = self.source.fetch_legacy_products().await?;
        report.total = products.len();
        info!(total = report.total, "Importing legacy products");

        for legacy in products {
            if !known_categories.contains(&legacy.category_id) {
                return Err(ImportError::UnknownCategory {
                    product_id: legacy.id,
                    category_id: legacy.category_id,
                });
            }

            let (variants, images) = self.import_product(legacy).await.map_err(|err| {
                error!(error = %err, "Import aborted");
                err
            })?;

            report.products += 1;
            report.variants += variants;
            report.images += images;
            counter!("shop_catalog_import.products", 1);

            progress(ImportProgress {
                imported: report.products,
                total: report.total,
                percent: report.products * 100 / report.total,
            });
        }

        info!(?report, "Legacy import finished");
        Ok(report)
    }

    async fn seed_categories(&self) -> Result<usize, ImportError> {
        let count = db::transaction(&self.db, |txn| {
            Box::pin(async move {
                for category in &CATALOG_CATEGORIES {
                    catalog_store::insert_category(txn, category.to_new_category()).await?;
                }
                Ok::<_, ServiceError>(CATALOG_CATEGORIES.len())
            })
        })
        .await?;
        info!(count, "Seeded catalog categories");
        Ok(count)
    }

    /// Imports one product. Images are derived and their blobs written
    /// before the product, its variants and image rows are committed
    /// together; a failed commit removes the blobs again.
    #[instrument(skip(self, legacy), fields(product_id = legacy.id))]
    async fn import_product(
        &mut self,
        legacy: LegacyProduct,
    ) -> Result<(usize, usize), ImportError> {
        let legacy_variants = self.source.fetch_legacy_variants(legacy.id).await?;
        let variants = legacy_variants
            .into_iter()
            .map(|row| -> Result<NewVariant, ImportError> {
                let size = ProductSize::try_from(row.size).map_err(|e| {
                    ServiceError::ValidationError(format!(
                        "legacy variant {} of product {}: {e}",
                        row.id, legacy.id
                    ))
                })?;
                Ok(NewVariant {
                    product_id: legacy.id,
                    size,
                    quantity: row.quantity,
                })
            })
            .collect::<Result<Vec<_>, ImportError>>()?;

        let legacy_images = self.source.fetch_legacy_images(legacy.id).await?;
        let mut prepared = Vec::with_capacity(legacy_images.len());
        for image in legacy_images {
            let path = self.legacy_media_dir.join(&image.name);
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| ImportError::MissingMedia {
                    path: path.clone(),
                    source,
                })?;
            let ready = media::prepare_image(ImageUpload::new(file_name(&image.name), bytes))
                .await
                .map_err(|source| ImportError::Media { path, source })?;
            prepared.push((ready, image.sort));
        }

        let product = NewProduct {
            id: Some(legacy.id),
            category_id: legacy.category_id,
            name: legacy.name,
            slug: normalize_slug(&legacy.slug),
            description: legacy.description,
            detail: legacy.detail,
            price: legacy.price,
            discount: IMPORT_DISCOUNTS.choose(&mut self.rng).copied().unwrap_or(0),
        };

        let mut written: Vec<&PreparedImage> = Vec::with_capacity(prepared.len());
        for (image, _) in &prepared {
            if let Err(err) = media::store_prepared(self.media.as_ref(), image).await {
                remove_prepared(self.media.as_ref(), &written).await;
                return Err(err.into());
            }
            written.push(image);
        }

        let counts = (variants.len(), prepared.len());
        let rows: Vec<([String; 3], i32)> = prepared
            .iter()
            .map(|(image, sort)| (image.keys(), *sort))
            .collect();
        let committed = db::transaction(&self.db, move |txn| {
            Box::pin(async move {
                let product = catalog_store::insert_product(txn, product).await?;
                for variant in variants {
                    catalog_store::insert_variant(txn, variant).await?;
                }
                for (keys, sort) in rows {
                    catalog_store::insert_image_row(txn, product.id, keys, sort).await?;
                }
                Ok::<_, ServiceError>(())
            })
        })
        .await;

        if let Err(err) = committed {
            remove_prepared(self.media.as_ref(), &written).await;
            return Err(err.into());
        }

        Ok(counts)
    }
}

async fn remove_prepared(store: &dyn MediaStore, images: &[&PreparedImage]) {
    for image in images {
        media::remove_blobs(store, image.keys()).await;
    }
}

/// Last path component of a legacy image name; the key extension comes
/// from it.
fn file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}
