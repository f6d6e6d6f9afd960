#![allow(dead_code)]

use std::{io::Cursor, path::PathBuf, sync::Arc};

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use shop_catalog::{
    config::AppConfig,
    db,
    entities::{CategoryModel, ProductModel, ProductSize},
    media::{FsMediaStore, ImageUpload},
    services::{NewCategory, NewProduct, NewVariant},
    AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;

/// Application harness backed by a throwaway SQLite file and media root.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub media: FsMediaStore,
    pub media_root: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir.path().join("catalog.db");
        let media_root = dir.path().join("media");
        std::fs::create_dir_all(&media_root).expect("media root");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.media_root = media_root.display().to_string();
        cfg.media_url = "/media/".to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = shop_catalog::build_router(state.clone());

        Self {
            router,
            state,
            media: FsMediaStore::new(&media_root),
            media_root,
            _dir: dir,
        }
    }

    /// GET `uri` with `Host: shop.test`.
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("host", "shop.test")
            .body(Body::empty())
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.get(uri).await;
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn seed_category(&self, slug: &str, sort: i32) -> CategoryModel {
        self.state
            .services
            .store
            .create_category(NewCategory {
                id: None,
                name: format!("Category {slug}"),
                description: format!("About {slug}"),
                slug: slug.to_string(),
                sort,
            })
            .await
            .expect("seed category")
    }

    /// Product with one variant of the given stock in size 50.
    pub async fn seed_product(
        &self,
        category: &CategoryModel,
        slug: &str,
        quantity: i32,
    ) -> ProductModel {
        let store = &self.state.services.store;
        let product = store
            .create_product(NewProduct {
                id: None,
                category_id: category.id,
                name: format!("Product {slug}"),
                slug: slug.to_string(),
                description: "Short description".to_string(),
                detail: "Details".to_string(),
                price: 1000,
                discount: 20,
            })
            .await
            .expect("seed product");

        store
            .create_variant(NewVariant {
                product_id: product.id,
                size: ProductSize::S50,
                quantity,
            })
            .await
            .expect("seed variant");

        product
    }

    pub fn blob_exists(&self, key: &str) -> bool {
        self.media
            .path_for(key)
            .map(|path| path.exists())
            .unwrap_or(false)
    }
}

/// A solid-colour PNG upload of the given size.
pub fn png_upload(name: &str, width: u32, height: u32) -> ImageUpload {
    ImageUpload::new(name, png_bytes(width, height))
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([180, 40, 90]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}
