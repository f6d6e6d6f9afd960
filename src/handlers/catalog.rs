use crate::{
    entities::{CategoryModel, ProductImageModel, ProductVariantModel},
    errors::{ApiError, ErrorResponse},
    handlers::common::{map_service_error, success_response, PageQuery, RequestOrigin},
    services::{CategoryEnvelope, PageRequest, ProductDetail, PRODUCTS_PER_PAGE},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Creates the router for the public catalog
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .route("/categories/", get(list_categories))
        .route("/categories/:category_slug/products/", get(list_products))
        .route(
            "/categories/:category_slug/products/:product_slug/",
            get(get_product),
        )
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiRootResponse {
    /// Absolute URL of the category list
    pub categories: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub slug: String,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(category: CategoryModel) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            slug: category.slug,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductItemResponse {
    pub id: i32,
    /// One of 48, 50, 52, 54, 56, 58, 60
    pub size: i32,
    pub quantity: i32,
}

impl From<ProductVariantModel> for ProductItemResponse {
    fn from(variant: ProductVariantModel) -> Self {
        Self {
            id: variant.id,
            size: variant.size.as_i32(),
            quantity: variant.quantity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductImageResponse {
    pub id: i32,
    pub image_large: Option<String>,
    pub image_medium: Option<String>,
    pub image_small: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub detail: String,
    pub price: i64,
    pub discount: i32,
    /// Price after discount, rounded down
    pub new_price: i64,
    pub product_images: Vec<ProductImageResponse>,
    pub product_items: Vec<ProductItemResponse>,
}

/// Turns stored blob keys into public URLs.
#[derive(Debug, Clone)]
pub struct MediaLinks {
    base: String,
}

impl MediaLinks {
    /// Relative `media_url`s are anchored at the request origin.
    pub fn new(media_url: &str, origin: &RequestOrigin) -> Self {
        let base = if media_url.starts_with('/') {
            origin.url(media_url)
        } else {
            media_url.to_string()
        };
        let base = if base.ends_with('/') {
            base
        } else {
            format!("{base}/")
        };
        Self { base }
    }

    pub fn url(&self, key: Option<String>) -> Option<String> {
        key.filter(|k| !k.is_empty())
            .map(|k| format!("{}{}", self.base, k))
    }

    fn image(&self, image: ProductImageModel) -> ProductImageResponse {
        ProductImageResponse {
            id: image.id,
            image_large: self.url(image.image_large),
            image_medium: self.url(image.image_medium),
            image_small: self.url(image.image_small),
        }
    }

    pub fn product(&self, detail: ProductDetail) -> ProductResponse {
        let new_price = detail.product.new_price();
        let product = detail.product;
        ProductResponse {
            id: product.id,
            name: product.name,
            slug: product.slug,
            description: product.description,
            detail: product.detail,
            price: product.price,
            discount: product.discount,
            new_price,
            product_images: detail.images.into_iter().map(|i| self.image(i)).collect(),
            product_items: detail.variants.into_iter().map(Into::into).collect(),
        }
    }
}

/// Discovery document
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Links to top-level resources", body = ApiRootResponse)
    ),
    tag = "Catalog"
)]
pub async fn api_root(origin: RequestOrigin) -> impl IntoResponse {
    success_response(ApiRootResponse {
        categories: origin.url("/categories/"),
    })
}

/// List all categories by their sort key
#[utoipa::path(
    get,
    path = "/categories/",
    responses(
        (status = 200, description = "Categories in display order", body = [CategoryResponse]),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .services
        .catalog
        .list_categories()
        .await
        .map_err(map_service_error)?;

    let body: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();
    Ok(success_response(body))
}

/// In-stock products of a category, newest first, 18 per page
#[utoipa::path(
    get,
    path = "/categories/{category_slug}/products/",
    params(
        ("category_slug" = String, Path, description = "Category slug"),
        PageQuery
    ),
    responses(
        (status = 200, description = "One page of products", body = CategoryEnvelope<ProductResponse>),
        (status = 400, description = "Invalid page number", body = ErrorResponse),
        (status = 404, description = "Unknown category", body = ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(category_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(query.number()?, PRODUCTS_PER_PAGE)
        .map_err(map_service_error)?;

    let (category, products) = state
        .services
        .catalog
        .list_products(&category_slug, page)
        .await
        .map_err(map_service_error)?;

    let links = MediaLinks::new(&state.config.media_url, &origin);
    let envelope = products
        .map(|detail| links.product(detail))
        .into_envelope(&category);
    Ok(success_response(envelope))
}

/// A single product, looked up within its category
#[utoipa::path(
    get,
    path = "/categories/{category_slug}/products/{product_slug}/",
    params(
        ("category_slug" = String, Path, description = "Category slug"),
        ("product_slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Product with sizes and images", body = ProductResponse),
        (status = 404, description = "Unknown category or product", body = ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path((category_slug, product_slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .catalog
        .get_product(&category_slug, &product_slug)
        .await
        .map_err(map_service_error)?;

    let links = MediaLinks::new(&state.config.media_url, &origin);
    Ok(success_response(links.product(detail)))
}
