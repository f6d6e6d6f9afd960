use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shop Catalog API",
        version = "1.0.0",
        description = r#"
# Shop Catalog API

Read-only catalog of a clothing shop: categories, in-stock products with
their sizes and image renditions.

## Pagination

Product listings return 18 products per page. `prev_page_number` and
`next_page_number` are `null` when there is no such page. Asking for a page
past the end yields an empty product list.

## Errors

Failures share one JSON body:

```json
{
  "error": "Not Found",
  "message": "Not Found",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Catalog", description = "Categories and products")
    ),
    paths(
        crate::handlers::catalog::api_root,
        crate::handlers::catalog::list_categories,
        crate::handlers::catalog::list_products,
        crate::handlers::catalog::get_product,
    ),
    components(
        schemas(
            crate::handlers::catalog::ApiRootResponse,
            crate::handlers::catalog::CategoryResponse,
            crate::handlers::catalog::ProductResponse,
            crate::handlers::catalog::ProductImageResponse,
            crate::handlers::catalog::ProductItemResponse,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_catalog_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Shop Catalog API"));
        assert!(json.contains("/categories/{category_slug}/products/"));
        assert!(json.contains("/categories/{category_slug}/products/{product_slug}/"));
        assert!(json.contains("ProductResponse"));
    }
}
