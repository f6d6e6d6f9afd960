mod common;

use axum::http::StatusCode;
use common::{png_upload, TestApp};
use serde_json::Value;
use shop_catalog::{
    entities::ProductSize,
    services::{NewProduct, NewVariant},
};

fn product_slugs(body: &Value) -> Vec<String> {
    body["category"]["products"]
        .as_array()
        .expect("products array")
        .iter()
        .map(|p| p["slug"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn root_links_to_categories() {
    let app = TestApp::new().await;
    let (status, body) = app.get_json("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"], "http://shop.test/categories/");
}

#[tokio::test]
async fn categories_are_listed_by_sort_key() {
    let app = TestApp::new().await;
    app.seed_category("kostyumy", 3).await;
    app.seed_category("bluzki", 1).await;
    app.seed_category("platya", 2).await;

    let (status, body) = app.get_json("/categories/").await;
    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["bluzki", "platya", "kostyumy"]);
    assert_eq!(body[0]["description"], "About bluzki");
    assert!(body[0].get("sort").is_none());
}

#[tokio::test]
async fn listing_pages_through_eighteen_products_at_a_time() {
    let app = TestApp::new().await;
    let category = app.seed_category("platya", 1).await;
    for n in 0..22 {
        app.seed_product(&category, &format!("plate-{n}"), 1).await;
    }

    let (status, first) = app.get_json("/categories/platya/products/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["category"]["slug"], "platya");
    assert_eq!(product_slugs(&first).len(), 18);
    assert!(first["category"]["prev_page_number"].is_null());
    assert_eq!(first["category"]["next_page_number"], 2);
    // Newest first
    assert_eq!(product_slugs(&first)[0], "plate-21");

    let (status, second) = app.get_json("/categories/platya/products/?page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product_slugs(&second).len(), 4);
    assert_eq!(second["category"]["prev_page_number"], 1);
    assert!(second["category"]["next_page_number"].is_null());
    assert_eq!(product_slugs(&second).last().unwrap(), "plate-0");
}

#[tokio::test]
async fn out_of_stock_products_are_hidden_from_the_listing_only() {
    let app = TestApp::new().await;
    let category = app.seed_category("bluzki", 1).await;
    app.seed_product(&category, "v-nalichii", 3).await;
    app.seed_product(&category, "raskupili", 0).await;

    let (_, body) = app.get_json("/categories/bluzki/products/").await;
    assert_eq!(product_slugs(&body), vec!["v-nalichii"]);

    let (status, detail) = app.get_json("/categories/bluzki/products/raskupili/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["product_items"][0]["quantity"], 0);
}

#[tokio::test]
async fn product_with_several_sizes_in_stock_is_listed_once() {
    let app = TestApp::new().await;
    let category = app.seed_category("yubki", 1).await;
    let product = app.seed_product(&category, "yubka", 2).await;
    for size in [ProductSize::S52, ProductSize::S54] {
        app.state
            .services
            .store
            .create_variant(NewVariant {
                product_id: product.id,
                size,
                quantity: 4,
            })
            .await
            .unwrap();
    }

    let (_, body) = app.get_json("/categories/yubki/products/").await;
    assert_eq!(product_slugs(&body), vec!["yubka"]);
    let sizes: Vec<i64> = body["category"]["products"][0]["product_items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["size"].as_i64().unwrap())
        .collect();
    assert_eq!(sizes, vec![50, 52, 54]);
}

#[tokio::test]
async fn unknown_category_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.get_json("/categories/netu/products/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");
}

#[tokio::test]
async fn product_is_only_found_within_its_category() {
    let app = TestApp::new().await;
    let dresses = app.seed_category("platya", 1).await;
    app.seed_category("bluzki", 2).await;
    app.seed_product(&dresses, "plate", 1).await;

    let (status, _) = app.get_json("/categories/platya/products/plate/").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get_json("/categories/bluzki/products/plate/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get_json("/categories/platya/products/netu/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
    let app = TestApp::new().await;
    let category = app.seed_category("platya", 1).await;
    app.seed_product(&category, "plate", 1).await;

    let (status, body) = app.get_json("/categories/platya/products/?page=5").await;
    assert_eq!(status, StatusCode::OK);
    assert!(product_slugs(&body).is_empty());
    assert!(body["category"]["prev_page_number"].is_null());
    assert!(body["category"]["next_page_number"].is_null());
}

#[tokio::test]
async fn largest_page_number_is_an_empty_page() {
    let app = TestApp::new().await;
    let category = app.seed_category("platya", 1).await;
    for n in 0..3 {
        app.seed_product(&category, &format!("plate-{n}"), 1).await;
    }

    let (status, body) = app
        .get_json("/categories/platya/products/?page=9223372036854775807")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(product_slugs(&body).is_empty());
    assert!(body["category"]["prev_page_number"].is_null());
    assert!(body["category"]["next_page_number"].is_null());
}

#[tokio::test]
async fn page_number_beyond_i64_is_rejected() {
    let app = TestApp::new().await;
    app.seed_category("platya", 1).await;

    let (status, _) = app
        .get_json("/categories/platya/products/?page=9223372036854775808")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn very_large_prices_are_discounted_without_overflow() {
    let app = TestApp::new().await;
    let category = app.seed_category("platya", 1).await;
    let product = app
        .state
        .services
        .store
        .create_product(NewProduct {
            id: None,
            category_id: category.id,
            name: "Дорогое платье".into(),
            slug: "big".into(),
            description: String::new(),
            detail: String::new(),
            price: i64::MAX / 10,
            discount: 20,
        })
        .await
        .unwrap();
    app.state
        .services
        .store
        .create_variant(NewVariant {
            product_id: product.id,
            size: ProductSize::S48,
            quantity: 1,
        })
        .await
        .unwrap();

    let (status, body) = app.get_json("/categories/platya/products/big/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_price"], 737_869_762_948_382_064_i64);

    let (status, body) = app.get_json("/categories/platya/products/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["category"]["products"][0]["new_price"],
        737_869_762_948_382_064_i64
    );
}

#[tokio::test]
async fn empty_category_has_a_single_empty_page() {
    let app = TestApp::new().await;
    app.seed_category("pusto", 1).await;

    let (status, body) = app.get_json("/categories/pusto/products/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(product_slugs(&body).is_empty());
    assert!(body["category"]["prev_page_number"].is_null());
    assert!(body["category"]["next_page_number"].is_null());
}

#[tokio::test]
async fn invalid_page_numbers_are_rejected() {
    let app = TestApp::new().await;
    app.seed_category("platya", 1).await;

    for uri in [
        "/categories/platya/products/?page=0",
        "/categories/platya/products/?page=-3",
        "/categories/platya/products/?page=abc",
    ] {
        let (status, body) = app.get_json(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "Bad Request");
    }
}

#[tokio::test]
async fn product_detail_carries_prices_and_absolute_image_urls() {
    let app = TestApp::new().await;
    let category = app.seed_category("platya", 1).await;
    let product = app.seed_product(&category, "plate", 1).await;
    let image = app
        .state
        .services
        .store
        .upload_product_image(product.id, png_upload("plate.png", 600, 912), 1)
        .await
        .unwrap();

    let (status, body) = app.get_json("/categories/platya/products/plate/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 1000);
    assert_eq!(body["discount"], 20);
    assert_eq!(body["new_price"], 800);
    assert_eq!(body["product_images"][0]["id"], image.id);

    let large = body["product_images"][0]["image_large"].as_str().unwrap();
    let key = image.image_large.clone().unwrap();
    assert_eq!(large, format!("http://shop.test/media/{key}"));

    let response = app.get(&format!("/media/{key}")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn images_follow_their_sort_field() {
    let app = TestApp::new().await;
    let category = app.seed_category("platya", 1).await;
    let product = app.seed_product(&category, "plate", 1).await;
    let store = &app.state.services.store;
    let back = store
        .upload_product_image(product.id, png_upload("back.png", 40, 60), 2)
        .await
        .unwrap();
    let front = store
        .upload_product_image(product.id, png_upload("front.png", 40, 60), 1)
        .await
        .unwrap();

    let (_, body) = app.get_json("/categories/platya/products/plate/").await;
    let ids: Vec<i64> = body["product_images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![i64::from(front.id), i64::from(back.id)]);
}

#[tokio::test]
async fn health_and_status_report_ok() {
    let app = TestApp::new().await;

    let (status, body) = app.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"], "healthy");

    let (status, body) = app.get_json("/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "shop-catalog");
    assert_eq!(body["environment"], "test");
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::new().await;
    let response = app.get("/categories/").await;
    assert!(response.headers().contains_key("x-request-id"));
}
