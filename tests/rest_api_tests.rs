use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use bookstore_order_lifecycle::adapter::driven::InMemoryStore;
use bookstore_order_lifecycle::adapter::driver::rest_api::{create_router, AppState};
use bookstore_order_lifecycle::domain::model::{User, UserId, UserRole};
use bookstore_order_lifecycle::domain::port::UserRepository;

struct TestApp {
    server: TestServer,
    admin_id: String,
}

async fn setup() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let admin = User::register(UserId::new(), "admin".to_string(), UserRole::Admin).unwrap();
    UserRepository::save(store.as_ref(), &admin).await.unwrap();

    let state = AppState::from_ports(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
    );
    let app = create_router().with_state(state);

    TestApp {
        server: TestServer::new(app).unwrap(),
        admin_id: admin.id().to_string(),
    }
}

fn user_header(user_id: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(user_id).unwrap(),
    )
}

impl TestApp {
    async fn register_customer(&self, username: &str) -> String {
        let response = self
            .server
            .post("/users")
            .json(&json!({ "username": username }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["user_id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn add_book(&self, stock: u32, price: i64) -> String {
        let (name, value) = user_header(&self.admin_id);
        let response = self
            .server
            .post("/admin/books")
            .add_header(name, value)
            .json(&json!({
                "title": "坊っちゃん",
                "author": "夏目漱石",
                "domain": "文学",
                "price": price,
                "stock_quantity": stock,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["book_id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn add_catalog_book(&self, title: &str, domain: &str, price: i64) {
        let (name, value) = user_header(&self.admin_id);
        self.server
            .post("/admin/books")
            .add_header(name, value)
            .json(&json!({
                "title": title,
                "author": "夏目漱石",
                "domain": domain,
                "price": price,
                "stock_quantity": 1,
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    async fn book_titles(&self, path: &str) -> Vec<String> {
        let response = self.server.get(path).await;
        response.assert_status_ok();
        response
            .json::<Value>()
            .as_array()
            .unwrap()
            .iter()
            .map(|book| book["title"].as_str().unwrap().to_string())
            .collect()
    }

    async fn place_order(&self, user_id: &str, book_id: &str, quantity: u32) -> axum_test::TestResponse {
        let (name, value) = user_header(user_id);
        self.server
            .post("/orders")
            .add_header(name, value)
            .json(&json!({ "book_id": book_id, "quantity": quantity }))
            .await
    }

    async fn set_status(&self, user_id: &str, order_id: &str, status: &str) -> axum_test::TestResponse {
        let (name, value) = user_header(user_id);
        self.server
            .patch(&format!("/admin/orders/{}/status", order_id))
            .add_header(name, value)
            .json(&json!({ "status": status }))
            .await
    }

    async fn stock(&self, book_id: &str) -> u64 {
        self.server
            .get(&format!("/books/{}", book_id))
            .await
            .json::<Value>()["stock_quantity"]
            .as_u64()
            .unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;
    let response = app.server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "status": "OK" }));
}

#[tokio::test]
async fn test_place_order_and_full_lifecycle() {
    let app = setup().await;
    let customer = app.register_customer("alice").await;
    let book_id = app.add_book(5, 100).await;

    let response = app.place_order(&customer, &book_id, 3).await;
    response.assert_status(StatusCode::CREATED);
    let order = response.json::<Value>();
    assert_eq!(order["status"], "PLACED");
    assert_eq!(order["price_at_purchase_amount"], 100);
    assert_eq!(app.stock(&book_id).await, 2);

    let order_id = order["order_id"].as_str().unwrap().to_string();
    for status in ["CONFIRMED", "SHIPPED", "DELIVERED"] {
        let response = app.set_status(&app.admin_id, &order_id, status).await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "order_id": order_id, "status": status })
        );
    }

    let (name, value) = user_header(&app.admin_id);
    let sales = app
        .server
        .get("/admin/sales")
        .add_header(name, value)
        .await
        .json::<Value>();
    let sales = sales.as_array().unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0]["order_id"], order_id.as_str());
    assert_eq!(sales[0]["quantity"], 3);
    assert_eq!(sales[0]["price_at_sale_amount"], 100);
    assert_eq!(app.stock(&book_id).await, 2);
}

#[tokio::test]
async fn test_insufficient_stock_is_422() {
    let app = setup().await;
    let customer = app.register_customer("bob").await;
    let book_id = app.add_book(5, 100).await;

    let response = app.place_order(&customer, &book_id, 10).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "INSUFFICIENT_STOCK");
    assert_eq!(app.stock(&book_id).await, 5);
}

#[tokio::test]
async fn test_unrepresentable_order_total_is_422() {
    let app = setup().await;
    let customer = app.register_customer("olivia").await;
    let book_id = app.add_book(5, i64::MAX / 2 + 1).await;

    let response = app.place_order(&customer, &book_id, 2).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "AMOUNT_OVERFLOW");
    assert_eq!(app.stock(&book_id).await, 5);

    let (name, value) = user_header(&app.admin_id);
    let orders = app
        .server
        .get("/admin/orders")
        .add_header(name, value)
        .await;
    orders.assert_status_ok();
    assert!(orders.json::<Value>().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_restores_stock_and_blocks_further_transitions() {
    let app = setup().await;
    let customer = app.register_customer("carol").await;
    let book_id = app.add_book(5, 100).await;
    let order_id = app.place_order(&customer, &book_id, 3).await.json::<Value>()["order_id"]
        .as_str()
        .unwrap()
        .to_string();

    app.set_status(&app.admin_id, &order_id, "CANCELLED")
        .await
        .assert_status_ok();
    assert_eq!(app.stock(&book_id).await, 5);

    let response = app.set_status(&app.admin_id, &order_id, "CONFIRMED").await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "ILLEGAL_TRANSITION");
}

#[tokio::test]
async fn test_customer_cannot_change_status() {
    let app = setup().await;
    let customer = app.register_customer("dave").await;
    let book_id = app.add_book(5, 100).await;
    let order_id = app.place_order(&customer, &book_id, 1).await.json::<Value>()["order_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app.set_status(&customer, &order_id, "CANCELLED").await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(app.stock(&book_id).await, 4);
}

#[tokio::test]
async fn test_unknown_status_is_400() {
    let app = setup().await;
    let customer = app.register_customer("erin").await;
    let book_id = app.add_book(5, 100).await;
    let order_id = app.place_order(&customer, &book_id, 1).await.json::<Value>()["order_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app.set_status(&app.admin_id, &order_id, "SHELVED").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "INVALID_STATUS");
}

#[tokio::test]
async fn test_unknown_order_is_404() {
    let app = setup().await;
    let response = app
        .set_status(&app.admin_id, &UserId::new().to_string(), "CONFIRMED")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_identity_header_is_401() {
    let app = setup().await;
    let response = app.server.get("/orders/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_order_visibility() {
    let app = setup().await;
    let owner = app.register_customer("frank").await;
    let other = app.register_customer("grace").await;
    let book_id = app.add_book(5, 100).await;
    let order_id = app.place_order(&owner, &book_id, 1).await.json::<Value>()["order_id"]
        .as_str()
        .unwrap()
        .to_string();

    for (caller, expected) in [
        (&owner, StatusCode::OK),
        (&app.admin_id, StatusCode::OK),
        (&other, StatusCode::FORBIDDEN),
    ] {
        let (name, value) = user_header(caller);
        app.server
            .get(&format!("/orders/{}", order_id))
            .add_header(name, value)
            .await
            .assert_status(expected);
    }

    let (name, value) = user_header(&other);
    let mine = app
        .server
        .get("/orders/me")
        .add_header(name, value)
        .await
        .json::<Value>();
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_book_with_open_order_is_409() {
    let app = setup().await;
    let customer = app.register_customer("heidi").await;
    let book_id = app.add_book(5, 100).await;
    let order_id = app.place_order(&customer, &book_id, 1).await.json::<Value>()["order_id"]
        .as_str()
        .unwrap()
        .to_string();

    let (name, value) = user_header(&app.admin_id);
    let response = app
        .server
        .delete(&format!("/admin/books/{}", book_id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "BOOK_HAS_OPEN_ORDERS");

    app.set_status(&app.admin_id, &order_id, "CANCELLED")
        .await
        .assert_status_ok();
    app.server
        .delete(&format!("/admin/books/{}", book_id))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .get(&format!("/books/{}", book_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_restock_and_revise_book() {
    let app = setup().await;
    let book_id = app.add_book(1, 100).await;
    let (name, value) = user_header(&app.admin_id);

    let restocked = app
        .server
        .post(&format!("/admin/books/{}/restock", book_id))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "quantity": 4 }))
        .await;
    restocked.assert_status_ok();
    assert_eq!(restocked.json::<Value>()["stock_quantity"], 5);

    let revised = app
        .server
        .patch(&format!("/admin/books/{}", book_id))
        .add_header(name, value)
        .json(&json!({ "price": 250 }))
        .await;
    revised.assert_status_ok();
    let revised = revised.json::<Value>();
    assert_eq!(revised["price_amount"], 250);
    assert_eq!(revised["stock_quantity"], 5);
}

#[tokio::test]
async fn test_list_books_filters_and_sorts() {
    let app = setup().await;
    app.add_catalog_book("Kokoro", "Japanese Fiction", 800).await;
    app.add_catalog_book("Botchan", "fiction", 500).await;
    app.add_catalog_book("Meian", "Fiction", 2400).await;
    app.add_catalog_book("Bungakuron", "Criticism", 300).await;

    assert_eq!(
        app.book_titles("/books").await,
        vec!["Botchan", "Bungakuron", "Kokoro", "Meian"]
    );
    assert_eq!(
        app.book_titles("/books?domain=FICTION&max_price=800&sort_by=price&order=desc")
            .await,
        vec!["Kokoro", "Botchan"]
    );
    assert_eq!(
        app.book_titles("/books?max_price=500&sort_by=title").await,
        vec!["Botchan", "Bungakuron"]
    );
    assert!(app.book_titles("/books?domain=poetry").await.is_empty());
}

#[tokio::test]
async fn test_list_books_rejects_unknown_sort_parameters() {
    let app = setup().await;
    for path in [
        "/books?sort_by=stock_quantity",
        "/books?order=sideways",
        "/books?max_price=-1",
    ] {
        let response = app.server.get(path).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["code"], "INVALID_VALUE");
    }
}

#[tokio::test]
async fn test_admin_registration_requires_admin() {
    let app = setup().await;
    let customer = app.register_customer("ivan").await;

    let response = app
        .server
        .post("/users")
        .json(&json!({ "username": "mallory", "role": "admin" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let (name, value) = user_header(&customer);
    app.server
        .post("/users")
        .add_header(name, value)
        .json(&json!({ "username": "mallory", "role": "admin" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let (name, value) = user_header(&app.admin_id);
    app.server
        .post("/users")
        .add_header(name, value)
        .json(&json!({ "username": "judy", "role": "admin" }))
        .await
        .assert_status(StatusCode::CREATED);

    app.server
        .post("/users")
        .json(&json!({ "username": "ivan" }))
        .await
        .assert_status(StatusCode::CONFLICT);
}
