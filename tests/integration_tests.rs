//! Integration tests for the Orderdesk HTTP surface.

use migration::{Migrator, MigratorTrait};
use orderdesk::config::AppConfig;
use orderdesk::server::{create_app, create_test_app_state};
use reqwest::Client;
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use uuid::Uuid;

const TEST_TOKEN: &str = "test-token-123";

/// Helper function to get a random available port
async fn get_available_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        operator_tokens: vec![TEST_TOKEN.to_string()],
        ..Default::default()
    }
}

/// Starts the server on a random port backed by a fresh in-memory database
async fn start_test_server() -> (String, DatabaseConnection) {
    let port = get_available_port().await;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to apply migrations");

    let state = create_test_app_state(test_config(), db.clone());
    let app = create_app(state);
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    (format!("http://127.0.0.1:{}", port), db)
}

/// Client wrapper that always sends operator and tenant headers
struct ApiClient {
    client: Client,
    base_url: String,
    tenant_id: Uuid,
}

impl ApiClient {
    fn new(base_url: String, tenant_id: Uuid) -> Self {
        Self {
            client: Client::new(),
            base_url,
            tenant_id,
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(TEST_TOKEN)
            .header("X-Tenant-Id", self.tenant_id.to_string())
            .send()
            .await
            .expect("request failed")
    }

    async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(TEST_TOKEN)
            .header("X-Tenant-Id", self.tenant_id.to_string())
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    async fn patch(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .patch(format!("{}{}", self.base_url, path))
            .bearer_auth(TEST_TOKEN)
            .header("X-Tenant-Id", self.tenant_id.to_string())
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    async fn put(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.base_url, path))
            .bearer_auth(TEST_TOKEN)
            .header("X-Tenant-Id", self.tenant_id.to_string())
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.base_url, path))
            .bearer_auth(TEST_TOKEN)
            .header("X-Tenant-Id", self.tenant_id.to_string())
            .send()
            .await
            .expect("request failed")
    }
}

/// Creates a tenant and returns a client scoped to it
async fn onboard_tenant(base_url: &str, subdomain: &str) -> ApiClient {
    let bootstrap = ApiClient::new(base_url.to_string(), Uuid::new_v4());
    let response = bootstrap
        .post(
            "/api/v1/tenants",
            &json!({ "name": "Test Bistro", "subdomain": subdomain }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let tenant: Value = response.json().await.expect("parse tenant");
    let tenant_id: Uuid = tenant["id"].as_str().unwrap().parse().unwrap();
    ApiClient::new(base_url.to_string(), tenant_id)
}

#[tokio::test]
async fn test_root_endpoint() {
    let (server_url, _db) = start_test_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/", server_url))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["service"].as_str().unwrap(), "orderdesk");
    assert_eq!(body["version"].as_str().unwrap(), env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_healthz_endpoint() {
    let (server_url, _db) = start_test_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/healthz", server_url))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"].as_str().unwrap(), "ok");
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let (server_url, _db) = start_test_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/openapi.json", server_url))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["info"]["title"].as_str().unwrap(), "Orderdesk API");
    assert!(body["paths"].get("/api/v1/orders").is_some());
}

#[tokio::test]
async fn test_protected_routes_reject_missing_credentials() {
    let (server_url, _db) = start_test_server().await;
    let client = Client::new();

    // No Authorization header at all
    let response = client
        .get(format!("{}/api/v1/tenants", server_url))
        .header("X-Tenant-Id", Uuid::new_v4().to_string())
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), 401);

    // Wrong token
    let response = client
        .get(format!("{}/api/v1/tenants", server_url))
        .bearer_auth("wrong-token")
        .header("X-Tenant-Id", Uuid::new_v4().to_string())
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), 401);

    // Valid token but no tenant header
    let response = client
        .get(format!("{}/api/v1/tenants", server_url))
        .bearer_auth(TEST_TOKEN)
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_tenant_lifecycle() {
    let (server_url, _db) = start_test_server().await;
    let api = ApiClient::new(server_url, Uuid::new_v4());

    let response = api
        .post(
            "/api/v1/tenants",
            &json!({ "name": "Luigi's", "subdomain": "luigis" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let tenant: Value = response.json().await.unwrap();
    assert_eq!(tenant["status"].as_str().unwrap(), "active");
    let tenant_id = tenant["id"].as_str().unwrap().to_string();

    // Duplicate subdomain conflicts
    let response = api
        .post(
            "/api/v1/tenants",
            &json!({ "name": "Copycat", "subdomain": "luigis" }),
        )
        .await;
    assert_eq!(response.status(), 409);

    // Uppercase subdomain is rejected
    let response = api
        .post(
            "/api/v1/tenants",
            &json!({ "name": "Shouty", "subdomain": "LUIGIS" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = api
        .patch(
            &format!("/api/v1/tenants/{}", tenant_id),
            &json!({ "status": "suspended" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["status"].as_str().unwrap(), "suspended");

    let response = api.delete(&format!("/api/v1/tenants/{}", tenant_id)).await;
    assert_eq!(response.status(), 204);

    let response = api.get(&format!("/api/v1/tenants/{}", tenant_id)).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_tenant_list_pagination() {
    let (server_url, _db) = start_test_server().await;
    let api = ApiClient::new(server_url, Uuid::new_v4());

    for index in 0..3 {
        let response = api
            .post(
                "/api/v1/tenants",
                &json!({
                    "name": format!("Tenant {}", index),
                    "subdomain": format!("tenant-{}", index)
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
    }

    let response = api.get("/api/v1/tenants?limit=2").await;
    assert_eq!(response.status(), 200);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert!(page["has_more"].as_bool().unwrap());
    let cursor = page["next_cursor"].as_str().unwrap().to_string();

    let response = api
        .get(&format!("/api/v1/tenants?limit=2&cursor={}", cursor))
        .await;
    assert_eq!(response.status(), 200);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert!(!page["has_more"].as_bool().unwrap());

    // Garbage cursors are a client error, not a server error
    let response = api.get("/api/v1/tenants?cursor=not-a-cursor").await;
    assert_eq!(response.status(), 400);

    // A zero limit yields an empty page with no cursor
    let response = api.get("/api/v1/tenants?limit=0").await;
    assert_eq!(response.status(), 200);
    let page: Value = response.json().await.unwrap();
    assert!(page["data"].as_array().unwrap().is_empty());
    assert!(page["next_cursor"].is_null());
}

#[tokio::test]
async fn test_settings_roundtrip() {
    let (server_url, _db) = start_test_server().await;
    let api = onboard_tenant(&server_url, "settings-cafe").await;
    let path = format!("/api/v1/tenants/{}/settings", api.tenant_id);

    // No settings document until the first write
    let response = api.get(&path).await;
    assert_eq!(response.status(), 404);

    let response = api
        .put(
            &path,
            &json!({ "tax_rate_bps": 800, "delivery_fee_cents": 399, "min_order_cents": 1000 }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let settings: Value = response.json().await.unwrap();
    assert_eq!(settings["currency"].as_str().unwrap(), "USD");
    assert_eq!(settings["tax_rate_bps"].as_i64().unwrap(), 800);
    assert_eq!(settings["delivery_fee_cents"].as_i64().unwrap(), 399);
    assert_eq!(settings["min_order_cents"].as_i64().unwrap(), 1000);

    // Clearing the minimum with an explicit null
    let response = api.put(&path, &json!({ "min_order_cents": null })).await;
    assert_eq!(response.status(), 200);
    let settings: Value = response.json().await.unwrap();
    assert!(settings["min_order_cents"].is_null());

    // Out-of-range tax rate is rejected
    let response = api.put(&path, &json!({ "tax_rate_bps": 10001 })).await;
    assert_eq!(response.status(), 400);
}

/// Seeds a category with two products and returns their IDs
async fn seed_menu(api: &ApiClient) -> (String, String, String) {
    let response = api
        .post("/api/v1/categories", &json!({ "name": "Pizzas" }))
        .await;
    assert_eq!(response.status(), 201);
    let category: Value = response.json().await.unwrap();
    let category_id = category["id"].as_str().unwrap().to_string();
    assert_eq!(category["slug"].as_str().unwrap(), "pizzas");

    let response = api
        .post(
            "/api/v1/products",
            &json!({ "category_id": category_id, "name": "Margherita", "price_cents": 1250 }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let margherita: Value = response.json().await.unwrap();

    let response = api
        .post(
            "/api/v1/products",
            &json!({ "category_id": category_id, "name": "Lemonade", "price_cents": 450 }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let lemonade: Value = response.json().await.unwrap();

    (
        category_id,
        margherita["id"].as_str().unwrap().to_string(),
        lemonade["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_order_flow_end_to_end() {
    let (server_url, _db) = start_test_server().await;
    let api = onboard_tenant(&server_url, "order-flow").await;

    let response = api
        .put(
            &format!("/api/v1/tenants/{}/settings", api.tenant_id),
            &json!({ "tax_rate_bps": 800, "delivery_fee_cents": 399 }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let (_category_id, margherita_id, lemonade_id) = seed_menu(&api).await;

    let response = api
        .post(
            "/api/v1/orders",
            &json!({
                "customer": { "email": "jo@example.com", "first_name": "Jo" },
                "order_type": "delivery",
                "source": "web",
                "payment_method": "card",
                "items": [
                    { "product_id": margherita_id, "quantity": 2 },
                    { "product_id": lemonade_id, "quantity": 1 }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let order: Value = response.json().await.unwrap();

    // 2 x 1250 + 450 = 2950; 8% tax rounds to 236; delivery fee 399
    assert_eq!(order["subtotal_cents"].as_i64().unwrap(), 2950);
    assert_eq!(order["tax_cents"].as_i64().unwrap(), 236);
    assert_eq!(order["delivery_fee_cents"].as_i64().unwrap(), 399);
    assert_eq!(order["total_cents"].as_i64().unwrap(), 3585);
    assert_eq!(order["status"].as_str().unwrap(), "pending");
    assert_eq!(order["payment_status"].as_str().unwrap(), "pending");
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    let order_id = order["id"].as_str().unwrap().to_string();

    // Single-order reads include items
    let response = api.get(&format!("/api/v1/orders/{}", order_id)).await;
    assert_eq!(response.status(), 200);
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched["items"].as_array().unwrap().len(), 2);

    // Lifecycle: pending -> confirmed -> completed, then frozen
    for status in ["confirmed", "completed"] {
        let response = api
            .patch(
                &format!("/api/v1/orders/{}/status", order_id),
                &json!({ "status": status }),
            )
            .await;
        assert_eq!(response.status(), 200);
    }
    let response = api
        .patch(
            &format!("/api/v1/orders/{}/status", order_id),
            &json!({ "status": "preparing" }),
        )
        .await;
    assert_eq!(response.status(), 409);

    let response = api
        .patch(
            &format!("/api/v1/orders/{}/payment", order_id),
            &json!({ "payment_status": "paid" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    // Paid order shows up in revenue stats
    let response = api.get("/api/v1/orders/stats").await;
    assert_eq!(response.status(), 200);
    let stats: Value = response.json().await.unwrap();
    assert_eq!(stats["revenue"]["order_count"].as_i64().unwrap(), 1);
    assert_eq!(stats["revenue"]["total_cents"].as_i64().unwrap(), 3585);
    let completed = stats["status_counts"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["status"] == "completed")
        .expect("completed bucket present");
    assert_eq!(completed["count"].as_i64().unwrap(), 1);
}

#[tokio::test]
async fn test_order_rejections() {
    let (server_url, _db) = start_test_server().await;
    let api = onboard_tenant(&server_url, "order-rules").await;

    let response = api
        .put(
            &format!("/api/v1/tenants/{}/settings", api.tenant_id),
            &json!({ "min_order_cents": 2000, "delivery_enabled": false }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let (_category_id, _margherita_id, lemonade_id) = seed_menu(&api).await;

    let base_order = |order_type: &str, quantity: i64| {
        json!({
            "customer": { "email": "jo@example.com" },
            "order_type": order_type,
            "source": "web",
            "payment_method": "cash",
            "items": [{ "product_id": lemonade_id, "quantity": quantity }]
        })
    };

    // Empty item list is a validation error
    let mut empty = base_order("pickup", 1);
    empty["items"] = json!([]);
    let response = api.post("/api/v1/orders", &empty).await;
    assert_eq!(response.status(), 400);

    // Below the configured minimum
    let response = api.post("/api/v1/orders", &base_order("pickup", 1)).await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"].as_str().unwrap(), "ORDER_REJECTED");

    // Delivery disabled for this tenant
    let response = api.post("/api/v1/orders", &base_order("delivery", 5)).await;
    assert_eq!(response.status(), 422);

    // Unknown product
    let mut unknown = base_order("pickup", 5);
    unknown["items"][0]["product_id"] = json!(Uuid::new_v4().to_string());
    let response = api.post("/api/v1/orders", &unknown).await;
    assert_eq!(response.status(), 404);

    // A compliant pickup order still goes through
    let response = api.post("/api/v1/orders", &base_order("pickup", 5)).await;
    assert_eq!(response.status(), 201);
    let order: Value = response.json().await.unwrap();
    assert_eq!(order["subtotal_cents"].as_i64().unwrap(), 2250);
    assert_eq!(order["delivery_fee_cents"].as_i64().unwrap(), 0);
}

#[tokio::test]
async fn test_product_delete_blocked_by_order_history() {
    let (server_url, _db) = start_test_server().await;
    let api = onboard_tenant(&server_url, "menu-cleanup").await;

    let (_category_id, margherita_id, lemonade_id) = seed_menu(&api).await;

    let response = api
        .post(
            "/api/v1/orders",
            &json!({
                "customer": { "email": "jo@example.com" },
                "order_type": "pickup",
                "source": "web",
                "payment_method": "cash",
                "items": [{ "product_id": margherita_id, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    // A sold product stays; order history keeps referencing it
    let response = api
        .delete(&format!("/api/v1/products/{}", margherita_id))
        .await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"].as_str().unwrap(), "CONFLICT");

    let response = api
        .get(&format!("/api/v1/products/{}", margherita_id))
        .await;
    assert_eq!(response.status(), 200);

    // An unsold product can be removed
    let response = api
        .delete(&format!("/api/v1/products/{}", lemonade_id))
        .await;
    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn test_tenant_isolation() {
    let (server_url, _db) = start_test_server().await;
    let api_a = onboard_tenant(&server_url, "isolation-a").await;
    let api_b = onboard_tenant(&server_url, "isolation-b").await;

    let (_category_id, margherita_id, _lemonade_id) = seed_menu(&api_a).await;

    // Tenant B cannot read tenant A's product
    let response = api_b
        .get(&format!("/api/v1/products/{}", margherita_id))
        .await;
    assert_eq!(response.status(), 404);

    // Nor order from A's menu
    let response = api_b
        .post(
            "/api/v1/orders",
            &json!({
                "customer": { "email": "intruder@example.com" },
                "order_type": "pickup",
                "source": "web",
                "payment_method": "cash",
                "items": [{ "product_id": margherita_id, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 404);

    // Same customer email is fine across tenants
    for api in [&api_a, &api_b] {
        let response = api
            .post(
                "/api/v1/customers",
                &json!({ "email": "shared@example.com" }),
            )
            .await;
        assert_eq!(response.status(), 201);
    }
}

#[tokio::test]
async fn test_customer_email_conflict() {
    let (server_url, _db) = start_test_server().await;
    let api = onboard_tenant(&server_url, "customers").await;

    let response = api
        .post(
            "/api/v1/customers",
            &json!({ "email": "jo@example.com", "first_name": "Jo" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    // Same email again for the same tenant conflicts
    let response = api
        .post("/api/v1/customers", &json!({ "email": "jo@example.com" }))
        .await;
    assert_eq!(response.status(), 409);

    // Order intake upserts instead of conflicting
    let (_category_id, margherita_id, _lemonade_id) = seed_menu(&api).await;
    let response = api
        .post(
            "/api/v1/orders",
            &json!({
                "customer": { "email": "JO@example.com", "phone": "+1-555-0101" },
                "order_type": "pickup",
                "source": "phone",
                "payment_method": "cash",
                "items": [{ "product_id": margherita_id, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = api.get("/api/v1/customers").await;
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(
        page["data"][0]["phone"].as_str().unwrap(),
        "+1-555-0101",
        "order intake should enrich the existing customer"
    );
}
