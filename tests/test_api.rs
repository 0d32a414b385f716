//! End-to-end API tests: run the full router in-process on an ephemeral port and drive it over
//! HTTP, backed by the in-memory document store.

use async_trait::async_trait;
use profile_booking_service::storage::{Document, StorageError};
use profile_booking_service::transport::http::types::{
    BookingBody, ContactMessageBody, MessageBody, ProfileBody, UsernameAvailability,
};
use profile_booking_service::transport::http::{self, AppState};
use profile_booking_service::{
    Collection, DocumentStore, Filter, MemoryDocumentStore, PersistenceGateway,
};
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

async fn spawn_app(store: Arc<dyn DocumentStore>) -> Result<String, Box<dyn std::error::Error>> {
    let router = http::app(AppState::new(PersistenceGateway::new(store)));

    // Bind to an ephemeral port so tests can run in parallel.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Ok(format!("http://127.0.0.1:{}", port))
}

async fn spawn_memory_app() -> Result<(String, Arc<MemoryDocumentStore>), Box<dyn std::error::Error>>
{
    let store = Arc::new(MemoryDocumentStore::new());
    let base_url = spawn_app(store.clone()).await?;
    Ok((base_url, store))
}

fn profile(auth0_id: &str, username: &str) -> ProfileBody {
    ProfileBody {
        auth0_id: Some(auth0_id.to_string()),
        first_name: Some("Asha".to_string()),
        last_name: Some("Rao".to_string()),
        username: Some(username.to_string()),
        email: Some("asha@example.com".to_string()),
        phone: Some("9876543210".to_string()),
        alternate_phone: None,
        address_line1: Some("12 MG Road".to_string()),
        address_line2: Some("Indiranagar".to_string()),
        city: Some("Bengaluru".to_string()),
        state: Some("Karnataka".to_string()),
        pincode: Some("560038".to_string()),
        landmark: Some("Near the metro".to_string()),
    }
}

fn booking() -> BookingBody {
    BookingBody {
        first_name: Some("Ravi".to_string()),
        last_name: Some("Kumar".to_string()),
        phone: Some("9123456780".to_string()),
        date: Some("2024-06-01".to_string()),
        time_slot: Some("10:00 AM - 10:30 AM".to_string()),
    }
}

fn contact() -> ContactMessageBody {
    ContactMessageBody {
        first_name: Some("Meera".to_string()),
        last_name: Some("Iyer".to_string()),
        email: Some("meera@example.com".to_string()),
        message: Some("Please call me back".to_string()),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn contact_message_is_stored() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/contact", base_url))
        .json(&contact())
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: MessageBody = resp.json().await?;
    assert_eq!(body.message, "Message sent successfully");

    let stored = store
        .find_one(
            Collection::ContactMessages,
            &Filter::new().eq("email", "meera@example.com"),
        )
        .await?
        .expect("contact message persisted");
    assert!(stored.get("createdAt").and_then(JsonValue::as_str).is_some());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn contact_message_missing_field_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    let mut body = contact();
    body.message = None;
    let resp = client
        .post(format!("{}/api/contact", base_url))
        .json(&body)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = resp.json().await?;
    assert_eq!(body, json!({ "error": "Please fill all required fields" }));
    assert_eq!(store.count(Collection::ContactMessages).await?, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn booking_is_stored_and_validated() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/booking", base_url))
        .json(&booking())
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: MessageBody = resp.json().await?;
    assert_eq!(body.message, "Booking successful");
    assert_eq!(store.count(Collection::Bookings).await?, 1);

    for bad in [
        BookingBody {
            phone: Some("12345".to_string()),
            ..booking()
        },
        BookingBody {
            time_slot: None,
            ..booking()
        },
        BookingBody {
            first_name: Some("   ".to_string()),
            ..booking()
        },
    ] {
        let resp = client
            .post(format!("{}/api/booking", base_url))
            .json(&bad)
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: JsonValue = resp.json().await?;
        assert_eq!(
            body,
            json!({ "error": "Please fill all required fields correctly" })
        );
    }
    assert_eq!(store.count(Collection::Bookings).await?, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_json_body_is_a_bad_request() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/booking", base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = resp.json().await?;
    let msg = body["error"].as_str().unwrap_or_default();
    assert!(msg.starts_with("Invalid JSON body"), "got {}", msg);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn username_availability() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    let check = |query: &'static str| {
        let client = client.clone();
        let url = format!("{}/api/check-username/alice{}", base_url, query);
        async move {
            let resp = client.get(url).send().await?;
            assert_eq!(resp.status(), StatusCode::OK);
            resp.json::<UsernameAvailability>().await
        }
    };

    assert_eq!(
        check("").await?,
        UsernameAvailability {
            available: true,
            current_user: false
        }
    );
    assert_eq!(
        check("?auth0Id=u1").await?,
        UsernameAvailability {
            available: true,
            current_user: false
        }
    );

    let resp = client
        .post(format!("{}/api/profile", base_url))
        .json(&profile("u1", "alice"))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(
        check("?auth0Id=u1").await?,
        UsernameAvailability {
            available: false,
            current_user: true
        }
    );
    assert_eq!(
        check("?auth0Id=u2").await?,
        UsernameAvailability {
            available: false,
            current_user: false
        }
    );
    assert_eq!(
        check("").await?,
        UsernameAvailability {
            available: false,
            current_user: false
        }
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn profile_upsert_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    let first: JsonValue = client
        .post(format!("{}/api/profile", base_url))
        .json(&profile("u1", "alice"))
        .send()
        .await?
        .json()
        .await?;
    let second: JsonValue = client
        .post(format!("{}/api/profile", base_url))
        .json(&profile("u1", "alice"))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(first["_id"], second["_id"]);
    assert_eq!(first["createdAt"], second["createdAt"]);
    assert_eq!(second["isProfileComplete"], json!(true));
    assert_eq!(second["landmark"], "Near the metro");
    assert_eq!(store.count(Collection::Users).await?, 1);

    let fetched: JsonValue = client
        .get(format!("{}/api/profile/u1", base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(fetched, second);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn profile_username_conflict_leaves_record_unchanged(
) -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    for (id, name) in [("u1", "bob"), ("u2", "carol")] {
        let resp = client
            .post(format!("{}/api/profile", base_url))
            .json(&profile(id, name))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = client
        .post(format!("{}/api/profile", base_url))
        .json(&ProfileBody {
            city: Some("Mysuru".to_string()),
            ..profile("u1", "carol")
        })
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = resp.json().await?;
    assert_eq!(body, json!({ "error": "Username is already taken" }));

    let u1: JsonValue = client
        .get(format!("{}/api/profile/u1", base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(u1["username"], "bob");
    assert_eq!(u1["city"], "Bengaluru");

    // A profile may keep its own username.
    let resp = client
        .post(format!("{}/api/profile", base_url))
        .json(&ProfileBody {
            city: Some("Mysuru".to_string()),
            ..profile("u1", "bob")
        })
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: JsonValue = resp.json().await?;
    assert_eq!(body["city"], "Mysuru");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn profile_requires_user_id() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    for body in [
        json!({ "username": "alice" }),
        json!({ "auth0Id": "  ", "username": "alice" }),
        json!({ "auth0Id": 7, "username": "alice" }),
    ] {
        let resp = client
            .post(format!("{}/api/profile", base_url))
            .json(&body)
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: JsonValue = resp.json().await?;
        assert_eq!(body, json!({ "error": "User ID is required" }));
    }
    assert_eq!(store.count(Collection::Users).await?, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn profile_completeness_is_recomputed() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    let body: JsonValue = client
        .post(format!("{}/api/profile", base_url))
        .json(&json!({
            "auth0Id": "u9",
            "username": "dev",
            "firstName": "Dev",
            "isProfileComplete": true
        }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["isProfileComplete"], json!(false));

    // Filling in the rest flips the flag on the same record.
    let body: JsonValue = client
        .post(format!("{}/api/profile", base_url))
        .json(&profile("u9", "dev"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["isProfileComplete"], json!(true));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn partial_update_keeps_completeness_of_stored_profile(
) -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    let body: JsonValue = client
        .post(format!("{}/api/profile", base_url))
        .json(&profile("u1", "alice"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["isProfileComplete"], json!(true));

    // Only a few fields supplied; the stored mandatory fields still count.
    let body: JsonValue = client
        .post(format!("{}/api/profile", base_url))
        .json(&json!({ "auth0Id": "u1", "username": "alice", "landmark": "park" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["landmark"], "park");
    assert_eq!(body["city"], "Bengaluru");
    assert_eq!(body["isProfileComplete"], json!(true));

    // Blanking a stored mandatory field clears the flag.
    let body: JsonValue = client
        .post(format!("{}/api/profile", base_url))
        .json(&json!({ "auth0Id": "u1", "username": "alice", "city": "" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["isProfileComplete"], json!(false));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn profile_with_malformed_fields_lists_violations() -> Result<(), Box<dyn std::error::Error>>
{
    let (base_url, store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/profile", base_url))
        .json(&ProfileBody {
            phone: Some("98765".to_string()),
            pincode: Some("56".to_string()),
            ..profile("u1", "alice")
        })
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = resp.json().await?;
    assert_eq!(
        body,
        json!({
            "error": [
                "phone must be a 10 digit phone number",
                "pincode must be a 6 digit pincode"
            ]
        })
    );
    assert_eq!(store.count(Collection::Users).await?, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_profile_is_empty_object() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/profile/nobody", base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: JsonValue = resp.json().await?;
    assert_eq!(body, json!({}));
    Ok(())
}

/// Store whose every call fails, for the 5xx paths.
struct UnavailableStore;

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn find_one(
        &self,
        _collection: Collection,
        _filter: &Filter,
    ) -> Result<Option<Document>, StorageError> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }

    async fn insert(
        &self,
        _collection: Collection,
        _doc: Document,
    ) -> Result<Document, StorageError> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }

    async fn upsert(
        &self,
        _collection: Collection,
        _filter: &Filter,
        _set: Document,
        _set_on_insert: Document,
    ) -> Result<Document, StorageError> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }

    async fn count(&self, _collection: Collection) -> Result<u64, StorageError> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn storage_failures_map_to_server_errors() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = spawn_app(Arc::new(UnavailableStore)).await?;
    let client = reqwest::Client::new();
    let raw = json!({ "error": "storage unavailable: connection refused" });

    let resp = client
        .post(format!("{}/api/contact", base_url))
        .json(&contact())
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        resp.json::<JsonValue>().await?,
        json!({ "error": "Failed to send message" })
    );

    let resp = client
        .post(format!("{}/api/booking", base_url))
        .json(&booking())
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        resp.json::<JsonValue>().await?,
        json!({ "error": "Failed to book call" })
    );

    let resp = client
        .get(format!("{}/api/check-username/alice", base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.json::<JsonValue>().await?, raw);

    let resp = client
        .post(format!("{}/api/profile", base_url))
        .json(&profile("u1", "alice"))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.json::<JsonValue>().await?, raw);

    let resp = client
        .get(format!("{}/api/profile/u1", base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.json::<JsonValue>().await?, raw);

    let resp = client.get(format!("{}/health", base_url)).send().await?;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_and_openapi_are_served() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _store) = spawn_memory_app().await?;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/health", base_url)).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.json::<JsonValue>().await?, json!({ "status": "ok" }));

    let doc: JsonValue = client
        .get(format!("{}/api-docs/openapi.json", base_url))
        .send()
        .await?
        .json()
        .await?;
    assert!(doc["paths"].get("/api/profile").is_some());
    assert!(doc["paths"].get("/api/check-username/{username}").is_some());
    Ok(())
}
