use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

pub const ORGANIZER_TOKEN: &str = "organizer-token";
pub const HERO_TOKEN: &str = "hero-token";

/// In-process fake of the events REST API. Records what the client sent so
/// tests can assert on headers and query strings.
#[derive(Default)]
pub struct FakeApi {
    events: Mutex<Vec<Value>>,
    requests: Mutex<usize>,
    last_authorization: Mutex<Option<String>>,
    last_query: Mutex<HashMap<String, String>>,
    last_body: Mutex<Option<Value>>,
    next_id: Mutex<usize>,
}

impl FakeApi {
    pub fn seed(&self, event: Value) {
        self.events.lock().unwrap().push(event);
    }

    pub fn requests(&self) -> usize {
        *self.requests.lock().unwrap()
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.last_authorization.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> HashMap<String, String> {
        self.last_query.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.last_body.lock().unwrap().clone()
    }

    fn record(&self, headers: &HeaderMap) -> Option<String> {
        *self.requests.lock().unwrap() += 1;
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *self.last_authorization.lock().unwrap() = authorization.clone();
        authorization.and_then(|v| v.strip_prefix("Bearer ").map(str::to_string))
    }

    fn find(&self, id: &str) -> Option<Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e["_id"] == id)
            .cloned()
    }
}

/// Spawn the fake on an ephemeral port. Returns its `/api` base URL.
pub async fn spawn_fake_api() -> (String, Arc<FakeApi>) {
    let state = Arc::new(FakeApi::default());

    let app = Router::new()
        .route("/api/events", post(create_event))
        .route("/api/events/upcoming", get(upcoming))
        .route("/api/events/user/created", get(created))
        .route("/api/events/user/joined", get(joined))
        .route(
            "/api/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/api/events/:id/join", post(join_event))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), state)
}

/// A stored event in the server's own shape: `_id`, and a
/// `participantCount` that disagrees with `participants`.
pub fn event_json(
    id: &str,
    creator_email: &str,
    created_at: DateTime<Utc>,
    event_date: DateTime<Utc>,
    participants: &[&str],
) -> Value {
    let participants: Vec<Value> = participants
        .iter()
        .map(|&email| {
            json!({
                "userEmail": email,
                "userName": email.split('@').next().unwrap_or(email),
                "joinedAt": created_at,
            })
        })
        .collect();

    json!({
        "_id": id,
        "title": format!("Event {}", id),
        "description": "Tree planting along the river",
        "eventType": "Plantation",
        "thumbnail": "https://x.com/tree.jpg",
        "location": "Riverside",
        "eventDate": event_date,
        "creatorEmail": creator_email,
        "creatorName": "Olivia Organizer",
        "createdAt": created_at,
        "participantCount": 42,
        "participants": participants,
    })
}

pub fn tomorrow() -> DateTime<Utc> {
    Utc::now() + Duration::days(1)
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

async fn upcoming(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    api.record(&headers);
    *api.last_query.lock().unwrap() = query;

    let events = api.events.lock().unwrap().clone();
    ok(Value::Array(events))
}

async fn get_event(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    api.record(&headers);

    match id.as_str() {
        "boom" => return fail(StatusCode::INTERNAL_SERVER_ERROR, "Database exploded"),
        // 200 with a failure body
        "soft-duplicate" => return fail(StatusCode::OK, "You have already joined this event"),
        "soft-archived" => return fail(StatusCode::OK, "Event is archived"),
        "no-flag" => {
            let event = event_json("no-flag", "a@example.com", Utc::now(), tomorrow(), &[]);
            return Json(json!({ "data": event })).into_response();
        }
        _ => {}
    }

    match api.find(&id) {
        Some(event) => ok(event),
        None => fail(StatusCode::NOT_FOUND, "Event not found"),
    }
}

async fn create_event(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if api.record(&headers).is_none() {
        return fail(StatusCode::UNAUTHORIZED, "No token provided");
    }
    *api.last_body.lock().unwrap() = Some(body.clone());

    let id = {
        let mut next = api.next_id.lock().unwrap();
        *next += 1;
        format!("srv-{}", next)
    };
    body["_id"] = json!(id);
    body["createdAt"] = json!(Utc::now());
    body["participants"] = json!([]);
    api.seed(body.clone());

    (StatusCode::CREATED, Json(json!({ "success": true, "data": body }))).into_response()
}

async fn join_event(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if api.record(&headers).is_none() {
        return fail(StatusCode::UNAUTHORIZED, "No token provided");
    }

    let mut events = api.events.lock().unwrap();
    let Some(event) = events.iter_mut().find(|e| e["_id"] == id.as_str()) else {
        return fail(StatusCode::NOT_FOUND, "Event not found");
    };

    let email = body["userEmail"].as_str().unwrap_or_default().to_lowercase();
    let participants = event["participants"].as_array_mut().unwrap();
    if participants
        .iter()
        .any(|p| p["userEmail"].as_str().map(str::to_lowercase) == Some(email.clone()))
    {
        return fail(StatusCode::BAD_REQUEST, "You have already joined this event");
    }

    participants.push(json!({
        "userEmail": body["userEmail"],
        "userName": body["userName"],
        "userPhoto": body["userPhoto"],
        "joinedAt": Utc::now(),
    }));
    event["participantCount"] = json!(99);

    ok(event.clone())
}

async fn created(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Response {
    if api.record(&headers).is_none() {
        return fail(StatusCode::UNAUTHORIZED, "No token provided");
    }

    let events: Vec<Value> = api
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e["creatorEmail"] == "organizer@example.com")
        .cloned()
        .collect();
    ok(Value::Array(events))
}

async fn joined(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Response {
    if api.record(&headers).is_none() {
        return fail(StatusCode::UNAUTHORIZED, "No token provided");
    }

    let events: Vec<Value> = api
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| {
            e["participants"]
                .as_array()
                .is_some_and(|ps| ps.iter().any(|p| p["userEmail"] == "hero@example.com"))
        })
        .cloned()
        .collect();
    ok(Value::Array(events))
}

async fn update_event(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let token = api.record(&headers);
    *api.last_body.lock().unwrap() = Some(body.clone());

    let mut events = api.events.lock().unwrap();
    let Some(event) = events.iter_mut().find(|e| e["_id"] == id.as_str()) else {
        return fail(StatusCode::NOT_FOUND, "Event not found");
    };
    if token.as_deref() != Some(ORGANIZER_TOKEN) {
        return fail(StatusCode::FORBIDDEN, "Not authorized to update this event");
    }

    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            event[key.as_str()] = value.clone();
        }
    }
    ok(event.clone())
}

async fn delete_event(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    api.record(&headers);

    if id == "boom" {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Database exploded");
    }

    let mut events = api.events.lock().unwrap();
    match events.iter().position(|e| e["_id"] == id.as_str()) {
        Some(index) => {
            events.remove(index);
            Json(json!({ "success": true, "message": "Event deleted" })).into_response()
        }
        None => fail(StatusCode::NOT_FOUND, "Event not found"),
    }
}
