//! In-memory stand-in for the UAA and views services.
//!
//! Routes requests by url, keeps per-zone card/deck state and records every
//! request so tests can assert on the exact calls issued.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use views_migrate_core::auth::Credentials;
use views_migrate_core::bulk::ConcurrencyPolicy;
use views_migrate_core::config::{MigrationConfig, MigrationFile, ZoneFile};
use views_migrate_core::http::{
    HttpRequest, HttpResponse, Method, RequestBody, Transport, TransportError,
};

pub const ORIGIN_VIEWS: &str = "https://views-a.test";
pub const ORIGIN_UAA: &str = "https://uaa-a.test";
pub const ORIGIN_ZONE: &str = "zone-a";
pub const ORIGIN_TOKEN: &str = "token-a";

pub const DESTINATION_VIEWS: &str = "https://views-b.test";
pub const DESTINATION_UAA: &str = "https://uaa-b.test";
pub const DESTINATION_ZONE: &str = "zone-b";
pub const DESTINATION_TOKEN: &str = "token-b";

#[derive(Debug, Default)]
struct ZoneData {
    token: String,
    cards: Vec<Value>,
    decks: Vec<Value>,
    memberships: HashMap<String, Vec<String>>,
    reassign_ids: bool,
    next_id: usize,
}

#[derive(Debug)]
enum UaaEntry {
    Token(String),
    Status(u16),
    Unreachable,
}

#[derive(Debug)]
struct CannedResponse {
    method: Method,
    fragment: String,
    status: u16,
    body: String,
}

#[derive(Debug, Default)]
struct State {
    requests: Vec<HttpRequest>,
    uaa: HashMap<String, UaaEntry>,
    zones: HashMap<String, ZoneData>,
    canned: Vec<CannedResponse>,
}

#[derive(Debug, Default)]
pub struct FakeViews {
    state: Mutex<State>,
}

impl FakeViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Origin zone-a and destination zone-b with their UAAs, both empty.
    pub fn two_zones() -> Self {
        Self::new()
            .uaa(ORIGIN_UAA, ORIGIN_TOKEN)
            .uaa(DESTINATION_UAA, DESTINATION_TOKEN)
            .zone(ORIGIN_ZONE, ORIGIN_TOKEN)
            .zone(DESTINATION_ZONE, DESTINATION_TOKEN)
    }

    pub fn uaa(self, url: &str, token: &str) -> Self {
        self.with_state(|s| {
            s.uaa.insert(url.to_string(), UaaEntry::Token(token.to_string()));
        })
    }

    pub fn uaa_status(self, url: &str, status: u16) -> Self {
        self.with_state(|s| {
            s.uaa.insert(url.to_string(), UaaEntry::Status(status));
        })
    }

    pub fn uaa_unreachable(self, url: &str) -> Self {
        self.with_state(|s| {
            s.uaa.insert(url.to_string(), UaaEntry::Unreachable);
        })
    }

    pub fn zone(self, zone_id: &str, token: &str) -> Self {
        self.with_state(|s| {
            s.zones.entry(zone_id.to_string()).or_default().token = token.to_string();
        })
    }

    /// Make `zone_id` assign fresh ids to created items.
    pub fn reassign_ids(self, zone_id: &str) -> Self {
        self.with_state(|s| {
            s.zones.entry(zone_id.to_string()).or_default().reassign_ids = true;
        })
    }

    pub fn seed_cards(self, zone_id: &str, cards: Vec<Value>) -> Self {
        self.with_state(|s| {
            s.zones.entry(zone_id.to_string()).or_default().cards.extend(cards);
        })
    }

    /// Seed decks; `attributes.cards` becomes the deck's membership.
    pub fn seed_decks(self, zone_id: &str, decks: Vec<Value>) -> Self {
        self.with_state(|s| {
            let zone = s.zones.entry(zone_id.to_string()).or_default();
            for mut deck in decks {
                let id = deck["id"].as_str().unwrap_or_default().to_string();
                let members = take_membership(&mut deck);
                zone.memberships.insert(id, members);
                zone.decks.push(deck);
            }
        })
    }

    /// Answer `status` to any `method` request whose url contains `fragment`.
    pub fn fail(self, method: Method, fragment: &str, status: u16) -> Self {
        self.respond(method, fragment, status, r#"{"error":"injected failure"}"#)
    }

    /// Answer a fixed response to any `method` request whose url contains `fragment`.
    pub fn respond(self, method: Method, fragment: &str, status: u16, body: &str) -> Self {
        self.with_state(|s| {
            s.canned.push(CannedResponse {
                method,
                fragment: fragment.to_string(),
                status,
                body: body.to_string(),
            });
        })
    }

    fn with_state(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Requests matching `method` whose url contains `fragment`.
    pub fn matching(&self, method: Method, fragment: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url.contains(fragment))
            .collect()
    }

    pub fn count(&self, method: Method, fragment: &str) -> usize {
        self.matching(method, fragment).len()
    }

    pub fn cards(&self, zone_id: &str) -> Vec<Value> {
        self.state.lock().unwrap().zones[zone_id].cards.clone()
    }

    pub fn decks(&self, zone_id: &str) -> Vec<Value> {
        self.state.lock().unwrap().zones[zone_id].decks.clone()
    }

    pub fn membership(&self, zone_id: &str, deck_id: &str) -> Vec<String> {
        self.state.lock().unwrap().zones[zone_id]
            .memberships
            .get(deck_id)
            .cloned()
            .unwrap_or_default()
    }

    fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());

        if let Some(canned) = state
            .canned
            .iter()
            .find(|c| c.method == request.method && request.url.contains(&c.fragment))
        {
            return Ok(HttpResponse::new(canned.status, canned.body.clone()));
        }

        if let Some(base) = request.url.strip_suffix("/oauth/token") {
            return handle_token(&state, base, request);
        }

        let zone_id = match request.header("Predix-Zone-Id") {
            Some(zone) => zone.to_string(),
            None => return Ok(HttpResponse::new(400, "missing zone header")),
        };
        let Some(zone) = state.zones.get_mut(&zone_id) else {
            return Ok(HttpResponse::new(404, "unknown zone"));
        };
        let expected = format!("Bearer {}", zone.token);
        if request.header("Authorization") != Some(expected.as_str()) {
            return Ok(HttpResponse::new(401, "token not valid for zone"));
        }

        Ok(route(zone, &zone_id, request))
    }
}

#[async_trait]
impl Transport for FakeViews {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        // Give sibling requests a chance to interleave.
        tokio::task::yield_now().await;
        self.handle(&request)
    }
}

fn handle_token(
    state: &State,
    base: &str,
    request: &HttpRequest,
) -> Result<HttpResponse, TransportError> {
    let basic_ok = request
        .header("Authorization")
        .is_some_and(|value| value.starts_with("Basic "));
    let form_ok = request.body
        == Some(RequestBody::Form(
            "grant_type=client_credentials&response_type=token".to_string(),
        ));

    match state.uaa.get(base) {
        Some(UaaEntry::Unreachable) => Err(TransportError::new("connection refused")),
        Some(UaaEntry::Status(status)) => Ok(HttpResponse::new(*status, "denied")),
        Some(UaaEntry::Token(token)) if basic_ok && form_ok => Ok(HttpResponse::json(
            200,
            &json!({"access_token": token, "token_type": "bearer", "expires_in": 43199}),
        )),
        Some(UaaEntry::Token(_)) => Ok(HttpResponse::new(400, "bad token request")),
        None => Err(TransportError::new(format!("no route to {base}"))),
    }
}

fn route(zone: &mut ZoneData, zone_id: &str, request: &HttpRequest) -> HttpResponse {
    let (path, query) = match request.url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (request.url.as_str(), None),
    };
    let Some((_, rest)) = path.split_once("/api/") else {
        return HttpResponse::new(404, "not an api path");
    };
    let segments: Vec<&str> = rest.split('/').collect();
    let body = match &request.body {
        Some(RequestBody::Json(value)) => value.clone(),
        _ => Value::Null,
    };

    match (request.method, segments.as_slice()) {
        (Method::Get, ["cards"]) => HttpResponse::json(200, &Value::from(zone.cards.clone())),
        (Method::Get, ["decks"]) => {
            let include = query.is_some_and(|q| q.contains("filter[include][cards]"));
            let decks: Vec<Value> = zone
                .decks
                .iter()
                .map(|deck| {
                    let mut deck = deck.clone();
                    if include {
                        let id = deck["id"].as_str().unwrap_or_default().to_string();
                        let cards: Vec<Value> = zone
                            .memberships
                            .get(&id)
                            .map(|ids| ids.iter().map(|c| json!({"id": c})).collect())
                            .unwrap_or_default();
                        deck["attributes"]["cards"] = Value::from(cards);
                    }
                    deck
                })
                .collect();
            HttpResponse::json(200, &Value::from(decks))
        }
        (Method::Post, [kind @ ("cards" | "decks")]) => {
            let Value::Array(items) = body else {
                return HttpResponse::new(422, "expected an array");
            };
            for mut item in items {
                // Tags and membership are only set through their own endpoints.
                if let Some(obj) = item.as_object_mut() {
                    obj.remove("tags");
                }
                take_membership(&mut item);
                if zone.reassign_ids {
                    zone.next_id += 1;
                    item["id"] = json!(format!("{}-{}-{}", zone_id, kind, zone.next_id));
                }
                let id = item["id"].as_str().unwrap_or_default().to_string();
                if *kind == "cards" {
                    zone.cards.push(item);
                } else {
                    zone.memberships.insert(id, Vec::new());
                    zone.decks.push(item);
                }
            }
            HttpResponse::new(200, "")
        }
        (Method::Delete, [kind @ ("cards" | "decks"), id]) => {
            let list = if *kind == "cards" { &mut zone.cards } else { &mut zone.decks };
            match list.iter().position(|item| item["id"] == json!(id)) {
                Some(index) => {
                    list.remove(index);
                    HttpResponse::new(204, "")
                }
                None => HttpResponse::new(404, "no such item"),
            }
        }
        (Method::Post, [kind @ ("cards" | "decks"), id, "tags"]) => {
            let list = if *kind == "cards" { &mut zone.cards } else { &mut zone.decks };
            match list.iter_mut().find(|item| item["id"] == json!(id)) {
                Some(item) => {
                    let mut tags = item["tags"].as_array().cloned().unwrap_or_default();
                    tags.extend(body.as_array().cloned().unwrap_or_default());
                    item["tags"] = Value::from(tags);
                    HttpResponse::json(200, &item.clone())
                }
                None => HttpResponse::new(404, "no such item"),
            }
        }
        (Method::Post, ["decks", id, "cards", "add"]) => match zone.memberships.get_mut(*id) {
            Some(members) => {
                let ids = body
                    .as_array()
                    .map(|ids| ids.iter().filter_map(|v| v.as_str().map(str::to_string)).collect::<Vec<_>>())
                    .unwrap_or_default();
                members.extend(ids);
                HttpResponse::new(200, "OK")
            }
            None => HttpResponse::new(404, "no such deck"),
        },
        _ => HttpResponse::new(404, "no route"),
    }
}

fn take_membership(deck: &mut Value) -> Vec<String> {
    deck.get_mut("attributes")
        .and_then(Value::as_object_mut)
        .and_then(|attrs| attrs.remove("cards"))
        .and_then(|cards| cards.as_array().cloned())
        .map(|cards| {
            cards
                .iter()
                .filter_map(|c| c["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn zone_file(views: &str, zone: &str, uaa: &str) -> ZoneFile {
    ZoneFile {
        views_url: views.to_string(),
        zone_id: zone.to_string(),
        uaa_url: uaa.to_string(),
        uaa_credentials: Some("Y2xpZW50OnNlY3JldA==".to_string()),
        client_id: None,
        client_secret: None,
    }
}

pub fn migration_file(clear_destination: bool) -> MigrationFile {
    MigrationFile {
        clear_destination,
        associate_origin: true,
        max_concurrency: 0,
        origin: zone_file(ORIGIN_VIEWS, ORIGIN_ZONE, ORIGIN_UAA),
        destination: zone_file(DESTINATION_VIEWS, DESTINATION_ZONE, DESTINATION_UAA),
    }
}

pub fn config(clear_destination: bool) -> MigrationConfig {
    MigrationConfig::from_file(&migration_file(clear_destination)).unwrap()
}

pub fn credentials() -> Credentials {
    Credentials::Encoded("Y2xpZW50OnNlY3JldA==".to_string())
}

pub fn unbounded() -> ConcurrencyPolicy {
    ConcurrencyPolicy::Unbounded
}
