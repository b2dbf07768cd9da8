use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;
use super::credentials::TokenSource;
use super::error::WriteError;
use super::store::{DocumentStore, FieldValue, Fields};

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

// Cloud Firestore through its REST api
pub struct FirestoreStore {
    http: reqwest::Client,
    tokens: TokenSource,
    base_url: String,
    project_id: String,
}

#[derive(Deserialize)]
struct CreatedDocument {
    #[serde(default)]
    name: String,
}

impl FirestoreStore {
    pub fn new(http: reqwest::Client, tokens: TokenSource, project_id: String) -> FirestoreStore {
        FirestoreStore {
            http,
            tokens,
            base_url: FIRESTORE_BASE_URL.to_owned(),
            project_id,
        }
    }

    // e.g. a local emulator
    pub fn with_base_url(mut self, base_url: &str) -> FirestoreStore {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    // path segments are encoded, a `/` in the collection stays part of its name
    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url,
            urlencoding::encode(&self.project_id),
            urlencoding::encode(collection)
        )
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn create_document(&self, collection: &str, fields: &Fields) -> Result<String, WriteError> {
        let token = self.tokens.access_token().await?;

        // no documentId parameter, firestore generates one
        let response = self
            .http
            .post(&self.collection_url(collection))
            .bearer_auth(token)
            .json(&build_document_body(fields))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WriteError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedDocument = response.json().await?;
        let id = document_id(&created.name)?;
        debug!(collection, id, "firestore document created");
        Ok(id.to_owned())
    }

    fn name(&self) -> &str {
        "firestore"
    }
}

pub fn build_document_body(fields: &Fields) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.to_owned(), build_value(value)))
        .collect();
    json!({ "fields": encoded })
}

// firestore typed value, integers travel as strings
fn build_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::String(text) => json!({ "stringValue": text }),
        FieldValue::Double(n) => json!({ "doubleValue": n }),
        FieldValue::Integer(n) => json!({ "integerValue": n.to_string() }),
        FieldValue::Array(list) => {
            let values: Vec<Value> = list.iter().map(build_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
    }
}

// "projects/p/databases/(default)/documents/products/<id>" -> "<id>"
fn document_id(name: &str) -> Result<&str, WriteError> {
    match name.rsplit('/').next() {
        Some(id) if !id.is_empty() && name.contains('/') => Ok(id),
        _ => Err(WriteError::InvalidResponse {
            message: format!("document name without id: {:?}", name),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::test_server::{http_client, StubServer};

    #[test]
    fn encodes_typed_values() {
        let mut fields = Fields::new();
        fields.insert("name".to_owned(), "Lamp".into());
        fields.insert("price".to_owned(), 9.99f64.into());
        fields.insert("stock".to_owned(), 10i64.into());
        fields.insert("images".to_owned(), vec!["a.jpg".to_owned(), "b.jpg".to_owned()].into());

        let body = build_document_body(&fields);
        assert_eq!(
            body,
            json!({
                "fields": {
                    "name": { "stringValue": "Lamp" },
                    "price": { "doubleValue": 9.99 },
                    "stock": { "integerValue": "10" },
                    "images": { "arrayValue": { "values": [
                        { "stringValue": "a.jpg" },
                        { "stringValue": "b.jpg" }
                    ] } }
                }
            })
        );
    }

    #[test]
    fn empty_array_still_has_values_list() {
        let mut fields = Fields::new();
        fields.insert("images".to_owned(), Vec::<String>::new().into());

        let body = build_document_body(&fields);
        assert_eq!(body["fields"]["images"], json!({ "arrayValue": { "values": [] } }));
    }

    #[test]
    fn extracts_generated_id() {
        let name = "projects/shop/databases/(default)/documents/products/Xk29abQ";
        assert_eq!(document_id(name).unwrap(), "Xk29abQ");
        assert!(document_id("").is_err());
        assert!(document_id("projects/shop/").is_err());
    }

    async fn store_for(server: &StubServer) -> FirestoreStore {
        let http = http_client();
        let tokens = TokenSource::new(server.key(), http.clone());
        FirestoreStore::new(http, tokens, "shop-demo".to_owned())
            .with_base_url(&format!("{}/v1/", server.base_url))
    }

    fn lamp() -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_owned(), "Lamp".into());
        fields
    }

    const TOKEN: &str = r#"{"access_token":"tok-1","expires_in":3600}"#;

    #[tokio::test]
    async fn created_document_returns_generated_id() {
        let server = StubServer::start(vec![
            (200, TOKEN),
            (200, r#"{"name":"projects/shop-demo/databases/(default)/documents/products/Xk29abQ","fields":{}}"#),
            (200, r#"{"name":"projects/shop-demo/databases/(default)/documents/products/Pq77rtZ","fields":{}}"#),
        ])
        .await;
        let store = store_for(&server).await;

        assert_eq!(store.create_document("products", &lamp()).await.unwrap(), "Xk29abQ");
        assert_eq!(store.create_document("products", &lamp()).await.unwrap(), "Pq77rtZ");

        // one token exchange serves both writes
        assert_eq!(
            server.requests(),
            vec![
                "POST /token HTTP/1.1",
                "POST /v1/projects/shop-demo/databases/(default)/documents/products HTTP/1.1",
                "POST /v1/projects/shop-demo/databases/(default)/documents/products HTTP/1.1",
            ]
        );
    }

    #[tokio::test]
    async fn error_status_is_rejected() {
        let server = StubServer::start(vec![(200, TOKEN), (503, r#"{"error":"unavailable"}"#)]).await;
        let store = store_for(&server).await;

        match store.create_document("products", &lamp()).await {
            Err(WriteError::Rejected { status, body }) => {
                assert_eq!(status, 503);
                assert!(body.contains("unavailable"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn response_without_name_is_invalid() {
        let server = StubServer::start(vec![(200, TOKEN), (200, "{}")]).await;
        let store = store_for(&server).await;

        let result = store.create_document("products", &lamp()).await;
        assert!(matches!(result, Err(WriteError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn collection_name_is_encoded_into_one_segment() {
        let server = StubServer::start(vec![
            (200, TOKEN),
            (200, r#"{"name":"projects/shop-demo/databases/(default)/documents/x/1"}"#),
        ])
        .await;
        let store = store_for(&server).await;

        store.create_document("a/b?c#d", &lamp()).await.unwrap();
        assert_eq!(
            server.requests()[1],
            "POST /v1/projects/shop-demo/databases/(default)/documents/a%2Fb%3Fc%23d HTTP/1.1"
        );
    }
}
