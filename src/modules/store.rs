use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use super::error::WriteError;

pub const DEFAULT_COLLECTION: &str = "products";

// a typed value inside a document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Double(f64),
    Integer(i64),
    Array(Vec<FieldValue>),
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> FieldValue {
        FieldValue::String(text.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> FieldValue {
        FieldValue::String(text)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> FieldValue {
        FieldValue::Double(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> FieldValue {
        FieldValue::Integer(n)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(list: Vec<String>) -> FieldValue {
        FieldValue::Array(list.into_iter().map(FieldValue::String).collect())
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

// every call creates a new document and returns its generated id
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, collection: &str, fields: &Fields) -> Result<String, WriteError>;

    // used in log lines
    fn name(&self) -> &str;
}

#[cfg(test)]
pub use self::memory::MemoryStore;

#[cfg(test)]
mod memory {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub struct StoredDocument {
        pub collection: String,
        pub id: String,
        pub fields: Fields,
    }

    // in-memory fake, optionally failing once a number of writes succeeded
    #[derive(Default)]
    pub struct MemoryStore {
        documents: Mutex<Vec<StoredDocument>>,
        fail_after: Option<usize>,
    }

    impl MemoryStore {
        pub fn new() -> MemoryStore {
            MemoryStore::default()
        }

        pub fn failing_after(successful_writes: usize) -> MemoryStore {
            MemoryStore {
                documents: Mutex::new(Vec::new()),
                fail_after: Some(successful_writes),
            }
        }

        pub fn documents(&self) -> Vec<StoredDocument> {
            self.documents.lock().unwrap().clone()
        }

        pub fn len(&self) -> usize {
            self.documents.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn create_document(&self, collection: &str, fields: &Fields) -> Result<String, WriteError> {
            let mut documents = self.documents.lock().unwrap();

            if let Some(limit) = self.fail_after {
                if documents.len() >= limit {
                    return Err(WriteError::Rejected {
                        status: 503,
                        body: "quota exceeded".to_owned(),
                    });
                }
            }

            let id = format!("doc-{}", documents.len() + 1);
            documents.push(StoredDocument {
                collection: collection.to_owned(),
                id: id.clone(),
                fields: fields.clone(),
            });
            Ok(id)
        }

        fn name(&self) -> &str {
            "memory"
        }
    }
}
