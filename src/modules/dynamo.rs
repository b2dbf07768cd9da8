use async_trait::async_trait;
use rusoto_core::Region;
use rusoto_dynamodb::{AttributeValue, DynamoDb, DynamoDbClient, PutItemInput};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;
use super::error::{ConfigError, WriteError};
use super::store::{DocumentStore, FieldValue, Fields};

// attribute holding the generated document id
pub const ID_ATTRIBUTE: &str = "id";

// DynamoDB as a document store, the collection name is the table name
pub struct Dynamo {
    client: DynamoDbClient,
}

impl Dynamo {
    pub fn new(region: &str) -> Result<Dynamo, ConfigError> {
        let region: Region = region
            .parse()
            .map_err(|_| ConfigError::InvalidRegion(region.to_owned()))?;

        Ok(Dynamo {
            client: DynamoDbClient::new(region),
        })
    }
}

#[async_trait]
impl DocumentStore for Dynamo {
    async fn create_document(&self, collection: &str, fields: &Fields) -> Result<String, WriteError> {
        let id = Uuid::new_v4().to_string();

        let input = PutItemInput {
            table_name: collection.to_owned(),
            item: build_item(&id, fields),
            ..Default::default()
        };

        self.client.put_item(input).await?;
        debug!(table = collection, id = id.as_str(), "dynamodb item saved");
        Ok(id)
    }

    fn name(&self) -> &str {
        "dynamodb"
    }
}

// build the put request item for a document and its generated id
pub fn build_item(id: &str, fields: &Fields) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert(ID_ATTRIBUTE.to_owned(), build_string_attr(id.to_owned()));

    for (name, value) in fields {
        item.insert(name.to_owned(), build_attr(value));
    }

    item
}

fn build_attr(value: &FieldValue) -> AttributeValue {
    match value {
        FieldValue::String(text) => build_string_attr(text.to_owned()),
        FieldValue::Double(n) => build_number_attr(n.to_string()),
        FieldValue::Integer(n) => build_number_attr(n.to_string()),
        // always a list, an empty string set is not allowed in dynamodb
        FieldValue::Array(list) => build_list_attr(list.iter().map(build_attr).collect()),
    }
}

fn build_string_attr(text: String) -> AttributeValue {
    AttributeValue {
        s: Some(text),
        ..Default::default()
    }
}

fn build_number_attr(text: String) -> AttributeValue {
    AttributeValue {
        n: Some(text),
        ..Default::default()
    }
}

fn build_list_attr(list: Vec<AttributeValue>) -> AttributeValue {
    AttributeValue {
        l: Some(list),
        ..Default::default()
    }
}
