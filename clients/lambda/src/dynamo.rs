//! DynamoDB-backed request table.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use gc_core::{
    GcError, PersistedRequestItem, RequestKey, RequestStore, RequestUpdate, Result, UpdateField,
};
use tracing::debug;

use crate::aws::aws_err;

const PARTITION_KEY: &str = "partitionKey";
const SORT_KEY: &str = "sortKey";

type Attributes = HashMap<String, AttributeValue>;

/// Request records stored in a DynamoDB table.
pub struct DynamoRequestStore {
    client: Client,
    table_name: String,
}

impl DynamoRequestStore {
    pub fn new(config: &aws_types::SdkConfig, table_name: String) -> Self {
        Self {
            client: Client::new(config),
            table_name,
        }
    }
}

#[async_trait]
impl RequestStore for DynamoRequestStore {
    async fn put_item(&self, item: &PersistedRequestItem) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_attributes(item)))
            .send()
            .await
            .map_err(aws_err)?;
        Ok(())
    }

    async fn update_item(&self, update: &RequestUpdate) -> Result<()> {
        let Some(expression) = UpdateExpression::from_update(update) else {
            debug!(key = %update.key(), "Empty update, skipping");
            return Ok(());
        };

        self.client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(update.key())))
            .update_expression(expression.expression)
            .set_expression_attribute_names(Some(expression.names))
            .set_expression_attribute_values(Some(expression.values))
            .send()
            .await
            .map_err(aws_err)?;
        Ok(())
    }

    async fn get_item(&self, key: &RequestKey) -> Result<Option<PersistedRequestItem>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .send()
            .await
            .map_err(aws_err)?;

        output.item().map(from_attributes).transpose()
    }
}

fn key_attributes(key: &RequestKey) -> Attributes {
    HashMap::from([
        (PARTITION_KEY.to_string(), AttributeValue::S(key.partition_key.clone())),
        (SORT_KEY.to_string(), AttributeValue::S(key.sort_key.clone())),
    ])
}

fn to_attributes(item: &PersistedRequestItem) -> Attributes {
    let mut attributes = key_attributes(&item.key());
    attributes.insert("email".into(), AttributeValue::S(item.email.clone()));
    attributes.insert("requestId".into(), AttributeValue::S(item.request_id.clone()));
    attributes.insert("status".into(), AttributeValue::S(item.status.clone()));
    attributes.insert("filename".into(), AttributeValue::S(item.filename.clone()));
    attributes.insert("ttl".into(), AttributeValue::N(item.ttl.to_string()));
    attributes.insert("timestamp".into(), AttributeValue::N(item.timestamp.to_string()));
    attributes
}

fn from_attributes(attributes: &Attributes) -> Result<PersistedRequestItem> {
    let partition_key = string_attr(attributes, PARTITION_KEY)?;
    let sort_key = string_attr(attributes, SORT_KEY)?;
    let filename = match attributes.get("filename") {
        Some(_) => string_attr(attributes, "filename")?,
        None => RequestKey::new(partition_key.clone(), sort_key.clone()).artifact_filename(),
    };

    Ok(PersistedRequestItem {
        email: optional_string_attr(attributes, "email")?.unwrap_or_else(|| partition_key.clone()),
        request_id: optional_string_attr(attributes, "requestId")?.unwrap_or_else(|| sort_key.clone()),
        status: optional_string_attr(attributes, "status")?.unwrap_or_default(),
        filename,
        ttl: number_attr(attributes, "ttl")?,
        timestamp: number_attr(attributes, "timestamp")?,
        partition_key,
        sort_key,
    })
}

fn optional_string_attr(attributes: &Attributes, name: &str) -> Result<Option<String>> {
    match attributes.get(name) {
        Some(value) => value
            .as_s()
            .map(|s| Some(s.clone()))
            .map_err(|_| GcError::Serialization(format!("attribute '{}' is not a string", name))),
        None => Ok(None),
    }
}

fn string_attr(attributes: &Attributes, name: &str) -> Result<String> {
    optional_string_attr(attributes, name)?
        .ok_or_else(|| GcError::Serialization(format!("missing attribute '{}'", name)))
}

fn number_attr(attributes: &Attributes, name: &str) -> Result<u64> {
    match attributes.get(name) {
        Some(value) => {
            let number = value
                .as_n()
                .map_err(|_| GcError::Serialization(format!("attribute '{}' is not a number", name)))?;
            number
                .parse()
                .map_err(|e| GcError::Serialization(format!("attribute '{}': {}", name, e)))
        }
        None => Ok(0),
    }
}

/// `SET` expression built from the typed fields of a [`RequestUpdate`].
#[derive(Debug, PartialEq)]
struct UpdateExpression {
    expression: String,
    names: HashMap<String, String>,
    values: Attributes,
}

impl UpdateExpression {
    fn from_update(update: &RequestUpdate) -> Option<Self> {
        if update.is_empty() {
            return None;
        }

        let mut assignments = Vec::with_capacity(update.fields().len());
        let mut names = HashMap::new();
        let mut values = HashMap::new();

        for field in update.fields() {
            let attribute = field.attribute();
            assignments.push(format!("#{attribute} = :{attribute}"));
            names.insert(format!("#{attribute}"), attribute.to_string());
            values.insert(format!(":{attribute}"), field_value(field));
        }

        Some(Self {
            expression: format!("SET {}", assignments.join(", ")),
            names,
            values,
        })
    }
}

fn field_value(field: &UpdateField) -> AttributeValue {
    match field {
        UpdateField::Status(status) => AttributeValue::S(status.to_string()),
        UpdateField::Filename(filename) => AttributeValue::S(filename.clone()),
        UpdateField::Ttl(ttl) => AttributeValue::N(ttl.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use gc_core::RequestState;

    use super::*;

    #[test]
    fn attributes_round_trip() {
        let item = PersistedRequestItem::new(&RequestKey::new("e1", "r1"), RequestState::Processed, 100, 50);
        let attributes = to_attributes(&item);
        assert_eq!(attributes.get("ttl"), Some(&AttributeValue::N("150".into())));
        assert_eq!(attributes.get("status"), Some(&AttributeValue::S("PROCESSED".into())));
        assert_eq!(from_attributes(&attributes), Ok(item));
    }

    #[test]
    fn sparse_records_fall_back_to_key_fields() {
        let mut attributes = key_attributes(&RequestKey::new("e1", "r1"));
        attributes.insert("status".into(), AttributeValue::S("PROCESSED".into()));

        let item = from_attributes(&attributes).unwrap();
        assert_eq!(item.email, "e1");
        assert_eq!(item.request_id, "r1");
        assert_eq!(item.filename, "e1/r1");
        assert_eq!(item.ttl, 0);
    }

    #[test]
    fn unknown_or_missing_status_loads_as_unprocessed() {
        let mut attributes = key_attributes(&RequestKey::new("e1", "r1"));
        let missing = from_attributes(&attributes).unwrap();
        assert_eq!(missing.status, "");
        assert!(!missing.is_processed());

        attributes.insert("status".into(), AttributeValue::S("IN_PROGRESS".into()));
        let unknown = from_attributes(&attributes).unwrap();
        assert_eq!(unknown.status, "IN_PROGRESS");
        assert_eq!(unknown.state(), None);
        assert!(!unknown.is_processed());
    }

    #[test]
    fn rejects_malformed_attributes() {
        let mut attributes = key_attributes(&RequestKey::new("e1", "r1"));
        attributes.insert("status".into(), AttributeValue::N("1".into()));
        assert!(matches!(from_attributes(&attributes), Err(GcError::Serialization(_))));

        attributes.insert("status".into(), AttributeValue::S("NEW".into()));
        attributes.insert("ttl".into(), AttributeValue::S("soon".into()));
        assert!(matches!(from_attributes(&attributes), Err(GcError::Serialization(_))));
    }

    #[test]
    fn update_expression_sets_typed_fields() {
        let update = RequestUpdate::new(RequestKey::new("e1", "r1"))
            .status(RequestState::Processed)
            .ttl(42);
        let expression = UpdateExpression::from_update(&update).unwrap();

        assert_eq!(expression.expression, "SET #status = :status, #ttl = :ttl");
        assert_eq!(expression.names.get("#status").map(String::as_str), Some("status"));
        assert_eq!(
            expression.values.get(":status"),
            Some(&AttributeValue::S("PROCESSED".into()))
        );
        assert_eq!(expression.values.get(":ttl"), Some(&AttributeValue::N("42".into())));
    }

    #[test]
    fn empty_update_has_no_expression() {
        let update = RequestUpdate::new(RequestKey::new("e1", "r1"));
        assert_eq!(UpdateExpression::from_update(&update), None);
    }
}
