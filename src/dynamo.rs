use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, ReturnValuesOnConditionCheckFailure};
use aws_sdk_dynamodb::Client as DynamoClient;
use tracing::debug;

use crate::error::VisitError;
use crate::store::{VisitRecord, VisitStore};

const USER_ATTR: &str = "user";
const COUNT_ATTR: &str = "count";

/// `VisitStore` backed by a DynamoDB table keyed on the `user` string attribute.
#[derive(Clone, Debug)]
pub struct DynamoVisitStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoVisitStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key(user: &str) -> (String, AttributeValue) {
        (USER_ATTR.to_string(), AttributeValue::S(user.to_string()))
    }
}

fn service_error<E>(err: E) -> VisitError
where
    E: std::error::Error,
{
    VisitError::Store(format!("{}", DisplayErrorContext(err)))
}

// Only counts DynamoDB can safely add one to. Fractional values pass this
// check and are rejected by `parse_count` afterwards.
const VALID_COUNT_CONDITION: &str =
    "attribute_not_exists(#count) OR (attribute_type(#count, :n) AND #count >= :zero)";

#[async_trait]
impl VisitStore for DynamoVisitStore {
    /// Point lookup for inspecting a counter; visits go through `increment`.
    async fn get(&self, user: &str) -> Result<Option<VisitRecord>, VisitError> {
        debug!(table = %self.table_name, user, "get_item");
        let (key, value) = Self::key(user);

        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(key, value)
            .consistent_read(true)
            .send()
            .await
            .map_err(service_error)?;

        response.item().map(record_from_item).transpose()
    }

    /// Full upsert, used to seed or repair a counter outside the visit path.
    async fn put(&self, record: &VisitRecord) -> Result<(), VisitError> {
        debug!(table = %self.table_name, user = %record.user, count = record.count, "put_item");

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .map_err(service_error)?;

        Ok(())
    }

    async fn increment(&self, user: &str) -> Result<VisitRecord, VisitError> {
        debug!(table = %self.table_name, user, "update_item ADD");
        let (key, value) = Self::key(user);

        // `count` is a DynamoDB reserved word, hence the placeholder.
        let response = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(key, value)
            .update_expression("ADD #count :one")
            .condition_expression(VALID_COUNT_CONDITION)
            .expression_attribute_names("#count", COUNT_ATTR)
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .expression_attribute_values(":zero", AttributeValue::N("0".to_string()))
            .expression_attribute_values(":n", AttributeValue::S("N".to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(UpdateItemError::ConditionalCheckFailedException(rejected)) => {
                    VisitError::InvalidCount {
                        user: user.to_string(),
                        value: describe_count(
                            rejected.item().and_then(|item| item.get(COUNT_ATTR)),
                        ),
                    }
                }
                _ => service_error(err),
            })?;

        let count = parse_count(
            user,
            response
                .attributes()
                .and_then(|attributes| attributes.get(COUNT_ATTR)),
        )?;

        Ok(VisitRecord::new(user, count))
    }
}

pub(crate) fn record_to_item(record: &VisitRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (USER_ATTR.to_string(), AttributeValue::S(record.user.clone())),
        (COUNT_ATTR.to_string(), AttributeValue::N(record.count.to_string())),
    ])
}

pub(crate) fn record_from_item(
    item: &HashMap<String, AttributeValue>,
) -> Result<VisitRecord, VisitError> {
    let user = match item.get(USER_ATTR) {
        Some(AttributeValue::S(user)) => user.clone(),
        Some(other) => {
            return Err(VisitError::InvalidRecord(format!(
                "`{USER_ATTR}` is not a string: {other:?}"
            )))
        }
        None => {
            return Err(VisitError::InvalidRecord(format!(
                "`{USER_ATTR}` attribute is missing"
            )))
        }
    };

    let count = parse_count(&user, item.get(COUNT_ATTR))?;
    Ok(VisitRecord { user, count })
}

fn parse_count(user: &str, attr: Option<&AttributeValue>) -> Result<u64, VisitError> {
    match attr {
        Some(AttributeValue::N(raw)) => raw.parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| VisitError::InvalidCount {
        user: user.to_string(),
        value: describe_count(attr),
    })
}

fn describe_count(attr: Option<&AttributeValue>) -> String {
    match attr {
        Some(AttributeValue::N(raw)) => raw.clone(),
        Some(other) => format!("{other:?}"),
        None => "<missing>".to_string(),
    }
}
