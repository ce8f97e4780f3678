use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_runtime::{Error, LambdaEvent};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::Config;
use crate::dynamo::DynamoVisitStore;
use crate::error::VisitError;
use crate::store::VisitStore;

#[derive(Debug, Deserialize)]
pub(crate) struct VisitRequest {
    // Absent and empty are rejected by the same check in `record_visit`.
    #[serde(default)]
    user: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct VisitResponse {
    message: String,
}

static CONFIG: OnceCell<aws_config::SdkConfig> = OnceCell::new();
static STORE: OnceCell<DynamoVisitStore> = OnceCell::new();

pub(crate) async fn init_aws(config: &Config) -> Result<&'static DynamoVisitStore, Error> {
    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let sdk_config = CONFIG.get_or_init(|| sdk_config);

    let store = STORE.get_or_init(|| {
        DynamoVisitStore::new(DynamoClient::new(sdk_config), &config.table_name)
    });

    info!(table = %config.table_name, "visit store ready");
    Ok(store)
}

/// Counts one visit for the requesting user and greets them with the new total.
pub(crate) async fn record_visit<S>(
    store: &S,
    request: VisitRequest,
) -> Result<VisitResponse, VisitError>
where
    S: VisitStore + ?Sized,
{
    if request.user.is_empty() {
        return Err(VisitError::MissingUser);
    }

    let record = store.increment(&request.user).await?;
    info!(user = %record.user, count = record.count, "visit recorded");

    Ok(VisitResponse {
        message: format!("Hello {}. Visit count is {}", record.user, record.count),
    })
}

pub(crate) async fn function_handler<S>(
    store: &S,
    event: LambdaEvent<VisitRequest>,
) -> Result<VisitResponse, Error>
where
    S: VisitStore + ?Sized,
{
    record_visit(store, event.payload).await.map_err(|err| {
        error!(request_id = %event.context.request_id, "visit failed: {err}");
        err.into()
    })
}
