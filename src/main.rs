use lambda_runtime::{run, service_fn, tracing, Error};

mod config;
mod dynamo;
mod error;
mod event_handler;
mod store;

use config::Config;
use event_handler::{function_handler, init_aws};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    // Per-process init: a missing table name fails the cold start
    let config = Config::from_env()?;
    let store = init_aws(&config).await?;

    run(service_fn(|event| function_handler(store, event))).await
}
