//! Grammar correct Lambda function.
//!
//! This binary hosts the grammar correct service on AWS Lambda, backed by a
//! DynamoDB request table and an S3 artifact bucket.

use std::sync::Arc;

use gc_core::{Config, Dispatcher, PassthroughCorrector};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod aws;
mod dynamo;
mod handler;
mod s3;

use dynamo::DynamoRequestStore;
use s3::S3ArtifactStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for Lambda CloudWatch logs
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false) // Lambda doesn't support ANSI colors
        .without_time() // Lambda adds timestamps
        .init();

    let config = Config::from_env()?;
    info!(table = %config.table_name, bucket = %config.bucket, region = %config.region, "Grammar correct handler initializing");

    let sdk_config = aws::load_config(&config.region).await;
    let dispatcher = Dispatcher::new(
        Arc::new(DynamoRequestStore::new(&sdk_config, config.table_name.clone())),
        Arc::new(S3ArtifactStore::new(&sdk_config, config.bucket.clone())),
        Arc::new(PassthroughCorrector),
        config.dispatch,
    );
    let dispatcher = &dispatcher;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handler::function_handler(dispatcher, event).await
    }))
    .await
}
