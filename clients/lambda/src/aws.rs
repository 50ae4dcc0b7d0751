//! AWS client utilities and shared functions.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use gc_core::GcError;

/// Load the shared AWS configuration for `region`.
pub async fn load_config(region: &str) -> aws_types::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// Convert an AWS SDK error into a storage error, keeping the full error chain.
pub fn aws_err<E: std::error::Error>(e: E) -> GcError {
    GcError::Storage(format!("AWS Error: {}", DisplayErrorContext(&e)))
}
