//! Correction collaborator.
//!
//! Grammar correction itself runs outside this service. The dispatcher only
//! needs something that turns submitted data into a corrected artifact.

use async_trait::async_trait;

use crate::error::Result;

/// Produces the corrected artifact for a request's data.
#[async_trait]
pub trait Corrector: Send + Sync {
    async fn correct(&self, data: &str) -> Result<String>;
}

/// Corrector that returns the submitted data unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughCorrector;

#[async_trait]
impl Corrector for PassthroughCorrector {
    async fn correct(&self, data: &str) -> Result<String> {
        Ok(data.to_string())
    }
}
