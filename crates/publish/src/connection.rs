//! Abstract connection to the store.
//!
//! The workflow talks to the API through this trait so it can be tested
//! with canned responses; [`Session`] is the production implementation.

use std::future::Future;
use std::pin::Pin;

use relpush_client::{ApiRequest, ClientError, Session};
use relpush_protocol::ApiResult;

/// One logical API call: expected failures come back as envelopes,
/// transport-level faults as errors.
pub trait StoreConnection: Send {
    fn execute(
        &mut self,
        req: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResult, ClientError>> + Send + '_>>;
}

impl StoreConnection for Session {
    fn execute(
        &mut self,
        req: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResult, ClientError>> + Send + '_>> {
        Box::pin(async move { Session::execute(self, &req).await })
    }
}
