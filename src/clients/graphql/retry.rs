//! Retry coordinator for throttled and over-budget GraphQL requests.
//!
//! Throttling is answered by waiting until the bucket is full again and
//! re-sending the identical request. `MAX_COST_EXCEEDED` is answered by
//! shrinking the request's limit variable. Retries never change which records
//! are requested, only how many at once or when.

use std::time::Duration;

use crate::clients::graphql::{
    reduced_limit, repay_delay, GraphqlClient, GraphqlError, GraphqlRequest, GraphqlResponse,
};
use crate::clients::{Transport, RETRY_WAIT_TIME};

/// Result of a request that eventually succeeded.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryOutcome {
    /// The request that was accepted. Its limit may be smaller than the one
    /// originally asked for.
    pub request: GraphqlRequest,
    /// The accepted response.
    pub response: GraphqlResponse,
    /// How many retries were needed.
    pub retries: u32,
}

impl<T: Transport> GraphqlClient<T> {
    /// Executes a request, retrying throttling and cost-exceeded rejections.
    ///
    /// # Errors
    ///
    /// - [`GraphqlError::MaxRetries`] once [`max_retries`](Self::max_retries)
    ///   retries have been spent.
    /// - [`GraphqlError::UserErrors`] for cost-exceeded requests without a
    ///   limit variable.
    /// - Any non-retryable error of [`execute`](Self::execute), immediately.
    ///
    /// Retryable variants are never returned.
    pub async fn execute_with_retry(
        &self,
        request: GraphqlRequest,
    ) -> Result<RetryOutcome, GraphqlError> {
        let mut request = request;
        let mut retries: u32 = 0;

        loop {
            let error = match self.execute(&request).await {
                Ok(response) => {
                    return Ok(RetryOutcome {
                        request,
                        response,
                        retries,
                    })
                }
                Err(error) if error.is_retryable() => error,
                Err(error) => return Err(error),
            };

            if matches!(error, GraphqlError::CostExceeded { .. }) && request.limit().is_none() {
                return Err(GraphqlError::user_errors([error.to_string()]));
            }

            if retries >= self.max_retries() {
                return Err(GraphqlError::MaxRetries {
                    max_retries: self.max_retries(),
                    last_error: Box::new(error),
                });
            }
            retries += 1;

            match &error {
                GraphqlError::Throttled { cost } => {
                    let delay = cost.as_ref().map_or(Duration::from_secs(RETRY_WAIT_TIME), |cost| {
                        repay_delay(cost, true)
                    });
                    tracing::warn!(
                        retry = retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "GraphQL request throttled, waiting for the bucket to refill"
                    );
                    tokio::time::sleep(delay).await;
                }
                GraphqlError::CostExceeded { cost, max_cost } => {
                    if let Some(limit) = request.limit() {
                        let reduced = reduced_limit(*cost, *max_cost, limit, self.hard_cap());
                        tracing::info!(
                            retry = retries,
                            cost = *cost,
                            max_cost = *max_cost,
                            "Query cost exceeded, reducing limit from {} to {}",
                            limit,
                            reduced
                        );
                        request.set_limit(reduced);
                    }
                }
                _ => {}
            }
        }
    }
}
