//! Background loops bound to one workload
//!
//! The step loop drives the workload forward; the poller observes it. Both
//! report through the coordinator's update channel and both exit as soon as
//! the workload's cancellation token fires.

pub mod poller;
pub mod step_loop;

pub use poller::StatusPoller;
pub use step_loop::{StepLoop, backoff_delay};

use std::future::Future;
use std::time::Duration;

use ampwatch_client::{ClientError, Result as ClientResult};

/// Bounds an executor call; running out of time is an ordinary call failure
pub(crate) async fn call_with_timeout<T, F>(limit: Duration, call: F) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout(limit)),
    }
}
