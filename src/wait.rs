//! Waiting for objects to settle after apply and delete.

use std::future::Future;
use std::time::Duration;

use kube::api::{Api, DynamicObject};
use kube_runtime::wait::await_condition;
use rand::{thread_rng, Rng};
use tokio::time::{sleep, timeout, Instant};
use tracing::{event, Level};

#[derive(Debug)]
pub enum PollError<E> {
    TimedOut(Duration),
    Check(E),
}

/// Calls `check` every `poll_interval` until it returns `true`, failing once
/// `limit` has elapsed. The last call happens at the deadline. Each sleep is
/// stretched by up to a tenth of the interval so that many resources deleted
/// together do not poll in lockstep.
pub async fn poll_until<F, Fut, E>(
    limit: Duration,
    poll_interval: Duration,
    mut check: F,
) -> Result<(), PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let start = Instant::now();
    loop {
        if check().await.map_err(PollError::Check)? {
            return Ok(());
        }
        let elapsed = start.elapsed();
        if elapsed >= limit {
            return Err(PollError::TimedOut(limit));
        }
        let jitter_ms = thread_rng().gen_range(0..=poll_interval.as_millis() / 10);
        let jitter = Duration::from_millis(u64::try_from(jitter_ms).unwrap_or(0));
        // never sleep past the deadline
        sleep((poll_interval + jitter).min(limit - elapsed)).await;
    }
}

/// Polls the API server until `name` no longer exists.
pub async fn until_absent(
    api: &Api<DynamicObject>,
    name: &str,
    limit: Duration,
    poll_interval: Duration,
) -> Result<(), PollError<kube::Error>> {
    poll_until(limit, poll_interval, move || async move {
        let absent = api.get_opt(name).await?.is_none();
        if !absent {
            event!(Level::DEBUG, resource_name = %name, "Still waiting for deletion.");
        }
        Ok::<_, kube::Error>(absent)
    })
    .await
}

#[derive(Debug)]
pub enum ReadyError {
    TimedOut(Duration),
    Vanished,
    Watch(kube_runtime::wait::Error),
}

/// Watches `name` until `ready` accepts it. Returns the object that
/// satisfied the predicate.
pub async fn until_ready<F>(
    api: Api<DynamicObject>,
    name: &str,
    limit: Duration,
    ready: F,
) -> Result<DynamicObject, ReadyError>
where
    F: Fn(&DynamicObject) -> bool + Send + Sync + 'static,
{
    let condition = move |object: Option<&DynamicObject>| object.map_or(true, &ready);
    match timeout(limit, await_condition(api, name, condition)).await {
        Err(_) => Err(ReadyError::TimedOut(limit)),
        Ok(Err(err)) => Err(ReadyError::Watch(err)),
        Ok(Ok(Some(object))) => Ok(object),
        Ok(Ok(None)) => Err(ReadyError::Vanished),
    }
}
