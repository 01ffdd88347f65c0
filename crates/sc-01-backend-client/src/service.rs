//! # Client Accessor
//!
//! Lazily builds one verified backend client and memoizes it.
//!
//! Callers that arrive while an acquisition is running attach to the same
//! pending future, so a single attempt sequence serves all of them.

use crate::domain::{BackendConfig, BackendError, ConnectivityError, Query, RetryPolicy};
use crate::ports::{BackendClient, BackendConnector};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use shared_bus::{EventPublisher, SystemEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};

type AcquireResult = Result<Arc<dyn BackendClient>, ConnectivityError>;
type PendingAcquire = Shared<BoxFuture<'static, AcquireResult>>;

enum AccessorState {
    Idle,
    Pending {
        generation: u64,
        future: PendingAcquire,
    },
    Ready(Arc<dyn BackendClient>),
}

struct AccessorInner {
    config: BackendConfig,
    retry: RetryPolicy,
    connector: Arc<dyn BackendConnector>,
    bus: Arc<dyn EventPublisher>,
    state: Mutex<AccessorState>,
    /// Bumped on every new sequence and on reset; stale completions are
    /// ignored.
    generation: Mutex<u64>,
}

/// Process-wide accessor for the backend client.
#[derive(Clone)]
pub struct ClientAccessor {
    inner: Arc<AccessorInner>,
}

impl ClientAccessor {
    pub fn new(
        config: BackendConfig,
        retry: RetryPolicy,
        connector: Arc<dyn BackendConnector>,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            inner: Arc::new(AccessorInner {
                config,
                retry,
                connector,
                bus,
                state: Mutex::new(AccessorState::Idle),
                generation: Mutex::new(0),
            }),
        }
    }

    /// Return the memoized client, building and probing one if needed.
    pub async fn acquire(&self) -> AcquireResult {
        let pending = {
            let mut state = self.inner.state.lock();
            match &*state {
                AccessorState::Ready(client) => return Ok(client.clone()),
                AccessorState::Pending { generation, future } => Ok((*generation, future.clone())),
                AccessorState::Idle => match self.inner.config.validate() {
                    Err(e) => Err(ConnectivityError::from(e)),
                    Ok(()) => {
                        let generation = self.inner.next_generation();
                        let future = connect_with_retry(self.inner.clone()).boxed().shared();
                        *state = AccessorState::Pending {
                            generation,
                            future: future.clone(),
                        };
                        debug!(generation, "Starting backend acquisition");
                        Ok((generation, future))
                    }
                },
            }
        };

        let (generation, future) = match pending {
            Ok(pending) => pending,
            Err(error) => {
                warn!(error = %error, "Backend configuration rejected");
                self.inner.bus.publish(SystemEvent::BackendClientError {
                    attempts: 0,
                    message: error.to_string(),
                });
                return Err(error);
            }
        };

        let result = future.await;

        let mut state = self.inner.state.lock();
        let current = matches!(&*state, AccessorState::Pending { generation: g, .. } if *g == generation);
        if current {
            *state = match &result {
                Ok(client) => AccessorState::Ready(client.clone()),
                Err(_) => AccessorState::Idle,
            };
        }
        result
    }

    /// The memoized client, without triggering acquisition.
    pub fn cached(&self) -> Option<Arc<dyn BackendClient>> {
        match &*self.inner.state.lock() {
            AccessorState::Ready(client) => Some(client.clone()),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cached().is_some()
    }

    /// Forget the memoized client. An in-flight sequence still completes
    /// for its waiters but is no longer cached.
    pub fn reset(&self) {
        self.inner.next_generation();
        *self.inner.state.lock() = AccessorState::Idle;
        info!("Backend client reset");
    }
}

impl AccessorInner {
    fn next_generation(&self) -> u64 {
        let mut generation = self.generation.lock();
        *generation += 1;
        *generation
    }

    async fn attempt(&self) -> Result<Arc<dyn BackendClient>, BackendError> {
        let client = self.connector.connect(&self.config).await?;
        let probe = Query::from("organizations").select(&["id"]).limit(1);
        client.select(&probe).await?;
        Ok(client)
    }
}

async fn connect_with_retry(inner: Arc<AccessorInner>) -> AcquireResult {
    let max_attempts = inner.retry.max_attempts.max(1);
    let mut last_cause = BackendError::Unavailable("no attempt made".to_string());

    for attempt in 1..=max_attempts {
        match inner.attempt().await {
            Ok(client) => {
                info!(attempt, url = %inner.config.url, "Backend client ready");
                inner
                    .bus
                    .publish(SystemEvent::BackendClientInitialized { attempts: attempt });
                return Ok(client);
            }
            Err(cause) => {
                warn!(attempt, max_attempts, error = %cause, "Backend probe failed");
                last_cause = cause;
                if attempt < max_attempts {
                    tokio::time::sleep(inner.retry.delay).await;
                }
            }
        }
    }

    let error = ConnectivityError::Exhausted {
        attempts: max_attempts,
        last_cause,
    };
    inner.bus.publish(SystemEvent::BackendClientError {
        attempts: max_attempts,
        message: error.to_string(),
    });
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryBackend, MemoryConnector, TableOp};
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus};
    use std::time::Duration;

    fn config() -> BackendConfig {
        BackendConfig::new("memory://console", "anon")
    }

    fn accessor(
        backend: &Arc<MemoryBackend>,
        retry: RetryPolicy,
    ) -> (ClientAccessor, Arc<MemoryConnector>, Arc<InMemoryEventBus>) {
        let connector = Arc::new(MemoryConnector::new(backend.clone()));
        let bus = Arc::new(InMemoryEventBus::new());
        let accessor = ClientAccessor::new(config(), retry, connector.clone(), bus.clone());
        (accessor, connector, bus)
    }

    #[tokio::test]
    async fn test_acquire_is_memoized() {
        let backend = Arc::new(MemoryBackend::new());
        let (accessor, connector, _bus) = accessor(&backend, RetryPolicy::immediate(3));

        accessor.acquire().await.unwrap();
        accessor.acquire().await.unwrap();

        assert_eq!(connector.connects(), 1);
        assert!(accessor.is_ready());
    }

    #[tokio::test]
    async fn test_concurrent_acquire_shares_one_attempt() {
        let backend = Arc::new(MemoryBackend::new());
        let (accessor, connector, _bus) = accessor(&backend, RetryPolicy::immediate(3));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let accessor = accessor.clone();
                tokio::spawn(async move { accessor.acquire().await.map(|_| ()) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(connector.connects(), 1);
    }

    #[tokio::test]
    async fn test_missing_config_fails_without_attempts() {
        let backend = Arc::new(MemoryBackend::new());
        let connector = Arc::new(MemoryConnector::new(backend));
        let bus = Arc::new(InMemoryEventBus::new());
        let mut sub = bus.subscribe_stream(EventFilter::topics(vec![EventTopic::BackendClientError]));
        let accessor = ClientAccessor::new(
            BackendConfig::new("", ""),
            RetryPolicy::immediate(3),
            connector.clone(),
            bus.clone(),
        );

        let err = accessor.acquire().await.err().unwrap();
        assert!(matches!(err, ConnectivityError::Configuration(_)));
        assert_eq!(connector.connects(), 0);
        assert!(sub.try_recv().unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_then_manual_retry_succeeds() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_times("organizations", Some(TableOp::Select), 3, "connection refused");
        let (accessor, connector, bus) = accessor(&backend, RetryPolicy::default());
        let mut sub = bus.subscribe_stream(EventFilter::topics(vec![
            EventTopic::BackendClientError,
            EventTopic::BackendClientInitialized,
        ]));

        let err = accessor.acquire().await.err().unwrap();
        assert_eq!(err.attempts(), 3);
        assert!(accessor.cached().is_none());
        assert_eq!(connector.connects(), 3);

        let client = accessor.acquire().await.unwrap();
        assert_eq!(connector.connects(), 4);
        assert!(Arc::ptr_eq(&client, &accessor.cached().unwrap()));

        let events = sub.drain();
        assert!(matches!(events[0], SystemEvent::BackendClientError { attempts: 3, .. }));
        assert!(matches!(events[1], SystemEvent::BackendClientInitialized { attempts: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_between_attempts() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_times("organizations", Some(TableOp::Select), 2, "timeout");
        let (accessor, _connector, _bus) = accessor(&backend, RetryPolicy::default());

        let started = tokio::time::Instant::now();
        accessor.acquire().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_reset_forces_new_client() {
        let backend = Arc::new(MemoryBackend::new());
        let (accessor, connector, _bus) = accessor(&backend, RetryPolicy::immediate(3));

        accessor.acquire().await.unwrap();
        accessor.reset();
        assert!(!accessor.is_ready());
        accessor.acquire().await.unwrap();

        assert_eq!(connector.connects(), 2);
    }
}
