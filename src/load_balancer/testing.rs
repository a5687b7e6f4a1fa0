//! In-memory worker stubs for unit tests.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::load_balancer::backend::{Worker, WorkerId};
use crate::worker::{ProcessRequest, WorkerClient, WorkerError};

/// `n` fresh workers at `http://127.0.0.1:9001..`.
pub fn workers(n: usize) -> Vec<Arc<Worker>> {
    (0..n)
        .map(|i| {
            let id = WorkerId::parse(&format!("http://127.0.0.1:{}", 9001 + i)).unwrap();
            Arc::new(Worker::new(id))
        })
        .collect()
}

#[derive(Debug, Clone)]
struct StubWorker {
    healthy: bool,
    cpu: Option<u8>,
    rps: Option<f64>,
    fail_process: bool,
    delay: Duration,
}

impl Default for StubWorker {
    fn default() -> Self {
        Self {
            healthy: true,
            cpu: Some(0),
            rps: Some(0.0),
            fail_process: false,
            delay: Duration::ZERO,
        }
    }
}

type ProcessHook = Box<dyn Fn(&WorkerId) + Send + Sync>;

/// Scriptable [`WorkerClient`]. Unknown workers behave as healthy, idle and
/// successful.
#[derive(Default)]
pub struct StubClient {
    workers: Mutex<HashMap<WorkerId, StubWorker>>,
    processed: Mutex<Vec<WorkerId>>,
    on_process: Mutex<Option<ProcessHook>>,
}

impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, id: &WorkerId, f: impl FnOnce(&mut StubWorker)) {
        let mut workers = self.workers.lock().unwrap();
        f(workers.entry(id.clone()).or_default());
    }

    fn get(&self, id: &WorkerId) -> StubWorker {
        self.workers.lock().unwrap().get(id).cloned().unwrap_or_default()
    }

    pub fn set_healthy(&self, id: &WorkerId, healthy: bool) {
        self.update(id, |w| w.healthy = healthy);
    }

    /// `None` makes the CPU poll fail.
    pub fn set_cpu(&self, id: &WorkerId, cpu: Option<u8>) {
        self.update(id, |w| w.cpu = cpu);
    }

    pub fn set_rps(&self, id: &WorkerId, rps: Option<f64>) {
        self.update(id, |w| w.rps = rps);
    }

    pub fn set_fail_process(&self, id: &WorkerId, fail: bool) {
        self.update(id, |w| w.fail_process = fail);
    }

    pub fn set_delay(&self, id: &WorkerId, delay: Duration) {
        self.update(id, |w| w.delay = delay);
    }

    /// Run `hook` inside every `process` call, before it answers.
    pub fn on_process(&self, hook: impl Fn(&WorkerId) + Send + Sync + 'static) {
        *self.on_process.lock().unwrap() = Some(Box::new(hook));
    }

    /// Workers that received a `process` call, in order.
    pub fn processed(&self) -> Vec<WorkerId> {
        self.processed.lock().unwrap().clone()
    }

    async fn delay(&self, id: &WorkerId) -> StubWorker {
        let w = self.get(id);
        if !w.delay.is_zero() {
            tokio::time::sleep(w.delay).await;
        }
        w
    }
}

impl WorkerClient for StubClient {
    fn health<'a>(&'a self, worker: &'a WorkerId) -> BoxFuture<'a, Result<(), WorkerError>> {
        async move {
            if self.delay(worker).await.healthy {
                Ok(())
            } else {
                Err(WorkerError::Connect("stub: down".into()))
            }
        }
        .boxed()
    }

    fn cpu_usage<'a>(&'a self, worker: &'a WorkerId) -> BoxFuture<'a, Result<u8, WorkerError>> {
        async move {
            self.delay(worker)
                .await
                .cpu
                .ok_or_else(|| WorkerError::Connect("stub: cpu unavailable".into()))
        }
        .boxed()
    }

    fn requests_per_second<'a>(
        &'a self,
        worker: &'a WorkerId,
    ) -> BoxFuture<'a, Result<f64, WorkerError>> {
        async move {
            self.delay(worker)
                .await
                .rps
                .ok_or_else(|| WorkerError::Connect("stub: rps unavailable".into()))
        }
        .boxed()
    }

    fn process<'a>(
        &'a self,
        worker: &'a WorkerId,
        request: ProcessRequest,
    ) -> BoxFuture<'a, Result<serde_json::Value, WorkerError>> {
        async move {
            let w = self.delay(worker).await;
            self.processed.lock().unwrap().push(worker.clone());
            if let Some(hook) = self.on_process.lock().unwrap().as_ref() {
                hook(worker);
            }
            if w.fail_process {
                return Err(WorkerError::Status {
                    status: 500,
                    message: "Internal Server Error".into(),
                });
            }
            Ok(serde_json::json!({
                "message": format!("Processed request with data: {}", request.data),
                "server": worker.as_str(),
            }))
        }
        .boxed()
    }
}
