/// Dispatcher configuration loaded from environment variables.
///
/// Defaults match a single authorized browser session: one slot, one worker.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Slot capacity: how many submissions may run at once (default: `1`).
    pub max_workers: usize,
    /// Number of worker tasks pulling from the queue (default: `max_workers`).
    ///
    /// Workers beyond `max_workers` only shorten the gap between one job
    /// finishing and the next one starting.
    pub worker_count: usize,
    /// Job records kept before terminal records are evicted (default: `10000`).
    /// `0` disables eviction.
    pub registry_capacity: usize,
    /// Queue depth at which new submissions are refused (default: `0`, unbounded).
    pub max_queue_depth: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_workers: 1,
            worker_count: 1,
            registry_capacity: 10_000,
            max_queue_depth: 0,
        }
    }
}

impl DispatcherConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default         |
    /// |-------------------------|-----------------|
    /// | `MAX_WORKERS`           | `1`             |
    /// | `WORKER_COUNT`          | `MAX_WORKERS`   |
    /// | `JOB_REGISTRY_CAPACITY` | `10000`         |
    /// | `MAX_QUEUE_DEPTH`       | `0` (unbounded) |
    pub fn from_env() -> Self {
        let max_workers: usize = std::env::var("MAX_WORKERS")
            .unwrap_or_else(|_| "1".into())
            .parse()
            .expect("MAX_WORKERS must be a valid usize");

        let worker_count: usize = match std::env::var("WORKER_COUNT") {
            Ok(v) => v.parse().expect("WORKER_COUNT must be a valid usize"),
            Err(_) => max_workers,
        };

        let registry_capacity: usize = std::env::var("JOB_REGISTRY_CAPACITY")
            .unwrap_or_else(|_| "10000".into())
            .parse()
            .expect("JOB_REGISTRY_CAPACITY must be a valid usize");

        let max_queue_depth: usize = std::env::var("MAX_QUEUE_DEPTH")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("MAX_QUEUE_DEPTH must be a valid usize");

        Self {
            max_workers,
            worker_count,
            registry_capacity,
            max_queue_depth,
        }
        .sanitized()
    }

    /// Clamp zero slot or worker counts up to one.
    ///
    /// A pool with no slots or no workers would accept jobs that can never run.
    pub fn sanitized(mut self) -> Self {
        if self.max_workers == 0 {
            tracing::warn!("MAX_WORKERS is 0; using 1");
            self.max_workers = 1;
        }
        if self.worker_count == 0 {
            tracing::warn!("WORKER_COUNT is 0; using 1");
            self.worker_count = 1;
        }
        self
    }
}
