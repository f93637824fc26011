//! Bounded worker pool for push deliveries.
//!
//! [`PushDispatcher::submit`] never blocks: jobs go onto a bounded queue and
//! a fixed number of worker tasks drain it. When the queue is full the job
//! is dropped with a warning; the notification itself is already persisted.
//! Each worker runs [`PushDelivery::dispatch`] and forwards its reports to
//! the result channel consumed by [`DeliveryLog`].

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use xsuportal_core::message::NotificationMessage;
use xsuportal_db::models::push_subscription::PushSubscription;

use super::{classify_status, DeliveryError, DeliveryReport, PushTransport};
use crate::cache::AudienceCache;
use crate::config::PushConfig;
use crate::store::NotifierStore;
use crate::vapid::VapidCredentials;

// ---------------------------------------------------------------------------
// PushJob
// ---------------------------------------------------------------------------

/// One stamped message to deliver to every endpoint of one contestant.
#[derive(Debug, Clone)]
pub struct PushJob {
    pub contestant_id: String,
    pub message: NotificationMessage,
    pub credentials: Arc<VapidCredentials>,
}

// ---------------------------------------------------------------------------
// PushDelivery
// ---------------------------------------------------------------------------

/// Delivers a [`PushJob`] to each of the contestant's subscriptions.
pub struct PushDelivery {
    store: Arc<dyn NotifierStore>,
    cache: Arc<AudienceCache>,
    transport: Arc<dyn PushTransport>,
}

impl PushDelivery {
    pub fn new(
        store: Arc<dyn NotifierStore>,
        cache: Arc<AudienceCache>,
        transport: Arc<dyn PushTransport>,
    ) -> Self {
        Self {
            store,
            cache,
            transport,
        }
    }

    /// Send `job` to every endpoint and return one report per attempt.
    ///
    /// A contestant without subscriptions yields no reports. Every endpoint
    /// is tried even if an earlier one failed.
    pub async fn dispatch(&self, job: &PushJob) -> Vec<DeliveryReport> {
        let report = |endpoint: Option<String>, outcome: Result<(), DeliveryError>| DeliveryReport {
            contestant_id: job.contestant_id.clone(),
            notification_id: job.message.id,
            endpoint,
            outcome,
        };

        let subscriptions = match self.subscriptions(&job.contestant_id).await {
            Ok(subs) => subs,
            Err(e) => {
                return vec![report(None, Err(DeliveryError::Subscriptions(e.to_string())))];
            }
        };
        if subscriptions.is_empty() {
            return Vec::new();
        }

        let payload = match job.message.to_base64() {
            Ok(payload) => payload,
            Err(e) => {
                return vec![report(
                    None,
                    Err(DeliveryError::Failed(format!("encode notification: {e}"))),
                )];
            }
        };

        let mut reports = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions.iter() {
            let outcome = match self
                .transport
                .send(&job.credentials, subscription, payload.as_bytes())
                .await
            {
                Ok(status) => classify_status(status),
                Err(e) => Err(DeliveryError::Failed(e.to_string())),
            };
            reports.push(report(Some(subscription.endpoint.clone()), outcome));
        }
        reports
    }

    /// Subscriptions for a contestant, from the cache when possible.
    async fn subscriptions(
        &self,
        contestant_id: &str,
    ) -> Result<Arc<[PushSubscription]>, sqlx::Error> {
        if let Some(hit) = self.cache.get_subscriptions(contestant_id).await {
            return Ok(hit);
        }
        let subs: Arc<[PushSubscription]> =
            self.store.push_subscriptions(contestant_id).await?.into();
        self.cache
            .put_subscriptions(contestant_id, Arc::clone(&subs))
            .await;
        Ok(subs)
    }
}

// ---------------------------------------------------------------------------
// PushDispatcher
// ---------------------------------------------------------------------------

/// Handle for submitting push jobs to the worker pool.
///
/// Cheap to clone. The pool shuts down once every clone is dropped and the
/// queue has drained.
#[derive(Clone)]
pub struct PushDispatcher {
    queue: mpsc::Sender<PushJob>,
}

/// Join handles for the worker pool and, if started, its delivery log.
pub struct DispatcherHandle {
    workers: Vec<JoinHandle<()>>,
    log: Option<JoinHandle<()>>,
}

impl PushDispatcher {
    /// Spawn `config.workers` workers that report into `reports`.
    pub fn start(
        config: &PushConfig,
        delivery: PushDelivery,
        reports: mpsc::UnboundedSender<DeliveryReport>,
    ) -> (Self, DispatcherHandle) {
        let (queue, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let delivery = Arc::new(delivery);

        let workers = (0..config.workers.max(1))
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&receiver),
                    Arc::clone(&delivery),
                    reports.clone(),
                ))
            })
            .collect();

        tracing::info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "Push dispatcher started"
        );

        (Self { queue }, DispatcherHandle { workers, log: None })
    }

    /// Like [`start`](Self::start), with reports consumed by a [`DeliveryLog`].
    pub fn start_logged(config: &PushConfig, delivery: PushDelivery) -> (Self, DispatcherHandle) {
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        let (dispatcher, mut handle) = Self::start(config, delivery, reports_tx);
        handle.log = Some(tokio::spawn(DeliveryLog::run(reports_rx)));
        (dispatcher, handle)
    }

    /// Queue a job without waiting. Returns `false` if it was dropped.
    pub fn submit(&self, job: PushJob) -> bool {
        match self.queue.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                tracing::warn!(
                    contestant_id = %job.contestant_id,
                    notification_id = ?job.message.id,
                    "Push queue full, dropping delivery"
                );
                false
            }
            Err(TrySendError::Closed(job)) => {
                tracing::warn!(
                    contestant_id = %job.contestant_id,
                    notification_id = ?job.message.id,
                    "Push dispatcher stopped, dropping delivery"
                );
                false
            }
        }
    }
}

impl DispatcherHandle {
    /// Wait for the workers (and the log, if any) to finish.
    ///
    /// Returns once every [`PushDispatcher`] clone has been dropped and the
    /// queued jobs have been delivered.
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Push worker panicked");
            }
        }
        if let Some(log) = self.log {
            let _ = log.await;
        }
    }
}

async fn run_worker(
    worker: usize,
    receiver: Arc<Mutex<mpsc::Receiver<PushJob>>>,
    delivery: Arc<PushDelivery>,
    reports: mpsc::UnboundedSender<DeliveryReport>,
) {
    loop {
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };
        let contestant_id = job.contestant_id.clone();
        let notification_id = job.message.id;

        // Each job runs in its own task so a panic costs the job, not the worker.
        let delivery = Arc::clone(&delivery);
        let outcome = tokio::spawn(async move { delivery.dispatch(&job).await }).await;

        match outcome {
            Ok(job_reports) => {
                for report in job_reports {
                    // A closed report channel only means nobody is logging.
                    let _ = reports.send(report);
                }
            }
            Err(e) => tracing::error!(
                worker,
                contestant_id = %contestant_id,
                notification_id = ?notification_id,
                error = %e,
                "Push delivery task panicked"
            ),
        }
    }
    tracing::debug!(worker, "Push worker stopped");
}

// ---------------------------------------------------------------------------
// DeliveryLog
// ---------------------------------------------------------------------------

/// Background consumer that logs every delivery outcome.
pub struct DeliveryLog;

impl DeliveryLog {
    /// Run until every report sender is dropped.
    pub async fn run(mut receiver: mpsc::UnboundedReceiver<DeliveryReport>) {
        while let Some(report) = receiver.recv().await {
            Self::record(&report);
        }
        tracing::debug!("Delivery log closed");
    }

    fn record(report: &DeliveryReport) {
        let endpoint = report.endpoint.as_deref().unwrap_or("-");
        match &report.outcome {
            Ok(()) => tracing::info!(
                contestant_id = %report.contestant_id,
                notification_id = ?report.notification_id,
                endpoint,
                "Web push delivered"
            ),
            Err(e @ (DeliveryError::Expired | DeliveryError::Invalid)) => tracing::warn!(
                contestant_id = %report.contestant_id,
                notification_id = ?report.notification_id,
                endpoint,
                error = %e,
                "Web push rejected by push service"
            ),
            Err(e) => tracing::error!(
                contestant_id = %report.contestant_id,
                notification_id = ?report.notification_id,
                endpoint,
                error = %e,
                "Web push failed"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
