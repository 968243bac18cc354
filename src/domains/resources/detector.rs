//! Resource list change detection.
//!
//! Once armed, a single background task fingerprints the catalog on a fixed
//! period and broadcasts a [`ResourceListChanged`] event whenever the
//! fingerprint moves. Sessions turn each event into a
//! `notifications/resources/list_changed` message for their peer. Ticks run
//! sequentially inside that task.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

use super::catalog::{ResourceCatalog, Resources};

/// Default polling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30_000);

/// The resource listing changed since the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceListChanged;

/// Last observed fingerprint, owned by the detector task.
#[derive(Debug, Default)]
pub struct DetectorState {
    last_hash: Option<String>,
}

impl DetectorState {
    /// Start from a known baseline.
    pub fn with_baseline(last_hash: Option<String>) -> Self {
        Self { last_hash }
    }

    /// Record a fingerprint; returns `true` when a notification is due.
    ///
    /// Without a baseline the fingerprint is adopted silently.
    pub fn observe(&mut self, fingerprint: String) -> bool {
        match &self.last_hash {
            Some(last) if *last == fingerprint => false,
            Some(_) => {
                self.last_hash = Some(fingerprint);
                true
            }
            None => {
                self.last_hash = Some(fingerprint);
                false
            }
        }
    }
}

/// Polls the resource catalog and announces list changes.
pub struct ChangeDetector {
    resources: Arc<Resources>,
    period: Duration,
    notifications: broadcast::Sender<ResourceListChanged>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChangeDetector {
    /// Create an idle detector.
    pub fn new(
        resources: Arc<Resources>,
        period: Duration,
        notifications: broadcast::Sender<ResourceListChanged>,
    ) -> Self {
        Self {
            resources,
            period,
            notifications,
            task: Mutex::new(None),
        }
    }

    /// Whether the polling task is running.
    pub fn is_armed(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Start polling. Returns `false` when already armed or when no resource
    /// type is configured; never starts a second timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn arm(&self) -> bool {
        if !self.resources.has_types() {
            debug!("No resource types configured; change detection stays idle");
            return false;
        }

        let mut task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if task.is_some() {
            debug!("Change detector already armed");
            return false;
        }

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let resources = Arc::clone(&self.resources);
        let sender = self.notifications.clone();
        *task = Some(tokio::spawn(async move {
            let Some(catalog) = resources.catalog() else {
                return;
            };

            let mut state = DetectorState::with_baseline(fingerprint(catalog).await);
            loop {
                ticker.tick().await;
                tick(catalog, &mut state, &sender).await;
            }
        }));

        info!(
            "Resource change detection armed (every {} ms)",
            self.period.as_millis()
        );
        true
    }
}

impl Drop for ChangeDetector {
    fn drop(&mut self) {
        let task = self
            .task
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}

async fn fingerprint(catalog: &ResourceCatalog) -> Option<String> {
    match catalog.fingerprint().await {
        Ok(hash) => Some(hash),
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

/// One polling step: fingerprint, compare, notify.
async fn tick(
    catalog: &ResourceCatalog,
    state: &mut DetectorState,
    sender: &broadcast::Sender<ResourceListChanged>,
) {
    let Some(hash) = fingerprint(catalog).await else {
        return;
    };
    if !state.observe(hash) {
        return;
    }

    debug!("Resource list changed");
    if let Err(e) = sender.send(ResourceListChanged) {
        error!("Failed to send notification: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::resources::{
        DEFAULT_PATH_TEMPLATE, DEFAULT_URI_ROOT, ReadResourceParams, ResourceDescriptor,
        ResourceType, ResourceUriSpec,
    };
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns scripted hashes, repeating the last one when exhausted.
    /// A `None` step fails the hash.
    struct ScriptedType {
        hashes: Mutex<VecDeque<Option<&'static str>>>,
        calls: AtomicUsize,
    }

    impl ScriptedType {
        fn new(hashes: &[&'static str]) -> Self {
            Self::with_failures(&hashes.iter().copied().map(Some).collect::<Vec<_>>())
        }

        fn with_failures(hashes: &[Option<&'static str>]) -> Self {
            Self {
                hashes: Mutex::new(hashes.iter().copied().collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ResourceType for ScriptedType {
        fn name(&self) -> &str {
            "scripted"
        }

        fn mime_type(&self) -> &str {
            "text/plain"
        }

        async fn list(&self) -> anyhow::Result<Vec<ResourceDescriptor>> {
            Ok(Vec::new())
        }

        async fn read(&self, _params: &ReadResourceParams) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }

        async fn hash(&self) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut hashes = self.hashes.lock().unwrap();
            let step = if hashes.len() > 1 {
                hashes.pop_front()
            } else {
                hashes.front().copied()
            };
            match step {
                Some(Some(hash)) => Ok(hash.to_string()),
                Some(None) => anyhow::bail!("listing unavailable"),
                None => Ok("empty".to_string()),
            }
        }
    }

    fn resources(scripted: Arc<ScriptedType>) -> Arc<Resources> {
        let spec = ResourceUriSpec::new(DEFAULT_URI_ROOT, DEFAULT_PATH_TEMPLATE).unwrap();
        Arc::new(Resources::Configured(ResourceCatalog::new(
            spec,
            [scripted as Arc<dyn ResourceType>],
        )))
    }

    const PERIOD: Duration = Duration::from_millis(100);

    #[test]
    fn test_state_sequence_notifies_twice() {
        let mut state = DetectorState::with_baseline(Some("h1".to_string()));
        let notified = ["h1", "h1", "h2", "h2", "h3"]
            .into_iter()
            .filter(|h| state.observe(h.to_string()))
            .count();
        assert_eq!(notified, 2);
    }

    #[test]
    fn test_state_without_baseline_adopts_silently() {
        let mut state = DetectorState::default();
        assert!(!state.observe("h1".to_string()));
        assert!(!state.observe("h1".to_string()));
        assert!(state.observe("h2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_detector_emits_on_change() {
        let scripted = Arc::new(ScriptedType::new(&["h1", "h1", "h1", "h2", "h2", "h3"]));
        let (tx, mut rx) = broadcast::channel(16);
        let detector = ChangeDetector::new(resources(scripted), PERIOD, tx);

        assert!(detector.arm());
        tokio::time::sleep(PERIOD * 5 + PERIOD / 2).await;

        let mut received = 0;
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event, ResourceListChanged);
            received += 1;
        }
        assert_eq!(received, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_hash_is_skipped() {
        let scripted = Arc::new(ScriptedType::with_failures(&[Some("h1"), None, Some("h2")]));
        let (tx, mut rx) = broadcast::channel(16);
        let detector = ChangeDetector::new(resources(scripted.clone()), PERIOD, tx);

        assert!(detector.arm());
        tokio::time::sleep(PERIOD * 4 + PERIOD / 2).await;

        assert!(scripted.calls.load(Ordering::SeqCst) >= 4);
        assert_eq!(rx.try_recv(), Ok(ResourceListChanged));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_without_listeners_still_advances() {
        let scripted = Arc::new(ScriptedType::new(&["h1", "h2"]));
        let (tx, rx) = broadcast::channel(16);
        drop(rx);
        let detector = ChangeDetector::new(resources(scripted.clone()), PERIOD, tx.clone());

        assert!(detector.arm());
        tokio::time::sleep(PERIOD + PERIOD / 2).await;
        assert_eq!(scripted.calls.load(Ordering::SeqCst), 2);

        let mut rx = tx.subscribe();
        tokio::time::sleep(PERIOD * 2).await;
        assert!(scripted.calls.load(Ordering::SeqCst) >= 4);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_twice_keeps_one_timer() {
        let scripted = Arc::new(ScriptedType::new(&["same"]));
        let (tx, _rx) = broadcast::channel(16);
        let detector = ChangeDetector::new(resources(scripted.clone()), PERIOD, tx);

        assert!(detector.arm());
        assert!(!detector.arm());
        assert!(detector.is_armed());

        tokio::time::sleep(PERIOD * 10 + PERIOD / 2).await;
        let calls = scripted.calls.load(Ordering::SeqCst);
        assert!((10..=12).contains(&calls), "unexpected hash count {calls}");
    }

    #[tokio::test]
    async fn test_no_types_stays_idle() {
        let (tx, _rx) = broadcast::channel(16);
        let detector = ChangeDetector::new(Arc::new(Resources::NoResources), PERIOD, tx);
        assert!(!detector.arm());
        assert!(!detector.is_armed());
    }
}
