//! Change-of-value subscriptions.
//!
//! Each subscription is a task that waits on its object's COV tick and
//! queues a [`CovDelivery`] for every change, after an initial one carrying
//! the current values. The server loop drains the queue and puts the
//! notifications on the wire.

use crate::store::PropertyStore;
use bacsim_core::npdu::Npdu;
use bacsim_core::services::cov_notification::{CovNotificationRequest, CovPropertyValue};
use bacsim_core::types::{ObjectId, PropertyId};
use bacsim_datalink::DataLinkAddress;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::time::{sleep_until, Instant};

/// An object store shared between the server loop and subscription tasks.
pub type SharedObject = Arc<RwLock<PropertyStore>>;

/// Subscriptions are unique per monitored object and subscriber process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub object_id: ObjectId,
    pub process_id: u32,
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object_id, self.process_id)
    }
}

/// Where notifications for a subscription go.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
    pub address: DataLinkAddress,
    /// Network header for notifications, addressed back to the subscriber's
    /// network when it is remote.
    pub npdu: Npdu,
}

/// A notification ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct CovDelivery {
    pub subscriber: Subscriber,
    pub confirmed: bool,
    pub notification: CovNotificationRequest,
}

/// Stops one subscription and removes it from its manager. Cancelling more
/// than once is a no-op.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

impl CancelHandle {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self(Arc::new(tx)), rx)
    }

    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }
}

#[derive(Debug)]
struct Entry {
    generation: u64,
    cancel: CancelHandle,
}

type Entries = Arc<Mutex<HashMap<SubscriptionKey, Entry>>>;

#[derive(Debug)]
pub struct SubscriptionManager {
    device_id: ObjectId,
    entries: Entries,
    generation: AtomicU64,
    outbound: mpsc::UnboundedSender<CovDelivery>,
}

impl SubscriptionManager {
    /// Creates a manager for the device `device_id` and the receiving end
    /// of its notification queue.
    pub fn new(device_id: ObjectId) -> (Self, mpsc::UnboundedReceiver<CovDelivery>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let manager = Self {
            device_id,
            entries: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
            outbound,
        };
        (manager, rx)
    }

    /// Starts a subscription, replacing any existing one with the same key.
    /// `lifetime` of `None` never expires.
    pub async fn subscribe(
        &self,
        key: SubscriptionKey,
        object: SharedObject,
        subscriber: Subscriber,
        confirmed: bool,
        lifetime: Option<Duration>,
    ) -> CancelHandle {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let (cancel, cancel_rx) = CancelHandle::new();

        let mut entries = self.entries.lock().await;
        let replaced = entries.insert(
            key,
            Entry {
                generation,
                cancel: cancel.clone(),
            },
        );
        if let Some(old) = replaced {
            old.cancel.cancel();
            log::info!("renewed COV subscription {key}");
        } else {
            log::info!("new COV subscription {key} from {}", subscriber.address);
        }
        drop(entries);

        let task = SubscriptionTask {
            key,
            generation,
            device_id: self.device_id,
            object,
            subscriber,
            confirmed,
            expires_at: lifetime.map(|l| Instant::now() + l),
            entries: self.entries.clone(),
            outbound: self.outbound.clone(),
        };
        tokio::spawn(task.run(cancel_rx));
        cancel
    }

    /// Cancels a subscription. Returns `false`, and does nothing else, when
    /// no subscription has the key.
    pub async fn unsubscribe(&self, key: SubscriptionKey) -> bool {
        match self.entries.lock().await.remove(&key) {
            Some(entry) => {
                entry.cancel.cancel();
                log::info!("cancelled COV subscription {key}");
                true
            }
            None => {
                log::debug!("no COV subscription {key} to cancel");
                false
            }
        }
    }

    pub async fn is_active(&self, key: SubscriptionKey) -> bool {
        self.entries.lock().await.contains_key(&key)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

struct SubscriptionTask {
    key: SubscriptionKey,
    generation: u64,
    device_id: ObjectId,
    object: SharedObject,
    subscriber: Subscriber,
    confirmed: bool,
    expires_at: Option<Instant>,
    entries: Entries,
    outbound: mpsc::UnboundedSender<CovDelivery>,
}

impl SubscriptionTask {
    async fn run(self, mut cancel: watch::Receiver<bool>) {
        let mut ticks = self.object.read().await.watch_cov();
        let expires_at = self.expires_at;
        let expiry = async move {
            match expires_at {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(expiry);

        let cancelled = *cancel.borrow();
        if cancelled {
            self.release("cancelled").await;
            return;
        }
        let mut last = cov_values(&*self.object.read().await);
        if !self.notify(last.clone()) {
            self.release("closed").await;
            return;
        }
        let reason = loop {
            tokio::select! {
                _ = cancel.changed() => break "cancelled",
                _ = &mut expiry => break "expired",
                changed = ticks.changed() => {
                    if changed.is_err() {
                        break "closed";
                    }
                    let (values, increment) = {
                        let store = self.object.read().await;
                        (cov_values(&store), store.value(PropertyId::CovIncrement).as_real())
                    };
                    if !exceeds_increment(&last, &values, increment) {
                        continue;
                    }
                    last = values.clone();
                    if !self.notify(values) {
                        break "closed";
                    }
                }
            }
        };
        self.release(reason).await;
    }

    /// Drops this task's registration unless a newer subscription with the
    /// same key has replaced it.
    async fn release(&self, reason: &str) {
        let mut entries = self.entries.lock().await;
        if entries
            .get(&self.key)
            .is_some_and(|e| e.generation == self.generation)
        {
            entries.remove(&self.key);
            log::info!("COV subscription {} {reason}", self.key);
        }
    }

    /// Queues a notification. Returns `false` once nobody drains the queue.
    fn notify(&self, values: Vec<CovPropertyValue>) -> bool {
        let time_remaining_seconds = self
            .expires_at
            .map(|at| at.saturating_duration_since(Instant::now()).as_secs() as u32)
            .unwrap_or(0);
        let delivery = CovDelivery {
            subscriber: self.subscriber.clone(),
            confirmed: self.confirmed,
            notification: CovNotificationRequest {
                subscriber_process_id: self.key.process_id,
                initiating_device_id: self.device_id,
                monitored_object_id: self.key.object_id,
                time_remaining_seconds,
                values,
            },
        };
        self.outbound.send(delivery).is_ok()
    }
}

/// The values a COV notification reports for `store`.
pub fn cov_values(store: &PropertyStore) -> Vec<CovPropertyValue> {
    [PropertyId::PresentValue, PropertyId::StatusFlags]
        .into_iter()
        .map(|id| CovPropertyValue::new(id, store.value(id)))
        .collect()
}

/// Whether `current` differs enough from the `last` reported values. A
/// present-value change smaller than `increment` is not reported unless
/// the status flags changed too.
pub fn exceeds_increment(
    last: &[CovPropertyValue],
    current: &[CovPropertyValue],
    increment: Option<f32>,
) -> bool {
    let Some(increment) = increment.filter(|i| *i > 0.0) else {
        return true;
    };
    let present_value = |values: &[CovPropertyValue]| values.first().and_then(|v| v.value.as_real());
    let flags = |values: &[CovPropertyValue]| values.get(1).map(|v| v.value.clone());
    match (present_value(last), present_value(current)) {
        (Some(a), Some(b)) if flags(last) == flags(current) => (b - a).abs() >= increment,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        exceeds_increment, CovDelivery, SharedObject, Subscriber, SubscriptionKey,
        SubscriptionManager,
    };
    use crate::config::ObjectConfig;
    use crate::object::build_object;
    use crate::property::Property;
    use bacsim_core::npdu::Npdu;
    use bacsim_core::services::cov_notification::CovPropertyValue;
    use bacsim_core::types::{ObjectId, ObjectType, PropertyId, StatusFlags, TypedValue};
    use bacsim_datalink::DataLinkAddress;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{mpsc, RwLock};

    const DEVICE: ObjectId = ObjectId::new(ObjectType::Device, 9);

    fn analog_value() -> SharedObject {
        let store = build_object(
            &ObjectConfig::new(ObjectType::AnalogValue, 1),
            &BTreeMap::new(),
        )
        .unwrap();
        Arc::new(RwLock::new(store))
    }

    fn subscriber() -> Subscriber {
        Subscriber {
            address: DataLinkAddress::Ip("127.0.0.1:47809".parse().unwrap()),
            npdu: Npdu::local(false),
        }
    }

    fn key(object: &SharedObject, process_id: u32) -> SubscriptionKey {
        SubscriptionKey {
            object_id: object.try_read().unwrap().object_id(),
            process_id,
        }
    }

    async fn write_pv(object: &SharedObject, value: f32) {
        object
            .write()
            .await
            .update(Property::new(PropertyId::PresentValue, value), true)
            .unwrap();
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<CovDelivery>) -> Vec<CovDelivery> {
        let mut out = Vec::new();
        while let Ok(d) = rx.try_recv() {
            out.push(d);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn initial_and_change_notifications() {
        let (manager, mut rx) = SubscriptionManager::new(DEVICE);
        let object = analog_value();
        manager
            .subscribe(key(&object, 7), object.clone(), subscriber(), false, None)
            .await;
        settle().await;

        let initial = drain(&mut rx);
        assert_eq!(initial.len(), 1);
        let n = &initial[0].notification;
        assert_eq!(n.subscriber_process_id, 7);
        assert_eq!(n.initiating_device_id, DEVICE);
        assert_eq!(n.time_remaining_seconds, 0);
        assert_eq!(n.values[0].value, TypedValue::Real(0.0));
        assert_eq!(
            n.values[1].value,
            TypedValue::StatusFlags(StatusFlags::default())
        );

        write_pv(&object, 21.5).await;
        settle().await;
        let changes = drain(&mut rx);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].notification.values[0].value, TypedValue::Real(21.5));
        assert!(!changes[0].confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn lifetime_expiry_stops_notifications() {
        let (manager, mut rx) = SubscriptionManager::new(DEVICE);
        let object = analog_value();
        let k = key(&object, 1);
        manager
            .subscribe(k, object.clone(), subscriber(), true, Some(Duration::from_secs(5)))
            .await;
        settle().await;
        let initial = drain(&mut rx);
        assert_eq!(initial[0].notification.time_remaining_seconds, 5);
        assert!(initial[0].confirmed);

        tokio::time::sleep(Duration::from_secs(2)).await;
        write_pv(&object, 1.0).await;
        settle().await;
        assert_eq!(drain(&mut rx).len(), 1);
        assert!(manager.is_active(k).await);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!manager.is_active(k).await);
        write_pv(&object, 2.0).await;
        settle().await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn resubscribe_replaces_and_extends() {
        let (manager, mut rx) = SubscriptionManager::new(DEVICE);
        let object = analog_value();
        let k = key(&object, 3);
        let lifetime = Some(Duration::from_secs(5));

        let first = manager
            .subscribe(k, object.clone(), subscriber(), false, lifetime)
            .await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        manager
            .subscribe(k, object.clone(), subscriber(), false, lifetime)
            .await;
        settle().await;
        assert!(first.is_cancelled());
        assert_eq!(manager.len().await, 1);
        assert_eq!(drain(&mut rx).len(), 2);

        write_pv(&object, 5.0).await;
        settle().await;
        assert_eq!(drain(&mut rx).len(), 1);

        // past the first lifetime, inside the second
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(manager.is_active(k).await);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!manager.is_active(k).await);
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_is_idempotent() {
        let (manager, mut rx) = SubscriptionManager::new(DEVICE);
        let object = analog_value();
        let k = key(&object, 11);

        assert!(!manager.unsubscribe(k).await);

        let handle = manager
            .subscribe(k, object.clone(), subscriber(), false, None)
            .await;
        settle().await;
        drain(&mut rx);

        assert!(manager.unsubscribe(k).await);
        assert!(!manager.unsubscribe(k).await);
        handle.cancel();
        handle.cancel();
        assert!(manager.is_empty().await);

        write_pv(&object, 9.0).await;
        settle().await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_handle_removes_the_subscription() {
        let (manager, mut rx) = SubscriptionManager::new(DEVICE);
        let object = analog_value();
        let k = key(&object, 12);
        let handle = manager
            .subscribe(k, object.clone(), subscriber(), false, None)
            .await;
        settle().await;
        assert_eq!(drain(&mut rx).len(), 1);

        handle.cancel();
        settle().await;
        assert!(!manager.is_active(k).await);
        assert_eq!(manager.len().await, 0);

        write_pv(&object, 3.0).await;
        settle().await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_cancel_keeps_the_newer_subscription() {
        let (manager, mut rx) = SubscriptionManager::new(DEVICE);
        let object = analog_value();
        let k = key(&object, 13);
        let first = manager
            .subscribe(k, object.clone(), subscriber(), false, None)
            .await;
        manager
            .subscribe(k, object.clone(), subscriber(), false, None)
            .await;
        first.cancel();
        settle().await;
        drain(&mut rx);

        assert!(manager.is_active(k).await);
        write_pv(&object, 6.0).await;
        settle().await;
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn small_changes_stay_below_the_cov_increment() {
        let (manager, mut rx) = SubscriptionManager::new(DEVICE);
        let mut config = ObjectConfig::new(ObjectType::AnalogValue, 2);
        config.cov_increment = Some(1.0);
        let object: SharedObject = Arc::new(RwLock::new(
            build_object(&config, &BTreeMap::new()).unwrap(),
        ));
        manager
            .subscribe(key(&object, 4), object.clone(), subscriber(), false, None)
            .await;
        settle().await;
        assert_eq!(drain(&mut rx).len(), 1);

        write_pv(&object, 0.5).await;
        settle().await;
        assert!(drain(&mut rx).is_empty());

        write_pv(&object, 1.25).await;
        settle().await;
        let changes = drain(&mut rx);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].notification.values[0].value, TypedValue::Real(1.25));

        write_pv(&object, 1.5).await;
        settle().await;
        assert!(drain(&mut rx).is_empty());

        // a status flag change is always reported
        object
            .write()
            .await
            .update(Property::new(PropertyId::OutOfService, true), true)
            .unwrap();
        settle().await;
        let changes = drain(&mut rx);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].notification.values[0].value, TypedValue::Real(1.5));
    }

    #[test]
    fn increment_comparison() {
        let values = |pv: f32, oos: bool| {
            let flags = StatusFlags {
                out_of_service: oos,
                ..StatusFlags::default()
            };
            vec![
                CovPropertyValue::new(PropertyId::PresentValue, TypedValue::Real(pv)),
                CovPropertyValue::new(PropertyId::StatusFlags, TypedValue::StatusFlags(flags)),
            ]
        };
        let base = values(10.0, false);
        assert!(exceeds_increment(&base, &values(10.1, false), None));
        assert!(exceeds_increment(&base, &values(10.1, false), Some(0.0)));
        assert!(!exceeds_increment(&base, &values(10.4, false), Some(0.5)));
        assert!(exceeds_increment(&base, &values(9.5, false), Some(0.5)));
        assert!(exceeds_increment(&base, &values(10.0, true), Some(0.5)));
    }

    #[tokio::test(start_paused = true)]
    async fn subscriptions_are_keyed_by_process() {
        let (manager, mut rx) = SubscriptionManager::new(DEVICE);
        let object = analog_value();
        for pid in [1, 2] {
            manager
                .subscribe(key(&object, pid), object.clone(), subscriber(), false, None)
                .await;
        }
        settle().await;
        drain(&mut rx);

        write_pv(&object, 4.0).await;
        settle().await;
        let mut pids: Vec<_> = drain(&mut rx)
            .iter()
            .map(|d| d.notification.subscriber_process_id)
            .collect();
        pids.sort();
        assert_eq!(pids, vec![1, 2]);
    }
}
