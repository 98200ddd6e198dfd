//! Simulated BACnet device.
//!
//! [`SimulatedDevice`] hosts the objects of a [`DeviceConfig`] and answers
//! Who-Is, ReadProperty, WriteProperty and SubscribeCOV on a [`DataLink`].
//! One datagram is decoded, routed and answered before the next is read.
//! Malformed datagrams and requests for unknown objects are dropped without
//! an answer.

use crate::config::DeviceConfig;
use crate::error::{DeviceError, StoreError};
use crate::object::{build_device, build_object};
use crate::property::Property;
use crate::subscription::{
    CovDelivery, SharedObject, Subscriber, SubscriptionKey, SubscriptionManager,
};
use bacsim_core::apdu::{Apdu, BacnetError, ConfirmedService, SimpleAck, UnconfirmedService};
use bacsim_core::npdu::Npdu;
use bacsim_core::services::i_am::IAmRequest;
use bacsim_core::services::read_property::{
    ReadPropertyAck, ReadPropertyRequest, SERVICE_READ_PROPERTY,
};
use bacsim_core::services::subscribe_cov::{SubscribeCovRequest, SERVICE_SUBSCRIBE_COV};
use bacsim_core::services::write_property::{WritePropertyRequest, SERVICE_WRITE_PROPERTY};
use bacsim_core::types::{
    ErrorClass, ErrorCode, ObjectId, ObjectType, PropertyId, PropertyValue, TypedValue,
};
use bacsim_datalink::{
    decode_message, encode_message, DataLink, DataLinkAddress, DataLinkError, MAX_BIP_FRAME_LEN,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};

/// A simulated BACnet device.
pub struct SimulatedDevice<D: DataLink> {
    device_id: ObjectId,
    vendor_id: u32,
    objects: BTreeMap<ObjectId, SharedObject>,
    subscriptions: SubscriptionManager,
    outbound: Mutex<mpsc::UnboundedReceiver<CovDelivery>>,
    invoke_id: AtomicU8,
    broadcast: DataLinkAddress,
    datalink: D,
}

impl<D: DataLink> SimulatedDevice<D> {
    /// Builds the device object and every configured object.
    pub fn new(config: &DeviceConfig, datalink: D) -> Result<Self, DeviceError> {
        config.validate()?;
        let device_id = config.device_id();

        let mut objects = BTreeMap::new();
        let mut object_list = Vec::with_capacity(config.objects.len());
        for object in &config.objects {
            let store = build_object(object, &config.state_texts)?;
            object_list.push(store.object_id());
            objects.insert(store.object_id(), Arc::new(RwLock::new(store)));
        }
        let device = build_device(config, &object_list)?;
        objects.insert(device_id, Arc::new(RwLock::new(device)));

        let (subscriptions, outbound) = SubscriptionManager::new(device_id);
        log::info!(
            "device {} hosts {} objects",
            device_id.instance(),
            objects.len()
        );
        Ok(Self {
            device_id,
            vendor_id: config.vendor_id,
            objects,
            subscriptions,
            outbound: Mutex::new(outbound),
            invoke_id: AtomicU8::new(0),
            broadcast: DataLinkAddress::local_broadcast(DataLinkAddress::BACNET_IP_DEFAULT_PORT),
            datalink,
        })
    }

    /// Where I-Am announcements go.
    pub fn with_broadcast_address(mut self, address: DataLinkAddress) -> Self {
        self.broadcast = address;
        self
    }

    pub fn device_id(&self) -> ObjectId {
        self.device_id
    }

    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    pub fn object(&self, id: ObjectId) -> Option<SharedObject> {
        self.objects.get(&id).cloned()
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    fn lookup(&self, id: ObjectId) -> Result<&SharedObject, DeviceError> {
        self.objects.get(&id).ok_or(DeviceError::UnknownObject(id))
    }

    /// A snapshot of one property. Unset properties read as Null.
    pub async fn read_property(
        &self,
        object_id: ObjectId,
        property_id: PropertyId,
    ) -> Result<PropertyValue, DeviceError> {
        let store = self.lookup(object_id)?.read().await;
        Ok(store.get(property_id).payload)
    }

    /// Writes through the object's `Set` pipeline, as a WriteProperty
    /// request would.
    pub async fn write_property(
        &self,
        object_id: ObjectId,
        property_id: PropertyId,
        value: TypedValue,
        priority: Option<u32>,
    ) -> Result<(), DeviceError> {
        let mut property = Property::new(property_id, value);
        property.priority = priority;
        self.lookup(object_id)?.write().await.set(property)?;
        Ok(())
    }

    /// Commits a value directly and notifies observers, bypassing write
    /// checks. Simulated sensors drive their inputs through this.
    pub async fn update_property(
        &self,
        object_id: ObjectId,
        property_id: PropertyId,
        value: TypedValue,
    ) -> Result<(), DeviceError> {
        self.lookup(object_id)?
            .write()
            .await
            .update(Property::new(property_id, value), true)?;
        Ok(())
    }

    /// Broadcasts an I-Am for this device.
    pub async fn announce(&self) -> Result<(), DeviceError> {
        let i_am = self.i_am();
        self.send(self.broadcast, &Npdu::global_broadcast(), &i_am)
            .await
    }

    /// Announces the device, then serves requests and delivers COV
    /// notifications until the data link closes.
    pub async fn run(&self) -> Result<(), DeviceError> {
        if let Err(e) = self.announce().await {
            log::warn!("I-Am announcement to {} failed: {e}", self.broadcast);
        }
        let mut outbound = self.outbound.lock().await;
        let mut buf = [0u8; MAX_BIP_FRAME_LEN];
        loop {
            tokio::select! {
                received = self.datalink.recv(&mut buf) => match received {
                    Ok((n, source)) => {
                        if let Err(e) = self.handle_frame(&buf[..n], source).await {
                            log::warn!("failed to answer {source}: {e}");
                        }
                    }
                    Err(e) if e.is_fatal() => {
                        log::info!("{e}, device {} stopping", self.device_id.instance());
                        return Ok(());
                    }
                    Err(e @ DataLinkError::Io(_)) => log::error!("receive failed: {e}"),
                    Err(e) => log::warn!("dropped datagram: {e}"),
                },
                Some(delivery) = outbound.recv() => {
                    if let Err(e) = self.deliver(delivery).await {
                        log::warn!("failed to send COV notification: {e}");
                    }
                }
            }
        }
    }

    pub(crate) async fn handle_frame(
        &self,
        frame: &[u8],
        source: DataLinkAddress,
    ) -> Result<(), DeviceError> {
        let (npdu, apdu) = match decode_message(frame) {
            Ok(message) => message,
            Err(e) if e.cause.is_unsupported() => {
                log::debug!("ignored datagram from {source}: {e}");
                return Ok(());
            }
            Err(e) => {
                log::warn!("dropped datagram from {source}: {e}");
                return Ok(());
            }
        };
        let reply = Npdu::reply_to(&npdu);

        match apdu {
            Apdu::UnconfirmedRequest(UnconfirmedService::WhoIs(who_is)) => {
                if who_is.matches(self.device_id.instance()) {
                    self.send(source, &reply, &self.i_am()).await?;
                }
            }
            Apdu::ConfirmedRequest { header, service } => {
                let invoke_id = header.invoke_id;
                let answer = match service {
                    ConfirmedService::ReadProperty(req) => self.read(invoke_id, req).await,
                    ConfirmedService::WriteProperty(req) => self.write(invoke_id, req).await,
                    ConfirmedService::SubscribeCov(req) => {
                        let subscriber = Subscriber {
                            address: source,
                            npdu: reply,
                        };
                        self.subscribe(invoke_id, req, subscriber).await
                    }
                    ConfirmedService::CovNotification(_) => None,
                };
                if let Some(answer) = answer {
                    self.send(source, &reply, &answer).await?;
                }
            }
            other => log::debug!("ignored {} from {source}", other.service_name()),
        }
        Ok(())
    }

    async fn read(&self, invoke_id: u8, req: ReadPropertyRequest) -> Option<Apdu> {
        let Some(object) = self.objects.get(&req.object_id) else {
            log::debug!("ReadProperty for unknown object {}", req.object_id);
            return None;
        };
        let element = object
            .read()
            .await
            .read_element(req.property_id, req.array_index);
        Some(match element {
            Ok(value) => Apdu::ComplexAck {
                invoke_id,
                ack: ReadPropertyAck {
                    object_id: req.object_id,
                    property_id: req.property_id,
                    array_index: req.array_index,
                    value,
                },
            },
            Err(e) => store_error(invoke_id, SERVICE_READ_PROPERTY, e),
        })
    }

    async fn write(&self, invoke_id: u8, req: WritePropertyRequest) -> Option<Apdu> {
        let Some(object) = self.objects.get(&req.object_id) else {
            log::debug!("WriteProperty for unknown object {}", req.object_id);
            return None;
        };
        let mut store = object.write().await;
        let result = match req.array_index {
            Some(_) if store.get(req.property_id).payload.as_list().is_some() => {
                Err(StoreError::WriteAccessDenied(req.property_id))
            }
            Some(_) => Err(StoreError::PropertyIsNotAnArray(req.property_id)),
            None => {
                let mut property = Property::new(req.property_id, req.value);
                property.priority = req.priority;
                store.set(property)
            }
        };
        Some(match result {
            Ok(()) => Apdu::SimpleAck(SimpleAck {
                invoke_id,
                service_choice: SERVICE_WRITE_PROPERTY,
            }),
            Err(e) => {
                log::debug!("rejected write to {} {:?}: {e}", req.object_id, req.property_id);
                store_error(invoke_id, SERVICE_WRITE_PROPERTY, e)
            }
        })
    }

    async fn subscribe(
        &self,
        invoke_id: u8,
        req: SubscribeCovRequest,
        subscriber: Subscriber,
    ) -> Option<Apdu> {
        let Some(object) = self.objects.get(&req.monitored_object_id) else {
            log::debug!("SubscribeCOV for unknown object {}", req.monitored_object_id);
            return None;
        };
        if req.monitored_object_id.object_type() == ObjectType::Device {
            return Some(Apdu::Error(BacnetError::new(
                invoke_id,
                SERVICE_SUBSCRIBE_COV,
                ErrorClass::Services,
                ErrorCode::OptionalFunctionalityNotSupported,
            )));
        }

        let key = SubscriptionKey {
            object_id: req.monitored_object_id,
            process_id: req.subscriber_process_id,
        };
        if req.is_cancellation() {
            self.subscriptions.unsubscribe(key).await;
        } else {
            let lifetime = req
                .lifetime_seconds
                .filter(|s| *s > 0)
                .map(|s| Duration::from_secs(u64::from(s)));
            self.subscriptions
                .subscribe(
                    key,
                    object.clone(),
                    subscriber,
                    req.issue_confirmed_notifications.unwrap_or(false),
                    lifetime,
                )
                .await;
        }
        Some(Apdu::SimpleAck(SimpleAck {
            invoke_id,
            service_choice: SERVICE_SUBSCRIBE_COV,
        }))
    }

    async fn deliver(&self, delivery: CovDelivery) -> Result<(), DeviceError> {
        let CovDelivery {
            subscriber,
            confirmed,
            notification,
        } = delivery;
        let apdu = if confirmed {
            let invoke_id = self.invoke_id.fetch_add(1, Ordering::Relaxed);
            Apdu::confirmed(invoke_id, ConfirmedService::CovNotification(notification))
        } else {
            Apdu::unconfirmed(UnconfirmedService::CovNotification(notification))
        };
        let npdu = subscriber.npdu.with_expecting_reply(confirmed);
        self.send(subscriber.address, &npdu, &apdu).await
    }

    fn i_am(&self) -> Apdu {
        Apdu::unconfirmed(UnconfirmedService::IAm(IAmRequest::for_device(
            self.device_id.instance(),
            self.vendor_id,
        )))
    }

    async fn send(
        &self,
        target: DataLinkAddress,
        npdu: &Npdu,
        apdu: &Apdu,
    ) -> Result<(), DeviceError> {
        let mut buf = [0u8; MAX_BIP_FRAME_LEN];
        let n = encode_message(npdu, apdu, &mut buf)?;
        log::debug!("sending {} to {target}", apdu.service_name());
        self.datalink.send(target, &buf[..n]).await?;
        Ok(())
    }
}

fn store_error(invoke_id: u8, service_choice: u8, err: StoreError) -> Apdu {
    let (class, code) = err.to_bacnet();
    Apdu::Error(BacnetError::new(invoke_id, service_choice, class, code))
}
