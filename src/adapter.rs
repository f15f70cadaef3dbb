//! Consumer-facing adapter
//!
//! Bridges device lifecycle events from the information-model side to the
//! node builder: a registered device gets projected onto the address space,
//! a removed device gets torn down again. Event delivery failures never
//! stop the loop; a device that cannot be built is logged and the adapter
//! keeps serving the rest.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, info, trace};

use crate::builder::NodeBuilder;
use crate::model::Device;

/// Device lifecycle notification
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    Registered(Device),
    Removed(String),
}

/// Source of device lifecycle events
///
/// The substitution seam towards the information-model provider; any
/// discovery mechanism that can yield [`DeviceEvent`]s will do.
#[async_trait]
pub trait DeviceEventSource: Send {
    /// Next event, or `None` when the source is exhausted
    async fn next(&mut self) -> Option<DeviceEvent>;
}

/// Channel-backed event source
pub struct ChannelEventSource {
    rx: mpsc::Receiver<DeviceEvent>,
}

#[async_trait]
impl DeviceEventSource for ChannelEventSource {
    async fn next(&mut self) -> Option<DeviceEvent> {
        self.rx.recv().await
    }
}

/// Create a channel-backed event source and its sender handle
#[must_use]
pub fn channel_source(capacity: usize) -> (mpsc::Sender<DeviceEvent>, ChannelEventSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, ChannelEventSource { rx })
}

/// Drives the node builder from a device event stream
pub struct Adapter {
    builder: NodeBuilder,
}

impl Adapter {
    #[must_use]
    pub fn new(builder: NodeBuilder) -> Self {
        Self { builder }
    }

    /// Consume events until the source closes
    pub async fn run<S: DeviceEventSource>(&self, mut source: S) {
        info!("adapter started");
        while let Some(event) = source.next().await {
            self.handle(&event);
        }
        info!("event source closed; adapter stopped");
    }

    /// Apply a single lifecycle event
    pub fn handle(&self, event: &DeviceEvent) {
        match event {
            DeviceEvent::Registered(device) => {
                trace!(device = %device.meta.id, "device registered event");
                if let Err(e) = self.builder.add_device_node(device) {
                    error!(device = %device.meta.id, error = %e, "failed to project device");
                }
            }
            DeviceEvent::Removed(device_id) => {
                trace!(device = %device_id, "device removed event");
                if let Err(e) = self.builder.delete_device_node(device_id) {
                    error!(device = %device_id, error = %e, "failed to remove device");
                }
            }
        }
    }
}
