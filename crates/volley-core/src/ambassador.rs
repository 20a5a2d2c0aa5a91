//! Receiving side of the federation.
//!
//! The ambassador is shared between the threads delivering federation
//! callbacks and the verdict engine. Interactions of subscribed classes are
//! pushed onto an unbounded channel so producers never block; discovered
//! object instances live in a lock-protected map the engine reads.

use crate::interaction::{same_class, DiscoveredObject, FieldMap, ReceivedInteraction};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Callback sink for one federate.
#[derive(Debug)]
pub struct FederateAmbassador {
    sender: Sender<ReceivedInteraction>,
    interactions: RwLock<Vec<String>>,
    objects: RwLock<HashMap<String, Vec<String>>>,
    discovered: RwLock<HashMap<u64, DiscoveredObject>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FederateAmbassador {
    /// Creates an ambassador and the receiving end of its interaction queue.
    pub fn new() -> (Arc<Self>, Receiver<ReceivedInteraction>) {
        let (sender, receiver) = unbounded();
        let ambassador = Arc::new(Self {
            sender,
            interactions: RwLock::new(Vec::new()),
            objects: RwLock::new(HashMap::new()),
            discovered: RwLock::new(HashMap::new()),
        });
        (ambassador, receiver)
    }

    /// Starts queueing interactions of `class`.
    pub fn subscribe_interaction(&self, class: &str) {
        let mut interactions = write(&self.interactions);
        if !interactions.iter().any(|c| same_class(c, class)) {
            info!(class, "subscribed to interaction class");
            interactions.push(class.to_string());
        }
    }

    /// Starts tracking instances of an object class and the attributes of interest.
    pub fn subscribe_object(&self, class: &str, attributes: Vec<String>) {
        info!(class, attributes = attributes.len(), "subscribed to object class");
        write(&self.objects).insert(class.to_string(), attributes);
    }

    /// Attributes subscribed for an object class.
    pub fn subscribed_attributes(&self, class: &str) -> Option<Vec<String>> {
        read(&self.objects)
            .iter()
            .find(|(c, _)| same_class(c, class))
            .map(|(_, attrs)| attrs.clone())
    }

    fn is_interaction_subscribed(&self, class: &str) -> bool {
        read(&self.interactions).iter().any(|c| same_class(c, class))
    }

    fn is_object_subscribed(&self, class: &str) -> bool {
        read(&self.objects).keys().any(|c| same_class(c, class))
    }

    /// Interaction callback.
    pub fn receive_interaction(&self, interaction: ReceivedInteraction) {
        if !self.is_interaction_subscribed(&interaction.class_name) {
            debug!(class = %interaction.class_name, "interaction of unsubscribed class dropped");
            return;
        }
        debug!(class = %interaction.class_name, fields = interaction.fields.len(), "interaction queued");
        if self.sender.send(interaction).is_err() {
            warn!("interaction queue closed, interaction dropped");
        }
    }

    /// Object discovery callback.
    pub fn discover_object_instance(&self, handle: u64, class_name: &str, instance_name: &str) {
        if !self.is_object_subscribed(class_name) {
            debug!(class = class_name, instance = instance_name, "unsubscribed object ignored");
            return;
        }
        info!(class = class_name, instance = instance_name, handle, "object instance discovered");
        write(&self.discovered).insert(
            handle,
            DiscoveredObject {
                handle,
                class_name: class_name.to_string(),
                instance_name: instance_name.to_string(),
                attributes: None,
            },
        );
    }

    /// Attribute reflection callback; values merge into earlier reflections.
    pub fn reflect_attribute_values(&self, handle: u64, attributes: FieldMap) {
        let mut discovered = write(&self.discovered);
        match discovered.get_mut(&handle) {
            Some(object) => {
                debug!(instance = %object.instance_name, count = attributes.len(), "attributes reflected");
                object.attributes.get_or_insert_with(FieldMap::new).extend(attributes);
            }
            None => debug!(handle, "reflection for unknown object ignored"),
        }
    }

    /// Object removal callback.
    pub fn remove_object_instance(&self, handle: u64) {
        if let Some(object) = write(&self.discovered).remove(&handle) {
            info!(instance = %object.instance_name, handle, "object instance removed");
        }
    }

    /// Snapshot of the discovered instances of a class.
    pub fn discovered_objects(&self, class: &str) -> Vec<DiscoveredObject> {
        let mut objects: Vec<DiscoveredObject> = read(&self.discovered)
            .values()
            .filter(|o| same_class(&o.class_name, class))
            .cloned()
            .collect();
        objects.sort_by_key(|o| o.handle);
        objects
    }

    /// Whether an instance with this name is currently known.
    pub fn is_object_instance_discovered(&self, instance_name: &str) -> bool {
        read(&self.discovered)
            .values()
            .any(|o| o.instance_name == instance_name)
    }
}
