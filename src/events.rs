use std::collections::HashMap;
use std::rc::Rc;

use super::*;

/// Callback attached to a node for one event type.
///
/// Closures with the matching signature implement this trait, so small
/// listeners can be registered inline.
pub trait EventHandler {
    fn handle_event(&self, page: &mut Page, event: &mut EventState) -> Result<()>;
}

impl<F> EventHandler for F
where
    F: Fn(&mut Page, &mut EventState) -> Result<()>,
{
    fn handle_event(&self, page: &mut Page, event: &mut EventState) -> Result<()> {
        self(page, event)
    }
}

#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) capture: bool,
    pub(crate) handler: Rc<dyn EventHandler>,
}

/// Listeners keyed by target node and event type, in registration order.
#[derive(Default, Clone)]
pub(crate) struct ListenerStore {
    by_target: HashMap<(NodeId, String), Vec<Listener>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, event: String, listener: Listener) {
        self.by_target
            .entry((node_id, event))
            .or_default()
            .push(listener);
    }

    /// Removes the first registration of `handler` for this phase.
    pub(crate) fn remove(
        &mut self,
        node_id: NodeId,
        event: &str,
        capture: bool,
        handler: &Rc<dyn EventHandler>,
    ) -> bool {
        let key = (node_id, event.to_string());
        let Some(registered) = self.by_target.get_mut(&key) else {
            return false;
        };
        let found = registered
            .iter()
            .position(|listener| listener.capture == capture && Rc::ptr_eq(&listener.handler, handler));
        if let Some(index) = found {
            registered.remove(index);
        }
        if registered.is_empty() {
            self.by_target.remove(&key);
        }
        found.is_some()
    }

    /// Snapshot of the listeners for one phase.
    pub(crate) fn get(&self, node_id: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.registered(node_id, event)
            .iter()
            .filter(|listener| listener.capture == capture)
            .cloned()
            .collect()
    }

    pub(crate) fn count(&self, node_id: NodeId, event: &str) -> usize {
        self.registered(node_id, event).len()
    }

    fn registered(&self, node_id: NodeId, event: &str) -> &[Listener] {
        self.by_target
            .get(&(node_id, event.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// State of one event as it travels along its propagation path.
#[derive(Debug, Clone)]
pub struct EventState {
    pub(crate) event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) default_prevented: bool,
    pub(crate) propagation_stopped: bool,
    pub(crate) immediate_propagation_stopped: bool,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }
}
