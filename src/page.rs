use std::fmt;
use std::rc::Rc;

use super::console::ConsoleState;
use super::dom::Dom;
use super::events::{Listener, ListenerStore};
use super::trace::TraceState;
use super::*;

/// Behavior installed into a page before its lifecycle runs.
///
/// Installation typically registers a `DOMContentLoaded` listener on
/// [`Page::document`], mirroring a script placed at the end of the markup.
pub trait PageScript {
    fn name(&self) -> &str;

    fn install(&self, page: &mut Page) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loading => "loading",
            Self::Interactive => "interactive",
            Self::Complete => "complete",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    pub trace: bool,
    pub trace_events: bool,
    pub trace_to_stderr: bool,
    pub trace_log_limit: usize,
    pub console_limit: usize,
    pub console_to_stderr: bool,
    pub random_seed: Option<u64>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            trace: false,
            trace_events: true,
            trace_to_stderr: true,
            trace_log_limit: 10_000,
            console_limit: 10_000,
            console_to_stderr: false,
            random_seed: None,
        }
    }
}

impl PageOptions {
    pub fn validate(&self) -> Result<()> {
        if self.trace_log_limit == 0 {
            return Err(Error::Config(
                "trace_log_limit requires at least 1 entry".into(),
            ));
        }
        if self.console_limit == 0 {
            return Err(Error::Config(
                "console_limit requires at least 1 entry".into(),
            ));
        }
        Ok(())
    }
}

/// Document state as seen by page scripts and their listeners.
pub struct Page {
    pub(crate) dom: Dom,
    listeners: ListenerStore,
    ready_state: ReadyState,
    rng: Box<dyn RandomSource>,
    pub(crate) console: ConsoleState,
    pub(crate) trace: TraceState,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("ready_state", &self.ready_state)
            .field("nodes", &self.dom.nodes.len())
            .finish_non_exhaustive()
    }
}

impl Page {
    pub(crate) fn new(dom: Dom, options: &PageOptions) -> Result<Self> {
        options.validate()?;
        let mut page = Self {
            dom,
            listeners: ListenerStore::default(),
            ready_state: ReadyState::Loading,
            rng: Box::new(XorShiftRandom::default()),
            console: ConsoleState::default(),
            trace: TraceState::default(),
        };
        page.trace.enabled = options.trace;
        page.trace.events = options.trace_events;
        page.trace.to_stderr = options.trace_to_stderr;
        page.trace.set_log_limit(options.trace_log_limit);
        page.console.set_limit(options.console_limit);
        page.console.to_stderr = options.console_to_stderr;
        if let Some(seed) = options.random_seed {
            page.set_random_source(XorShiftRandom::new(seed));
        }
        Ok(page)
    }

    /// Installs scripts in order, then fires `DOMContentLoaded` and `load` on
    /// the document exactly once.
    pub(crate) fn run_lifecycle(&mut self, scripts: &[Box<dyn PageScript>]) -> Result<()> {
        if self.ready_state != ReadyState::Loading {
            return Err(Error::ScriptRuntime(format!(
                "page lifecycle already ran (readyState={})",
                self.ready_state
            )));
        }

        for script in scripts {
            self.trace.line(format!("[script] install {}", script.name()));
            script.install(self)?;
        }

        let document = self.document();
        self.set_ready_state(ReadyState::Interactive);
        self.dispatch_event(document, "DOMContentLoaded")?;
        self.set_ready_state(ReadyState::Complete);
        self.dispatch_event(document, "load")?;
        Ok(())
    }

    fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
        self.trace.line(format!("[lifecycle] readyState={state}"));
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn document(&self) -> NodeId {
        self.dom.root
    }

    pub fn body(&self) -> Option<NodeId> {
        self.dom.body()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.by_id(id)
    }

    /// Every element id in document order.
    pub fn element_ids(&self) -> Vec<String> {
        self.dom.ids()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.dom.tag_name(node)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.dom.attr(node, name)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.check_node(node)?;
        self.dom.set_attr(node, name, value)
    }

    pub fn text_content(&self, node: NodeId) -> Result<String> {
        self.check_node(node)?;
        Ok(self.dom.text_content(node))
    }

    pub fn set_text_content(&mut self, node: NodeId, value: &str) -> Result<()> {
        self.check_node(node)?;
        self.dom.set_text_content(node, value)
    }

    /// Inline style value, or an empty string when unset.
    pub fn style_property(&self, node: NodeId, name: &str) -> Result<String> {
        self.check_node(node)?;
        self.dom.style_get(node, name)
    }

    pub fn set_style_property(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.check_node(node)?;
        self.dom.style_set(node, name, value)
    }

    pub fn add_event_listener<H>(
        &mut self,
        node: NodeId,
        event_type: &str,
        capture: bool,
        handler: H,
    ) -> Result<Rc<dyn EventHandler>>
    where
        H: EventHandler + 'static,
    {
        self.check_node(node)?;
        let handler: Rc<dyn EventHandler> = Rc::new(handler);
        self.listeners.add(
            node,
            event_type.to_string(),
            Listener {
                capture,
                handler: Rc::clone(&handler),
            },
        );
        let label = self.dom.node_label(node);
        self.trace.event_line(format!(
            "[listener] add {event_type} on {label} capture={capture}"
        ));
        Ok(handler)
    }

    /// Closure form of [`Page::add_event_listener`]; parameter types are
    /// inferred from the signature.
    pub fn add_event_listener_fn<F>(
        &mut self,
        node: NodeId,
        event_type: &str,
        capture: bool,
        handler: F,
    ) -> Result<Rc<dyn EventHandler>>
    where
        F: Fn(&mut Page, &mut EventState) -> Result<()> + 'static,
    {
        self.add_event_listener(node, event_type, capture, handler)
    }

    pub fn remove_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        capture: bool,
        handler: &Rc<dyn EventHandler>,
    ) -> bool {
        self.listeners.remove(node, event_type, capture, handler)
    }

    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners.count(node, event_type)
    }

    pub fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<EventState> {
        self.check_node(target)?;
        let mut event = EventState::new(event_type, target);

        let path = self.dom.path_from_root(target);
        let (_, ancestors) = path
            .split_last()
            .ok_or_else(|| Error::ScriptRuntime("event path is empty".into()))?;

        // Capture phase.
        for node in ancestors {
            event.current_target = *node;
            self.invoke_listeners(*node, &mut event, true)?;
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        // Target phase: capture listeners first.
        event.current_target = target;
        self.invoke_listeners(target, &mut event, true)?;
        if event.propagation_stopped {
            self.trace_event_done(&event, "propagation_stopped");
            return Ok(event);
        }

        // Target phase: bubble listeners.
        self.invoke_listeners(target, &mut event, false)?;
        if event.propagation_stopped {
            self.trace_event_done(&event, "propagation_stopped");
            return Ok(event);
        }

        // Bubble phase.
        for node in ancestors.iter().rev() {
            event.current_target = *node;
            self.invoke_listeners(*node, &mut event, false)?;
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn invoke_listeners(
        &mut self,
        node_id: NodeId,
        event: &mut EventState,
        capture: bool,
    ) -> Result<()> {
        let listeners = self.listeners.get(node_id, &event.event_type, capture);
        for listener in listeners {
            if self.trace.enabled {
                let phase = if capture { "capture" } else { "bubble" };
                let target_label = self.dom.node_label(event.target);
                let current_label = self.dom.node_label(event.current_target);
                self.trace.event_line(format!(
                    "[event] {} target={} current={} phase={} default_prevented={}",
                    event.event_type, target_label, current_label, phase, event.default_prevented
                ));
            }
            listener.handler.handle_event(self, event)?;
            if event.immediate_propagation_stopped {
                break;
            }
        }
        Ok(())
    }

    fn trace_event_done(&mut self, event: &EventState, outcome: &str) {
        if !self.trace.enabled {
            return;
        }
        let target_label = self.dom.node_label(event.target);
        self.trace.event_line(format!(
            "[event] done {} target={} outcome={} default_prevented={}",
            event.event_type, target_label, outcome, event.default_prevented
        ));
    }

    pub fn console_log(&mut self, text: impl Into<String>) {
        self.console.push(ConsoleLevel::Log, text.into());
    }

    pub fn console_warn(&mut self, text: impl Into<String>) {
        self.console.push(ConsoleLevel::Warn, text.into());
    }

    pub fn console_error(&mut self, text: impl Into<String>) {
        self.console.push(ConsoleLevel::Error, text.into());
    }

    /// Next uniform draw in `[0, 1)` from the page's random source.
    pub fn random_f64(&mut self) -> f64 {
        self.rng.next_f64()
    }

    pub fn set_random_source<R>(&mut self, source: R)
    where
        R: RandomSource + 'static,
    {
        self.rng = Box::new(source);
    }

    pub(crate) fn set_boxed_random_source(&mut self, source: Box<dyn RandomSource>) {
        self.rng = source;
    }

    fn check_node(&self, node: NodeId) -> Result<()> {
        if self.dom.contains(node) {
            Ok(())
        } else {
            Err(Error::ScriptRuntime(format!("unknown node id {}", node.0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn page(html: &str) -> Result<Page> {
        Page::new(html::parse_html(html)?, &PageOptions::default())
    }

    fn required(page: &Page, id: &str) -> Result<NodeId> {
        page.get_element_by_id(id)
            .ok_or_else(|| Error::SelectorNotFound(format!("#{id}")))
    }

    #[test]
    fn dispatch_runs_capture_target_then_bubble() -> Result<()> {
        let mut page = page("<body><div id='outer'><button id='btn'>x</button></div></body>")?;
        let outer = required(&page, "outer")?;
        let button = required(&page, "btn")?;
        let order = Rc::new(RefCell::new(Vec::new()));

        for (node, capture, label) in [
            (outer, false, "outer-bubble"),
            (button, false, "target-bubble"),
            (button, true, "target-capture"),
            (outer, true, "outer-capture"),
        ] {
            let order = Rc::clone(&order);
            page.add_event_listener_fn(
                node,
                "click",
                capture,
                move |_page: &mut Page, _event: &mut EventState| {
                    order.borrow_mut().push(label);
                    Ok(())
                },
            )?;
        }

        page.dispatch_event(button, "click")?;
        assert_eq!(
            *order.borrow(),
            vec!["outer-capture", "target-capture", "target-bubble", "outer-bubble"]
        );
        Ok(())
    }

    #[test]
    fn stop_propagation_skips_ancestors() -> Result<()> {
        let mut page = page("<body><div id='outer'><button id='btn'>x</button></div></body>")?;
        let outer = required(&page, "outer")?;
        let button = required(&page, "btn")?;
        let hits = Rc::new(RefCell::new(0));

        page.add_event_listener_fn(
            button,
            "click",
            false,
            |_page: &mut Page, event: &mut EventState| {
                event.stop_propagation();
                Ok(())
            },
        )?;
        let counter = Rc::clone(&hits);
        page.add_event_listener_fn(
            outer,
            "click",
            false,
            move |_page: &mut Page, _event: &mut EventState| {
                *counter.borrow_mut() += 1;
                Ok(())
            },
        )?;

        let event = page.dispatch_event(button, "click")?;
        assert!(event.propagation_stopped);
        assert_eq!(*hits.borrow(), 0);
        Ok(())
    }

    #[test]
    fn listener_added_during_dispatch_waits_for_next_event() -> Result<()> {
        let mut page = page("<body><button id='btn'>x</button></body>")?;
        let button = required(&page, "btn")?;
        let hits = Rc::new(RefCell::new(0));

        let counter = Rc::clone(&hits);
        page.add_event_listener_fn(
            button,
            "click",
            false,
            move |page: &mut Page, event: &mut EventState| {
                let counter = Rc::clone(&counter);
                page.add_event_listener_fn(
                    event.target(),
                    "click",
                    false,
                    move |_page: &mut Page, _event: &mut EventState| {
                        *counter.borrow_mut() += 1;
                        Ok(())
                    },
                )?;
                Ok(())
            },
        )?;

        page.dispatch_event(button, "click")?;
        assert_eq!(*hits.borrow(), 0);
        page.dispatch_event(button, "click")?;
        assert_eq!(*hits.borrow(), 1);
        Ok(())
    }

    #[test]
    fn removed_listener_no_longer_runs() -> Result<()> {
        let mut page = page("<body><button id='btn'>x</button></body>")?;
        let button = required(&page, "btn")?;
        let handle = page.add_event_listener_fn(
            button,
            "click",
            false,
            |page: &mut Page, _event: &mut EventState| {
                page.console_log("clicked");
                Ok(())
            },
        )?;
        assert!(page.remove_event_listener(button, "click", false, &handle));
        assert!(!page.remove_event_listener(button, "click", false, &handle));
        page.dispatch_event(button, "click")?;
        assert!(page.console.messages().is_empty());
        Ok(())
    }

    #[test]
    fn lifecycle_runs_once() -> Result<()> {
        let mut page = page("<body></body>")?;
        page.run_lifecycle(&[])?;
        assert_eq!(page.ready_state(), ReadyState::Complete);
        assert!(matches!(
            page.run_lifecycle(&[]),
            Err(Error::ScriptRuntime(_))
        ));
        Ok(())
    }

    #[test]
    fn zero_limits_are_rejected() {
        let options = PageOptions {
            console_limit: 0,
            ..PageOptions::default()
        };
        assert!(matches!(options.validate(), Err(Error::Config(_))));
        let options = PageOptions {
            trace_log_limit: 0,
            ..PageOptions::default()
        };
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn unknown_node_is_a_runtime_error() -> Result<()> {
        let mut page = page("<body></body>")?;
        assert!(matches!(
            page.set_text_content(NodeId(999), "x"),
            Err(Error::ScriptRuntime(_))
        ));
        Ok(())
    }
}
