use super::dom::truncate_chars;
use super::*;

const SNIPPET_MAX_CHARS: usize = 200;

/// Configures a [`Harness`] before the page lifecycle runs.
pub struct HarnessBuilder {
    html: String,
    options: PageOptions,
    color_button: Option<ColorButtonConfig>,
    scripts: Vec<Box<dyn PageScript>>,
    random: Option<Box<dyn RandomSource>>,
}

impl HarnessBuilder {
    fn new(html: &str) -> Self {
        Self {
            html: html.to_string(),
            options: PageOptions::default(),
            color_button: Some(ColorButtonConfig::default()),
            scripts: Vec::new(),
            random: None,
        }
    }

    pub fn options(mut self, options: PageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn trace(mut self, enabled: bool) -> Self {
        self.options.trace = enabled;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.options.random_seed = Some(seed);
        self
    }

    pub fn random_source<R>(mut self, source: R) -> Self
    where
        R: RandomSource + 'static,
    {
        self.random = Some(Box::new(source));
        self
    }

    /// Replays `draws` for every random request, cycling when exhausted.
    pub fn force_random_draws(self, draws: &[f64]) -> Result<Self> {
        Ok(self.random_source(SequenceRandom::new(draws)?))
    }

    pub fn color_button(mut self, config: ColorButtonConfig) -> Self {
        self.color_button = Some(config);
        self
    }

    pub fn without_color_button(mut self) -> Self {
        self.color_button = None;
        self
    }

    /// Extra script, installed after the color button script.
    pub fn script<S>(mut self, script: S) -> Self
    where
        S: PageScript + 'static,
    {
        self.scripts.push(Box::new(script));
        self
    }

    pub fn build(self) -> Result<Harness> {
        let dom = html::parse_html(&self.html)?;
        let mut page = Page::new(dom, &self.options)?;
        if let Some(random) = self.random {
            page.set_boxed_random_source(random);
        }

        let mut scripts: Vec<Box<dyn PageScript>> = Vec::new();
        if let Some(config) = self.color_button {
            scripts.push(Box::new(ColorButtonScript::new(config)));
        }
        scripts.extend(self.scripts);

        page.run_lifecycle(&scripts)?;
        Ok(Harness { page })
    }
}

/// Test driver for a loaded page.
///
/// Elements are addressed with CSS selectors; the first match in document
/// order is used.
#[derive(Debug)]
pub struct Harness {
    page: Page,
}

impl Harness {
    /// Loads `html` with the color button script installed.
    pub fn from_html(html: &str) -> Result<Self> {
        Self::builder(html).build()
    }

    pub fn builder(html: &str) -> HarnessBuilder {
        HarnessBuilder::new(html)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn ready_state(&self) -> ReadyState {
        self.page.ready_state()
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.page.trace.enabled = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.page.trace.to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.page.trace.events = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Config(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.page.trace.set_log_limit(max_entries);
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.page.trace.take()
    }

    pub fn set_console_stderr(&mut self, enabled: bool) {
        self.page.console.to_stderr = enabled;
    }

    pub fn set_console_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Config(
                "set_console_limit requires at least 1 entry".into(),
            ));
        }
        self.page.console.set_limit(max_entries);
        Ok(())
    }

    pub fn console_messages(&self) -> Vec<ConsoleMessage> {
        self.page.console.messages()
    }

    pub fn take_console_messages(&mut self) -> Vec<ConsoleMessage> {
        self.page.console.take()
    }

    pub fn set_random_seed(&mut self, seed: u64) {
        self.page.set_random_source(XorShiftRandom::new(seed));
    }

    pub fn set_random_source<R>(&mut self, source: R)
    where
        R: RandomSource + 'static,
    {
        self.page.set_random_source(source);
    }

    pub fn force_random_draws(&mut self, draws: &[f64]) -> Result<()> {
        self.page.set_random_source(SequenceRandom::new(draws)?);
        Ok(())
    }

    /// Dispatches `click` unless the element is disabled.
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.page.dom.disabled(target) {
            return Ok(());
        }
        self.page.dispatch_event(target, "click")?;
        Ok(())
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.page.dispatch_event(target, event)?;
        Ok(())
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.page.dom.text_content(target))
    }

    pub fn style_property(&self, selector: &str, name: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.page.dom.style_get(target, name)
    }

    /// Inline `background-color` of the body, empty when never set.
    pub fn background_color(&self) -> Result<String> {
        let body = self
            .page
            .body()
            .ok_or_else(|| Error::SelectorNotFound("body".into()))?;
        self.page.dom.style_get(body, "background-color")
    }

    pub fn has_listener(&self, selector: &str, event: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        Ok(self.page.listener_count(target, event) > 0)
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.page.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn assert_background_color(&self, expected: &str) -> Result<()> {
        let actual = self.background_color()?;
        if actual != expected {
            let body = self
                .page
                .body()
                .ok_or_else(|| Error::SelectorNotFound("body".into()))?;
            return Err(Error::AssertionFailed {
                selector: "body".into(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(body),
            });
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.page.dom.dump_node(target))
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.page
            .dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.page.dom.dump_node(node_id), SNIPPET_MAX_CHARS)
    }
}
