use std::rc::Rc;

use super::*;

pub const DEFAULT_ELEMENT_ID: &str = "colorButton";
pub const DEFAULT_LABEL_PREFIX: &str = "Color: ";

// Ids this close to the expected one are reported as likely typos.
const SUGGESTION_MAX_DISTANCE: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorButtonConfig {
    element_id: String,
    label_prefix: String,
    palette: Palette,
}

impl Default for ColorButtonConfig {
    fn default() -> Self {
        Self {
            element_id: DEFAULT_ELEMENT_ID.to_string(),
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            palette: Palette::default(),
        }
    }
}

impl ColorButtonConfig {
    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = element_id.into();
        self
    }

    pub fn with_label_prefix(mut self, label_prefix: impl Into<String>) -> Self {
        self.label_prefix = label_prefix.into();
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn label_prefix(&self) -> &str {
        &self.label_prefix
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn label_for(&self, color: &ColorCode) -> String {
        format!("{}{}", self.label_prefix, color)
    }
}

/// Page script that binds the color picker to the configured button once the
/// document has been parsed.
#[derive(Debug, Clone, Default)]
pub struct ColorButtonScript {
    config: Rc<ColorButtonConfig>,
}

impl ColorButtonScript {
    pub fn new(config: ColorButtonConfig) -> Self {
        Self {
            config: Rc::new(config),
        }
    }

    pub fn config(&self) -> &ColorButtonConfig {
        &self.config
    }
}

impl PageScript for ColorButtonScript {
    fn name(&self) -> &str {
        "color-button"
    }

    fn install(&self, page: &mut Page) -> Result<()> {
        let config = Rc::clone(&self.config);
        let document = page.document();
        page.add_event_listener_fn(document, "DOMContentLoaded", false, move |page, _event| {
            initialize(page, &config)
        })?;
        Ok(())
    }
}

fn initialize(page: &mut Page, config: &Rc<ColorButtonConfig>) -> Result<()> {
    page.console_log("DOM fully loaded");

    let Some(button) = page.get_element_by_id(config.element_id()) else {
        report_missing_element(page, config);
        return Ok(());
    };

    page.console_log("Button found successfully!");
    page.add_event_listener(button, "click", false, ColorPicker::new(button, Rc::clone(config)))?;
    Ok(())
}

fn report_missing_element(page: &mut Page, config: &ColorButtonConfig) {
    let expected = config.element_id();
    page.console_error(format!(
        "ERROR: Could not find button with ID \"{expected}\""
    ));
    page.console_error("Check if the HTML button ID matches the ID the script looks up");
    if let Some(candidate) = closest_id(expected, &page.element_ids()) {
        page.console_warn(format!("Did you mean \"{candidate}\"?"));
    }
}

/// Click responder: paints the page background with a random palette color
/// and mirrors the choice in the button label.
#[derive(Debug, Clone)]
pub struct ColorPicker {
    target: NodeId,
    config: Rc<ColorButtonConfig>,
}

impl ColorPicker {
    pub fn new(target: NodeId, config: Rc<ColorButtonConfig>) -> Self {
        Self { target, config }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Applies the color selected by `draw` and returns it.
    pub fn apply(&self, page: &mut Page, draw: f64) -> Result<ColorCode> {
        let color = self.config.palette().pick(draw).clone();
        let body = page
            .body()
            .ok_or_else(|| Error::ScriptRuntime("document has no body".into()))?;
        page.set_style_property(body, "background-color", color.as_str())?;
        page.set_text_content(self.target, &self.config.label_for(&color))?;
        Ok(color)
    }
}

impl EventHandler for ColorPicker {
    fn handle_event(&self, page: &mut Page, _event: &mut EventState) -> Result<()> {
        page.console_log("Button clicked!");
        let draw = page.random_f64();
        let color = self.apply(page, draw)?;
        page.console_log(format!("Background color changed to: {color}"));
        Ok(())
    }
}

/// Nearest id within [`SUGGESTION_MAX_DISTANCE`] edits, first in document
/// order on ties. An exact match is never suggested.
fn closest_id(expected: &str, ids: &[String]) -> Option<String> {
    let mut best: Option<(usize, &String)> = None;
    for id in ids {
        if id == expected {
            continue;
        }
        let distance = edit_distance(expected, id);
        if distance > SUGGESTION_MAX_DISTANCE {
            continue;
        }
        if best.is_none_or(|(current, _)| distance < current) {
            best = Some((distance, id));
        }
    }
    best.map(|(_, id)| id.clone())
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
