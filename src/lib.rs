//! Deterministic page runtime for the random background color button.
//!
//! The host markup is parsed into an in-memory document, the color button
//! behavior is installed as a page script, and the page lifecycle is run to
//! completion. Callers then simulate clicks and inspect the DOM, inline styles
//! and captured console output.
//!
//! ```no_run
//! use color_button::{Harness, Result};
//!
//! fn main() -> Result<()> {
//!     let mut page = Harness::builder(r#"<body><button id="colorButton">Change</button></body>"#)
//!         .force_random_draws(&[0.3])?
//!         .build()?;
//!     page.click("#colorButton")?;
//!     page.assert_background_color("#FFD166")?;
//!     page.assert_text("#colorButton", "Color: #FFD166")?;
//!     Ok(())
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;

mod color_button;
mod console;
mod dom;
mod events;
mod harness;
mod html;
mod page;
mod palette;
mod random;
mod selector;
mod trace;

pub use color_button::{
    ColorButtonConfig, ColorButtonScript, ColorPicker, DEFAULT_ELEMENT_ID, DEFAULT_LABEL_PREFIX,
};
pub use console::{ConsoleLevel, ConsoleMessage};
pub use dom::NodeId;
pub use events::{EventHandler, EventState};
pub use harness::{Harness, HarnessBuilder};
pub use page::{Page, PageOptions, PageScript, ReadyState};
pub use palette::{ColorCode, DEFAULT_PALETTE, Palette};
pub use random::{RandomSource, SequenceRandom, XorShiftRandom, index_for_draw};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    ScriptRuntime(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
    InvalidColor(String),
    EmptyPalette,
    InvalidRandomDraw(String),
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::ScriptRuntime(msg) => write!(f, "script runtime error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
            Self::InvalidColor(code) => write!(f, "invalid color code: {code}"),
            Self::EmptyPalette => write!(f, "palette must contain at least one color"),
            Self::InvalidRandomDraw(draw) => {
                write!(f, "random draw must be within [0, 1): {draw}")
            }
            Self::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests;
