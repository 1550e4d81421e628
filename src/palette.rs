use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use fancy_regex::Regex;

use super::*;

pub const DEFAULT_PALETTE: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#FFD166", "#06D6A0", "#118AB2", "#EF476F", "#073B4C", "#7209B7",
];

const COLOR_CODE_PATTERN: &str = r"^#(?:[0-9A-Fa-f]{3,4}|[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$";

static COLOR_CODE_RE: OnceLock<std::result::Result<Regex, String>> = OnceLock::new();

fn color_code_regex() -> Result<&'static Regex> {
    COLOR_CODE_RE
        .get_or_init(|| Regex::new(COLOR_CODE_PATTERN).map_err(|err| err.to_string()))
        .as_ref()
        .map_err(|err| Error::InvalidColor(format!("color pattern unavailable: {err}")))
}

/// A hex color code such as `#FFD166`.
///
/// The spelling is preserved as given, so the label and the background show
/// the same text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorCode(String);

impl ColorCode {
    pub fn parse(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        let matched = color_code_regex()?
            .is_match(trimmed)
            .map_err(|err| Error::InvalidColor(format!("{code}: {err}")))?;
        if !matched {
            return Err(Error::InvalidColor(code.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ColorCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for ColorCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered, non-empty set of selectable colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<ColorCode>,
}

impl Palette {
    pub fn new(colors: Vec<ColorCode>) -> Result<Self> {
        if colors.is_empty() {
            return Err(Error::EmptyPalette);
        }
        Ok(Self { colors })
    }

    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Result<Self> {
        let colors = codes
            .iter()
            .map(|code| ColorCode::parse(code.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(colors)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    // Always false once constructed.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColorCode> {
        self.colors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorCode> {
        self.colors.iter()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.colors.iter().any(|color| color.as_str() == code)
    }

    /// Color selected by a uniform draw in `[0, 1)`.
    pub fn pick(&self, draw: f64) -> &ColorCode {
        let index = index_for_draw(draw, self.colors.len()).unwrap_or(0);
        &self.colors[index]
    }

    pub fn choose(&self, rng: &mut dyn RandomSource) -> &ColorCode {
        self.pick(rng.next_f64())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE
                .iter()
                .map(|code| ColorCode((*code).to_string()))
                .collect(),
        }
    }
}
