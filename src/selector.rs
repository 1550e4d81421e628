use std::iter::Peekable;
use std::str::Chars;

use super::dom::{Dom, Element};
use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrTest {
    Present(String),
    Equals(String, String),
}

/// A compound selector such as `button.primary[type="button"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    any: bool,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn id_only(&self) -> Option<&str> {
        let bare = !self.any && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty();
        if bare { self.id.as_deref() } else { None }
    }

    fn matches(&self, element: &Element) -> bool {
        self.tag
            .as_deref()
            .is_none_or(|tag| element.tag_name.eq_ignore_ascii_case(tag))
            && self.id.as_deref().is_none_or(|id| element.attr("id") == Some(id))
            && self.classes.iter().all(|class| element.has_class(class))
            && self.attrs.iter().all(|test| match test {
                AttrTest::Present(name) => element.attr(name).is_some(),
                AttrTest::Equals(name, value) => element.attr(name) == Some(value.as_str()),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

/// Compound selectors left to right. `links[i]` joins `compounds[i]` to
/// `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Complex {
    compounds: Vec<Compound>,
    links: Vec<Combinator>,
}

/// Parses a comma-separated selector list in a single pass.
pub(crate) fn parse_selector_list(source: &str) -> Result<Vec<Complex>> {
    SelectorScanner {
        source,
        chars: source.chars().peekable(),
    }
    .selector_list()
}

struct SelectorScanner<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
}

impl SelectorScanner<'_> {
    fn reject(&self) -> Error {
        Error::UnsupportedSelector(self.source.to_string())
    }

    fn skip_spaces(&mut self) -> bool {
        let mut skipped = false;
        while self.chars.next_if(char::is_ascii_whitespace).is_some() {
            skipped = true;
        }
        skipped
    }

    fn take_while(&mut self, accept: fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(ch) = self.chars.next_if(|ch| accept(*ch)) {
            out.push(ch);
        }
        out
    }

    fn ident(&mut self) -> Result<String> {
        let ident = self.take_while(is_ident_char);
        if ident.is_empty() {
            return Err(self.reject());
        }
        Ok(ident)
    }

    fn selector_list(mut self) -> Result<Vec<Complex>> {
        let mut list = Vec::new();
        loop {
            self.skip_spaces();
            list.push(self.complex()?);
            match self.chars.next() {
                None => return Ok(list),
                Some(',') => {}
                Some(_) => return Err(self.reject()),
            }
        }
    }

    /// Stops before `,` or at the end of input.
    fn complex(&mut self) -> Result<Complex> {
        let mut complex = Complex {
            compounds: vec![self.compound()?],
            links: Vec::new(),
        };
        loop {
            let spaced = self.skip_spaces();
            let link = match self.chars.peek() {
                None | Some(',') => return Ok(complex),
                Some('>') => {
                    self.chars.next();
                    self.skip_spaces();
                    Combinator::Child
                }
                Some(_) if spaced => Combinator::Descendant,
                Some(_) => return Err(self.reject()),
            };
            complex.links.push(link);
            complex.compounds.push(self.compound()?);
        }
    }

    fn compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut consumed = false;

        if self.chars.next_if_eq(&'*').is_some() {
            compound.any = true;
            consumed = true;
        } else if self.chars.peek().copied().is_some_and(is_ident_char) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
            consumed = true;
        }

        loop {
            match self.chars.peek() {
                Some('#') => {
                    self.chars.next();
                    let id = self.ident()?;
                    if compound.id.replace(id).is_some() {
                        return Err(self.reject());
                    }
                }
                Some('.') => {
                    self.chars.next();
                    let class = self.ident()?;
                    compound.classes.push(class);
                }
                Some('[') => {
                    self.chars.next();
                    let test = self.attr_test()?;
                    compound.attrs.push(test);
                }
                _ => break,
            }
            consumed = true;
        }

        if !consumed {
            return Err(self.reject());
        }
        Ok(compound)
    }

    /// Parses the inside of `[...]`, consuming the closing bracket.
    fn attr_test(&mut self) -> Result<AttrTest> {
        self.skip_spaces();
        let name = self.take_while(is_attr_name_char).to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.reject());
        }
        self.skip_spaces();
        match self.chars.next() {
            Some(']') => return Ok(AttrTest::Present(name)),
            Some('=') => {}
            _ => return Err(self.reject()),
        }
        self.skip_spaces();

        let value = match self.chars.next_if(|ch| *ch == '"' || *ch == '\'') {
            Some(quote) => {
                let mut value = String::new();
                loop {
                    match self.chars.next() {
                        Some(ch) if ch == quote => break value,
                        Some(ch) => value.push(ch),
                        None => return Err(self.reject()),
                    }
                }
            }
            None => self.take_while(|ch| !ch.is_ascii_whitespace() && ch != ']'),
        };

        self.skip_spaces();
        if self.chars.next() != Some(']') {
            return Err(self.reject());
        }
        Ok(AttrTest::Equals(name, value))
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn is_attr_name_char(ch: char) -> bool {
    is_ident_char(ch) || ch == ':'
}

impl Dom {
    /// First match in document order. A bare `#id` goes through the id index.
    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let list = parse_selector_list(selector)?;
        if let [complex] = list.as_slice() {
            if let [compound] = complex.compounds.as_slice() {
                if let Some(id) = compound.id_only() {
                    return Ok(self.by_id(id));
                }
            }
        }
        Ok(self.matching_elements(&list).into_iter().next())
    }

    fn matching_elements(&self, list: &[Complex]) -> Vec<NodeId> {
        let mut elements = Vec::new();
        self.collect_elements_dfs(self.root, &mut elements);
        elements.retain(|node| {
            list.iter().any(|complex| {
                self.matches_compound_at(*node, complex, complex.compounds.len() - 1)
            })
        });
        elements
    }

    /// Whether `node` matches `complex.compounds[index]` with everything to its
    /// left satisfied by its ancestors.
    fn matches_compound_at(&self, node: NodeId, complex: &Complex, index: usize) -> bool {
        let matched = self
            .element(node)
            .is_some_and(|element| complex.compounds[index].matches(element));
        if !matched {
            return false;
        }
        let Some(left) = index.checked_sub(1) else {
            return true;
        };
        match complex.links[left] {
            Combinator::Child => self
                .parent(node)
                .is_some_and(|parent| self.matches_compound_at(parent, complex, left)),
            Combinator::Descendant => {
                std::iter::successors(self.parent(node), |ancestor| self.parent(*ancestor))
                    .any(|ancestor| self.matches_compound_at(ancestor, complex, left))
            }
        }
    }
}
