//! Single-field extraction from a parsed document fragment
//!
//! Every field pulled from a listing card or detail panel goes through
//! [`FieldSelector`]. Absence of a node, nested node or numeric match is
//! always `None`, never an error.

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;

/// Locates one field: a tag with a class, optionally followed by a nested tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelector {
    tag: &'static str,
    class: &'static str,
    nested: Option<&'static str>,
}

impl FieldSelector {
    /// `class` may hold several space-separated class names; all must be present
    pub const fn new(tag: &'static str, class: &'static str) -> Self {
        Self {
            tag,
            class,
            nested: None,
        }
    }

    /// Reads from the first `tag` element inside the matched node instead
    pub const fn nested(mut self, tag: &'static str) -> Self {
        self.nested = Some(tag);
        self
    }

    /// CSS form of the outer selector, e.g. `div.price.large`
    pub fn css(&self) -> String {
        let mut css = self.tag.to_string();
        for class in self.class.split_whitespace() {
            css.push('.');
            css.push_str(class);
        }
        css
    }

    /// Selector for the outer node; `None` if the class names are not valid CSS
    pub fn selector(&self) -> Option<Selector> {
        Selector::parse(&self.css()).ok()
    }

    /// Trimmed text of the field, `None` when absent or blank
    pub fn text(&self, fragment: ElementRef<'_>) -> Option<String> {
        let node = self.target(fragment)?;
        let text = node.text().collect::<String>();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// `href` attribute of the field
    pub fn href(&self, fragment: ElementRef<'_>) -> Option<String> {
        self.attr(fragment, "href")
    }

    /// Any attribute of the field
    pub fn attr(&self, fragment: ElementRef<'_>, name: &str) -> Option<String> {
        self.target(fragment)?
            .value()
            .attr(name)
            .map(|value| value.trim().to_string())
    }

    /// First number inside the field's `aria-label`, e.g. "1 of 12 images" -> 1
    pub fn label_count(&self, fragment: ElementRef<'_>) -> Option<u32> {
        let label = self.attr(fragment, "aria-label")?;
        first_number(&label)
    }

    fn target<'a>(&self, fragment: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let outer = fragment.select(&self.selector()?).next()?;
        match self.nested {
            None => Some(outer),
            Some(tag) => {
                let inner = Selector::parse(tag).ok()?;
                outer.select(&inner).next()
            }
        }
    }
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)").expect("static pattern is valid"))
}

/// First run of ASCII digits in `text`
pub fn first_number(text: &str) -> Option<u32> {
    number_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
