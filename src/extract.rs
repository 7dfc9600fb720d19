use crate::CapacityError;
use itertools::Itertools;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

const E: &str = "Invalid selector";
lazy_static! {
    static ref SCRIPT: Selector = Selector::parse("script").expect(E);
}

/// Absolute element path, e.g. `/html[1]/body[1]/script[2]`. Each step is
/// the tag name and its 1-based position among same-named element siblings.
pub fn element_path(el: ElementRef) -> String {
    let steps: Vec<String> = std::iter::once(*el)
        .chain(el.ancestors())
        .filter_map(ElementRef::wrap)
        .map(path_step)
        .collect();
    steps.into_iter().rev().join("")
}

fn path_step(el: ElementRef) -> String {
    let name = el.value().name();
    let position = el
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|sibling| sibling.value().name() == name)
        .count()
        + 1;
    format!("/{}[{}]", name, position)
}

/// Keeps everything before the first `marker`.
pub fn truncate_at_marker<'a>(script: &'a str, marker: &str) -> Result<&'a str, CapacityError> {
    match script.find(marker) {
        Some(idx) if !marker.is_empty() => Ok(&script[..idx]),
        _ => Err(CapacityError::MalformedSnippet(marker.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct SnippetExtractor {
    locator: String,
    marker: String,
}

impl SnippetExtractor {
    pub fn new<L: Into<String>, M: Into<String>>(locator: L, marker: M) -> SnippetExtractor {
        SnippetExtractor {
            locator: locator.into(),
            marker: marker.into(),
        }
    }

    /// Raw text of the first script node whose path equals the locator.
    pub fn find_script(&self, doc: &Html) -> Result<String, CapacityError> {
        doc.select(&SCRIPT)
            .find(|el| element_path(*el) == self.locator)
            .map(|el| el.text().collect::<String>())
            .ok_or_else(|| CapacityError::ExtractionNotFound(self.locator.clone()))
    }

    pub fn extract(&self, doc: &Html) -> Result<String, CapacityError> {
        let script = self.find_script(doc)?;
        truncate_at_marker(&script, &self.marker).map(ToString::to_string)
    }
}
