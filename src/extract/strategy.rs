//! Field extraction strategies
//!
//! A strategy knows how one kind of page maps onto the field schema. The
//! extractors only fetch and render documents; what gets pulled out of them is
//! decided here, so site-specific logic can be swapped without touching the
//! session handling.

use crate::config::FieldSpec;
use crate::extract::{ExtractedFields, ExtractionError, PLACEHOLDER};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Maps a parsed document onto a fixed set of fields
pub trait ExtractionStrategy: Send + Sync {
    /// Extracts all fields from the document
    fn extract(&self, document: &Html) -> Result<ExtractedFields, ExtractionError>;

    /// Names of the produced fields, in column order
    fn field_names(&self) -> Vec<String>;
}

/// Parses raw HTML and applies a strategy to it
///
/// The parsed document never outlives this call, which keeps the
/// non-`Send` `Html` out of async state machines.
pub fn apply_strategy(
    strategy: &dyn ExtractionStrategy,
    html: &str,
) -> Result<ExtractedFields, ExtractionError> {
    let document = Html::parse_document(html);
    strategy.extract(&document)
}

/// A compiled field definition
#[derive(Debug)]
struct SelectorField {
    name: String,
    source: String,
    selector: Selector,
    attribute: Option<String>,
    required: bool,
}

/// Strategy driven by one CSS selector per field
///
/// # Extraction Rules
///
/// - The first element matching the selector provides the value
/// - The value is the element's trimmed text, or the trimmed attribute value
///   when an attribute is configured
/// - A missing element (or empty value) on a required field fails the page
/// - A missing element on an optional field yields `"N/A"`
#[derive(Debug)]
pub struct SelectorStrategy {
    fields: Vec<SelectorField>,
}

impl SelectorStrategy {
    /// Compiles the configured field specs
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorStrategy)` - All selectors compiled
    /// * `Err(ConfigError)` - A selector failed to parse
    pub fn from_specs(specs: &[FieldSpec]) -> Result<Self, ConfigError> {
        let fields = specs
            .iter()
            .map(|spec| {
                let selector =
                    Selector::parse(&spec.selector).map_err(|_| ConfigError::InvalidSelector {
                        field: spec.name.clone(),
                        selector: spec.selector.clone(),
                    })?;
                Ok(SelectorField {
                    name: spec.name.trim().to_string(),
                    source: spec.selector.clone(),
                    selector,
                    attribute: spec.attribute.clone(),
                    required: spec.required,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { fields })
    }

    fn read_value(field: &SelectorField, element: ElementRef<'_>) -> Option<String> {
        let value = match &field.attribute {
            Some(attribute) => element.value().attr(attribute)?.trim().to_string(),
            None => element.text().collect::<String>().trim().to_string(),
        };
        Some(value).filter(|v| !v.is_empty())
    }
}

impl ExtractionStrategy for SelectorStrategy {
    fn extract(&self, document: &Html) -> Result<ExtractedFields, ExtractionError> {
        let mut fields = ExtractedFields::new();

        for field in &self.fields {
            let value = document
                .select(&field.selector)
                .next()
                .and_then(|element| Self::read_value(field, element));

            match value {
                Some(value) => fields.insert(field.name.as_str(), value),
                None if field.required => {
                    return Err(ExtractionError::MissingElement {
                        field: field.name.clone(),
                        selector: field.source.clone(),
                    });
                }
                None => fields.insert(field.name.as_str(), PLACEHOLDER),
            }
        }

        Ok(fields)
    }

    fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}
