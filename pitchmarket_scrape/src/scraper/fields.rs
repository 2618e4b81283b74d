//! Declarative per-field cell extraction.
//!
//! Each entity extractor owns a table of `FieldSpec` records describing
//! how to pull one field out of a row: which header label to anchor on,
//! how far the data cell sits from that header's column, what to fall
//! back to, and how to turn the cell into a value. Extraction of one
//! field never aborts the row; anything that goes wrong degrades to the
//! spec's default.

use scraper::ElementRef;
use std::collections::BTreeMap;

/// A value pulled out of a single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Text value, with empty strings folded to `None`
    pub fn into_text(self) -> Option<String> {
        match self {
            CellValue::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Cell-to-value conversion applied at the resolved column
pub type Transform = fn(ElementRef) -> Option<CellValue>;

/// How to extract one field from a row
pub struct FieldSpec {
    /// Name of the field in the extracted value bag
    pub field: &'static str,
    /// Normalized header label the column is anchored on
    pub key: &'static str,
    /// Distance from the header's column to the data cell; nonzero when
    /// nested markup shifts body cells relative to the header row
    pub offset: isize,
    pub default: CellValue,
    pub transform: Transform,
}

/// Run a row's cells through a spec table and collect the value bag.
/// A missing header key, an out-of-range index or a failed transform all
/// yield that spec's default.
pub fn extract_row(
    specs: &[FieldSpec],
    headers: &BTreeMap<String, usize>,
    cells: &[ElementRef],
) -> BTreeMap<&'static str, CellValue> {
    let mut bag = BTreeMap::new();

    for spec in specs {
        let value = match headers.get(spec.key) {
            None => spec.default.clone(),
            Some(&index) => {
                let target = index as isize + spec.offset;
                usize::try_from(target)
                    .ok()
                    .and_then(|i| cells.get(i))
                    .and_then(|cell| (spec.transform)(*cell))
                    .unwrap_or_else(|| spec.default.clone())
            }
        };
        bag.insert(spec.field, value);
    }

    bag
}

// Shared transforms. Entity-specific ones live with their spec tables.

/// Whitespace-collapsed text of the whole cell
pub fn cell_text(cell: ElementRef) -> Option<CellValue> {
    let text = collect_text(cell);
    if text.is_empty() {
        None
    } else {
        Some(CellValue::Text(text))
    }
}

/// Text of the first anchor in the cell, preferring its `title`
pub fn anchor_text(cell: ElementRef) -> Option<CellValue> {
    let anchor = first_anchor(cell)?;
    let title = anchor.value().attr("title").map(str::trim).unwrap_or("");
    let text = if title.is_empty() {
        collect_text(anchor)
    } else {
        String::from(title)
    };
    if text.is_empty() {
        None
    } else {
        Some(CellValue::Text(text))
    }
}

/// `href` of the first anchor in the cell
pub fn anchor_href(cell: ElementRef) -> Option<CellValue> {
    let anchor = first_anchor(cell)?;
    anchor
        .value()
        .attr("href")
        .map(|href| CellValue::Text(String::from(href)))
}

/// Integer cell; dots are thousands separators
pub fn int_cell(cell: ElementRef) -> Option<CellValue> {
    let text = collect_text(cell).replace('.', "");
    if text.is_empty() {
        return None;
    }
    Some(CellValue::Int(super::normalize::int_validation(&text, 0)))
}

/// Float cell with decimal-comma and percent tolerance
pub fn float_cell(cell: ElementRef) -> Option<CellValue> {
    let text = collect_text(cell);
    if text.is_empty() {
        return None;
    }
    Some(CellValue::Float(super::normalize::float_validation(&text)))
}

/// Abbreviated currency cell (`€1,2bn`, `€400k`, `-`)
pub fn currency_cell(cell: ElementRef) -> Option<CellValue> {
    let text = collect_text(cell);
    if text.is_empty() {
        return None;
    }
    Some(CellValue::Float(super::normalize::currency_to_float(&text)))
}

pub(crate) fn collect_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub(crate) fn first_anchor(cell: ElementRef) -> Option<ElementRef> {
    cell.select(&super::engine::selectors::ANCHOR).next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn fragment(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    fn specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec {
                field: "name",
                key: "club",
                offset: 0,
                default: CellValue::Null,
                transform: cell_text,
            },
            FieldSpec {
                field: "squad",
                key: "squad",
                offset: 0,
                default: CellValue::Int(0),
                transform: int_cell,
            },
            FieldSpec {
                field: "value",
                key: "total_market_value",
                offset: 0,
                default: CellValue::Float(0.0),
                transform: currency_cell,
            },
        ]
    }

    #[test]
    fn short_rows_yield_defaults_not_errors() {
        let doc = fragment("<table><tr><td>Arsenal FC</td></tr></table>");
        let td = Selector::parse("td").expect("hardcoded selector");
        let cells: Vec<_> = doc.select(&td).collect();

        let mut headers = std::collections::BTreeMap::new();
        headers.insert(String::from("club"), 0);
        headers.insert(String::from("squad"), 1);
        headers.insert(String::from("total_market_value"), 5);

        let bag = extract_row(&specs(), &headers, &cells);
        assert_eq!(bag["name"], CellValue::Text(String::from("Arsenal FC")));
        // both columns are out of range for this row
        assert_eq!(bag["squad"], CellValue::Int(0));
        assert_eq!(bag["value"], CellValue::Float(0.0));
    }

    #[test]
    fn missing_header_key_uses_default_directly() {
        let doc = fragment("<table><tr><td>Arsenal FC</td><td>26</td></tr></table>");
        let td = Selector::parse("td").expect("hardcoded selector");
        let cells: Vec<_> = doc.select(&td).collect();

        let headers = std::collections::BTreeMap::new();
        let bag = extract_row(&specs(), &headers, &cells);
        assert!(bag["name"].is_null());
        assert_eq!(bag["squad"], CellValue::Int(0));
    }

    #[test]
    fn negative_resolved_index_degrades_to_default() {
        let doc = fragment("<table><tr><td>26</td></tr></table>");
        let td = Selector::parse("td").expect("hardcoded selector");
        let cells: Vec<_> = doc.select(&td).collect();

        let mut headers = std::collections::BTreeMap::new();
        headers.insert(String::from("squad"), 0);
        let spec = [FieldSpec {
            field: "squad",
            key: "squad",
            offset: -2,
            default: CellValue::Int(-1),
            transform: int_cell,
        }];

        let bag = extract_row(&spec, &headers, &cells);
        assert_eq!(bag["squad"], CellValue::Int(-1));
    }

    #[test]
    fn anchor_transforms_prefer_title() {
        let doc = Html::parse_fragment(
            r#"<table><tr><td><a href="/gb1" title="Premier League">PL</a></td></tr></table>"#,
        );
        let td = Selector::parse("td").expect("hardcoded selector");
        let cell = doc.select(&td).next().expect("one cell");

        assert_eq!(
            anchor_text(cell),
            Some(CellValue::Text(String::from("Premier League")))
        );
        assert_eq!(anchor_href(cell), Some(CellValue::Text(String::from("/gb1"))));
    }
}
