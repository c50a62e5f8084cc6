//! Selector-driven extrakce: root selector → N záznamů, každý s pojmenovanými poli.
//! Selector, který nic nenajde, dává prázdný výsledek, ne chybu, markup se mění.

use crate::error::ScrapeError;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    Text,
    Attr(String),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    /// None = pole se bere přímo z root elementu
    pub selector: Option<String>,
    pub source: FieldSource,
}

#[derive(Debug, Clone)]
pub struct RecordSpec {
    pub name: String,
    pub root: String,
    pub fields: Vec<FieldSpec>,
}

impl RecordSpec {
    pub fn new(name: &str, root: &str) -> Self {
        Self { name: name.to_string(), root: root.to_string(), fields: Vec::new() }
    }

    pub fn text(mut self, field: &str, selector: &str) -> Self {
        self.fields.push(FieldSpec {
            name: field.to_string(),
            selector: Some(selector.to_string()),
            source: FieldSource::Text,
        });
        self
    }

    pub fn attr(mut self, field: &str, selector: &str, attr: &str) -> Self {
        self.fields.push(FieldSpec {
            name: field.to_string(),
            selector: Some(selector.to_string()),
            source: FieldSource::Attr(attr.to_string()),
        });
        self
    }

    pub fn own_text(mut self, field: &str) -> Self {
        self.fields.push(FieldSpec { name: field.to_string(), selector: None, source: FieldSource::Text });
        self
    }

    pub fn own_attr(mut self, field: &str, attr: &str) -> Self {
        self.fields.push(FieldSpec {
            name: field.to_string(),
            selector: None,
            source: FieldSource::Attr(attr.to_string()),
        });
        self
    }
}

/// Jeden extrahovaný záznam; prázdná pole se neukládají
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Extracted {
    records: HashMap<String, Vec<Record>>,
}

impl Extracted {
    /// Záznamy pro daný spec, prázdný slice pokud nic
    pub fn records(&self, spec: &str) -> &[Record] {
        self.records.get(spec).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn counts(&self) -> Vec<(String, usize)> {
        let mut out: Vec<_> = self.records.iter().map(|(k, v)| (k.clone(), v.len())).collect();
        out.sort();
        out
    }
}

fn parse_selector(raw: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(raw).map_err(|_| ScrapeError::InvalidSelector(raw.to_string()))
}

fn collapse_ws(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn read_field(el: &ElementRef, source: &FieldSource) -> Option<String> {
    let value = match source {
        FieldSource::Text => collapse_ws(&el.text().collect::<String>()),
        FieldSource::Attr(attr) => el.value().attr(attr)?.trim().to_string(),
    };
    (!value.is_empty()).then_some(value)
}

struct CompiledField<'a> {
    spec: &'a FieldSpec,
    selector: Option<Selector>,
}

pub fn extract_records(html: &str, specs: &[RecordSpec]) -> Result<Extracted, ScrapeError> {
    let document = Html::parse_document(html);
    let mut out = Extracted::default();

    for spec in specs {
        let root = parse_selector(&spec.root)?;
        let fields = spec.fields.iter()
            .map(|f| {
                let selector = f.selector.as_deref().map(parse_selector).transpose()?;
                Ok(CompiledField { spec: f, selector })
            })
            .collect::<Result<Vec<_>, ScrapeError>>()?;

        let mut records = Vec::new();
        for node in document.select(&root) {
            let mut record = Record::default();
            for field in &fields {
                let value = match &field.selector {
                    Some(sel) => node.select(sel).next().and_then(|el| read_field(&el, &field.spec.source)),
                    None => read_field(&node, &field.spec.source),
                };
                if let Some(v) = value {
                    record.insert(field.spec.name.clone(), v);
                }
            }
            records.push(record);
        }

        out.records.entry(spec.name.clone()).or_default().extend(records);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <a class="item" href="/events/1/a" data-unix="100">
            <span class="name">  First
               event </span>
          </a>
          <a class="item" href="/events/2/b">
            <span class="name"></span>
          </a>
        </body></html>
    "#;

    #[test]
    fn extracts_fields_per_record() {
        let spec = RecordSpec::new("events", "a.item")
            .own_attr("href", "href")
            .own_attr("unix", "data-unix")
            .text("name", ".name");
        let out = extract_records(PAGE, &[spec]).unwrap();
        let recs = out.records("events");

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].get("href"), Some("/events/1/a"));
        assert_eq!(recs[0].get("name"), Some("First event"));
        assert_eq!(recs[0].get("unix"), Some("100"));
        // prázdný text a chybějící atribut se do záznamu nedostanou
        assert_eq!(recs[1].get("name"), None);
        assert_eq!(recs[1].get("unix"), None);
        assert_eq!(out.total(), 2);
    }

    #[test]
    fn unmatched_selector_yields_empty_set() {
        let spec = RecordSpec::new("news", "div.newsline").text("title", ".newstext");
        let out = extract_records(PAGE, &[spec]).unwrap();
        assert!(out.records("news").is_empty());
        assert!(out.records("never-requested").is_empty());
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let spec = RecordSpec::new("bad", "a[[");
        assert!(matches!(extract_records(PAGE, &[spec]), Err(ScrapeError::InvalidSelector(_))));
    }
}
