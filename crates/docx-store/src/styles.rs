//! Paragraph style catalog from `word/styles.xml`
//!
//! Paragraphs reference styles by id (`Heading1`), while commands and
//! headings are matched by display name (`Heading 1`). The catalog maps
//! between the two.

use crate::error::StoreError;
use crate::model::DEFAULT_STYLE;
use crate::xml::attr;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::HashMap;

/// Built-in style names that word processors store in lowercase
const BUILTIN_LOWERCASE: &[&str] = &[
    "normal",
    "title",
    "subtitle",
    "caption",
    "quote",
    "intense quote",
    "list paragraph",
    "no spacing",
    "body text",
    "header",
    "footer",
    "toc heading",
];

/// Convert a stored style name into its display form
///
/// `heading 1` becomes `Heading 1`, `title` becomes `Title`; user-defined
/// names are returned unchanged.
pub fn display_name(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    let is_builtin = BUILTIN_LOWERCASE.contains(&lower.as_str())
        || lower
            .strip_prefix("heading ")
            .is_some_and(|level| !level.is_empty() && level.chars().all(|c| c.is_ascii_digit()));

    if !is_builtin || raw != lower {
        return raw.to_string();
    }

    raw.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
pub struct StyleCatalog {
    names_by_id: HashMap<String, String>,
    ids_by_name: HashMap<String, String>,
    default_name: String,
}

impl Default for StyleCatalog {
    fn default() -> Self {
        let mut catalog = Self {
            names_by_id: HashMap::new(),
            ids_by_name: HashMap::new(),
            default_name: DEFAULT_STYLE.to_string(),
        };
        catalog.insert("Normal", "Normal");
        catalog.insert("Title", "Title");
        for level in 1..=9 {
            catalog.insert(&format!("Heading{}", level), &format!("Heading {}", level));
        }
        catalog
    }
}

impl StyleCatalog {
    /// Parse the paragraph styles of a `styles.xml` part
    pub fn parse(xml: &str) -> Result<Self, StoreError> {
        let mut catalog = Self {
            names_by_id: HashMap::new(),
            ids_by_name: HashMap::new(),
            default_name: DEFAULT_STYLE.to_string(),
        };

        let mut reader = Reader::from_str(xml);
        // (style id, is default) of the paragraph style being read
        let mut current: Option<(String, bool)> = None;

        loop {
            let event = reader.read_event().map_err(|e| StoreError::Xml {
                part: "word/styles.xml".into(),
                message: e.to_string(),
            })?;
            match event {
                Event::Start(e) if e.local_name().as_ref() == b"style" => {
                    let is_paragraph = attr(&e, b"type").as_deref() == Some("paragraph");
                    current = match (is_paragraph, attr(&e, b"styleId")) {
                        (true, Some(id)) => {
                            let is_default =
                                matches!(attr(&e, b"default").as_deref(), Some("1" | "true"));
                            Some((id, is_default))
                        }
                        _ => None,
                    };
                }
                Event::Empty(e) if e.local_name().as_ref() == b"name" => {
                    if let (Some((id, is_default)), Some(name)) = (&current, attr(&e, b"val")) {
                        let name = display_name(&name);
                        if *is_default {
                            catalog.default_name = name.clone();
                        }
                        catalog.insert(id, &name);
                    }
                }
                Event::End(e) if e.local_name().as_ref() == b"style" => {
                    current = None;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(catalog)
    }

    fn insert(&mut self, id: &str, name: &str) {
        self.names_by_id.insert(id.to_string(), name.to_string());
        self.ids_by_name.insert(name.to_string(), id.to_string());
    }

    /// Display name of the style applied when a paragraph has no `w:pStyle`
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Display name for a style id, falling back to the id itself
    pub fn name_for_id(&self, id: &str) -> String {
        self.names_by_id
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Style id for a display name
    ///
    /// Names missing from the catalog map to the name with spaces removed,
    /// which is how word processors derive ids for new styles.
    pub fn id_for_name(&self, name: &str) -> String {
        self.ids_by_name
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.replace(' ', ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="BodyCustom"><w:name w:val="Body Custom"/></w:style>
  <w:style w:type="character" w:styleId="Strong"><w:name w:val="Strong"/></w:style>
</w:styles>"#;

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("heading 1"), "Heading 1");
        assert_eq!(display_name("heading 12"), "Heading 12");
        assert_eq!(display_name("title"), "Title");
        assert_eq!(display_name("list paragraph"), "List Paragraph");
        assert_eq!(display_name("Heading 2"), "Heading 2");
        assert_eq!(display_name("my style"), "my style");
        assert_eq!(display_name("heading x"), "heading x");
    }

    #[test]
    fn test_parse_catalog() {
        let catalog = StyleCatalog::parse(STYLES).unwrap();
        assert_eq!(catalog.default_name(), "Normal");
        assert_eq!(catalog.name_for_id("Heading1"), "Heading 1");
        assert_eq!(catalog.name_for_id("BodyCustom"), "Body Custom");
        assert_eq!(catalog.id_for_name("Heading 1"), "Heading1");
        // character styles are not paragraph styles
        assert_eq!(catalog.id_for_name("Strong"), "Strong");
        assert_eq!(catalog.name_for_id("Strong"), "Strong");
    }

    #[test]
    fn test_unknown_names_fall_back() {
        let catalog = StyleCatalog::default();
        assert_eq!(catalog.name_for_id("Missing"), "Missing");
        assert_eq!(catalog.id_for_name("List Bullet"), "ListBullet");
        assert_eq!(catalog.id_for_name("Heading 3"), "Heading3");
    }
}
