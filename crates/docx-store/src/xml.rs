//! WordprocessingML reading and writing
//!
//! The body of `word/document.xml` is split into top-level children. Paragraphs
//! are parsed into the model; everything else (tables, section properties,
//! content controls, whitespace between children) is kept as raw XML. The
//! text before the first child and after the last one is carried through
//! unchanged.

use crate::error::StoreError;
use crate::model::{
    Alignment, Paragraph, ParagraphFormat, RetainedProperties, RgbColor, Run, RunFormat,
};
use crate::package::DOCUMENT_PART;
use crate::styles::StyleCatalog;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// `w:pPr` children in schema order
const PPR_ORDER: &[&str] = &[
    "pStyle",
    "keepNext",
    "keepLines",
    "pageBreakBefore",
    "framePr",
    "widowControl",
    "numPr",
    "suppressLineNumbers",
    "pBdr",
    "shd",
    "tabs",
    "suppressAutoHyphens",
    "kinsoku",
    "wordWrap",
    "overflowPunct",
    "topLinePunct",
    "autoSpaceDE",
    "autoSpaceDN",
    "bidi",
    "adjustRightInd",
    "snapToGrid",
    "spacing",
    "ind",
    "contextualSpacing",
    "mirrorIndents",
    "suppressOverlap",
    "jc",
    "textDirection",
    "textAlignment",
    "textboxTightWrap",
    "outlineLvl",
    "divId",
    "cnfStyle",
    "rPr",
    "sectPr",
    "pPrChange",
];

/// Elements whose `w:r` children are part of the enclosing paragraph's text
const RUN_CONTAINERS: &[&[u8]] = &[
    b"p",
    b"hyperlink",
    b"ins",
    b"moveTo",
    b"smartTag",
    b"customXml",
    b"fldSimple",
    b"sdtContent",
];

/// Subtrees that hold content of their own (text boxes, alternate renderings)
const SKIPPED_SUBTREES: &[&[u8]] = &[b"txbxContent", b"Fallback"];

/// Top-level child of `w:body`
#[derive(Debug, Clone)]
pub(crate) enum BodyNode {
    Paragraph(Paragraph),
    Other(String),
}

impl BodyNode {
    pub(crate) fn is_section_properties(&self) -> bool {
        match self {
            BodyNode::Other(raw) => raw.starts_with("<w:sectPr"),
            BodyNode::Paragraph(_) => false,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, BodyNode::Other(raw) if raw.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Body {
    pub(crate) head: String,
    pub(crate) nodes: Vec<BodyNode>,
    pub(crate) tail: String,
}

impl Body {
    pub(crate) fn to_xml(&self, catalog: &StyleCatalog) -> String {
        let mut out = String::with_capacity(self.head.len() + self.tail.len() + 256);
        out.push_str(&self.head);
        for node in &self.nodes {
            match node {
                BodyNode::Paragraph(p) => match p.source() {
                    Some(raw) => out.push_str(raw),
                    None => out.push_str(&write_paragraph(p, catalog)),
                },
                BodyNode::Other(raw) => out.push_str(raw),
            }
        }
        out.push_str(&self.tail);
        out
    }
}

fn xml_error(part: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Xml {
        part: part.to_string(),
        message: err.to_string(),
    }
}

/// Value of the attribute with the given local name (namespace prefix ignored)
pub(crate) fn attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// All attributes as `(qualified name, unescaped value)`
fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .filter_map(|a| {
            let key = std::str::from_utf8(a.key.as_ref()).ok()?.to_string();
            let value = a.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

fn local_key(key: &str) -> &str {
    key.rsplit(':').next().unwrap_or(key)
}

/// Attributes of `e` whose local names are not in `modelled`
fn unmodelled_attributes(e: &BytesStart<'_>, modelled: &[&str]) -> Vec<(String, String)> {
    attributes(e)
        .into_iter()
        .filter(|(key, _)| !modelled.contains(&local_key(key)))
        .collect()
}

/// Toggle properties: `<w:b/>` is on, `<w:b w:val="0"/>` is off
fn toggle(e: &BytesStart<'_>) -> bool {
    !matches!(
        attr(e, b"val").as_deref(),
        Some("0" | "false" | "off" | "none")
    )
}

/// Byte offset of the `<` opening the event that was read from `pos`
///
/// Depending on what preceded it, the reader may already have consumed the
/// `<` before reporting its position.
fn tag_start(xml: &str, pos: usize) -> usize {
    let bytes = xml.as_bytes();
    if bytes.get(pos) == Some(&b'<') {
        pos
    } else if pos > 0 && bytes[pos - 1] == b'<' {
        pos - 1
    } else {
        pos
    }
}

fn twips_to_points(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().map(|v| v / 20.0)
}

pub(crate) fn parse_body(xml: &str, catalog: &StyleCatalog) -> Result<Body, StoreError> {
    let mut reader = Reader::from_str(xml);

    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    let mut head_end: Option<usize> = None;
    let mut tail_start: Option<usize> = None;
    let mut child_start = 0usize;
    let mut nodes = Vec::new();
    let mut empty_body = false;

    loop {
        let before = tag_start(xml, reader.buffer_position() as usize);
        let event = reader
            .read_event()
            .map_err(|e| xml_error(DOCUMENT_PART, e))?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                depth += 1;
                if body_depth.is_none() && tail_start.is_none() && e.local_name().as_ref() == b"body"
                {
                    body_depth = Some(depth);
                    head_end = Some(after);
                } else if body_depth == Some(depth - 1) {
                    child_start = before;
                }
            }
            Event::Empty(e) => {
                if body_depth.is_none() && tail_start.is_none() && e.local_name().as_ref() == b"body"
                {
                    // `<w:body/>`: re-open it so paragraphs can be added
                    head_end = Some(before);
                    tail_start = Some(after);
                    empty_body = true;
                } else if body_depth == Some(depth) {
                    nodes.push(body_node(&xml[before..after], e.local_name().as_ref(), catalog)?);
                }
            }
            Event::End(e) => {
                if body_depth == Some(depth) {
                    tail_start = Some(before);
                    body_depth = None;
                } else if body_depth.map(|d| d + 1) == Some(depth) {
                    nodes.push(body_node(
                        &xml[child_start..after],
                        e.local_name().as_ref(),
                        catalog,
                    )?);
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(_) if body_depth == Some(depth) => {
                // the reader may have consumed the `<` that ends the text
                let end = tag_start(xml, after);
                nodes.push(BodyNode::Other(xml[before..end].to_string()));
            }
            Event::Comment(_) if body_depth == Some(depth) => {
                nodes.push(BodyNode::Other(xml[before..after].to_string()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let (head_end, tail_start) = match (head_end, tail_start) {
        (Some(h), Some(t)) => (h, t),
        _ => return Err(xml_error(DOCUMENT_PART, "document has no w:body element")),
    };

    let (head, mut tail) = if empty_body {
        (
            format!("{}<w:body>", &xml[..head_end]),
            format!("</w:body>{}", &xml[tail_start..]),
        )
    } else {
        (xml[..head_end].to_string(), xml[tail_start..].to_string())
    };

    // whitespace before `</w:body>` stays after the section properties
    if nodes.last().is_some_and(BodyNode::is_blank) {
        if let Some(BodyNode::Other(raw)) = nodes.pop() {
            tail.insert_str(0, &raw);
        }
    }

    Ok(Body { head, nodes, tail })
}

fn body_node(raw: &str, local: &[u8], catalog: &StyleCatalog) -> Result<BodyNode, StoreError> {
    if local == b"p" {
        Ok(BodyNode::Paragraph(parse_paragraph(raw, catalog)?))
    } else {
        Ok(BodyNode::Other(raw.to_string()))
    }
}

/// Accumulates the model of one `w:p` while its events are read
#[derive(Default)]
struct ParagraphReader {
    style_id: Option<String>,
    format: ParagraphFormat,
    retained: RetainedProperties,
    runs: Vec<Run>,
    run: Option<Run>,
    /// Depth of the open `w:r` element
    run_depth: usize,
    in_text: bool,
    /// Unmodelled `w:pPr` child being captured: (local name, start offset)
    capture: Option<(String, usize)>,
}

impl ParagraphReader {
    /// An element opens; `path` holds the local names of its ancestors
    fn open(
        &mut self,
        path: &[Vec<u8>],
        e: &BytesStart<'_>,
        empty: bool,
        raw: &str,
        span: (usize, usize),
    ) {
        let local = e.local_name();
        let local = local.as_ref();

        if path.is_empty() {
            if local == b"p" {
                self.retained.paragraph_attrs = attributes(e);
            }
            return;
        }

        if path.len() == 2 && path[1] == b"pPr" {
            self.read_paragraph_property(local, e, empty, raw, span);
            return;
        }

        if let Some(run) = self.run.as_mut() {
            if path.len() == self.run_depth + 1 {
                match local {
                    b"t" => self.in_text = !empty,
                    b"tab" => run.text.push('\t'),
                    b"br" | b"cr" => run.text.push('\n'),
                    _ => {}
                }
            } else if path.len() == self.run_depth + 2 && path[self.run_depth + 1] == b"rPr" {
                read_run_property(local, e, &mut run.format);
            }
            return;
        }

        let in_container = path
            .last()
            .is_some_and(|parent| RUN_CONTAINERS.contains(&parent.as_slice()));
        if local == b"r" && in_container {
            if empty {
                self.runs.push(Run::default());
            } else {
                self.run = Some(Run::default());
                self.run_depth = path.len();
            }
        }
    }

    /// An element closes; `path` holds the local names of its ancestors
    fn close(&mut self, path: &[Vec<u8>], local: &[u8], raw: &str, end: usize) {
        if path.len() == 2 && path[1] == b"pPr" {
            if let Some((name, start)) = self.capture.take() {
                self.retained.children.push((name, raw[start..end].to_string()));
            }
            return;
        }
        if self.run.is_none() {
            return;
        }
        if local == b"t" && path.len() == self.run_depth + 1 {
            self.in_text = false;
        } else if local == b"r" && path.len() == self.run_depth {
            if let Some(run) = self.run.take() {
                self.runs.push(run);
            }
        }
    }

    fn read_paragraph_property(
        &mut self,
        local: &[u8],
        e: &BytesStart<'_>,
        empty: bool,
        raw: &str,
        span: (usize, usize),
    ) {
        match local {
            b"pStyle" => self.style_id = attr(e, b"val"),
            b"spacing" => {
                let proportional = read_spacing(e, &mut self.format);
                let modelled: &[&str] = if proportional {
                    &["before", "after", "line", "lineRule"]
                } else {
                    &["before", "after"]
                };
                self.retained.spacing_attrs = unmodelled_attributes(e, modelled);
            }
            b"ind" => {
                if let Some(first) = attr(e, b"firstLine") {
                    self.format.first_line_indent = twips_to_points(&first);
                } else if let Some(hanging) = attr(e, b"hanging") {
                    self.format.first_line_indent = twips_to_points(&hanging).map(|v| -v);
                }
                self.retained.ind_attrs = unmodelled_attributes(e, &["firstLine", "hanging"]);
            }
            b"jc" => match attr(e, b"val").and_then(|v| Alignment::from_jc(&v)) {
                Some(alignment) => self.format.alignment = Some(alignment),
                None => self.retain(local, empty, raw, span),
            },
            _ => self.retain(local, empty, raw, span),
        }
    }

    fn retain(&mut self, local: &[u8], empty: bool, raw: &str, (start, end): (usize, usize)) {
        let name = String::from_utf8_lossy(local).into_owned();
        if empty {
            self.retained.children.push((name, raw[start..end].to_string()));
        } else {
            self.capture = Some((name, start));
        }
    }
}

/// Parse one `w:p` element
///
/// Only runs that belong to this paragraph contribute text: runs nested in
/// text boxes and the fallback half of alternate content are skipped, as
/// are paragraph properties below the paragraph's own `w:pPr`.
pub(crate) fn parse_paragraph(raw: &str, catalog: &StyleCatalog) -> Result<Paragraph, StoreError> {
    let mut reader = Reader::from_str(raw);
    let mut state = ParagraphReader::default();
    // local names of the open elements
    let mut path: Vec<Vec<u8>> = Vec::new();
    // depth of the skipped subtree being read through
    let mut skipped: Option<usize> = None;

    loop {
        let before = tag_start(raw, reader.buffer_position() as usize);
        let event = reader
            .read_event()
            .map_err(|e| xml_error(DOCUMENT_PART, e))?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                let local = e.local_name().as_ref().to_vec();
                if skipped.is_none() {
                    if starts_skipped_subtree(&local, &path) {
                        skipped = Some(path.len());
                    } else {
                        state.open(&path, &e, false, raw, (before, after));
                    }
                }
                path.push(local);
            }
            Event::Empty(e) => {
                if skipped.is_none() && !starts_skipped_subtree(e.local_name().as_ref(), &path) {
                    state.open(&path, &e, true, raw, (before, after));
                }
            }
            Event::End(_) => {
                let local = path.pop().unwrap_or_default();
                match skipped {
                    Some(depth) if depth == path.len() => skipped = None,
                    Some(_) => {}
                    None => state.close(&path, &local, raw, after),
                }
            }
            Event::Text(t) if skipped.is_none() && state.in_text => {
                if let Some(run) = state.run.as_mut() {
                    let text = t.unescape().map_err(|e| xml_error(DOCUMENT_PART, e))?;
                    run.text.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let style = Some(match state.style_id {
        Some(id) => catalog.name_for_id(&id),
        None => catalog.default_name().to_string(),
    });

    Ok(Paragraph::from_parts(
        style,
        state.runs,
        state.format,
        state.retained,
        raw.to_string(),
    ))
}

fn starts_skipped_subtree(local: &[u8], path: &[Vec<u8>]) -> bool {
    SKIPPED_SUBTREES.contains(&local) || (local == b"p" && !path.is_empty())
}

/// Returns whether `w:line` was read as a multiplier
fn read_spacing(e: &BytesStart<'_>, format: &mut ParagraphFormat) -> bool {
    if let Some(before) = attr(e, b"before") {
        format.space_before = twips_to_points(&before);
    }
    if let Some(after) = attr(e, b"after") {
        format.space_after = twips_to_points(&after);
    }
    // only proportional spacing maps to a multiplier
    let proportional = matches!(attr(e, b"lineRule").as_deref(), None | Some("auto"));
    if proportional {
        if let Some(line) = attr(e, b"line") {
            format.line_spacing = line.parse::<f64>().ok().map(|v| v / 240.0);
        }
    }
    proportional
}

fn read_run_property(local: &[u8], e: &BytesStart<'_>, format: &mut RunFormat) {
    match local {
        b"rFonts" => {
            format.font = attr(e, b"ascii").or_else(|| attr(e, b"hAnsi"));
        }
        b"sz" => {
            format.size = attr(e, b"val")
                .and_then(|v| v.parse::<f64>().ok())
                .map(|half_points| half_points / 2.0);
        }
        b"b" => format.bold = Some(toggle(e)),
        b"i" => format.italic = Some(toggle(e)),
        b"u" => format.underline = Some(toggle(e)),
        b"color" => {
            format.color = attr(e, b"val").and_then(|v| RgbColor::from_hex(&v));
        }
        _ => {}
    }
}

fn round(value: f64) -> i64 {
    value.round() as i64
}

fn ppr_rank(local: &str) -> usize {
    // unknown extensions sit just before the paragraph mark properties
    PPR_ORDER
        .iter()
        .position(|name| *name == local)
        .unwrap_or(PPR_ORDER.len() - 3)
}

fn write_attrs(out: &mut String, attrs: &[(String, String)]) {
    for (key, value) in attrs {
        out.push_str(&format!(r#" {}="{}""#, key, escape(value.as_str())));
    }
}

/// Retained attributes minus those a modelled value now overrides
fn kept_attrs<'a>(
    attrs: &'a [(String, String)],
    overridden: &'a [&'a str],
) -> impl Iterator<Item = &'a (String, String)> + 'a {
    attrs
        .iter()
        .filter(move |(key, _)| !overridden.contains(&local_key(key)))
}

fn spacing_element(format: &ParagraphFormat, retained: &[(String, String)]) -> Option<String> {
    let mut overridden = Vec::new();
    if format.space_before.is_some() {
        overridden.extend(["beforeAutospacing", "beforeLines"]);
    }
    if format.space_after.is_some() {
        overridden.extend(["afterAutospacing", "afterLines"]);
    }
    if format.line_spacing.is_some() {
        overridden.extend(["line", "lineRule"]);
    }

    let mut attrs = String::new();
    if let Some(before) = format.space_before {
        attrs.push_str(&format!(r#" w:before="{}""#, round(before * 20.0)));
    }
    if let Some(after) = format.space_after {
        attrs.push_str(&format!(r#" w:after="{}""#, round(after * 20.0)));
    }
    if let Some(line) = format.line_spacing {
        attrs.push_str(&format!(
            r#" w:line="{}" w:lineRule="auto""#,
            round(line * 240.0)
        ));
    }
    let kept: Vec<(String, String)> = kept_attrs(retained, &overridden).cloned().collect();
    write_attrs(&mut attrs, &kept);

    (!attrs.is_empty()).then(|| format!("<w:spacing{}/>", attrs))
}

fn ind_element(format: &ParagraphFormat, retained: &[(String, String)]) -> Option<String> {
    let overridden: &[&str] = if format.first_line_indent.is_some() {
        &["firstLineChars", "hangingChars"]
    } else {
        &[]
    };

    let mut attrs = String::new();
    let kept: Vec<(String, String)> = kept_attrs(retained, overridden).cloned().collect();
    write_attrs(&mut attrs, &kept);
    match format.first_line_indent {
        Some(indent) if indent < 0.0 => {
            attrs.push_str(&format!(r#" w:hanging="{}""#, round(-indent * 20.0)));
        }
        Some(indent) => {
            attrs.push_str(&format!(r#" w:firstLine="{}""#, round(indent * 20.0)));
        }
        None => {}
    }

    (!attrs.is_empty()).then(|| format!("<w:ind{}/>", attrs))
}

/// Serialize a paragraph from its model
///
/// Properties retained from the loaded XML are merged back in schema order.
pub(crate) fn write_paragraph(p: &Paragraph, catalog: &StyleCatalog) -> String {
    let retained = p.retained();
    let format = p.format();

    let mut out = String::from("<w:p");
    write_attrs(&mut out, &retained.paragraph_attrs);
    out.push('>');

    let mut props: Vec<(usize, String)> = retained
        .children
        .iter()
        .filter(|(name, _)| !(name == "jc" && format.alignment.is_some()))
        .map(|(name, xml)| (ppr_rank(name), xml.clone()))
        .collect();

    if p.style_name() != catalog.default_name() {
        props.push((
            ppr_rank("pStyle"),
            format!(
                r#"<w:pStyle w:val="{}"/>"#,
                escape(catalog.id_for_name(p.style_name()).as_str())
            ),
        ));
    }
    if let Some(spacing) = spacing_element(format, &retained.spacing_attrs) {
        props.push((ppr_rank("spacing"), spacing));
    }
    if let Some(ind) = ind_element(format, &retained.ind_attrs) {
        props.push((ppr_rank("ind"), ind));
    }
    if let Some(alignment) = format.alignment {
        props.push((
            ppr_rank("jc"),
            format!(r#"<w:jc w:val="{}"/>"#, alignment.jc()),
        ));
    }

    if !props.is_empty() {
        props.sort_by_key(|(rank, _)| *rank);
        out.push_str("<w:pPr>");
        for (_, xml) in props {
            out.push_str(&xml);
        }
        out.push_str("</w:pPr>");
    }

    for run in p.runs() {
        write_run(&mut out, run);
    }

    out.push_str("</w:p>");
    out
}

fn write_toggle(out: &mut String, tag: &str, value: Option<bool>) {
    match value {
        Some(true) => out.push_str(&format!("<w:{}/>", tag)),
        Some(false) => out.push_str(&format!(r#"<w:{} w:val="0"/>"#, tag)),
        None => {}
    }
}

fn flush_text(out: &mut String, pending: &mut String) {
    if !pending.is_empty() {
        out.push_str(r#"<w:t xml:space="preserve">"#);
        out.push_str(&escape(pending.as_str()));
        out.push_str("</w:t>");
        pending.clear();
    }
}

fn write_run(out: &mut String, run: &Run) {
    out.push_str("<w:r>");

    let f = &run.format;
    if !f.is_plain() {
        out.push_str("<w:rPr>");
        if let Some(font) = &f.font {
            let font = escape(font.as_str());
            out.push_str(&format!(
                r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/>"#,
                font
            ));
        }
        write_toggle(out, "b", f.bold);
        write_toggle(out, "i", f.italic);
        if let Some(color) = f.color {
            out.push_str(&format!(r#"<w:color w:val="{}"/>"#, color));
        }
        if let Some(size) = f.size {
            out.push_str(&format!(r#"<w:sz w:val="{}"/>"#, round(size * 2.0)));
        }
        match f.underline {
            Some(true) => out.push_str(r#"<w:u w:val="single"/>"#),
            Some(false) => out.push_str(r#"<w:u w:val="none"/>"#),
            None => {}
        }
        out.push_str("</w:rPr>");
    }

    let mut pending = String::new();
    for c in run.text.chars() {
        match c {
            '\t' => {
                flush_text(out, &mut pending);
                out.push_str("<w:tab/>");
            }
            '\n' => {
                flush_text(out, &mut pending);
                out.push_str("<w:br/>");
            }
            _ => pending.push(c),
        }
    }
    flush_text(out, &mut pending);

    out.push_str("</w:r>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        r#"<w:body>"#,
        r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Definitions</w:t></w:r></w:p>"#,
        r#"<w:p><w:pPr><w:jc w:val="both"/><w:spacing w:before="240" w:after="120" w:line="360" w:lineRule="auto"/></w:pPr>"#,
        r#"<w:r><w:rPr><w:rFonts w:ascii="Arial"/><w:b/><w:color w:val="FF0000"/><w:sz w:val="24"/></w:rPr><w:t xml:space="preserve">Bold </w:t></w:r>"#,
        r#"<w:r><w:rPr><w:i w:val="0"/><w:u w:val="single"/></w:rPr><w:t>&amp; plain</w:t><w:tab/><w:t>x</w:t></w:r></w:p>"#,
        r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        r#"<w:p/>"#,
        r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr>"#,
        r#"</w:body></w:document>"#
    );

    fn paragraphs(body: &Body) -> Vec<&Paragraph> {
        body.nodes
            .iter()
            .filter_map(|n| match n {
                BodyNode::Paragraph(p) => Some(p),
                BodyNode::Other(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_body_splits_children() {
        let body = parse_body(DOC, &StyleCatalog::default()).unwrap();
        assert_eq!(body.nodes.len(), 5);
        assert!(body.head.ends_with("<w:body>"));
        assert_eq!(body.tail, "</w:body></w:document>");
        assert!(body.nodes[4].is_section_properties());

        // table paragraphs are not top-level paragraphs
        let paras = paragraphs(&body);
        assert_eq!(paras.len(), 3);
        assert_eq!(paras[0].style_name(), "Heading 1");
        assert_eq!(paras[0].text(), "Definitions");
        assert_eq!(paras[2].text(), "");
        assert_eq!(paras[2].style_name(), "Normal");
    }

    #[test]
    fn test_parse_formatting() {
        let body = parse_body(DOC, &StyleCatalog::default()).unwrap();
        let p = paragraphs(&body)[1];
        assert_eq!(p.text(), "Bold & plain\tx");

        let format = p.format();
        assert_eq!(format.alignment, Some(Alignment::Justify));
        assert_eq!(format.space_before, Some(12.0));
        assert_eq!(format.space_after, Some(6.0));
        assert_eq!(format.line_spacing, Some(1.5));

        let first = &p.runs()[0].format;
        assert_eq!(first.font.as_deref(), Some("Arial"));
        assert_eq!(first.bold, Some(true));
        assert_eq!(first.size, Some(12.0));
        assert_eq!(first.color, Some(RgbColor(255, 0, 0)));

        let second = &p.runs()[1].format;
        assert_eq!(second.italic, Some(false));
        assert_eq!(second.underline, Some(true));
        assert_eq!(second.bold, None);
    }

    #[test]
    fn test_untouched_document_round_trips_exactly() {
        let catalog = StyleCatalog::default();
        let body = parse_body(DOC, &catalog).unwrap();
        assert_eq!(body.to_xml(&catalog), DOC);
    }

    #[test]
    fn test_written_paragraph_parses_back() {
        let catalog = StyleCatalog::default();
        let mut p = Paragraph::with_style("", "Heading 2");
        p.push_run(Run {
            text: "A <b> & \"c\"\tnext\nline".into(),
            format: RunFormat {
                font: Some("Times New Roman".into()),
                size: Some(10.5),
                bold: Some(false),
                italic: Some(true),
                underline: Some(false),
                color: Some(RgbColor(0, 128, 255)),
            },
        });
        *p.format_mut() = ParagraphFormat {
            alignment: Some(Alignment::Center),
            line_spacing: Some(2.0),
            space_before: Some(0.0),
            space_after: Some(18.0),
            first_line_indent: Some(-36.0),
        };

        let xml = write_paragraph(&p, &catalog);
        assert!(xml.contains(r#"<w:pStyle w:val="Heading2"/>"#));

        let parsed = parse_paragraph(&xml, &catalog).unwrap();
        assert_eq!(parsed, p);
    }

    #[test]
    fn test_default_style_is_not_written() {
        let catalog = StyleCatalog::default();
        let xml = write_paragraph(&Paragraph::new("plain"), &catalog);
        assert_eq!(
            xml,
            r#"<w:p><w:r><w:t xml:space="preserve">plain</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn test_missing_body_is_an_error() {
        let err = parse_body("<w:document/>", &StyleCatalog::default()).unwrap_err();
        assert!(matches!(err, StoreError::Xml { .. }));
    }

    #[test]
    fn test_self_closing_body_is_reopened() {
        let xml = r#"<w:document xmlns:w="x"><w:body/></w:document>"#;
        let body = parse_body(xml, &StyleCatalog::default()).unwrap();
        assert!(body.nodes.is_empty());
        assert_eq!(body.head, r#"<w:document xmlns:w="x"><w:body>"#);
        assert_eq!(body.tail, "</w:body></w:document>");
    }

    const NUMBERED: &str = concat!(
        r#"<w:p w:rsidR="00A1" w14:paraId="1A2B"><w:pPr><w:pStyle w:val="ListParagraph"/>"#,
        r#"<w:keepNext/><w:numPr><w:ilvl w:val="0"/><w:numId w:val="3"/></w:numPr>"#,
        r#"<w:spacing w:after="120" w:line="300" w:lineRule="exact"/>"#,
        r#"<w:ind w:left="720" w:hanging="360"/><w:jc w:val="distribute"/>"#,
        r#"<w:rPr><w:b/></w:rPr></w:pPr>"#,
        r#"<w:r><w:t>First item</w:t></w:r></w:p>"#
    );

    #[test]
    fn test_rewritten_paragraph_keeps_unmodelled_properties() {
        let catalog = StyleCatalog::default();
        let mut p = parse_paragraph(NUMBERED, &catalog).unwrap();
        assert_eq!(p.style_name(), "ListParagraph");
        assert_eq!(p.format().first_line_indent, Some(-18.0));
        assert_eq!(p.format().line_spacing, None);

        p.set_text("Changed item");
        let xml = write_paragraph(&p, &catalog);
        assert_eq!(
            xml,
            concat!(
                r#"<w:p w:rsidR="00A1" w14:paraId="1A2B"><w:pPr><w:pStyle w:val="ListParagraph"/>"#,
                r#"<w:keepNext/><w:numPr><w:ilvl w:val="0"/><w:numId w:val="3"/></w:numPr>"#,
                r#"<w:spacing w:after="120" w:line="300" w:lineRule="exact"/>"#,
                r#"<w:ind w:left="720" w:hanging="360"/><w:jc w:val="distribute"/>"#,
                r#"<w:rPr><w:b/></w:rPr></w:pPr>"#,
                r#"<w:r><w:t xml:space="preserve">Changed item</w:t></w:r></w:p>"#
            )
        );
    }

    #[test]
    fn test_modelled_values_replace_their_retained_counterparts() {
        let catalog = StyleCatalog::default();
        let mut p = parse_paragraph(NUMBERED, &catalog).unwrap();
        {
            let format = p.format_mut();
            format.line_spacing = Some(1.5);
            format.alignment = Some(Alignment::Center);
            format.first_line_indent = Some(12.0);
        }
        let xml = write_paragraph(&p, &catalog);

        assert!(xml.contains(r#"<w:spacing w:after="120" w:line="360" w:lineRule="auto"/>"#));
        assert!(xml.contains(r#"<w:ind w:left="720" w:firstLine="240"/>"#));
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(!xml.contains("distribute"));
        assert!(!xml.contains("exact"));
        // schema order: numbering before spacing, paragraph mark last
        let numbering = xml.find("<w:numPr>").unwrap();
        let spacing = xml.find("<w:spacing").unwrap();
        let mark = xml.find("<w:rPr>").unwrap();
        assert!(numbering < spacing && spacing < mark);
    }

    #[test]
    fn test_text_box_content_stays_out_of_the_paragraph() {
        let raw = concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>"#,
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t>Rent</w:t>"#,
            r#"<mc:AlternateContent><mc:Choice Requires="wps"><w:drawing><wp:anchor><a:graphic><a:graphicData>"#,
            r#"<wps:wsp><wps:txbx><w:txbxContent>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="Caption"/></w:pPr><w:r><w:t>Box</w:t></w:r></w:p>"#,
            r#"</w:txbxContent></wps:txbx></wps:wsp></a:graphicData></a:graphic></wp:anchor></w:drawing></mc:Choice>"#,
            r#"<mc:Fallback><w:pict><v:shape><v:textbox><w:txbxContent>"#,
            r#"<w:p><w:r><w:t>Box</w:t></w:r></w:p>"#,
            r#"</w:txbxContent></v:textbox></v:shape></w:pict></mc:Fallback></mc:AlternateContent>"#,
            r#"</w:r>"#,
            r#"<w:hyperlink r:id="rId4"><w:r><w:t> due</w:t></w:r></w:hyperlink></w:p>"#
        );
        let p = parse_paragraph(raw, &StyleCatalog::default()).unwrap();
        assert_eq!(p.text(), "Rent due");
        assert_eq!(p.style_name(), "Heading 1");
        assert_eq!(p.runs().len(), 2);
        assert_eq!(p.runs()[0].format.bold, Some(true));
    }

    #[test]
    fn test_whitespace_between_body_children_is_kept() {
        let xml = concat!(
            "<w:document xmlns:w=\"x\">\n  <w:body>\n",
            "    <w:p><w:r><w:t>One</w:t></w:r></w:p>\n",
            "    <w:p><w:r><w:t>Two</w:t></w:r></w:p>\n",
            "    <w:sectPr/>\n",
            "  </w:body>\n</w:document>"
        );
        let catalog = StyleCatalog::default();
        let body = parse_body(xml, &catalog).unwrap();
        assert_eq!(body.to_xml(&catalog), xml);
        assert_eq!(paragraphs(&body).len(), 2);
        assert!(body.nodes.last().unwrap().is_section_properties());
        assert_eq!(body.tail, "\n  </w:body>\n</w:document>");
    }
}
