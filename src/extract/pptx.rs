//! PPTX text: every text-bearing shape, slide by slide.
//!
//! Slide order is the deck's order: `<p:sldIdLst>` in `ppt/presentation.xml`
//! resolved through `ppt/_rels/presentation.xml.rels`. Packages without
//! those parts fall back to the number in each `slideN.xml` name.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use super::ooxml::Package;
use super::ExtractError;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

pub(super) fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut package = Package::open(bytes).map_err(ExtractError::Pptx)?;

    let mut text = String::new();
    for part in slide_parts(&mut package) {
        let xml = package.read_part(&part).map_err(ExtractError::Pptx)?;
        slide_text(&xml, &mut text).map_err(|e| ExtractError::Pptx(format!("{part}: {e}")))?;
    }
    Ok(text)
}

fn slide_parts(package: &mut Package) -> Vec<String> {
    match listed_slides(package) {
        Ok(parts) if !parts.is_empty() => parts,
        Ok(_) => numbered_slides(package),
        Err(e) => {
            debug!(error = %e, "no usable slide list, ordering slides by file name");
            numbered_slides(package)
        }
    }
}

/// Slide parts in `<p:sldIdLst>` order.
fn listed_slides(package: &mut Package) -> Result<Vec<String>, String> {
    let presentation = package.read_part(PRESENTATION_PART)?;
    let rels = package.read_part(PRESENTATION_RELS)?;
    let ids = slide_ids(&presentation)?;
    let targets = relationship_targets(&rels)?;

    let parts = ids
        .into_iter()
        .filter_map(|id| match targets.get(&id) {
            Some(target) => Some(resolve_target("ppt", target)),
            None => {
                warn!(%id, "slide id has no relationship, skipping");
                None
            }
        })
        .collect();
    Ok(parts)
}

/// Archive order is not slide order, and "slide10" sorts before "slide2".
fn numbered_slides(package: &Package) -> Vec<String> {
    let mut slides: Vec<(u32, String)> = package
        .part_names()
        .into_iter()
        .filter_map(|part| slide_number(&part).map(|n| (n, part)))
        .collect();
    slides.sort_by_key(|(n, _)| *n);
    slides.into_iter().map(|(_, part)| part).collect()
}

fn slide_number(part: &str) -> Option<u32> {
    part.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// The `r:id` of each `<p:sldId>`, in document order.
fn slide_ids(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();
    loop {
        match reader.read_event().map_err(|e| format!("malformed {PRESENTATION_PART}: {e}"))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                // The unprefixed `id` is the numeric slide id, not the relationship.
                if let Some(id) = attribute(&e, |key| key.prefix().is_some() && key.local_name().as_ref() == b"id") {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}

/// `Id` to `Target` for every `<Relationship>`.
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();
    loop {
        match reader.read_event().map_err(|e| format!("malformed {PRESENTATION_RELS}: {e}"))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attribute(&e, |key| key.as_ref() == b"Id");
                let target = attribute(&e, |key| key.as_ref() == b"Target");
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

fn attribute(e: &BytesStart<'_>, matches: impl Fn(quick_xml::name::QName<'_>) -> bool) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| matches(a.key))
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

#[derive(Default)]
struct Shape {
    has_text_frame: bool,
    in_text_frame: bool,
    paragraphs: Vec<String>,
}

impl Shape {
    fn push_text(&mut self, text: &str) {
        if let Some(p) = self.paragraphs.last_mut() {
            p.push_str(text);
        }
    }
}

/// Append the text of every `<p:sp>` with a `<p:txBody>` in `xml` to `out`.
fn slide_text(xml: &str, out: &mut String) -> Result<(), String> {
    let mut reader = Reader::from_str(xml);
    // Group shapes nest `<p:sp>` elements.
    let mut shapes: Vec<Shape> = Vec::new();
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("malformed XML at byte {}: {e}", reader.buffer_position()))?;
        match event {
            Event::Start(e) => {
                let name = e.local_name();
                if name.as_ref() == b"sp" {
                    shapes.push(Shape::default());
                    continue;
                }
                let Some(shape) = shapes.last_mut() else { continue };
                match name.as_ref() {
                    b"txBody" => {
                        shape.has_text_frame = true;
                        shape.in_text_frame = true;
                    }
                    b"p" if shape.in_text_frame => shape.paragraphs.push(String::new()),
                    b"t" if shape.in_text_frame => in_text = true,
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let Some(shape) = shapes.last_mut() else { continue };
                match e.local_name().as_ref() {
                    b"txBody" => shape.has_text_frame = true,
                    b"p" if shape.in_text_frame => shape.paragraphs.push(String::new()),
                    b"br" if shape.in_text_frame => shape.push_text("\n"),
                    _ => {}
                }
            }
            Event::Text(e) if in_text => {
                let text = e.unescape().map_err(|e| format!("bad text: {e}"))?;
                if let Some(shape) = shapes.last_mut() {
                    shape.push_text(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"txBody" => {
                    if let Some(shape) = shapes.last_mut() {
                        shape.in_text_frame = false;
                    }
                }
                b"sp" => {
                    if let Some(shape) = shapes.pop() {
                        if shape.has_text_frame {
                            out.push_str(&shape.paragraphs.join("\n"));
                            out.push('\n');
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}
