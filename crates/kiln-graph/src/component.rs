//! Single-file component splitting.
//!
//! Finds the `<template>`, `<script>` and `<style>` blocks of a component
//! file with `memchr` substring search.

use memchr::memmem;

use crate::error::ScanError;

/// One top-level block of a component file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub content: &'a str,
    /// Byte offset of `content` in the file
    pub offset: usize,
    /// `lang` attribute, if present
    pub lang: Option<&'a str>,
    pub scoped: bool,
}

/// The blocks of a component file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentParts<'a> {
    pub template: Option<Block<'a>>,
    pub script: Option<Block<'a>>,
    pub styles: Vec<Block<'a>>,
}

/// Split a component file into its blocks.
pub fn split_component(source: &str) -> Result<ComponentParts<'_>, ScanError> {
    let mut parts = ComponentParts::default();

    // template first: its content may itself contain tags
    let mut template_range = None;
    if let Some(block) = find_outer_block(source, "template")? {
        template_range = Some((block.offset, block.offset + block.content.len()));
        parts.template = Some(block);
    }

    let outside_template = |pos: usize| match template_range {
        Some((start, end)) => pos < start || pos > end,
        None => true,
    };

    for block in find_blocks(source, "script")? {
        if !outside_template(block.offset) {
            continue;
        }
        if parts.script.is_some() {
            return Err(ScanError::DuplicateBlock { tag: "script" });
        }
        parts.script = Some(block);
    }

    parts.styles = find_blocks(source, "style")?
        .into_iter()
        .filter(|b| outside_template(b.offset))
        .collect();

    Ok(parts)
}

/// Every `<tag …>…</tag>` block, in order. Blocks do not nest.
fn find_blocks<'a>(source: &'a str, tag: &'static str) -> Result<Vec<Block<'a>>, ScanError> {
    let bytes = source.as_bytes();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut blocks = Vec::new();
    let mut pointer = 0;

    while let Some(found) = memmem::find(&bytes[pointer..], open.as_bytes()) {
        let start = pointer + found;
        let after_name = start + open.len();

        // `<scripts>` or `<styles-x>` are other elements
        if !bytes
            .get(after_name)
            .is_some_and(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'>' | b'/'))
        {
            pointer = after_name;
            continue;
        }

        let tag_end = find_closing_angle(bytes, after_name)
            .ok_or(ScanError::UnclosedBlock { tag, position: start })?;
        let attrs = &source[after_name..tag_end];

        if tag_end > 0 && bytes[tag_end - 1] == b'/' {
            blocks.push(Block {
                content: "",
                offset: tag_end + 1,
                lang: attribute(attrs, "lang"),
                scoped: has_flag(attrs, "scoped"),
            });
            pointer = tag_end + 1;
            continue;
        }

        let content_start = tag_end + 1;
        let content_end = memmem::find(&bytes[content_start..], close.as_bytes())
            .map(|pos| content_start + pos)
            .ok_or(ScanError::UnclosedBlock { tag, position: start })?;

        blocks.push(Block {
            content: &source[content_start..content_end],
            offset: content_start,
            lang: attribute(attrs, "lang"),
            scoped: has_flag(attrs, "scoped"),
        });
        pointer = content_end + close.len();
    }

    Ok(blocks)
}

/// The first top-level `<tag>` block, matched against its last closing tag
/// so nested elements of the same name stay inside.
fn find_outer_block<'a>(source: &'a str, tag: &'static str) -> Result<Option<Block<'a>>, ScanError> {
    let bytes = source.as_bytes();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let Some(start) = memmem::find(bytes, open.as_bytes()) else {
        return Ok(None);
    };
    let after_name = start + open.len();
    let tag_end = find_closing_angle(bytes, after_name)
        .ok_or(ScanError::UnclosedBlock { tag, position: start })?;
    let content_start = tag_end + 1;
    let content_end = memmem::rfind(&bytes[content_start..], close.as_bytes())
        .map(|pos| content_start + pos)
        .ok_or(ScanError::UnclosedBlock { tag, position: start })?;

    let attrs = &source[after_name..tag_end];
    Ok(Some(Block {
        content: &source[content_start..content_end],
        offset: content_start,
        lang: attribute(attrs, "lang"),
        scoped: false,
    }))
}

/// Closing `>` of an opening tag, skipping quoted attribute values.
fn find_closing_angle(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &byte) in bytes.get(start..)?.iter().enumerate() {
        match (byte, quote) {
            (b'"' | b'\'', None) => quote = Some(byte),
            (b, Some(q)) if b == q => quote = None,
            (b'>', None) => return Some(start + i),
            _ => {}
        }
    }
    None
}

fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let pos = attrs.find(&format!("{name}="))?;
    let value = attrs[pos + name.len() + 1..].trim_start();
    let quote = value.chars().next()?;
    if quote == '"' || quote == '\'' {
        let rest = &value[1..];
        rest.find(quote).map(|end| &rest[..end])
    } else {
        let end = value
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(value.len());
        Some(&value[..end])
    }
}

fn has_flag(attrs: &str, flag: &str) -> bool {
    attrs
        .split(|c: char| c.is_whitespace() || c == '/')
        .any(|word| word == flag)
}
