//! Page renderer — paints each packed page as a fixed-size HTML fragment.
//!
//! Every section fragment is rebuilt from the resume model using the same
//! [`markup`](crate::pagination::markup) the measurer laid out, filtered to the
//! entry ids the packer assigned to the page. Nothing is cut out of a larger
//! rendered tree, so a split entry list stays structurally valid on both pages.

use std::fmt::Write as _;

use serde::Serialize;
use tracing::warn;

use crate::errors::AppError;
use crate::models::theme::Theme;
use crate::pagination::font_metrics::FontFamily;
use crate::pagination::markup::{
    header_markup, section_markup, Block, BlockKind, ItemMarkup, SectionBody, ITEM_GAP_PX,
};
use crate::pagination::packer::{PageLayout, PageSection};
use crate::pagination::page_setup::{MarginPreset, PageSetup, PaperSize};
use crate::pagination::pipeline::{Fidelity, LayoutSnapshot, Pagination};

const EMPTY_PAGE_NOTICE: &str = "Add content to your resume to see it laid out here.";

#[derive(Debug, Clone, Serialize)]
pub struct RenderedPage {
    pub page_number: usize,
    pub width_px: f32,
    pub height_px: f32,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub paper: PaperSize,
    pub margin: MarginPreset,
    pub width_px: f32,
    pub height_px: f32,
    pub page_count: usize,
    pub pages: Vec<RenderedPage>,
}

/// Assembles the printable document from a measured pagination.
///
/// Estimated paginations are rejected: their heights were never laid out and
/// may overflow the physical page.
pub fn render_document(pagination: &Pagination, snapshot: &LayoutSnapshot) -> Result<RenderedDocument, AppError> {
    if pagination.fidelity != Fidelity::Measured {
        return Err(AppError::Validation(
            "Only measured paginations can be exported".to_string(),
        ));
    }

    let total = pagination.page_count();
    let pages = pagination
        .pages
        .iter()
        .map(|page| render_page(page, total, &pagination.page, snapshot))
        .collect();

    Ok(RenderedDocument {
        paper: pagination.page.paper,
        margin: pagination.page.margin,
        width_px: pagination.page.page_width(),
        height_px: pagination.page.page_height(),
        page_count: total,
        pages,
    })
}

pub fn render_page(page: &PageLayout, total_pages: usize, setup: &PageSetup, snapshot: &LayoutSnapshot) -> RenderedPage {
    let doc = snapshot.document.as_ref();
    let theme = &snapshot.theme;
    let mut html = String::new();

    let font_stack = match setup.font {
        FontFamily::Sans => "Helvetica, Arial, sans-serif",
        FontFamily::Serif => "'Times New Roman', Times, serif",
    };
    let _ = write!(
        html,
        r#"<div class="rw-page" data-page="{}" style="position:relative;box-sizing:border-box;overflow:hidden;width:{}px;height:{}px;padding:{}px;font-family:{};color:{};background:#ffffff">"#,
        page.page_number,
        setup.page_width(),
        setup.page_height(),
        setup.margin.px(),
        font_stack,
        escape_html(&theme.text),
    );

    if page.has_header {
        html.push_str(r#"<header class="rw-header" style="display:flow-root">"#);
        for block in &header_markup(doc).blocks {
            push_block(&mut html, block, theme);
        }
        let _ = write!(html, "</header><div style=\"height:{}px\"></div>", setup.section_spacing_px);
    }

    // A header-only page 1 ahead of other pages is not an empty document.
    if page.is_placeholder() && total_pages == 1 {
        let _ = write!(
            html,
            r#"<p class="rw-empty" style="color:{};font-size:14px">{}</p>"#,
            escape_html(&theme.secondary),
            EMPTY_PAGE_NOTICE
        );
    }

    for section in &page.sections {
        push_section(&mut html, section, setup, snapshot);
    }

    let _ = write!(
        html,
        r#"<footer class="rw-page-footer" style="position:absolute;left:0;right:0;bottom:{}px;text-align:center;font-size:11px;color:{}">Page {} of {}</footer></div>"#,
        (setup.margin.px() / 2.0).round(),
        escape_html(&theme.secondary),
        page.page_number,
        total_pages
    );

    RenderedPage {
        page_number: page.page_number,
        width_px: setup.page_width(),
        height_px: setup.page_height(),
        html,
    }
}

fn push_section(html: &mut String, section: &PageSection, setup: &PageSetup, snapshot: &LayoutSnapshot) {
    let key = section.section_id;
    let Some(markup) = section_markup(key, snapshot.sections.title_of(key), snapshot.document.as_ref()) else {
        warn!(section = %key, "Packed section has no content in this snapshot; skipping");
        return;
    };
    let theme = &snapshot.theme;

    let _ = write!(
        html,
        r#"<section class="rw-section" data-section="{}" data-partial="{}" style="display:flow-root;margin-bottom:{}px">"#,
        key, section.is_partial, setup.section_spacing_px
    );
    push_block(html, &markup.title, theme);

    match &markup.body {
        SectionBody::Text(blocks) => {
            for block in blocks {
                push_block(html, block, theme);
            }
        }
        // Whole sections from estimates carry no ids; paint every entry.
        SectionBody::Items(entries) if section.items.is_empty() && !section.is_partial => {
            for entry in entries {
                push_entry(html, entry, theme);
            }
        }
        SectionBody::Items(entries) => {
            for id in &section.items {
                match entries.iter().find(|e| e.id == *id) {
                    Some(entry) => push_entry(html, entry, theme),
                    None => warn!(section = %key, item = %id, "Packed entry not found in document"),
                }
            }
        }
    }

    html.push_str("</section>");
}

fn push_entry(html: &mut String, entry: &ItemMarkup, theme: &Theme) {
    let _ = write!(
        html,
        r#"<div class="rw-entry" data-item-id="{}" style="display:flow-root;margin-bottom:{}px">"#,
        entry.id, ITEM_GAP_PX
    );
    for block in &entry.blocks {
        push_block(html, block, theme);
    }
    html.push_str("</div>");
}

fn push_block(html: &mut String, block: &Block, theme: &Theme) {
    let style = block.kind.style();
    let color = match block.kind {
        BlockKind::Name | BlockKind::SectionTitle => &theme.primary,
        BlockKind::Headline | BlockKind::Contact | BlockKind::EntryMeta => &theme.secondary,
        _ => &theme.text,
    };
    let rule = if style.border_bottom > 0.0 {
        format!(";border-bottom:{}px solid {}", style.border_bottom, escape_html(&theme.accent))
    } else {
        String::new()
    };
    let _ = write!(
        html,
        r#"<div class="{}" style="font-size:{}px;line-height:{}px;margin:0 0 {}px {}px;font-weight:{};color:{}{}">{}</div>"#,
        block.kind.css_class(),
        style.font_size,
        style.line_height,
        style.margin_bottom,
        style.indent,
        if style.bold { 700 } else { 400 },
        escape_html(color),
        rule,
        escape_html(&block.text),
    );
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
