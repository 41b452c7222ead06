//! Presentational markup shared by the measurer and the page renderer.
//!
//! A section is turned into a title block plus either a flat body (scalar text,
//! tag lines) or one block group per item. The measurer lays these blocks out to
//! read heights; the renderer paints exactly the same blocks. Because both sides
//! start from this module, a measured height always describes what gets printed.

use uuid::Uuid;

use crate::models::resume::{date_range, ResumeDocument};
use crate::models::sections::SectionKey;
use crate::pagination::content::{has_content, non_blank};

/// Gap painted below every entry of a list section; counted as part of the entry.
pub const ITEM_GAP_PX: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Name,
    Headline,
    Contact,
    SectionTitle,
    EntryTitle,
    EntryMeta,
    Paragraph,
    Bullet,
    TagLine,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub font_size: f32,
    pub line_height: f32,
    pub margin_bottom: f32,
    /// Rule drawn under the text, between the line box and the margin.
    pub border_bottom: f32,
    pub indent: f32,
    pub bold: bool,
}

impl BlockKind {
    pub fn style(self) -> BlockStyle {
        let (font_size, line_height, margin_bottom, border_bottom, indent, bold) = match self {
            BlockKind::Name => (28.0, 34.0, 4.0, 0.0, 0.0, true),
            BlockKind::Headline => (16.0, 22.0, 4.0, 0.0, 0.0, false),
            BlockKind::Contact => (13.0, 18.0, 16.0, 0.0, 0.0, false),
            BlockKind::SectionTitle => (16.0, 22.0, 8.0, 2.0, 0.0, true),
            BlockKind::EntryTitle => (15.0, 20.0, 2.0, 0.0, 0.0, true),
            BlockKind::EntryMeta => (13.0, 18.0, 4.0, 0.0, 0.0, false),
            BlockKind::Paragraph => (14.0, 20.0, 4.0, 0.0, 0.0, false),
            BlockKind::Bullet => (14.0, 20.0, 2.0, 0.0, 16.0, false),
            BlockKind::TagLine => (14.0, 20.0, 0.0, 0.0, 0.0, false),
        };
        BlockStyle {
            font_size,
            line_height,
            margin_bottom,
            border_bottom,
            indent,
            bold,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            BlockKind::Name => "rw-name",
            BlockKind::Headline => "rw-headline",
            BlockKind::Contact => "rw-contact",
            BlockKind::SectionTitle => "rw-section-title",
            BlockKind::EntryTitle => "rw-entry-title",
            BlockKind::EntryMeta => "rw-entry-meta",
            BlockKind::Paragraph => "rw-paragraph",
            BlockKind::Bullet => "rw-bullet",
            BlockKind::TagLine => "rw-tags",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

impl Block {
    fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemMarkup {
    pub id: Uuid,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Text(Vec<Block>),
    Items(Vec<ItemMarkup>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionMarkup {
    pub key: SectionKey,
    pub title: Block,
    pub body: SectionBody,
}

impl SectionMarkup {
    pub fn items(&self) -> &[ItemMarkup] {
        match &self.body {
            SectionBody::Items(items) => items,
            SectionBody::Text(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMarkup {
    pub blocks: Vec<Block>,
}

// ────────────────────────────────────────────────────────────────────────────
// Builders
// ────────────────────────────────────────────────────────────────────────────

pub fn header_markup(doc: &ResumeDocument) -> HeaderMarkup {
    let info = &doc.personal_info;
    let mut blocks = Vec::new();
    let name = info.full_name.trim();
    blocks.push(Block::new(
        BlockKind::Name,
        if name.is_empty() { "Your Name" } else { name },
    ));
    push_if(&mut blocks, BlockKind::Headline, &info.headline);
    let contact = info.contact_fields().join(" · ");
    push_if(&mut blocks, BlockKind::Contact, &contact);
    HeaderMarkup { blocks }
}

/// Builds the markup for one section, or `None` when it has nothing to render.
pub fn section_markup(key: SectionKey, title: &str, doc: &ResumeDocument) -> Option<SectionMarkup> {
    if !has_content(key, doc) {
        return None;
    }

    let body = match key {
        SectionKey::Summary => SectionBody::Text(paragraphs(&doc.summary)),
        SectionKey::PersonalStatement => SectionBody::Text(paragraphs(&doc.personal_statement)),
        SectionKey::Skills => SectionBody::Text(vec![tag_line(&doc.skills)]),
        SectionKey::Interests => SectionBody::Text(vec![tag_line(&doc.interests)]),
        SectionKey::Languages => {
            let line = doc
                .languages
                .iter()
                .filter(|l| !l.name.trim().is_empty())
                .map(|l| match l.proficiency.trim() {
                    "" => l.name.trim().to_string(),
                    p => format!("{} ({p})", l.name.trim()),
                })
                .collect::<Vec<_>>()
                .join(" · ");
            SectionBody::Text(vec![Block::new(BlockKind::TagLine, line)])
        }
        SectionKey::Experience => SectionBody::Items(
            doc.experience
                .iter()
                .map(|e| {
                    let mut blocks = vec![Block::new(
                        BlockKind::EntryTitle,
                        joined(&[&e.position, &e.company], " at "),
                    )];
                    let dates = date_range(&e.start_date, &e.end_date, e.current);
                    push_if(&mut blocks, BlockKind::EntryMeta, &joined(&[&dates, &e.location], " | "));
                    blocks.extend(paragraphs(&e.description));
                    blocks.extend(bullets(&e.achievements));
                    ItemMarkup { id: e.id, blocks }
                })
                .collect(),
        ),
        SectionKey::Education => SectionBody::Items(
            doc.education
                .iter()
                .map(|e| {
                    let mut blocks = vec![Block::new(
                        BlockKind::EntryTitle,
                        joined(&[&e.degree, &e.institution], ", "),
                    )];
                    let dates = date_range(&e.start_date, &e.end_date, false);
                    let gpa = match e.gpa.trim() {
                        "" => String::new(),
                        g => format!("GPA {g}"),
                    };
                    push_if(
                        &mut blocks,
                        BlockKind::EntryMeta,
                        &joined(&[&dates, &e.location, &gpa], " | "),
                    );
                    blocks.extend(paragraphs(&e.description));
                    ItemMarkup { id: e.id, blocks }
                })
                .collect(),
        ),
        SectionKey::Projects => SectionBody::Items(
            doc.projects
                .iter()
                .map(|p| {
                    let mut blocks = vec![Block::new(BlockKind::EntryTitle, p.name.trim())];
                    let dates = date_range(&p.start_date, &p.end_date, false);
                    push_if(&mut blocks, BlockKind::EntryMeta, &joined(&[&dates, &p.link], " | "));
                    blocks.extend(paragraphs(&p.description));
                    if non_blank(&p.technologies).next().is_some() {
                        blocks.push(tag_line(&p.technologies));
                    }
                    ItemMarkup { id: p.id, blocks }
                })
                .collect(),
        ),
        SectionKey::Achievements => SectionBody::Items(
            doc.achievements
                .iter()
                .map(|a| {
                    let mut blocks = vec![Block::new(
                        BlockKind::EntryTitle,
                        joined(&[&a.title, &a.date], " — "),
                    )];
                    blocks.extend(paragraphs(&a.description));
                    ItemMarkup { id: a.id, blocks }
                })
                .collect(),
        ),
        SectionKey::Certifications => SectionBody::Items(
            doc.certifications
                .iter()
                .map(|c| {
                    let mut blocks = vec![Block::new(BlockKind::EntryTitle, c.name.trim())];
                    let credential = match c.credential_id.trim() {
                        "" => String::new(),
                        id => format!("ID {id}"),
                    };
                    push_if(
                        &mut blocks,
                        BlockKind::EntryMeta,
                        &joined(&[&c.issuer, &c.date, &credential], " | "),
                    );
                    ItemMarkup { id: c.id, blocks }
                })
                .collect(),
        ),
        SectionKey::Volunteer => SectionBody::Items(
            doc.volunteer
                .iter()
                .map(|v| {
                    let mut blocks = vec![Block::new(
                        BlockKind::EntryTitle,
                        joined(&[&v.role, &v.organization], " at "),
                    )];
                    let dates = date_range(&v.start_date, &v.end_date, false);
                    push_if(&mut blocks, BlockKind::EntryMeta, &dates);
                    blocks.extend(paragraphs(&v.description));
                    ItemMarkup { id: v.id, blocks }
                })
                .collect(),
        ),
        SectionKey::Publications => SectionBody::Items(
            doc.publications
                .iter()
                .map(|p| {
                    let mut blocks = vec![Block::new(BlockKind::EntryTitle, p.title.trim())];
                    push_if(
                        &mut blocks,
                        BlockKind::EntryMeta,
                        &joined(&[&p.publisher, &p.date, &p.link], " | "),
                    );
                    blocks.extend(paragraphs(&p.description));
                    ItemMarkup { id: p.id, blocks }
                })
                .collect(),
        ),
        SectionKey::References => SectionBody::Items(
            doc.references
                .iter()
                .map(|r| {
                    let mut blocks = vec![Block::new(BlockKind::EntryTitle, r.name.trim())];
                    push_if(
                        &mut blocks,
                        BlockKind::EntryMeta,
                        &joined(&[&r.position, &r.company, &r.relationship], " | "),
                    );
                    push_if(
                        &mut blocks,
                        BlockKind::EntryMeta,
                        &joined(&[&r.email, &r.phone], " · "),
                    );
                    ItemMarkup { id: r.id, blocks }
                })
                .collect(),
        ),
    };

    Some(SectionMarkup {
        key,
        title: Block::new(BlockKind::SectionTitle, title),
        body,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn push_if(blocks: &mut Vec<Block>, kind: BlockKind, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        blocks.push(Block::new(kind, text));
    }
}

fn joined<S: AsRef<str>>(parts: &[S], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// One paragraph block per non-blank line of free text.
fn paragraphs(text: &str) -> Vec<Block> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| Block::new(BlockKind::Paragraph, l))
        .collect()
}

fn bullets(lines: &[String]) -> Vec<Block> {
    non_blank(lines)
        .map(|l| Block::new(BlockKind::Bullet, l))
        .collect()
}

fn tag_line(tags: &[String]) -> Block {
    Block::new(BlockKind::TagLine, non_blank(tags).collect::<Vec<_>>().join(" · "))
}
