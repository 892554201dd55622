use crate::fetch::RawPage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a heading's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingSource {
    /// A real `<hN>` element
    Tag,
    /// Page-builder heading widget (`.elementor-heading-title`)
    PageBuilderWidget,
    /// CMS title class such as `.entry-title`
    CmsTitleClass,
    /// `og:title` meta tag
    OpenGraph,
    /// Generic heading-like CSS class (`.h2`, `.subtitle`, ...)
    CssClass,
}

impl HeadingSource {
    pub fn label(&self) -> &'static str {
        match self {
            HeadingSource::Tag => "tag",
            HeadingSource::PageBuilderWidget => "page builder widget",
            HeadingSource::CmsTitleClass => "CMS title class",
            HeadingSource::OpenGraph => "Open Graph title",
            HeadingSource::CssClass => "CSS class",
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, HeadingSource::Tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub text: String,
    pub source: HeadingSource,
}

impl Heading {
    pub fn new(text: impl Into<String>, source: HeadingSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headings {
    pub h1: Vec<Heading>,
    pub h2: Vec<Heading>,
    pub h3: Vec<Heading>,
    pub h4: Vec<Heading>,
    pub h5: Vec<Heading>,
    pub h6: Vec<Heading>,
}

impl Headings {
    pub fn level(&self, level: u8) -> &[Heading] {
        match level {
            1 => &self.h1,
            2 => &self.h2,
            3 => &self.h3,
            4 => &self.h4,
            5 => &self.h5,
            6 => &self.h6,
            _ => &[],
        }
    }

    pub(crate) fn level_mut(&mut self, level: u8) -> Option<&mut Vec<Heading>> {
        match level {
            1 => Some(&mut self.h1),
            2 => Some(&mut self.h2),
            3 => Some(&mut self.h3),
            4 => Some(&mut self.h4),
            5 => Some(&mut self.h5),
            6 => Some(&mut self.h6),
            _ => None,
        }
    }

    /// The h1 was recovered from something other than an `<h1>` tag.
    pub fn h1_from_fallback(&self) -> bool {
        self.h1.iter().any(|h| h.source.is_fallback())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub src: String,
    pub alt: String,
    pub has_alt: bool,
}

/// Everything extracted from one crawled page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSignals {
    pub url: String,
    pub status_code: u16,
    /// Seconds until the full body was received
    pub response_time: f64,
    pub title: String,
    pub meta_description: String,
    pub headings: Headings,
    pub images: Vec<ImageInfo>,
    pub content_length: usize,
    pub text_content: String,
    pub internal_links: usize,
    pub external_links: usize,
    pub canonical_url: Option<String>,
    pub open_graph: BTreeMap<String, String>,
    pub twitter: BTreeMap<String, String>,
    pub viewport: Option<String>,
    pub has_favicon: bool,
    pub error: Option<String>,
}

impl PageSignals {
    /// Degraded record for a page that could not be fetched.
    pub fn failed(raw: &RawPage) -> Self {
        Self {
            url: raw.url.clone(),
            status_code: raw.status_code,
            response_time: raw.elapsed.as_secs_f64(),
            error: Some(
                raw.error
                    .clone()
                    .unwrap_or_else(|| format!("HTTP {}", raw.status_code)),
            ),
            ..Self::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
