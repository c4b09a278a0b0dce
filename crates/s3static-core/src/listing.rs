//! Directory listing entries and HTML rendering.
//!
//! Listing is the last step of the try-files chain: when every candidate key
//! is missing, a directory-style request on a policy that allows listing gets
//! an HTML index of the keys under the request prefix.

use std::cmp::Ordering;

use maud::{DOCTYPE, Markup, PreEscaped, html};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::error::RenderError;

/// Characters escaped in listing links. `/` is kept so hrefs stay paths.
const HREF_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const DIRECTORY_CSS: &str = r#"
* { box-sizing: border-box; }
body { margin: 0; font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; color: #24292f; background: #fff; }
header { padding: 24px 32px 8px; border-bottom: 1px solid #d0d7de; }
h1 { margin: 0 0 8px; font-size: 20px; font-weight: 600; word-break: break-all; }
.bucket { margin: 0 0 12px; font-size: 13px; color: #57606a; }
ul#files { list-style: none; margin: 0; padding: 16px 32px; }
ul#files li { border-bottom: 1px solid #eaeef2; }
ul#files a { display: block; padding: 8px 4px 8px 28px; color: #0969da; text-decoration: none; position: relative; word-break: break-all; }
ul#files a:hover { background: #f6f8fa; }
ul#files a::before { position: absolute; left: 4px; }
a.folder::before { content: "\1F4C1"; }
a.file::before { content: "\1F4C4"; }
"#;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Display name, relative to the listed prefix.
    pub name: String,
    /// Whether the entry is a common prefix ("sub-directory").
    pub is_directory: bool,
    /// Absolute link to the entry.
    pub href: String,
}

impl ListingEntry {
    /// Build an entry from a listed key, or `None` if the key is the prefix
    /// itself, empty, or outside the prefix.
    #[must_use]
    pub fn from_key(prefix: &str, key: &str) -> Option<Self> {
        if key.is_empty() || key == prefix {
            return None;
        }
        let name = key.strip_prefix(prefix)?;
        Some(Self {
            name: name.to_owned(),
            is_directory: name.ends_with('/'),
            href: format!("/{}", utf8_percent_encode(key, HREF_ENCODE_SET)),
        })
    }

    /// CSS class used by the default renderer.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        if self.is_directory { "folder" } else { "file txt" }
    }
}

/// Renders listing entries into an HTML document.
pub trait ListingRenderer: Send + Sync + 'static {
    /// Render the listing of `prefix` in `bucket`.
    fn render(
        &self,
        bucket: &str,
        prefix: &str,
        entries: &[ListingEntry],
    ) -> Result<String, RenderError>;
}

/// Default renderer: a self-contained HTML page, directories first.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlListingRenderer;

impl HtmlListingRenderer {
    fn markup(bucket: &str, prefix: &str, entries: &[&ListingEntry]) -> Markup {
        let heading = format!("Index of /{prefix}");
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (heading) }
                    style { (PreEscaped(DIRECTORY_CSS)) }
                }
                body {
                    header {
                        h1 { (heading) }
                        p class="bucket" { "bucket: " (bucket) }
                    }
                    ul id="files" {
                        @if let Some(parent) = parent_href(prefix) {
                            li { a class="folder parent" href=(parent) { ".." } }
                        }
                        @for entry in entries {
                            li {
                                a class=(entry.class_name()) href=(entry.href) title=(entry.name) {
                                    (entry.name)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

impl ListingRenderer for HtmlListingRenderer {
    fn render(
        &self,
        bucket: &str,
        prefix: &str,
        entries: &[ListingEntry],
    ) -> Result<String, RenderError> {
        let mut sorted: Vec<&ListingEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| compare_entries(a, b));
        Ok(Self::markup(bucket, prefix, &sorted).into_string())
    }
}

fn compare_entries(a: &ListingEntry, b: &ListingEntry) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| a.name.cmp(&b.name))
}

/// Link to the parent of `prefix`, `None` at the bucket root.
fn parent_href(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    let parent = match trimmed.rfind('/') {
        Some(pos) => &trimmed[..=pos],
        None => "",
    };
    Some(format!("/{}", utf8_percent_encode(parent, HREF_ENCODE_SET)))
}
