use crate::catalog::{self, ColumnKey, LinkTemplate, RenderMode};
use crate::record::Record;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// HTML cell content with hyperlinks.
    Display,
    /// Plain text for the delimited export.
    Export,
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Collapse every line break (`\r\n`, `\n` or a bare `\r`) to one space.
pub fn normalize_newlines(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(|c: char| c == '\n' || c == '\r', " ")
}

fn anchor(href: &str, text: &str) -> String {
    format!(
        r#"<a href="{}" target="_blank">{}</a>"#,
        escape_html(href),
        escape_html(text)
    )
}

fn link_list(template: &LinkTemplate, raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| anchor(&template.url(item), item))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_colon(value: &str) -> String {
    value.replace(':', "%3A")
}

/// Formats record fields for the results table and the export file.
#[derive(Clone, Debug)]
pub struct Renderer {
    assets_url: String,
    export_asset_urls: bool,
}

impl Renderer {
    pub fn new(assets_url: &str) -> Self {
        Self {
            assets_url: assets_url.trim().trim_end_matches('/').to_string(),
            export_asset_urls: false,
        }
    }

    /// Export the validation report column as its full asset URL instead of
    /// the bare filename.
    pub fn with_export_asset_urls(mut self, enabled: bool) -> Self {
        self.export_asset_urls = enabled;
        self
    }

    pub fn assets_url(&self) -> &str {
        &self.assets_url
    }

    pub fn asset_url(&self, id: &str, filename: &str) -> String {
        format!("{}/{}/{}", self.assets_url, id, filename)
    }

    pub fn render(&self, key: ColumnKey, record: &Record, mode: Mode) -> String {
        match mode {
            Mode::Display => self.display(key, record),
            Mode::Export => self.export(key, record),
        }
    }

    fn display(&self, key: ColumnKey, record: &Record) -> String {
        let value = record.field(key);
        match key.descriptor().mode {
            RenderMode::Plain => escape_html(value),
            RenderMode::MultiLinkList(template) => link_list(&template, value),
            RenderMode::ConditionalLink(template) => {
                let value = value.trim();
                if value.is_empty() {
                    String::new()
                } else {
                    anchor(&template.url(value), value)
                }
            }
            RenderMode::DerivedAssetLink => {
                if !record.has(key) {
                    return String::new();
                }
                anchor(&self.asset_url(record.avr_pdf_uuid(), value), value)
            }
            RenderMode::LegacyRevisionLink => match record.previous_version_pdf_filename() {
                Some(filename) => {
                    let uuid = record.previous_version_pdf_uuid().replace('-', "");
                    anchor(&self.asset_url(&uuid, filename), value)
                }
                None => String::new(),
            },
            RenderMode::EmailLink => {
                if value.is_empty() {
                    String::new()
                } else {
                    anchor(&format!("mailto:{value}"), value)
                }
            }
            RenderMode::IdentifierEscapedLink(template) => {
                if value.is_empty() {
                    String::new()
                } else {
                    anchor(&template.url(&escape_colon(value)), value)
                }
            }
            RenderMode::CatalogLink => match catalog::omap_purl(value) {
                Some(url) => anchor(url, value),
                None => escape_html(value),
            },
        }
    }

    fn export(&self, key: ColumnKey, record: &Record) -> String {
        let value = normalize_newlines(record.field(key));
        let uuid = record.avr_pdf_uuid().trim();
        if key == ColumnKey::AvrPdfFilename
            && self.export_asset_urls
            && !value.is_empty()
            && !uuid.is_empty()
        {
            return self.asset_url(uuid, &value).replace(',', "%2C");
        }
        value
    }
}
