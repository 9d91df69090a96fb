// Structural formatting: summary block plus one card per record

use crate::render::render;
use crate::segment::segment;

/// One rendered record card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMarkup {
    /// Rendered card body.
    pub body: String,
    /// The record text before rendering, used for clipboard export.
    pub copy_source: String,
}

/// The document derived from the accumulated response text.
///
/// Never stored: it is rebuilt from the whole buffer after every fragment.
/// With no records the summary holds the plain rendering of the full text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub summary: String,
    pub summary_markup: String,
    pub records: Vec<RecordMarkup>,
}

impl Document {
    pub fn from_text(text: &str) -> Self {
        let segments = segment(text);

        if !segments.has_records() {
            return Self {
                summary: text.to_string(),
                summary_markup: render(text),
                records: Vec::new(),
            };
        }

        let records = segments
            .records
            .into_iter()
            .map(|record| RecordMarkup {
                body: render(&record),
                copy_source: record,
            })
            .collect();

        Self {
            summary_markup: render(&segments.summary),
            summary: segments.summary,
            records,
        }
    }

    pub fn is_carded(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.records.is_empty()
    }

    /// Assemble the final markup string.
    pub fn markup(&self) -> String {
        if !self.is_carded() {
            return self.summary_markup.clone();
        }

        let mut html = String::new();
        if !self.summary.is_empty() {
            html.push_str("<div class=\"summary-text\">");
            html.push_str(&self.summary_markup);
            html.push_str("</div>");
        }
        for (index, record) in self.records.iter().enumerate() {
            html.push_str(&card_markup(index, &record.body));
        }
        html
    }
}

fn card_markup(index: usize, body: &str) -> String {
    format!(
        "<div class=\"tc-card\" id=\"tc-card-{index}\">\
         <div class=\"tc-card-body\">{body}</div>\
         <button class=\"tc-copy-btn\" data-card=\"{index}\" title=\"Copy Test Case\">Copy</button>\
         </div>"
    )
}

/// Format the accumulated text into document markup.
pub fn format(text: &str) -> String {
    Document::from_text(text).markup()
}
