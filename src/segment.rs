// Record segmentation over the accumulated response text

/// Horizontal rule separating records. Pure separator, never restored.
pub const RULE: &str = "---";

/// Header that opens every test case record.
pub const RECORD_MARKER: &str = "**Test Case ID:**";

/// Summary text plus the record bodies inferred from the delimiter convention.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segments {
    pub summary: String,
    pub records: Vec<String>,
}

impl Segments {
    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }
}

/// Split `text` into a summary and record bodies.
///
/// Both [`RULE`] and [`RECORD_MARKER`] act as delimiters. Without any
/// delimiter the whole text is the summary. Otherwise the text before the
/// first delimiter is the summary (trimmed) and every later non-blank piece is
/// a record. When the marker occurs anywhere in `text`, it is put back in
/// front of every record since splitting consumed it.
pub fn segment(text: &str) -> Segments {
    let parts = split_on_delimiters(text);

    if parts.len() <= 1 {
        return Segments {
            summary: text.to_string(),
            records: Vec::new(),
        };
    }

    let restore_marker = text.contains(RECORD_MARKER);
    let records = parts[1..]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(|part| {
            if restore_marker {
                format!("{RECORD_MARKER} {part}")
            } else {
                part.to_string()
            }
        })
        .collect();

    Segments {
        summary: parts[0].trim().to_string(),
        records,
    }
}

/// Split on whichever delimiter occurs first, scanning left to right.
fn split_on_delimiters(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        let matched = if rest.starts_with(RULE) {
            Some(RULE.len())
        } else if rest.starts_with(RECORD_MARKER) {
            Some(RECORD_MARKER.len())
        } else {
            None
        };

        match matched {
            Some(len) => {
                parts.push(&text[start..i]);
                i += len;
                start = i;
            }
            None => i += rest.chars().next().map_or(1, char::len_utf8),
        }
    }

    parts.push(&text[start..]);
    parts
}
