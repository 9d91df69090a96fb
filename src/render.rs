// Inline markup rendering for generated text

/// Render raw generated text into a safe markup fragment.
///
/// The passes run in a fixed order: HTML escaping, strong emphasis (`**x**`),
/// light emphasis (`*x*`), numbered list lines, then line breaks. Every pass
/// after escaping works on already-escaped text and never escapes its own
/// output. Unpaired delimiters stay as literal characters.
pub fn render(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let escaped = escape(text);
    let strong = replace_strong(&escaped);
    let emphasized = replace_emphasis(&strong);
    let listed = replace_list_items(&emphasized);
    listed.replace('\n', "<br>")
}

/// Escape `&`, `<` and `>`. `&` goes first so entities are never double-escaped.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// `**x**` -> `<strong>x</strong>`.
///
/// A pair never spans a newline and closes at the nearest `**`. When an
/// opening `**` has no partner on its line, scanning resumes one byte later.
fn replace_strong(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'*' {
            if let Some(close) = find_strong_close(bytes, i + 2) {
                out.push_str(&text[copied..i]);
                out.push_str("<strong>");
                out.push_str(&text[i + 2..close]);
                out.push_str("</strong>");
                i = close + 2;
                copied = i;
                continue;
            }
        }
        i += 1;
    }

    out.push_str(&text[copied..]);
    out
}

fn find_strong_close(bytes: &[u8], from: usize) -> Option<usize> {
    let mut j = from;
    while j + 1 < bytes.len() {
        match bytes[j] {
            b'\n' => return None,
            b'*' if bytes[j + 1] == b'*' => return Some(j),
            _ => j += 1,
        }
    }
    None
}

/// `*x*` -> `<em>x</em>`, only for single asterisks.
///
/// Both delimiters must be lone: the byte before and after each one is not
/// another `*`. Neighbours are read from the input of this pass, so an
/// asterisk adjacent to an already consumed delimiter still counts.
fn replace_emphasis(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if is_lone_star(bytes, i) {
            if let Some(close) = find_emphasis_close(bytes, i + 1) {
                out.push_str(&text[copied..i]);
                out.push_str("<em>");
                out.push_str(&text[i + 1..close]);
                out.push_str("</em>");
                i = close + 1;
                copied = i;
                continue;
            }
        }
        i += 1;
    }

    out.push_str(&text[copied..]);
    out
}

fn is_lone_star(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b'*'
        && (i == 0 || bytes[i - 1] != b'*')
        && bytes.get(i + 1).is_none_or(|&b| b != b'*')
}

fn find_emphasis_close(bytes: &[u8], from: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        if bytes[j] == b'\n' {
            return None;
        }
        if is_lone_star(bytes, j) {
            return Some(j);
        }
        j += 1;
    }
    None
}

/// Lines shaped `<digits>. <rest>` become a labelled list item.
///
/// The whitespace after the period must be on the same line; the item body
/// is whatever remains of that line, possibly empty. `"1.\nfoo"` is therefore
/// two plain lines, not an item whose body is `foo`. Streamed fragments never
/// contain a newline, so this only shows for text given to `render` directly.
fn replace_list_items(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        match split_list_item(line) {
            Some((number, body)) => {
                out.push_str("<div class=\"list-item\"><span class=\"list-num\">");
                out.push_str(number);
                out.push_str(".</span> ");
                out.push_str(body);
                out.push_str("</div>");
            }
            None => out.push_str(line),
        }
    }
    out
}

fn split_list_item(line: &str) -> Option<(&str, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    let body = rest.trim_start_matches(|c: char| c.is_whitespace());
    if body.len() == rest.len() {
        return None;
    }
    Some((&line[..digits], body))
}

/// A stretch of rendered text and the styles in effect over it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledRun {
    pub text: String,
    pub strong: bool,
    pub emphasis: bool,
    pub list_number: bool,
}

/// Read markup produced by [`render`] back as styled runs, one `Vec` per
/// `<br>`-separated line.
///
/// Tags only switch styles on and off, entities are decoded, and text is
/// never added or dropped, so a terminal view built from these runs shows
/// exactly the characters the markup displays.
pub fn markup_lines(markup: &str) -> Vec<Vec<StyledRun>> {
    let mut lines = vec![Vec::new()];
    let mut style = StyledRun::default();
    let mut rest = markup;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('<') {
            let Some(end) = after.find('>') else {
                push_run(&mut lines, &style, rest);
                break;
            };
            match after[..end].split_whitespace().next().unwrap_or_default() {
                "br" => lines.push(Vec::new()),
                "strong" => style.strong = true,
                "/strong" => style.strong = false,
                "em" => style.emphasis = true,
                "/em" => style.emphasis = false,
                "span" => style.list_number = true,
                "/span" => style.list_number = false,
                _ => {}
            }
            rest = &after[end + 1..];
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            push_run(&mut lines, &style, &rest[..end]);
            rest = &rest[end..];
        }
    }

    lines
}

fn push_run(lines: &mut [Vec<StyledRun>], style: &StyledRun, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(line) = lines.last_mut() {
        line.push(StyledRun {
            text: decode_entities(text),
            ..style.clone()
        });
    }
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let (ch, len) = if rest.starts_with("&amp;") {
            ('&', 5)
        } else if rest.starts_with("&lt;") {
            ('<', 4)
        } else if rest.starts_with("&gt;") {
            ('>', 4)
        } else {
            ('&', 1)
        };
        out.push(ch);
        rest = &rest[len..];
    }
    out.push_str(rest);
    out
}

/// Plain text of rendered markup: tags stripped, `<br>` as newline.
#[cfg(test)]
pub(crate) fn markup_to_text(markup: &str) -> String {
    let with_breaks = markup.replace("<br>", "\n");
    let mut out = String::with_capacity(with_breaks.len());
    let mut in_tag = false;
    for ch in with_breaks.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
