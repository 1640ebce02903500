//! Minimal markdown-to-HTML renderer for streamed bot answers.
//!
//! The stream pipeline re-renders the entire accumulated buffer after every
//! chunk, so this renderer must be deterministic over any prefix of the final
//! text: an unterminated code fence or bold span is closed at end of input
//! and simply re-opens correctly once the rest of the buffer arrives.
//!
//! Supported subset: fenced code blocks, ATX headings, unordered lists,
//! `**bold**`, `` `inline code` ``, and paragraphs.

/// Render a whole markdown buffer to HTML.
pub fn render(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + source.len() / 4);
    let mut paragraph: Vec<&str> = Vec::new();
    let mut list_items: Vec<&str> = Vec::new();
    let mut code_lines: Vec<&str> = Vec::new();
    let mut code_lang: Option<&str> = None;
    let mut in_code = false;

    for line in source.lines() {
        if in_code {
            if line.trim_start().starts_with("```") {
                flush_code(&mut out, &mut code_lines, code_lang.take());
                in_code = false;
            } else {
                code_lines.push(line);
            }
            continue;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            flush_paragraph(&mut out, &mut paragraph);
            flush_list(&mut out, &mut list_items);
            let lang = trimmed.trim_start_matches('`').trim();
            code_lang = (!lang.is_empty()).then_some(lang);
            in_code = true;
            continue;
        }

        if let Some((level, text)) = heading_line(trimmed) {
            flush_paragraph(&mut out, &mut paragraph);
            flush_list(&mut out, &mut list_items);
            out.push_str(&format!("<h{}>{}</h{}>\n", level, render_inline(text), level));
            continue;
        }

        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            flush_paragraph(&mut out, &mut paragraph);
            list_items.push(item);
            continue;
        }

        if trimmed.is_empty() {
            flush_paragraph(&mut out, &mut paragraph);
            flush_list(&mut out, &mut list_items);
            continue;
        }

        flush_list(&mut out, &mut list_items);
        paragraph.push(trimmed);
    }

    if in_code {
        flush_code(&mut out, &mut code_lines, code_lang);
    }
    flush_paragraph(&mut out, &mut paragraph);
    flush_list(&mut out, &mut list_items);

    out
}

fn heading_line(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&level) {
        line[level..].strip_prefix(' ').map(|text| (level, text))
    } else {
        None
    }
}

fn flush_paragraph(out: &mut String, lines: &mut Vec<&str>) {
    if lines.is_empty() {
        return;
    }
    out.push_str("<p>");
    out.push_str(&render_inline(&lines.join(" ")));
    out.push_str("</p>\n");
    lines.clear();
}

fn flush_list(out: &mut String, items: &mut Vec<&str>) {
    if items.is_empty() {
        return;
    }
    out.push_str("<ul>\n");
    for item in items.iter() {
        out.push_str(&format!("<li>{}</li>\n", render_inline(item)));
    }
    out.push_str("</ul>\n");
    items.clear();
}

fn flush_code(out: &mut String, lines: &mut Vec<&str>, lang: Option<&str>) {
    match lang {
        Some(lang) => out.push_str(&format!(
            "<pre><code class=\"language-{}\">",
            escape_html(lang)
        )),
        None => out.push_str("<pre><code>"),
    }
    for line in lines.iter() {
        out.push_str(&escape_html(line));
        out.push('\n');
    }
    out.push_str("</code></pre>\n");
    lines.clear();
}

/// Inline formatting: code spans first so bold markers inside them stay literal.
fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('`') {
        let (before, after) = rest.split_at(start);
        out.push_str(&render_bold(before));
        match after[1..].find('`') {
            Some(end) => {
                out.push_str("<code>");
                out.push_str(&escape_html(&after[1..1 + end]));
                out.push_str("</code>");
                rest = &after[end + 2..];
            }
            None => {
                // unmatched backtick, leave it literal
                out.push_str(&render_bold(after));
                rest = "";
            }
        }
    }
    out.push_str(&render_bold(rest));
    out
}

fn render_bold(text: &str) -> String {
    let escaped = escape_html(text);
    let mut out = String::with_capacity(escaped.len());
    let mut open = false;
    for (i, part) in escaped.split("**").enumerate() {
        if i > 0 {
            out.push_str(if open { "</strong>" } else { "<strong>" });
            open = !open;
        }
        out.push_str(part);
    }
    if open {
        out.push_str("</strong>");
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_and_paragraphs() {
        let html = render("### Analysis\n\nRevenue grew in Q3.");
        assert_eq!(html, "<h3>Analysis</h3>\n<p>Revenue grew in Q3.</p>\n");
    }

    #[test]
    fn bold_and_inline_code() {
        let html = render("**Generated SQL** uses `SELECT *` internally.");
        assert_eq!(
            html,
            "<p><strong>Generated SQL</strong> uses <code>SELECT *</code> internally.</p>\n"
        );
    }

    #[test]
    fn fenced_code_block_escapes_content() {
        let html = render("```sql\nSELECT * FROM t WHERE a < 2;\n```\ndone");
        assert_eq!(
            html,
            "<pre><code class=\"language-sql\">SELECT * FROM t WHERE a &lt; 2;\n</code></pre>\n<p>done</p>\n"
        );
    }

    #[test]
    fn unterminated_fence_is_closed() {
        let html = render("```\npartial");
        assert_eq!(html, "<pre><code>partial\n</code></pre>\n");
    }

    #[test]
    fn unordered_list() {
        let html = render("- one\n- two");
        assert_eq!(html, "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n");
    }

    #[test]
    fn text_is_html_escaped() {
        let html = render("a < b & c > d");
        assert_eq!(html, "<p>a &lt; b &amp; c &gt; d</p>\n");
    }

    #[test]
    fn unbalanced_bold_closes_deterministically() {
        assert_eq!(render("**partial bo"), "<p><strong>partial bo</strong></p>\n");
    }
}
