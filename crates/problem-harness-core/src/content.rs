//! Rich-text problem bodies → markdown, plain text, examples and constraints.
//!
//! Every function here is total: empty input yields an empty result and
//! malformed markup is tolerated rather than rejected. Conversion is a
//! fixed sequence of regex rewrites applied after entity decoding.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex")
}

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<script[^>]*>.*?</script>"));
static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<style[^>]*>.*?</style>"));

static HEADINGS: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    (1..=6)
        .rev()
        .map(|level| {
            let pattern = format!(r"(?is)<h{level}[^>]*>(.*?)</h{level}>");
            let replacement = format!("\n{} ${{1}}\n", "#".repeat(level));
            (re(&pattern), replacement)
        })
        .collect()
});

static STRONG: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<strong[^>]*>(.*?)</strong>"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<b(?:\s[^>]*)?>(.*?)</b>"));
static EM: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<em[^>]*>(.*?)</em>"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<i(?:\s[^>]*)?>(.*?)</i>"));

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?s)<pre[^>]*>\s*<code[^>]*>(.*?)</code>\s*</pre>"));
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| re(r"(?s)<code[^>]*>(.*?)</code>"));

static LIST_OPEN_CLOSE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)</?(?:ul|ol)(?:\s[^>]*)?>"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<li[^>]*>(.*?)</li>"));

static LINK: LazyLock<Regex> =
    LazyLock::new(|| re(r#"(?is)<a[^>]*href=["']([^"']*)["'][^>]*>(.*?)</a>"#));
static IMAGE_WITH_ALT: LazyLock<Regex> = LazyLock::new(|| {
    re(r#"(?i)<img[^>]*src=["']([^"']*)["'][^>]*alt=["']([^"']*)["'][^>]*/?>"#)
});
static IMAGE: LazyLock<Regex> = LazyLock::new(|| re(r#"(?i)<img[^>]*src=["']([^"']*)["'][^>]*/?>"#));

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<br\s*/?>"));
static PARAGRAPH_CLOSE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)</p>"));
static PARAGRAPH_OPEN: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<p(?:\s[^>]*)?>"));
static BLOCK_CLOSE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)</(?:div|li|tr)>"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| re(r"<[^>]+>"));

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| re(r"\n\s*\n\s*\n+"));
static HORIZONTAL_WS: LazyLock<Regex> = LazyLock::new(|| re(r"[ \t]+"));

static EXAMPLE_MARKER: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bExample\s*\d*\s*:"));
static EXAMPLE_BODY: LazyLock<Regex> = LazyLock::new(|| {
    re(concat!(
        r"(?is)Example\s*\d*\s*:?(?:<[^>]+>|\s)*",
        r"Input:?(?:</strong>)?\s*(.*?)\s*",
        r"(?:<strong>)?Output:?(?:</strong>)?\s*(.*?)\s*",
        r"(?:(?:<strong>)?Explanation:?(?:</strong>)?\s*(.*?))?",
        r"\s*(?:</pre>|$)",
    ))
});

static CONSTRAINT_SECTION: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?is)(?:<strong>)?Constraints:?(?:</strong>)?(.+?)(?:<strong>|$)"));
static CONSTRAINT_ITEM: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<li[^>]*>(.*?)</li>"));

/// One worked example from a problem statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Structured content of a problem, destined for external storage
/// alongside the canonical record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemContent {
    pub description: String,
    pub examples: Vec<Value>,
    pub constraints: Vec<String>,
    pub hints: Vec<Value>,
    pub code_snippets: Vec<Value>,
}

/// Decode named and numeric character references. Unknown or malformed
/// references are left as written.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail[1..].find(';').filter(|end| *end <= 32) {
            Some(end) => {
                let name = &tail[1..end + 1];
                match resolve_entity(name) {
                    Some(decoded) => {
                        out.push_str(&decoded);
                        rest = &tail[end + 2..];
                    }
                    None => {
                        out.push('&');
                        rest = &tail[1..];
                    }
                }
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn resolve_entity(name: &str) -> Option<Cow<'static, str>> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(|c| Cow::Owned(c.to_string()));
    }
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    quick_xml::escape::resolve_html5_entity(name).map(Cow::Borrowed)
}

fn drop_scripts(text: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(text, "");
    STYLE_BLOCK.replace_all(&text, "").into_owned()
}

fn tidy_whitespace(text: &str) -> String {
    let text = BLANK_RUNS.replace_all(text, "\n\n");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    text.trim().to_string()
}

/// Convert an HTML problem body to markdown.
pub fn to_markdown(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let mut text = drop_scripts(&decode_entities(html));

    for (pattern, replacement) in HEADINGS.iter() {
        text = pattern.replace_all(&text, replacement.as_str()).into_owned();
    }

    let steps: [(&Regex, &str); 15] = [
        (&*STRONG, "**${1}**"),
        (&*BOLD, "**${1}**"),
        (&*EM, "*${1}*"),
        (&*ITALIC, "*${1}*"),
        (&*CODE_BLOCK, "\n```\n${1}\n```\n"),
        (&*INLINE_CODE, "`${1}`"),
        (&*LIST_OPEN_CLOSE, "\n"),
        (&*LIST_ITEM, "- ${1}\n"),
        (&*LINK, "[${2}](${1})"),
        (&*IMAGE_WITH_ALT, "![${2}](${1})"),
        (&*IMAGE, "![](${1})"),
        (&*LINE_BREAK, "\n"),
        (&*PARAGRAPH_CLOSE, "\n\n"),
        (&*PARAGRAPH_OPEN, ""),
        (&*ANY_TAG, ""),
    ];
    for (pattern, replacement) in steps {
        text = pattern.replace_all(&text, replacement).into_owned();
    }

    tidy_whitespace(&text)
}

/// Convert an HTML fragment to plain text, keeping code as markdown.
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let mut text = drop_scripts(&decode_entities(html));

    let steps: [(&Regex, &str); 6] = [
        (&*CODE_BLOCK, "\n```\n${1}\n```\n"),
        (&*INLINE_CODE, "`${1}`"),
        (&*LINE_BREAK, "\n"),
        (&*PARAGRAPH_CLOSE, "\n\n"),
        (&*BLOCK_CLOSE, "\n"),
        (&*ANY_TAG, ""),
    ];
    for (pattern, replacement) in steps {
        text = pattern.replace_all(&text, replacement).into_owned();
    }

    tidy_whitespace(&text)
}

/// Extract `Example N:` blocks. Each block runs up to the next example
/// marker or the end of input.
pub fn extract_examples(html: &str) -> Vec<Example> {
    if html.is_empty() {
        return Vec::new();
    }

    let starts: Vec<usize> = EXAMPLE_MARKER.find_iter(html).map(|m| m.start()).collect();
    let mut examples = Vec::new();
    for (i, start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(html.len());
        let segment = &html[*start..end];
        let Some(caps) = EXAMPLE_BODY.captures(segment) else {
            continue;
        };
        let field = |idx: usize| caps.get(idx).map(|m| strip_html(m.as_str()));
        examples.push(Example {
            input: field(1).unwrap_or_default(),
            output: field(2).unwrap_or_default(),
            explanation: field(3).filter(|s| !s.is_empty()),
        });
    }
    examples
}

/// Extract the list items of the `Constraints:` section.
pub fn extract_constraints(html: &str) -> Vec<String> {
    let Some(section) = CONSTRAINT_SECTION
        .captures(html)
        .and_then(|caps| caps.get(1))
    else {
        return Vec::new();
    };

    CONSTRAINT_ITEM
        .captures_iter(section.as_str())
        .filter_map(|caps| caps.get(1))
        .map(|m| strip_html(m.as_str()))
        .filter(|item| !item.is_empty())
        .collect()
}
