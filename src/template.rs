//! Placeholder substitution with a single recognised section block.
//!
//! Two passes, neither recursive: the literal section block is cut out and
//! expanded, then `{{key}}` tokens in the remaining template text are
//! replaced from the context. Text produced by either pass is never scanned
//! again, and there are no conditionals or general loops.

use serde_json::{Map, Value};

use crate::markdown::title_case;
use crate::record::sections;
use crate::value::to_text;

pub type Context = Map<String, Value>;

/// The one repeated-block pattern that is expanded per section.
pub const SECTIONS_BLOCK: &str =
    "{% for section in sections %}\n### {{section.label | title}}\n{{section.text}}\n{% endfor %}";

/// A bodiless loop marker; removed from the output.
pub const SECTIONS_MARKER: &str = "{% for section in sections %}{% endfor %}";

pub fn render(template: &str, ctx: &Context) -> String {
    let template = template.replace("\r\n", "\n");
    let expanded = expand_sections(ctx);

    template
        .split(SECTIONS_BLOCK)
        .map(|part| {
            part.split(SECTIONS_MARKER)
                .map(|piece| substitute(piece, ctx))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(&expanded)
}

fn expand_sections(ctx: &Context) -> String {
    let items: &[Value] = match ctx.get("sections") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };
    sections::normalize(items)
        .iter()
        .map(|s| format!("### {}\n{}\n\n", title_case(&s.label), s.text))
        .collect()
}

/// Replace every `{{key}}` whose key is in `ctx`; unknown keys stay verbatim.
fn substitute(text: &str, ctx: &Context) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) if !after[..end].contains("{{") => {
                let key = &after[..end];
                match ctx.get(key) {
                    Some(value) => out.push_str(&to_text(value)),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            _ => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(v: Value) -> Context {
        match v {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn scalars_and_containers() {
        let c = ctx(json!({
            "title": "Home",
            "score": 8,
            "scores": {"quality": 8, "seo": null},
            "links": ["a", "b"],
            "missing": null
        }));
        let out = render("{{title}} {{score}} {{scores}} {{links}} [{{missing}}]", &c);
        assert_eq!(out, r#"Home 8 {"quality":8,"seo":null} ["a","b"] []"#);
    }

    #[test]
    fn unresolved_placeholders_stay_verbatim() {
        let out = render("Title: {{title}} / {{ spaced }} / {{url}}", &ctx(json!({"url": "/x"})));
        assert_eq!(out, "Title: {{title}} / {{ spaced }} / /x");
    }

    #[test]
    fn substitution_is_not_recursive() {
        let c = ctx(json!({"a": "{{b}}", "b": "nope"}));
        assert_eq!(render("{{a}}", &c), "{{b}}");
    }

    #[test]
    fn unbalanced_braces() {
        let c = ctx(json!({"x": "1"}));
        assert_eq!(render("{{ {{x}} }} {{", &c), "{{ 1 }} {{");
    }

    #[test]
    fn section_block_expands_per_entry() {
        let template = format!("Intro {{{{title}}}}\n{}\nOutro", SECTIONS_BLOCK);
        let c = ctx(json!({
            "title": "Home",
            "sections": [
                {"label": "our story", "text": "Since 1999. {{title}}"},
                {"label": "faq", "text": "Ask us."}
            ]
        }));
        let out = render(&template, &c);
        assert_eq!(
            out,
            "Intro Home\n### Our Story\nSince 1999. {{title}}\n\n### Faq\nAsk us.\n\n\nOutro"
        );
    }

    #[test]
    fn crlf_templates_still_match_block() {
        let template = SECTIONS_BLOCK.replace('\n', "\r\n");
        let c = ctx(json!({"sections": [{"label": "a", "text": "b"}]}));
        assert_eq!(render(&template, &c), "### A\nb\n\n");
    }

    #[test]
    fn empty_or_missing_sections_remove_block() {
        let template = format!("A\n{}\nB", SECTIONS_BLOCK);
        assert_eq!(render(&template, &ctx(json!({"sections": []}))), "A\n\nB");
        assert_eq!(render(&template, &ctx(json!({}))), "A\n\nB");
    }

    #[test]
    fn bare_marker_is_removed() {
        let template = format!("A{}B {{{{x}}}}", SECTIONS_MARKER);
        let c = ctx(json!({"x": 1, "sections": [{"label": "a", "text": "b"}]}));
        assert_eq!(render(&template, &c), "AB 1");
    }

    #[test]
    fn template_without_block_is_plain_substitution() {
        let c = ctx(json!({"sections": [{"label": "a", "text": "b"}], "name": "Acme"}));
        assert_eq!(render("Hello {{name}}", &c), "Hello Acme");
    }
}
