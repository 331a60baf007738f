//! Rename templates: `{stem}`, `{ext}`, `{n}` and `{task}` placeholders.

use std::str::FromStr;

use crate::error::BoardError;
use crate::model::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Stem,
    Ext,
    Index,
    Task,
}

/// A parsed rename pattern such as `"{n}-{stem}{ext}"`.
///
/// - `{stem}`: the old name without its extension
/// - `{ext}`: the extension including the dot, or empty
/// - `{n}`: 1-based position among the task's selected documents
/// - `{task}`: first eight hex digits of the owning task id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTemplate {
    segments: Vec<Segment>,
}

impl RenameTemplate {
    /// Renders the new name for one document.
    #[must_use]
    pub fn render(&self, name: &str, n: usize, task_id: TaskId) -> String {
        let (stem, ext) = split_extension(name);
        let mut out = String::with_capacity(name.len() + 8);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Stem => out.push_str(stem),
                Segment::Ext => out.push_str(ext),
                Segment::Index => out.push_str(&n.to_string()),
                Segment::Task => out.extend(task_id.simple().to_string().chars().take(8)),
            }
        }
        out
    }
}

impl FromStr for RenameTemplate {
    type Err = BoardError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        let invalid =
            |msg: String| BoardError::Validation(format!("rename template {pattern:?}: {msg}"));
        if pattern.is_empty() {
            return Err(invalid("template is empty".into()));
        }
        if pattern.contains('/') {
            return Err(invalid("names cannot contain '/'".into()));
        }

        let mut segments = Vec::new();
        let mut rest = pattern;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| invalid("unclosed '{'".into()))?;
            segments.push(match &after[..close] {
                "stem" => Segment::Stem,
                "ext" => Segment::Ext,
                "n" => Segment::Index,
                "task" => Segment::Task,
                other => {
                    return Err(invalid(format!(
                        "unknown placeholder {{{other}}}; use {{stem}}, {{ext}}, {{n}} or {{task}}"
                    )))
                }
            });
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(Self { segments })
    }
}

/// Splits `"report.final.pdf"` into `("report.final", ".pdf")`. A leading dot
/// does not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn template(s: &str) -> RenameTemplate {
        s.parse().unwrap()
    }

    #[test]
    fn renders_every_placeholder() {
        let task = Uuid::parse_str("0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0").unwrap();
        let t = template("{task}_{n}_{stem}-scan{ext}");
        assert_eq!(t.render("brief.pdf", 2, task), "0f1e2d3c_2_brief-scan.pdf");
    }

    #[test]
    fn extension_is_last_dot_only() {
        assert_eq!(split_extension("a.b.pdf"), ("a.b", ".pdf"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }

    #[test]
    fn literal_only_template_is_allowed() {
        let t = template("vaste-naam.pdf");
        assert_eq!(t.render("x.doc", 1, Uuid::nil()), "vaste-naam.pdf");
    }

    #[test]
    fn rejects_bad_templates() {
        for bad in ["", "{stem", "{size}{ext}", "map/{stem}{ext}"] {
            assert!(
                matches!(bad.parse::<RenameTemplate>(), Err(BoardError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
