use std::collections::HashMap;
use std::fmt;

use sqlx::PgPool;

pub mod inbox;

use inbox::InboxCountNode;

/// Raised while compiling a template, before anything is rendered. These
/// surface to the page author, not the end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSyntaxError(pub String);

impl fmt::Display for TemplateSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template syntax error: {}", self.0)
    }
}

impl std::error::Error for TemplateSyntaxError {}

/// State a template renders against: the active user (if any) and the
/// variables bound so far.
#[derive(Debug, Default)]
pub struct PageContext {
    pub user: Option<i32>,
    pub vars: HashMap<String, String>,
}

impl PageContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: i32) -> Self {
        PageContext {
            user: Some(user_id),
            ..Self::default()
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.vars.insert(name.to_string(), value.into());
    }
}

#[derive(Debug)]
enum Segment {
    Literal(String),
    Var(String),
    Inbox(InboxCountNode),
}

/// A compiled page template. Supports `{{ name }}` substitution and the
/// `{% inbox_count %}` tag; anything else is a compile-time error.
#[derive(Debug)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn compile(source: &str) -> Result<Template, TemplateSyntaxError> {
        let mut segments = Vec::new();
        let mut rest = source;

        loop {
            let next = match (rest.find("{%"), rest.find("{{")) {
                (None, None) => {
                    if !rest.is_empty() {
                        segments.push(Segment::Literal(rest.to_string()));
                    }
                    break;
                }
                (Some(b), Some(v)) => (b.min(v), b < v),
                (Some(b), None) => (b, true),
                (None, Some(v)) => (v, false),
            };

            let (at, is_tag) = next;
            if at > 0 {
                segments.push(Segment::Literal(rest[..at].to_string()));
            }
            rest = &rest[at..];

            if is_tag {
                let end = rest
                    .find("%}")
                    .ok_or_else(|| TemplateSyntaxError("unclosed '{%' tag".into()))?;
                let bits: Vec<&str> = rest[2..end].split_whitespace().collect();
                let name = bits
                    .first()
                    .copied()
                    .ok_or_else(|| TemplateSyntaxError("empty template tag".into()))?;
                if name != "inbox_count" {
                    return Err(TemplateSyntaxError(format!("invalid block tag '{}'", name)));
                }
                segments.push(Segment::Inbox(inbox::parse_inbox_count(&bits)?));
                rest = &rest[end + 2..];
            } else {
                let end = rest
                    .find("}}")
                    .ok_or_else(|| TemplateSyntaxError("unclosed '{{' variable".into()))?;
                let inner = rest[2..end].trim();
                if inner.is_empty() || inner.split_whitespace().count() != 1 {
                    return Err(TemplateSyntaxError(format!(
                        "invalid variable expression '{}'",
                        inner
                    )));
                }
                segments.push(Segment::Var(inner.to_string()));
                rest = &rest[end + 2..];
            }
        }

        Ok(Template { segments })
    }

    pub async fn render(&self, ctx: &mut PageContext, pool: &PgPool) -> Result<String, sqlx::Error> {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Var(name) => {
                    if let Some(value) = ctx.vars.get(name) {
                        out.push_str(value);
                    }
                }
                Segment::Inbox(node) => out.push_str(&node.render(ctx, pool).await?),
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_pool() -> PgPool {
        PgPool::connect_lazy("postgres://postgres@localhost/postbox_test").expect("lazy pool")
    }

    #[test]
    fn compiles_plain_text_untouched() {
        let t = Template::compile("<p>hello</p>").expect("compile");
        assert_eq!(t.segments.len(), 1);
    }

    #[test]
    fn rejects_unknown_block_tag() {
        let err = Template::compile("{% outbox_count %}").unwrap_err();
        assert!(err.0.contains("invalid block tag 'outbox_count'"), "{}", err);
    }

    #[test]
    fn rejects_unclosed_tag() {
        let err = Template::compile("before {% inbox_count").unwrap_err();
        assert!(err.0.contains("unclosed"), "{}", err);
    }

    #[test]
    fn rejects_malformed_variable() {
        let err = Template::compile("{{ two words }}").unwrap_err();
        assert!(err.0.contains("invalid variable expression"), "{}", err);
    }

    #[tokio::test]
    async fn substitutes_bound_variables() {
        let t = Template::compile("hi {{ name }}!").expect("compile");
        let mut ctx = PageContext::anonymous();
        ctx.set("name", "ada");
        let out = t.render(&mut ctx, &lazy_pool()).await.expect("render");
        assert_eq!(out, "hi ada!");
    }

    #[tokio::test]
    async fn unbound_variable_renders_empty() {
        let t = Template::compile("[{{ missing }}]").expect("compile");
        let mut ctx = PageContext::anonymous();
        let out = t.render(&mut ctx, &lazy_pool()).await.expect("render");
        assert_eq!(out, "[]");
    }

    #[tokio::test]
    async fn inbox_tag_without_user_renders_empty_string() {
        // Anonymous contexts never reach the database; the tag degrades to
        // an empty value rather than zero.
        let t = Template::compile("unread: {% inbox_count %}").expect("compile");
        let mut ctx = PageContext::anonymous();
        let out = t.render(&mut ctx, &lazy_pool()).await.expect("render");
        assert_eq!(out, "unread: ");
    }
}
