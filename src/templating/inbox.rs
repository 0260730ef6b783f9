use sqlx::PgPool;

use crate::databases::messaging::messagedb::unread_count;

use super::{PageContext, TemplateSyntaxError};

/// `{% inbox_count %}` renders the active user's unread-message count
/// inline; `{% inbox_count as name %}` binds it into the context and
/// renders nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboxCountNode {
    Inline,
    Assign(String),
}

/// `bits` is the whitespace-split tag contents, tag name included.
pub fn parse_inbox_count(bits: &[&str]) -> Result<InboxCountNode, TemplateSyntaxError> {
    if bits.len() > 1 {
        if bits.len() != 3 {
            return Err(TemplateSyntaxError(
                "inbox_count tag takes either no arguments or exactly two arguments".into(),
            ));
        }
        if bits[1] != "as" {
            return Err(TemplateSyntaxError(
                "first argument to inbox_count tag must be 'as'".into(),
            ));
        }
        return Ok(InboxCountNode::Assign(bits[2].to_string()));
    }

    Ok(InboxCountNode::Inline)
}

impl InboxCountNode {
    pub async fn render(
        &self,
        ctx: &mut PageContext,
        pool: &PgPool,
    ) -> Result<String, sqlx::Error> {
        // No resolvable user: the value is the empty string, not zero.
        let value = match ctx.user {
            Some(user_id) => unread_count(pool, user_id).await?.to_string(),
            None => String::new(),
        };

        Ok(self.emit(ctx, value))
    }

    fn emit(&self, ctx: &mut PageContext, value: String) -> String {
        match self {
            InboxCountNode::Assign(name) => {
                ctx.vars.insert(name.clone(), value);
                String::new()
            }
            InboxCountNode::Inline => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_tag_parses_to_inline() {
        let node = parse_inbox_count(&["inbox_count"]).expect("parse");
        assert_eq!(node, InboxCountNode::Inline);
    }

    #[test]
    fn as_form_parses_to_assign() {
        let node = parse_inbox_count(&["inbox_count", "as", "unread"]).expect("parse");
        assert_eq!(node, InboxCountNode::Assign("unread".to_string()));
    }

    #[test]
    fn wrong_argument_count_is_a_syntax_error() {
        let err = parse_inbox_count(&["inbox_count", "foo"]).unwrap_err();
        assert_eq!(
            err.0,
            "inbox_count tag takes either no arguments or exactly two arguments"
        );

        let err = parse_inbox_count(&["inbox_count", "as", "x", "y"]).unwrap_err();
        assert_eq!(
            err.0,
            "inbox_count tag takes either no arguments or exactly two arguments"
        );
    }

    #[test]
    fn first_argument_must_be_as() {
        let err = parse_inbox_count(&["inbox_count", "foo", "baz"]).unwrap_err();
        assert_eq!(err.0, "first argument to inbox_count tag must be 'as'");
    }

    #[test]
    fn inline_emits_the_count() {
        let mut ctx = PageContext::for_user(1);
        let out = InboxCountNode::Inline.emit(&mut ctx, "3".to_string());
        assert_eq!(out, "3");
    }

    #[test]
    fn assign_binds_count_and_emits_nothing() {
        let mut ctx = PageContext::for_user(1);
        let node = InboxCountNode::Assign("n".to_string());
        let out = node.emit(&mut ctx, "3".to_string());
        assert_eq!(out, "");
        assert_eq!(ctx.vars.get("n").map(String::as_str), Some("3"));
    }

    #[test]
    fn assign_stores_the_empty_value_for_anonymous_contexts() {
        let mut ctx = PageContext::anonymous();
        let node = InboxCountNode::Assign("n".to_string());
        let out = node.emit(&mut ctx, String::new());
        assert_eq!(out, "");
        assert_eq!(ctx.vars.get("n").map(String::as_str), Some(""));
    }
}
