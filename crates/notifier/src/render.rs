//! Notice message rendering.
//!
//! A notice type's description doubles as its message template: `{name}`
//! placeholders are replaced with values from the sender's context. A
//! `message` string in the context replaces the template entirely.

use serde_json::Value;

use herald_common::types::NoticeType;

/// Render the message stored on a notice.
pub fn render_message(notice_type: &NoticeType, context: &Value) -> String {
    if let Some(message) = context.get("message").and_then(Value::as_str) {
        return message.to_string();
    }

    let template = if notice_type.description.trim().is_empty() {
        notice_type.display.as_str()
    } else {
        notice_type.description.as_str()
    };

    substitute(template, context)
}

/// Replace `{key}` with the context value for `key`. Unknown keys are left as-is,
/// and `{{` / `}}` produce literal braces.
fn substitute(template: &str, context: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(['{', '}']) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('{')
            && let Some(end) = tail.find('}')
        {
            let key = &tail[1..end];
            match context.get(key) {
                Some(value) => out.push_str(&display_value(value)),
                None => out.push_str(&tail[..=end]),
            }
            rest = &tail[end + 1..];
            continue;
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn notice_type(description: &str) -> NoticeType {
        NoticeType {
            id: Uuid::new_v4(),
            label: "friends_invite".to_string(),
            display: "Invitation Received".to_string(),
            description: description.to_string(),
            default_sensitivity: 2,
        }
    }

    #[test]
    fn test_placeholders_are_substituted() {
        let nt = notice_type("{from_user} invited you to join {group}");
        let rendered = render_message(&nt, &json!({"from_user": "bob", "group": "rustaceans"}));
        assert_eq!(rendered, "bob invited you to join rustaceans");
    }

    #[test]
    fn test_non_string_values_render_as_json() {
        let nt = notice_type("you have {count} new invitations");
        assert_eq!(
            render_message(&nt, &json!({"count": 3})),
            "you have 3 new invitations"
        );
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let nt = notice_type("hello {name}");
        assert_eq!(render_message(&nt, &json!({})), "hello {name}");
    }

    #[test]
    fn test_escaped_braces() {
        let nt = notice_type("literal {{braces}} for {name}");
        assert_eq!(
            render_message(&nt, &json!({"name": "amy"})),
            "literal {braces} for amy"
        );
    }

    #[test]
    fn test_explicit_message_wins() {
        let nt = notice_type("{from_user} invited you");
        assert_eq!(
            render_message(&nt, &json!({"message": "custom text", "from_user": "bob"})),
            "custom text"
        );
    }

    #[test]
    fn test_empty_description_falls_back_to_display() {
        let nt = notice_type("  ");
        assert_eq!(render_message(&nt, &Value::Null), "Invitation Received");
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        let nt = notice_type("oops {name");
        assert_eq!(render_message(&nt, &json!({"name": "x"})), "oops {name");
    }
}
