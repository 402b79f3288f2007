//! Rendering a lead for each channel: JSON, plain text and HTML.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use codex_core::LeadData;

/// Event name carried by webhook payloads.
pub const WEBHOOK_EVENT: &str = "qualified_lead";

/// SMS bodies longer than this are cut on a char boundary.
pub const SMS_MAX_CHARS: usize = 480;

const NOT_PROVIDED: &str = "not provided";

/// `{event, timestamp, lead}` for generic webhooks.
pub fn webhook_payload(lead: &LeadData, now: DateTime<Utc>) -> Result<Value, serde_json::Error> {
    Ok(json!({
        "event": WEBHOOK_EVENT,
        "timestamp": now.to_rfc3339(),
        "lead": serde_json::to_value(lead)?,
    }))
}

fn or_missing(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(NOT_PROVIDED)
}

fn join_or_missing(values: &[String]) -> String {
    if values.is_empty() {
        NOT_PROVIDED.to_string()
    } else {
        values.join(", ")
    }
}

fn contact_line(lead: &LeadData) -> String {
    let c = &lead.contact_info;
    let parts: Vec<&str> = [c.name.as_deref(), c.email.as_deref(), c.phone.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        NOT_PROVIDED.to_string()
    } else {
        parts.join(" / ")
    }
}

/// Short plain-text alert for SMS.
pub fn sms_text(lead: &LeadData) -> String {
    let p = &lead.project_details;
    let text = format!(
        "New qualified lead (score {})\nProject: {}\nBudget: {}\nTimeline: {}\nUrgency: {}\nContact: {}\nSession: {}",
        lead.score,
        or_missing(p.project_type.as_deref()),
        or_missing(p.budget.as_deref()),
        or_missing(p.timeline.as_deref()),
        p.urgency,
        contact_line(lead),
        lead.session_id,
    );
    truncate_chars(&text, SMS_MAX_CHARS)
}

/// Plain text with WhatsApp emphasis markers and the conversation summary.
pub fn whatsapp_text(lead: &LeadData) -> String {
    let p = &lead.project_details;
    format!(
        "*New qualified lead* (score {})\n\n*Project:* {}\n*Technologies:* {}\n*Services:* {}\n*Budget:* {}\n*Timeline:* {}\n*Urgency:* {}\n*Contact:* {}\n\n{}",
        lead.score,
        or_missing(p.project_type.as_deref()),
        join_or_missing(&p.technologies),
        join_or_missing(&p.services),
        or_missing(p.budget.as_deref()),
        or_missing(p.timeline.as_deref()),
        p.urgency,
        contact_line(lead),
        lead.conversation_summary,
    )
}

pub fn email_subject(lead: &LeadData) -> String {
    format!(
        "New qualified lead: {} (score {})",
        or_missing(lead.project_details.project_type.as_deref()),
        lead.score
    )
}

/// HTML body for email. Every interpolated value is escaped.
pub fn email_html(lead: &LeadData) -> String {
    let p = &lead.project_details;
    let c = &lead.contact_info;
    let rows: [(&str, String); 11] = [
        ("Name", or_missing(c.name.as_deref()).to_string()),
        ("Email", or_missing(c.email.as_deref()).to_string()),
        ("Phone", or_missing(c.phone.as_deref()).to_string()),
        ("Company", or_missing(c.company.as_deref()).to_string()),
        ("Project", or_missing(p.project_type.as_deref()).to_string()),
        ("Technologies", join_or_missing(&p.technologies)),
        ("Services", join_or_missing(&p.services)),
        ("Budget", or_missing(p.budget.as_deref()).to_string()),
        ("Timeline", or_missing(p.timeline.as_deref()).to_string()),
        ("Urgency", p.urgency.to_string()),
        ("Ready for proposal", if lead.ready_for_proposal { "yes" } else { "no" }.to_string()),
    ];

    let mut html = String::new();
    html.push_str("<h2>New qualified lead</h2>\n");
    html.push_str(&format!(
        "<p>Score: <strong>{}</strong> &middot; Session: <code>{}</code> &middot; {}</p>\n",
        lead.score,
        html_escape(lead.session_id.as_str()),
        lead.timestamp.format("%Y-%m-%d %H:%M UTC"),
    ));
    html.push_str("<table>\n");
    for (label, value) in rows {
        html.push_str(&format!(
            "<tr><th align=\"left\">{}</th><td>{}</td></tr>\n",
            label,
            html_escape(&value)
        ));
    }
    html.push_str("</table>\n");
    html.push_str(&format!(
        "<h3>Conversation</h3>\n<p>{}</p>\n",
        html_escape(&lead.conversation_summary)
    ));
    html
}

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use codex_core::{ContactInfo, ProjectDetails, SessionId, Urgency};

    pub(crate) fn sample_lead() -> LeadData {
        LeadData {
            session_id: SessionId::from("sess-42"),
            timestamp: Utc::now(),
            contact_info: ContactInfo {
                name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                phone: None,
                company: None,
            },
            project_details: ProjectDetails {
                project_type: Some("website".to_string()),
                technologies: vec!["react".to_string()],
                services: vec![],
                budget: Some("$20,000".to_string()),
                timeline: None,
                urgency: Urgency::High,
            },
            conversation_summary: "Wants a <b>fast</b> site & SEO".to_string(),
            score: 65,
            ready_for_proposal: true,
        }
    }

    #[test]
    fn test_webhook_payload_shape() {
        let now = Utc::now();
        let payload = webhook_payload(&sample_lead(), now).unwrap();
        assert_eq!(payload["event"], "qualified_lead");
        assert_eq!(payload["timestamp"], now.to_rfc3339());
        assert_eq!(payload["lead"]["session_id"], "sess-42");
        assert_eq!(payload["lead"]["project_details"]["urgency"], "high");
    }

    #[test]
    fn test_sms_text_contents() {
        let text = sms_text(&sample_lead());
        assert!(text.starts_with("New qualified lead (score 65)"));
        assert!(text.contains("Budget: $20,000"));
        assert!(text.contains("Timeline: not provided"));
        assert!(text.contains("Contact: Ada / ada@example.com"));
    }

    #[test]
    fn test_sms_text_truncated() {
        let mut lead = sample_lead();
        lead.project_details.project_type = Some("é".repeat(1000));
        let text = sms_text(&lead);
        assert_eq!(text.chars().count(), SMS_MAX_CHARS);
    }

    #[test]
    fn test_whatsapp_text_includes_summary() {
        let text = whatsapp_text(&sample_lead());
        assert!(text.starts_with("*New qualified lead*"));
        assert!(text.contains("*Technologies:* react"));
        assert!(text.contains("*Services:* not provided"));
        assert!(text.ends_with("Wants a <b>fast</b> site & SEO"));
    }

    #[test]
    fn test_email_html_escapes_values() {
        let html = email_html(&sample_lead());
        assert!(html.contains("Wants a &lt;b&gt;fast&lt;/b&gt; site &amp; SEO"));
        assert!(!html.contains("<b>fast</b>"));
        assert!(html.contains("<td>$20,000</td>"));
        assert!(html.contains("<td>yes</td>"));
    }

    #[test]
    fn test_email_subject() {
        assert_eq!(
            email_subject(&sample_lead()),
            "New qualified lead: website (score 65)"
        );
    }

    #[test]
    fn test_html_escape_all_specials() {
        assert_eq!(
            html_escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }
}
