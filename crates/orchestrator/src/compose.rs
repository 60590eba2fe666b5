// Rust guideline compliant 2026-10-12

//! Message composition for alert and welcome notifications.
//!
//! Everything here is pure string building; dispatch lives in the adapters.

use domain::{EmailMessage, WarningRecord};

const PRODUCT: &str = "Alerta de Enchentes";

/// SMS body for one official warning, including the unsubscribe hint.
#[must_use]
pub fn alert_sms(warning: &WarningRecord) -> String {
    format!(
        "⚠️ ALERTA OFICIAL\n{}\n\n{}\n\n— {PRODUCT} (Projeto).\nPara cancelar SMS, responda STOP.",
        warning.headline.trim(),
        warning.description.trim(),
    )
}

/// Email for one official warning addressed to `to`.
#[must_use]
pub fn alert_email(warning: &WarningRecord, location_label: &str, to: &str) -> EmailMessage {
    let html = format!(
        concat!(
            "<div style=\"font-family:Arial,sans-serif\">",
            "<h2>⚠️ ALERTA OFICIAL</h2>",
            "<p><strong>{headline}</strong></p>",
            "<p>{description}</p>",
            "<hr style=\"border:none;border-top:1px solid #eee;margin:16px 0\" />",
            "<p style=\"color:#666\">— Sistema {product}</p>",
            "</div>"
        ),
        headline = escape_html(warning.headline.trim()),
        description = escape_html(warning.description.trim()),
        product = PRODUCT,
    );
    EmailMessage {
        to: to.to_owned(),
        subject: format!("⚠️ {PRODUCT} — {location_label}"),
        text: Some(html_to_text(&html)),
        html,
    }
}

/// Short SMS confirming a new registration.
#[must_use]
pub fn welcome_sms(display_name: &str) -> String {
    format!(
        "Olá, {}! Seu cadastro no {PRODUCT} foi confirmado.\nPara cancelar SMS, responda STOP.",
        display_name.trim()
    )
}

/// Email confirming a new registration.
#[must_use]
pub fn welcome_email(display_name: &str, to: &str) -> EmailMessage {
    let html = format!(
        concat!(
            "<div style=\"font-family:Arial,sans-serif\">",
            "<p>Olá, {name}!</p>",
            "<p>Seu cadastro no <strong>{product}</strong> foi confirmado com sucesso.</p>",
            "<p>Você passará a receber os alertas oficiais por SMS e e-mail.</p>",
            "<p style=\"color:#666\">— {product} (Projeto)</p>",
            "</div>"
        ),
        name = escape_html(display_name.trim()),
        product = PRODUCT,
    );
    EmailMessage {
        to: to.to_owned(),
        subject: format!("Cadastro confirmado — {PRODUCT}"),
        text: Some(html_to_text(&html)),
        html,
    }
}

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

/// Plain-text rendering of an HTML fragment.
///
/// Tags become spaces, whitespace runs collapse to one space, and the
/// entities produced by [`escape_html`] are decoded.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let mut stripped = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                stripped.push(' ');
            }
            _ if !in_tag => stripped.push(c),
            _ => {}
        }
    }
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    // &amp; last so "&amp;lt;" decodes to "&lt;" and not "<".
    collapsed
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(headline: &str, description: &str) -> WarningRecord {
        WarningRecord { headline: headline.to_owned(), description: description.to_owned() }
    }

    #[test]
    fn alert_sms_layout() {
        let body = alert_sms(&warning("H1", "D1"));
        assert_eq!(
            body,
            "⚠️ ALERTA OFICIAL\nH1\n\nD1\n\n— Alerta de Enchentes (Projeto).\nPara cancelar SMS, responda STOP."
        );
    }

    #[test]
    fn alert_email_fields() {
        let email = alert_email(&warning("Chuva forte", "Risco de alagamento"), "Santa Isabel", "a@b.com");
        assert_eq!(email.to, "a@b.com");
        assert_eq!(email.subject, "⚠️ Alerta de Enchentes — Santa Isabel");
        assert!(email.html.contains("<strong>Chuva forte</strong>"));
        assert!(email.html.contains("<p>Risco de alagamento</p>"));
        assert_eq!(
            email.text.as_deref(),
            Some("⚠️ ALERTA OFICIAL Chuva forte Risco de alagamento — Sistema Alerta de Enchentes")
        );
    }

    #[test]
    fn alert_email_escapes_provider_text() {
        let email = alert_email(&warning("<b>H</b>", "rain & wind"), "X", "a@b.com");
        assert!(email.html.contains("&lt;b&gt;H&lt;/b&gt;"));
        assert!(email.html.contains("rain &amp; wind"));
        let text = email.text.unwrap();
        assert!(text.contains("<b>H</b>"));
        assert!(text.contains("rain & wind"));
    }

    #[test]
    fn welcome_messages_greet_by_name() {
        assert!(welcome_sms(" Ana ").starts_with("Olá, Ana! "));
        let email = welcome_email("Ana", "ana@example.com");
        assert_eq!(email.subject, "Cadastro confirmado — Alerta de Enchentes");
        assert!(email.html.contains("<p>Olá, Ana!</p>"));
    }

    #[test]
    fn html_to_text_collapses_whitespace() {
        assert_eq!(html_to_text("<div>\n  <p>a</p>\n<p>b   c</p></div>"), "a b c");
        assert_eq!(html_to_text("&amp;lt;"), "&lt;");
    }
}
