//! Message rendering for chat, email and in-app notifications.
//!
//! User-facing copy is French. Interpolated user text is HTML-escaped in
//! email bodies.

use educonnect_core::slot::Slot;
use educonnect_core::types::Timestamp;

/// Which side of a session a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Student,
    Tutor,
}

/// Shared facts about a session used by every template.
#[derive(Debug, Clone)]
pub struct SessionDetails<'a> {
    pub subject: &'a str,
    pub starts_at: Option<Timestamp>,
    pub meeting_link: Option<&'a str>,
}

/// Rendered email parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

const SIGNATURE: &str = "L'équipe EduConnect";

/// `15/01/2025 19:00 UTC`
pub fn format_when(starts_at: Option<Timestamp>) -> String {
    match starts_at {
        Some(t) => t.format("%d/%m/%Y %H:%M UTC").to_string(),
        None => "À planifier".to_string(),
    }
}

/// First word of a full name, if any.
pub fn first_name(full_name: Option<&str>) -> Option<&str> {
    full_name.and_then(|n| n.split_whitespace().next())
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Tutor notice that a request was matched to them.
pub fn match_proposed_chat(subject: &str, slots: &[Slot]) -> String {
    let slots = slots
        .iter()
        .map(Slot::code)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Nouvelle demande : {subject}. Créneaux : {slots}.\nAcceptez depuis votre tableau de bord."
    )
}

pub fn session_created_chat(audience: Audience, details: &SessionDetails<'_>) -> String {
    let when = format_when(details.starts_at);
    let link = details
        .meeting_link
        .map(|l| format!("\nLien : {l}"))
        .unwrap_or_default();
    match audience {
        Audience::Student => format!("Ton tuteur est trouvé ✅\nSéance : {when}{link}"),
        Audience::Tutor => format!("Nouvelle séance planifiée.\nHeure : {when}{link}"),
    }
}

pub fn reminder_chat(audience: Audience, details: &SessionDetails<'_>) -> String {
    let when = format_when(details.starts_at);
    let link = details
        .meeting_link
        .map(|l| format!("\nLien : {l}"))
        .unwrap_or_default();
    match audience {
        Audience::Student => format!(
            "Rappel ⏰ Ta séance de {} commence bientôt ({when}).{link}",
            details.subject
        ),
        Audience::Tutor => format!(
            "Rappel ⏰ Votre séance de {} commence bientôt ({when}).{link}",
            details.subject
        ),
    }
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

fn wrap_html(greeting: &str, intro: &str, details: &SessionDetails<'_>, closing: &str) -> String {
    let mut lines = String::new();
    if let Some(t) = details.starts_at {
        lines.push_str(&format!(
            "<p><strong>Date &amp; heure :</strong> {}</p>",
            escape_html(&format_when(Some(t)))
        ));
    }
    if let Some(link) = details.meeting_link {
        let link = escape_html(link);
        lines.push_str(&format!(
            "<p><strong>Lien de connexion :</strong> <a href=\"{link}\" target=\"_blank\" rel=\"noreferrer\">{link}</a></p>"
        ));
    }
    format!(
        "<div style=\"font-family: system-ui, sans-serif; font-size: 14px; color: #111827; line-height: 1.5;\">\
         <p>{greeting}</p><p>{intro}</p>{lines}<p>{closing}</p>\
         <p style=\"margin-top: 16px; font-size: 12px; color: #6B7280;\">{SIGNATURE}</p></div>"
    )
}

fn wrap_text(greeting: &str, intro: &str, details: &SessionDetails<'_>, closing: &str) -> String {
    let mut text = format!("{greeting}\n\n{intro}\n");
    if details.starts_at.is_some() {
        text.push_str(&format!("\nDate & heure : {}", format_when(details.starts_at)));
    }
    if let Some(link) = details.meeting_link {
        text.push_str(&format!("\nLien de connexion : {link}"));
    }
    text.push_str(&format!("\n\n{closing}\n\n{SIGNATURE}"));
    text
}

fn greeting(name: Option<&str>) -> String {
    match first_name(name) {
        Some(first) => format!("Bonjour {first},"),
        None => "Bonjour,".to_string(),
    }
}

/// Confirmation email for a newly scheduled session.
pub fn session_created_email(
    audience: Audience,
    recipient_name: Option<&str>,
    details: &SessionDetails<'_>,
) -> RenderedEmail {
    let subject_label = details.subject;
    let (subject, intro) = match audience {
        Audience::Student => (
            format!("Ta session de soutien en {subject_label} est prête ✅"),
            format!("Bonne nouvelle 🎉 Ta session de soutien en {subject_label} vient d'être programmée."),
        ),
        Audience::Tutor => (
            format!("Nouvelle session de soutien en {subject_label} 📚"),
            format!("Vous avez une nouvelle session de soutien en {subject_label} qui vient d'être programmée."),
        ),
    };
    let closing = "Pense à préparer ton matériel (connexion Internet, cahier, exercices) pour profiter au maximum de cette séance.";
    let greet = greeting(recipient_name);

    RenderedEmail {
        html: wrap_html(&escape_html(&greet), &escape_html(&intro), details, closing),
        text: wrap_text(&greet, &intro, details, closing),
        subject,
    }
}

/// Reminder email sent shortly before a session.
pub fn reminder_email(
    audience: Audience,
    recipient_name: Option<&str>,
    details: &SessionDetails<'_>,
) -> RenderedEmail {
    let subject_label = details.subject;
    let (subject, intro) = match audience {
        Audience::Student => (
            format!("Rappel : ta session en {subject_label} commence bientôt"),
            format!("Petit rappel ⏰ Ta session de soutien en {subject_label} va bientôt commencer."),
        ),
        Audience::Tutor => (
            format!("Rappel : votre session de soutien en {subject_label} commence bientôt"),
            format!("Petit rappel ⏰ Votre session de soutien en {subject_label} avec un élève va bientôt commencer."),
        ),
    };
    let closing = "Merci de te connecter quelques minutes en avance pour vérifier ton son, ta caméra et ta connexion.";
    let greet = greeting(recipient_name);

    RenderedEmail {
        html: wrap_html(&escape_html(&greet), &escape_html(&intro), details, closing),
        text: wrap_text(&greet, &intro, details, closing),
        subject,
    }
}

// ---------------------------------------------------------------------------
// In-app
// ---------------------------------------------------------------------------

/// Title and body of the in-app row written when a session is booked.
pub fn session_created_notice(audience: Audience, details: &SessionDetails<'_>) -> (String, String) {
    let when = format_when(details.starts_at);
    match audience {
        Audience::Student => (
            "Séance confirmée".to_string(),
            format!("Ta séance de {} est prévue le {when}.", details.subject),
        ),
        Audience::Tutor => (
            "Nouvelle séance".to_string(),
            format!("Une séance de {} est prévue le {when}.", details.subject),
        ),
    }
}

/// Title and body of the in-app row written when a reminder goes out.
pub fn reminder_notice(details: &SessionDetails<'_>) -> (String, String) {
    (
        "Rappel de séance".to_string(),
        format!(
            "La séance de {} commence le {}.",
            details.subject,
            format_when(details.starts_at)
        ),
    )
}
