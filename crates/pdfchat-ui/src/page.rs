//! The chat page served at `/`.
//!
//! The page talks to the same-origin API:
//!
//! - **Credential**: `PUT /credential`. Until it succeeds a persistent warning
//!   stays visible and the upload and question controls are disabled.
//! - **Session**: free-text session id, `default_session` initially.
//! - **Upload**: one PDF via `POST /documents`.
//! - **Question**: `POST /chat`, then renders the answer, the standalone
//!   question and the session's message list.
//! - **Diagnostics**: `GET /sessions` dump of every transcript.

pub const CHAT_PAGE_HTML: &str = include_str!("../assets/chat.html");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_page_is_valid_html() {
        assert!(CHAT_PAGE_HTML.starts_with("<!DOCTYPE html>"));
        assert!(CHAT_PAGE_HTML.contains("<html"));
        assert!(CHAT_PAGE_HTML.contains("</html>"));
    }

    #[test]
    fn chat_page_has_all_controls() {
        assert!(CHAT_PAGE_HTML.contains("id=\"api-key\""));
        assert!(CHAT_PAGE_HTML.contains("id=\"session-id\""));
        assert!(CHAT_PAGE_HTML.contains("id=\"pdf-file\""));
        assert!(CHAT_PAGE_HTML.contains("id=\"question\""));
    }

    #[test]
    fn chat_page_defaults_session_id() {
        assert!(CHAT_PAGE_HTML.contains("value=\"default_session\""));
    }

    #[test]
    fn chat_page_accepts_only_pdf() {
        assert!(CHAT_PAGE_HTML.contains("accept=\"application/pdf,.pdf\""));
    }

    #[test]
    fn chat_page_shows_credential_warning() {
        assert!(CHAT_PAGE_HTML.contains("Please enter your Groq API key"));
    }

    #[test]
    fn chat_page_references_api_endpoints() {
        assert!(CHAT_PAGE_HTML.contains("/credential"));
        assert!(CHAT_PAGE_HTML.contains("/documents"));
        assert!(CHAT_PAGE_HTML.contains("/chat"));
        assert!(CHAT_PAGE_HTML.contains("/sessions"));
        assert!(CHAT_PAGE_HTML.contains("/health"));
    }

    #[test]
    fn chat_page_has_no_external_urls() {
        assert!(!CHAT_PAGE_HTML.contains("https://cdn"));
        assert!(!CHAT_PAGE_HTML.contains("https://unpkg"));
        assert!(!CHAT_PAGE_HTML.contains("https://fonts.googleapis"));
    }
}
