//! Embedded chat page.
//!
//! A single self-contained HTML file, compiled into the binary with
//! `include_str!` and served from `/`. All CSS and JavaScript are inline.

pub mod page;

pub use page::CHAT_PAGE_HTML;
