//! sealexam-report: self-contained HTML rendering of session reports.

pub mod html;

pub use html::{generate_html, write_html_report};
