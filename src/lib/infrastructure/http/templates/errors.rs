//! Error page template

use askama::Template;

/// Error page
#[derive(Debug, Template)]
#[template(path = "errors/error.html")]
pub struct ErrorTemplate {
    /// HTTP status code
    pub status: u16,

    /// Message shown to the member
    pub message: String,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_message_is_escaped() -> TestResult {
        let html = ErrorTemplate {
            status: 422,
            message: "<b>Please enter a title</b>".to_string(),
        }
        .render()?;

        assert!(html.contains("&lt;b&gt;Please enter a title&lt;/b&gt;"));
        assert!(html.contains("422"));

        Ok(())
    }
}
