//! Transport-free request handling for the report endpoints.
//!
//! An HTTP layer maps a request onto [`Route`], passes the raw body to
//! [`handle`] and copies the [`Response`] fields onto the wire.

use crate::{Error, ReportOptions, SummaryInput, generate};
use log::{error, warn};
use serde_json::json;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The current report endpoint.
    Report,
    /// The retired endpoint; it answers 410 for every request.
    Legacy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    /// Suggested download name, sent as `Content-Disposition: attachment`.
    pub filename: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    fn json(status: u16, message: &str) -> Response {
        Response {
            status,
            content_type: JSON_CONTENT_TYPE,
            filename: None,
            body: json!({ "error": message }).to_string().into_bytes(),
        }
    }

    /// The filename is sent as a quoted string, so quotes and backslashes are escaped.
    pub fn content_disposition(&self) -> Option<String> {
        self.filename.as_ref().map(|name| {
            let mut quoted = String::with_capacity(name.len());
            for c in name.chars().filter(|c| !c.is_control()) {
                if c == '"' || c == '\\' {
                    quoted.push('\\');
                }
                quoted.push(c);
            }
            format!("attachment; filename=\"{}\"", quoted)
        })
    }
}

pub fn handle(route: Route, body: &[u8], options: &ReportOptions) -> Response {
    match route {
        Route::Legacy => Response::json(410, "PDF generation has moved to the report endpoint"),
        Route::Report => {
            let result = SummaryInput::from_json(body)
                .map_err(Error::from)
                .and_then(|input| generate(&input, options));
            match result {
                Ok(bytes) => Response {
                    status: 200,
                    content_type: PDF_CONTENT_TYPE,
                    filename: Some(options.filename.clone()),
                    body: bytes,
                },
                Err(err) if err.is_validation() => {
                    warn!("report request rejected: {}", err);
                    Response::json(400, &err.to_string())
                }
                Err(err) => {
                    error!("report generation failed: {}", err);
                    Response::json(500, "report generation failed")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_message(response: &Response) -> String {
        let value: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        value["error"].as_str().unwrap().to_string()
    }

    #[test]
    fn legacy_route_is_gone() {
        let response = handle(Route::Legacy, br#"{"entryCount": 1, "totalHours": 1}"#, &ReportOptions::default());
        assert_eq!(response.status, 410);
        assert_eq!(response.content_type, JSON_CONTENT_TYPE);
        assert_eq!(error_message(&response), "PDF generation has moved to the report endpoint");
    }

    #[test]
    fn report_route_returns_attachment() {
        let response = handle(
            Route::Report,
            br#"{"entryCount": 12, "totalHours": 34.5, "averageHours": 2.875, "invalidCount": 1}"#,
            &ReportOptions::default(),
        );
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, PDF_CONTENT_TYPE);
        assert_eq!(
            response.content_disposition().as_deref(),
            Some("attachment; filename=\"weekly-report.pdf\"")
        );
        assert!(response.body.starts_with(b"%PDF-1.4"));
    }

    #[test]
    fn invalid_body_is_a_client_error() {
        let response = handle(Route::Report, br#"{"entryCount": 12}"#, &ReportOptions::default());
        assert_eq!(response.status, 400);
        assert!(error_message(&response).contains("totalHours"));
        assert_eq!(response.filename, None);
    }

    #[test]
    fn serialization_failure_is_a_server_error() {
        let options = ReportOptions::builder().version("abc").build();
        let response = handle(Route::Report, br#"{"entryCount": 1, "totalHours": 1}"#, &options);
        assert_eq!(response.status, 500);
        assert_eq!(response.content_type, JSON_CONTENT_TYPE);
        assert_eq!(response.filename, None);
        assert_eq!(error_message(&response), "report generation failed");
    }

    #[test]
    fn filename_is_quoted_safely() {
        let options = ReportOptions::builder().filename("week \"12\"\\final.pdf").build();
        let response = handle(Route::Report, br#"{"entryCount": 1, "totalHours": 1}"#, &options);
        assert_eq!(response.status, 200);
        assert_eq!(
            response.content_disposition().as_deref(),
            Some(r#"attachment; filename="week \"12\"\\final.pdf""#)
        );
    }

    #[test]
    fn unencodable_label_is_a_client_error() {
        let options = ReportOptions::builder().title("Report ✓").build();
        let response = handle(Route::Report, br#"{"entryCount": 1, "totalHours": 1}"#, &options);
        assert_eq!(response.status, 400);
    }
}
