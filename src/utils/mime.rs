//! Content types for stored attachments.

/// Guess a MIME type from a filename's extension.
pub fn guess_mime(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// `Content-Disposition` value for downloading a file under `filename`.
pub fn content_disposition(filename: &str) -> String {
    let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
    format!("attachment; filename=\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("scan.pdf"), "application/pdf");
        assert_eq!(guess_mime("foto.JPG"), "image/jpeg");
        assert_eq!(guess_mime("noext"), "application/octet-stream");
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        assert_eq!(
            content_disposition("a\"b.pdf"),
            "attachment; filename=\"a\\\"b.pdf\""
        );
    }
}
