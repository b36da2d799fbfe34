use base64::Engine;
use base64::engine::general_purpose;

/// MIME type for an upload, resolved from the file extension alone.
pub fn mime_for_extension(extension: &str) -> &'static str {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Encode an uploaded file buffer as a data-URI for storage.
pub fn to_data_uri(buffer: &[u8], extension: &str) -> String {
    let mime = mime_for_extension(extension);
    let payload = general_purpose::STANDARD.encode(buffer);
    format!("data:{mime};base64,{payload}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("png"), "image/png");
        assert_eq!(mime_for_extension(".png"), "image/png");
        assert_eq!(mime_for_extension("JPG"), "image/jpeg");
        assert_eq!(mime_for_extension("jpeg"), "image/jpeg");
        assert_eq!(mime_for_extension("bin"), "application/octet-stream");
    }

    #[test]
    fn test_to_data_uri() {
        let uri = to_data_uri(b"hello", "png");
        assert_eq!(uri, "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_to_data_uri_unknown_extension() {
        let uri = to_data_uri(&[0u8, 1, 2], "xyz");
        assert!(uri.starts_with("data:application/octet-stream;base64,"));
    }
}
