use serde::Deserialize;

/// One photo in the feed payload. Fields other than `urls` are ignored.
#[derive(Debug, Deserialize)]
pub struct PhotoDto {
    /// Rendition URLs.
    pub urls: PhotoUrls,
}

/// Photo rendition URLs.
#[derive(Debug, Deserialize)]
pub struct PhotoUrls {
    /// The regular rendition, sized for display.
    #[serde(default)]
    pub regular: Option<String>,
}

/// Error response body.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error messages from the API.
    #[serde(default)]
    pub errors: Vec<String>,
}
