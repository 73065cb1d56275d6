use thiserror::Error;

/// The two failure kinds the dashboard can surface. Both are recoverable:
/// the gallery shows a placeholder or the main panel an alt text, and the
/// frame loop keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GalleryError {
    #[error("manifest could not be loaded: {0}")]
    ManifestLoad(String),
    #[error("image {path} could not be loaded: {reason}")]
    ImageLoad { path: String, reason: String },
}

impl GalleryError {
    pub fn manifest(err: &anyhow::Error) -> Self {
        GalleryError::ManifestLoad(format!("{:#}", err))
    }

    pub fn image(path: &str, err: &anyhow::Error) -> Self {
        GalleryError::ImageLoad {
            path: path.to_string(),
            reason: format!("{:#}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GalleryError;

    #[test]
    fn image_error_keeps_context_chain() {
        let err = anyhow::anyhow!("404 Not Found").context("GET contracts/202601/a.png");
        let mapped = GalleryError::image("contracts/202601/a.png", &err);
        assert_eq!(
            mapped.to_string(),
            "image contracts/202601/a.png could not be loaded: GET contracts/202601/a.png: 404 Not Found"
        );
    }
}
