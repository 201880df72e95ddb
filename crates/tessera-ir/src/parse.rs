use crate::manifest::CatalogManifest;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn parse_manifest(json: &str) -> Result<CatalogManifest, ParseError> {
    Ok(serde_json::from_str(json)?)
}
