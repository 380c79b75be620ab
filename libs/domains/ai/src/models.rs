use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Deployment name of the large embedding model
pub const LARGE_EMBEDDINGS_DEPLOYMENT: &str = "text-embedding-3-large";

/// Text embedding model selectable per request
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum EmbeddingModel {
    /// 1536-dim vectors, stored in `embedding`
    #[default]
    #[serde(rename = "text-embedding-ada-002")]
    #[strum(serialize = "text-embedding-ada-002")]
    Ada002,
    /// Reduced to 1024 dims, stored in `embedding_large`
    #[serde(rename = "text-embedding-3-large")]
    #[strum(serialize = "text-embedding-3-large")]
    Large3,
}

impl EmbeddingModel {
    /// Value of the `dimensions` request parameter, if any
    pub fn dimensions(&self) -> Option<u32> {
        match self {
            EmbeddingModel::Ada002 => None,
            EmbeddingModel::Large3 => Some(1024),
        }
    }

    /// Length of the vectors this model produces
    pub fn vector_len(&self) -> usize {
        match self {
            EmbeddingModel::Ada002 => 1536,
            EmbeddingModel::Large3 => 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_selector() {
        assert_eq!(
            EmbeddingModel::from_str("text-embedding-ada-002").unwrap(),
            EmbeddingModel::Ada002
        );
        assert_eq!(
            EmbeddingModel::from_str("text-embedding-3-large").unwrap(),
            EmbeddingModel::Large3
        );
        assert!(EmbeddingModel::from_str("text-embedding-3-small").is_err());
    }

    #[test]
    fn test_model_dimensions() {
        assert_eq!(EmbeddingModel::default(), EmbeddingModel::Ada002);
        assert_eq!(EmbeddingModel::Ada002.dimensions(), None);
        assert_eq!(EmbeddingModel::Ada002.vector_len(), 1536);
        assert_eq!(EmbeddingModel::Large3.dimensions(), Some(1024));
        assert_eq!(EmbeddingModel::Large3.to_string(), LARGE_EMBEDDINGS_DEPLOYMENT);
    }
}
