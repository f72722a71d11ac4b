use serde::{Deserialize, Serialize};

use crate::domain::fields;
use crate::resources::Resource;

/// External video attached to a monologue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoLink {
    #[serde(deserialize_with = "fields::id")]
    pub id: String,
    #[serde(default, alias = "monologue_id", alias = "parentId", alias = "parent_id", deserialize_with = "fields::opt_id")]
    pub monologue_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "link", alias = "video_url")]
    pub url: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "fields::opt_u64")]
    pub position: Option<u64>,
    #[serde(default, alias = "is_published", alias = "isPublished", deserialize_with = "fields::flag")]
    pub published: bool,
}

impl Resource for VideoLink {
    const KIND: &'static str = "video-links";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.monologue_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_video_link_aliases() {
        let link: VideoLink = serde_json::from_value(json!({
            "id": 4,
            "parent_id": "17",
            "link": "https://video.example.com/v/abc",
            "position": "2"
        }))
        .unwrap();

        assert_eq!(link.parent_id(), Some("17"));
        assert_eq!(link.url, "https://video.example.com/v/abc");
        assert_eq!(link.position, Some(2));
        assert_eq!(link.slug(), None);
    }
}
