use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::fields;
use crate::resources::Resource;
use crate::sanitizer::Sanitizer;

const AVAILABILITY_KEYS: [&str; 4] = ["is_available", "isAvailable", "available", "in_stock"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopItem {
    #[serde(deserialize_with = "fields::id")]
    pub id: String,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "fields::opt_f64")]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, alias = "image_url", alias = "imageUrl")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "fields::opt_u64")]
    pub stock: Option<u64>,
    #[serde(default, alias = "is_available", alias = "isAvailable", deserialize_with = "fields::flag")]
    pub available: bool,
}

impl Resource for ShopItem {
    const KIND: &'static str = "shop";

    fn id(&self) -> &str {
        &self.id
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn sanitize_html(&mut self, sanitizer: &Sanitizer) {
        sanitizer.sanitize_field(&mut self.description);
    }

    /// Shop items are gated on availability rather than a publish flag.
    fn is_visible(raw: &Value) -> bool {
        AVAILABILITY_KEYS
            .iter()
            .find_map(|key| raw.get(*key))
            .map(fields::is_truthy)
            .unwrap_or(true)
    }
}
