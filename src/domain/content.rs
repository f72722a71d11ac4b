use serde::{Deserialize, Serialize};

use crate::domain::fields;
use crate::resources::Resource;
use crate::sanitizer::Sanitizer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(deserialize_with = "fields::id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, alias = "summary")]
    pub excerpt: Option<String>,
    #[serde(default, alias = "body")]
    pub content: Option<String>,
    #[serde(default, alias = "cover_image", alias = "image")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "is_published", alias = "isPublished", deserialize_with = "fields::flag")]
    pub published: bool,
    #[serde(default, alias = "is_featured", alias = "isFeatured", deserialize_with = "fields::flag")]
    pub featured: bool,
    #[serde(default, alias = "published_at")]
    pub published_at: Option<String>,
}

impl Resource for Article {
    const KIND: &'static str = "articles";

    fn id(&self) -> &str {
        &self.id
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn sanitize_html(&mut self, sanitizer: &Sanitizer) {
        sanitizer.sanitize_field(&mut self.content);
        sanitizer.sanitize_field(&mut self.excerpt);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Magazine {
    #[serde(deserialize_with = "fields::id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "cover_image", alias = "image")]
    pub cover_image: Option<String>,
    #[serde(default, alias = "issue_number", alias = "issue", deserialize_with = "fields::opt_u64")]
    pub issue_number: Option<u64>,
    #[serde(default, alias = "pdf_url", alias = "file")]
    pub pdf_url: Option<String>,
    #[serde(default, alias = "is_published", alias = "isPublished", deserialize_with = "fields::flag")]
    pub published: bool,
    #[serde(default, alias = "published_at")]
    pub published_at: Option<String>,
}

impl Resource for Magazine {
    const KIND: &'static str = "magazines";

    fn id(&self) -> &str {
        &self.id
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn sanitize_html(&mut self, sanitizer: &Sanitizer) {
        sanitizer.sanitize_field(&mut self.description);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchPaper {
    #[serde(deserialize_with = "fields::id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default, alias = "body")]
    pub content: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default, alias = "pdf_url", alias = "file")]
    pub pdf_url: Option<String>,
    #[serde(default, alias = "is_published", alias = "isPublished", deserialize_with = "fields::flag")]
    pub published: bool,
    #[serde(default, alias = "published_at")]
    pub published_at: Option<String>,
}

impl Resource for ResearchPaper {
    const KIND: &'static str = "research";

    fn id(&self) -> &str {
        &self.id
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn sanitize_html(&mut self, sanitizer: &Sanitizer) {
        sanitizer.sanitize_field(&mut self.abstract_text);
        sanitizer.sanitize_field(&mut self.content);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monologue {
    #[serde(deserialize_with = "fields::id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, alias = "body")]
    pub content: Option<String>,
    #[serde(default, alias = "audio_url")]
    pub audio_url: Option<String>,
    #[serde(default, alias = "cover_image", alias = "image")]
    pub cover_image: Option<String>,
    #[serde(default, alias = "is_published", alias = "isPublished", deserialize_with = "fields::flag")]
    pub published: bool,
}

impl Resource for Monologue {
    const KIND: &'static str = "monologues";

    fn id(&self) -> &str {
        &self.id
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn sanitize_html(&mut self, sanitizer: &Sanitizer) {
        sanitizer.sanitize_field(&mut self.content);
    }
}
