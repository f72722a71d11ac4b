use serde::{Deserialize, Serialize};

use crate::domain::fields;
use crate::resources::Resource;
use crate::sanitizer::Sanitizer;

/// One philosopher or event placed on the timeline map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    #[serde(deserialize_with = "fields::id")]
    pub id: String,
    #[serde(default, alias = "timeline_meta_id", alias = "meta_id", alias = "metaId", deserialize_with = "fields::opt_id")]
    pub timeline_meta_id: Option<String>,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "birth_year", deserialize_with = "fields::opt_i64")]
    pub birth_year: Option<i64>,
    #[serde(default, alias = "death_year", deserialize_with = "fields::opt_i64")]
    pub death_year: Option<i64>,
    #[serde(default, alias = "lat", deserialize_with = "fields::opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng", alias = "lon", deserialize_with = "fields::opt_f64")]
    pub longitude: Option<f64>,
    #[serde(default, alias = "is_published", alias = "isPublished", deserialize_with = "fields::flag")]
    pub published: bool,
}

impl Resource for TimelineEntry {
    const KIND: &'static str = "timeline";

    fn id(&self) -> &str {
        &self.id
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn parent_id(&self) -> Option<&str> {
        self.timeline_meta_id.as_deref()
    }

    fn sanitize_html(&mut self, sanitizer: &Sanitizer) {
        sanitizer.sanitize_field(&mut self.description);
    }
}

/// Era or school grouping timeline entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineMeta {
    #[serde(deserialize_with = "fields::id")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "start_year", deserialize_with = "fields::opt_i64")]
    pub start_year: Option<i64>,
    #[serde(default, alias = "end_year", deserialize_with = "fields::opt_i64")]
    pub end_year: Option<i64>,
    #[serde(default, alias = "is_published", alias = "isPublished", deserialize_with = "fields::flag")]
    pub published: bool,
}

impl Resource for TimelineMeta {
    const KIND: &'static str = "timeline-meta";

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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_parent_accepts_numeric_id() {
        let entry: TimelineEntry = serde_json::from_value(json!({
            "id": 9,
            "meta_id": 2,
            "title": "Seneca",
            "lat": 41.9,
            "lng": 12.5
        }))
        .unwrap();

        assert_eq!(entry.parent_id(), Some("2"));
        assert_eq!(entry.name, "Seneca");
        assert_eq!(entry.longitude, Some(12.5));
    }

    #[test]
    fn test_years_and_coordinates_accept_strings() {
        let entry: TimelineEntry = serde_json::from_value(json!({
            "id": 3,
            "name": "Plato",
            "birth_year": "-428",
            "deathYear": "-348",
            "latitude": "37.98",
            "lon": " 23.72 ",
        }))
        .unwrap();

        assert_eq!(entry.birth_year, Some(-428));
        assert_eq!(entry.death_year, Some(-348));
        assert_eq!(entry.latitude, Some(37.98));
        assert_eq!(entry.longitude, Some(23.72));

        let entry: TimelineEntry =
            serde_json::from_value(json!({"id": 4, "birthYear": "unknown", "lat": null})).unwrap();
        assert_eq!(entry.birth_year, None);
        assert_eq!(entry.latitude, None);

        let meta: TimelineMeta =
            serde_json::from_value(json!({"id": 1, "start_year": "384", "endYear": 322.0})).unwrap();
        assert_eq!(meta.start_year, Some(384));
        assert_eq!(meta.end_year, Some(322));
    }

    #[test]
    fn test_meta_without_optional_fields() {
        let meta: TimelineMeta = serde_json::from_value(json!({"id": "stoa"})).unwrap();
        assert_eq!(meta.id, "stoa");
        assert!(meta.title.is_empty());
        assert!(!meta.published);
    }
}
