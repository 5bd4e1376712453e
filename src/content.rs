//! Content model and normalizer.
//!
//! The catalogue API returns loosely keyed records (`contentid`, `contenttype`,
//! `imageurl`, ...) whose extra fields depend on the content type. `normalize`
//! maps such a record to a [`ContentItem`]. It is total: missing fields take
//! defaults and unrecognized types become [`ContentDetails::Unknown`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Content types known to the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Course,
    LiveLearning,
    Resource,
    Video,
    Program,
    Page,
    PartneredContent,
}

impl ContentType {
    /// Every known type, in the order a full cache refresh visits them.
    pub const ALL: [ContentType; 7] = [
        ContentType::Course,
        ContentType::LiveLearning,
        ContentType::Resource,
        ContentType::Video,
        ContentType::Program,
        ContentType::Page,
        ContentType::PartneredContent,
    ];

    /// The wire value used by the catalogue API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Course => "course",
            ContentType::LiveLearning => "live learning",
            ContentType::Resource => "resource",
            ContentType::Video => "video",
            ContentType::Program => "program",
            ContentType::Page => "page",
            ContentType::PartneredContent => "partnered content",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ();

    /// Case-insensitive; `-` and `_` are accepted in place of spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = s.trim().to_lowercase().replace(['-', '_'], " ");
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str() == canonical)
            .ok_or(())
    }
}

/// Fields specific to one content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ContentDetails {
    #[serde(rename_all = "camelCase")]
    Course {
        topics: Option<Vec<Value>>,
        competencies: Option<Vec<Value>>,
    },
    #[serde(rename_all = "camelCase")]
    LiveLearning {
        start_time: Option<String>,
        end_time: Option<String>,
        location: Option<String>,
        facilitator: Option<String>,
        max_attendees: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    Resource {
        resource_type: Option<String>,
        file_url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        video_url: Option<String>,
        video_duration: Option<u64>,
        video_provider: Option<String>,
    },
    Page { content: Option<String> },
    #[serde(rename_all = "camelCase")]
    PartneredContent {
        partner: Option<String>,
        external_url: Option<String>,
    },
    Unknown,
}

/// A normalized catalogue record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: u64,
    pub fullname: String,
    pub summary: String,
    pub image: Option<String>,
    pub content_type: String,
    pub url: String,
    pub badge: Option<String>,
    pub completion_status: Option<String>,
    pub programs: Vec<Value>,
    pub category: Option<Value>,
    pub tags: Vec<Value>,
    pub custom_fields: Value,
    pub cost: f64,
    pub duration: String,
    pub time_created: String,
    pub time_modified: String,
    pub content_status: String,
    pub payment_cost: Value,
    pub details: ContentDetails,
}

impl ContentItem {
    /// The known content type of this item, if any.
    pub fn known_type(&self) -> Option<ContentType> {
        self.content_type.parse().ok()
    }
}

/// Map a raw catalogue record to a [`ContentItem`].
///
/// A non-object `raw` yields an empty item of unknown type.
pub fn normalize(raw: &Value) -> ContentItem {
    let empty = Map::new();
    let record = raw.as_object().unwrap_or(&empty);
    let fields = Fields(record);

    let content_type = fields
        .string("contenttype")
        .unwrap_or_else(|| "unknown".to_string());

    let details = match content_type.parse::<ContentType>() {
        Ok(ContentType::Course) => ContentDetails::Course {
            topics: fields.array("topics"),
            competencies: fields.array("competencies"),
        },
        Ok(ContentType::LiveLearning) => ContentDetails::LiveLearning {
            start_time: fields.string("start_time"),
            end_time: fields.string("end_time"),
            location: fields.string("location"),
            facilitator: fields.string("facilitator"),
            max_attendees: fields.unsigned("max_attendees").map(|n| n as u32),
        },
        Ok(ContentType::Resource) => ContentDetails::Resource {
            resource_type: fields.string("resource_type"),
            file_url: fields.string("file_url"),
        },
        Ok(ContentType::Video) => ContentDetails::Video {
            video_url: fields.string("video_url"),
            video_duration: fields.unsigned("video_duration"),
            video_provider: fields.string("video_provider"),
        },
        Ok(ContentType::Page) => ContentDetails::Page {
            content: fields.string("content"),
        },
        Ok(ContentType::PartneredContent) => ContentDetails::PartneredContent {
            partner: fields.string("partner"),
            external_url: fields.string("external_url"),
        },
        Ok(ContentType::Program) | Err(()) => ContentDetails::Unknown,
    };

    ContentItem {
        id: fields
            .unsigned("contentid")
            .or_else(|| fields.unsigned("id"))
            .unwrap_or(0),
        fullname: fields.string("fullname").unwrap_or_default(),
        summary: fields.string("summary").unwrap_or_default(),
        image: fields.string("imageurl"),
        content_type,
        url: fields.string("url").unwrap_or_default(),
        badge: fields.string("badge"),
        completion_status: fields.string("completionstatus"),
        programs: fields.array("programs").unwrap_or_default(),
        category: fields.present("category"),
        tags: fields.array("tags").unwrap_or_default(),
        custom_fields: fields
            .present("customfields")
            .unwrap_or_else(|| Value::Array(Vec::new())),
        cost: fields.float("cost").unwrap_or(0.0),
        duration: fields.string("duration").unwrap_or_default(),
        time_created: fields.string("timecreated").unwrap_or_default(),
        time_modified: fields.string("timemodified").unwrap_or_default(),
        content_status: fields.string("contentstatus").unwrap_or_default(),
        payment_cost: fields.present("paymentCost").unwrap_or(Value::from(0)),
        details,
    }
}

/// Normalize every object in `items`, skipping anything that is not a record.
pub fn normalize_collection(items: &[Value]) -> Vec<ContentItem> {
    items
        .iter()
        .filter_map(|item| {
            if item.is_object() {
                Some(normalize(item))
            } else {
                tracing::warn!(item = %item, "Skipping non-object item in content collection");
                None
            }
        })
        .collect()
}

/// Lenient accessors over a raw record. `null` counts as absent.
struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    fn present(&self, key: &str) -> Option<Value> {
        self.0.get(key).filter(|v| !v.is_null()).cloned()
    }

    fn string(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn unsigned(&self, key: &str) -> Option<u64> {
        match self.0.get(key)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn float(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn array(&self, key: &str) -> Option<Vec<Value>> {
        match self.0.get(key)? {
            Value::Array(values) => Some(values.clone()),
            Value::Object(map) => Some(map.values().cloned().collect()),
            _ => None,
        }
    }
}
