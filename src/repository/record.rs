//! Enrolled-subject record and its wire schema.
//!
//! The on-disk schema is v2: `iris_templates` is a JSON array of arrays of
//! doubles. Legacy v1 rows carried a single `iris_template` column holding
//! comma-separated doubles; those are accepted on read and migrated into a
//! singleton `iris_templates`. Writes always emit v2.

use crate::encode::Template;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Demographic fields captured at enrollment. Opaque to the recognition
/// core; only the identity string and the templates matter to matching.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubjectDetails {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "RecordWire")]
pub struct SubjectRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub iris_image_path: Option<String>,
    /// Templates of the same eye, append-only, diversity chosen at
    /// enrollment.
    pub iris_templates: Vec<Vec<f64>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubjectRecord {
    pub fn new(
        id: String,
        details: SubjectDetails,
        templates: Vec<Template>,
        iris_image_path: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_name: details.first_name,
            last_name: details.last_name,
            age: details.age,
            email: details.email,
            phone: details.phone,
            notes: details.notes,
            iris_image_path,
            iris_templates: templates.iter().map(Template::to_f64).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Decode the stored template vectors, skipping any malformed entry.
    pub fn templates(&self) -> Vec<Template> {
        self.iris_templates
            .iter()
            .filter_map(|values| Template::from_f64(values).ok())
            .collect()
    }

    /// Case-insensitive match over the searchable fields.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        let mut haystacks = vec![
            self.id.to_lowercase(),
            self.first_name.to_lowercase(),
            self.last_name.to_lowercase(),
        ];
        if let Some(email) = &self.email {
            haystacks.push(email.to_lowercase());
        }
        if let Some(phone) = &self.phone {
            haystacks.push(phone.to_lowercase());
        }
        haystacks.iter().any(|h| h.contains(&q))
    }
}

/// Read-side schema accepting both template columns.
#[derive(Deserialize)]
struct RecordWire {
    id: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    iris_image_path: Option<String>,
    #[serde(default)]
    iris_templates: Option<Vec<Vec<f64>>>,
    /// Legacy v1 column: comma-separated doubles.
    #[serde(default)]
    iris_template: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RecordWire> for SubjectRecord {
    type Error = String;

    fn try_from(wire: RecordWire) -> Result<Self, Self::Error> {
        let iris_templates = match (wire.iris_templates, wire.iris_template) {
            (Some(templates), _) if !templates.is_empty() => templates,
            (_, Some(legacy)) => vec![parse_legacy_template(&legacy)?],
            (Some(templates), None) => templates,
            (None, None) => Vec::new(),
        };
        Ok(SubjectRecord {
            id: wire.id,
            first_name: wire.first_name,
            last_name: wire.last_name,
            age: wire.age,
            email: wire.email,
            phone: wire.phone,
            notes: wire.notes,
            iris_image_path: wire.iris_image_path,
            iris_templates,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

fn parse_legacy_template(raw: &str) -> Result<Vec<f64>, String> {
    raw.split(',')
        .map(|token| {
            token
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("bad legacy template value {token:?}: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1_json() -> String {
        r#"{
            "id": "subj-1",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "iris_template": "1.0, 0.0, 1.0, 1.0",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }"#
        .to_string()
    }

    #[test]
    fn v1_record_migrates_to_singleton_templates() {
        let record: SubjectRecord = serde_json::from_str(&v1_json()).expect("parse v1");
        assert_eq!(record.iris_templates.len(), 1);
        assert_eq!(record.iris_templates[0], vec![1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn v1_record_serializes_as_v2() {
        let record: SubjectRecord = serde_json::from_str(&v1_json()).expect("parse v1");
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains("iris_templates"));
        assert!(!json.contains("\"iris_template\""));
    }

    #[test]
    fn v2_column_wins_when_both_present() {
        let json = r#"{
            "id": "subj-2",
            "first_name": "Grace",
            "last_name": "Hopper",
            "iris_template": "9.0",
            "iris_templates": [[0.5, 0.5]],
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }"#;
        let record: SubjectRecord = serde_json::from_str(json).expect("parse");
        assert_eq!(record.iris_templates, vec![vec![0.5, 0.5]]);
    }

    #[test]
    fn malformed_legacy_template_is_an_error() {
        let json = r#"{
            "id": "subj-3",
            "iris_template": "1.0, spam",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }"#;
        assert!(serde_json::from_str::<SubjectRecord>(json).is_err());
    }

    #[test]
    fn search_matches_name_and_email() {
        let record = SubjectRecord::new(
            "id-9".into(),
            SubjectDetails {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: Some("ada@example.org".into()),
                ..Default::default()
            },
            Vec::new(),
            None,
            Utc::now(),
        );
        assert!(record.matches_query("love"));
        assert!(record.matches_query("ADA@"));
        assert!(!record.matches_query("babbage"));
    }
}
