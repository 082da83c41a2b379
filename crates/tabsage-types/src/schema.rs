use serde::{Deserialize, Serialize};

/// Derived description of one tabular source, persisted as `schema.json` in
/// the cache directory and projected into each session that binds the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<FieldSchema>,
}

impl TableSchema {
    /// Field names in source header order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Names of fields whose inferred type is numeric.
    pub fn numeric_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.dtype == FieldType::Float)
            .map(|f| f.name.clone())
            .collect()
    }

    /// One bullet line per field, used as the description block handed to
    /// the generator for field selection and statement generation.
    pub fn descriptions_block(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("- {}: {}", f.name, f.definition.join(" ")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One field of a [`TableSchema`]: name, inferred type tag, a short
/// natural-language definition (two lines), summary statistics, and any
/// sample values collected during introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub dtype: FieldType,
    #[serde(default)]
    pub definition: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<FieldSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<String>,
    /// Declared engine type when the field came from relational
    /// introspection (e.g. `TEXT`, `REAL`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free-form text; rendered as `"string"` in schema.json.
    #[serde(rename = "string")]
    Text,
    Float,
}

/// Summary statistics for a field, shaped by its inferred type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSummary {
    Numeric {
        count: usize,
        min: f64,
        max: f64,
        mean: f64,
        std: f64,
        examples: Vec<f64>,
    },
    Text {
        count: usize,
        unique_count: usize,
        examples: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> TableSchema {
        TableSchema {
            fields: vec![
                FieldSchema {
                    name: "factory".to_string(),
                    dtype: FieldType::Text,
                    definition: vec![
                        "[info] Text field 'factory': used for filtering and grouping.".to_string(),
                        "[format] string; code-like values (e.g. AC25).".to_string(),
                    ],
                    summary: Some(FieldSummary::Text {
                        count: 4,
                        unique_count: 2,
                        examples: vec!["AC25".to_string(), "AB17".to_string()],
                    }),
                    samples: vec![],
                    sql_type: None,
                },
                FieldSchema {
                    name: "efficiency".to_string(),
                    dtype: FieldType::Float,
                    definition: vec![
                        "[info] Numeric field 'efficiency': used for comparison and extrema."
                            .to_string(),
                        "[format] float; value range \u{2248} [70.58, 191.03].".to_string(),
                    ],
                    summary: None,
                    samples: vec![],
                    sql_type: None,
                },
            ],
        }
    }

    #[test]
    fn test_field_names_preserve_order() {
        assert_eq!(sample_schema().field_names(), vec!["factory", "efficiency"]);
    }

    #[test]
    fn test_numeric_fields() {
        assert_eq!(sample_schema().numeric_fields(), vec!["efficiency"]);
    }

    #[test]
    fn test_schema_json_round_trip() {
        let schema = sample_schema();
        let json = serde_json::to_string_pretty(&schema).unwrap();
        let back: TableSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, back);
        // dtype tag is the wire-visible "string"/"float" pair
        assert!(json.contains("\"string\""));
        assert!(json.contains("\"float\""));
    }
}
