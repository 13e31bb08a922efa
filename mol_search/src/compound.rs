use serde::{Deserialize, Serialize};

/// One compound as loaded from the source data. Never modified after ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compound {
    /// IRI-like identifier, unique within an index
    pub id: String,
    pub smiles: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_db: Option<String>,
}

impl Compound {

    pub fn new(id: &str, smiles: &str, source_db: Option<&str>) -> Self {

        return Self {
            id: id.to_string(),
            smiles: smiles.to_string(),
            source_db: source_db.map(|s| s.to_string()),
        };
    }
}
