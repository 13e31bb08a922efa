//! Declared signatures of the callable functions.

use serde::Serialize;

use crate::dispatch::value::{Value, ValueType};

/// Namespace of function names and argument predicates.
pub const FUNCTION_NAMESPACE: &str = "urn:sparql-function:";

pub const SIMILARITY_SEARCH: &str = "SimilaritySearch";
pub const SUBSTRUCTURE_SEARCH: &str = "SubstructureSearch";
pub const LIST_FINGERPRINTS: &str = "ListFingerprints";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSpec {
    pub predicate: &'static str,
    pub value_type: ValueType,
    pub required: bool,
    /// used when an optional input is not bound; `None` leaves it unset
    #[serde(serialize_with = "default_as_text", skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub description: &'static str,
}

fn default_as_text<S: serde::Serializer>(value: &Option<Value>, serializer: S) -> Result<S::Ok, S::Error> {

    match value {
        Some(v) => serializer.serialize_some(&v.to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSpec {
    pub predicate: &'static str,
    pub value_type: ValueType,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<OutputSpec>,
}

impl FunctionSpec {

    pub fn input(&self, predicate: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.predicate == predicate)
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.outputs.iter().map(|o| o.predicate).collect()
    }
}

fn required(predicate: &'static str, value_type: ValueType, description: &'static str) -> InputSpec {
    InputSpec { predicate, value_type, required: true, default: None, description }
}

fn optional(predicate: &'static str, value_type: ValueType, default: Option<Value>, description: &'static str) -> InputSpec {
    InputSpec { predicate, value_type, required: false, default, description }
}

fn output(predicate: &'static str, value_type: ValueType, description: &'static str) -> OutputSpec {
    OutputSpec { predicate, value_type, description }
}

/// The functions a dispatcher can run, looked up by local name or full IRI.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: Vec<FunctionSpec>,
}

impl FunctionRegistry {

    pub fn standard() -> Self {

        let similarity = FunctionSpec {
            name: SIMILARITY_SEARCH,
            description: "Performs similarity search based on fingerprints.",
            inputs: vec![
                required("smiles", ValueType::String, "Query SMILES string."),
                optional("limit", ValueType::Integer, Some(Value::Int(10)), "Maximum results."),
                optional("dbNames", ValueType::String, None, "Filter by database source."),
                optional("fpType", ValueType::String, Some(Value::Str("morgan_ecfp".to_string())), "Fingerprint type."),
                optional("useChirality", ValueType::Boolean, Some(Value::Bool(false)), "Whether to respect chirality."),
                optional("minScore", ValueType::Float, Some(Value::Float(0.0)), "Minimum similarity score."),
            ],
            outputs: vec![
                output("result", ValueType::Iri, "The matching compound."),
                output("score", ValueType::Float, "Tanimoto similarity score (0-1)."),
            ],
        };

        let substructure = FunctionSpec {
            name: SUBSTRUCTURE_SEARCH,
            description: "Performs substructure search.",
            inputs: vec![
                required("smart", ValueType::String, "Query pattern."),
                optional("limit", ValueType::Integer, Some(Value::Int(100)), "Maximum results."),
                optional("dbNames", ValueType::String, None, "Filter by database source."),
                optional("useChirality", ValueType::Boolean, Some(Value::Bool(false)), "Whether to respect chirality."),
                optional("minMatchCount", ValueType::Integer, Some(Value::Int(1)), "Minimum matches required."),
                optional("countMode", ValueType::String, Some(Value::Str("occurrences".to_string())),
                    "occurrences counts distinct matches, boolean reports 1 for any match."),
            ],
            outputs: vec![
                output("result", ValueType::Iri, "The matching compound."),
                output("matchCount", ValueType::Integer, "Number of matches found (1 in boolean mode)."),
            ],
        };

        let list = FunctionSpec {
            name: LIST_FINGERPRINTS,
            description: "Lists available fingerprint types.",
            inputs: vec![],
            outputs: vec![
                output("fpType", ValueType::String, "The fingerprint type identifier."),
                output("description", ValueType::String, "Description of the fingerprint."),
                output("shortName", ValueType::String, "Short name (e.g. ECFP)."),
                output("mechanism", ValueType::String, "Explanation of how it works."),
            ],
        };

        return Self { functions: vec![similarity, substructure, list] };
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {

        let local = local_name(name);
        return self.functions.iter().find(|f| f.name == local);
    }

    pub fn functions(&self) -> &[FunctionSpec] {
        &self.functions
    }
}

///`urn:sparql-function:smiles`, `<urn:sparql-function:smiles>` and `smiles` all name `smiles`
pub fn local_name(name: &str) -> &str {

    let name = name.trim();
    let name = match name.starts_with('<') && name.ends_with('>') && name.len() > 1 {
        true => &name[1..name.len() - 1],
        false => name,
    };

    return name.strip_prefix(FUNCTION_NAMESPACE).unwrap_or(name);
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn lookup_by_local_name_or_iri() {

        let registry = FunctionRegistry::standard();
        assert_eq!(registry.functions().len(), 3);
        assert!(registry.get("SimilaritySearch").is_some());
        assert!(registry.get("urn:sparql-function:SubstructureSearch").is_some());
        assert!(registry.get("<urn:sparql-function:ListFingerprints>").is_some());
        assert!(registry.get("Nope").is_none());
    }

    #[test]
    fn declared_defaults() {

        let registry = FunctionRegistry::standard();
        let sim = registry.get(SIMILARITY_SEARCH).unwrap();
        assert_eq!(sim.input("limit").unwrap().default, Some(Value::Int(10)));
        assert!(sim.input("smiles").unwrap().required);
        assert_eq!(sim.columns(), vec!["result", "score"]);

        let sub = registry.get(SUBSTRUCTURE_SEARCH).unwrap();
        assert_eq!(sub.input("limit").unwrap().default, Some(Value::Int(100)));
        assert_eq!(sub.columns(), vec!["result", "matchCount"]);
    }
}
