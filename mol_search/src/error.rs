//! Errors for loading, indexing and querying compounds

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {

    /// Query SMILES or SMARTS the toolkit could not parse
    #[error("invalid query structure {query:?}: {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("type mismatch for {predicate}: expected {expected}, got {found}")]
    TypeMismatch { predicate: String, expected: String, found: String },

    #[error("missing required argument: {0}")]
    MissingRequiredArgument(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A stored compound whose structure string does not parse
    #[error("could not parse structure of {id}: {reason}")]
    StructureParse { id: String, reason: String },

    #[error("compound not found: {0}")]
    NotFound(String),

    #[error("duplicate compound id: {0}")]
    DuplicateId(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Raised by the structure parser itself, before it is attributed to a query or a compound
    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not read compounds: {0}")]
    Load(#[from] csv::Error),

    #[error("bad config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("bad json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {

    ///Errors the caller caused with a malformed call or query, as opposed to startup failures
    pub fn is_caller_error(&self) -> bool {

        return matches!(self,
            Error::InvalidQuery { .. }
            | Error::InvalidArgument(_)
            | Error::TypeMismatch { .. }
            | Error::MissingRequiredArgument(_)
            | Error::UnknownFunction(_)
            | Error::NotFound(_)
            | Error::Json(_));
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn caller_errors_are_classified() {

        assert!(Error::InvalidArgument("limit".to_string()).is_caller_error());
        assert!(Error::MissingRequiredArgument("smiles".to_string()).is_caller_error());
        assert!(!Error::DuplicateId("c1".to_string()).is_caller_error());

        let e = Error::StructureParse { id: "c1".to_string(), reason: "bad".to_string() };
        assert!(!e.is_caller_error());
        assert!(e.to_string().contains("c1"));
    }
}
