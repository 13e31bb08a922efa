//! Binds declarative function calls to the search engines.
//!
//! A call names a registered function and binds some of its input predicates. The dispatcher
//! checks the bindings against the declared inputs, runs the engine, and hands back rows whose
//! columns are the declared outputs, in engine order.

pub mod schema;
pub mod value;

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::catalog::{Catalog, FingerprintType};
use crate::chem::CountMode;
use crate::error::{Error, Result};
use crate::index::Index;
use crate::search::{similarity, substructure, SimilarityQuery, SubstructureQuery};

pub use schema::{FunctionRegistry, FunctionSpec, FUNCTION_NAMESPACE};
pub use value::{Value, ValueType};

/// One result row, values in the function's declared column order.
pub type Row = Vec<Value>;

/// Rows of one call, produced on demand.
pub struct Rows {
    columns: Vec<&'static str>,
    inner: Box<dyn Iterator<Item = Row> + Send>,
}

impl Rows {

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }
}

impl Iterator for Rows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.inner.next()
    }
}

///Decoded bindings: every declared input that is bound or has a default
#[derive(Debug)]
struct Arguments {
    values: HashMap<&'static str, Value>,
}

impl Arguments {

    fn decode(spec: &FunctionSpec, bindings: &[(String, Value)]) -> Result<Self> {

        let mut values: HashMap<&'static str, Value> = HashMap::new();

        for (predicate, value) in bindings {
            let local = schema::local_name(predicate);
            let input = spec.input(local).ok_or_else(|| {
                Error::InvalidArgument(format!("{} has no input {}", spec.name, predicate))
            })?;

            if values.contains_key(input.predicate) {
                return Err(Error::InvalidArgument(format!("{} bound more than once", input.predicate)));
            }

            values.insert(input.predicate, value.clone().coerce(input.predicate, input.value_type)?);
        }

        for input in &spec.inputs {
            if values.contains_key(input.predicate) {
                continue;
            }
            match (input.required, &input.default) {
                (true, _) => return Err(Error::MissingRequiredArgument(input.predicate.to_string())),
                (false, Some(default)) => {
                    values.insert(input.predicate, default.clone());
                },
                (false, None) => {},
            }
        }

        return Ok(Self { values });
    }

    fn str(&self, predicate: &str) -> Result<&str> {

        match self.values.get(predicate) {
            Some(Value::Str(s)) => Ok(s.as_str()),
            _ => Err(Error::MissingRequiredArgument(predicate.to_string())),
        }
    }

    ///Unbound and empty strings both mean "not given"
    fn opt_str(&self, predicate: &str) -> Option<&str> {

        match self.values.get(predicate) {
            Some(Value::Str(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    fn int(&self, predicate: &str) -> Result<i64> {

        match self.values.get(predicate) {
            Some(Value::Int(i)) => Ok(*i),
            _ => Err(Error::MissingRequiredArgument(predicate.to_string())),
        }
    }

    fn float(&self, predicate: &str) -> Result<f64> {

        match self.values.get(predicate) {
            Some(Value::Float(x)) => Ok(*x),
            _ => Err(Error::MissingRequiredArgument(predicate.to_string())),
        }
    }

    fn bool(&self, predicate: &str) -> Result<bool> {

        match self.values.get(predicate) {
            Some(Value::Bool(b)) => Ok(*b),
            _ => Err(Error::MissingRequiredArgument(predicate.to_string())),
        }
    }
}

/// Runs registered functions over one index.
///
/// Every collaborator is passed in, so independent dispatchers over different indexes can live in
/// one process.
#[derive(Clone)]
pub struct Dispatcher {
    index: Arc<Index>,
    catalog: Arc<Catalog>,
    registry: Arc<FunctionRegistry>,
}

impl Dispatcher {

    pub fn new(index: Arc<Index>, catalog: Arc<Catalog>, registry: Arc<FunctionRegistry>) -> Self {
        Self { index, catalog, registry }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn invoke(&self, function: &str, bindings: &[(String, Value)]) -> Result<Rows> {

        let spec = self.registry
            .get(function)
            .ok_or_else(|| Error::UnknownFunction(function.to_string()))?;

        let args = Arguments::decode(spec, bindings)?;
        debug!("invoking {} with {:?}", spec.name, args);

        let inner: Box<dyn Iterator<Item = Row> + Send> = match spec.name {
            schema::SIMILARITY_SEARCH => self.similarity(&args)?,
            schema::SUBSTRUCTURE_SEARCH => self.substructure(&args)?,
            schema::LIST_FINGERPRINTS => self.list_fingerprints(),
            other => return Err(Error::UnknownFunction(other.to_string())),
        };

        return Ok(Rows { columns: spec.columns(), inner });
    }

    fn similarity(&self, args: &Arguments) -> Result<Box<dyn Iterator<Item = Row> + Send>> {

        let query = SimilarityQuery {
            smiles: args.str("smiles")?,
            fp_type: FingerprintType::from_key(args.str("fpType")?)?,
            use_chirality: args.bool("useChirality")?,
            min_score: args.float("minScore")?,
            db: args.opt_str("dbNames"),
            limit: args.int("limit")?,
        };

        let hits = similarity::search(&self.index, &query)?;

        return Ok(Box::new(hits.into_iter().map(|hit| vec![Value::Iri(hit.id), Value::Float(hit.score)])));
    }

    fn substructure(&self, args: &Arguments) -> Result<Box<dyn Iterator<Item = Row> + Send>> {

        let query = SubstructureQuery {
            pattern: args.str("smart")?,
            db: args.opt_str("dbNames"),
            use_chirality: args.bool("useChirality")?,
            min_match_count: args.int("minMatchCount")?,
            limit: args.int("limit")?,
            mode: CountMode::from_key(args.str("countMode")?)?,
        };

        let hits = substructure::search(&self.index, &query)?;

        return Ok(Box::new(hits.into_iter().map(|hit| vec![Value::Iri(hit.id), Value::Int(hit.match_count as i64)])));
    }

    fn list_fingerprints(&self) -> Box<dyn Iterator<Item = Row> + Send> {

        let catalog = Arc::clone(&self.catalog);
        let count = catalog.len();

        return Box::new((0..count).map(move |i| {
            let entry = &catalog.entries()[i];
            vec![
                Value::Str(entry.key.to_string()),
                Value::Str(entry.description.to_string()),
                Value::Str(entry.short_name.to_string()),
                Value::Str(entry.mechanism.to_string()),
            ]
        }));
    }
}
