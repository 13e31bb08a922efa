//! Filtering and counting by substructure.

use log::debug;

use crate::catalog::FingerprintType;
use crate::chem::CountMode;
use crate::error::{Error, Result};
use crate::index::{CompoundIndex, Index};
use crate::search::check_limit;

#[derive(Debug, Clone, PartialEq)]
pub struct SubstructureQuery<'a> {
    pub pattern: &'a str,
    pub db: Option<&'a str>,
    pub use_chirality: bool,
    pub min_match_count: i64,
    pub limit: i64,
    pub mode: CountMode,
}

impl<'a> SubstructureQuery<'a> {

    pub fn new(pattern: &'a str) -> Self {

        return Self {
            pattern,
            db: None,
            use_chirality: false,
            min_match_count: 1,
            limit: 100,
            mode: CountMode::Occurrences,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubstructureHit {
    pub id: String,
    pub position: CompoundIndex,
    pub match_count: usize,
}

/// Compounds containing the pattern at least `min_match_count` times.
///
/// With [`CountMode::Occurrences`] hits are ordered by descending count, equal counts by
/// ingestion position. With [`CountMode::Boolean`] every hit counts 1, so hits come out in
/// ingestion order and the scan stops once `limit` are found.
pub fn search(index: &Index, query: &SubstructureQuery) -> Result<Vec<SubstructureHit>> {

    let limit = check_limit(query.limit)?;

    if query.min_match_count < 1 {
        return Err(Error::InvalidArgument(format!("minMatchCount must be at least 1, got {}", query.min_match_count)));
    }
    if query.mode == CountMode::Boolean && query.min_match_count > 1 {
        return Err(Error::InvalidArgument("minMatchCount above 1 needs countMode occurrences".to_string()));
    }
    let min_count = query.min_match_count as usize;

    let toolkit = index.toolkit();
    let pattern = toolkit.parse_pattern(query.pattern).map_err(|e| Error::InvalidQuery {
        query: query.pattern.to_string(),
        reason: e.to_string(),
    })?;
    let screen = toolkit.screen(&pattern);

    let mut hits: Vec<SubstructureHit> = Vec::new();
    let mut screened_out = 0;

    for (position, compound) in index.all_ids(query.db) {

        if let Some(screen) = &screen {
            match index.fingerprint_at(position, FingerprintType::Pattern, false) {
                Ok(fp) if fp.contains_all(screen) => {},
                Ok(_) => {
                    screened_out += 1;
                    continue;
                },
                Err(_) => continue,
            }
        }

        let mol = match index.structure_at(position) {
            Ok(mol) => mol,
            Err(_) => continue,
        };

        let match_count = toolkit.match_count(&mol, &pattern, query.use_chirality, query.mode);
        if match_count >= min_count {
            hits.push(SubstructureHit { id: compound.id.clone(), position, match_count });

            if query.mode == CountMode::Boolean && hits.len() == limit {
                break;
            }
        }
    }

    if query.mode == CountMode::Occurrences {
        hits.sort_by(|a, b| b.match_count.cmp(&a.match_count).then(a.position.cmp(&b.position)));
        hits.truncate(limit);
    }

    debug!("substructure {}: {} screened out, returned {}", query.pattern, screened_out, hits.len());

    return Ok(hits);
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::chem::BuiltinToolkit;
    use crate::compound::Compound;
    use std::sync::Arc;

    fn index() -> Index {

        let records = vec![
            Compound::new("cyclohexane", "C1CCCCC1", Some("a")),
            Compound::new("phenol", "Oc1ccccc1", Some("a")),
            Compound::new("biphenyl", "c1ccccc1-c1ccccc1", Some("b")),
            Compound::new("broken", "c1cc(", Some("b")),
            Compound::new("toluene", "Cc1ccccc1", Some("b")),
        ];

        return Index::ingest(records, Arc::new(BuiltinToolkit)).unwrap();
    }

    fn ids(hits: &[SubstructureHit]) -> Vec<&str> {
        hits.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn benzene_pattern() {

        let index = index();
        let hits = search(&index, &SubstructureQuery::new("c1ccccc1")).unwrap();
        dbg!(&hits);

        assert_eq!(ids(&hits), vec!["biphenyl", "phenol", "toluene"]);
        assert_eq!(hits[0].match_count, 2);
        assert!(hits.iter().all(|h| h.match_count >= 1));
    }

    #[test]
    fn min_match_count_filters() {

        let index = index();
        let mut query = SubstructureQuery::new("c1ccccc1");
        query.min_match_count = 2;
        assert_eq!(ids(&search(&index, &query).unwrap()), vec!["biphenyl"]);
    }

    #[test]
    fn boolean_mode_streams_in_order() {

        let index = index();
        let mut query = SubstructureQuery::new("c1ccccc1");
        query.mode = CountMode::Boolean;
        query.limit = 2;
        let hits = search(&index, &query).unwrap();
        assert_eq!(ids(&hits), vec!["phenol", "biphenyl"]);
        assert!(hits.iter().all(|h| h.match_count == 1));

        query.min_match_count = 2;
        assert!(matches!(search(&index, &query), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn wildcard_pattern_skips_screening() {

        let index = index();
        let hits = search(&index, &SubstructureQuery::new("*O")).unwrap();
        assert_eq!(ids(&hits), vec!["phenol"]);
    }

    #[test]
    fn db_filter_and_limit() {

        let index = index();
        let mut query = SubstructureQuery::new("c1ccccc1");
        query.db = Some("a");
        assert_eq!(ids(&search(&index, &query).unwrap()), vec!["phenol"]);

        query.db = None;
        query.limit = 1;
        assert_eq!(search(&index, &query).unwrap().len(), 1);
    }

    #[test]
    fn bad_arguments() {

        let index = index();

        let mut query = SubstructureQuery::new("c1ccccc1");
        query.limit = -1;
        assert!(matches!(search(&index, &query), Err(Error::InvalidArgument(_))));

        let mut query = SubstructureQuery::new("c1ccccc1");
        query.min_match_count = 0;
        assert!(matches!(search(&index, &query), Err(Error::InvalidArgument(_))));

        assert!(matches!(search(&index, &SubstructureQuery::new("c1cc(")), Err(Error::InvalidQuery { .. })));
    }
}
