//! Ranking by fingerprint similarity.

use log::debug;

use crate::catalog::FingerprintType;
use crate::error::{Error, Result};
use crate::index::{CompoundIndex, Index};
use crate::search::check_limit;

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityQuery<'a> {
    pub smiles: &'a str,
    pub fp_type: FingerprintType,
    pub use_chirality: bool,
    pub min_score: f64,
    pub db: Option<&'a str>,
    pub limit: i64,
}

impl<'a> SimilarityQuery<'a> {

    ///Query with the function defaults: ECFP, no chirality, no score floor, ten results
    pub fn new(smiles: &'a str) -> Self {

        return Self {
            smiles,
            fp_type: FingerprintType::MorganEcfp,
            use_chirality: false,
            min_score: 0.0,
            db: None,
            limit: 10,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    pub id: String,
    pub position: CompoundIndex,
    pub score: f64,
}

/// Scores every candidate against the query and returns the best `limit` hits.
///
/// Hits are ordered by descending score, equal scores by ingestion position. Compounds whose
/// structure does not parse are skipped.
pub fn search(index: &Index, query: &SimilarityQuery) -> Result<Vec<SimilarityHit>> {

    let limit = check_limit(query.limit)?;

    if !(0.0..=1.0).contains(&query.min_score) {
        return Err(Error::InvalidArgument(format!("minScore must be within [0, 1], got {}", query.min_score)));
    }

    let toolkit = index.toolkit();
    let mol = toolkit.parse_structure(query.smiles).map_err(|e| Error::InvalidQuery {
        query: query.smiles.to_string(),
        reason: e.to_string(),
    })?;
    let query_fp = toolkit.fingerprint(&mol, query.fp_type, query.use_chirality);

    let mut hits: Vec<SimilarityHit> = Vec::new();
    let mut scanned = 0;

    for (position, compound) in index.all_ids(query.db) {
        scanned += 1;

        let fp = match index.fingerprint_at(position, query.fp_type, query.use_chirality) {
            Ok(fp) => fp,
            Err(_) => continue,
        };

        let score = toolkit.similarity(&query_fp, &fp);
        if score >= query.min_score {
            hits.push(SimilarityHit { id: compound.id.clone(), position, score });
        }
    }

    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.position.cmp(&b.position)));
    hits.truncate(limit);

    debug!("similarity {} ({}): scanned {}, returned {}", query.smiles, query.fp_type, scanned, hits.len());

    return Ok(hits);
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::chem::BuiltinToolkit;
    use crate::compound::Compound;
    use assert_approx_eq::assert_approx_eq;
    use std::sync::Arc;

    fn index() -> Index {

        let records = vec![
            Compound::new("ethanol", "CCO", Some("a")),
            Compound::new("benzene", "c1ccccc1", Some("a")),
            Compound::new("toluene", "Cc1ccccc1", Some("b")),
            Compound::new("broken", "C1CC", Some("b")),
            Compound::new("benzene-again", "C1=CC=CC=C1", Some("b")),
        ];

        return Index::ingest(records, Arc::new(BuiltinToolkit)).unwrap();
    }

    #[test]
    fn identical_structure_ranks_first() {

        let index = index();
        let hits = search(&index, &SimilarityQuery::new("c1ccccc1")).unwrap();
        dbg!(&hits);

        assert_eq!(hits[0].id, "benzene");
        assert_approx_eq!(hits[0].score, 1.0);
        //same graph, later position
        assert_eq!(hits[1].id, "benzene-again");
        assert_approx_eq!(hits[1].score, 1.0);
        assert_eq!(hits[2].id, "toluene");
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(hits.iter().all(|h| h.id != "broken"));
    }

    #[test]
    fn limit_and_threshold() {

        let index = index();

        let mut query = SimilarityQuery::new("c1ccccc1");
        query.limit = 1;
        assert_eq!(search(&index, &query).unwrap().len(), 1);

        query.limit = 10;
        query.min_score = 1.0;
        let exact = search(&index, &query).unwrap();
        assert_eq!(exact.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), vec!["benzene", "benzene-again"]);
    }

    #[test]
    fn db_filter() {

        let index = index();
        let mut query = SimilarityQuery::new("c1ccccc1");
        query.db = Some("b");
        let hits = search(&index, &query).unwrap();
        assert_eq!(hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), vec!["benzene-again", "toluene"]);

        query.db = Some("nowhere");
        assert!(search(&index, &query).unwrap().is_empty());
    }

    #[test]
    fn bad_arguments() {

        let index = index();

        let mut query = SimilarityQuery::new("c1ccccc1");
        query.limit = 0;
        assert!(matches!(search(&index, &query), Err(Error::InvalidArgument(_))));

        let mut query = SimilarityQuery::new("c1ccccc1");
        query.min_score = 1.5;
        assert!(matches!(search(&index, &query), Err(Error::InvalidArgument(_))));
        query.min_score = f64::NAN;
        assert!(matches!(search(&index, &query), Err(Error::InvalidArgument(_))));

        assert!(matches!(search(&index, &SimilarityQuery::new("C1CC")), Err(Error::InvalidQuery { .. })));
    }

    #[test]
    fn every_fingerprint_type_scores_self_as_one() {

        let index = index();
        for fp_type in FingerprintType::ALL {
            let mut query = SimilarityQuery::new("Cc1ccccc1");
            query.fp_type = fp_type;
            query.limit = 1;
            let hits = search(&index, &query).unwrap();
            assert_eq!(hits[0].id, "toluene", "{}", fp_type);
            assert_approx_eq!(hits[0].score, 1.0);
        }
    }
}
