use mol_search::catalog::{Catalog, FingerprintType};
use mol_search::chem::{BuiltinToolkit, CountMode, Fingerprint, Molecule, Toolkit};
use mol_search::compound::Compound;
use mol_search::dispatch::{Dispatcher, FunctionRegistry, Row, Value};
use mol_search::error::{Error, Result};
use mol_search::index::Index;
use mol_search::search::{similarity, substructure, SimilarityQuery, SubstructureQuery};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_approx_eq::assert_approx_eq;
use proptest::prelude::*;

const CORPUS: [(&str, &str, &str); 12] = [
    ("http://example.org/aspirin", "CC(=O)Oc1ccccc1C(=O)O", "chembl"),
    ("http://example.org/paracetamol", "CC(=O)Nc1ccc(O)cc1", "chembl"),
    ("http://example.org/caffeine", "Cn1cnc2c1c(=O)n(C)c(=O)n2C", "pubchem"),
    ("http://example.org/ethanol", "CCO", "pubchem"),
    ("http://example.org/benzene", "c1ccccc1", "chembl"),
    ("http://example.org/cyclohexane", "C1CCCCC1", "pubchem"),
    ("http://example.org/naphthalene", "c1ccc2ccccc2c1", "chembl"),
    ("http://example.org/ibuprofen", "CC(C)Cc1ccc(cc1)C(C)C(=O)O", "drugbank"),
    ("http://example.org/alanine", "N[C@@H](C)C(=O)O", "drugbank"),
    ("http://example.org/d-alanine", "N[C@H](C)C(=O)O", "drugbank"),
    ("http://example.org/pyridine", "c1ccncc1", "pubchem"),
    ("http://example.org/glycol", "OCCO", "pubchem"),
];

fn corpus() -> Vec<Compound> {
    CORPUS.iter().map(|(id, smiles, db)| Compound::new(id, smiles, Some(db))).collect()
}

fn dispatcher_over(records: Vec<Compound>) -> Dispatcher {

    let index = Index::ingest(records, Arc::new(BuiltinToolkit)).unwrap();
    return Dispatcher::new(Arc::new(index), Arc::new(Catalog::standard()), Arc::new(FunctionRegistry::standard()));
}

fn bind(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
    pairs.iter().map(|(p, v)| (p.to_string(), v.clone())).collect()
}

fn s(text: &str) -> Value {
    Value::Str(text.to_string())
}

#[test]
fn single_benzene_scores_one() {

    let d = dispatcher_over(vec![Compound::new("c1", "c1ccccc1", None)]);
    let rows: Vec<Row> = d.invoke("SimilaritySearch", &bind(&[
        ("smiles", s("c1ccccc1")),
        ("fpType", s("morgan_ecfp")),
        ("limit", Value::Int(1)),
    ])).unwrap().collect();

    assert_eq!(rows, vec![vec![Value::Iri("c1".to_string()), Value::Float(1.0)]]);
}

#[test]
fn substructure_finds_only_aromatic_compound() {

    let d = dispatcher_over(vec![
        Compound::new("with-ring", "Oc1ccccc1", None),
        Compound::new("without-ring", "C1CCCCC1O", None),
    ]);
    let rows: Vec<Row> = d.invoke("SubstructureSearch", &bind(&[("smart", s("c1ccccc1"))])).unwrap().collect();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], Value::Iri("with-ring".to_string()));
    assert!(matches!(rows[0][1], Value::Int(n) if n >= 1));
}

#[test]
fn list_fingerprints_is_data_independent() {

    let empty = dispatcher_over(vec![]);
    let full = dispatcher_over(corpus());

    let a: Vec<Row> = empty.invoke("ListFingerprints", &[]).unwrap().collect();
    let b: Vec<Row> = full.invoke("ListFingerprints", &[]).unwrap().collect();
    assert_eq!(a.len(), 7);
    assert_eq!(a, b);
}

#[test]
fn non_positive_limit_is_rejected() {

    let d = dispatcher_over(corpus());
    for limit in [0, -1] {
        let sim = d.invoke("SimilaritySearch", &bind(&[("smiles", s("CCO")), ("limit", Value::Int(limit))]));
        assert!(matches!(sim, Err(Error::InvalidArgument(_))));
        let sub = d.invoke("SubstructureSearch", &bind(&[("smart", s("CO")), ("limit", Value::Int(limit))]));
        assert!(matches!(sub, Err(Error::InvalidArgument(_))));
    }
}

#[test]
fn min_score_one_keeps_exact_matches() {

    let d = dispatcher_over(corpus());
    let rows: Vec<Row> = d.invoke("SimilaritySearch", &bind(&[
        ("smiles", s("CC(=O)Oc1ccccc1C(=O)O")),
        ("minScore", Value::Float(1.0)),
    ])).unwrap().collect();

    assert_eq!(rows, vec![vec![Value::Iri("http://example.org/aspirin".to_string()), Value::Float(1.0)]]);

    let none: Vec<Row> = d.invoke("SimilaritySearch", &bind(&[
        ("smiles", s("CCCCCCCCCCCC")),
        ("minScore", Value::Float(1.0)),
    ])).unwrap().collect();
    assert!(none.is_empty());
}

#[test]
fn db_filter_restricts_source() {

    let index = Index::ingest(corpus(), Arc::new(BuiltinToolkit)).unwrap();

    let mut query = SimilarityQuery::new("c1ccccc1");
    query.db = Some("pubchem");
    query.limit = 100;
    let hits = similarity::search(&index, &query).unwrap();
    assert_eq!(hits.len(), 5);
    assert!(hits.iter().all(|h| index.get(&h.id).unwrap().source_db.as_deref() == Some("pubchem")));

    query.db = None;
    assert_eq!(similarity::search(&index, &query).unwrap().len(), CORPUS.len());
}

#[test]
fn chirality_separates_enantiomers() {

    let index = Index::ingest(corpus(), Arc::new(BuiltinToolkit)).unwrap();

    let mut query = SimilarityQuery::new("N[C@@H](C)C(=O)O");
    query.min_score = 1.0;
    assert_eq!(similarity::search(&index, &query).unwrap().len(), 2);

    query.use_chirality = true;
    let hits = similarity::search(&index, &query).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "http://example.org/alanine");

    let mut sub = SubstructureQuery::new("[C@@H](C)C(=O)O");
    sub.use_chirality = true;
    let hits = substructure::search(&index, &sub).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "http://example.org/alanine");
}

#[test]
fn stereocentre_spelling_does_not_matter() {

    let d = dispatcher_over(vec![
        Compound::new("l-alanine", "C[C@H](N)C(=O)O", None),
        Compound::new("d-alanine", "C[C@@H](N)C(=O)O", None),
    ]);

    let rows: Vec<Row> = d.invoke("SimilaritySearch", &bind(&[
        ("smiles", s("N[C@@H](C)C(=O)O")),
        ("useChirality", Value::Bool(true)),
        ("minScore", Value::Float(1.0)),
    ])).unwrap().collect();
    assert_eq!(rows, vec![vec![Value::Iri("l-alanine".to_string()), Value::Float(1.0)]]);

    let rows: Vec<Row> = d.invoke("SubstructureSearch", &bind(&[
        ("smart", s("N[C@@H](C)C(=O)O")),
        ("useChirality", Value::Bool(true)),
    ])).unwrap().collect();
    assert_eq!(rows, vec![vec![Value::Iri("l-alanine".to_string()), Value::Int(1)]]);

    //without chirality both forms are found
    let rows: Vec<Row> = d.invoke("SubstructureSearch", &bind(&[("smart", s("N[C@@H](C)C(=O)O"))])).unwrap().collect();
    assert_eq!(rows.len(), 2);
}

#[test]
fn stereocentre_spelling_in_engines() {

    let index = Index::ingest(vec![
        Compound::new("written-from-carboxyl", "OC(=O)[C@@H](N)C", None),
        Compound::new("mirror", "OC(=O)[C@H](N)C", None),
    ], Arc::new(BuiltinToolkit)).unwrap();

    let mut query = SimilarityQuery::new("C[C@H](N)C(=O)O");
    query.use_chirality = true;
    let hits = similarity::search(&index, &query).unwrap();
    assert_eq!(hits[0].id, "written-from-carboxyl");
    assert_approx_eq!(hits[0].score, 1.0);
    assert!(hits[1].score < 1.0);

    let mut sub = SubstructureQuery::new("C[C@H](N)C(=O)O");
    sub.use_chirality = true;
    let hits = substructure::search(&index, &sub).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "written-from-carboxyl");
}

#[test]
fn occurrence_counts_rank_results() {

    let index = Index::ingest(corpus(), Arc::new(BuiltinToolkit)).unwrap();
    let hits = substructure::search(&index, &SubstructureQuery::new("C(=O)O")).unwrap();
    dbg!(&hits);

    assert!(hits.windows(2).all(|w| w[0].match_count >= w[1].match_count));
    //the ester and the acid of aspirin
    assert_eq!(hits[0].id, "http://example.org/aspirin");
    assert_eq!(hits[0].match_count, 2);

    let mut boolean = SubstructureQuery::new("C(=O)O");
    boolean.mode = CountMode::Boolean;
    let flat = substructure::search(&index, &boolean).unwrap();
    assert_eq!(flat.len(), hits.len());
    assert!(flat.windows(2).all(|w| w[0].position < w[1].position));
}

/// Wraps the builtin toolkit and counts calls.
struct CountingToolkit {
    inner: BuiltinToolkit,
    parses: AtomicUsize,
    fingerprints: AtomicUsize,
}

impl Toolkit for CountingToolkit {

    fn parse_structure(&self, smiles: &str) -> Result<Molecule> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        self.inner.parse_structure(smiles)
    }

    fn parse_pattern(&self, pattern: &str) -> Result<Molecule> {
        self.inner.parse_pattern(pattern)
    }

    fn fingerprint(&self, mol: &Molecule, fp_type: FingerprintType, use_chirality: bool) -> Fingerprint {
        self.fingerprints.fetch_add(1, Ordering::SeqCst);
        self.inner.fingerprint(mol, fp_type, use_chirality)
    }

    fn similarity(&self, a: &Fingerprint, b: &Fingerprint) -> f64 {
        self.inner.similarity(a, b)
    }

    fn match_count(&self, target: &Molecule, pattern: &Molecule, use_chirality: bool, mode: CountMode) -> usize {
        self.inner.match_count(target, pattern, use_chirality, mode)
    }

    fn screen(&self, pattern: &Molecule) -> Option<Fingerprint> {
        self.inner.screen(pattern)
    }
}

#[test]
fn caches_compute_each_entry_once() {

    let toolkit = Arc::new(CountingToolkit {
        inner: BuiltinToolkit,
        parses: AtomicUsize::new(0),
        fingerprints: AtomicUsize::new(0),
    });
    let index = Index::ingest(corpus(), toolkit.clone()).unwrap();

    let first = similarity::search(&index, &SimilarityQuery::new("c1ccccc1")).unwrap();
    //every compound once, plus the query
    let parses = toolkit.parses.load(Ordering::SeqCst);
    let fingerprints = toolkit.fingerprints.load(Ordering::SeqCst);
    assert_eq!(parses, CORPUS.len() + 1);
    assert_eq!(fingerprints, CORPUS.len() + 1);

    let second = similarity::search(&index, &SimilarityQuery::new("c1ccccc1")).unwrap();
    assert_eq!(first, second);
    //only the query is recomputed
    assert_eq!(toolkit.parses.load(Ordering::SeqCst), parses + 1);
    assert_eq!(toolkit.fingerprints.load(Ordering::SeqCst), fingerprints + 1);

    let a = index.fingerprint_of("http://example.org/caffeine", FingerprintType::MorganEcfp, false).unwrap();
    let b = index.fingerprint_of("http://example.org/caffeine", FingerprintType::MorganEcfp, false).unwrap();
    assert_eq!(*a, *b);

    //structures are shared across fingerprint types
    let before = toolkit.parses.load(Ordering::SeqCst);
    index.warm(&[FingerprintType::Maccs]);
    assert_eq!(toolkit.parses.load(Ordering::SeqCst), before);
}

#[test]
fn unparsable_compounds_are_skipped() {

    let mut records = corpus();
    records.push(Compound::new("http://example.org/broken", "C1CC(", Some("chembl")));
    let index = Index::ingest(records, Arc::new(BuiltinToolkit)).unwrap();

    let mut query = SimilarityQuery::new("CCO");
    query.limit = 100;
    let hits = similarity::search(&index, &query).unwrap();
    assert_eq!(hits.len(), CORPUS.len());

    let sub = substructure::search(&index, &SubstructureQuery::new("C")).unwrap();
    assert!(sub.iter().all(|h| h.id != "http://example.org/broken"));
}

#[test]
fn identical_structure_scores_one_for_every_type() {

    let index = Index::ingest(corpus(), Arc::new(BuiltinToolkit)).unwrap();

    for (id, smiles, _) in CORPUS {
        for fp_type in FingerprintType::ALL {
            let mut query = SimilarityQuery::new(smiles);
            query.fp_type = fp_type;
            query.limit = 100;
            let hits = similarity::search(&index, &query).unwrap();
            let own = hits.iter().find(|h| h.id == id).unwrap();
            assert_approx_eq!(own.score, 1.0);
        }
    }
}

const QUERIES: [&str; 6] = ["c1ccccc1", "CCO", "CC(=O)O", "c1ccncc1", "C1CCCCC1", "N[C@@H](C)C(=O)O"];
const PATTERNS: [&str; 6] = ["c1ccccc1", "C(=O)O", "O", "CN", "C1CCCCC1", "*O"];

proptest! {

    #[test]
    fn similarity_results_are_bounded_and_ordered(
        q in 0..QUERIES.len(),
        t in 0..FingerprintType::ALL.len(),
        limit in 1i64..20,
        min_score in 0.0f64..=1.0,
    ) {
        let index = Index::ingest(corpus(), Arc::new(BuiltinToolkit)).unwrap();

        let mut query = SimilarityQuery::new(QUERIES[q]);
        query.fp_type = FingerprintType::ALL[t];
        query.limit = limit;
        query.min_score = min_score;

        let hits = similarity::search(&index, &query).unwrap();
        prop_assert!(hits.len() <= limit as usize);
        prop_assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score) && h.score >= min_score));
        prop_assert!(hits.windows(2).all(|w| w[0].score > w[1].score
            || (w[0].score == w[1].score && w[0].position < w[1].position)));

        let again = similarity::search(&index, &query).unwrap();
        prop_assert_eq!(hits, again);
    }

    #[test]
    fn substructure_results_are_bounded_and_ordered(
        p in 0..PATTERNS.len(),
        limit in 1i64..20,
        min_count in 1i64..4,
    ) {
        let index = Index::ingest(corpus(), Arc::new(BuiltinToolkit)).unwrap();

        let mut query = SubstructureQuery::new(PATTERNS[p]);
        query.limit = limit;
        query.min_match_count = min_count;

        let hits = substructure::search(&index, &query).unwrap();
        prop_assert!(hits.len() <= limit as usize);
        prop_assert!(hits.iter().all(|h| h.match_count >= min_count as usize));
        prop_assert!(hits.windows(2).all(|w| w[0].match_count > w[1].match_count
            || (w[0].match_count == w[1].match_count && w[0].position < w[1].position)));

        let again = substructure::search(&index, &query).unwrap();
        prop_assert_eq!(hits, again);
    }
}
