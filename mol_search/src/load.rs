//! Reads compound records from tab-separated SPARQL results.
//!
//! The header names the columns `?chem`, `?smiles` and optionally `?db` (the `?` may be left
//! out). IRIs may be written `<...>` and SMILES `"..."`; both are unwrapped. Without a `?db`
//! column every compound is tagged [`UNKNOWN_DB`].

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use log::{info, warn};

use crate::compound::Compound;
use crate::error::{Error, Result};

/// Source tag for files that carry no `?db` column.
pub const UNKNOWN_DB: &str = "unknown";

struct Columns {
    chem: usize,
    smiles: usize,
    db: Option<usize>,
}

impl Columns {

    fn from_header(header: &csv::StringRecord) -> Result<Self> {

        let find = |name: &str| header.iter().position(|h| h.trim().trim_start_matches('?') == name);

        let chem = find("chem").ok_or_else(|| Error::InvalidRecord("header has no ?chem column".to_string()))?;
        let smiles = find("smiles").ok_or_else(|| Error::InvalidRecord("header has no ?smiles column".to_string()))?;

        return Ok(Self { chem, smiles, db: find("db") });
    }
}

fn strip_iri(s: &str) -> &str {
    s.trim().trim_start_matches('<').trim_end_matches('>')
}

///`"CCO"` and `"CCO"^^<...>` both give `CCO`
fn strip_literal(s: &str) -> &str {

    let s = s.trim();
    match s.strip_prefix('"') {
        Some(rest) => match rest.rfind('"') {
            Some(end) => &rest[..end],
            None => rest,
        },
        None => s,
    }
}

/// Parses records from `reader` in file order.
///
/// Rows without a `?chem` value are skipped. When an id repeats, the first row wins and the rest
/// are dropped with a warning.
pub fn read_compounds<R: Read>(reader: R) -> Result<Vec<Compound>> {

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let columns = Columns::from_header(rdr.headers()?)?;

    let mut compounds = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut skipped = 0;

    for row in rdr.records() {
        let row = row?;

        let id = strip_iri(row.get(columns.chem).unwrap_or(""));
        if id.is_empty() {
            skipped += 1;
            continue;
        }

        if !seen.insert(id.to_string()) {
            warn!("dropping repeated compound {} on line {}", id, row.position().map_or(0, |p| p.line()));
            skipped += 1;
            continue;
        }

        let smiles = strip_literal(row.get(columns.smiles).unwrap_or(""));
        let db = match columns.db {
            Some(c) => row.get(c).map(strip_iri).filter(|db| !db.is_empty()),
            None => Some(UNKNOWN_DB),
        };

        compounds.push(Compound::new(id, smiles, db));
    }

    info!("read {} compounds ({} rows skipped)", compounds.len(), skipped);

    return Ok(compounds);
}

pub fn load_compounds<P: AsRef<Path>>(path: P) -> Result<Vec<Compound>> {

    info!("reading compounds from {}", path.as_ref().display());
    let file = std::fs::File::open(path)?;
    return read_compounds(std::io::BufReader::new(file));
}

#[cfg(test)]
mod test {

    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "?db\t?chem\t?smiles\n\
        <http://example.org/chembl>\t<http://example.org/c1>\t\"c1ccccc1\"\n\
        <http://example.org/chembl>\t<http://example.org/c2>\t\"CCO\"^^<http://www.w3.org/2001/XMLSchema#string>\n\
        <http://example.org/pubchem>\t\t\"CC\"\n\
        <http://example.org/pubchem>\t<http://example.org/c3>\tCC(=O)O\n\
        <http://example.org/pubchem>\t<http://example.org/c1>\t\"C\"\n";

    #[test]
    fn reads_sparql_tsv() {

        let compounds = read_compounds(SAMPLE.as_bytes()).unwrap();
        assert_eq!(compounds.len(), 3);

        assert_eq!(compounds[0], Compound::new("http://example.org/c1", "c1ccccc1", Some("http://example.org/chembl")));
        assert_eq!(compounds[1].smiles, "CCO");
        assert_eq!(compounds[2].smiles, "CC(=O)O");
        assert_eq!(compounds[2].source_db.as_deref(), Some("http://example.org/pubchem"));
    }

    #[test]
    fn headers_without_question_marks_and_without_db() {

        let compounds = read_compounds("chem\tsmiles\nurn:a\tC\nurn:b\tCC\n".as_bytes()).unwrap();
        assert_eq!(compounds.len(), 2);
        assert!(compounds.iter().all(|c| c.source_db.as_deref() == Some(UNKNOWN_DB)));

        //an empty cell in a present column is no source at all
        let compounds = read_compounds("?db\t?chem\t?smiles\n\t<urn:a>\tC\n".as_bytes()).unwrap();
        assert_eq!(compounds[0].source_db, None);
    }

    #[test]
    fn missing_columns_are_rejected() {

        assert!(matches!(read_compounds("?db\t?smiles\nx\tC\n".as_bytes()), Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn loads_from_file() {

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let compounds = load_compounds(file.path()).unwrap();
        assert_eq!(compounds.len(), 3);
        assert!(matches!(load_compounds("/definitely/not/here.tsv"), Err(Error::Io(_))));
    }
}
