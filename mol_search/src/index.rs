//! In-memory compound index with lazily filled structure and fingerprint caches.

use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};

use crate::cache::{FingerprintCache, FingerprintKey, MemoCache, StructureCache, StructureEntry};
use crate::catalog::FingerprintType;
use crate::chem::{Fingerprint, Molecule, Toolkit};
use crate::compound::Compound;
use crate::error::{Error, Result};

/// Zero-based ingestion position. Cache keys and result tie-breaks use it.
pub type CompoundIndex = usize;

pub struct Index {
    compounds: Vec<Compound>,
    positions: HashMap<String, CompoundIndex>,
    by_db: HashMap<String, Vec<CompoundIndex>>,
    toolkit: Arc<dyn Toolkit>,
    structures: StructureCache,
    fingerprints: FingerprintCache,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WarmReport {
    pub structures: usize,
    pub failures: usize,
    pub fingerprints: usize,
}

impl Index {

    /// Builds the index from `records`, keeping their order.
    ///
    /// Fails on an empty id or an id seen before. Structures are not parsed here.
    pub fn ingest<I: IntoIterator<Item = Compound>>(records: I, toolkit: Arc<dyn Toolkit>) -> Result<Self> {

        let mut compounds: Vec<Compound> = Vec::new();
        let mut positions: HashMap<String, CompoundIndex> = HashMap::new();
        let mut by_db: HashMap<String, Vec<CompoundIndex>> = HashMap::new();

        for record in records {
            if record.id.trim().is_empty() {
                return Err(Error::InvalidRecord(format!("compound with empty id (smiles {:?})", record.smiles)));
            }

            let position = compounds.len();
            if positions.insert(record.id.clone(), position).is_some() {
                return Err(Error::DuplicateId(record.id));
            }

            if let Some(db) = &record.source_db {
                by_db.entry(db.clone()).or_default().push(position);
            }

            compounds.push(record);
        }

        info!("indexed {} compounds from {} sources", compounds.len(), by_db.len());

        return Ok(Self {
            compounds,
            positions,
            by_db,
            toolkit,
            structures: MemoCache::new(),
            fingerprints: MemoCache::new(),
        });
    }

    pub fn toolkit(&self) -> &dyn Toolkit {
        self.toolkit.as_ref()
    }

    pub fn len(&self) -> usize {
        self.compounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Compound> {
        self.position(id).map(|p| &self.compounds[p])
    }

    pub fn position(&self, id: &str) -> Option<CompoundIndex> {
        self.positions.get(id).copied()
    }

    pub fn compound_at(&self, position: CompoundIndex) -> Option<&Compound> {
        self.compounds.get(position)
    }

    ///Distinct source tags, sorted
    pub fn db_names(&self) -> Vec<&str> {

        let mut names: Vec<&str> = self.by_db.keys().map(|s| s.as_str()).collect();
        names.sort();
        return names;
    }

    /// Candidates in ingestion order, restricted to one source when `db` is given.
    ///
    /// An unknown source yields nothing.
    pub fn all_ids(&self, db: Option<&str>) -> CandidateIds<'_> {

        let positions = match db {
            None => Positions::All(0..self.compounds.len()),
            Some(db) => match self.by_db.get(db) {
                Some(list) => Positions::Listed(list.iter()),
                None => Positions::Listed([].iter()),
            },
        };

        return CandidateIds { index: self, positions };
    }

    pub fn structure_of(&self, id: &str) -> Result<Arc<Molecule>> {

        let position = self.position(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        return self.structure_at(position);
    }

    pub fn fingerprint_of(&self, id: &str, fp_type: FingerprintType, use_chirality: bool) -> Result<Arc<Fingerprint>> {

        let position = self.position(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        return self.fingerprint_at(position, fp_type, use_chirality);
    }

    pub(crate) fn structure_at(&self, position: CompoundIndex) -> Result<Arc<Molecule>> {

        let compound = self.compound_at(position).ok_or_else(|| Error::NotFound(format!("position {}", position)))?;

        let entry: StructureEntry = self.structures.get_or_insert_with(position, || {
            match self.toolkit.parse_structure(&compound.smiles) {
                Ok(mol) => Ok(Arc::new(mol)),
                Err(e) => {
                    //failures are cached, so this is logged once per compound
                    warn!("skipping {}: cannot parse {:?}: {}", compound.id, compound.smiles, e);
                    Err(e.to_string())
                },
            }
        });

        return entry.map_err(|reason| Error::StructureParse { id: compound.id.clone(), reason });
    }

    pub(crate) fn fingerprint_at(&self, position: CompoundIndex, fp_type: FingerprintType, use_chirality: bool) -> Result<Arc<Fingerprint>> {

        let key = FingerprintKey { position, fp_type, use_chirality };

        if let Some(fp) = self.fingerprints.get(&key) {
            return Ok(fp);
        }

        let mol = self.structure_at(position)?;
        let fp = self.fingerprints.get_or_insert_with(key, || {
            Arc::new(self.toolkit.fingerprint(&mol, fp_type, use_chirality))
        });

        return Ok(fp);
    }

    /// Parses every structure and computes the given fingerprint types (without chirality), so
    /// the first queries do not pay for it.
    pub fn warm(&self, fp_types: &[FingerprintType]) -> WarmReport {

        let mut report = WarmReport::default();

        for position in 0..self.compounds.len() {
            match self.structure_at(position) {
                Ok(_) => report.structures += 1,
                Err(_) => {
                    report.failures += 1;
                    continue;
                },
            }

            for fp_type in fp_types {
                if self.fingerprint_at(position, *fp_type, false).is_ok() {
                    report.fingerprints += 1;
                }
            }
        }

        info!("warmed {} structures ({} unparsable), {} fingerprints",
            report.structures, report.failures, report.fingerprints);

        return report;
    }

    #[cfg(test)]
    pub(crate) fn cached_fingerprints(&self) -> usize {
        self.fingerprints.len()
    }
}

#[derive(Debug, Clone)]
enum Positions<'a> {
    All(std::ops::Range<CompoundIndex>),
    Listed(std::slice::Iter<'a, CompoundIndex>),
}

/// Lazy, re-iterable sequence of `(position, compound)` in ingestion order.
#[derive(Clone)]
pub struct CandidateIds<'a> {
    index: &'a Index,
    positions: Positions<'a>,
}

impl<'a> Iterator for CandidateIds<'a> {
    type Item = (CompoundIndex, &'a Compound);

    fn next(&mut self) -> Option<Self::Item> {

        let position = match &mut self.positions {
            Positions::All(range) => range.next()?,
            Positions::Listed(iter) => *iter.next()?,
        };

        return Some((position, &self.index.compounds[position]));
    }

    fn size_hint(&self) -> (usize, Option<usize>) {

        match &self.positions {
            Positions::All(range) => range.size_hint(),
            Positions::Listed(iter) => iter.size_hint(),
        }
    }
}
