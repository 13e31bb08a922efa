//! In-memory chemical search for declarative query services.
//!
//! Compounds are loaded once into an [`index::Index`], which parses structures and computes
//! fingerprints lazily and caches them. Two engines run on top of it: similarity ranking by
//! Tanimoto coefficient over one of seven fingerprint types, and substructure filtering with
//! match counting. The [`dispatch`] layer exposes both, plus the fingerprint catalog, as typed
//! functions whose results come back as rows of bindings.
//!
//! Structure handling goes through the [`chem::Toolkit`] trait; [`chem::BuiltinToolkit`] provides
//! SMILES parsing, ring and aromaticity perception, VF2 substructure matching and the fingerprint
//! generators.
pub mod cache;
pub mod catalog;
pub mod chem;
pub mod compound;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod load;
pub mod search;
