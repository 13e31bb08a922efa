//! Service configuration, read from and written to YAML.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::FingerprintType;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// tab-separated compound file
    pub compounds_file: Option<String>,
    pub host: String,
    pub port: u16,
    /// fingerprint types computed for every compound at startup
    pub warm_fingerprints: Vec<FingerprintType>,
    pub warm_structures: bool,
}

impl Default for ServiceConfig {

    fn default() -> Self {

        return Self {
            compounds_file: None,
            host: "127.0.0.1".to_string(),
            port: 8000,
            warm_fingerprints: FingerprintType::ALL.to_vec(),
            warm_structures: true,
        };
    }
}

impl ServiceConfig {

    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self> {

        let serialized = std::fs::read_to_string(filename)?;
        let deserialized: Self = serde_yaml::from_str(&serialized)?;

        return Ok(deserialized);
    }

    pub fn to_file<P: AsRef<Path>>(&self, filename: P) -> Result<()> {

        let serialized = serde_yaml::to_string(&self)?;
        let mut file = File::create(filename)?;
        file.write_all(serialized.as_bytes())?;

        return Ok(());
    }

    ///Types to precompute, empty unless structures are warmed too
    pub fn warm_types(&self) -> &[FingerprintType] {

        match self.warm_structures {
            true => &self.warm_fingerprints,
            false => &[],
        }
    }
}
