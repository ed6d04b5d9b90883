use crate::error::FecError;
use crate::gf_tables::Backend;
use serde::Deserialize;
use std::path::Path;

/// Coding configuration parsed from a TOML `[fec]` table.
///
/// ```toml
/// [fec]
/// k = 16
/// redundancy = 4
/// backend = "table"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FecConfig {
    /// Number of source shards per block.
    pub k: usize,
    /// Number of repair packets per block.
    pub redundancy: usize,
    /// Multiplication kernel; defaults to the table-driven path.
    pub backend: Backend,
}

impl Default for FecConfig {
    fn default() -> Self {
        Self {
            k: 16,
            redundancy: 4,
            backend: Backend::Table,
        }
    }
}

#[derive(Deserialize)]
struct ConfigRoot {
    #[serde(default)]
    fec: FecConfig,
}

impl FecConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, FecError> {
        let root: ConfigRoot =
            toml::from_str(s).map_err(|e| FecError::Config(e.to_string()))?;
        root.fec.validate()?;
        Ok(root.fec)
    }

    /// Parse configuration from a file path.
    pub fn from_file(path: &Path) -> Result<Self, FecError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| FecError::Config(e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn n(&self) -> usize {
        self.k + self.redundancy
    }

    pub fn validate(&self) -> Result<(), FecError> {
        if self.k == 0 {
            return Err(FecError::Config("k must be at least 1".into()));
        }
        match self.k.checked_add(self.redundancy) {
            Some(n) if n <= 255 => Ok(()),
            _ => Err(FecError::Config(format!(
                "k = {} plus redundancy = {} exceeds the 255 rows addressable in GF(2^8)",
                self.k, self.redundancy
            ))),
        }
    }
}
