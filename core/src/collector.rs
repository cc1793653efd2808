//! Patch metadata collectors.
//!
//! The catalog is assembled from a fixed list of collector implementations
//! injected at construction time; there is no runtime discovery. The
//! out-of-scope configuration layer deserializes catalog files into
//! [`PatchRecord`] values and hands them over through this seam.

use patchup_protocol::Patch;
use patchup_protocol::PatchRecord;

use crate::error::Result;

/// Source of validated patch metadata.
pub trait Collector {
    fn collect(&self) -> Result<Vec<Patch>>;
}

/// Collector over an already-gathered set of records.
#[derive(Debug, Clone, Default)]
pub struct StaticCollector {
    patches: Vec<Patch>,
}

impl StaticCollector {
    pub fn new(patches: Vec<Patch>) -> Self {
        Self { patches }
    }

    /// Validate raw records into patches, failing on the first bad record.
    pub fn from_records(records: Vec<PatchRecord>) -> Result<Self> {
        let patches = records
            .into_iter()
            .map(|record| Patch::from_record(record).map_err(Into::into))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patches })
    }
}

impl Collector for StaticCollector {
    fn collect(&self) -> Result<Vec<Patch>> {
        Ok(self.patches.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use patchup_protocol::PatchKind;

    use crate::error::PatchError;

    fn record(id: &str, locator: &str) -> PatchRecord {
        PatchRecord {
            id: id.to_string(),
            title: String::new(),
            kind: PatchKind::Optional,
            origin: String::new(),
            package_constraint: String::new(),
            categories: Default::default(),
            affected_components: Default::default(),
            locator: locator.to_string(),
            require: Vec::new(),
            replaced_with: None,
            deprecated: false,
        }
    }

    #[test]
    fn from_records_validates_each_record() {
        let collector =
            StaticCollector::from_records(vec![record("mc-1", "MC-1.patch")]).unwrap();
        let patches = collector.collect().unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].id.as_str(), "MC-1");
    }

    #[test]
    fn from_records_surfaces_definition_errors() {
        let result = StaticCollector::from_records(vec![record("mc-1", "  ")]);
        assert_matches!(result, Err(PatchError::Definition(_)));
    }
}
