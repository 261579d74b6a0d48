//! Office Open XML package access for PPTX.
//!
//! The package is a zip archive of XML parts; this module only knows how to
//! open the archive and pull a part out as a string.

use std::io::{Cursor, Read};

use zip::ZipArchive;

pub(super) struct Package {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl Package {
    pub(super) fn open(bytes: &[u8]) -> Result<Self, String> {
        let archive = ZipArchive::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| format!("not an OOXML package: {e}"))?;
        Ok(Self { archive })
    }

    /// All part names in the package, in archive order.
    pub(super) fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Read part `name` as UTF-8 text.
    pub(super) fn read_part(&mut self, name: &str) -> Result<String, String> {
        let mut entry = self
            .archive
            .by_name(name)
            .map_err(|e| format!("missing part '{name}': {e}"))?;
        let mut xml = String::new();
        entry
            .read_to_string(&mut xml)
            .map_err(|e| format!("cannot read part '{name}': {e}"))?;
        Ok(xml)
    }
}
