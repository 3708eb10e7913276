use crate::utils::Result;
use rust_htslib::bam::{self, record::Aux};
use std::path::Path;

pub fn open_bam_reader(bam_path: &Path) -> Result<bam::Reader> {
    bam::Reader::from_path(bam_path)
        .map_err(|e| format!("Failed to create bam reader for {}: {}", bam_path.display(), e))
}

/// Edit distance to the reference from the NM tag, whatever integer width the aligner used.
pub fn get_nm_tag(rec: &bam::Record) -> Option<u32> {
    match rec.aux(b"NM") {
        Ok(Aux::U8(value)) => Some(u32::from(value)),
        Ok(Aux::U16(value)) => Some(u32::from(value)),
        Ok(Aux::U32(value)) => Some(value),
        Ok(Aux::I8(value)) => u32::try_from(value).ok(),
        Ok(Aux::I16(value)) => u32::try_from(value).ok(),
        Ok(Aux::I32(value)) => u32::try_from(value).ok(),
        _ => None,
    }
}

/// Reference databases name sequences `<genome>|<scaffold>|...`; the scaffold is the second field.
pub fn scaffold_id(reference_name: &str) -> &str {
    reference_name.split('|').nth(1).unwrap_or(reference_name)
}
