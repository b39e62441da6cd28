//! Dashboard data export for downstream renderers.

use crate::charts::RenderError;
use crate::pipeline::DashboardData;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `data` as pretty-printed JSON. Undefined derived values are
/// serialized as `{"undefined": "<reason>"}` so consumers can tell them apart.
pub fn export_json(data: &DashboardData, path: &Path) -> Result<(), RenderError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}
