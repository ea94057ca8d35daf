use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use crate::map::MapPayload;
use crate::session::DashboardView;

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes each aggregate table as CSV plus the map payload as JSON into
/// `out_dir`, creating it if needed. Returns the written paths.
pub fn export_view(view: &DashboardView, out_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut written = Vec::new();
    let mut target = |name: &str| {
        let path = out_dir.join(name);
        written.push(path.clone());
        path
    };

    write_csv(&target("kpis.csv"), std::slice::from_ref(&view.kpis))?;
    write_csv(&target("time_series.csv"), &view.time_series)?;
    write_csv(&target("departments.csv"), &view.departments)?;
    write_csv(&target("statuses.csv"), &view.statuses)?;
    write_csv(&target("types.csv"), &view.types)?;
    write_csv(&target("communities.csv"), &view.choropleth)?;

    let map_path = target("map.json");
    let file = std::fs::File::create(&map_path)
        .with_context(|| format!("failed to create {}", map_path.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer(&mut writer, &MapPayload::build(&view.filtered))?;
    writer.flush()?;

    info!(dir = %out_dir.display(), files = written.len(), "exported dashboard view");
    Ok(written)
}
