//! Export commands.

use std::path::{Path, PathBuf};

use console::style;

use super::helpers::{acting_user, open_repositories};
use crate::config::Settings;
use crate::services::filter::{parse_bidang, parse_month, parse_year};
use crate::services::{
    export_zip, load_listing, render_spreadsheet, ArchiveSelection, FileFetcher, FilterParams,
    SpjFilter, SPREADSHEET_FILENAME,
};

/// Write a ZIP of matching attachments.
pub async fn cmd_export_archive(
    settings: &Settings,
    user: Option<&str>,
    year: Option<&str>,
    month: Option<&str>,
    bidang: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;
    let profile = acting_user(&repos, user).await?;

    let selection = ArchiveSelection {
        year: year.map(parse_year).transpose()?.flatten(),
        month: month.map(parse_month).transpose()?.flatten(),
        bidang: match bidang.map(parse_bidang).transpose()? {
            Some(selected) => selected,
            None => profile.as_ref().and_then(|p| p.default_bidang()),
        },
    };

    let store = settings.file_store();
    let http = settings.http_fetcher()?;
    let fetcher: &dyn FileFetcher = match http {
        Some(ref http) => http,
        None => &store,
    };

    println!("{} Mempersiapkan file untuk diunduh...", style("→").cyan());
    let outcome = export_zip(&repos.spj, fetcher, &selection).await?;

    let path = output_path(output, &outcome.name);
    tokio::fs::write(&path, &outcome.bytes).await?;
    println!(
        "{} {} file arsip berhasil diunduh dalam format ZIP: {}",
        style("✓").green(),
        outcome.file_count,
        path.display()
    );
    Ok(())
}

/// Write the spreadsheet report of the filtered listing.
pub async fn cmd_export_spreadsheet(
    settings: &Settings,
    user: Option<&str>,
    params: FilterParams,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;
    let profile = acting_user(&repos, user).await?;
    let filter = SpjFilter::from_params(&params, profile.as_ref())?;

    let listing = load_listing(&repos.spj, &filter).await?;
    let bytes = render_spreadsheet(&listing.records)?;

    let path = output_path(output, SPREADSHEET_FILENAME);
    tokio::fs::write(&path, bytes).await?;
    println!(
        "{} Exported {} rows to {}",
        style("✓").green(),
        listing.records.len(),
        path.display()
    );
    Ok(())
}

/// An explicit output file, a file named `default_name` inside an output
/// directory, or `default_name` in the working directory.
fn output_path(output: Option<&Path>, default_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(default_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            output_path(Some(dir.path()), "a.zip"),
            dir.path().join("a.zip")
        );
        assert_eq!(
            output_path(Some(Path::new("/tmp/x.zip")), "a.zip"),
            PathBuf::from("/tmp/x.zip")
        );
        assert_eq!(output_path(None, "a.zip"), PathBuf::from("a.zip"));
    }
}
