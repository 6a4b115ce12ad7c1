//! Record commands: list, add, delete.

use std::path::Path;

use chrono::NaiveDate;
use console::style;

use super::helpers::{acting_user, open_repositories, require_user, truncate};
use crate::config::Settings;
use crate::models::SpjInput;
use crate::services::{Attachment, FilterParams, ListingState, RecordError, RecordService, SpjFilter};
use crate::utils::{format_date_id, format_rupiah};

/// Print the filtered listing and its summary.
pub async fn cmd_list(
    settings: &Settings,
    user: Option<&str>,
    params: FilterParams,
) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;
    let profile = acting_user(&repos, user).await?;
    let filter = SpjFilter::from_params(&params, profile.as_ref())?;

    let mut state = ListingState::new();
    let listing = state.refresh(&repos.spj, &filter).await?;

    if listing.records.is_empty() {
        println!("{} No SPJ match the selected filters.", style("!").yellow());
    } else {
        println!("\n{}", style("Arsip SPJ").bold());
        println!("{}", "-".repeat(100));
        println!(
            "{:<4} {:<18} {:<4} {:<16} {:<11} {:>15}  {:<24} File",
            "No", "No. Pembukuan", "Jns", "Bidang", "Tanggal", "Jumlah", "Uraian"
        );
        println!("{}", "-".repeat(100));

        for (i, spj) in listing.records.iter().enumerate() {
            println!(
                "{:<4} {:<18} {:<4} {:<16} {:<11} {:>15}  {:<24} {}",
                i + 1,
                truncate(&spj.nomor_pembukuan, 18),
                spj.jenis_spj.as_str(),
                spj.bidang.map_or("-", |b| b.as_str()),
                format_date_id(spj.tanggal),
                format_rupiah(spj.jumlah),
                truncate(&spj.uraian, 24),
                if spj.has_file() { "✓" } else { "" }
            );
        }
    }

    let summary = &listing.summary;
    println!(
        "\n{} GU: {}  LS: {}",
        style("Total").bold(),
        summary.total_gu,
        summary.total_ls
    );
    for (bidang, count) in &summary.count_by_bidang {
        println!("  {:<16} {}", bidang.as_str(), count);
    }
    Ok(())
}

/// Fields for a new record, as given on the command line.
pub struct AddArgs {
    pub nomor: String,
    pub kode_rekening: String,
    pub jenis: String,
    pub bidang: String,
    pub tanggal: NaiveDate,
    pub uraian: String,
    pub jumlah: i64,
    pub file: Option<std::path::PathBuf>,
}

/// Create a record, optionally with an attachment read from disk.
pub async fn cmd_add(settings: &Settings, user: Option<&str>, args: AddArgs) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;
    let actor = require_user(&repos, user).await?;
    let service = RecordService::new(
        repos.spj.clone(),
        settings.file_store(),
        settings.max_upload_bytes,
    );

    let attachment = match args.file {
        Some(ref path) => Some(read_attachment(path).await?),
        None => None,
    };

    let input = SpjInput {
        nomor_pembukuan: args.nomor,
        kode_rekening: args.kode_rekening,
        jenis_spj: Some(args.jenis),
        bidang: Some(args.bidang),
        tanggal: Some(args.tanggal.to_string()),
        uraian: args.uraian,
        jumlah: args.jumlah,
    };

    match service.save(&actor, &input, attachment, None).await {
        Ok(spj) => {
            println!("{} Data berhasil disimpan! ({})", style("✓").green(), spj.id);
            Ok(())
        }
        Err(RecordError::Validation(errors)) => {
            for e in &errors.errors {
                eprintln!("  {} {}: {}", style("✗").red(), e.field, e.message);
            }
            Err(errors.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn read_attachment(path: &Path) -> anyhow::Result<Attachment> {
    let content = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string();
    Ok(Attachment::Upload { name, content })
}

/// Delete a record and its attachment.
pub async fn cmd_delete(settings: &Settings, user: Option<&str>, id: &str) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;
    let actor = require_user(&repos, user).await?;
    let service = RecordService::new(
        repos.spj.clone(),
        settings.file_store(),
        settings.max_upload_bytes,
    );

    let deleted = service.delete(&actor, id).await?;
    println!(
        "{} Data berhasil dihapus! ({})",
        style("✓").green(),
        deleted.nomor_pembukuan
    );
    Ok(())
}
