//! Profile commands.

use console::style;

use super::helpers::open_repositories;
use crate::config::Settings;
use crate::models::{Bidang, UserProfile};

/// Fields to set on a profile. `None` leaves the stored value unchanged.
pub struct ProfileArgs {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nip: Option<String>,
    pub jabatan: Option<String>,
    /// `all` or empty clears the division.
    pub bidang: Option<String>,
}

/// Create or update a profile.
pub async fn cmd_profile_set(settings: &Settings, id: &str, args: ProfileArgs) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;
    let mut profile = repos.profiles.get(id).await?.unwrap_or_else(|| UserProfile {
        id: id.to_string(),
        ..Default::default()
    });

    if args.first_name.is_some() {
        profile.first_name = args.first_name;
    }
    if args.last_name.is_some() {
        profile.last_name = args.last_name;
    }
    if args.nip.is_some() {
        profile.nip = args.nip;
    }
    if args.jabatan.is_some() {
        profile.jabatan = args.jabatan;
    }
    if let Some(ref bidang) = args.bidang {
        profile.bidang = match bidang.trim() {
            "" => None,
            s if s.eq_ignore_ascii_case("all") => None,
            s => Some(
                Bidang::from_str(s).ok_or_else(|| anyhow::anyhow!("Unknown division: {}", s))?,
            ),
        };
    }

    repos.profiles.save(&profile).await?;
    println!("{} Saved profile {}", style("✓").green(), profile.id);
    print_profile(&profile);
    Ok(())
}

/// Show one profile, or all of them.
pub async fn cmd_profile_show(settings: &Settings, id: Option<&str>) -> anyhow::Result<()> {
    let repos = open_repositories(settings).await?;
    match id {
        Some(id) => match repos.profiles.get(id).await? {
            Some(profile) => print_profile(&profile),
            None => println!("{} Profile '{}' not found", style("✗").red(), id),
        },
        None => {
            let profiles = repos.profiles.get_all().await?;
            if profiles.is_empty() {
                println!("{} No profiles yet.", style("!").yellow());
            }
            for profile in &profiles {
                print_profile(profile);
            }
        }
    }
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    let role = if profile.is_admin() {
        style("treasurer").green().to_string()
    } else {
        "staff".to_string()
    };
    println!("\n{} ({})", style(&profile.id).bold(), role);
    println!("  Nama:    {}", profile.full_name());
    println!("  NIP:     {}", profile.nip.as_deref().unwrap_or("-"));
    println!("  Jabatan: {}", profile.jabatan.as_deref().unwrap_or("-"));
    println!(
        "  Bidang:  {}",
        profile.bidang.map_or("-", |b| b.as_str())
    );
}
