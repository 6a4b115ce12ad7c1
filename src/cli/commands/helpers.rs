//! Shared helper functions for CLI commands.

use anyhow::Context;

use crate::config::Settings;
use crate::models::UserProfile;
use crate::repository::Repositories;

/// Truncate a string for table display.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Open the database, failing with a hint when it has not been initialized.
pub async fn open_repositories(settings: &Settings) -> anyhow::Result<Repositories> {
    if !settings.database_exists() {
        anyhow::bail!(
            "No database at {}. Run 'espj init' first.",
            settings.database_path().display()
        );
    }
    let repos = settings.repositories();
    repos.init_schema().await?;
    Ok(repos)
}

/// Look up the acting user's profile.
pub async fn acting_user(
    repos: &Repositories,
    user: Option<&str>,
) -> anyhow::Result<Option<UserProfile>> {
    let Some(id) = user else {
        return Ok(None);
    };
    let profile = repos
        .profiles
        .get(id)
        .await?
        .with_context(|| format!("Unknown user '{}'. Create it with 'espj profile set'.", id))?;
    Ok(Some(profile))
}

/// Like [`acting_user`], but the user is mandatory.
pub async fn require_user(repos: &Repositories, user: Option<&str>) -> anyhow::Result<UserProfile> {
    acting_user(repos, user)
        .await?
        .context("This command needs --user (or ESPJ_USER)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Belanja", 10), "Belanja");
        assert_eq!(truncate("Belanja alat tulis", 8), "Belanja…");
    }
}
