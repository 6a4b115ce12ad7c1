//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let repos = settings.repositories();
    let applied = repos.init_schema().await?;
    for name in &applied {
        println!("  {} Applied migration {}", style("✓").green(), name);
    }

    println!(
        "{} Initialized e-SPJ in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    Ok(())
}
