//! One-shot migration of a legacy local feedback database onto the
//! canonical column set.
//!
//! Usage:
//!   migrate_feedback [DB_PATH]    (default: prompt_feedback.db)

use anyhow::{Context, Result};
use promptviz::feedback::SqliteFeedbackStore;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "prompt_feedback.db".to_string());

    if !std::path::Path::new(&db_path).exists() {
        anyhow::bail!("Database file not found: {}", db_path);
    }

    let store = SqliteFeedbackStore::open(&db_path)
        .with_context(|| format!("Failed to open {}", db_path))?;
    let migrated = store
        .migrate_legacy()
        .with_context(|| format!("Migration failed for {}", db_path))?;

    if migrated == 0 {
        info!(db = db_path, "Already canonical, nothing migrated");
    } else {
        info!(db = db_path, rows = migrated, "Migration complete");
    }
    Ok(())
}
