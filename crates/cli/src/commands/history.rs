use crate::error::Result;
use crate::history::History;
use clap::Args;
use dossier_config::Config;
use dossier_files::format_file_size;
use time::format_description::well_known::Rfc3339;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Show at most this many entries.
    #[arg(long, short, default_value_t = 10)]
    pub limit: usize,
    /// Forget every entry.
    #[arg(long)]
    pub clear: bool,
}

pub async fn run(config: &Config, args: HistoryArgs) -> Result<()> {
    let history = History::new(&config.history_file);
    if args.clear {
        history.clear().await?;
        println!("History cleared.");
        return Ok(());
    }
    let entries = history.recent(args.limit).await?;
    if entries.is_empty() {
        println!("No compressions yet.");
        return Ok(());
    }
    for entry in entries {
        let when = entry.created_at.format(&Rfc3339).unwrap_or_default();
        let size = entry.size.map(format_file_size).unwrap_or_else(|| "-".to_string());
        println!("{when}  {:<40} {size:>10}  {} files  {}", entry.filename, entry.files, entry.location);
    }
    Ok(())
}
