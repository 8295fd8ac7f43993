use crate::dropzone;
use crate::error::Result;
use clap::Args;
use dossier_archive::ArchiveFormat;
use dossier_config::Config;
use dossier_files::{calculate_total_size, format_file_size};
use dossier_session::CompressSettings;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Files or directories to compress.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Archive format: zip or 7z.
    #[arg(long, short, default_value = "zip", value_parser = parse_format)]
    pub format: ArchiveFormat,
    /// Protect the archive with a password (server-side only).
    #[arg(long, short)]
    pub password: Option<String>,
    /// Archive name, without extension.
    #[arg(long, short)]
    pub name: Option<String>,
    /// E-mail the finished archive to this address.
    #[arg(long, short)]
    pub email: Option<String>,
    /// Directory the archive is saved into.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub(crate) fn parse_format(value: &str) -> std::result::Result<ArchiveFormat, String> {
    value.parse().map_err(|err: dossier_archive::error::Error| (*err).to_string())
}

pub async fn run(mut config: Config, args: CompressArgs) -> Result<()> {
    if let Some(output) = args.output {
        config.download_dir = output;
    }
    let files = dropzone::collect_files(&args.paths).await?;
    dropzone::validate(&files, args.format, &config.limits)?;
    println!("Compressing {} files ({})", files.len(), format_file_size(calculate_total_size(&files)));

    let session = super::session(&config)?;
    let inputs = files.len();
    let email = args.email.clone();
    let settings = CompressSettings {
        format: args.format,
        password: args.password,
        filename: args.name,
        email: args.email,
    };
    let archive = super::drive(&config, &session, inputs, session.compress_files(files, settings)).await?;
    super::report(&archive);
    if let Some(recipient) = email {
        println!("The server will e-mail the archive to {recipient}");
    }
    Ok(())
}
