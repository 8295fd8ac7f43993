use crate::error::Result;
use clap::Args;
use dossier_config::Config;
use dossier_files::RemoteRef;

#[derive(Args, Debug)]
pub struct ExpedienteArgs {
    /// Case file identifier.
    pub id: String,
    /// Document URLs, absolute or relative to the server.
    #[arg(required = true)]
    pub urls: Vec<String>,
    /// Archive name, defaults to `expediente_<id>`.
    #[arg(long, short)]
    pub name: Option<String>,
}

pub async fn run(config: Config, args: ExpedienteArgs) -> Result<()> {
    let session = super::session(&config)?;
    let urls: Vec<RemoteRef> = args.urls.into_iter().map(RemoteRef::from).collect();
    println!("Requesting archive of case file {} ({} documents)", args.id, urls.len());
    let inputs = urls.len();
    let archive =
        super::drive(&config, &session, inputs, session.compress_expediente(&args.id, urls, args.name)).await?;
    super::report(&archive);
    Ok(())
}
