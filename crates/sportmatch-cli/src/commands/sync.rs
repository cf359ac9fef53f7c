use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_sync(ctx: &Context) -> Result<(), CliError> {
    if !ctx.db.is_sync_enabled().await {
        return Err(CliError::SyncNotConfigured);
    }

    ctx.db.sync().await?;
    println!("Sync completed");
    Ok(())
}
