use crate::cli::PhotoCommands;
use crate::commands::common::{read_image, Context};
use crate::error::CliError;

pub async fn run_photo(command: PhotoCommands, ctx: &Context) -> Result<(), CliError> {
    let me = ctx.current_account().await?;
    let profiles = ctx.profiles();

    match command {
        PhotoCommands::Add { path, index } => {
            let bytes = read_image(&path)?;
            let url = profiles.upload_profile_photo(&me, index, &bytes).await?;
            println!("{url}");
        }
        PhotoCommands::Remove { index } => {
            let account = profiles.delete_profile_photo(&me, index).await?;
            println!("Removed photo {index}; {} left", account.photos.len());
        }
    }
    Ok(())
}
