use sportmatch_core::models::{GenderPreference, ProfileUpdate};
use sportmatch_core::{Account, AccountId, GeoPoint};

use crate::cli::{ProfileCommands, ProfileUpdateArgs};
use crate::commands::common::{format_profile, Context};
use crate::error::CliError;

pub async fn run_profile(command: ProfileCommands, ctx: &Context) -> Result<(), CliError> {
    let me = ctx.current_account().await?;
    let profiles = ctx.profiles();

    match command {
        ProfileCommands::Create { name, birth_date } => {
            let account = profiles.create_profile(me, &name, birth_date).await?;
            println!("Created profile for {} ({})", account.name, account.id);
        }
        ProfileCommands::Show { id, json } => {
            let id = id.map(AccountId::new).transpose()?.unwrap_or(me);
            let account = profiles.get_account(&id).await?;
            print_account(&account, json)?;
        }
        ProfileCommands::Update(args) => {
            let account = profiles
                .update_profile(&me, profile_update_from_args(args))
                .await?;
            print_account(&account, false)?;
        }
        ProfileCommands::Delete { yes } => {
            if !yes {
                return Err(CliError::DeleteNotConfirmed);
            }
            profiles.delete_account(&me).await?;
            println!("Deleted account {me}");
        }
    }
    Ok(())
}

fn print_account(account: &Account, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(account)?);
    } else {
        for line in format_profile(account) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn profile_update_from_args(args: ProfileUpdateArgs) -> ProfileUpdate {
    ProfileUpdate {
        name: args.name,
        bio: args.bio,
        gender: args.gender,
        interests: args.interests,
        experience_level: args.experience_level,
        birth_date: args.birth_date,
        looking_for: args.looking_for.as_deref().map(GenderPreference::parse),
        max_distance_km: args.max_distance,
        location: args.lat.zip(args.lon).map(|(lat, lon)| GeoPoint::new(lat, lon)),
    }
}
