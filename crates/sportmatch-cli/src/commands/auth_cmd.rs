use sportmatch_core::auth::{SignUpOutcome, SignupRequest};

use crate::auth::SupabaseAuthService;
use crate::cli::AuthCommands;
use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, ctx: &Context) -> Result<(), CliError> {
    let service = SupabaseAuthService::from_settings(ctx.config.supabase.as_ref())?;

    match command {
        AuthCommands::Signup {
            email,
            password,
            name,
            birth_date,
        } => {
            let request = SignupRequest {
                email,
                password,
                name,
                birth_date,
            };
            request.validate(chrono::Utc::now().date_naive())?;

            let outcome = service.sign_up(&request.email, &request.password).await?;
            let account_id = outcome.user().account_id()?;
            let account = ctx.profiles().register(account_id, &request).await?;

            match outcome {
                SignUpOutcome::SignedIn(_) => {
                    println!("Welcome, {}! You are signed in.", account.name);
                }
                SignUpOutcome::ConfirmationRequired { .. } => {
                    println!(
                        "Profile created for {}. Confirm your email, then run `sportmatch auth login`.",
                        account.name
                    );
                }
            }
            Ok(())
        }
        AuthCommands::Login { email, password } => {
            let session = service.sign_in(&email, &password).await?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in as {email_label}");
            Ok(())
        }
        AuthCommands::Status => {
            if let Some(session) = service.restore_session().await? {
                let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                println!(
                    "Signed in as {} (account {}, expires_at={})",
                    email_label, session.user.id, session.expires_at
                );
            } else {
                println!("Not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout => {
            if service.stored_session()?.is_none() {
                println!("Not signed in.");
                return Ok(());
            }
            service.sign_out().await?;
            println!("Signed out");
            Ok(())
        }
    }
}
