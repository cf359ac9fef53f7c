use crate::commands::common::{format_deck_lines, Context};
use crate::error::CliError;

pub async fn run_deck(limit: usize, as_json: bool, ctx: &Context) -> Result<(), CliError> {
    let me = ctx.current_account().await?;
    let deck = ctx.matchmaking().swipe_deck(&me, Some(limit)).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&deck)?);
    } else if deck.is_empty() {
        println!("No one new nearby. Try widening your distance or interests.");
    } else {
        for line in format_deck_lines(&deck) {
            println!("{line}");
        }
    }
    Ok(())
}
