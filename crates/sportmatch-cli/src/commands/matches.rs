use crate::commands::common::{format_match_lines, match_to_list_item, Context, MatchListItem};
use crate::error::CliError;

pub async fn run_matches(as_json: bool, ctx: &Context) -> Result<(), CliError> {
    let me = ctx.current_account().await?;
    let summaries = ctx.matchmaking().list_match_summaries(&me).await?;

    if as_json {
        let items = summaries
            .iter()
            .map(|summary| match_to_list_item(summary, &me))
            .collect::<Vec<MatchListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if summaries.is_empty() {
        println!("No matches yet.");
    } else {
        for line in format_match_lines(&summaries, &me) {
            println!("{line}");
        }
    }
    Ok(())
}
