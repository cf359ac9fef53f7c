use sportmatch_core::db::SwipeOutcome;
use sportmatch_core::AccountId;

use crate::cli::DecisionArg;
use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_swipe(target: &str, decision: DecisionArg, ctx: &Context) -> Result<(), CliError> {
    let me = ctx.current_account().await?;
    let target = AccountId::new(target)?;
    let outcome = ctx
        .matchmaking()
        .swipe(&me, &target, decision.into())
        .await?;
    println!("{}", describe_outcome(&outcome));
    Ok(())
}

pub fn describe_outcome(outcome: &SwipeOutcome) -> String {
    match outcome {
        SwipeOutcome::NoMatch => "Swipe recorded".to_string(),
        SwipeOutcome::NewMatch(record) => {
            format!("It's a match! Say hi with `sportmatch chat send {} ...`", record.id)
        }
        SwipeOutcome::AlreadyMatched(record) => format!("Already matched ({})", record.id),
    }
}
