use std::time::Duration;

use crate::cli::ChatCommands;
use crate::commands::common::{
    format_message_lines, messages_after, normalize_message_text, parse_match_id, read_image,
    Context,
};
use crate::error::CliError;

pub async fn run_chat(command: ChatCommands, ctx: &Context) -> Result<(), CliError> {
    let me = ctx.current_account().await?;
    let chat = ctx.chat();

    match command {
        ChatCommands::Send { match_id, text } => {
            let match_id = parse_match_id(&match_id)?;
            let text = normalize_message_text(&text)?;
            let message = chat.send_text(&match_id, &me, &text).await?;
            println!("{}", message.id);
        }
        ChatCommands::Image {
            match_id,
            path,
            caption,
        } => {
            let match_id = parse_match_id(&match_id)?;
            let bytes = read_image(&path)?;
            let message = chat.send_image(&match_id, &me, &bytes, caption).await?;
            println!("{}", message.id);
        }
        ChatCommands::History {
            match_id,
            limit,
            json,
        } => {
            let match_id = parse_match_id(&match_id)?;
            let messages = chat.list_messages(&match_id, &me, limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&messages)?);
            } else if messages.is_empty() {
                println!("No messages yet.");
            } else {
                for line in format_message_lines(&messages, &me) {
                    println!("{line}");
                }
            }
        }
        ChatCommands::Watch {
            match_id,
            poll_secs,
        } => {
            let match_id = parse_match_id(&match_id)?;
            let mut feed = chat
                .observe_messages(&match_id, &me)
                .await?
                .with_poll_interval(Duration::from_secs(poll_secs.max(1)));
            let mut last_printed = None;
            loop {
                let messages = feed.next().await?;
                let fresh = messages_after(&messages, last_printed.as_ref());
                for line in format_message_lines(fresh, &me) {
                    println!("{line}");
                }
                if let Some(last) = messages.last() {
                    last_printed = Some(last.id);
                }
                if fresh.iter().any(|message| message.sender_id != me) {
                    chat.mark_seen(&match_id, &me).await?;
                }
            }
        }
        ChatCommands::Seen { match_id } => {
            let match_id = parse_match_id(&match_id)?;
            let marked = chat.mark_seen(&match_id, &me).await?;
            println!("Marked {marked} message(s) as seen");
        }
    }
    Ok(())
}
