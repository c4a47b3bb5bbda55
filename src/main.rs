//! `portal-assistant` terminal chat.
//!
//! Reads one message per line, prints the reply tagged with its provenance.
//! `/image <text>` marks the message as carrying an attachment; `/quit` exits.

use clap::Parser;
use portal_assistant_lib::{init_app, AssistantConfig, Identity};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "portal-assistant", about = "Chat with the portal assistant")]
struct Args {
    /// Stable user identity, e.g. an email address
    #[arg(long)]
    user: String,

    /// student, startup or official; anything else chats as a visitor
    #[arg(long, default_value = "visitor")]
    role: String,

    /// Display name for the welcome banner
    #[arg(long, default_value = "")]
    name: String,

    /// Page or screen the user is on, passed along as context
    #[arg(long)]
    context: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = AssistantConfig::from_env()?;
    let assistant = init_app(&config)?;
    let identity = Identity::new(&args.user, &args.role, &args.name);

    println!("{}", assistant.welcome_banner(&identity));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line == "/quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let (message, has_image) = split_image_flag(line);

        println!("thinking...");
        let reply = assistant
            .respond_as(&identity, message, args.context.as_deref(), has_image)
            .await;
        println!("[{}] {}", reply.model.as_str(), reply.content);
    }

    Ok(())
}

/// `/image` alone or `/image <text>` marks an attached image; anything else is plain text.
fn split_image_flag(line: &str) -> (&str, bool) {
    if line == "/image" {
        return ("", true);
    }
    match line.strip_prefix("/image ") {
        Some(rest) => (rest.trim(), true),
        None => (line, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_flag_needs_a_separate_word() {
        assert_eq!(split_image_flag("/image what is this"), ("what is this", true));
        assert_eq!(split_image_flag("/image"), ("", true));
        assert_eq!(split_image_flag("/imagery x"), ("/imagery x", false));
        assert_eq!(split_image_flag("describe /image"), ("describe /image", false));
    }
}
