//! Interactive chat loop: read stdin, advance the session, print replies, repeat until EOF or quit.

use std::io::Write;

use databot::{OpenDataBot, ReplyReceiver};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::render_reply;

/// Returns true if the line is a quit command (case-insensitive).
pub fn is_quit_command(line: &str) -> bool {
    matches!(
        line.trim().to_lowercase().as_str(),
        "quit" | "exit" | "/quit" | "/exit"
    )
}

fn print_replies(rx: &mut ReplyReceiver) {
    for outgoing in rx.drain() {
        println!("{}", render_reply(&outgoing.reply));
    }
}

/// Runs the REPL loop: greet, then prompt, read line, answer, repeat.
///
/// Exits on EOF (Ctrl+D) or `quit`/`exit`/`/quit`. `/reset` starts the conversation over.
pub async fn run_chat_loop(bot: &OpenDataBot) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, mut rx) = bot.new_session("cli");
    bot.start(&mut session).await;
    print_replies(&mut rx);

    let mut reader = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match reader.next_line().await? {
            None => break,
            Some(s) if s.trim().is_empty() => continue,
            Some(s) if is_quit_command(&s) => break,
            Some(s) => s,
        };
        if line.trim() == "/reset" {
            session.reset();
            bot.start(&mut session).await;
        } else {
            bot.handle_message(&mut session, line.trim()).await;
        }
        print_replies(&mut rx);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_commands() {
        assert!(is_quit_command("quit"));
        assert!(is_quit_command("  EXIT "));
        assert!(is_quit_command("/quit"));
        assert!(!is_quit_command("quitting time"));
    }
}
