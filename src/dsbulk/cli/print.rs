use colored::Colorize;
use dsbulk::api::{CmdMessage, CmdResult, MessageLevel};
use dsbulk::error::Result;
use std::io::Write;

/// Projected lines to `out`, one per entry.
pub(super) fn write_lines<W: Write>(out: &mut W, lines: &[String]) -> Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}

pub(super) fn format_message(message: &CmdMessage) -> String {
    match message.level {
        MessageLevel::Info => message.content.dimmed().to_string(),
        MessageLevel::Success => message.content.green().to_string(),
        MessageLevel::Warning => message.content.yellow().to_string(),
        MessageLevel::Error => message.content.red().to_string(),
    }
}

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        eprintln!("{}", format_message(message));
    }
}

pub(super) fn print_result(result: &CmdResult) -> Result<()> {
    let stdout = std::io::stdout();
    write_lines(&mut stdout.lock(), &result.lines)?;
    print_messages(&result.messages);
    Ok(())
}
