use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Show or hide the query history panel
    History,
    /// Run the stored-query batch job
    Process,
    /// Export the chart on screen to a file
    Export,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::History => "show or hide your past queries",
            SlashCommand::Process => "process the stored query set (admin)",
            SlashCommand::Export => "export the chart on screen: /export [path.html|path.json]",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Return all built-in commands in a Vec paired with their command string.
pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter().map(|c| (c.command(), c)).collect()
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let args: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(head).ok().or_else(|| match head.to_lowercase().as_str() {
        "q" | "quit" | "exit" => Some(SlashCommand::Bye),
        "hist" => Some(SlashCommand::History),
        "p" => Some(SlashCommand::Process),
        "e" => Some(SlashCommand::Export),
        "?" => Some(SlashCommand::Help),
        _ => None,
    })?;

    let argument = if args.is_empty() {
        None
    } else {
        Some(args.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for (command_str, command) in built_in_slash_commands() {
        help.push_str(&format!("/{} - {}\n", command_str, command.description()));
    }

    help.push_str("\nKeys: Enter send · Shift+Enter new line · ↑/↓ recall past queries");
    help.push_str("\nCtrl+R history panel · Alt+↑/↓ older/newer chart · Ctrl+E export chart · Ctrl+P process queries · PgUp/PgDn scroll · Ctrl+C quit");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_arguments() {
        let parsed = parse_slash_command("/export ~/charts/wins.html").unwrap();
        assert_eq!(parsed.command, SlashCommand::Export);
        assert_eq!(parsed.argument(), Some("~/charts/wins.html"));

        let parsed = parse_slash_command("  /history ").unwrap();
        assert_eq!(parsed.command, SlashCommand::History);
        assert_eq!(parsed.argument(), None);
    }

    #[test]
    fn accepts_aliases() {
        assert_eq!(parse_slash_command("/quit").unwrap().command, SlashCommand::Bye);
        assert_eq!(parse_slash_command("/p").unwrap().command, SlashCommand::Process);
    }

    #[test]
    fn plain_text_and_unknown_commands_are_not_commands() {
        assert_eq!(parse_slash_command("who led the ACC in assists"), None);
        assert_eq!(parse_slash_command("/rebounds by team"), None);
        assert_eq!(parse_slash_command("/"), None);
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for (keyword, _) in built_in_slash_commands() {
            assert!(help.contains(&format!("/{keyword} ")));
        }
    }
}
