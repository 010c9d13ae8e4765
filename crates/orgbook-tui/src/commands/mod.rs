// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

use orgbook_core::RecipientKind;

/// A parsed, validated command ready to be executed by the app shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Theme(String),
    // Hand the selection to the compose surface under the given header
    Commit(RecipientKind),
    // Empty the selection without committing
    Clear,
    // Rebuild the tree from the directory
    Reload,
    // Interactive sign-in, then reload
    Login,
}

impl Command {
    /// Parse the text after the `:` prefix. An empty string returns
    /// `Err("")`, meaning "close without acting".
    pub fn parse(input: &str) -> Result<Command, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(String::new());
        }

        let (word, rest) = input
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((input, ""));

        match word {
            "q" | "quit" | "q!" => Ok(Command::Quit),
            "help" => Ok(Command::Help),
            "to" | "cc" | "bcc" => word.parse().map(Command::Commit),
            "add" => rest
                .parse()
                .map(Command::Commit)
                .map_err(|_| "usage: add <to|cc|bcc>".to_string()),
            "clear" => Ok(Command::Clear),
            "reload" => Ok(Command::Reload),
            "login" | "signin" => Ok(Command::Login),
            "theme" => {
                if rest.is_empty() {
                    Err("usage: theme <default|gruvbox>".to_string())
                } else {
                    Ok(Command::Theme(rest.to_string()))
                }
            }
            other => Err(format!("unknown command: {other}")),
        }
    }
}
