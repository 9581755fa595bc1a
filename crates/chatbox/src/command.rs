/// A line read from the input, interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputCommand {
    /// `/attach <path>`: stage a file for the next turn.
    Attach(String),
    /// `/detach`: drop all staged files.
    Detach,
    /// `/clear`: delete the history.
    Clear,
    /// `/quit`: leave the program.
    Quit,
    /// Anything else is sent as a user turn.
    Say(String),
}

impl InputCommand {
    /// Parses a line of input.
    ///
    /// Unknown slash commands are sent as they are, so a turn may start
    /// with `/`.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let (head, rest) = trimmed
            .split_once(char::is_whitespace)
            .map_or((trimmed, ""), |(head, rest)| (head, rest.trim()));

        match head {
            "/attach" if !rest.is_empty() => Self::Attach(rest.to_owned()),
            "/detach" if rest.is_empty() => Self::Detach,
            "/clear" if rest.is_empty() => Self::Clear,
            "/quit" if rest.is_empty() => Self::Quit,
            _ => Self::Say(trimmed.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            InputCommand::parse("/attach  ~/report.pdf \n"),
            InputCommand::Attach("~/report.pdf".to_owned())
        );
        assert_eq!(
            InputCommand::parse("/attach my file.txt"),
            InputCommand::Attach("my file.txt".to_owned())
        );
        assert_eq!(InputCommand::parse("/detach"), InputCommand::Detach);
        assert_eq!(InputCommand::parse(" /clear\n"), InputCommand::Clear);
        assert_eq!(InputCommand::parse("/quit"), InputCommand::Quit);
    }

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(
            InputCommand::parse("  Hello there \n"),
            InputCommand::Say("Hello there".to_owned())
        );
        assert_eq!(
            InputCommand::parse("/attach"),
            InputCommand::Say("/attach".to_owned())
        );
        assert_eq!(
            InputCommand::parse("/quit now"),
            InputCommand::Say("/quit now".to_owned())
        );
        assert_eq!(InputCommand::parse(""), InputCommand::Say(String::new()));
    }
}
