//! Message-to-command parsing.
//!
//! A raw chat line is split on whitespace and the first token selects a verb
//! from a fixed set; anything else is not a command and produces no reply.
//! Argument validation happens only after authorization, and a mismatch
//! yields the verb's literal usage string. `!botadmin` is the one verb whose
//! arguments are tokenized quote-aware, so a subject containing spaces can be
//! passed as a single parameter.

/// The fixed verb set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Help,
    Ping,
    ServerList,
    HardReset,
    Update,
    Reboot,
    GameBan,
    GameAdmin,
    Ufw,
    BotAdmin,
    GetLog,
}

impl Verb {
    /// Recognize the leading token of a message. `None` means the message is
    /// not addressed to the bot at all.
    pub fn of(raw: &str) -> Option<Verb> {
        match raw.split_whitespace().next()? {
            "!help" => Some(Verb::Help),
            "!ping" => Some(Verb::Ping),
            "!serverlist" => Some(Verb::ServerList),
            "!hardreset" => Some(Verb::HardReset),
            "!update" => Some(Verb::Update),
            "!reboot" => Some(Verb::Reboot),
            "!gameban" => Some(Verb::GameBan),
            "!gameadmin" => Some(Verb::GameAdmin),
            "!ufw" => Some(Verb::Ufw),
            "!botadmin" => Some(Verb::BotAdmin),
            "!getlog" => Some(Verb::GetLog),
            _ => None,
        }
    }
}

/// A fully validated command, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Ping,
    ServerList,
    HardReset { alias: String },
    Update { alias: String },
    Reboot { alias: String },
    GameBan { alias: String, query: BanQuery },
    GameAdmin,
    UfwDeny { ip: String },
    BotAdmin(AdminCommand),
    GetLog { alias: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BanQuery {
    List,
    Get { user: String },
    Add { user: String },
    Remove { user: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    List,
    Add { subject: String },
    Revoke { subject: String },
}

/// Outcome of looking at a raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Not addressed to the bot; produce no reply at all.
    NotACommand,
    /// Recognized verb with malformed arguments; reply with the usage string.
    Invalid(&'static str),
    /// Ready to execute.
    Command(Command),
}

pub const USAGE_HARDRESET: &str = "Usage: !hardreset servername (ex.: SD)";
pub const USAGE_UPDATE: &str = "Usage: !update servername (ex.: SD)";
pub const USAGE_REBOOT: &str = "Usage: !reboot servername (ex.: SD)";
pub const USAGE_GAMEBAN: &str =
    "Usage: !gameban servername (ex.: USA01 or GER01) list|get|add|remove";
pub const USAGE_GAMEBAN_USER: &str =
    "Usage: !gameban servername (ex.: USA01 or GER01) get|add|remove username";
pub const USAGE_UFW: &str = "Usage: !ufw deny ip";
pub const USAGE_UFW_VERB: &str = "Unknown verb. Usage: !ufw deny ip";
pub const USAGE_BOTADMIN: &str = "Usage: !botadmin list|add|revoke [@mention|id]";
pub const USAGE_BOTADMIN_SUBJECT: &str = "Usage: !botadmin add|revoke [@mention|id]";
pub const USAGE_GETLOG: &str = "Usage: !getlog servername (ex.: SD)";

/// Classify a raw message in one step.
pub fn dispatch(raw: &str) -> Dispatch {
    match Verb::of(raw) {
        None => Dispatch::NotACommand,
        Some(verb) => parse(verb, raw),
    }
}

/// Validate a recognized verb's arguments into a [`Command`].
pub fn parse(verb: Verb, raw: &str) -> Dispatch {
    let params: Vec<&str> = raw.split_whitespace().collect();

    match verb {
        Verb::Help => Dispatch::Command(Command::Help),
        Verb::Ping => Dispatch::Command(Command::Ping),
        Verb::ServerList => Dispatch::Command(Command::ServerList),
        Verb::GameAdmin => Dispatch::Command(Command::GameAdmin),

        Verb::HardReset => single_alias(&params, USAGE_HARDRESET, |alias| Command::HardReset {
            alias,
        }),
        Verb::Update => single_alias(&params, USAGE_UPDATE, |alias| Command::Update { alias }),
        Verb::Reboot => single_alias(&params, USAGE_REBOOT, |alias| Command::Reboot { alias }),
        Verb::GetLog => single_alias(&params, USAGE_GETLOG, |alias| Command::GetLog { alias }),

        Verb::GameBan => parse_gameban(&params),
        Verb::Ufw => parse_ufw(&params),
        Verb::BotAdmin => parse_botadmin(raw),
    }
}

fn single_alias(
    params: &[&str],
    usage: &'static str,
    build: impl FnOnce(String) -> Command,
) -> Dispatch {
    if params.len() != 2 {
        return Dispatch::Invalid(usage);
    }
    Dispatch::Command(build(params[1].to_string()))
}

fn parse_gameban(params: &[&str]) -> Dispatch {
    const ACTIONS: [&str; 4] = ["list", "get", "add", "remove"];

    if params.len() < 3 || params.len() > 4 || !ACTIONS.contains(&params[2]) {
        return Dispatch::Invalid(USAGE_GAMEBAN);
    }
    if params[2] != "list" && params.len() < 4 {
        return Dispatch::Invalid(USAGE_GAMEBAN_USER);
    }

    let alias = params[1].to_string();
    let query = match params[2] {
        "list" => BanQuery::List,
        "get" => BanQuery::Get {
            user: params[3].to_string(),
        },
        "add" => BanQuery::Add {
            user: params[3].to_string(),
        },
        _ => BanQuery::Remove {
            user: params[3].to_string(),
        },
    };

    Dispatch::Command(Command::GameBan { alias, query })
}

fn parse_ufw(params: &[&str]) -> Dispatch {
    if params.len() != 3 {
        return Dispatch::Invalid(USAGE_UFW);
    }
    if params[1] != "deny" {
        return Dispatch::Invalid(USAGE_UFW_VERB);
    }
    Dispatch::Command(Command::UfwDeny {
        ip: params[2].to_string(),
    })
}

fn parse_botadmin(raw: &str) -> Dispatch {
    const ACTIONS: [&str; 3] = ["list", "add", "revoke"];

    let params = tokenize_quoted(raw);
    if params.len() < 2 || params.len() > 3 || !ACTIONS.contains(&params[1].as_str()) {
        return Dispatch::Invalid(USAGE_BOTADMIN);
    }
    if params[1] != "list" && params.len() < 3 {
        return Dispatch::Invalid(USAGE_BOTADMIN_SUBJECT);
    }

    let command = match params[1].as_str() {
        "list" => AdminCommand::List,
        "add" => AdminCommand::Add {
            subject: params[2].clone(),
        },
        _ => AdminCommand::Revoke {
            subject: params[2].clone(),
        },
    };

    Dispatch::Command(Command::BotAdmin(command))
}

/// Split on whitespace, except that a `"..."` span is one token (quotes
/// stripped). An unterminated quote runs to the end of the input.
pub fn tokenize_quoted(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut token = String::new();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                token.push(c);
            }
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
            tokens.push(token);
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_quoted_span_is_one_token() {
        let tokens = tokenize_quoted("!botadmin add \"123456789012345678 Name With Spaces\"");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], "!botadmin");
        assert_eq!(tokens[1], "add");
        assert_eq!(tokens[2], "123456789012345678 Name With Spaces");
    }

    #[test]
    fn test_tokenize_plain_words() {
        assert_eq!(
            tokenize_quoted("a  b   c"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_tokenize_unterminated_quote_runs_to_end() {
        assert_eq!(
            tokenize_quoted("add \"half open"),
            vec!["add".to_string(), "half open".to_string()]
        );
    }

    #[test]
    fn test_unrecognized_verb_is_not_a_command() {
        assert!(Verb::of("hello there").is_none());
        assert!(Verb::of("!frobnicate x").is_none());
        assert!(Verb::of("").is_none());
        // A verb must be the first token, not a substring.
        assert!(Verb::of("say !help").is_none());
    }

    #[test]
    fn test_dispatch_classifies_in_one_step() {
        assert_eq!(dispatch("just chatting"), Dispatch::NotACommand);
        assert_eq!(dispatch("!hardreset"), Dispatch::Invalid(USAGE_HARDRESET));
        assert_eq!(
            dispatch("!hardreset SD"),
            Dispatch::Command(Command::HardReset {
                alias: "SD".to_string()
            })
        );
    }

    #[test]
    fn test_verb_recognition() {
        assert_eq!(Verb::of("!help"), Some(Verb::Help));
        assert_eq!(Verb::of("!reboot SD"), Some(Verb::Reboot));
        assert_eq!(Verb::of("!botadmin list"), Some(Verb::BotAdmin));
    }

    #[test]
    fn test_single_alias_verbs_require_exactly_one_argument() {
        assert_eq!(
            parse(Verb::HardReset, "!hardreset"),
            Dispatch::Invalid(USAGE_HARDRESET)
        );
        assert_eq!(
            parse(Verb::HardReset, "!hardreset SD extra"),
            Dispatch::Invalid(USAGE_HARDRESET)
        );
        assert_eq!(
            parse(Verb::HardReset, "!hardreset SD"),
            Dispatch::Command(Command::HardReset {
                alias: "SD".to_string()
            })
        );
        assert_eq!(
            parse(Verb::Update, "!update"),
            Dispatch::Invalid(USAGE_UPDATE)
        );
        assert_eq!(
            parse(Verb::Reboot, "!reboot"),
            Dispatch::Invalid(USAGE_REBOOT)
        );
        assert_eq!(
            parse(Verb::GetLog, "!getlog"),
            Dispatch::Invalid(USAGE_GETLOG)
        );
    }

    #[test]
    fn test_gameban_argument_shapes() {
        assert_eq!(
            parse(Verb::GameBan, "!gameban USA01"),
            Dispatch::Invalid(USAGE_GAMEBAN)
        );
        assert_eq!(
            parse(Verb::GameBan, "!gameban USA01 frobnicate"),
            Dispatch::Invalid(USAGE_GAMEBAN)
        );
        assert_eq!(
            parse(Verb::GameBan, "!gameban USA01 get"),
            Dispatch::Invalid(USAGE_GAMEBAN_USER)
        );
        assert_eq!(
            parse(Verb::GameBan, "!gameban USA01 list"),
            Dispatch::Command(Command::GameBan {
                alias: "USA01".to_string(),
                query: BanQuery::List
            })
        );
        assert_eq!(
            parse(Verb::GameBan, "!gameban USA01 get alice"),
            Dispatch::Command(Command::GameBan {
                alias: "USA01".to_string(),
                query: BanQuery::Get {
                    user: "alice".to_string()
                }
            })
        );
    }

    #[test]
    fn test_ufw_argument_shapes() {
        assert_eq!(parse(Verb::Ufw, "!ufw deny"), Dispatch::Invalid(USAGE_UFW));
        assert_eq!(
            parse(Verb::Ufw, "!ufw allow 1.2.3.4"),
            Dispatch::Invalid(USAGE_UFW_VERB)
        );
        assert_eq!(
            parse(Verb::Ufw, "!ufw deny 1.2.3.4"),
            Dispatch::Command(Command::UfwDeny {
                ip: "1.2.3.4".to_string()
            })
        );
    }

    #[test]
    fn test_botadmin_argument_shapes() {
        assert_eq!(
            parse(Verb::BotAdmin, "!botadmin"),
            Dispatch::Invalid(USAGE_BOTADMIN)
        );
        assert_eq!(
            parse(Verb::BotAdmin, "!botadmin promote x"),
            Dispatch::Invalid(USAGE_BOTADMIN)
        );
        assert_eq!(
            parse(Verb::BotAdmin, "!botadmin add"),
            Dispatch::Invalid(USAGE_BOTADMIN_SUBJECT)
        );
        assert_eq!(
            parse(Verb::BotAdmin, "!botadmin list"),
            Dispatch::Command(Command::BotAdmin(AdminCommand::List))
        );
        assert_eq!(
            parse(Verb::BotAdmin, "!botadmin revoke <@123456789012345678>"),
            Dispatch::Command(Command::BotAdmin(AdminCommand::Revoke {
                subject: "<@123456789012345678>".to_string()
            }))
        );
    }

    #[test]
    fn test_botadmin_quoted_subject_is_one_parameter() {
        let dispatch = parse(
            Verb::BotAdmin,
            "!botadmin add \"123456789012345678 Name With Spaces\"",
        );
        assert_eq!(
            dispatch,
            Dispatch::Command(Command::BotAdmin(AdminCommand::Add {
                subject: "123456789012345678 Name With Spaces".to_string()
            }))
        );
    }

    #[test]
    fn test_no_argument_verbs() {
        assert_eq!(parse(Verb::Help, "!help"), Dispatch::Command(Command::Help));
        assert_eq!(parse(Verb::Ping, "!ping"), Dispatch::Command(Command::Ping));
        assert_eq!(
            parse(Verb::ServerList, "!serverlist"),
            Dispatch::Command(Command::ServerList)
        );
        assert_eq!(
            parse(Verb::GameAdmin, "!gameadmin"),
            Dispatch::Command(Command::GameAdmin)
        );
    }
}
