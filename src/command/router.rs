use crate::command::parse::{self, AdminCommand, BanQuery, Command, Dispatch};
use crate::command::{DirectoryLookup, Invocation, ReplySink};
use crate::config::{ConfigStore, ServerConnection};
use crate::error::{AdminError, AppError, ReplyError, ShellError};
use crate::registry::{AdminDirectory, ServerRegistry};
use crate::remote::{BanListService, LogArchiver, RemoteConsole, RemoteSession};
use crate::serverlist::{self, ServerListClient};
use std::sync::Arc;
use tracing::{error, info, warn};

const INSUFFICIENT_PRIVILEGES: &str = "Insufficient privileges: Bot admin required";

const HELP_TEXT: &str = ">>> Implemented commands:\n!help\n!ping\n!serverlist\n!hardreset\n!update\n!reboot\n!gameban\n!gameadmin\n!ufw\n!botadmin\n!getlog";

const RESTART_SCRIPT: &str = "bash restart.sh";
const UPDATE_SCRIPT: &str = "bash update.sh";
const DELETE_LOG: &str = "rm server/serverlog.txt";
const REBOOT: &str = "reboot";

/// Translates incoming chat messages into authorized remote operations.
///
/// One `handle` call per message: recognize the verb, check the author
/// against the admin directory, validate arguments, then run the verb's
/// reply sequence. Every failure path emits exactly one reply.
pub struct CommandRouter {
    admins: AdminDirectory,
    servers: ServerRegistry,
    console: Arc<dyn RemoteConsole>,
    bans: BanListService,
    logs: LogArchiver,
    feed: Arc<ServerListClient>,
}

impl CommandRouter {
    pub fn new(
        store: Arc<ConfigStore>,
        console: Arc<dyn RemoteConsole>,
        feed: Arc<ServerListClient>,
    ) -> Self {
        Self {
            admins: AdminDirectory::new(store.clone()),
            servers: ServerRegistry::new(store),
            bans: BanListService::new(console.clone()),
            logs: LogArchiver::new(console.clone()),
            console,
            feed,
        }
    }

    pub fn admins(&self) -> &AdminDirectory {
        &self.admins
    }

    /// Entry point for one incoming message.
    pub async fn handle(
        &self,
        raw: &str,
        who: &Invocation,
        sink: &dyn ReplySink,
        lookup: &dyn DirectoryLookup,
    ) {
        let dispatch = parse::dispatch(raw);
        if dispatch == Dispatch::NotACommand {
            return;
        }

        // Every verb is privileged; authorization comes before argument
        // validation so non-admins learn nothing about usage.
        if !self.admins.is_admin(&who.author_id).await {
            info!("Denied {} ({}): {}", who.author_name, who.author_id, raw);
            sink.say(INSUFFICIENT_PRIVILEGES.to_string()).await;
            return;
        }

        let command = match dispatch {
            Dispatch::NotACommand => return,
            Dispatch::Invalid(usage) => {
                sink.say(usage.to_string()).await;
                return;
            }
            Dispatch::Command(command) => command,
        };

        self.execute(command, who, sink, lookup).await;
    }

    async fn execute(
        &self,
        command: Command,
        who: &Invocation,
        sink: &dyn ReplySink,
        lookup: &dyn DirectoryLookup,
    ) {
        match command {
            Command::Help => sink.say(HELP_TEXT.to_string()).await,
            Command::Ping => self.ping(who, sink).await,
            Command::ServerList => self.server_list(sink).await,
            Command::HardReset { alias } => {
                self.run_script(
                    &alias,
                    RESTART_SCRIPT,
                    format!("{} began a hardreset of {}.", who.author_name, alias),
                    "Server restart command sent and received.",
                    sink,
                )
                .await
            }
            Command::Update { alias } => {
                self.run_script(
                    &alias,
                    UPDATE_SCRIPT,
                    format!("{} began an update on server {}.", who.author_name, alias),
                    "Update command sent and received.",
                    sink,
                )
                .await
            }
            Command::Reboot { alias } => self.reboot(&alias, who, sink).await,
            Command::GameBan { alias, query } => self.game_ban(&alias, query, sink).await,
            Command::GameAdmin => sink.say("This command is coming soon!".to_string()).await,
            Command::UfwDeny { ip } => self.ufw_deny(&ip, sink).await,
            Command::BotAdmin(admin_command) => {
                self.bot_admin(admin_command, sink, lookup).await
            }
            Command::GetLog { alias } => self.get_log(&alias, who, sink).await,
        }
    }

    async fn ping(&self, who: &Invocation, sink: &dyn ReplySink) {
        let reply = match who.latency {
            Some(latency) => format!("Pong! Roundtrip time was {}ms", latency.as_millis()),
            None => "Pong!".to_string(),
        };
        sink.say(reply).await;
    }

    async fn server_list(&self, sink: &dyn ReplySink) {
        match self.feed.fetch().await {
            Ok(servers) => sink.say(serverlist::render(&servers)).await,
            Err(e) => {
                error!("Server list fetch failed: {}", e);
                sink.say(format!("Failed to fetch the server list: {}", e)).await;
            }
        }
    }

    /// Resolve an alias or emit the unknown-server reply.
    async fn resolve(&self, alias: &str, sink: &dyn ReplySink) -> Option<ServerConnection> {
        let server = self.servers.resolve(alias).await;
        if server.is_none() {
            sink.say(format!("Unknown server: {}", alias)).await;
        }
        server
    }

    async fn open(
        &self,
        server: &ServerConnection,
        sink: &dyn ReplySink,
    ) -> Option<Box<dyn RemoteSession>> {
        match self.console.open(server).await {
            Ok(session) => {
                sink.say("Connection to server successful.".to_string()).await;
                Some(session)
            }
            Err(e) => {
                error!("Connection to {} failed: {}", server.name, e);
                sink.say(format!("Connection to server failed: {}", e)).await;
                None
            }
        }
    }

    /// Shared shape of `!hardreset` and `!update`: announce, connect, run
    /// one script, report, disconnect.
    async fn run_script(
        &self,
        alias: &str,
        script: &str,
        announce: String,
        done: &str,
        sink: &dyn ReplySink,
    ) {
        let Some(server) = self.resolve(alias, sink).await else {
            return;
        };

        sink.say(announce).await;

        let Some(mut session) = self.open(&server, sink).await else {
            return;
        };

        match session.run(script).await {
            Ok(_) => {
                sink.say(done.to_string()).await;
                session.close().await;
            }
            Err(e) => {
                error!("Remote command on {} failed: {}", alias, e);
                sink.say(format!("Remote command failed: {}", e)).await;
            }
        }
    }

    async fn reboot(&self, alias: &str, who: &Invocation, sink: &dyn ReplySink) {
        let Some(server) = self.resolve(alias, sink).await else {
            return;
        };

        sink.say(format!(
            "{} initialized a reboot and log deletion of {}.",
            who.author_name, alias
        ))
        .await;

        let Some(mut session) = self.open(&server, sink).await else {
            return;
        };

        match session.run(DELETE_LOG).await {
            Ok(_) => sink.say("Logs deleted.".to_string()).await,
            Err(e) => {
                error!("Log deletion on {} failed: {}", alias, e);
                sink.say(format!("Remote command failed: {}", e)).await;
                return;
            }
        }

        sink.say("Rebooting.".to_string()).await;

        // The reboot severs the session; losing it here is the expected
        // terminal state, not an error the operator needs to see.
        match session.run(REBOOT).await {
            Ok(_) => session.close().await,
            Err(_) => {
                info!("SSH connection lost after a reboot command");
            }
        }
    }

    async fn game_ban(&self, alias: &str, query: BanQuery, sink: &dyn ReplySink) {
        let Some(server) = self.resolve(alias, sink).await else {
            return;
        };

        match query {
            BanQuery::List => match self.bans.list_banned(&server, sink).await {
                Ok(names) => {
                    sink.say(format!(">>> **Banned users:**\n{}", names.join("\n"))).await;
                    sink.say("Use **!gameban servername get username** to see details".to_string())
                        .await;
                }
                Err(e) => self.report_ban_failure(alias, e, sink).await,
            },
            BanQuery::Get { user } => match self.bans.get_banned(&server, &user, sink).await {
                Ok(Some(entry)) => {
                    let details = format!(
                        "**Username:** {}\n**User ID:** {}\n**Date of ban:** {}\n**Minutes:** {}\n**Reason:** {}",
                        entry.user_name, entry.user_id, entry.banned_at, entry.minutes, entry.reason
                    );
                    sink.say(format!(">>> **Banned user:**\n{}", details)).await;
                }
                Ok(None) => {
                    sink.say("That user is not in the ban list.".to_string()).await;
                }
                Err(e) => self.report_ban_failure(alias, e, sink).await,
            },
            BanQuery::Add { .. } | BanQuery::Remove { .. } => {
                sink.say("This command is coming soon".to_string()).await;
            }
        }
    }

    async fn report_ban_failure(&self, alias: &str, e: AppError, sink: &dyn ReplySink) {
        error!("Ban list query on {} failed: {}", alias, e);
        let reply = match e {
            AppError::Shell(e @ ShellError::Connect(_)) => {
                format!("Connection to server failed: {}", e)
            }
            AppError::BanListFormat(_) => "The ban list could not be parsed.".to_string(),
            other => format!("Ban list retrieval failed: {}", other),
        };
        sink.say(reply).await;
    }

    /// Broadcast a firewall deny rule to every registered server. Targets
    /// are independent: one failing never aborts the rest.
    async fn ufw_deny(&self, ip: &str, sink: &dyn ReplySink) {
        for server in self.servers.all().await {
            let mut session = match self.console.open(&server).await {
                Ok(session) => {
                    sink.say(format!("Connection to {} successful.", server.name)).await;
                    session
                }
                Err(e) => {
                    warn!("Connection to {} failed: {}", server.name, e);
                    sink.say(format!("Connection to {} failed: {}", server.name, e)).await;
                    continue;
                }
            };

            sink.say(format!("Adding {} to deny rule list.", ip)).await;

            let rule = format!("ufw insert 1 deny from {} to any", ip);
            match session.run(&rule).await {
                Ok(_) => session.close().await,
                Err(e) => {
                    warn!("Firewall update on {} failed: {}", server.name, e);
                    sink.say(format!("Firewall update on {} failed: {}", server.name, e)).await;
                }
            }
        }
    }

    async fn bot_admin(
        &self,
        command: AdminCommand,
        sink: &dyn ReplySink,
        lookup: &dyn DirectoryLookup,
    ) {
        match command {
            AdminCommand::List => {
                let admins = self.admins.list().await;
                let lines: Vec<String> = admins.into_iter().map(|a| a.name).collect();
                sink.say(format!(">>> **Bot admins:**\n{}", lines.join("\n"))).await;
            }
            AdminCommand::Add { subject } => {
                let id = match AdminDirectory::canonical_id(&subject) {
                    Ok(id) => id,
                    Err(_) => {
                        sink.say(format!("{} is not a valid ID!", subject)).await;
                        return;
                    }
                };

                let display_name = match lookup.display_name(&id).await {
                    Some(name) => name,
                    None => {
                        warn!("No display name found for {}; storing the id alone", id);
                        id.clone()
                    }
                };

                match self.admins.add(&id, &display_name).await {
                    Ok(()) => {
                        sink.say(format!("User {} was added to the bot admins", subject)).await;
                    }
                    Err(AdminError::AlreadyAdmin) => {
                        sink.say(format!("User {} is already a bot admin", subject)).await;
                    }
                    Err(AdminError::InvalidId) => {
                        sink.say(format!("{} is not a valid ID!", subject)).await;
                    }
                    Err(e) => {
                        error!("Admin add failed: {}", e);
                        sink.say(format!("Failed to update the admin registry: {}", e)).await;
                    }
                }
            }
            AdminCommand::Revoke { subject } => match self.admins.revoke(&subject).await {
                Ok(()) => {
                    sink.say(format!("User {} was removed from bot admins.", subject)).await;
                }
                Err(AdminError::NotAdmin) => {
                    sink.say(format!("User {} is not a bot admin.", subject)).await;
                }
                Err(AdminError::InvalidId) => {
                    sink.say(format!("{} is not a valid ID!", subject)).await;
                }
                Err(e) => {
                    error!("Admin revoke failed: {}", e);
                    sink.say(format!("Failed to update the admin registry: {}", e)).await;
                }
            },
        }
    }

    async fn get_log(&self, alias: &str, who: &Invocation, sink: &dyn ReplySink) {
        let Some(server) = self.resolve(alias, sink).await else {
            return;
        };

        sink.say(format!(
            "{} asked for the {} server logs.",
            who.author_name, alias
        ))
        .await;

        let log = match self.logs.fetch_compressed_log(&server, sink).await {
            Ok(log) => log,
            Err(e) => {
                error!("Log retrieval from {} failed: {}", alias, e);
                sink.say(format!("Log retrieval failed: {}", e)).await;
                return;
            }
        };

        let file_name = format!("serverlog-{}.log.gz", alias);
        match sink.send_file(file_name, log.bytes).await {
            Ok(()) => {}
            Err(ReplyError::AttachmentTooLarge) => {
                sink.say(format!(
                    "Log size might be too long: {}MB",
                    log.original_len / 1024 / 1024
                ))
                .await;
            }
            Err(ReplyError::Delivery(e)) => {
                error!("Log attachment delivery failed: {}", e);
            }
        }
    }
}
