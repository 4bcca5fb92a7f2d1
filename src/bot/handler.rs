use crate::bot::ShardManagerContainer;
use crate::command::{CommandRouter, DirectoryLookup, Invocation, ReplySink};
use crate::error::ReplyError;
use async_trait::async_trait;
use serenity::all::{ChannelId, Context, CreateAttachment, CreateMessage, EventHandler, Message, Ready, UserId};
use serenity::http::Http;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Discord caps bot uploads; anything larger is rejected before we even try.
const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

/// Gateway event handler: forwards each message to the command router on
/// its own event task.
pub struct Handler {
    router: Arc<CommandRouter>,
}

impl Handler {
    pub fn new(router: Arc<CommandRouter>) -> Self {
        Self { router }
    }

    async fn gateway_latency(&self, ctx: &Context) -> Option<Duration> {
        let data = ctx.data.read().await;
        let shard_manager = data.get::<ShardManagerContainer>()?;
        let runners = shard_manager.runners.lock().await;
        runners.get(&ctx.shard_id).and_then(|runner| runner.latency)
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Bot is ready! Logged in as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Never react to bots, including ourselves.
        if msg.author.bot {
            return;
        }

        let who = Invocation {
            author_id: msg.author.id.to_string(),
            author_name: msg.author.name.clone(),
            latency: self.gateway_latency(&ctx).await,
        };

        let sink = ChannelSink {
            http: ctx.http.clone(),
            channel: msg.channel_id,
        };
        let lookup = DiscordLookup {
            http: ctx.http.clone(),
        };

        self.router.handle(&msg.content, &who, &sink, &lookup).await;
    }
}

/// Delivers router replies into the channel the command came from.
pub struct ChannelSink {
    http: Arc<Http>,
    channel: ChannelId,
}

#[async_trait]
impl ReplySink for ChannelSink {
    async fn say(&self, text: String) {
        if let Err(e) = self.channel.say(&self.http, text).await {
            error!("Failed to send reply: {}", e);
        }
    }

    async fn send_file(&self, file_name: String, bytes: Vec<u8>) -> Result<(), ReplyError> {
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ReplyError::AttachmentTooLarge);
        }

        let attachment = CreateAttachment::bytes(bytes, file_name);
        let builder = CreateMessage::new().add_file(attachment);

        match self.channel.send_message(&self.http, builder).await {
            Ok(_) => Ok(()),
            Err(serenity::Error::Http(e)) => {
                // 413 means the gateway disagreed with our local bound.
                if let serenity::http::HttpError::UnsuccessfulRequest(resp) = &e {
                    if resp.status_code.as_u16() == 413 {
                        return Err(ReplyError::AttachmentTooLarge);
                    }
                }
                Err(ReplyError::Delivery(e.to_string()))
            }
            Err(e) => Err(ReplyError::Delivery(e.to_string())),
        }
    }
}

/// Resolves admin display names through the Discord HTTP API.
pub struct DiscordLookup {
    http: Arc<Http>,
}

#[async_trait]
impl DirectoryLookup for DiscordLookup {
    async fn display_name(&self, id: &str) -> Option<String> {
        let id: u64 = match id.parse() {
            Ok(id) => id,
            Err(_) => return None,
        };

        match self.http.get_user(UserId::new(id)).await {
            Ok(user) => Some(user.name),
            Err(e) => {
                warn!("User lookup for {} failed: {}", id, e);
                None
            }
        }
    }
}
