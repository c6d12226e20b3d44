// File: personabot-core/src/platforms/discord/runtime.rs

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_gateway::{
    self as gateway, CloseFrame, Config, Event, EventTypeFlags, Intents, MessageSender, Shard,
    StreamExt,
};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::channel::Message;
use twilight_model::gateway::payload::incoming::{MessageCreate, Ready as ReadyPayload};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};
use twilight_model::util::Timestamp;

use personabot_common::error::Error;
use personabot_common::models::{
    ChannelRef, ChannelScope, ChatMessageEvent, CommunityProfile, RawChatMessage,
};
use personabot_common::traits::platform_traits::{ChatPlatform, ConnectionStatus};

fn timestamp_to_utc(ts: Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(ts.as_micros()).unwrap_or_else(Utc::now)
}

fn parse_id<M>(raw: &str, what: &str) -> Result<Id<M>, Error> {
    raw.parse::<u64>()
        .ok()
        .and_then(Id::new_checked)
        .ok_or_else(|| Error::Platform(format!("Invalid {what} ID: {raw}")))
}

fn scope_for(msg: &Message) -> ChannelScope {
    match msg.guild_id {
        Some(guild_id) => ChannelScope::Community {
            community_id: guild_id.to_string(),
        },
        None => ChannelScope::Direct,
    }
}

/// The shard runner:
///   - calls `shard.next_event(...)`
///   - records our own user id from READY
///   - normalizes inbound chat messages and sends them to `tx`.
async fn shard_runner(
    mut shard: Shard,
    tx: UnboundedSender<ChatMessageEvent>,
    bot_user: Arc<OnceLock<Id<UserMarker>>>,
) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => match &event {
                Event::Ready(ready) => {
                    let data: &ReadyPayload = ready.as_ref();
                    info!(
                        "Shard {shard_id} => READY as {} (ID={})",
                        data.user.name, data.user.id
                    );
                    let _ = bot_user.set(data.user.id);
                }
                Event::MessageCreate(msg_create) => {
                    let msg: &MessageCreate = msg_create;
                    if msg.author.bot {
                        debug!("Ignoring bot message from {}", msg.author.name);
                        continue;
                    }

                    let addressed = bot_user
                        .get()
                        .map(|me| msg.mentions.iter().any(|m| m.id == *me))
                        .unwrap_or(false);

                    let channel = ChannelRef {
                        channel_id: msg.channel_id.to_string(),
                        scope: scope_for(msg),
                    };

                    let _ = tx.send(ChatMessageEvent {
                        channel,
                        author_id: msg.author.id.to_string(),
                        author_handle: msg.author.name.clone(),
                        text: msg.content.clone(),
                        addressed,
                    });
                }
                _ => {
                    trace!("Shard {shard_id} => unhandled event: {event:?}");
                }
            },
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

#[derive(Default)]
struct ShardHandles {
    tasks: Vec<JoinHandle<()>>,
    senders: Vec<MessageSender>,
}

/// Discord messaging platform for one bot instance. All state is behind
/// interior mutability so a shared handle can both pump events and be
/// disconnected at shutdown.
pub struct DiscordPlatform {
    token: String,
    status: Mutex<ConnectionStatus>,

    /// Receiver for normalized inbound events; `None` until `connect()`.
    rx: Mutex<Option<UnboundedReceiver<ChatMessageEvent>>>,

    shards: Mutex<ShardHandles>,
    http: Mutex<Option<Arc<HttpClient>>>,
    bot_user: Arc<OnceLock<Id<UserMarker>>>,
}

impl DiscordPlatform {
    pub fn new(token: String) -> Self {
        Self {
            token,
            status: Mutex::new(ConnectionStatus::Disconnected),
            rx: Mutex::new(None),
            shards: Mutex::new(ShardHandles::default()),
            http: Mutex::new(None),
            bot_user: Arc::new(OnceLock::new()),
        }
    }

    pub async fn connection_status(&self) -> ConnectionStatus {
        self.status.lock().await.clone()
    }

    /// Callers `await` the next inbound message event. Returns `None`
    /// once the platform is disconnected and drained.
    pub async fn next_message_event(&self) -> Option<ChatMessageEvent> {
        let mut guard = self.rx.lock().await;
        match guard.as_mut() {
            Some(r) => r.recv().await,
            None => None,
        }
    }

    /// Connect, create the event channel, and spawn the shard runners.
    pub async fn connect(&self) -> Result<(), Error> {
        {
            let status = self.status.lock().await;
            if matches!(*status, ConnectionStatus::Connected) {
                info!("(DiscordPlatform) Already connected => skipping");
                return Ok(());
            }
        }
        if self.token.is_empty() {
            return Err(Error::Platform("Discord token is empty".into()));
        }

        let (tx, rx) = unbounded_channel::<ChatMessageEvent>();
        {
            let mut guard = self.rx.lock().await;
            *guard = Some(rx);
        }

        let http_client = Arc::new(
            ClientBuilder::new()
                .token(self.token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );
        {
            let mut http = self.http.lock().await;
            *http = Some(http_client.clone());
        }

        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS
                | Intents::GUILD_MESSAGES
                | Intents::DIRECT_MESSAGES
                | Intents::MESSAGE_CONTENT,
        );

        let created = gateway::create_recommended(&http_client, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        let mut shards = self.shards.lock().await;
        for shard in created {
            shards.senders.push(shard.sender());

            let tx_for_shard = tx.clone();
            let bot_user = self.bot_user.clone();
            let handle = tokio::spawn(async move {
                shard_runner(shard, tx_for_shard, bot_user).await;
            });
            shards.tasks.push(handle);
        }

        let mut status = self.status.lock().await;
        *status = ConnectionStatus::Connected;
        Ok(())
    }

    /// Gracefully close the shards. Once the shard tasks finish, the
    /// event channel's senders drop and any pending
    /// `next_message_event()` resolves to `None`.
    pub async fn disconnect(&self) -> Result<(), Error> {
        {
            let mut status = self.status.lock().await;
            *status = ConnectionStatus::Disconnected;
        }

        let mut shards = self.shards.lock().await;
        for sender in &shards.senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in &mut shards.tasks {
            let _ = task.await;
        }
        shards.senders.clear();
        shards.tasks.clear();
        drop(shards);

        {
            let mut guard = self.rx.lock().await;
            *guard = None;
        }

        Ok(())
    }

    async fn http(&self) -> Result<Arc<HttpClient>, Error> {
        self.http
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::Platform("Discord platform is not connected".into()))
    }
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    async fn fetch_recent_messages(
        &self,
        channel: &ChannelRef,
        limit: usize,
    ) -> Result<Vec<RawChatMessage>, Error> {
        let http = self.http().await?;
        let channel_id: Id<ChannelMarker> = parse_id(&channel.channel_id, "channel")?;

        let messages = http
            .channel_messages(channel_id)
            .limit(limit.min(u16::MAX as usize) as u16)
            .await
            .map_err(|e| Error::Platform(format!("Error fetching channel messages: {e:?}")))?
            .models()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing channel messages: {e:?}")))?;

        Ok(messages
            .into_iter()
            .map(|msg| RawChatMessage {
                author_id: msg.author.id.to_string(),
                author_handle: msg.author.name.clone(),
                author_global_name: msg.author.global_name.clone(),
                text: msg.content,
                timestamp: timestamp_to_utc(msg.timestamp),
            })
            .collect())
    }

    async fn fetch_community_member(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<Option<CommunityProfile>, Error> {
        let http = self.http().await?;
        let guild_id: Id<GuildMarker> = parse_id(community_id, "guild")?;
        let target: Id<UserMarker> = parse_id(user_id, "user")?;

        let member = match http.guild_member(guild_id, target).await {
            Ok(resp) => resp
                .model()
                .await
                .map_err(|e| Error::Platform(format!("Error parsing guild member: {e:?}")))?,
            // Unknown member, missing permission, uncached guild: the
            // resolver treats all of these as "no membership record".
            Err(e) => {
                debug!("guild_member({guild_id}, {target}) failed: {e:?}");
                return Ok(None);
            }
        };

        Ok(Some(CommunityProfile {
            nickname: member.nick,
        }))
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), Error> {
        let http = self.http().await?;
        let channel: Id<ChannelMarker> = parse_id(channel_id, "channel")?;

        http.create_message(channel)
            .content(text)
            .await
            .map_err(|e| Error::Platform(format!("Error sending Discord message: {e:?}")))?;

        Ok(())
    }
}
