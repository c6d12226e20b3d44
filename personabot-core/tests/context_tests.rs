// tests/context_tests.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use personabot_common::Error;
use personabot_common::models::{
    ChannelRef, CommunityProfile, ConversationMessage, RawChatMessage,
};
use personabot_common::traits::ChatPlatform;
use personabot_core::services::{ContextService, DisplayNameResolver};

fn t(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(offset_secs)
}

fn raw(author_id: &str, handle: &str, global: Option<&str>, text: &str, ts: DateTime<Utc>) -> RawChatMessage {
    RawChatMessage {
        author_id: author_id.to_string(),
        author_handle: handle.to_string(),
        author_global_name: global.map(|s| s.to_string()),
        text: text.to_string(),
        timestamp: ts,
    }
}

/// A mock platform serving canned history and membership records, with
/// call counters and failure switches.
#[derive(Default)]
struct MockPlatform {
    history: Vec<RawChatMessage>,
    /// keyed by (community_id, user_id)
    members: HashMap<(String, String), CommunityProfile>,
    history_fails: AtomicBool,
    member_fails: AtomicBool,
    history_calls: AtomicUsize,
    member_calls: AtomicUsize,
}

impl MockPlatform {
    fn with_history(history: Vec<RawChatMessage>) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }

    fn with_member(mut self, community_id: &str, user_id: &str, nickname: Option<&str>) -> Self {
        self.members.insert(
            (community_id.to_string(), user_id.to_string()),
            CommunityProfile {
                nickname: nickname.map(|s| s.to_string()),
            },
        );
        self
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn fetch_recent_messages(
        &self,
        _channel: &ChannelRef,
        limit: usize,
    ) -> Result<Vec<RawChatMessage>, Error> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.history_fails.load(Ordering::SeqCst) {
            return Err(Error::Platform("history read refused".into()));
        }
        Ok(self.history.iter().take(limit).cloned().collect())
    }

    async fn fetch_community_member(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<Option<CommunityProfile>, Error> {
        self.member_calls.fetch_add(1, Ordering::SeqCst);
        if self.member_fails.load(Ordering::SeqCst) {
            return Err(Error::Platform("membership lookup refused".into()));
        }
        Ok(self
            .members
            .get(&(community_id.to_string(), user_id.to_string()))
            .cloned())
    }

    async fn send_message(&self, _channel_id: &str, _text: &str) -> Result<(), Error> {
        Ok(())
    }
}

fn usernames(conversation: &[ConversationMessage]) -> Vec<&str> {
    conversation.iter().map(|m| m.username.as_str()).collect()
}

#[tokio::test]
async fn fetch_orders_messages_by_timestamp() -> Result<(), Error> {
    // The platform hands messages back unordered.
    let platform = Arc::new(MockPlatform::with_history(vec![
        raw("1", "carol", None, "third", t(30)),
        raw("2", "dave", None, "first", t(10)),
        raw("3", "erin", None, "second", t(20)),
    ]));
    let service = ContextService::new(platform);

    let conversation = service
        .fetch_conversation(&ChannelRef::direct("42"), 30)
        .await?;

    let texts: Vec<&str> = conversation.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
    assert!(
        conversation.windows(2).all(|w| w[0].timestamp < w[1].timestamp),
        "timestamps must be strictly ascending"
    );
    Ok(())
}

#[tokio::test]
async fn membership_lookups_bounded_by_distinct_authors() -> Result<(), Error> {
    // 30 messages from only 3 distinct authors.
    let mut history = Vec::new();
    for i in 0..30 {
        let author = format!("{}", i % 3);
        history.push(raw(&author, &format!("user{author}"), None, "hi", t(i)));
    }
    let platform = Arc::new(
        MockPlatform::with_history(history)
            .with_member("g1", "0", Some("Zero"))
            .with_member("g1", "1", Some("One"))
            .with_member("g1", "2", Some("Two")),
    );
    let service = ContextService::new(platform.clone());

    let conversation = service
        .fetch_conversation(&ChannelRef::community("42", "g1"), 30)
        .await?;

    assert_eq!(conversation.len(), 30);
    assert!(
        platform.member_calls.load(Ordering::SeqCst) <= 3,
        "membership collaborator must be invoked at most once per distinct author"
    );
    Ok(())
}

#[tokio::test]
async fn resolution_falls_back_without_raising() {
    let platform = Arc::new(MockPlatform::default());
    platform.member_fails.store(true, Ordering::SeqCst);
    let resolver = DisplayNameResolver::new(platform.clone());
    let channel = ChannelRef::community("42", "g1");

    // Lookup fails, global name present => global name.
    let msg = raw("7", "bhandle", Some("Bea"), "hi", t(0));
    assert_eq!(resolver.resolve(&msg, &channel).await, "Bea");

    // Lookup fails, no global name => bare handle.
    let msg = raw("8", "chandle", None, "hi", t(0));
    assert_eq!(resolver.resolve(&msg, &channel).await, "chandle");
}

#[tokio::test]
async fn display_names_cached_per_community() {
    let platform = Arc::new(
        MockPlatform::default()
            .with_member("g1", "7", Some("Knight"))
            .with_member("g2", "7", Some("Rook")),
    );
    let resolver = DisplayNameResolver::new(platform.clone());
    let msg = raw("7", "handle", Some("Global"), "hi", t(0));

    assert_eq!(
        resolver.resolve(&msg, &ChannelRef::community("1", "g1")).await,
        "Knight"
    );
    assert_eq!(
        resolver.resolve(&msg, &ChannelRef::community("2", "g2")).await,
        "Rook"
    );
    // A direct channel has no community nickname tier.
    assert_eq!(
        resolver.resolve(&msg, &ChannelRef::direct("3")).await,
        "Global"
    );

    // Repeat lookups inside the TTL stay local.
    let calls_before = platform.member_calls.load(Ordering::SeqCst);
    resolver.resolve(&msg, &ChannelRef::community("1", "g1")).await;
    resolver.resolve(&msg, &ChannelRef::community("2", "g2")).await;
    assert_eq!(platform.member_calls.load(Ordering::SeqCst), calls_before);
}

#[tokio::test]
async fn end_to_end_three_message_example() -> Result<(), Error> {
    // A (nickname "Al"), B (no nickname, global "Bea"), A again.
    let platform = Arc::new(
        MockPlatform::with_history(vec![
            raw("a", "ahandle", Some("Alice"), "hey", t(0)),
            raw("b", "bhandle", Some("Bea"), "hello", t(1)),
            raw("a", "ahandle", Some("Alice"), "anyone?", t(2)),
        ])
        .with_member("g1", "a", Some("Al"))
        .with_member("g1", "b", None),
    );
    let service = ContextService::new(platform.clone());

    let conversation = service
        .fetch_conversation(&ChannelRef::community("42", "g1"), 30)
        .await?;

    assert_eq!(usernames(&conversation), vec!["Al", "Bea", "Al"]);
    assert_eq!(
        conversation.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(),
        vec!["hey", "hello", "anyone?"]
    );
    assert_eq!(
        platform.member_calls.load(Ordering::SeqCst),
        2,
        "exactly one membership lookup per distinct author"
    );
    Ok(())
}

#[tokio::test]
async fn burst_of_triggers_collapses_to_one_fetch() -> Result<(), Error> {
    let platform = Arc::new(MockPlatform::with_history(vec![raw(
        "1", "ann", None, "hi", t(0),
    )]));
    let service = ContextService::new(platform.clone());
    let channel = ChannelRef::direct("42");

    let first = service.cached_conversation(&channel, 30).await?;
    let second = service.cached_conversation(&channel, 30).await?;

    assert_eq!(first, second);
    assert_eq!(
        platform.history_calls.load(Ordering::SeqCst),
        1,
        "second call inside the TTL window must be served from cache"
    );
    Ok(())
}

#[tokio::test]
async fn stale_entry_triggers_new_fetch() -> Result<(), Error> {
    let platform = Arc::new(MockPlatform::with_history(vec![raw(
        "1", "ann", None, "hi", t(0),
    )]));
    // TTL of zero: every entry is stale by the time it is read.
    let service = ContextService::with_ttl(platform.clone(), 0);
    let channel = ChannelRef::direct("42");

    service.cached_conversation(&channel, 30).await?;
    service.cached_conversation(&channel, 30).await?;

    assert_eq!(platform.history_calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn failed_fetch_is_not_cached() -> Result<(), Error> {
    let platform = Arc::new(MockPlatform::with_history(vec![raw(
        "1", "ann", None, "hi", t(0),
    )]));
    platform.history_fails.store(true, Ordering::SeqCst);
    let service = ContextService::new(platform.clone());
    let channel = ChannelRef::direct("42");

    let err = service.cached_conversation(&channel, 30).await;
    assert!(matches!(err, Err(Error::Fetch(_))));

    // Upstream recovers; the retry must hit it again immediately, not
    // return a cached failure or stale value.
    platform.history_fails.store(false, Ordering::SeqCst);
    let conversation = service.cached_conversation(&channel, 30).await?;
    assert_eq!(conversation.len(), 1);
    assert_eq!(platform.history_calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn fetch_failure_yields_no_partial_result() {
    let platform = Arc::new(MockPlatform::default());
    platform.history_fails.store(true, Ordering::SeqCst);
    let service = ContextService::new(platform.clone());

    let result = service
        .fetch_conversation(&ChannelRef::direct("42"), 30)
        .await;
    assert!(matches!(result, Err(Error::Fetch(_))));
    // No membership lookups happen when the bulk read fails.
    assert_eq!(platform.member_calls.load(Ordering::SeqCst), 0);
}
