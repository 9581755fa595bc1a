use std::io;
use std::time::Duration;

use bytes::Bytes;
use chatbox_model::ErrorKind;
use chatbox_test_model::{PresetReply, TestModelProvider};
use tokio::sync::watch;
use tokio::time::timeout;

use crate::attachment::Attachment;
use crate::conversation::{FAILURE_SENTINEL, RestoreOutcome};
use crate::message::{Entry, Message, Preview};
use crate::store::{HISTORY_KEY, HistoryStore, MemoryStore, StoreError};
use crate::{Session, SessionBuilder};

fn spawn_session(
    provider: TestModelProvider,
    store: MemoryStore,
) -> (Session, watch::Receiver<usize>) {
    let (idle_tx, idle_rx) = watch::channel::<usize>(0);
    let session = SessionBuilder::with_model_provider(provider)
        .with_store(store)
        .on_idle(move || {
            idle_tx.send_modify(|count| *count += 1);
        })
        .build();
    (session, idle_rx)
}

async fn wait_idle(idle_rx: &mut watch::Receiver<usize>, count: usize) {
    timeout(Duration::from_secs(5), idle_rx.wait_for(|n| *n >= count))
        .await
        .unwrap()
        .unwrap();
}

/// A store whose every access fails.
struct BrokenStore;

impl BrokenStore {
    fn error(key: &str) -> StoreError {
        StoreError::new(key, io::Error::other("disk unplugged"))
    }
}

impl HistoryStore for BrokenStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Err(Self::error(key))
    }

    fn save(&self, key: &str, _value: &str) -> Result<(), StoreError> {
        Err(Self::error(key))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        Err(Self::error(key))
    }
}

fn stored(store: &MemoryStore) -> Option<Vec<Message>> {
    store
        .get(HISTORY_KEY)
        .map(|value| serde_json::from_str(&value).unwrap())
}

fn messages(entries: Vec<Entry>) -> Vec<Message> {
    entries
        .into_iter()
        .map(|entry| match entry {
            Entry::Message(msg) => msg,
            other => panic!("unexpected entry: {other:?}"),
        })
        .collect()
}

#[tokio::test]
async fn test_simple_message() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetReply::text("Hi, what can I do for you?"));
    let store = MemoryStore::default();
    let (session, mut idle_rx) = spawn_session(provider.clone(), store.clone());
    assert!(matches!(session.restore_outcome(), RestoreOutcome::Empty));

    session.submit_user_turn("Hello", vec![]).unwrap();
    wait_idle(&mut idle_rx, 1).await;

    let expected = [
        Message::user("Hello"),
        Message::bot("Hi, what can I do for you?"),
    ];
    assert_eq!(messages(session.snapshot().await.unwrap()), expected);
    assert_eq!(stored(&store).unwrap(), expected);
    assert_eq!(provider.received_prompts(), ["Hello"]);
}

#[tokio::test(start_paused = true)]
async fn test_turns_are_queued() {
    let mut provider = TestModelProvider::default();
    provider.set_delay(Duration::from_millis(50));
    provider.add_reply(PresetReply::text("first"));
    provider.add_reply(PresetReply::text("second"));
    provider.add_reply(PresetReply::text("third"));
    let store = MemoryStore::default();
    let (session, mut idle_rx) = spawn_session(provider.clone(), store.clone());

    session.submit_user_turn("one", vec![]).unwrap();
    session.submit_user_turn("two", vec![]).unwrap();
    session.submit_user_turn("three", vec![]).unwrap();
    wait_idle(&mut idle_rx, 1).await;

    let expected = [
        Message::user("one"),
        Message::bot("first"),
        Message::user("two"),
        Message::bot("second"),
        Message::user("three"),
        Message::bot("third"),
    ];
    assert_eq!(messages(session.snapshot().await.unwrap()), expected);
    assert_eq!(stored(&store).unwrap(), expected);
    assert_eq!(provider.received_prompts(), ["one", "two", "three"]);
    assert_eq!(*idle_rx.borrow(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pending_entry_while_waiting() {
    let mut provider = TestModelProvider::default();
    provider.set_delay(Duration::from_secs(1));
    provider.add_reply(PresetReply::text("eventually"));
    let store = MemoryStore::default();
    let (session, mut idle_rx) = spawn_session(provider, store.clone());

    session.submit_user_turn("Hello", vec![]).unwrap();
    let entries = session.snapshot().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(matches!(entries[1], Entry::Pending(_)));
    assert_eq!(stored(&store).unwrap(), [Message::user("Hello")]);

    wait_idle(&mut idle_rx, 1).await;
    assert_eq!(
        messages(session.snapshot().await.unwrap()),
        [Message::user("Hello"), Message::bot("eventually")]
    );
}

#[tokio::test]
async fn test_network_failure() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetReply::failure(ErrorKind::Network));
    let store = MemoryStore::default();
    let (session, mut idle_rx) = spawn_session(provider, store.clone());

    session.submit_user_turn("Hello", vec![]).unwrap();
    wait_idle(&mut idle_rx, 1).await;

    let expected = [Message::user("Hello"), Message::bot(FAILURE_SENTINEL)];
    assert_eq!(messages(session.snapshot().await.unwrap()), expected);
    assert_eq!(stored(&store).unwrap(), expected);
}

#[tokio::test]
async fn test_api_failure() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetReply::api_failure("Invalid API key"));
    let (session, mut idle_rx) =
        spawn_session(provider, MemoryStore::default());

    session.submit_user_turn("Hello", vec![]).unwrap();
    wait_idle(&mut idle_rx, 1).await;

    let entries = session.snapshot().await.unwrap();
    assert_eq!(
        entries.last(),
        Some(&Entry::Message(Message::bot("⚠️ API error: Invalid API key")))
    );
}

#[tokio::test]
async fn test_attachment_only_turn() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetReply::text("Got your report."));
    let store = MemoryStore::default();
    let (session, mut idle_rx) = spawn_session(provider.clone(), store.clone());

    let report = Attachment::new(
        "report.pdf",
        mime::APPLICATION_PDF,
        Bytes::from(vec![0u8; 2048]),
    );
    session.submit_user_turn("  ", vec![report]).unwrap();
    wait_idle(&mut idle_rx, 1).await;

    let summary = "📎 Uploaded: report.pdf (application/pdf, 2 KB)";
    assert_eq!(
        session.snapshot().await.unwrap(),
        [
            Entry::Message(Message::user(summary)),
            Entry::Preview(Preview::Document {
                name: "report.pdf".to_owned()
            }),
            Entry::Message(Message::bot("Got your report.")),
        ]
    );
    assert_eq!(
        stored(&store).unwrap(),
        [Message::user(summary), Message::bot("Got your report.")]
    );
    assert_eq!(provider.received_prompts(), [summary]);
}

#[tokio::test]
async fn test_empty_submission() {
    let provider = TestModelProvider::default();
    let store = MemoryStore::default();
    let (session, mut idle_rx) = spawn_session(provider.clone(), store.clone());

    session.submit_user_turn(" \n ", vec![]).unwrap();
    wait_idle(&mut idle_rx, 1).await;

    assert!(session.snapshot().await.unwrap().is_empty());
    assert_eq!(provider.request_count(), 0);
    assert_eq!(store.get(HISTORY_KEY), None);
}

#[tokio::test]
async fn test_restore_on_build() {
    let store = MemoryStore::default();
    store.insert(
        HISTORY_KEY,
        r#"[{"sender":"user","text":"Hi"},{"sender":"bot","text":"Hello!"}]"#,
    );
    let (session, _idle_rx) =
        spawn_session(TestModelProvider::default(), store);

    assert!(matches!(
        session.restore_outcome(),
        RestoreOutcome::Restored(2)
    ));
    assert_eq!(
        messages(session.snapshot().await.unwrap()),
        [Message::user("Hi"), Message::bot("Hello!")]
    );
}

#[tokio::test]
async fn test_restore_malformed_history() {
    let store = MemoryStore::default();
    store.insert(HISTORY_KEY, "definitely not json");
    let (session, _idle_rx) =
        spawn_session(TestModelProvider::default(), store);

    assert!(matches!(
        session.restore_outcome(),
        RestoreOutcome::Malformed(_)
    ));
    assert!(session.snapshot().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_history() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetReply::text("Hello!"));
    let store = MemoryStore::default();
    let (session, mut idle_rx) = spawn_session(provider, store.clone());

    session.submit_user_turn("Hi", vec![]).unwrap();
    wait_idle(&mut idle_rx, 1).await;
    assert!(store.get(HISTORY_KEY).is_some());

    session.clear_history().unwrap();
    assert!(session.snapshot().await.unwrap().is_empty());
    assert_eq!(store.get(HISTORY_KEY), None);

    let (restored, _idle_rx) =
        spawn_session(TestModelProvider::default(), store);
    assert!(matches!(restored.restore_outcome(), RestoreOutcome::Empty));
    assert!(restored.snapshot().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clear_while_waiting() {
    let mut provider = TestModelProvider::default();
    provider.set_delay(Duration::from_millis(100));
    provider.add_reply(PresetReply::text("too late"));
    provider.add_reply(PresetReply::text("on time"));
    let store = MemoryStore::default();
    let (session, mut idle_rx) = spawn_session(provider, store.clone());

    session.submit_user_turn("first", vec![]).unwrap();
    session.clear_history().unwrap();
    session.submit_user_turn("second", vec![]).unwrap();
    wait_idle(&mut idle_rx, 1).await;

    // The reply of the cleared turn is discarded, the queued turn still
    // runs afterwards.
    let expected = [Message::user("second"), Message::bot("on time")];
    assert_eq!(messages(session.snapshot().await.unwrap()), expected);
    assert_eq!(stored(&store).unwrap(), expected);
}

#[tokio::test]
async fn test_dropped_handle_still_resolves() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetReply::text("Bye!"));
    let store = MemoryStore::default();
    let (session, mut idle_rx) = spawn_session(provider, store.clone());

    session.submit_user_turn("Goodbye", vec![]).unwrap();
    drop(session);
    wait_idle(&mut idle_rx, 1).await;

    assert_eq!(
        stored(&store).unwrap(),
        [Message::user("Goodbye"), Message::bot("Bye!")]
    );
}

#[tokio::test]
async fn test_broken_store() {
    let mut provider = TestModelProvider::default();
    provider.add_reply(PresetReply::text("Still here."));
    let (idle_tx, mut idle_rx) = watch::channel::<usize>(0);
    let session = SessionBuilder::with_model_provider(provider)
        .with_store(BrokenStore)
        .on_idle(move || {
            idle_tx.send_modify(|count| *count += 1);
        })
        .build();

    match session.restore_outcome() {
        RestoreOutcome::Unavailable(err) => assert_eq!(err.key(), HISTORY_KEY),
        other => panic!("unexpected restore outcome: {other:?}"),
    }
    assert!(session.snapshot().await.unwrap().is_empty());

    // Failed writes are logged, the turn still resolves.
    session.submit_user_turn("Hello", vec![]).unwrap();
    wait_idle(&mut idle_rx, 1).await;
    assert_eq!(
        messages(session.snapshot().await.unwrap()),
        [Message::user("Hello"), Message::bot("Still here.")]
    );

    session.clear_history().unwrap();
    assert!(session.snapshot().await.unwrap().is_empty());
}
