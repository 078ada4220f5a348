mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedProvider, SilentProvider};
use llm_chat::chat::{ChatMessage, ChatProvider, ChatRole};
use llm_chat::error::LLMError;
use llm_chat::conversation::{HistoryStore, Session, Transcript, SEED_FILE_NAME};
use llm_chat::session::SessionRegistry;
use llm_chat::ui::{self, Rendered, ERROR_PREFIX};

fn provider(p: &Arc<ScriptedProvider>) -> Arc<dyn ChatProvider> {
    p.clone()
}

#[tokio::test]
async fn each_turn_appends_user_then_assistant() {
    let dir = tempfile::tempdir().unwrap();
    let stub = ScriptedProvider::echo();
    let mut session = Session::start(provider(&stub), HistoryStore::new(dir.path())).unwrap();

    for n in 0..5 {
        let reply = session.send(&format!("question {n}")).await.unwrap();
        assert_eq!(reply, format!("echo: question {n}"));
    }

    let messages = session.transcript().messages();
    assert_eq!(messages.len(), 10);
    for (i, pair) in messages.chunks(2).enumerate() {
        assert_eq!(pair[0].role, ChatRole::User);
        assert_eq!(pair[0].content, format!("question {i}"));
        assert_eq!(pair[1].role, ChatRole::Assistant);
        assert_eq!(pair[1].content, format!("echo: question {i}"));
    }
}

#[tokio::test]
async fn provider_receives_whole_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let stub = ScriptedProvider::with_script(vec![Ok("one"), Ok("two")]);
    let mut session = Session::start(provider(&stub), HistoryStore::new(dir.path())).unwrap();

    session.send("a").await.unwrap();
    session.send("b").await.unwrap();

    let calls = stub.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], vec![ChatMessage::user().content("a").build()]);
    assert_eq!(
        calls[1],
        vec![
            ChatMessage::user().content("a").build(),
            ChatMessage::assistant().content("one").build(),
            ChatMessage::user().content("b").build(),
        ]
    );
}

#[tokio::test]
async fn seeded_transcript_is_kept_as_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let seed = r#"[
  {"role": "user", "content": "Hello \"there\"\nsecond line"},
  {"role": "assistant", "content": "Hi ✨"}
]"#;
    fs::write(dir.path().join(SEED_FILE_NAME), seed).unwrap();
    let loaded = Transcript::load(dir.path().join(SEED_FILE_NAME)).unwrap();

    let stub = ScriptedProvider::with_script(vec![Ok("reply")]);
    let mut session = Session::start(provider(&stub), HistoryStore::new(dir.path())).unwrap();
    session.send("next").await.unwrap();

    let messages = session.transcript().messages();
    assert_eq!(messages.len(), loaded.len() + 2);
    assert_eq!(&messages[..loaded.len()], loaded.messages());
    assert_eq!(messages[0].content, "Hello \"there\"\nsecond line");
    assert_eq!(messages[1].content, "Hi ✨");
    assert_eq!(messages[2], ChatMessage::user().content("next").build());
    assert_eq!(messages[3], ChatMessage::assistant().content("reply").build());
    assert_eq!(stub.calls()[0].len(), 3);
}

#[tokio::test]
async fn failed_turn_keeps_only_the_user_entry() {
    let dir = tempfile::tempdir().unwrap();
    let stub = ScriptedProvider::with_script(vec![Ok("fine"), Err("quota exhausted")]);
    let mut session = Session::start(provider(&stub), HistoryStore::new(dir.path())).unwrap();

    session.send("first").await.unwrap();
    let before = session.transcript().len();

    let rendered = ui::respond(&mut session, "second").await;
    assert!(rendered.is_error());
    assert!(rendered.text().starts_with(ERROR_PREFIX), "{}", rendered.text());
    assert!(rendered.text().contains("quota exhausted"));

    let messages = session.transcript().messages();
    assert_eq!(messages.len(), before + 1);
    assert_eq!(messages.last().unwrap(), &ChatMessage::user().content("second").build());

    // the session keeps going after a failure
    let rendered = ui::respond(&mut session, "third").await;
    assert_eq!(rendered, Rendered::Reply("echo: third".to_string()));
    assert_eq!(session.transcript().len(), before + 3);
}

#[tokio::test]
async fn saved_transcript_seeds_the_next_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path());
    let stub = ScriptedProvider::echo();

    let mut first = Session::start(provider(&stub), store.clone()).unwrap();
    first.send("remember me").await.unwrap();
    first.send("and this").await.unwrap();
    let saved = first.finish().unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&saved).unwrap()).unwrap();
    assert!(value.is_array());
    assert_eq!(value.as_array().unwrap().len(), 4);

    fs::copy(&saved, store.seed_path()).unwrap();
    let second = Session::start(provider(&stub), store).unwrap();
    assert_eq!(second.transcript(), first.transcript());
}

#[tokio::test]
async fn finishing_twice_writes_two_files() {
    let dir = tempfile::tempdir().unwrap();
    let stub = ScriptedProvider::echo();
    let mut session = Session::start(provider(&stub), HistoryStore::new(dir.path())).unwrap();
    session.send("x").await.unwrap();

    let a = session.finish().unwrap();
    let b = session.finish().unwrap();
    assert_ne!(a, b);
    assert!(a.exists() && b.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_sessions_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path());
    let stub = ScriptedProvider::echo();
    let registry = SessionRegistry::new();

    let a = registry
        .open(Session::start(provider(&stub), store.clone()).unwrap())
        .await;
    let b = registry
        .open(Session::start(provider(&stub), store.clone()).unwrap())
        .await;
    assert_ne!(a, b);

    let run = |id: uuid::Uuid, tag: &'static str| {
        let registry = registry.clone();
        tokio::spawn(async move {
            for n in 0..10 {
                let session = registry.get(&id).await.unwrap();
                let mut session = session.lock().await;
                session.send(&format!("{tag}-{n}")).await.unwrap();
            }
        })
    };
    let (ra, rb) = tokio::join!(run(a, "alpha"), run(b, "beta"));
    ra.unwrap();
    rb.unwrap();

    for (id, tag, other) in [(a, "alpha", "beta"), (b, "beta", "alpha")] {
        let session = registry.get(&id).await.unwrap();
        let session = session.lock().await;
        let messages = session.transcript().messages();
        assert_eq!(messages.len(), 20);
        assert!(messages.iter().all(|m| m.content.contains(tag)));
        assert!(messages.iter().all(|m| !m.content.contains(other)));
    }

    // every request the provider saw belonged to exactly one session
    for call in stub.calls() {
        let alpha = call.iter().any(|m| m.content.contains("alpha"));
        let beta = call.iter().any(|m| m.content.contains("beta"));
        assert!(alpha ^ beta);
    }

    let saved = registry.close_all().await;
    assert_eq!(saved.len(), 2);
    assert!(registry.is_empty().await);
    assert!(registry.close(&a).await.unwrap().is_none());
}

#[tokio::test]
async fn reply_without_text_is_a_failed_turn() {
    let dir = tempfile::tempdir().unwrap();
    let mut session =
        Session::start(Arc::new(SilentProvider), HistoryStore::new(dir.path())).unwrap();

    let err = session.send("hello").await.unwrap_err();
    assert!(matches!(err, LLMError::ProviderError(ref m) if m == "empty response"));

    let messages = session.transcript().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0], ChatMessage::user().content("hello").build());

    let rendered = ui::respond(&mut session, "again").await;
    assert!(rendered.is_error());
    assert!(rendered.text().starts_with(ERROR_PREFIX));
    assert_eq!(session.transcript().len(), 2);
}

#[tokio::test]
async fn closed_session_takes_no_more_turns() {
    let dir = tempfile::tempdir().unwrap();
    let stub = ScriptedProvider::echo();
    let registry = SessionRegistry::new();
    let session = Session::start(provider(&stub), HistoryStore::new(dir.path())).unwrap();
    let id = registry.open(session).await;

    // A handler that looked the session up before it was ended.
    let handle = registry.get(&id).await.unwrap();
    handle.lock().await.send("first").await.unwrap();

    let saved = registry.close(&id).await.unwrap().unwrap();
    assert!(registry.get(&id).await.is_none());

    let mut session = handle.lock().await;
    assert!(session.is_closed());
    let err = session.send("too late").await.unwrap_err();
    assert!(matches!(err, LLMError::InvalidRequest(_)));
    assert_eq!(session.transcript().len(), 2);
    assert_eq!(stub.calls().len(), 1);

    assert_eq!(Transcript::load(&saved).unwrap(), *session.transcript());
}

#[tokio::test]
async fn idle_sessions_are_saved_and_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let stub = ScriptedProvider::echo();
    let store = HistoryStore::new(dir.path());
    let registry = SessionRegistry::new();
    let busy = registry
        .open(Session::start(provider(&stub), store.clone()).unwrap())
        .await;
    let quiet = registry
        .open(Session::start(provider(&stub), store.clone()).unwrap())
        .await;

    assert!(registry.expire_idle(Duration::from_secs(3600)).await.is_empty());
    assert_eq!(registry.len().await, 2);

    // A session whose lock is held is mid-turn and must survive the sweep.
    let busy_handle = registry.get(&busy).await.unwrap();
    let guard = busy_handle.lock().await;
    let saved = registry.expire_idle(Duration::ZERO).await;
    assert_eq!(saved.len(), 1);
    assert!(registry.get(&quiet).await.is_none());
    assert!(registry.get(&busy).await.is_some());
    drop(guard);

    let saved = registry.expire_idle(Duration::ZERO).await;
    assert_eq!(saved.len(), 1);
    assert!(registry.is_empty().await);
    assert!(busy_handle.lock().await.is_closed());
}
