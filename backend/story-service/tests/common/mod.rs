//! Shared fixtures for integration tests
//!
//! Everything runs against the in-memory stores, so no database or Redis
//! is needed. Collaborators that talk to other services are replaced by
//! recording fakes.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use story_service::clients::{MediaUploader, NotificationKind, Notifier, StaticProfileLookup};
use story_service::config::RankingConfig;
use story_service::handlers::{AppState, Backends};
use story_service::middleware::JwtValidator;
use story_service::Result;

pub const TEST_SECRET: &str = "integration-test-secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub receiver_id: String,
    pub sender_id: String,
    pub story_id: Uuid,
    pub kind: NotificationKind,
}

/// Notifier that remembers every notification it was asked to send
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentNotification>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        receiver_id: &str,
        sender_id: &str,
        story_id: Uuid,
        kind: NotificationKind,
    ) -> Result<()> {
        self.sent.lock().unwrap().push(SentNotification {
            receiver_id: receiver_id.to_string(),
            sender_id: sender_id.to_string(),
            story_id,
            kind,
        });
        Ok(())
    }
}

/// Uploader that "hosts" files under a fake CDN prefix
#[derive(Clone, Default)]
pub struct FakeUploader {
    uploaded: Arc<Mutex<Vec<String>>>,
}

impl FakeUploader {
    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaUploader for FakeUploader {
    async fn upload(&self, file_name: &str, _bytes: Vec<u8>) -> Result<String> {
        self.uploaded.lock().unwrap().push(file_name.to_string());
        Ok(format!("https://cdn.test/{file_name}"))
    }
}

/// Wired application state plus handles on the fakes behind it
pub struct TestHarness {
    pub state: AppState,
    pub notifier: RecordingNotifier,
    pub uploader: FakeUploader,
}

pub fn harness() -> TestHarness {
    harness_with_limits(RankingConfig::default())
}

pub fn harness_with_limits(limits: RankingConfig) -> TestHarness {
    let notifier = RecordingNotifier::default();
    let uploader = FakeUploader::default();

    let mut backends: Backends = story_service::memory_backends();
    backends.notifier = Arc::new(notifier.clone());
    backends.uploader = Arc::new(uploader.clone());
    backends.profiles = Arc::new(
        StaticProfileLookup::new()
            .with_profile("alice", Some("https://img.test/alice.png"))
            .with_profile("bob", None)
            .with_profile("carol", None),
    );

    TestHarness {
        state: AppState::new(backends, limits),
        notifier,
        uploader,
    }
}

pub fn validator() -> Arc<JwtValidator> {
    Arc::new(JwtValidator::new(TEST_SECRET))
}

pub fn bearer(user: &str) -> String {
    let token = validator().issue(user, 3600).unwrap();
    format!("Bearer {token}")
}
