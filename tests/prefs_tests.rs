// Tests for the live-updating settings signal.

use voxnote::{Settings, SettingsStore, TranscriptionQuality};

#[tokio::test]
async fn test_defaults() {
    let store = SettingsStore::default();
    let settings = store.get();

    assert!(settings.notifications_enabled);
    assert!(settings.auto_save_enabled);
    assert_eq!(
        settings.transcription_quality,
        TranscriptionQuality::Balanced
    );
}

#[tokio::test]
async fn test_update_notifies_subscribers() {
    let store = SettingsStore::new(Settings::default());
    let mut rx = store.subscribe();

    store.update(|s| {
        s.notifications_enabled = false;
        s.transcription_quality = TranscriptionQuality::Accurate;
    });

    rx.changed().await.expect("change notification");
    let current = rx.borrow().clone();
    assert!(!current.notifications_enabled);
    assert_eq!(
        current.transcription_quality,
        TranscriptionQuality::Accurate
    );
}

#[tokio::test]
async fn test_subscribers_reread_instead_of_caching() {
    let store = SettingsStore::new(Settings::default());
    let rx = store.subscribe();

    store.update(|s| s.auto_save_enabled = false);
    store.update(|s| s.auto_save_enabled = true);

    // A late reader sees the latest value, not an intermediate one.
    assert!(rx.borrow().auto_save_enabled);
    assert!(store.get().auto_save_enabled);
}
