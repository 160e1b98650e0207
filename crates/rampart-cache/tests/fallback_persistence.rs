//! Fallback-mode persistence across facade restarts.

use std::time::Duration;

use rampart_cache::{CacheConfig, CacheFacade};

fn config_at(path: std::path::PathBuf) -> CacheConfig {
    CacheConfig {
        redis_url: None,
        persist_path: path,
        ..CacheConfig::default()
    }
}

#[tokio::test]
async fn fallback_store_survives_facade_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");

    {
        let cache = CacheFacade::new(config_at(path.clone())).unwrap();
        cache.set("session:count", &7u32, None).await.unwrap();
        cache
            .set("user:profile:1", &"ada", Some(Duration::from_secs(3600)))
            .await
            .unwrap();
    }

    // A new facade over the same file sees the previous state, including TTLs.
    let cache = CacheFacade::new(config_at(path)).unwrap();
    assert_eq!(cache.get::<u32>("session:count").await.unwrap(), 7);
    assert_eq!(cache.get::<String>("user:profile:1").await.unwrap(), "ada");
    assert!(cache.ttl("user:profile:1").await.unwrap().is_some());
}

#[tokio::test]
async fn expired_entries_do_not_resurrect_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");

    {
        let cache = CacheFacade::new(config_at(path.clone())).unwrap();
        cache
            .set("ephemeral", &1u32, Some(Duration::from_millis(30)))
            .await
            .unwrap();
    }

    tokio::time::sleep(Duration::from_millis(80)).await;

    let cache = CacheFacade::new(config_at(path)).unwrap();
    assert!(
        cache
            .get::<u32>("ephemeral")
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(!cache.exists("ephemeral").await.unwrap());
}
