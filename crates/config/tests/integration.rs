//! Integration tests for config

#[cfg(test)]
mod tests {
    use pkgjob_config::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 6] = [
        "PKGJOB_ARCHIVE_DIR",
        "PKGJOB_LOCK_ATTEMPTS",
        "PKGJOB_LOCK_RETRY_MS",
        "PKGJOB_INSTALL_RECOMMENDS",
        "PKGJOB_AUTOREMOVE",
        "PKGJOB_NATIVE_ARCH",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[paths]
archive_dir = "/srv/archives"

[lock]
attempts = 3

[resolver]
install_recommends = false
autoremove = true
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.archive_dir(), PathBuf::from("/srv/archives"));
        assert_eq!(config.archive_lock(), PathBuf::from("/srv/archives/lock"));
        assert_eq!(config.lock.attempts, 3);
        // unset fields keep their defaults
        assert_eq!(config.lock.retry_delay_ms, 1000);
        assert!(!config.resolver.install_recommends);
        assert!(config.resolver.autoremove);
        assert!(config.network.fetch_changelogs);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = Config::load_from_file(std::path::Path::new("/nonexistent/pkgjob.toml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[lock\nattempts = ").unwrap();
        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.archive_dir(), PathBuf::from("/var/cache/apt/archives"));
        assert_eq!(config.restart_marker(), PathBuf::from("/var/run/reboot-required"));
        assert_eq!(config.lock.attempts, 10);
        assert_eq!(config.lock_retry_delay(), Duration::from_secs(1));
        assert!(!config.resolver.native_arch.is_empty());
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("PKGJOB_ARCHIVE_DIR", "/tmp/archives");
        std::env::set_var("PKGJOB_LOCK_ATTEMPTS", "2");
        std::env::set_var("PKGJOB_AUTOREMOVE", "yes");
        std::env::set_var("PKGJOB_NATIVE_ARCH", "riscv64");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.archive_dir(), PathBuf::from("/tmp/archives"));
        assert_eq!(config.lock.attempts, 2);
        assert!(config.resolver.autoremove);
        assert_eq!(config.resolver.native_arch, "riscv64");

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("PKGJOB_LOCK_ATTEMPTS", "0");
        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
        std::env::set_var("PKGJOB_INSTALL_RECOMMENDS", "sometimes");
        let mut config = Config::default();
        let err = config.merge_env().unwrap_err();
        assert!(err.to_string().contains("PKGJOB_INSTALL_RECOMMENDS"));

        clear_env();
    }
}
