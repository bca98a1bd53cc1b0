use std::path::{Path, PathBuf};

use figment::Jail;
use semsearch_core::config::{resolve_with_base, Config, Settings};

#[test]
fn defaults_apply_without_any_config_file() {
    Jail::expect_with(|_jail| {
        let settings = Config::load_for_env("dev").map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.search.top_k, 5);
        assert_eq!(settings.data.documents_path, "data/documents.json");
        Ok(())
    });
}

#[test]
fn env_file_overrides_base_file_and_env_vars_override_both() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            [search]
            top_k = 7
            [data]
            index_path = "base.bin"
            "#,
        )?;
        jail.create_file(
            "config.prod.toml",
            r#"
            [data]
            index_path = "prod.bin"
            "#,
        )?;
        jail.set_env("APP_SEARCH__TOP_K", "9");

        let config = Config::load_for_env("prod").map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.data.index_path, "prod.bin");
        assert_eq!(settings.search.top_k, 9);
        assert_eq!(config.get::<usize>("search.min_query_chars").map_err(|e| e.to_string())?, 3);
        Ok(())
    });
}

#[test]
fn zero_top_k_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[search]\ntop_k = 0\n")?;
        assert!(Config::load_for_env("test").is_err());
        Ok(())
    });
}

#[test]
fn resolve_with_base_keeps_absolute_paths() {
    let base = Path::new("/srv/semsearch");
    assert_eq!(resolve_with_base(base, "data/documents.json"), PathBuf::from("/srv/semsearch/data/documents.json"));
    assert_eq!(resolve_with_base(base, "/abs/index.bin"), PathBuf::from("/abs/index.bin"));
}

#[test]
fn caller_assembled_figment_is_read_through_the_same_accessors() {
    use figment::providers::{Format, Serialized, Toml};
    use figment::Figment;

    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::string("[search]\ntop_k = 12\n[model]\nuse_fake = true"));
    let config = Config::from_figment(figment);

    assert_eq!(config.get::<usize>("search.top_k").unwrap(), 12);
    let settings = config.settings().unwrap();
    assert!(settings.model.use_fake);
    assert_eq!(settings.search.min_query_chars, 3);
}
