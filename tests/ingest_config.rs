// tests/ingest_config.rs
use std::{env, fs};

use telegram_scraper::ingest::config::{
    load_channels_default, load_channels_from, DEFAULT_CHANNELS, ENV_CHANNELS_PATH,
};
use telegram_scraper::Source;

fn names(v: &[Source]) -> Vec<&str> {
    v.iter().map(Source::as_str).collect()
}

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("channels.toml");
    fs::write(
        &p_toml,
        r#"
channels = [" https://t.me/yetenaweg ", "", "https://t.me/EAHCI", "https://t.me/yetenaweg"]
"#,
    )
    .unwrap();
    let v = load_channels_from(&p_toml).unwrap();
    assert_eq!(
        names(&v),
        vec![
            "https://t.me/yetenaweg",
            "https://t.me/EAHCI",
            "https://t.me/yetenaweg"
        ]
    );

    let p_json = dir.path().join("channels.json");
    fs::write(&p_json, r#"["@CheMed123"," DoctorsET  ", ""]"#).unwrap();
    let vj = load_channels_from(&p_json).unwrap();
    assert_eq!(names(&vj), vec!["@CheMed123", "DoctorsET"]);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_channels_from(&dir.path().join("nope.toml")).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Run inside a temp CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var(ENV_CHANNELS_PATH);

    // 1) Nothing configured -> built-in list
    let v = load_channels_default().unwrap();
    assert_eq!(names(&v), DEFAULT_CHANNELS.to_vec());

    // 2) Fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("channels.toml"),
        r#"channels = ["https://t.me/EAHCI"]"#,
    )
    .unwrap();
    let vt = load_channels_default().unwrap();
    assert_eq!(names(&vt), vec!["https://t.me/EAHCI"]);

    // 3) Env wins over fallbacks
    let p_env = tmp.path().join("mine.json");
    fs::write(&p_env, r#"["@lobelia4cosmetics"]"#).unwrap();
    env::set_var(ENV_CHANNELS_PATH, p_env.display().to_string());
    let ve = load_channels_default().unwrap();
    assert_eq!(names(&ve), vec!["@lobelia4cosmetics"]);

    // 4) Env pointing nowhere is an error, not a silent fallback
    env::set_var(ENV_CHANNELS_PATH, tmp.path().join("missing.json"));
    assert!(load_channels_default().is_err());
    env::remove_var(ENV_CHANNELS_PATH);

    env::set_current_dir(&old).unwrap();
}
