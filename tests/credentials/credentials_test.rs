//! Coverage for credential loading and lookup.

use std::collections::BTreeMap;
use std::fs;

use tandem::credentials::{load_credentials, Credentials, GEMINI_API_KEY, OPENAI_API_KEY};

#[test]
fn loads_env_file_credentials() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let env_path = tmp.path().join(".env");
    let write = fs::write(
        &env_path,
        "# study keys\nGEMINI_API_KEY=gem-123\nOPENAI_API_KEY=\"sk-quoted\"\n",
    );
    assert!(write.is_ok());

    let credentials = match load_credentials(&env_path) {
        Ok(credentials) => credentials,
        Err(err) => panic!("credentials should load: {err}"),
    };
    assert_eq!(credentials.get(GEMINI_API_KEY).as_deref(), Some("gem-123"));
    assert_eq!(
        credentials.get(OPENAI_API_KEY).as_deref(),
        Some("sk-quoted")
    );
}

#[test]
fn missing_env_file_yields_empty_credentials() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let loaded = load_credentials(&tmp.path().join(".env"));
    assert!(loaded.is_ok());
    if let Ok(credentials) = loaded {
        assert!(!credentials.has("TANDEM_TEST_NEVER_SET_KEY"));
    }
}

#[test]
fn map_lookup_ignores_unknown_keys() {
    let credentials = Credentials::from_map(BTreeMap::from([(
        GEMINI_API_KEY.to_owned(),
        "gem-abc".to_owned(),
    )]));
    assert!(credentials.has(GEMINI_API_KEY));
    assert_eq!(credentials.get("TANDEM_TEST_OTHER_KEY"), None);
}

#[test]
fn map_without_env_fallback_ignores_process_env() {
    // PATH is set in every test environment.
    let credentials = Credentials::default();
    assert!(!credentials.has("PATH"));
    assert!(credentials.with_process_env().has("PATH"));
}
