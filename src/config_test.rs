use super::*;

fn config() -> SessionConfig {
    SessionConfig::new("https://id.example.com", "acme", "web")
}

// =============================================================
// Defaults and JSON parsing
// =============================================================

#[test]
fn defaults_match_documented_constants() {
    let cfg = SessionConfig::default();
    assert_eq!(cfg.realm, DEFAULT_REALM);
    assert_eq!(cfg.login_path, "/login");
    assert_eq!(cfg.logout_path, "/logout");
    assert_eq!(cfg.register_path, "/register");
    assert_eq!(cfg.account_path, "/account");
    assert!(!cfg.offline);
    assert_eq!(cfg.append_path, AppendPath::Flag(true));
    assert!(cfg.client_id.is_none());
}

#[test]
fn from_json_reads_camel_case_keys_and_fills_defaults() {
    let cfg = SessionConfig::from_json(
        r#"{"url": "https://id.example.com/", "clientId": "web", "offline": true, "appendPath": "/sso"}"#,
    )
    .unwrap();
    assert_eq!(cfg.client_id.as_deref(), Some("web"));
    assert_eq!(cfg.realm, "master");
    assert!(cfg.offline);
    assert_eq!(cfg.append_path, AppendPath::Custom("/sso".to_owned()));
    assert_eq!(cfg.provider_url(), "https://id.example.com/sso");
}

#[test]
fn from_json_accepts_boolean_append_path() {
    let cfg = SessionConfig::from_json(r#"{"url": "https://id.example.com", "appendPath": false}"#).unwrap();
    assert_eq!(cfg.append_path, AppendPath::Flag(false));
}

#[test]
fn from_json_rejects_malformed_document() {
    let err = SessionConfig::from_json("{").unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig(_)));
}

#[test]
fn missing_or_blank_client_id_is_rejected() {
    let mut cfg = config();
    cfg.client_id = None;
    assert_eq!(cfg.require_client_id(), Err(SessionError::MissingClientId));
    cfg.client_id = Some("  ".to_owned());
    assert_eq!(cfg.require_client_id(), Err(SessionError::MissingClientId));
}

// =============================================================
// URL normalization
// =============================================================

#[test]
fn normalize_appends_default_sub_path() {
    assert_eq!(normalize_url("https://id.example.com", &AppendPath::Flag(true)), "https://id.example.com/auth");
    assert_eq!(normalize_url("https://id.example.com/", &AppendPath::Flag(true)), "https://id.example.com/auth");
}

#[test]
fn normalize_appends_custom_sub_path_and_strips_trailing_separators() {
    assert_eq!(
        normalize_url("https://id.example.com/", &AppendPath::Custom("/kc//".to_owned())),
        "https://id.example.com/kc"
    );
}

#[test]
fn normalize_without_append_only_strips_separators() {
    assert_eq!(normalize_url("https://id.example.com///", &AppendPath::Flag(false)), "https://id.example.com");
    assert_eq!(normalize_url("https://id.example.com", &AppendPath::Custom(String::new())), "https://id.example.com");
}

#[test]
fn runtime_script_url_hangs_off_provider_url() {
    assert_eq!(config().runtime_script_url(), "https://id.example.com/auth/js/keycloak.js");
}

// =============================================================
// Offline scope
// =============================================================

#[test]
fn offline_scope_without_caller_scope() {
    assert_eq!(append_offline_scope(None), "offline_access");
    assert_eq!(append_offline_scope(Some("")), "offline_access");
}

#[test]
fn offline_scope_appends_to_caller_scope() {
    assert_eq!(append_offline_scope(Some("profile")), "profile offline_access");
}

#[test]
fn offline_scope_is_not_duplicated() {
    assert_eq!(append_offline_scope(Some("profile offline_access")), "profile offline_access");
}

// =============================================================
// Client option merge priority
// =============================================================

#[test]
fn client_options_endpoint_fields_cannot_be_overridden() {
    let mut cfg = config();
    cfg.keycloak_options.insert("realm".to_owned(), Value::from("other"));
    cfg.keycloak_options.insert("clientId".to_owned(), Value::from("other"));
    let opts = cfg.client_options(None).unwrap();
    assert_eq!(opts["url"], "https://id.example.com/auth");
    assert_eq!(opts["realm"], "acme");
    assert_eq!(opts["clientId"], "web");
}

#[test]
fn client_options_offline_scope_with_and_without_caller_scope() {
    let mut cfg = config();
    cfg.offline = true;
    assert_eq!(cfg.client_options(None).unwrap()["scope"], "offline_access");

    cfg.keycloak_options.insert("scope".to_owned(), Value::from("profile"));
    assert_eq!(cfg.client_options(None).unwrap()["scope"], "profile offline_access");
}

#[test]
fn client_options_without_offline_leave_scope_alone() {
    let mut cfg = config();
    assert!(!cfg.client_options(None).unwrap().contains_key("scope"));
    cfg.keycloak_options.insert("scope".to_owned(), Value::from("email"));
    assert_eq!(cfg.client_options(None).unwrap()["scope"], "email");
}

#[test]
fn stashed_tokens_only_fill_gaps() {
    let mut cfg = config();
    cfg.keycloak_options.insert("token".to_owned(), Value::from("fresh"));
    let stashed = TokenSnapshot {
        token: Some("stale".to_owned()),
        refresh_token: Some("refresh".to_owned()),
        id_token: None,
    };
    let opts = cfg.client_options(Some(&stashed)).unwrap();
    assert_eq!(opts["token"], "fresh");
    assert_eq!(opts["refreshToken"], "refresh");
    assert!(!opts.contains_key("idToken"));
}

#[test]
fn client_options_require_client_id() {
    let mut cfg = config();
    cfg.client_id = None;
    assert_eq!(cfg.client_options(None), Err(SessionError::MissingClientId));
}

// =============================================================
// Init options, paths, bootstrap key
// =============================================================

#[test]
fn init_options_inject_silent_sso_default_unless_overridden() {
    let mut cfg = config();
    let opts = cfg.init_options(Some("https://app.example.com/"));
    assert_eq!(opts["silentCheckSsoRedirectUri"], "https://app.example.com/silent-check-sso.html");

    cfg.init_options.insert("silentCheckSsoRedirectUri".to_owned(), Value::from("https://x/y.html"));
    assert_eq!(cfg.init_options(Some("https://app.example.com"))["silentCheckSsoRedirectUri"], "https://x/y.html");
}

#[test]
fn init_options_without_origin_pass_through() {
    let mut cfg = config();
    cfg.init_options.insert("onLoad".to_owned(), Value::from("check-sso"));
    let opts = cfg.init_options(None);
    assert_eq!(opts.len(), 1);
    assert_eq!(opts["onLoad"], "check-sso");
}

#[test]
fn paths_follow_configuration() {
    let mut cfg = config();
    cfg.login_path = "/signin".to_owned();
    let paths = cfg.paths();
    assert_eq!(paths.login, "/signin");
    assert_eq!(paths.logout, DEFAULT_LOGOUT_PATH);
}

#[test]
fn bootstrap_key_changes_with_endpoint_fields() {
    let a = config();
    let mut b = config();
    assert_eq!(a.bootstrap_key(), b.bootstrap_key());
    b.realm = "other".to_owned();
    assert_ne!(a.bootstrap_key(), b.bootstrap_key());
}
