use bext_core::{default_log_level, logging_status};
use bext_ffi::init_extension_logging_from;

fn only(name: &'static str, value: String) -> impl Fn(&str) -> Option<String> {
    move |key| (key == name).then(|| value.clone())
}

#[test]
fn entry_point_feeds_environment_config_into_logging() {
    let log_dir = tempfile::tempdir().expect("temp dir");
    let log_dir_str = log_dir.path().to_str().expect("utf-8 temp dir");

    let error =
        init_extension_logging_from(only("BEXT_MAX_DATA_PATH_UNITS", "0".into()), log_dir_str)
            .expect_err("invalid config must fail before logging starts");
    assert!(error.contains("max_data_path_units"));
    assert!(logging_status().is_none());

    let config =
        init_extension_logging_from(only("BEXT_MAX_DATA_PATH_UNITS", "260".into()), log_dir_str)
            .expect("unset level falls back to the default");
    assert_eq!(config.max_data_path_units, 260);
    assert_eq!(config.log_level, None);
    let (active_level, active_dir) = logging_status().expect("logging should be active");
    assert_eq!(active_level, default_log_level());
    assert_eq!(active_dir, log_dir.path());

    let same_level = default_log_level().to_ascii_uppercase();
    let config = init_extension_logging_from(only("BEXT_LOG_LEVEL", same_level.clone()), log_dir_str)
        .expect("explicit matching level is idempotent");
    assert_eq!(config.log_level, Some(same_level));

    let error = init_extension_logging_from(only("BEXT_LOG_LEVEL", "error".into()), log_dir_str)
        .expect_err("explicit different level must be rejected");
    assert!(error.contains("refusing to switch"));
}
