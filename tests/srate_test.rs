use anyhow::Result;
use xdf_segment_toolbox::config::ToolConfig;
use xdf_segment_toolbox::srate::{expected_sampling_rate, reconcile, RateOracle, RateRule, RateSource};

#[test]
fn test_expected_rates_by_type() {
    assert_eq!(expected_sampling_rate("EDA-left"), Some(15.0));
    assert_eq!(expected_sampling_rate("eda"), Some(15.0));
    assert_eq!(expected_sampling_rate("ACC"), Some(25.0));
    assert_eq!(expected_sampling_rate("wrist_gyro"), Some(25.0));
    assert_eq!(expected_sampling_rate("MAG"), Some(25.0));
    assert_eq!(expected_sampling_rate("PPG"), Some(25.0));
    assert_eq!(expected_sampling_rate("Temp"), Some(7.0));
    assert_eq!(expected_sampling_rate("UNKNOWN"), None);
    assert_eq!(expected_sampling_rate(""), None);
}

#[test]
fn test_first_matching_pattern_wins() {
    // ACC is checked before EDA
    assert_eq!(expected_sampling_rate("ACC_EDA"), Some(25.0));
    assert_eq!(expected_sampling_rate("TEMP_EDA"), Some(7.0));
}

#[test]
fn test_expected_rate_overrides_declared_with_notice() {
    let resolution = reconcile(Some(10.0), Some(15.0)).expect("rate");
    assert_eq!(resolution.rate, 15.0);
    assert_eq!(resolution.source, RateSource::Expected);
    let notice = resolution.notice.expect("notice");
    assert_eq!(notice.declared, 10.0);
    assert_eq!(notice.expected, 15.0);
    assert!(notice.to_string().contains("15"));
}

#[test]
fn test_matching_rates_raise_no_notice() {
    let resolution = reconcile(Some(25.0), Some(25.0)).expect("rate");
    assert_eq!(resolution.rate, 25.0);
    assert!(resolution.notice.is_none());
}

#[test]
fn test_declared_rate_used_when_nothing_is_expected() {
    let resolution = reconcile(Some(256.0), None).expect("rate");
    assert_eq!(resolution.rate, 256.0);
    assert_eq!(resolution.source, RateSource::Declared);
    assert!(resolution.notice.is_none());
}

#[test]
fn test_missing_or_invalid_rates_resolve_to_none() {
    assert!(reconcile(None, None).is_none());
    assert!(reconcile(Some(0.0), None).is_none());
    assert!(reconcile(Some(-5.0), None).is_none());
    assert!(reconcile(Some(f64::NAN), None).is_none());

    // A bad declared rate does not hide a valid expected one
    let resolution = reconcile(Some(0.0), Some(7.0)).expect("rate");
    assert_eq!(resolution.rate, 7.0);
    assert!(resolution.notice.is_none());
}

#[test]
fn test_oracle_overrides_come_first() {
    let oracle = RateOracle::new(vec![
        RateRule { pattern: "resp".to_string(), rate: 50.0 },
        RateRule { pattern: "EDA".to_string(), rate: 4.0 },
    ]);

    assert_eq!(oracle.expected(Some("RESP_belt")), Some(50.0));
    assert_eq!(oracle.expected(Some("EDA")), Some(4.0));
    assert_eq!(oracle.expected(Some("ACC")), Some(25.0));
    assert_eq!(oracle.expected(Some("EEG")), None);
    assert_eq!(oracle.expected(None), None);

    let resolution = oracle.resolve(Some("EDA"), Some(4.0)).expect("rate");
    assert!(resolution.notice.is_none());
    assert!(oracle.resolve(Some("EEG"), None).is_none());
}

#[test]
fn test_config_rules_feed_the_oracle() -> Result<()> {
    let config: ToolConfig = serde_json::from_str(
        r#"{ "expected_rates": [{ "pattern": "PUPIL", "rate": 120.0 }] }"#,
    )?;
    config.validate()?;
    assert_eq!(config.delimiter, ',');

    let oracle = RateOracle::new(config.expected_rates);
    assert_eq!(oracle.expected(Some("pupil")), Some(120.0));
    Ok(())
}

#[test]
fn test_config_rejects_bad_values() -> Result<()> {
    let non_ascii: ToolConfig = serde_json::from_str(r#"{ "delimiter": "→" }"#)?;
    assert!(non_ascii.validate().is_err());

    let zero_rate: ToolConfig =
        serde_json::from_str(r#"{ "expected_rates": [{ "pattern": "X", "rate": 0.0 }] }"#)?;
    assert!(zero_rate.validate().is_err());

    let empty_pattern: ToolConfig =
        serde_json::from_str(r#"{ "expected_rates": [{ "pattern": "", "rate": 10.0 }] }"#)?;
    assert!(empty_pattern.validate().is_err());

    let semicolon: ToolConfig = serde_json::from_str(r#"{ "delimiter": ";" }"#)?;
    semicolon.validate()?;
    assert_eq!(semicolon.delimiter_byte(), b';');
    Ok(())
}
