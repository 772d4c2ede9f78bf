use kleczewsky_world::config::WorldConfig;

#[test]
fn should_fill_missing_keys_with_defaults() {
    let config = WorldConfig::from_toml(
        r#"
language = "pl"

[bloom]
enabled = false

[orbs]
count = 4
"#,
    )
    .expect("valid configuration");

    let defaults = WorldConfig::default();
    assert_eq!(config.language, "pl");
    assert!(!config.bloom.enabled);
    assert_eq!(config.bloom.strength, defaults.bloom.strength);
    assert_eq!(config.orbs.count, 4);
    assert_eq!(config.orbs.spots, defaults.orbs.spots);
    assert_eq!(config.timings, defaults.timings);
    assert_eq!(config.camera, defaults.camera);
}

#[test]
fn should_reject_malformed_configuration() {
    assert!(WorldConfig::from_toml("language = [").is_err());
    assert!(WorldConfig::from_toml("[orbs]\ncount = \"many\"").is_err());
}

#[test]
fn should_ship_a_configuration_matching_the_defaults() {
    let shipped = WorldConfig::from_toml(include_str!("../assets/world.toml"))
        .expect("assets/world.toml parses");
    let defaults = WorldConfig::default();

    assert_eq!(shipped.language, defaults.language);
    assert_eq!(shipped.assets, defaults.assets);
    assert_eq!(shipped.performance, defaults.performance);
    assert_eq!(shipped.orbs.count, defaults.orbs.count);
    assert_eq!(shipped.orbs.spots, defaults.orbs.spots);
    assert_eq!(shipped.camera.fov_degrees, defaults.camera.fov_degrees);
    assert_eq!(shipped.camera.intro_position, defaults.camera.intro_position);
    assert_eq!(shipped.timings.implode_debounce, defaults.timings.implode_debounce);
    for (a, b) in shipped
        .palette
        .letter_colors
        .iter()
        .flatten()
        .zip(defaults.palette.letter_colors.iter().flatten())
    {
        assert!((a - b).abs() < 1e-6);
    }
}
