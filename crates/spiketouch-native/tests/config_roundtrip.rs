//! Config files on disk.

use std::fs;

use spiketouch_core::audio::{MaterialProfile, MaterialShape};
use spiketouch_native::config::HapticConfig;
use spiketouch_native::ConfigError;
use tempfile::TempDir;

/// Writing and reading back gives the same config.
#[test]
fn default_config_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("spiketouch.json");

    let config = HapticConfig::default();
    config.to_json(&path).unwrap();
    let loaded = HapticConfig::from_json(&path).unwrap();
    assert_eq!(loaded, config);
}

/// Material tables use the short `r`/`f` keys with a `type` tag.
#[test]
fn material_table_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("materials.json");
    fs::write(
        &path,
        r#"{
            "default_material": "oak",
            "materials": {
                "oak": { "r": 0.9, "f": 0.8, "type": "wood", "warmth": 1.4 },
                "silk": { "r": 0.1, "type": "fabric" }
            }
        }"#,
    )
    .unwrap();

    let config = HapticConfig::from_json(&path).unwrap();
    assert_eq!(config.materials.len(), 2);
    assert_eq!(
        config.material("oak").unwrap(),
        &MaterialProfile {
            roughness: 0.9,
            freq_scale: 0.8,
            shape: MaterialShape::Wood { warmth: 1.4 },
        }
    );
    let silk = config.material("silk").unwrap();
    assert_eq!(silk.freq_scale, 1.0);
    assert_eq!(silk.shape, MaterialShape::Fabric { softness: 1.0 });
}

/// Missing files, bad JSON and invalid values are told apart.
#[test]
fn load_errors() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        HapticConfig::from_json(&missing),
        Err(ConfigError::FileRead { .. })
    ));

    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{ not json").unwrap();
    assert!(matches!(HapticConfig::from_json(&bad), Err(ConfigError::Parse(_))));

    let invalid = dir.path().join("invalid.json");
    fs::write(&invalid, r#"{ "encoder": { "dt_ms": 0.0 } }"#).unwrap();
    assert!(matches!(
        HapticConfig::from_json(&invalid),
        Err(ConfigError::InvalidValue { .. })
    ));

    let unknown = dir.path().join("unknown.json");
    fs::write(&unknown, r#"{ "default_material": "velvet" }"#).unwrap();
    assert!(matches!(
        HapticConfig::from_json(&unknown),
        Err(ConfigError::UnknownMaterial { .. })
    ));
}
