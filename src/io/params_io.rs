use std::path::Path;

use crate::error::ModelError;
use crate::models::ParameterStore;

/// Parse a parameter store from TOML text.
///
/// ```toml
/// [regions.north.growth.Pinus]
/// r1 = 0.02
/// r2 = 0.004
/// ```
pub fn parse_parameter_store_toml(text: &str) -> Result<ParameterStore, ModelError> {
    let store: ParameterStore = toml::from_str(text)?;
    store.validate()?;
    Ok(store)
}

/// Parse a parameter store from JSON text.
pub fn parse_parameter_store_json(text: &str) -> Result<ParameterStore, ModelError> {
    let store: ParameterStore = serde_json::from_str(text)?;
    store.validate()?;
    Ok(store)
}

/// Load a parameter store, choosing the format from the file extension.
pub fn read_parameter_store(path: impl AsRef<Path>) -> Result<ParameterStore, ModelError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "toml" => parse_parameter_store_toml(&text),
        "json" => parse_parameter_store_json(&text),
        _ => Err(ModelError::ParseError(format!(
            "Unsupported parameter file format: .{ext}. Use .toml or .json"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[regions.north.growth.Pinus]
r1 = 0.02
r2dbh = 0.004
r3SL = 0.0
r4h1 = 0.0
r5h2 = 0.0
r6MAT = 0.0
r7MAP = 0.0
r8B = -0.001

[regions.north.mortality.Pinus]
m1 = -2.0
m2 = 0.0
m3 = 0.0
m4 = 0.0
m5 = 0.0
m6 = 0.0
m7 = 0.0
m8 = 0.0

[regions.north.recruitment.Pinus]
z1 = 12.0
z2 = -0.01
z3 = 0.0
z4 = 0.0
z5 = 0.0
z6 = 0.0
z7 = 0.0
z8 = 0.0
ze = 1.5

[regions.south.growth.Quercus]
r1 = 0.01
r2 = 0.0
r3 = 0.0
r4 = 0.0
r5 = 0.0
r6 = 0.0
r7 = 0.0
r8 = 0.0
"#;

    #[test]
    fn test_parse_toml_store() {
        let store = parse_parameter_store_toml(SAMPLE).unwrap();
        let names: Vec<&str> = store.region_names().collect();
        assert_eq!(names, vec!["north", "south"]);
        let north = store.region("north").unwrap();
        let pinus = north.species("Pinus").unwrap();
        assert!((pinus.growth.r2 - 0.004).abs() < 1e-12);
        assert!((pinus.recruitment.ze - 1.5).abs() < 1e-12);
        assert!(store.region("south").unwrap().species("Quercus").is_err());
    }

    #[test]
    fn test_parse_toml_missing_coefficient() {
        let text = "[regions.north.growth.Pinus]\nr1 = 0.02\n";
        let err = parse_parameter_store_toml(text).unwrap_err();
        assert!(matches!(err, ModelError::Toml(_)));
    }

    #[test]
    fn test_json_matches_toml() {
        let store = parse_parameter_store_toml(SAMPLE).unwrap();
        let json = serde_json::to_string(&store).unwrap();
        let back = parse_parameter_store_json(&json).unwrap();
        assert_eq!(
            back.region("north").unwrap().species("Pinus").unwrap(),
            store.region("north").unwrap().species("Pinus").unwrap()
        );
    }

    #[test]
    fn test_read_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        assert!(read_parameter_store(&path).is_ok());

        let bad = dir.path().join("params.yaml");
        std::fs::write(&bad, SAMPLE).unwrap();
        assert!(matches!(
            read_parameter_store(&bad),
            Err(ModelError::ParseError(_))
        ));
    }
}
