fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use relpush_protocol::{ApiResult, Document};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture file as raw text.
    fn load_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    #[test]
    fn app_envelope_parses_with_nested_versions() {
        let result = ApiResult::parse(200, &load_fixture("envelope_app.json"));
        assert!(result.is_ok());
        assert_eq!(result.total, 1);

        let app = result.first_result().unwrap();
        assert!(app.is_persisted());
        assert_eq!(app.str_field("internalName"), Some("com.example.app"));

        let versions = app.documents("versions");
        assert_eq!(versions.len(), 1);
        let version = &versions[0];
        assert_eq!(version.i64_field("versionCode"), Some(42));
        assert_eq!(version.str_field("releaseStatus"), Some("RELEASE"));
        assert_eq!(
            version.document("file").unwrap().uuid(),
            Some("f7d2c6b1-90aa-4c3e-8e55-1b2a3c4d5e6f")
        );
    }

    #[test]
    fn error_envelope_is_not_ok_and_keeps_error_payload() {
        let result = ApiResult::parse(200, &load_fixture("envelope_error.json"));
        assert!(!result.is_ok());
        assert_eq!(result.status, 420);
        assert_eq!(result.errors["versionCode"], "duplicate");
        assert!(result.results.is_empty());
    }

    #[test]
    fn languages_envelope_yields_locale_names() {
        let result = ApiResult::parse(200, &load_fixture("envelope_languages.json"));
        assert!(result.is_ok());
        let names: Vec<&str> = result
            .results
            .iter()
            .filter_map(|d| d.str_field("name"))
            .collect();
        assert_eq!(names, vec!["en", "de", "fr"]);
    }

    #[test]
    fn documents_reserialize_unknown_fields_in_server_order() {
        let raw = load_fixture("envelope_app.json");
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let doc: Document = serde_json::from_value(value["results"][0].clone()).unwrap();
        let reserialized: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&doc).unwrap()).unwrap();
        assert_eq!(reserialized, value["results"][0]);

        // Key order survives, not just content.
        let keys: Vec<&String> = match &reserialized {
            serde_json::Value::Object(map) => map.keys().collect(),
            _ => panic!("expected object"),
        };
        assert_eq!(keys[0], "uuid");
        assert_eq!(keys[1], "internalName");
    }

    #[test]
    fn request_bodies_match_the_documented_wire_shape() {
        let req = relpush_client::request::login("ci-bot", "s3cret");
        match req.body {
            relpush_client::RequestBody::Json(v) => {
                assert_eq!(v, serde_json::json!({"userName": "ci-bot", "password": "s3cret"}));
            }
            other => panic!("unexpected body: {other:?}"),
        }
        assert_eq!(req.path, "/gofer/security/rest/auth/login");
    }
}
