#[cfg(test)]
mod model_file {
    use shared_dict_codec::model::{MODEL_HEADER_LEN, MODEL_VERSION};
    use shared_dict_codec::{Model, ModelError, TrainingConfig};
    use std::fs;
    use tempfile::tempdir;

    fn model() -> Model {
        let corpus: Vec<Vec<u8>> = (0..25)
            .map(|i| format!("host=web-{:02} method=GET path=/health code=200 bytes={}", i % 5, 100 + i).into_bytes())
            .collect();
        Model::train(&corpus, &TrainingConfig::default()).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.model");
        let model = model();
        model.save(&path).unwrap();
        assert!(!dir.path().join("session.tmp").exists());

        let loaded = Model::load(&path).unwrap();
        assert_eq!(loaded.id(), model.id());
        assert_eq!(loaded.dictionary(), model.dictionary());
        assert_eq!(loaded.summary().documents, 25);

        let doc = b"host=web-09 method=GET path=/health code=503 bytes=0";
        let blob = model.encode(doc).unwrap();
        assert_eq!(loaded.decode(&blob).unwrap(), doc.to_vec());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.model");
        match Model::load(&path) {
            Err(ModelError::Missing(p)) => assert_eq!(p, path),
            other => panic!("expected Missing, got {:?}", other.map(|m| m.id())),
        }
    }

    #[test]
    fn test_empty_file_is_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.model");
        fs::write(&path, b"").unwrap();
        assert!(matches!(Model::load(&path), Err(ModelError::Truncated { found: 0, .. })));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = model().to_bytes().unwrap();
        bytes[..4].copy_from_slice(b"PK\x03\x04");
        assert!(matches!(
            Model::from_bytes(&bytes),
            Err(ModelError::BadMagic { found }) if &found == b"PK\x03\x04"
        ));
    }

    #[test]
    fn test_future_version_is_rejected() {
        let mut bytes = model().to_bytes().unwrap();
        bytes[4..6].copy_from_slice(&(MODEL_VERSION + 1).to_le_bytes());
        assert!(matches!(
            Model::from_bytes(&bytes),
            Err(ModelError::UnsupportedVersion { found, expected }) if found == MODEL_VERSION + 1 && expected == MODEL_VERSION
        ));
    }

    #[test]
    fn test_truncated_files() {
        let bytes = model().to_bytes().unwrap();
        assert!(matches!(
            Model::from_bytes(&bytes[..MODEL_HEADER_LEN - 1]),
            Err(ModelError::Truncated { needed, .. }) if needed == MODEL_HEADER_LEN
        ));
        assert!(matches!(
            Model::from_bytes(&bytes[..bytes.len() - 3]),
            Err(ModelError::Truncated { needed, found }) if needed == bytes.len() && found == bytes.len() - 3
        ));
    }

    #[test]
    fn test_damaged_body_is_corrupt() {
        let mut bytes = model().to_bytes().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(Model::from_bytes(&bytes), Err(ModelError::Corrupt(_))));

        let mut bytes = model().to_bytes().unwrap();
        bytes[6] ^= 0x01;
        assert!(matches!(Model::from_bytes(&bytes), Err(ModelError::Corrupt(_))));
    }
}
