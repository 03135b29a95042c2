#[cfg(test)]
mod training {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_dict_codec::{Error, ErrorKind, InputError, Model, TrainingConfig};

    fn json_lines() -> Vec<Vec<u8>> {
        (1..=3)
            .map(|n| format!(r#"{{"level":"info","n":{}}}"#, n).into_bytes())
            .collect()
    }

    #[test]
    fn test_similar_log_lines_compress_well() {
        let model = Model::train(&json_lines(), &TrainingConfig::default()).unwrap();
        let doc = br#"{"level":"info","n":4}"#;
        let blob = model.encode(doc).unwrap();
        println!("{} bytes -> {} bytes", doc.len(), blob.len());
        assert!(blob.len() <= 12, "blob is {} bytes", blob.len());
        assert_eq!(model.decode(&blob).unwrap(), doc.to_vec());
    }

    #[test]
    fn test_dictionary_holds_the_shared_prefix() {
        let model = Model::train(&json_lines(), &TrainingConfig::default()).unwrap();
        let dict = model.dictionary().bytes();
        let prefix = br#"{"level":"info","n":"#;
        assert!(dict.windows(prefix.len()).any(|w| w == prefix));
        assert_eq!(model.summary().documents, 3);
        assert_eq!(model.summary().corpus_bytes, 66);
    }

    #[test]
    fn test_training_is_deterministic_across_worker_counts() {
        let mut rng = StdRng::seed_from_u64(7);
        let corpus: Vec<Vec<u8>> = (0..60)
            .map(|i| {
                let mut doc = format!("user={} action=login status=", i % 7).into_bytes();
                let tail: Vec<u8> = (0..rng.gen_range(0..12)).map(|_| rng.gen_range(b'a'..=b'z')).collect();
                doc.extend_from_slice(&tail);
                doc
            })
            .collect();

        let one = TrainingConfig { workers: 1, ..TrainingConfig::default() };
        let many = TrainingConfig { workers: 4, ..TrainingConfig::default() };
        let a = Model::train(&corpus, &one).unwrap();
        let b = Model::train(&corpus, &one).unwrap();
        let c = Model::train(&corpus, &many).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id(), c.id());
        assert_eq!(a.to_bytes().unwrap(), c.to_bytes().unwrap());
    }

    #[test]
    fn test_budget_bounds_dictionary_size() {
        let mut rng = StdRng::seed_from_u64(42);
        // 40 distinct 100-byte chunks, each repeated in several documents:
        // far more repeated content than the budget can hold.
        let chunks: Vec<Vec<u8>> = (0..40)
            .map(|_| (0..100).map(|_| rng.gen::<u8>()).collect())
            .collect();
        let corpus: Vec<Vec<u8>> = (0..120)
            .map(|i| {
                let mut doc = chunks[i % chunks.len()].clone();
                doc.extend_from_slice(&chunks[(i * 7 + 3) % chunks.len()]);
                doc
            })
            .collect();

        let config = TrainingConfig { dictionary_budget: 1024, ..TrainingConfig::default() };
        let model = Model::train(&corpus, &config).unwrap();
        assert!(model.dictionary().len() <= 1024, "dictionary is {} bytes", model.dictionary().len());
        assert!(!model.dictionary().is_empty());

        for doc in corpus.iter().take(10) {
            assert_eq!(&model.decode(&model.encode(doc).unwrap()).unwrap(), doc);
        }
    }

    #[test]
    fn test_no_entry_is_contained_in_another() {
        let corpus: Vec<Vec<u8>> = (0..30)
            .map(|i| format!("GET /api/v1/items/{} HTTP/1.1 host=example.org agent=curl/{}", i, i % 3).into_bytes())
            .collect();
        let model = Model::train(&corpus, &TrainingConfig::default()).unwrap();
        let entries: Vec<&[u8]> = model.dictionary().entries().collect();
        assert!(!entries.is_empty());
        for (i, a) in entries.iter().enumerate() {
            for (j, b) in entries.iter().enumerate() {
                if i != j {
                    assert!(
                        !(a.len() <= b.len() && b.windows(a.len()).any(|w| w == *a)),
                        "entry {:?} is inside {:?}",
                        String::from_utf8_lossy(a),
                        String::from_utf8_lossy(b)
                    );
                }
            }
        }
    }

    #[test]
    fn test_corpus_without_repeats_gives_empty_dictionary() {
        let corpus = vec![b"abc".to_vec(), b"xyz".to_vec()];
        let model = Model::train(&corpus, &TrainingConfig::default()).unwrap();
        assert!(model.dictionary().is_empty());
        let blob = model.encode(b"hello hello hello").unwrap();
        assert_eq!(model.decode(&blob).unwrap(), b"hello hello hello".to_vec());
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        let corpus: Vec<Vec<u8>> = Vec::new();
        let err = Model::train(&corpus, &TrainingConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Input(InputError::EmptyCorpus)));
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TrainingConfig { min_match: 2, ..TrainingConfig::default() };
        let err = Model::train(&json_lines(), &config).unwrap_err();
        assert!(matches!(err, Error::Input(InputError::InvalidConfig(_))));
    }

    #[test]
    fn test_corpus_of_empty_documents() {
        let corpus = vec![Vec::new(), Vec::new()];
        let model = Model::train(&corpus, &TrainingConfig::default()).unwrap();
        assert!(model.dictionary().is_empty());
        assert_eq!(model.decode(&model.encode(b"").unwrap()).unwrap(), Vec::<u8>::new());
    }
}
