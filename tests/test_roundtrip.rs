#[cfg(test)]
mod roundtrip {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_dict_codec::{Model, TrainingConfig};
    use std::sync::Arc;
    use std::thread;

    fn random_doc(rng: &mut StdRng, max_len: usize) -> Vec<u8> {
        let len = rng.gen_range(0..=max_len);
        // Small alphabet so matches actually occur.
        (0..len).map(|_| b"abcdefgh{}\":,0123"[rng.gen_range(0..17)]).collect()
    }

    fn random_corpus(rng: &mut StdRng) -> Vec<Vec<u8>> {
        let docs = rng.gen_range(1..12);
        (0..docs).map(|_| random_doc(rng, 200)).collect()
    }

    #[test]
    fn test_empty_document() {
        let corpus = vec![b"status=ok code=200".to_vec(), b"status=ok code=404".to_vec()];
        let model = Model::train(&corpus, &TrainingConfig::default()).unwrap();
        let blob = model.encode(b"").unwrap();
        assert_eq!(model.decode(&blob).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_random_documents_against_random_models() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let docs: Vec<Vec<u8>> = (0..100)
            .map(|i| {
                if i % 2 == 0 {
                    random_doc(&mut rng, 500)
                } else {
                    // Full byte range, including bytes no corpus contains.
                    let len = rng.gen_range(0..=500);
                    (0..len).map(|_| rng.gen::<u8>()).collect()
                }
            })
            .collect();

        for m in 0..20 {
            let corpus = random_corpus(&mut rng);
            let config = TrainingConfig { workers: 2, ..TrainingConfig::default() };
            let model = Model::train(&corpus, &config).unwrap();
            for (d, doc) in docs.iter().enumerate() {
                let blob = model.encode(doc).unwrap();
                let back = model.decode(&blob).unwrap();
                assert_eq!(&back, doc, "model {} document {}", m, d);
            }
        }
    }

    #[test]
    fn test_long_runs_and_self_overlap() {
        let corpus = vec![b"xxxxxxxxyyyy".to_vec(), b"yyyyxxxx".to_vec()];
        let model = Model::train(&corpus, &TrainingConfig::default()).unwrap();

        let mut doc = vec![b'x'; 70_000];
        doc.extend_from_slice(b"tail");
        let blob = model.encode(&doc).unwrap();
        assert!(blob.len() < 100, "blob is {} bytes", blob.len());
        assert_eq!(model.decode(&blob).unwrap(), doc);
    }

    #[test]
    fn test_reloaded_model_produces_identical_blobs() {
        let corpus: Vec<Vec<u8>> = (0..20)
            .map(|i| format!("ts=1700000{:03} svc=auth msg=\"token refreshed\"", i).into_bytes())
            .collect();
        let model = Model::train(&corpus, &TrainingConfig::default()).unwrap();
        let reloaded = Model::from_bytes(&model.to_bytes().unwrap()).unwrap();

        let doc = b"ts=1700000999 svc=auth msg=\"token refreshed\"";
        let blob = model.encode(doc).unwrap();
        assert_eq!(reloaded.encode(doc).unwrap(), blob);
        assert_eq!(reloaded.decode(&blob).unwrap(), doc.to_vec());
    }

    #[test]
    fn test_shared_model_across_threads() {
        let corpus: Vec<Vec<u8>> = (0..50)
            .map(|i| format!(r#"{{"event":"click","x":{},"y":{}}}"#, i * 3, i * 7).into_bytes())
            .collect();
        let model = Arc::new(Model::train(&corpus, &TrainingConfig::default()).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let model = Arc::clone(&model);
                thread::spawn(move || {
                    for i in 0..200 {
                        let doc = format!(r#"{{"event":"scroll","x":{},"y":{}}}"#, t, i).into_bytes();
                        let blob = model.encode(&doc).unwrap();
                        assert_eq!(model.decode(&blob).unwrap(), doc);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}
