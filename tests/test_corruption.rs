#[cfg(test)]
mod corruption {
    use shared_dict_codec::encoder::encode_tokens;
    use shared_dict_codec::{CodecError, Model, Token, TrainingConfig};

    fn model() -> Model {
        let corpus: Vec<Vec<u8>> = (0..40)
            .map(|i| format!(r#"{{"level":"warn","module":"db","latency_ms":{}}}"#, i * 13).into_bytes())
            .collect();
        Model::train(&corpus, &TrainingConfig::default()).unwrap()
    }

    const DOC: &[u8] = br#"{"level":"warn","module":"db","latency_ms":991,"retry":true}"#;

    #[test]
    fn test_truncated_blob_is_corrupt() {
        let model = model();
        let blob = model.encode(DOC).unwrap();
        let short = &blob[..blob.len() - 1];
        match model.decode(short) {
            Err(CodecError::CorruptStream { .. }) => {}
            other => panic!("expected CorruptStream, got {:?}", other),
        }
    }

    #[test]
    fn test_every_truncation_fails() {
        let model = model();
        let blob = model.encode(DOC).unwrap();
        for len in 0..blob.len() {
            assert!(model.decode(&blob[..len]).is_err(), "prefix of {} bytes decoded", len);
        }
    }

    #[test]
    fn test_flipped_bytes_never_yield_a_wrong_document() {
        let model = model();
        let blob = model.encode(DOC).unwrap();
        for i in 0..blob.len() {
            for mask in [0x01u8, 0x80, 0xFF] {
                let mut bad = blob.clone();
                bad[i] ^= mask;
                if let Ok(doc) = model.decode(&bad) {
                    assert_eq!(doc, DOC.to_vec(), "flip {:#04x} at byte {} changed the output", mask, i);
                }
            }
        }
    }

    #[test]
    fn test_trailing_garbage_is_corrupt() {
        let model = model();
        let mut blob = model.encode(DOC).unwrap();
        blob.push(0xA5);
        assert!(matches!(model.decode(&blob), Err(CodecError::CorruptStream { .. })));
    }

    #[test]
    fn test_tag_mismatch() {
        let model = model();
        let mut blob = model.encode(DOC).unwrap();
        blob[0] ^= 0x01;
        assert_eq!(
            model.decode(&blob),
            Err(CodecError::ModelMismatch { expected: model.id().tag(), found: model.id().tag() ^ 0x01 })
        );
    }

    #[test]
    fn test_blob_from_another_model_is_rejected() {
        let model = model();
        let other = Model::train(&vec![b"completely different records".to_vec(); 3], &TrainingConfig::default()).unwrap();
        assert_ne!(model.id(), other.id());
        let blob = other.encode(DOC).unwrap();
        assert!(model.decode(&blob).is_err());
    }

    #[test]
    fn test_reference_before_dictionary_start() {
        let model = model();
        let available = model.dictionary().len();
        let tokens = [
            Token::Literal(b'a'),
            Token::Copy { distance: available as u32 + 2, length: 4 },
        ];
        let blob = encode_tokens(&model, &tokens, 0).unwrap();
        assert_eq!(
            model.decode(&blob),
            Err(CodecError::InvalidReference {
                token: 1,
                distance: available as u64 + 2,
                available: available + 1,
            })
        );
    }

    #[test]
    fn test_short_copies_cannot_be_encoded() {
        let model = model();
        let tokens = [Token::Literal(b'a'), Token::Copy { distance: 1, length: 1 }];
        assert!(matches!(
            encode_tokens(&model, &tokens, 0),
            Err(CodecError::CorruptStream { token: 1, .. })
        ));
    }

    #[test]
    fn test_bad_checksum_is_corrupt() {
        let model = model();
        let blob = encode_tokens(&model, &[Token::Literal(b'z')], 0xDEAD_BEEF).unwrap();
        match model.decode(&blob) {
            Err(CodecError::CorruptStream { reason, .. }) => assert_eq!(reason, "checksum mismatch"),
            other => panic!("expected checksum failure, got {:?}", other),
        }
    }
}
