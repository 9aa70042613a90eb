use super::*;
use std::path::PathBuf;
use std::sync::Arc;

fn sequence(ids: &[i64], max_length: usize) -> EncodedSequence {
    EncodedSequence::assemble(ids.to_vec(), max_length, 2, 1)
}

#[test]
fn test_sigmoid_midpoint() {
    assert_eq!(sigmoid(0.0), 0.5);
}

#[test]
fn test_sigmoid_open_interval() {
    for x in [-1e6, -745.0, -40.0, -1.0, 1.0, 40.0, 745.0, 1e6] {
        let y = sigmoid(x);
        assert!(y > 0.0 && y < 1.0, "sigmoid({x}) = {y}");
    }
}

#[test]
fn test_sigmoid_monotonic() {
    assert!(sigmoid(-2.0) < sigmoid(-1.0));
    assert!(sigmoid(1.0) < sigmoid(2.0));
}

#[test]
fn test_config_stub_validates() {
    assert!(SessionConfig::stub().validate().is_ok());
}

#[test]
fn test_config_without_path_is_invalid() {
    let err = SessionConfig::default().validate().unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig { .. }));
}

#[test]
fn test_open_missing_model_fails() {
    let result = InferenceSession::open(SessionConfig::new("/nonexistent/reranker"));

    assert!(matches!(
        result.unwrap_err(),
        SessionError::ModelNotFound { .. }
    ));
}

#[test]
fn test_open_directory_without_weights_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), "{}").unwrap();

    let result = InferenceSession::open(SessionConfig::new(dir.path()));

    assert!(matches!(
        result.unwrap_err(),
        SessionError::ModelLoadFailed { .. }
    ));
}

#[test]
fn test_open_with_corrupt_weights_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), r#"{"model_type":"bert"}"#).unwrap();
    std::fs::write(dir.path().join("model.safetensors"), b"not a safetensors file").unwrap();

    let session = InferenceSession::new(SessionConfig::new(dir.path()));
    let err = session.initialize().unwrap_err();

    assert!(matches!(err, SessionError::ModelLoadFailed { .. }));
    assert!(!session.is_initialized());
}

#[test]
fn test_initialize_is_idempotent() {
    let session = InferenceSession::new(SessionConfig::stub());

    session.initialize().unwrap();
    session.initialize().unwrap();

    assert!(session.is_initialized());
}

#[test]
fn test_run_before_initialize_fails() {
    let session = InferenceSession::new(SessionConfig::stub());

    let err = session.run_inference(&[sequence(&[0, 5, 2], 8)]).unwrap_err();

    assert!(matches!(
        err,
        InferenceError::Session(SessionError::NotInitialized)
    ));
}

#[test]
fn test_close_twice_succeeds() {
    let session = InferenceSession::open(SessionConfig::stub()).unwrap();

    assert!(session.close().is_ok());
    assert!(session.close().is_ok());
    assert!(!session.is_initialized());
}

#[test]
fn test_close_uninitialized_succeeds() {
    let session = InferenceSession::new(SessionConfig::stub());
    assert!(session.close().is_ok());
}

#[test]
fn test_run_after_close_fails_with_session_error() {
    let session = InferenceSession::open(SessionConfig::stub()).unwrap();
    session.close().unwrap();

    let err = session.run_inference(&[sequence(&[0, 5, 2], 8)]).unwrap_err();
    assert!(matches!(
        err,
        InferenceError::Session(SessionError::NotInitialized)
    ));
    assert!(err.to_string().contains("not initialized"));

    let err = session.run_inference(&[]).unwrap_err();
    assert!(matches!(err, InferenceError::Session(_)));
}

#[test]
fn test_reinitialize_after_close() {
    let session = InferenceSession::open(SessionConfig::stub()).unwrap();
    session.close().unwrap();
    session.initialize().unwrap();

    assert!(session.run_inference(&[sequence(&[0, 5, 2], 8)]).is_ok());
}

#[test]
fn test_empty_batch_returns_empty() {
    let session = InferenceSession::open(SessionConfig::stub()).unwrap();
    assert!(session.run_inference(&[]).unwrap().is_empty());
}

#[test]
fn test_scores_preserve_order_and_range() {
    let session = InferenceSession::open(SessionConfig::stub()).unwrap();
    let batch = vec![
        sequence(&[0, 5, 6, 5, 6, 2], 10),
        sequence(&[0, 5, 6, 7, 8, 2], 10),
        sequence(&[0, 5, 6, 5, 6, 2], 10),
    ];

    let scores = session.run_inference(&batch).unwrap();

    assert_eq!(scores.len(), 3);
    assert!(scores.iter().all(|s| *s > 0.0 && *s < 1.0));
    assert!(scores[0] > scores[1]);
    assert_eq!(scores[0], scores[2]);
}

#[test]
fn test_empty_sequence_is_invalid_input() {
    let session = InferenceSession::open(SessionConfig::stub()).unwrap();
    let batch = vec![sequence(&[0, 5, 2], 8), EncodedSequence::default()];

    let err = session.run_inference(&batch).unwrap_err();
    assert!(matches!(err, InferenceError::InvalidInput { index: 1, .. }));
}

#[test]
fn test_mismatched_mask_is_invalid_input() {
    let session = InferenceSession::open(SessionConfig::stub()).unwrap();
    let mut broken = sequence(&[0, 5, 2], 8);
    broken.attention_mask.pop();

    let err = session.run_inference(&[broken]).unwrap_err();
    assert!(matches!(err, InferenceError::InvalidInput { index: 0, .. }));
}

#[test]
fn test_cancelled_context_stops_batch() {
    let session = InferenceSession::open(SessionConfig::stub()).unwrap();
    let ctx = RerankContext::background();
    ctx.cancel();

    let err = session
        .run_inference_with_context(&[sequence(&[0, 5, 2], 8)], &ctx)
        .unwrap_err();

    assert!(matches!(
        err,
        InferenceError::Interrupted(crate::context::ContextError::Cancelled)
    ));
}

#[test]
fn test_concurrent_scoring_and_close() {
    let session = Arc::new(InferenceSession::open(SessionConfig::stub()).unwrap());
    let batch: Vec<_> = (0..16).map(|i| sequence(&[0, i, i, 2], 8)).collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let session = Arc::clone(&session);
            let batch = batch.clone();
            std::thread::spawn(move || session.run_inference(&batch))
        })
        .collect();

    let closer = {
        let session = Arc::clone(&session);
        std::thread::spawn(move || session.close())
    };

    for handle in handles {
        match handle.join().unwrap() {
            Ok(scores) => assert_eq!(scores.len(), 16),
            Err(err) => assert!(matches!(
                err,
                InferenceError::Session(SessionError::NotInitialized)
            )),
        }
    }
    assert!(closer.join().unwrap().is_ok());
    assert!(!session.is_initialized());
}

#[test]
fn test_model_files_accepts_weights_path() {
    let dir = tempfile::tempdir().unwrap();
    let weights = dir.path().join("model.safetensors");
    std::fs::write(dir.path().join("config.json"), "{}").unwrap();
    std::fs::write(&weights, b"").unwrap();

    let (config, resolved) = SessionConfig::new(&weights).model_files().unwrap();

    assert_eq!(config, dir.path().join("config.json"));
    assert_eq!(resolved, weights);
}

#[test]
fn test_debug_reports_state() {
    let session = InferenceSession::new(SessionConfig {
        model_path: Some(PathBuf::from("/models/bge")),
        ..Default::default()
    });
    assert!(format!("{session:?}").contains("uninitialized"));
}

const TINY_BERT_CONFIG: &str = r#"{
  "model_type": "bert",
  "vocab_size": 32,
  "hidden_size": 8,
  "num_hidden_layers": 1,
  "num_attention_heads": 2,
  "intermediate_size": 16,
  "hidden_act": "gelu",
  "hidden_dropout_prob": 0.0,
  "max_position_embeddings": 32,
  "type_vocab_size": 2,
  "initializer_range": 0.02,
  "layer_norm_eps": 1e-12,
  "pad_token_id": 1
}"#;

const TINY_XLM_ROBERTA_CONFIG: &str = r#"{
  "model_type": "xlm-roberta",
  "vocab_size": 32,
  "hidden_size": 8,
  "num_hidden_layers": 1,
  "num_attention_heads": 2,
  "intermediate_size": 16,
  "hidden_act": "gelu",
  "hidden_dropout_prob": 0.0,
  "attention_probs_dropout_prob": 0.0,
  "max_position_embeddings": 40,
  "type_vocab_size": 1,
  "layer_norm_eps": 1e-5,
  "pad_token_id": 1,
  "position_embedding_type": "absolute"
}"#;

/// Writes randomly initialized weights plus `config.json` into `dir`.
fn write_tiny_model(dir: &std::path::Path, raw_config: &str) {
    use candle_nn::{VarBuilder, VarMap};
    use candle_transformers::models::{bert, xlm_roberta};

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);

    if raw_config.contains("xlm-roberta") {
        let config: xlm_roberta::Config = serde_json::from_str(raw_config).unwrap();
        xlm_roberta::XLMRobertaForSequenceClassification::new(1, &config, vb).unwrap();
    } else {
        let config: bert::Config = serde_json::from_str(raw_config).unwrap();
        bert::BertModel::load(vb.pp("bert"), &config).unwrap();
        candle_nn::linear(config.hidden_size, 1, vb.pp("classifier")).unwrap();
    }

    varmap.save(dir.join("model.safetensors")).unwrap();
    std::fs::write(dir.join("config.json"), raw_config).unwrap();
}

fn native_batch() -> Vec<EncodedSequence> {
    vec![
        sequence(&[0, 5, 6, 7, 2], 12),
        sequence(&[0, 9, 2, 10, 11, 12, 13, 2], 12),
        sequence(&[0, 2], 12),
    ]
}

fn assert_native_scores(raw_config: &str, architecture: &str) {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_model(dir.path(), raw_config);

    let session = InferenceSession::open(
        SessionConfig::new(dir.path()).with_device(DevicePreference::Cpu),
    )
    .unwrap();
    assert!(format!("{session:?}").contains(&format!("{architecture}@cpu")));

    let batch = native_batch();
    let scores = session.run_inference(&batch).unwrap();

    assert_eq!(scores.len(), batch.len());
    assert!(scores.iter().all(|s| *s > 0.0 && *s < 1.0), "{scores:?}");

    // each row is scored on its own, so order follows the input
    let reversed: Vec<_> = batch.iter().rev().cloned().collect();
    let mut reversed_scores = session.run_inference(&reversed).unwrap();
    reversed_scores.reverse();
    for (a, b) in scores.iter().zip(&reversed_scores) {
        assert!((a - b).abs() < 1e-6, "{scores:?} vs {reversed_scores:?}");
    }

    session.close().unwrap();
    assert!(session.run_inference(&batch).is_err());
}

#[test]
fn test_native_bert_scores_batch() {
    assert_native_scores(TINY_BERT_CONFIG, "bert");
}

#[test]
fn test_native_xlm_roberta_scores_batch() {
    assert_native_scores(TINY_XLM_ROBERTA_CONFIG, "xlm-roberta");
}

#[test]
fn test_native_model_from_weights_path() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_model(dir.path(), TINY_BERT_CONFIG);

    let session = InferenceSession::open(
        SessionConfig::new(dir.path().join("model.safetensors")).with_device(DevicePreference::Cpu),
    )
    .unwrap();

    let scores = session.run_inference(&native_batch()[..1]).unwrap();
    assert_eq!(scores.len(), 1);
}
