use std::fs;

use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;
use serde_json::Value;
use sympredict::api::{predict_from, predict_json, predict_with, EXIT_FAILURE, EXIT_OK};
use sympredict::data::service::ingest_file;
use sympredict::features::{FeatureSchema, SymptomVocabulary};
use sympredict::training::domain::BundleRepo;
use sympredict::training::service::{train, train_and_persist};
use sympredict::training::{FsBundleRepo, ParamGrid, TrainConfig};
use sympredict::PredictError;

const HEADER: &str = "Severity_Level,Affected_Body_Parts,Sleep_Hours,Recent_Travel_History,Exposure_to_Sick_People,has_cough,has_fever,has_nausea,has_vomiting,has_headache,has_dizziness,Disease";

fn synthetic_csv() -> String {
    let mut text = String::from(HEADER);
    text.push('\n');
    for i in 0..8 {
        let sleep = 5 + i % 4;
        text.push_str(&format!("Medium,Chest,{sleep},No,Yes,1,1,0,0,0,0,Flu\n"));
        text.push_str(&format!("High,Stomach,{sleep},Yes,No,0,0,1,1,0,0,Food Poisoning\n"));
        text.push_str(&format!("Low,Head,{sleep},No,No,0,0,0,0,1,1,Migraine\n"));
    }
    text.push_str("Low,Knee,8,No,No,0,0,0,0,0,0,Sprain\n");
    text
}

fn quick_config() -> TrainConfig {
    TrainConfig {
        grid: ParamGrid {
            n_estimators: vec![15],
            max_depth: vec![2, 3],
            learning_rate: vec![0.3],
            subsample: vec![1.0],
            colsample_bytree: vec![1.0],
        },
        ..TrainConfig::default()
    }
}

fn trained_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("finaldata.csv");
    fs::write(&csv, synthetic_csv()).unwrap();
    let dataset = ingest_file(&csv).unwrap();
    let repo = FsBundleRepo::new(dir.path().join("model"));
    train_and_persist(&dataset, &quick_config(), &repo).unwrap();
    dir
}

fn parse(payload: &str) -> Value {
    serde_json::from_str(payload).unwrap()
}

#[test]
fn train_persist_load_predict() {
    let dir = trained_dir();
    let out = predict_json(
        &dir.path().join("model"),
        r#"{"primarySymptoms":"Cough, Fever","severityLevel":"medium","affectedBodyParts":"Chest","sleepHours":"6","travelHistory":"No","exposure":"Yes"}"#,
    );
    assert_eq!(out.exit_code, EXIT_OK, "{}", out.payload);

    let value = parse(&out.payload);
    let top = value["topPredictions"].as_array().unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0]["disease"], "Flu");
    assert_eq!(value["recommendation"], "Rest and stay hydrated");

    let probs: Vec<f64> = top.iter().map(|t| t["probability"].as_f64().unwrap()).collect();
    assert!(probs.windows(2).all(|w| w[0] >= w[1]));
    assert_abs_diff_eq!(probs.iter().sum::<f64>(), 100.0, epsilon = 0.05);
}

#[test]
fn stomach_is_routed_to_abdomen_and_gastro_wins() {
    let dir = trained_dir();
    let out = predict_json(
        &dir.path().join("model"),
        r#"{"primarySymptoms":"nausea, vomiting","severityLevel":"High","affectedBodyParts":"stomach","sleepHours":5,"travelHistory":"Yes","exposure":"No"}"#,
    );
    assert!(out.is_success());
    let value = parse(&out.payload);
    assert_eq!(value["topPredictions"][0]["disease"], "Food Poisoning");
    assert_eq!(value["recommendation"], "Consult a doctor");
}

#[test]
fn unseen_body_part_still_predicts() {
    let dir = trained_dir();
    let out = predict_json(
        &dir.path().join("model"),
        r#"{"primarySymptoms":"headache","severityLevel":"low","affectedBodyParts":"Elbow","sleepHours":"7"}"#,
    );
    assert_eq!(out.exit_code, EXIT_OK);
    assert!(parse(&out.payload)["topPredictions"].is_array());
}

#[test]
fn malformed_sleep_hours_is_a_structured_error() {
    let dir = trained_dir();
    let out = predict_json(
        &dir.path().join("model"),
        r#"{"primarySymptoms":"cough","severityLevel":"High","affectedBodyParts":"Chest","sleepHours":"abc","travelHistory":"No","exposure":"No"}"#,
    );
    assert_eq!(out.exit_code, EXIT_FAILURE);
    let value = parse(&out.payload);
    assert_eq!(value["error"], "Prediction failed");
    assert!(value["details"].as_str().unwrap().contains("abc"));
    assert!(value.get("topPredictions").is_none());
}

#[test]
fn invalid_json_is_a_structured_error() {
    let dir = trained_dir();
    let out = predict_json(&dir.path().join("model"), "not json");
    assert_eq!(out.exit_code, EXIT_FAILURE);
    assert_eq!(parse(&out.payload)["error"], "Prediction failed");
}

#[test]
fn rare_disease_is_dropped_but_its_body_part_is_known() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("finaldata.csv");
    fs::write(&csv, synthetic_csv()).unwrap();
    let dataset = ingest_file(&csv).unwrap();
    let (bundle, report) = train(&dataset, &quick_config()).unwrap();

    assert_eq!(report.dropped_labels, vec!["Sprain".to_string()]);
    assert_eq!(bundle.metadata.dropped_labels, report.dropped_labels);
    assert!(bundle.body_part_encoder.contains("Knee"));

    // decoding every code returns the fitted labels in code order
    let codes: Vec<usize> = (0..bundle.label_decoder.len()).collect();
    assert_eq!(
        bundle.label_decoder.decode(&codes).unwrap(),
        vec!["Flu", "Food Poisoning", "Migraine"]
    );

    let out = predict_with(
        &bundle,
        r#"{"primarySymptoms":"headache, dizziness","severityLevel":"Low","affectedBodyParts":"Head","sleepHours":"8"}"#,
    );
    assert_eq!(parse(&out.payload)["topPredictions"][0]["disease"], "Migraine");
}

#[test]
fn bundle_with_inconsistent_schema_is_rejected() {
    let dir = trained_dir();
    let repo = FsBundleRepo::new(dir.path().join("model"));
    let mut bundle = repo.get_bundle().unwrap();
    let mut columns = bundle.feature_columns.columns().to_vec();
    columns.pop();
    bundle.feature_columns = FeatureSchema::new(columns);
    assert!(matches!(bundle.validate(), Err(PredictError::SchemaMismatch(_))));

    // write the bad bundle behind the repository's back and reload it
    fs::write(repo.bundle_path(), serde_json::to_string(&bundle).unwrap()).unwrap();
    assert!(matches!(repo.get_bundle(), Err(PredictError::SchemaMismatch(_))));

    let out = predict_from(
        &repo,
        r#"{"primarySymptoms":"cough","severityLevel":"low","affectedBodyParts":"Chest","sleepHours":"7"}"#,
    );
    assert_eq!(out.exit_code, EXIT_FAILURE);
    assert!(parse(&out.payload)["details"].as_str().unwrap().contains("schema"));
}

#[test]
fn bundle_with_extra_tree_fails_to_load() {
    let dir = trained_dir();
    let repo = FsBundleRepo::new(dir.path().join("model"));
    let mut raw: Value = parse(&fs::read_to_string(repo.bundle_path()).unwrap());
    let round = raw["model"]["rounds"][0].as_array_mut().unwrap();
    let extra = round[0].clone();
    round.push(extra);
    fs::write(repo.bundle_path(), raw.to_string()).unwrap();

    assert!(matches!(repo.get_bundle(), Err(PredictError::SchemaMismatch(_))));
    let out = predict_from(
        &repo,
        r#"{"primarySymptoms":"cough","severityLevel":"low","affectedBodyParts":"Chest","sleepHours":"7"}"#,
    );
    assert_eq!(out.exit_code, EXIT_FAILURE);
    let value = parse(&out.payload);
    assert_eq!(value["error"], "Prediction failed");
    assert!(value.get("topPredictions").is_none());
}

#[test]
fn bundle_with_dangling_child_fails_to_load() {
    let dir = trained_dir();
    let repo = FsBundleRepo::new(dir.path().join("model"));
    let mut raw: Value = parse(&fs::read_to_string(repo.bundle_path()).unwrap());
    raw["model"]["rounds"][0][0]["nodes"] = serde_json::json!([
        {"kind": "split", "feature": 0, "threshold": 0.5, "left": 1, "right": 7},
        {"kind": "leaf", "weight": 0.1}
    ]);
    fs::write(repo.bundle_path(), raw.to_string()).unwrap();
    assert!(matches!(repo.get_bundle(), Err(PredictError::SchemaMismatch(_))));
}

#[test]
fn vocabulary_mismatch_is_rejected() {
    let dir = trained_dir();
    let repo = FsBundleRepo::new(dir.path().join("model"));
    let mut bundle = repo.get_bundle().unwrap();
    bundle.vocabulary = SymptomVocabulary::new(["cough"]);
    assert!(matches!(bundle.validate(), Err(PredictError::SchemaMismatch(_))));
    assert!(repo.put_bundle(&bundle).is_err());
}

#[test]
fn missing_bundle_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let out = predict_json(&dir.path().join("nowhere"), "{}");
    assert_eq!(out.exit_code, EXIT_FAILURE);
    assert!(parse(&out.payload)["details"].as_str().unwrap().contains("nowhere"));
}
