use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use seqnet::activation::ActivationFunction;
use seqnet::data::csv::load_csv;
use seqnet::data::{partition, Corpus, CorpusOptions};
use seqnet::network::{DenseClassifier, DenseSpec, Model, SavedModel, SequenceClassifier, SequenceSpec};
use seqnet::train::{train_loop, History, TrainConfig};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("seqnet-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn assert_close(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() < 1e-9, "{} vs {}", x, y);
    }
}

#[test]
fn corpus_file_trains_and_model_reloads() {
    let dir = scratch_dir("corpus");
    let corpus_path = dir.join("reuters.json");
    std::fs::write(
        &corpus_path,
        r#"{
            "sequences": [[1, 4, 5, 6], [1, 7, 8], [1, 4, 4], [1, 9, 8, 7, 6, 5],
                          [1, 5, 6], [1, 8, 9], [1, 4, 6, 5], [1, 7, 9, 25]],
            "labels": [0, 1, 0, 1, 0, 1, 0, 1]
        }"#,
    ).unwrap();

    let options = CorpusOptions { maxlen: 5, num_words: Some(20), ..CorpusOptions::default() };
    let dataset = Corpus::load_json(&corpus_path).unwrap().into_dataset(&options).unwrap();
    assert_eq!(dataset.inputs()[7], vec![0, 1, 7, 9, 2]);

    let mut rng = StdRng::seed_from_u64(5);
    let parts = partition(dataset, 0.25, Some(2), &mut rng).unwrap();
    let spec = SequenceSpec { vocab_size: 20, embedding_dim: 4, first_units: 5, second_units: 3, num_classes: 2 };
    let mut model = SequenceClassifier::new(spec, &mut rng).unwrap();
    let config = TrainConfig { epochs: 2, batch_size: 2, ..TrainConfig::default() };
    let history = train_loop(
        &mut model, &parts.train, parts.validation.as_ref(), &mut config.optimizer(), &config, &mut rng,
    ).unwrap();
    assert!(history.epochs.iter().all(|e| e.val_loss.is_some()));

    let history_path = dir.join("history.json");
    history.save_json(&history_path).unwrap();
    assert_eq!(History::load_json(&history_path).unwrap().len(), 2);

    let model_path = dir.join("model.json");
    model.save_json(&model_path).unwrap();
    let reloaded = match SavedModel::load_json(&model_path).unwrap() {
        SavedModel::Sequence { spec, params } => SequenceClassifier::from_parts(spec, params).unwrap(),
        other => panic!("expected a sequence model, got {:?}", other),
    };
    let test = parts.test.expect("test partition");
    let sample = &test.inputs()[0];
    assert_close(&model.predict(sample), &reloaded.predict(sample));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn iris_csv_trains_a_dense_model_that_reloads() {
    let dir = scratch_dir("iris");
    let csv_path = dir.join("iris.csv");
    std::fs::write(
        &csv_path,
        "sepal_length,sepal_width,petal_length,petal_width,species\n\
         5.1,3.5,1.4,0.2,setosa\n4.9,3.0,1.4,0.2,setosa\n4.7,3.2,1.3,0.2,setosa\n\
         7.0,3.2,4.7,1.4,versicolor\n6.4,3.2,4.5,1.5,versicolor\n6.9,3.1,4.9,1.5,versicolor\n\
         6.3,3.3,6.0,2.5,virginica\n5.8,2.7,5.1,1.9,virginica\n7.1,3.0,5.9,2.1,virginica\n",
    ).unwrap();

    let data = load_csv(&csv_path, None).unwrap();
    assert_eq!(data.class_names.as_deref().map(<[String]>::len), Some(3));

    let mut rng = StdRng::seed_from_u64(6);
    let spec = DenseSpec {
        input_size: 4,
        hidden: vec![6],
        num_classes: 3,
        hidden_activation: ActivationFunction::ReLU,
    };
    let mut model = DenseClassifier::new(spec.clone(), &mut rng).unwrap();
    let config = TrainConfig { epochs: 3, batch_size: 3, ..TrainConfig::default() };
    train_loop(&mut model, &data.dataset, None, &mut config.optimizer(), &config, &mut rng).unwrap();

    let model_path = dir.join("dense.json");
    model.save_json(&model_path).unwrap();
    let reloaded = match SavedModel::load_json(&model_path).unwrap() {
        SavedModel::Dense { spec: saved_spec, params } => {
            assert_eq!(saved_spec, spec);
            DenseClassifier::from_parts(saved_spec, params).unwrap()
        }
        other => panic!("expected a dense model, got {:?}", other),
    };
    let sample = &data.dataset.inputs()[4];
    assert_close(&model.predict(sample), &reloaded.predict(sample));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn saved_model_of_the_wrong_shape_is_rejected() {
    let mut rng = StdRng::seed_from_u64(7);
    let spec = DenseSpec { input_size: 2, hidden: vec![3], num_classes: 2, hidden_activation: ActivationFunction::ReLU };
    let model = DenseClassifier::new(spec, &mut rng).unwrap();
    let wider = DenseSpec { input_size: 5, hidden: vec![3], num_classes: 2, hidden_activation: ActivationFunction::ReLU };
    assert!(DenseClassifier::from_parts(wider, model.params().clone()).is_err());
}
