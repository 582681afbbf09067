use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;

use rubricator::category::{Category, CategorySet};
use rubricator::classifier::{
    CategoryScorer, ClassificationResult, ClassifierConfig, HybridClassifier, Source,
};
use rubricator::embedding::{HashingEmbedder, SemanticIndex};
use rubricator::error::Result;
use rubricator::model::{TextModel, TfIdfNaiveBayes};
use rubricator::score::{CategoryScore, Distribution};

/// Scorer answering the same distribution for every text.
#[derive(Debug)]
struct FixedScorer {
    scores: Vec<(&'static str, f64)>,
}

impl CategoryScorer for FixedScorer {
    fn is_ready(&self) -> bool {
        true
    }

    fn distribution(&self, _text: &str) -> Result<Distribution> {
        Ok(Distribution::new(
            self.scores
                .iter()
                .map(|(name, score)| CategoryScore::new(*name, *score))
                .collect(),
        ))
    }

    fn source(&self) -> Source {
        Source::Model
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn food_and_health() -> CategorySet {
    CategorySet::new(vec![
        Category::new(1, "Food", "restaurants, cafes"),
        Category::new(2, "Health", "clinics, pharmacies"),
    ])
    .unwrap()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn trained_classifier() -> HybridClassifier {
    let mut model = TfIdfNaiveBayes::default();
    model
        .fit(
            &strings(&[
                "coffee shop espresso",
                "cafe coffee pastries",
                "restaurant dinner menu",
                "dental clinic dentist",
                "pharmacy medicines",
                "family doctor clinic",
                "car repair service",
                "tyre service garage",
            ]),
            &strings(&[
                "Food", "Food", "Food", "Health", "Health", "Health", "Auto", "Auto",
            ]),
        )
        .unwrap();

    let classifier = HybridClassifier::statistical(ClassifierConfig::default());
    classifier.replace_model(Arc::new(model)).unwrap();
    classifier
}

fn assert_ranked(result: &ClassificationResult) {
    assert!(!result.is_empty());
    for pair in result.predictions().windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
}

fn random_text(rng: &mut impl Rng) -> String {
    let words = rng.random_range(0..6);
    (0..words)
        .map(|_| {
            let len = rng.random_range(1..10);
            (&mut *rng)
                .sample_iter(&Alphanumeric)
                .take(len)
                .map(char::from)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn untrained_classifier_answers_unknown_for_known_categories() {
    let classifier = HybridClassifier::statistical(ClassifierConfig::default());
    classifier.load_categories(food_and_health()).unwrap();

    assert_eq!(classifier.classify("Best coffee shop").as_pair(), ("Unknown", 0.0));

    let top = classifier.classify_top_n("Best coffee shop", 3);
    assert_eq!(top.pairs(), vec![("Unknown".to_string(), 0.0)]);
}

#[test]
fn rule_overrides_without_model() {
    let classifier = HybridClassifier::statistical(ClassifierConfig::default());
    classifier.add_rule("acme", "Manufacturing", 90);
    classifier.add_rule("GIBDD", "Police", 95);

    let acme = classifier.classify("Acme Corp listing");
    assert_eq!(acme.as_pair(), ("Manufacturing", 0.9));
    assert_eq!(acme.source, Source::Rule);

    assert_eq!(
        classifier.classify("GIBDD office downtown").as_pair(),
        ("Police", 0.95)
    );
}

#[test]
fn rule_below_threshold_does_not_override() {
    let scorer = Arc::new(FixedScorer {
        scores: vec![("Food", 0.8), ("Health", 0.2)],
    });
    let classifier = HybridClassifier::with_scorer(ClassifierConfig::default(), scorer);
    classifier.add_rule("coffee", "Health", 60);

    let prediction = classifier.classify("coffee to go");
    assert_eq!(prediction.as_pair(), ("Food", 0.8));
    assert_eq!(prediction.source, Source::Model);
}

#[test]
fn rule_at_threshold_does_not_override() {
    let scorer = Arc::new(FixedScorer {
        scores: vec![("Food", 0.55), ("Health", 0.45)],
    });
    let classifier = HybridClassifier::with_scorer(ClassifierConfig::default(), scorer);
    classifier.add_rule("coffee", "Health", 70);

    assert_eq!(classifier.classify("coffee").category, "Food");
}

#[test]
fn top_n_ignores_rules_while_classify_applies_them() {
    let scorer = Arc::new(FixedScorer {
        scores: vec![("Food", 0.7), ("Health", 0.2), ("Auto", 0.1)],
    });
    let classifier = HybridClassifier::with_scorer(ClassifierConfig::default(), scorer);
    classifier.add_rule("coffee", "Health", 95);

    assert_eq!(classifier.classify("coffee").as_pair(), ("Health", 0.95));

    let top = classifier.classify_top_n("coffee", 2);
    assert_eq!(
        top.pairs(),
        vec![("Food".to_string(), 0.7), ("Health".to_string(), 0.2)]
    );
    assert!(top.iter().all(|p| p.source == Source::Model));

    let batch = classifier.classify_batch(&["coffee"], 1);
    assert_eq!(batch[0].best().category, "Food");
}

#[test]
fn top_n_ties_keep_category_order() {
    let scorer = Arc::new(FixedScorer {
        scores: vec![("B", 0.4), ("A", 0.4), ("C", 0.2)],
    });
    let classifier = HybridClassifier::with_scorer(ClassifierConfig::default(), scorer);

    let names: Vec<String> = classifier
        .classify_top_n("anything", 3)
        .iter()
        .map(|p| p.category.clone())
        .collect();
    assert_eq!(names, vec!["B", "A", "C"]);
}

#[test]
fn batch_preserves_order_and_size() {
    let classifier = trained_classifier();
    let texts = ["a", "b", "c"];

    let results = classifier.classify_batch(&texts, 2);
    assert_eq!(results.len(), 3);
    for result in &results {
        assert!(!result.is_empty());
        assert!(result.len() <= 2);
        assert_ranked(result);
    }

    let texts = ["espresso", "", "dentist", "tyre garage"];
    let results = classifier.classify_batch(&texts, 1);
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].best().category, "Food");
    assert!(results[1].best().is_unknown());
    assert_eq!(results[2].best().category, "Health");
    assert_eq!(results[3].best().category, "Auto");
}

#[test]
fn batch_matches_single_calls() {
    let classifier = trained_classifier();
    let texts = strings(&["coffee", "clinic doctor", "garage service", "unrelated"]);

    let batch = classifier.classify_batch(&texts, 3);
    for (text, result) in texts.iter().zip(&batch) {
        assert_eq!(result, &classifier.classify_top_n(text, 3));
    }
}

#[test]
fn confidences_stay_in_unit_interval() {
    let statistical = trained_classifier();
    statistical.add_rule("zz", "Sleep", 250);
    statistical.add_rule("qq", "Quiet", -5);

    let semantic = HybridClassifier::semantic(
        ClassifierConfig::default(),
        Arc::new(HashingEmbedder::default()),
    );
    semantic.load_categories(food_and_health()).unwrap();

    let mut rng = rand::rng();
    let texts: Vec<String> = (0..200).map(|_| random_text(&mut rng)).collect();

    for classifier in [&statistical, &semantic] {
        for text in &texts {
            let best = classifier.classify(text);
            assert!((0.0..=1.0).contains(&best.confidence), "{text:?}: {best:?}");

            let n = rng.random_range(0..5);
            let top = classifier.classify_top_n(text, n);
            assert!(!top.is_empty());
            assert!(top.len() <= n.max(1));
            assert_ranked(&top);
            assert!(top.iter().all(|p| (0.0..=1.0).contains(&p.confidence)));
        }

        for result in classifier.classify_batch(&texts, 3) {
            assert_ranked(&result);
            assert!(result.iter().all(|p| (0.0..=1.0).contains(&p.confidence)));
        }
    }
}

#[test]
fn semantic_reload_is_idempotent() {
    let index = SemanticIndex::new(Arc::new(HashingEmbedder::default()));
    let categories = Arc::new(food_and_health());

    index.load_categories(categories.clone()).unwrap();
    let first = index.snapshot().unwrap();
    index.load_categories(categories).unwrap();
    let second = index.snapshot().unwrap();

    assert_eq!(first.vectors(), second.vectors());
    assert_eq!(
        index.distribution("late night cafes").unwrap(),
        index.distribution("late night cafes").unwrap()
    );
}

#[test]
fn semantic_classifier_reports_category_ids() {
    let classifier = HybridClassifier::semantic(
        ClassifierConfig::default(),
        Arc::new(HashingEmbedder::default()),
    );
    assert!(classifier.classify("cafes").is_unknown());

    classifier.load_categories(food_and_health()).unwrap();
    let prediction = classifier.classify("pharmacies and clinics");
    assert_eq!(prediction.category, "Health");
    assert_eq!(prediction.source, Source::Similarity);
    assert!(prediction.category_id.is_some());
}
