//! Rule-first hybrid classifier.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::category::CategorySet;
use crate::classifier::config::ClassifierConfig;
use crate::classifier::scorer::{CategoryScorer, ModelScorer};
use crate::classifier::types::{ClassificationResult, Prediction, Source};
use crate::embedding::{SemanticIndex, TextEmbedder};
use crate::error::{Result, RubricatorError};
use crate::model::TextModel;
use crate::rules::{Rule, RuleMatch, RuleTable};
use crate::score::Distribution;

/// Combines the rule table with a category scorer.
///
/// `classify` consults rules first: a matching rule whose confidence is
/// strictly above the override threshold decides the answer outright.
/// Otherwise the scorer's best category wins. `classify_top_n` and
/// `classify_batch` never consult rules; they show what the scorer thinks.
///
/// None of the classification calls return errors. Every failure (no
/// model, adapter error, empty input) is logged and answered with the
/// unknown sentinel at confidence 0.0.
///
/// Reads run concurrently. `add_rule`, `load_categories` and model
/// replacement take a writer lock only for the duration of the swap.
#[derive(Debug)]
pub struct HybridClassifier {
    config: ClassifierConfig,
    rules: RwLock<RuleTable>,
    categories: RwLock<Option<Arc<CategorySet>>>,
    scorer: Arc<dyn CategoryScorer>,
}

impl HybridClassifier {
    /// Classifier backed by a statistical model; starts untrained.
    pub fn statistical(config: ClassifierConfig) -> Self {
        Self::with_scorer(config, Arc::new(ModelScorer::new()))
    }

    /// Classifier backed by embedding similarity against loaded categories.
    pub fn semantic(config: ClassifierConfig, embedder: Arc<dyn TextEmbedder>) -> Self {
        let index = SemanticIndex::new(embedder).with_min_similarity(config.min_similarity);
        Self::with_scorer(config, Arc::new(index))
    }

    pub fn with_scorer(config: ClassifierConfig, scorer: Arc<dyn CategoryScorer>) -> Self {
        Self {
            config,
            rules: RwLock::new(RuleTable::new()),
            categories: RwLock::new(None),
            scorer,
        }
    }

    /// Start from an existing rule table.
    pub fn with_rules(self, rules: RuleTable) -> Self {
        *self.rules.write() = rules;
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn scorer(&self) -> &Arc<dyn CategoryScorer> {
        &self.scorer
    }

    /// Whether the scorer can answer; rules work regardless.
    pub fn is_ready(&self) -> bool {
        self.scorer.is_ready()
    }

    /// Best category for `text`, rules first.
    pub fn classify(&self, text: &str) -> Prediction {
        if text.trim().is_empty() {
            log::debug!("empty input classified as {}", self.config.unknown_label);
            return self.unknown();
        }

        if let Some(matched) = self.rule_match(text)
            && matched.confidence > self.config.rule_override_threshold
        {
            log::debug!(
                "rule '{}' decided '{}' ({:.2})",
                matched.keyword,
                matched.category,
                matched.confidence
            );
            return Prediction {
                category: matched.category,
                category_id: None,
                confidence: matched.confidence,
                source: Source::Rule,
            };
        }

        match self.scorer.distribution(text) {
            Ok(distribution) => {
                let distribution = distribution.filtered(self.scorer.min_score());
                match distribution.best() {
                    Some(best) => Prediction::from_score(best.clone(), self.scorer.source()),
                    None => {
                        log::debug!(
                            "no {} candidate reached {:.2}, answering {}",
                            self.scorer.name(),
                            self.scorer.min_score(),
                            self.config.unknown_label
                        );
                        self.unknown()
                    }
                }
            }
            Err(e) => self.degrade(&e),
        }
    }

    /// Up to `n` candidates from the scorer, descending by confidence.
    ///
    /// Rules are not applied here. `n == 0` is treated as 1, and the result
    /// is never empty.
    pub fn classify_top_n(&self, text: &str, n: usize) -> ClassificationResult {
        if text.trim().is_empty() {
            return self.unknown_result();
        }

        match self.scorer.distribution(text) {
            Ok(distribution) => self.rank(distribution, n),
            Err(e) => {
                self.degrade(&e);
                self.unknown_result()
            }
        }
    }

    /// Top-`n` results for every text, in input order.
    ///
    /// Non-empty texts are scored in one batched scorer call. If that call
    /// fails the batch is retried item by item so one bad input does not
    /// degrade the rest.
    pub fn classify_batch<S: AsRef<str>>(&self, texts: &[S], n: usize) -> Vec<ClassificationResult> {
        let mut results: Vec<Option<ClassificationResult>> = vec![None; texts.len()];
        let mut positions = Vec::with_capacity(texts.len());
        let mut batch = Vec::with_capacity(texts.len());

        for (position, text) in texts.iter().enumerate() {
            let text = text.as_ref();
            if text.trim().is_empty() {
                results[position] = Some(self.unknown_result());
            } else {
                positions.push(position);
                batch.push(text.to_string());
            }
        }

        if !batch.is_empty() {
            match self.scorer.distribution_batch(&batch) {
                Ok(distributions) if distributions.len() == batch.len() => {
                    for (position, distribution) in positions.iter().zip(distributions) {
                        results[*position] = Some(self.rank(distribution, n));
                    }
                }
                Ok(distributions) => {
                    log::warn!(
                        "{} scorer returned {} results for {} texts, retrying per item",
                        self.scorer.name(),
                        distributions.len(),
                        batch.len()
                    );
                    self.fill_per_item(&mut results, &positions, &batch, n);
                }
                Err(e) if e.kind() == crate::error::ErrorKind::ModelNotLoaded => {
                    self.degrade(&e);
                    for position in &positions {
                        results[*position] = Some(self.unknown_result());
                    }
                }
                Err(e) => {
                    log::warn!("batch scoring failed, retrying per item: {e}");
                    self.fill_per_item(&mut results, &positions, &batch, n);
                }
            }
        }

        results
            .into_iter()
            .map(|result| result.unwrap_or_else(|| self.unknown_result()))
            .collect()
    }

    fn fill_per_item(
        &self,
        results: &mut [Option<ClassificationResult>],
        positions: &[usize],
        batch: &[String],
        n: usize,
    ) {
        for (position, text) in positions.iter().zip(batch) {
            results[*position] = Some(self.classify_top_n(text, n));
        }
    }

    /// Append a rule; `keyword` is lowercased.
    pub fn add_rule<K: AsRef<str>, C: Into<String>>(
        &self,
        keyword: K,
        category: C,
        priority: i64,
    ) -> Rule {
        self.rules.write().add_rule(keyword, category, priority).clone()
    }

    /// Winning rule for `text`, whether or not it clears the threshold.
    pub fn rule_match(&self, text: &str) -> Option<RuleMatch> {
        self.rules.read().find_match(text)
    }

    /// Copy of the current rule table.
    pub fn rules(&self) -> RuleTable {
        self.rules.read().clone()
    }

    pub fn replace_rules(&self, rules: RuleTable) {
        *self.rules.write() = rules;
    }

    /// Replace the active category set and anything derived from it.
    pub fn load_categories(&self, categories: CategorySet) -> Result<()> {
        let categories = Arc::new(categories);
        self.scorer.load_categories(categories.clone())?;
        *self.categories.write() = Some(categories);
        Ok(())
    }

    pub fn categories(&self) -> Option<Arc<CategorySet>> {
        self.categories.read().clone()
    }

    /// Install a newly trained model.
    pub fn replace_model(&self, model: Arc<dyn TextModel>) -> Result<()> {
        self.scorer.replace_model(model)
    }

    fn rank(&self, distribution: Distribution, n: usize) -> ClassificationResult {
        let ranked = distribution
            .filtered(self.scorer.min_score())
            .ranked(n.max(1));
        ClassificationResult::from_ranked(ranked, self.scorer.source(), &self.config.unknown_label)
    }

    fn degrade(&self, error: &RubricatorError) -> Prediction {
        log::warn!(
            "{} scorer unavailable, answering {}: {error}",
            self.scorer.name(),
            self.config.unknown_label
        );
        self.unknown()
    }

    fn unknown(&self) -> Prediction {
        Prediction::unknown(self.config.unknown_label.clone())
    }

    fn unknown_result(&self) -> ClassificationResult {
        ClassificationResult::unknown(self.config.unknown_label.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::embedding::HashingEmbedder;
    use crate::model::TfIdfNaiveBayes;
    use crate::score::CategoryScore;

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
                    "restaurant dinner",
                    "dental clinic",
                    "pharmacy medicines",
                ]),
                &strings(&["Food", "Food", "Food", "Health", "Health"]),
            )
            .unwrap();

        let classifier = HybridClassifier::statistical(ClassifierConfig::default());
        classifier.replace_model(Arc::new(model)).unwrap();
        classifier
    }

    /// Fails every batched call but answers single calls.
    #[derive(Debug)]
    struct FlakyBatchScorer;

    impl CategoryScorer for FlakyBatchScorer {
        fn is_ready(&self) -> bool {
            true
        }

        fn distribution(&self, text: &str) -> Result<Distribution> {
            if text.contains("boom") {
                return Err(RubricatorError::adapter("boom"));
            }
            Ok(Distribution::new(vec![
                CategoryScore::new("A", 0.6),
                CategoryScore::new("B", 0.4),
            ]))
        }

        fn distribution_batch(&self, _texts: &[String]) -> Result<Vec<Distribution>> {
            Err(RubricatorError::adapter("batch unavailable"))
        }

        fn source(&self) -> Source {
            Source::Model
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[test]
    fn test_untrained_classifier_answers_unknown() {
        let classifier = HybridClassifier::statistical(ClassifierConfig::default());
        assert_eq!(classifier.classify("coffee").as_pair(), ("Unknown", 0.0));

        let top = classifier.classify_top_n("coffee", 3);
        assert_eq!(top.pairs(), vec![("Unknown".to_string(), 0.0)]);
    }

    #[test]
    fn test_empty_input_is_unknown() {
        let classifier = trained_classifier();
        assert!(classifier.classify("   ").is_unknown());
        assert!(classifier.classify_top_n("", 2).best().is_unknown());
    }

    #[test]
    fn test_rule_above_threshold_overrides_model() {
        let classifier = trained_classifier();
        classifier.add_rule("espresso", "Coffee bars", 80);

        let prediction = classifier.classify("espresso to go");
        assert_eq!(prediction.as_pair(), ("Coffee bars", 0.8));
        assert_eq!(prediction.source, Source::Rule);
    }

    #[test]
    fn test_rule_at_threshold_does_not_override() {
        let classifier = trained_classifier();
        classifier.add_rule("coffee", "Coffee bars", 70);

        let prediction = classifier.classify("coffee");
        assert_eq!(prediction.category, "Food");
        assert_eq!(prediction.source, Source::Model);
    }

    #[test]
    fn test_top_n_ignores_rules() {
        let classifier = trained_classifier();
        classifier.add_rule("coffee", "Coffee bars", 100);

        assert_eq!(classifier.classify("coffee").category, "Coffee bars");
        let top = classifier.classify_top_n("coffee", 5);
        assert!(top.iter().all(|p| p.category != "Coffee bars"));
        assert_eq!(top.best().category, "Food");
    }

    #[test]
    fn test_top_n_zero_returns_one() {
        let classifier = trained_classifier();
        assert_eq!(classifier.classify_top_n("pharmacy", 0).len(), 1);
    }

    #[test]
    fn test_batch_preserves_order_and_blanks() {
        let classifier = trained_classifier();
        let results = classifier.classify_batch(&["coffee", "", "clinic"], 2);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].best().category, "Food");
        assert!(results[1].best().is_unknown());
        assert_eq!(results[2].best().category, "Health");
        assert!(results.iter().all(|r| r.len() <= 2));
    }

    #[test]
    fn test_batch_falls_back_to_per_item() {
        let classifier =
            HybridClassifier::with_scorer(ClassifierConfig::default(), Arc::new(FlakyBatchScorer));
        let results = classifier.classify_batch(&["fine", "boom", "also fine"], 1);

        assert_eq!(results[0].best().as_pair(), ("A", 0.6));
        assert!(results[1].best().is_unknown());
        assert_eq!(results[2].best().as_pair(), ("A", 0.6));
    }

    #[test]
    fn test_semantic_classifier() {
        let classifier = HybridClassifier::semantic(
            ClassifierConfig::default(),
            Arc::new(HashingEmbedder::default()),
        );
        assert!(classifier.classify("coffee").is_unknown());

        classifier
            .load_categories(
                CategorySet::new(vec![
                    Category::new(1, "Food", "restaurants, cafes, coffee"),
                    Category::new(2, "Health", "clinics, pharmacies"),
                ])
                .unwrap(),
            )
            .unwrap();

        let prediction = classifier.classify("coffee");
        assert_eq!(prediction.category, "Food");
        assert_eq!(prediction.source, Source::Similarity);
        assert!(prediction.category_id.is_some());
        assert_eq!(classifier.categories().unwrap().len(), 2);
    }

    #[test]
    fn test_classify_respects_min_similarity() {
        let config = ClassifierConfig {
            min_similarity: 0.99,
            ..Default::default()
        };
        let classifier =
            HybridClassifier::semantic(config, Arc::new(HashingEmbedder::default()));
        classifier
            .load_categories(
                CategorySet::new(vec![
                    Category::new(1, "Food", "restaurants, cafes, coffee"),
                    Category::new(2, "Health", "clinics, pharmacies"),
                ])
                .unwrap(),
            )
            .unwrap();

        let best = classifier.classify("coffee");
        assert!(best.is_unknown());
        assert_eq!(best, *classifier.classify_top_n("coffee", 3).best());
    }

    #[test]
    fn test_statistical_classifier_rejects_nothing_on_category_load() {
        let classifier = HybridClassifier::statistical(ClassifierConfig::default());
        let categories = CategorySet::new(vec![Category::new(1, "Food", "")]).unwrap();
        assert!(classifier.load_categories(categories).is_ok());
    }
}
