use crate::calibrate::{Benchmarker, Weighter};
use crate::error::{QscoreError, Result};
use crate::eval::{Evaluator, Normalizer, UtilityFunction};
use std::collections::BTreeMap;

/// Registry resolving the strategy names a model description may declare to
/// factory functions. Populated with every built-in strategy at construction;
/// additional strategies register through the `register_*` methods. An
/// unknown name is a configuration error raised at model-load time, never
/// during evaluation.
pub struct StrategyRegistry {
    normalizers: BTreeMap<String, fn() -> Normalizer>,
    evaluators: BTreeMap<String, fn() -> Evaluator>,
    utility_functions: BTreeMap<String, fn() -> UtilityFunction>,
    weighters: BTreeMap<String, fn() -> Weighter>,
    benchmarkers: BTreeMap<String, fn() -> Benchmarker>,
}

impl StrategyRegistry {
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            normalizers: BTreeMap::new(),
            evaluators: BTreeMap::new(),
            utility_functions: BTreeMap::new(),
            weighters: BTreeMap::new(),
            benchmarkers: BTreeMap::new(),
        };

        registry.register_normalizer("identity", || Normalizer::Identity);
        registry.register_normalizer("loc", || Normalizer::LinesOfCode { loc: None });
        registry.register_normalizer("threshold", || Normalizer::Threshold);

        registry.register_evaluator("finding_count", || Evaluator::FindingCount);
        registry.register_evaluator("severity_sum", || Evaluator::SeveritySum);
        registry.register_evaluator("child_sum", || Evaluator::ChildSum);

        registry.register_utility_function("weighted_sum", || UtilityFunction::WeightedSum);

        registry.register_weighter("naive", || Weighter::Naive);

        registry.register_benchmarker("naive", || Benchmarker::Naive);
        registry.register_benchmarker("external", || Benchmarker::External);

        registry
    }

    pub fn register_normalizer(&mut self, key: &str, factory: fn() -> Normalizer) {
        self.normalizers.insert(key.to_string(), factory);
    }

    pub fn register_evaluator(&mut self, key: &str, factory: fn() -> Evaluator) {
        self.evaluators.insert(key.to_string(), factory);
    }

    pub fn register_utility_function(&mut self, key: &str, factory: fn() -> UtilityFunction) {
        self.utility_functions.insert(key.to_string(), factory);
    }

    pub fn register_weighter(&mut self, key: &str, factory: fn() -> Weighter) {
        self.weighters.insert(key.to_string(), factory);
    }

    pub fn register_benchmarker(&mut self, key: &str, factory: fn() -> Benchmarker) {
        self.benchmarkers.insert(key.to_string(), factory);
    }

    pub fn normalizer(&self, key: &str) -> Result<Normalizer> {
        Self::resolve(&self.normalizers, key, "normalizer")
    }

    pub fn evaluator(&self, key: &str) -> Result<Evaluator> {
        Self::resolve(&self.evaluators, key, "evaluator")
    }

    pub fn utility_function(&self, key: &str) -> Result<UtilityFunction> {
        Self::resolve(&self.utility_functions, key, "utility function")
    }

    pub fn weighter(&self, key: &str) -> Result<Weighter> {
        Self::resolve(&self.weighters, key, "weighter")
    }

    pub fn benchmarker(&self, key: &str) -> Result<Benchmarker> {
        Self::resolve(&self.benchmarkers, key, "benchmarker")
    }

    fn resolve<T>(entries: &BTreeMap<String, fn() -> T>, key: &str, slot: &str) -> Result<T> {
        entries.get(key).map(|factory| factory()).ok_or_else(|| {
            QscoreError::Configuration(format!("unknown {slot} strategy: {key}"))
        })
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
