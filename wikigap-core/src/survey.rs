use crate::analysis::{AnalysisOptions, CompletenessAnalyzer, CompletenessReport};
use tracing::info;
use wikigap_scanner::error::{Result, ScanError};
use wikigap_scanner::{ArticleRef, BuildOutcome, GraphBuilder, LinkGraph};

/// A seed article, the graph built from it and the last analysis run on
/// that graph. Changing the depth rebuilds the graph and drops the analysis.
pub struct Survey {
    seed: ArticleRef,
    builder: GraphBuilder,
    analyzer: CompletenessAnalyzer,
    outcome: Option<BuildOutcome>,
    last_analysis: Option<(AnalysisOptions, CompletenessReport)>,
}

impl Survey {
    pub fn new(seed: ArticleRef, builder: GraphBuilder, analyzer: CompletenessAnalyzer) -> Self {
        Self {
            seed,
            builder,
            analyzer,
            outcome: None,
            last_analysis: None,
        }
    }

    pub fn seed(&self) -> &ArticleRef {
        &self.seed
    }

    pub fn depth(&self) -> usize {
        self.builder.max_depth()
    }

    pub fn is_built(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Result<&BuildOutcome> {
        self.outcome.as_ref().ok_or(ScanError::NotBuilt)
    }

    pub fn graph(&self) -> Result<&LinkGraph> {
        self.outcome().map(|outcome| &outcome.graph)
    }

    pub async fn build(&mut self) -> Result<&BuildOutcome> {
        self.last_analysis = None;
        let outcome = self.builder.build(self.seed.clone()).await;
        Ok(self.outcome.insert(outcome))
    }

    pub async fn set_depth(&mut self, depth: usize) -> Result<&BuildOutcome> {
        info!("Rebuilding graph of {} at depth {}", self.seed, depth);
        self.builder.set_max_depth(depth);
        self.build().await
    }

    /// Runs the analysis, or returns the previous report when the options
    /// are unchanged since the last run on this graph.
    pub async fn analyze(&mut self, options: &AnalysisOptions) -> Result<&CompletenessReport> {
        let graph = &self.outcome.as_ref().ok_or(ScanError::NotBuilt)?.graph;

        let reuse = self
            .last_analysis
            .as_ref()
            .is_some_and(|(previous, _)| previous == options);
        if !reuse {
            let report = self.analyzer.analyze(graph, options).await?;
            self.last_analysis = Some((options.clone(), report));
        }

        self.last_analysis
            .as_ref()
            .map(|(_, report)| report)
            .ok_or(ScanError::NotBuilt)
    }
}
