use super::{LoopholesAnalyzer, SentinelsAnalyzer, SniffersAnalyzer};
use crate::error::Result;
use crate::types::{RouteAnalyzer, Source};

/// Factory function to create the analyzer for a source
pub fn create_analyzer(source: Source) -> Box<dyn RouteAnalyzer> {
    match source {
        Source::Sentinels => Box::new(SentinelsAnalyzer::new()),
        Source::Sniffers => Box::new(SniffersAnalyzer::new()),
        Source::Loopholes => Box::new(LoopholesAnalyzer::new()),
    }
}

/// Factory function resolving a configured source name
pub fn create_analyzer_by_name(name: &str) -> Result<Box<dyn RouteAnalyzer>> {
    Ok(create_analyzer(name.parse()?))
}
