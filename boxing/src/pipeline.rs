//! Pass driver
//!
//! Runs the declaration analyzer over every unit first, then the expression
//! analyzer over every executable body, so that expression rules always see
//! decided declarations even across units.

use crate::analysis::{
    DeclarationBoxingAnalyzer, ExpressionBoxingAnalyzer, RepresentationPolicy, StandardPolicy,
};
use crate::config::BoxingConfig;
use crate::error::{BoxingError, BoxingResult};
use crate::logging;
use crate::model::{CompilationUnit, Program, SourceLocation};
use crate::report::{AnnotationReport, BoxingStats};
use diagnostics::internal::InternalDiagnostics;
use diagnostics::{Diagnostic, Diagnostics};
use log::info;
use source_map::{FileId, SourceMap, SourceSpan};
use std::time::Instant;

const PHASE: &str = "representation analysis";

/// What one run of the pass produced besides the annotations themselves
#[derive(Debug, Clone)]
pub struct BoxingOutcome {
    pub stats: BoxingStats,
    /// Present when [`BoxingConfig::collect_report`] is set
    pub report: Option<AnnotationReport>,
}

pub struct BoxingPass {
    policy: Box<dyn RepresentationPolicy>,
    config: BoxingConfig,
}

impl BoxingPass {
    /// Pass with the standard representation policy
    pub fn new(config: BoxingConfig) -> Self {
        Self::with_policy(StandardPolicy::new(), config)
    }

    pub fn with_policy(policy: impl RepresentationPolicy + 'static, config: BoxingConfig) -> Self {
        if let Some(level) = &config.log_level {
            logging::init_from_name(level);
        }
        Self {
            policy: Box::new(policy),
            config,
        }
    }

    pub fn config(&self) -> &BoxingConfig {
        &self.config
    }

    pub fn run(&self, program: &mut Program, unit: &mut CompilationUnit) -> BoxingResult<BoxingOutcome> {
        self.run_all(program, std::slice::from_mut(unit))
    }

    /// Annotate several units sharing one declaration graph
    pub fn run_all(&self, program: &mut Program, units: &mut [CompilationUnit]) -> BoxingResult<BoxingOutcome> {
        let started = Instant::now();
        let names = units
            .iter()
            .map(|u| u.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let _span = tracing::debug_span!("boxing", units = %names).entered();
        info!("{}: {} unit(s): {}", PHASE, units.len(), names);

        let policy: &dyn RepresentationPolicy = self.policy.as_ref();
        let declarations = {
            let mut analyzer = DeclarationBoxingAnalyzer::new(program, policy)
                .with_max_refinement_depth(self.config.max_refinement_depth);
            for unit in units.iter() {
                analyzer.analyze_unit(unit)?;
            }
            analyzer.stats()
        };

        let (expressions, records) = {
            let mut analyzer =
                ExpressionBoxingAnalyzer::new(program, policy).with_recording(self.config.collect_report);
            for unit in units.iter_mut() {
                analyzer.analyze_unit(unit)?;
            }
            (analyzer.stats(), analyzer.take_records())
        };

        let stats = BoxingStats {
            declarations,
            expressions,
        };
        let report = self
            .config
            .collect_report
            .then(|| AnnotationReport::collect(&names, program, &records, stats));

        info!(
            "{} done in {:?}: {} declarations, {} expressions, {} unboxed nodes",
            PHASE,
            started.elapsed(),
            stats.declarations.declarations_visited,
            stats.expressions.nodes_visited,
            stats.expressions.unboxed
        );
        Ok(BoxingOutcome { stats, report })
    }

    /// Like [`run_all`](Self::run_all), with a failure turned into an internal-error diagnostic
    pub fn run_with_diagnostics(
        &self,
        program: &mut Program,
        units: &mut [CompilationUnit],
        source_map: &SourceMap,
    ) -> Result<BoxingOutcome, Diagnostics> {
        self.run_all(program, units)
            .map_err(|error| Diagnostics::from(error_diagnostic(&error, source_map)))
    }
}

impl Default for BoxingPass {
    fn default() -> Self {
        Self::new(BoxingConfig::default())
    }
}

/// `E9xxx` diagnostic for a fatal error of the pass
pub fn error_diagnostic(error: &BoxingError, source_map: &SourceMap) -> Diagnostic {
    let code = error.error_code();
    let span = location_span(error.location(), source_map);
    let diagnostic = InternalDiagnostics::compiler_error(PHASE, &code.format_code(), error, span);
    InternalDiagnostics::with_help(diagnostic, code.help)
}

fn location_span(location: SourceLocation, source_map: &SourceMap) -> Option<SourceSpan> {
    if location == SourceLocation::unknown() {
        return None;
    }
    source_map.span_at(
        FileId::new(location.file_id as usize),
        location.line as usize,
        location.column as usize,
    )
}
