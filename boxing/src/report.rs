//! Annotation report
//!
//! A JSON-serializable dump of what the pass decided, for debugging the
//! backend's representation choices. Entries keep the order in which the
//! declarations were created and the expressions were visited.

use crate::analysis::expression_boxing::ExpressionRecord;
use crate::analysis::{DeclarationStats, ExpressionStats};
use crate::model::Program;
use indexmap::IndexMap;
use serde::Serialize;

/// Counters of both analyzers for one run of the pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoxingStats {
    pub declarations: DeclarationStats,
    pub expressions: ExpressionStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationEntry {
    pub kind: &'static str,
    pub unboxed: bool,
    pub type_erased: bool,
    pub untrusted_type: bool,
    pub raw: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpressionEntry {
    pub line: u32,
    pub column: u32,
    pub unboxed: bool,
    pub type_erased: bool,
    pub raw: bool,
    pub untrusted_type: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnotationReport {
    pub unit: String,
    /// Keyed by qualified name; a clash gets `#<id>` appended
    pub declarations: IndexMap<String, DeclarationEntry>,
    /// Keyed by expression id
    pub expressions: IndexMap<u32, ExpressionEntry>,
    pub stats: BoxingStats,
}

impl AnnotationReport {
    /// Collect every declaration the pass decided, plus the recorded expression nodes
    pub fn collect(unit: &str, program: &Program, records: &[ExpressionRecord], stats: BoxingStats) -> Self {
        let mut declarations = IndexMap::new();
        for decl in program.declarations.iter() {
            let Some(unboxed) = decl.annotations.unboxed else {
                continue;
            };
            let entry = DeclarationEntry {
                kind: decl.kind_name(),
                unboxed,
                type_erased: decl.annotations.type_erased,
                untrusted_type: decl.annotations.untrusted_type == Some(true),
                raw: decl.type_id.is_some_and(|t| program.types.is_raw(t)),
            };
            let mut key = program.qualified_name(decl.id);
            if declarations.contains_key(&key) {
                key = format!("{}#{}", key, decl.id.as_raw());
            }
            declarations.insert(key, entry);
        }

        let expressions = records
            .iter()
            .map(|record| {
                let flags = record.annotations;
                let entry = ExpressionEntry {
                    line: record.location.line,
                    column: record.location.column,
                    unboxed: flags.unboxed,
                    type_erased: flags.type_erased,
                    raw: flags.raw,
                    untrusted_type: flags.untrusted_type,
                };
                (record.id.as_raw(), entry)
            })
            .collect();

        Self {
            unit: unit.to_string(),
            declarations,
            expressions,
            stats,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Unboxed declarations, by key
    pub fn unboxed_declarations(&self) -> impl Iterator<Item = &str> {
        self.declarations
            .iter()
            .filter(|(_, entry)| entry.unboxed)
            .map(|(name, _)| name.as_str())
    }
}
