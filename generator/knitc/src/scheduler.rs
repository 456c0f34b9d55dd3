//! Multi-pass generation driver.
//!
//! Each round attempts every pending module declaration. A declaration
//! whose analysis needs a companion that does not exist yet is deferred
//! and retried verbatim next round; successful declarations register
//! their companions into the model, which is what makes the next round
//! see more. When a round makes no progress the remaining declarations
//! are permanently unresolvable and each becomes a fatal diagnostic.
//!
//! Artifacts are all-or-nothing per declaration: an error anywhere in a
//! module's analysis withholds both of its files, and never blocks a
//! sibling declaration in the same round.

use std::io;

use knit_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use knit_emit::render_module;
use knit_ir::{ElementRef, Host, MethodId, TypeId};
use knit_resolve::{analyze_module, validate_module, Analysis};

use crate::sink::ArtifactSink;

/// Options for one generation run.
pub struct GenerateOptions {
    /// Version stamp for the generated-file header.
    pub version: String,
    /// Upper bound on rounds, mirroring the host driver's round budget.
    pub max_rounds: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            max_rounds: 8,
        }
    }
}

/// Counters for a finished run.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct RunSummary {
    pub rounds: u32,
    /// Modules whose companion pair was written.
    pub generated: usize,
    /// Modules that produced errors or stayed unresolvable.
    pub failed: usize,
}

/// Generate companions for every module declaration in the model.
pub fn run(
    host: &mut Host,
    sink: &mut dyn ArtifactSink,
    diags: &mut DiagnosticQueue,
    options: &GenerateOptions,
) -> io::Result<RunSummary> {
    let mut summary = RunSummary::default();

    // Shape validation happens once; a structurally invalid declaration
    // can never become valid by waiting for more rounds.
    let mut pending: Vec<TypeId> = Vec::new();
    for module in host.all_types().filter(|&t| host.type_decl(t).is_module()) {
        let mut staged = DiagnosticQueue::new();
        if validate_module(host, module, &mut staged) {
            pending.push(module);
        } else {
            diags.merge(&mut staged);
            summary.failed += 1;
        }
    }

    while !pending.is_empty() {
        summary.rounds += 1;
        let mut deferred: Vec<TypeId> = Vec::new();
        let mut progressed = false;

        for &module in &pending {
            // Stage per declaration so one failure never contaminates a
            // sibling, and a deferral leaves no half-reported attempt.
            let mut staged = DiagnosticQueue::new();
            match analyze_module(host, module, &mut staged) {
                Analysis::Deferred => {
                    tracing::debug!(
                        module = host.describe(ElementRef::Type(module)),
                        round = summary.rounds,
                        "deferred"
                    );
                    deferred.push(module);
                }
                Analysis::Ready(facts) => {
                    let errored = staged.has_errors();
                    diags.merge(&mut staged);
                    if errored {
                        summary.failed += 1;
                        continue;
                    }
                    let (iface, class) = render_module(host, &facts, &options.version);
                    sink.write(&iface)?;
                    sink.write(&class)?;
                    let implemented: Vec<MethodId> = facts
                        .methods
                        .iter()
                        .filter(|m| m.is_abstract)
                        .map(|m| m.method)
                        .collect();
                    host.register_companions(module, &implemented, facts.has_abstract_members);
                    summary.generated += 1;
                    progressed = true;
                }
            }
        }

        if deferred.is_empty() {
            break;
        }
        if !progressed || summary.rounds >= options.max_rounds {
            // No further round can change anything: every survivor is
            // permanently unresolvable.
            for &module in &deferred {
                diags.emit(
                    Diagnostic::error(ErrorCode::E9001)
                        .with_message(format!(
                            "failed to generate code for `{}`",
                            host.describe(ElementRef::Type(module))
                        ))
                        .with_origin(ElementRef::Type(module)),
                );
                summary.failed += 1;
            }
            break;
        }
        pending = deferred;
    }

    tracing::info!(
        rounds = summary.rounds,
        generated = summary.generated,
        failed = summary.failed,
        "generation finished"
    );
    Ok(summary)
}
