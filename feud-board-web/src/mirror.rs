use serde_json::Value;

use crate::diagnostics::{Diagnostic, Diagnostics, LogDiagnostics};
use crate::dom::Document;
use crate::render::{Renderer, Snapshot, TeamWidgets};

/// The outcome of applying one snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl RenderReport {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Renders every received snapshot into the page.
///
/// A snapshot runs through all hooks in the order they were added, then through the built-in
/// [`TeamWidgets`]. A failing step is reported and never stops the steps after it.
pub struct StateMirror<D> {
    hooks: Vec<Box<dyn Renderer>>,
    teams: TeamWidgets<D>,
    diagnostics: Box<dyn Diagnostics>,
}

impl<D> StateMirror<D>
where
    D: Document,
{
    pub fn builder(document: D) -> StateMirrorBuilder<D> {
        StateMirrorBuilder::new(document)
    }

    /// Decodes and renders a raw payload.
    pub fn apply_value(&mut self, raw: Value) -> RenderReport {
        let state = match Snapshot::parse_state(&raw) {
            Ok(state) => state,
            Err(err) => {
                self.report(Diagnostic::InvalidSnapshot(err));
                None
            }
        };

        self.apply(&Snapshot::new(raw, state))
    }

    pub fn apply(&mut self, snapshot: &Snapshot) -> RenderReport {
        let mut report = RenderReport::default();

        for hook in self.hooks.iter_mut() {
            run_step(&mut **hook, snapshot, &mut report, &mut *self.diagnostics);
        }

        run_step(&mut self.teams, snapshot, &mut report, &mut *self.diagnostics);

        report
    }

    #[inline]
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.report(diagnostic);
    }
}

fn run_step(
    renderer: &mut dyn Renderer,
    snapshot: &Snapshot,
    report: &mut RenderReport,
    diagnostics: &mut dyn Diagnostics,
) {
    let name = renderer.name().to_owned();

    match renderer.render(snapshot) {
        Ok(()) => report.succeeded.push(name),
        Err(error) => {
            report.failed.push(name.clone());
            diagnostics.report(Diagnostic::RenderFailed {
                renderer: name,
                error,
            });
        }
    }
}

/// Builder for a [`StateMirror`].
pub struct StateMirrorBuilder<D> {
    document: D,
    hooks: Vec<Box<dyn Renderer>>,
    diagnostics: Option<Box<dyn Diagnostics>>,
}

impl<D> StateMirrorBuilder<D>
where
    D: Document,
{
    pub fn new(document: D) -> Self {
        Self {
            document,
            hooks: Vec::new(),
            diagnostics: None,
        }
    }

    /// Appends a hook running before the built-in team widgets.
    pub fn hook<R>(mut self, hook: R) -> Self
    where
        R: Renderer + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Sets the diagnostics sink. Defaults to [`LogDiagnostics`].
    pub fn diagnostics<T>(mut self, diagnostics: T) -> Self
    where
        T: Diagnostics + 'static,
    {
        self.diagnostics = Some(Box::new(diagnostics));
        self
    }

    pub fn build(self) -> StateMirror<D> {
        StateMirror {
            hooks: self.hooks,
            teams: TeamWidgets::new(self.document),
            diagnostics: self
                .diagnostics
                .unwrap_or_else(|| Box::new(LogDiagnostics)),
        }
    }
}
