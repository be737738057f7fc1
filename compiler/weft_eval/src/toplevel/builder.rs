//! `ToplevelBuilder` for creating sessions with various configurations.

use std::sync::Arc;

use weft_ir::{SharedInterner, StringInterner};
use weft_runtime::{DiagnosticSink, Runtime};

use super::natives::NativeTable;
use super::Toplevel;
use crate::backend::{Compiler, Expander, Interpreter, SourceParser};
use crate::config::{EvalConfig, SessionNames};
use crate::context::EvalContext;

/// Builder for [`Toplevel`] sessions.
///
/// The three evaluation collaborators are required; the parser is only
/// needed for [`Toplevel::eval_source`] and [`Toplevel::load_file`].
pub struct ToplevelBuilder {
    expander: Box<dyn Expander>,
    interpreter: Box<dyn Interpreter>,
    compiler: Box<dyn Compiler>,
    parser: Option<Box<dyn SourceParser>>,
    interner: Option<SharedInterner>,
    config: EvalConfig,
}

impl ToplevelBuilder {
    pub fn new(
        expander: impl Expander + 'static,
        interpreter: impl Interpreter + 'static,
        compiler: impl Compiler + 'static,
    ) -> Self {
        ToplevelBuilder {
            expander: Box::new(expander),
            interpreter: Box::new(interpreter),
            compiler: Box::new(compiler),
            parser: None,
            interner: None,
            config: EvalConfig::default(),
        }
    }

    /// Use one backend for expansion, interpretation, and compilation.
    pub fn with_backend<B>(backend: B) -> Self
    where
        B: Expander + Interpreter + Compiler + Clone + 'static,
    {
        Self::new(backend.clone(), backend.clone(), backend)
    }

    #[must_use]
    pub fn parser(mut self, parser: impl SourceParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Share an interner with the parser or other sessions.
    #[must_use]
    pub fn interner(mut self, interner: SharedInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    #[must_use]
    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Compile bodies with backward branches in fast mode. On by default.
    #[must_use]
    pub fn compile_loops(mut self, enabled: bool) -> Self {
        self.config.compile_loops = enabled;
        self
    }

    /// Where warnings go. Stderr by default.
    #[must_use]
    pub fn diagnostics(mut self, sink: DiagnosticSink) -> Self {
        self.config.diagnostics = sink;
        self
    }

    /// Create the runtime (root module and `Core`) and the session, starting
    /// in the root module.
    pub fn build(self) -> Toplevel {
        let interner = self
            .interner
            .unwrap_or_else(|| Arc::new(StringInterner::new()));
        let names = SessionNames::intern(&self.config, &interner);
        let rt = Runtime::new(
            interner,
            &self.config.names,
            self.config.diagnostics.clone(),
        );
        let ctx = EvalContext::at(rt.root());
        Toplevel {
            rt,
            ctx,
            config: self.config,
            names,
            expander: self.expander,
            interpreter: self.interpreter,
            compiler: self.compiler,
            parser: self.parser,
            natives: NativeTable::default(),
            pending_init: Vec::new(),
            loader: None,
        }
    }
}
