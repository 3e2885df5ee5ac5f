use conjure_context::{Collector, Context};
use conjure_generator::{build_prompt, CommandGenerator, Generation, GeneratorError};
use conjure_history::HistoryStore;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Observable pipeline state. `Success` and `Error` are retired back to
/// `Idle` by the next invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loading,
    Success,
    Error,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Loading => "loading",
            PipelineState::Success => "success",
            PipelineState::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Request is empty")]
    EmptyRequest,

    #[error("A generation is already in flight")]
    Busy,

    #[error(transparent)]
    Model(#[from] GeneratorError),

    #[error("The model produced no usable command")]
    EmptyGeneration,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The generated shell command.
    pub command: String,
    /// History after recording the request, most recent first.
    pub history: Vec<String>,
}

/// Sequences one generation: collect context, build the prompt, call the
/// generator, record the request on success. Exactly one run may be in
/// flight; context and prompt live only for that run, and history is the
/// only state that outlives it.
pub struct Pipeline {
    collector: Option<Collector>,
    generator: Arc<dyn CommandGenerator>,
    history: HistoryStore,
    state: Mutex<PipelineState>,
    gate: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        collector: Option<Collector>,
        generator: Arc<dyn CommandGenerator>,
        history: HistoryStore,
    ) -> Self {
        Self {
            collector,
            generator,
            history,
            state: Mutex::new(PipelineState::Idle),
            gate: Mutex::new(()),
        }
    }

    pub async fn state(&self) -> PipelineState {
        *self.state.lock().await
    }

    /// Run the pipeline for one request.
    ///
    /// An empty (after trimming) request fails validation without ever
    /// entering `Loading`; a request while another run is in flight is
    /// rejected with [`PipelineError::Busy`] and changes nothing. History
    /// is touched only when the generator yields a non-empty command.
    pub async fn run(&self, request: &str) -> Result<Outcome, PipelineError> {
        // a new invocation retires the previous run's terminal state
        {
            let mut state = self.state.lock().await;
            if matches!(*state, PipelineState::Success | PipelineState::Error) {
                *state = PipelineState::Idle;
            }
        }

        let request = request.trim();
        if request.is_empty() {
            return Err(PipelineError::EmptyRequest);
        }

        let Ok(_guard) = self.gate.try_lock() else {
            return Err(PipelineError::Busy);
        };
        self.set_state(PipelineState::Loading).await;

        let context = match &self.collector {
            Some(collector) => collector.collect().await,
            None => Context::default(),
        };
        debug!(
            app = context.foreground_app.as_deref().unwrap_or("-"),
            cwd = context.working_directory.as_deref().unwrap_or("-"),
            has_selection = context.selected_text.is_some(),
            "Context collected"
        );

        let prompt = build_prompt(request, &context);

        match self.generator.generate(&prompt).await {
            Ok(Generation::Command(command)) => {
                let history = self.history.record(request).await;
                self.set_state(PipelineState::Success).await;
                info!(generator = self.generator.name(), command = %command, "Command generated");
                Ok(Outcome { command, history })
            }
            Ok(Generation::Empty) => {
                self.set_state(PipelineState::Error).await;
                Err(PipelineError::EmptyGeneration)
            }
            Err(e) => {
                self.set_state(PipelineState::Error).await;
                warn!(generator = self.generator.name(), error = %e, "Generation failed");
                Err(PipelineError::Model(e))
            }
        }
    }

    async fn set_state(&self, state: PipelineState) {
        *self.state.lock().await = state;
    }
}
