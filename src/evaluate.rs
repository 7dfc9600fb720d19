use crate::{CapacityError, ScriptEvaluator};
use boa_engine::{Context, Source};
use tracing::debug;

const LOOP_ITERATION_LIMIT: u64 = 1_000_000;
const RECURSION_LIMIT: usize = 512;

/// ECMAScript-only interpreter. Every call gets a fresh `Context`, which
/// carries the language built-ins and nothing that reaches the host.
#[derive(Debug, Clone)]
pub struct BoaEvaluator {
    data_variable: String,
}

impl BoaEvaluator {
    pub fn new<S: Into<String>>(data_variable: S) -> BoaEvaluator {
        BoaEvaluator {
            data_variable: data_variable.into(),
        }
    }
}

/// Runs `snippet` in its own function scope and serializes `data_variable`
/// with the interpreter's `JSON.stringify`, so the script result is already
/// JSON text when it leaves the engine.
pub fn wrap_snippet(snippet: &str, data_variable: &str) -> String {
    format!(
        "JSON.stringify((function() {{ {} return {}; }})())",
        snippet, data_variable
    )
}

/// Evaluates `source`, which must produce a string of JSON text, and returns
/// it with every backslash removed.
pub fn evaluate_script(source: &str) -> Result<String, CapacityError> {
    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(LOOP_ITERATION_LIMIT);
    context.runtime_limits_mut().set_recursion_limit(RECURSION_LIMIT);

    let value = context
        .eval(Source::from_bytes(source))
        .map_err(failed)?;
    // `undefined` and functions stringify to `undefined`, not text.
    let text = value
        .as_string()
        .ok_or_else(|| {
            CapacityError::EvaluationFailed(format!(
                "value is not serializable: {}",
                value.type_of()
            ))
        })?
        .to_std_string()
        .map_err(failed)?;

    Ok(text.replace('\\', ""))
}

fn failed<E: std::fmt::Display>(e: E) -> CapacityError {
    CapacityError::EvaluationFailed(e.to_string())
}

#[async_trait::async_trait]
impl ScriptEvaluator for BoaEvaluator {
    async fn evaluate(&self, snippet: &str) -> Result<String, CapacityError> {
        let source = wrap_snippet(snippet, &self.data_variable);
        debug!("Evaluating {} bytes of script", source.len());
        tokio::task::spawn_blocking(move || evaluate_script(&source))
            .await
            .map_err(failed)?
    }
}
