use super::{AgentError, StepEvent, StepStream};
use tracing::debug;

/// A run that failed part way, with the replies produced before the failure.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct IncompleteRun {
    pub responses: Vec<String>,
    #[source]
    pub error: AgentError,
}

/// Flattens reasoning steps into the text replies sent back to the caller.
pub struct ResponseAggregator;

impl ResponseAggregator {
    /// One string per agent or tool step, in emission order. Steps without
    /// text are skipped rather than failing the request.
    pub fn collect_steps<I>(steps: I) -> Vec<String>
    where
        I: IntoIterator<Item = StepEvent>,
    {
        steps.into_iter().filter_map(Self::extract).collect()
    }

    /// Drains `stream` to completion. On failure the replies gathered so far
    /// travel with the error, since a tool may already have moved funds.
    pub async fn collect(mut stream: StepStream<'_>) -> Result<Vec<String>, IncompleteRun> {
        let mut responses = Vec::new();
        while let Some(step) = stream.next_step().await {
            match step {
                Ok(step) => responses.extend(Self::extract(step)),
                Err(error) => return Err(IncompleteRun { responses, error }),
            }
        }
        Ok(responses)
    }

    fn extract(step: StepEvent) -> Option<String> {
        match step {
            StepEvent::Agent { text } | StepEvent::Tool { text, .. } => Some(text),
            other => {
                debug!("skipping step without text: {:?}", other);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(text: &str) -> StepEvent {
        StepEvent::Agent { text: text.into() }
    }

    fn tool(text: &str) -> StepEvent {
        StepEvent::Tool {
            name: "get_balance".into(),
            text: text.into(),
        }
    }

    #[test]
    fn keeps_interleaving_order() {
        let steps = vec![agent("x"), tool("y"), agent("z")];
        assert_eq!(ResponseAggregator::collect_steps(steps), ["x", "y", "z"]);
    }

    #[test]
    fn empty_sequence_yields_nothing() {
        assert!(ResponseAggregator::collect_steps(Vec::new()).is_empty());
    }

    #[test]
    fn skips_steps_without_text() {
        let steps = vec![
            agent(""),
            tool("y"),
            StepEvent::Checkpoint {
                thread_id: "t".into(),
                messages: 3,
            },
        ];
        assert_eq!(ResponseAggregator::collect_steps(steps), ["", "y"]);
    }
}
