//! Call-scoped correlation context
//!
//! Every outbound call runs inside a task-local [`CorrelationContext`]. The
//! context is visible through [`current_call_context`] for the dynamic extent
//! of the call only: the scope is released when the call's future completes,
//! fails, panics or is dropped.

use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use super::ApiType;

tokio::task_local! {
    static CALL_CONTEXT: CorrelationContext;
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Metadata of the outbound call currently in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationContext {
    pub correlation_id: String,
    pub api_type: ApiType,
    pub provider: String,
    pub operation: String,
    pub user_id: Option<i64>,
    pub project_id: Option<i64>,
}

/// Generate a short id for log correlation.
///
/// Base-36 milliseconds since the epoch, a dash, then four random base-36
/// characters. Not guaranteed unique; collisions need the same millisecond
/// and the same random suffix.
pub fn generate_correlation_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    format!("{}-{}", to_base36(millis), suffix)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Context of the enclosing outbound call, if any
pub fn current_call_context() -> Option<CorrelationContext> {
    CALL_CONTEXT.try_with(|context| context.clone()).ok()
}

/// Correlation id of the enclosing outbound call, if any
pub fn current_correlation_id() -> Option<String> {
    CALL_CONTEXT
        .try_with(|context| context.correlation_id.clone())
        .ok()
}

/// Run `future` with `context` as the current call context
pub(crate) async fn scope<F>(context: CorrelationContext, future: F) -> F::Output
where
    F: Future,
{
    CALL_CONTEXT.scope(context, future).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn context(id: &str) -> CorrelationContext {
        CorrelationContext {
            correlation_id: id.to_string(),
            api_type: ApiType::Webhook,
            provider: "Slack".to_string(),
            operation: "webhook_call".to_string(),
            user_id: Some(7),
            project_id: None,
        }
    }

    #[test]
    fn test_correlation_id_format() {
        let id = generate_correlation_id();
        let (time_part, random_part) = id.split_once('-').expect("id should contain a dash");

        assert!(!time_part.is_empty());
        assert_eq!(random_part.len(), 4);
        assert!(id.chars().all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_correlation_ids_rarely_collide() {
        let ids: HashSet<String> = (0..200).map(|_| generate_correlation_id()).collect();
        // 200 ids within a few milliseconds share the time part; the suffix
        // still keeps collisions rare
        assert!(ids.len() >= 195);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_000), "rs");
    }

    #[tokio::test]
    async fn test_context_visible_only_inside_scope() {
        assert!(current_call_context().is_none());

        let seen = scope(context("abc-0000"), async { current_call_context() }).await;

        assert_eq!(seen, Some(context("abc-0000")));
        assert!(current_call_context().is_none());
        assert!(current_correlation_id().is_none());
    }

    #[tokio::test]
    async fn test_nested_scopes_restore_outer_context() {
        let ids = scope(context("outer"), async {
            let inner = scope(context("inner"), async { current_correlation_id() }).await;
            (inner, current_correlation_id())
        })
        .await;

        assert_eq!(ids, (Some("inner".to_string()), Some("outer".to_string())));
    }

    #[tokio::test]
    async fn test_concurrent_tasks_have_isolated_contexts() {
        let first = tokio::spawn(scope(context("first"), async {
            tokio::task::yield_now().await;
            current_correlation_id()
        }));
        let second = tokio::spawn(scope(context("second"), async {
            tokio::task::yield_now().await;
            current_correlation_id()
        }));

        assert_eq!(first.await.unwrap(), Some("first".to_string()));
        assert_eq!(second.await.unwrap(), Some("second".to_string()));
    }
}
