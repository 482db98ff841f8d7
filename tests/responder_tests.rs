//! Fallback-chain behavior of the AI responder.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tars::ai::backend::{BackendError, ChatBackend, ChatParams, Message};
use tars::ai::prompts::Persona;
use tars::ai::responder::{AiResponder, ALL_FAILED_MSG, NO_BACKEND_MSG};
use tars::ai::ChatResponder;

enum Script {
    Succeed(&'static str),
    Fail,
    Hang,
}

struct ScriptedBackend {
    name: &'static str,
    script: Script,
    calls: Arc<AtomicUsize>,
    timeout: Duration,
}

impl ScriptedBackend {
    fn new(name: &'static str, script: Script) -> (Box<dyn ChatBackend>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = Box::new(Self {
            name,
            script,
            calls: Arc::clone(&calls),
            timeout: Duration::from_millis(50),
        });
        (backend, calls)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn invoke(
        &self,
        _messages: &[Message],
        _params: &ChatParams,
    ) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Succeed(reply) => Ok(reply.to_string()),
            Script::Fail => Err(BackendError::ApiError {
                status: 500,
                message: "boom".to_string(),
            }),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("too late".to_string())
            }
        }
    }
}

#[tokio::test]
async fn first_success_short_circuits_the_chain() {
    let (first, first_calls) = ScriptedBackend::new("first", Script::Succeed("from first"));
    let (second, second_calls) = ScriptedBackend::new("second", Script::Succeed("from second"));

    let responder = AiResponder::with_backends(vec![first, second], Persona::Assistant, 20);
    let reply = responder.get_response("hello", 0.5, 0.5, "english").await;

    assert_eq!(reply, "from first");
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[test_log::test(tokio::test)]
async fn failure_falls_through_to_next_backend() {
    let (first, first_calls) = ScriptedBackend::new("first", Script::Fail);
    let (second, second_calls) = ScriptedBackend::new("second", Script::Succeed("backup"));
    let (third, third_calls) = ScriptedBackend::new("third", Script::Succeed("never"));

    let responder = AiResponder::with_backends(vec![first, second, third], Persona::Assistant, 20);
    let reply = responder.get_response("hello", 0.5, 0.5, "english").await;

    assert_eq!(reply, "backup");
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    assert_eq!(third_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn hung_backend_times_out_and_falls_through() {
    let (first, _) = ScriptedBackend::new("first", Script::Hang);
    let (second, second_calls) = ScriptedBackend::new("second", Script::Succeed("rescued"));

    let responder = AiResponder::with_backends(vec![first, second], Persona::Assistant, 20);
    let reply = responder.get_response("hello", 0.5, 0.5, "english").await;

    assert_eq!(reply, "rescued");
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[test_log::test(tokio::test)]
async fn all_failures_yield_the_fried_message() {
    let (first, _) = ScriptedBackend::new("first", Script::Fail);
    let (second, _) = ScriptedBackend::new("second", Script::Fail);

    let responder = AiResponder::with_backends(vec![first, second], Persona::Assistant, 20);
    let reply = responder.get_response("hello", 0.5, 0.5, "english").await;
    assert_eq!(reply, ALL_FAILED_MSG);
}

#[tokio::test]
async fn no_backends_yield_the_offline_message() {
    let responder = AiResponder::with_backends(Vec::new(), Persona::Assistant, 20);
    let reply = responder.get_response("hello", 0.5, 0.5, "english").await;
    assert_eq!(reply, NO_BACKEND_MSG);
}

#[tokio::test]
async fn failed_exchanges_stay_out_of_history() {
    let (first, _) = ScriptedBackend::new("first", Script::Fail);
    let responder = AiResponder::with_backends(vec![first], Persona::Assistant, 20);

    let reply = responder.get_response("hello", 0.5, 0.5, "english").await;
    assert_eq!(reply, ALL_FAILED_MSG);

    // A later clear on empty history must be a no-op, not a panic.
    responder.clear_history();
}
