//! End-to-end Model Request Tests
//!
//! Client connection -> provider dispatcher -> producer, with the client's
//! cancellation signal flowing through the cross-version handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::TempDir;
use tooling_link::{CancelTimer, CancellationSignal, ClientConfig, ExitKind, ModelError, ProviderConnection};
use tooling_protocol::{interfaces, BuildParameters, ModelIdentifier};
use tooling_provider::producers::{PROVIDER_INFO_MODEL, WORKSPACE_INVENTORY_MODEL};
use tooling_provider::{
    BuildContext, BuildError, ModelProducer, ModelRequestDispatcher, ProducerRegistry, ProviderConfig,
};

/// Producer that registers a cancellation callback, then waits for it.
struct WaitForCancel {
    registered: mpsc::SyncSender<()>,
    callback_ran: Arc<AtomicBool>,
}

impl ModelProducer for WaitForCancel {
    fn matches(&self, model: &str) -> bool {
        model == "test.model.Slow"
    }

    fn models(&self) -> Vec<String> {
        vec!["test.model.Slow".to_string()]
    }

    fn build(&self, _model: &ModelIdentifier, context: &BuildContext<'_>) -> Result<Value, BuildError> {
        let token = context.cancellation();
        let (tx, rx) = mpsc::channel::<()>();
        let flag = Arc::clone(&self.callback_ran);
        let already = token.add_callback(Box::new(move || {
            flag.store(true, Ordering::SeqCst);
            let _ = tx.send(());
            Ok(())
        }));
        let _ = self.registered.send(());

        if !already {
            rx.recv_timeout(Duration::from_secs(10))
                .map_err(|e| BuildError::caused_by("cancellation never arrived", e))?;
        }
        token.ensure_not_cancelled()?;
        Ok(json!("finished"))
    }
}

fn connect(dispatcher: ModelRequestDispatcher) -> ProviderConnection {
    let descriptor = dispatcher.descriptor().clone();
    ProviderConnection::connect(Arc::new(dispatcher), descriptor, &ClientConfig::default()).unwrap()
}

fn slow_connection() -> (ProviderConnection, mpsc::Receiver<()>, Arc<AtomicBool>) {
    let (registered, on_registered) = mpsc::sync_channel(1);
    let callback_ran = Arc::new(AtomicBool::new(false));

    let mut registry = ProducerRegistry::new();
    registry.register(Arc::new(WaitForCancel {
        registered,
        callback_ran: Arc::clone(&callback_ran),
    }));

    let dispatcher = ModelRequestDispatcher::new(registry, &ProviderConfig::default());
    (connect(dispatcher), on_registered, callback_ran)
}

#[test]
fn test_builtin_provider_info_end_to_end() {
    let connection = connect(ModelRequestDispatcher::with_builtin(&ProviderConfig::default()));
    let signal = Arc::new(CancellationSignal::new());

    let model = connection
        .get_model(ModelIdentifier::new(PROVIDER_INFO_MODEL), &signal, BuildParameters::new())
        .unwrap();

    let interfaces_listed = model["interfaces"].as_array().unwrap();
    assert!(interfaces_listed.contains(&json!(interfaces::CANCELLATION_V1)));
    assert!(!signal.is_cancellation_requested());
}

#[test]
fn test_workspace_inventory_end_to_end() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("a.rs"), "fn main() {}").unwrap();
    std::fs::create_dir(temp.path().join("src")).unwrap();
    std::fs::write(temp.path().join("src").join("lib.rs"), "").unwrap();

    let config = ProviderConfig {
        workspace_root: temp.path().to_path_buf(),
        ..ProviderConfig::default()
    };
    let connection = connect(ModelRequestDispatcher::with_builtin(&config));
    let signal = Arc::new(CancellationSignal::new());

    let model = connection
        .get_model(ModelIdentifier::new(WORKSPACE_INVENTORY_MODEL), &signal, BuildParameters::new())
        .unwrap();
    assert_eq!(model["files"], json!(2));
    assert_eq!(model["directories"], json!(1));
}

#[test]
fn test_cancel_before_request_yields_cancelled_failure() {
    let connection = connect(ModelRequestDispatcher::with_builtin(&ProviderConfig::default()));
    let signal = Arc::new(CancellationSignal::new());
    signal.cancel().unwrap();

    let err = connection
        .get_model(ModelIdentifier::new(WORKSPACE_INVENTORY_MODEL), &signal, BuildParameters::new())
        .unwrap_err();

    assert_eq!(err.exit_kind(), ExitKind::Cancelled);
}

#[test]
fn test_client_cancel_reaches_provider_callback() {
    let (connection, on_registered, callback_ran) = slow_connection();
    let signal = Arc::new(CancellationSignal::new());

    let canceller = {
        let signal = Arc::clone(&signal);
        thread::spawn(move || {
            on_registered.recv_timeout(Duration::from_secs(10)).unwrap();
            signal.cancel().unwrap();
        })
    };

    let err = connection
        .get_model(ModelIdentifier::new("test.model.Slow"), &signal, BuildParameters::new())
        .unwrap_err();
    canceller.join().expect("Thread panicked");

    assert!(callback_ran.load(Ordering::SeqCst));
    assert!(matches!(err, ModelError::Cancelled(ref failure) if failure.cancelled));
}

#[test]
fn test_provider_callback_after_cancel_runs_immediately() {
    let (connection, _on_registered, callback_ran) = slow_connection();
    let signal = Arc::new(CancellationSignal::new());
    signal.cancel().unwrap();

    let err = connection
        .get_model(ModelIdentifier::new("test.model.Slow"), &signal, BuildParameters::new())
        .unwrap_err();

    assert!(callback_ran.load(Ordering::SeqCst));
    assert_eq!(err.exit_kind(), ExitKind::Cancelled);
}

#[test]
fn test_timeout_cancels_request() {
    let (connection, _on_registered, callback_ran) = slow_connection();
    let signal = Arc::new(CancellationSignal::new());
    let timer = CancelTimer::start(Arc::clone(&signal), Duration::from_millis(50));

    let err = connection
        .get_model(ModelIdentifier::new("test.model.Slow"), &signal, BuildParameters::new())
        .unwrap_err();

    assert!(timer.disarm());
    assert!(callback_ran.load(Ordering::SeqCst));
    assert_eq!(err.exit_kind(), ExitKind::Cancelled);
}

#[test]
fn test_unknown_model_and_option() {
    let connection = connect(ModelRequestDispatcher::with_builtin(&ProviderConfig::default()));
    let signal = Arc::new(CancellationSignal::new());

    let err = connection
        .get_model(ModelIdentifier::new("no.such.Model"), &signal, BuildParameters::new())
        .unwrap_err();
    assert!(matches!(err, ModelError::UnsupportedModel { .. }));

    let err = connection
        .get_model(
            ModelIdentifier::new(PROVIDER_INFO_MODEL),
            &signal,
            BuildParameters::new().with_argument("--offline"),
        )
        .unwrap_err();
    assert_eq!(err.exit_kind(), ExitKind::Unsupported);
}

#[test]
fn test_stopped_provider_reports_illegal_state() {
    let dispatcher = Arc::new(ModelRequestDispatcher::with_builtin(&ProviderConfig::default()));
    let connection =
        ProviderConnection::connect(dispatcher.clone(), dispatcher.descriptor().clone(), &ClientConfig::default())
            .unwrap();
    dispatcher.stop();

    let signal = Arc::new(CancellationSignal::new());
    let err = connection
        .get_model(ModelIdentifier::new(PROVIDER_INFO_MODEL), &signal, BuildParameters::new())
        .unwrap_err();
    assert_eq!(err.exit_kind(), ExitKind::IllegalState);
}
