//! V8 JavaScript runtime using deno_core
//!
//! Every run gets a fresh isolate on a dedicated thread (isolates are
//! `!Send`). A watchdog thread terminates the isolate when the wall-clock
//! budget runs out and a near-heap-limit callback does the same when the
//! heap fills up, so neither a busy loop nor a runaway allocation can take
//! the host down.

mod ops;

use crate::error::EngineError;
use crate::host::HostSurface;
use crate::limits::SandboxLimits;
use crate::policy::CapabilityPolicy;
use crate::runtime::{SandboxReport, ScriptRuntime};
use async_trait::async_trait;
use deno_core::{v8, JsRuntime, PollEventLoopOptions, RuntimeOptions};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

pub use ops::create_host_extension;

const PRELUDE: &str = include_str!("prelude.js");

/// Builds the host surface handed to each run
pub type HostFactory = Arc<dyn Fn(&SandboxLimits) -> HostSurface + Send + Sync>;

/// V8 JavaScript runtime
pub struct V8Runtime {
    limits: SandboxLimits,
    policy: CapabilityPolicy,
    base_url: String,
    host_factory: HostFactory,
    semaphore: Arc<Semaphore>,
}

impl V8Runtime {
    /// Create a runtime with the inert host surface
    pub fn new(limits: SandboxLimits) -> Self {
        let semaphore = Arc::new(Semaphore::new(limits.max_concurrent.max(1)));
        Self {
            limits,
            policy: CapabilityPolicy::default(),
            base_url: "http://localhost/".to_string(),
            host_factory: Arc::new(HostSurface::inert),
            semaphore,
        }
    }

    pub fn with_policy(mut self, policy: CapabilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// URL scripts see as `window.location`
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Swap in custom console/document/window stand-ins
    pub fn with_host_factory(mut self, factory: HostFactory) -> Self {
        self.host_factory = factory;
        self
    }

    pub fn limits(&self) -> &SandboxLimits {
        &self.limits
    }
}

impl Default for V8Runtime {
    fn default() -> Self {
        Self::new(SandboxLimits::default())
    }
}

#[async_trait]
impl ScriptRuntime for V8Runtime {
    async fn run(&self, source: &str) -> SandboxReport {
        let _permit = match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                return SandboxReport::failed(EngineError::SandboxSetup(
                    "sandbox pool is closed".to_string(),
                ))
            }
        };

        let job = SandboxJob {
            source: source.to_string(),
            limits: self.limits.clone(),
            prelude_config: prelude_config(&self.limits, &self.policy, &self.base_url),
            host: (self.host_factory)(&self.limits),
        };

        let (tx, rx) = tokio::sync::oneshot::channel();
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    let report = SandboxReport::failed(EngineError::SandboxSetup(e.to_string()));
                    if tx.send(report).is_err() {
                        tracing::warn!("Sandbox result receiver dropped");
                    }
                    return;
                }
            };
            let report = rt.block_on(run_job(job));
            if tx.send(report).is_err() {
                tracing::warn!("Sandbox result receiver dropped before result was sent");
            }
        });

        rx.await.unwrap_or_else(|_| {
            SandboxReport::failed(EngineError::SandboxSetup(
                "sandbox thread panicked".to_string(),
            ))
        })
    }

    fn name(&self) -> &str {
        "v8"
    }
}

struct SandboxJob {
    source: String,
    limits: SandboxLimits,
    prelude_config: serde_json::Value,
    host: HostSurface,
}

fn prelude_config(
    limits: &SandboxLimits,
    policy: &CapabilityPolicy,
    base_url: &str,
) -> serde_json::Value {
    serde_json::json!({
        "maxTimeoutDelay": limits.max_timeout_delay.as_millis() as u64,
        "minIntervalPeriod": limits.min_interval_period.as_millis() as u64,
        "allowedGlobals": policy.allowed_globals().collect::<Vec<_>>(),
        "baseUrl": base_url,
    })
}

/// State for the near-heap-limit callback
struct HeapLimitState {
    handle: v8::IsolateHandle,
    triggered: AtomicBool,
}

/// Terminates execution and grants 1MB so the termination can unwind
extern "C" fn near_heap_limit_callback(
    data: *mut std::ffi::c_void,
    current_heap_limit: usize,
    _initial_heap_limit: usize,
) -> usize {
    // SAFETY: `data` points to the boxed HeapLimitState in `run_job`, which
    // outlives the isolate.
    let state = unsafe { &*(data as *const HeapLimitState) };
    if !state.triggered.swap(true, Ordering::SeqCst) {
        state.handle.terminate_execution();
    }
    current_heap_limit + 1024 * 1024
}

/// Completion record returned by the control object's `run`
#[derive(Debug, Deserialize)]
struct Completion {
    ok: bool,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Argument passed to a control method
enum ControlArg<'a> {
    Nothing,
    Source(&'a str),
    Millis(u64),
}

/// Run one job on the current thread
async fn run_job(job: SandboxJob) -> SandboxReport {
    let SandboxJob {
        source,
        limits,
        prelude_config,
        host,
    } = job;
    let start = Instant::now();

    let create_params = v8::CreateParams::default().heap_limits(0, limits.max_heap_bytes);
    let mut runtime = JsRuntime::new(RuntimeOptions {
        extensions: vec![create_host_extension()],
        create_params: Some(create_params),
        ..Default::default()
    });
    runtime.op_state().borrow_mut().put(host);

    let heap_state = Box::new(HeapLimitState {
        handle: runtime.v8_isolate().thread_safe_handle(),
        triggered: AtomicBool::new(false),
    });
    runtime.v8_isolate().add_near_heap_limit_callback(
        near_heap_limit_callback,
        &*heap_state as *const HeapLimitState as *mut std::ffi::c_void,
    );

    let watchdog_handle = runtime.v8_isolate().thread_safe_handle();
    let timed_out = Arc::new(AtomicBool::new(false));
    let watchdog_timed_out = timed_out.clone();
    let timeout = limits.timeout;
    let (cancel_tx, cancel_rx) = std::sync::mpsc::channel::<()>();
    let watchdog = std::thread::spawn(move || {
        if let Err(std::sync::mpsc::RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(timeout) {
            watchdog_timed_out.store(true, Ordering::SeqCst);
            watchdog_handle.terminate_execution();
        }
    });

    let outcome = drive(&mut runtime, &limits, &prelude_config, &source, &timed_out).await;

    // The watchdog must be gone before the isolate it points at
    let _ = cancel_tx.send(());
    let _ = watchdog.join();

    let host = runtime.op_state().borrow_mut().try_take::<HostSurface>();
    drop(runtime);

    let mut report = SandboxReport {
        lines: host.map(HostSurface::into_lines).unwrap_or_default(),
        elapsed: start.elapsed(),
        ..SandboxReport::default()
    };

    if heap_state.triggered.load(Ordering::SeqCst) {
        report.failure = Some(EngineError::HeapLimitExceeded {
            limit_mb: limits.max_heap_bytes / (1024 * 1024),
        });
    } else if timed_out.load(Ordering::SeqCst) {
        report.failure = Some(EngineError::SandboxTimeout {
            timeout_ms: limits.timeout.as_millis() as u64,
        });
    } else {
        match outcome {
            Ok(cancelled) => report.cancelled_timers = cancelled,
            Err(e) => report.failure = Some(e),
        }
    }

    tracing::debug!(
        lines = report.lines.len(),
        cancelled_timers = report.cancelled_timers,
        failed = report.failure.is_some(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Sandbox run finished"
    );
    report
}

/// Bootstrap the surface, evaluate the source, then emulate timers.
/// Returns the number of timers cancelled at the end.
async fn drive(
    runtime: &mut JsRuntime,
    limits: &SandboxLimits,
    prelude_config: &serde_json::Value,
    source: &str,
    timed_out: &AtomicBool,
) -> Result<usize, EngineError> {
    let bootstrap = format!("{}(Deno.core, {});", PRELUDE.trim_end(), prelude_config);
    let returned = runtime
        .execute_script("[workbench:prelude]", bootstrap)
        .map_err(|e| EngineError::SandboxSetup(e.to_string()))?;
    let control = control_object(runtime, returned)?;

    let raw = call_control(runtime, &control, "run", ControlArg::Source(source))?;
    let completion: Completion = serde_json::from_str(&raw)
        .map_err(|e| EngineError::SandboxSetup(format!("malformed completion: {}", e)))?;

    if !completion.ok {
        return Err(EngineError::SandboxRuntime(
            completion.error.unwrap_or_else(|| "Unknown error".to_string()),
        ));
    }
    if let Some(value) = completion.value {
        runtime
            .op_state()
            .borrow_mut()
            .borrow_mut::<HostSurface>()
            .record_completion(&value);
    }

    let horizon_ms = limits.timer_horizon.as_millis() as u64;
    let mut fired = 0;
    if settle(runtime, limits, timed_out).await? {
        while fired < limits.max_timer_callbacks {
            let status = call_control(runtime, &control, "tick", ControlArg::Millis(horizon_ms))?;
            if status != "fired" {
                break;
            }
            fired += 1;
            if !settle(runtime, limits, timed_out).await? {
                break;
            }
        }
    }

    let cancelled = call_control(runtime, &control, "cancelAll", ControlArg::Nothing)?
        .parse()
        .unwrap_or(0);
    if cancelled > 0 {
        tracing::debug!(fired, cancelled, "Cancelled pending timers");
    }
    Ok(cancelled)
}

/// Drain microtasks and pending ops.
///
/// A rejection that escapes the event loop is recorded as an error line and
/// stops further timer emulation; returns false in that case.
async fn settle(
    runtime: &mut JsRuntime,
    limits: &SandboxLimits,
    timed_out: &AtomicBool,
) -> Result<bool, EngineError> {
    let polled = tokio::time::timeout(
        limits.timeout,
        runtime.run_event_loop(PollEventLoopOptions::default()),
    )
    .await;

    match polled {
        Ok(Ok(())) => Ok(true),
        Ok(Err(e)) => {
            if timed_out.load(Ordering::SeqCst) {
                return Err(EngineError::SandboxRuntime(e.to_string()));
            }
            runtime
                .op_state()
                .borrow_mut()
                .borrow_mut::<HostSurface>()
                .log(crate::host::ConsoleLevel::Error, &e.to_string());
            Ok(false)
        }
        Err(_) => Err(EngineError::SandboxTimeout {
            timeout_ms: limits.timeout.as_millis() as u64,
        }),
    }
}

/// Keep the object the prelude returned as a persistent handle
fn control_object(
    runtime: &mut JsRuntime,
    returned: v8::Global<v8::Value>,
) -> Result<v8::Global<v8::Object>, EngineError> {
    let scope = &mut runtime.handle_scope();
    let local = v8::Local::new(scope, returned);
    let object = v8::Local::<v8::Object>::try_from(local).map_err(|_| {
        EngineError::SandboxSetup("prelude did not return its control object".to_string())
    })?;
    Ok(v8::Global::new(scope, object))
}

/// Call `method` on the control object and stringify the result
fn call_control(
    runtime: &mut JsRuntime,
    control: &v8::Global<v8::Object>,
    method: &str,
    arg: ControlArg<'_>,
) -> Result<String, EngineError> {
    let scope = &mut runtime.handle_scope();
    let scope = &mut v8::TryCatch::new(scope);
    let object = v8::Local::new(scope, control);

    let missing = || EngineError::SandboxSetup(format!("control method '{}' is missing", method));
    let key = v8::String::new(scope, method).ok_or_else(missing)?;
    let function = object
        .get(scope, key.into())
        .and_then(|value| v8::Local::<v8::Function>::try_from(value).ok())
        .ok_or_else(missing)?;

    let args: Vec<v8::Local<v8::Value>> = match arg {
        ControlArg::Nothing => Vec::new(),
        ControlArg::Source(source) => {
            let source = v8::String::new(scope, source).ok_or_else(|| {
                EngineError::SandboxSetup("source does not fit in a V8 string".to_string())
            })?;
            vec![source.into()]
        }
        ControlArg::Millis(millis) => vec![v8::Number::new(scope, millis as f64).into()],
    };

    let receiver: v8::Local<v8::Value> = object.into();
    match function.call(scope, receiver, &args) {
        Some(value) => Ok(value.to_rust_string_lossy(scope)),
        None => {
            let message = match scope.exception() {
                Some(exception) => exception.to_rust_string_lossy(scope),
                None => "execution terminated".to_string(),
            };
            Err(EngineError::SandboxRuntime(message))
        }
    }
}
