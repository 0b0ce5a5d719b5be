//! Ops backing the sandbox host surface
//!
//! Each op borrows the request's [`HostSurface`] out of the isolate's
//! `OpState`. None of them fail: unknown kinds fall back to a default.

use crate::host::{ConsoleLevel, ElementDescriptor, ElementLookup, HostSurface, StorageArea};
use deno_core::{op2, Extension, OpState};

#[op2(fast)]
fn op_workbench_console(state: &mut OpState, #[string] level: String, #[string] text: String) {
    state
        .borrow_mut::<HostSurface>()
        .log(ConsoleLevel::parse(&level), &text);
}

#[op2]
#[serde]
fn op_workbench_resolve(
    state: &mut OpState,
    #[string] kind: String,
    #[string] query: String,
) -> ElementDescriptor {
    state
        .borrow_mut::<HostSurface>()
        .resolve(ElementLookup::parse(&kind, &query))
}

#[op2(fast)]
fn op_workbench_element_listener(
    state: &mut OpState,
    #[string] target: String,
    #[string] event: String,
) {
    state
        .borrow_mut::<HostSurface>()
        .element_listener(&target, &event);
}

#[op2(fast)]
fn op_workbench_window_listener(state: &mut OpState, #[string] event: String) -> bool {
    state.borrow_mut::<HostSurface>().window_listener(&event)
}

#[op2(fast)]
fn op_workbench_alert(state: &mut OpState, #[string] message: String) {
    state.borrow_mut::<HostSurface>().alert(&message);
}

#[op2(fast)]
fn op_workbench_confirm(state: &mut OpState, #[string] message: String) -> bool {
    state.borrow_mut::<HostSurface>().confirm(&message)
}

#[op2]
#[string]
fn op_workbench_prompt(
    state: &mut OpState,
    #[string] message: String,
    #[string] default_value: Option<String>,
) -> Option<String> {
    state
        .borrow_mut::<HostSurface>()
        .prompt(&message, default_value.as_deref())
}

#[op2]
#[string]
fn op_workbench_storage_get(
    state: &mut OpState,
    #[string] area: String,
    #[string] key: String,
) -> Option<String> {
    state
        .borrow_mut::<HostSurface>()
        .storage_get(StorageArea::parse(&area), &key)
}

#[op2(fast)]
fn op_workbench_storage_set(
    state: &mut OpState,
    #[string] area: String,
    #[string] key: String,
    #[string] value: String,
) {
    state
        .borrow_mut::<HostSurface>()
        .storage_set(StorageArea::parse(&area), &key, &value);
}

#[op2(fast)]
fn op_workbench_require(state: &mut OpState, #[string] module: String) {
    tracing::debug!(module = %module, "Simulated require");
    state.borrow_mut::<HostSurface>().require(&module);
}

#[op2(fast)]
fn op_workbench_fetch(state: &mut OpState, #[string] url: String) {
    tracing::debug!(url = %url, "Simulated fetch");
    state.borrow_mut::<HostSurface>().fetch(&url);
}

/// Create the host surface extension
pub fn create_host_extension() -> Extension {
    let ops = vec![
        op_workbench_console(),
        op_workbench_resolve(),
        op_workbench_element_listener(),
        op_workbench_window_listener(),
        op_workbench_alert(),
        op_workbench_confirm(),
        op_workbench_prompt(),
        op_workbench_storage_get(),
        op_workbench_storage_set(),
        op_workbench_require(),
        op_workbench_fetch(),
    ];

    Extension {
        name: "workbench_host",
        ops: std::borrow::Cow::Owned(ops),
        ..Default::default()
    }
}
