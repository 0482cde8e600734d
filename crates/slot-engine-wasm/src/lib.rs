//! WASM bindings for slot-engine.
//!
//! Exposes slot computation and per-resource diagnostics to JavaScript via
//! `wasm-bindgen`. Requests and responses cross the boundary as JSON strings
//! using the wire records from `slot_engine::record`.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/slot-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use serde::Serialize;
use slot_engine::record::{ResourceReportRecord, SlotRecord};
use slot_engine::{AvailabilityRequest, AvailabilityQuery, EngineInputs};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ComputeResponse {
    slots: Vec<SlotRecord>,
    total_minutes: i64,
}

// ---------------------------------------------------------------------------
// JSON-in / JSON-out core, callable without a JS host
// ---------------------------------------------------------------------------

fn parse_request(request_json: &str) -> Result<(AvailabilityQuery, EngineInputs), String> {
    AvailabilityRequest::from_json(request_json)
        .and_then(|request| request.to_parts())
        .map_err(|e| e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn compute_json(request_json: &str, min_minutes: Option<i64>) -> Result<String, String> {
    let (query, inputs) = parse_request(request_json)?;
    let mut slots = slot_engine::compute(&query, &inputs).map_err(|e| e.to_string())?;
    if let Some(min) = min_minutes {
        slots = slot_engine::filter_min_duration(slots, min);
    }

    to_json(&ComputeResponse {
        total_minutes: slots.iter().map(|s| s.duration_minutes()).sum(),
        slots: slots.iter().map(SlotRecord::from).collect(),
    })
}

fn first_slot_json(request_json: &str, min_minutes: i64) -> Result<String, String> {
    let (query, inputs) = parse_request(request_json)?;
    let slots = slot_engine::compute(&query, &inputs).map_err(|e| e.to_string())?;
    to_json(&slot_engine::find_first_slot(&slots, min_minutes).map(SlotRecord::from))
}

fn explain_json(request_json: &str) -> Result<String, String> {
    let (query, inputs) = parse_request(request_json)?;
    let reports = slot_engine::explain(&query, &inputs).map_err(|e| e.to_string())?;
    let records: Vec<ResourceReportRecord> =
        reports.iter().map(ResourceReportRecord::from).collect();
    to_json(&records)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Compute available slots for a JSON availability request.
///
/// Returns a JSON string `{slots: [{start, end, duration_minutes, resource_ids}],
/// total_minutes}`. Slots shorter than `min_minutes` are dropped when given.
#[wasm_bindgen(js_name = "computeSlots")]
pub fn compute_slots(request_json: &str, min_minutes: Option<u32>) -> Result<String, JsValue> {
    compute_json(request_json, min_minutes.map(i64::from)).map_err(|e| JsValue::from_str(&e))
}

/// Return the first slot lasting at least `min_minutes`, as JSON (or `null`).
#[wasm_bindgen(js_name = "findFirstSlot")]
pub fn find_first_slot(request_json: &str, min_minutes: u32) -> Result<String, JsValue> {
    first_slot_json(request_json, i64::from(min_minutes)).map_err(|e| JsValue::from_str(&e))
}

/// Per-resource breakdown (ruled-open and available spans) as a JSON array.
#[wasm_bindgen(js_name = "explainResources")]
pub fn explain_resources(request_json: &str) -> Result<String, JsValue> {
    explain_json(request_json).map_err(|e| JsValue::from_str(&e))
}
