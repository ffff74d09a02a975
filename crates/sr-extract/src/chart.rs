// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Chart specification extraction and preparation.
//!
//! The extracted object is treated as untyped JSON gated by a minimal shape
//! check. Preparation only fills keys the caller left out, so declared data
//! sources, `encoding.color` and any caller `config` survive untouched. The one
//! exception is a sample chart whose `data` entry has no source: its values are
//! replaced by the placeholder rows.

use crate::fence::{FencedBlock, fenced_blocks};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::trace;

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Fence info strings that may carry a chart; an empty info string is accepted too.
const CHART_LANGUAGES: &[&str] = &["json", "vega-lite", "vegalite", "vega"];

const CHART_HEIGHT: u64 = 400;
const SAMPLE_PALETTE: &[&str] = &["#60a5fa", "#34d399", "#a78bfa"];
const MUTED: &str = "#94a3b8";

/// Where the chart's data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataProvenance {
    /// Placeholder rows injected so the chart shape can be previewed.
    Sample,
    /// The spec declares its own inline values or URL.
    Live,
}

impl std::fmt::Display for DataProvenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataProvenance::Sample => write!(f, "sample"),
            DataProvenance::Live => write!(f, "live"),
        }
    }
}

/// A validated chart ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub spec: Value,
    pub provenance: DataProvenance,
    /// Dotted paths the engine inserted; everything else came from the model output.
    pub injected: Vec<String>,
}

/// Find the first fenced block in `text` that yields a valid chart.
pub fn extract_chart(text: &str) -> Option<ChartSpec> {
    fenced_blocks(text).iter().filter(|block| is_chart_fence(block)).find_map(chart_from_block)
}

fn is_chart_fence(block: &FencedBlock<'_>) -> bool {
    block.info.is_empty()
        || CHART_LANGUAGES.iter().any(|lang| block.info.eq_ignore_ascii_case(lang))
}

fn chart_from_block(block: &FencedBlock<'_>) -> Option<ChartSpec> {
    let body = block.settled_body();
    if !body.starts_with('{') {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(raw)) => prepare_chart(raw),
        Ok(_) => None,
        Err(err) => {
            // Expected while the block is still streaming; the next snapshot retries.
            trace!(terminated = block.terminated, error = %err, "Chart block not parseable yet");
            None
        }
    }
}

/// Minimal structural gate: something to draw and something to draw it with.
pub fn is_renderable(spec: &Map<String, Value>) -> bool {
    let has_mark = spec.contains_key("mark") || spec.contains_key("layer");
    let has_encoding = spec.contains_key("encoding") || spec.contains_key("layer");
    has_mark && has_encoding
}

/// Whether the spec declares inline values or a data URL.
pub fn declares_data(spec: &Map<String, Value>) -> bool {
    fn has_source(data: &Value) -> bool {
        match data {
            Value::Object(map) => {
                map.get("values").is_some_and(|v| !v.is_null())
                    || map.get("url").and_then(Value::as_str).is_some_and(|u| !u.is_empty())
            }
            Value::Array(items) => items.iter().any(has_source),
            _ => false,
        }
    }
    spec.get("data").is_some_and(has_source)
        || spec
            .get("layer")
            .and_then(Value::as_array)
            .is_some_and(|layers| layers.iter().filter_map(Value::as_object).any(declares_data))
}

/// Validate and augment a raw chart object.
pub fn prepare_chart(raw: Map<String, Value>) -> Option<ChartSpec> {
    if !is_renderable(&raw) {
        return None;
    }

    let provenance = if declares_data(&raw) {
        DataProvenance::Live
    } else {
        DataProvenance::Sample
    };

    let mut spec = Value::Object(raw);
    let mut injected = Vec::new();

    fill_missing(&mut spec, presentation_defaults(), "", &mut injected);

    if provenance == DataProvenance::Sample {
        inject_sample_data(&mut spec, &mut injected);
        if let Some(encoding) = spec.get_mut("encoding").filter(|e| e.is_object()) {
            fill_missing(encoding, json!({ "color": sample_color() }), "encoding", &mut injected);
            if let Some(x) = encoding.get_mut("x").filter(|x| x.is_object()) {
                fill_missing(x, json!({ "axis": { "labelAngle": 0 } }), "encoding.x", &mut injected);
            }
        }
    }

    Some(ChartSpec {
        spec,
        provenance,
        injected,
    })
}

/// Put the placeholder rows where a sample chart reads its data. A `data`
/// entry without a source (null, an empty object, a bare `name`) is kept but
/// its `values` are replaced.
fn inject_sample_data(spec: &mut Value, injected: &mut Vec<String>) {
    let Value::Object(map) = spec else {
        return;
    };
    match map.get_mut("data") {
        Some(Value::Object(data)) => {
            data.insert("values".to_string(), sample_rows());
            injected.push("data.values".to_string());
        }
        _ => {
            map.insert("data".to_string(), json!({ "values": sample_rows() }));
            injected.push("data".to_string());
        }
    }
}

/// Insert keys from `defaults` that `target` lacks, recursing into objects
/// present on both sides. Existing values always win, including `null`.
fn fill_missing(target: &mut Value, defaults: Value, path: &str, injected: &mut Vec<String>) {
    let (Value::Object(target), Value::Object(defaults)) = (target, defaults) else {
        return;
    };
    for (key, default) in defaults {
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        match target.get_mut(&key) {
            Some(existing) => {
                if existing.is_object() && default.is_object() {
                    fill_missing(existing, default, &child_path, injected);
                }
            }
            None => {
                target.insert(key, default);
                injected.push(child_path);
            }
        }
    }
}

/// Responsive sizing and the fixed dark theme applied to every chart.
fn presentation_defaults() -> Value {
    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "width": "container",
        "height": CHART_HEIGHT,
        "autosize": { "type": "fit", "contains": "padding" },
        "config": {
            "background": "transparent",
            "font": "Inter, sans-serif",
            "axis": {
                "domainColor": MUTED,
                "gridColor": "#334155",
                "gridOpacity": 0.3,
                "tickColor": MUTED,
                "labelColor": MUTED,
                "titleColor": MUTED,
                "labelFontSize": 12,
                "titleFontSize": 14
            },
            "legend": { "labelColor": MUTED, "titleColor": MUTED },
            "view": { "stroke": "transparent" },
            "mark": { "cornerRadiusTopLeft": 4, "cornerRadiusTopRight": 4 },
            "bar": { "color": { "value": "#3b82f6" } }
        }
    })
}

/// Placeholder rows previewed until live data is wired in.
pub fn sample_rows() -> Value {
    json!([
        { "region": "Almaty", "revenue": 120 },
        { "region": "Astana", "revenue": 90 },
        { "region": "Shymkent", "revenue": 70 }
    ])
}

fn sample_color() -> Value {
    json!({
        "field": "region",
        "type": "nominal",
        "scale": { "range": SAMPLE_PALETTE },
        "legend": null
    })
}
