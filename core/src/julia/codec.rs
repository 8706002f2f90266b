//! Text on the wire: Julia literals going in, JSON replies coming out.

use crate::error::{Error, JuliaError, Result};
use crate::value::{Handle, ReleaseQueue, Value};
use core::fmt::Write;
use serde::Deserialize;
use serde_json::Value as Json;

/// Prefix of the handle table defined by the driver.
const HANDLES: &str = "__jlext__.handle";

/// A Julia expression that evaluates to `value`.
pub fn literal(value: &Value) -> String {
    let mut out = String::new();
    write_literal(&mut out, value);
    out
}

fn write_literal(out: &mut String, value: &Value) {
    match value {
        Value::Nothing => out.push_str("nothing"),
        Value::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
        // `-9223372036854775808` parses as a negated Int128.
        Value::Int(i64::MIN) => out.push_str("typemin(Int64)"),
        Value::Int(value) => {
            let _ = write!(out, "{value}");
        }
        Value::Float(value) if value.is_nan() => out.push_str("NaN"),
        Value::Float(value) if value.is_infinite() => {
            out.push_str(if *value > 0.0 { "Inf" } else { "-Inf" })
        }
        Value::Float(value) => {
            let _ = write!(out, "{value:?}");
        }
        Value::Str(value) => write_string(out, value),
        Value::Array(items) if items.is_empty() => out.push_str("Any[]"),
        Value::Array(items) => {
            out.push('[');
            write_items(out, items);
            out.push(']');
        }
        Value::Tuple(items) => {
            out.push('(');
            write_items(out, items);
            if items.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Value::Handle(handle) => {
            let _ = write!(out, "{HANDLES}({})", handle.id);
        }
    }
}

fn write_items(out: &mut String, items: &[Value]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_literal(out, item);
    }
}

fn write_string(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// `callee(args...)`.
pub fn call(callee: &Handle, args: &[Value]) -> String {
    let mut out = format!("{HANDLES}({})(", callee.id);
    write_items(&mut out, args);
    out.push(')');
    out
}

/// `getproperty(target, :name)`.
pub fn get_attr(target: &Handle, name: &str) -> String {
    let mut out = format!("getproperty({HANDLES}({}), Symbol(", target.id);
    write_string(&mut out, name);
    out.push_str("))");
    out
}

/// `convert(ty, value)`. `ty` is Julia source and is not escaped.
pub fn convert(ty: &str, value: &Value) -> String {
    format!("convert({ty}, {})", literal(value))
}

/// `Module(:name)`.
pub fn new_module(name: &str) -> String {
    let mut out = String::from("Module(Symbol(");
    write_string(&mut out, name);
    out.push_str("))");
    out
}

#[derive(Deserialize)]
enum Reply {
    #[serde(rename = "ok")]
    Ok(Json),
    #[serde(rename = "err")]
    Err(Raised),
}

#[derive(Deserialize)]
struct Raised {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// First line of a request: the code length in bytes, then the ids of
/// dropped handles the driver should forget before running the code.
pub fn header(len: usize, released: &[u64]) -> String {
    let mut out = len.to_string();
    for id in released {
        let _ = write!(out, " {id}");
    }
    out
}

/// Decode one reply line from the driver. Handles in the reply are owned and
/// report to `releases` when dropped.
pub fn decode_reply(line: &str, releases: &ReleaseQueue) -> Result<Value> {
    let reply: Reply = serde_json::from_str(line.trim_end())
        .map_err(|err| Error::Protocol(format!("malformed reply: {err}")))?;
    match reply {
        Reply::Ok(json) => decode_value(json, releases),
        Reply::Err(raised) => Err(JuliaError::new(raised.kind, raised.message).into()),
    }
}

fn decode_value(json: Json, releases: &ReleaseQueue) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Nothing),
        Json::Bool(value) => Ok(Value::Bool(value)),
        Json::Number(number) => match number.as_i64() {
            Some(value) if !number.is_f64() => Ok(Value::Int(value)),
            _ => number
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| Error::Protocol(format!("unsupported number {number}"))),
        },
        Json::String(value) => Ok(Value::Str(value)),
        Json::Array(items) => decode_items(items, releases).map(Value::Array),
        Json::Object(mut map) => {
            if let Some(Json::Array(items)) = map.remove("tuple") {
                return decode_items(items, releases).map(Value::Tuple);
            }
            if let Some(Json::String(special)) = map.get("float") {
                return match special.as_str() {
                    "NaN" => Ok(Value::Float(f64::NAN)),
                    "Inf" => Ok(Value::Float(f64::INFINITY)),
                    "-Inf" => Ok(Value::Float(f64::NEG_INFINITY)),
                    other => Err(Error::Protocol(format!("unknown float `{other}`"))),
                };
            }
            match (map.get("handle").and_then(Json::as_u64), map.get("type")) {
                (Some(id), Some(Json::String(type_name))) => {
                    Ok(Value::Handle(Handle::owned(id, type_name.as_str(), releases)))
                }
                _ => Err(Error::Protocol(format!(
                    "unrecognized value {}",
                    Json::Object(map)
                ))),
            }
        }
    }
}

fn decode_items(items: Vec<Json>, releases: &ReleaseQueue) -> Result<Vec<Value>> {
    items
        .into_iter()
        .map(|item| decode_value(item, releases))
        .collect()
}
