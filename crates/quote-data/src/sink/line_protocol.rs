//! 라인 프로토콜 인코딩.
//!
//! `measurement,tag=v field=1i,field2=1.5 <ns timestamp>`

use quote_core::{DataPoint, FieldValue, SinkError};

fn escape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_measurement(value: &str) -> String {
    escape(value, &[',', ' '])
}

fn escape_key(value: &str) -> String {
    escape(value, &[',', '=', ' '])
}

fn encode_field(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::Integer(v) => Some(format!("{}i", v)),
        FieldValue::Float(v) if v.is_finite() => Some(format!("{}", v)),
        FieldValue::Float(_) => None,
    }
}

/// 포인트 하나를 한 줄로 인코딩합니다.
///
/// 유한하지 않은 실수 필드는 제외되며, 남은 필드가 없으면 에러입니다.
pub fn encode(point: &DataPoint) -> Result<String, SinkError> {
    let mut line = escape_measurement(&point.measurement);

    for (key, value) in &point.tags {
        if value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    let fields: Vec<String> = point
        .fields
        .iter()
        .filter_map(|(key, value)| encode_field(*value).map(|v| format!("{}={}", escape_key(key), v)))
        .collect();

    if fields.is_empty() {
        return Err(SinkError::InvalidPoint(format!(
            "'{}' 포인트에 기록할 필드가 없음",
            point.measurement
        )));
    }

    line.push(' ');
    line.push_str(&fields.join(","));

    if let Some(ts) = point.timestamp {
        let nanos = ts.timestamp_nanos_opt().ok_or_else(|| {
            SinkError::InvalidPoint(format!("타임스탬프 범위 초과: {}", ts))
        })?;
        line.push(' ');
        line.push_str(&nanos.to_string());
    }

    Ok(line)
}
