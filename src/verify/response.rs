//! Response classification
//!
//! `Confirmed` needs `status == true` and `ticket.is_verify == true`, both
//! as JSON booleans. Any other JSON object is `Rejected`. A body that is
//! not a JSON object is malformed.

use crate::verify::error::{VerifyError, VerifyResult};
use crate::verify::types::VerificationReport;
use serde_json::Value;

pub fn interpret_response(body: &str) -> VerifyResult<VerificationReport> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| VerifyError::MalformedResponse {
            reason: e.to_string(),
        })?;

    let Value::Object(object) = &value else {
        return Err(VerifyError::MalformedResponse {
            reason: format!("expected a JSON object, got {}", json_kind(&value)),
        });
    };

    let message = object
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    let status = object.get("status") == Some(&Value::Bool(true));
    let verified = object
        .get("ticket")
        .and_then(|ticket| ticket.get("is_verify"))
        == Some(&Value::Bool(true));

    if status && verified {
        Ok(VerificationReport::confirmed(message))
    } else {
        Ok(VerificationReport::rejected(message))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
