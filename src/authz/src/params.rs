//! Parameter permitting against a policy's attribute whitelist
//!
//! Two strategies are provided:
//!
//! - [`SliceParams`]: plain map filtering, keeps whitelisted keys of
//!   `params[key]` whatever their values
//! - [`RequireParams`]: framework-style require/permit, additionally rejects
//!   an empty entry and drops nested (non-scalar) values

use crate::error::{AuthzError, Result};
use crate::policy::Permitted;
use serde_json::{Map, Value};
use tracing::debug;

/// Filters a raw parameter bag down to the permitted attributes
pub trait ParamsPermitter: Send + Sync {
    /// Extract `params[key]` and keep only `permitted` attributes
    fn permit(&self, params: &Value, key: &str, permitted: &Permitted) -> Result<Map<String, Value>>;
}

/// Plain map filtering
#[derive(Debug, Clone, Copy, Default)]
pub struct SliceParams;

impl ParamsPermitter for SliceParams {
    fn permit(&self, params: &Value, key: &str, permitted: &Permitted) -> Result<Map<String, Value>> {
        let attributes = params
            .get(key)
            .ok_or_else(|| AuthzError::MissingParams(key.to_string()))?;
        let object = as_object(attributes, key)?;

        Ok(permitted
            .iter()
            .filter_map(|name| object.get(name).map(|value| (name.clone(), value.clone())))
            .collect())
    }
}

/// Require/permit filtering with scalar-only values
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireParams;

impl ParamsPermitter for RequireParams {
    fn permit(&self, params: &Value, key: &str, permitted: &Permitted) -> Result<Map<String, Value>> {
        let attributes = match params.get(key) {
            Some(value) if !is_blank(value) => value,
            _ => return Err(AuthzError::MissingParams(key.to_string())),
        };
        let object = as_object(attributes, key)?;

        let mut result = Map::new();
        for (name, value) in object {
            if !permitted.contains(name.as_str()) {
                debug!("Unpermitted parameter: {}[{}]", key, name);
                continue;
            }
            if !is_scalar(value) {
                debug!("Dropping non-scalar parameter: {}[{}]", key, name);
                continue;
            }
            result.insert(name.clone(), value.clone());
        }

        Ok(result)
    }
}

fn as_object<'v>(value: &'v Value, key: &str) -> Result<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| AuthzError::InvalidInput(format!("params[{}] must be an object", key)))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}
