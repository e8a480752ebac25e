//! Parameter sets carried by case-level queries.
//!
//! A parameter set is an insertion-ordered map from parameter name to a JSON
//! value. Names starting with [`PRIVATE_PARAM_PREFIX`] are private: they are
//! visible to the case that receives them but never take part in a query.

use indexmap::IndexMap;

use super::{KV_SEPARATOR, PARAM_SEPARATOR, WILDCARD};
use crate::errors::{Result, SuiteTreeError};

/// A single parameter value.
pub type ParamValue = serde_json::Value;

/// An ordered set of named parameter values. Keys are unique.
pub type TestParams = IndexMap<String, ParamValue>;

pub const PRIVATE_PARAM_PREFIX: char = '_';

/// Builds a [`TestParams`] from `key => value` pairs, preserving order.
///
/// ```
/// use suitetree::test_params;
/// let p = test_params! { "x" => 1, "y" => "a" };
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! test_params {
    () => {
        $crate::query::params::TestParams::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::query::params::TestParams::new();
        $(
            params.insert(
                ::std::string::String::from($key),
                $crate::query::params::ParamValue::from($value),
            );
        )+
        params
    }};
}

pub fn is_public_param(key: &str) -> bool {
    !key.starts_with(PRIVATE_PARAM_PREFIX)
}

/// Returns the public subset of `params`, in their original order.
pub fn extract_public_params(params: &TestParams) -> TestParams {
    params
        .iter()
        .filter(|(k, _)| is_public_param(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Serializes a parameter value and checks that it can live inside a query string.
pub fn stringify_param_value(key: &str, value: &ParamValue) -> Result<String> {
    let s = value.to_string();
    if let Some(bad) = s
        .chars()
        .find(|c| [KV_SEPARATOR, PARAM_SEPARATOR, WILDCARD].contains(c))
    {
        return Err(SuiteTreeError::InvalidParamValue {
            key: key.to_string(),
            reason: format!("serialized value {s} contains `{bad}`"),
        });
    }
    Ok(s)
}

/// `key=value`, the form used in query strings and as a tree key.
pub fn stringify_single_param(key: &str, value: &ParamValue) -> String {
    format!("{key}{KV_SEPARATOR}{value}")
}

/// True if every key/value of `subset` appears in `params` with an equal value.
pub fn params_superset(params: &TestParams, subset: &TestParams) -> bool {
    subset
        .iter()
        .all(|(k, v)| params.get(k).is_some_and(|pv| pv == v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_private_params_are_dropped() {
        let params = test_params! { "x" => 1, "_hidden" => true, "y" => "a" };
        let public = extract_public_params(&params);
        assert_eq!(public.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_stringify_rejects_separator_characters() {
        assert!(stringify_param_value("x", &json!("a;b")).is_err());
        assert!(stringify_param_value("x", &json!("a=b")).is_err());
        assert!(stringify_param_value("x", &json!("*")).is_err());
        assert_eq!(stringify_param_value("x", &json!("a:b,c")).unwrap(), "\"a:b,c\"");
        assert_eq!(stringify_param_value("x", &json!([1, 2])).unwrap(), "[1,2]");
    }

    #[test]
    fn test_single_param_form() {
        assert_eq!(stringify_single_param("x", &json!(1)), "x=1");
        assert_eq!(stringify_single_param("f", &json!("rgba8")), "f=\"rgba8\"");
    }

    #[test]
    fn test_superset_check() {
        let params = test_params! { "x" => 1, "y" => 2 };
        assert!(params_superset(&params, &test_params! { "x" => 1 }));
        assert!(params_superset(&params, &test_params! {}));
        assert!(!params_superset(&params, &test_params! { "x" => 2 }));
        assert!(!params_superset(&params, &test_params! { "z" => 1 }));
    }
}
