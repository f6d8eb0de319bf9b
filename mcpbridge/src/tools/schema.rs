//! Typed tool input schema.
//!
//! Remote sources publish JSON Schema objects; discovery converts each into an
//! [`InputSchema`] so malformed schemas are rejected once, at adapter
//! construction, and argument checks run against a closed structure.

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Schema could not be turned into an [`InputSchema`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("input schema must be a JSON object, got {0}")]
    NotAnObject(String),
    #[error("input schema type must be \"object\", got {0}")]
    NotObjectType(String),
    #[error("\"properties\" must be an object")]
    BadProperties,
    #[error("\"required\" must be an array of strings")]
    BadRequired,
    #[error("required parameter {0} is not declared in properties")]
    UndeclaredRequired(String),
    #[error("parameter {name}: unsupported type {ty}")]
    UnsupportedType { name: String, ty: String },
}

/// Value type of one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<ParamKind>),
    Object,
    /// No type declared; any JSON value is accepted.
    Any,
}

impl ParamKind {
    fn from_type_name(name: &str, items: Option<&Value>) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "object" => Self::Object,
            "array" => {
                let inner = items
                    .and_then(|i| parse_kind(i).ok())
                    .map(|(kind, _)| kind)
                    .unwrap_or(Self::Any);
                Self::Array(Box::new(inner))
            }
            _ => return None,
        })
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array(inner) => value
                .as_array()
                .map(|items| items.iter().all(|v| inner.accepts(v)))
                .unwrap_or(false),
            Self::Any => true,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Array(inner) => match inner.as_ref() {
                Self::Any => json!({ "type": "array" }),
                other => json!({ "type": "array", "items": other.to_json() }),
            },
            Self::Any => json!({}),
            other => json!({ "type": other.type_name() }),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    /// Null is accepted in addition to `kind`.
    pub nullable: bool,
    pub description: Option<String>,
    pub default: Option<Value>,
    /// Allowed values (`enum`); empty means unconstrained.
    pub allowed: Vec<Value>,
}

/// Closed representation of a tool's input schema.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSchema {
    pub parameters: Vec<ParamSpec>,
    /// False when the schema declares `additionalProperties: false`.
    pub additional_properties: bool,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self {
            parameters: Vec::new(),
            additional_properties: true,
        }
    }
}

/// Reads `type` (string or array), `anyOf` / `oneOf` with a null branch, or nothing.
/// Returns the kind and whether null is allowed.
fn parse_kind(prop: &Value) -> Result<(ParamKind, bool), String> {
    match prop.get("type") {
        Some(Value::String(t)) => ParamKind::from_type_name(t, prop.get("items"))
            .map(|k| (k, false))
            .ok_or_else(|| t.clone()),
        Some(Value::Array(types)) => {
            let nullable = types.iter().any(|t| t == "null");
            let non_null: Vec<&str> = types
                .iter()
                .filter_map(Value::as_str)
                .filter(|t| *t != "null")
                .collect();
            match non_null.as_slice() {
                [] => Ok((ParamKind::Any, nullable)),
                [one] => ParamKind::from_type_name(one, prop.get("items"))
                    .map(|k| (k, nullable))
                    .ok_or_else(|| (*one).to_string()),
                _ => Ok((ParamKind::Any, nullable)),
            }
        }
        Some(other) => Err(other.to_string()),
        None => {
            let branches = prop
                .get("anyOf")
                .or_else(|| prop.get("oneOf"))
                .and_then(Value::as_array);
            let Some(branches) = branches else {
                return Ok((ParamKind::Any, false));
            };
            let nullable = branches.iter().any(|b| b.get("type") == Some(&json!("null")));
            let typed: Vec<&Value> = branches
                .iter()
                .filter(|b| b.get("type") != Some(&json!("null")))
                .collect();
            match typed.as_slice() {
                [one] => parse_kind(one).map(|(k, _)| (k, nullable)),
                _ => Ok((ParamKind::Any, nullable)),
            }
        }
    }
}

impl InputSchema {
    /// Parses a JSON Schema object. `Null` and `{}` mean "no parameters".
    pub fn from_json(schema: &Value) -> Result<Self, SchemaError> {
        let obj = match schema {
            Value::Null => return Ok(Self::default()),
            Value::Object(o) => o,
            other => return Err(SchemaError::NotAnObject(other.to_string())),
        };
        if let Some(ty) = obj.get("type") {
            if ty != "object" {
                return Err(SchemaError::NotObjectType(ty.to_string()));
            }
        }

        let required: Vec<String> = match obj.get("required") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(String::from).ok_or(SchemaError::BadRequired))
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(SchemaError::BadRequired),
        };

        let empty = Map::new();
        let properties = match obj.get("properties") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(p)) => p,
            Some(_) => return Err(SchemaError::BadProperties),
        };

        let mut parameters = Vec::with_capacity(properties.len());
        for (name, prop) in properties {
            let (kind, nullable) = parse_kind(prop).map_err(|ty| SchemaError::UnsupportedType {
                name: name.clone(),
                ty,
            })?;
            parameters.push(ParamSpec {
                name: name.clone(),
                kind,
                required: required.iter().any(|r| r == name),
                nullable,
                description: prop
                    .get("description")
                    .and_then(Value::as_str)
                    .map(String::from),
                default: prop.get("default").cloned(),
                allowed: prop
                    .get("enum")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
            });
        }

        if let Some(missing) = required
            .iter()
            .find(|r| !parameters.iter().any(|p| &p.name == *r))
        {
            return Err(SchemaError::UndeclaredRequired(missing.clone()));
        }

        Ok(Self {
            parameters,
            additional_properties: obj.get("additionalProperties") != Some(&Value::Bool(false)),
        })
    }

    /// Looks up a declared parameter.
    pub fn parameter(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Checks arguments against what the schema declares: object shape, required
    /// parameters, declared types, enum values, and extra keys when forbidden.
    ///
    /// Returns a human-readable reason on the first violation.
    pub fn check(&self, arguments: &Value) -> Result<(), String> {
        let empty = Map::new();
        let args = match arguments {
            Value::Null => &empty,
            Value::Object(o) => o,
            other => return Err(format!("arguments must be a JSON object, got {}", other)),
        };

        for p in &self.parameters {
            match args.get(&p.name) {
                None if p.required => {
                    return Err(format!("missing required parameter '{}'", p.name));
                }
                None => {}
                Some(Value::Null) if p.nullable || !p.required => {}
                Some(v) => {
                    if !p.kind.accepts(v) {
                        return Err(format!(
                            "parameter '{}' must be of type {}, got {}",
                            p.name,
                            p.kind.type_name(),
                            v
                        ));
                    }
                    if !p.allowed.is_empty() && !p.allowed.contains(v) {
                        return Err(format!(
                            "parameter '{}' must be one of {}",
                            p.name,
                            Value::Array(p.allowed.clone())
                        ));
                    }
                }
            }
        }

        if !self.additional_properties {
            if let Some(extra) = args.keys().find(|k| self.parameter(k).is_none()) {
                return Err(format!("unexpected parameter '{}'", extra));
            }
        }
        Ok(())
    }

    /// JSON Schema form of this schema, as handed to the reasoning component.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.parameters {
            let mut prop = p.kind.to_json();
            if let Some(obj) = prop.as_object_mut() {
                if p.nullable {
                    if let Some(Value::String(t)) = obj.get("type").cloned() {
                        obj.insert("type".into(), json!([t, "null"]));
                    }
                }
                if let Some(d) = &p.description {
                    obj.insert("description".into(), json!(d));
                }
                if let Some(d) = &p.default {
                    obj.insert("default".into(), d.clone());
                }
                if !p.allowed.is_empty() {
                    obj.insert("enum".into(), Value::Array(p.allowed.clone()));
                }
            }
            properties.insert(p.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        let mut schema = json!({ "type": "object", "properties": properties });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        if !self.additional_properties {
            schema["additionalProperties"] = json!(false);
        }
        schema
    }
}
