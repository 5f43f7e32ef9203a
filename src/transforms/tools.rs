//! Tool definition conversion from the OpenAI function schema.

use serde_json::{Map, Value, json};

/// JSON-schema keywords Gemini rejects in function parameters.
const GOOGLE_UNSUPPORTED_SCHEMA_KEYS: &[&str] = &["$schema", "additionalProperties", "default"];

/// Convert OpenAI tool definitions to Claude tools.
pub fn convert_claude_tools(tools: Vec<Value>) -> Vec<Value> {
    tools.into_iter().map(convert_claude_tool).collect()
}

fn convert_claude_tool(tool: Value) -> Value {
    // OpenAI format: {"type": "function", "function": {"name": "...", "description": "...", "parameters": {...}}}
    // Claude format: {"name": "...", "description": "...", "input_schema": {...}}
    let Some(func) = tool.get("function") else {
        // Already in Claude format or unknown format
        return tool;
    };

    let mut claude_tool = Map::new();
    claude_tool.insert("name".to_string(), function_name(func));
    if let Some(description) = func.get("description").filter(|d| !d.is_null()) {
        claude_tool.insert("description".to_string(), description.clone());
    }
    claude_tool.insert("input_schema".to_string(), parameters(func));

    Value::Object(claude_tool)
}

/// Convert OpenAI tool definitions to a Gemini `tools` entry.
pub fn convert_google_tools(tools: &[Value]) -> Value {
    let declarations: Vec<Value> = tools
        .iter()
        .filter_map(|tool| tool.get("function"))
        .map(|func| {
            let mut declaration = Map::new();
            declaration.insert("name".to_string(), function_name(func));
            if let Some(description) = func.get("description").filter(|d| !d.is_null()) {
                declaration.insert("description".to_string(), description.clone());
            }
            let mut schema = parameters(func);
            strip_schema_keys(&mut schema);
            declaration.insert("parameters".to_string(), schema);
            Value::Object(declaration)
        })
        .collect();

    json!({ "functionDeclarations": declarations })
}

fn function_name(func: &Value) -> Value {
    Value::String(
        func.get("name")
            .and_then(|n| n.as_str())
            .unwrap_or_default()
            .to_string(),
    )
}

fn parameters(func: &Value) -> Value {
    func.get("parameters")
        .cloned()
        .unwrap_or_else(|| json!({"type": "object", "properties": {}}))
}

fn strip_schema_keys(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            for key in GOOGLE_UNSUPPORTED_SCHEMA_KEYS {
                map.remove(*key);
            }
            for (key, value) in map.iter_mut() {
                // Property names are user data, not keywords.
                if key == "properties"
                    && let Value::Object(properties) = value
                {
                    properties.values_mut().for_each(strip_schema_keys);
                } else {
                    strip_schema_keys(value);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_schema_keys),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_openai_tool() {
        let openai_tool = json!({
            "type": "function",
            "function": {
                "name": "get_weather",
                "description": "Get the weather",
                "parameters": {"type": "object", "properties": {"city": {"type": "string"}}}
            }
        });
        assert_eq!(
            convert_claude_tools(vec![openai_tool]),
            vec![json!({
                "name": "get_weather",
                "description": "Get the weather",
                "input_schema": {"type": "object", "properties": {"city": {"type": "string"}}}
            })]
        );
    }

    #[test]
    fn test_claude_tool_passthrough() {
        let claude_tool = json!({"name": "search", "input_schema": {"type": "object"}});
        assert_eq!(convert_claude_tools(vec![claude_tool.clone()]), vec![claude_tool]);
    }

    #[test]
    fn test_google_tools_strip_unsupported_keys() {
        let tools = vec![json!({
            "type": "function",
            "function": {
                "name": "book",
                "parameters": {
                    "$schema": "http://json-schema.org/draft-07/schema#",
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "default": {"type": "string", "default": "x"},
                        "seats": {"type": "array", "items": {"type": "integer", "default": 1}}
                    }
                }
            }
        })];
        assert_eq!(
            convert_google_tools(&tools),
            json!({"functionDeclarations": [{
                "name": "book",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "default": {"type": "string"},
                        "seats": {"type": "array", "items": {"type": "integer"}}
                    }
                }
            }]})
        );
    }
}
