use serde_json::Value;

/// The payload shapes the gateway's services answer with for the same kind
/// of resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    /// `{"results": ...}`
    Results(Value),
    /// `{"data": ...}`
    Data(Value),
    /// The payload itself: a bare array or object.
    Bare(Value),
}

impl ResponseEnvelope {
    /// Picks `results`, then `data`, then the whole payload. A field that
    /// is present but `null` does not count.
    pub fn from_payload(payload: Option<Value>) -> Self {
        let payload = payload.unwrap_or(Value::Null);
        if let Value::Object(map) = &payload {
            if let Some(results) = map.get("results").filter(|v| !v.is_null()) {
                return ResponseEnvelope::Results(results.clone());
            }
            if let Some(data) = map.get("data").filter(|v| !v.is_null()) {
                return ResponseEnvelope::Data(data.clone());
            }
        }
        ResponseEnvelope::Bare(payload)
    }

    pub fn into_inner(self) -> Value {
        match self {
            ResponseEnvelope::Results(v) | ResponseEnvelope::Data(v) | ResponseEnvelope::Bare(v) => v,
        }
    }

    /// The unwrapped collection, or nothing when the payload is not a list.
    pub fn into_items(self) -> Vec<Value> {
        match self.into_inner() {
            Value::Array(items) => items,
            _ => Vec::new(),
        }
    }
}

/// Items of a list endpoint that answers with a bare array only.
pub fn bare_items(payload: Option<Value>) -> Vec<Value> {
    match payload {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// A chatbot reply: `answer`, then `response`, else the payload as JSON text.
pub fn extract_answer(payload: Option<&Value>) -> String {
    let Some(payload) = payload else {
        return "null".to_string();
    };
    for key in ["answer", "response"] {
        match payload.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(v) if !v.is_null() && !v.is_string() => return v.to_string(),
            _ => {}
        }
    }
    payload.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn precedence_is_results_data_bare() {
        let both = json!({"results": [1], "data": [2]});
        assert_eq!(
            ResponseEnvelope::from_payload(Some(both)),
            ResponseEnvelope::Results(json!([1]))
        );

        let null_results = json!({"results": null, "data": [2]});
        assert_eq!(
            ResponseEnvelope::from_payload(Some(null_results)).into_items(),
            vec![json!(2)]
        );

        let bare = json!([{"id": "c1"}]);
        assert_eq!(
            ResponseEnvelope::from_payload(Some(bare.clone())),
            ResponseEnvelope::Bare(bare)
        );
    }

    #[test]
    fn empty_results_array_still_wins() {
        let payload = json!({"results": [], "data": [1, 2]});
        assert!(ResponseEnvelope::from_payload(Some(payload))
            .into_items()
            .is_empty());
    }

    #[test]
    fn non_list_payloads_yield_no_items() {
        assert!(ResponseEnvelope::from_payload(None).into_items().is_empty());
        assert!(ResponseEnvelope::from_payload(Some(json!({"total": 3})))
            .into_items()
            .is_empty());
        assert_eq!(
            ResponseEnvelope::from_payload(Some(json!({"data": {"online": 4}}))).into_inner(),
            json!({"online": 4})
        );
    }

    #[test]
    fn answer_extraction_falls_back_to_json() {
        assert_eq!(extract_answer(Some(&json!({"answer": "42"}))), "42");
        assert_eq!(
            extract_answer(Some(&json!({"answer": "", "response": "use a Vec"}))),
            "use a Vec"
        );
        assert_eq!(extract_answer(Some(&json!({"ok": true}))), r#"{"ok":true}"#);
        assert_eq!(extract_answer(None), "null");
    }
}
