use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// The decoded body of a page: an ordered list of renderable elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    #[serde(default)]
    pub elements: Vec<ContentElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentElement {
    pub id: String,
    #[serde(flatten)]
    pub kind: ElementKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    Next,
    Previous,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

/// One variant per block kind the funnel builder can place on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Heading {
        text: String,
        #[serde(default)]
        level: Option<u8>,
    },
    Text {
        text: String,
    },
    Image {
        url: String,
        #[serde(default)]
        alt: Option<String>,
    },
    Video {
        url: String,
    },
    Input {
        field: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        input_type: Option<String>,
        #[serde(default)]
        placeholder: Option<String>,
        #[serde(default)]
        required: bool,
    },
    Choice {
        field: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        options: Vec<ChoiceOption>,
        #[serde(default)]
        multiple: bool,
    },
    Button {
        label: String,
        #[serde(default = "default_button_action")]
        action: ButtonAction,
    },
    Divider,
    /// Placeholder for an element whose stored JSON could not be decoded.
    Malformed {
        message: String,
    },
}

fn default_button_action() -> ButtonAction {
    ButtonAction::Next
}

impl ElementKind {
    /// The form field this element writes, for inputs and choices.
    pub fn field(&self) -> Option<&str> {
        match self {
            ElementKind::Input { field, .. } | ElementKind::Choice { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ElementKind::Malformed { .. })
    }
}

impl ContentElement {
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    fn malformed(id: String, message: impl Into<String>) -> Self {
        Self {
            id,
            kind: ElementKind::Malformed {
                message: message.into(),
            },
        }
    }
}

impl PageContent {
    pub fn new(elements: Vec<ContentElement>) -> Self {
        Self { elements }
    }

    pub fn element(&self, id: &str) -> Option<&ContentElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn has_errors(&self) -> bool {
        self.elements.iter().any(|e| e.kind.is_malformed())
    }

    /// Decodes stored page content.
    ///
    /// Accepts an element array, an object with an `elements` array, or a
    /// string holding either as JSON. Each element is decoded on its own; one
    /// that fails becomes a [`ElementKind::Malformed`] placeholder and the rest
    /// of the page is kept.
    pub fn from_json_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::default(),
            serde_json::Value::String(encoded) => {
                if encoded.trim().is_empty() {
                    return Self::default();
                }
                match serde_json::from_str::<serde_json::Value>(encoded) {
                    Ok(inner) if !inner.is_string() => Self::from_json_value(&inner),
                    Ok(_) => Self::single_error("content is a doubly encoded string"),
                    Err(e) => Self::single_error(format!("content is not valid JSON: {}", e)),
                }
            }
            serde_json::Value::Array(items) => Self::decode_elements(items),
            serde_json::Value::Object(object) => match object.get("elements") {
                Some(serde_json::Value::Array(items)) => Self::decode_elements(items),
                Some(_) => Self::single_error("`elements` is not an array"),
                None => Self::default(),
            },
            other => Self::single_error(format!("unexpected content value: {}", other)),
        }
    }

    fn decode_elements(items: &[serde_json::Value]) -> Self {
        let elements = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let fallback_id = item
                    .get("id")
                    .and_then(|id| id.as_str())
                    .map_or_else(|| format!("element-{}", index), str::to_string);
                match serde_json::from_value::<ContentElement>(item.clone()) {
                    Ok(element) => element,
                    Err(e) => {
                        warn!(
                            element_id = %fallback_id,
                            error = %e,
                            "Failed to decode page element"
                        );
                        ContentElement::malformed(fallback_id, e.to_string())
                    }
                }
            })
            .collect();
        Self { elements }
    }

    fn single_error(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(error = %message, "Failed to decode page content");
        Self {
            elements: vec![ContentElement::malformed("content".to_string(), message)],
        }
    }
}

pub(crate) fn deserialize_content<'de, D>(deserializer: D) -> Result<PageContent, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(PageContent::from_json_value(&value))
}
