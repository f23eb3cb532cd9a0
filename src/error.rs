//! Error types for the viewer.

use wasm_bindgen::JsValue;

/// Errors raised while setting up the page, the GL context or the scene.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("no window")]
    NoWindow,

    #[error("no document")]
    NoDocument,

    #[error("document has no body")]
    NoBody,

    #[error("WebGL is not available")]
    WebGlUnavailable,

    #[error("2d canvas context is not available")]
    Canvas2dUnavailable,

    /// Shader compilation failed; carries the GL info log.
    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),

    /// Program linking failed; carries the GL info log.
    #[error("program link failed: {0}")]
    ProgramLink(String),

    #[error("failed to create {0}")]
    ResourceCreation(&'static str),

    #[error("missing uniform {0}")]
    MissingUniform(&'static str),

    #[error("missing attribute {0}")]
    MissingAttribute(&'static str),

    #[error("failed to load texture {url}")]
    TextureLoad { url: String },

    #[error("failed to parse config: {0}")]
    Config(#[from] serde_json::Error),

    /// An exception thrown by a browser API.
    #[error("javascript error: {0}")]
    Js(String),
}

impl From<JsValue> for ViewerError {
    fn from(value: JsValue) -> Self {
        match value.as_string() {
            Some(message) => ViewerError::Js(message),
            None => ViewerError::Js(format!("{:?}", value)),
        }
    }
}

impl From<ViewerError> for JsValue {
    fn from(error: ViewerError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_error_names_url() {
        let err = ViewerError::TextureLoad { url: "assets/images/sun.jpg".to_string() };
        assert_eq!(err.to_string(), "failed to load texture assets/images/sun.jpg");
    }

    #[test]
    fn test_config_error_wraps_serde() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ViewerError = parse.into();
        assert!(err.to_string().starts_with("failed to parse config"));
    }
}
