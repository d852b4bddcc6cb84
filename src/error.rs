use wasm_bindgen::JsValue;

use crate::transition::Phase;

pub type EffectResult<T> = Result<T, EffectError>;

#[derive(thiserror::Error, Debug)]
pub enum EffectError {
    #[error("dom error: {0}")]
    Dom(String),

    #[error("webgl error: {0}")]
    Gl(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("transition busy: {0:?} in flight")]
    Busy(Phase),

    #[error("no snapshot captured")]
    NoSnapshot,

    #[error("transition interrupted")]
    Interrupted,

    /// A newer transition took over the machine while this one was waiting.
    #[error("transition superseded")]
    Superseded,

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EffectError {
    pub fn dom(msg: impl Into<String>) -> Self {
        Self::Dom(msg.into())
    }

    pub fn gl(msg: impl Into<String>) -> Self {
        Self::Gl(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<JsValue> for EffectError {
    fn from(value: JsValue) -> Self {
        Self::Dom(format!("{value:?}"))
    }
}

impl From<EffectError> for JsValue {
    fn from(err: EffectError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(EffectError::dom("x").to_string().starts_with("dom error:"));
        assert!(EffectError::gl("x").to_string().starts_with("webgl error:"));
        assert!(EffectError::config("x")
            .to_string()
            .starts_with("config error:"));
        assert!(EffectError::Busy(Phase::Pixelating)
            .to_string()
            .contains("Pixelating"));
    }

    #[test]
    fn json_errors_convert() {
        let err: EffectError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, EffectError::Json(_)));
    }
}
