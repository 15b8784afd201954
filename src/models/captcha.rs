use serde::{Deserialize, Serialize};

/// A single-use captcha issued by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptchaChallenge {
    /// Opaque key echoed back as `captcha_0`
    #[serde(rename = "captcha_key")]
    pub key: String,
    #[serde(rename = "captcha_image_url")]
    pub image_url: String,
}
