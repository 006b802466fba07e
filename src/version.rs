// Version information for the flow gateway

/// Full version string with feature description
pub const VERSION: &str = "v1.2.0-screen-registry-2025-10-13";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.2.0";

/// Major version number
pub const VERSION_MAJOR: u32 = 1;

/// Minor version number
pub const VERSION_MINOR: u32 = 2;

/// Patch version number
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2025-10-13";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "hmac-sha256-signatures",
    "rsa-oaep-sha256",
    "aes-128-gcm",
    "encrypted-pkcs8-keys",
    "screen-registry",
    "submission-sink",
    "graceful-shutdown",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Flow Gateway {} ({})", VERSION_NUMBER, BUILD_DATE)
}
