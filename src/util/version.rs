pub const APP_NAME: &str = "Surat OTOP Biz Smart Costing";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

pub fn version_label() -> String {
    if let Some(tag) = GIT_TAG {
        tag.to_string()
    } else {
        format!("v{}", APP_VERSION)
    }
}

/// User agent sent with every backend request.
pub fn user_agent() -> String {
    format!("otop-costing/{}", version_label())
}
