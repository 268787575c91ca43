use std::path::PathBuf;

use directories::ProjectDirs;

const APP_QUALIFIER: &str = "th";
const APP_ORG: &str = "SuratOtopBiz";
const APP_NAME: &str = "OtopCosting";

const SETTINGS_FILE: &str = "settings.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
}

/// Directory holding the local draft and session slots.
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_local_dir().to_path_buf())
}

pub fn settings_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}
