pub mod logger;
pub mod config;
pub mod types;
pub mod helpers;
pub mod cst_texts;
pub mod cst_xml;
pub mod document_cache;
pub mod citations;

use std::env;
use std::fs::create_dir_all;
use std::path::PathBuf;
use std::error::Error;
use app_dirs::{get_app_root, AppDataType, AppInfo};

pub const APP_INFO: AppInfo = AppInfo{name: "dpd", author: "digitalpalidictionary"};

pub fn get_create_dpd_app_root() -> Result<PathBuf, Box<dyn Error>> {
    let p = get_app_root(AppDataType::UserData, &APP_INFO)?;
    if !p.exists() {
        create_dir_all(&p)?;
    }
    Ok(p)
}

/// The data directory for logs and local settings.
///
/// `DPD_DIR` takes precedence over the platform user-data folder.
pub fn get_create_dpd_dir() -> Result<PathBuf, Box<dyn Error>> {
    let p = match env::var("DPD_DIR") {
        Ok(s) if !s.trim().is_empty() => PathBuf::from(s),
        _ => get_create_dpd_app_root()?,
    };
    if !p.exists() {
        create_dir_all(&p)?;
    }
    Ok(p)
}
