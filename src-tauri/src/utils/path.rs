//! # 路径工具函数
//!
//! 提供与配置文件路径相关的工具函数：
//! - 获取 GPD 自身配置目录路径（`~/.mo/GPD/`）
//! - 获取配置文件完整路径（`~/.mo/GPD/config.json`）

use std::path::PathBuf;

/// 获取 GPD 配置目录的绝对路径
///
/// GPD 的配置数据存储在 `~/.mo/GPD/` 目录下，与其他应用数据分离。
/// 使用 `dirs` crate 获取跨平台的主目录路径。
///
/// # 返回值
/// 返回 `~/.mo/GPD/` 目录的绝对路径。
///
/// # 错误
/// 如果无法确定用户主目录（极端情况，如无 HOME 环境变量），返回错误信息。
pub fn get_app_config_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or_else(|| "无法获取用户主目录".to_string())?;
    Ok(home.join(".mo").join("GPD"))
}

/// 获取应用配置文件的绝对路径
///
/// # 返回值
/// 返回 `~/.mo/GPD/config.json` 的绝对路径。
///
/// # 错误
/// 如果无法确定用户主目录，返回错误信息。
pub fn get_config_file_path() -> Result<PathBuf, String> {
    Ok(get_app_config_dir()?.join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_under_config_dir() {
        let dir = get_app_config_dir().unwrap();
        let file = get_config_file_path().unwrap();
        assert!(file.starts_with(&dir));
        assert_eq!(file.file_name().unwrap(), "config.json");
    }
}
