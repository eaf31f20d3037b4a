//! # 设置存储服务
//!
//! 持有用户设置的唯一内存副本，并负责与 `settings.json` 之间的读写。
//!
//! ## 尽力而为
//! 设置持久化只影响外观和便利性，任何读写失败都不能影响会话：
//! - 加载：文件缺失或损坏时静默使用默认设置
//! - 保存：写入失败只记录日志，内存中的修改仍然生效
//!
//! ## 写入顺序
//! 修改和写文件在同一把异步锁内完成，并发的 `update` 按加锁顺序落盘，
//! 文件中永远是最后一次修改后的快照。

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde_json::Value;
use tokio::sync::Mutex;

use crate::models::settings::Settings;

/// 用户设置存储
pub struct SettingsStore {
    /// 设置文件路径
    path: PathBuf,

    /// 内存中的当前设置
    current: RwLock<Settings>,

    /// 保存锁：持有期间完成修改和写文件
    save_lock: Mutex<()>,
}

impl SettingsStore {
    /// 从文件加载设置（启动时调用一次）
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = read_settings_file(&path);
        Self {
            path,
            current: RwLock::new(settings),
            save_lock: Mutex::new(()),
        }
    }

    /// 当前设置的副本
    pub fn snapshot(&self) -> Settings {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 修改设置并立即保存
    ///
    /// 读写锁只在修改和复制快照时持有，写文件期间不阻塞 `snapshot`；
    /// 保存锁覆盖整个过程，保证后一次修改的快照后落盘。
    ///
    /// # 返回值
    /// 修改后的设置快照
    pub async fn update<F>(&self, mutate: F) -> Settings
    where
        F: FnOnce(&mut Settings),
    {
        let _saving = self.save_lock.lock().await;
        let snapshot = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            mutate(&mut current);
            current.clone()
        };
        self.save(&snapshot).await;
        snapshot
    }

    /// 将设置以 2 空格缩进的 JSON 覆盖写入文件
    async fn save(&self, settings: &Settings) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    log::warn!("创建设置目录失败: {}", e);
                    return;
                }
            }
        }

        let content = match serde_json::to_string_pretty(settings) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("序列化设置失败: {}", e);
                return;
            }
        };

        if let Err(e) = tokio::fs::write(&self.path, content).await {
            log::warn!("写入设置文件 {} 失败: {}", self.path.display(), e);
        }
    }
}

/// 读取设置文件，任何失败都返回默认设置
fn read_settings_file(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("读取设置文件 {} 失败: {}", path.display(), e);
            return Settings::default();
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(value) => Settings::from_value(&value),
        Err(e) => {
            log::warn!("设置文件 {} 已损坏，使用默认设置: {}", path.display(), e);
            Settings::default()
        }
    }
}
