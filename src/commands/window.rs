//! # 无边框窗口控制 Commands
//!
//! 主窗口没有系统标题栏，关闭、最小化和最大化由前端自绘的按钮触发。
//! 最大化不使用系统的 maximize，而是在显示器工作区和记录的还原位置之间切换，
//! 见 `models::window::WindowState`。
//!
//! 窗口 API 的失败只记录日志，不返回给前端。

use std::sync::{Mutex, PoisonError};

use tauri::{PhysicalPosition, PhysicalSize, State, WebviewWindow};

use crate::models::window::{Bounds, WindowState};

/// 关闭主窗口（应用随之退出）
#[tauri::command]
pub fn win_close(window: WebviewWindow) {
    if let Err(e) = window.close() {
        log::warn!("关闭窗口失败: {}", e);
    }
}

/// 最小化主窗口
#[tauri::command]
pub fn win_minimize(window: WebviewWindow) {
    if let Err(e) = window.minimize() {
        log::warn!("最小化窗口失败: {}", e);
    }
}

/// 切换最大化
///
/// 未最大化时记录当前位置大小并铺满所在显示器的工作区；
/// 已最大化时还原到记录的位置大小。
#[tauri::command]
pub fn win_toggle_max(window: WebviewWindow, state: State<'_, Mutex<WindowState>>) {
    let current = current_bounds(&window);
    let Some(work_area) = work_area(&window) else {
        log::warn!("无法获取显示器工作区，忽略最大化切换");
        return;
    };

    let target = state
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .toggle(current, work_area);

    if let Err(e) = window.set_position(PhysicalPosition::new(target.x, target.y)) {
        log::warn!("移动窗口失败: {}", e);
    }
    if let Err(e) = window.set_size(PhysicalSize::new(target.width, target.height)) {
        log::warn!("调整窗口大小失败: {}", e);
    }
}

/// 窗口当前的外框位置大小；读取失败时为 None，还原位置保持不变
fn current_bounds(window: &WebviewWindow) -> Option<Bounds> {
    let position = window.outer_position().ok()?;
    let size = window.outer_size().ok()?;
    Some(Bounds {
        x: position.x,
        y: position.y,
        width: size.width,
        height: size.height,
    })
}

/// 窗口所在显示器的工作区（不含任务栏）
fn work_area(window: &WebviewWindow) -> Option<Bounds> {
    let monitor = match window.current_monitor() {
        Ok(Some(monitor)) => monitor,
        Ok(None) => window.primary_monitor().ok()??,
        Err(e) => {
            log::warn!("获取当前显示器失败: {}", e);
            return None;
        }
    };
    let area = monitor.work_area();
    Some(Bounds {
        x: area.position.x,
        y: area.position.y,
        width: area.size.width,
        height: area.size.height,
    })
}
