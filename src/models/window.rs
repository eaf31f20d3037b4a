//! # 窗口最大化状态
//!
//! 无边框窗口不能使用系统的最大化按钮，由应用自行在"工作区大小"和
//! "最大化前的位置大小"之间切换。状态在启动时创建，只由 `toggle` 修改。

use serde::Serialize;

/// 窗口在屏幕上的位置和大小（物理像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// 读不到窗口位置时使用的还原位置
pub const FALLBACK_NORMAL_BOUNDS: Bounds = Bounds {
    x: 80,
    y: 80,
    width: 1000,
    height: 700,
};

/// 窗口最大化状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    pub is_maximized: bool,

    /// 最大化之前的窗口位置大小，用于还原
    pub normal_bounds: Bounds,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            is_maximized: false,
            normal_bounds: FALLBACK_NORMAL_BOUNDS,
        }
    }
}

impl WindowState {
    /// 切换最大化状态，返回窗口应当移动到的目标位置大小
    ///
    /// # 参数
    /// - `current` - 当前窗口位置大小（读取失败时为 None）
    /// - `work_area` - 所在显示器的工作区（不含任务栏）
    pub fn toggle(&mut self, current: Option<Bounds>, work_area: Bounds) -> Bounds {
        if self.is_maximized {
            self.is_maximized = false;
            self.normal_bounds
        } else {
            if let Some(bounds) = current {
                self.normal_bounds = bounds;
            }
            self.is_maximized = true;
            work_area
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORK_AREA: Bounds = Bounds {
        x: 0,
        y: 0,
        width: 1920,
        height: 1040,
    };

    #[test]
    fn test_toggle_round_trip_restores_bounds() {
        let mut state = WindowState::default();
        let before = Bounds {
            x: 200,
            y: 150,
            width: 900,
            height: 600,
        };

        assert_eq!(state.toggle(Some(before), WORK_AREA), WORK_AREA);
        assert!(state.is_maximized);

        assert_eq!(state.toggle(Some(WORK_AREA), WORK_AREA), before);
        assert!(!state.is_maximized);
    }

    #[test]
    fn test_unknown_current_bounds_restore_fallback() {
        let mut state = WindowState::default();
        state.toggle(None, WORK_AREA);
        assert_eq!(state.toggle(None, WORK_AREA), FALLBACK_NORMAL_BOUNDS);
    }
}
