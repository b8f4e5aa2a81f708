//! Adaptive ray-count scaling
//!
//! Tracks frame times and trades horizontal resolution for speed:
//! - Frames slower than the target drop rays quickly
//! - Frames comfortably faster recover rays slowly, up to the base count
//!
//! Time is driven entirely by the frame deltas passed in, so behaviour is
//! reproducible in tests.

use std::collections::VecDeque;

use crate::game::constants::render::{
    MAX_RAY_COUNT, MIN_RAY_COUNT, QUALITY_ADJUST_INTERVAL, QUALITY_FAST_RATIO, QUALITY_SLOW_RATIO,
    QUALITY_SMOOTHING, QUALITY_STEP_DOWN, QUALITY_STEP_UP, RAY_DENSITY,
};
use crate::game::constants::settings::{MIN_FPS_LIMIT, QUALITY_MAX_FPS};

/// Samples kept for percentile reporting (~2 seconds at 60 fps)
const WINDOW: usize = 120;

/// Ray count a viewport of `width` pixels renders at full quality
pub fn base_ray_count(width: u32) -> usize {
    ((width as f32 / RAY_DENSITY) as usize).clamp(MIN_RAY_COUNT, MAX_RAY_COUNT)
}

#[derive(Debug, Clone)]
pub struct AdaptiveQuality {
    enabled: bool,
    base_rays: usize,
    rays: usize,
    /// Exponential moving average of frame time
    avg_frame: f32,
    target_frame: f32,
    since_adjust: f32,
    recent: VecDeque<f32>,
}

impl AdaptiveQuality {
    pub fn new(width: u32, fps_limit: u32, enabled: bool) -> Self {
        let base_rays = base_ray_count(width);
        let target_frame = Self::target_for(fps_limit);
        Self {
            enabled,
            base_rays,
            rays: base_rays,
            avg_frame: target_frame,
            target_frame,
            since_adjust: 0.0,
            recent: VecDeque::with_capacity(WINDOW),
        }
    }

    fn target_for(fps_limit: u32) -> f32 {
        1.0 / fps_limit.clamp(MIN_FPS_LIMIT, QUALITY_MAX_FPS) as f32
    }

    /// Current ray count
    #[inline]
    pub fn rays(&self) -> usize {
        self.rays
    }

    #[inline]
    pub fn base_rays(&self) -> usize {
        self.base_rays
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn average_frame_time(&self) -> f32 {
        self.avg_frame
    }

    /// Disabling snaps back to full quality
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.rays = self.base_rays;
        }
    }

    /// Re-derive the base count after a resolution or frame-cap change.
    /// Starts again from full quality.
    pub fn reconfigure(&mut self, width: u32, fps_limit: u32) {
        self.base_rays = base_ray_count(width);
        self.rays = self.base_rays;
        self.target_frame = Self::target_for(fps_limit);
        self.since_adjust = 0.0;
    }

    /// Feed one frame time. Returns true when the ray count changed.
    pub fn observe(&mut self, dt: f32) -> bool {
        if !dt.is_finite() || dt < 0.0 {
            return false;
        }
        self.avg_frame = self.avg_frame * (1.0 - QUALITY_SMOOTHING) + dt * QUALITY_SMOOTHING;
        self.recent.push_back(dt);
        while self.recent.len() > WINDOW {
            self.recent.pop_front();
        }

        self.since_adjust += dt;
        if !self.enabled || self.since_adjust < QUALITY_ADJUST_INTERVAL {
            return false;
        }
        self.since_adjust = 0.0;

        let before = self.rays;
        if self.avg_frame > self.target_frame * QUALITY_SLOW_RATIO && self.rays > MIN_RAY_COUNT {
            self.rays = self.rays.saturating_sub(QUALITY_STEP_DOWN).max(MIN_RAY_COUNT);
        } else if self.avg_frame < self.target_frame * QUALITY_FAST_RATIO && self.rays < self.base_rays {
            self.rays = (self.rays + QUALITY_STEP_UP).min(self.base_rays);
        }

        if self.rays != before {
            tracing::debug!(
                "Ray count {} -> {} (avg frame {:.2}ms)",
                before,
                self.rays,
                self.avg_frame * 1000.0
            );
        }
        self.rays != before
    }

    /// 95th percentile of the recent frame window, in seconds
    pub fn p95_frame_time(&self) -> f32 {
        if self.recent.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f32> = self.recent.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let idx = ((sorted.len() as f32 * 0.95) as usize).min(sorted.len() - 1);
        sorted[idx]
    }

    pub fn status_message(&self) -> String {
        format!(
            "{} rays (base {}), avg {:.1}ms, p95 {:.1}ms",
            self.rays,
            self.base_rays,
            self.avg_frame * 1000.0,
            self.p95_frame_time() * 1000.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_ray_count_bounds() {
        assert_eq!(base_ray_count(800), 160);
        assert_eq!(base_ray_count(1280), 220);
        assert_eq!(base_ray_count(3840), 300);
    }

    #[test]
    fn test_slow_frames_drop_rays_to_floor() {
        let mut q = AdaptiveQuality::new(1280, 60, true);
        assert_eq!(q.rays(), 220);
        // 50ms frames at a 60 fps target
        for _ in 0..40 {
            q.observe(0.05);
        }
        assert!(q.rays() < 220);
        for _ in 0..400 {
            q.observe(0.05);
        }
        assert_eq!(q.rays(), MIN_RAY_COUNT);
    }

    #[test]
    fn test_adjusts_at_most_once_per_interval() {
        let mut q = AdaptiveQuality::new(1280, 60, true);
        // Push the average well above target without crossing the interval
        let mut changes = 0;
        for _ in 0..10 {
            if q.observe(0.05) {
                changes += 1;
            }
        }
        assert_eq!(changes, 0);
        assert!(q.observe(0.06));
        assert_eq!(q.rays(), 210);
    }

    #[test]
    fn test_fast_frames_recover_up_to_base() {
        let mut q = AdaptiveQuality::new(1280, 60, true);
        for _ in 0..200 {
            q.observe(0.05);
        }
        let low = q.rays();
        assert!(low < 220);
        for _ in 0..2000 {
            q.observe(0.004);
        }
        assert_eq!(q.rays(), 220);
    }

    #[test]
    fn test_disabled_holds_base() {
        let mut q = AdaptiveQuality::new(1280, 60, false);
        for _ in 0..200 {
            assert!(!q.observe(0.05));
        }
        assert_eq!(q.rays(), q.base_rays());

        q.set_enabled(true);
        for _ in 0..40 {
            q.observe(0.05);
        }
        assert!(q.rays() < q.base_rays());
        q.set_enabled(false);
        assert_eq!(q.rays(), q.base_rays());
    }

    #[test]
    fn test_reconfigure_resets_to_base() {
        let mut q = AdaptiveQuality::new(1920, 60, true);
        assert_eq!(q.rays(), 300);
        for _ in 0..40 {
            q.observe(0.05);
        }
        assert!(q.rays() < 300);
        q.reconfigure(800, 60);
        assert_eq!(q.base_rays(), 160);
        assert_eq!(q.rays(), 160);
        q.reconfigure(1280, 60);
        assert_eq!(q.rays(), 220);
    }

    #[test]
    fn test_p95_window() {
        let mut q = AdaptiveQuality::new(1280, 60, false);
        assert_eq!(q.p95_frame_time(), 0.0);
        for i in 0..100 {
            q.observe(if i < 94 { 0.01 } else { 0.03 });
        }
        assert_eq!(q.p95_frame_time(), 0.03);
    }
}
