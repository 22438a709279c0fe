//! 폴링 간격 컨트롤러.
//!
//! 활동(화면 변경 또는 텍스트 집합 변화)이 관찰되면 간격을 줄이고,
//! 정지 상태가 이어지면 늘리는 피드백 루프. 모든 변이는
//! `[min, max]`로 클램프된다.

use std::time::{Duration, Instant};

use sightline_core::config::ScanConfig;
use sightline_core::error::CoreError;
use tracing::debug;

/// 즉시 반응용 일회성 축소 배율
const ONE_SHOT_DECREASE: f32 = 0.5;

/// 즉시 반응용 일회성 확대 배율
const ONE_SHOT_INCREASE: f32 = 1.5;

/// 적응형 폴링 간격 컨트롤러.
///
/// 연속 관찰 카운터가 안정화 임계값에 도달해야 간격을 조정한다 —
/// 한 틱의 노이즈로 간격이 출렁이지 않도록.
pub struct IntervalController {
    current: Duration,
    initial: Duration,
    min: Duration,
    max: Duration,
    stabilization_threshold: u32,
    decrease_ratio: f32,
    increase_ratio: f32,
    quiet_grace: Duration,
    consecutive_active: u32,
    consecutive_quiet: u32,
    previous_has_text: bool,
    last_change_at: Instant,
}

impl IntervalController {
    /// 설정으로 컨트롤러 생성.
    ///
    /// `min < max`, `min ≤ initial ≤ max` 위반 시 즉시 실패.
    pub fn new(config: &ScanConfig) -> Result<Self, CoreError> {
        let min = config.min_interval();
        let max = config.max_interval();
        let initial = config.initial_interval();

        if min >= max {
            return Err(CoreError::Validation {
                field: "min_interval_ms".to_string(),
                message: "max_interval_ms보다 작아야 함".to_string(),
            });
        }
        if initial < min || initial > max {
            return Err(CoreError::Validation {
                field: "initial_interval_ms".to_string(),
                message: "min/max 간격 범위 내여야 함".to_string(),
            });
        }

        Ok(Self {
            current: initial,
            initial,
            min,
            max,
            stabilization_threshold: config.stabilization_threshold.max(1),
            decrease_ratio: config.decrease_ratio,
            increase_ratio: config.increase_ratio,
            quiet_grace: config.quiet_grace(),
            consecutive_active: 0,
            consecutive_quiet: 0,
            previous_has_text: false,
            last_change_at: Instant::now(),
        })
    }

    /// 틱 관찰 결과 반영
    pub fn update(&mut self, has_changed: bool, has_text: bool) {
        self.update_at(has_changed, has_text, Instant::now());
    }

    /// 시각 주입 가능한 update (결정적 테스트용)
    pub fn update_at(&mut self, has_changed: bool, has_text: bool, now: Instant) {
        let is_active = has_changed || has_text != self.previous_has_text;
        self.previous_has_text = has_text;

        if is_active {
            self.last_change_at = now;
            self.consecutive_quiet = 0;
            self.consecutive_active += 1;

            if self.consecutive_active >= self.stabilization_threshold {
                self.scale(self.decrease_ratio);
                self.consecutive_active = 0;
                debug!("활동 안정화 — 간격 축소: {:?}", self.current);
            }
        } else {
            self.consecutive_active = 0;
            self.consecutive_quiet += 1;

            let quiet_long_enough = now.duration_since(self.last_change_at) > self.quiet_grace;
            if self.consecutive_quiet >= self.stabilization_threshold && quiet_long_enough {
                self.scale(self.increase_ratio);
                self.consecutive_quiet = 0;
                debug!("정지 안정화 — 간격 확대: {:?}", self.current);
            }
        }
    }

    /// 텍스트 변화 직후의 즉시 축소 (안정화 카운터와 무관)
    pub fn temporarily_decrease(&mut self) {
        self.scale(ONE_SHOT_DECREASE);
    }

    /// 텍스트 소실 직후의 즉시 확대 (안정화 카운터와 무관)
    pub fn temporarily_increase(&mut self) {
        self.scale(ONE_SHOT_INCREASE);
    }

    /// 현재 폴링 간격
    pub fn current(&self) -> Duration {
        self.current
    }

    /// 초기 상태로 복귀
    pub fn reset(&mut self) {
        self.current = self.initial;
        self.consecutive_active = 0;
        self.consecutive_quiet = 0;
        self.previous_has_text = false;
        self.last_change_at = Instant::now();
    }

    fn scale(&mut self, ratio: f32) {
        self.current = self.current.mul_f32(ratio).clamp(self.min, self.max);
    }
}
