//! 스캔 엔진 설정 구조체.
//!
//! 차이 감지 임계값, 그리드 크기, 폴링 간격 경계, 캐시 용량 등
//! 적응형 스캔 루프의 런타임 설정을 정의한다.
//! 모든 필드는 serde 기본값을 가지며, [`ScanConfig::validate`]가
//! 생성 시점에 경계 조건을 강제한다 (fail fast).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;

/// 스캔 엔진 최상위 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    // ============================================================
    // 프레임 차이 게이트
    // ============================================================
    /// 변경 판정 비율 임계값 (0.0 ~ 1.0, 샘플 중 달라진 비율)
    #[serde(default = "default_difference_threshold")]
    pub difference_threshold: f32,
    /// 샘플 그리드 한 변의 점 개수 (sample_size × sample_size)
    #[serde(default = "default_sample_size")]
    pub sample_size: u32,
    /// 고품질 비교 모드 — 샘플 밀도 2배 + 평균 제곱 오차 metric
    #[serde(default)]
    pub high_quality_diff: bool,

    // ============================================================
    // 영역 학습기
    // ============================================================
    /// 그리드 열 수
    #[serde(default = "default_grid_dim")]
    pub grid_cols: u32,
    /// 그리드 행 수
    #[serde(default = "default_grid_dim")]
    pub grid_rows: u32,
    /// 셀 활성 판정에 필요한 누적 히트 수
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
    /// 성공 카운트 1 감쇠에 필요한 연속 미스 수 (leaky bucket)
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    // ============================================================
    // 폴링 간격 컨트롤러
    // ============================================================
    /// 최소 폴링 간격 (밀리초)
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// 최대 폴링 간격 (밀리초)
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    /// 초기 폴링 간격 (밀리초)
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,
    /// 간격 조정 전 요구되는 연속 관찰 횟수
    #[serde(default = "default_stabilization_threshold")]
    pub stabilization_threshold: u32,
    /// 활동 관찰 시 간격 축소 비율
    #[serde(default = "default_decrease_ratio")]
    pub decrease_ratio: f32,
    /// 정지 관찰 시 간격 확대 비율
    #[serde(default = "default_increase_ratio")]
    pub increase_ratio: f32,
    /// 간격 확대 전 마지막 변경 이후 대기 시간 (밀리초)
    #[serde(default = "default_quiet_grace_ms")]
    pub quiet_grace_ms: u64,

    // ============================================================
    // OCR 스캔
    // ============================================================
    /// 결과 채택 최소 신뢰도 (0.0 ~ 1.0)
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// 점진적 재시도마다 낮추는 신뢰도 폭
    #[serde(default = "default_confidence_relax_step")]
    pub confidence_relax_step: f32,
    /// 한 틱의 최대 스캔 시도 횟수 (최초 1회 + 재시도)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    // ============================================================
    // 결과 캐시
    // ============================================================
    /// 캐시 최대 엔트리 수
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: usize,
    /// 반용량 초과 + 이 시간 동안 미사용 시 전체 클리어 (밀리초)
    #[serde(default = "default_cache_idle_clear_ms")]
    pub cache_idle_clear_ms: u64,

    // ============================================================
    // 이벤트 / 장애 대응
    // ============================================================
    /// `on_no_regions_detected` 발화에 필요한 연속 빈 틱 수 (히스테리시스)
    #[serde(default = "default_no_text_ticks")]
    pub no_text_ticks: u32,
    /// 방어적 리셋을 트리거하는 연속 에러 수
    #[serde(default = "default_error_reset_threshold")]
    pub error_reset_threshold: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            difference_threshold: default_difference_threshold(),
            sample_size: default_sample_size(),
            high_quality_diff: false,
            grid_cols: default_grid_dim(),
            grid_rows: default_grid_dim(),
            success_threshold: default_success_threshold(),
            failure_threshold: default_failure_threshold(),
            min_interval_ms: default_min_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            initial_interval_ms: default_initial_interval_ms(),
            stabilization_threshold: default_stabilization_threshold(),
            decrease_ratio: default_decrease_ratio(),
            increase_ratio: default_increase_ratio(),
            quiet_grace_ms: default_quiet_grace_ms(),
            min_confidence: default_min_confidence(),
            confidence_relax_step: default_confidence_relax_step(),
            max_attempts: default_max_attempts(),
            max_cache_entries: default_max_cache_entries(),
            cache_idle_clear_ms: default_cache_idle_clear_ms(),
            no_text_ticks: default_no_text_ticks(),
            error_reset_threshold: default_error_reset_threshold(),
        }
    }
}

impl ScanConfig {
    /// 설정값 경계 검증.
    ///
    /// `min < max`, `min ≤ initial ≤ max` 등 위반 시
    /// [`CoreError::Validation`]으로 즉시 실패한다.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&self.difference_threshold) {
            return Err(validation(
                "difference_threshold",
                "0.0 ~ 1.0 범위여야 함",
            ));
        }
        if self.sample_size == 0 {
            return Err(validation("sample_size", "0보다 커야 함"));
        }
        if self.grid_cols == 0 || self.grid_rows == 0 {
            return Err(validation("grid_cols/grid_rows", "0보다 커야 함"));
        }
        if self.success_threshold == 0 {
            return Err(validation("success_threshold", "0보다 커야 함"));
        }
        if self.failure_threshold == 0 {
            return Err(validation("failure_threshold", "0보다 커야 함"));
        }
        if self.min_interval_ms >= self.max_interval_ms {
            return Err(validation(
                "min_interval_ms",
                "max_interval_ms보다 작아야 함",
            ));
        }
        if self.initial_interval_ms < self.min_interval_ms
            || self.initial_interval_ms > self.max_interval_ms
        {
            return Err(validation(
                "initial_interval_ms",
                "min/max 간격 범위 내여야 함",
            ));
        }
        if !(0.0..1.0).contains(&self.decrease_ratio) {
            return Err(validation("decrease_ratio", "0.0 ~ 1.0 미만이어야 함"));
        }
        if self.increase_ratio <= 1.0 {
            return Err(validation("increase_ratio", "1.0보다 커야 함"));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(validation("min_confidence", "0.0 ~ 1.0 범위여야 함"));
        }
        if self.max_attempts == 0 {
            return Err(validation("max_attempts", "0보다 커야 함"));
        }
        if self.max_cache_entries == 0 {
            return Err(validation("max_cache_entries", "0보다 커야 함"));
        }
        Ok(())
    }

    /// 최소 폴링 간격
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// 최대 폴링 간격
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    /// 초기 폴링 간격
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    /// 정지 상태 유예 시간
    pub fn quiet_grace(&self) -> Duration {
        Duration::from_millis(self.quiet_grace_ms)
    }

    /// 캐시 유휴 클리어 시간
    pub fn cache_idle_clear(&self) -> Duration {
        Duration::from_millis(self.cache_idle_clear_ms)
    }
}

fn validation(field: &str, message: &str) -> CoreError {
    CoreError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn default_difference_threshold() -> f32 {
    0.01
}

fn default_sample_size() -> u32 {
    20
}

fn default_grid_dim() -> u32 {
    3
}

fn default_success_threshold() -> u32 {
    2
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_min_interval_ms() -> u64 {
    200
}

fn default_max_interval_ms() -> u64 {
    2_000
}

fn default_initial_interval_ms() -> u64 {
    500
}

fn default_stabilization_threshold() -> u32 {
    3
}

fn default_decrease_ratio() -> f32 {
    0.75
}

fn default_increase_ratio() -> f32 {
    1.3
}

fn default_quiet_grace_ms() -> u64 {
    4_000
}

fn default_min_confidence() -> f32 {
    0.6
}

fn default_confidence_relax_step() -> f32 {
    0.05
}

fn default_max_attempts() -> u32 {
    3
}

fn default_max_cache_entries() -> usize {
    20
}

fn default_cache_idle_clear_ms() -> u64 {
    30_000
}

fn default_no_text_ticks() -> u32 {
    3
}

fn default_error_reset_threshold() -> u32 {
    5
}
