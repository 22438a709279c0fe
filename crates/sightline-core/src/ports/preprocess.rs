//! 전처리 프리셋 포트.
//!
//! 점진적 재시도 단계가 순환하는 전처리 파라미터 집합.
//! 실제 픽셀 필터 커널은 어댑터 소관이고, 엔진은 현재 프리셋 조회와
//! 다음 프리셋으로의 전진만 필요로 한다.

use serde::{Deserialize, Serialize};

/// 프리셋 식별자 (순서 있는 목록의 인덱스)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetId(pub usize);

/// 전처리 파라미터 집합
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetParams {
    /// 대비 보정 (1.0 = 원본)
    pub contrast: f32,
    /// 샤픈 강도 (0.0 = 미적용)
    pub sharpen: f32,
    /// 노이즈 제거 강도 (0.0 = 미적용)
    pub noise_reduction: f32,
    /// 스케일 배율 (1.0 = 원본)
    pub scale: f32,
    /// 패딩 (픽셀)
    pub padding: u32,
}

impl Default for PresetParams {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            sharpen: 0.0,
            noise_reduction: 0.0,
            scale: 1.0,
            padding: 0,
        }
    }
}

/// 프리셋 순환자 — 재시도마다 다음 파라미터 집합으로 전진
pub trait PresetCycle: Send + Sync {
    /// 현재 프리셋 식별자
    fn current_preset(&self) -> PresetId;

    /// 현재 프리셋 파라미터
    fn current_params(&self) -> &PresetParams;

    /// 다음 프리셋으로 전진 (끝에 도달하면 순환)
    fn advance(&mut self);

    /// 첫 프리셋으로 복귀
    fn reset(&mut self);
}

/// 고정 목록 기반 기본 순환자
pub struct StaticPresetCycle {
    presets: Vec<PresetParams>,
    index: usize,
}

impl StaticPresetCycle {
    /// 프리셋 목록으로 생성. 빈 목록이면 기본 프리셋 1개로 대체.
    pub fn new(presets: Vec<PresetParams>) -> Self {
        let presets = if presets.is_empty() {
            vec![PresetParams::default()]
        } else {
            presets
        };
        Self { presets, index: 0 }
    }

    /// 게임 화면용 기본 3단 프리셋 (원본 → 대비 강화 → 확대+샤픈)
    pub fn standard() -> Self {
        Self::new(vec![
            PresetParams::default(),
            PresetParams {
                contrast: 1.4,
                noise_reduction: 0.3,
                ..PresetParams::default()
            },
            PresetParams {
                contrast: 1.2,
                sharpen: 0.5,
                scale: 2.0,
                padding: 8,
                ..PresetParams::default()
            },
        ])
    }
}

impl PresetCycle for StaticPresetCycle {
    fn current_preset(&self) -> PresetId {
        PresetId(self.index)
    }

    fn current_params(&self) -> &PresetParams {
        &self.presets[self.index]
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) % self.presets.len();
    }

    fn reset(&mut self) {
        self.index = 0;
    }
}
