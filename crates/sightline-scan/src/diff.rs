//! 프레임 차이 게이트.
//!
//! 직전 채택 프레임과 현재 프레임을 희소 그리드 샘플링으로 비교하여
//! 변경 크기가 임계값을 넘는지 판정한다. 읽을 수 없는 버퍼 등 비교가
//! 안전하게 완료될 수 없는 상황은 보수적으로 "변경됨"으로 취급한다 —
//! "변경 없음"으로 삼키면 다운스트림 스캔이 영구히 정지하므로.

use image::{DynamicImage, RgbaImage};
use sightline_core::config::ScanConfig;
use tracing::debug;

/// 절대합 모드 픽셀 차이 임계값 (R+G+B 합산)
const ABS_PIXEL_THRESHOLD: u32 = 30;

/// 평균 제곱 모드 픽셀 차이 임계값
const MSE_PIXEL_THRESHOLD: u32 = 100;

/// 프레임 차이 게이트.
///
/// 마지막으로 채택한 프레임 한 장을 단독 소유한다.
/// 변경이 채택되면 이전 버퍼는 교체되어 해제된다.
pub struct FrameDiffGate {
    prev: Option<RgbaImage>,
    sample_size: u32,
    difference_threshold: f32,
    high_quality: bool,
    last_ratio: f32,
}

impl FrameDiffGate {
    /// 설정으로 게이트 생성
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            prev: None,
            sample_size: config.sample_size,
            difference_threshold: config.difference_threshold,
            high_quality: config.high_quality_diff,
            last_ratio: 0.0,
        }
    }

    /// 현재 프레임이 직전 채택 프레임 대비 유의미하게 변했는지 판정.
    ///
    /// - 첫 호출이거나 해상도가 다르면 무조건 `true` (리사이즈는 항상 유의미)
    /// - `true` 반환 시 현재 프레임이 새 기준 프레임으로 저장된다
    /// - `false` 반환 시 기준 프레임은 유지된다
    pub fn has_significant_change(&mut self, current: &DynamicImage) -> bool {
        let curr = current.to_rgba8();

        let prev = match &self.prev {
            Some(prev) if prev.dimensions() == curr.dimensions() => prev,
            _ => {
                // 첫 프레임 또는 해상도 변경
                self.last_ratio = 1.0;
                self.prev = Some(curr);
                return true;
            }
        };

        let ratio = match sample_difference_ratio(
            prev.as_raw(),
            curr.as_raw(),
            curr.width(),
            curr.height(),
            self.sample_size,
            self.high_quality,
        ) {
            Some(ratio) => ratio,
            None => {
                // 버퍼 접근 실패 — 보수적으로 변경 처리
                debug!("프레임 버퍼 비교 불가 — 변경으로 간주");
                self.last_ratio = 1.0;
                self.prev = Some(curr);
                return true;
            }
        };

        self.last_ratio = ratio;
        let changed = ratio > self.difference_threshold;

        if changed {
            debug!(
                "프레임 변경 감지: 차이 비율 {:.3} (임계값 {:.3})",
                ratio, self.difference_threshold
            );
            self.prev = Some(curr);
        }

        changed
    }

    /// 마지막 비교의 차이 비율 (0.0 ~ 1.0)
    pub fn last_difference_ratio(&self) -> f32 {
        self.last_ratio
    }

    /// 기준 프레임과 통계 초기화 — 다음 호출은 무조건 `true`
    pub fn reset(&mut self) {
        self.prev = None;
        self.last_ratio = 0.0;
    }
}

/// 희소 그리드 샘플 비교 — 달라진 샘플의 비율 반환.
///
/// 고품질 모드는 샘플 밀도를 2배로 올리고 평균 제곱 오차 metric을 쓴다.
/// 범위를 벗어나는 버퍼 접근이 하나라도 있으면 `None` (호출자가 보수 처리).
fn sample_difference_ratio(
    prev: &[u8],
    curr: &[u8],
    width: u32,
    height: u32,
    sample_size: u32,
    high_quality: bool,
) -> Option<f32> {
    if width == 0 || height == 0 {
        return None;
    }

    let n = if high_quality {
        sample_size.saturating_mul(2).max(1)
    } else {
        sample_size.max(1)
    } as usize;

    let stride = width as usize * 4;
    let mut different = 0usize;
    let total = n * n;

    for sy in 0..n {
        // 셀 중앙 좌표 샘플링
        let y = (((2 * sy + 1) * height as usize) / (2 * n)).min(height as usize - 1);
        let row_offset = y * stride;

        for sx in 0..n {
            let x = (((2 * sx + 1) * width as usize) / (2 * n)).min(width as usize - 1);
            let offset = row_offset + x * 4;

            let p = prev.get(offset..offset + 3)?;
            let c = curr.get(offset..offset + 3)?;

            let dr = (p[0] as i32 - c[0] as i32).unsigned_abs();
            let dg = (p[1] as i32 - c[1] as i32).unsigned_abs();
            let db = (p[2] as i32 - c[2] as i32).unsigned_abs();

            let over = if high_quality {
                (dr * dr + dg * dg + db * db) / 3 > MSE_PIXEL_THRESHOLD
            } else {
                dr + dg + db > ABS_PIXEL_THRESHOLD
            };

            if over {
                different += 1;
            }
        }
    }

    Some(different as f32 / total as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn config() -> ScanConfig {
        ScanConfig::default()
    }

    fn make_image(w: u32, h: u32, color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, image::Rgba(color)))
    }

    #[test]
    fn first_frame_is_always_significant() {
        let mut gate = FrameDiffGate::new(&config());
        let img = make_image(100, 100, [10, 10, 10, 255]);
        assert!(gate.has_significant_change(&img));
    }

    #[test]
    fn identical_frame_is_not_significant() {
        let mut gate = FrameDiffGate::new(&config());
        let img = make_image(100, 100, [10, 10, 10, 255]);
        assert!(gate.has_significant_change(&img));
        // 기준 확립 후 동일 프레임 2회 — 둘 다 false (결정적)
        assert!(!gate.has_significant_change(&img));
        assert!(!gate.has_significant_change(&img));
        assert_eq!(gate.last_difference_ratio(), 0.0);
    }

    #[test]
    fn resize_forces_rescan() {
        let mut gate = FrameDiffGate::new(&config());
        let small = make_image(100, 100, [10, 10, 10, 255]);
        let large = make_image(200, 200, [10, 10, 10, 255]);
        assert!(gate.has_significant_change(&small));
        // 픽셀 내용과 무관하게 해상도 변경은 항상 유의미
        assert!(gate.has_significant_change(&large));
    }

    #[test]
    fn full_color_change_is_significant() {
        let mut gate = FrameDiffGate::new(&config());
        let black = make_image(100, 100, [0, 0, 0, 255]);
        let white = make_image(100, 100, [255, 255, 255, 255]);
        assert!(gate.has_significant_change(&black));
        assert!(gate.has_significant_change(&white));
        assert!(gate.last_difference_ratio() > 0.9);
    }

    #[test]
    fn rejected_frame_keeps_baseline() {
        let mut gate = FrameDiffGate::new(&config());
        let base = make_image(100, 100, [100, 100, 100, 255]);
        let nearly = make_image(100, 100, [103, 100, 100, 255]);
        let white = make_image(100, 100, [255, 255, 255, 255]);

        assert!(gate.has_significant_change(&base));
        // 채널 차이 합 3 < 30 → 미변경, 기준은 base 유지
        assert!(!gate.has_significant_change(&nearly));
        // 기준이 base이므로 white는 변경
        assert!(gate.has_significant_change(&white));
    }

    #[test]
    fn reset_forces_next_true() {
        let mut gate = FrameDiffGate::new(&config());
        let img = make_image(100, 100, [10, 10, 10, 255]);
        assert!(gate.has_significant_change(&img));
        assert!(!gate.has_significant_change(&img));
        gate.reset();
        assert!(gate.has_significant_change(&img));
    }

    #[test]
    fn high_quality_mode_detects_change() {
        let cfg = ScanConfig {
            high_quality_diff: true,
            ..ScanConfig::default()
        };
        let mut gate = FrameDiffGate::new(&cfg);
        let a = make_image(100, 100, [50, 50, 50, 255]);
        let b = make_image(100, 100, [200, 200, 200, 255]);
        assert!(gate.has_significant_change(&a));
        assert!(gate.has_significant_change(&b));
        assert!(!gate.has_significant_change(&b));
    }

    #[test]
    fn degenerate_frame_stays_conservative() {
        let mut gate = FrameDiffGate::new(&config());
        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        // 비교 자체가 불가능한 프레임 — 모든 호출이 변경으로 보고
        assert!(gate.has_significant_change(&empty));
        assert!(gate.has_significant_change(&empty));
        assert_eq!(gate.last_difference_ratio(), 1.0);
    }

    #[test]
    fn partial_change_below_threshold_ignored() {
        // 1% 임계값 — 10000픽셀 중 1픽셀 변경은 샘플에 안 걸리거나 비율 미달
        let mut gate = FrameDiffGate::new(&config());
        let base = make_image(100, 100, [100, 100, 100, 255]);
        assert!(gate.has_significant_change(&base));

        let mut nearly = RgbaImage::from_pixel(100, 100, image::Rgba([100, 100, 100, 255]));
        nearly.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        // 샘플 그리드는 셀 중앙을 찍으므로 (0,0) 한 점 변경은 비율 0
        assert!(!gate.has_significant_change(&DynamicImage::ImageRgba8(nearly)));
    }
}
