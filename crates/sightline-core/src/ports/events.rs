//! 호출자 이벤트 표면.
//!
//! 오버레이/번역 호출자가 구독하는 콜백 포트.
//! 발화 규칙은 엔진이 강제한다: 텍스트 집합이 실제로 바뀐 틱에만
//! `on_regions_detected`, 연속 빈 틱이 임계값을 넘긴 뒤 한 번만
//! `on_no_regions_detected` (깜빡임으로 인한 스퓨리어스 이벤트 방지).

use crate::models::region::TextRegion;

/// 스캔 이벤트 구독자
pub trait ScanEvents: Send + Sync {
    /// 보이는 텍스트가 바뀐 틱마다 1회 발화
    fn on_regions_detected(&self, regions: &[TextRegion]);

    /// 텍스트가 있다가 사라진 뒤, 설정된 연속 빈 틱을 채우면 1회 발화
    fn on_no_regions_detected(&self);
}

/// 아무것도 하지 않는 기본 구독자 (이벤트 불필요한 호출자용)
#[derive(Debug, Default)]
pub struct NullScanEvents;

impl ScanEvents for NullScanEvents {
    fn on_regions_detected(&self, _regions: &[TextRegion]) {}

    fn on_no_regions_detected(&self) {}
}
