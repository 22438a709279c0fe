//! 텍스트 영역 모델.
//!
//! OCR 백엔드가 생성하는 제공자-무관 표준 결과 구조.
//! 생성 이후 불변 — 좌표계 변환이 필요하면 [`TextRegion::translated`]로
//! 복사본을 만든다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// 인식된 텍스트 영역 (OCR 결과 1건)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRegion {
    /// 바운딩 박스
    pub bounds: Rect,
    /// 인식된 텍스트
    pub text: String,
    /// 인식 신뢰도 (0.0 ~ 1.0)
    pub confidence: f32,
    /// 감지 시각
    pub detected_at: DateTime<Utc>,
}

impl TextRegion {
    /// 오프셋을 더한 복사본 반환 (영역-로컬 → 창-로컬 좌표 변환)
    pub fn translated(&self, dx: i32, dy: i32) -> TextRegion {
        TextRegion {
            bounds: self.bounds.translated(dx, dy),
            text: self.text.clone(),
            confidence: self.confidence,
            detected_at: self.detected_at,
        }
    }
}

/// 두 결과 목록이 같은 텍스트 집합을 담는지 비교.
///
/// 좌표/신뢰도 차이는 무시한다 — 호출자 이벤트는 "보이는 텍스트"가
/// 바뀌었을 때만 발화하면 되므로.
pub fn same_text_set(a: &[TextRegion], b: &[TextRegion]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left: Vec<&str> = a.iter().map(|r| r.text.as_str()).collect();
    let mut right: Vec<&str> = b.iter().map(|r| r.text.as_str()).collect();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}
