//! 화면 캡처 포트.
//!
//! 창 하나의 비디오 표면을 비트맵으로 떠 오는 저수준 캡처를 추상화한다.

use async_trait::async_trait;
use image::DynamicImage;

use crate::error::CoreError;

/// 프레임 소스 — 창 캡처 제공자
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// 대상 창 캡처.
    ///
    /// `Ok(None)`은 "이번 틱 스킵" (창 최소화, 핸들 무효 등) —
    /// 에러가 아니다. `Err`은 복구 가능한 캡처 실패.
    async fn capture_window(&self) -> Result<Option<DynamicImage>, CoreError>;

    /// 캡처 계층 리소스 정리 요청 (방어적 리셋 경로에서 호출)
    fn release_resources(&self);
}
