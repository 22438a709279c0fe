//! OCR 백엔드 포트.
//!
//! 텍스트 인식 라이브러리를 추상화하는 인터페이스.
//! 라이브러리 고유 결과 타입 → [`TextRegion`] 변환은 구현체(어댑터)의
//! 경계에서 단 한 번 수행한다. 엔진은 런타임 리플렉션/동적 필드 접근을
//! 절대 하지 않는다.

use async_trait::async_trait;
use image::DynamicImage;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;
use crate::models::region::TextRegion;

/// OCR 백엔드 — 비트맵에서 텍스트 영역 추출
///
/// 구현체는 반복 호출에 멱등해야 하며, 엔진이 영역 스캔을 병렬화하지
/// 않는 한 동시 호출 안전성은 요구되지 않는다.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// 백엔드 초기화 (모델 로드 등). 반복 호출 멱등.
    async fn initialize(&self) -> Result<(), CoreError>;

    /// 이미지에서 텍스트 영역 목록 추출.
    ///
    /// 좌표는 입력 이미지 로컬 기준. 셧다운 중에는 `cancel` 토큰을
    /// 관찰하여 조기 반환할 수 있다.
    async fn detect_text_regions(
        &self,
        image: &DynamicImage,
        cancel: &CancellationToken,
    ) -> Result<Vec<TextRegion>, CoreError>;

    /// 백엔드 이름 (예: "local-tesseract", "windows-native")
    fn backend_name(&self) -> &str;
}
