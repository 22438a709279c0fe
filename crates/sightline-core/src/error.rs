//! SIGHTLINE 핵심 에러 타입.
//!
//! 어댑터와 엔진은 자체 에러를 만들지 않고 `CoreError`로 수렴한다.
//! 스캔 파이프라인의 모든 실패는 "이번 틱은 영역 없음"으로 강등되며,
//! 호스트 프로세스를 종료시키는 에러는 존재하지 않는다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 캡처, OCR, 설정 검증 등 스캔 파이프라인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 화면 캡처 실패 (버퍼 손상, 핸들 무효 등)
    #[error("캡처 에러: {0}")]
    Capture(String),

    /// OCR 처리 실패
    #[error("OCR 에러: {0}")]
    Ocr(String),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 협조적 취소 (셧다운 중 틱 중단)
    #[error("작업 취소됨")]
    Cancelled,

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}
