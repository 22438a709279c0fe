//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! OCR 백엔드, 화면 캡처, 전처리 프리셋, 호출자 이벤트 표면을
//! trait으로 추상화하며, 스캔 엔진이 `Arc<dyn T>`로 와이어링한다.
//!
//! 모든 async trait은 `async_trait` 매크로를 사용하여
//! object safety를 보장한다.

pub mod capture;
pub mod events;
pub mod ocr;
pub mod preprocess;
