//! # sightline-scan
//!
//! 적응형 OCR 스캔 엔진.
//! 화면 캡처 소스와 OCR 백엔드 사이에서 "언제, 어디를 스캔할지"를
//! 결정하는 제어 루프를 담당한다:
//!
//! - [`diff`] — 프레임 차이 게이트 (변경 없는 틱 차단)
//! - [`regions`] — 그리드 기반 관심 영역 학습기
//! - [`interval`] — 피드백 폴링 간격 컨트롤러
//! - [`cache`] — 핑거프린트 키 결과 캐시
//! - [`fingerprint`] — 프레임 지각 해시
//! - [`orchestrator`] — 틱당 스캔 파이프라인 오케스트레이션
//! - [`runner`] — 타이머 루프 (비재진입 틱 + 협조적 셧다운)

pub mod cache;
pub mod diff;
pub mod fingerprint;
pub mod interval;
pub mod orchestrator;
pub mod regions;
pub mod runner;

pub use cache::ResultCache;
pub use diff::FrameDiffGate;
pub use fingerprint::{frame_fingerprint, FrameFingerprint};
pub use interval::IntervalController;
pub use orchestrator::ScanOrchestrator;
pub use regions::RegionLearner;
pub use runner::ScanRunner;
